//! Switch mode charger block.

use device_descriptor::Register;
use register_access::RegisterAccess;

use crate::{
    descriptors::chg::{self, BatteryDetails, ChargeDetails, Event, InputStatus, Treg},
    ll::ByteI2cInterface,
    Error,
};

pub const MODEL_NAME: &str = "max77818-chg";
pub const MANUFACTURER: &str = "maxim";

const CHGPROT_UNLOCK: u8 = 0x03;
const CHGPROT_LOCK: u8 = 0x00;

/// The low four bits of CNFG_00.
pub const MODE_MASK: u8 = 0x0F;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargeStatus {
    Unknown,
    Charging,
    NotCharging,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargeType {
    Unknown,
    None,
    Trickle,
    Fast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Health {
    Unknown,
    Good,
    Dead,
    Overheat,
    Overvoltage,
    Overcurrent,
    SafetyTimerExpire,
}

/// Smart power selector modes of CNFG_00.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargerMode {
    Off = 0x00,
    /// Buck on, charger off.
    Buck = 0x04,
    ChargeBuck = 0x05,
    Otg = 0x0A,
}

impl ChargerMode {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(Self::Off),
            0x04 => Some(Self::Buck),
            0x05 => Some(Self::ChargeBuck),
            0x0A => Some(Self::Otg),
            _ => None,
        }
    }
}

impl From<ChargeDetails> for ChargeStatus {
    fn from(details: ChargeDetails) -> Self {
        match details {
            ChargeDetails::TopOff
            | ChargeDetails::FastConstantCurrent
            | ChargeDetails::FastConstantVoltage => Self::Charging,
            ChargeDetails::Done => Self::Full,
            ChargeDetails::Prequalification
            | ChargeDetails::DetbatSuspend
            | ChargeDetails::TimerExpired
            | ChargeDetails::WatchdogExpired
            | ChargeDetails::OverTemperature
            | ChargeDetails::Off => Self::NotCharging,
        }
    }
}

impl From<ChargeDetails> for ChargeType {
    fn from(details: ChargeDetails) -> Self {
        match details {
            ChargeDetails::TopOff => Self::Trickle,
            ChargeDetails::FastConstantCurrent | ChargeDetails::FastConstantVoltage => Self::Fast,
            _ => Self::None,
        }
    }
}

impl From<BatteryDetails> for Health {
    fn from(details: BatteryDetails) -> Self {
        match details {
            BatteryDetails::Prequalification => Self::Dead,
            BatteryDetails::Good | BatteryDetails::LowVoltage => Self::Good,
            BatteryDetails::TimerExpired => Self::SafetyTimerExpire,
            BatteryDetails::OverVoltage => Self::Overvoltage,
            BatteryDetails::OverCurrent => Self::Overcurrent,
            BatteryDetails::NoBattery => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargerProperty {
    Status,
    ChargeType,
    Health,
    Online,
    Present,
    ModelName,
    Manufacturer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargerPropertyValue {
    Status(ChargeStatus),
    ChargeType(ChargeType),
    Health(Health),
    Flag(bool),
    Text(&'static str),
}

/// Charger settings applied at startup. Currents in μA, voltages in μV.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChargerConfig {
    /// Hours, 0 disables the timer.
    pub fast_charge_timer_timeout: u32,
    pub charge_current_limit: u32,
    pub otg_output_current_limit: u32,
    pub topoff_current_threshold: u32,
    /// Minutes.
    pub topoff_timer_timeout: u32,
    pub prim_charge_term_voltage: u32,
    pub min_system_reg_voltage: u32,
    /// Degrees Celsius.
    pub thermal_reg_temperature: u32,
    pub chgin_input_current_limit: u32,
    pub wchgin_input_current_limit: u32,
    /// 0 disables the protection.
    pub battery_overcurrent_threshold: u32,
    pub chgin_input_voltage_threshold: u32,
}

impl Default for ChargerConfig {
    fn default() -> Self {
        Self {
            fast_charge_timer_timeout: 0,
            charge_current_limit: 1_600_000,
            otg_output_current_limit: 1_500_000,
            topoff_current_threshold: 125_000,
            topoff_timer_timeout: 0,
            prim_charge_term_voltage: 4_200_000,
            min_system_reg_voltage: 3_600_000,
            thermal_reg_temperature: 115,
            chgin_input_current_limit: 1_700_000,
            wchgin_input_current_limit: 500_000,
            battery_overcurrent_threshold: 4_500_000,
            chgin_input_voltage_threshold: 4_300_000,
        }
    }
}

pub struct Charger<R> {
    regs: R,
}

impl<R> Charger<R> {
    pub const fn new(regs: R) -> Self {
        Self { regs }
    }

    pub fn inner_mut(&mut self) -> &mut R {
        &mut self.regs
    }
}

impl<I> Charger<ByteI2cInterface<I>> {
    pub const fn from_i2c(i2c: I) -> Self {
        Self::new(ByteI2cInterface::charger(i2c))
    }
}

impl<R, E> Charger<R>
where
    R: RegisterAccess<u8, Error = E>,
{
    fn details(&mut self) -> Result<chg::Details01, Error<E>> {
        Ok(self.regs.read_register::<chg::Details01>()?)
    }

    fn input_status(&mut self) -> Result<chg::ChgIntOk, Error<E>> {
        Ok(self.regs.read_register::<chg::ChgIntOk>()?)
    }

    pub fn status(&mut self) -> Result<ChargeStatus, Error<E>> {
        let details = self.details()?;
        Ok(details
            .chg_dtls()
            .read()
            .map_or(ChargeStatus::Unknown, ChargeStatus::from))
    }

    pub fn charge_type(&mut self) -> Result<ChargeType, Error<E>> {
        let details = self.details()?;
        Ok(details
            .chg_dtls()
            .read()
            .map_or(ChargeType::Unknown, ChargeType::from))
    }

    pub fn health(&mut self) -> Result<Health, Error<E>> {
        let details = self.details()?;
        if details.treg().read() == Some(Treg::Regulating) {
            return Ok(Health::Overheat);
        }

        Ok(details
            .bat_dtls()
            .read()
            .map_or(Health::Unknown, Health::from))
    }

    /// CHGIN input is valid.
    pub fn online(&mut self) -> Result<bool, Error<E>> {
        let status = self.input_status()?;
        Ok(status.chgin_ok().read() == Some(InputStatus::Valid))
    }

    /// A battery is connected.
    pub fn present(&mut self) -> Result<bool, Error<E>> {
        let status = self.input_status()?;
        Ok(status.batp_ok().read() == Some(InputStatus::Valid))
    }

    pub fn mode(&mut self) -> Result<u8, Error<E>> {
        let cnfg = self.regs.read_register::<chg::Cnfg00>()?;
        Ok(cnfg.mode().read_field_bits())
    }

    pub fn bypass_details(&mut self) -> Result<u8, Error<E>> {
        let details = self.regs.read_register::<chg::Details02>()?;
        Ok(details.byp_dtls().read_field_bits())
    }

    pub fn read_property(
        &mut self,
        property: ChargerProperty,
    ) -> Result<ChargerPropertyValue, Error<E>> {
        let value = match property {
            ChargerProperty::Status => ChargerPropertyValue::Status(self.status()?),
            ChargerProperty::ChargeType => ChargerPropertyValue::ChargeType(self.charge_type()?),
            ChargerProperty::Health => ChargerPropertyValue::Health(self.health()?),
            ChargerProperty::Online => ChargerPropertyValue::Flag(self.online()?),
            ChargerProperty::Present => ChargerPropertyValue::Flag(self.present()?),
            ChargerProperty::ModelName => ChargerPropertyValue::Text(MODEL_NAME),
            ChargerProperty::Manufacturer => ChargerPropertyValue::Text(MANUFACTURER),
        };

        Ok(value)
    }

    /// Writes the low four bits of `code` into the CNFG_00 mode field.
    pub fn set_mode(&mut self, code: u8) -> Result<(), Error<E>> {
        self.regs
            .update_register::<chg::Cnfg00>(|r| r.mode().update_bits(code & MODE_MASK))?;
        Ok(())
    }

    /// Reads (and so clears) the interrupt sources.
    pub fn handle_interrupt(&mut self) -> Result<chg::ChgInt, Error<E>> {
        let int = self.regs.read_register::<chg::ChgInt>()?;

        if int.batp().read() == Some(Event::Changed) {
            debug!("Battery present status updated");
        }
        if int.chgin().read() == Some(Event::Changed) {
            debug!("CHGIN input status changed");
        }
        if int.wcin().read() == Some(Event::Changed) {
            debug!("WCIN input status changed");
        }
        if int.chg().read() == Some(Event::Changed) {
            debug!("Charger status changed");
        }
        if int.bat().read() == Some(Event::Changed) {
            debug!("Battery status changed");
        }
        if int.aicl().read() == Some(Event::Changed) || int.byp().read() == Some(Event::Changed) {
            debug!("Input current or bypass status changed");
        }

        Ok(int)
    }

    /// Hours. 0 disables the timer, otherwise 4 to 16.
    pub fn set_fast_charge_timer(&mut self, hours: u32) -> Result<(), Error<E>> {
        let data = match hours {
            0 => 0,
            4..=16 => (hours - 4) / 2 + 1,
            _ => return Err(Error::InvalidArgument),
        };

        self.update_field::<chg::Cnfg01>(|r| r.fchgtime().update_bits(data as u8))
    }

    pub fn set_charge_current(&mut self, ua: u32) -> Result<(), Error<E>> {
        if !(100_000..=3_000_000).contains(&ua) {
            return Err(Error::InvalidArgument);
        }

        let data = ua / 50_000;
        self.update_field::<chg::Cnfg02>(|r| r.chg_cc().update_bits(data as u8))
    }

    pub fn set_otg_current_limit(&mut self, ua: u32) -> Result<(), Error<E>> {
        let data = match ua {
            500_000 => 0x00,
            900_000 => 0x01,
            1_200_000 => 0x02,
            1_500_000 => 0x03,
            _ => return Err(Error::InvalidArgument),
        };

        self.update_field::<chg::Cnfg02>(|r| r.otg_ilim().update_bits(data))
    }

    pub fn set_topoff_current(&mut self, ua: u32) -> Result<(), Error<E>> {
        let data = match ua {
            100_000..=200_000 => (ua - 100_000) / 25_000,
            200_001..=350_000 => ua / 50_000,
            _ => return Err(Error::InvalidArgument),
        };

        self.update_field::<chg::Cnfg03>(|r| r.to_ith().update_bits(data as u8))
    }

    /// Minutes, 0 to 70 in 10 minute steps.
    pub fn set_topoff_timer(&mut self, minutes: u32) -> Result<(), Error<E>> {
        if minutes > 70 {
            return Err(Error::InvalidArgument);
        }

        let data = minutes / 10;
        self.update_field::<chg::Cnfg03>(|r| r.to_time().update_bits(data as u8))
    }

    /// Primary charge termination voltage. 4.34 V has its own code, the
    /// ranges below and above it use 25 mV steps.
    pub fn set_charge_termination_voltage(&mut self, uv: u32) -> Result<(), Error<E>> {
        let data = match uv {
            3_650_000..=4_339_999 => (uv - 3_650_000) / 25_000,
            4_340_000 => 0x1C,
            4_340_001..=4_349_999 => return Err(Error::InvalidArgument),
            4_350_000..=4_700_000 => 0x1D + (uv - 4_350_000) / 25_000,
            _ => return Err(Error::InvalidArgument),
        };

        self.update_field::<chg::Cnfg04>(|r| r.chg_cv_prm().update_bits(data as u8))
    }

    /// 3.4 V to 3.7 V in 100 mV steps.
    pub fn set_min_system_voltage(&mut self, uv: u32) -> Result<(), Error<E>> {
        if !(3_400_000..=3_700_000).contains(&uv) {
            return Err(Error::InvalidArgument);
        }

        let data = (uv - 3_400_000) / 100_000;
        self.update_field::<chg::Cnfg04>(|r| r.minvsys().update_bits(data as u8))
    }

    pub fn set_thermal_regulation(&mut self, celsius: u32) -> Result<(), Error<E>> {
        let data = match celsius {
            85 | 100 | 115 | 130 => (celsius - 85) / 15,
            _ => return Err(Error::InvalidArgument),
        };

        self.update_field::<chg::Cnfg07>(|r| r.regtemp().update_bits(data as u8))
    }

    pub fn set_chgin_current_limit(&mut self, ua: u32) -> Result<(), Error<E>> {
        if !(100_000..=4_000_000).contains(&ua) {
            return Err(Error::InvalidArgument);
        }

        let data = (ua - 1_000) / 33_000;
        self.update_field::<chg::Cnfg09>(|r| r.chgin_ilim().update_bits(data as u8))
    }

    pub fn set_wcin_current_limit(&mut self, ua: u32) -> Result<(), Error<E>> {
        if !(60_000..=1_260_000).contains(&ua) {
            return Err(Error::InvalidArgument);
        }

        let data = ua / 20_000;
        self.update_field::<chg::Cnfg10>(|r| r.wcin_ilim().update_bits(data as u8))
    }

    /// 0 disables the protection, otherwise 3 A to 4.5 A in 250 mA steps.
    pub fn set_battery_overcurrent(&mut self, ua: u32) -> Result<(), Error<E>> {
        let data = match ua {
            0 => 0,
            3_000_000..=4_500_000 => (ua - 3_000_000) / 250_000 + 1,
            _ => return Err(Error::InvalidArgument),
        };

        self.update_field::<chg::Cnfg12>(|r| r.b2sovrc().update_bits(data as u8))
    }

    pub fn set_chgin_voltage_threshold(&mut self, uv: u32) -> Result<(), Error<E>> {
        let data = match uv {
            4_300_000 => 0x00,
            4_700_000 => 0x01,
            4_800_000 => 0x02,
            4_900_000 => 0x03,
            _ => return Err(Error::InvalidArgument),
        };

        self.update_field::<chg::Cnfg12>(|r| r.vchgin_reg().update_bits(data))
    }

    /// Unlocks the protected settings, applies `config` and locks them again.
    /// The first failing step aborts the sequence with the settings unlocked.
    pub fn reg_init(&mut self, config: &ChargerConfig) -> Result<(), Error<E>> {
        self.update_field::<chg::Cnfg06>(|r| r.chgprot().update_bits(CHGPROT_UNLOCK))?;

        self.set_fast_charge_timer(config.fast_charge_timer_timeout)?;
        self.set_charge_current(config.charge_current_limit)?;
        self.set_otg_current_limit(config.otg_output_current_limit)?;
        self.set_topoff_current(config.topoff_current_threshold)?;
        self.set_topoff_timer(config.topoff_timer_timeout)?;
        self.set_charge_termination_voltage(config.prim_charge_term_voltage)?;
        self.set_min_system_voltage(config.min_system_reg_voltage)?;
        self.set_thermal_regulation(config.thermal_reg_temperature)?;
        self.set_chgin_current_limit(config.chgin_input_current_limit)?;
        self.set_wcin_current_limit(config.wchgin_input_current_limit)?;
        self.set_battery_overcurrent(config.battery_overcurrent_threshold)?;
        self.set_chgin_voltage_threshold(config.chgin_input_voltage_threshold)?;

        self.update_field::<chg::Cnfg06>(|r| r.chgprot().update_bits(CHGPROT_LOCK))?;

        debug!("Charger configured");
        Ok(())
    }

    fn update_field<Reg>(&mut self, f: impl FnOnce(Reg) -> (u8, u8)) -> Result<(), Error<E>>
    where
        Reg: Register<RegisterWidth = u8>,
    {
        trace!("Updating {}", Reg::NAME);
        Ok(self.regs.update_register::<Reg>(f)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use device_descriptor::ReadOnlyRegister;
    use register_access::mock::MockRegisters;

    fn charger_regs() -> MockRegisters<u8> {
        let mut regs = MockRegisters::new();
        regs.set(chg::Cnfg00::ADDRESS, chg::Cnfg00::DEFAULT_VALUE);
        regs.set(chg::Cnfg01::ADDRESS, chg::Cnfg01::DEFAULT_VALUE);
        regs.set(chg::Cnfg02::ADDRESS, chg::Cnfg02::DEFAULT_VALUE);
        regs.set(chg::Cnfg04::ADDRESS, chg::Cnfg04::DEFAULT_VALUE);
        regs.set(chg::Cnfg12::ADDRESS, chg::Cnfg12::DEFAULT_VALUE);
        regs
    }

    #[test]
    fn status_mapping() {
        let expectations = [
            (0x00, ChargeStatus::NotCharging, ChargeType::None),
            (0x01, ChargeStatus::Charging, ChargeType::Fast),
            (0x02, ChargeStatus::Charging, ChargeType::Fast),
            (0x03, ChargeStatus::Charging, ChargeType::Trickle),
            (0x04, ChargeStatus::Full, ChargeType::None),
            (0x08, ChargeStatus::NotCharging, ChargeType::None),
            (0x0A, ChargeStatus::NotCharging, ChargeType::None),
            (0x09, ChargeStatus::Unknown, ChargeType::Unknown),
        ];

        for (details, status, charge_type) in expectations {
            let mut regs = charger_regs();
            regs.set(0xB4, details);
            let mut charger = Charger::new(&mut regs);

            assert_eq!(charger.status().unwrap(), status, "details = {details:#x}");
            assert_eq!(charger.charge_type().unwrap(), charge_type);
        }
    }

    #[test]
    fn health_mapping() {
        let expectations = [
            (0x30, Health::Good),
            (0x40, Health::Good),
            (0x10, Health::Dead),
            (0x20, Health::SafetyTimerExpire),
            (0x50, Health::Overvoltage),
            (0x60, Health::Overcurrent),
            (0x00, Health::Unknown),
            (0x70, Health::Unknown),
            (0xB0, Health::Overheat),
        ];

        for (details, health) in expectations {
            let mut regs = charger_regs();
            regs.set(0xB4, details);

            assert_eq!(
                Charger::new(&mut regs).health().unwrap(),
                health,
                "details = {details:#x}"
            );
        }
    }

    #[test]
    fn flags_and_diagnostics() {
        let mut regs = charger_regs();
        regs.set(0xB2, 0x44);
        regs.set(0xB5, 0xF3);
        regs.set(0xB7, 0xF5);

        let mut charger = Charger::new(&mut regs);
        assert_eq!(charger.online(), Ok(true));
        assert_eq!(charger.present(), Ok(true));
        assert_eq!(charger.bypass_details(), Ok(0x03));
        assert_eq!(charger.mode(), Ok(0x05));
        assert_eq!(
            charger.read_property(ChargerProperty::ModelName),
            Ok(ChargerPropertyValue::Text("max77818-chg"))
        );
    }

    #[test]
    fn set_mode_keeps_upper_bits() {
        let mut regs = charger_regs();
        regs.set(0xB7, 0x34);

        Charger::new(&mut regs).set_mode(0x05).unwrap();
        assert_eq!(regs.get(0xB7), 0x35);

        Charger::new(&mut regs).set_mode(0x1C).unwrap();
        assert_eq!(regs.get(0xB7), 0x3C);
    }

    #[test]
    fn setters_reject_out_of_range_before_writing() {
        let mut regs = charger_regs();
        let mut charger = Charger::new(&mut regs);

        assert_eq!(charger.set_fast_charge_timer(2), Err(Error::InvalidArgument));
        assert_eq!(charger.set_charge_current(50_000), Err(Error::InvalidArgument));
        assert_eq!(charger.set_otg_current_limit(1_000_000), Err(Error::InvalidArgument));
        assert_eq!(charger.set_topoff_current(400_000), Err(Error::InvalidArgument));
        assert_eq!(charger.set_topoff_timer(80), Err(Error::InvalidArgument));
        assert_eq!(
            charger.set_charge_termination_voltage(4_345_000),
            Err(Error::InvalidArgument)
        );
        assert_eq!(charger.set_min_system_voltage(3_000_000), Err(Error::InvalidArgument));
        assert_eq!(charger.set_thermal_regulation(90), Err(Error::InvalidArgument));
        assert_eq!(charger.set_chgin_current_limit(5_000_000), Err(Error::InvalidArgument));
        assert_eq!(charger.set_wcin_current_limit(20_000), Err(Error::InvalidArgument));
        assert_eq!(charger.set_battery_overcurrent(1_000_000), Err(Error::InvalidArgument));
        assert_eq!(
            charger.set_chgin_voltage_threshold(4_500_000),
            Err(Error::InvalidArgument)
        );

        assert!(regs.log().is_empty());
    }

    #[test]
    fn setter_encodings() {
        let mut regs = charger_regs();
        let mut charger = Charger::new(&mut regs);

        charger.set_charge_current(1_600_000).unwrap();
        charger.set_otg_current_limit(1_500_000).unwrap();
        charger.set_charge_termination_voltage(4_200_000).unwrap();
        charger.set_min_system_voltage(3_600_000).unwrap();
        charger.set_fast_charge_timer(16).unwrap();
        charger.set_chgin_voltage_threshold(4_800_000).unwrap();
        charger.set_battery_overcurrent(4_500_000).unwrap();

        assert_eq!(regs.get(0xB9), 0xC0 | 32);
        assert_eq!(regs.get(0xBB), 0x80 | 0x16);
        assert_eq!(regs.get(0xB8) & 0x07, 0x07);
        assert_eq!(regs.get(0xC3), 0x60 | (0x02 << 3) | 0x07);
    }

    #[test]
    fn termination_voltage_codes() {
        for (uv, code) in [
            (3_650_000, 0x00),
            (4_325_000, 0x1B),
            (4_340_000, 0x1C),
            (4_350_000, 0x1D),
            (4_700_000, 0x2B),
        ] {
            let mut regs = charger_regs();
            Charger::new(&mut regs)
                .set_charge_termination_voltage(uv)
                .unwrap();
            assert_eq!(regs.get(0xBB) & 0x3F, code, "uv = {uv}");
        }
    }

    #[test]
    fn reg_init_unlocks_and_locks() {
        let mut regs = charger_regs();

        Charger::new(&mut regs)
            .reg_init(&ChargerConfig::default())
            .unwrap();

        let protection = regs
            .writes()
            .filter(|(address, _)| *address == 0xBD)
            .map(|(_, value)| value)
            .collect::<Vec<_>>();
        assert_eq!(protection, [0x0C, 0x00]);
        assert_eq!(regs.get(0xC0), ((1_700_000 - 1_000) / 33_000) as u8);
        assert_eq!(regs.get(0xC1), 25);
        assert_eq!(regs.get(0xBE), 0x40);
    }

    #[test]
    fn reg_init_aborts_on_invalid_config() {
        let mut regs = charger_regs();
        let config = ChargerConfig {
            thermal_reg_temperature: 120,
            ..Default::default()
        };

        let result = Charger::new(&mut regs).reg_init(&config);

        assert_eq!(result, Err(Error::InvalidArgument));
        assert_eq!(regs.write_count(0xC0), 0);
        assert_eq!(regs.get(0xBD), 0x0C);
    }

    #[test]
    fn interrupt_reads_sources() {
        let mut regs = charger_regs();
        regs.set(0xB0, 0x50);

        let int = Charger::new(&mut regs).handle_interrupt().unwrap();

        assert_eq!(int.chgin().read(), Some(Event::Changed));
        assert_eq!(int.chg().read(), Some(Event::Changed));
        assert_eq!(int.bat().read(), Some(Event::Unchanged));
        assert_eq!(regs.read_count(0xB0), 1);
    }
}
