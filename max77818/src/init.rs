//! Power-on configuration of the fuel gauge.

use device_descriptor::{ReadOnlyRegister, Register};
use embedded_hal::delay::DelayNs;
use register_access::RegisterAccess;

use crate::{
    calibration::ModelTable,
    descriptors::fg,
    Error, FuelGauge,
};

/// Battery specific register values programmed after a power-on reset.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FuelGaugeConfig {
    pub design_cap: u16,
    pub config: u16,
    pub config2: u16,
    pub dpacc: u16,
    pub dqacc: u16,
    pub filter_cfg: u16,
    pub full_cap_nom: u16,
    pub full_cap_rep: u16,
    pub full_soc_thr: u16,
    pub iavg_empty: u16,
    pub i_chg_term: u16,
    pub learn_cfg: u16,
    pub qresidual00: u16,
    pub qresidual10: u16,
    pub qresidual20: u16,
    pub qresidual30: u16,
    pub rcomp0: u16,
    pub relax_cfg: u16,
    pub temp_co: u16,
    pub v_empty: u16,
    pub tgain: u16,
    pub toff: u16,
    pub curve: u16,
    pub at_rate: u16,
    pub smartchgcfg: u16,
    pub convg_cfg: u16,
    /// 0 means the battery has no constant voltage charge parameters.
    pub cv_mixcap: u16,
    pub cv_halftime: u16,
    /// TAlrtTh values for the three thermal states.
    pub talrt_low: u16,
    pub talrt_norm: u16,
    pub talrt_high: u16,
    pub battery_ocv_model: ModelTable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitOutcome {
    /// POR was not set, nothing was written.
    AlreadyConfigured,
    Configured,
}

impl<R, E> FuelGauge<R>
where
    R: RegisterAccess<u16, Error = E>,
{
    /// Loads the battery model and the recommended configuration if the gauge
    /// has been reset since it was last configured.
    pub fn reg_init(
        &mut self,
        config: &FuelGaugeConfig,
        delay: &mut impl DelayNs,
    ) -> Result<InitOutcome, Error<E>> {
        let status = self.read_status()?;
        if status.por().read() != Some(fg::PowerOnReset::Reset) {
            debug!("Fuel gauge already set up");
            return Ok(InitOutcome::AlreadyConfigured);
        }

        info!("Fuel gauge power-on reset detected, loading battery model");

        self.write_model(&config.battery_ocv_model)?;

        self.write(fg::RepCap::ADDRESS, 0x0000)?;

        let vfsoc = self.read(fg::VFSOC::ADDRESS)?;
        self.write_verify(fg::VFSOC0::ADDRESS, vfsoc)?;

        self.write(fg::DesignCap::ADDRESS, config.design_cap)?;
        self.write(fg::Config::ADDRESS, config.config)?;
        self.write(fg::Config2::ADDRESS, config.config2)?;
        self.write_verify(fg::dQAcc::ADDRESS, config.dqacc)?;
        self.write_verify(fg::dPAcc::ADDRESS, config.dpacc)?;
        self.write(fg::FilterCfg::ADDRESS, config.filter_cfg)?;
        self.write_verify(fg::FullCapNom::ADDRESS, config.full_cap_nom)?;
        self.write_verify(fg::FullCapRep::ADDRESS, config.full_cap_rep)?;
        self.write(fg::FullSocThr::ADDRESS, config.full_soc_thr)?;
        self.write(fg::IAvgEmpty::ADDRESS, config.iavg_empty)?;
        self.write(fg::IChgTerm::ADDRESS, config.i_chg_term)?;
        self.write(fg::LearnCfg::ADDRESS, config.learn_cfg)?;
        self.write_verify(fg::QRTable00::ADDRESS, config.qresidual00)?;
        self.write_verify(fg::QRTable10::ADDRESS, config.qresidual10)?;
        self.write_verify(fg::QRTable20::ADDRESS, config.qresidual20)?;
        self.write_verify(fg::QRTable30::ADDRESS, config.qresidual30)?;
        self.write_verify(fg::RComp0::ADDRESS, config.rcomp0)?;
        self.write(fg::RelaxCfg::ADDRESS, config.relax_cfg)?;
        self.write_verify(fg::TempCo::ADDRESS, config.temp_co)?;
        self.write(fg::VEmpty::ADDRESS, config.v_empty)?;
        self.write(fg::TGain::ADDRESS, config.tgain)?;
        self.write(fg::TOff::ADDRESS, config.toff)?;
        self.write(fg::Curve::ADDRESS, config.curve)?;

        // Restart the min/max temperature tracker.
        self.regs.write_register(fg::MaxMinTemp::default())?;

        let vfsoc0_enabled = fg::VFSOC0Enable::new(|r| r.enable().write(fg::Bit::Set));
        self.regs.write_register(vfsoc0_enabled)?;
        self.write(fg::AtRate::ADDRESS, config.at_rate)?;

        if config.cv_mixcap != 0 {
            self.write_verify(fg::CV_MixCap::ADDRESS, config.cv_mixcap)?;
            self.write_verify(fg::CV_HalfTime::ADDRESS, config.cv_halftime)?;
        }

        self.write(fg::SmartChgCfg::ADDRESS, config.smartchgcfg)?;
        self.write(fg::ConvgCfg::ADDRESS, config.convg_cfg)?;
        self.regs.write_register(fg::VFSOC0Enable::default())?;

        self.load_model(delay)?;

        self.regs.update_register::<fg::Status>(|r| {
            r.por().update_bits(fg::PowerOnReset::NoReset)
        })?;

        info!("Fuel gauge configured");
        Ok(InitOutcome::Configured)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        calibration::OCV_TABLE_LENGTH,
        fake::{CountingDelay, FakeGauge},
    };

    fn sample_config() -> FuelGaugeConfig {
        FuelGaugeConfig {
            design_cap: 0x0BB8,
            config: 0x2210,
            config2: 0x3658,
            dpacc: 0x0C80,
            dqacc: 0x02EE,
            filter_cfg: 0xCEA4,
            full_cap_nom: 0x0BB8,
            full_cap_rep: 0x0BB8,
            full_soc_thr: 0x5F05,
            iavg_empty: 0xFA9C,
            i_chg_term: 0x0333,
            learn_cfg: 0x4486,
            qresidual00: 0x1050,
            qresidual10: 0x0812,
            qresidual20: 0x0306,
            qresidual30: 0x0304,
            rcomp0: 0x0070,
            relax_cfg: 0x2039,
            temp_co: 0x223E,
            v_empty: 0xA561,
            tgain: 0xEE56,
            toff: 0x1DA4,
            curve: 0x0025,
            at_rate: 0x0000,
            smartchgcfg: 0x0000,
            convg_cfg: 0x2241,
            cv_mixcap: 0,
            cv_halftime: 0,
            talrt_low: 0x0A00,
            talrt_norm: 0x2D05,
            talrt_high: 0x7F28,
            battery_ocv_model: [0x9A00; OCV_TABLE_LENGTH],
        }
    }

    #[test]
    fn no_por_is_noop() {
        let mut regs = FakeGauge::new();
        regs.regs.set(0x00, 0x0000);

        let outcome = FuelGauge::new(&mut regs)
            .reg_init(&sample_config(), &mut CountingDelay::default())
            .unwrap();

        assert_eq!(outcome, InitOutcome::AlreadyConfigured);
        assert_eq!(regs.regs.writes().count(), 0);
    }

    #[test]
    fn init_sequence() {
        let mut regs = FakeGauge::new();
        regs.regs.set(0x00, 0x0002);
        regs.regs.set(0xFF, 0x3200);
        let config = sample_config();

        let outcome = FuelGauge::new(&mut regs)
            .reg_init(&config, &mut CountingDelay::default())
            .unwrap();
        assert_eq!(outcome, InitOutcome::Configured);

        let after_model = regs
            .written_addresses()
            .into_iter()
            .skip(2 + OCV_TABLE_LENGTH + 2)
            .collect::<Vec<_>>();
        assert_eq!(
            after_model,
            [
                0x05, 0x48, 0x18, 0x1D, 0xBB, 0x45, 0x46, 0x29, 0x23, 0x35, 0x13, 0x36, 0x1E,
                0x28, 0x12, 0x22, 0x32, 0x42, 0x38, 0x2A, 0x39, 0x3A, 0x2C, 0x2D, 0xB9, 0x1A,
                0x60, 0x04, 0xDB, 0x49, 0x60, 0xBB, 0x00
            ]
        );

        assert_eq!(regs.regs.get(0x48), 0x3200);
        assert_eq!(regs.regs.get(0x1A), 0x007F);
        assert_eq!(regs.regs.get(0x60), 0x0000);
        assert_eq!(regs.regs.get(0x00) & 0x0002, 0);
        assert_eq!(regs.regs.write_count(0xB6), 0);
    }

    #[test]
    fn init_is_idempotent() {
        let mut regs = FakeGauge::new();
        regs.regs.set(0x00, 0x0002);
        let config = sample_config();
        let mut delay = CountingDelay::default();

        let mut gauge = FuelGauge::new(&mut regs);
        assert_eq!(
            gauge.reg_init(&config, &mut delay),
            Ok(InitOutcome::Configured)
        );
        assert_eq!(
            gauge.reg_init(&config, &mut delay),
            Ok(InitOutcome::AlreadyConfigured)
        );
    }

    #[test]
    fn init_writes_cv_parameters_when_present() {
        let mut regs = FakeGauge::new();
        regs.regs.set(0x00, 0x0002);
        let config = FuelGaugeConfig {
            cv_mixcap: 0x0600,
            cv_halftime: 0x0A00,
            ..sample_config()
        };

        FuelGauge::new(&mut regs)
            .reg_init(&config, &mut CountingDelay::default())
            .unwrap();

        assert_eq!(regs.regs.get(0xB6), 0x0600);
        assert_eq!(regs.regs.get(0xB7), 0x0A00);
    }

    #[test]
    fn init_aborts_on_verification_failure() {
        let mut regs = FakeGauge::new();
        regs.regs.set(0x00, 0x0002);
        regs.regs.pin(0x23, 0x0000);

        let result =
            FuelGauge::new(&mut regs).reg_init(&sample_config(), &mut CountingDelay::default());

        assert_eq!(
            result,
            Err(Error::VerificationMismatch {
                address: 0x23,
                expected: 0x0BB8,
                actual: 0x0000
            })
        );
        assert_eq!(regs.regs.write_count(0x35), 0);
        assert_eq!(regs.regs.get(0x00) & 0x0002, 0x0002);
    }
}
