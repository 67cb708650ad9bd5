//! Battery model programming and learned parameter persistence.

use device_descriptor::ReadOnlyRegister;
use embedded_hal::delay::DelayNs;
use register_access::RegisterAccess;

use crate::{descriptors::fg, Error, FuelGauge};

pub const OCV_TABLE_LENGTH: usize = 48;

/// Open circuit voltage model, written to the locked table at 0x80..0xB0.
pub type ModelTable = [u16; OCV_TABLE_LENGTH];

const MODEL_UNLOCK1: u16 = 0x0059;
const MODEL_UNLOCK2: u16 = 0x00C4;
const MODEL_LOCK: u16 = 0x0000;

const MODEL_LOAD_POLL_MS: u32 = 1;
const MODEL_LOAD_BUDGET_MS: u32 = 6500;

/// dPAcc value written when restoring learned parameters.
const RESTORE_DPACC: u16 = 0x3200;

/// Registers the gauge adjusts over the life of the battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LearnedField {
    RComp0,
    TempCo,
    FullCapRep,
    Cycles,
    FullCapNom,
    QResidual00,
    QResidual10,
    QResidual20,
    QResidual30,
    CvMixCap,
    CvHalfTime,
}

impl LearnedField {
    pub const ALL: [Self; 11] = [
        Self::RComp0,
        Self::TempCo,
        Self::FullCapRep,
        Self::Cycles,
        Self::FullCapNom,
        Self::QResidual00,
        Self::QResidual10,
        Self::QResidual20,
        Self::QResidual30,
        Self::CvMixCap,
        Self::CvHalfTime,
    ];

    pub const fn address(self) -> u8 {
        match self {
            Self::RComp0 => fg::RComp0::ADDRESS,
            Self::TempCo => fg::TempCo::ADDRESS,
            Self::FullCapRep => fg::FullCapRep::ADDRESS,
            Self::Cycles => fg::Cycles::ADDRESS,
            Self::FullCapNom => fg::FullCapNom::ADDRESS,
            Self::QResidual00 => fg::QRTable00::ADDRESS,
            Self::QResidual10 => fg::QRTable10::ADDRESS,
            Self::QResidual20 => fg::QRTable20::ADDRESS,
            Self::QResidual30 => fg::QRTable30::ADDRESS,
            Self::CvMixCap => fg::CV_MixCap::ADDRESS,
            Self::CvHalfTime => fg::CV_HalfTime::ADDRESS,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::RComp0 => "rcomp0",
            Self::TempCo => "temp_co",
            Self::FullCapRep => "full_cap_rep",
            Self::Cycles => "cycles",
            Self::FullCapNom => "full_cap_nom",
            Self::QResidual00 => "qresidual00",
            Self::QResidual10 => "qresidual10",
            Self::QResidual20 => "qresidual20",
            Self::QResidual30 => "qresidual30",
            Self::CvMixCap => "cv_mixcap",
            Self::CvHalfTime => "cv_halftime",
        }
    }

    /// Maps a register address reported in [`Error::VerificationMismatch`]
    /// back to the field.
    pub fn from_address(address: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.address() == address)
    }
}

/// Raw register words of the learned parameters.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LearnedParams {
    pub rcomp0: u16,
    pub temp_co: u16,
    pub full_cap_rep: u16,
    pub cycles: u16,
    pub full_cap_nom: u16,
    pub qresidual00: u16,
    pub qresidual10: u16,
    pub qresidual20: u16,
    pub qresidual30: u16,
    pub cv_mixcap: u16,
    pub cv_halftime: u16,
}

impl LearnedParams {
    pub fn get(&self, field: LearnedField) -> u16 {
        match field {
            LearnedField::RComp0 => self.rcomp0,
            LearnedField::TempCo => self.temp_co,
            LearnedField::FullCapRep => self.full_cap_rep,
            LearnedField::Cycles => self.cycles,
            LearnedField::FullCapNom => self.full_cap_nom,
            LearnedField::QResidual00 => self.qresidual00,
            LearnedField::QResidual10 => self.qresidual10,
            LearnedField::QResidual20 => self.qresidual20,
            LearnedField::QResidual30 => self.qresidual30,
            LearnedField::CvMixCap => self.cv_mixcap,
            LearnedField::CvHalfTime => self.cv_halftime,
        }
    }

    pub fn set(&mut self, field: LearnedField, value: u16) {
        let slot = match field {
            LearnedField::RComp0 => &mut self.rcomp0,
            LearnedField::TempCo => &mut self.temp_co,
            LearnedField::FullCapRep => &mut self.full_cap_rep,
            LearnedField::Cycles => &mut self.cycles,
            LearnedField::FullCapNom => &mut self.full_cap_nom,
            LearnedField::QResidual00 => &mut self.qresidual00,
            LearnedField::QResidual10 => &mut self.qresidual10,
            LearnedField::QResidual20 => &mut self.qresidual20,
            LearnedField::QResidual30 => &mut self.qresidual30,
            LearnedField::CvMixCap => &mut self.cv_mixcap,
            LearnedField::CvHalfTime => &mut self.cv_halftime,
        };
        *slot = value;
    }
}

impl<R, E> FuelGauge<R>
where
    R: RegisterAccess<u16, Error = E>,
{
    /// Unlocks the model table, programs and verifies `table`, then locks it
    /// again. A locked table reads back as all zeros.
    pub fn write_model(&mut self, table: &ModelTable) -> Result<(), Error<E>> {
        self.write(fg::MLOCKReg1::ADDRESS, MODEL_UNLOCK1)?;
        self.write(fg::MLOCKReg2::ADDRESS, MODEL_UNLOCK2)?;

        for (address, word) in model_addresses().zip(table.iter().copied()) {
            self.write(address, word)?;
        }

        for (address, expected) in model_addresses().zip(table.iter().copied()) {
            let actual = self.read(address)?;
            if actual != expected {
                warn!("OCV table verify failed at {:#x}", address);
                return Err(Error::VerificationMismatch {
                    address,
                    expected,
                    actual,
                });
            }
        }

        self.write(fg::MLOCKReg1::ADDRESS, MODEL_LOCK)?;
        self.write(fg::MLOCKReg2::ADDRESS, MODEL_LOCK)?;

        for address in model_addresses() {
            if self.read(address)? != 0 {
                error!("OCV table model lock failed at {:#x}", address);
                return Err(Error::ModelLockFailed { address });
            }
        }

        debug!("OCV table written");
        Ok(())
    }

    /// Asks the gauge firmware to process the model and waits until it reports
    /// completion by clearing `LdMdl`.
    pub fn load_model(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<E>> {
        self.regs
            .modify_register::<fg::Config2>(|r| r.ld_mdl().write(fg::Bit::Set))?;

        let mut elapsed = 0;
        while elapsed < MODEL_LOAD_BUDGET_MS {
            delay.delay_ms(MODEL_LOAD_POLL_MS);
            elapsed += MODEL_LOAD_POLL_MS;

            let config2 = self.regs.read_register::<fg::Config2>()?;
            if config2.ld_mdl().read() == Some(fg::Bit::NotSet) {
                debug!("Model loaded after {} ms", elapsed);
                return Ok(());
            }
        }

        error!("Model load timed out");
        Err(Error::ModelLoadTimeout)
    }

    /// Reads one learned parameter from the gauge.
    pub fn read_learned(&mut self, field: LearnedField) -> Result<u16, Error<E>> {
        self.read(field.address())
    }

    /// Writes `params` back into the gauge and reloads the model. Stops at the
    /// first register that does not read back what was written.
    pub fn restore_learned(
        &mut self,
        params: &LearnedParams,
        delay: &mut impl DelayNs,
    ) -> Result<(), Error<E>> {
        self.write(fg::RComp0::ADDRESS, params.rcomp0)?;
        self.write(fg::TempCo::ADDRESS, params.temp_co)?;

        for field in [
            LearnedField::FullCapRep,
            LearnedField::Cycles,
            LearnedField::QResidual00,
            LearnedField::QResidual10,
            LearnedField::QResidual20,
            LearnedField::QResidual30,
            LearnedField::CvMixCap,
            LearnedField::CvHalfTime,
        ] {
            self.write_verify(field.address(), params.get(field))?;
        }

        self.write_verify(fg::dPAcc::ADDRESS, RESTORE_DPACC)?;
        self.write_verify(fg::dQAcc::ADDRESS, params.full_cap_nom / 4)?;

        self.load_model(delay)?;

        info!("Learned parameters restored");
        Ok(())
    }
}

fn model_addresses() -> impl Iterator<Item = u8> {
    (0..OCV_TABLE_LENGTH as u8).map(|offset| fg::OCV_TABLE_START + offset)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fake::{CountingDelay, FakeGauge};
    use device_descriptor::Register;

    fn ocv_table() -> ModelTable {
        let mut table = [0; OCV_TABLE_LENGTH];
        for (i, word) in table.iter_mut().enumerate() {
            *word = 0x9000 + i as u16;
        }
        table
    }

    #[test]
    fn model_table_is_written_and_locked() {
        let mut regs = FakeGauge::new();
        let table = ocv_table();

        FuelGauge::new(&mut regs).write_model(&table).unwrap();

        let writes = regs.regs.writes().collect::<Vec<_>>();
        assert_eq!(writes[0], (0x62, 0x0059));
        assert_eq!(writes[1], (0x63, 0x00C4));
        assert_eq!(writes[2], (0x80, 0x9000));
        assert_eq!(writes[49], (0xAF, 0x902F));
        assert_eq!(writes[50], (0x62, 0x0000));
        assert_eq!(writes[51], (0x63, 0x0000));
        assert_eq!(writes.len(), 52);
    }

    #[test]
    fn write_model_mismatch_does_not_lock() {
        let mut regs = FakeGauge::new();
        regs.regs.pin(0x85, 0xDEAD);

        let result = FuelGauge::new(&mut regs).write_model(&ocv_table());

        assert_eq!(
            result,
            Err(Error::VerificationMismatch {
                address: 0x85,
                expected: 0x9005,
                actual: 0xDEAD
            })
        );
        assert_eq!(regs.regs.write_count(0x62), 1);
        assert_eq!(regs.regs.write_count(0x63), 1);
    }

    #[test]
    fn write_model_detects_failed_lock() {
        let mut regs = FakeGauge::new();
        regs.regs.pin(0x62, 0x0059);
        regs.regs.pin(0x63, 0x00C4);

        let result = FuelGauge::new(&mut regs).write_model(&ocv_table());

        assert_eq!(result, Err(Error::ModelLockFailed { address: 0x80 }));
    }

    #[test]
    fn load_model_polls_live_bit() {
        let mut regs = FakeGauge::new();
        regs.regs.set(0xBB, fg::Config2::DEFAULT_VALUE);
        let mut delay = CountingDelay::default();

        FuelGauge::new(&mut regs).load_model(&mut delay).unwrap();

        assert_eq!(regs.regs.write_count(0xBB), 1);
        assert_eq!(regs.regs.get(0xBB), fg::Config2::DEFAULT_VALUE);
        assert_eq!(delay.elapsed_ms(), 4);
    }

    #[test]
    fn load_model_times_out() {
        let mut regs = FakeGauge::stuck();
        let mut delay = CountingDelay::default();

        let result = FuelGauge::new(&mut regs).load_model(&mut delay);

        assert_eq!(result, Err(Error::ModelLoadTimeout));
        assert_eq!(delay.elapsed_ms(), 6500);
    }

    #[test]
    fn restore_learned_sequence() {
        let mut regs = FakeGauge::new();
        let mut delay = CountingDelay::default();

        FuelGauge::new(&mut regs)
            .restore_learned(&LearnedParams::default(), &mut delay)
            .unwrap();

        assert_eq!(
            regs.written_addresses(),
            [0x38, 0x39, 0x35, 0x17, 0x12, 0x22, 0x32, 0x42, 0xB6, 0xB7, 0x46, 0x45, 0xBB]
        );
        assert_eq!(regs.regs.get(0x46), 0x3200);
        assert_eq!(regs.regs.get(0x45), 0x0000);
        assert_eq!(regs.regs.get(0xBB) & 0x0020, 0);
    }

    #[test]
    fn restore_learned_derives_dqacc() {
        let mut regs = FakeGauge::new();
        let params = LearnedParams {
            full_cap_nom: 0x0BB8,
            ..Default::default()
        };

        FuelGauge::new(&mut regs)
            .restore_learned(&params, &mut CountingDelay::default())
            .unwrap();

        assert_eq!(regs.regs.get(0x45), 0x0BB8 / 4);
    }

    #[test]
    fn restore_learned_stops_at_mismatch() {
        let mut regs = FakeGauge::new();
        regs.regs.pin(0x17, 0x0005);
        let params = LearnedParams {
            cycles: 0x0010,
            ..Default::default()
        };

        let result =
            FuelGauge::new(&mut regs).restore_learned(&params, &mut CountingDelay::default());

        assert_eq!(
            result,
            Err(Error::VerificationMismatch {
                address: 0x17,
                expected: 0x0010,
                actual: 0x0005
            })
        );
        assert_eq!(LearnedField::from_address(0x17), Some(LearnedField::Cycles));
        assert_eq!(regs.written_addresses(), [0x38, 0x39, 0x35, 0x17]);
    }

    #[test]
    fn learned_params_accessors() {
        let mut params = LearnedParams::default();
        for (i, field) in LearnedField::ALL.into_iter().enumerate() {
            params.set(field, i as u16 + 1);
        }

        assert_eq!(params.rcomp0, 1);
        assert_eq!(params.cv_halftime, 11);
        assert_eq!(params.get(LearnedField::QResidual20), 8);
    }
}
