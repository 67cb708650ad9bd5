//! Top level PMIC registers: identification and interrupt routing.

use device_descriptor::Proxy;
use register_access::RegisterAccess;

use crate::{
    descriptors::pmic::{self, Pending},
    ll::ByteI2cInterface,
    Error,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChipId {
    pub id: u8,
    pub version: u8,
    pub revision: u8,
}

/// Blocks with an interrupt waiting to be serviced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PendingSources {
    pub system: bool,
    pub fuel_gauge: bool,
    pub charger: bool,
}

impl PendingSources {
    pub fn any(&self) -> bool {
        self.system || self.fuel_gauge || self.charger
    }
}

pub struct Pmic<R> {
    regs: R,
}

impl<R> Pmic<R> {
    pub const fn new(regs: R) -> Self {
        Self { regs }
    }
}

impl<I> Pmic<ByteI2cInterface<I>> {
    pub const fn from_i2c(i2c: I) -> Self {
        Self::new(ByteI2cInterface::pmic(i2c))
    }
}

impl<R, E> Pmic<R>
where
    R: RegisterAccess<u8, Error = E>,
{
    pub fn read_chip_id(&mut self) -> Result<ChipId, Error<E>> {
        let id = self.regs.read_register::<pmic::PmicId>()?;
        let rev = self.regs.read_register::<pmic::PmicRev>()?;

        let chip = ChipId {
            id: id.bits(),
            version: rev.version().read_field_bits(),
            revision: rev.revision().read_field_bits(),
        };
        info!(
            "PMIC id {:#x}, version {}, revision {}",
            chip.id, chip.version, chip.revision
        );

        Ok(chip)
    }

    pub fn pending_sources(&mut self) -> Result<PendingSources, Error<E>> {
        let src = self.regs.read_register::<pmic::IntSrc>()?;

        Ok(PendingSources {
            system: src.sys().read() == Some(Pending::Pending),
            fuel_gauge: src.fg().read() == Some(Pending::Pending),
            charger: src.chgr().read() == Some(Pending::Pending),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use embedded_hal_mock::eh1::i2c::{Mock, Transaction};
    use register_access::mock::MockRegisters;

    #[test]
    fn chip_id_over_i2c() {
        let expectations = [
            Transaction::write_read(0x66, vec![0x20], vec![0x42]),
            Transaction::write_read(0x66, vec![0x21], vec![0x0B]),
        ];
        let mut i2c = Mock::new(&expectations);

        let chip = Pmic::from_i2c(&mut i2c).read_chip_id().unwrap();

        assert_eq!(
            chip,
            ChipId {
                id: 0x42,
                version: 0x01,
                revision: 0x03
            }
        );
        i2c.done();
    }

    #[test]
    fn interrupt_sources_are_decoded() {
        let mut regs = MockRegisters::<u8>::new();
        regs.set(0x22, 0x03);

        let pending = Pmic::new(&mut regs).pending_sources().unwrap();

        assert_eq!(
            pending,
            PendingSources {
                system: false,
                fuel_gauge: true,
                charger: true
            }
        );
        assert!(pending.any());

        regs.set(0x22, 0x00);
        assert!(!Pmic::new(&mut regs).pending_sources().unwrap().any());
    }
}
