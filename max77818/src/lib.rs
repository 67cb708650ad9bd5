#![cfg_attr(not(test), no_std)]

//! Driver for the MAX77818 fuel gauge and charger blocks.

#[macro_use]
extern crate logger;

use device_descriptor::{ReadOnlyRegister, Register};
use register_access::RegisterAccess;

use crate::descriptors::fg;

pub mod calibration;
pub mod charger;
pub mod codec;
pub mod descriptors;
mod error;
pub mod init;
pub mod ll;
pub mod system;
pub mod telemetry;

#[cfg(any(test, feature = "mock"))]
pub mod fake;

pub use error::Error;

/// The ModelGauge m5 fuel gauge.
pub struct FuelGauge<R> {
    regs: R,
}

impl<R> FuelGauge<R> {
    pub const fn new(regs: R) -> Self {
        Self { regs }
    }

    pub fn inner_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    pub fn into_inner(self) -> R {
        self.regs
    }
}

impl<I> FuelGauge<ll::FuelGaugeI2cInterface<I>> {
    pub const fn from_i2c(i2c: I) -> Self {
        Self::new(ll::FuelGaugeI2cInterface::new(i2c))
    }
}

impl<R, E> FuelGauge<R>
where
    R: RegisterAccess<u16, Error = E>,
{
    pub(crate) fn read(&mut self, address: u8) -> Result<u16, Error<E>> {
        Ok(self.regs.read_raw(address)?)
    }

    pub(crate) fn write(&mut self, address: u8, value: u16) -> Result<(), Error<E>> {
        Ok(self.regs.write_raw(address, value)?)
    }

    /// Writes `value` and reads it back.
    pub(crate) fn write_verify(&mut self, address: u8, value: u16) -> Result<(), Error<E>> {
        self.write(address, value)?;

        let actual = self.read(address)?;
        if actual != value {
            warn!(
                "Verification failed at {:#x}: wrote {:#x}, read {:#x}",
                address, value, actual
            );
            return Err(Error::VerificationMismatch {
                address,
                expected: value,
                actual,
            });
        }

        Ok(())
    }

    pub fn read_status(&mut self) -> Result<fg::Status, Error<E>> {
        Ok(self.regs.read_register::<fg::Status>()?)
    }

    /// Alert flags are not cleared on read, the whole register is written low.
    pub fn clear_status(&mut self) -> Result<(), Error<E>> {
        self.write(fg::Status::ADDRESS, 0x0000)
    }

    pub fn set_temperature_alert(&mut self, thresholds: u16) -> Result<(), Error<E>> {
        self.write(fg::TAlrtTh::ADDRESS, thresholds)
    }

    /// Arms the temperature window `thresholds`, disables the voltage and state
    /// of charge windows and routes alerts to the ALRT pin.
    pub fn enable_alerts(&mut self, thresholds: u16) -> Result<(), Error<E>> {
        self.set_temperature_alert(thresholds)?;
        self.write(fg::VAlrtTh::ADDRESS, fg::VAlrtTh::DEFAULT_VALUE)?;
        self.write(fg::SAlrtTh::ADDRESS, fg::SAlrtTh::DEFAULT_VALUE)?;

        self.regs
            .update_register::<fg::Config>(|r| r.aen().update_bits(fg::Bit::Set))?;
        self.regs
            .update_register::<fg::Config2>(|r| r.dSOCen().update_bits(fg::Bit::Set))?;
        self.regs
            .update_register::<fg::Config2>(|r| r.t_alrt_en().update_bits(fg::Bit::Set))?;

        Ok(())
    }

    /// Raw auxiliary analog input measurement.
    pub fn ain0(&mut self) -> Result<u16, Error<E>> {
        self.read(fg::AIN0::ADDRESS)
    }
}
