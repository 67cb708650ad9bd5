#![no_std]

use device_descriptor::{ReadOnlyRegister, Register, RegisterWidthType};

#[cfg(any(test, feature = "mock"))]
pub mod mock;

/// Blocking access to one register space of a device.
pub trait RegisterAccess<RWT>
where
    RWT: RegisterWidthType,
{
    type Error;

    fn read_raw(&mut self, address: u8) -> Result<RWT, Self::Error>;
    fn write_raw(&mut self, address: u8, value: RWT) -> Result<(), Self::Error>;

    /// Read-modify-write of the bits selected by `mask`. The write is skipped
    /// if the register already holds the requested bits.
    fn update_bits(&mut self, address: u8, mask: RWT, value: RWT) -> Result<(), Self::Error> {
        let current = self.read_raw(address)?.to_32();
        let mask = mask.to_32();
        let updated = (current & !mask) | (value.to_32() & mask);

        if updated != current {
            self.write_raw(address, RWT::from_32(updated))?;
        }

        Ok(())
    }

    fn read_register<R>(&mut self) -> Result<R, Self::Error>
    where
        R: ReadOnlyRegister<RegisterWidth = RWT>,
    {
        self.read_raw(R::ADDRESS).map(R::from_bits)
    }

    fn write_register<R>(&mut self, reg: R) -> Result<(), Self::Error>
    where
        R: Register<RegisterWidth = RWT>,
    {
        self.write_raw(R::ADDRESS, reg.bits())
    }

    /// Read-modify-write of the `(mask, bits)` pair `f` builds from a zeroed
    /// register, usually with `Field::update_bits`.
    fn update_register<R>(&mut self, f: impl FnOnce(R) -> (RWT, RWT)) -> Result<(), Self::Error>
    where
        R: Register<RegisterWidth = RWT>,
    {
        let (mask, value) = f(R::from_bits(RWT::from_32(0)));
        self.update_bits(R::ADDRESS, mask, value)
    }

    fn modify_register<R>(&mut self, f: impl FnOnce(R) -> R) -> Result<(), Self::Error>
    where
        R: Register<RegisterWidth = RWT>,
    {
        let reg = self.read_register::<R>()?;
        self.write_register(f(reg))
    }
}

impl<RWT, T> RegisterAccess<RWT> for &mut T
where
    RWT: RegisterWidthType,
    T: RegisterAccess<RWT> + ?Sized,
{
    type Error = T::Error;

    fn read_raw(&mut self, address: u8) -> Result<RWT, Self::Error> {
        (**self).read_raw(address)
    }

    fn write_raw(&mut self, address: u8, value: RWT) -> Result<(), Self::Error> {
        (**self).write_raw(address, value)
    }

    fn update_bits(&mut self, address: u8, mask: RWT, value: RWT) -> Result<(), Self::Error> {
        (**self).update_bits(address, mask, value)
    }
}

pub trait RegisterReader<RWT>: Sized
where
    RWT: RegisterWidthType,
{
    fn read<E>(iface: &mut impl RegisterAccess<RWT, Error = E>) -> Result<Self, E>;
}

pub trait RegisterWriter<RWT>
where
    RWT: RegisterWidthType,
{
    fn write<E>(self, iface: &mut impl RegisterAccess<RWT, Error = E>) -> Result<(), E>;
}

impl<T> RegisterReader<T::RegisterWidth> for T
where
    T: ReadOnlyRegister,
{
    fn read<E>(iface: &mut impl RegisterAccess<T::RegisterWidth, Error = E>) -> Result<Self, E> {
        iface.read_register()
    }
}

impl<T> RegisterWriter<T::RegisterWidth> for T
where
    T: Register,
{
    fn write<E>(
        self,
        iface: &mut impl RegisterAccess<T::RegisterWidth, Error = E>,
    ) -> Result<(), E> {
        iface.write_register(self)
    }
}
