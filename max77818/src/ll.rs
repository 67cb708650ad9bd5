//! I2C transports for the three register spaces.

use embedded_hal::i2c::I2c;
use register_access::RegisterAccess;

/// Fuel gauge block: 16 bit little endian registers.
pub struct FuelGaugeI2cInterface<I> {
    pub i2c: I,
}

impl<I> FuelGaugeI2cInterface<I> {
    pub const DEVICE_ADDR: u8 = 0x36;

    pub const fn new(i2c: I) -> Self {
        Self { i2c }
    }
}

impl<I> RegisterAccess<u16> for FuelGaugeI2cInterface<I>
where
    I: I2c,
{
    type Error = I::Error;

    fn read_raw(&mut self, address: u8) -> Result<u16, Self::Error> {
        let mut buffer = [0; 2];
        self.i2c
            .write_read(Self::DEVICE_ADDR, &[address], &mut buffer)?;
        Ok(u16::from_le_bytes(buffer))
    }

    fn write_raw(&mut self, address: u8, value: u16) -> Result<(), Self::Error> {
        let [low, high] = value.to_le_bytes();
        self.i2c.write(Self::DEVICE_ADDR, &[address, low, high])
    }
}

/// Charger and top level PMIC blocks: 8 bit registers behind separate
/// device addresses.
pub struct ByteI2cInterface<I> {
    pub i2c: I,
    device_addr: u8,
}

impl<I> ByteI2cInterface<I> {
    pub const CHARGER_ADDR: u8 = 0x69;
    pub const PMIC_ADDR: u8 = 0x66;

    pub const fn charger(i2c: I) -> Self {
        Self {
            i2c,
            device_addr: Self::CHARGER_ADDR,
        }
    }

    pub const fn pmic(i2c: I) -> Self {
        Self {
            i2c,
            device_addr: Self::PMIC_ADDR,
        }
    }

    pub fn device_addr(&self) -> u8 {
        self.device_addr
    }
}

impl<I> RegisterAccess<u8> for ByteI2cInterface<I>
where
    I: I2c,
{
    type Error = I::Error;

    fn read_raw(&mut self, address: u8) -> Result<u8, Self::Error> {
        let mut buffer = [0; 1];
        self.i2c.write_read(self.device_addr, &[address], &mut buffer)?;
        Ok(buffer[0])
    }

    fn write_raw(&mut self, address: u8, value: u8) -> Result<(), Self::Error> {
        self.i2c.write(self.device_addr, &[address, value])
    }
}
