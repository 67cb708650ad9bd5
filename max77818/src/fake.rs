//! Fuel gauge register file that behaves like the model table and
//! model loader of the real part.

use heapless::Vec;
use register_access::{
    mock::{MockError, MockRegisters},
    RegisterAccess,
};

use crate::{calibration::OCV_TABLE_LENGTH, descriptors::fg::OCV_TABLE_START};

const MLOCK1: u8 = 0x62;
const MLOCK2: u8 = 0x63;
const CONFIG2: u8 = 0xBB;
const LD_MDL: u16 = 0x0020;

pub struct FakeGauge {
    pub regs: MockRegisters<u16>,
}

impl FakeGauge {
    /// The model load bit reads set three times after it was written, then clears.
    pub fn new() -> Self {
        let mut regs = MockRegisters::new();
        regs.clear_bits_after_reads(CONFIG2, LD_MDL, 3);
        Self { regs }
    }

    /// The model load bit never clears.
    pub fn stuck() -> Self {
        Self {
            regs: MockRegisters::new(),
        }
    }

    fn model_unlocked(&self) -> bool {
        self.regs.get(MLOCK1) == 0x0059 && self.regs.get(MLOCK2) == 0x00C4
    }

    fn is_model_table(address: u8) -> bool {
        (OCV_TABLE_START..OCV_TABLE_START + OCV_TABLE_LENGTH as u8).contains(&address)
    }

    /// Addresses written, in order, ignoring reads.
    pub fn written_addresses(&self) -> Vec<u8, 1024> {
        self.regs.writes().map(|(address, _)| address).collect()
    }
}

impl Default for FakeGauge {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulates requested delays instead of sleeping.
#[derive(Default)]
pub struct CountingDelay {
    pub elapsed_ns: u64,
}

impl CountingDelay {
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ns / 1_000_000
    }
}

impl embedded_hal::delay::DelayNs for CountingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += ns as u64;
    }
}

impl RegisterAccess<u16> for FakeGauge {
    type Error = MockError;

    fn read_raw(&mut self, address: u8) -> Result<u16, Self::Error> {
        let value = self.regs.read_raw(address)?;

        if Self::is_model_table(address) && !self.model_unlocked() {
            Ok(0)
        } else {
            Ok(value)
        }
    }

    fn write_raw(&mut self, address: u8, value: u16) -> Result<(), Self::Error> {
        self.regs.write_raw(address, value)
    }
}
