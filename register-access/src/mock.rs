//! In-memory register file.
//!
//! Every access is recorded. Individual registers can be pinned to a value,
//! made to drop bits some number of reads after they were written, or made to
//! fail, so that multi-step register protocols can be exercised on the host.

use device_descriptor::RegisterWidthType;
use heapless::Vec;

use crate::RegisterAccess;

const LOG_DEPTH: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access<RWT> {
    Read(u8),
    Write(u8, RWT),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    Read(u8),
    Write(u8),
}

struct SelfClearing<RWT> {
    address: u8,
    mask: RWT,
    after_reads: u32,
    remaining: u32,
}

pub struct MockRegisters<RWT: RegisterWidthType> {
    values: [RWT; 256],
    log: Vec<Access<RWT>, LOG_DEPTH>,
    pinned: Vec<(u8, RWT), 16>,
    self_clearing: Vec<SelfClearing<RWT>, 4>,
    failing_reads: Vec<u8, 8>,
    failing_writes: Vec<u8, 8>,
}

impl<RWT: RegisterWidthType> Default for MockRegisters<RWT> {
    fn default() -> Self {
        Self::new()
    }
}

impl<RWT: RegisterWidthType> MockRegisters<RWT> {
    pub fn new() -> Self {
        Self {
            values: [RWT::from_32(0); 256],
            log: Vec::new(),
            pinned: Vec::new(),
            self_clearing: Vec::new(),
            failing_reads: Vec::new(),
            failing_writes: Vec::new(),
        }
    }

    /// Sets a register without recording an access.
    pub fn set(&mut self, address: u8, value: RWT) {
        self.values[address as usize] = value;
    }

    /// Returns a register without recording an access.
    pub fn get(&self, address: u8) -> RWT {
        self.pinned_value(address)
            .unwrap_or(self.values[address as usize])
    }

    /// Reads of `address` always return `value`, writes are recorded but dropped.
    pub fn pin(&mut self, address: u8, value: RWT) {
        self.pinned.retain(|(a, _)| *a != address);
        let _ = self.pinned.push((address, value));
    }

    /// Bits in `mask` clear on their own once `address` has been read
    /// `after_reads` times since the last write.
    pub fn clear_bits_after_reads(&mut self, address: u8, mask: RWT, after_reads: u32) {
        let _ = self.self_clearing.push(SelfClearing {
            address,
            mask,
            after_reads,
            remaining: after_reads,
        });
    }

    pub fn fail_reads_at(&mut self, address: u8) {
        let _ = self.failing_reads.push(address);
    }

    pub fn fail_writes_at(&mut self, address: u8) {
        let _ = self.failing_writes.push(address);
    }

    /// Undoes [`Self::fail_reads_at`] and [`Self::fail_writes_at`] for `address`.
    pub fn stop_failing(&mut self, address: u8) {
        self.failing_reads.retain(|a| *a != address);
        self.failing_writes.retain(|a| *a != address);
    }

    pub fn log(&self) -> &[Access<RWT>] {
        &self.log
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    pub fn writes(&self) -> impl Iterator<Item = (u8, RWT)> + '_ {
        self.log.iter().filter_map(|access| match *access {
            Access::Write(address, value) => Some((address, value)),
            Access::Read(_) => None,
        })
    }

    pub fn write_count(&self, address: u8) -> usize {
        self.writes().filter(|(a, _)| *a == address).count()
    }

    pub fn read_count(&self, address: u8) -> usize {
        self.log
            .iter()
            .filter(|access| **access == Access::Read(address))
            .count()
    }

    fn pinned_value(&self, address: u8) -> Option<RWT> {
        self.pinned
            .iter()
            .find(|(a, _)| *a == address)
            .map(|(_, value)| *value)
    }

    fn record(&mut self, access: Access<RWT>) {
        let _ = self.log.push(access);
    }
}

impl<RWT: RegisterWidthType> RegisterAccess<RWT> for MockRegisters<RWT> {
    type Error = MockError;

    fn read_raw(&mut self, address: u8) -> Result<RWT, Self::Error> {
        if self.failing_reads.contains(&address) {
            return Err(MockError::Read(address));
        }
        self.record(Access::Read(address));

        for entry in self.self_clearing.iter_mut() {
            if entry.address != address {
                continue;
            }
            if entry.remaining == 0 {
                let value = self.values[address as usize].to_32() & !entry.mask.to_32();
                self.values[address as usize] = RWT::from_32(value);
            } else {
                entry.remaining -= 1;
            }
        }

        Ok(self.get(address))
    }

    fn write_raw(&mut self, address: u8, value: RWT) -> Result<(), Self::Error> {
        if self.failing_writes.contains(&address) {
            return Err(MockError::Write(address));
        }
        self.record(Access::Write(address, value));

        for entry in self.self_clearing.iter_mut() {
            if entry.address == address {
                entry.remaining = entry.after_reads;
            }
        }

        if self.pinned_value(address).is_none() {
            self.values[address as usize] = value;
        }

        Ok(())
    }
}
