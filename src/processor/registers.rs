//! Eight general purpose byte registers. R7 doubles as the stack pointer.

use std::fmt;

use crate::error::MachineError;
use crate::memory::{Address, Byte};

/// Number of general purpose registers
pub const REGISTER_COUNT: usize = 8;

/// Index of the register reserved as stack pointer
pub const SP: Byte = 7;

/// Initial stack pointer, the stack grows downwards from here
pub const STACK_TOP: Address = 0xF4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Registers([Byte; REGISTER_COUNT]);

impl Registers {
    /// Reads register `index`
    ///
    /// `pc` only serves the error report if `index` is out of range.
    pub fn read(&self, index: Byte, pc: Address) -> Result<Byte, MachineError> {
        self.0
            .get(index as usize)
            .copied()
            .ok_or(MachineError::InvalidRegister { index, address: pc })
    }

    /// Writes `value` into register `index`
    pub fn write(&mut self, index: Byte, value: Byte, pc: Address) -> Result<(), MachineError> {
        let slot = self
            .0
            .get_mut(index as usize)
            .ok_or(MachineError::InvalidRegister { index, address: pc })?;
        *slot = value;
        Ok(())
    }

    pub fn sp(&self) -> Address {
        self.0[SP as usize]
    }

    pub fn set_sp(&mut self, value: Address) {
        self.0[SP as usize] = value;
    }
}

impl From<[Byte; REGISTER_COUNT]> for Registers {
    fn from(values: [Byte; REGISTER_COUNT]) -> Self {
        Registers(values)
    }
}

impl fmt::Display for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02X}", value)?;
        }
        Ok(())
    }
}
