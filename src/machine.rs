//! Memory and CPU bundled behind the load/run interface.

use std::io::{self, Write};
use std::path::Path;

use log::*;

use crate::error::{LoadError, MachineError};
use crate::memory::{Address, Byte, Memory};
use crate::processor::alu::Flag;
use crate::processor::registers::Registers;
use crate::processor::Processor;

/// An LS-8 computer: 256 bytes of RAM and one CPU
#[derive(Debug, Clone, Default)]
pub struct Machine {
    cpu: Processor,
    memory: Memory,
    step_limit: Option<u64>,
}

impl Machine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a machine with the program file at `path` already loaded
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        Ok(Self {
            memory: Memory::from_file(path)?,
            ..Self::default()
        })
    }

    /// Stops [`Machine::run`] with [`MachineError::StepLimitExceeded`] after
    /// `limit` instructions
    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = Some(limit);
        self
    }

    /// Copies `program` into memory starting at address 0
    ///
    /// # Errors
    ///
    /// Programs longer than the memory are rejected without touching it.
    pub fn load(&mut self, program: &[Byte]) -> Result<(), MachineError> {
        self.memory.load(program)
    }

    /// Runs until HLT, printing to stdout
    pub fn run(&mut self) -> Result<u64, MachineError> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        self.run_with_output(&mut handle)
    }

    /// Runs until HLT, sending PRN/PRA output to `out`
    pub fn run_with_output<W: Write>(&mut self, out: &mut W) -> Result<u64, MachineError> {
        debug!("Starting at 0x{:02X}, SP 0x{:02X}", self.cpu.pc, self.cpu.registers.sp());
        self.cpu
            .execute_with_limit(&mut self.memory, out, self.step_limit)
    }

    pub fn is_halted(&self) -> bool {
        self.cpu.is_halted()
    }

    pub fn pc(&self) -> Address {
        self.cpu.pc
    }

    pub fn registers(&self) -> &Registers {
        &self.cpu.registers
    }

    pub fn flags(&self) -> Option<Flag> {
        self.cpu.flags
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }
}
