//! Machine errors: decode faults, ALU faults and load failures.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::memory::parse::ParseError;
use crate::memory::{Address, Byte};
use crate::processor::Instruction;

/// Fatal conditions raised while loading or running a program
#[derive(Error, Debug)]
pub enum MachineError {
    #[error("invalid opcode 0x{opcode:02X} (0b{opcode:08b}) at address 0x{address:02X}")]
    InvalidOpcode { opcode: Byte, address: Address },
    #[error("{0} is not an ALU operation")]
    InvalidAluOperation(Instruction),
    #[error("division by zero at address 0x{address:02X}")]
    DivisionByZero { address: Address },
    #[error("invalid register R{index} at address 0x{address:02X}")]
    InvalidRegister { index: Byte, address: Address },
    #[error("program is {len} bytes but memory only holds {capacity}")]
    ProgramTooLarge { len: usize, capacity: usize },
    #[error("step limit of {limit} instructions exceeded")]
    StepLimitExceeded { limit: u64 },
    #[error("failed to write program output")]
    Output(#[from] io::Error),
}

/// Errors raised while turning a program file into a memory image
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read program file `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("program has {} malformed line(s)", .0.len())]
    Parse(Vec<ParseError>),
    #[error(transparent)]
    Machine(#[from] MachineError),
}

impl From<Vec<ParseError>> for LoadError {
    fn from(errors: Vec<ParseError>) -> Self {
        LoadError::Parse(errors)
    }
}
