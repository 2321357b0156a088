use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::*;

use crate::error::{LoadError, MachineError};

pub mod parse;

pub type Byte = u8; // 1 byte
pub type Address = u8; // the whole address space fits in a byte

/// Number of addressable cells
pub const MEMORY_SIZE: usize = 256;

/// Emulates the 256 byte RAM of the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Memory {
    /// The actual data of the memory
    pub data: [Byte; MEMORY_SIZE],
}

impl Default for Memory {
    /// Initializes zeroed memory
    fn default() -> Self {
        Memory {
            data: [0; MEMORY_SIZE],
        }
    }
}

impl Memory {
    /// Reads a byte from the memory
    pub fn read_byte(&self, position: Address) -> Byte {
        self.data[position as usize]
    }

    /// Writes a byte to the memory
    pub fn write_byte(&mut self, position: Address, value: Byte) {
        self.data[position as usize] = value;
    }

    /// Writes an array of bytes to the memory
    ///
    /// # Errors
    ///
    /// Fails with [`MachineError::ProgramTooLarge`] if `data` would run past
    /// the last address. Memory is left untouched in that case.
    pub fn write_array(&mut self, position: Address, data: &[Byte]) -> Result<(), MachineError> {
        let start = position as usize;
        let end = start + data.len();
        if end > MEMORY_SIZE {
            return Err(MachineError::ProgramTooLarge {
                len: data.len(),
                capacity: MEMORY_SIZE - start,
            });
        }

        self.data[start..end].copy_from_slice(data);
        Ok(())
    }

    /// Copies a program image into memory starting at address 0
    pub fn load(&mut self, program: &[Byte]) -> Result<(), MachineError> {
        self.write_array(0, program)?;
        debug!("Loaded {} bytes", program.len());
        Ok(())
    }

    /// Reads and parses a program file into a fresh memory image
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        source.parse()
    }

    /// Renders the memory as hex, 16 bytes per row
    pub fn dump_rows(&self) -> Vec<String> {
        self.data
            .chunks(16)
            .enumerate()
            .map(|(row, chunk)| {
                let bytes: Vec<String> = chunk.iter().map(|b| format!("{:02X}", b)).collect();
                format!("{:02X}: {}", row * 16, bytes.join(" "))
            })
            .collect()
    }

    /// Logs [`Memory::dump_rows`] at info level
    pub fn dump(&self) {
        for row in self.dump_rows() {
            info!("{}", row);
        }
    }
}

impl FromStr for Memory {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let program = parse::Parser::new(s).parse()?;
        let mut memory = Memory::default();
        memory.load(&program)?;
        Ok(memory)
    }
}

/// Writes a block of instructions directly into the memory
#[macro_export]
macro_rules! write_instructions {
    ( $mem:ident : $pos:expr => $( $byte:expr ),+ ) => {
        $mem.write_array($pos, &[
            $(
                $byte as $crate::memory::Byte,
            )+
        ])
    };
}
