//! Emulator for the LS-8, an 8-bit register machine with 256 bytes of RAM.
//!
//! ```
//! use ls8::Machine;
//!
//! let mut machine = Machine::new();
//! // LDI R0,8; PRN R0; HLT
//! machine.load(&[0x82, 0x00, 0x08, 0x47, 0x00, 0x01]).unwrap();
//!
//! let mut out: Vec<u8> = Vec::new();
//! machine.run_with_output(&mut out).unwrap();
//! assert_eq!(out, b"8\n");
//! ```

pub mod error;
pub mod machine;
pub mod memory;
pub mod processor;

pub use error::{LoadError, MachineError};
pub use machine::Machine;
