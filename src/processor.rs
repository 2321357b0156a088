use std::convert::TryFrom;
use std::io::Write;

use crate::error::MachineError;
use crate::memory::{Address, Byte, Memory};
use log::*;
use num_enum::IntoPrimitive;
use num_enum::TryFromPrimitive;

pub mod alu;
pub mod registers;

use alu::{AluOp, AluOutput, Flag};
use registers::{Registers, STACK_TOP};

pub type Result<T, E = MachineError> = std::result::Result<T, E>;

/// Whether the dispatch loop keeps fetching instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Running,
    Halted,
}

/// Where control goes once a handler is done
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Skip past the opcode and its operands
    Next,
    /// Continue at an absolute address
    Jump(Address),
    /// Advance past the opcode and stop the dispatch loop
    Halt,
}

/// Emulates the LS-8 CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Processor {
    /// Program counter
    pub pc: Address,
    /// General purpose registers, R7 is the stack pointer
    pub registers: Registers,
    /// Outcome of the last CMP. `None` until the first compare
    pub flags: Option<Flag>,
    pub state: State,
}

impl Default for Processor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor {
    /// Initializes a CPU ready to run from address 0 with an empty stack
    pub fn new() -> Self {
        let mut registers = Registers::default();
        registers.set_sp(STACK_TOP);

        Self {
            pc: 0,
            registers,
            flags: None,
            state: State::Running,
        }
    }

    pub fn is_halted(&self) -> bool {
        self.state == State::Halted
    }

    /// Reads the operand `n` bytes after the opcode
    fn operand(&self, memory: &Memory, n: u8) -> Byte {
        memory.read_byte(self.pc.wrapping_add(n))
    }

    fn read_register(&self, index: Byte) -> Result<Byte> {
        self.registers.read(index, self.pc)
    }

    fn write_register(&mut self, index: Byte, value: Byte) -> Result<()> {
        self.registers.write(index, value, self.pc)
    }

    /// Decrements SP, then stores `value` at the new top of the stack
    fn push_byte(&mut self, memory: &mut Memory, value: Byte) {
        let sp = self.registers.sp().wrapping_sub(1);
        self.registers.set_sp(sp);
        memory.write_byte(sp, value);
    }

    /// Reads the top of the stack, then increments SP
    fn pop_byte(&mut self, memory: &Memory) -> Byte {
        let sp = self.registers.sp();
        let value = memory.read_byte(sp);
        self.registers.set_sp(sp.wrapping_add(1));
        value
    }

    fn ldi(&mut self, memory: &Memory) -> Result<Flow> {
        let reg = self.operand(memory, 1);
        let value = self.operand(memory, 2);
        self.write_register(reg, value)?;

        debug!("LDI R{} {}", reg, value);
        Ok(Flow::Next)
    }

    fn prn<W: Write>(&mut self, memory: &Memory, out: &mut W) -> Result<Flow> {
        let reg = self.operand(memory, 1);
        let value = self.read_register(reg)?;
        writeln!(out, "{}", value)?;

        debug!("PRN R{}: {}", reg, value);
        Ok(Flow::Next)
    }

    fn pra<W: Write>(&mut self, memory: &Memory, out: &mut W) -> Result<Flow> {
        let reg = self.operand(memory, 1);
        let value = self.read_register(reg)?;
        write!(out, "{}", value as char)?;

        debug!("PRA R{}: {:?}", reg, value as char);
        Ok(Flow::Next)
    }

    fn push(&mut self, memory: &mut Memory) -> Result<Flow> {
        let reg = self.operand(memory, 1);
        let value = self.read_register(reg)?;
        self.push_byte(memory, value);

        debug!("PUSH R{}: {} -> 0x{:02X}", reg, value, self.registers.sp());
        Ok(Flow::Next)
    }

    fn pop(&mut self, memory: &Memory) -> Result<Flow> {
        let reg = self.operand(memory, 1);
        // validate before the stack is touched
        self.read_register(reg)?;
        let value = self.pop_byte(memory);
        self.write_register(reg, value)?;

        debug!("POP R{}: {}", reg, value);
        Ok(Flow::Next)
    }

    fn call(&mut self, memory: &mut Memory) -> Result<Flow> {
        let reg = self.operand(memory, 1);
        let target = self.read_register(reg)?;
        let return_address = self.pc.wrapping_add(2);
        self.push_byte(memory, return_address);

        debug!("CALL R{}: 0x{:02X}, return to 0x{:02X}", reg, target, return_address);
        Ok(Flow::Jump(target))
    }

    fn ret(&mut self, memory: &Memory) -> Flow {
        let address = self.pop_byte(memory);

        debug!("RET 0x{:02X}", address);
        Flow::Jump(address)
    }

    fn ld(&mut self, memory: &Memory) -> Result<Flow> {
        let reg_a = self.operand(memory, 1);
        let reg_b = self.operand(memory, 2);
        let address = self.read_register(reg_b)?;
        let value = memory.read_byte(address);
        self.write_register(reg_a, value)?;

        debug!("LD R{} [0x{:02X}]: {}", reg_a, address, value);
        Ok(Flow::Next)
    }

    fn st(&mut self, memory: &mut Memory) -> Result<Flow> {
        let reg_a = self.operand(memory, 1);
        let reg_b = self.operand(memory, 2);
        let address = self.read_register(reg_a)?;
        let value = self.read_register(reg_b)?;
        memory.write_byte(address, value);

        debug!("ST [0x{:02X}] R{}: {}", address, reg_b, value);
        Ok(Flow::Next)
    }

    /// Jumps to the address in the operand register if `taken`
    fn jump_if(&mut self, instruction: Instruction, memory: &Memory, taken: bool) -> Result<Flow> {
        let reg = self.operand(memory, 1);
        let target = self.read_register(reg)?;

        debug!("{} R{}: 0x{:02X} taken={}", instruction, reg, target, taken);
        if taken {
            Ok(Flow::Jump(target))
        } else {
            Ok(Flow::Next)
        }
    }

    fn alu(&mut self, instruction: Instruction, memory: &Memory) -> Result<Flow> {
        let op = AluOp::try_from(instruction)?;
        let reg_a = self.operand(memory, 1);
        // single operand ALU instructions read and write the same register
        let reg_b = if instruction.operands() == 2 {
            self.operand(memory, 2)
        } else {
            reg_a
        };

        match alu::compute(op, &self.registers, reg_a, reg_b, self.pc)? {
            AluOutput::Value(value) => {
                self.write_register(reg_a, value)?;
                debug!("{} R{} R{}: {}", instruction, reg_a, reg_b, value);
            }
            AluOutput::Flags(flag) => {
                self.flags = Some(flag);
                debug!("{} R{} R{}: {}", instruction, reg_a, reg_b, flag);
            }
        }

        Ok(Flow::Next)
    }

    /// Executes a single, already decoded instruction
    pub fn execute_instruction<W: Write>(
        &mut self,
        instruction: Instruction,
        memory: &mut Memory,
        out: &mut W,
    ) -> Result<()> {
        let equal = self.flags == Some(Flag::Equal);
        let less = self.flags == Some(Flag::Less);
        let greater = self.flags == Some(Flag::Greater);

        let flow = match instruction {
            Instruction::HLT => {
                debug!("HLT");
                Flow::Halt
            }
            Instruction::LDI => self.ldi(memory)?,
            Instruction::PRN => self.prn(memory, out)?,
            Instruction::PRA => self.pra(memory, out)?,
            Instruction::PUSH => self.push(memory)?,
            Instruction::POP => self.pop(memory)?,
            Instruction::CALL => self.call(memory)?,
            Instruction::RET => self.ret(memory),
            Instruction::LD => self.ld(memory)?,
            Instruction::ST => self.st(memory)?,
            Instruction::JMP => self.jump_if(instruction, memory, true)?,
            Instruction::JEQ => self.jump_if(instruction, memory, equal)?,
            Instruction::JNE => self.jump_if(instruction, memory, !equal)?,
            Instruction::JGT => self.jump_if(instruction, memory, greater)?,
            Instruction::JLT => self.jump_if(instruction, memory, less)?,
            Instruction::JLE => self.jump_if(instruction, memory, less || equal)?,
            Instruction::JGE => self.jump_if(instruction, memory, greater || equal)?,
            Instruction::ADD
            | Instruction::SUB
            | Instruction::MUL
            | Instruction::DIV
            | Instruction::MOD
            | Instruction::INC
            | Instruction::DEC
            | Instruction::CMP
            | Instruction::AND
            | Instruction::OR
            | Instruction::XOR
            | Instruction::NOT
            | Instruction::SHL
            | Instruction::SHR => self.alu(instruction, memory)?,
        };

        match flow {
            Flow::Next => self.pc = self.pc.wrapping_add(instruction.width()),
            Flow::Jump(address) => self.pc = address,
            Flow::Halt => {
                self.pc = self.pc.wrapping_add(instruction.width());
                self.state = State::Halted;
            }
        }

        Ok(())
    }

    /// Runs one fetch-decode-execute step
    pub fn execute<W: Write>(&mut self, memory: &mut Memory, out: &mut W) -> Result<()> {
        let opcode = memory.read_byte(self.pc); // Read opcode where PC is
        let instruction = Instruction::try_from(opcode).map_err(|_| MachineError::InvalidOpcode {
            opcode,
            address: self.pc,
        })?;

        if log_enabled!(Level::Trace) {
            trace!("{}", self.trace(memory));
        }

        self.execute_instruction(instruction, memory, out)
    }

    /// Run program until HLT, returning the number of executed instructions
    pub fn execute_until_halt<W: Write>(&mut self, memory: &mut Memory, out: &mut W) -> Result<u64> {
        self.execute_with_limit(memory, out, None)
    }

    /// Like [`Processor::execute_until_halt`], but fails once `limit`
    /// instructions ran without reaching HLT
    pub fn execute_with_limit<W: Write>(
        &mut self,
        memory: &mut Memory,
        out: &mut W,
        limit: Option<u64>,
    ) -> Result<u64> {
        let mut steps = 0;
        while self.state == State::Running {
            if let Some(limit) = limit {
                if steps >= limit {
                    return Err(MachineError::StepLimitExceeded { limit });
                }
            }

            self.execute(memory, out)?;
            steps += 1;
        }

        out.flush()?;
        info!("Program halted after {} instructions at 0x{:02X}", steps, self.pc);

        Ok(steps)
    }

    /// Renders the CPU state in the format `TRACE: PC | IR OP1 OP2 | R0..R7 | FL`
    pub fn trace(&self, memory: &Memory) -> String {
        format!(
            "TRACE: {:02X} | {:02X} {:02X} {:02X} | {} | {:08b}",
            self.pc,
            memory.read_byte(self.pc),
            self.operand(memory, 1),
            self.operand(memory, 2),
            self.registers,
            Flag::bits(self.flags)
        )
    }
}

macro_rules! instructions {
    ( $( $( #[doc = $doc:expr] )+ $name:ident = $repr:literal , )+ ) => {
        /// Defines the instructions
        ///
        /// Opcodes follow the LS-8 layout `AABCDDDD`: `AA` is the number of
        /// operands, `B` marks ALU operations and `C` instructions which set
        /// the PC themselves.
        #[repr(u8)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[derive(TryFromPrimitive, IntoPrimitive)]
        pub enum Instruction {
            $(
                $( #[doc = $doc] )+
                $name = $repr,
            )+
        }

        impl Instruction {
            pub const ALL: &'static [Self] = &[
                $( Self::$name , )+
            ];
        }

        impl ::std::fmt::Display for Instruction {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $( Self::$name => f.write_str(stringify!($name)) , )+
                }
            }
        }
    }
}

instructions! {
    /// Halt the CPU
    HLT = 0b0000_0001,
    /// Pop the return address off the stack and jump there
    RET = 0b0001_0001,
    /// Push a register onto the stack
    /// @param reg
    PUSH = 0b0100_0101,
    /// Pop the top of the stack into a register
    /// @param reg
    POP = 0b0100_0110,
    /// Print the decimal value of a register
    /// @param reg
    PRN = 0b0100_0111,
    /// Print a register as an ASCII character
    /// @param reg
    PRA = 0b0100_1000,
    /// Push the address after this instruction and jump to a subroutine
    /// @param reg Holds the subroutine address
    CALL = 0b0101_0000,
    /// Jump to the address in a register
    /// @param reg
    JMP = 0b0101_0100,
    /// Jump if the last compare was equal
    /// @param reg
    JEQ = 0b0101_0101,
    /// Jump if the last compare was not equal
    /// @param reg
    JNE = 0b0101_0110,
    /// Jump if the last compare was greater
    /// @param reg
    JGT = 0b0101_0111,
    /// Jump if the last compare was less
    /// @param reg
    JLT = 0b0101_1000,
    /// Jump if the last compare was less or equal
    /// @param reg
    JLE = 0b0101_1001,
    /// Jump if the last compare was greater or equal
    /// @param reg
    JGE = 0b0101_1010,
    /// Increment a register
    /// @param reg
    INC = 0b0110_0101,
    /// Decrement a register
    /// @param reg
    DEC = 0b0110_0110,
    /// Bitwise NOT of a register
    /// @param reg
    NOT = 0b0110_1001,
    /// Load an immediate into a register
    /// @param reg
    /// @param value
    LDI = 0b1000_0010,
    /// Load a register from the address held in another register
    /// @param reg_a Destination
    /// @param reg_b Address
    LD = 0b1000_0011,
    /// Store a register at the address held in another register
    /// @param reg_a Address
    /// @param reg_b Value
    ST = 0b1000_0100,
    /// reg_a += reg_b
    ADD = 0b1010_0000,
    /// reg_a -= reg_b
    SUB = 0b1010_0001,
    /// reg_a *= reg_b
    MUL = 0b1010_0010,
    /// reg_a /= reg_b
    DIV = 0b1010_0011,
    /// reg_a %= reg_b
    MOD = 0b1010_0100,
    /// Compare two registers and set the flags
    CMP = 0b1010_0111,
    /// reg_a &= reg_b
    AND = 0b1010_1000,
    /// reg_a |= reg_b
    OR = 0b1010_1010,
    /// reg_a ^= reg_b
    XOR = 0b1010_1011,
    /// reg_a <<= reg_b
    SHL = 0b1010_1100,
    /// reg_a >>= reg_b
    SHR = 0b1010_1101,
}

impl Instruction {
    /// Number of operand bytes following the opcode
    pub fn operands(self) -> u8 {
        u8::from(self) >> 6
    }

    /// Bytes occupied by the opcode and its operands
    pub fn width(self) -> u8 {
        1 + self.operands()
    }

    pub fn is_alu(self) -> bool {
        u8::from(self) & 0b0010_0000 != 0
    }

    pub fn sets_pc(self) -> bool {
        u8::from(self) & 0b0001_0000 != 0
    }
}
