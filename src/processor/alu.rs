//! Arithmetic, bitwise and compare operations over two registers.

use std::cmp::Ordering;
use std::convert::TryFrom;
use std::fmt;

use super::registers::Registers;
use super::Instruction;
use crate::error::MachineError;
use crate::memory::{Address, Byte};

/// Result of the last compare
///
/// The discriminants match the bits of the LS-8 `FL` register.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    Less = 0b100,
    Greater = 0b010,
    Equal = 0b001,
}

impl Flag {
    pub fn bits(flag: Option<Flag>) -> Byte {
        flag.map_or(0, |flag| flag as Byte)
    }
}

impl From<Ordering> for Flag {
    fn from(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => Flag::Less,
            Ordering::Greater => Flag::Greater,
            Ordering::Equal => Flag::Equal,
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flag::Less => f.write_str("LESS"),
            Flag::Greater => f.write_str("GREATER"),
            Flag::Equal => f.write_str("EQUAL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AluOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Not,
    Shl,
    Shr,
    Inc,
    Dec,
    Cmp,
}

impl TryFrom<Instruction> for AluOp {
    type Error = MachineError;

    fn try_from(instruction: Instruction) -> Result<Self, Self::Error> {
        let op = match instruction {
            Instruction::ADD => AluOp::Add,
            Instruction::SUB => AluOp::Sub,
            Instruction::MUL => AluOp::Mul,
            Instruction::DIV => AluOp::Div,
            Instruction::MOD => AluOp::Mod,
            Instruction::AND => AluOp::And,
            Instruction::OR => AluOp::Or,
            Instruction::XOR => AluOp::Xor,
            Instruction::NOT => AluOp::Not,
            Instruction::SHL => AluOp::Shl,
            Instruction::SHR => AluOp::Shr,
            Instruction::INC => AluOp::Inc,
            Instruction::DEC => AluOp::Dec,
            Instruction::CMP => AluOp::Cmp,
            other => return Err(MachineError::InvalidAluOperation(other)),
        };
        Ok(op)
    }
}

/// What an ALU operation produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOutput {
    /// New value for the destination register
    Value(Byte),
    /// New flag state, registers are unchanged
    Flags(Flag),
}

/// Computes `op` over registers `a` and `b`
///
/// Nothing is written back, the caller decides where [`AluOutput`] goes.
/// Unary operations ignore `b` except `NOT`, which reads its source from
/// `b`. `pc` is only used for error reports.
pub fn compute(
    op: AluOp,
    regs: &Registers,
    a: Byte,
    b: Byte,
    pc: Address,
) -> Result<AluOutput, MachineError> {
    let lhs = regs.read(a, pc)?;
    let rhs = || regs.read(b, pc);

    let value = match op {
        AluOp::Add => lhs.wrapping_add(rhs()?),
        AluOp::Sub => lhs.wrapping_sub(rhs()?),
        AluOp::Mul => lhs.wrapping_mul(rhs()?),
        AluOp::Div => lhs
            .checked_div(rhs()?)
            .ok_or(MachineError::DivisionByZero { address: pc })?,
        AluOp::Mod => lhs
            .checked_rem(rhs()?)
            .ok_or(MachineError::DivisionByZero { address: pc })?,
        AluOp::And => lhs & rhs()?,
        AluOp::Or => lhs | rhs()?,
        AluOp::Xor => lhs ^ rhs()?,
        AluOp::Not => !rhs()?,
        // shifting out every bit leaves zero
        AluOp::Shl => lhs.checked_shl(rhs()? as u32).unwrap_or(0),
        AluOp::Shr => lhs.checked_shr(rhs()? as u32).unwrap_or(0),
        AluOp::Inc => lhs.wrapping_add(1),
        AluOp::Dec => lhs.wrapping_sub(1),
        AluOp::Cmp => return Ok(AluOutput::Flags(lhs.cmp(&rhs()?).into())),
    };

    Ok(AluOutput::Value(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_eyre::eyre::Result;

    fn regs(a: Byte, b: Byte) -> Registers {
        Registers::from([a, b, 0, 0, 0, 0, 0, 0])
    }

    fn value(op: AluOp, a: Byte, b: Byte) -> Result<Byte> {
        match compute(op, &regs(a, b), 0, 1, 0)? {
            AluOutput::Value(value) => Ok(value),
            AluOutput::Flags(flag) => panic!("{:?} produced flags {}", op, flag),
        }
    }

    #[test]
    fn test_add_wraps() -> Result<()> {
        assert_eq!(value(AluOp::Add, 250, 10)?, 4);
        assert_eq!(value(AluOp::Add, 1, 2)?, 3);

        Ok(())
    }

    #[test]
    fn test_mul_wraps() -> Result<()> {
        assert_eq!(value(AluOp::Mul, 8, 9)?, 72);
        assert_eq!(value(AluOp::Mul, 16, 17)?, 16);

        Ok(())
    }

    #[test]
    fn test_sub_div() -> Result<()> {
        assert_eq!(value(AluOp::Sub, 3, 5)?, 254);
        assert_eq!(value(AluOp::Div, 200, 7)?, 28);

        Ok(())
    }

    #[test]
    fn test_bitwise() -> Result<()> {
        assert_eq!(value(AluOp::And, 0b1100, 0b1010)?, 0b1000);
        assert_eq!(value(AluOp::Or, 0b1100, 0b1010)?, 0b1110);
        assert_eq!(value(AluOp::Xor, 0b1100, 0b1010)?, 0b0110);
        assert_eq!(value(AluOp::Not, 0, 0b1111_0000)?, 0b0000_1111);

        Ok(())
    }

    #[test]
    fn test_not_same_register() -> Result<()> {
        let output = compute(AluOp::Not, &regs(0x0F, 0), 0, 0, 0)?;
        assert_eq!(output, AluOutput::Value(0xF0));

        Ok(())
    }

    #[test]
    fn test_mod() -> Result<()> {
        assert_eq!(value(AluOp::Mod, 17, 5)?, 2);
        assert_eq!(value(AluOp::Mod, 4, 5)?, 4);

        Ok(())
    }

    #[test]
    fn test_division_by_zero() {
        for op in [AluOp::Mod, AluOp::Div].iter().copied() {
            let result = compute(op, &regs(17, 0), 0, 1, 0x20);
            assert!(matches!(
                result,
                Err(MachineError::DivisionByZero { address: 0x20 })
            ));
        }
    }

    #[test]
    fn test_shifts_stay_in_a_byte() -> Result<()> {
        assert_eq!(value(AluOp::Shl, 0b1000_0001, 1)?, 0b0000_0010);
        assert_eq!(value(AluOp::Shl, 0xFF, 8)?, 0);
        assert_eq!(value(AluOp::Shr, 0b1000_0001, 7)?, 1);
        assert_eq!(value(AluOp::Shr, 0xFF, 200)?, 0);

        Ok(())
    }

    #[test]
    fn test_inc_dec_wrap() -> Result<()> {
        assert_eq!(value(AluOp::Inc, 255, 0)?, 0);
        assert_eq!(value(AluOp::Dec, 0, 0)?, 255);

        Ok(())
    }

    #[test]
    fn test_cmp_sets_exactly_one_flag() -> Result<()> {
        let cases = [(1, 2, Flag::Less), (2, 1, Flag::Greater), (7, 7, Flag::Equal)];
        for &(a, b, expected) in cases.iter() {
            assert_eq!(
                compute(AluOp::Cmp, &regs(a, b), 0, 1, 0)?,
                AluOutput::Flags(expected)
            );
        }

        Ok(())
    }

    #[test]
    fn test_invalid_register_operand() {
        let result = compute(AluOp::Add, &regs(1, 1), 0, 9, 0x33);
        assert!(matches!(
            result,
            Err(MachineError::InvalidRegister {
                index: 9,
                address: 0x33
            })
        ));
    }

    #[test]
    fn test_non_alu_instruction() {
        let result = AluOp::try_from(Instruction::JMP);
        assert!(matches!(
            result,
            Err(MachineError::InvalidAluOperation(Instruction::JMP))
        ));
        assert_eq!(AluOp::try_from(Instruction::SHR).ok(), Some(AluOp::Shr));
    }
}
