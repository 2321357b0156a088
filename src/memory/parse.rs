//! Program files hold one byte per line, written as 8 binary digits.
//! Anything after the first 8 characters is ignored, so lines are usually
//! annotated with the mnemonic they encode:
//!
//! ```text
//! # print8.ls8
//! 10000010 # LDI R0,8
//! 00000000
//! 00001000
//! 01000111 # PRN R0
//! 00000000
//! 00000001 # HLT
//! ```

use std::borrow::Cow;
use std::error;
use std::{fmt, str::Lines};

use super::{Byte, MEMORY_SIZE};

/// Width of a binary literal in characters
const LITERAL_WIDTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    InvalidBitstring,
    ProgramTooLarge { capacity: usize },
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::InvalidBitstring => f.write_str("invalid binary literal"),
            ParseErrorKind::ProgramTooLarge { capacity } => {
                write!(f, "program does not fit into {} bytes of memory", capacity)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    kind: ParseErrorKind,
    context: Option<Cow<'static, str>>,
    line_nr: usize,
}

impl ParseError {
    fn new<C, S>(kind: ParseErrorKind, context: C, line_nr: usize) -> Self
    where
        C: Into<Option<S>>,
        S: Into<Cow<'static, str>>,
    {
        Self {
            kind,
            context: context.into().map(|inner| inner.into()),
            line_nr,
        }
    }

    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }

    pub fn line_nr(&self) -> usize {
        self.line_nr
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(
                f,
                "error [ln: {}]: {} - {}",
                self.line_nr, self.kind, context
            )
        } else {
            write!(f, "error [ln: {}]: {}", self.line_nr, self.kind)
        }
    }
}

impl error::Error for ParseError {}

pub type Result<T, E = ParseError> = std::result::Result<T, E>;

#[derive(Debug, Clone)]
pub struct Parser<'a> {
    lines: Lines<'a>,
    line_nr: usize,
    program: Vec<Byte>,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the program text `data`.
    pub fn new(data: &'a str) -> Self {
        Self {
            lines: data.lines(),
            line_nr: 0,
            program: Vec::new(),
        }
    }

    /// Consumes `self` and tries to parse all of `data` into a program image.
    ///
    /// # Errors
    ///
    /// All errors which may occur are collected and returned at the end.
    pub fn parse(mut self) -> Result<Vec<Byte>, Vec<ParseError>> {
        let mut errors = Vec::new();

        while let Some(res) = self.parse_next_line() {
            if let Err(err) = res {
                log::error!("{}", err);
                errors.push(err);
            }
        }

        if errors.is_empty() {
            Ok(self.program)
        } else {
            Err(errors)
        }
    }

    /// Tries to parse the next line of the program text. Each byte should
    /// be located on its own line.
    fn parse_next_line(&mut self) -> Option<Result<()>> {
        let line = self.lines.next()?.trim();
        self.line_nr += 1;

        if line.is_empty() || line.starts_with('#') {
            // Comment or empty line; skip
            Some(Ok(()))
        } else {
            Some(self.parse_literal(line))
        }
    }

    /// Tries to parse the leading binary literal of `line`.
    ///
    /// # Examples
    ///
    /// - `10000010`
    /// - `01000111 # PRN R0`
    fn parse_literal(&mut self, line: &str) -> Result<()> {
        let literal = line
            .get(..LITERAL_WIDTH)
            .filter(|literal| literal.bytes().all(|b| b == b'0' || b == b'1'))
            .ok_or_else(|| {
                ParseError::new(
                    ParseErrorKind::InvalidBitstring,
                    format!("expected {} binary digits, found `{}`", LITERAL_WIDTH, line),
                    self.line_nr,
                )
            })?;

        let byte = literal
            .bytes()
            .fold(0, |byte: Byte, digit| byte << 1 | (digit - b'0'));

        log::trace!("[{}] Found byte 0x{:02X}", self.line_nr, byte);

        self.write_byte(byte)
    }

    /// Appends `byte` to the program image.
    ///
    /// # Errors
    ///
    /// This will return an error if the image already fills the memory.
    fn write_byte(&mut self, byte: Byte) -> Result<()> {
        if self.program.len() >= MEMORY_SIZE {
            return Err(ParseError::new(
                ParseErrorKind::ProgramTooLarge {
                    capacity: MEMORY_SIZE,
                },
                "address is outside of memory",
                self.line_nr,
            ));
        }

        self.program.push(byte);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::processor::Instruction;

    use super::*;

    #[test]
    fn parse_print8() {
        let data = r#"
            # print8.ls8
            10000010 # LDI R0,8
            00000000
            00001000

            01000111 # PRN R0
            00000000
            00000001 # HLT
        "#;

        let program = Parser::new(data).parse().unwrap();
        let expected: Vec<Byte> = vec![
            Instruction::LDI.into(),
            0,
            8,
            Instruction::PRN.into(),
            0,
            Instruction::HLT.into(),
        ];

        assert_eq!(program, expected);
    }

    #[test]
    fn parse_without_annotations() {
        let program = Parser::new("11111111\n00000000\n10100000").parse().unwrap();

        assert_eq!(program, vec![0xFFu8, 0x00, 0xA0]);
    }

    #[test]
    fn parse_collects_every_error() {
        let data = "10000010\n1000\n00000000\n1000201X\n";

        let errors = Parser::new(data).parse().unwrap_err();

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].kind(), ParseErrorKind::InvalidBitstring);
        assert_eq!(errors[0].line_nr(), 2);
        assert_eq!(errors[1].kind(), ParseErrorKind::InvalidBitstring);
        assert_eq!(errors[1].line_nr(), 4);
    }

    #[test]
    fn parse_reads_most_significant_bit_first() {
        let program = Parser::new("10000000\n00000001\n01010101 # comment")
            .parse()
            .unwrap();

        assert_eq!(program, vec![0x80u8, 0x01, 0x55]);
    }

    #[test]
    fn parse_rejects_digits_split_by_whitespace() {
        let errors = Parser::new("0000 0001\n00000001\n").parse().unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ParseErrorKind::InvalidBitstring);
        assert_eq!(errors[0].line_nr(), 1);
        assert!(errors[0].to_string().contains("expected 8 binary digits"));
    }

    #[test]
    fn parse_rejects_oversized_program() {
        let data = "00000001\n".repeat(MEMORY_SIZE + 1);

        let errors = Parser::new(&data).parse().unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].kind(),
            ParseErrorKind::ProgramTooLarge {
                capacity: MEMORY_SIZE
            }
        );
        assert_eq!(errors[0].line_nr(), MEMORY_SIZE + 1);
    }

    #[test]
    fn parse_accepts_full_memory() {
        let data = "00000001\n".repeat(MEMORY_SIZE);

        let program = Parser::new(&data).parse().unwrap();

        assert_eq!(program.len(), MEMORY_SIZE);
    }
}
