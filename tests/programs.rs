use std::path::PathBuf;

use color_eyre::eyre::Result;
use ls8::memory::parse::ParseErrorKind;
use ls8::{LoadError, Machine, MachineError};

fn program(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("demos/programs")
        .join(name)
}

fn run_program(name: &str) -> Result<(Machine, String)> {
    let mut machine = Machine::from_file(program(name))?.with_step_limit(10_000);
    let mut out: Vec<u8> = Vec::new();
    machine.run_with_output(&mut out)?;
    Ok((machine, String::from_utf8(out)?))
}

#[test]
fn print8() -> Result<()> {
    let (machine, out) = run_program("print8.ls8")?;

    assert_eq!(out, "8\n");
    assert!(machine.is_halted());

    Ok(())
}

#[test]
fn mult() -> Result<()> {
    let (_, out) = run_program("mult.ls8")?;

    assert_eq!(out, "72\n");

    Ok(())
}

#[test]
fn stack() -> Result<()> {
    let (machine, out) = run_program("stack.ls8")?;

    assert_eq!(out, "2\n4\n1\n");
    assert_eq!(machine.registers().sp(), 0xF4);

    Ok(())
}

#[test]
fn call() -> Result<()> {
    let (machine, out) = run_program("call.ls8")?;

    assert_eq!(out, "20\n30\n36\n60\n");
    assert_eq!(machine.registers().sp(), 0xF4);
    assert_eq!(machine.pc(), 24);

    Ok(())
}

#[test]
fn countdown() -> Result<()> {
    let (machine, out) = run_program("countdown.ls8")?;

    assert_eq!(out, "5\n4\n3\n2\n1\n");
    assert_eq!(machine.registers().read(0, 0)?, 0);

    Ok(())
}

#[test]
fn bad_opcode() -> Result<()> {
    let mut machine = Machine::from_file(program("bad_opcode.ls8"))?;
    let mut out: Vec<u8> = Vec::new();
    let result = machine.run_with_output(&mut out);

    assert!(matches!(
        result,
        Err(MachineError::InvalidOpcode {
            opcode: 0xFF,
            address: 5
        })
    ));
    assert_eq!(out, b"1\n");
    assert!(!machine.is_halted());

    Ok(())
}

#[test]
fn malformed_program() {
    let source = "10000010\n00000000\n0000100\nhello world\n00000001\n";
    let result = source.parse::<ls8::memory::Memory>();

    match result {
        Err(LoadError::Parse(errors)) => {
            let lines: Vec<usize> = errors.iter().map(|err| err.line_nr()).collect();
            assert_eq!(lines, vec![3, 4]);
            assert!(errors
                .iter()
                .all(|err| err.kind() == ParseErrorKind::InvalidBitstring));
        }
        other => panic!("expected parse errors, got {:?}", other),
    }
}

#[test]
fn missing_program() {
    let result = Machine::from_file(program("missing.ls8"));

    assert!(matches!(result, Err(LoadError::Io { .. })));
}
