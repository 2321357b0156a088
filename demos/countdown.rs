use color_eyre::eyre::Result;

use ls8::memory::Memory;
use ls8::write_instructions;
use ls8::Machine;
use log::LevelFilter;
use simple_logger::SimpleLogger;

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new()
        .with_level(LevelFilter::Debug)
        .init()?; // logging

    let mut mem = Memory::default();

    use ls8::processor::Instruction::*;
    write_instructions!(mem : 0 =>
        LDI, 0, 5,
        LDI, 1, 0,
        LDI, 2, 0xFF,
        LDI, 3, 0x0C,
        PRN, 0,
        ADD, 0, 2,
        CMP, 0, 1,
        JNE, 3,
        HLT
    )?;

    let mut machine = Machine::new().with_step_limit(100);
    machine.load(&mem.data)?;
    machine.run()?;

    Ok(())
}
