use color_eyre::eyre::Result;

use ls8::Machine;
use log::LevelFilter;
use simple_logger::SimpleLogger;

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()?; // logging

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demos/programs/call.ls8".to_string());

    let mut machine = Machine::from_file(path)?;
    machine.memory().dump();
    machine.run()?;

    Ok(())
}
