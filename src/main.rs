use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use log::LevelFilter;
use simple_logger::SimpleLogger;

use ls8::Machine;

#[derive(Parser, Debug)]
#[command(author, version, about = "Runs an LS-8 program", long_about = None)]
struct Args {
    /// Program file, one 8 digit binary literal per line
    program: PathBuf,

    /// Give up after this many instructions
    #[arg(long)]
    max_steps: Option<u64>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: LevelFilter,

    /// Log a hex dump of the memory after loading. Raises the log level to
    /// at least info
    #[arg(long)]
    dump: bool,
}

impl Args {
    fn level(&self) -> LevelFilter {
        if self.dump {
            self.log_level.max(LevelFilter::Info)
        } else {
            self.log_level
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    let args = Args::parse();
    SimpleLogger::new().with_level(args.level()).init()?; // logging

    let mut machine = Machine::from_file(&args.program)
        .wrap_err_with(|| format!("Failed to load `{}`", args.program.display()))?;
    if let Some(limit) = args.max_steps {
        machine = machine.with_step_limit(limit);
    }
    if args.dump {
        machine.memory().dump();
    }

    machine.run().wrap_err("Machine stopped")?;

    Ok(())
}
