use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use ls8::emu::emulator::Emulator;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

/// Runs an LS-8 program listing.
#[derive(Parser, Debug)]
#[command(name = "ls8", version)]
struct Cli {
    /// Program listing to load: one binary literal per line, `#` starts a comment.
    program: PathBuf,

    /// Log more to stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;

    let source = fs::read_to_string(&cli.program)
        .with_context(|| format!("failed to read {}", cli.program.display()))?;
    let mut emu = Emulator::new();
    emu.load(&source)
        .with_context(|| format!("failed to load {}", cli.program.display()))?;
    emu.run_until_halt()?;
    Ok(())
}
