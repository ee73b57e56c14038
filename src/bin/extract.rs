//! EPT Extract - CLI tool for turning the EPT definition sheet into JSON.

use clap::{ArgAction, Parser};
use ept_tools::definitions::{DefinitionTable, DEFAULT_SHEET};
use ept_tools::logging::{init_logging, LogConfig, LogFormat};
use ept_tools::Result;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "ept_extract")]
#[command(about = "Extract the EPT field-definition sheet (CSV export) to JSON", long_about = None)]
struct Cli {
    /// CSV export of the definition sheet
    #[arg(short, long)]
    input: PathBuf,

    /// Sheet name to store the rows under
    #[arg(long, default_value = DEFAULT_SHEET)]
    sheet: String,

    /// Output file path (or stdout if not provided)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_verbosity(cli.verbose).with_format(cli.log_format))?;

    let mut file = File::open(&cli.input)?;
    let table = DefinitionTable::from_csv(&mut file, &cli.sheet)?;
    info!(
        input = %cli.input.display(),
        rows = table.sheet(&cli.sheet)?.len(),
        "read definition sheet"
    );

    if let Some(ref output_path) = cli.output {
        let mut file = File::create(output_path)?;
        table.write_json(&mut file)?;
    } else {
        let mut stdout = io::stdout().lock();
        table.write_json(&mut stdout)?;
        stdout.flush()?;
    }

    Ok(())
}
