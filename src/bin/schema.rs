//! EPT Schema - CLI tool for generating the EPT JSON Schema.

use clap::{ArgAction, Parser};
use ept_tools::definitions::{DefinitionTable, DEFAULT_EXTRACTION_PATH, DEFAULT_SHEET};
use ept_tools::engine::{CodificationRuleEngine, MandatoryPolicy};
use ept_tools::logging::{init_logging, LogConfig, LogFormat};
use ept_tools::schema::{EptSchema, DEFAULT_SCHEMA_PATH};
use ept_tools::{Error, Format, Result};
use std::fs::File;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "ept_schema")]
#[command(about = "Generate the EPT JSON Schema from the field-definition table", long_about = None)]
struct Cli {
    /// JSON extraction or CSV export of the definition sheet
    #[arg(short, long, default_value = DEFAULT_EXTRACTION_PATH)]
    input: PathBuf,

    /// Input format (json, csv); guessed from the extension when omitted
    #[arg(long = "input-format")]
    input_format: Option<String>,

    /// Sheet holding the definitions
    #[arg(long, default_value = DEFAULT_SHEET)]
    sheet: String,

    /// Schema file to write
    #[arg(short, long, default_value = DEFAULT_SCHEMA_PATH)]
    output: PathBuf,

    /// Only honour the table's own mandatory flags
    #[arg(long)]
    flags_only: bool,

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

    let input_format = match cli.input_format {
        Some(ref name) => name.parse::<Format>()?,
        None => Format::from_path(&cli.input).unwrap_or(Format::Json),
    };

    let mut file = File::open(&cli.input)?;
    let table = match input_format {
        Format::Json => DefinitionTable::from_json(&mut file)?,
        Format::Csv => DefinitionTable::from_csv(&mut file, &cli.sheet)?,
        Format::Yaml => return Err(Error::InvalidFormat(input_format.extension().to_string())),
    };

    let policy = if cli.flags_only {
        MandatoryPolicy::flags_only()
    } else {
        MandatoryPolicy::default()
    };
    let derived = CodificationRuleEngine::new(policy).derive(table.sheet(&cli.sheet)?)?;

    let unresolved = derived.unresolved.len();
    let properties = derived.properties.len();
    info!("missing type count: {} out of {}", unresolved, properties);

    EptSchema::build(derived).save(&cli.output)?;
    info!(output = %cli.output.display(), "wrote schema");

    Ok(())
}
