//! EPT Validate - CLI tool for validating EPT YAML files against the schema.

use clap::{ArgAction, Parser};
use ept_tools::logging::{init_logging, LogConfig, LogFormat};
use ept_tools::schema::{EptSchema, DEFAULT_SCHEMA_PATH};
use ept_tools::validate::SchemaValidator;
use ept_tools::yaml_format::YamlEptFile;
use ept_tools::{Format, Result};
use std::fs::File;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(name = "ept_validate")]
#[command(about = "Validate EPT YAML files against the EPT JSON Schema", long_about = None)]
struct Cli {
    /// One or more EPT YAML files
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Schema file
    #[arg(short, long, default_value = DEFAULT_SCHEMA_PATH)]
    schema: PathBuf,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns `false` at the first invalid file.
fn run() -> Result<bool> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_verbosity(cli.verbose).with_format(cli.log_format))?;

    let schema = EptSchema::load(&cli.schema)?;
    let validator = SchemaValidator::new(&schema)?;

    for path in &cli.files {
        Format::Yaml.check_path(path)?;
        let document = YamlEptFile::document(&mut File::open(path)?)?;
        let issues = validator.validate(&document);
        debug!(file = %path.display(), issues = issues.len(), "validated");

        if !issues.is_empty() {
            eprintln!("{}", serde_json::to_string_pretty(&issues)?);
            return Ok(false);
        }
        println!("{} is valid", path.display());
    }

    Ok(true)
}
