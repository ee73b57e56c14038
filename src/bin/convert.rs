//! EPT Convert - CLI tool for converting EPT files between CSV and YAML.

use clap::{ArgAction, Parser};
use ept_tools::csv_format::CsvEptFile;
use ept_tools::logging::{init_logging, LogConfig, LogFormat};
use ept_tools::yaml_format::YamlEptFile;
use ept_tools::{Error, Format, Result};
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ept_convert")]
#[command(about = "Convert EPT files between CSV and YAML", long_about = None)]
struct Cli {
    /// One or more input files
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Input format (csv, yaml)
    #[arg(long = "input-format")]
    input_format: String,

    /// Output format (csv, yaml)
    #[arg(long = "output-format")]
    output_format: String,

    /// Directory for the converted files
    #[arg(long = "output-dir", default_value = ".")]
    output_dir: PathBuf,

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

    // Parse formats
    let input_format = cli.input_format.parse::<Format>()?;
    let output_format = cli.output_format.parse::<Format>()?;

    for input_path in &cli.files {
        input_format.check_path(input_path)?;
        let output_path = output_format.output_path(input_path, &cli.output_dir);
        convert_file(input_path, input_format, &output_path, output_format)?;
        println!("wrote {}", output_path.display());
    }

    Ok(())
}

fn convert_file(input: &Path, input_format: Format, output: &Path, output_format: Format) -> Result<()> {
    let mut reader = File::open(input)?;
    match (input_format, output_format) {
        (Format::Csv, Format::Yaml) => {
            let yaml: YamlEptFile = CsvEptFile::from_read(&mut reader)?.into();
            yaml.write_to(&mut File::create(output)?)
        }
        (Format::Yaml, Format::Csv) => {
            let csv: CsvEptFile = YamlEptFile::from_read(&mut reader)?.into();
            csv.write_to(&mut File::create(output)?)
        }
        (from, to) => Err(Error::UnsupportedConversion {
            from: from.name(),
            to: to.name(),
        }),
    }
}
