//! EPT Tools Library
//!
//! Utilities for the European PRIIPs Template (EPT): deriving a JSON Schema
//! from the EPT field-definition table, converting EPT files between CSV and
//! YAML, and validating EPT documents against the derived schema.
//!
//! # Modules
//!
//! - **engine**: codification rule engine producing schema fragments
//! - **schema**: the JSON Schema document
//! - **definitions**: the field-definition table and its JSON extraction
//! - **csv_format** / **yaml_format**: EPT data files
//! - **validate**: document validation
//!
//! # Examples
//!
//! ## Generating the schema
//!
//! ```no_run
//! use std::fs::File;
//! use std::path::Path;
//! use ept_tools::definitions::{DefinitionTable, DEFAULT_SHEET};
//! use ept_tools::engine::CodificationRuleEngine;
//! use ept_tools::schema::EptSchema;
//!
//! let mut input = File::open("json/EPT_V2.1_Final.json")?;
//! let table = DefinitionTable::from_json(&mut input)?;
//! let derived = CodificationRuleEngine::default().derive(table.sheet(DEFAULT_SHEET)?)?;
//! EptSchema::build(derived).save(Path::new("schemas/ept.schema.json"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Converting YAML to CSV
//!
//! ```no_run
//! use std::fs::File;
//! use ept_tools::csv_format::CsvEptFile;
//! use ept_tools::yaml_format::YamlEptFile;
//!
//! let mut input = File::open("ept.yaml")?;
//! let yaml = YamlEptFile::from_read(&mut input)?;
//!
//! // Convert using From trait
//! let csv: CsvEptFile = yaml.into();
//!
//! let mut output = File::create("ept.csv")?;
//! csv.write_to(&mut output)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod types;
pub mod rules;
pub mod engine;
pub mod reference;
pub mod schema;
pub mod definitions;
pub mod template;
pub mod csv_format;
pub mod yaml_format;
pub mod conversion;
pub mod validate;
pub mod logging;

use std::path::{Path, PathBuf};
use std::str::FromStr;

// Re-export commonly used types
pub use engine::{CodificationRuleEngine, DerivedFields, MandatoryPolicy};
pub use error::{Error, Result};
pub use schema::EptSchema;
pub use types::{FieldDefinition, SchemaFragment};

/// Supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Comma-separated values
    Csv,
    /// YAML documents
    Yaml,
    /// JSON documents
    Json,
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Format::Csv),
            "yaml" | "yml" => Ok(Format::Yaml),
            "json" => Ok(Format::Json),
            _ => Err(Error::InvalidFormat(s.to_string())),
        }
    }
}

impl Format {
    /// Get file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Yaml => "yaml",
            Format::Json => "json",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Format::Csv => "CSV",
            Format::Yaml => "YAML",
            Format::Json => "JSON",
        }
    }

    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()?.to_str()?.parse().ok()
    }

    /// Check that a file carries this format's extension.
    pub fn check_path(&self, path: &Path) -> Result<()> {
        if Self::from_path(path) == Some(*self) {
            Ok(())
        } else {
            Err(Error::InvalidExtension {
                path: path.to_path_buf(),
                expected: self.extension(),
            })
        }
    }

    /// Output file for `input` converted to this format: the input's base name
    /// with this format's extension, placed in `dir`.
    pub fn output_path(&self, input: &Path, dir: &Path) -> PathBuf {
        let stem = input.file_stem().unwrap_or(input.as_os_str());
        let mut file_name = stem.to_os_string();
        file_name.push(".");
        file_name.push(self.extension());
        dir.join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_str() {
        assert_eq!("csv".parse::<Format>().unwrap(), Format::Csv);
        assert_eq!("YAML".parse::<Format>().unwrap(), Format::Yaml);
        assert_eq!("yml".parse::<Format>().unwrap(), Format::Yaml);
        assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
        assert!("xlsx".parse::<Format>().is_err());
    }

    #[test]
    fn test_format_extension() {
        assert_eq!(Format::Csv.extension(), "csv");
        assert_eq!(Format::Yaml.extension(), "yaml");
        assert_eq!(Format::Json.extension(), "json");
    }

    #[test]
    fn test_check_path() {
        assert!(Format::Yaml.check_path(Path::new("data/ept.yml")).is_ok());
        assert!(Format::Yaml.check_path(Path::new("data/ept.yaml")).is_ok());
        let error = Format::Yaml.check_path(Path::new("data/ept.xlsx")).unwrap_err();
        assert_eq!(error.to_string(), "data/ept.xlsx does not seem to be a .yaml file");
    }

    #[test]
    fn test_output_path() {
        let path = Format::Csv.output_path(Path::new("in/2024/ept.yaml"), Path::new("."));
        assert_eq!(path, Path::new("./ept.csv"));
    }
}
