//! Error types for the EPT tools library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::rules::CaptureError;

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while reading, deriving, converting or validating.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred during read or write operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error parsing or writing CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error parsing or writing JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error parsing or writing YAML.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A schema `pattern` that does not compile.
    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    /// Invalid format specified.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Input file does not carry the extension of its declared format.
    #[error("{} does not seem to be a .{expected} file", path.display())]
    InvalidExtension { path: PathBuf, expected: &'static str },

    /// The requested sheet is not present in a definition extraction.
    #[error("Sheet not found: '{0}'")]
    MissingSheet(String),

    /// A codification matched a rule but its captured values are unusable.
    #[error("Invalid codification for field {field} ('{codification}'): {source}")]
    InvalidCodification {
        field: String,
        codification: String,
        #[source]
        source: CaptureError,
    },

    /// A `$ref` that does not point at one of the known component schemas.
    #[error("Unresolved schema reference: {0}")]
    UnresolvedReference(String),

    /// The pair of formats has no conversion.
    #[error("Cannot convert from {from} to {to}")]
    UnsupportedConversion { from: &'static str, to: &'static str },

    /// The global log subscriber could not be installed.
    #[error("Logging setup failed: {0}")]
    Logging(String),
}
