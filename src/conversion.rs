//! Format conversion traits.
//!
//! This module provides conversion between the CSV and YAML layouts of an EPT
//! file using Rust's `From` trait.

use crate::csv_format::CsvEptFile;
use crate::template::{fill_out_holes, EPT_HEADERS};
use crate::yaml_format::YamlEptFile;

/// Convert from CSV to YAML. Records carry over unchanged.
impl From<CsvEptFile> for YamlEptFile {
    fn from(csv: CsvEptFile) -> Self {
        YamlEptFile {
            records: csv.records,
        }
    }
}

/// Convert from YAML to CSV on the canonical template columns.
impl From<YamlEptFile> for CsvEptFile {
    fn from(yaml: YamlEptFile) -> Self {
        CsvEptFile {
            headers: EPT_HEADERS.iter().map(|header| header.to_string()).collect(),
            records: fill_out_holes(&yaml.records),
        }
    }
}
