//! The EPT field-definition table.
//!
//! The standard is published as a spreadsheet. Its definition sheet is read
//! from a CSV export and kept as a JSON extraction keyed by sheet name, which
//! is what the schema generator consumes.

use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::FieldDefinition;

/// Sheet name of the EPT V2.1 definition table. The trailing space is part of the name.
pub const DEFAULT_SHEET: &str = "EPT 2.1 ";

/// Title and legend rows above the first field row.
pub const HEADER_ROWS: usize = 7;

/// Default location of the JSON extraction.
pub const DEFAULT_EXTRACTION_PATH: &str = "json/EPT_V2.1_Final.json";

/// Definition rows per sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefinitionTable {
    pub sheets: BTreeMap<String, Vec<FieldDefinition>>,
}

impl DefinitionTable {
    /// Parse a JSON extraction.
    pub fn from_json<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Read the CSV export of a definition sheet.
    ///
    /// Column A is ignored; columns B to H hold field, definition,
    /// codification, comment, PRIIPs synchronisation flag, mandatory flag and
    /// UK flag. The first [`HEADER_ROWS`] rows are skipped.
    pub fn from_csv<R: Read>(reader: &mut R, sheet: &str) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut rows = Vec::new();
        for (index, record) in csv_reader.records().enumerate() {
            let record = record?;
            if index < HEADER_ROWS {
                continue;
            }
            match Self::parse_row(&record) {
                Some(row) => rows.push(row),
                None => debug!(line = index + 1, "skipping empty row"),
            }
        }

        let mut sheets = BTreeMap::new();
        sheets.insert(sheet.to_string(), rows);
        Ok(Self { sheets })
    }

    fn parse_row(record: &StringRecord) -> Option<FieldDefinition> {
        let cell = |column: usize| {
            record
                .get(column)
                .filter(|text| !text.is_empty())
                .map(str::to_string)
        };

        let row = FieldDefinition {
            field: cell(1).unwrap_or_default(),
            definition: cell(2),
            codification: cell(3),
            comment: cell(4),
            synchronised_with_priips: cell(5),
            mandatory: cell(6),
            needed_uk: cell(7),
        };

        (row != FieldDefinition::default()).then_some(row)
    }

    /// Write the extraction as two-space indented JSON.
    pub fn write_json<W: Write>(&self, writer: &mut W) -> Result<()> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writeln!(writer)?;
        Ok(())
    }

    /// Rows of the named sheet. A document with a single sheet answers for any name.
    pub fn sheet(&self, name: &str) -> Result<&[FieldDefinition]> {
        if let Some(rows) = self.sheets.get(name) {
            return Ok(rows);
        }
        let mut sheets = self.sheets.values();
        match (sheets.next(), sheets.next()) {
            (Some(only), None) => Ok(only),
            _ => Err(Error::MissingSheet(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SHEET_CSV: &str = "\
European PRIIPs Template,,,,,,,
Version 2.1,,,,,,,
,,,,,,,
,,,,,,,
,,,,,,,
,,,,,,,
NUM,Data,Definition,Codification,Comment,Synchronised,M/O,UK
1,General,,,,,,
2,00001_EPT_Version,Version of the template,V21 or V21UK,,Y,M,Y
3,00050_Portfolio_Name,Name of the portfolio,string[255],\"Fund, share class\",,M,
,,,,,,,
";

    #[test]
    fn test_from_csv_maps_columns() {
        let table = DefinitionTable::from_csv(&mut SHEET_CSV.as_bytes(), DEFAULT_SHEET).unwrap();
        let rows = table.sheet(DEFAULT_SHEET).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].field, "General");
        assert_eq!(rows[0].definition, None);
        assert_eq!(
            rows[1],
            FieldDefinition {
                field: "00001_EPT_Version".into(),
                definition: Some("Version of the template".into()),
                codification: Some("V21 or V21UK".into()),
                comment: None,
                synchronised_with_priips: Some("Y".into()),
                mandatory: Some("M".into()),
                needed_uk: Some("Y".into()),
            }
        );
        assert_eq!(rows[2].comment.as_deref(), Some("Fund, share class"));
    }

    #[test]
    fn test_json_extraction_round_trip() {
        let table = DefinitionTable::from_csv(&mut SHEET_CSV.as_bytes(), DEFAULT_SHEET).unwrap();
        let mut buffer = Vec::new();
        table.write_json(&mut buffer).unwrap();

        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.contains("\"EPT 2.1 \""));
        assert!(!text.contains("\"comment\": null"));

        let reread = DefinitionTable::from_json(&mut buffer.as_slice()).unwrap();
        assert_eq!(reread, table);
    }

    #[test]
    fn test_sheet_falls_back_to_only_sheet() {
        let json = r#"{"EPT 2.1": [{"field": "00001_EPT_Version", "definition": "Version"}]}"#;
        let table = DefinitionTable::from_json(&mut json.as_bytes()).unwrap();
        assert_eq!(table.sheet(DEFAULT_SHEET).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_sheet() {
        let json = r#"{"A": [], "B": []}"#;
        let table = DefinitionTable::from_json(&mut json.as_bytes()).unwrap();
        assert!(matches!(table.sheet("C"), Err(Error::MissingSheet(name)) if name == "C"));
    }
}
