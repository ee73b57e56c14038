//! CSV format parser and serializer for EPT data files.
//!
//! The first row holds the column headers; each following row is one EPT record.

use csv::{Reader, Writer};
use std::io::{Read, Write};

use crate::error::Result;
use crate::template::{cell_text, parse_cell, EptRecord};

/// Represents an EPT file in CSV layout.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CsvEptFile {
    /// Column headers, in file order.
    pub headers: Vec<String>,
    /// Records keyed by header. Empty cells are absent.
    pub records: Vec<EptRecord>,
}

impl CsvEptFile {
    /// Parse an EPT CSV file from any source implementing `Read`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::fs::File;
    /// use ept_tools::csv_format::CsvEptFile;
    ///
    /// let mut file = File::open("ept.csv")?;
    /// let ept = CsvEptFile::from_read(&mut file)?;
    /// println!("{} records", ept.records.len());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut csv_reader = Reader::from_reader(reader);
        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();

        let mut records = Vec::new();
        for row in csv_reader.records() {
            let row = row?;
            let record: EptRecord = headers
                .iter()
                .zip(row.iter())
                .filter(|(header, _)| !header.is_empty())
                .filter_map(|(header, cell)| parse_cell(cell).map(|value| (header.clone(), value)))
                .collect();

            // Skip empty rows
            if record.is_empty() {
                continue;
            }
            records.push(record);
        }

        Ok(Self { headers, records })
    }

    /// Write the file to any destination implementing `Write`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut csv_writer = Writer::from_writer(writer);
        csv_writer.write_record(&self.headers)?;

        for record in &self.records {
            let cells = self.headers.iter().map(|header| {
                record.get(header).map(cell_text).unwrap_or_default()
            });
            csv_writer.write_record(cells)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const SAMPLE: &str = "\
00001_EPT_Version,00010_Portfolio_Manufacturer_Name,01090_SRI,06010_Bonds_Weight
V21,Captor Fund Management AB,2,
V21UK,Captor Fund Management AB,,0.35
,,,
";

    #[test]
    fn test_from_read_types_cells() {
        let ept = CsvEptFile::from_read(&mut SAMPLE.as_bytes()).unwrap();

        assert_eq!(ept.headers.len(), 4);
        assert_eq!(ept.records.len(), 2);
        assert_eq!(ept.records[0]["01090_SRI"], json!(2));
        assert!(!ept.records[0].contains_key("06010_Bonds_Weight"));
        assert_eq!(ept.records[1]["06010_Bonds_Weight"], json!(0.35));
    }

    #[test]
    fn test_write_to_keeps_header_order() {
        let ept = CsvEptFile::from_read(&mut SAMPLE.as_bytes()).unwrap();
        let mut output = Vec::new();
        ept.write_to(&mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("00001_EPT_Version,00010_Portfolio_Manufacturer_Name,01090_SRI,06010_Bonds_Weight")
        );
        assert_eq!(lines.next(), Some("V21,Captor Fund Management AB,2,"));
        assert_eq!(lines.next(), Some("V21UK,Captor Fund Management AB,,0.35"));
        assert_eq!(lines.next(), None);
    }
}
