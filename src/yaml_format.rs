//! YAML format parser and serializer for EPT data files.

use serde::Deserialize;
use serde_json::Value;
use std::io::{Read, Write};

use crate::error::Result;
use crate::template::EptRecord;

/// Represents an EPT file as a YAML sequence of mappings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct YamlEptFile {
    pub records: Vec<EptRecord>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<EptRecord>),
    One(EptRecord),
}

impl YamlEptFile {
    /// Parse a YAML document. A single mapping is read as a one-record file.
    pub fn from_read<R: Read>(reader: &mut R) -> Result<Self> {
        let records = match serde_yaml::from_reader(reader)? {
            OneOrMany::Many(records) => records,
            OneOrMany::One(record) => vec![record],
        };
        Ok(Self { records })
    }

    /// Parse a YAML document without assuming its shape, for validation.
    pub fn document<R: Read>(reader: &mut R) -> Result<Value> {
        Ok(serde_yaml::from_reader(reader)?)
    }

    /// Write the records as a YAML sequence.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        serde_yaml::to_writer(writer, &self.records)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_sequence_and_single_mapping() {
        let many = "- 00001_EPT_Version: V21\n  01090_SRI: 3\n- 00001_EPT_Version: V21UK\n";
        let ept = YamlEptFile::from_read(&mut many.as_bytes()).unwrap();
        assert_eq!(ept.records.len(), 2);
        assert_eq!(ept.records[0]["01090_SRI"], json!(3));

        let one = "00001_EPT_Version: V21\n";
        let ept = YamlEptFile::from_read(&mut one.as_bytes()).unwrap();
        assert_eq!(ept.records.len(), 1);
    }

    #[test]
    fn test_write_keeps_column_order() {
        let record: EptRecord = serde_json::from_value(json!({
            "00001_EPT_Version": "V21",
            "00010_Portfolio_Manufacturer_Name": "Captor",
            "00005_File_Generation_Date_And_Time": "2024-01-31 10:00:00"
        }))
        .unwrap();
        let ept = YamlEptFile { records: vec![record] };

        let mut output = Vec::new();
        ept.write_to(&mut output).unwrap();
        let text = String::from_utf8(output).unwrap();

        let version = text.find("00001_EPT_Version").unwrap();
        let name = text.find("00010_Portfolio_Manufacturer_Name").unwrap();
        let generated = text.find("00005_File_Generation_Date_And_Time").unwrap();
        assert!(version < name && name < generated);

        let reread = YamlEptFile::from_read(&mut text.as_bytes()).unwrap();
        assert_eq!(reread, ept);
    }
}
