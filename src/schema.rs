//! The EPT JSON Schema document.
//!
//! The document accepts either one EPT record or an array of them and keeps the
//! record schema together with two code-list schemas under
//! `components.schemas`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::engine::DerivedFields;
use crate::error::Result;
use crate::reference::{CURRENCY_CODES, LANGUAGE_CODES};
use crate::types::{EnumValue, SchemaFragment, SchemaType};

/// `$schema` value written into generated documents.
pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

pub const CURRENCY_REF: &str = "#/components/schemas/currency";
pub const LANGUAGE_REF: &str = "#/components/schemas/language";
pub const EPT_REF: &str = "#/components/schemas/ept";

/// Where `ept_schema` writes and `ept_validate` reads by default.
pub const DEFAULT_SCHEMA_PATH: &str = "schemas/ept.schema.json";

/// Object schema of a single EPT record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSchema {
    #[serde(rename = "type")]
    pub schema_type: SchemaType,
    /// Record fields in sheet order.
    pub properties: IndexMap<String, SchemaFragment>,
    pub required: Vec<String>,
    #[serde(rename = "additionalProperties")]
    pub additional_properties: bool,
}

/// Named schemas under `components.schemas`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSchemas {
    pub currency: SchemaFragment,
    pub language: SchemaFragment,
    pub ept: ObjectSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Components {
    pub schemas: ComponentSchemas,
}

/// Target of a `$ref`.
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'a> {
    Fragment(&'a SchemaFragment),
    Object(&'a ObjectSchema),
}

/// The complete schema document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EptSchema {
    #[serde(rename = "$schema")]
    pub schema: String,
    #[serde(rename = "oneOf")]
    pub one_of: Vec<SchemaFragment>,
    pub components: Components,
}

impl EptSchema {
    /// Assemble the document from an engine run.
    pub fn build(derived: DerivedFields) -> Self {
        let ept = ObjectSchema {
            schema_type: SchemaType::Object,
            properties: derived.properties,
            required: derived.required,
            additional_properties: false,
        };

        Self {
            schema: DRAFT_07.to_string(),
            one_of: vec![
                SchemaFragment::reference(EPT_REF),
                SchemaFragment {
                    schema_type: Some(SchemaType::Array),
                    items: Some(Box::new(SchemaFragment::reference(EPT_REF))),
                    ..SchemaFragment::default()
                },
            ],
            components: Components {
                schemas: ComponentSchemas {
                    currency: code_list(CURRENCY_CODES),
                    language: code_list(LANGUAGE_CODES),
                    ept,
                },
            },
        }
    }

    /// Parse a schema document from any source implementing `Read`.
    pub fn from_read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(serde_json::from_reader(BufReader::new(reader))?)
    }

    /// Write the document as two-space indented JSON.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut buffered = BufWriter::new(writer);
        serde_json::to_writer_pretty(&mut buffered, self)?;
        buffered.flush()?;
        Ok(())
    }

    /// Load a schema file.
    pub fn load(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        Self::from_read(&mut file)
    }

    /// Write a schema file, creating missing parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;
        self.write_to(&mut file)
    }

    /// The record schema.
    pub fn ept(&self) -> &ObjectSchema {
        &self.components.schemas.ept
    }

    /// Resolve a local `$ref`.
    pub fn resolve(&self, reference: &str) -> Option<Resolved<'_>> {
        let schemas = &self.components.schemas;
        match reference {
            CURRENCY_REF => Some(Resolved::Fragment(&schemas.currency)),
            LANGUAGE_REF => Some(Resolved::Fragment(&schemas.language)),
            EPT_REF => Some(Resolved::Object(&schemas.ept)),
            _ => None,
        }
    }
}

fn code_list(codes: &[&str]) -> SchemaFragment {
    SchemaFragment::enumeration(
        SchemaType::String,
        codes.iter().map(|code| EnumValue::from(*code)).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CodificationRuleEngine;
    use crate::types::FieldDefinition;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn sample_schema() -> EptSchema {
        let rows = vec![
            FieldDefinition::new("00060_Portfolio_Or_Share_Class_Currency", "Currency")
                .with_codification("Code ISO 4217")
                .with_mandatory("M"),
            FieldDefinition::new("00110_Is_An_Autocallable_Product", "Autocallable")
                .with_codification("Y/N"),
        ];
        EptSchema::build(CodificationRuleEngine::default().derive(&rows).unwrap())
    }

    #[test]
    fn test_document_layout() {
        let value = serde_json::to_value(sample_schema()).unwrap();

        assert_eq!(value["$schema"], json!(DRAFT_07));
        assert_eq!(
            value["oneOf"],
            json!([
                {"$ref": EPT_REF},
                {"type": "array", "items": {"$ref": EPT_REF}}
            ])
        );
        let ept = &value["components"]["schemas"]["ept"];
        assert_eq!(ept["type"], json!("object"));
        assert_eq!(ept["additionalProperties"], json!(false));
        assert_eq!(
            ept["properties"]["00060_Portfolio_Or_Share_Class_Currency"]["$ref"],
            json!(CURRENCY_REF)
        );
        assert_eq!(value["components"]["schemas"]["currency"]["type"], json!("string"));
        assert!(value["components"]["schemas"]["language"]["enum"]
            .as_array()
            .unwrap()
            .contains(&Value::from("eng")));
    }

    #[test]
    fn test_top_level_key_order() {
        let mut buffer = Vec::new();
        sample_schema().write_to(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let schema_at = text.find("\"$schema\"").unwrap();
        let one_of_at = text.find("\"oneOf\"").unwrap();
        let components_at = text.find("\"components\"").unwrap();
        assert!(schema_at < one_of_at && one_of_at < components_at);
        assert!(text.starts_with("{\n  \"$schema\""));
    }

    #[test]
    fn test_write_then_read_is_identical() {
        let schema = sample_schema();
        let mut buffer = Vec::new();
        schema.write_to(&mut buffer).unwrap();

        let reread = EptSchema::from_read(&mut buffer.as_slice()).unwrap();
        assert_eq!(reread, schema);
    }

    #[test]
    fn test_resolve() {
        let schema = sample_schema();
        assert!(matches!(schema.resolve(EPT_REF), Some(Resolved::Object(_))));
        assert!(matches!(schema.resolve(LANGUAGE_REF), Some(Resolved::Fragment(_))));
        assert!(schema.resolve("#/components/schemas/country").is_none());
    }
}
