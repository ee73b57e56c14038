//! Common types shared by the rule engine, the schema model and the validator.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

/// One row of the EPT field-definition table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Field identifier, e.g. `00010_Portfolio_Manufacturer_Name`.
    #[serde(
        default,
        deserialize_with = "cell_text",
        skip_serializing_if = "String::is_empty"
    )]
    pub field: String,

    /// Human-readable description. Rows without one are section headers.
    #[serde(
        default,
        deserialize_with = "optional_cell_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub definition: Option<String>,

    /// Free-text type/format rule.
    #[serde(
        default,
        deserialize_with = "optional_cell_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub codification: Option<String>,

    /// Additional remarks.
    #[serde(
        default,
        deserialize_with = "optional_cell_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub comment: Option<String>,

    /// Whether the field is synchronised with the PRIIPs KID template.
    #[serde(
        rename = "synchronisedWithPriips",
        default,
        deserialize_with = "optional_cell_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub synchronised_with_priips: Option<String>,

    /// Mandatory flag, `M` when mandatory.
    #[serde(
        default,
        deserialize_with = "optional_cell_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub mandatory: Option<String>,

    /// Whether the field is needed for UK reporting.
    #[serde(
        rename = "neededUK",
        default,
        deserialize_with = "optional_cell_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub needed_uk: Option<String>,
}

impl FieldDefinition {
    /// Create a row with only an identifier and a definition.
    pub fn new(field: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            definition: Some(definition.into()),
            ..Self::default()
        }
    }

    /// Set the codification text.
    #[must_use]
    pub fn with_codification(mut self, codification: impl Into<String>) -> Self {
        self.codification = Some(codification.into());
        self
    }

    /// Set the comment text.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Set the mandatory flag.
    #[must_use]
    pub fn with_mandatory(mut self, mandatory: impl Into<String>) -> Self {
        self.mandatory = Some(mandatory.into());
        self
    }
}

/// Spreadsheet extractions carry numbers and booleans as well as text.
fn cell_to_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn optional_cell_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(cell_to_text))
}

fn cell_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_cell_text(deserializer)?.unwrap_or_default())
}

/// JSON Schema primitive types used by the EPT schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Object,
    Array,
}

impl SchemaType {
    /// Keyword spelling, as written in the schema.
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Object => "object",
            SchemaType::Array => "array",
        }
    }
}

/// Values of the `format` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StringFormat {
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "date-time")]
    DateTime,
    #[serde(rename = "email")]
    Email,
}

impl StringFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            StringFormat::Date => "date",
            StringFormat::DateTime => "date-time",
            StringFormat::Email => "email",
        }
    }
}

/// One member of an `enum` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumValue {
    Integer(i64),
    Text(String),
}

impl From<&str> for EnumValue {
    fn from(value: &str) -> Self {
        EnumValue::Text(value.to_string())
    }
}

impl From<i64> for EnumValue {
    fn from(value: i64) -> Self {
        EnumValue::Integer(value)
    }
}

impl EnumValue {
    /// Whether a JSON instance equals this member. Numbers compare by value.
    pub fn matches(&self, instance: &Value) -> bool {
        match (self, instance) {
            (EnumValue::Text(expected), Value::String(actual)) => expected == actual,
            (EnumValue::Integer(expected), Value::Number(actual)) => {
                actual.as_f64() == Some(*expected as f64)
            }
            _ => false,
        }
    }
}

/// The derived JSON Schema object for one field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaFragment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,

    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<EnumValue>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,

    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<StringFormat>,

    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(rename = "oneOf", skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<SchemaFragment>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaFragment>>,
}

impl SchemaFragment {
    /// A fragment holding only a description.
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    /// A fragment holding only a `$ref`.
    pub fn reference(target: impl Into<String>) -> Self {
        Self {
            reference: Some(target.into()),
            ..Self::default()
        }
    }

    /// A fragment with a type and an enumeration.
    pub fn enumeration(schema_type: SchemaType, values: Vec<EnumValue>) -> Self {
        Self {
            schema_type: Some(schema_type),
            enum_values: Some(values),
            ..Self::default()
        }
    }

    /// Whether a type, a `$ref` or a `oneOf` union has been set.
    pub fn has_shape(&self) -> bool {
        self.schema_type.is_some() || self.reference.is_some() || self.one_of.is_some()
    }
}
