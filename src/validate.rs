//! Validation of EPT documents against a generated schema.
//!
//! Covers the keywords the schema generator emits: `type`, `enum`, `minimum`,
//! `maximum`, `maxLength`, `pattern`, `format`, `$ref`, `oneOf`, `items`,
//! `properties`, `required` and `additionalProperties`.

use chrono::{DateTime, NaiveDate};
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

use crate::error::{Error, Result};
use crate::schema::{EptSchema, ObjectSchema, Resolved};
use crate::types::{SchemaFragment, SchemaType, StringFormat};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(
        r"^[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?$",
    )
    .case_insensitive(true)
    .build()
    .expect("static pattern compiles")
});

/// One failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// JSON pointer to the offending value.
    #[serde(rename = "instancePath")]
    pub instance_path: String,
    pub keyword: &'static str,
    pub message: String,
}

/// Validates documents against one schema. Patterns are compiled once.
#[derive(Debug)]
pub struct SchemaValidator<'a> {
    schema: &'a EptSchema,
    patterns: HashMap<&'a str, Regex>,
}

impl<'a> SchemaValidator<'a> {
    /// Prepare a validator. Fails on patterns that do not compile and on
    /// references outside `components.schemas`.
    pub fn new(schema: &'a EptSchema) -> Result<Self> {
        let mut validator = Self {
            schema,
            patterns: HashMap::new(),
        };

        for fragment in &schema.one_of {
            validator.prepare(fragment)?;
        }
        let schemas = &schema.components.schemas;
        validator.prepare(&schemas.currency)?;
        validator.prepare(&schemas.language)?;
        for fragment in schemas.ept.properties.values() {
            validator.prepare(fragment)?;
        }

        debug!(patterns = validator.patterns.len(), "validator ready");
        Ok(validator)
    }

    fn prepare(&mut self, fragment: &'a SchemaFragment) -> Result<()> {
        if let Some(pattern) = fragment.pattern.as_deref() {
            if !self.patterns.contains_key(pattern) {
                self.patterns.insert(pattern, Regex::new(pattern)?);
            }
        }
        if let Some(reference) = fragment.reference.as_deref() {
            if self.schema.resolve(reference).is_none() {
                return Err(Error::UnresolvedReference(reference.to_string()));
            }
        }
        for branch in fragment.one_of.iter().flatten() {
            self.prepare(branch)?;
        }
        if let Some(items) = fragment.items.as_deref() {
            self.prepare(items)?;
        }
        Ok(())
    }

    /// Validate a document against the top-level `oneOf`.
    pub fn validate(&self, instance: &Value) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        self.check_one_of(&self.schema.one_of, instance, "", &mut issues);
        issues
    }

    /// Validate a single record against the record schema.
    pub fn validate_record(&self, instance: &Value) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        self.check_object(self.schema.ept(), instance, "", &mut issues);
        issues
    }

    fn check_fragment(
        &self,
        fragment: &SchemaFragment,
        instance: &Value,
        path: &str,
        issues: &mut Vec<ValidationIssue>,
    ) {
        if let Some(reference) = fragment.reference.as_deref() {
            match self.schema.resolve(reference) {
                Some(Resolved::Fragment(target)) => self.check_fragment(target, instance, path, issues),
                Some(Resolved::Object(target)) => self.check_object(target, instance, path, issues),
                None => issues.push(issue(path, "$ref", format!("can't resolve reference {reference}"))),
            }
        }

        if let Some(schema_type) = fragment.schema_type {
            if !type_matches(schema_type, instance) {
                issues.push(issue(path, "type", format!("must be {}", schema_type.as_str())));
                return;
            }
        }

        if let Some(values) = &fragment.enum_values {
            if !values.iter().any(|value| value.matches(instance)) {
                issues.push(issue(path, "enum", "must be equal to one of the allowed values".to_string()));
            }
        }

        if let Some(number) = instance.as_f64() {
            if let Some(minimum) = fragment.minimum.as_ref().and_then(|m| m.as_f64()) {
                if number < minimum {
                    issues.push(issue(path, "minimum", format!("must be >= {minimum}")));
                }
            }
            if let Some(maximum) = fragment.maximum.as_ref().and_then(|m| m.as_f64()) {
                if number > maximum {
                    issues.push(issue(path, "maximum", format!("must be <= {maximum}")));
                }
            }
        }

        if let Some(text) = instance.as_str() {
            if let Some(limit) = fragment.max_length {
                if text.chars().count() as u64 > limit {
                    issues.push(issue(
                        path,
                        "maxLength",
                        format!("must NOT have more than {limit} characters"),
                    ));
                }
            }
            if let Some(pattern) = fragment.pattern.as_deref() {
                if let Some(regex) = self.patterns.get(pattern) {
                    if !regex.is_match(text) {
                        issues.push(issue(path, "pattern", format!("must match pattern \"{pattern}\"")));
                    }
                }
            }
            if let Some(format) = fragment.format {
                if !format_matches(format, text) {
                    issues.push(issue(path, "format", format!("must match format \"{}\"", format.as_str())));
                }
            }
        }

        if let (Some(items), Value::Array(elements)) = (fragment.items.as_deref(), instance) {
            for (index, element) in elements.iter().enumerate() {
                self.check_fragment(items, element, &format!("{path}/{index}"), issues);
            }
        }

        if let Some(branches) = &fragment.one_of {
            self.check_one_of(branches, instance, path, issues);
        }
    }

    fn check_one_of(
        &self,
        branches: &[SchemaFragment],
        instance: &Value,
        path: &str,
        issues: &mut Vec<ValidationIssue>,
    ) {
        let outcomes: Vec<Vec<ValidationIssue>> = branches
            .iter()
            .map(|branch| {
                let mut branch_issues = Vec::new();
                self.check_fragment(branch, instance, path, &mut branch_issues);
                branch_issues
            })
            .collect();

        let passing = outcomes.iter().filter(|outcome| outcome.is_empty()).count();
        if passing == 1 {
            return;
        }
        if passing == 0 {
            issues.extend(outcomes.into_iter().flatten());
        }
        issues.push(issue(path, "oneOf", "must match exactly one schema in oneOf".to_string()));
    }

    fn check_object(
        &self,
        object: &ObjectSchema,
        instance: &Value,
        path: &str,
        issues: &mut Vec<ValidationIssue>,
    ) {
        let Value::Object(fields) = instance else {
            issues.push(issue(path, "type", format!("must be {}", object.schema_type.as_str())));
            return;
        };

        for required in &object.required {
            if !fields.contains_key(required) {
                issues.push(issue(
                    path,
                    "required",
                    format!("must have required property '{required}'"),
                ));
            }
        }

        for (name, value) in fields {
            let child = format!("{path}/{}", escape_pointer(name));
            match object.properties.get(name) {
                Some(fragment) => self.check_fragment(fragment, value, &child, issues),
                None if !object.additional_properties => issues.push(issue(
                    path,
                    "additionalProperties",
                    format!("must NOT have additional property '{name}'"),
                )),
                None => {}
            }
        }
    }
}

fn issue(path: &str, keyword: &'static str, message: String) -> ValidationIssue {
    ValidationIssue {
        instance_path: path.to_string(),
        keyword,
        message,
    }
}

fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn type_matches(schema_type: SchemaType, instance: &Value) -> bool {
    match schema_type {
        SchemaType::String => instance.is_string(),
        SchemaType::Number => instance.is_number(),
        SchemaType::Integer => instance
            .as_f64()
            .is_some_and(|number| number.fract() == 0.0),
        SchemaType::Object => instance.is_object(),
        SchemaType::Array => instance.is_array(),
    }
}

fn format_matches(format: StringFormat, text: &str) -> bool {
    match format {
        StringFormat::Date => {
            text.len() == 10 && NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
        }
        StringFormat::DateTime => DateTime::parse_from_rfc3339(text).is_ok(),
        StringFormat::Email => EMAIL.is_match(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CodificationRuleEngine, MandatoryPolicy};
    use crate::types::FieldDefinition;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn schema() -> EptSchema {
        let rows = vec![
            FieldDefinition::new("00001_EPT_Version", "Version")
                .with_codification("V21 or V21UK")
                .with_mandatory("M"),
            FieldDefinition::new("00004_EPT_Producer_Email", "Email").with_codification("string"),
            FieldDefinition::new("00016_Portfolio_Manufacturer_LEI", "LEI")
                .with_codification("Alphanum(20) ISO 17442"),
            FieldDefinition::new("00060_Portfolio_Or_Share_Class_Currency", "Currency")
                .with_codification("Code ISO 4217"),
            FieldDefinition::new("00070_PRIIPs_KID_Publication_Date", "Published")
                .with_codification("YYYY-MM-DD         ISO 8601"),
            FieldDefinition::new("01090_SRI", "SRI").with_codification("number[1-7]"),
            FieldDefinition::new("01120_Recommended_Holding_Period", "RHP")
                .with_codification("in years (not an integer)"),
            FieldDefinition::new("02035_Autocall_Date_Unfavourable_Scenario", "Autocall")
                .with_codification(crate::rules::FREQUENCY_OR_FIXED_DATE),
        ];
        let derived = CodificationRuleEngine::new(MandatoryPolicy::flags_only())
            .derive(&rows)
            .unwrap();
        EptSchema::build(derived)
    }

    fn keywords(issues: &[ValidationIssue]) -> Vec<&'static str> {
        issues.iter().map(|issue| issue.keyword).collect()
    }

    #[test]
    fn test_valid_record_and_array() {
        let schema = schema();
        let validator = SchemaValidator::new(&schema).unwrap();
        let record = json!({
            "00001_EPT_Version": "V21",
            "00004_EPT_Producer_Email": "ept@captor.se",
            "00016_Portfolio_Manufacturer_LEI": "549300SKDVJCZ8ZYIF63",
            "00060_Portfolio_Or_Share_Class_Currency": "SEK",
            "00070_PRIIPs_KID_Publication_Date": "2024-02-29",
            "01090_SRI": 2,
            "01120_Recommended_Holding_Period": 3.0,
            "02035_Autocall_Date_Unfavourable_Scenario": 252
        });

        assert_eq!(validator.validate(&record), Vec::new());
        assert_eq!(validator.validate(&json!([record.clone(), record])), Vec::new());
    }

    #[test]
    fn test_required_and_additional_properties() {
        let schema = schema();
        let validator = SchemaValidator::new(&schema).unwrap();
        let issues = validator.validate_record(&json!({"Unknown": 1}));

        assert_eq!(keywords(&issues), vec!["required", "additionalProperties"]);
        assert_eq!(issues[0].message, "must have required property '00001_EPT_Version'");
    }

    #[test]
    fn test_field_level_failures() {
        let schema = schema();
        let validator = SchemaValidator::new(&schema).unwrap();
        let issues = validator.validate_record(&json!({
            "00001_EPT_Version": "V20",
            "00004_EPT_Producer_Email": "not an address",
            "00016_Portfolio_Manufacturer_LEI": "549300SKDVJCZ8ZYIF63-TOO-LONG!",
            "00060_Portfolio_Or_Share_Class_Currency": "SEKK",
            "00070_PRIIPs_KID_Publication_Date": "2023-02-29",
            "01090_SRI": 8,
            "01120_Recommended_Holding_Period": 2.5
        }));

        assert_eq!(
            keywords(&issues),
            vec!["enum", "format", "maxLength", "pattern", "enum", "format", "maximum", "type"]
        );
        assert_eq!(issues[6].instance_path, "/01090_SRI");
    }

    #[test]
    fn test_union_accepts_either_branch() {
        let schema = schema();
        let validator = SchemaValidator::new(&schema).unwrap();
        let base = |value: Value| json!({"00001_EPT_Version": "V21", "02035_Autocall_Date_Unfavourable_Scenario": value});

        assert!(validator.validate_record(&base(json!(12))).is_empty());
        assert!(validator.validate_record(&base(json!("2030-06-30"))).is_empty());
        let issues = validator.validate_record(&base(json!(13)));
        assert_eq!(issues.last().unwrap().keyword, "oneOf");
    }

    #[test]
    fn test_top_level_rejects_scalar() {
        let schema = schema();
        let validator = SchemaValidator::new(&schema).unwrap();
        let issues = validator.validate(&json!("EPT"));
        assert_eq!(keywords(&issues), vec!["type", "type", "oneOf"]);
    }

    #[test]
    fn test_unknown_reference_is_rejected_up_front() {
        let mut schema = schema();
        schema
            .components
            .schemas
            .ept
            .properties
            .insert("X".to_string(), SchemaFragment::reference("#/components/schemas/country"));

        assert!(matches!(
            SchemaValidator::new(&schema),
            Err(Error::UnresolvedReference(reference)) if reference.ends_with("country")
        ));
    }

    #[test]
    fn test_formats() {
        assert!(format_matches(StringFormat::Date, "2024-02-29"));
        assert!(!format_matches(StringFormat::Date, "2024-2-9"));
        assert!(format_matches(StringFormat::DateTime, "2024-01-31T10:00:00Z"));
        assert!(!format_matches(StringFormat::DateTime, "2024-01-31 10:00:00"));
        assert!(format_matches(StringFormat::Email, "First.Last@example.co.uk"));
        assert!(!format_matches(StringFormat::Email, "first@"));
    }
}
