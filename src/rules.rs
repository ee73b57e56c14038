//! Codification rules.
//!
//! Each rule pairs a [`Matcher`] with an [`Effect`]. Rules are not mutually
//! exclusive: the engine applies every matching rule in list order to the same
//! fragment, so a later rule overwrites whatever keys an earlier one set.
//! Identifier overrides form a second list that always runs last.

use regex::Regex;
use serde_json::Number;
use std::num::ParseIntError;
use std::sync::LazyLock;
use thiserror::Error;

use crate::schema::{CURRENCY_REF, LANGUAGE_REF};
use crate::types::{EnumValue, SchemaFragment, SchemaType, StringFormat};

static STRING_LENGTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^string\s*\[([0-9]+)\]$").expect("static pattern compiles")
});

// Only anchored at the start; trailing text after the bracket is tolerated.
static NUMBER_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^number\s*\[([0-9]+)\s*-\s*([0-9]+)\]").expect("static pattern compiles")
});

/// Solvency II asset category remark used by the CIC code field.
pub const SOLVENCY_ASSET_CODE: &str = "S.06.02 (old: Assets D1)  - Remark:  first two digits are expected to be XL ( not country code)";

/// Valuation frequency codification.
pub const FREQUENCY: &str = r#"Frequency ("0" = other than /"1"= annual  / "2"= biannual / "4"=quarterly / "12"= monthly / "24"=bimonthly / "52"=weekly / "104"=biweekly, "252"=daily)"#;

/// Frequency codification that also admits a fixed date.
pub const FREQUENCY_OR_FIXED_DATE: &str = r#"Frequency (/"1"= annual  / "2"= biannual / "4"=quarterly / "12"= monthly / "24"=bimonthly / "52"=weekly / "104"=biweekly/"252"=daily /"YYYY-MM-DD"=fixed date)"#;

const FREQUENCY_CODES: [i64; 9] = [0, 1, 2, 4, 12, 24, 52, 104, 252];

const IDENTIFICATION_CODE_TYPES: [i64; 10] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 99];

/// Marker contained in the identifier of every email field.
pub const EMAIL_FIELD_MARKER: &str = "_Email";

/// Failure to turn a regex capture into a schema value.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture group {0} is missing")]
    Missing(usize),

    #[error("'{value}' is not a valid bound: {source}")]
    NotANumber {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// Applies a rule to the fragment accumulator. Receives the regex captures
/// (group 1 first) or an empty slice for non-regex matchers.
pub type Effect = fn(&mut SchemaFragment, &[&str]) -> Result<(), CaptureError>;

/// What a rule tests.
#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    /// Codification equals one of the literals.
    Exact(&'static [&'static str]),
    /// Codification starts with the literal.
    Prefix(&'static str),
    /// Codification matches the regex.
    Pattern(&'static LazyLock<Regex>),
    /// Field identifier equals the literal.
    FieldEquals(&'static str),
    /// Field identifier contains the literal.
    FieldContains(&'static str),
}

/// A named predicate/effect pair.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub matcher: Matcher,
    pub effect: Effect,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

impl Rule {
    /// Test the rule against a row. Returns the captures when it matches.
    pub fn matches<'a>(&self, field: &str, codification: Option<&'a str>) -> Option<Vec<&'a str>> {
        match self.matcher {
            Matcher::Exact(literals) => codification
                .filter(|text| literals.iter().any(|literal| literal == text))
                .map(|_| Vec::new()),
            Matcher::Prefix(prefix) => codification
                .filter(|text| text.starts_with(prefix))
                .map(|_| Vec::new()),
            Matcher::Pattern(regex) => {
                let captures = regex.captures(codification?)?;
                Some(
                    captures
                        .iter()
                        .skip(1)
                        .map(|group| group.map_or("", |m| m.as_str()))
                        .collect(),
                )
            }
            Matcher::FieldEquals(identifier) => (field == identifier).then(Vec::new),
            Matcher::FieldContains(marker) => field.contains(marker).then(Vec::new),
        }
    }

    /// Run the effect on the accumulator.
    pub fn apply(&self, fragment: &mut SchemaFragment, captures: &[&str]) -> Result<(), CaptureError> {
        (self.effect)(fragment, captures)
    }
}

fn capture(captures: &[&str], index: usize) -> Result<u64, CaptureError> {
    let value = captures
        .get(index)
        .filter(|value| !value.is_empty())
        .ok_or(CaptureError::Missing(index + 1))?;
    value.parse().map_err(|source| CaptureError::NotANumber {
        value: (*value).to_string(),
        source,
    })
}

fn text_enum(values: &[&str]) -> Vec<EnumValue> {
    values.iter().map(|value| EnumValue::from(*value)).collect()
}

fn integer_enum(values: &[i64]) -> Vec<EnumValue> {
    values.iter().map(|value| EnumValue::from(*value)).collect()
}

/// Rules keyed on codification text, in evaluation order.
pub fn codification_rules() -> Vec<Rule> {
    vec![
        Rule {
            name: "release-version",
            matcher: Matcher::Exact(&["V21 or V21UK"]),
            effect: |fragment, _| {
                fragment.schema_type = Some(SchemaType::String);
                fragment.enum_values = Some(text_enum(&["V21", "V21UK"]));
                Ok(())
            },
        },
        Rule {
            name: "bounded-string",
            matcher: Matcher::Pattern(&STRING_LENGTH),
            effect: |fragment, captures| {
                fragment.schema_type = Some(SchemaType::String);
                fragment.max_length = Some(capture(captures, 0)?);
                Ok(())
            },
        },
        Rule {
            name: "number-range",
            matcher: Matcher::Pattern(&NUMBER_RANGE),
            effect: |fragment, captures| {
                let minimum = capture(captures, 0)?;
                let maximum = capture(captures, 1)?;
                fragment.schema_type = Some(SchemaType::Number);
                fragment.minimum = Some(Number::from(minimum));
                fragment.maximum = Some(Number::from(maximum));
                Ok(())
            },
        },
        Rule {
            name: "floating-decimal",
            matcher: Matcher::Prefix("floating decimal"),
            effect: |fragment, _| {
                fragment.schema_type = Some(SchemaType::Number);
                Ok(())
            },
        },
        Rule {
            name: "integer",
            matcher: Matcher::Exact(&["integer"]),
            effect: |fragment, _| {
                fragment.schema_type = Some(SchemaType::Integer);
                Ok(())
            },
        },
        Rule {
            // The codification says "not an integer" but the values delivered are whole years.
            name: "years",
            matcher: Matcher::Exact(&["in years (not an integer)"]),
            effect: |fragment, _| {
                fragment.schema_type = Some(SchemaType::Integer);
                Ok(())
            },
        },
        Rule {
            name: "yes-no",
            matcher: Matcher::Exact(&["Y/N", "Y / N"]),
            effect: |fragment, _| {
                fragment.schema_type = Some(SchemaType::String);
                fragment.enum_values = Some(text_enum(&["Y", "N"]));
                Ok(())
            },
        },
        Rule {
            name: "alphanum-255",
            matcher: Matcher::Exact(&["Alphanum (max 255)"]),
            effect: |fragment, _| {
                fragment.schema_type = Some(SchemaType::String);
                fragment.max_length = Some(255);
                Ok(())
            },
        },
        Rule {
            name: "lei",
            matcher: Matcher::Exact(&["Alphanum(20) ISO 17442"]),
            effect: |fragment, _| {
                fragment.schema_type = Some(SchemaType::String);
                fragment.max_length = Some(20);
                fragment.pattern = Some("^[ A-Za-z0-9]*$".to_string());
                Ok(())
            },
        },
        Rule {
            name: "string",
            matcher: Matcher::Exact(&["string"]),
            effect: |fragment, _| {
                fragment.schema_type = Some(SchemaType::String);
                Ok(())
            },
        },
        Rule {
            name: "date",
            matcher: Matcher::Exact(&["YYYY-MM-DD         ISO 8601"]),
            effect: |fragment, _| {
                fragment.schema_type = Some(SchemaType::String);
                fragment.format = Some(StringFormat::Date);
                Ok(())
            },
        },
        Rule {
            name: "date-time",
            matcher: Matcher::Exact(&["YYYY-MM-DD  hh:mm:ss       ISO 8601     (UTC+0)"]),
            effect: |fragment, _| {
                fragment.schema_type = Some(SchemaType::String);
                fragment.format = Some(StringFormat::DateTime);
                Ok(())
            },
        },
        Rule {
            name: "currency",
            matcher: Matcher::Exact(&["Code ISO 4217"]),
            effect: |fragment, _| {
                fragment.reference = Some(CURRENCY_REF.to_string());
                Ok(())
            },
        },
        Rule {
            name: "language",
            matcher: Matcher::Exact(&["ISO 639-2"]),
            effect: |fragment, _| {
                fragment.reference = Some(LANGUAGE_REF.to_string());
                Ok(())
            },
        },
        Rule {
            name: "cic-asset-code",
            matcher: Matcher::Exact(&[SOLVENCY_ASSET_CODE]),
            effect: |fragment, _| {
                fragment.schema_type = Some(SchemaType::String);
                fragment.pattern = Some("^XL[A-Za-z0-9]{2}$".to_string());
                Ok(())
            },
        },
        Rule {
            name: "frequency",
            matcher: Matcher::Exact(&[FREQUENCY]),
            effect: |fragment, _| {
                fragment.schema_type = Some(SchemaType::Number);
                fragment.enum_values = Some(integer_enum(&FREQUENCY_CODES));
                Ok(())
            },
        },
        Rule {
            name: "frequency-or-fixed-date",
            matcher: Matcher::Exact(&[FREQUENCY_OR_FIXED_DATE]),
            effect: |fragment, _| {
                fragment.one_of = Some(vec![
                    SchemaFragment::enumeration(SchemaType::Number, integer_enum(&FREQUENCY_CODES)),
                    SchemaFragment {
                        schema_type: Some(SchemaType::String),
                        format: Some(StringFormat::Date),
                        ..SchemaFragment::default()
                    },
                ]);
                Ok(())
            },
        },
        Rule {
            name: "mil",
            matcher: Matcher::Exact(&[r#""M", "I", "L""#]),
            effect: |fragment, _| {
                fragment.schema_type = Some(SchemaType::String);
                fragment.enum_values = Some(text_enum(&["M", "I", "L"]));
                Ok(())
            },
        },
        Rule {
            name: "one-two-three",
            matcher: Matcher::Exact(&["1, or 2, or 3"]),
            effect: |fragment, _| {
                fragment.schema_type = Some(SchemaType::Number);
                fragment.enum_values = Some(integer_enum(&[1, 2, 3]));
                Ok(())
            },
        },
        Rule {
            name: "one-to-four",
            matcher: Matcher::Exact(&["1 to 4"]),
            effect: |fragment, _| {
                fragment.schema_type = Some(SchemaType::Number);
                fragment.minimum = Some(Number::from(1));
                fragment.maximum = Some(Number::from(4));
                Ok(())
            },
        },
        Rule {
            name: "uk-delivery",
            matcher: Matcher::Exact(&["UKPRIIP/UCITS/Both"]),
            effect: |fragment, _| {
                fragment.schema_type = Some(SchemaType::String);
                fragment.enum_values = Some(text_enum(&["UKPRIIP", "UCITS", "Both"]));
                Ok(())
            },
        },
    ]
}

/// Rules keyed on the field identifier, in evaluation order. These run after
/// every codification rule.
pub fn identifier_overrides() -> Vec<Rule> {
    vec![
        Rule {
            // Assumption: published files carry text here despite the numeric codification.
            name: "exit-cost-as-text",
            matcher: Matcher::FieldEquals("07080_One_Off_Costs_Portfolio_Exit_Cost"),
            effect: |fragment, _| {
                fragment.schema_type = Some(SchemaType::String);
                Ok(())
            },
        },
        Rule {
            // Assumption: same inconsistency as the exit cost field.
            name: "management-fees-as-text",
            matcher: Matcher::FieldEquals(
                "07100_Ongoing_Costs_Management_Fees_And_Other_Administrative_Or_Operating_Costs",
            ),
            effect: |fragment, _| {
                fragment.schema_type = Some(SchemaType::String);
                Ok(())
            },
        },
        Rule {
            name: "identification-code-type",
            matcher: Matcher::FieldEquals(
                "00040_Type_Of_Identification_Code_For_The_Fund_Share_Or_Portfolio",
            ),
            effect: |fragment, _| {
                fragment.schema_type = Some(SchemaType::Number);
                fragment.enum_values = Some(integer_enum(&IDENTIFICATION_CODE_TYPES));
                Ok(())
            },
        },
        Rule {
            name: "portfolio-identifier",
            matcher: Matcher::FieldEquals("00030_Portfolio_Identifying_Data"),
            effect: |fragment, _| {
                fragment.schema_type = Some(SchemaType::String);
                Ok(())
            },
        },
        Rule {
            // format and pattern never coexist on email fields
            name: "email",
            matcher: Matcher::FieldContains(EMAIL_FIELD_MARKER),
            effect: |fragment, _| {
                fragment.schema_type = Some(SchemaType::String);
                fragment.format = Some(StringFormat::Email);
                fragment.pattern = None;
                Ok(())
            },
        },
    ]
}
