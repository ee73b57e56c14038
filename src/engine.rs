//! Codification rule engine.
//!
//! Turns the rows of the EPT field-definition table into a property map of
//! schema fragments and the list of required fields.
//!
//! # Examples
//!
//! ```
//! use ept_tools::engine::CodificationRuleEngine;
//! use ept_tools::types::FieldDefinition;
//!
//! let rows = vec![
//!     FieldDefinition::new("00110_Is_An_Autocallable_Product", "Autocallable?")
//!         .with_codification("Y/N")
//!         .with_mandatory("M"),
//! ];
//! let derived = CodificationRuleEngine::default().derive(&rows)?;
//! assert!(derived.required.contains(&"00110_Is_An_Autocallable_Product".to_string()));
//! # Ok::<(), ept_tools::Error>(())
//! ```

use indexmap::IndexMap;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::rules::{codification_rules, identifier_overrides, Rule};
use crate::types::{FieldDefinition, SchemaFragment};

/// Value of the `mandatory` column that marks a field as required.
pub const MANDATORY_MARKER: &str = "M";

/// Fields flagged mandatory in the table that published files routinely omit.
pub const NOT_ENFORCED_MANDATORY: &[&str] = &[
    "04060_Other_Materially_Relevant_Risk_Narrative_Portfolio",
    "06005_German_MOPs_Reference_Date",
    "06010_Bonds_Weight",
    "06020_Annualized_Return_Volatility",
    "06030_Duration_Bonds",
    "06040_Existing_Capital_Preservation",
    "06070_Uses_PI",
    "08020_UK_Ongoing_Costs_Portfolio_Transaction_Costs",
    "08030_UK_Transactions_costs_methodology",
    "08090_UK_Performance_Information_Main_Factors",
    "08110_UK_Performance_Information_Higher_Returns",
    "08120_UK_Performance_Information_Lower_Returns_Or_Loss",
    "08130_UK_Performance_Information_Adverse_Conditions",
    "08150_UCITS_KIID_Publication_Date",
    "08160_UCITS_KIID_Web_Address",
    "08170_UCITS_SRRI",
    "08180_UCITS_Ongoing_Charges",
    "08190_UCITS_Existing_Performance_Fees",
];

/// Fields the FE fundinfo format validator treats as mandatory although the
/// table does not flag them.
pub const VALIDATOR_MANDATORY: &[&str] = &[
    "00120_Reference_Language",
    "01020_Portfolio_VEV_Reference",
    "02190_Past_Performance_Link",
    "02200_Previous_Performance_Scenarios_Calculation_Link",
    "02210_Past_Performance_Number_Of_Years",
];

/// Decides which fields end up in the schema's `required` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MandatoryPolicy {
    /// Value of the `mandatory` column meaning "required".
    pub marker: String,
    /// Flagged fields that are nevertheless not required.
    pub not_enforced: BTreeSet<String>,
    /// Fields required regardless of their flag.
    pub always_required: Vec<String>,
}

impl Default for MandatoryPolicy {
    fn default() -> Self {
        Self::new(MANDATORY_MARKER, NOT_ENFORCED_MANDATORY, VALIDATOR_MANDATORY)
    }
}

impl MandatoryPolicy {
    pub fn new(marker: &str, not_enforced: &[&str], always_required: &[&str]) -> Self {
        Self {
            marker: marker.to_string(),
            not_enforced: not_enforced.iter().map(|field| field.to_string()).collect(),
            always_required: always_required.iter().map(|field| field.to_string()).collect(),
        }
    }

    /// A policy that only honours the table's own flags.
    pub fn flags_only() -> Self {
        Self::new(MANDATORY_MARKER, &[], &[])
    }

    /// Whether the row's own flag makes it required.
    pub fn is_flagged_required(&self, row: &FieldDefinition) -> bool {
        row.mandatory.as_deref() == Some(self.marker.as_str())
            && !self.not_enforced.contains(&row.field)
    }
}

/// A field whose codification matched no rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedField {
    pub field: String,
    pub codification: Option<String>,
}

/// Output of one engine run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedFields {
    /// Schema fragment per field identifier, in sheet order.
    pub properties: IndexMap<String, SchemaFragment>,
    /// Required field identifiers, sorted and deduplicated.
    pub required: Vec<String>,
    /// Fields emitted without a type, `$ref` or `oneOf`.
    pub unresolved: Vec<UnresolvedField>,
}

/// Applies the codification rules, then the identifier overrides, to each row.
#[derive(Debug, Clone)]
pub struct CodificationRuleEngine {
    codification_rules: Vec<Rule>,
    identifier_overrides: Vec<Rule>,
    policy: MandatoryPolicy,
}

impl Default for CodificationRuleEngine {
    fn default() -> Self {
        Self::new(MandatoryPolicy::default())
    }
}

impl CodificationRuleEngine {
    /// Engine with the built-in rule lists.
    pub fn new(policy: MandatoryPolicy) -> Self {
        Self::with_rules(codification_rules(), identifier_overrides(), policy)
    }

    /// Engine with caller-supplied rule lists.
    pub fn with_rules(
        codification_rules: Vec<Rule>,
        identifier_overrides: Vec<Rule>,
        policy: MandatoryPolicy,
    ) -> Self {
        Self {
            codification_rules,
            identifier_overrides,
            policy,
        }
    }

    pub fn policy(&self) -> &MandatoryPolicy {
        &self.policy
    }

    /// Build the fragment of one row. Returns `None` for rows without a definition.
    pub fn fragment_for(&self, row: &FieldDefinition) -> Result<Option<SchemaFragment>> {
        let Some(definition) = row.definition.as_deref() else {
            return Ok(None);
        };

        let mut description = definition.to_string();
        for extra in [row.comment.as_deref(), row.codification.as_deref()].into_iter().flatten() {
            description.push_str("\r\n");
            description.push_str(extra);
        }
        let mut fragment = SchemaFragment::described(description);

        let codification = row.codification.as_deref();
        for rule in self.codification_rules.iter().chain(&self.identifier_overrides) {
            let Some(captures) = rule.matches(&row.field, codification) else {
                continue;
            };
            debug!(field = %row.field, rule = rule.name, "rule matched");
            rule.apply(&mut fragment, &captures)
                .map_err(|source| Error::InvalidCodification {
                    field: row.field.clone(),
                    codification: codification.unwrap_or_default().to_string(),
                    source,
                })?;
        }

        Ok(Some(fragment))
    }

    /// Run the engine over the whole table.
    pub fn derive(&self, rows: &[FieldDefinition]) -> Result<DerivedFields> {
        let mut derived = DerivedFields::default();

        for row in rows {
            let Some(fragment) = self.fragment_for(row)? else {
                continue;
            };

            if !fragment.has_shape() {
                warn!(
                    field = %row.field,
                    codification = row.codification.as_deref().unwrap_or_default(),
                    "no rule matched codification"
                );
                derived.unresolved.push(UnresolvedField {
                    field: row.field.clone(),
                    codification: row.codification.clone(),
                });
            }

            if self.policy.is_flagged_required(row) {
                derived.required.push(row.field.clone());
            }

            if derived.properties.insert(row.field.clone(), fragment).is_some() {
                warn!(field = %row.field, "duplicate field identifier, keeping the last row at the first position");
            }
        }

        derived
            .required
            .extend(self.policy.always_required.iter().cloned());
        derived.required.sort();
        derived.required.dedup();

        info!(
            properties = derived.properties.len(),
            required = derived.required.len(),
            unresolved = derived.unresolved.len(),
            "derived schema properties"
        );

        Ok(derived)
    }
}
