//! Contract type definitions
//!
//! Immutable schema values. Built in code with the `with_*` builders or
//! deserialized from a catalog document.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Kind of a required parameter, with the data each kind needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParameterKind {
    /// Free text
    Text,
    /// Decimal number
    Number,
    /// One of a closed, ordered list of values
    Enum {
        /// Allowed values in display order
        enum_values: Vec<String>,
    },
}

/// A required input of a contract type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Key sent in the request `parameters` map
    pub key: String,
    /// Human-readable label
    pub label: String,
    /// Value kind
    #[serde(flatten)]
    pub kind: ParameterKind,
}

impl ParameterSpec {
    /// Create a free-text parameter
    #[inline]
    #[must_use]
    pub fn text(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind: ParameterKind::Text,
        }
    }

    /// Create a numeric parameter
    #[inline]
    #[must_use]
    pub fn number(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind: ParameterKind::Number,
        }
    }

    /// Create an enum parameter
    #[must_use]
    pub fn enumeration<I, S>(key: impl Into<String>, label: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            label: label.into(),
            kind: ParameterKind::Enum {
                enum_values: values.into_iter().map(Into::into).collect(),
            },
        }
    }

    /// Check whether `value` is acceptable for this parameter's kind
    ///
    /// Blank values are never accepted. Numbers may carry `,` thousands
    /// separators and must be finite.
    #[must_use]
    pub fn accepts(&self, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }

        match &self.kind {
            ParameterKind::Text => true,
            ParameterKind::Number => value
                .replace(',', "")
                .parse::<f64>()
                .is_ok_and(f64::is_finite),
            ParameterKind::Enum { enum_values } => enum_values.iter().any(|v| v == value),
        }
    }
}

/// One selectable variation of a clause option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    /// Value sent in the request `options` map
    pub value: String,
    /// Human-readable label
    pub label: String,
}

impl Variation {
    /// Create new variation
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A clause choice point; the first variation is the default
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseOption {
    /// Key sent in the request `options` map
    pub key: String,
    /// Human-readable label
    pub label: String,
    /// Ordered variations
    pub variations: Vec<Variation>,
}

impl ClauseOption {
    /// Create clause option without variations
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            variations: Vec::new(),
        }
    }

    /// Append a variation
    #[inline]
    #[must_use]
    pub fn with_variation(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.variations.push(Variation::new(value, label));
        self
    }

    /// Schema-declared default (first variation)
    #[inline]
    #[must_use]
    pub fn default_variation(&self) -> Option<&Variation> {
        self.variations.first()
    }

    /// Check whether `value` names one of the variations
    #[inline]
    #[must_use]
    pub fn has_variation(&self, value: &str) -> bool {
        self.variations.iter().any(|v| v.value == value)
    }
}

/// Schema of one document type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractTypeDefinition {
    /// Unique identifier, also the display name
    pub id: String,
    /// Governing jurisdiction
    pub jurisdiction: String,
    /// Required parameters in form order
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    /// Clause options in form order
    #[serde(default)]
    pub clause_options: Vec<ClauseOption>,
}

impl ContractTypeDefinition {
    /// Create definition with no parameters or clause options
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, jurisdiction: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            jurisdiction: jurisdiction.into(),
            parameters: Vec::new(),
            clause_options: Vec::new(),
        }
    }

    /// Append a parameter
    #[inline]
    #[must_use]
    pub fn with_parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Append a clause option
    #[inline]
    #[must_use]
    pub fn with_clause(mut self, option: ClauseOption) -> Self {
        self.clause_options.push(option);
        self
    }

    /// Find a parameter by key
    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.key == key)
    }

    /// Find a clause option by key
    #[must_use]
    pub fn clause_option(&self, key: &str) -> Option<&ClauseOption> {
        self.clause_options.iter().find(|o| o.key == key)
    }

    /// Default selection for every clause option, in schema order
    ///
    /// Options without variations are skipped.
    #[must_use]
    pub fn default_options(&self) -> IndexMap<String, String> {
        self.clause_options
            .iter()
            .filter_map(|option| {
                option
                    .default_variation()
                    .map(|v| (option.key.clone(), v.value.clone()))
            })
            .collect()
    }

    /// Label for a parameter or clause option key, falling back to the key
    #[must_use]
    pub fn label_for<'a>(&'a self, key: &'a str) -> &'a str {
        self.parameter(key)
            .map(|p| p.label.as_str())
            .or_else(|| self.clause_option(key).map(|o| o.label.as_str()))
            .unwrap_or(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> ContractTypeDefinition {
        ContractTypeDefinition::new("Sample", "Nowhere")
            .with_parameter(ParameterSpec::number("salary", "Salary"))
            .with_parameter(ParameterSpec::enumeration("status", "Status", ["A", "B"]))
            .with_clause(
                ClauseOption::new("arbitration", "Arbitration")
                    .with_variation("none", "None")
                    .with_variation("jams", "JAMS"),
            )
            .with_clause(ClauseOption::new("empty", "Empty"))
    }

    #[test]
    fn number_accepts_decimals_and_separators() {
        let p = ParameterSpec::number("salary", "Salary");
        assert!(p.accepts("120000"));
        assert!(p.accepts(" 120,000.50 "));
        assert!(!p.accepts("abc"));
        assert!(!p.accepts("inf"));
        assert!(!p.accepts(""));
    }

    #[test]
    fn enum_accepts_only_listed_values() {
        let p = ParameterSpec::enumeration("status", "Status", ["Exempt", "Non-Exempt"]);
        assert!(p.accepts("Exempt"));
        assert!(!p.accepts("exempt"));
    }

    #[test]
    fn text_rejects_blank() {
        let p = ParameterSpec::text("county", "County");
        assert!(p.accepts("Alameda"));
        assert!(!p.accepts("   "));
    }

    #[test]
    fn default_options_skip_empty_variations() {
        let defaults = sample().default_options();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults["arbitration"], "none");
    }

    #[test]
    fn label_for_falls_back_to_key() {
        let def = sample();
        assert_eq!(def.label_for("salary"), "Salary");
        assert_eq!(def.label_for("arbitration"), "Arbitration");
        assert_eq!(def.label_for("unknown"), "unknown");
    }

    #[test]
    fn parameter_kind_serde_shape() {
        let p = ParameterSpec::enumeration("status", "Status", ["A"]);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["kind"], "enum");
        assert_eq!(json["enum_values"][0], "A");

        let back: ParameterSpec =
            serde_json::from_str(r#"{"key":"n","label":"N","kind":"number"}"#).unwrap();
        assert_eq!(back.kind, ParameterKind::Number);
    }

    proptest! {
        #[test]
        fn number_accepts_any_finite_value(n in proptest::num::f64::NORMAL | proptest::num::f64::ZERO) {
            let p = ParameterSpec::number("amount", "Amount");
            prop_assert!(p.accepts(&n.to_string()));
        }

        #[test]
        fn enum_accepts_exactly_its_values(values in prop::collection::vec("[A-Za-z-]{1,12}", 1..6), probe in "[A-Za-z-]{1,12}") {
            let p = ParameterSpec::enumeration("status", "Status", values.clone());
            prop_assert_eq!(p.accepts(&probe), values.contains(&probe));
        }
    }
}
