//! Schema-driven form fields
//!
//! Front ends build their input widgets by iterating
//! [`ContractTypeDefinition::fields`] and dispatching on [`FieldWidget`].

use crate::definition::{ClauseOption, ContractTypeDefinition, ParameterKind, ParameterSpec};

/// One entry of a select widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice<'a> {
    /// Submitted value
    pub value: &'a str,
    /// Displayed label
    pub label: &'a str,
}

/// Widget needed to collect a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldWidget<'a> {
    /// Single-line text input
    TextInput,
    /// Numeric input
    NumberInput,
    /// Pick one of a closed list
    Select {
        /// Choices in display order
        choices: Vec<Choice<'a>>,
    },
}

/// Where a field's value ends up in the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    /// `parameters` map
    Parameter,
    /// `options` map
    ClauseOption,
}

/// Description of one form field derived from the schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor<'a> {
    /// Schema key
    pub key: &'a str,
    /// Human-readable label
    pub label: &'a str,
    /// Target map
    pub source: FieldSource,
    /// Whether the user must fill the field
    pub required: bool,
    /// Pre-selected value
    pub default: Option<&'a str>,
    /// Widget to render
    pub widget: FieldWidget<'a>,
}

impl FieldDescriptor<'_> {
    /// Label with the required marker
    #[must_use]
    pub fn display_label(&self) -> String {
        if self.required {
            format!("{} *", self.label)
        } else {
            self.label.to_string()
        }
    }

    /// Placeholder text for an empty widget
    #[must_use]
    pub fn placeholder(&self) -> String {
        match self.widget {
            FieldWidget::Select { .. } => format!("Select {}", self.label),
            FieldWidget::TextInput | FieldWidget::NumberInput => format!("Enter {}", self.label),
        }
    }
}

impl ParameterSpec {
    /// Field descriptor for this parameter
    #[must_use]
    pub fn field(&self) -> FieldDescriptor<'_> {
        let widget = match &self.kind {
            ParameterKind::Text => FieldWidget::TextInput,
            ParameterKind::Number => FieldWidget::NumberInput,
            ParameterKind::Enum { enum_values } => FieldWidget::Select {
                choices: enum_values
                    .iter()
                    .map(|v| Choice {
                        value: v.as_str(),
                        label: v.as_str(),
                    })
                    .collect(),
            },
        };

        FieldDescriptor {
            key: &self.key,
            label: &self.label,
            source: FieldSource::Parameter,
            required: true,
            default: None,
            widget,
        }
    }
}

impl ClauseOption {
    /// Field descriptor for this clause option
    #[must_use]
    pub fn field(&self) -> FieldDescriptor<'_> {
        FieldDescriptor {
            key: &self.key,
            label: &self.label,
            source: FieldSource::ClauseOption,
            required: false,
            default: self.default_variation().map(|v| v.value.as_str()),
            widget: FieldWidget::Select {
                choices: self
                    .variations
                    .iter()
                    .map(|v| Choice {
                        value: &v.value,
                        label: &v.label,
                    })
                    .collect(),
            },
        }
    }
}

impl ContractTypeDefinition {
    /// All fields: parameters first, then clause options
    pub fn fields(&self) -> impl Iterator<Item = FieldDescriptor<'_>> + '_ {
        self.parameters
            .iter()
            .map(ParameterSpec::field)
            .chain(self.clause_options.iter().map(ClauseOption::field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypeCatalog;

    #[test]
    fn employment_fields_in_schema_order() {
        let def = TypeCatalog::builtin()
            .lookup("California Employment Agreement")
            .unwrap();
        let fields: Vec<_> = def.fields().collect();

        assert_eq!(fields.len(), 7);
        assert_eq!(fields[0].key, "annual_salary");
        assert_eq!(fields[0].widget, FieldWidget::NumberInput);
        assert_eq!(fields[0].display_label(), "Annual Salary ($) *");
        assert_eq!(fields[0].placeholder(), "Enter Annual Salary ($)");

        assert_eq!(fields[4].source, FieldSource::ClauseOption);
        assert_eq!(fields[4].default, Some("default"));
        assert!(!fields[4].required);
    }

    #[test]
    fn enum_parameter_becomes_select() {
        let p = ParameterSpec::enumeration("status", "Overtime Status", ["Exempt", "Non-Exempt"]);
        let field = p.field();

        assert_eq!(field.placeholder(), "Select Overtime Status");
        match field.widget {
            FieldWidget::Select { choices } => {
                assert_eq!(choices.len(), 2);
                assert_eq!(choices[1].value, "Non-Exempt");
            }
            other => panic!("expected select, got {other:?}"),
        }
    }
}
