//! Configuration binder
//!
//! Validates the user's configuration against the selected schema and turns
//! it into a [`GenerationRequest`]. Checks run in a fixed order and the first
//! failure wins:
//!
//! 1. a type is selected
//! 2. both party names are non-empty
//! 3. every schema parameter has a non-empty value, in schema order
//! 4. every parameter value matches its kind, in schema order
//! 5. every supplied clause option names one of its variations
//!
//! Clause options the user never touched take their first variation.

use crate::error::ValidationError;
use crate::types::{GenerationRequest, Parties, CLIENT_NAME_KEY, OTHER_PARTY_NAME_KEY};
use composer_schema::ContractTypeDefinition;
use indexmap::IndexMap;
use tracing::debug;

/// Bind a configuration into a generation request
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered.
pub fn bind(
    definition: Option<&ContractTypeDefinition>,
    parties: &Parties,
    parameter_values: &IndexMap<String, String>,
    option_values: &IndexMap<String, String>,
) -> Result<GenerationRequest, ValidationError> {
    let definition = definition.ok_or(ValidationError::MissingType)?;

    if parties.client_name.is_empty() || parties.other_party_name.is_empty() {
        return Err(ValidationError::MissingParty);
    }

    for spec in &definition.parameters {
        if parameter_values.get(&spec.key).map_or(true, String::is_empty) {
            return Err(ValidationError::MissingParameter(spec.key.clone()));
        }
    }

    for spec in &definition.parameters {
        let value = parameter_values.get(&spec.key).map_or("", String::as_str);
        if !spec.accepts(value) {
            return Err(ValidationError::InvalidParameter(spec.key.clone()));
        }
    }

    let mut options = option_values.clone();
    for option in &definition.clause_options {
        match option_values.get(&option.key) {
            Some(value) if option.has_variation(value) => {}
            Some(_) => return Err(ValidationError::InvalidOption(option.key.clone())),
            None => {
                if let Some(default) = option.default_variation() {
                    debug!(option = %option.key, variation = %default.value, "Defaulting clause option");
                    options.insert(option.key.clone(), default.value.clone());
                }
            }
        }
    }

    let mut parameters = IndexMap::with_capacity(parameter_values.len() + 2);
    parameters.insert(CLIENT_NAME_KEY.to_string(), parties.client_name.clone());
    parameters.insert(OTHER_PARTY_NAME_KEY.to_string(), parties.other_party_name.clone());
    parameters.extend(
        parameter_values
            .iter()
            .map(|(key, value)| (key.clone(), value.clone())),
    );

    Ok(GenerationRequest {
        contract_type: definition.id.clone(),
        jurisdiction: definition.jurisdiction.clone(),
        parameters,
        options,
    })
}
