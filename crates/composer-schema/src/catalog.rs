//! Type catalog registry
//!
//! Provides [`TypeCatalog`], the read-only map from contract type id to its
//! definition. Definitions are validated once, on registration.

use crate::definition::{ClauseOption, ContractTypeDefinition, ParameterKind, ParameterSpec};
use crate::error::CatalogError;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// Parameter keys owned by the party fields of a generation request
pub const RESERVED_PARAMETER_KEYS: [&str; 2] = ["clientName", "otherPartyName"];

static BUILTIN: Lazy<Arc<TypeCatalog>> = Lazy::new(|| Arc::new(TypeCatalog::builtin()));

/// On-disk catalog document (YAML or JSON)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// Definitions in registration order
    #[serde(default)]
    pub contract_types: Vec<ContractTypeDefinition>,
}

/// Registry of contract type definitions, keyed by id
///
/// Iteration follows registration order.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: IndexMap<String, Arc<ContractTypeDefinition>>,
}

impl TypeCatalog {
    /// Create new empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: IndexMap::new(),
        }
    }

    /// Catalog with the shipped contract types
    #[must_use]
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for definition in builtin_definitions() {
            catalog
                .types
                .insert(definition.id.clone(), Arc::new(definition));
        }
        catalog
    }

    /// Process-wide shared built-in catalog
    #[must_use]
    pub fn global() -> Arc<TypeCatalog> {
        Arc::clone(&BUILTIN)
    }

    /// Build catalog from definitions, validating each
    ///
    /// # Errors
    /// First registration failure, see [`TypeCatalog::register`]
    pub fn from_definitions<I>(definitions: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = ContractTypeDefinition>,
    {
        let mut catalog = Self::new();
        for definition in definitions {
            catalog.register(definition)?;
        }
        Ok(catalog)
    }

    /// Parse a YAML catalog document
    ///
    /// # Errors
    /// Parse or validation failure
    pub fn from_yaml_str(source: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_yaml::from_str(source)?;
        Self::from_definitions(document.contract_types)
    }

    /// Parse a JSON catalog document
    ///
    /// # Errors
    /// Parse or validation failure
    pub fn from_json_str(source: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(source)?;
        Self::from_definitions(document.contract_types)
    }

    /// Load a catalog file, choosing the format from its extension
    ///
    /// # Errors
    /// - `CatalogError::Io` if the file cannot be read
    /// - `CatalogError::UnsupportedFormat` for extensions other than yaml/yml/json
    /// - parse or validation failures
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let source =
            std::fs::read_to_string(path).map_err(|e| CatalogError::io_error(path, e))?;

        let catalog = match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&source)?,
            "json" => Self::from_json_str(&source)?,
            other => return Err(CatalogError::UnsupportedFormat(other.to_string())),
        };

        tracing::info!(
            path = %path.display(),
            types = catalog.len(),
            "Loaded contract type catalog"
        );
        Ok(catalog)
    }

    /// Register a definition
    ///
    /// # Errors
    /// - `CatalogError::EmptyId` / `DuplicateType` for bad ids
    /// - `CatalogError::DuplicateKey` / `ReservedKey` for bad field keys
    /// - `CatalogError::EmptyVariations` / `EmptyEnum` for empty choice lists
    pub fn register(&mut self, definition: ContractTypeDefinition) -> Result<(), CatalogError> {
        validate_definition(&definition)?;

        if self.types.contains_key(&definition.id) {
            return Err(CatalogError::DuplicateType(definition.id));
        }

        tracing::debug!(type_id = %definition.id, "Registered contract type");
        self.types
            .insert(definition.id.clone(), Arc::new(definition));
        Ok(())
    }

    /// Look up a definition by id
    ///
    /// # Errors
    /// `CatalogError::NotFound` if no type has this id
    pub fn lookup(&self, type_id: &str) -> Result<Arc<ContractTypeDefinition>, CatalogError> {
        self.types
            .get(type_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(type_id.to_string()))
    }

    /// Check if a type id is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, type_id: &str) -> bool {
        self.types.contains_key(type_id)
    }

    /// Registered ids in registration order
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.types.keys().map(String::as_str).collect()
    }

    /// Iterate definitions in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ContractTypeDefinition>> {
        self.types.values()
    }

    /// Number of registered types
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if catalog is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn validate_definition(definition: &ContractTypeDefinition) -> Result<(), CatalogError> {
    let type_id = definition.id.as_str();
    if type_id.trim().is_empty() {
        return Err(CatalogError::EmptyId);
    }

    let duplicate = |key: &str| CatalogError::DuplicateKey {
        type_id: type_id.to_string(),
        key: key.to_string(),
    };

    let mut seen = HashSet::new();
    for parameter in &definition.parameters {
        if RESERVED_PARAMETER_KEYS.contains(&parameter.key.as_str()) {
            return Err(CatalogError::ReservedKey {
                type_id: type_id.to_string(),
                key: parameter.key.clone(),
            });
        }
        if !seen.insert(parameter.key.as_str()) {
            return Err(duplicate(&parameter.key));
        }
        if let ParameterKind::Enum { enum_values } = &parameter.kind {
            if enum_values.is_empty() {
                return Err(CatalogError::EmptyEnum {
                    type_id: type_id.to_string(),
                    key: parameter.key.clone(),
                });
            }
        }
    }

    let mut seen = HashSet::new();
    for option in &definition.clause_options {
        if !seen.insert(option.key.as_str()) {
            return Err(duplicate(&option.key));
        }
        if option.variations.is_empty() {
            return Err(CatalogError::EmptyVariations {
                type_id: type_id.to_string(),
                option: option.key.clone(),
            });
        }
    }

    Ok(())
}

fn builtin_definitions() -> Vec<ContractTypeDefinition> {
    vec![ContractTypeDefinition::new("California Employment Agreement", "California")
        .with_parameter(ParameterSpec::number("annual_salary", "Annual Salary ($)"))
        .with_parameter(ParameterSpec::enumeration(
            "overtime_status",
            "Overtime Status",
            ["Exempt", "Non-Exempt"],
        ))
        .with_parameter(ParameterSpec::text("arbitration_county", "Arbitration County"))
        .with_parameter(ParameterSpec::text(
            "governing_law_county",
            "Governing Law County",
        ))
        .with_clause(
            ClauseOption::new("at_will_employment", "At-Will Employment Clause")
                .with_variation("default", "Standard At-Will")
                .with_variation("with_cause_examples", "At-Will with \"For Cause\" Examples"),
        )
        .with_clause(
            ClauseOption::new("arbitration", "Arbitration Clause")
                .with_variation("none", "None")
                .with_variation("jams_provider", "Arbitration via JAMS")
                .with_variation("aaa_provider", "Arbitration via AAA"),
        )
        .with_clause(
            ClauseOption::new("class_action_waiver", "Class Action Waiver")
                .with_variation("none", "No Waiver")
                .with_variation("default", "Include Waiver"),
        )]
}
