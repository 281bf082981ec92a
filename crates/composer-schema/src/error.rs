//! Error types for the type catalog

use std::path::PathBuf;

/// Errors raised while registering, loading or querying contract types
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// No contract type registered under this id
    #[error("contract type not found: {0}")]
    NotFound(String),

    /// A contract type with this id is already registered
    #[error("duplicate contract type: {0}")]
    DuplicateType(String),

    /// Contract type id is blank
    #[error("contract type id must not be empty")]
    EmptyId,

    /// Two parameters (or two clause options) share a key
    #[error("duplicate key '{key}' in contract type {type_id}")]
    DuplicateKey { type_id: String, key: String },

    /// Parameter key collides with a party field of the request
    #[error("parameter key '{key}' in contract type {type_id} is reserved")]
    ReservedKey { type_id: String, key: String },

    /// Clause option without any variation to default to
    #[error("clause option '{option}' in contract type {type_id} has no variations")]
    EmptyVariations { type_id: String, option: String },

    /// Enum parameter without any value to choose from
    #[error("enum parameter '{key}' in contract type {type_id} has no values")]
    EmptyEnum { type_id: String, key: String },

    /// IO error while reading a catalog file
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File extension is not a known catalog format
    #[error("unsupported catalog format: '{0}'")]
    UnsupportedFormat(String),

    /// Catalog document could not be deserialized
    #[error("catalog parse error: {0}")]
    Parse(String),
}

impl CatalogError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if the error is a plain lookup miss
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<serde_yaml::Error> for CatalogError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = CatalogError::NotFound("NDA".to_string());
        assert_eq!(err.to_string(), "contract type not found: NDA");
        assert!(err.is_not_found());
    }

    #[test]
    fn empty_variations_display() {
        let err = CatalogError::EmptyVariations {
            type_id: "NDA".to_string(),
            option: "term".to_string(),
        };
        assert!(err.to_string().contains("has no variations"));
        assert!(!err.is_not_found());
    }
}
