//! Error types for the composition workflow

use composer_schema::{CatalogError, ContractTypeDefinition};
use std::path::PathBuf;
use thiserror::Error;

/// Why a configuration could not be bound into a request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No contract type selected
    #[error("no contract type selected")]
    MissingType,

    /// A party name is empty
    #[error("client and other party names are required")]
    MissingParty,

    /// A required parameter is absent or empty
    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    /// A parameter value does not match its kind
    #[error("invalid value for parameter: {0}")]
    InvalidParameter(String),

    /// A clause option holds a value outside its variations
    #[error("invalid variation for clause option: {0}")]
    InvalidOption(String),

    /// Save attempted with a blank title
    #[error("document title is required")]
    MissingTitle,
}

impl ValidationError {
    /// Schema key of the offending field, if any
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingParameter(key) | Self::InvalidParameter(key) | Self::InvalidOption(key) => {
                Some(key)
            }
            Self::MissingType | Self::MissingParty | Self::MissingTitle => None,
        }
    }

    /// Message for end users, naming fields by their label
    #[must_use]
    pub fn user_message(&self, definition: Option<&ContractTypeDefinition>) -> String {
        let label = |key: &str| {
            definition
                .map_or(key, |def| def.label_for(key))
                .to_string()
        };

        match self {
            Self::MissingType => "Please select a contract type.".to_string(),
            Self::MissingParty => "Please fill in all general information fields.".to_string(),
            Self::MissingParameter(key) => format!("Please fill in {}.", label(key)),
            Self::InvalidParameter(key) => format!("Please enter a valid {}.", label(key)),
            Self::InvalidOption(key) => format!("Please choose a listed option for {}.", label(key)),
            Self::MissingTitle => "Please enter a title for the contract.".to_string(),
        }
    }
}

/// Failure reported by a remote collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    /// Transport failure or undecodable response
    #[error("network error: {0}")]
    Network(String),

    /// Non-success response, carrying the service message
    #[error("{0}")]
    Service(String),

    /// Missing or rejected session token
    #[error("not authenticated: {0}")]
    Unauthenticated(String),
}

/// Error recorded as the draft's `last_error`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// Local validation failure
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Transport failure
    #[error("network error: {0}")]
    Network(String),

    /// Service rejection; message shown verbatim
    #[error("{0}")]
    Service(String),

    /// Session token missing or rejected
    #[error("not authenticated: {0}")]
    Unauthenticated(String),
}

impl ErrorKind {
    /// Whether repeating the same action may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Whether this is a local validation failure
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Message for end users
    #[must_use]
    pub fn user_message(&self, definition: Option<&ContractTypeDefinition>) -> String {
        match self {
            Self::Validation(err) => err.user_message(definition),
            Self::Network(_) => "Network error. Please try again.".to_string(),
            Self::Service(message) => message.clone(),
            Self::Unauthenticated(_) => "Please log in to continue.".to_string(),
        }
    }
}

// Variant-for-variant: `ErrorKind` has no variant wrapping a `CollaboratorError`
impl From<CollaboratorError> for ErrorKind {
    fn from(err: CollaboratorError) -> Self {
        match err {
            CollaboratorError::Network(msg) => Self::Network(msg),
            CollaboratorError::Service(msg) => Self::Service(msg),
            CollaboratorError::Unauthenticated(msg) => Self::Unauthenticated(msg),
        }
    }
}

/// User action, as named in lifecycle errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Pick a contract type
    SelectType,
    /// Edit the party names
    EditParties,
    /// Edit a schema parameter
    EditParameter,
    /// Edit a clause option
    EditOption,
    /// Submit for generation
    Submit,
    /// Switch between editing and previewing
    ToggleEdit,
    /// Edit document content
    EditContent,
    /// Edit document title
    EditTitle,
    /// Persist the document
    Save,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::SelectType => "select type",
            Self::EditParties => "edit parties",
            Self::EditParameter => "edit parameter",
            Self::EditOption => "edit option",
            Self::Submit => "submit",
            Self::ToggleEdit => "toggle edit",
            Self::EditContent => "edit content",
            Self::EditTitle => "edit title",
            Self::Save => "save",
        };
        f.write_str(name)
    }
}

/// Export or download failure
#[derive(Debug, Error)]
pub enum ExportError {
    /// Filesystem failure while writing the export
    #[error("failed to write {path}: {source}")]
    Io {
        /// Target path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    /// Create IO error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Action rejected by the draft lifecycle
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Action not permitted in the current phase
    #[error("cannot {action} while {phase}")]
    IllegalAction {
        /// Attempted action
        action: Action,
        /// Phase name at the time
        phase: &'static str,
    },

    /// Type id not in the catalog
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Parameter key not defined by the selected type
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    /// Clause option key not defined by the selected type
    #[error("unknown clause option: {0}")]
    UnknownOption(String),

    /// No document has been generated yet
    #[error("no document available")]
    NoDocument,

    /// Export delivery failed
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl LifecycleError {
    /// Whether the action was rejected because of the phase
    #[must_use]
    pub fn is_illegal_action(&self) -> bool {
        matches!(self, Self::IllegalAction { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use composer_schema::TypeCatalog;

    #[test]
    fn user_message_uses_labels() {
        let catalog = TypeCatalog::builtin();
        let def = catalog.lookup("California Employment Agreement").unwrap();
        let err = ValidationError::MissingParameter("annual_salary".to_string());

        assert_eq!(err.user_message(Some(&def)), "Please fill in Annual Salary ($).");
        assert_eq!(err.user_message(None), "Please fill in annual_salary.");
        assert_eq!(err.field(), Some("annual_salary"));
        assert_eq!(ValidationError::MissingTitle.field(), None);
    }

    #[test]
    fn service_message_is_verbatim() {
        let kind = ErrorKind::from(CollaboratorError::Service("Invalid contract type".to_string()));
        assert_eq!(kind.to_string(), "Invalid contract type");
        assert_eq!(kind.user_message(None), "Invalid contract type");
        assert!(!kind.is_retryable());
    }

    #[test]
    fn network_is_retryable() {
        let kind = ErrorKind::from(CollaboratorError::Network("connection refused".to_string()));
        assert!(kind.is_retryable());
        assert!(!kind.is_validation());
        assert_eq!(kind.user_message(None), "Network error. Please try again.");
    }

    #[test]
    fn collaborator_errors_map_to_matching_kind() {
        for (err, kind) in [
            (CollaboratorError::Network("reset".into()), ErrorKind::Network("reset".into())),
            (CollaboratorError::Service("busy".into()), ErrorKind::Service("busy".into())),
            (
                CollaboratorError::Unauthenticated("expired".into()),
                ErrorKind::Unauthenticated("expired".into()),
            ),
        ] {
            assert_eq!(ErrorKind::from(err), kind);
        }
    }

    #[test]
    fn illegal_action_display() {
        let err = LifecycleError::IllegalAction {
            action: Action::Save,
            phase: "submitting",
        };
        assert_eq!(err.to_string(), "cannot save while submitting");
        assert!(err.is_illegal_action());
    }
}
