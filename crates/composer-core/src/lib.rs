//! Composer Core - the contract composition workflow
//!
//! A draft moves through a small lifecycle: pick a contract type, fill in the
//! parties and the type's parameters, submit for generation, review and edit
//! the generated document, then save or download it.
//!
//! - [`binder`]: validates a configuration into a [`GenerationRequest`]
//! - [`lifecycle`]: the synchronous [`DraftState`] machine
//! - [`session`]: [`DraftSession`], which performs the remote calls
//! - [`export`]: file export and the store adapter
//! - [`services`]: collaborator traits implemented by backends
//!
//! # Example
//!
//! ```rust,no_run
//! use composer_core::{DraftSession, Parties, SessionContext, SubmitOutcome};
//! use composer_core::services::{ContractStore, GenerationService};
//! use composer_schema::TypeCatalog;
//! use std::sync::Arc;
//!
//! # async fn run(backend: Arc<impl GenerationService + ContractStore + 'static>) {
//! let session = DraftSession::new(
//!     TypeCatalog::global(),
//!     SessionContext::with_token("token"),
//!     backend.clone(),
//!     backend,
//! );
//! session.select_type("California Employment Agreement").unwrap();
//! session.set_parties(Parties::new("Acme Inc.", "John Doe")).unwrap();
//! session.edit_parameter("annual_salary", "120000").unwrap();
//!
//! if let SubmitOutcome::Generated(document) = session.submit().await.unwrap() {
//!     println!("{}", document.title);
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod binder;
pub mod config;
pub mod credentials;
pub mod error;
pub mod export;
pub mod lifecycle;
pub mod services;
pub mod session;
pub mod types;

pub use binder::bind;
pub use composer_render::DisplayMode;
pub use config::{ComposerConfig, ConfigError};
pub use credentials::{FileStore, KeyValueStore, MemoryStore, SessionContext, StoreError, TOKEN_KEY};
pub use error::{Action, CollaboratorError, ErrorKind, ExportError, LifecycleError, ValidationError};
pub use export::{sanitize_filename, DirectoryTarget, DownloadTarget, ExportAdapter, FileExport};
pub use lifecycle::{
    BeginSave, BeginSubmit, Completion, DocumentView, DraftState, LifecyclePhase, PendingSave,
    Resume, Submission, Ticket,
};
pub use session::{DraftSession, SaveOutcome, SubmitOutcome};
pub use types::{
    ContractId, ContractList, ContractSummary, DraftDocument, GenerationRequest,
    GenerationResponse, Parties, SaveAck, SaveRequest,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
