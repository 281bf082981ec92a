//! Async driver for one draft
//!
//! [`DraftSession`] owns a [`DraftState`] behind a lock and performs the
//! remote calls the state machine asks for. The lock is never held across an
//! await: each remote call is bracketed by a `begin_*` and a `complete_*`
//! step, so concurrent callers see `InFlight` instead of a second request.

use crate::config::ComposerConfig;
use crate::credentials::SessionContext;
use crate::error::{ErrorKind, LifecycleError, ValidationError};
use crate::export::{DownloadTarget, ExportAdapter, FileExport};
use crate::lifecycle::{BeginSave, BeginSubmit, Completion, DocumentView, DraftState, LifecyclePhase};
use crate::services::{ContractStore, GenerationService};
use crate::types::{ContractSummary, DraftDocument, Parties};
use composer_render::{DisplayMode, DocumentRenderer};
use composer_schema::TypeCatalog;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Result of [`DraftSession::submit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Document generated
    Generated(DraftDocument),
    /// Configuration invalid; nothing sent
    Rejected(ValidationError),
    /// Service call failed
    Failed(ErrorKind),
    /// Another submission was already in flight
    InFlight,
    /// Draft moved on before the response arrived
    Discarded,
}

/// Result of [`DraftSession::save`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Stored; the saved notice is showing
    Saved,
    /// Title blank; nothing sent
    Rejected(ValidationError),
    /// Store call failed
    Failed(ErrorKind),
    /// Another save was already in flight
    InFlight,
    /// Draft moved on before the response arrived
    Discarded,
}

/// One composition draft with its collaborators
pub struct DraftSession {
    state: Mutex<DraftState>,
    catalog: Arc<TypeCatalog>,
    generator: Arc<dyn GenerationService>,
    adapter: ExportAdapter,
    renderer: DocumentRenderer,
}

impl std::fmt::Debug for DraftSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftSession")
            .field("phase", &self.state.lock().phase().name())
            .field("catalog_types", &self.catalog.len())
            .finish_non_exhaustive()
    }
}

impl DraftSession {
    /// Create a session with an empty draft
    pub fn new(
        catalog: Arc<TypeCatalog>,
        session: SessionContext,
        generator: Arc<dyn GenerationService>,
        store: Arc<dyn ContractStore>,
    ) -> Self {
        Self {
            state: Mutex::new(DraftState::new()),
            catalog,
            generator,
            adapter: ExportAdapter::new(session, store),
            renderer: DocumentRenderer::new(),
        }
    }

    /// Apply notice duration and render options from configuration
    #[must_use]
    pub fn with_config(self, config: &ComposerConfig) -> Self {
        *self.state.lock() = DraftState::with_saved_notice(config.saved_notice());
        Self {
            renderer: DocumentRenderer::new().with_options(config.render),
            ..self
        }
    }

    /// Catalog in use
    #[must_use]
    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    /// Copy of the current draft state
    #[must_use]
    pub fn snapshot(&self) -> DraftState {
        self.state.lock().clone()
    }

    /// Read the draft state without copying it
    pub fn with_state<R>(&self, f: impl FnOnce(&DraftState) -> R) -> R {
        f(&self.state.lock())
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> LifecyclePhase {
        self.state.lock().phase().clone()
    }

    /// See [`DraftState::select_type`]
    ///
    /// # Errors
    /// As the state operation
    pub fn select_type(&self, type_id: &str) -> Result<(), LifecycleError> {
        self.state.lock().select_type(&self.catalog, type_id)
    }

    /// See [`DraftState::set_parties`]
    ///
    /// # Errors
    /// As the state operation
    pub fn set_parties(&self, parties: Parties) -> Result<(), LifecycleError> {
        self.state.lock().set_parties(parties)
    }

    /// See [`DraftState::edit_parameter`]
    ///
    /// # Errors
    /// As the state operation
    pub fn edit_parameter(&self, key: &str, value: impl Into<String>) -> Result<(), LifecycleError> {
        self.state.lock().edit_parameter(key, value)
    }

    /// See [`DraftState::edit_option`]
    ///
    /// # Errors
    /// As the state operation
    pub fn edit_option(&self, key: &str, value: impl Into<String>) -> Result<(), LifecycleError> {
        self.state.lock().edit_option(key, value)
    }

    /// See [`DraftState::toggle_edit`]
    ///
    /// # Errors
    /// As the state operation
    pub fn toggle_edit(&self) -> Result<DocumentView, LifecycleError> {
        self.state.lock().toggle_edit()
    }

    /// See [`DraftState::edit_content`]
    ///
    /// # Errors
    /// As the state operation
    pub fn edit_content(&self, content: impl Into<String>) -> Result<(), LifecycleError> {
        self.state.lock().edit_content(content)
    }

    /// See [`DraftState::set_title`]
    ///
    /// # Errors
    /// As the state operation
    pub fn set_title(&self, title: impl Into<String>) -> Result<(), LifecycleError> {
        self.state.lock().set_title(title)
    }

    /// Clear the last error
    pub fn dismiss_error(&self) {
        self.state.lock().dismiss_error();
    }

    /// Expire the saved notice if due
    pub fn expire_saved_notice(&self, now: Instant) -> bool {
        self.state.lock().expire_saved_notice(now)
    }

    /// Start over
    pub fn compose_another(&self) {
        self.state.lock().compose_another();
    }

    /// Validate, generate and apply the result
    ///
    /// # Errors
    /// `IllegalAction` once a document exists
    #[instrument(skip(self))]
    pub async fn submit(&self) -> Result<SubmitOutcome, LifecycleError> {
        let begun = self.state.lock().begin_submission()?;
        let submission = match begun {
            BeginSubmit::Started(submission) => submission,
            BeginSubmit::InFlight => return Ok(SubmitOutcome::InFlight),
            BeginSubmit::Rejected(err) => return Ok(SubmitOutcome::Rejected(err)),
        };

        let result = self
            .generator
            .generate(self.adapter.session(), &submission.request)
            .await;
        let failure = result.as_ref().err().cloned().map(ErrorKind::from);

        let mut state = self.state.lock();
        if state.complete_submission(&submission, result) == Completion::Discarded {
            return Ok(SubmitOutcome::Discarded);
        }
        Ok(match failure {
            Some(error) => SubmitOutcome::Failed(error),
            None => state
                .document()
                .cloned()
                .map_or(SubmitOutcome::Discarded, SubmitOutcome::Generated),
        })
    }

    /// Validate the title, save and apply the result
    ///
    /// # Errors
    /// `IllegalAction` unless a document view is shown
    #[instrument(skip(self))]
    pub async fn save(&self) -> Result<SaveOutcome, LifecycleError> {
        let begun = self.state.lock().begin_save()?;
        let pending = match begun {
            BeginSave::Started(pending) => pending,
            BeginSave::InFlight => return Ok(SaveOutcome::InFlight),
            BeginSave::Rejected(err) => return Ok(SaveOutcome::Rejected(err)),
        };

        let result = self.adapter.send(&pending.request).await;
        let failure = result.as_ref().err().cloned().map(ErrorKind::from);

        let completion = self
            .state
            .lock()
            .complete_save(&pending, result, Instant::now());
        Ok(match (completion, failure) {
            (Completion::Discarded, _) => SaveOutcome::Discarded,
            (Completion::Applied, Some(error)) => SaveOutcome::Failed(error),
            (Completion::Applied, None) => SaveOutcome::Saved,
        })
    }

    /// Package the current document as a file
    ///
    /// # Errors
    /// `NoDocument` before generation
    pub fn export(&self) -> Result<FileExport, LifecycleError> {
        self.state.lock().export()
    }

    /// Deliver the current document to `target`
    ///
    /// # Errors
    /// `NoDocument` before generation, `Export` on delivery failure
    pub fn download(&self, target: &dyn DownloadTarget) -> Result<PathBuf, LifecycleError> {
        let export = self.export()?;
        Ok(target.deliver(&export)?)
    }

    /// Current document shown in `mode`
    ///
    /// # Errors
    /// `NoDocument` before generation
    pub fn render(&self, mode: DisplayMode) -> Result<String, LifecycleError> {
        let state = self.state.lock();
        let document = state.document().ok_or(LifecycleError::NoDocument)?;
        Ok(self.renderer.display(&document.content, mode).into_owned())
    }

    /// List saved contracts
    ///
    /// # Errors
    /// Store error
    pub async fn saved_contracts(&self) -> Result<Vec<ContractSummary>, ErrorKind> {
        self.adapter.list().await
    }
}
