//! Draft lifecycle
//!
//! [`DraftState`] is the single source of truth for one composition draft. It
//! is a synchronous state machine: remote calls are split into a `begin_*`
//! step that hands out a [`Ticket`] and a `complete_*` step that applies the
//! outcome only if the ticket is still current. Responses that arrive after
//! the draft moved on are discarded.
//!
//! ```text
//! Empty ──select──▶ Configuring ──submit──▶ Submitting ──ok──▶ Generated
//!                        ▲                      │                 │ toggle
//!                        └──────── Failed ◀─────┘                 ▼
//!                                                      Editing ◀──▶ Previewing
//!                                                          │ save
//!                                                          ▼
//!                                              Saving ──▶ Saved (timed notice)
//! ```

use crate::binder::bind;
use crate::error::{Action, CollaboratorError, ErrorKind, LifecycleError, ValidationError};
use crate::export::FileExport;
use crate::types::{
    DraftDocument, GenerationRequest, GenerationResponse, Parties, SaveAck, SaveRequest,
};
use composer_schema::{ContractTypeDefinition, TypeCatalog};
use indexmap::IndexMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default duration of the saved-confirmation notice
pub const DEFAULT_SAVED_NOTICE: Duration = Duration::from_secs(3);

/// View of a generated document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentView {
    /// Freshly generated, shown rendered
    Generated,
    /// Raw text editor
    Editing,
    /// Rendered preview after editing
    Previewing,
}

/// Interactive phase to return to once a transient phase ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resume {
    /// Back to the configuration form
    Configuring,
    /// Back to a document view
    Document(DocumentView),
}

/// Phase of the draft lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Nothing selected
    Empty,
    /// Type selected, collecting values
    Configuring,
    /// Generation request in flight
    Submitting,
    /// Document generated
    Generated,
    /// Editing raw text
    Editing,
    /// Previewing edited text
    Previewing,
    /// Save request in flight
    Saving {
        /// View restored afterwards
        resume: DocumentView,
    },
    /// Save succeeded; notice shown until `until`
    Saved {
        /// View shown underneath the notice
        resume: DocumentView,
        /// When the notice expires; `None` if the window does not fit an `Instant`
        until: Option<Instant>,
    },
    /// Last action failed
    Failed {
        /// The failure, also kept as `last_error`
        error: ErrorKind,
        /// Phase the user continues in
        resume: Resume,
    },
}

impl LifecyclePhase {
    /// Short name for logs and errors
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Configuring => "configuring",
            Self::Submitting => "submitting",
            Self::Generated => "generated",
            Self::Editing => "editing",
            Self::Previewing => "previewing",
            Self::Saving { .. } => "saving",
            Self::Saved { .. } => "saved",
            Self::Failed { .. } => "failed",
        }
    }

    /// Interactive phase the user is effectively in, if any
    ///
    /// `Failed` and `Saved` report the phase they overlay. `Empty` and the
    /// in-flight phases report `None`.
    #[must_use]
    pub fn interactive(&self) -> Option<Resume> {
        match self {
            Self::Configuring => Some(Resume::Configuring),
            Self::Generated => Some(Resume::Document(DocumentView::Generated)),
            Self::Editing => Some(Resume::Document(DocumentView::Editing)),
            Self::Previewing => Some(Resume::Document(DocumentView::Previewing)),
            Self::Saved { resume, .. } => Some(Resume::Document(*resume)),
            Self::Failed { resume, .. } => Some(*resume),
            Self::Empty | Self::Submitting | Self::Saving { .. } => None,
        }
    }

    /// Whether a remote call is in flight
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Submitting | Self::Saving { .. })
    }
}

impl From<DocumentView> for LifecyclePhase {
    fn from(view: DocumentView) -> Self {
        match view {
            DocumentView::Generated => Self::Generated,
            DocumentView::Editing => Self::Editing,
            DocumentView::Previewing => Self::Previewing,
        }
    }
}

impl From<Resume> for LifecyclePhase {
    fn from(resume: Resume) -> Self {
        match resume {
            Resume::Configuring => Self::Configuring,
            Resume::Document(view) => view.into(),
        }
    }
}

/// Identifies one remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    /// Raw ticket number
    #[inline]
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// A generation call the caller must perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Ticket to pass to [`DraftState::complete_submission`]
    pub ticket: Ticket,
    /// Validated request
    pub request: GenerationRequest,
}

/// A save call the caller must perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSave {
    /// Ticket to pass to [`DraftState::complete_save`]
    pub ticket: Ticket,
    /// Request built from the current document
    pub request: SaveRequest,
}

/// Result of starting a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeginSubmit {
    /// Call the generation service with this request
    Started(Submission),
    /// A submission is already in flight; nothing to do
    InFlight,
    /// Validation failed; recorded as `last_error`
    Rejected(ValidationError),
}

/// Result of starting a save
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeginSave {
    /// Call the store with this request
    Started(PendingSave),
    /// A save is already in flight; nothing to do
    InFlight,
    /// Validation failed; recorded as `last_error`
    Rejected(ValidationError),
}

/// Whether a completion was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Outcome applied to the draft
    Applied,
    /// Ticket was stale; draft unchanged
    Discarded,
}

/// State of one composition draft
#[derive(Debug, Clone)]
pub struct DraftState {
    selected_type: Option<Arc<ContractTypeDefinition>>,
    parties: Parties,
    parameter_values: IndexMap<String, String>,
    option_values: IndexMap<String, String>,
    phase: LifecyclePhase,
    document: Option<DraftDocument>,
    last_error: Option<ErrorKind>,
    epoch: u64,
    saved_notice: Duration,
}

impl Default for DraftState {
    fn default() -> Self {
        Self::with_saved_notice(DEFAULT_SAVED_NOTICE)
    }
}

impl DraftState {
    /// Create an empty draft
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty draft with a custom saved-notice duration
    #[must_use]
    pub fn with_saved_notice(saved_notice: Duration) -> Self {
        Self {
            selected_type: None,
            parties: Parties::default(),
            parameter_values: IndexMap::new(),
            option_values: IndexMap::new(),
            phase: LifecyclePhase::Empty,
            document: None,
            last_error: None,
            epoch: 0,
            saved_notice,
        }
    }

    /// Current phase
    #[inline]
    #[must_use]
    pub fn phase(&self) -> &LifecyclePhase {
        &self.phase
    }

    /// Selected contract type
    #[inline]
    #[must_use]
    pub fn selected_type(&self) -> Option<&ContractTypeDefinition> {
        self.selected_type.as_deref()
    }

    /// Party names
    #[inline]
    #[must_use]
    pub fn parties(&self) -> &Parties {
        &self.parties
    }

    /// Parameter values entered so far
    #[inline]
    #[must_use]
    pub fn parameter_values(&self) -> &IndexMap<String, String> {
        &self.parameter_values
    }

    /// Clause option values chosen so far
    #[inline]
    #[must_use]
    pub fn option_values(&self) -> &IndexMap<String, String> {
        &self.option_values
    }

    /// Generated document
    #[inline]
    #[must_use]
    pub fn document(&self) -> Option<&DraftDocument> {
        self.document.as_ref()
    }

    /// Most recent error, cleared on the next successful action
    #[inline]
    #[must_use]
    pub fn last_error(&self) -> Option<&ErrorKind> {
        self.last_error.as_ref()
    }

    /// Duration of the saved notice
    #[inline]
    #[must_use]
    pub fn saved_notice(&self) -> Duration {
        self.saved_notice
    }

    /// Select a contract type by id
    ///
    /// Parameter values are cleared and options reset to their first
    /// variation. Party names are kept.
    ///
    /// # Errors
    /// `Catalog` for an unknown id, `IllegalAction` outside Empty/Configuring
    pub fn select_type(&mut self, catalog: &TypeCatalog, type_id: &str) -> Result<(), LifecycleError> {
        self.ensure_configurable(Action::SelectType)?;
        let definition = catalog.lookup(type_id)?;
        self.select_definition(definition)
    }

    /// Select an already resolved contract type
    ///
    /// # Errors
    /// `IllegalAction` outside Empty/Configuring
    pub fn select_definition(&mut self, definition: Arc<ContractTypeDefinition>) -> Result<(), LifecycleError> {
        self.ensure_configurable(Action::SelectType)?;

        debug!(
            type_id = %definition.id,
            dropped_parameters = self.parameter_values.len(),
            "Contract type selected"
        );
        self.parameter_values.clear();
        self.option_values = definition.default_options();
        self.selected_type = Some(definition);
        self.phase = LifecyclePhase::Configuring;
        Ok(())
    }

    /// Replace both party names
    ///
    /// # Errors
    /// `IllegalAction` outside Empty/Configuring
    pub fn set_parties(&mut self, parties: Parties) -> Result<(), LifecycleError> {
        self.ensure_configurable(Action::EditParties)?;
        self.parties = parties;
        Ok(())
    }

    /// Set the client name
    ///
    /// # Errors
    /// `IllegalAction` outside Empty/Configuring
    pub fn set_client_name(&mut self, name: impl Into<String>) -> Result<(), LifecycleError> {
        self.ensure_configurable(Action::EditParties)?;
        self.parties.client_name = name.into();
        Ok(())
    }

    /// Set the other party's name
    ///
    /// # Errors
    /// `IllegalAction` outside Empty/Configuring
    pub fn set_other_party_name(&mut self, name: impl Into<String>) -> Result<(), LifecycleError> {
        self.ensure_configurable(Action::EditParties)?;
        self.parties.other_party_name = name.into();
        Ok(())
    }

    /// Set a schema parameter value
    ///
    /// # Errors
    /// `IllegalAction` unless configuring, `UnknownParameter` for keys the
    /// selected type does not define
    pub fn edit_parameter(&mut self, key: &str, value: impl Into<String>) -> Result<(), LifecycleError> {
        let definition = self.configuring(Action::EditParameter)?;
        if definition.parameter(key).is_none() {
            return Err(LifecycleError::UnknownParameter(key.to_string()));
        }
        self.parameter_values.insert(key.to_string(), value.into());
        Ok(())
    }

    /// Set a clause option value
    ///
    /// # Errors
    /// `IllegalAction` unless configuring, `UnknownOption` for keys the
    /// selected type does not define
    pub fn edit_option(&mut self, key: &str, value: impl Into<String>) -> Result<(), LifecycleError> {
        let definition = self.configuring(Action::EditOption)?;
        if definition.clause_option(key).is_none() {
            return Err(LifecycleError::UnknownOption(key.to_string()));
        }
        self.option_values.insert(key.to_string(), value.into());
        Ok(())
    }

    /// Validate the configuration and start a submission
    ///
    /// # Errors
    /// `IllegalAction` once a document exists
    pub fn begin_submission(&mut self) -> Result<BeginSubmit, LifecycleError> {
        match self.phase {
            LifecyclePhase::Submitting => {
                debug!("Submission already in flight");
                return Ok(BeginSubmit::InFlight);
            }
            LifecyclePhase::Empty => {}
            _ if self.phase.interactive() == Some(Resume::Configuring) => {}
            _ => return Err(self.illegal(Action::Submit)),
        }

        let bound = bind(
            self.selected_type.as_deref(),
            &self.parties,
            &self.parameter_values,
            &self.option_values,
        );

        match bound {
            Ok(request) => {
                self.last_error = None;
                self.phase = LifecyclePhase::Submitting;
                let ticket = self.next_ticket();
                info!(ticket = ticket.get(), contract_type = %request.contract_type, "Submission started");
                Ok(BeginSubmit::Started(Submission { ticket, request }))
            }
            Err(err) => {
                debug!(error = %err, "Submission rejected");
                self.last_error = Some(ErrorKind::Validation(err.clone()));
                if self.phase != LifecyclePhase::Empty {
                    self.phase = LifecyclePhase::Configuring;
                }
                Ok(BeginSubmit::Rejected(err))
            }
        }
    }

    /// Apply the outcome of a generation call
    pub fn complete_submission(
        &mut self,
        submission: &Submission,
        result: Result<GenerationResponse, CollaboratorError>,
    ) -> Completion {
        if self.phase != LifecyclePhase::Submitting || !self.is_current(submission.ticket) {
            warn!(ticket = submission.ticket.get(), phase = self.phase.name(), "Discarding stale generation response");
            return Completion::Discarded;
        }

        match result {
            Ok(response) => {
                let document = DraftDocument::from_response(&response, &submission.request);
                info!(title = %document.title, bytes = document.content.len(), "Document generated");
                self.document = Some(document);
                self.last_error = None;
                self.phase = LifecyclePhase::Generated;
            }
            Err(err) => {
                let error = ErrorKind::from(err);
                warn!(error = %error, "Generation failed");
                self.fail(error, Resume::Configuring);
            }
        }
        Completion::Applied
    }

    /// Switch between editing and previewing
    ///
    /// Returns the new view.
    ///
    /// # Errors
    /// `IllegalAction` unless a document view is shown
    pub fn toggle_edit(&mut self) -> Result<DocumentView, LifecycleError> {
        let view = self.document_view(Action::ToggleEdit)?;
        let next = match view {
            DocumentView::Generated | DocumentView::Previewing => DocumentView::Editing,
            DocumentView::Editing => DocumentView::Previewing,
        };
        self.phase = match self.phase {
            LifecyclePhase::Saved { until, .. } => LifecyclePhase::Saved { resume: next, until },
            _ => next.into(),
        };
        Ok(next)
    }

    /// Replace the document content verbatim
    ///
    /// # Errors
    /// `IllegalAction` unless editing
    pub fn edit_content(&mut self, content: impl Into<String>) -> Result<(), LifecycleError> {
        let view = self.document_view(Action::EditContent)?;
        if view != DocumentView::Editing {
            return Err(self.illegal(Action::EditContent));
        }
        let document = self.document.as_mut().ok_or(LifecycleError::NoDocument)?;
        document.content = content.into();
        self.settle();
        Ok(())
    }

    /// Replace the document title
    ///
    /// # Errors
    /// `IllegalAction` unless a document view is shown
    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), LifecycleError> {
        self.document_view(Action::EditTitle)?;
        let document = self.document.as_mut().ok_or(LifecycleError::NoDocument)?;
        document.title = title.into();
        self.settle();
        Ok(())
    }

    /// Validate the title and start a save
    ///
    /// # Errors
    /// `IllegalAction` unless a document view is shown
    pub fn begin_save(&mut self) -> Result<BeginSave, LifecycleError> {
        if matches!(self.phase, LifecyclePhase::Saving { .. }) {
            debug!("Save already in flight");
            return Ok(BeginSave::InFlight);
        }

        let view = self.document_view(Action::Save)?;
        let document = self.document.as_ref().ok_or(LifecycleError::NoDocument)?;

        if document.title.trim().is_empty() {
            let err = ValidationError::MissingTitle;
            self.last_error = Some(ErrorKind::Validation(err.clone()));
            self.phase = view.into();
            return Ok(BeginSave::Rejected(err));
        }

        let request = SaveRequest::from(document);
        self.last_error = None;
        self.phase = LifecyclePhase::Saving { resume: view };
        let ticket = self.next_ticket();
        info!(ticket = ticket.get(), title = %request.title, "Save started");
        Ok(BeginSave::Started(PendingSave { ticket, request }))
    }

    /// Apply the outcome of a save call
    ///
    /// `now` anchors the saved notice.
    pub fn complete_save(
        &mut self,
        pending: &PendingSave,
        result: Result<SaveAck, CollaboratorError>,
        now: Instant,
    ) -> Completion {
        let resume = match self.phase {
            LifecyclePhase::Saving { resume } if self.is_current(pending.ticket) => resume,
            _ => {
                warn!(ticket = pending.ticket.get(), phase = self.phase.name(), "Discarding stale save response");
                return Completion::Discarded;
            }
        };

        match result {
            Ok(ack) => {
                info!(id = ?ack.id, "Contract saved");
                self.last_error = None;
                self.phase = LifecyclePhase::Saved {
                    resume,
                    until: now.checked_add(self.saved_notice),
                };
            }
            Err(err) => {
                let error = ErrorKind::from(err);
                warn!(error = %error, "Save failed");
                self.fail(error, Resume::Document(resume));
            }
        }
        Completion::Applied
    }

    /// Whether the saved notice is showing at `now`
    #[must_use]
    pub fn saved_notice_visible(&self, now: Instant) -> bool {
        matches!(self.phase, LifecyclePhase::Saved { until, .. } if until.map_or(true, |until| now < until))
    }

    /// Drop the saved notice once it has expired
    ///
    /// Returns `true` if the phase changed.
    pub fn expire_saved_notice(&mut self, now: Instant) -> bool {
        match self.phase {
            LifecyclePhase::Saved { resume, until: Some(until) } if now >= until => {
                self.phase = resume.into();
                true
            }
            _ => false,
        }
    }

    /// Clear `last_error` and leave the failed phase
    pub fn dismiss_error(&mut self) {
        self.last_error = None;
        if let LifecyclePhase::Failed { resume, .. } = self.phase {
            self.phase = resume.into();
        }
    }

    /// File export of the current document
    ///
    /// # Errors
    /// `NoDocument` before generation
    pub fn export(&self) -> Result<FileExport, LifecycleError> {
        self.document
            .as_ref()
            .map(FileExport::from_document)
            .ok_or(LifecycleError::NoDocument)
    }

    /// Start over with an empty draft
    ///
    /// In-flight responses are discarded when they arrive.
    pub fn compose_another(&mut self) {
        let epoch = self.epoch;
        *self = Self::with_saved_notice(self.saved_notice);
        self.epoch = epoch;
        debug!("Draft reset");
    }

    fn next_ticket(&mut self) -> Ticket {
        self.epoch += 1;
        Ticket(self.epoch)
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.epoch
    }

    fn fail(&mut self, error: ErrorKind, resume: Resume) {
        self.last_error = Some(error.clone());
        self.phase = LifecyclePhase::Failed { error, resume };
    }

    /// Leave `Failed` for the phase it overlays
    fn settle(&mut self) {
        if let LifecyclePhase::Failed { resume, .. } = self.phase {
            self.phase = resume.into();
        }
    }

    fn illegal(&self, action: Action) -> LifecycleError {
        LifecycleError::IllegalAction {
            action,
            phase: self.phase.name(),
        }
    }

    fn ensure_configurable(&mut self, action: Action) -> Result<(), LifecycleError> {
        match self.phase {
            LifecyclePhase::Empty => Ok(()),
            _ if self.phase.interactive() == Some(Resume::Configuring) => {
                self.settle();
                Ok(())
            }
            _ => Err(self.illegal(action)),
        }
    }

    fn configuring(&mut self, action: Action) -> Result<Arc<ContractTypeDefinition>, LifecycleError> {
        if self.phase.interactive() != Some(Resume::Configuring) {
            return Err(self.illegal(action));
        }
        let definition = self
            .selected_type
            .clone()
            .ok_or_else(|| self.illegal(action))?;
        self.settle();
        Ok(definition)
    }

    fn document_view(&self, action: Action) -> Result<DocumentView, LifecycleError> {
        match self.phase.interactive() {
            Some(Resume::Document(view)) => Ok(view),
            _ => Err(self.illegal(action)),
        }
    }
}
