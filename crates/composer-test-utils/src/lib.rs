//! Testing utilities for the Contract Composer workspace
//!
//! Shared fixtures and in-process collaborator fakes.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use composer_core::error::{CollaboratorError, ExportError};
use composer_core::export::{DownloadTarget, FileExport};
use composer_core::services::{ContractStore, GenerationService};
use composer_core::{
    ContractId, ContractSummary, DraftSession, GenerationRequest, GenerationResponse, Parties,
    SaveAck, SaveRequest, SessionContext,
};
use composer_schema::{ClauseOption, ContractTypeDefinition, ParameterSpec, TypeCatalog};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

pub const EMPLOYMENT: &str = "California Employment Agreement";
pub const NDA: &str = "Mutual NDA";
pub const TEST_TOKEN: &str = "test-token";

pub fn nda_definition() -> ContractTypeDefinition {
    ContractTypeDefinition::new(NDA, "Delaware")
        .with_parameter(ParameterSpec::number("term_years", "Term (years)"))
        .with_clause(
            ClauseOption::new("residuals", "Residuals Clause")
                .with_variation("excluded", "Excluded")
                .with_variation("included", "Included"),
        )
}

/// Built-in catalog plus the NDA fixture
pub fn test_catalog() -> Arc<TypeCatalog> {
    let mut catalog = TypeCatalog::builtin();
    catalog
        .register(nda_definition())
        .unwrap_or_else(|e| panic!("fixture catalog: {e}"));
    Arc::new(catalog)
}

pub fn test_parties() -> Parties {
    Parties::new("Acme Inc.", "John Doe")
}

pub fn employment_parameters() -> IndexMap<String, String> {
    [
        ("annual_salary", "120000"),
        ("overtime_status", "Exempt"),
        ("arbitration_county", "San Francisco"),
        ("governing_law_county", "San Francisco"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Response a well-behaved service would send for `request`
pub fn response_for(request: &GenerationRequest) -> GenerationResponse {
    let param = |key: &str| request.parameters.get(key).cloned().unwrap_or_default();
    GenerationResponse {
        contract: format!(
            "# {}\n\nThis agreement is made between {} and {}.\n",
            request.contract_type,
            param("clientName"),
            param("otherPartyName")
        ),
        contract_type: request.contract_type.clone(),
        client_name: param("clientName"),
        other_party_name: param("otherPartyName"),
        jurisdiction: request.jurisdiction.clone(),
    }
}

pub fn summary(id: i64, title: &str) -> ContractSummary {
    ContractSummary {
        id: ContractId::Number(id),
        title: title.to_string(),
        contract_type: EMPLOYMENT.to_string(),
        created_at: Utc
            .with_ymd_and_hms(2024, 3, 1, 10, 0, 0)
            .single()
            .unwrap_or_else(|| panic!("fixture timestamp")),
    }
}

/// Generation service fake
///
/// Answers from a script first, then echoes the request. With a gate, every
/// call waits for `Notify::notify_one` before answering.
#[derive(Default)]
pub struct FakeGenerator {
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
    script: Mutex<VecDeque<Result<GenerationResponse, CollaboratorError>>>,
    gate: Option<Arc<Notify>>,
}

impl FakeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn then(self, result: Result<GenerationResponse, CollaboratorError>) -> Self {
        self.script.lock().push_back(result);
        self
    }

    pub fn then_fail(self, error: CollaboratorError) -> Self {
        self.then(Err(error))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl GenerationService for FakeGenerator {
    async fn generate(
        &self,
        session: &SessionContext,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        session.bearer()?;

        let scripted = self.script.lock().pop_front();
        scripted.unwrap_or_else(|| Ok(response_for(request)))
    }
}

/// Contract store fake
#[derive(Default)]
pub struct FakeStore {
    saved: Mutex<Vec<SaveRequest>>,
    script: Mutex<VecDeque<Result<SaveAck, CollaboratorError>>>,
    listing: Mutex<Option<Result<Vec<ContractSummary>, CollaboratorError>>>,
    gate: Option<Arc<Notify>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn then(self, result: Result<SaveAck, CollaboratorError>) -> Self {
        self.script.lock().push_back(result);
        self
    }

    pub fn with_listing(self, listing: Result<Vec<ContractSummary>, CollaboratorError>) -> Self {
        *self.listing.lock() = Some(listing);
        self
    }

    pub fn saved(&self) -> Vec<SaveRequest> {
        self.saved.lock().clone()
    }
}

#[async_trait]
impl ContractStore for FakeStore {
    async fn save(
        &self,
        session: &SessionContext,
        request: &SaveRequest,
    ) -> Result<SaveAck, CollaboratorError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        session.bearer()?;

        let scripted = self.script.lock().pop_front();
        let result = scripted.unwrap_or_else(|| {
            Ok(SaveAck {
                message: Some("Contract saved".to_string()),
                id: Some(ContractId::Number(1)),
            })
        });
        if result.is_ok() {
            self.saved.lock().push(request.clone());
        }
        result
    }

    async fn list(&self, session: &SessionContext) -> Result<Vec<ContractSummary>, CollaboratorError> {
        session.bearer()?;
        if let Some(listing) = self.listing.lock().clone() {
            return listing;
        }
        Ok(self
            .saved
            .lock()
            .iter()
            .zip(1..)
            .map(|(request, id)| summary(id, &request.title))
            .collect())
    }
}

/// Download target that keeps exports in memory
#[derive(Default)]
pub struct MemoryTarget {
    delivered: Mutex<Vec<FileExport>>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<FileExport> {
        self.delivered.lock().clone()
    }
}

impl DownloadTarget for MemoryTarget {
    fn deliver(&self, export: &FileExport) -> Result<PathBuf, ExportError> {
        self.delivered.lock().push(export.clone());
        Ok(PathBuf::from(&export.filename))
    }
}

/// Session over the given fakes with a token
pub fn session_with(generator: Arc<FakeGenerator>, store: Arc<FakeStore>) -> DraftSession {
    DraftSession::new(
        test_catalog(),
        SessionContext::with_token(TEST_TOKEN),
        generator,
        store,
    )
}

/// Fill in a complete employment configuration
pub fn configure_employment(session: &DraftSession) {
    session
        .select_type(EMPLOYMENT)
        .unwrap_or_else(|e| panic!("select type: {e}"));
    session
        .set_parties(test_parties())
        .unwrap_or_else(|e| panic!("set parties: {e}"));
    for (key, value) in employment_parameters() {
        session
            .edit_parameter(&key, value)
            .unwrap_or_else(|e| panic!("edit {key}: {e}"));
    }
}
