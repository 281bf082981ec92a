//! Composer HTTP - remote collaborators over JSON/HTTP
//!
//! [`HttpBackend`] implements both [`GenerationService`] and [`ContractStore`]
//! against the contract API:
//!
//! | Call     | Request                       |
//! |----------|-------------------------------|
//! | generate | `POST /api/generate-contract` |
//! | save     | `POST /api/save-contract`     |
//! | list     | `GET /api/user-contracts`     |
//!
//! Every call carries `Authorization: Bearer <token>`. Failures map onto
//! [`CollaboratorError`]:
//!
//! - transport failures and undecodable bodies → `Network`
//! - `401`/`403` → `Unauthenticated`
//! - other non-success statuses → `Service` with the body's `error` field,
//!   or a per-call fallback message

#![warn(missing_docs)]
#![warn(unreachable_pub)]

use async_trait::async_trait;
use composer_core::services::{ContractStore, GenerationService};
use composer_core::{
    CollaboratorError, ComposerConfig, ContractList, ContractSummary, GenerationRequest,
    GenerationResponse, SaveAck, SaveRequest, SessionContext,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Generation endpoint
pub const GENERATE_PATH: &str = "/api/generate-contract";
/// Save endpoint
pub const SAVE_PATH: &str = "/api/save-contract";
/// List endpoint
pub const LIST_PATH: &str = "/api/user-contracts";

const GENERATE_FALLBACK: &str = "Failed to generate contract";
const SAVE_FALLBACK: &str = "Failed to save contract";
const LIST_FALLBACK: &str = "Failed to fetch contracts";

/// Backend construction failure
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP client could not be built
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// Base URL is not an absolute http(s) URL
    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default, alias = "msg")]
    error: Option<String>,
}

/// Contract API client
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a backend for `base_url`
    ///
    /// # Errors
    /// `InvalidBaseUrl` for non-http(s) URLs, `Client` if the TLS stack fails
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let base_url = base_url.into();
        let trimmed = base_url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(BackendError::InvalidBaseUrl(base_url));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("contract-composer/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: trimmed.to_string(),
        })
    }

    /// Create a backend from configuration
    ///
    /// # Errors
    /// As [`HttpBackend::new`]
    pub fn from_config(config: &ComposerConfig) -> Result<Self, BackendError> {
        Self::new(config.api_base_url.clone(), config.request_timeout())
    }

    /// Base URL without trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        session: &SessionContext,
        fallback: &str,
    ) -> Result<T, CollaboratorError> {
        let token = session.bearer()?;
        let response = builder
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| CollaboratorError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CollaboratorError::Network(e.to_string()))?;

        if status.is_success() {
            return serde_json::from_str(&body)
                .map_err(|e| CollaboratorError::Network(format!("invalid response body: {e}")));
        }

        let message = service_message(&body);
        warn!(%status, message = message.as_deref().unwrap_or(fallback), "Request rejected");
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CollaboratorError::Unauthenticated(
                message.unwrap_or_else(|| status.to_string()),
            ),
            _ => CollaboratorError::Service(message.unwrap_or_else(|| fallback.to_string())),
        })
    }
}

fn service_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
}

#[async_trait]
impl GenerationService for HttpBackend {
    async fn generate(
        &self,
        session: &SessionContext,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, CollaboratorError> {
        debug!(contract_type = %request.contract_type, "POST {GENERATE_PATH}");
        let builder = self.client.post(self.url(GENERATE_PATH)).json(request);
        self.call(builder, session, GENERATE_FALLBACK).await
    }
}

#[async_trait]
impl ContractStore for HttpBackend {
    async fn save(
        &self,
        session: &SessionContext,
        request: &SaveRequest,
    ) -> Result<SaveAck, CollaboratorError> {
        debug!(title = %request.title, "POST {SAVE_PATH}");
        let builder = self.client.post(self.url(SAVE_PATH)).json(request);
        self.call(builder, session, SAVE_FALLBACK).await
    }

    async fn list(&self, session: &SessionContext) -> Result<Vec<ContractSummary>, CollaboratorError> {
        debug!("GET {LIST_PATH}");
        let builder = self.client.get(self.url(LIST_PATH));
        let list: ContractList = self.call(builder, session, LIST_FALLBACK).await?;
        Ok(list.contracts)
    }
}
