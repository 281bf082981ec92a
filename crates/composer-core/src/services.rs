//! Remote collaborator seams
//!
//! The workflow talks to two collaborators: the generation service that turns
//! a request into document text, and the contract store that persists and
//! lists saved documents. Both are traits so the workflow can be driven
//! against HTTP backends or in-process fakes.

use crate::credentials::SessionContext;
use crate::error::CollaboratorError;
use crate::types::{ContractSummary, GenerationRequest, GenerationResponse, SaveAck, SaveRequest};

/// Produces contract text from a validated request
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait GenerationService: Send + Sync {
    /// Generate a document
    async fn generate(
        &self,
        session: &SessionContext,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, CollaboratorError>;
}

/// Persists and lists saved contracts
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ContractStore: Send + Sync {
    /// Persist a document
    async fn save(
        &self,
        session: &SessionContext,
        request: &SaveRequest,
    ) -> Result<SaveAck, CollaboratorError>;

    /// List the user's saved contracts
    async fn list(&self, session: &SessionContext) -> Result<Vec<ContractSummary>, CollaboratorError>;
}
