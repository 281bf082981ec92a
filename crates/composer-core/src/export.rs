//! Export and persistence
//!
//! A document leaves the workflow in two ways: as a downloadable file built
//! locally, or as a save request sent to the contract store.

use crate::credentials::SessionContext;
use crate::error::{CollaboratorError, ErrorKind, ExportError, ValidationError};
use crate::services::ContractStore;
use crate::types::{ContractSummary, DraftDocument, SaveAck, SaveRequest};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// MIME type of exported documents
pub const MARKDOWN_MIME: &str = "text/markdown;charset=utf-8";

/// Extension of exported documents
pub const EXPORT_EXTENSION: &str = "md";

/// Stem for an empty title; downloads need no title and a bare `.md` is a
/// hidden dotfile
const FALLBACK_STEM: &str = "contract";

/// Replace every character outside `[a-z0-9]` with `_` after lowercasing
///
/// Works per character: each non-ASCII character becomes a single `_`.
#[must_use]
pub fn sanitize_filename(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// A document packaged as a downloadable file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileExport {
    /// Sanitized filename with extension
    pub filename: String,
    /// MIME type
    pub mime_type: &'static str,
    /// UTF-8 content
    pub bytes: Vec<u8>,
}

impl FileExport {
    /// Package a document
    #[must_use]
    pub fn from_document(document: &DraftDocument) -> Self {
        let stem = sanitize_filename(&document.title);
        // `<sanitized-title>.md` except for an empty title
        let stem = if stem.is_empty() { FALLBACK_STEM.to_string() } else { stem };
        Self {
            filename: format!("{stem}.{EXPORT_EXTENSION}"),
            mime_type: MARKDOWN_MIME,
            bytes: document.content.as_bytes().to_vec(),
        }
    }
}

/// Where downloads are delivered
pub trait DownloadTarget {
    /// Deliver the export and return where it landed
    ///
    /// # Errors
    /// Delivery failure; nothing is left behind
    fn deliver(&self, export: &FileExport) -> Result<PathBuf, ExportError>;
}

/// Writes downloads into a directory
///
/// Content goes to a scoped temporary file that is renamed into place only
/// once fully written; on any failure the temporary file is removed.
#[derive(Debug, Clone)]
pub struct DirectoryTarget {
    dir: PathBuf,
}

impl DirectoryTarget {
    /// Target directory, created on first delivery
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory path
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadTarget for DirectoryTarget {
    fn deliver(&self, export: &FileExport) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| ExportError::io(&self.dir, e))?;

        let mut handle = tempfile::Builder::new()
            .prefix(".composer-")
            .suffix(".part")
            .tempfile_in(&self.dir)
            .map_err(|e| ExportError::io(&self.dir, e))?;
        handle
            .write_all(&export.bytes)
            .and_then(|()| handle.as_file().sync_all())
            .map_err(|e| ExportError::io(handle.path(), e))?;

        let destination = self.dir.join(&export.filename);
        handle
            .persist(&destination)
            .map_err(|e| ExportError::io(&destination, e.error))?;

        info!(path = %destination.display(), bytes = export.bytes.len(), "Document exported");
        Ok(destination)
    }
}

/// Sends documents to the contract store
#[derive(Clone)]
pub struct ExportAdapter {
    session: SessionContext,
    store: Arc<dyn ContractStore>,
}

impl std::fmt::Debug for ExportAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportAdapter")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl ExportAdapter {
    /// Create adapter
    pub fn new(session: SessionContext, store: Arc<dyn ContractStore>) -> Self {
        Self { session, store }
    }

    /// Session used for store calls
    #[must_use]
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Package a document as a file
    #[must_use]
    pub fn to_file(document: &DraftDocument) -> FileExport {
        FileExport::from_document(document)
    }

    /// Validate and save a document
    ///
    /// # Errors
    /// `Validation(MissingTitle)` for a blank title, otherwise the store error
    pub async fn save(&self, document: &DraftDocument) -> Result<SaveAck, ErrorKind> {
        if document.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle.into());
        }
        self.send(&SaveRequest::from(document)).await.map_err(ErrorKind::from)
    }

    pub(crate) async fn send(&self, request: &SaveRequest) -> Result<SaveAck, CollaboratorError> {
        debug!(title = %request.title, "Sending save request");
        self.store.save(&self.session, request).await
    }

    /// List saved contracts
    ///
    /// # Errors
    /// Store error
    pub async fn list(&self) -> Result<Vec<ContractSummary>, ErrorKind> {
        let contracts = self.store.list(&self.session).await?;
        debug!(count = contracts.len(), "Listed saved contracts");
        Ok(contracts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MockContractStore;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn document(title: &str) -> DraftDocument {
        DraftDocument {
            title: title.to_string(),
            content: "# NDA\n\nTerms.".to_string(),
            contract_type: "Mutual NDA".to_string(),
            jurisdiction: "Delaware".to_string(),
        }
    }

    #[test]
    fn sanitize_replaces_non_alphanumerics() {
        assert_eq!(sanitize_filename("NDA: Acme & Doe!"), "nda__acme___doe_");
        assert_eq!(sanitize_filename("Contract 2024"), "contract_2024");
        assert_eq!(sanitize_filename("Café"), "caf_");
        assert_eq!(sanitize_filename(""), "");
    }

    #[test]
    fn export_packages_content() {
        let export = FileExport::from_document(&document("NDA: Acme & Doe!"));
        assert_eq!(export.filename, "nda__acme___doe_.md");
        assert_eq!(export.mime_type, "text/markdown;charset=utf-8");
        assert_eq!(export.bytes, b"# NDA\n\nTerms.");
    }

    #[test]
    fn blank_title_exports_with_fallback_name() {
        assert_eq!(FileExport::from_document(&document("")).filename, "contract.md");
        assert_eq!(FileExport::from_document(&document("  ")).filename, "__.md");
    }

    #[test]
    fn directory_target_writes_file_and_cleans_up() {
        let dir = tempdir().unwrap();
        let target = DirectoryTarget::new(dir.path().join("out"));
        let export = FileExport::from_document(&document("Mutual NDA"));

        let path = target.deliver(&export).unwrap();
        assert_eq!(path, dir.path().join("out").join("mutual_nda.md"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# NDA\n\nTerms.");

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("out"))
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn directory_target_overwrites_existing() {
        let dir = tempdir().unwrap();
        let target = DirectoryTarget::new(dir.path());
        target.deliver(&FileExport::from_document(&document("NDA"))).unwrap();

        let mut newer = document("NDA");
        newer.content = "v2".to_string();
        let path = target.deliver(&FileExport::from_document(&newer)).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "v2");
    }

    #[tokio::test]
    async fn save_rejects_blank_title_without_calling_store() {
        let mut store = MockContractStore::new();
        store.expect_save().never();

        let adapter = ExportAdapter::new(SessionContext::with_token("t"), Arc::new(store));
        let err = adapter.save(&document("  ")).await.unwrap_err();
        assert_eq!(err, ErrorKind::Validation(ValidationError::MissingTitle));
    }

    #[tokio::test]
    async fn save_sends_document_fields() {
        let mut store = MockContractStore::new();
        store
            .expect_save()
            .withf(|session, request| {
                session.bearer().ok() == Some("t")
                    && request.title == "Mutual NDA"
                    && request.contract_type == "Mutual NDA"
            })
            .times(1)
            .returning(|_, _| Ok(SaveAck::default()));

        let adapter = ExportAdapter::new(SessionContext::with_token("t"), Arc::new(store));
        adapter.save(&document("Mutual NDA")).await.unwrap();
    }

    #[tokio::test]
    async fn list_maps_store_errors() {
        let mut store = MockContractStore::new();
        store
            .expect_list()
            .returning(|_| Err(CollaboratorError::Service("Failed to fetch contracts".to_string())));

        let adapter = ExportAdapter::new(SessionContext::anonymous(), Arc::new(store));
        assert_eq!(
            adapter.list().await.unwrap_err(),
            ErrorKind::Service("Failed to fetch contracts".to_string())
        );
    }
}
