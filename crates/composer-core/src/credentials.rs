//! Session credentials
//!
//! The bearer token lives in a small key-value store. [`SessionContext`] is
//! the read-only view handed to collaborators.

use crate::error::CollaboratorError;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Store key holding the bearer token
pub const TOKEN_KEY: &str = "token";

/// Credential store failure
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure
    #[error("credential store io error at {path}: {source}")]
    Io {
        /// Store path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Store file is not a JSON object of strings
    #[error("credential store at {path} is corrupt: {message}")]
    Corrupt {
        /// Store path
        path: PathBuf,
        /// Parser message
        message: String,
    },
}

/// String key-value persistence
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    ///
    /// # Errors
    /// Backend failure
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value
    ///
    /// # Errors
    /// Backend failure
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a value; missing keys are not an error
    ///
    /// # Errors
    /// Backend failure
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Store backed by a JSON object file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileStore {
    /// Store at `path`; the file is created on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// Backing file path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
                path: self.path.clone(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(self.io(e)),
        }
    }

    /// Replace the file atomically; the result is readable by the owner only
    fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(entries).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent).map_err(|e| self.io(e))?;

        let mut handle = tempfile::Builder::new()
            .prefix(".composer-session-")
            .suffix(".tmp")
            .tempfile_in(parent)
            .map_err(|e| self.io(e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            handle
                .as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o600))
                .map_err(|e| self.io(e))?;
        }
        handle
            .write_all(raw.as_bytes())
            .and_then(|()| handle.as_file().sync_all())
            .map_err(|e| self.io(e))?;
        handle.persist(&self.path).map_err(|e| self.io(e.error))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.guard.lock();
        Ok(self.read()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.guard.lock();
        let mut entries = self.read()?;
        entries.insert(key.to_string(), value.to_string());
        self.write(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.guard.lock();
        let mut entries = self.read()?;
        if entries.remove(key).is_some() {
            self.write(&entries)?;
        }
        Ok(())
    }
}

/// Authentication context passed to collaborators
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    token: Option<String>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl SessionContext {
    /// Context without a token
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Context carrying `token`; blank tokens count as absent
    pub fn with_token(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            token: (!token.trim().is_empty()).then_some(token),
        }
    }

    /// Load the token from a store
    ///
    /// # Errors
    /// Store failure
    pub fn from_store(store: &dyn KeyValueStore) -> Result<Self, StoreError> {
        let context = store.get(TOKEN_KEY)?.map_or_else(Self::anonymous, Self::with_token);
        debug!(authenticated = context.is_authenticated(), "Session loaded");
        Ok(context)
    }

    /// Whether a token is present
    #[inline]
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Bearer token
    ///
    /// # Errors
    /// `Unauthenticated` when no token is present
    pub fn bearer(&self) -> Result<&str, CollaboratorError> {
        self.token
            .as_deref()
            .ok_or_else(|| CollaboratorError::Unauthenticated("no session token".to_string()))
    }
}

/// Persist a token
///
/// # Errors
/// Store failure
pub fn store_token(store: &dyn KeyValueStore, token: &str) -> Result<(), StoreError> {
    store.set(TOKEN_KEY, token.trim())
}

/// Forget the stored token
///
/// # Errors
/// Store failure
pub fn clear_token(store: &dyn KeyValueStore) -> Result<(), StoreError> {
    store.remove(TOKEN_KEY)
}
