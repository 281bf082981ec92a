//! Composer configuration
//!
//! Loaded from an optional TOML file, then overridden by environment
//! variables.

use composer_render::RenderOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Overrides `api_base_url`
pub const ENV_API_URL: &str = "COMPOSER_API_URL";
/// Overrides `export_dir`
pub const ENV_EXPORT_DIR: &str = "COMPOSER_EXPORT_DIR";
/// Overrides `catalog_path`
pub const ENV_CATALOG: &str = "COMPOSER_CATALOG";

/// Configuration load failure
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Config path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for this schema
    #[error("invalid config {path}: {message}")]
    Parse {
        /// Config path
        path: PathBuf,
        /// Parser message
        message: String,
    },
}

/// Composer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Base URL of the generation service and contract store
    pub api_base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// How long the saved notice stays visible, in seconds
    pub saved_notice_secs: u64,
    /// Directory downloads are written to
    pub export_dir: PathBuf,
    /// Session token file; defaults under the home directory
    pub token_store_path: Option<PathBuf>,
    /// Contract type catalog (YAML or JSON); built-in catalog when unset
    pub catalog_path: Option<PathBuf>,
    /// Document rendering
    pub render: RenderOptions,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            request_timeout_secs: 60,
            saved_notice_secs: 3,
            export_dir: PathBuf::from("."),
            token_store_path: None,
            catalog_path: None,
            render: RenderOptions::default(),
        }
    }
}

impl ComposerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML
    ///
    /// # Errors
    /// `Parse` on invalid TOML
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            message: e.to_string(),
        })
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// `Io` if unreadable, `Parse` if invalid
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load from `path` if it exists, defaults otherwise
    ///
    /// # Errors
    /// As [`ComposerConfig::load`] for an existing file
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Apply process environment overrides
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`; blank values are ignored
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Some(dir) = get(ENV_EXPORT_DIR) {
            self.export_dir = PathBuf::from(dir);
        }
        if let Some(catalog) = get(ENV_CATALOG) {
            self.catalog_path = Some(PathBuf::from(catalog));
        }
        self
    }

    /// With API base URL
    #[inline]
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// With export directory
    #[inline]
    #[must_use]
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    /// Request timeout
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Saved notice duration
    #[inline]
    #[must_use]
    pub fn saved_notice(&self) -> Duration {
        Duration::from_secs(self.saved_notice_secs)
    }

    /// Resolved token store path
    #[must_use]
    pub fn token_store_path(&self) -> PathBuf {
        if let Some(path) = &self.token_store_path {
            return path.clone();
        }
        std::env::var_os("HOME").map_or_else(
            || PathBuf::from(".composer-session.json"),
            |home| {
                PathBuf::from(home)
                    .join(".config")
                    .join("contract-composer")
                    .join("session.json")
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = ComposerConfig::new();
        assert_eq!(config.api_base_url, "http://localhost:5000");
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        assert_eq!(config.saved_notice(), Duration::from_secs(3));
        assert!(config.render.escape_html);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ComposerConfig::from_toml_str(
            r#"
            api_base_url = "https://contracts.example.com"
            saved_notice_secs = 5

            [render]
            tables = false
            "#,
        )
        .unwrap();

        assert_eq!(config.api_base_url, "https://contracts.example.com");
        assert_eq!(config.saved_notice_secs, 5);
        assert_eq!(config.request_timeout_secs, 60);
        assert!(!config.render.tables);
        assert!(config.render.escape_html);
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        assert!(matches!(
            ComposerConfig::from_toml_str("request_timeout_secs = \"soon\""),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn overrides_apply_and_ignore_blanks() {
        let env: HashMap<&str, &str> = [
            (ENV_API_URL, "http://api.test"),
            (ENV_EXPORT_DIR, "  "),
            (ENV_CATALOG, "types.yaml"),
        ]
        .into_iter()
        .collect();

        let config = ComposerConfig::new()
            .with_overrides_from(|key| env.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.api_base_url, "http://api.test");
        assert_eq!(config.export_dir, PathBuf::from("."));
        assert_eq!(config.catalog_path, Some(PathBuf::from("types.yaml")));
    }

    #[test]
    fn load_or_default_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ComposerConfig::load_or_default(dir.path().join("composer.toml")).unwrap();
        assert_eq!(config, ComposerConfig::default());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("composer.toml");
        std::fs::write(&path, "export_dir = \"out\"\n").unwrap();

        let config = ComposerConfig::load(&path).unwrap();
        assert_eq!(config.export_dir, PathBuf::from("out"));
    }

    #[test]
    fn explicit_token_store_path_wins() {
        let config = ComposerConfig {
            token_store_path: Some(PathBuf::from("/tmp/session.json")),
            ..ComposerConfig::default()
        };
        assert_eq!(config.token_store_path(), PathBuf::from("/tmp/session.json"));
    }
}
