//! Router configuration.
//!
//! A [`RouterConfig`] sets up the root of a router tree. Mounted children
//! start from a copy of their parent's configuration and apply whatever
//! [`MountOptions`] override.
//!
//! Both types deserialize from TOML or JSON. The error handler is code, so
//! it is never read from a file.
//!
//! ```toml
//! base_path = "/api"
//! strict_error_types = true
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thales_core::Error;
use thales_middleware::Exchange;
use thiserror::Error;

/// Takes over the response for a classified failure.
///
/// Whatever the handler writes is sent as-is. Writing nothing yields an
/// empty `200 OK`.
pub type ErrorHandler = Arc<dyn Fn(&mut Exchange, Error) + Send + Sync>;

/// Configuration of a router node.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Prefix for every route on this node.
    pub base_path: String,
    /// Reject typed errors a route did not declare.
    pub strict_error_types: bool,
    /// Custom writer for classified failures.
    #[serde(skip)]
    pub error_handler: Option<ErrorHandler>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            strict_error_types: true,
            error_handler: None,
        }
    }
}

impl fmt::Debug for RouterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterConfig")
            .field("base_path", &self.base_path)
            .field("strict_error_types", &self.strict_error_types)
            .field("error_handler", &self.error_handler.is_some())
            .finish()
    }
}

impl RouterConfig {
    /// Default configuration: no prefix, strict error types, default error
    /// responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base path.
    #[must_use]
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Turns strict error-type enforcement on or off.
    #[must_use]
    pub const fn with_strict_error_types(mut self, strict: bool) -> Self {
        self.strict_error_types = strict;
        self
    }

    /// Installs a custom error handler.
    #[must_use]
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Exchange, Error) + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// Parses TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] on malformed input.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Parses JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] on malformed input.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Reads a `.toml` or `.json` file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read, has another extension, or does
    /// not parse.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        let read = || {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        };
        match extension.as_deref() {
            Some("toml") => Self::from_toml_str(&read()?),
            Some("json") => Self::from_json_str(&read()?),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Applies mount overrides on top of a copy of `self`.
    pub(crate) fn inherit(&self, options: &MountOptions) -> Self {
        Self {
            base_path: options.base_path.clone().unwrap_or_default(),
            strict_error_types: options
                .strict_error_types
                .unwrap_or(self.strict_error_types),
            error_handler: options
                .error_handler
                .clone()
                .or_else(|| self.error_handler.clone()),
        }
    }
}

/// Overrides for a mounted child. Unset fields inherit from the parent.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct MountOptions {
    /// Extra prefix appended after the mount prefix.
    pub base_path: Option<String>,
    /// Strict error-type enforcement for the child.
    pub strict_error_types: Option<bool>,
    /// Error handler for the child.
    #[serde(skip)]
    pub error_handler: Option<ErrorHandler>,
}

impl fmt::Debug for MountOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountOptions")
            .field("base_path", &self.base_path)
            .field("strict_error_types", &self.strict_error_types)
            .field("error_handler", &self.error_handler.is_some())
            .finish()
    }
}

impl MountOptions {
    /// No overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `base_path` after the mount prefix.
    #[must_use]
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    /// Overrides strict error-type enforcement.
    #[must_use]
    pub const fn strict_error_types(mut self, strict: bool) -> Self {
        self.strict_error_types = Some(strict);
        self
    }

    /// Overrides the error handler.
    #[must_use]
    pub fn error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Exchange, Error) + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration file: {path}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parsing error.
    #[error("failed to parse JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The file extension is neither `.toml` nor `.json`.
    #[error("unsupported configuration file format: {}", path.display())]
    UnsupportedFormat {
        /// File path.
        path: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_strict() {
        let config = RouterConfig::default();
        assert!(config.strict_error_types);
        assert!(config.base_path.is_empty());
        assert!(config.error_handler.is_none());
    }

    #[test]
    fn test_from_toml() {
        let config = RouterConfig::from_toml_str(
            r#"
            base_path = "/api"
            strict_error_types = false
            "#,
        )
        .unwrap();
        assert_eq!(config.base_path, "/api");
        assert!(!config.strict_error_types);
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let config = RouterConfig::from_json_str(r#"{"base_path": "/v1"}"#).unwrap();
        assert_eq!(config.base_path, "/v1");
        assert!(config.strict_error_types);
    }

    #[test]
    fn test_bad_toml_is_reported() {
        let err = RouterConfig::from_toml_str("base_path = ").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_from_file_rejects_unknown_extension() {
        let err = RouterConfig::from_file("router.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_from_file_reads_json() {
        let path = std::env::temp_dir().join(format!("thales-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"strict_error_types": false}"#).unwrap();
        let config = RouterConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(!config.strict_error_types);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = RouterConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_inherit_keeps_unset_fields() {
        let parent = RouterConfig::new()
            .with_strict_error_types(false)
            .with_error_handler(|_, _| {});
        let child = parent.inherit(&MountOptions::new());
        assert!(!child.strict_error_types);
        assert!(child.error_handler.is_some());

        let child = parent.inherit(&MountOptions::new().strict_error_types(true));
        assert!(child.strict_error_types);
    }

    #[test]
    fn test_mount_options_from_toml() {
        let options: MountOptions = toml::from_str(r#"base_path = "/admin""#).unwrap();
        assert_eq!(options.base_path.as_deref(), Some("/admin"));
        assert_eq!(options.strict_error_types, None);
    }
}
