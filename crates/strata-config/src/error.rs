//! Error types for configuration loading, validation and merging
//!
//! Problems found *inside* configuration files are not errors of this type:
//! they are collected as [`ConfigurationError`](crate::ConfigurationError)
//! diagnostics in a [`ValidationReport`](crate::ValidationReport). The
//! variants here cover failures of the call itself.

use crate::schema::SchemaError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `merge` was called without either input
    #[error("Cannot merge profile '{profile}': neither YAML nor JSON configuration was supplied")]
    MissingMergeInput { profile: String },

    /// A configuration object failed schema validation
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// YAML serialization failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File read failed
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Validator settings could not be loaded
    #[error("Invalid validator settings: {message}")]
    Settings { message: String },
}

impl ConfigError {
    /// Create a missing-merge-input error
    pub fn missing_merge_input(profile: impl Into<String>) -> Self {
        Self::MissingMergeInput {
            profile: profile.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a settings error
    pub fn settings(message: impl Into<String>) -> Self {
        Self::Settings {
            message: message.into(),
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
