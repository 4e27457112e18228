//! Error types for schema loading, configuration and manifests.

use std::path::PathBuf;

use databean_core::GenerationError;
use thiserror::Error;

/// Errors that can occur while loading schema documents or generator state.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A loaded schema failed validation or graph construction.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// A schema document has an extension other than `json`, `yaml` or `yml`.
    #[error("unsupported schema document: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// No source was configured, or none of them held a schema document.
    #[error("no schema sources available")]
    NoSourcesAvailable,
}

/// Convenience alias for results with [`LoaderError`].
pub type Result<T> = std::result::Result<T, LoaderError>;
