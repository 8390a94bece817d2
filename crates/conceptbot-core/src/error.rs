//! Error taxonomy for startup loading and per-request chat handling.

use std::path::PathBuf;

/// Startup failure. Any of these is fatal: the gateway must not serve.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("inconsistent artifact {path}: {reason}")]
    Artifact { path: PathBuf, reason: String },

    #[error("configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("similarity threshold {0} is outside [0, 1]")]
    InvalidThreshold(f32),
}

impl LoadError {
    pub(crate) fn artifact(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        LoadError::Artifact {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Per-request failure. Local to the request; other requests are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type LoadResult<T> = Result<T, LoadError>;
