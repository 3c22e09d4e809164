//! Error types for DataQA

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for DataQA operations
pub type Result<T> = std::result::Result<T, DataQaError>;

/// Errors surfaced by the orchestrator and its collaborators
#[derive(Error, Debug)]
pub enum DataQaError {
    /// Missing credential or unusable configuration. Restart required.
    #[error("{0}")]
    Configuration(String),

    #[error("cannot load {}: {reason}", path.display())]
    DataLoad { path: PathBuf, reason: String },

    /// Anything that goes wrong while the agent answers a question.
    #[error("{0}")]
    AgentInvocation(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl DataQaError {
    pub fn data_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        DataQaError::DataLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Reclassify a lower-level failure raised while answering a question.
    pub fn into_invocation(self) -> Self {
        match self {
            DataQaError::AgentInvocation(_) => self,
            other => DataQaError::AgentInvocation(other.to_string()),
        }
    }
}
