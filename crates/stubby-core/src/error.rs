use crate::context::Interrupted;
use thiserror::Error;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Failures reported by a storage backend.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("alias already exists: {0}")]
    Conflict(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
    /// The caller's context ended before the write was committed. Nothing
    /// was persisted.
    #[error("storage call interrupted: {0}")]
    Interrupted(#[from] Interrupted),
}

/// Errors returned by the URL store to its collaborators.
#[derive(Debug, Clone, Error)]
pub enum MappingError {
    /// A caller-chosen alias is already taken.
    #[error("alias already exists: {0}")]
    AliasExists(String),
    /// No free generated alias was found within the retry budget.
    #[error("no free alias found after {attempts} attempts")]
    AliasExhausted { attempts: u32 },
    #[error("alias not found: {0}")]
    AliasNotFound(String),
    #[error("invalid alias: {0}")]
    InvalidAlias(String),
    #[error("invalid target: {0}")]
    InvalidTarget(String),
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] StorageError),
    #[error("operation cancelled")]
    Cancelled,
    #[error("operation timed out")]
    Timeout,
}

/// Coarse outcome class a collaborator translates into its own protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Conflict,
    NotFound,
    InvalidInput,
    Internal,
}

impl MappingError {
    pub fn signal(&self) -> Signal {
        match self {
            MappingError::AliasExists(_) | MappingError::AliasExhausted { .. } => Signal::Conflict,
            MappingError::AliasNotFound(_) => Signal::NotFound,
            MappingError::InvalidAlias(_) | MappingError::InvalidTarget(_) => Signal::InvalidInput,
            MappingError::StorageUnavailable(_)
            | MappingError::Cancelled
            | MappingError::Timeout => Signal::Internal,
        }
    }
}

impl From<StorageError> for MappingError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::Interrupted(interrupted) => interrupted.into(),
            other => MappingError::StorageUnavailable(other),
        }
    }
}
