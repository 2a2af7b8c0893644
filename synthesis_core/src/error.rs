//! Error taxonomy of a synthesis attempt.

use card_rules::CardInstanceId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::adapter::AdapterError;
use crate::repository::RepositoryError;

/// Failure category reported to client collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed, insufficient or unowned input references.
    InvalidInput,
    /// Deterministic mode and no recipe matches; retry in AI mode.
    NoRecipe,
    /// The assistant failed and strict AI mode forbids the placeholder.
    AdapterUnavailable,
    /// A concurrent commit consumed one of the inputs; retry from fresh state.
    ConcurrencyConflict,
    /// The card repository itself failed.
    StorageUnavailable,
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no recipe combines {0}")]
    NoRecipe(String),
    #[error(transparent)]
    AdapterUnavailable(#[from] AdapterError),
    #[error("card instance {0} was consumed by a concurrent commit")]
    ConcurrencyConflict(CardInstanceId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl SynthesisError {
    /// The wire category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SynthesisError::InvalidInput(_) => ErrorKind::InvalidInput,
            SynthesisError::NoRecipe(_) => ErrorKind::NoRecipe,
            SynthesisError::AdapterUnavailable(_) => ErrorKind::AdapterUnavailable,
            SynthesisError::ConcurrencyConflict(_) => ErrorKind::ConcurrencyConflict,
            SynthesisError::Repository(RepositoryError::UnknownPlayer(_)) => {
                ErrorKind::InvalidInput
            }
            SynthesisError::Repository(_) => ErrorKind::StorageUnavailable,
        }
    }
}
