//! Per-player state storage.
//!
//! The engine never mutates player state directly. It reads snapshots for
//! validation and previews, and applies commits through [`CardRepository::transact`],
//! which runs the whole mutation under the player's lock and keeps it only
//! if it succeeds.

mod memory;

pub use memory::*;

use async_trait::async_trait;
use card_rules::{PlayerId, PlayerState};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("player {0} is not known")]
    UnknownPlayer(PlayerId),
    #[error("card repository unavailable: {0}")]
    Storage(String),
}

/// Storage of player inventories and era progress.
#[async_trait]
pub trait CardRepository: Send + Sync {
    /// A detached copy of the player's current state.
    async fn snapshot(&self, player: PlayerId) -> Result<PlayerState, RepositoryError>;

    /// Apply `apply` to the player's state as one atomic unit.
    ///
    /// Commits for the same player are serialized. When `apply` fails the
    /// stored state is left exactly as it was.
    async fn transact<T, E, F>(&self, player: PlayerId, apply: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<RepositoryError> + Send + 'static,
        F: FnOnce(&mut PlayerState) -> Result<T, E> + Send + 'static;
}
