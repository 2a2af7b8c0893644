//! In-memory card repository for development and testing.

use async_trait::async_trait;
use card_rules::{Codex, PlayerId, PlayerState};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::{CardRepository, RepositoryError};

/// Repository keeping every player in process memory.
///
/// Each player has its own lock, so commits for different players never
/// wait on each other.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    players: RwLock<HashMap<PlayerId, Arc<Mutex<PlayerState>>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `state` for `player`, replacing any previous state.
    pub async fn insert_player(&self, player: PlayerId, state: PlayerState) {
        self.players
            .write()
            .await
            .insert(player, Arc::new(Mutex::new(state)));
    }

    /// Register a new player in the codex's first era holding the opening hand.
    pub async fn seed_player(&self, codex: &Codex) -> PlayerId {
        let player = PlayerId::new();
        let mut state = PlayerState::new(codex.first_era().name.clone());
        for card in codex.opening_hand() {
            state.inventory.add(card);
        }
        debug!(%player, cards = state.inventory.len(), "Seeded player");
        self.insert_player(player, state).await;
        player
    }

    pub async fn player_count(&self) -> usize {
        self.players.read().await.len()
    }

    async fn slot(&self, player: PlayerId) -> Result<Arc<Mutex<PlayerState>>, RepositoryError> {
        self.players
            .read()
            .await
            .get(&player)
            .cloned()
            .ok_or(RepositoryError::UnknownPlayer(player))
    }
}

#[async_trait]
impl CardRepository for InMemoryRepository {
    async fn snapshot(&self, player: PlayerId) -> Result<PlayerState, RepositoryError> {
        let slot = self.slot(player).await?;
        let state = slot.lock().await;
        Ok(state.clone())
    }

    async fn transact<T, E, F>(&self, player: PlayerId, apply: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<RepositoryError> + Send + 'static,
        F: FnOnce(&mut PlayerState) -> Result<T, E> + Send + 'static,
    {
        let slot = self.slot(player).await?;
        let mut stored = slot.lock().await;

        // Work on a copy so a failed commit leaves no partial writes
        let mut working = stored.clone();
        let value = apply(&mut working)?;
        *stored = working;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use card_rules::Card;

    #[tokio::test]
    async fn test_seed_player() {
        let codex = Codex::builtin().unwrap();
        let repo = InMemoryRepository::new();
        let player = repo.seed_player(&codex).await;

        let state = repo.snapshot(player).await.unwrap();
        assert_eq!(state.progress.active_era, "生存时代");
        assert_eq!(state.inventory.len(), codex.opening_hand().len());
        assert_eq!(state.inventory.count_of("人"), 2);
        assert_eq!(repo.player_count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_player() {
        let repo = InMemoryRepository::new();
        let result = repo.snapshot(PlayerId::new()).await;
        assert!(matches!(result, Err(RepositoryError::UnknownPlayer(_))));
    }

    #[tokio::test]
    async fn test_transact_commits_on_success() {
        let repo = InMemoryRepository::new();
        let player = PlayerId::new();
        repo.insert_player(player, PlayerState::new("生存时代")).await;

        let id = repo
            .transact(player, |state| {
                Ok::<_, RepositoryError>(state.inventory.add(Card::new("火", 2)))
            })
            .await
            .unwrap();

        let state = repo.snapshot(player).await.unwrap();
        assert_eq!(state.inventory.get(id).unwrap().name, "火");
    }

    #[tokio::test]
    async fn test_transact_discards_on_failure() {
        let repo = InMemoryRepository::new();
        let player = PlayerId::new();
        repo.insert_player(player, PlayerState::new("生存时代")).await;
        let before = repo.snapshot(player).await.unwrap();

        let result: Result<(), RepositoryError> = repo
            .transact(player, |state| {
                state.inventory.add(Card::new("火", 2));
                state.progress.active_era = "城邦时代".into();
                Err(RepositoryError::Storage("rejected".into()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(repo.snapshot(player).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_snapshot_is_detached() {
        let repo = InMemoryRepository::new();
        let player = PlayerId::new();
        repo.insert_player(player, PlayerState::new("生存时代")).await;

        let mut copy = repo.snapshot(player).await.unwrap();
        copy.inventory.add(Card::new("人", 1));

        assert!(repo.snapshot(player).await.unwrap().inventory.is_empty());
    }
}
