//! Per-player state records - inventory, era progress and synthesis history.
//!
//! These are the records a card repository persists. The engine borrows them
//! for one attempt and hands back the updated copy.

mod inventory;

pub use inventory::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::cards::{Card, CardInstanceId};
use crate::recipes::CanonicalKey;

/// Era progress of one player.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EraProgress {
    pub active_era: String,
    pub resolved_events: BTreeSet<String>,
    pub unlocked_rewards: BTreeSet<String>,
    /// Inspiration cards made available by entering later eras.
    #[serde(default)]
    pub unlocked_cards: BTreeSet<String>,
    /// Branches chosen by producing branch key cards.
    #[serde(default)]
    pub chosen_branches: BTreeSet<String>,
    /// Set once the final era is complete.
    #[serde(default)]
    pub campaign_complete: bool,
}

impl EraProgress {
    /// Fresh progress starting in `era`.
    pub fn starting_in(era: impl Into<String>) -> Self {
        Self {
            active_era: era.into(),
            ..Default::default()
        }
    }

    pub fn is_resolved(&self, event: &str) -> bool {
        self.resolved_events.contains(event)
    }
}

/// How a synthesis output was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisSource {
    /// Matched a deterministic recipe.
    Recipe,
    /// Built from an AI idea.
    Ai,
    /// Local fallback when no idea was available.
    Placeholder,
}

/// One committed synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisRecord {
    pub inputs: Vec<String>,
    pub output: String,
    pub source: SynthesisSource,
    pub era: String,
    pub recipe_key: CanonicalKey,
}

/// Everything the repository keeps for one player.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub inventory: Inventory,
    pub progress: EraProgress,
    #[serde(default)]
    pub history: Vec<SynthesisRecord>,
    #[serde(default)]
    pub synthesis_count: u64,
    /// Unlocked cards not yet delivered to the inventory.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending_grants: Vec<Card>,
}

impl PlayerState {
    /// Create an empty player starting in `era`.
    pub fn new(era: impl Into<String>) -> Self {
        Self {
            progress: EraProgress::starting_in(era),
            ..Default::default()
        }
    }

    /// Append a committed synthesis to the history.
    pub fn record(&mut self, record: SynthesisRecord) {
        self.history.push(record);
        self.synthesis_count += 1;
    }

    /// Move every pending grant into the inventory, oldest first.
    pub fn claim_grants(&mut self) -> Vec<CardInstanceId> {
        let pending = std::mem::take(&mut self.pending_grants);
        pending
            .into_iter()
            .map(|card| self.inventory.add(card))
            .collect()
    }
}
