//! Era Tracker - turns produced key cards into campaign progress.
//!
//! For each committed output card the tracker:
//! 1. **Resolves** the active era's event the card solves, if still pending
//! 2. **Unlocks** the era's rewards tied to that event, and to the card's branch
//! 3. **Advances** to the next era once every event of the active era is resolved,
//!    recording the new era's inspiration cards as unlocked
//!
//! At most one era advance happens per card; the codex rejects eras without
//! events, so a freshly entered era always has pending events of its own.

use card_rules::{Card, CardKind, Codex, EraProgress, UnlockCondition};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What one produced card did to a player's progress.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionEffect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_resolved: Option<String>,

    /// Reward cards unlocked by the event or the chosen branch.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unlocked_rewards: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_chosen: Option<String>,

    /// Name of the era the player advanced into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub era_advanced: Option<String>,

    /// Inspiration cards that became available with the new era.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub era_cards: Vec<String>,

    /// Set once, when the final era is completed.
    #[serde(default)]
    pub campaign_complete: bool,
}

impl ProgressionEffect {
    /// True when the card changed nothing.
    pub fn is_inert(&self) -> bool {
        *self == Self::default()
    }
}

/// Applies era rules to player progress.
#[derive(Debug, Clone)]
pub struct EraTracker {
    codex: Arc<Codex>,
}

impl EraTracker {
    pub fn new(codex: Arc<Codex>) -> Self {
        Self { codex }
    }

    /// Update `progress` for a newly produced `card`.
    ///
    /// Only key cards solving a pending event of the active era have any
    /// effect. Key cards for other eras, and repeats of an already solved
    /// event, are kept as ordinary cards.
    pub fn on_card_produced(&self, progress: &mut EraProgress, card: &Card) -> ProgressionEffect {
        let mut effect = ProgressionEffect::default();

        let Some(event) = card.attrs.resolved_event() else {
            return effect;
        };
        if progress.is_resolved(event) {
            debug!(
                target: "forge::progression",
                card = %card.name,
                event,
                "progression.event.already_resolved"
            );
            return effect;
        }
        let Some(era) = self.codex.era(&progress.active_era) else {
            warn!(
                target: "forge::progression",
                era = %progress.active_era,
                "progression.era.unknown"
            );
            return effect;
        };
        if !era.defines_event(event) {
            debug!(
                target: "forge::progression",
                card = %card.name,
                event,
                era = %era.name,
                "progression.event.outside_active_era"
            );
            return effect;
        }

        progress.resolved_events.insert(event.to_string());
        effect.event_resolved = Some(event.to_string());

        let mut unlocked: Vec<String> = self
            .codex
            .rewards_unlocked_by(&era.name, &UnlockCondition::Event(event.to_string()))
            .into_iter()
            .map(|reward| reward.name.clone())
            .collect();

        if let Some(branch) = &card.attrs.branch {
            progress.chosen_branches.insert(branch.clone());
            effect.branch_chosen = Some(branch.clone());
            unlocked.extend(
                self.codex
                    .rewards_unlocked_by(&era.name, &UnlockCondition::Branch(branch.clone()))
                    .into_iter()
                    .map(|reward| reward.name.clone()),
            );
        }

        for reward in &unlocked {
            progress.unlocked_rewards.insert(reward.clone());
        }
        effect.unlocked_rewards = unlocked;

        info!(
            target: "forge::progression",
            event,
            era = %era.name,
            rewards = ?effect.unlocked_rewards,
            branch = ?effect.branch_chosen,
            "progression.event.resolved"
        );

        if era.is_complete(&progress.resolved_events) {
            match self.codex.next_era(&era.name) {
                Some(next) => {
                    progress.active_era = next.name.clone();
                    effect.era_advanced = Some(next.name.clone());
                    effect.era_cards = self
                        .codex
                        .era_inspirations(&next.name)
                        .into_iter()
                        .map(|card| card.name.clone())
                        .collect();
                    progress.unlocked_cards.extend(effect.era_cards.iter().cloned());
                    info!(
                        target: "forge::progression",
                        from = %era.name,
                        to = %next.name,
                        "progression.era.advanced"
                    );
                }
                None => {
                    progress.campaign_complete = true;
                    effect.campaign_complete = true;
                    info!(
                        target: "forge::progression",
                        era = %era.name,
                        "progression.campaign.complete"
                    );
                }
            }
        }

        effect
    }

    /// Catalog cards a player may be granted for `effect`: the unlocked
    /// rewards and the inspirations of a newly entered era.
    pub fn unlocked_cards(&self, effect: &ProgressionEffect) -> Vec<Card> {
        let mut cards = Vec::new();

        if let Some(era) = effect
            .event_resolved
            .as_deref()
            .and_then(|event| self.codex.event_era(event))
        {
            cards.extend(
                self.codex
                    .era_cards(&era.name)
                    .filter(|card| card.card_type == CardKind::Reward)
                    .filter(|card| effect.unlocked_rewards.contains(&card.name))
                    .cloned(),
            );
        }
        if let Some(next) = &effect.era_advanced {
            cards.extend(self.codex.era_inspirations(next).into_iter().cloned());
        }

        cards
    }
}
