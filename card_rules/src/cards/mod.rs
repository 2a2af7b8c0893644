//! Card definitions for the fusion game.

mod attrs;

pub use attrs::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Create a new random player ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a player ID from a specific UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one physical card held by a player.
///
/// Two copies of the same card name are two different instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardInstanceId(pub Uuid);

impl CardInstanceId {
    /// Create a new random instance ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an instance ID from a specific UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Create a nil/empty instance ID.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl Default for CardInstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CardInstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role a card plays in progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    /// Raw material for fusion.
    #[default]
    Inspiration,
    /// Resolves exactly one crisis event.
    Key,
    /// Unlocked by resolving an event or choosing a branch.
    Reward,
}

/// Card rarity, used for display and to derive base tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    /// Reserved for key cards.
    Ruby,
}

/// What unlocks a reward card.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnlockCondition {
    /// Resolving the named crisis event.
    Event(String),
    /// Producing a key card that carries this branch.
    Branch(String),
}

/// A card definition. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub name: String,
    #[serde(default)]
    pub card_type: CardKind,
    pub tier: u32,
    /// Owning era. Filled in by the codex loader for catalog cards.
    #[serde(default)]
    pub era: String,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_base_card: bool,
    #[serde(default)]
    pub is_starter: bool,
    #[serde(default)]
    pub is_decoy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlock_condition: Option<UnlockCondition>,
    #[serde(default)]
    pub attrs: CardAttrs,
}

impl Card {
    /// Create a new inspiration card with the given name and tier.
    pub fn new(name: impl Into<String>, tier: u32) -> Self {
        Self {
            name: name.into(),
            card_type: CardKind::Inspiration,
            tier,
            era: String::new(),
            rarity: Rarity::Common,
            description: None,
            is_base_card: false,
            is_starter: false,
            is_decoy: false,
            unlock_condition: None,
            attrs: CardAttrs::default(),
        }
    }

    /// Set the card kind.
    pub fn with_kind(mut self, kind: CardKind) -> Self {
        self.card_type = kind;
        self
    }

    /// Set the owning era.
    pub fn with_era(mut self, era: impl Into<String>) -> Self {
        self.era = era.into();
        self
    }

    /// Set the attrs.
    pub fn with_attrs(mut self, attrs: CardAttrs) -> Self {
        self.attrs = attrs;
        self
    }

    /// Check if this card resolves a crisis event when produced.
    pub fn is_key(&self) -> bool {
        self.attrs.resolved_event().is_some()
    }

    /// Every `key`-typed card must carry `keyCard = true` and a non-empty `solves`.
    pub fn key_invariant_holds(&self) -> bool {
        self.card_type != CardKind::Key || self.attrs.resolved_event().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_card() {
        let card = Card::new("木头", 1).with_era("生存时代");
        assert_eq!(card.name, "木头");
        assert_eq!(card.card_type, CardKind::Inspiration);
        assert!(!card.is_key());
        assert!(card.key_invariant_holds());
    }

    #[test]
    fn test_key_invariant() {
        let broken = Card::new("火", 2).with_kind(CardKind::Key);
        assert!(!broken.key_invariant_holds());

        let fire = Card::new("火", 2)
            .with_kind(CardKind::Key)
            .with_attrs(CardAttrs::key("寒冷"));
        assert!(fire.key_invariant_holds());
        assert!(fire.is_key());
    }

    #[test]
    fn test_unlock_condition_wire_shape() {
        let by_event = serde_json::to_value(UnlockCondition::Event("寒冷".into())).unwrap();
        assert_eq!(by_event, serde_json::json!({"event": "寒冷"}));

        let by_branch: UnlockCondition = serde_json::from_str(r#"{"branch":"order"}"#).unwrap();
        assert_eq!(by_branch, UnlockCondition::Branch("order".into()));
    }

    #[test]
    fn test_instance_ids_are_distinct() {
        assert_ne!(CardInstanceId::new(), CardInstanceId::new());
        assert_eq!(CardInstanceId::nil().to_string(), Uuid::nil().to_string());
    }
}
