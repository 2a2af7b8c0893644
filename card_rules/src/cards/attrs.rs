//! Typed semantic flags carried by a card.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Semantic flags of a card.
///
/// The flags the engine reasons about (`keyCard`, `solves`, `branch`, `power`,
/// `material`) are typed fields. Purely cosmetic flags such as `element` or
/// `warmth` land in `extra` and are carried through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardAttrs {
    #[serde(default)]
    pub key_card: bool,

    /// Crisis event this card resolves. Only meaningful with `key_card`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solves: Option<String>,

    /// Progression branch chosen by producing this card (e.g. "order", "faith").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl CardAttrs {
    /// Attrs of a key card resolving `event`.
    pub fn key(event: impl Into<String>) -> Self {
        Self {
            key_card: true,
            solves: Some(event.into()),
            ..Default::default()
        }
    }

    /// Add a cosmetic flag.
    pub fn with_extra(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// The event this card resolves, if it is a well-formed key card.
    pub fn resolved_event(&self) -> Option<&str> {
        if !self.key_card {
            return None;
        }
        self.solves.as_deref().filter(|event| !event.trim().is_empty())
    }
}
