//! Eras and the crisis events that gate them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A crisis event. Resolved by producing exactly one matching key card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrisisEvent {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// What an era's technology level allows AI-invented cards to be.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TechLimits {
    /// Highest tier an invented card may have in this era.
    #[serde(default)]
    pub max_tier: Option<u32>,
    /// Concepts that do not exist yet in this era.
    #[serde(default)]
    pub forbidden_concepts: Vec<String>,
}

/// A named progression stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Era {
    pub name: String,
    /// Position in the campaign, starting at 1.
    pub order: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub events: Vec<CrisisEvent>,
    #[serde(default, flatten)]
    pub tech: TechLimits,
}

impl Era {
    /// Create a new era without events.
    pub fn new(name: impl Into<String>, order: u32) -> Self {
        Self {
            name: name.into(),
            order,
            description: String::new(),
            events: Vec::new(),
            tech: TechLimits::default(),
        }
    }

    /// Add a crisis event.
    pub fn with_event(mut self, name: impl Into<String>) -> Self {
        self.events.push(CrisisEvent {
            name: name.into(),
            description: None,
        });
        self
    }

    /// Set the tech limits.
    pub fn with_tech(mut self, tech: TechLimits) -> Self {
        self.tech = tech;
        self
    }

    /// Check if this era defines the named event.
    pub fn defines_event(&self, event: &str) -> bool {
        self.events.iter().any(|e| e.name == event)
    }

    /// An era is complete iff every event it defines has been resolved.
    pub fn is_complete(&self, resolved: &BTreeSet<String>) -> bool {
        self.events.iter().all(|e| resolved.contains(&e.name))
    }

    /// Events of this era not yet resolved.
    pub fn pending_events<'a>(&'a self, resolved: &'a BTreeSet<String>) -> Vec<&'a str> {
        self.events
            .iter()
            .filter(|e| !resolved.contains(&e.name))
            .map(|e| e.name.as_str())
            .collect()
    }

    /// The first forbidden concept mentioned in `text`, if any.
    pub fn forbidden_concept_in(&self, text: &str) -> Option<&str> {
        let text = text.to_lowercase();
        self.tech
            .forbidden_concepts
            .iter()
            .find(|concept| text.contains(&concept.to_lowercase()))
            .map(String::as_str)
    }

    /// Clamp an invented card's tier to what this era can produce.
    pub fn clamp_tier(&self, tier: u32) -> u32 {
        match self.tech.max_tier {
            Some(max) => tier.min(max),
            None => tier,
        }
    }
}
