//! The codex - the process-wide, read-only catalog of eras, cards and recipes.
//!
//! Loaded once (from the embedded TOML or an alternate file) and then shared
//! behind an `Arc`. Nothing mutates it after construction.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::cards::{Card, CardKind, UnlockCondition};
use crate::eras::{CrisisEvent, Era, TechLimits};
use crate::recipes::{canonical_name, Recipe, RecipeTable};

pub const BUILTIN_CODEX: &str = include_str!("../../data/codex.toml");

#[derive(Debug, Error)]
pub enum CodexError {
    #[error("failed to parse codex: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read codex from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("codex defines no eras")]
    NoEras,
    #[error("era {0} is defined more than once")]
    DuplicateEra(String),
    #[error("event {0} is defined more than once")]
    DuplicateEvent(String),
    #[error("card {name} is defined more than once in era {era}")]
    DuplicateCard { era: String, name: String },
    #[error("{owner} references unknown era {era}")]
    UnknownEra { owner: String, era: String },
    #[error("{owner} references unknown event {event}")]
    UnknownEvent { owner: String, event: String },
    #[error("key card {0} must set keyCard and name the event it solves")]
    InvalidKeyCard(String),
    #[error("recipe for {0} needs at least two inputs")]
    RecipeTooSmall(String),
    #[error("era {0} defines no events and could never be completed")]
    EraWithoutEvents(String),
}

#[derive(Debug, Deserialize)]
struct CodexFile {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    eras: Vec<EraFile>,
}

#[derive(Debug, Deserialize)]
struct EraFile {
    name: String,
    order: u32,
    #[serde(default)]
    description: String,
    #[serde(default)]
    max_tier: Option<u32>,
    #[serde(default)]
    forbidden_concepts: Vec<String>,
    #[serde(default)]
    events: Vec<CrisisEvent>,
    #[serde(default)]
    cards: Vec<Card>,
    #[serde(default)]
    recipes: Vec<Recipe>,
}

/// The validated catalog.
#[derive(Debug, Clone)]
pub struct Codex {
    version: u32,

    /// Eras sorted by campaign order.
    eras: Vec<Era>,

    /// All catalog cards, in declaration order.
    cards: Vec<Card>,

    /// Index: canonical card name -> first card with that name.
    card_by_name: HashMap<String, usize>,

    recipes: RecipeTable,
}

impl Codex {
    /// Parse and validate the embedded seven-era campaign.
    pub fn builtin() -> Result<Self, CodexError> {
        Self::from_toml_str(BUILTIN_CODEX)
    }

    /// Parse and validate a codex from TOML text.
    pub fn from_toml_str(toml_text: &str) -> Result<Self, CodexError> {
        let file: CodexFile = toml::from_str(toml_text)?;

        let mut eras = Vec::with_capacity(file.eras.len());
        let mut cards = Vec::new();
        let mut recipes = RecipeTable::new();

        let mut era_files = file.eras;
        era_files.sort_by_key(|era| era.order);

        for era_file in era_files {
            for card in era_file.cards {
                cards.push(card.with_era(era_file.name.clone()));
            }
            for recipe in era_file.recipes {
                recipes.push(era_file.name.clone(), recipe);
            }
            eras.push(Era {
                name: era_file.name,
                order: era_file.order,
                description: era_file.description,
                events: era_file.events,
                tech: TechLimits {
                    max_tier: era_file.max_tier,
                    forbidden_concepts: era_file.forbidden_concepts,
                },
            });
        }

        let mut codex = Self::from_parts(eras, cards, recipes)?;
        codex.version = file.version;
        Ok(codex)
    }

    /// Load a codex from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, CodexError> {
        let contents = fs::read_to_string(path).map_err(|source| CodexError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Assemble and validate a codex from already-built parts.
    ///
    /// Cards must carry their owning era.
    pub fn from_parts(
        mut eras: Vec<Era>,
        cards: Vec<Card>,
        recipes: RecipeTable,
    ) -> Result<Self, CodexError> {
        eras.sort_by_key(|era| era.order);

        let mut card_by_name = HashMap::new();
        for (index, card) in cards.iter().enumerate() {
            card_by_name.entry(canonical_name(&card.name)).or_insert(index);
        }

        let codex = Self {
            version: 0,
            eras,
            cards,
            card_by_name,
            recipes,
        };
        codex.validate()?;

        for ambiguity in codex.recipes.ambiguities() {
            warn!(
                era = %ambiguity.era,
                inputs = %ambiguity.key,
                winner = %ambiguity.winner,
                shadowed = %ambiguity.shadowed,
                "Ambiguous recipe inputs; the first recipe wins"
            );
        }

        Ok(codex)
    }

    fn validate(&self) -> Result<(), CodexError> {
        if self.eras.is_empty() {
            return Err(CodexError::NoEras);
        }

        let mut era_names = HashSet::new();
        let mut events = HashSet::new();
        for era in &self.eras {
            if !era_names.insert(era.name.as_str()) {
                return Err(CodexError::DuplicateEra(era.name.clone()));
            }
            for event in &era.events {
                if !events.insert(event.name.as_str()) {
                    return Err(CodexError::DuplicateEvent(event.name.clone()));
                }
            }
        }

        let known_event = |owner: &str, event: &str| -> Result<(), CodexError> {
            if events.contains(event) {
                Ok(())
            } else {
                Err(CodexError::UnknownEvent {
                    owner: owner.to_string(),
                    event: event.to_string(),
                })
            }
        };

        let mut seen_cards = HashSet::new();
        for card in &self.cards {
            if !era_names.contains(card.era.as_str()) {
                return Err(CodexError::UnknownEra {
                    owner: format!("card {}", card.name),
                    era: card.era.clone(),
                });
            }
            if !seen_cards.insert((card.era.as_str(), canonical_name(&card.name))) {
                return Err(CodexError::DuplicateCard {
                    era: card.era.clone(),
                    name: card.name.clone(),
                });
            }
            if !card.key_invariant_holds() {
                return Err(CodexError::InvalidKeyCard(card.name.clone()));
            }
            if let Some(event) = card.attrs.resolved_event() {
                known_event(&format!("card {}", card.name), event)?;
            }
            if let Some(UnlockCondition::Event(event)) = &card.unlock_condition {
                known_event(&format!("card {}", card.name), event)?;
            }
        }

        for entry in self.recipes.entries() {
            let output = &entry.recipe.output;
            let owner = format!("recipe for {}", output.name);
            if !era_names.contains(entry.era.as_str()) {
                return Err(CodexError::UnknownEra {
                    owner,
                    era: entry.era.clone(),
                });
            }
            if entry.recipe.inputs.len() < 2 {
                return Err(CodexError::RecipeTooSmall(output.name.clone()));
            }
            if output.attrs.key_card {
                let event = output
                    .attrs
                    .resolved_event()
                    .ok_or_else(|| CodexError::InvalidKeyCard(output.name.clone()))?;
                known_event(&owner, event)?;
            }
        }

        // An eventless era would be complete on entry and nothing could leave it
        if let Some(era) = self.eras.iter().find(|era| era.events.is_empty()) {
            return Err(CodexError::EraWithoutEvents(era.name.clone()));
        }

        Ok(())
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Eras in campaign order.
    pub fn eras(&self) -> &[Era] {
        &self.eras
    }

    pub fn era(&self, name: &str) -> Option<&Era> {
        self.eras.iter().find(|era| era.name == name)
    }

    /// The era every new player starts in.
    pub fn first_era(&self) -> &Era {
        // validate() guarantees at least one era
        &self.eras[0]
    }

    /// The era following `name`, or `None` at the end of the campaign.
    pub fn next_era(&self, name: &str) -> Option<&Era> {
        let position = self.eras.iter().position(|era| era.name == name)?;
        self.eras.get(position + 1)
    }

    /// The era that defines `event`.
    pub fn event_era(&self, event: &str) -> Option<&Era> {
        self.eras.iter().find(|era| era.defines_event(event))
    }

    pub fn recipes(&self) -> &RecipeTable {
        &self.recipes
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Look up a catalog card by name (first declaration wins).
    pub fn card(&self, name: &str) -> Option<&Card> {
        self.card_by_name
            .get(&canonical_name(name))
            .map(|&index| &self.cards[index])
    }

    /// All cards owned by `era`.
    pub fn era_cards<'a, 'b>(&'a self, era: &'b str) -> impl Iterator<Item = &'a Card> + 'b
    where
        'a: 'b,
    {
        self.cards.iter().filter(move |card| card.era == era)
    }

    /// Inspiration cards that become available on entering `era`, decoys included.
    pub fn era_inspirations(&self, era: &str) -> Vec<&Card> {
        self.era_cards(era)
            .filter(|card| card.card_type == CardKind::Inspiration)
            .collect()
    }

    /// Reward cards of `era` unlocked by `condition`.
    pub fn rewards_unlocked_by(&self, era: &str, condition: &UnlockCondition) -> Vec<&Card> {
        self.era_cards(era)
            .filter(|card| card.card_type == CardKind::Reward)
            .filter(|card| card.unlock_condition.as_ref() == Some(condition))
            .collect()
    }

    /// Cards flagged as part of every player's opening hand.
    pub fn starter_cards(&self) -> Vec<&Card> {
        self.cards.iter().filter(|card| card.is_starter).collect()
    }

    /// The opening hand of a new player: the first era's inspirations plus a
    /// second copy of every starter card.
    pub fn opening_hand(&self) -> Vec<Card> {
        let first = &self.first_era().name;
        self.era_inspirations(first)
            .into_iter()
            .chain(self.starter_cards())
            .cloned()
            .collect()
    }

    /// Check if `name` is a decoy card.
    pub fn is_decoy(&self, name: &str) -> bool {
        self.card(name).is_some_and(|card| card.is_decoy)
    }
}
