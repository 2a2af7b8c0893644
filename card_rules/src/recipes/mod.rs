//! Recipe table - deterministic fusion rules, organized by era.
//!
//! Recipes are keyed by the canonical form of their input multiset:
//! each name is whitespace-collapsed and lowercased, then the list is sorted.
//! Order of inputs never matters, the number of copies always does.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::cards::{Card, CardAttrs, CardKind, Rarity};

/// Normalize a card name for comparison.
pub fn canonical_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Sorted, normalized input multiset of a fusion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanonicalKey(Vec<String>);

impl CanonicalKey {
    /// Build the canonical key of a sequence of card names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = names
            .into_iter()
            .map(|name| canonical_name(name.as_ref()))
            .collect();
        names.sort();
        Self(names)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl std::fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("+"))
    }
}

/// Output side of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardTemplate {
    pub name: String,
    pub tier: u32,
    #[serde(default)]
    pub attrs: CardAttrs,
}

impl CardTemplate {
    /// Produce a fresh card owned by `era`.
    ///
    /// Tier and attrs come from the template verbatim, never from the inputs.
    pub fn instantiate(&self, era: &str) -> Card {
        let key = self.attrs.key_card;
        Card {
            card_type: if key { CardKind::Key } else { CardKind::Inspiration },
            rarity: if key { Rarity::Ruby } else { Rarity::Common },
            ..Card::new(self.name.clone(), self.tier)
                .with_era(era)
                .with_attrs(self.attrs.clone())
        }
    }
}

/// A deterministic fusion rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Two or more card names; duplicates allowed.
    pub inputs: Vec<String>,
    pub output: CardTemplate,
}

impl Recipe {
    pub fn new<I, S>(inputs: I, output: CardTemplate) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            output,
        }
    }

    pub fn key(&self) -> CanonicalKey {
        CanonicalKey::from_names(&self.inputs)
    }
}

/// A recipe together with the era table it was declared in.
#[derive(Debug, Clone)]
pub struct RecipeEntry {
    pub era: String,
    pub recipe: Recipe,
    key: CanonicalKey,
}

impl RecipeEntry {
    pub fn key(&self) -> &CanonicalKey {
        &self.key
    }

    /// Instantiate the output as an independent card.
    pub fn produce(&self) -> Card {
        self.recipe.output.instantiate(&self.era)
    }
}

/// Two recipes of the same era sharing one canonical key.
///
/// The first one declared wins at lookup time; the second is unreachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ambiguity {
    pub era: String,
    pub key: CanonicalKey,
    pub winner: String,
    pub shadowed: String,
}

/// The full recipe catalog, in table order (era order, then declaration order).
#[derive(Debug, Clone, Default)]
pub struct RecipeTable {
    entries: Vec<RecipeEntry>,

    /// Index: canonical key -> first entry with that key.
    by_key: HashMap<CanonicalKey, usize>,
}

impl RecipeTable {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a recipe to the end of the table.
    pub fn push(&mut self, era: impl Into<String>, recipe: Recipe) {
        let key = recipe.key();
        let index = self.entries.len();
        self.by_key.entry(key.clone()).or_insert(index);
        self.entries.push(RecipeEntry {
            era: era.into(),
            recipe,
            key,
        });
    }

    /// Find the first recipe whose input multiset equals `names`.
    pub fn lookup<S: AsRef<str>>(&self, names: &[S]) -> Option<&RecipeEntry> {
        let key = CanonicalKey::from_names(names);
        self.by_key.get(&key).map(|&index| &self.entries[index])
    }

    /// Find the first recipe of one era's table whose input multiset equals `names`.
    pub fn lookup_in_era<S: AsRef<str>>(&self, era: &str, names: &[S]) -> Option<&RecipeEntry> {
        let key = CanonicalKey::from_names(names);
        self.entries
            .iter()
            .find(|entry| entry.era == era && entry.key == key)
    }

    /// All recipes declared for `era`.
    pub fn era_recipes<'a>(&'a self, era: &'a str) -> impl Iterator<Item = &'a RecipeEntry> + 'a {
        self.entries.iter().filter(move |entry| entry.era == era)
    }

    pub fn entries(&self) -> &[RecipeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Same-era recipes that share a canonical key.
    pub fn ambiguities(&self) -> Vec<Ambiguity> {
        let mut first_seen: HashMap<(&str, &CanonicalKey), &RecipeEntry> = HashMap::new();
        let mut found = Vec::new();

        for entry in &self.entries {
            match first_seen.get(&(entry.era.as_str(), &entry.key)) {
                Some(winner) => found.push(Ambiguity {
                    era: entry.era.clone(),
                    key: entry.key.clone(),
                    winner: winner.recipe.output.name.clone(),
                    shadowed: entry.recipe.output.name.clone(),
                }),
                None => {
                    first_seen.insert((entry.era.as_str(), &entry.key), entry);
                }
            }
        }

        found
    }
}
