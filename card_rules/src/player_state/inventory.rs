//! Player inventory - a multiset of physical card instances.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::cards::{Card, CardInstanceId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("card instance {0} is not held")]
    NotHeld(CardInstanceId),
    #[error("card instance {0} is referenced more than once")]
    DuplicateReference(CardInstanceId),
}

/// Cards held by one player, keyed by instance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Inventory {
    cards: BTreeMap<CardInstanceId, Card>,
}

impl Inventory {
    /// Create a new empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one copy of a card and return its instance ID.
    pub fn add(&mut self, card: Card) -> CardInstanceId {
        let id = CardInstanceId::new();
        self.cards.insert(id, card);
        id
    }

    /// Get the card behind an instance.
    pub fn get(&self, id: CardInstanceId) -> Option<&Card> {
        self.cards.get(&id)
    }

    pub fn contains(&self, id: CardInstanceId) -> bool {
        self.cards.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Number of held copies of the named card.
    pub fn count_of(&self, name: &str) -> usize {
        self.cards.values().filter(|card| card.name == name).count()
    }

    /// Instance IDs of every held copy of the named card.
    pub fn instances_of(&self, name: &str) -> Vec<CardInstanceId> {
        self.cards
            .iter()
            .filter(|(_, card)| card.name == name)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CardInstanceId, &Card)> {
        self.cards.iter()
    }

    /// Look up every referenced instance, in request order.
    pub fn resolve(&self, ids: &[CardInstanceId]) -> Result<Vec<&Card>, InventoryError> {
        check_distinct(ids)?;
        ids.iter()
            .map(|id| self.cards.get(id).ok_or(InventoryError::NotHeld(*id)))
            .collect()
    }

    /// Remove exactly the referenced instances.
    ///
    /// Nothing is removed unless every instance is held.
    pub fn consume(&mut self, ids: &[CardInstanceId]) -> Result<Vec<Card>, InventoryError> {
        self.resolve(ids)?;
        Ok(ids
            .iter()
            .filter_map(|id| self.cards.remove(id))
            .collect())
    }
}

fn check_distinct(ids: &[CardInstanceId]) -> Result<(), InventoryError> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(*id) {
            return Err(InventoryError::DuplicateReference(*id));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_removes_only_referenced_copies() {
        let mut inventory = Inventory::new();
        let a = inventory.add(Card::new("人", 1));
        let b = inventory.add(Card::new("人", 1));
        let _c = inventory.add(Card::new("人", 1));
        assert_eq!(inventory.count_of("人"), 3);

        let consumed = inventory.consume(&[a, b]).unwrap();
        assert_eq!(consumed.len(), 2);
        assert_eq!(inventory.count_of("人"), 1);
        assert!(!inventory.contains(a));
    }

    #[test]
    fn test_consume_is_all_or_nothing() {
        let mut inventory = Inventory::new();
        let held = inventory.add(Card::new("木头", 1));
        let missing = CardInstanceId::new();

        let err = inventory.consume(&[held, missing]).unwrap_err();
        assert_eq!(err, InventoryError::NotHeld(missing));
        assert!(inventory.contains(held));
    }

    #[test]
    fn test_consume_twice_fails() {
        let mut inventory = Inventory::new();
        let a = inventory.add(Card::new("木头", 1));
        let b = inventory.add(Card::new("石头", 1));

        inventory.consume(&[a, b]).unwrap();
        assert_eq!(inventory.consume(&[a, b]), Err(InventoryError::NotHeld(a)));
    }

    #[test]
    fn test_duplicate_reference_rejected() {
        let mut inventory = Inventory::new();
        let a = inventory.add(Card::new("人", 1));
        assert_eq!(
            inventory.resolve(&[a, a]).unwrap_err(),
            InventoryError::DuplicateReference(a)
        );
    }

    #[test]
    fn test_instances_of() {
        let mut inventory = Inventory::new();
        let a = inventory.add(Card::new("人", 1));
        inventory.add(Card::new("石头", 1));
        assert_eq!(inventory.instances_of("人"), vec![a]);
    }
}
