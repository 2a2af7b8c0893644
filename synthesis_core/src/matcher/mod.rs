//! Rule Matcher - deterministic recipe lookup.
//!
//! Matching works as follows:
//! 1. **Canonicalize**: Collapse whitespace and lowercase every input name
//! 2. **Key**: Sort the canonical names into a multiset key
//! 3. **Lookup**: Find the first declared recipe with exactly that key
//! 4. **Produce**: Instantiate an independent copy of the recipe output

use card_rules::{CanonicalKey, Card, Codex};
use std::sync::Arc;
use tracing::trace;

/// A successful recipe match.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeMatch {
    /// Fresh copy of the recipe output.
    pub card: Card,
    pub key: CanonicalKey,
    /// Era table the recipe was declared in.
    pub era: String,
}

/// Looks up deterministic recipes in the codex.
#[derive(Debug, Clone)]
pub struct RuleMatcher {
    codex: Arc<Codex>,
}

impl RuleMatcher {
    pub fn new(codex: Arc<Codex>) -> Self {
        Self { codex }
    }

    /// Match a multiset of card names against every era's recipes.
    ///
    /// Input order never matters; counts do. When two recipes share a key the
    /// one declared first wins. Returns `None` for fewer than two names.
    pub fn find<S: AsRef<str>>(&self, names: &[S]) -> Option<RecipeMatch> {
        if names.len() < 2 {
            return None;
        }

        let entry = self.codex.recipes().lookup(names)?;
        trace!(key = %entry.key(), output = %entry.recipe.output.name, "Recipe matched");

        Some(RecipeMatch {
            card: entry.produce(),
            key: entry.key().clone(),
            era: entry.era.clone(),
        })
    }

    /// Match only against the recipes declared for `era`.
    pub fn find_in_era<S: AsRef<str>>(&self, era: &str, names: &[S]) -> Option<RecipeMatch> {
        if names.len() < 2 {
            return None;
        }

        let entry = self.codex.recipes().lookup_in_era(era, names)?;
        Some(RecipeMatch {
            card: entry.produce(),
            key: entry.key().clone(),
            era: entry.era.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use card_rules::{CardKind, CardTemplate, Era, Recipe, RecipeTable};
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn builtin() -> Arc<Codex> {
        Arc::new(Codex::builtin().unwrap())
    }

    fn builtin_inputs() -> Vec<Vec<String>> {
        builtin()
            .recipes()
            .entries()
            .iter()
            .map(|entry| entry.recipe.inputs.clone())
            .collect()
    }

    #[test]
    fn test_fire_recipe() {
        let matcher = RuleMatcher::new(builtin());
        let matched = matcher.find(&["木头", "石头"]).unwrap();

        assert_eq!(matched.card.name, "火");
        assert_eq!(matched.card.tier, 2);
        assert_eq!(matched.card.card_type, CardKind::Key);
        assert_eq!(matched.card.attrs.resolved_event(), Some("寒冷"));
        assert_eq!(matched.era, "生存时代");
        assert_eq!(matched.key, CanonicalKey::from_names(["石头", "木头"]));
    }

    #[test]
    fn test_order_and_spacing_do_not_matter() {
        let matcher = RuleMatcher::new(builtin());
        let a = matcher.find(&["石头", "木头"]).unwrap();
        let b = matcher.find(&[" 木头 ", "石头"]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_counts_matter() {
        let matcher = RuleMatcher::new(builtin());
        assert!(matcher.find(&["人", "人"]).is_none());
        assert!(matcher.find(&["木头", "石头", "石头"]).is_none());
        assert!(matcher.find(&["木头"]).is_none());
    }

    #[test]
    fn test_outputs_are_independent_copies() {
        let matcher = RuleMatcher::new(builtin());
        let mut first = matcher.find(&["木头", "石头"]).unwrap();
        first.card.attrs.extra.insert("burnt".into(), true.into());

        let second = matcher.find(&["木头", "石头"]).unwrap();
        assert!(!second.card.attrs.extra.contains_key("burnt"));
    }

    #[test]
    fn test_shipped_table_has_no_duplicate_keys_per_era() {
        let codex = builtin();
        assert!(codex.recipes().ambiguities().is_empty());

        let mut seen = HashSet::new();
        for entry in codex.recipes().entries() {
            assert!(
                seen.insert((entry.era.clone(), entry.key().clone())),
                "duplicate recipe {} in {}",
                entry.key(),
                entry.era
            );
        }
    }

    #[test]
    fn test_every_recipe_matches_its_own_output() {
        let codex = builtin();
        let matcher = RuleMatcher::new(codex.clone());
        for entry in codex.recipes().entries() {
            let matched = matcher.find(&entry.recipe.inputs).unwrap();
            assert_eq!(matched.card.name, entry.recipe.output.name);
            assert_eq!(matched.card.tier, entry.recipe.output.tier);
            assert_eq!(matched.card.attrs, entry.recipe.output.attrs);
        }
    }

    #[test]
    fn test_first_declared_recipe_wins() {
        let mut table = RecipeTable::new();
        let template = |name: &str| CardTemplate {
            name: name.into(),
            tier: 2,
            attrs: Default::default(),
        };
        table.push("生存时代", Recipe::new(["人", "水"], template("汗水")));
        table.push("生存时代", Recipe::new(["水", "人"], template("泪水")));

        let eras = vec![Era::new("生存时代", 1).with_event("寒冷")];
        let codex = Codex::from_parts(eras, Vec::new(), table).unwrap();
        let matcher = RuleMatcher::new(Arc::new(codex));

        assert_eq!(matcher.find(&["人", "水"]).unwrap().card.name, "汗水");
    }

    #[test]
    fn test_find_in_era() {
        let matcher = RuleMatcher::new(builtin());
        assert!(matcher.find_in_era("生存时代", &["木头", "石头"]).is_some());
        assert!(matcher.find_in_era("城邦时代", &["木头", "石头"]).is_none());
    }

    fn recipe_permutations() -> impl Strategy<Value = (usize, Vec<String>)> {
        let all = builtin_inputs();
        (0..all.len()).prop_flat_map(move |index| {
            (Just(index), Just(all[index].clone()).prop_shuffle())
        })
    }

    proptest! {
        #[test]
        fn prop_any_permutation_matches_the_recipe((index, shuffled) in recipe_permutations()) {
            let codex = builtin();
            let matcher = RuleMatcher::new(codex.clone());
            let entry = &codex.recipes().entries()[index];

            let matched = matcher.find(&shuffled).unwrap();
            prop_assert_eq!(matched.card.name, entry.recipe.output.name.clone());
            prop_assert_eq!(&matched.key, entry.key());
        }

        #[test]
        fn prop_unknown_names_never_match(suffix in "[a-z]{3,8}") {
            let matcher = RuleMatcher::new(builtin());
            let names = vec![format!("木头{suffix}"), "石头".to_string()];
            prop_assert!(matcher.find(&names).is_none());
        }
    }
}
