//! Output cards built when no recipe applies.

use card_rules::{Card, CardAttrs, Era};
use tracing::debug;

use crate::adapter::{resolve_idea_name, AiIdea};

/// Tier of an AI-invented card: one above the rounded-up mean input tier,
/// capped at `max_ai_tier`.
pub fn ai_tier(inputs: &[Card], max_ai_tier: u32) -> u32 {
    if inputs.is_empty() {
        return 1;
    }
    let count = inputs.len() as u32;
    let total: u32 = inputs.iter().map(|card| card.tier.max(1)).sum();
    let mean = (total + count - 1) / count;
    (mean + 1).min(max_ai_tier)
}

/// Tier of a placeholder: one above the highest input tier.
pub fn placeholder_tier(inputs: &[Card]) -> u32 {
    inputs.iter().map(|card| card.tier).max().unwrap_or(0) + 1
}

/// Drop ideas that mention a concept the era has not discovered yet.
pub fn screen_ideas(ideas: Vec<AiIdea>, era: Option<&Era>) -> Vec<AiIdea> {
    let Some(era) = era else {
        return ideas;
    };
    ideas
        .into_iter()
        .filter(|idea| {
            let concept = era
                .forbidden_concept_in(&idea.name)
                .or_else(|| era.forbidden_concept_in(&idea.results_text));
            if let Some(concept) = concept {
                debug!(
                    target: "forge::synthesis",
                    idea = %idea.name,
                    concept,
                    era = %era.name,
                    "synthesis.idea.anachronistic"
                );
            }
            concept.is_none()
        })
        .collect()
}

/// What a non-recipe output is built from.
#[derive(Debug, Clone, Copy)]
pub struct OutputContext<'a> {
    pub inputs: &'a [Card],
    pub input_names: &'a [String],
    /// Active era of the player; owns the output.
    pub era_name: &'a str,
    /// Tech limits of the active era, when the codex knows it.
    pub era: Option<&'a Era>,
    /// Player-chosen output name.
    pub name_override: Option<&'a str>,
}

impl OutputContext<'_> {
    /// Card built from the first usable idea.
    pub fn ai_card(&self, primary: &AiIdea, ideas: &[AiIdea], max_ai_tier: u32) -> Card {
        let tier = ai_tier(self.inputs, max_ai_tier);
        let tier = self.era.map_or(tier, |era| era.clamp_tier(tier));

        let mut attrs = CardAttrs::default().with_extra("source", "ai");
        let icon_prompts: Vec<&str> = ideas
            .iter()
            .filter_map(|idea| idea.icon_prompt.as_deref())
            .collect();
        if !icon_prompts.is_empty() {
            attrs = attrs.with_extra("iconPrompts", icon_prompts);
        }

        let name = resolve_idea_name(self.name_override, primary, self.input_names);
        Card {
            description: Some(primary.results_text.clone()),
            ..Card::new(name, tier).with_era(self.era_name).with_attrs(attrs)
        }
    }

    /// Local fallback when the assistant gives nothing usable.
    ///
    /// Named after its inputs joined with `+`, unless the player chose a name.
    pub fn placeholder_card(&self) -> Card {
        let name = self
            .name_override
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map_or_else(|| self.input_names.join("+"), str::to_string);

        Card::new(name, placeholder_tier(self.inputs)).with_era(self.era_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use card_rules::TechLimits;

    fn cards(tiers: &[u32]) -> Vec<Card> {
        tiers.iter().map(|&tier| Card::new("卡", tier)).collect()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn survival() -> Era {
        Era::new("生存时代", 1).with_tech(TechLimits {
            max_tier: Some(2),
            forbidden_concepts: vec!["电力".into(), "机器".into()],
        })
    }

    #[test]
    fn test_ai_tier() {
        assert_eq!(ai_tier(&cards(&[1, 1]), 10), 2);
        assert_eq!(ai_tier(&cards(&[1, 2]), 10), 3);
        assert_eq!(ai_tier(&cards(&[4, 5, 5]), 10), 6);
        assert_eq!(ai_tier(&cards(&[9, 10]), 10), 10);
    }

    #[test]
    fn test_placeholder_tier() {
        assert_eq!(placeholder_tier(&cards(&[1, 1])), 2);
        assert_eq!(placeholder_tier(&cards(&[1, 3, 2])), 4);
    }

    #[test]
    fn test_screen_ideas() {
        let ideas = vec![
            AiIdea::new("发电机", "利用电力的机器"),
            AiIdea::new("石斧", "锋利的工具"),
        ];
        let era = survival();

        let kept = screen_ideas(ideas.clone(), Some(&era));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "石斧");

        assert_eq!(screen_ideas(ideas, None).len(), 2);
    }

    #[test]
    fn test_ai_card_clamps_tier_to_era() {
        let era = survival();
        let inputs = cards(&[3, 4]);
        let input_names = names(&["甲", "乙"]);
        let context = OutputContext {
            inputs: &inputs,
            input_names: &input_names,
            era_name: "生存时代",
            era: Some(&era),
            name_override: None,
        };
        let mut idea = AiIdea::new("巨石阵", "巨石阵：神秘的石圈");
        idea.icon_prompt = Some("stone circle".into());

        let card = context.ai_card(&idea, &[idea.clone()], 10);

        assert_eq!(card.name, "巨石阵");
        assert_eq!(card.tier, 2);
        assert_eq!(card.era, "生存时代");
        assert!(!card.attrs.key_card);
        assert_eq!(card.attrs.extra["source"], "ai");
        assert_eq!(card.attrs.extra["iconPrompts"], serde_json::json!(["stone circle"]));
        assert_eq!(card.description.as_deref(), Some("巨石阵：神秘的石圈"));
    }

    #[test]
    fn test_ai_card_name_override() {
        let inputs = cards(&[1, 1]);
        let input_names = names(&["人", "人"]);
        let context = OutputContext {
            inputs: &inputs,
            input_names: &input_names,
            era_name: "生存时代",
            era: None,
            name_override: Some("我的部落"),
        };

        let idea = AiIdea::new("部族", "部族：团结");
        assert_eq!(context.ai_card(&idea, &[], 10).name, "我的部落");
    }

    #[test]
    fn test_placeholder_card() {
        let inputs = cards(&[1, 1, 1]);
        let input_names = names(&["人", "水", "火"]);
        let mut context = OutputContext {
            inputs: &inputs,
            input_names: &input_names,
            era_name: "生存时代",
            era: None,
            name_override: None,
        };

        let card = context.placeholder_card();
        assert_eq!(card.name, "人+水+火");
        assert_eq!(card.tier, 2);
        assert_eq!(card.attrs, CardAttrs::default());

        context.name_override = Some("泥人");
        assert_eq!(context.placeholder_card().name, "泥人");
    }
}
