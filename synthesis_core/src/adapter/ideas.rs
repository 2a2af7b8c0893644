//! Naming and parsing helpers for assistant output.

use serde::Deserialize;

use super::{AdapterError, AiIdea};

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 16;

/// Derive a short card name from an idea description.
///
/// Takes the text before the first colon, then up to the first separator.
/// Returns `None` when the result is not between 2 and 16 characters.
pub fn derive_idea_name(results_text: &str) -> Option<String> {
    let head = results_text
        .split([':', '：'])
        .next()
        .unwrap_or(results_text);
    let candidate = head
        .split(|c: char| matches!(c, ',' | '，' | '、' | '。') || c.is_whitespace())
        .find(|segment| !segment.is_empty())
        .unwrap_or("")
        .trim();

    let chars = candidate.chars().count();
    (NAME_MIN_CHARS..=NAME_MAX_CHARS)
        .contains(&chars)
        .then(|| candidate.to_string())
}

/// Name used when nothing better is available: `A·B之造物`.
pub fn fallback_idea_name(input_names: &[String]) -> String {
    match input_names {
        [] => "未知造物".to_string(),
        [only] => format!("{only}的衍生体"),
        [first, .., last] => format!("{first}·{last}之造物"),
    }
}

/// The display name for an AI-built card.
///
/// A player-supplied name wins, then the idea's own name, then a name derived
/// from its description, then the fallback.
pub fn resolve_idea_name(
    name_override: Option<&str>,
    idea: &AiIdea,
    input_names: &[String],
) -> String {
    if let Some(name) = name_override.map(str::trim).filter(|name| !name.is_empty()) {
        return name.to_string();
    }
    let own = idea.name.trim();
    if !own.is_empty() {
        return own.to_string();
    }
    derive_idea_name(&idea.results_text).unwrap_or_else(|| fallback_idea_name(input_names))
}

/// Inputs rendered for a prompt: `「A」、「B」和「C」`.
pub fn format_combination(input_names: &[String]) -> String {
    let wrapped: Vec<String> = input_names.iter().map(|name| format!("「{name}」")).collect();
    match wrapped.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{}和{}", rest.join("、"), last),
    }
}

/// Strip a Markdown code fence around a JSON reply.
pub fn strip_code_fence(content: &str) -> &str {
    let text = content.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag, if any
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[derive(Debug, Deserialize)]
struct CombinationReply {
    #[serde(default)]
    combinations: Vec<Combination>,
}

#[derive(Debug, Deserialize)]
struct Combination {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    results: Option<String>,
    #[serde(default)]
    prompt: Option<String>,
}

/// Parse a `{"combinations": [{"results", "prompt"}]}` reply into ideas.
///
/// Entries without a description are skipped.
pub fn parse_combinations(
    content: &str,
    input_names: &[String],
) -> Result<Vec<AiIdea>, AdapterError> {
    let reply: CombinationReply = serde_json::from_str(strip_code_fence(content))
        .map_err(|err| AdapterError::InvalidResponse(err.to_string()))?;

    let ideas = reply
        .combinations
        .into_iter()
        .filter_map(|entry| {
            let results = entry.results.filter(|text| !text.trim().is_empty())?;
            let name = entry
                .name
                .filter(|name| !name.trim().is_empty())
                .or_else(|| derive_idea_name(&results))
                .unwrap_or_else(|| fallback_idea_name(input_names));
            Some(AiIdea {
                name,
                results_text: results,
                icon_prompt: entry.prompt.filter(|prompt| !prompt.trim().is_empty()),
            })
        })
        .collect();

    Ok(ideas)
}
