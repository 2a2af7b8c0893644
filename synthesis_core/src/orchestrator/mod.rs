//! Synthesis Orchestrator - runs one fusion attempt end to end.
//!
//! An attempt goes through these steps:
//! 1. **Validate**: At least two distinct held cards, within the input limit
//! 2. **Match**: Deterministic recipes always win, in either mode
//! 3. **Delegate**: In AI mode, ask the assistant; degrade to a placeholder
//! 4. **Preview**: Return the result without touching state, or
//! 5. **Commit**: Consume inputs, add the output and update era progress
//!    as one unit under the player's lock
//!
//! Cards unlocked by a commit are queued on the player and delivered by
//! [`SynthesisEngine::claim_unlocks`], unless `grant_unlocks` adds them at once.

mod attempt;
mod outputs;

pub use attempt::*;
pub use outputs::*;

use card_rules::{
    CanonicalKey, Card, CardInstanceId, Codex, InventoryError, PlayerId, PlayerState,
    SynthesisRecord, SynthesisSource,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::adapter::{propose_within, AdapterError, AiAdapter, AiIdea};
use crate::config::{ConfigError, EngineConfig};
use crate::contract::{SynthesisMode, SynthesisRequest, SynthesisResponse};
use crate::error::SynthesisError;
use crate::matcher::RuleMatcher;
use crate::progression::{EraTracker, ProgressionEffect};
use crate::repository::CardRepository;

/// A resolved output, before preview or commit.
#[derive(Debug, Clone)]
struct Proposal {
    output: Card,
    ideas: Option<Vec<AiIdea>>,
    source: SynthesisSource,
    key: CanonicalKey,
}

impl Proposal {
    fn into_response(
        self,
        era: String,
        preview: bool,
        instance: Option<CardInstanceId>,
        effect: Option<ProgressionEffect>,
    ) -> SynthesisResponse {
        SynthesisResponse {
            degraded: self.source == SynthesisSource::Placeholder,
            output: self.output,
            ideas: self.ideas,
            progression: effect.filter(|effect| !effect.is_inert()),
            preview,
            source: self.source,
            era,
            instance,
            phases: Vec::new(),
        }
    }
}

/// The card synthesis engine.
pub struct SynthesisEngine<R> {
    codex: Arc<Codex>,
    matcher: RuleMatcher,
    tracker: EraTracker,
    adapter: Arc<dyn AiAdapter>,
    repository: R,
    config: EngineConfig,
}

impl<R: CardRepository> SynthesisEngine<R> {
    /// Create an engine with the default configuration.
    pub fn new(codex: Arc<Codex>, repository: R, adapter: Arc<dyn AiAdapter>) -> Self {
        Self {
            matcher: RuleMatcher::new(codex.clone()),
            tracker: EraTracker::new(codex.clone()),
            codex,
            adapter,
            repository,
            config: EngineConfig::default(),
        }
    }

    /// Replace the configuration, rejecting invalid settings.
    pub fn with_config(mut self, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn codex(&self) -> &Codex {
        &self.codex
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one synthesis attempt for `player`.
    ///
    /// Previews never change state. A commit either applies completely or
    /// not at all.
    #[instrument(
        name = "synthesize",
        skip(self, request),
        fields(mode = ?request.mode, preview = request.preview, inputs = request.inputs.len())
    )]
    pub async fn synthesize(
        &self,
        player: PlayerId,
        request: SynthesisRequest,
    ) -> Result<SynthesisResponse, SynthesisError> {
        let mut attempt = Attempt::new();
        match self.run(&mut attempt, player, &request).await {
            Ok(mut response) => {
                response.phases = attempt.into_trail();
                Ok(response)
            }
            Err(err) => {
                attempt.fail(&err);
                Err(err)
            }
        }
    }

    /// Deliver every card unlocked by earlier commits into `player`'s inventory.
    ///
    /// Each unlock is delivered once; a second call returns nothing new.
    #[instrument(name = "claim_unlocks", skip(self))]
    pub async fn claim_unlocks(
        &self,
        player: PlayerId,
    ) -> Result<Vec<CardInstanceId>, SynthesisError> {
        let claimed = self
            .repository
            .transact(player, |state: &mut PlayerState| {
                Ok::<_, SynthesisError>(state.claim_grants())
            })
            .await?;
        if !claimed.is_empty() {
            info!(
                target: "forge::synthesis",
                %player,
                cards = claimed.len(),
                "synthesis.unlocks.claimed"
            );
        }
        Ok(claimed)
    }

    async fn run(
        &self,
        attempt: &mut Attempt,
        player: PlayerId,
        request: &SynthesisRequest,
    ) -> Result<SynthesisResponse, SynthesisError> {
        let (state, inputs) = self.receive(player, request).await?;
        let names: Vec<String> = inputs.iter().map(|card| card.name.clone()).collect();
        let era_name = state.progress.active_era;

        attempt.advance(AttemptPhase::Matching);
        let proposal = match self.matcher.find(&names) {
            Some(matched) => {
                attempt.advance(AttemptPhase::Resolved);
                Proposal {
                    output: matched.card,
                    ideas: None,
                    source: SynthesisSource::Recipe,
                    key: matched.key,
                }
            }
            None if request.mode == SynthesisMode::Deterministic => {
                return Err(SynthesisError::NoRecipe(names.join("+")));
            }
            None => {
                attempt.advance(AttemptPhase::Delegating);
                let context = OutputContext {
                    inputs: &inputs,
                    input_names: &names,
                    era_name: &era_name,
                    era: self.codex.era(&era_name),
                    name_override: request.name.as_deref(),
                };
                self.delegate(context).await?
            }
        };

        if request.preview {
            attempt.advance(AttemptPhase::Previewed);
            attempt.advance(AttemptPhase::Done);
            return Ok(proposal.into_response(era_name, true, None, None));
        }

        let (instance, effect) = self
            .commit(player, request.inputs.clone(), &names, &era_name, &proposal)
            .await?;
        attempt.advance(AttemptPhase::Committed);
        info!(
            target: "forge::synthesis",
            %player,
            output = %proposal.output.name,
            source = ?proposal.source,
            inputs = %proposal.key,
            "synthesis.committed"
        );
        attempt.advance(AttemptPhase::Done);

        Ok(proposal.into_response(era_name, false, Some(instance), Some(effect)))
    }

    /// Validate the request against a snapshot of the player's state.
    async fn receive(
        &self,
        player: PlayerId,
        request: &SynthesisRequest,
    ) -> Result<(PlayerState, Vec<Card>), SynthesisError> {
        let count = request.inputs.len();
        if count < 2 {
            return Err(SynthesisError::InvalidInput(format!(
                "a fusion needs at least two cards, got {count}"
            )));
        }
        if count > self.config.max_inputs {
            return Err(SynthesisError::InvalidInput(format!(
                "a fusion takes at most {} cards, got {count}",
                self.config.max_inputs
            )));
        }

        let state = self.repository.snapshot(player).await?;
        let inputs: Vec<Card> = state
            .inventory
            .resolve(&request.inputs)
            .map_err(|err| SynthesisError::InvalidInput(err.to_string()))?
            .into_iter()
            .cloned()
            .collect();

        Ok((state, inputs))
    }

    /// Ask the assistant for an output; fall back to a placeholder unless strict.
    async fn delegate(&self, context: OutputContext<'_>) -> Result<Proposal, SynthesisError> {
        let key = CanonicalKey::from_names(context.input_names);
        let timeout = self.config.adapter_timeout();

        let proposed = propose_within(self.adapter.as_ref(), context.input_names, timeout).await;
        let ideas = match proposed {
            Ok(ideas) => ideas,
            Err(err) if self.config.strict_ai => return Err(err.into()),
            Err(err) => {
                warn!(
                    target: "forge::synthesis",
                    error = %err,
                    inputs = %key,
                    "synthesis.adapter.degraded"
                );
                Vec::new()
            }
        };
        let ideas = screen_ideas(ideas, context.era);

        match ideas.first().cloned() {
            Some(primary) => Ok(Proposal {
                output: context.ai_card(&primary, &ideas, self.config.max_ai_tier),
                ideas: Some(ideas),
                source: SynthesisSource::Ai,
                key,
            }),
            None if self.config.strict_ai => Err(AdapterError::NoIdeas.into()),
            None => Ok(Proposal {
                output: context.placeholder_card(),
                ideas: Some(ideas),
                source: SynthesisSource::Placeholder,
                key,
            }),
        }
    }

    /// Consume the inputs and store the output in one transaction.
    async fn commit(
        &self,
        player: PlayerId,
        inputs: Vec<CardInstanceId>,
        names: &[String],
        era_name: &str,
        proposal: &Proposal,
    ) -> Result<(CardInstanceId, ProgressionEffect), SynthesisError> {
        let output = proposal.output.clone();
        let tracker = self.tracker.clone();
        let grant_unlocks = self.config.grant_unlocks;
        let record = SynthesisRecord {
            inputs: names.to_vec(),
            output: output.name.clone(),
            source: proposal.source,
            era: era_name.to_string(),
            recipe_key: proposal.key.clone(),
        };

        self.repository
            .transact(player, move |state: &mut PlayerState| -> Result<_, SynthesisError> {
                // Inputs held at validation time may have been consumed since
                state.inventory.consume(&inputs).map_err(|err| match err {
                    InventoryError::NotHeld(id) => SynthesisError::ConcurrencyConflict(id),
                    InventoryError::DuplicateReference(_) => {
                        SynthesisError::InvalidInput(err.to_string())
                    }
                })?;

                let effect = tracker.on_card_produced(&mut state.progress, &output);
                let instance = state.inventory.add(output);
                let unlocked = tracker.unlocked_cards(&effect);
                if grant_unlocks {
                    for card in unlocked {
                        state.inventory.add(card);
                    }
                } else {
                    state.pending_grants.extend(unlocked);
                }
                state.record(record);

                Ok((instance, effect))
            })
            .await
    }
}
