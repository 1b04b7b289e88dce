use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::settings::GameSettings;
use crate::engine::apply_narrative::apply_narrative;
use crate::engine::chance::EventRoller;
use crate::engine::economy::compute_costs;
use crate::engine::generation::{GenerationClient, GenerationError};
use crate::engine::llm_client::{Credential, GenerationBackend, GenerationRequest};
use crate::engine::prompt_builder::PromptBuilder;
use crate::model::event_result::TurnReport;
use crate::model::game_context::GameContext;
use crate::model::game_state::{GameState, Phase};

#[derive(Debug, Error)]
pub enum TurnError {
    #[error("the game has not been started")]
    NotStarted,

    #[error("the game is over ({0})")]
    Finished(Phase),

    #[error("empty action")]
    EmptyAction,

    #[error("the narrator could not produce this turn: {0}")]
    Generation(#[from] GenerationError),
}

/// Runs one player action through costs, chance, generation and commit.
pub struct TurnEngine<B> {
    client: GenerationClient<B>,
    settings: GameSettings,
    roller: EventRoller,
    rng: StdRng,
}

impl<B: GenerationBackend> TurnEngine<B> {
    pub fn new(backend: B, credentials: Vec<Credential>, settings: GameSettings) -> Self {
        let client = GenerationClient::new(backend, credentials, settings.generation.clone());
        Self {
            client,
            roller: EventRoller::new(settings.chance.probability),
            settings,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self.client = self.client.with_seed(seed);
        self
    }

    pub fn horizon(&self) -> u32 {
        self.settings.horizon
    }

    pub fn client(&self) -> &GenerationClient<B> {
        &self.client
    }

    /// Advances the game by one turn.
    ///
    /// The month's costs and any chance event hit `state` before the
    /// narrator is called and stay applied if generation fails: rent is due
    /// whether or not the story continues. Everything else (stats from the
    /// narrator, month, history) is committed only on success.
    pub fn advance_turn(&mut self, state: &mut GameState, player_input: &str) -> Result<TurnReport, TurnError> {
        match state.phase(self.settings.horizon) {
            Phase::InProgress => {}
            Phase::NotStarted => return Err(TurnError::NotStarted),
            finished => return Err(TurnError::Finished(finished)),
        }

        let player_input = player_input.trim();
        if player_input.is_empty() {
            return Err(TurnError::EmptyAction);
        }

        let costs = compute_costs(state.stats(), state.month(), &self.settings.economy);
        state.deduct(costs.total);
        info!(month = state.month(), total = costs.total, money = state.stats().money, "monthly costs deducted");

        let event = self.roller.roll(state.mode(), &mut self.rng);
        state.record_event(event.clone());

        let directive = {
            let Some(player) = state.player() else {
                return Err(TurnError::NotStarted);
            };
            let context = GameContext {
                mode: state.mode(),
                player,
                stats: state.stats(),
                month: state.month(),
                horizon: self.settings.horizon,
                costs: &costs,
                event: event.as_ref(),
            };
            PromptBuilder::build(&context)
        };

        let request = GenerationRequest::new(directive, state.history(), player_input);
        let response = self.client.generate(&request).map_err(|err| {
            warn!(error = %err, "turn failed; costs stay deducted");
            TurnError::Generation(err)
        })?;

        let (narrative, outcome) = apply_narrative(state, player_input, response, self.settings.horizon);

        Ok(TurnReport {
            costs,
            event,
            narrative,
            outcome,
        })
    }
}
