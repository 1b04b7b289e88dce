use std::sync::mpsc::{Receiver, Sender};

use tracing::{debug, info};

use crate::engine::llm_client::GenerationBackend;
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::engine::turn::TurnEngine;
use crate::model::game_state::GameState;

/// Owns one session's state and serves commands one at a time, so at most
/// one turn is ever in flight per session.
pub struct Engine<B> {
    rx: Receiver<EngineCommand>,
    tx: Sender<EngineResponse>,
    turns: TurnEngine<B>,
    game_state: GameState,
}

impl<B: GenerationBackend> Engine<B> {
    pub fn new(rx: Receiver<EngineCommand>, tx: Sender<EngineResponse>, turns: TurnEngine<B>) -> Self {
        Self {
            rx,
            tx,
            turns,
            game_state: GameState::default(),
        }
    }

    pub fn run(&mut self) {
        while let Ok(cmd) = self.rx.recv() {
            let response = self.handle(cmd);
            if self.tx.send(response).is_err() {
                debug!("presentation hung up, stopping engine");
                break;
            }
        }
    }

    fn handle(&mut self, cmd: EngineCommand) -> EngineResponse {
        match cmd {
            EngineCommand::StartGame { player, mode } => {
                info!(player = %player.name, %mode, "starting game");
                self.game_state = GameState::start(player, mode);
                EngineResponse::StateChanged(Box::new(self.game_state.clone()))
            }

            EngineCommand::SubmitAction(text) => match self.turns.advance_turn(&mut self.game_state, &text) {
                Ok(report) => EngineResponse::TurnCompleted {
                    report: Box::new(report),
                    state: Box::new(self.game_state.clone()),
                },
                Err(err) => EngineResponse::TurnFailed {
                    error: err.to_string(),
                    state: Box::new(self.game_state.clone()),
                },
            },

            EngineCommand::Reset => {
                self.game_state.reset();
                EngineResponse::StateChanged(Box::new(self.game_state.clone()))
            }
        }
    }
}
