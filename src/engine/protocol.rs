use crate::model::event_result::TurnReport;
use crate::model::game_state::GameState;
use crate::model::mode::GameMode;
use crate::model::player::PlayerProfile;

pub enum EngineCommand {
    StartGame { player: PlayerProfile, mode: GameMode },
    SubmitAction(String),
    /// "Play again"
    Reset,
}

pub enum EngineResponse {
    TurnCompleted {
        report: Box<TurnReport>,
        state: Box<GameState>,
    },

    /// The action was not consumed; the player may retry it.
    TurnFailed {
        error: String,
        state: Box<GameState>,
    },

    StateChanged(Box<GameState>),
}
