use serde::{Deserialize, Serialize};

use crate::model::game_state::StatKey;

/// A scripted exogenous event that fired this turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChanceEvent {
    pub title: String,
    pub description: String,
    pub stat: StatKey,
    pub delta: i64,
}
