use serde::{Deserialize, Serialize};

use crate::engine::economy::CostBreakdown;
use crate::model::chance_event::ChanceEvent;
use crate::model::narrative::NarrativeResponse;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnOutcome {
    Continue,
    Won,
    Lost { reason: String },
}

/// What one committed turn did, for the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnReport {
    pub costs: CostBreakdown,
    pub event: Option<ChanceEvent>,
    /// The payload as stored in history (post-turn stats and month)
    pub narrative: NarrativeResponse,
    pub outcome: TurnOutcome,
}
