use crate::engine::economy::CostBreakdown;
use crate::model::chance_event::ChanceEvent;
use crate::model::game_state::Stats;
use crate::model::mode::GameMode;
use crate::model::player::PlayerProfile;

/// What the directive is built from for one turn. Stats are already
/// post-deduction and post-event.
#[derive(Debug, Clone)]
pub struct GameContext<'a> {
    pub mode: GameMode,
    pub player: &'a PlayerProfile,
    pub stats: &'a Stats,
    pub month: u32,
    pub horizon: u32,
    pub costs: &'a CostBreakdown,
    pub event: Option<&'a ChanceEvent>,
}
