use tracing::{info, warn};

use crate::model::event_result::TurnOutcome;
use crate::model::game_state::GameState;
use crate::model::message::HistoryEntry;
use crate::model::narrative::{NarrativeResponse, StatsUpdate};

const GENERIC_LOSS: &str = "The company collapsed.";

/// Commits a validated narrator payload: stats, month and history move
/// together or not at all. Returns the payload as stored.
///
/// The month always advances by exactly one; the narrator's month is only
/// checked and logged.
pub fn apply_narrative(
    state: &mut GameState,
    player_input: &str,
    mut response: NarrativeResponse,
    horizon: u32,
) -> (NarrativeResponse, TurnOutcome) {
    response.stats.merge_into(state.stats_mut());

    let expected = state.month() + 1;
    if response.month != expected {
        warn!(claimed = response.month, expected, "narrator month disagrees, using engine month");
    }
    state.advance_month();

    // The narrator's word on game over is taken, but the numbers win when
    // it says the game goes on.
    let engine_loss = state.stats().loss_reason();
    let lost = response.game_over || engine_loss.is_some();
    if lost {
        let reason = if !response.game_over_reason.trim().is_empty() {
            response.game_over_reason.trim().to_string()
        } else {
            engine_loss.unwrap_or(GENERIC_LOSS).to_string()
        };
        response.game_over = true;
        response.game_over_reason = reason;
    }

    response.month = state.month();
    response.stats = StatsUpdate::from(state.stats());

    let payload = serde_json::to_string(&response).unwrap_or_else(|_| response.text.clone());
    state.push_history(HistoryEntry::participant(player_input));
    state.push_history(HistoryEntry::narrator(payload));

    let outcome = if lost {
        info!(reason = %response.game_over_reason, month = state.month(), "game lost");
        state.end(response.game_over_reason.clone());
        TurnOutcome::Lost {
            reason: response.game_over_reason.clone(),
        }
    } else if state.month() > horizon {
        info!(month = state.month(), "game won");
        TurnOutcome::Won
    } else {
        TurnOutcome::Continue
    };

    (response, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::game_state::{Phase, DEFAULT_HORIZON};
    use crate::model::mode::GameMode;
    use crate::model::player::PlayerProfile;

    fn state() -> GameState {
        GameState::start(PlayerProfile::new("Ada", "Drone cat food"), GameMode::Standard)
    }

    fn response(money: i64, game_over: bool, reason: &str) -> NarrativeResponse {
        NarrativeResponse {
            text: "**A) x**\n**B) y**".into(),
            month: 2,
            stats: StatsUpdate {
                money: Some(money),
                team: Some(45),
                motivation: Some(40),
                ..StatsUpdate::default()
            },
            game_over,
            game_over_reason: reason.into(),
        }
    }

    #[test]
    fn commits_stats_month_and_history_together() {
        let mut state = state();
        let (stored, outcome) = apply_narrative(&mut state, "A", response(70_000, false, ""), DEFAULT_HORIZON);

        assert_eq!(outcome, TurnOutcome::Continue);
        assert_eq!(state.month(), 2);
        assert_eq!(state.stats().money, 70_000);
        assert_eq!(state.stats().marketing_cost, Some(5_000));
        assert_eq!(state.history().len(), 2);
        assert_eq!(state.history()[0], HistoryEntry::participant("A"));

        let snapshot: NarrativeResponse = serde_json::from_str(&state.history()[1].content).unwrap();
        assert_eq!(snapshot, stored);
        assert_eq!(snapshot.stats, StatsUpdate::from(state.stats()));
    }

    #[test]
    fn engine_loss_overrides_narrator_optimism() {
        let mut state = state();
        let (stored, outcome) = apply_narrative(&mut state, "B", response(-1, false, ""), DEFAULT_HORIZON);

        assert!(matches!(outcome, TurnOutcome::Lost { .. }));
        assert!(state.is_terminal());
        assert_eq!(state.phase(DEFAULT_HORIZON), Phase::Lost);
        assert!(stored.game_over);
        assert_eq!(state.terminal_reason(), "The company ran out of cash and went bankrupt.");
    }

    #[test]
    fn narrator_reason_takes_precedence() {
        let mut state = state();
        apply_narrative(&mut state, "B", response(-1, true, "Investors pulled out."), DEFAULT_HORIZON);
        assert_eq!(state.terminal_reason(), "Investors pulled out.");

        let mut state = self::state();
        apply_narrative(&mut state, "B", response(10_000, true, "  "), DEFAULT_HORIZON);
        assert_eq!(state.terminal_reason(), GENERIC_LOSS);
    }

    #[test]
    fn month_is_engine_owned() {
        let mut state = state();
        let mut wild = response(70_000, false, "");
        wild.month = 9;
        let (stored, _) = apply_narrative(&mut state, "A", wild, DEFAULT_HORIZON);
        assert_eq!(state.month(), 2);
        assert_eq!(stored.month, 2);
    }

    #[test]
    fn passing_the_horizon_wins() {
        let mut state = state();
        let (_, outcome) = apply_narrative(&mut state, "A", response(70_000, false, ""), 1);
        assert_eq!(outcome, TurnOutcome::Won);
        assert_eq!(state.phase(1), Phase::Won);
        assert!(!state.is_terminal());
    }
}
