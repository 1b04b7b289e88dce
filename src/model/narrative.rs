use serde::{Deserialize, Serialize};

use crate::model::game_state::Stats;
use crate::model::llm_decode::{lenient_month, lenient_stat};

/// Output returned by the narrator.
/// This does NOT mutate state directly; the turn engine merges it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeResponse {
    /// Narrative plus exactly two labeled options
    pub text: String,

    #[serde(deserialize_with = "lenient_month")]
    pub month: u32,

    pub stats: StatsUpdate,

    pub game_over: bool,

    #[serde(default)]
    pub game_over_reason: String,
}

/// Stat values proposed by the narrator. Absent fields keep their old value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsUpdate {
    #[serde(default, deserialize_with = "lenient_stat", skip_serializing_if = "Option::is_none")]
    pub money: Option<i64>,
    #[serde(default, deserialize_with = "lenient_stat", skip_serializing_if = "Option::is_none")]
    pub team: Option<i64>,
    #[serde(default, deserialize_with = "lenient_stat", skip_serializing_if = "Option::is_none")]
    pub motivation: Option<i64>,
    #[serde(default, deserialize_with = "lenient_stat", skip_serializing_if = "Option::is_none")]
    pub debt: Option<i64>,
    #[serde(default, deserialize_with = "lenient_stat", skip_serializing_if = "Option::is_none")]
    pub marketing_cost: Option<i64>,
    #[serde(default, deserialize_with = "lenient_stat", skip_serializing_if = "Option::is_none")]
    pub monthly_pay: Option<i64>,
}

impl StatsUpdate {
    pub fn merge_into(&self, stats: &mut Stats) {
        if let Some(v) = self.money {
            stats.money = v;
        }
        if let Some(v) = self.team {
            stats.team = v;
        }
        if let Some(v) = self.motivation {
            stats.motivation = v;
        }
        if self.debt.is_some() {
            stats.debt = self.debt;
        }
        if self.marketing_cost.is_some() {
            stats.marketing_cost = self.marketing_cost;
        }
        if self.monthly_pay.is_some() {
            stats.monthly_pay = self.monthly_pay;
        }
    }
}

impl From<&Stats> for StatsUpdate {
    fn from(stats: &Stats) -> Self {
        Self {
            money: Some(stats.money),
            team: Some(stats.team),
            motivation: Some(stats.motivation),
            debt: stats.debt,
            marketing_cost: stats.marketing_cost,
            monthly_pay: stats.monthly_pay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_fields_the_narrator_left_out() {
        let mut stats = Stats {
            debt: Some(10_000),
            ..Stats::default()
        };
        let update = StatsUpdate {
            money: Some(42),
            marketing_cost: Some(7_000),
            ..StatsUpdate::default()
        };
        update.merge_into(&mut stats);

        assert_eq!(stats.money, 42);
        assert_eq!(stats.team, 50);
        assert_eq!(stats.debt, Some(10_000));
        assert_eq!(stats.marketing_cost, Some(7_000));
    }

    #[test]
    fn full_snapshot_round_trips_through_an_update() {
        let stats = Stats {
            money: -3,
            team: 120,
            motivation: 7,
            debt: None,
            marketing_cost: Some(1),
            monthly_pay: None,
        };
        let mut merged = Stats::default();
        StatsUpdate::from(&stats).merge_into(&mut merged);
        assert_eq!(merged, stats);
    }
}
