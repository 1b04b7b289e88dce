use serde::{Deserialize, Serialize};

use crate::config::settings::CostRates;
use crate::model::game_state::Stats;

/// Monthly burn, line by line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub salaries: i64,
    pub servers: i64,
    pub marketing: i64,
    pub debt_service: i64,
    pub founder_pay: i64,
    pub total: i64,
}

/// Pure and infallible. Inputs are taken as-is; range checking is the
/// caller's business.
pub fn compute_costs(stats: &Stats, month: u32, rates: &CostRates) -> CostBreakdown {
    let month = i64::from(month);

    let salaries = stats.team.saturating_mul(rates.salary_per_member);
    let servers = rates.server_base.saturating_mul(month.saturating_mul(month));
    let marketing = stats.marketing_cost.unwrap_or(rates.default_marketing);
    let debt_service = stats
        .debt
        .map(|debt| debt.saturating_mul(rates.debt_interest_percent) / 100)
        .unwrap_or(0);
    let founder_pay = stats.monthly_pay.unwrap_or(0);

    let total = [salaries, servers, marketing, debt_service, founder_pay]
        .into_iter()
        .fold(0i64, i64::saturating_add);

    CostBreakdown {
        salaries,
        servers,
        marketing,
        debt_service,
        founder_pay,
        total,
    }
}
