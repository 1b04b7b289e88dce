use serde_json::Value;

use crate::engine::economy::CostBreakdown;
use crate::model::chance_event::ChanceEvent;
use crate::model::game_state::Stats;

/// Progress for a value that may be anything the narrator sent back.
/// Numbers and numeric strings map into 0.0..=1.0; everything else is 0.5.
pub fn safe_progress(value: &Value) -> f64 {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.map_or(0.5, progress_fraction)
}

/// Percent value to a bar fraction. Out of range values pin to the ends.
pub fn progress_fraction(value: f64) -> f64 {
    if value.is_nan() {
        0.5
    } else if value > 100.0 {
        1.0
    } else if value < 0.0 {
        0.0
    } else {
        value / 100.0
    }
}

pub fn render_bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}

pub fn render_stats(stats: &Stats, month: u32, horizon: u32) -> String {
    let mut out = String::new();
    out.push_str(&format!("Month {month}/{horizon}\n"));
    out.push_str(&format!("  Cash        {}\n", stats.money));
    out.push_str(&format!(
        "  Team        {} {}%\n",
        render_bar(progress_fraction(stats.team as f64), 20),
        stats.team
    ));
    out.push_str(&format!(
        "  Motivation  {} {}%\n",
        render_bar(progress_fraction(stats.motivation as f64), 20),
        stats.motivation
    ));
    if let Some(debt) = stats.debt {
        out.push_str(&format!("  Debt        {debt}\n"));
    }
    if let Some(marketing) = stats.marketing_cost {
        out.push_str(&format!("  Marketing   {marketing}/month\n"));
    }
    if let Some(pay) = stats.monthly_pay {
        out.push_str(&format!("  Your salary {pay}/month\n"));
    }
    out
}

pub fn render_costs(costs: &CostBreakdown) -> String {
    let mut line = format!(
        "Burn: salaries {} + servers {} + marketing {}",
        costs.salaries, costs.servers, costs.marketing
    );
    if costs.debt_service != 0 {
        line.push_str(&format!(" + interest {}", costs.debt_service));
    }
    if costs.founder_pay != 0 {
        line.push_str(&format!(" + your salary {}", costs.founder_pay));
    }
    line.push_str(&format!(" = {}", costs.total));
    line
}

pub fn render_event(event: &ChanceEvent) -> String {
    format!("🎲 {}: {} ({} {:+})", event.title, event.description, event.stat, event.delta)
}
