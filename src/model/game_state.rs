use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::model::chance_event::ChanceEvent;
use crate::model::message::HistoryEntry;
use crate::model::mode::GameMode;
use crate::model::player::PlayerProfile;

/// Turn after which surviving players win.
pub const DEFAULT_HORIZON: u32 = 12;

/// Named resource levels of the company.
///
/// `team` and `motivation` are meant to stay in 0..=100 but nothing here
/// enforces it; the generator is allowed to return anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub money: i64,
    pub team: i64,
    pub motivation: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketing_cost: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_pay: Option<i64>,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            money: 50,
            team: 50,
            motivation: 50,
            debt: None,
            marketing_cost: None,
            monthly_pay: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatKey {
    Money,
    Team,
    Motivation,
    Debt,
    MarketingCost,
    MonthlyPay,
}

impl Stats {
    pub fn get(&self, key: StatKey) -> Option<i64> {
        match key {
            StatKey::Money => Some(self.money),
            StatKey::Team => Some(self.team),
            StatKey::Motivation => Some(self.motivation),
            StatKey::Debt => self.debt,
            StatKey::MarketingCost => self.marketing_cost,
            StatKey::MonthlyPay => self.monthly_pay,
        }
    }

    /// Adds `delta` to a stat. Optional stats that are absent start from zero.
    pub fn apply_delta(&mut self, key: StatKey, delta: i64) {
        let slot = match key {
            StatKey::Money => &mut self.money,
            StatKey::Team => &mut self.team,
            StatKey::Motivation => &mut self.motivation,
            StatKey::Debt => self.debt.get_or_insert(0),
            StatKey::MarketingCost => self.marketing_cost.get_or_insert(0),
            StatKey::MonthlyPay => self.monthly_pay.get_or_insert(0),
        };
        *slot = slot.saturating_add(delta);
    }

    /// The engine-side loss check, independent of what the narrator claims.
    pub fn loss_reason(&self) -> Option<&'static str> {
        if self.money < 0 {
            Some("The company ran out of cash and went bankrupt.")
        } else if self.team <= 0 {
            Some("Everyone quit. There is no team left to run the company.")
        } else if self.motivation <= 0 {
            Some("Morale collapsed completely and the founders walked away.")
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum Phase {
    NotStarted,
    InProgress,
    Won,
    Lost,
}

impl Phase {
    pub fn is_finished(self) -> bool {
        matches!(self, Phase::Won | Phase::Lost)
    }
}

/// Everything one game session knows. Only the turn engine mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    stats: Stats,
    month: u32,
    history: Vec<HistoryEntry>,
    player: Option<PlayerProfile>,
    mode: GameMode,
    terminal: bool,
    terminal_reason: String,
    last_event: Option<ChanceEvent>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            stats: Stats::default(),
            month: 0,
            history: Vec::new(),
            player: None,
            mode: GameMode::default(),
            terminal: false,
            terminal_reason: String::new(),
            last_event: None,
        }
    }
}

impl GameState {
    /// Seeds a fresh game from the setup step.
    pub fn start(player: PlayerProfile, mode: GameMode) -> Self {
        Self {
            stats: mode.starting_stats(),
            month: mode.starting_month(),
            player: Some(player),
            mode,
            ..Self::default()
        }
    }

    /// "Play again": back to creation defaults, whatever happened before.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn phase(&self, horizon: u32) -> Phase {
        if self.player.is_none() {
            Phase::NotStarted
        } else if self.terminal {
            Phase::Lost
        } else if self.month > horizon {
            Phase::Won
        } else {
            Phase::InProgress
        }
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn player(&self) -> Option<&PlayerProfile> {
        self.player.as_ref()
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn terminal_reason(&self) -> &str {
        &self.terminal_reason
    }

    pub fn last_event(&self) -> Option<&ChanceEvent> {
        self.last_event.as_ref()
    }

    pub(crate) fn deduct(&mut self, amount: i64) {
        self.stats.money = self.stats.money.saturating_sub(amount);
    }

    pub(crate) fn record_event(&mut self, event: Option<ChanceEvent>) {
        if let Some(event) = &event {
            self.stats.apply_delta(event.stat, event.delta);
        }
        self.last_event = event;
    }

    pub(crate) fn stats_mut(&mut self) -> &mut Stats {
        &mut self.stats
    }

    pub(crate) fn advance_month(&mut self) {
        self.month += 1;
    }

    pub(crate) fn push_history(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
    }

    pub(crate) fn end(&mut self, reason: String) {
        self.terminal = true;
        self.terminal_reason = reason;
    }
}
