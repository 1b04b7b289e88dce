use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::model::game_state::Stats;

/// Difficulty and tone preset, chosen once before the game starts.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum GameMode {
    #[default]
    Standard,
    Ruthless,
    Chaos,
}

impl GameMode {
    pub fn summary(self) -> &'static str {
        match self {
            GameMode::Standard => "Demanding but fair investors. A classic runway fight.",
            GameMode::Ruthless => "A loan to service, a salary to draw, and no mercy.",
            GameMode::Chaos => "The market is absurd. Expect the unexpected.",
        }
    }

    /// Narrator persona injected at the top of every directive.
    pub fn persona(self) -> &'static str {
        match self {
            GameMode::Standard => {
                "You are 'Startup Survivor', a demanding but fair game master. \
Crises are realistic, consequences are proportional and good decisions are rewarded."
            }
            GameMode::Ruthless => {
                "You are 'Startup Survivor', a RUTHLESS game master. \
Investors are brutal, competitors are predatory and every mistake is punished hard. \
Never hand out free wins."
            }
            GameMode::Chaos => {
                "You are 'Startup Survivor', a chaotic and darkly funny game master. \
The market behaves absurdly, viral fads appear overnight and nothing is stable, \
but the numbers still matter."
            }
        }
    }

    pub fn starting_stats(self) -> Stats {
        match self {
            GameMode::Standard => Stats {
                money: 100_000,
                team: 50,
                motivation: 60,
                marketing_cost: Some(5_000),
                ..Stats::default()
            },
            GameMode::Ruthless => Stats {
                money: 60_000,
                team: 40,
                motivation: 50,
                debt: Some(30_000),
                marketing_cost: Some(3_000),
                monthly_pay: Some(2_000),
            },
            GameMode::Chaos => Stats {
                money: 80_000,
                team: 50,
                motivation: 70,
                marketing_cost: Some(5_000),
                ..Stats::default()
            },
        }
    }

    /// Chaos opens with a founding month 0 before the first real month.
    pub fn starting_month(self) -> u32 {
        match self {
            GameMode::Chaos => 0,
            GameMode::Standard | GameMode::Ruthless => 1,
        }
    }

    /// Whether the extended chance-event catalog is eligible.
    pub fn has_extended_events(self) -> bool {
        matches!(self, GameMode::Chaos)
    }
}
