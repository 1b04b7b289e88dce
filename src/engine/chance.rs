use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::model::chance_event::ChanceEvent;
use crate::model::game_state::StatKey;
use crate::model::mode::GameMode;

struct EventTemplate {
    title: &'static str,
    description: &'static str,
    stat: StatKey,
    delta: i64,
}

const BASE_EVENTS: &[EventTemplate] = &[
    EventTemplate {
        title: "Server outage",
        description: "The main database crashed overnight and emergency consultants had to be flown in.",
        stat: StatKey::Money,
        delta: -8_000,
    },
    EventTemplate {
        title: "Angel cheque",
        description: "A former colleague turned angel investor wired a small, no-strings cheque.",
        stat: StatKey::Money,
        delta: 15_000,
    },
    EventTemplate {
        title: "Poached engineer",
        description: "A big tech company poached one of the senior engineers with a huge offer.",
        stat: StatKey::Team,
        delta: -5,
    },
    EventTemplate {
        title: "Glowing press",
        description: "A popular tech blog published a glowing profile of the company.",
        stat: StatKey::Motivation,
        delta: 10,
    },
    EventTemplate {
        title: "Flu season",
        description: "Half the office caught the flu in the same week.",
        stat: StatKey::Motivation,
        delta: -8,
    },
    EventTemplate {
        title: "Referral hire",
        description: "An employee referral brought in a talented new hire at no recruiting cost.",
        stat: StatKey::Team,
        delta: 5,
    },
];

const CHAOS_EVENTS: &[EventTemplate] = &[
    EventTemplate {
        title: "Meme stock moment",
        description: "An anonymous forum decided the company is a meme and flooded it with pre-orders.",
        stat: StatKey::Money,
        delta: 40_000,
    },
    EventTemplate {
        title: "Office goat",
        description: "Someone adopted a goat as office mascot. It ate the payroll printouts.",
        stat: StatKey::Motivation,
        delta: 15,
    },
    EventTemplate {
        title: "Crypto winter",
        description: "The treasury was 'temporarily' parked in a coin that just went to zero.",
        stat: StatKey::Money,
        delta: -25_000,
    },
    EventTemplate {
        title: "Team cult",
        description: "A productivity guru recruited a third of the team into a silent retreat.",
        stat: StatKey::Team,
        delta: -12,
    },
];

impl EventTemplate {
    fn to_event(&self) -> ChanceEvent {
        ChanceEvent {
            title: self.title.to_string(),
            description: self.description.to_string(),
            stat: self.stat,
            delta: self.delta,
        }
    }
}

/// Injects scripted exogenous events. The only source of randomness
/// besides the generator itself.
#[derive(Debug, Clone, Copy)]
pub struct EventRoller {
    probability: f64,
}

impl EventRoller {
    pub fn new(probability: f64) -> Self {
        Self {
            probability: probability.clamp(0.0, 1.0),
        }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn catalog_len(mode: GameMode) -> usize {
        BASE_EVENTS.len() + if mode.has_extended_events() { CHAOS_EVENTS.len() } else { 0 }
    }

    /// Rolls once. `None` on the turns where nothing happens.
    pub fn roll<R: Rng + ?Sized>(&self, mode: GameMode, rng: &mut R) -> Option<ChanceEvent> {
        if !rng.gen_bool(self.probability) {
            return None;
        }

        let mut pool: Vec<&EventTemplate> = BASE_EVENTS.iter().collect();
        if mode.has_extended_events() {
            pool.extend(CHAOS_EVENTS.iter());
        }

        let event = pool.choose(rng).map(|template| template.to_event());
        if let Some(event) = &event {
            debug!(title = %event.title, stat = %event.stat, delta = event.delta, "chance event fired");
        }
        event
    }
}
