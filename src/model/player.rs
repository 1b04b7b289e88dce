use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The founder, fixed at game start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub name: String,

    /// The startup idea pitched in the setup step
    pub venture: String,

    /// Skill name -> score (0..=10)
    pub skills: BTreeMap<String, u8>,

    /// Free-text traits
    pub traits: Vec<String>,
}

impl PlayerProfile {
    pub fn new(name: impl Into<String>, venture: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            venture: venture.into(),
            skills: BTreeMap::new(),
            traits: Vec::new(),
        }
    }

    pub fn with_skill(mut self, skill: impl Into<String>, score: u8) -> Self {
        self.skills.insert(skill.into(), score.min(10));
        self
    }

    pub fn with_trait(mut self, description: impl Into<String>) -> Self {
        self.traits.push(description.into());
        self
    }
}
