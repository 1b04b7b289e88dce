use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The player, or the injected directive
    Participant,
    /// Generated responses
    Narrator,
}

/// One conversation turn. Narrator content is the serialized payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

impl HistoryEntry {
    pub fn participant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Participant,
            content: content.into(),
        }
    }

    pub fn narrator(content: impl Into<String>) -> Self {
        Self {
            role: Role::Narrator,
            content: content.into(),
        }
    }

    /// What a reader should see: the narrative `text` for narrator payloads,
    /// the raw content otherwise.
    pub fn display_text(&self) -> String {
        if self.role == Role::Narrator {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&self.content) {
                if let Some(text) = value.get("text").and_then(|t| t.as_str()) {
                    return text.to_string();
                }
            }
        }
        self.content.clone()
    }
}
