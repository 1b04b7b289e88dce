use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::game_state::DEFAULT_HORIZON;

/// Everything tunable about a game. Credentials are NOT stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub generation: GenerationSettings,
    pub economy: CostRates,
    pub chance: ChanceSettings,

    /// Last month a player must survive to win
    pub horizon: u32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            generation: GenerationSettings::default(),
            economy: CostRates::default(),
            chance: ChanceSettings::default(),
            horizon: DEFAULT_HORIZON,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub api_base: String,

    /// Priority order; the first model that answers a probe is used
    pub models: Vec<String>,

    pub temperature: f32,

    /// Must fit the narrative AND both options; truncation is the usual failure
    pub max_output_tokens: u32,

    /// Ask the backend for a JSON response body
    pub json_output: bool,

    pub request_timeout_secs: u64,
    pub probe_timeout_secs: u64,

    pub probe_models: bool,
    pub discover_models: bool,
    pub shuffle_credentials: bool,

    /// Pause between validation retries
    pub retry_delay_ms: u64,

    /// Content filter overrides sent with every request
    pub safety: Vec<SafetySetting>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com/v1beta".into(),
            models: vec![
                "gemini-2.0-flash".into(),
                "gemini-1.5-pro".into(),
                "gemini-pro".into(),
            ],
            temperature: 0.9,
            max_output_tokens: 8192,
            json_output: true,
            request_timeout_secs: 60,
            probe_timeout_secs: 3,
            probe_models: true,
            discover_models: true,
            shuffle_credentials: true,
            retry_delay_ms: 1000,
            safety: SafetySetting::relaxed(),
        }
    }
}

impl GenerationSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

impl SafetySetting {
    /// Crisis narratives (layoffs, fraud, hostile takeovers) trip the default
    /// thresholds, so every category is opened up.
    pub fn relaxed() -> Vec<Self> {
        [
            "HARM_CATEGORY_HARASSMENT",
            "HARM_CATEGORY_HATE_SPEECH",
            "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            "HARM_CATEGORY_DANGEROUS_CONTENT",
        ]
        .into_iter()
        .map(|category| Self {
            category: category.into(),
            threshold: "BLOCK_NONE".into(),
        })
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostRates {
    /// Monthly cost per team point
    pub salary_per_member: i64,

    /// Multiplied by month squared
    pub server_base: i64,

    /// Marketing spend when the state carries none
    pub default_marketing: i64,

    /// Monthly interest on outstanding debt, in percent
    pub debt_interest_percent: i64,
}

impl Default for CostRates {
    fn default() -> Self {
        Self {
            salary_per_member: 1000,
            server_base: 500,
            default_marketing: 5000,
            debt_interest_percent: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChanceSettings {
    pub probability: f64,
}

impl Default for ChanceSettings {
    fn default() -> Self {
        Self { probability: 0.20 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let settings: GameSettings =
            serde_json::from_str(r#"{"generation": {"temperature": 0.4}, "horizon": 6}"#).unwrap();
        assert_eq!(settings.horizon, 6);
        assert!((settings.generation.temperature - 0.4).abs() < f32::EPSILON);
        assert_eq!(settings.generation.max_output_tokens, 8192);
        assert_eq!(settings.economy, CostRates::default());
    }

    #[test]
    fn relaxed_filters_cover_four_categories() {
        let safety = SafetySetting::relaxed();
        assert_eq!(safety.len(), 4);
        assert!(safety.iter().all(|s| s.threshold == "BLOCK_NONE"));
    }
}
