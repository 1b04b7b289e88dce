use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::settings::GameSettings;
use crate::engine::llm_client::Credential;

pub const CREDENTIALS_ENV: &str = "GOOGLE_API_KEYS";

pub fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("startup_survivor");
    path.push("settings.json");
    path
}

/// Settings from disk, or defaults when the file is missing or broken.
pub fn load_settings() -> GameSettings {
    load_settings_from(&settings_path())
}

pub fn load_settings_from(path: &Path) -> GameSettings {
    let Ok(raw) = fs::read_to_string(path) else {
        return GameSettings::default();
    };
    match serde_json::from_str(&raw) {
        Ok(settings) => settings,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring unreadable settings file");
            GameSettings::default()
        }
    }
}

pub fn save_settings(settings: &GameSettings) -> Result<()> {
    save_settings_to(&settings_path(), settings)
}

pub fn save_settings_to(path: &Path, settings: &GameSettings) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "wrote settings");
    Ok(())
}

/// Reads comma or whitespace separated API keys from the environment.
pub fn load_credentials() -> Vec<Credential> {
    std::env::var(CREDENTIALS_ENV)
        .map(|raw| parse_credentials(&raw))
        .unwrap_or_default()
}

pub fn parse_credentials(raw: &str) -> Vec<Credential> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(Credential::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_commas_and_whitespace() {
        let keys = parse_credentials(" key-a, key-b\nkey-c ,, ");
        let keys: Vec<&str> = keys.iter().map(Credential::secret).collect();
        assert_eq!(keys, vec!["key-a", "key-b", "key-c"]);
    }

    #[test]
    fn saved_settings_load_back_unchanged() {
        let dir = std::env::temp_dir().join(format!("startup_survivor_settings_{}", std::process::id()));
        let path = dir.join("settings.json");
        let mut settings = GameSettings::default();
        settings.horizon = 6;
        settings.chance.probability = 0.5;

        save_settings_to(&path, &settings).unwrap();
        assert_eq!(load_settings_from(&path), settings);

        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_settings_from(&path), GameSettings::default());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_value_has_no_credentials() {
        assert!(parse_credentials("  , ").is_empty());
    }
}
