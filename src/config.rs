//! Chat Configuration
//!
//! Engine settings loaded from a TOML file. Every field has a default, so an
//! empty file (or `ChatConfig::default()`) gives the full quiz-aware,
//! consumption-filtered behaviour starting from `idle`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chat::Lore;
use crate::error::{ChatError, Result};

/// Which options `available_options` returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionPolicy {
    /// Every option of the current state, repeats included
    Unfiltered,
    /// One-shot options disappear once selected; `always` options stay
    #[default]
    ConsumptionFiltered,
}

/// How consumed option ids are keyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumptionScope {
    /// Keyed by (state, option id)
    #[default]
    PerState,
    /// Keyed by option id alone: the same id is consumed in every state
    Global,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// State the conversation starts in
    pub initial_state: String,
    /// Lore file, or directory of lore files
    pub lore_path: PathBuf,
    pub option_policy: OptionPolicy,
    pub consumption_scope: ConsumptionScope,
    /// Append the first question of a state as a system line on entry
    pub surface_questions: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            initial_state: "idle".to_string(),
            lore_path: PathBuf::from("data/chat"),
            option_policy: OptionPolicy::default(),
            consumption_scope: ConsumptionScope::default(),
            surface_questions: true,
        }
    }
}

impl ChatConfig {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ChatError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: ChatConfig = toml::from_str(&content).map_err(|e| ChatError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;

        info!("Loaded chat config from {:?}", path);
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ChatConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.initial_state.trim().is_empty() {
            return Err(ChatError::Config("initial_state must not be empty".to_string()));
        }
        Ok(())
    }

    /// Load the lore this config points at
    pub fn load_lore(&self) -> Result<Lore> {
        let lore = Lore::load_from_path(&self.lore_path)?;
        lore.log_issues(&self.initial_state);
        Ok(lore)
    }

    /// Whether selecting options records them as consumed
    pub fn tracks_consumption(&self) -> bool {
        self.option_policy == OptionPolicy::ConsumptionFiltered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ChatConfig::from_toml_str("").unwrap();
        assert_eq!(config, ChatConfig::default());
        assert_eq!(config.initial_state, "idle");
        assert!(config.tracks_consumption());
        assert!(config.surface_questions);
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let config = ChatConfig::from_toml_str(include_str!("../data/chat.toml")).unwrap();
        assert_eq!(config, ChatConfig::default());
    }

    #[test]
    fn test_policy_parsing() {
        let config = ChatConfig::from_toml_str(
            r#"
initial_state = "start"
option_policy = "unfiltered"
consumption_scope = "global"
surface_questions = false
"#,
        )
        .unwrap();

        assert_eq!(config.initial_state, "start");
        assert_eq!(config.option_policy, OptionPolicy::Unfiltered);
        assert_eq!(config.consumption_scope, ConsumptionScope::Global);
        assert!(!config.surface_questions);
        assert!(!config.tracks_consumption());
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let result = ChatConfig::from_toml_str(r#"option_policy = "sometimes""#);
        assert!(matches!(result, Err(ChatError::Toml(_))));
    }

    #[test]
    fn test_empty_initial_state_rejected() {
        let result = ChatConfig::from_toml_str(r#"initial_state = "  ""#);
        assert!(matches!(result, Err(ChatError::Config(_))));
    }

    #[test]
    fn test_load_config_and_lore() {
        let temp_dir = TempDir::new().unwrap();
        let lore_path = temp_dir.path().join("lore.json");
        std::fs::write(
            &lore_path,
            r#"{"idle": {"text": "Hi", "options": []}}"#,
        )
        .unwrap();

        let config_path = temp_dir.path().join("chat.toml");
        std::fs::write(
            &config_path,
            format!("lore_path = {:?}\n", lore_path.to_string_lossy()),
        )
        .unwrap();

        let config = ChatConfig::load(&config_path).unwrap();
        let lore = config.load_lore().unwrap();
        assert!(lore.contains("idle"));
    }

    #[test]
    fn test_load_missing_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = ChatConfig::load(&temp_dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ChatError::Io { .. })));
    }
}
