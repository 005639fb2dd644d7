//! Chat error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading lore or walking a conversation
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported lore file format: {path:?}")]
    UnsupportedFormat { path: PathBuf },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// The configured starting state is not part of the lore
    #[error("Initial state '{state}' is missing from the lore")]
    MissingInitialState { state: String },

    /// An option points at a state the lore does not define
    #[error("Option '{option_id}' in state '{from}' leads to missing state '{missing_state}'")]
    DanglingTransition {
        from: String,
        option_id: String,
        missing_state: String,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dangling_transition_names_missing_state() {
        let err = ChatError::DanglingTransition {
            from: "idle".to_string(),
            option_id: "go".to_string(),
            missing_state: "nowhere".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("'go'"));
        assert!(text.contains("'idle'"));
        assert!(text.contains("'nowhere'"));
    }
}
