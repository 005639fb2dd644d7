//! Conversation State Tracking
//!
//! The mutable half of a conversation: where it is, what has been said, and
//! which one-shot options are spent.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::ConsumptionScope;

/// Who said a transcript line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::System => "system",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub role: Role,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            role: Role::User,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            role: Role::System,
        }
    }
}

/// Key of a consumed option. `state` is `None` under global scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsumedOption {
    pub state: Option<String>,
    pub option_id: String,
}

impl ConsumedOption {
    pub fn new(scope: ConsumptionScope, state: &str, option_id: &str) -> Self {
        Self {
            state: match scope {
                ConsumptionScope::PerState => Some(state.to_string()),
                ConsumptionScope::Global => None,
            },
            option_id: option_id.to_string(),
        }
    }
}

/// Mutable conversation state owned by one engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatState {
    pub current_state: String,
    /// Append-only
    pub transcript: Vec<Message>,
    /// Grows monotonically until restart
    pub used_options: HashSet<ConsumedOption>,
}

impl ChatState {
    /// Seed a conversation with the opening system line
    pub fn new(initial_state: &str, opening_text: &str) -> Self {
        Self {
            current_state: initial_state.to_string(),
            transcript: vec![Message::system(opening_text)],
            used_options: HashSet::new(),
        }
    }

    pub fn push(&mut self, message: Message) {
        self.transcript.push(message);
    }

    /// Record an option as spent. Returns true if it was not spent before.
    pub fn consume(&mut self, key: ConsumedOption) -> bool {
        self.used_options.insert(key)
    }

    pub fn is_consumed(&self, key: &ConsumedOption) -> bool {
        self.used_options.contains(key)
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.transcript.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_seeds_opening_line() {
        let state = ChatState::new("idle", "Hi");
        assert_eq!(state.current_state, "idle");
        assert_eq!(state.transcript, vec![Message::system("Hi")]);
        assert!(state.used_options.is_empty());
        assert_eq!(state.last_message(), Some(&Message::system("Hi")));
    }

    #[test]
    fn test_push_appends_in_order() {
        let mut state = ChatState::new("idle", "Hi");
        state.push(Message::user("Let's go"));
        state.push(Message::system("Bye"));

        assert_eq!(state.transcript.len(), 3);
        assert_eq!(state.last_message(), Some(&Message::system("Bye")));
        assert_eq!(state.transcript[1].role, Role::User);
    }

    #[test]
    fn test_consumption_keys_by_scope() {
        let mut state = ChatState::new("idle", "Hi");

        assert!(state.consume(ConsumedOption::new(ConsumptionScope::PerState, "idle", "a1")));
        assert!(!state.consume(ConsumedOption::new(ConsumptionScope::PerState, "idle", "a1")));
        assert!(!state.is_consumed(&ConsumedOption::new(ConsumptionScope::PerState, "s2", "a1")));
        assert!(!state.is_consumed(&ConsumedOption::new(ConsumptionScope::Global, "s2", "a1")));

        state.consume(ConsumedOption::new(ConsumptionScope::Global, "idle", "b1"));
        assert!(state.is_consumed(&ConsumedOption::new(ConsumptionScope::Global, "anywhere", "b1")));
    }

    #[test]
    fn test_message_serializes_role_lowercase() {
        let json = serde_json::to_string(&Message::user("Let's go")).unwrap();
        assert_eq!(json, r#"{"text":"Let's go","role":"user"}"#);
        assert_eq!(Role::System.as_str(), "system");
    }
}
