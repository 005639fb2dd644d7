//! Chat Engine
//!
//! Walks a lore graph one option at a time. The engine owns the mutable
//! conversation state; the lore is shared and read-only.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::mpsc::Receiver;

use serde::Serialize;
use tracing::{debug, error, info};

use super::definition::{ChatOption, Question, State};
use super::events::{ChatEvent, Subscribers};
use super::registry::Lore;
use super::state::{ChatState, ConsumedOption, Message};
use crate::config::{ChatConfig, OptionPolicy};
use crate::error::{ChatError, Result};

/// Outcome of a successful `next` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: String,
    pub to: String,
    pub option_id: String,
    /// Whether the option was newly recorded as consumed
    pub consumed: bool,
    /// Number of transcript lines added (2, or 3 when a question surfaced)
    pub messages_appended: usize,
}

/// Serializable view of a conversation for hosts that render from JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatSnapshot {
    pub current_state: String,
    pub transcript: Vec<Message>,
    pub options: Vec<ChatOption>,
    pub questions: Vec<Question>,
}

pub struct ChatEngine {
    lore: Arc<Lore>,
    config: ChatConfig,
    state: ChatState,
    subscribers: Subscribers,
}

impl ChatEngine {
    /// Start a conversation in the configured initial state.
    ///
    /// Fails with `MissingInitialState` if the lore does not define it.
    pub fn new(lore: Arc<Lore>, config: ChatConfig) -> Result<Self> {
        config.validate()?;
        let state = Self::opening_state(&lore, &config.initial_state)?;

        Ok(Self {
            lore,
            config,
            state,
            subscribers: Subscribers::default(),
        })
    }

    /// Load the lore named by the config and start a conversation
    pub fn from_config(config: ChatConfig) -> Result<Self> {
        let lore = config.load_lore()?;
        Self::new(Arc::new(lore), config)
    }

    fn opening_state(lore: &Lore, initial_state: &str) -> Result<ChatState> {
        let initial = lore
            .get(initial_state)
            .ok_or_else(|| ChatError::MissingInitialState {
                state: initial_state.to_string(),
            })?;
        Ok(ChatState::new(initial_state, &initial.text))
    }

    /// Select an option of the current state.
    ///
    /// Unknown option ids are ignored and return `Ok(None)` without touching
    /// any state. A target missing from the lore is reported before anything
    /// is mutated.
    pub fn next(&mut self, option_id: &str) -> Result<Option<Transition>> {
        let lore = Arc::clone(&self.lore);
        let from = self.state.current_state.clone();

        let option = match lore.get(&from).and_then(|s| s.get_option(option_id)) {
            Some(option) => option,
            None => {
                debug!("Ignoring unknown option '{}' in state '{}'", option_id, from);
                return Ok(None);
            }
        };

        let target = match lore.get(&option.goto) {
            Some(target) => target,
            None => {
                error!(
                    "Option '{}' in state '{}' leads to missing state '{}'",
                    option.id, from, option.goto
                );
                return Err(ChatError::DanglingTransition {
                    from,
                    option_id: option.id.clone(),
                    missing_state: option.goto.clone(),
                });
            }
        };

        let mut events = Vec::new();

        let consumed = if self.config.tracks_consumption() {
            let key = ConsumedOption::new(self.config.consumption_scope, &from, &option.id);
            let newly = self.state.consume(key);
            if newly {
                events.push(ChatEvent::OptionConsumed {
                    state: from.clone(),
                    option_id: option.id.clone(),
                });
            }
            newly
        } else {
            false
        };

        let mut appended = vec![Message::user(&option.text), Message::system(&target.text)];
        if self.config.surface_questions {
            if let Some(question) = target.first_question() {
                appended.push(Message::system(&question.question));
            }
        }
        let messages_appended = appended.len();

        for message in appended {
            self.state.push(message.clone());
            events.push(ChatEvent::MessageAppended { message });
        }

        self.state.current_state = target.id.clone();
        events.push(ChatEvent::StateChanged {
            from: from.clone(),
            to: target.id.clone(),
        });

        debug!("Chat moved '{}' -> '{}' via '{}'", from, target.id, option.id);
        self.subscribers.publish(&events);

        Ok(Some(Transition {
            from,
            to: target.id.clone(),
            option_id: option.id.clone(),
            consumed,
            messages_appended,
        }))
    }

    /// Options of the current state the player may pick, in definition order
    pub fn available_options(&self) -> Vec<&ChatOption> {
        self.current()
            .map(|state| {
                state
                    .options
                    .iter()
                    .filter(|o| self.is_visible(&state.id, o))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Point lookup for a single option of the current state
    pub fn should_show_option(&self, option_id: &str) -> bool {
        self.current()
            .and_then(|state| state.get_option(option_id).map(|o| (state, o)))
            .is_some_and(|(state, o)| self.is_visible(&state.id, o))
    }

    fn is_visible(&self, state_id: &str, option: &ChatOption) -> bool {
        match self.config.option_policy {
            OptionPolicy::Unfiltered => true,
            OptionPolicy::ConsumptionFiltered => {
                option.always
                    || !self.state.is_consumed(&ConsumedOption::new(
                        self.config.consumption_scope,
                        state_id,
                        &option.id,
                    ))
            }
        }
    }

    /// Questions attached to the current state
    pub fn current_questions(&self) -> &[Question] {
        self.current()
            .map(|state| state.questions.as_slice())
            .unwrap_or(&[])
    }

    /// Whether a state carries a quiz
    pub fn is_state_test(&self, state_id: &str) -> bool {
        self.lore.get(state_id).is_some_and(State::has_questions)
    }

    /// Drop the transcript and consumed options and start over
    pub fn restart(&mut self) -> Result<()> {
        self.state = Self::opening_state(&self.lore, &self.config.initial_state)?;
        info!("Chat restarted at '{}'", self.config.initial_state);

        self.subscribers.publish(&[
            ChatEvent::Restarted {
                state: self.config.initial_state.clone(),
            },
            ChatEvent::MessageAppended {
                message: self.state.transcript[0].clone(),
            },
        ]);
        Ok(())
    }

    /// Receive a `ChatEvent` for every subsequent change
    pub fn subscribe(&mut self) -> Receiver<ChatEvent> {
        self.subscribers.subscribe()
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            current_state: self.state.current_state.clone(),
            transcript: self.state.transcript.clone(),
            options: self.available_options().into_iter().cloned().collect(),
            questions: self.current_questions().to_vec(),
        }
    }

    /// Definition of the current state
    pub fn current(&self) -> Option<&State> {
        self.lore.get(&self.state.current_state)
    }

    pub fn current_state(&self) -> &str {
        &self.state.current_state
    }

    pub fn transcript(&self) -> &[Message] {
        &self.state.transcript
    }

    pub fn used_options(&self) -> &HashSet<ConsumedOption> {
        &self.state.used_options
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn lore(&self) -> &Arc<Lore> {
        &self.lore
    }
}
