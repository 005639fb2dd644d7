//! Chat Definition Structures
//!
//! States, options and quiz questions as they appear in lore files, and the
//! resolved forms the engine walks.

use std::fmt;

use serde::de::{Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};

/// A state as it appears in a lore file
#[derive(Debug, Clone, Deserialize)]
pub struct RawState {
    pub text: String,
    #[serde(default)]
    pub options: RawOptions,
    #[serde(default)]
    pub questions: Vec<RawQuestion>,
}

/// Option lists come in two shapes
#[derive(Debug, Clone)]
pub enum RawOptions {
    /// `[{ id, text, goto, always }]`
    List(Vec<RawOption>),
    /// `{ "<state id>": "<text>" }`: the key is both option id and target.
    /// Entries keep the order they were written in.
    Keyed(Vec<(String, String)>),
}

impl<'de> Deserialize<'de> for RawOptions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RawOptionsVisitor)
    }
}

struct RawOptionsVisitor;

impl<'de> Visitor<'de> for RawOptionsVisitor {
    type Value = RawOptions;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a list of options or a table of target state to text")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut list = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(option) = seq.next_element::<RawOption>()? {
            list.push(option);
        }
        Ok(RawOptions::List(list))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries: Vec<(String, String)> = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(entry) = map.next_entry::<String, String>()? {
            entries.push(entry);
        }
        Ok(RawOptions::Keyed(entries))
    }
}

impl Default for RawOptions {
    fn default() -> Self {
        RawOptions::List(Vec::new())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOption {
    pub id: String,
    pub text: String,
    pub goto: String,
    #[serde(default)]
    pub always: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawQuestion {
    pub question: String,
    #[serde(default)]
    pub answers: Vec<RawAnswer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAnswer {
    pub id: String,
    pub text: String,
    #[serde(rename = "isCorrect", default)]
    pub is_correct: bool,
}

// ============================================================================
// Resolved Structures
// ============================================================================

/// A player-selectable edge out of a state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatOption {
    /// Unique within the owning state's option list
    pub id: String,
    /// Line appended as the user's message when selected
    pub text: String,
    /// Target state id
    pub goto: String,
    /// Repeatable: never consumed by selection
    pub always: bool,
}

impl ChatOption {
    pub fn from_raw(raw: &RawOption) -> Self {
        Self {
            id: raw.id.clone(),
            text: raw.text.clone(),
            goto: raw.goto.clone(),
            always: raw.always,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub id: String,
    pub text: String,
    #[serde(rename = "isCorrect")]
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    /// Prompt text
    pub question: String,
    pub answers: Vec<Answer>,
}

impl Question {
    pub fn from_raw(raw: &RawQuestion) -> Self {
        Self {
            question: raw.question.clone(),
            answers: raw
                .answers
                .iter()
                .map(|a| Answer {
                    id: a.id.clone(),
                    text: a.text.clone(),
                    is_correct: a.is_correct,
                })
                .collect(),
        }
    }
}

/// A node of the conversation graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct State {
    pub id: String,
    /// System line shown on entering the state
    pub text: String,
    pub options: Vec<ChatOption>,
    pub questions: Vec<Question>,
}

impl State {
    pub fn from_raw(id: &str, raw: &RawState) -> Self {
        let options = match &raw.options {
            RawOptions::List(list) => list.iter().map(ChatOption::from_raw).collect(),
            RawOptions::Keyed(entries) => entries
                .iter()
                .map(|(target, text)| ChatOption {
                    id: target.clone(),
                    text: text.clone(),
                    goto: target.clone(),
                    always: false,
                })
                .collect(),
        };

        Self {
            id: id.to_string(),
            text: raw.text.clone(),
            options,
            questions: raw.questions.iter().map(Question::from_raw).collect(),
        }
    }

    /// Get option by ID
    pub fn get_option(&self, option_id: &str) -> Option<&ChatOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    /// The question auto-surfaced on entry
    pub fn first_question(&self) -> Option<&Question> {
        self.questions.first()
    }

    pub fn has_questions(&self) -> bool {
        !self.questions.is_empty()
    }

    pub fn is_terminal(&self) -> bool {
        self.options.is_empty()
    }
}
