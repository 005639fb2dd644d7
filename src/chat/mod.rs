//! Chat System Module
//!
//! Data-driven dialogue trees: states with system text, player options that
//! lead to other states, and optional quiz questions.

pub mod definition;
pub mod engine;
pub mod events;
pub mod registry;
pub mod state;

pub use definition::{Answer, ChatOption, Question, State};
pub use engine::{ChatEngine, ChatSnapshot, Transition};
pub use events::ChatEvent;
pub use registry::{Lore, LoreIssue};
pub use state::{ChatState, ConsumedOption, Message, Role};
