//! Dialogue and quiz tree walker.
//!
//! A [`chat::Lore`] holds the static conversation graph; a
//! [`chat::ChatEngine`] walks it for one session, keeping the transcript and
//! the set of spent one-shot options.
//!
//! ```no_run
//! use lore_chat::{ChatConfig, ChatEngine};
//!
//! let mut engine = ChatEngine::from_config(ChatConfig::default())?;
//! let first = engine.available_options().first().map(|o| o.id.clone());
//! if let Some(id) = first {
//!     engine.next(&id)?;
//! }
//! for message in engine.transcript() {
//!     println!("[{}] {}", message.role.as_str(), message.text);
//! }
//! # Ok::<(), lore_chat::ChatError>(())
//! ```

pub mod chat;
pub mod config;
pub mod error;

pub use chat::{ChatEngine, ChatEvent, Lore, Message, Role};
pub use config::{ChatConfig, ConsumptionScope, OptionPolicy};
pub use error::{ChatError, Result};
