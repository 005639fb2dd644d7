//! Chat Event Types
//!
//! Change notifications sent to subscribers after each mutation of a
//! conversation.

use std::sync::mpsc::{self, Receiver, Sender};

use serde::Serialize;

use super::state::Message;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A line was added to the transcript
    MessageAppended { message: Message },

    /// A one-shot option was spent
    OptionConsumed { state: String, option_id: String },

    /// The conversation moved to another state
    StateChanged { from: String, to: String },

    /// The conversation was reset to its initial state
    Restarted { state: String },
}

impl ChatEvent {
    /// Get event type as string (for logging/debugging)
    pub fn event_type(&self) -> &'static str {
        match self {
            ChatEvent::MessageAppended { .. } => "message_appended",
            ChatEvent::OptionConsumed { .. } => "option_consumed",
            ChatEvent::StateChanged { .. } => "state_changed",
            ChatEvent::Restarted { .. } => "restarted",
        }
    }
}

/// Fan-out of events to every live subscriber
#[derive(Debug, Default)]
pub struct Subscribers {
    senders: Vec<Sender<ChatEvent>>,
}

impl Subscribers {
    pub fn subscribe(&mut self) -> Receiver<ChatEvent> {
        let (tx, rx) = mpsc::channel();
        self.senders.push(tx);
        rx
    }

    /// Send events in order; subscribers whose receiver is gone are dropped
    pub fn publish(&mut self, events: &[ChatEvent]) {
        if events.is_empty() {
            return;
        }
        self.senders
            .retain(|tx| events.iter().all(|event| tx.send(event.clone()).is_ok()));
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_in_order() {
        let mut subscribers = Subscribers::default();
        let rx = subscribers.subscribe();

        subscribers.publish(&[
            ChatEvent::MessageAppended {
                message: Message::user("Hi"),
            },
            ChatEvent::StateChanged {
                from: "idle".to_string(),
                to: "end".to_string(),
            },
        ]);

        let received: Vec<ChatEvent> = rx.try_iter().collect();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].event_type(), "message_appended");
        assert_eq!(received[1].event_type(), "state_changed");
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let mut subscribers = Subscribers::default();
        assert!(subscribers.is_empty());
        let kept = subscribers.subscribe();
        drop(subscribers.subscribe());
        assert_eq!(subscribers.len(), 2);

        subscribers.publish(&[ChatEvent::Restarted {
            state: "idle".to_string(),
        }]);

        assert_eq!(subscribers.len(), 1);
        assert_eq!(kept.try_iter().count(), 1);
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = ChatEvent::OptionConsumed {
            state: "idle".to_string(),
            option_id: "a1".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "option_consumed");
        assert_eq!(json["option_id"], "a1");
    }
}
