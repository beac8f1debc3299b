//! Reply event types

use crate::types::ChatId;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio_stream::Stream;

/// Events emitted while an assistant reply is being produced.
///
/// `Update` events carry the full accumulated text so far, not a delta:
/// the consumer overwrites its placeholder message with each one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplyEvent {
    /// Incremental state of the reply
    Update {
        /// Full accumulated text (or the server's error text when
        /// `success` is false)
        text: String,
        success: bool,
        /// Latest-seen conversation id
        chat_id: Option<ChatId>,
        /// Server-generated conversation title, when known
        title: Option<String>,
    },
    /// Reply finished; `text` is the final accumulated text (empty when a
    /// failure was already signaled via an unsuccessful `Update`)
    Done { text: String },
    /// Transport failed before anything usable was produced
    Error { message: String },
}

impl ReplyEvent {
    /// Check if this is a terminal event (Done or Error)
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReplyEvent::Done { .. } | ReplyEvent::Error { .. })
    }

    /// Get the final text if this is a Done event
    pub fn into_text(self) -> Option<String> {
        match self {
            ReplyEvent::Done { text } => Some(text),
            _ => None,
        }
    }
}

/// A stream of reply events
pub type ReplyEventStream = Pin<Box<dyn Stream<Item = ReplyEvent> + Send>>;
