//! Conversation state: transcript, adopted id, and title.

use crate::presenter::{MessageIndex, Role};
use palaver_api::ChatId;

/// One displayed message and where it lives in the presenter's list.
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    pub role: Role,
    pub text: String,
    pub index: MessageIndex,
    /// Milliseconds since the epoch, for host bookkeeping
    pub timestamp: i64,
}

/// State of the one conversation a loop instance drives.
#[derive(Debug, Default)]
pub struct ConversationState {
    chat_id: Option<ChatId>,
    title: Option<String>,
    transcript: Vec<TranscriptEntry>,
}

impl ConversationState {
    /// The adopted conversation id, passed as-is on every send.
    pub fn chat_id(&self) -> Option<ChatId> {
        self.chat_id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// Adoption rule: the first id the backend reports wins and is never
    /// reverted; `None` never overwrites.
    pub fn adopt_chat_id(&mut self, incoming: Option<ChatId>) {
        match (self.chat_id, incoming) {
            (None, Some(id)) => {
                tracing::debug!(chat_id = id, "conversation id adopted");
                self.chat_id = Some(id);
            }
            (Some(current), Some(id)) if id != current => {
                tracing::debug!(current, incoming = id, "ignoring conversation id change");
            }
            _ => {}
        }
    }

    /// Latest server-reported title wins; `None` never clears it.
    pub fn set_title(&mut self, incoming: Option<String>) {
        if incoming.is_some() {
            self.title = incoming;
        }
    }

    /// Record a newly added message.
    pub fn record(&mut self, role: Role, text: &str, index: MessageIndex) {
        self.transcript.push(TranscriptEntry {
            role,
            text: text.to_owned(),
            index,
            timestamp: chrono::Utc::now().timestamp_millis(),
        });
    }

    /// Rewrite the text of the entry at a presenter index, if tracked.
    pub fn rewrite(&mut self, index: MessageIndex, text: &str) {
        if let Some(entry) = self.transcript.iter_mut().rev().find(|e| e.index == index) {
            entry.text = text.to_owned();
        }
    }

    /// Full reset, an explicit owner action.
    pub fn clear(&mut self) {
        self.chat_id = None;
        self.title = None;
        self.transcript.clear();
    }
}
