//! Presentation boundary
//!
//! The engine never renders anything itself; it drives a [`Presenter`]
//! supplied by the host. The trait mirrors what the loop needs and nothing
//! more: add a message, rewrite one in place, prompt for input, and toggle
//! the long-lived working indicator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Index of a message in the presenter's list. Handed back by `add_message`
/// and used to target in-place updates of a single bubble across many
/// partial updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageIndex(pub usize);

/// Who a message is shown as coming from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// How a message should render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Ordinary text bubble
    Text,
    /// Pending placeholder (the loading label before the first update)
    Loading,
}

/// What the hosting UI must provide.
#[async_trait]
pub trait Presenter: Send + Sync {
    /// Append a message, returning its index for later in-place updates.
    async fn add_message(&self, role: Role, text: &str, kind: MessageKind) -> MessageIndex;

    /// Rewrite a previously added message in place.
    async fn update_message(&self, index: MessageIndex, text: &str, kind: MessageKind);

    /// Await one line of user input. `None` means the input source is gone
    /// (the host shut the widget down or stdin closed) and ends the loop.
    async fn prompt_input(&self, placeholder: &str, send_label: &str) -> Option<String>;

    /// Show the long-lived "still working" indicator.
    async fn begin_working(&self);

    /// Hide the working indicator. Called at most once per turn.
    async fn end_working(&self);

    /// Drop every message. Invoked by the owner on teardown, never by the
    /// loop itself.
    async fn clear(&self);
}

/// Shared presenter handle
pub type SharedPresenter = Arc<dyn Presenter>;
