//! Host-supplied display strings

use serde::{Deserialize, Serialize};

/// The five strings the hosting page supplies; every one has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatLabels {
    /// Greeting shown on first activation
    pub welcome_message: String,
    /// Placeholder shown in the input field
    pub input_placeholder: String,
    /// Label of the placeholder assistant message while a reply is pending
    pub loading_message: String,
    /// Default error text when the backend supplies none
    pub error_message: String,
    /// Label of the send button
    pub send_button: String,
}

impl Default for ChatLabels {
    fn default() -> Self {
        Self {
            welcome_message: "Hello! What can I help you with?".into(),
            input_placeholder: "Type a message...".into(),
            loading_message: "Generating a reply...".into(),
            error_message: "Sorry, I can't reach the server right now. Please try again later."
                .into(),
            send_button: "Send".into(),
        }
    }
}
