//! The conversation loop
//!
//! Drives one conversation: optional greeting, then repeated
//! input → send → await-reply cycles until the host revokes liveness or
//! the input source closes. Every resumption point after an await
//! re-checks liveness, so continuations that resolve after teardown
//! produce no side effects.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use palaver_api::{ReplyEvent, ReplyStrategy};

use crate::conversation::ConversationState;
use crate::handle::EngineHandle;
use crate::labels::ChatLabels;
use crate::presenter::{MessageIndex, MessageKind, Presenter, Role};

/// Pause before the greeting, modeling a natural typing delay
const GREETING_DELAY: Duration = Duration::from_millis(500);

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Not started
    Idle,
    /// Emitting the one-time welcome
    Greeting,
    /// Blocked on user input
    AwaitingInput,
    /// A turn is in flight, no update received yet
    Sending,
    /// A turn is in flight and updates are arriving
    StreamingResponse,
    /// Liveness revoked or input closed; terminal
    Stopped,
}

/// Engine configuration
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub labels: ChatLabels,
}

/// One conversation loop instance.
pub struct ChatEngine {
    config: EngineConfig,
    strategy: Arc<dyn ReplyStrategy>,
    presenter: Arc<dyn Presenter>,
    handle: EngineHandle,
    state: ConversationState,
    loop_state: LoopState,
}

impl ChatEngine {
    pub fn new(
        config: EngineConfig,
        strategy: Arc<dyn ReplyStrategy>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            config,
            strategy,
            presenter,
            handle: EngineHandle::new(),
            state: ConversationState::default(),
            loop_state: LoopState::Idle,
        }
    }

    /// Get a cloneable handle for revoking liveness from the host.
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    pub fn loop_state(&self) -> LoopState {
        self.loop_state
    }

    pub fn conversation(&self) -> &ConversationState {
        &self.state
    }

    /// Run the loop until liveness is revoked or the input source closes.
    /// `initial` emits the one-time greeting first.
    pub async fn run(&mut self, initial: bool) {
        self.handle.set_running(true);
        self.drive(initial).await;
        self.enter(LoopState::Stopped);
        self.handle.set_running(false);
    }

    /// Owner-driven full reset: drops every displayed message and the
    /// conversation state. The loop never does this on its own.
    pub async fn reset(&mut self) {
        self.presenter.clear().await;
        self.state.clear();
    }

    async fn drive(&mut self, initial: bool) {
        if self.revoked() {
            return;
        }

        if initial {
            self.enter(LoopState::Greeting);
            tokio::time::sleep(GREETING_DELAY).await;
            if self.revoked() {
                return;
            }
            let welcome = self.config.labels.welcome_message.clone();
            self.add_message(Role::Assistant, &welcome, MessageKind::Text)
                .await;
        }

        loop {
            if self.revoked() {
                return;
            }
            self.enter(LoopState::AwaitingInput);
            let Some(raw) = self
                .presenter
                .prompt_input(
                    &self.config.labels.input_placeholder,
                    &self.config.labels.send_button,
                )
                .await
            else {
                return;
            };
            if self.revoked() {
                return;
            }
            let input = raw.trim();
            if input.is_empty() {
                // whitespace-only input is a no-op re-prompt
                continue;
            }
            self.run_turn(input).await;
        }
    }

    /// One send → await-reply cycle. Every failure short of teardown is
    /// converted into a conversation message; the caller unconditionally
    /// returns to awaiting input.
    async fn run_turn(&mut self, input: &str) {
        self.enter(LoopState::Sending);

        // echo the user's message
        self.add_message(Role::User, input, MessageKind::Text).await;

        self.presenter.begin_working().await;
        let loading = self.config.labels.loading_message.clone();
        let placeholder = self
            .add_message(Role::Assistant, &loading, MessageKind::Loading)
            .await;

        // the indicator is cleared at most once per turn
        let mut indicator_pending = true;

        let mut events = match self.strategy.send(self.state.chat_id(), input).await {
            Ok(events) => events,
            Err(e) => {
                self.fail_turn(&mut indicator_pending, e.to_string()).await;
                return;
            }
        };

        let mut signaled_failure = false;
        let mut final_text = String::new();
        while let Some(event) = events.next().await {
            if self.revoked() {
                // the request may still be draining server-side; its
                // effects are discarded
                return;
            }
            match event {
                ReplyEvent::Update {
                    text,
                    success,
                    chat_id,
                    title,
                } => {
                    self.state.adopt_chat_id(chat_id);
                    self.state.set_title(title);
                    self.clear_indicator(&mut indicator_pending).await;
                    self.enter(LoopState::StreamingResponse);
                    if success {
                        self.rewrite_message(placeholder, &text).await;
                    } else {
                        let text = if text.trim().is_empty() {
                            self.config.labels.error_message.clone()
                        } else {
                            text
                        };
                        self.rewrite_message(placeholder, &text).await;
                        signaled_failure = true;
                        break;
                    }
                }
                ReplyEvent::Done { text } => {
                    final_text = text;
                    break;
                }
                ReplyEvent::Error { message } => {
                    self.fail_turn(&mut indicator_pending, message).await;
                    return;
                }
            }
        }

        self.clear_indicator(&mut indicator_pending).await;
        if !signaled_failure && !final_text.is_empty() {
            // covers strategies that resolved without ever sending an
            // incremental update
            self.rewrite_message(placeholder, &final_text).await;
        }
    }

    async fn clear_indicator(&mut self, pending: &mut bool) {
        if *pending {
            self.presenter.end_working().await;
            *pending = false;
        }
    }

    /// Exception path: the transport produced nothing usable. A new
    /// message is appended; the placeholder is left as-is.
    async fn fail_turn(&mut self, indicator_pending: &mut bool, error: String) {
        tracing::warn!("chat turn failed: {}", error);
        self.clear_indicator(indicator_pending).await;
        let text = self.config.labels.error_message.clone();
        self.add_message(Role::Assistant, &text, MessageKind::Text)
            .await;
    }

    async fn add_message(&mut self, role: Role, text: &str, kind: MessageKind) -> MessageIndex {
        let index = self.presenter.add_message(role, text, kind).await;
        self.state.record(role, text, index);
        index
    }

    async fn rewrite_message(&mut self, index: MessageIndex, text: &str) {
        self.presenter
            .update_message(index, text, MessageKind::Text)
            .await;
        self.state.rewrite(index, text);
    }

    fn revoked(&self) -> bool {
        !self.handle.is_active()
    }

    fn enter(&mut self, next: LoopState) {
        if self.loop_state != next {
            tracing::debug!(from = ?self.loop_state, to = ?next, "loop state");
            self.loop_state = next;
        }
    }
}
