//! Reply delivery strategies
//!
//! Two ways an assistant reply reaches the client: a directly chunked
//! response body, or a trigger request followed by a push-hub
//! subscription. The strategy is fixed at client construction and never
//! changes for the lifetime of one client.

pub mod direct;
pub mod trigger;

pub use direct::DirectStream;
pub use trigger::TriggerListen;

use crate::error::Result;
use crate::stream::{ReplyEvent, ReplyEventStream};
use crate::types::ChatId;
use async_stream::stream;
use async_trait::async_trait;
use serde::Serialize;

/// Header carrying the per-session nonce, when one is configured
pub const SESSION_NONCE_HEADER: &str = "X-Session-Nonce";

/// How assistant replies are delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// The stream endpoint's response body is the live record stream
    Direct,
    /// The stream endpoint returns a topic+token; content arrives via the
    /// push hub
    PushHub,
}

impl StreamMode {
    /// Pick the delivery mode from embed configuration. Pure function of
    /// the streaming-type flag and hub host presence; the result is fixed
    /// for the lifetime of one client.
    pub fn select(streaming_type: Option<&str>, hub_host: Option<&str>) -> Self {
        let push_requested =
            matches!(streaming_type, Some(t) if t.trim().eq_ignore_ascii_case("push"));
        if push_requested || (streaming_type.is_none() && hub_host.is_some()) {
            StreamMode::PushHub
        } else {
            StreamMode::Direct
        }
    }
}

/// A reply delivery strategy.
///
/// `send` issues one user message and returns the event stream for the
/// turn. Update events carry the full accumulated text so far; a terminal
/// event carries the final text or the failure. An `Err` return means the
/// request could not be issued at all.
#[async_trait]
pub trait ReplyStrategy: Send + Sync {
    async fn send(&self, chat_id: Option<ChatId>, message: &str) -> Result<ReplyEventStream>;
}

/// Request body of the stream endpoint
#[derive(Debug, Serialize)]
pub(crate) struct StreamTurnBody<'a> {
    pub message: &'a str,
    #[serde(rename = "chatId", skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<ChatId>,
}

/// URL of the stream endpoint for a (possibly not yet created) conversation
pub(crate) fn stream_url(base: &str, chat_id: Option<ChatId>) -> String {
    match chat_id {
        Some(id) => format!("{}/chats/{}/stream", base, id),
        None => format!("{}/chats/stream", base),
    }
}

/// One synthesized failure update followed by an empty resolution. Used
/// for short-circuited turns: error status responses, trigger failures,
/// and configuration errors.
pub(crate) fn failure_events(message: String) -> ReplyEventStream {
    Box::pin(stream! {
        yield ReplyEvent::Update {
            text: message,
            success: false,
            chat_id: None,
            title: None,
        };
        yield ReplyEvent::Done { text: String::new() };
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_select_push_when_requested() {
        assert_eq!(
            StreamMode::select(Some("push"), Some("https://hub.example")),
            StreamMode::PushHub
        );
        // requesting push without a host still selects push; the strategy
        // reports the configuration error when asked to send
        assert_eq!(StreamMode::select(Some("push"), None), StreamMode::PushHub);
        assert_eq!(StreamMode::select(Some("PUSH"), None), StreamMode::PushHub);
    }

    #[test]
    fn test_select_hub_host_implies_push_when_unset() {
        assert_eq!(
            StreamMode::select(None, Some("https://hub.example")),
            StreamMode::PushHub
        );
    }

    #[test]
    fn test_select_direct_otherwise() {
        assert_eq!(StreamMode::select(None, None), StreamMode::Direct);
        assert_eq!(StreamMode::select(Some("direct"), None), StreamMode::Direct);
        assert_eq!(
            StreamMode::select(Some("direct"), Some("https://hub.example")),
            StreamMode::Direct
        );
    }

    #[test]
    fn test_stream_url() {
        assert_eq!(
            stream_url("https://api.example/v1/chatbots/42", None),
            "https://api.example/v1/chatbots/42/chats/stream"
        );
        assert_eq!(
            stream_url("https://api.example/v1/chatbots/42", Some(7)),
            "https://api.example/v1/chatbots/42/chats/7/stream"
        );
    }

    #[test]
    fn test_stream_turn_body_omits_absent_chat_id() {
        let body = StreamTurnBody { message: "hi", chat_id: None };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"message":"hi"}"#);

        let body = StreamTurnBody { message: "hi", chat_id: Some(3) };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"message":"hi","chatId":3}"#
        );
    }

    #[tokio::test]
    async fn test_failure_events_shape() {
        let events: Vec<_> = failure_events("rate limited".into()).collect().await;
        assert_eq!(events.len(), 2);
        match &events[0] {
            ReplyEvent::Update { text, success, chat_id, .. } => {
                assert_eq!(text, "rate limited");
                assert!(!success);
                assert_eq!(*chat_id, None);
            }
            other => panic!("expected failure update, got {:?}", other),
        }
        match &events[1] {
            ReplyEvent::Done { text } => assert!(text.is_empty()),
            other => panic!("expected empty resolution, got {:?}", other),
        }
    }
}
