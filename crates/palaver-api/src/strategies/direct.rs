//! Direct-stream strategy: the stream endpoint's chunked response body is
//! the live record stream.

use crate::error::Result;
use crate::frame::{FrameDecoder, ReplyBuffer};
use crate::stream::{ReplyEvent, ReplyEventStream};
use crate::types::{ChatId, StreamRecord};
use async_stream::stream;
use futures::StreamExt;
use reqwest::header::ACCEPT;

use super::{failure_events, stream_url, StreamTurnBody, SESSION_NONCE_HEADER};

/// Streams the reply straight off the response body.
pub struct DirectStream {
    http: reqwest::Client,
    /// Base URL including the chatbot path segment
    base: String,
    nonce: Option<String>,
}

impl DirectStream {
    pub fn new(http: reqwest::Client, base: impl Into<String>, nonce: Option<String>) -> Self {
        Self {
            http,
            base: base.into(),
            nonce,
        }
    }
}

#[async_trait::async_trait]
impl super::ReplyStrategy for DirectStream {
    async fn send(&self, chat_id: Option<ChatId>, message: &str) -> Result<ReplyEventStream> {
        let url = stream_url(&self.base, chat_id);
        tracing::debug!(%url, "opening reply stream");

        let mut request = self
            .http
            .post(&url)
            .header(ACCEPT, "text/event-stream")
            .json(&StreamTurnBody { message, chat_id });
        if let Some(nonce) = &self.nonce {
            request = request.header(SESSION_NONCE_HEADER, nonce);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            // the backend answers error statuses with plain JSON before
            // any stream begins
            let body = response.text().await.unwrap_or_default();
            let message = failure_message(&body, status);
            tracing::debug!(%status, "stream request rejected: {}", message);
            return Ok(failure_events(message));
        }

        let mut body = response.bytes_stream();
        Ok(Box::pin(stream! {
            let mut frames = FrameDecoder::new();
            let mut reply = ReplyBuffer::new();
            let mut latest_chat_id = chat_id;
            let mut latest_title: Option<String> = None;
            let mut read_error: Option<String> = None;

            while let Some(next) = body.next().await {
                let chunk = match next {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        read_error = Some(e.to_string());
                        break;
                    }
                };
                for record in frames.push(&chunk) {
                    if let Some(update) =
                        apply_record(&record, &mut reply, &mut latest_chat_id, &mut latest_title)
                    {
                        yield update;
                    }
                }
            }

            if read_error.is_none() {
                for record in frames.finish() {
                    if let Some(update) =
                        apply_record(&record, &mut reply, &mut latest_chat_id, &mut latest_title)
                    {
                        yield update;
                    }
                }
            }

            if let Some(error) = read_error {
                if reply.is_empty() {
                    yield ReplyEvent::Error { message: error };
                    return;
                }
                // a dropped connection after content arrived resolves with
                // what was gathered
                tracing::debug!("stream dropped after partial content: {}", error);
            }
            yield ReplyEvent::Done { text: reply.into_string() };
        }))
    }
}

/// Fold one record into the turn state, producing the update to emit when
/// the record carried a fragment.
fn apply_record(
    record: &StreamRecord,
    reply: &mut ReplyBuffer,
    latest_chat_id: &mut Option<ChatId>,
    latest_title: &mut Option<String>,
) -> Option<ReplyEvent> {
    if record.chat_id.is_some() {
        *latest_chat_id = record.chat_id;
    }
    if record.title.is_some() {
        latest_title.clone_from(&record.title);
    }
    if !reply.absorb(record) {
        return None;
    }
    Some(ReplyEvent::Update {
        text: reply.text().to_owned(),
        success: record.success,
        chat_id: *latest_chat_id,
        title: latest_title.clone(),
    })
}

/// Best-effort error text from a failure response body.
fn failure_message(body: &str, status: reqwest::StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
            return message.to_owned();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status)
    } else {
        trimmed.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_message_prefers_json_field() {
        let status = reqwest::StatusCode::TOO_MANY_REQUESTS;
        assert_eq!(
            failure_message(r#"{"message":"rate limited"}"#, status),
            "rate limited"
        );
    }

    #[test]
    fn test_failure_message_falls_back_to_raw_body() {
        let status = reqwest::StatusCode::BAD_GATEWAY;
        assert_eq!(failure_message("upstream down", status), "upstream down");
    }

    #[test]
    fn test_failure_message_empty_body_uses_status() {
        let status = reqwest::StatusCode::SERVICE_UNAVAILABLE;
        assert_eq!(failure_message("", status), "HTTP 503 Service Unavailable");
    }

    #[test]
    fn test_apply_record_keeps_latest_seen_ids() {
        let mut reply = ReplyBuffer::new();
        let mut chat_id = None;
        let mut title = None;

        let first: StreamRecord =
            serde_json::from_str(r#"{"message":"Hi","chatId":7,"title":"Greeting"}"#).unwrap();
        let update = apply_record(&first, &mut reply, &mut chat_id, &mut title).unwrap();
        match update {
            ReplyEvent::Update { text, chat_id, title, .. } => {
                assert_eq!(text, "Hi");
                assert_eq!(chat_id, Some(7));
                assert_eq!(title.as_deref(), Some("Greeting"));
            }
            other => panic!("unexpected event {:?}", other),
        }

        // later records without ids keep reporting the ones already seen
        let second: StreamRecord = serde_json::from_str(r#"{"message":" there"}"#).unwrap();
        let update = apply_record(&second, &mut reply, &mut chat_id, &mut title).unwrap();
        match update {
            ReplyEvent::Update { text, chat_id, title, .. } => {
                assert_eq!(text, "Hi there");
                assert_eq!(chat_id, Some(7));
                assert_eq!(title.as_deref(), Some("Greeting"));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_apply_record_without_fragment_emits_nothing() {
        let mut reply = ReplyBuffer::new();
        let mut chat_id = None;
        let mut title = None;
        let record: StreamRecord = serde_json::from_str(r#"{"chatId":9}"#).unwrap();
        assert!(apply_record(&record, &mut reply, &mut chat_id, &mut title).is_none());
        // the id is still remembered for the next update
        assert_eq!(chat_id, Some(9));
        assert!(reply.is_empty());
    }
}
