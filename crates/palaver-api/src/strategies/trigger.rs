//! Trigger/listen strategy: the stream endpoint returns a topic and a
//! bearer token; the reply content arrives via a push-hub subscription.

use crate::error::{Error, Result};
use crate::frame::ReplyBuffer;
use crate::stream::{ReplyEvent, ReplyEventStream};
use crate::types::{ChatId, StreamRecord, TriggerEnvelope};
use async_stream::stream;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use reqwest_eventsource::{Event, EventSource};

use super::{failure_events, stream_url, StreamTurnBody, SESSION_NONCE_HEADER};

/// Triggers a turn, then listens for its content on the push hub.
pub struct TriggerListen {
    http: reqwest::Client,
    /// Base URL including the chatbot path segment
    base: String,
    nonce: Option<String>,
    /// Hub endpoint; `None` is a configuration error surfaced at send time
    hub_host: Option<String>,
}

impl TriggerListen {
    pub fn new(
        http: reqwest::Client,
        base: impl Into<String>,
        nonce: Option<String>,
        hub_host: Option<String>,
    ) -> Self {
        Self {
            http,
            base: base.into(),
            nonce,
            hub_host,
        }
    }
}

#[async_trait::async_trait]
impl super::ReplyStrategy for TriggerListen {
    async fn send(&self, chat_id: Option<ChatId>, message: &str) -> Result<ReplyEventStream> {
        let Some(hub_host) = self.hub_host.clone() else {
            tracing::warn!("push delivery selected without a hub host");
            return Ok(failure_events(
                Error::InvalidConfig("push delivery requires a hub host".into()).to_string(),
            ));
        };

        let url = stream_url(&self.base, chat_id);
        tracing::debug!(%url, "triggering push-hub turn");

        let mut request = self
            .http
            .post(&url)
            .json(&StreamTurnBody { message, chat_id });
        if let Some(nonce) = &self.nonce {
            request = request.header(SESSION_NONCE_HEADER, nonce);
        }

        // a failed trigger resolves empty with a failure signal; the hub
        // is never contacted
        let body = match request.send().await {
            Ok(response) => match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::debug!("trigger response unreadable: {}", e);
                    return Ok(failure_events(String::new()));
                }
            },
            Err(e) => {
                tracing::debug!("trigger request failed: {}", e);
                return Ok(failure_events(String::new()));
            }
        };
        let envelope = match TriggerEnvelope::from_body(&body) {
            Some(envelope) => envelope,
            None => {
                tracing::debug!("trigger response was not a valid envelope");
                return Ok(failure_events(String::new()));
            }
        };

        let subscription = self
            .http
            .get(&hub_host)
            .query(&[("topic", envelope.topic.as_str())])
            .header(ACCEPT, "text/event-stream")
            .bearer_auth(&envelope.token);
        let event_source = EventSource::new(subscription)
            .map_err(|e| Error::Sse(format!("failed to open hub subscription: {}", e)))?;

        // push events rarely know the id of a freshly created conversation;
        // the trigger response is authoritative
        let turn_chat_id = envelope.chat_id.or(chat_id);
        let title = envelope.title.clone();

        Ok(Box::pin(stream! {
            let mut events = event_source;
            let mut reply = ReplyBuffer::new();

            while let Some(event) = events.next().await {
                match event {
                    Ok(Event::Open) => {}
                    Ok(Event::Message(message)) => match classify_hub_event(&message.data) {
                        HubStep::Final => break,
                        HubStep::Fragment(fragment) => {
                            reply.push_fragment(&fragment);
                            yield ReplyEvent::Update {
                                text: reply.text().to_owned(),
                                success: true,
                                chat_id: turn_chat_id,
                                title: title.clone(),
                            };
                        }
                        HubStep::Ignore => {}
                    },
                    Err(e) => {
                        if reply.is_empty() {
                            events.close();
                            yield ReplyEvent::Error {
                                message: Error::HubDisconnected(e.to_string()).to_string(),
                            };
                            return;
                        }
                        // partial content beats a dropped connection
                        tracing::debug!("hub connection lost after partial content: {}", e);
                        break;
                    }
                }
            }

            events.close();
            yield ReplyEvent::Done { text: reply.into_string() };
        }))
    }
}

impl TriggerEnvelope {
    /// Parse the trigger response body, tolerating the same event-marker
    /// and `data: ` prefixes the direct stream carries.
    pub fn from_body(body: &str) -> Option<Self> {
        let cleaned = body.replace("event: error\n", "");
        let payload = cleaned.trim();
        let payload = payload.strip_prefix("data: ").unwrap_or(payload);
        match serde_json::from_str(payload.trim()) {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                tracing::trace!("invalid trigger envelope: {}", e);
                None
            }
        }
    }
}

/// What one hub event means for the turn
#[derive(Debug, PartialEq, Eq)]
enum HubStep {
    /// Append this fragment and fire an update
    Fragment(String),
    /// Terminal frame; close the subscription and resolve
    Final,
    /// Keep-alive or malformed payload; skip
    Ignore,
}

fn classify_hub_event(data: &str) -> HubStep {
    match serde_json::from_str::<StreamRecord>(data) {
        Ok(record) if record.is_final => HubStep::Final,
        Ok(StreamRecord { message: Some(fragment), .. }) => HubStep::Fragment(fragment),
        Ok(_) => HubStep::Ignore,
        Err(e) => {
            tracing::trace!("skipping invalid hub event: {}", e);
            HubStep::Ignore
        }
    }
}
