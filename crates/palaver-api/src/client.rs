//! Chat backend client
//!
//! Wraps the REST endpoints (listing, transcript retrieval, non-streaming
//! turns) and owns the streaming strategy selected from the embed
//! configuration.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::stream::ReplyEventStream;
use crate::strategies::{
    DirectStream, ReplyStrategy, StreamMode, TriggerListen, SESSION_NONCE_HEADER,
};
use crate::types::{ChatDetailResponse, ChatId, ChatListResponse, TurnResponse};

/// Embed configuration the client is built from, read once at startup.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// API root, e.g. `https://example.com/api/v1`
    pub api_root: String,
    /// Per-deployment chatbot identifier, part of every path
    pub chatbot_id: String,
    /// Per-session nonce; absence degrades to unauthenticated requests
    pub session_nonce: Option<String>,
    /// Streaming-type flag from the embed attributes
    pub streaming_type: Option<String>,
    /// Push-hub endpoint
    pub hub_host: Option<String>,
    /// Alternate execution host for streaming turns; plain REST endpoints
    /// always use the API root
    pub node_host: Option<String>,
}

/// Client for one chatbot deployment.
pub struct ChatsClient {
    http: reqwest::Client,
    /// `{api_root}/chatbots/{id}`
    base: String,
    nonce: Option<String>,
    mode: StreamMode,
    strategy: Arc<dyn ReplyStrategy>,
}

impl ChatsClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.api_root.trim().is_empty() {
            return Err(Error::InvalidConfig("API root is not configured".into()));
        }
        if config.chatbot_id.trim().is_empty() {
            return Err(Error::InvalidConfig("chatbot id is not configured".into()));
        }

        let http = reqwest::Client::new();
        let base = chatbot_base(&config.api_root, &config.chatbot_id);
        let stream_base = match &config.node_host {
            Some(host) if !host.trim().is_empty() => chatbot_base(host, &config.chatbot_id),
            _ => base.clone(),
        };

        let mode = StreamMode::select(
            config.streaming_type.as_deref(),
            config.hub_host.as_deref(),
        );
        tracing::debug!(?mode, "reply delivery mode selected");

        let strategy: Arc<dyn ReplyStrategy> = match mode {
            StreamMode::Direct => Arc::new(DirectStream::new(
                http.clone(),
                stream_base,
                config.session_nonce.clone(),
            )),
            StreamMode::PushHub => Arc::new(TriggerListen::new(
                http.clone(),
                stream_base,
                config.session_nonce.clone(),
                config.hub_host.clone(),
            )),
        };

        Ok(Self {
            http,
            base,
            nonce: config.session_nonce,
            mode,
            strategy,
        })
    }

    /// The delivery mode this client was constructed with.
    pub fn mode(&self) -> StreamMode {
        self.mode
    }

    /// The streaming strategy, for wiring into a conversation engine.
    pub fn strategy(&self) -> Arc<dyn ReplyStrategy> {
        Arc::clone(&self.strategy)
    }

    /// Send one user message, streaming back reply events.
    pub async fn send_streaming(
        &self,
        chat_id: Option<ChatId>,
        message: &str,
    ) -> Result<ReplyEventStream> {
        self.strategy.send(chat_id, message).await
    }

    /// List persisted conversations.
    pub async fn list(
        &self,
        page: u32,
        per_page: u32,
        user_id: Option<u64>,
    ) -> Result<ChatListResponse> {
        let mut query = vec![
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ];
        if let Some(user_id) = user_id {
            query.push(("user_id", user_id.to_string()));
        }
        let response = self
            .request(reqwest::Method::GET, &format!("{}/chats", self.base))
            .query(&query)
            .send()
            .await?;
        Ok(response.json().await?)
    }

    /// Fetch one conversation with its full transcript.
    pub async fn get(&self, chat_id: ChatId) -> Result<ChatDetailResponse> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("{}/chats/{}", self.base, chat_id),
            )
            .send()
            .await?;
        Ok(response.json().await?)
    }

    /// Run one non-streaming turn.
    pub async fn chat(&self, message: &str, chat_id: Option<ChatId>) -> Result<TurnResponse> {
        let url = match chat_id {
            Some(id) => format!("{}/chats/{}", self.base, id),
            None => format!("{}/chats", self.base),
        };
        let response = self
            .request(reqwest::Method::POST, &url)
            .json(&serde_json::json!({ "message": message }))
            .send()
            .await?;
        Ok(response.json().await?)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, url);
        if let Some(nonce) = &self.nonce {
            builder = builder.header(SESSION_NONCE_HEADER, nonce);
        }
        builder
    }
}

/// `{host}/chatbots/{id}` with a normalized root
fn chatbot_base(root: &str, chatbot_id: &str) -> String {
    format!("{}/chatbots/{}", root.trim_end_matches('/'), chatbot_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig {
            api_root: "https://example.com/api/v1/".into(),
            chatbot_id: "wp-7".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_chatbot_base_normalizes_trailing_slash() {
        assert_eq!(
            chatbot_base("https://example.com/api/v1/", "wp-7"),
            "https://example.com/api/v1/chatbots/wp-7"
        );
        assert_eq!(
            chatbot_base("https://example.com/api/v1", "wp-7"),
            "https://example.com/api/v1/chatbots/wp-7"
        );
    }

    #[test]
    fn test_new_rejects_missing_root() {
        let mut c = config();
        c.api_root = "  ".into();
        assert!(matches!(
            ChatsClient::new(c),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_new_rejects_missing_chatbot_id() {
        let mut c = config();
        c.chatbot_id = String::new();
        assert!(matches!(
            ChatsClient::new(c),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_mode_defaults_to_direct() {
        let client = ChatsClient::new(config()).unwrap();
        assert_eq!(client.mode(), StreamMode::Direct);
    }

    #[test]
    fn test_mode_honors_push_flag() {
        let mut c = config();
        c.streaming_type = Some("push".into());
        c.hub_host = Some("https://hub.example/.well-known/hub".into());
        let client = ChatsClient::new(c).unwrap();
        assert_eq!(client.mode(), StreamMode::PushHub);
    }
}
