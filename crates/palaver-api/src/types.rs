//! Wire types for the chat backend

use serde::{Deserialize, Serialize};

/// Server-assigned conversation identifier
pub type ChatId = u64;

fn default_true() -> bool {
    true
}

/// A single decoded record from the stream endpoint or the push hub.
///
/// Both transports reduce to this shape: the direct strategy extracts it
/// from `data: {...}` records, the push hub delivers it as event payloads
/// (where only `message` and `isFinal` are populated).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRecord {
    /// Text fragment to append to the accumulated reply
    #[serde(default)]
    pub message: Option<String>,
    /// Whether the backend considers this turn healthy
    #[serde(default = "default_true")]
    pub success: bool,
    /// Conversation id, present once the backend has persisted the turn
    #[serde(default)]
    pub chat_id: Option<ChatId>,
    /// Server-generated conversation title
    #[serde(default)]
    pub title: Option<String>,
    /// Terminal frame marker (push hub only)
    #[serde(default)]
    pub is_final: bool,
}

/// Envelope returned by the stream endpoint in trigger/listen mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerEnvelope {
    /// Hub topic to subscribe to
    pub topic: String,
    /// Bearer token authorizing the subscription
    pub token: String,
    /// Conversation id assigned by the trigger request, if any
    #[serde(default)]
    pub chat_id: Option<ChatId>,
    /// Server-generated conversation title
    #[serde(default)]
    pub title: Option<String>,
}

/// A persisted conversation, as returned by the listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: ChatId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub user_id: Option<u64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub trashed_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Message roles as the backend stores them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// A persisted message within a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: u64,
    pub chat_id: ChatId,
    pub role: ChatRole,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A conversation with its full transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatWithMessages {
    #[serde(flatten)]
    pub chat: Chat,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// Response of `GET /chats`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatListResponse {
    pub success: bool,
    #[serde(default)]
    pub chats: Vec<Chat>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pages: u64,
}

/// Response of `GET /chats/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatDetailResponse {
    pub success: bool,
    #[serde(default)]
    pub chat: Option<ChatWithMessages>,
    #[serde(default)]
    pub message: Option<String>,
}

/// The assistant's reply to one non-streaming turn
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnReply {
    pub message: String,
    #[serde(default)]
    pub chat_id: Option<ChatId>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Response of `POST /chats[/{id}]` (non-streaming turn)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    pub success: bool,
    #[serde(default)]
    pub chat: Option<TurnReply>,
    /// Error text on failure
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_record_full() {
        let r: StreamRecord =
            serde_json::from_str(r#"{"message":"Hi","success":true,"chatId":7,"title":"Greeting"}"#)
                .unwrap();
        assert_eq!(r.message.as_deref(), Some("Hi"));
        assert!(r.success);
        assert_eq!(r.chat_id, Some(7));
        assert_eq!(r.title.as_deref(), Some("Greeting"));
        assert!(!r.is_final);
    }

    #[test]
    fn test_stream_record_minimal_defaults_to_success() {
        let r: StreamRecord = serde_json::from_str(r#"{"message":" there"}"#).unwrap();
        assert!(r.success);
        assert_eq!(r.chat_id, None);
    }

    #[test]
    fn test_stream_record_hub_final() {
        let r: StreamRecord = serde_json::from_str(r#"{"isFinal":true}"#).unwrap();
        assert!(r.is_final);
        assert_eq!(r.message, None);
    }

    #[test]
    fn test_trigger_envelope() {
        let e: TriggerEnvelope =
            serde_json::from_str(r#"{"topic":"t1","token":"abc","chatId":3,"title":"X"}"#).unwrap();
        assert_eq!(e.topic, "t1");
        assert_eq!(e.token, "abc");
        assert_eq!(e.chat_id, Some(3));
        assert_eq!(e.title.as_deref(), Some("X"));
    }

    #[test]
    fn test_turn_response_failure_shape() {
        let r: TurnResponse =
            serde_json::from_str(r#"{"success":false,"message":"rate limited"}"#).unwrap();
        assert!(!r.success);
        assert!(r.chat.is_none());
        assert_eq!(r.message.as_deref(), Some("rate limited"));
    }

    #[test]
    fn test_chat_detail_response() {
        let r: ChatDetailResponse = serde_json::from_str(
            r#"{
                "success": true,
                "chat": {
                    "id": 12,
                    "title": "Install help",
                    "createdAt": "2025-11-02T10:00:00Z",
                    "messages": [
                        {"id": 1, "chatId": 12, "role": "user", "content": "hi",
                         "createdAt": "2025-11-02T10:00:01Z"},
                        {"id": 2, "chatId": 12, "role": "model", "content": "hello",
                         "createdAt": "2025-11-02T10:00:02Z"}
                    ]
                }
            }"#,
        )
        .unwrap();
        let chat = r.chat.unwrap();
        assert_eq!(chat.chat.id, 12);
        assert_eq!(chat.messages.len(), 2);
        assert_eq!(chat.messages[1].role, ChatRole::Model);
    }
}
