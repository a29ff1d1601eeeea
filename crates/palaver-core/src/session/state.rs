//! Session and message state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::GroundingMetadata;

/// Placeholder title a session carries until its first user message.
pub const UNTITLED_SESSION: &str = "New chat";

/// Maximum number of characters kept when deriving a title.
pub const TITLE_MAX_CHARS: usize = 30;

/// Unique identifier for a chat session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a message within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// A single turn in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message identifier.
    pub id: MessageId,

    /// Who authored this message.
    pub role: Role,

    /// Accumulated text. Mutable only while `is_streaming` is true, and
    /// then only by appending.
    pub content: String,

    /// When this message was created.
    pub timestamp: DateTime<Utc>,

    /// True while response fragments are still being merged in. At most one
    /// message per session carries this flag at a time.
    #[serde(default)]
    pub is_streaming: bool,

    /// True if this message is a synthesized failure notice.
    #[serde(default)]
    pub is_error: bool,

    /// Generated image, as a `data:` URI. Set at most once, by a fragment
    /// carrying inline image data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// User-supplied image attachments as `data:` URIs. Set at creation for
    /// user messages, immutable afterwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<String>>,

    /// Web citation metadata for a generated reply. Replaced wholesale by
    /// later fragments, never partially merged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding: Option<GroundingMetadata>,
}

impl Message {
    /// A user-authored message. An empty attachment list is stored as
    /// "no attachments".
    pub fn user(content: impl Into<String>, attachments: Vec<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            is_streaming: false,
            is_error: false,
            image: None,
            attachments: if attachments.is_empty() {
                None
            } else {
                Some(attachments)
            },
            grounding: None,
        }
    }

    /// The empty placeholder a streamed reply is merged into.
    pub fn streaming_placeholder() -> Self {
        Self {
            id: MessageId::new(),
            role: Role::Model,
            content: String::new(),
            timestamp: Utc::now(),
            is_streaming: true,
            is_error: false,
            image: None,
            attachments: None,
            grounding: None,
        }
    }

    /// A failure notice shown in place of a reply.
    pub fn error(notice: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::Model,
            content: notice.into(),
            timestamp: Utc::now(),
            is_streaming: false,
            is_error: true,
            image: None,
            attachments: None,
            grounding: None,
        }
    }
}

/// One conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    /// Unique session identifier.
    pub id: SessionId,

    /// User-visible label. Starts as [`UNTITLED_SESSION`] and is replaced
    /// once, when the first user message arrives.
    pub title: String,

    /// Ordered message history. Append-only, except the streaming tail
    /// which is edited in place until finalized.
    pub messages: Vec<Message>,

    /// Creation instant, immutable. Stored as a millisecond timestamp.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl ChatSession {
    /// A fresh, untitled, empty session created now.
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            title: UNTITLED_SESSION.to_string(),
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// The in-flight message, if a reply is currently being merged.
    pub fn streaming_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.is_streaming)
    }

    /// True while a reply is being merged into this session.
    pub fn has_streaming_message(&self) -> bool {
        self.streaming_message().is_some()
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive a session title from the first user message: the first
/// [`TITLE_MAX_CHARS`] characters, with `...` appended when truncated.
pub fn derive_title(content: &str) -> String {
    let mut chars = content.chars();
    let title: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{title}...")
    } else {
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod ids {
        use super::*;

        #[test]
        fn session_ids_are_unique() {
            assert_ne!(SessionId::new(), SessionId::new());
        }

        #[test]
        fn message_ids_are_unique() {
            assert_ne!(MessageId::new(), MessageId::new());
        }

        #[test]
        fn display_shows_inner_string() {
            let id = SessionId("session-123".to_string());
            assert_eq!(format!("{id}"), "session-123");
        }

        #[test]
        fn serialization_roundtrip() {
            let id = MessageId("msg-456".to_string());
            let json = serde_json::to_string(&id).unwrap();
            let parsed: MessageId = serde_json::from_str(&json).unwrap();
            assert_eq!(id, parsed);
        }
    }

    mod role {
        use super::*;

        #[test]
        fn serializes_lowercase() {
            assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
            assert_eq!(serde_json::to_string(&Role::Model).unwrap(), "\"model\"");
        }

        #[test]
        fn deserializes_lowercase() {
            let role: Role = serde_json::from_str("\"model\"").unwrap();
            assert_eq!(role, Role::Model);
        }
    }

    mod message {
        use super::*;

        #[test]
        fn user_message_carries_attachments() {
            let msg = Message::user("look at this", vec!["data:image/png;base64,AA==".to_string()]);
            assert_eq!(msg.role, Role::User);
            assert_eq!(msg.content, "look at this");
            assert_eq!(msg.attachments.as_ref().map(Vec::len), Some(1));
            assert!(!msg.is_streaming);
            assert!(!msg.is_error);
        }

        #[test]
        fn user_message_without_attachments_stores_none() {
            let msg = Message::user("hello", Vec::new());
            assert!(msg.attachments.is_none());
        }

        #[test]
        fn streaming_placeholder_is_empty_model_message() {
            let msg = Message::streaming_placeholder();
            assert_eq!(msg.role, Role::Model);
            assert!(msg.content.is_empty());
            assert!(msg.is_streaming);
            assert!(!msg.is_error);
        }

        #[test]
        fn error_message_is_not_streaming() {
            let msg = Message::error("something broke");
            assert_eq!(msg.content, "something broke");
            assert!(msg.is_error);
            assert!(!msg.is_streaming);
        }

        #[test]
        fn serializes_camel_case_and_skips_empty_options() {
            let msg = Message::user("hi", Vec::new());
            let json = serde_json::to_string(&msg).unwrap();
            assert!(json.contains("isStreaming"));
            assert!(json.contains("isError"));
            assert!(!json.contains("attachments"));
            assert!(!json.contains("grounding"));
            assert!(!json.contains("image"));
        }

        #[test]
        fn flags_default_to_false_on_deserialize() {
            let json = r#"{
                "id": "m-1",
                "role": "user",
                "content": "hi",
                "timestamp": "2024-05-01T12:00:00Z"
            }"#;
            let msg: Message = serde_json::from_str(json).unwrap();
            assert!(!msg.is_streaming);
            assert!(!msg.is_error);
        }
    }

    mod chat_session {
        use super::*;

        #[test]
        fn new_starts_untitled_and_empty() {
            let session = ChatSession::new();
            assert_eq!(session.title, UNTITLED_SESSION);
            assert!(session.messages.is_empty());
            assert!(!session.has_streaming_message());
        }

        #[test]
        fn streaming_message_finds_the_in_flight_tail() {
            let mut session = ChatSession::new();
            session.messages.push(Message::user("hi", Vec::new()));
            session.messages.push(Message::streaming_placeholder());

            let streaming = session.streaming_message().unwrap();
            assert!(streaming.is_streaming);
            assert_eq!(streaming.role, Role::Model);
        }

        #[test]
        fn created_at_serializes_as_millisecond_number() {
            let session = ChatSession::new();
            let json = serde_json::to_value(&session).unwrap();
            assert!(json["createdAt"].is_i64() || json["createdAt"].is_u64());
        }

        #[test]
        fn serialization_roundtrip_preserves_created_at() {
            let session = ChatSession::new();
            let json = serde_json::to_string(&session).unwrap();
            let parsed: ChatSession = serde_json::from_str(&json).unwrap();
            // Millisecond storage: equality holds because Utc::now() is
            // compared after the same truncation on both sides.
            assert_eq!(
                parsed.created_at.timestamp_millis(),
                session.created_at.timestamp_millis()
            );
        }
    }

    mod title {
        use super::*;

        #[test]
        fn short_content_is_kept_verbatim() {
            assert_eq!(derive_title("Hi"), "Hi");
        }

        #[test]
        fn exactly_thirty_chars_is_not_truncated() {
            let content = "a".repeat(30);
            assert_eq!(derive_title(&content), content);
        }

        #[test]
        fn long_content_is_truncated_with_ellipsis() {
            let title = derive_title("Explain recursion in simple terms");
            assert_eq!(title, "Explain recursion in simple te...");
        }

        #[test]
        fn truncation_counts_characters_not_bytes() {
            let content = "é".repeat(31);
            let title = derive_title(&content);
            assert_eq!(title, format!("{}...", "é".repeat(30)));
        }
    }
}
