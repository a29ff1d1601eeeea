//! The owned session collection and its mutation API.
//!
//! Every mutation of session state flows through [`SessionStore`], so the
//! structural invariants live in one place: sessions stay ordered newest
//! first, a session holds at most one streaming message, message history is
//! append-only, and only the streaming tail may be edited: by appending
//! text, or by replacing grounding metadata and the generated image.

use thiserror::Error;

use crate::attachment;
use crate::client::ResponseFragment;

use super::state::{ChatSession, Message, MessageId, SessionId};

/// A mutation that could not be applied.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("message not found: {0}")]
    MessageNotFound(MessageId),

    #[error("session already has a streaming message")]
    AlreadyStreaming,

    #[error("message is not streaming")]
    NotStreaming,
}

/// In-memory ordered collection of sessions. The single source of truth
/// every other component reads from and writes through.
#[derive(Default)]
pub struct SessionStore {
    sessions: Vec<ChatSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a loaded collection, restoring newest-first
    /// order regardless of how the sessions were stored.
    pub fn from_sessions(mut sessions: Vec<ChatSession>) -> Self {
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self { sessions }
    }

    /// All sessions, newest first.
    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Look up a session by id.
    pub fn get(&self, id: &SessionId) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| &s.id == id)
    }

    fn get_mut(&mut self, id: &SessionId) -> Result<&mut ChatSession, StoreError> {
        self.sessions
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| StoreError::SessionNotFound(id.clone()))
    }

    /// Insert a freshly created session at the front of the list.
    pub fn add_session(&mut self, session: ChatSession) {
        self.sessions.insert(0, session);
    }

    /// Remove a session entirely. Returns the removed session, if any.
    pub fn remove_session(&mut self, id: &SessionId) -> Option<ChatSession> {
        let index = self.sessions.iter().position(|s| &s.id == id)?;
        Some(self.sessions.remove(index))
    }

    /// Replace a session's title.
    pub fn set_title(&mut self, id: &SessionId, title: impl Into<String>) -> Result<(), StoreError> {
        self.get_mut(id)?.title = title.into();
        Ok(())
    }

    /// Append a message to a session's history.
    ///
    /// Appending a streaming message while another is still in flight is
    /// rejected: at most one message per session streams at a time.
    pub fn append_message(
        &mut self,
        id: &SessionId,
        message: Message,
    ) -> Result<(), StoreError> {
        let session = self.get_mut(id)?;
        if message.is_streaming && session.has_streaming_message() {
            return Err(StoreError::AlreadyStreaming);
        }
        session.messages.push(message);
        Ok(())
    }

    /// Fold one response fragment into the in-flight message.
    ///
    /// Text deltas append verbatim; grounding metadata and inline images
    /// replace what the message held before. Inline image bytes are stored
    /// in `data:` URI form.
    pub fn merge_fragment(
        &mut self,
        session_id: &SessionId,
        message_id: &MessageId,
        fragment: &ResponseFragment,
    ) -> Result<(), StoreError> {
        let message = Self::find_message(self.get_mut(session_id)?, message_id)?;
        if !message.is_streaming {
            return Err(StoreError::NotStreaming);
        }

        if let Some(delta) = &fragment.text {
            message.content.push_str(delta);
        }
        if let Some(grounding) = &fragment.grounding {
            message.grounding = Some(grounding.clone());
        }
        if let Some(image) = &fragment.inline_image {
            message.image = Some(attachment::encode_data_uri(&image.mime_type, &image.data));
        }
        Ok(())
    }

    /// Clear a message's streaming flag. The sole terminal transition: the
    /// flag never comes back for that message.
    pub fn finalize_message(
        &mut self,
        session_id: &SessionId,
        message_id: &MessageId,
    ) -> Result<(), StoreError> {
        let message = Self::find_message(self.get_mut(session_id)?, message_id)?;
        if !message.is_streaming {
            return Err(StoreError::NotStreaming);
        }
        message.is_streaming = false;
        Ok(())
    }

    fn find_message<'a>(
        session: &'a mut ChatSession,
        message_id: &MessageId,
    ) -> Result<&'a mut Message, StoreError> {
        session
            .messages
            .iter_mut()
            .find(|m| &m.id == message_id)
            .ok_or_else(|| StoreError::MessageNotFound(message_id.clone()))
    }
}
