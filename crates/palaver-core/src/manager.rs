//! Session lifecycle management.
//!
//! [`ChatManager`] is the single entry point the presentation layer drives.
//! It owns the session store, the persistence adapter, and the conversation
//! context slot, and it enforces the one-send-in-flight rule for the whole
//! application: while a reply is streaming, selecting another session,
//! starting a new chat, switching models, and deleting sessions are all
//! rejected outright, never queued, never cancelled.
//!
//! Context rebuilds are explicit. They happen at exactly four points
//! (startup, new chat, session switch, model switch) and always replace the
//! context wholesale from projected history. Merging a streamed fragment
//! never triggers a rebuild.
//!
//! The manager expects to be driven from a single logical thread of
//! control (a UI event loop); its only suspension points are awaiting the
//! next fragment and awaiting the generation client.

use std::sync::Arc;

use thiserror::Error;

use crate::attachment;
use crate::client::{ContextHandle, GenerationClient, ImagePayload, DEFAULT_MODEL};
use crate::history::project_history;
use crate::merge;
use crate::persistence::SessionArchive;
use crate::session::{
    derive_title, ChatSession, Message, Role, SessionId, SessionStore, StoreError,
    UNTITLED_SESSION,
};

/// User-facing notice shown in place of a reply when generation fails.
pub const GENERATION_FAILED_NOTICE: &str =
    "Something went wrong while generating a response. Please try again.";

/// A lifecycle operation that could not be carried out.
#[derive(Error, Debug)]
pub enum ChatError {
    /// A send is in flight; the operation is rejected, not queued.
    #[error("a send is already in flight")]
    Busy,

    /// Nothing to send: empty text and no usable attachments.
    #[error("nothing to send")]
    EmptySend,

    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Owns the conversation sessions and drives sends against the generation
/// client.
pub struct ChatManager {
    store: SessionStore,
    archive: SessionArchive,
    client: Arc<dyn GenerationClient>,
    model_id: String,
    active: Option<SessionId>,
    context: ContextHandle,
    sending: bool,
}

impl ChatManager {
    /// Load persisted sessions and prepare an empty conversation context
    /// for the default model.
    pub async fn new(archive: SessionArchive, client: Arc<dyn GenerationClient>) -> Self {
        Self::with_model(archive, client, DEFAULT_MODEL).await
    }

    /// Like [`ChatManager::new`], but starting on a specific model.
    pub async fn with_model(
        archive: SessionArchive,
        client: Arc<dyn GenerationClient>,
        model_id: &str,
    ) -> Self {
        let store = SessionStore::from_sessions(archive.load());
        let context = client.create_context(model_id, Vec::new()).await;
        Self {
            store,
            archive,
            client,
            model_id: model_id.to_string(),
            active: None,
            context,
            sending: false,
        }
    }

    // ------------------------------------------------------------------
    // Read surface
    // ------------------------------------------------------------------

    /// All sessions, newest first.
    pub fn sessions(&self) -> &[ChatSession] {
        self.store.sessions()
    }

    pub fn active_session_id(&self) -> Option<&SessionId> {
        self.active.as_ref()
    }

    /// The active session's messages, or an empty slice when no session is
    /// active.
    pub fn active_messages(&self) -> &[Message] {
        self.active
            .as_ref()
            .and_then(|id| self.store.get(id))
            .map(|session| session.messages.as_slice())
            .unwrap_or(&[])
    }

    /// True while a send is in flight.
    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// The currently selected model.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Leave the active session and prepare a fresh, empty context. No
    /// session record is created; that is deferred to the first send.
    pub async fn new_chat(&mut self) -> Result<(), ChatError> {
        if self.sending {
            return Err(ChatError::Busy);
        }
        self.active = None;
        self.context = self.client.create_context(&self.model_id, Vec::new()).await;
        Ok(())
    }

    /// Make a stored session the active one and rebuild the conversation
    /// context from its projected history.
    pub async fn select_session(&mut self, id: &SessionId) -> Result<(), ChatError> {
        if self.sending {
            return Err(ChatError::Busy);
        }
        let session = self
            .store
            .get(id)
            .ok_or_else(|| ChatError::SessionNotFound(id.clone()))?;

        let history = project_history(&session.messages);
        self.active = Some(id.clone());
        self.context = self.client.create_context(&self.model_id, history).await;
        Ok(())
    }

    /// Remove a session. Removing the active session behaves like
    /// [`ChatManager::new_chat`] afterwards. Removing an unknown id is a
    /// no-op.
    pub async fn delete_session(&mut self, id: &SessionId) -> Result<(), ChatError> {
        if self.sending {
            return Err(ChatError::Busy);
        }
        if self.store.remove_session(id).is_none() {
            return Ok(());
        }

        // Written unconditionally - an empty collection must still land on
        // disk, or the deleted session would come back on the next start.
        if let Err(err) = self.archive.save(self.store.sessions()) {
            log::warn!("failed to persist session delete: {err}");
        }

        if self.active.as_ref() == Some(id) {
            self.active = None;
            self.context = self.client.create_context(&self.model_id, Vec::new()).await;
        }
        Ok(())
    }

    /// Switch models and rebuild the context from the active session's
    /// projected history.
    pub async fn set_model(&mut self, model_id: &str) -> Result<(), ChatError> {
        if self.sending {
            return Err(ChatError::Busy);
        }
        self.model_id = model_id.to_string();

        let history = self
            .active
            .as_ref()
            .and_then(|id| self.store.get(id))
            .map(|session| project_history(&session.messages))
            .unwrap_or_default();
        self.context = self.client.create_context(&self.model_id, history).await;
        Ok(())
    }

    /// Send one user turn and merge the streamed reply.
    ///
    /// Rejected synchronously when there is nothing to send or a send is
    /// already in flight. A generation failure is not an `Err` here: it
    /// surfaces as a fixed error message in the session, the only kind of
    /// failure this layer shows the user.
    pub async fn send_message(
        &mut self,
        text: &str,
        attachments: Vec<String>,
    ) -> Result<(), ChatError> {
        let text = text.trim();
        if text.is_empty() && attachments.is_empty() {
            return Err(ChatError::EmptySend);
        }
        if self.sending {
            return Err(ChatError::Busy);
        }

        // Decode attachments up front. A bad one is skipped and the rest of
        // the batch still goes through; the stored message only references
        // attachments that were actually sent.
        let mut kept = Vec::new();
        let mut payloads: Vec<ImagePayload> = Vec::new();
        for uri in attachments {
            match attachment::parse_data_uri(&uri) {
                Ok(payload) => {
                    payloads.push(payload);
                    kept.push(uri);
                }
                Err(err) => log::warn!("skipping undecodable attachment: {err}"),
            }
        }
        if text.is_empty() && kept.is_empty() {
            return Err(ChatError::EmptySend);
        }

        // Session creation is deferred to the first send. The context slot
        // already holds a fresh empty context in that case, so it is not
        // rebuilt here.
        let session_id = match &self.active {
            Some(id) => id.clone(),
            None => {
                let session = ChatSession::new();
                let id = session.id.clone();
                self.store.add_session(session);
                self.active = Some(id.clone());
                id
            }
        };

        self.store
            .append_message(&session_id, Message::user(text, kept))?;
        self.derive_title_if_untitled(&session_id)?;
        self.persist();

        let placeholder = Message::streaming_placeholder();
        let message_id = placeholder.id.clone();
        self.store.append_message(&session_id, placeholder)?;
        self.persist();

        self.sending = true;
        let client = Arc::clone(&self.client);
        let context = self.context.clone();
        let merged = match client.send(&context, text, &payloads).await {
            Ok(stream) => {
                let archive = &self.archive;
                merge::merge_stream(stream, &mut self.store, &session_id, &message_id, |store| {
                    if !store.is_empty() {
                        if let Err(err) = archive.save(store.sessions()) {
                            log::warn!("failed to persist sessions mid-stream: {err}");
                        }
                    }
                })
                .await
            }
            Err(err) => Err(merge::MergeError::Client(err)),
        };

        if let Err(err) = merged {
            log::warn!("generation failed: {err}");
            // Keep whatever was merged before the failure, then surface the
            // fixed notice as its own message.
            if let Err(err) = self.store.finalize_message(&session_id, &message_id) {
                log::debug!("could not finalize failed reply: {err}");
            }
            if let Err(err) = self
                .store
                .append_message(&session_id, Message::error(GENERATION_FAILED_NOTICE))
            {
                log::warn!("could not record generation failure: {err}");
            }
            self.persist();
        }

        self.sending = false;
        Ok(())
    }

    /// The first user message names the session, exactly once.
    fn derive_title_if_untitled(&mut self, session_id: &SessionId) -> Result<(), ChatError> {
        let Some(session) = self.store.get(session_id) else {
            return Ok(());
        };
        if session.title != UNTITLED_SESSION {
            return Ok(());
        }
        let Some(first) = session.messages.iter().find(|m| m.role == Role::User) else {
            return Ok(());
        };
        let title = derive_title(&first.content);
        self.store.set_title(session_id, title)?;
        Ok(())
    }

    /// Write the collection after a mutation. The empty collection is
    /// skipped here; deletion saves explicitly so a removed session cannot
    /// be resurrected by a skipped write.
    fn persist(&self) {
        if self.store.is_empty() {
            return;
        }
        if let Err(err) = self.archive.save(self.store.sessions()) {
            log::warn!("failed to persist sessions: {err}");
        }
    }

    #[cfg(test)]
    fn mark_sending(&mut self) {
        self.sending = true;
    }
}
