//! Session state and the owned session store.
//!
//! [`state`] holds the data model (messages, sessions, ids) and [`store`]
//! holds the collection every other component reads from and mutates
//! through.

pub mod state;
pub mod store;

pub use state::{
    derive_title, ChatSession, Message, MessageId, Role, SessionId, TITLE_MAX_CHARS,
    UNTITLED_SESSION,
};
pub use store::{SessionStore, StoreError};
