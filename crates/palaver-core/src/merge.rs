//! Streaming merge engine.
//!
//! Consumes the client's lazy fragment stream and folds each fragment into
//! the one in-flight message, in arrival order, with no buffering or
//! reordering. After the stream is exhausted cleanly the in-flight message
//! is finalized, the sole transition out of the streaming state. A failure
//! mid-stream stops consumption; everything merged so far stays on the
//! message, and the caller decides what to show the user.
//!
//! Each applied fragment is reported through `on_mutation` so the caller
//! can persist eagerly while the reply is still arriving.

use thiserror::Error;
use tokio_stream::StreamExt;

use crate::client::{ClientError, FragmentStream};
use crate::session::{MessageId, SessionId, SessionStore, StoreError};

/// Why a merge ended before finalizing the in-flight message.
#[derive(Error, Debug)]
pub enum MergeError {
    /// The fragment stream failed. Fragments merged before the failure are
    /// retained on the message.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The in-flight message was not in a mergeable state.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Drive the fragment stream to completion against the in-flight message.
pub async fn merge_stream(
    mut fragments: FragmentStream,
    store: &mut SessionStore,
    session_id: &SessionId,
    message_id: &MessageId,
    mut on_mutation: impl FnMut(&SessionStore),
) -> Result<(), MergeError> {
    while let Some(item) = fragments.next().await {
        let fragment = item?;
        store.merge_fragment(session_id, message_id, &fragment)?;
        on_mutation(store);
    }

    store.finalize_message(session_id, message_id)?;
    on_mutation(store);
    Ok(())
}
