//! Generation client contract.
//!
//! The concrete network client lives outside this crate. Palaver depends
//! only on this capability surface: create a conversation context seeded
//! with prior exchanges, then send one user turn into it and consume the
//! streamed reply. Per-model capability toggles are a static lookup, not a
//! runtime negotiation.

pub mod fragment;

pub use fragment::{CitationSource, GroundingMetadata, ImagePayload, ResponseFragment};

use std::pin::Pin;

use async_trait::async_trait;
use thiserror::Error;
use tokio_stream::Stream;

use crate::session::Role;

/// The model selected for new conversations by default.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// The one model that returns inline images instead of searching the web.
pub const IMAGE_MODEL: &str = "gemini-2.0-flash-preview-image-generation";

/// Models the client can be pointed at.
pub const AVAILABLE_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.5-pro", IMAGE_MODEL];

/// Opaque handle to a conversation context held by the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextHandle(pub String);

/// One exchange turn used to seed a conversation context: role plus the
/// textual record only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTurn {
    pub role: Role,
    pub text: String,
}

/// Failure raised by the generation client. Propagates to the caller
/// without retry.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("generation failed: {0}")]
    Generation(String),
}

/// Lazy, finite, single-consumption sequence of response fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<ResponseFragment, ClientError>> + Send>>;

/// Capability surface the generation backend must expose.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Initialize a conversation context for `model_id`, seeded with the
    /// given ordered exchange history.
    async fn create_context(&self, model_id: &str, history: Vec<HistoryTurn>) -> ContextHandle;

    /// Send one user turn into `context` and return the streamed reply.
    async fn send(
        &self,
        context: &ContextHandle,
        text: &str,
        attachments: &[ImagePayload],
    ) -> Result<FragmentStream, ClientError>;
}

/// Per-model capability toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelCapabilities {
    /// Web-search augmentation, the source of citation metadata.
    pub web_search: bool,

    /// Inline image output.
    pub image_output: bool,
}

/// Static capability lookup: every model gets web search except the image
/// model, which is the only one that may return inline images.
pub fn capabilities_for(model_id: &str) -> ModelCapabilities {
    let image_only = model_id == IMAGE_MODEL;
    ModelCapabilities {
        web_search: !image_only,
        image_output: image_only,
    }
}
