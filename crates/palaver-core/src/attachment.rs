//! Data-URI attachment payloads.
//!
//! The presentation layer hands attachments around as
//! `data:<mime>;base64,<payload>` strings; the client contract wants the
//! MIME type and raw bytes. This module converts between the two. Callers
//! decide what to do with a string that fails to parse; the send path
//! skips that attachment and keeps the rest of the batch.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use thiserror::Error;

use crate::client::ImagePayload;

/// Why a `data:` URI could not be decoded.
#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("not a data URI")]
    NotADataUri,

    #[error("data URI is not base64-encoded")]
    NotBase64,

    #[error("invalid base64 payload: {0}")]
    InvalidPayload(#[from] base64::DecodeError),
}

/// Encode raw bytes as a `data:<mime>;base64,<payload>` URI.
pub fn encode_data_uri(mime_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, BASE64.encode(data))
}

/// Parse a `data:` URI into its MIME type and raw bytes.
pub fn parse_data_uri(uri: &str) -> Result<ImagePayload, AttachmentError> {
    let rest = uri.strip_prefix("data:").ok_or(AttachmentError::NotADataUri)?;
    let (mime_type, payload) = rest
        .split_once(";base64,")
        .ok_or(AttachmentError::NotBase64)?;
    let data = BASE64.decode(payload)?;
    Ok(ImagePayload {
        mime_type: mime_type.to_string(),
        data,
    })
}
