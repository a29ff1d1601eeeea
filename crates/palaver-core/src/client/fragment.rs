//! Wire types carried by the streamed response.

use serde::{Deserialize, Serialize};

/// Raw image bytes plus their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// A single web citation source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationSource {
    pub uri: String,
    pub title: String,
}

/// Web citation metadata attached to a generated reply.
///
/// Stored as reported by the model. Fragments replace it wholesale; it is
/// never merged or unioned across fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    pub sources: Vec<CitationSource>,
}

impl GroundingMetadata {
    /// Citation sources with duplicate URIs removed, first occurrence wins.
    ///
    /// Presentation helper for the layer that renders citations; the stored
    /// metadata keeps every source the model reported.
    pub fn unique_sources(&self) -> Vec<&CitationSource> {
        let mut seen = std::collections::HashSet::new();
        self.sources
            .iter()
            .filter(|s| seen.insert(s.uri.as_str()))
            .collect()
    }
}

/// One element of the streamed response sequence.
///
/// Any combination of the payloads may be present; an empty fragment is
/// legal and merges as a no-op.
#[derive(Debug, Clone, Default)]
pub struct ResponseFragment {
    /// Text delta, appended verbatim to the in-flight message.
    pub text: Option<String>,

    /// Citation metadata; replaces whatever the message held before.
    pub grounding: Option<GroundingMetadata>,

    /// Inline generated image; replaces the message's image.
    pub inline_image: Option<ImagePayload>,
}

impl ResponseFragment {
    /// A fragment carrying only a text delta.
    pub fn text(delta: impl Into<String>) -> Self {
        Self {
            text: Some(delta.into()),
            ..Self::default()
        }
    }
}
