use serde::{Deserialize, Serialize};

/// Earliest a platform file link may expire, in seconds.
///
/// Telegram guarantees download links for at least one hour; consumers must
/// not cache a [`Payload::Url`] beyond this window.
pub const MIN_LINK_VALIDITY_SECS: u64 = 3600;

/// Normalized category of inbound content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Image,
    Document,
    Audio,
}

impl ContentKind {
    /// MIME type assumed when the platform does not report one.
    #[must_use]
    pub fn default_mime(self) -> &'static str {
        match self {
            Self::Text => "text/plain",
            Self::Image => "image/jpeg",
            Self::Document => "application/octet-stream",
            Self::Audio => "audio/ogg",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Document => "document",
            Self::Audio => "audio",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an attachment is handed to the orchestrator.
///
/// Exactly one representation exists per item. `Inline` data is always the
/// complete base64 encoding of the downloaded bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Payload {
    /// Time-limited platform download link.
    Url { url: String, expires_after_secs: u64 },
    /// Base64 of the complete attachment.
    Inline { data: String },
    /// Durable object-store location.
    RemoteStored { url: String },
}

impl Payload {
    #[must_use]
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::Url { .. } => "url",
            Self::Inline { .. } => "inline",
            Self::RemoteStored { .. } => "remote_stored",
        }
    }
}

/// One normalized inbound attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub kind: ContentKind,
    pub payload: Payload,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}
