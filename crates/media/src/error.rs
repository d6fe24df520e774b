use std::error::Error as StdError;

use courier_channels::ContentKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Kind or MIME type the bridge does not accept.
    #[error("unsupported {kind} content: {mime_type}")]
    UnsupportedContent {
        kind: ContentKind,
        mime_type: String,
    },

    /// A download or upload failed or timed out.
    #[error("attachment fetch failed: {context}")]
    AttachmentFetchFailed {
        context: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}

impl Error {
    #[must_use]
    pub fn unsupported(kind: ContentKind, mime_type: impl Into<String>) -> Self {
        Self::UnsupportedContent {
            kind,
            mime_type: mime_type.into(),
        }
    }

    #[must_use]
    pub fn fetch_failed(context: impl Into<String>) -> Self {
        Self::AttachmentFetchFailed {
            context: context.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn fetch_failed_with<E>(context: impl Into<String>, source: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self::AttachmentFetchFailed {
            context: context.into(),
            source: Some(source.into()),
        }
    }

    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedContent { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
