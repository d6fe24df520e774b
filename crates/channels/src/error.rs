use std::error::Error as StdError;

/// Crate-wide result type for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed transport errors shared by every platform implementation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Chat id, file reference or similar input is malformed.
    #[error("invalid transport input: {message}")]
    InvalidInput { message: String },

    /// The platform refused or could not serve the request right now.
    #[error("transport unavailable: {message}")]
    Unavailable { message: String },

    /// Wrapped source error from the platform SDK or HTTP client.
    #[error("transport operation failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
