//! Message-context helpers shared by the per-crate error types.

/// Error types that can be built from a plain message string.
pub trait FromMessage: Sized {
    fn from_message(message: String) -> Self;
}

/// `.context()` / `.with_context()` for `Result` and `Option`, producing any
/// error type that implements [`FromMessage`].
///
/// ```ignore
/// use courier_common::Context;
///
/// let raw = std::fs::read_to_string(path).context("read session file")?;
/// ```
pub trait Context<T> {
    fn context<E: FromMessage>(self, context: impl Into<String>) -> Result<T, E>;

    fn with_context<E, C, F>(self, f: F) -> Result<T, E>
    where
        E: FromMessage,
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T, S: std::fmt::Display> Context<T> for Result<T, S> {
    fn context<E: FromMessage>(self, context: impl Into<String>) -> Result<T, E> {
        let ctx = context.into();
        self.map_err(|source| E::from_message(format!("{ctx}: {source}")))
    }

    fn with_context<E, C, F>(self, f: F) -> Result<T, E>
    where
        E: FromMessage,
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|source| E::from_message(format!("{}: {source}", f().into())))
    }
}

impl<T> Context<T> for Option<T> {
    fn context<E: FromMessage>(self, context: impl Into<String>) -> Result<T, E> {
        self.ok_or_else(|| E::from_message(context.into()))
    }

    fn with_context<E, C, F>(self, f: F) -> Result<T, E>
    where
        E: FromMessage,
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| E::from_message(f().into()))
    }
}
