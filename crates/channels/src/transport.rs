use async_trait::async_trait;

use crate::{Result, event::FileRef};

/// A button that sends back `data` instead of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub data: String,
}

/// Optional controls attached to an outbound message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReplyMarkup {
    #[default]
    None,
    /// Persistent menu of text buttons, one inner vec per row.
    Menu(Vec<Vec<String>>),
    /// One-shot choices, one per row.
    Choices(Vec<Choice>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub text: String,
    pub markup: ReplyMarkup,
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: ReplyMarkup::None,
        }
    }

    #[must_use]
    pub fn with_markup(mut self, markup: ReplyMarkup) -> Self {
        self.markup = markup;
        self
    }
}

/// How an attachment should be retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Download the complete file.
    Bytes,
    /// Resolve a direct download link without transferring the file.
    Link,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    Bytes(Vec<u8>),
    Link(String),
}

/// Send side of a chat platform, plus attachment retrieval.
///
/// Implementations must be safe to call concurrently from many user workers.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, chat_id: &str, message: &OutboundMessage) -> Result<()>;

    /// Show a "typing" indicator.
    async fn send_typing(&self, chat_id: &str) -> Result<()>;

    async fn fetch_attachment(&self, file: &FileRef, mode: FetchMode) -> Result<Fetched>;

    async fn send_text(&self, chat_id: &str, text: &str) -> Result<()> {
        self.send(chat_id, &OutboundMessage::text(text)).await
    }
}
