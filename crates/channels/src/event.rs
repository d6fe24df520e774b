use serde::{Deserialize, Serialize};

use crate::content::ContentKind;

/// Opaque platform reference to a downloadable file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileRef(pub String);

impl FileRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The user an inbound event came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    /// Stable platform user id; owns the session.
    pub id: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
}

impl Sender {
    /// "First Last", falling back to the username, then the id.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        let full = full.trim();
        if !full.is_empty() {
            return full.to_string();
        }
        self.username.clone().unwrap_or_else(|| self.id.clone())
    }

    #[must_use]
    pub fn language(&self) -> &str {
        self.language_code
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or("en")
    }
}

/// A normalized inbound event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundDescriptor {
    pub chat_id: String,
    pub sender: Sender,
    /// Unix seconds.
    pub timestamp: i64,
    pub event: InboundEvent,
}

impl InboundDescriptor {
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.sender.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEvent {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEvent {
    pub file: FileRef,
    pub mime_type: Option<String>,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEvent {
    pub file: FileRef,
    pub mime_type: Option<String>,
    pub file_name: Option<String>,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioEvent {
    pub file: FileRef,
    pub mime_type: Option<String>,
    pub file_name: Option<String>,
    pub caption: Option<String>,
    /// Recorded voice note rather than an uploaded audio file.
    pub voice: bool,
}

/// Platform slash commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// `/start`: reset the conversation.
    Start,
    /// `/delete_all_history`: drop orchestrator-side history for this chat.
    DeleteAllHistory,
}

impl Command {
    /// Parse `/start`, `/start@botname` and friends.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.trim().strip_prefix('/')?.split_whitespace().next()?;
        let name = word.split('@').next().unwrap_or(word);
        match name {
            "start" => Some(Self::Start),
            "delete_all_history" => Some(Self::DeleteAllHistory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEvent {
    pub command: Command,
}

/// A discrete model choice (inline button press), not free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSelection {
    pub model_id: String,
}

impl ModelSelection {
    /// Callback data prefix of model choice buttons.
    pub const CALLBACK_PREFIX: &'static str = "select_model:";

    #[must_use]
    pub fn callback_data(model_id: &str) -> String {
        format!("{}{model_id}", Self::CALLBACK_PREFIX)
    }

    /// Parse `select_model:<id>` button data.
    #[must_use]
    pub fn from_callback_data(data: &str) -> Option<Self> {
        data.strip_prefix(Self::CALLBACK_PREFIX)
            .filter(|id| !id.is_empty())
            .map(|id| Self {
                model_id: id.to_string(),
            })
    }
}

/// Content the bridge has no representation for (stickers, video, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsupportedEvent {
    /// Platform media label, for logging.
    pub media: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    Text(TextEvent),
    Image(ImageEvent),
    Document(DocumentEvent),
    Audio(AudioEvent),
    Command(CommandEvent),
    ModelSelected(ModelSelection),
    Unsupported(UnsupportedEvent),
}

/// What the content resolver needs to know about one attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentDescriptor {
    pub kind: ContentKind,
    pub file: FileRef,
    pub mime_type: Option<String>,
    pub file_name: Option<String>,
    pub caption: Option<String>,
}

impl AttachmentDescriptor {
    /// Reported MIME type, or the kind's default.
    #[must_use]
    pub fn effective_mime(&self) -> &str {
        self.mime_type
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.kind.default_mime())
    }
}

impl InboundEvent {
    /// Content kind of user content; `None` for commands and selections.
    #[must_use]
    pub fn content_kind(&self) -> Option<ContentKind> {
        match self {
            Self::Text(_) => Some(ContentKind::Text),
            Self::Image(_) => Some(ContentKind::Image),
            Self::Document(_) => Some(ContentKind::Document),
            Self::Audio(_) => Some(ContentKind::Audio),
            Self::Command(_) | Self::ModelSelected(_) | Self::Unsupported(_) => None,
        }
    }

    /// The attachment carried by image, document and audio events.
    #[must_use]
    pub fn attachment(&self) -> Option<AttachmentDescriptor> {
        match self {
            Self::Image(e) => Some(AttachmentDescriptor {
                kind: ContentKind::Image,
                file: e.file.clone(),
                mime_type: e.mime_type.clone(),
                file_name: None,
                caption: e.caption.clone(),
            }),
            Self::Document(e) => Some(AttachmentDescriptor {
                kind: ContentKind::Document,
                file: e.file.clone(),
                mime_type: e.mime_type.clone(),
                file_name: e.file_name.clone(),
                caption: e.caption.clone(),
            }),
            Self::Audio(e) => Some(AttachmentDescriptor {
                kind: ContentKind::Audio,
                file: e.file.clone(),
                mime_type: e.mime_type.clone(),
                file_name: e.file_name.clone(),
                caption: e.caption.clone(),
            }),
            Self::Text(_) | Self::Command(_) | Self::ModelSelected(_) | Self::Unsupported(_) => {
                None
            },
        }
    }
}
