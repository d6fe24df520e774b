//! Platform-neutral messaging types.
//!
//! Inbound platform updates are normalized into [`InboundDescriptor`]s, and
//! every transport (Telegram today) implements [`Transport`] for sending,
//! typing indicators and attachment retrieval.

pub mod content;
pub mod error;
pub mod event;
pub mod transport;

pub use {
    content::{ContentItem, ContentKind, Payload},
    error::{Error, Result},
    event::{
        AttachmentDescriptor, AudioEvent, Command, CommandEvent, DocumentEvent, FileRef,
        ImageEvent, InboundDescriptor, InboundEvent, ModelSelection, Sender, TextEvent,
        UnsupportedEvent,
    },
    transport::{Choice, FetchMode, Fetched, OutboundMessage, ReplyMarkup, Transport},
};
