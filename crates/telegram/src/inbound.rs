//! Conversion of Bot API updates into [`InboundDescriptor`]s.

use {
    courier_channels::{
        AudioEvent, Command, CommandEvent, DocumentEvent, FileRef, ImageEvent, InboundDescriptor,
        InboundEvent, ModelSelection, Sender, TextEvent, UnsupportedEvent,
    },
    teloxide::types::{CallbackQuery, MediaKind, Message, MessageKind, User},
};

/// Telegram re-encodes every photo as JPEG.
const PHOTO_MIME: &str = "image/jpeg";

fn sender_from_user(user: &User) -> Sender {
    Sender {
        id: user.id.0.to_string(),
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()).filter(|n| !n.is_empty()),
        last_name: user.last_name.clone(),
        language_code: user.language_code.clone(),
    }
}

/// Normalize a message.
///
/// Returns `None` for service messages and for messages without a sender
/// (channel posts), which carry nothing a session can act on.
pub fn descriptor_from_message(msg: &Message) -> Option<InboundDescriptor> {
    let user = msg.from.as_ref()?;
    let MessageKind::Common(common) = &msg.kind else {
        return None;
    };

    let event = match &common.media_kind {
        MediaKind::Text(t) => match Command::parse(&t.text) {
            Some(command) => InboundEvent::Command(CommandEvent { command }),
            None => InboundEvent::Text(TextEvent {
                text: t.text.clone(),
            }),
        },
        MediaKind::Photo(p) => {
            // sizes are ordered smallest first
            let largest = p.photo.last()?;
            InboundEvent::Image(ImageEvent {
                file: FileRef::new(largest.file.id.clone()),
                mime_type: Some(PHOTO_MIME.to_string()),
                caption: p.caption.clone(),
            })
        },
        MediaKind::Document(d) => InboundEvent::Document(DocumentEvent {
            file: FileRef::new(d.document.file.id.clone()),
            mime_type: d.document.mime_type.as_ref().map(ToString::to_string),
            file_name: d.document.file_name.clone(),
            caption: d.caption.clone(),
        }),
        MediaKind::Audio(a) => InboundEvent::Audio(AudioEvent {
            file: FileRef::new(a.audio.file.id.clone()),
            mime_type: a.audio.mime_type.as_ref().map(ToString::to_string),
            file_name: a.audio.file_name.clone(),
            caption: a.caption.clone(),
            voice: false,
        }),
        MediaKind::Voice(v) => InboundEvent::Audio(AudioEvent {
            file: FileRef::new(v.voice.file.id.clone()),
            mime_type: v.voice.mime_type.as_ref().map(ToString::to_string),
            file_name: None,
            caption: v.caption.clone(),
            voice: true,
        }),
        other => InboundEvent::Unsupported(UnsupportedEvent {
            media: describe_media(other).to_string(),
        }),
    };

    Some(InboundDescriptor {
        chat_id: msg.chat.id.0.to_string(),
        sender: sender_from_user(user),
        timestamp: msg.date.timestamp(),
        event,
    })
}

/// Normalize an inline button press. Only model selections are recognized.
pub fn descriptor_from_callback(query: &CallbackQuery) -> Option<InboundDescriptor> {
    let selection = query
        .data
        .as_deref()
        .and_then(ModelSelection::from_callback_data)?;
    let chat_id = query
        .message
        .as_ref()
        .map(|m| m.chat().id.0)
        .unwrap_or(query.from.id.0 as i64);

    Some(InboundDescriptor {
        chat_id: chat_id.to_string(),
        sender: sender_from_user(&query.from),
        timestamp: courier_common::time::unix_now(),
        event: InboundEvent::ModelSelected(selection),
    })
}

fn describe_media(kind: &MediaKind) -> &'static str {
    match kind {
        MediaKind::Animation(_) => "animation",
        MediaKind::Contact(_) => "contact",
        MediaKind::Game(_) => "game",
        MediaKind::Location(_) => "location",
        MediaKind::Poll(_) => "poll",
        MediaKind::Sticker(_) => "sticker",
        MediaKind::Venue(_) => "venue",
        MediaKind::Video(_) => "video",
        MediaKind::VideoNote(_) => "video note",
        _ => "unknown media",
    }
}
