use {
    async_trait::async_trait,
    courier_channels::{FetchMode, Fetched, FileRef, OutboundMessage, ReplyMarkup, Transport},
    teloxide::{
        payloads::SendMessageSetters,
        prelude::*,
        types::{
            ChatAction, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton,
            KeyboardMarkup,
        },
    },
    tracing::{debug, warn},
};

#[cfg(feature = "metrics")]
use courier_metrics::{counter, telegram as metrics_telegram};

use crate::error::{Error, Result};

/// Bot API limit for one text message.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// [`Transport`] over the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// Direct download URL of a file path returned by `getFile`.
    fn file_url(&self, path: &str) -> String {
        let api = self.bot.api_url();
        let base = api.as_str().trim_end_matches('/');
        format!("{base}/file/bot{}/{path}", self.bot.token())
    }

    async fn send_message(&self, chat_id: &str, message: &OutboundMessage) -> Result<()> {
        let chat = parse_chat_id(chat_id)?;
        let parts = split_text(&message.text, MAX_MESSAGE_LEN);
        let last = parts.len().saturating_sub(1);

        for (i, part) in parts.into_iter().enumerate() {
            let req = self.bot.send_message(chat, part);
            // markup goes on the final part so buttons sit under the whole reply
            let result = match (&message.markup, i == last) {
                (ReplyMarkup::Menu(rows), true) => req.reply_markup(menu_keyboard(rows)).await,
                (ReplyMarkup::Choices(choices), true) => {
                    req.reply_markup(choice_keyboard(choices)).await
                },
                _ => req.await,
            };
            if let Err(e) = result {
                #[cfg(feature = "metrics")]
                counter!(metrics_telegram::SEND_ERRORS_TOTAL).increment(1);
                return Err(e.into());
            }
            #[cfg(feature = "metrics")]
            counter!(metrics_telegram::MESSAGES_SENT_TOTAL).increment(1);
        }

        debug!(chat_id, len = message.text.len(), "telegram message sent");
        Ok(())
    }

    async fn fetch(&self, file: &FileRef, mode: FetchMode) -> Result<Fetched> {
        let meta = self.bot.get_file(file.as_str()).await?;
        let url = self.file_url(&meta.path);

        if mode == FetchMode::Link {
            return Ok(Fetched::Link(url));
        }

        let response = self.bot.client().get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::message(format!("file download failed: HTTP {status}")));
        }
        Ok(Fetched::Bytes(response.bytes().await?.to_vec()))
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send(&self, chat_id: &str, message: &OutboundMessage) -> courier_channels::Result<()> {
        if message.text.is_empty() {
            return Err(courier_channels::Error::invalid_input("empty message text"));
        }
        Ok(self.send_message(chat_id, message).await?)
    }

    async fn send_typing(&self, chat_id: &str) -> courier_channels::Result<()> {
        let chat = parse_chat_id(chat_id)?;
        if let Err(e) = self.bot.send_chat_action(chat, ChatAction::Typing).await {
            warn!(chat_id, error = %e, "failed to send typing indicator");
            return Err(Error::from(e).into());
        }
        Ok(())
    }

    async fn fetch_attachment(
        &self,
        file: &FileRef,
        mode: FetchMode,
    ) -> courier_channels::Result<Fetched> {
        Ok(self.fetch(file, mode).await?)
    }
}

fn parse_chat_id(chat_id: &str) -> Result<ChatId> {
    chat_id
        .parse::<i64>()
        .map(ChatId)
        .map_err(|_| Error::InvalidChatId(chat_id.to_string()))
}

fn menu_keyboard(rows: &[Vec<String>]) -> KeyboardMarkup {
    let rows: Vec<Vec<KeyboardButton>> = rows
        .iter()
        .map(|row| row.iter().map(KeyboardButton::new).collect())
        .collect();
    KeyboardMarkup::new(rows).resize_keyboard()
}

fn choice_keyboard(choices: &[courier_channels::Choice]) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = choices
        .iter()
        .map(|c| vec![InlineKeyboardButton::callback(c.label.clone(), c.data.clone())])
        .collect();
    InlineKeyboardMarkup::new(rows)
}

/// Split `text` into parts of at most `max_len` bytes, preferring newlines.
fn split_text(text: &str, max_len: usize) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = text;
    while rest.len() > max_len {
        let window = &rest[..rest.floor_char_boundary(max_len)];
        let cut = match window.rfind('\n') {
            Some(i) if i > 0 => i,
            _ if window.is_empty() => rest.ceil_char_boundary(1),
            _ => window.len(),
        };
        parts.push(&rest[..cut]);
        rest = &rest[cut..];
        rest = rest.strip_prefix('\n').unwrap_or(rest);
    }
    if !rest.is_empty() || parts.is_empty() {
        parts.push(rest);
    }
    parts
}
