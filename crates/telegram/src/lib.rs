//! Telegram transport for courier.
//!
//! Long-polls `getUpdates`, converts messages and button presses into
//! [`courier_channels::InboundDescriptor`]s, and implements
//! [`courier_channels::Transport`] on top of the Bot API.

pub mod bot;
pub mod error;
pub mod inbound;
pub mod transport;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod mock_api;

pub use {
    bot::{BOT_COMMANDS, build_bot, connect, poll_updates, start_polling},
    error::{Error, Result},
    transport::TelegramTransport,
};
