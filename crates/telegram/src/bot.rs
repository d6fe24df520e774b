use std::time::Duration;

use {
    courier_channels::InboundDescriptor,
    courier_config::TelegramConfig,
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, UpdateKind},
    },
    tokio::{sync::mpsc, task::JoinHandle},
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use courier_metrics::{counter, telegram as metrics_telegram};

use crate::{
    inbound::{descriptor_from_callback, descriptor_from_message},
    transport::TelegramTransport,
};

/// Slash commands registered for client autocomplete.
pub const BOT_COMMANDS: &[(&str, &str)] = &[
    ("start", "Start a new chat"),
    ("delete_all_history", "Delete all conversation history"),
];

/// Pause after a failed `getUpdates` before polling again.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Headroom between the long-poll timeout and the HTTP client timeout.
const CLIENT_TIMEOUT_MARGIN_SECS: u64 = 15;

/// Build a bot whose HTTP client outlives one long-poll request.
pub fn build_bot(config: &TelegramConfig) -> anyhow::Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(
            u64::from(config.poll_timeout_secs) + CLIENT_TIMEOUT_MARGIN_SECS,
        ))
        .build()?;
    Ok(Bot::with_client(config.token.expose_secret(), client))
}

/// Verify the token, clear any webhook so long polling works, and register
/// the slash commands.
pub async fn connect(bot: &Bot) -> anyhow::Result<()> {
    let me = bot.get_me().await?;
    bot.delete_webhook().send().await?;

    let commands: Vec<BotCommand> = BOT_COMMANDS
        .iter()
        .map(|(name, description)| BotCommand::new(*name, *description))
        .collect();
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!(error = %e, "failed to register bot commands");
    }

    info!(username = ?me.username, "telegram bot connected (webhook cleared)");
    Ok(())
}

/// Poll `getUpdates` until `cancel` fires, the receiver side of `events`
/// is dropped, or another poller takes over the token.
///
/// Button presses are acknowledged right away so the client stops its
/// spinner; the selection itself is delivered as an event.
pub async fn poll_updates(
    bot: Bot,
    poll_timeout_secs: u32,
    events: mpsc::Sender<InboundDescriptor>,
    cancel: CancellationToken,
) {
    info!("starting telegram polling loop");
    let mut offset: i32 = 0;

    loop {
        let request = bot
            .get_updates()
            .offset(offset)
            .timeout(poll_timeout_secs)
            .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery])
            .send();

        let result = tokio::select! {
            () = cancel.cancelled() => break,
            result = request => result,
        };

        let updates = match result {
            Ok(updates) => updates,
            Err(RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) => {
                warn!("telegram polling stopped: another instance is running with this token");
                cancel.cancel();
                break;
            },
            Err(e) => {
                #[cfg(feature = "metrics")]
                counter!(metrics_telegram::POLL_ERRORS_TOTAL).increment(1);
                warn!(error = %e, "telegram getUpdates failed");
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(RETRY_DELAY) => continue,
                }
            },
        };

        debug!(count = updates.len(), "got telegram updates");
        for update in updates {
            offset = update.id.as_offset();
            let descriptor = match update.kind {
                UpdateKind::Message(msg) => descriptor_from_message(&msg),
                UpdateKind::CallbackQuery(query) => {
                    if let Err(e) = bot.answer_callback_query(&query.id).await {
                        debug!(error = %e, "failed to answer callback query");
                    }
                    descriptor_from_callback(&query)
                },
                other => {
                    debug!("ignoring update: {other:?}");
                    None
                },
            };
            let Some(descriptor) = descriptor else {
                continue;
            };
            if events.send(descriptor).await.is_err() {
                info!("event receiver closed, stopping telegram polling");
                return;
            }
        }
    }

    info!("telegram polling stopped");
}

/// Connect and spawn the polling loop.
///
/// Returns the transport for outbound traffic and the loop's handle.
pub async fn start_polling(
    config: &TelegramConfig,
    events: mpsc::Sender<InboundDescriptor>,
    cancel: CancellationToken,
) -> anyhow::Result<(TelegramTransport, JoinHandle<()>)> {
    let bot = build_bot(config)?;
    connect(&bot).await?;

    let handle = tokio::spawn(poll_updates(
        bot.clone(),
        config.poll_timeout_secs,
        events,
        cancel,
    ));
    Ok((TelegramTransport::new(bot), handle))
}
