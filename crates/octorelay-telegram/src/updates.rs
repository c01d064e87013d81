// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long polling for incoming chat updates.
//!
//! `/commands` become [`ChatCommand`] events on the chat-command queue and
//! inline keyboard taps become [`CallbackQuery`] events on the Telegram
//! events queue. Everything else is ignored.

use octorelay_core::queues;
use octorelay_core::types::{ChatId, ChatMessageId};
use octorelay_queue::QueueClient;
use octorelay_queue::events::{CallbackQuery, ChatCommand};
use teloxide::prelude::*;
use teloxide::types::ChatKind;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Builds a command event from a text message, or `None` for plain chatter.
pub fn command_event(chat_id: i64, user_id: i64, private: bool, text: &str) -> Option<ChatCommand> {
    let text = text.trim();
    if !text.starts_with('/') || text.len() < 2 {
        return None;
    }
    Some(ChatCommand {
        chat_id: ChatId(chat_id),
        user_id,
        private,
        text: text.to_string(),
    })
}

/// Builds a callback event; taps without data or on inaccessible messages
/// carry nothing to route.
pub fn callback_event(
    chat_id: i64,
    message_id: i32,
    user_id: i64,
    private: bool,
    data: Option<&str>,
) -> Option<CallbackQuery> {
    let data = data.filter(|d| !d.is_empty())?;
    Some(CallbackQuery {
        chat_id: ChatId(chat_id),
        message_id: ChatMessageId(message_id),
        user_id,
        private,
        data: data.to_string(),
    })
}

async fn on_message(msg: Message, queue: QueueClient) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return respond(());
    };
    let user_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or_default();
    let private = matches!(msg.chat.kind, ChatKind::Private(_));
    let Some(event) = command_event(msg.chat.id.0, user_id, private, text) else {
        return respond(());
    };
    if let Err(e) = queue.publish(queues::TELEGRAM_CHAT_COMMAND, &event).await {
        warn!(chat_id = msg.chat.id.0, error = %e, "dropping chat command");
    }
    respond(())
}

async fn on_callback(bot: Bot, q: teloxide::types::CallbackQuery, queue: QueueClient) -> ResponseResult<()> {
    // Stop the client-side spinner right away; the work happens on the queue.
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        debug!(error = %e, "answerCallbackQuery failed");
    }
    let Some(message) = q.message.as_ref() else {
        debug!("callback query without a message");
        return respond(());
    };
    let chat = message.chat();
    let private = matches!(chat.kind, ChatKind::Private(_));
    let Some(event) = callback_event(
        chat.id.0,
        message.id().0,
        q.from.id.0 as i64,
        private,
        q.data.as_deref(),
    ) else {
        return respond(());
    };
    if let Err(e) = queue.publish(queues::TELEGRAM_EVENTS, &event).await {
        warn!(chat_id = chat.id.0, error = %e, "dropping callback query");
    }
    respond(())
}

/// Spawns the long-polling dispatcher. It stops when `cancel` fires.
pub fn spawn_polling(bot: Bot, queue: QueueClient, cancel: CancellationToken) -> JoinHandle<()> {
    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_callback_query().endpoint(on_callback));

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![queue])
        .default_handler(|_| async {})
        .build();
    let shutdown = dispatcher.shutdown_token();

    tokio::spawn(async move {
        cancel.cancelled().await;
        match shutdown.shutdown() {
            Ok(done) => done.await,
            Err(e) => debug!(error = ?e, "telegram dispatcher was not running"),
        }
    });

    info!("starting telegram long polling");
    tokio::spawn(async move {
        dispatcher.dispatch().await;
        info!("telegram long polling stopped");
    })
}
