// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Consumer of the `messages` queue: plain sends with no identity tracking.

use std::sync::Arc;

use async_trait::async_trait;

use octorelay_core::{ChatApi, ChatError, RelayError};
use octorelay_queue::events::OutgoingMessage;
use octorelay_queue::{EventHandler, Outcome};

pub struct MessageHandler {
    chat: Arc<dyn ChatApi>,
}

impl MessageHandler {
    pub fn new(chat: Arc<dyn ChatApi>) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl EventHandler for MessageHandler {
    type Event = OutgoingMessage;

    fn name(&self) -> &str {
        "messages"
    }

    async fn handle(&self, message: OutgoingMessage) -> Result<Outcome, RelayError> {
        match self.chat.send_message(message.chat_id, &message.text, None).await {
            Ok(_) => Ok(Outcome::Done),
            // The bot left or the chat is gone; nothing to retry.
            Err(ChatError::NotFound(why)) => Ok(Outcome::skip(why)),
            Err(e) => Err(e.into()),
        }
    }
}
