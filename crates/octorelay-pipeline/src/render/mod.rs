// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Render state machine: one live chat message per tracked object.
//!
//! ```text
//! NoMessage --claim won--> Sending --sent--> Live
//!     ^                       |               |
//!     |                  send failed     edit: not found
//!     +-----------------------+---------------+
//! ```
//!
//! Concurrent renders of the same object are serialised by the unique claim
//! row, not by locks: only the renderer that inserted the claim sends. A
//! loser whose winner has not recorded a message id yet re-publishes its job
//! with a delay.

pub mod format;

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use octorelay_core::types::{
    ChatId, ChatMessageId, ClaimOutcome, RenderedMessage, Subscription, TrackedKind, TrackedObject,
    TrackedObjectId,
};
use octorelay_core::{ChatError, RelayError};
use octorelay_queue::events::RenderRequest;
use octorelay_queue::{EventHandler, Outcome};

use crate::context::RelayContext;

pub use format::{
    CheckSuiteFormatter, IssueFormatter, PullRequestFormatter, PushFormatter, SettingsFormatter,
};

const RECORD_ATTEMPTS: u32 = 3;
const RECORD_BACKOFF: Duration = Duration::from_millis(50);

/// Formats one kind of tracked object.
pub trait Formatter: Send + Sync + 'static {
    fn kind(&self) -> TrackedKind;

    fn format(
        &self,
        object: &TrackedObject,
        subscription: &Subscription,
    ) -> Result<RenderedMessage, RelayError>;
}

/// Result of the claim step.
enum FirstSend {
    /// This renderer sent the message.
    Sent,
    /// Someone else's message exists; edit it.
    Existing(ChatMessageId),
    /// Someone else is sending; the job was re-published with a delay.
    Requeued,
}

/// Render handler for the show queue of one tracked kind.
pub struct Renderer<F> {
    ctx: RelayContext,
    formatter: F,
    name: String,
}

impl<F: Formatter> Renderer<F> {
    pub fn new(ctx: RelayContext, formatter: F) -> Self {
        let name = format!("render:{}", formatter.kind());
        Self {
            ctx,
            formatter,
            name,
        }
    }

    /// Brings the chat message of `id` up to date with its `info`.
    pub async fn render(&self, id: TrackedObjectId) -> Result<Outcome, RelayError> {
        let store = &self.ctx.store;
        let Some(object) = store.tracked(id).await? else {
            return Ok(Outcome::skip("tracked object is gone"));
        };
        if object.kind != self.formatter.kind() {
            return Ok(Outcome::reject(format!(
                "{} object sent to the {} renderer",
                object.kind,
                self.formatter.kind()
            )));
        }
        let Some(subscription) = store.subscription(object.subscription_id).await? else {
            return Ok(Outcome::skip("subscription is gone"));
        };

        let message = self.formatter.format(&object, &subscription)?;
        let chat_id = subscription.chat_id;

        let existing = store
            .message_identity(id)
            .await?
            .and_then(|identity| identity.chat_message_id);
        let message_id = match existing {
            Some(message_id) => message_id,
            None => match self.first_send(&object, chat_id, &message).await? {
                FirstSend::Sent | FirstSend::Requeued => return Ok(Outcome::Done),
                FirstSend::Existing(message_id) => message_id,
            },
        };

        self.edit(&object, chat_id, message_id, &message).await
    }

    async fn first_send(
        &self,
        object: &TrackedObject,
        chat_id: ChatId,
        message: &RenderedMessage,
    ) -> Result<FirstSend, RelayError> {
        let store = &self.ctx.store;
        match store
            .claim_message_identity(object.id, self.ctx.settings.claim_ttl_secs)
            .await?
        {
            ClaimOutcome::Claimed => {
                let sent = self
                    .ctx
                    .chat
                    .send_message(chat_id, &message.text, message.keyboard.as_ref())
                    .await;
                match sent {
                    Ok(message_id) => {
                        self.record(object.id, message_id).await?;
                        debug!(
                            tracked_object_id = object.id.0,
                            message_id = message_id.0,
                            "message sent"
                        );
                        Ok(FirstSend::Sent)
                    }
                    Err(e) => {
                        if let Err(cleanup) = store.delete_message_identity(object.id, None).await {
                            warn!(
                                tracked_object_id = object.id.0,
                                error = %cleanup,
                                "failed to release claim"
                            );
                        }
                        Err(e.into())
                    }
                }
            }
            ClaimOutcome::Taken(identity) => match identity.chat_message_id {
                Some(message_id) => Ok(FirstSend::Existing(message_id)),
                None => {
                    debug!(tracked_object_id = object.id.0, "send in flight elsewhere, re-queueing");
                    self.ctx.request_render_later(object.kind, object.id).await?;
                    Ok(FirstSend::Requeued)
                }
            },
        }
    }

    /// Stores the id of a message that was just sent. The message already
    /// exists in the chat, so a failed write is retried before giving up.
    async fn record(&self, id: TrackedObjectId, message_id: ChatMessageId) -> Result<(), RelayError> {
        let mut attempt = 1;
        loop {
            match self.ctx.store.record_chat_message(id, message_id).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < RECORD_ATTEMPTS => {
                    warn!(
                        tracked_object_id = id.0,
                        message_id = message_id.0,
                        attempt,
                        error = %e,
                        "failed to record sent message, retrying"
                    );
                    tokio::time::sleep(RECORD_BACKOFF * attempt).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(
                        tracked_object_id = id.0,
                        message_id = message_id.0,
                        error = %e,
                        "sent message could not be recorded and is orphaned"
                    );
                    return Err(e);
                }
            }
        }
    }

    async fn edit(
        &self,
        object: &TrackedObject,
        chat_id: ChatId,
        message_id: ChatMessageId,
        message: &RenderedMessage,
    ) -> Result<Outcome, RelayError> {
        let edited = self
            .ctx
            .chat
            .edit_message_text(chat_id, message_id, &message.text, message.keyboard.as_ref())
            .await;
        match edited {
            Ok(()) | Err(ChatError::NotModified) => Ok(Outcome::Done),
            Err(ChatError::NotFound(reason)) => {
                let removed = self
                    .ctx
                    .store
                    .delete_message_identity(object.id, Some(message_id))
                    .await?;
                if removed {
                    info!(
                        tracked_object_id = object.id.0,
                        message_id = message_id.0,
                        reason = %reason,
                        "chat message gone, sending a new one"
                    );
                    self.ctx.request_render(object.kind, object.id).await?;
                }
                Ok(Outcome::Done)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl<F: Formatter> EventHandler for Renderer<F> {
    type Event = RenderRequest;

    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, request: RenderRequest) -> Result<Outcome, RelayError> {
        self.render(request.tracked_object_id).await
    }
}
