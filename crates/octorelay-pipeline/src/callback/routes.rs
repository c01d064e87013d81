// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook settings keyboard routes.
//!
//! | pattern                                           | exact |
//! |---------------------------------------------------|-------|
//! | `webhook.:subscription`                           | no    |
//! | `webhook.:subscription.settings.:setting.:value`  | yes   |
//! | `webhook.:subscription.refresh`                   | yes   |
//!
//! Taps that cannot be acted on (forged ids, foreign chats, non-admins) are
//! logged and dropped without failing the delivery.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use octorelay_core::types::{SettingKey, Subscription, SubscriptionId};
use octorelay_core::{ChatError, RelayError};
use octorelay_queue::events::CallbackQuery;

use super::router::{Captures, RouteHandler, Router};
use crate::context::RelayContext;

/// Builds the route table.
pub fn build_router(ctx: &RelayContext) -> Router {
    Router::new()
        .route("webhook.:subscription", false, Arc::new(AuditRoute))
        .route(
            "webhook.:subscription.settings.:setting.:value",
            true,
            Arc::new(ToggleSettingRoute { ctx: ctx.clone() }),
        )
        .route(
            "webhook.:subscription.refresh",
            true,
            Arc::new(RefreshRoute { ctx: ctx.clone() }),
        )
}

/// Callback token of a settings toggle button.
pub fn toggle_token(subscription: SubscriptionId, key: SettingKey, value: bool) -> String {
    format!(
        "webhook.{subscription}.settings.{key}.{}",
        if value { "on" } else { "off" }
    )
}

pub fn refresh_token(subscription: SubscriptionId) -> String {
    format!("webhook.{subscription}.refresh")
}

fn subscription_id(captures: &Captures) -> Option<SubscriptionId> {
    captures
        .get("subscription")
        .and_then(|s| s.parse().ok())
        .map(SubscriptionId)
}

/// Loads the subscription a tap refers to. When it is gone, the tapped
/// message's keyboard is removed so the dead buttons disappear.
async fn load_subscription(
    ctx: &RelayContext,
    query: &CallbackQuery,
    id: SubscriptionId,
) -> Result<Option<Subscription>, RelayError> {
    if let Some(subscription) = ctx.store.subscription(id).await? {
        return Ok(Some(subscription));
    }
    debug!(subscription_id = id.0, "tap on a removed subscription");
    match ctx
        .chat
        .edit_message_reply_markup(query.chat_id, query.message_id, None)
        .await
    {
        Ok(()) | Err(ChatError::NotModified) | Err(ChatError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

struct AuditRoute;

#[async_trait]
impl RouteHandler for AuditRoute {
    fn name(&self) -> &str {
        "webhook-audit"
    }

    async fn handle(&self, query: &CallbackQuery, captures: Captures) -> Result<(), RelayError> {
        debug!(
            chat_id = query.chat_id.0,
            user_id = query.user_id,
            subscription = captures.get("subscription").map(String::as_str).unwrap_or_default(),
            data = %query.data,
            "webhook keyboard tap"
        );
        Ok(())
    }
}

struct ToggleSettingRoute {
    ctx: RelayContext,
}

impl ToggleSettingRoute {
    async fn allowed(&self, query: &CallbackQuery, subscription: &Subscription) -> Result<bool, RelayError> {
        if query.chat_id != subscription.chat_id {
            warn!(
                chat_id = query.chat_id.0,
                subscription_id = subscription.id.0,
                "settings tap from another chat"
            );
            return Ok(false);
        }
        if query.private {
            return Ok(true);
        }
        let member = self
            .ctx
            .chat
            .get_chat_member(query.chat_id, query.user_id)
            .await?;
        if !member.privileged {
            debug!(
                chat_id = query.chat_id.0,
                user_id = query.user_id,
                "settings tap from a non-administrator"
            );
        }
        Ok(member.privileged)
    }
}

#[async_trait]
impl RouteHandler for ToggleSettingRoute {
    fn name(&self) -> &str {
        "webhook-setting"
    }

    async fn handle(&self, query: &CallbackQuery, captures: Captures) -> Result<(), RelayError> {
        let key = captures
            .get("setting")
            .and_then(|s| SettingKey::from_str(s).ok());
        let value = match captures.get("value").map(String::as_str) {
            Some("on") => Some(true),
            Some("off") => Some(false),
            _ => None,
        };
        let (Some(id), Some(key), Some(value)) = (subscription_id(&captures), key, value) else {
            warn!(data = %query.data, "malformed settings token");
            return Ok(());
        };

        let Some(mut subscription) = load_subscription(&self.ctx, query, id).await? else {
            return Ok(());
        };
        if !self.allowed(query, &subscription).await? {
            return Ok(());
        }

        subscription.settings.set(key, value);
        self.ctx
            .store
            .update_settings(subscription.id, &subscription.settings)
            .await?;
        info!(
            subscription_id = subscription.id.0,
            setting = %key,
            value,
            "subscription setting changed"
        );
        self.ctx.request_settings_render(&subscription).await
    }
}

struct RefreshRoute {
    ctx: RelayContext,
}

#[async_trait]
impl RouteHandler for RefreshRoute {
    fn name(&self) -> &str {
        "webhook-refresh"
    }

    async fn handle(&self, query: &CallbackQuery, captures: Captures) -> Result<(), RelayError> {
        let Some(id) = subscription_id(&captures) else {
            warn!(data = %query.data, "malformed refresh token");
            return Ok(());
        };
        match load_subscription(&self.ctx, query, id).await? {
            Some(subscription) if subscription.chat_id == query.chat_id => {
                self.ctx.request_settings_render(&subscription).await
            }
            _ => Ok(()),
        }
    }
}
