// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared handles passed to every pipeline handler.

use std::sync::Arc;

use octorelay_config::OctorelayConfig;
use octorelay_core::types::{NewTrackedObject, Subscription, TrackedKind, TrackedObject, TrackedObjectId};
use octorelay_core::{ChatApi, RelayError, RelayStore};
use octorelay_queue::{Envelope, QueueClient};
use octorelay_queue::events::RenderRequest;

/// Pipeline settings derived from config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySettings {
    /// Age after which a claim without a message id is considered abandoned.
    pub claim_ttl_secs: u64,
    /// Render jobs not delivered within this many milliseconds are dropped.
    pub render_expiry_ms: u64,
    /// Delay before retrying a render whose message another worker is sending.
    pub requeue_delay_ms: u64,
    /// Externally reachable base URL of the webhook ingress.
    pub public_url: String,
}

impl RelaySettings {
    pub fn from_config(config: &OctorelayConfig) -> Self {
        Self {
            claim_ttl_secs: config.queue.claim_ttl_secs,
            render_expiry_ms: config.queue.render_expiry_ms,
            requeue_delay_ms: config.queue.requeue_delay_ms,
            public_url: config.relay.public_url.clone(),
        }
    }

    /// URL GitHub should deliver webhooks to.
    pub fn webhook_url(&self) -> String {
        format!("{}/webhooks/github", self.public_url.trim_end_matches('/'))
    }
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self::from_config(&OctorelayConfig::default())
    }
}

/// Store, chat client, and queue client shared by the handlers.
#[derive(Clone)]
pub struct RelayContext {
    pub store: Arc<dyn RelayStore>,
    pub chat: Arc<dyn ChatApi>,
    pub queue: QueueClient,
    pub settings: RelaySettings,
}

impl RelayContext {
    pub fn new(
        store: Arc<dyn RelayStore>,
        chat: Arc<dyn ChatApi>,
        queue: QueueClient,
        settings: RelaySettings,
    ) -> Self {
        Self {
            store,
            chat,
            queue,
            settings,
        }
    }

    /// Publishes a render job for a tracked object on its kind's show queue.
    pub async fn request_render(
        &self,
        kind: TrackedKind,
        tracked_object_id: TrackedObjectId,
    ) -> Result<(), RelayError> {
        self.queue
            .publish_expiring(
                kind.show_queue(),
                &RenderRequest { tracked_object_id },
                self.settings.render_expiry_ms,
            )
            .await
    }

    /// Publishes a render job that becomes deliverable after
    /// `requeue_delay_ms`.
    pub async fn request_render_later(
        &self,
        kind: TrackedKind,
        tracked_object_id: TrackedObjectId,
    ) -> Result<(), RelayError> {
        let envelope = Envelope::new(kind.show_queue(), &RenderRequest { tracked_object_id })?
            .expires_after(self.settings.render_expiry_ms)
            .delayed_by(self.settings.requeue_delay_ms);
        self.queue.publish_envelope(&envelope).await
    }

    /// Returns the subscription's settings object, creating it on first use.
    pub async fn settings_object(&self, subscription: &Subscription) -> Result<TrackedObject, RelayError> {
        let external_id = subscription.id.to_string();
        if let Some(object) = self
            .store
            .find_tracked(subscription.id, TrackedKind::Settings, &external_id)
            .await?
        {
            return Ok(object);
        }
        self.store
            .save_tracked(&NewTrackedObject {
                subscription_id: subscription.id,
                kind: TrackedKind::Settings,
                external_id,
                group_key: None,
                info: serde_json::Value::Object(Default::default()),
            })
            .await
    }

    /// Publishes a render job for the subscription's settings message.
    pub async fn request_settings_render(&self, subscription: &Subscription) -> Result<(), RelayError> {
        let object = self.settings_object(subscription).await?;
        self.request_render(TrackedKind::Settings, object.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_url_joins_without_double_slash() {
        let settings = RelaySettings {
            public_url: "https://relay.example.com/".into(),
            ..RelaySettings::default()
        };
        assert_eq!(settings.webhook_url(), "https://relay.example.com/webhooks/github");
    }

    #[test]
    fn defaults_follow_config_defaults() {
        let settings = RelaySettings::default();
        assert_eq!(settings.claim_ttl_secs, 120);
        assert_eq!(settings.render_expiry_ms, 3_600_000);
        assert_eq!(settings.requeue_delay_ms, 1_000);
    }
}
