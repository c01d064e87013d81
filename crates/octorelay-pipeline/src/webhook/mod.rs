// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook fan-out: one GitHub delivery, N subscriptions.
//!
//! The delivery is verified against every subscription of its repository;
//! each subscription whose secret produced the claimed signature gets its own
//! hook invocation. Hooks run concurrently and all run to completion, then
//! their results are folded into one [`Outcome`]:
//!
//! 1. any hook error → the first error (nack, redelivery);
//! 2. any `Failed` → `Reject`;
//! 3. every hook skipped → `Skip`;
//! 4. otherwise `Done`.
//!
//! Hooks must be idempotent since a redelivery re-runs all of them.

pub mod hooks;
pub mod payloads;
pub mod signature;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};

use octorelay_core::types::Subscription;
use octorelay_core::{RelayError, RelayStore};
use octorelay_queue::events::GithubWebhook;
use octorelay_queue::{EventHandler, Outcome};

pub use hooks::{CheckSuiteHook, IssuesHook, PullRequestHook, PushHook};

/// What a hook did for one subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    Handled,
    Skipped(String),
    /// The payload cannot be processed for this subscription.
    Failed(String),
}

/// Per-subscription processing of one webhook event type.
#[async_trait]
pub trait SubscriptionHook: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn handle_subscription(
        &self,
        subscription: &Subscription,
        payload: &Value,
    ) -> Result<HookOutcome, RelayError>;
}

/// Queue handler running a [`SubscriptionHook`] for every verified subscription.
pub struct WebhookHandler<H> {
    store: Arc<dyn RelayStore>,
    hook: H,
    name: String,
}

impl<H: SubscriptionHook> WebhookHandler<H> {
    pub fn new(store: Arc<dyn RelayStore>, hook: H) -> Self {
        let name = format!("webhook:{}", hook.name());
        Self { store, hook, name }
    }

    pub async fn fan_out(&self, event: &GithubWebhook) -> Result<Outcome, RelayError> {
        let payload: Value = match serde_json::from_str(&event.body) {
            Ok(payload) => payload,
            Err(e) => return Ok(Outcome::reject(format!("payload is not JSON: {e}"))),
        };
        let Some(repository) = payload
            .pointer("/repository/full_name")
            .and_then(Value::as_str)
        else {
            return Ok(Outcome::reject("payload has no repository.full_name"));
        };

        let repository = repository.to_ascii_lowercase();
        let subscriptions = self.store.subscriptions_for_repository(&repository).await?;
        let verified: Vec<&Subscription> = subscriptions
            .iter()
            .filter(|s| signature::verify(event.body.as_bytes(), &event.signature, s.secret.as_bytes()))
            .collect();

        if verified.is_empty() {
            warn!(
                hook = self.hook.name(),
                repository = %repository,
                subscriptions = subscriptions.len(),
                "no subscription matches the webhook signature"
            );
            return Ok(Outcome::skip("no subscription matches the signature"));
        }
        debug!(
            hook = self.hook.name(),
            repository = %repository,
            verified = verified.len(),
            "fanning out webhook"
        );

        let results = join_all(
            verified
                .iter()
                .map(|s| self.hook.handle_subscription(s, &payload)),
        )
        .await;
        aggregate(results)
    }
}

/// Folds per-subscription results into the delivery's outcome.
pub fn aggregate(
    results: impl IntoIterator<Item = Result<HookOutcome, RelayError>>,
) -> Result<Outcome, RelayError> {
    let mut first_error = None;
    let mut failed = Vec::new();
    let mut skipped = Vec::new();
    let mut handled = 0usize;

    for result in results {
        match result {
            Ok(HookOutcome::Handled) => handled += 1,
            Ok(HookOutcome::Skipped(why)) => skipped.push(why),
            Ok(HookOutcome::Failed(why)) => failed.push(why),
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(e) => warn!(error = %e, "additional subscription hook error"),
        }
    }

    if let Some(e) = first_error {
        return Err(e);
    }
    if !failed.is_empty() {
        return Ok(Outcome::reject(failed.join("; ")));
    }
    if handled == 0 {
        return Ok(Outcome::skip(skipped.join("; ")));
    }
    Ok(Outcome::Done)
}

#[async_trait]
impl<H: SubscriptionHook> EventHandler for WebhookHandler<H> {
    type Event = GithubWebhook;

    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, event: GithubWebhook) -> Result<Outcome, RelayError> {
        self.fan_out(&event).await
    }
}
