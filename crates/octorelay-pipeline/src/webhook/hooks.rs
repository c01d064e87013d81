// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain hooks for the GitHub events the relay consumes.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use octorelay_core::RelayError;
use octorelay_core::types::{NewTrackedObject, Subscription, TrackedKind};

use super::payloads::{CheckSuiteEvent, IssuesEvent, PullRequestEvent, PushEvent};
use super::{HookOutcome, SubscriptionHook};
use crate::context::RelayContext;
use crate::info::{self, CheckSuiteInfo, IssueInfo, PullRequestInfo, PushInfo};

fn parse<T: DeserializeOwned>(payload: &Value) -> Result<T, HookOutcome> {
    T::deserialize(payload).map_err(|e| HookOutcome::Failed(format!("malformed payload: {e}")))
}

/// Upserts the object and asks its renderer to show it.
async fn track_and_render(
    ctx: &RelayContext,
    object: NewTrackedObject,
    replace_group: bool,
) -> Result<HookOutcome, RelayError> {
    let kind = object.kind;
    let saved = if replace_group {
        ctx.store.replace_tracked_in_group(&object).await?
    } else {
        ctx.store.save_tracked(&object).await?
    };
    ctx.request_render(kind, saved.id).await?;
    debug!(
        kind = %kind,
        external_id = %saved.external_id,
        tracked_object_id = saved.id.0,
        "tracked object updated"
    );
    Ok(HookOutcome::Handled)
}

pub struct IssuesHook {
    ctx: RelayContext,
}

impl IssuesHook {
    pub fn new(ctx: RelayContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl SubscriptionHook for IssuesHook {
    fn name(&self) -> &str {
        "issues"
    }

    async fn handle_subscription(
        &self,
        subscription: &Subscription,
        payload: &Value,
    ) -> Result<HookOutcome, RelayError> {
        let event: IssuesEvent = match parse(payload) {
            Ok(event) => event,
            Err(failed) => return Ok(failed),
        };
        let object = NewTrackedObject {
            subscription_id: subscription.id,
            kind: TrackedKind::Issue,
            external_id: event.issue.number.to_string(),
            group_key: None,
            info: info::to_value(&IssueInfo::from(&event))?,
        };
        track_and_render(&self.ctx, object, false).await
    }
}

pub struct PullRequestHook {
    ctx: RelayContext,
}

impl PullRequestHook {
    pub fn new(ctx: RelayContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl SubscriptionHook for PullRequestHook {
    fn name(&self) -> &str {
        "pull_request"
    }

    async fn handle_subscription(
        &self,
        subscription: &Subscription,
        payload: &Value,
    ) -> Result<HookOutcome, RelayError> {
        let event: PullRequestEvent = match parse(payload) {
            Ok(event) => event,
            Err(failed) => return Ok(failed),
        };
        let object = NewTrackedObject {
            subscription_id: subscription.id,
            kind: TrackedKind::PullRequest,
            external_id: event.pull_request.number.to_string(),
            group_key: None,
            info: info::to_value(&PullRequestInfo::from(&event))?,
        };
        track_and_render(&self.ctx, object, false).await
    }
}

/// Keeps one check-suite message per head branch: a new suite replaces the
/// previous one of the same branch.
pub struct CheckSuiteHook {
    ctx: RelayContext,
}

impl CheckSuiteHook {
    pub fn new(ctx: RelayContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl SubscriptionHook for CheckSuiteHook {
    fn name(&self) -> &str {
        "check_suite"
    }

    async fn handle_subscription(
        &self,
        subscription: &Subscription,
        payload: &Value,
    ) -> Result<HookOutcome, RelayError> {
        let event: CheckSuiteEvent = match parse(payload) {
            Ok(event) => event,
            Err(failed) => return Ok(failed),
        };
        let settings = &subscription.settings;
        if event.check_suite.pull_requests.is_empty() {
            if !settings.track_free_ci {
                return Ok(HookOutcome::Skipped("CI without pull request is off".into()));
            }
        } else if !settings.track_pull_request_ci {
            return Ok(HookOutcome::Skipped("pull request CI is off".into()));
        }

        let object = NewTrackedObject {
            subscription_id: subscription.id,
            kind: TrackedKind::CheckSuite,
            external_id: event.check_suite.id.to_string(),
            group_key: event.check_suite.head_branch.clone(),
            info: info::to_value(&CheckSuiteInfo::from(&event))?,
        };
        track_and_render(&self.ctx, object, true).await
    }
}

pub struct PushHook {
    ctx: RelayContext,
}

impl PushHook {
    pub fn new(ctx: RelayContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl SubscriptionHook for PushHook {
    fn name(&self) -> &str {
        "push"
    }

    async fn handle_subscription(
        &self,
        subscription: &Subscription,
        payload: &Value,
    ) -> Result<HookOutcome, RelayError> {
        if !subscription.settings.track_pushes {
            return Ok(HookOutcome::Skipped("pushes are off".into()));
        }
        let event: PushEvent = match parse(payload) {
            Ok(event) => event,
            Err(failed) => return Ok(failed),
        };
        if event.deleted || event.commits.is_empty() {
            return Ok(HookOutcome::Skipped("push carries no commits".into()));
        }
        let object = NewTrackedObject {
            subscription_id: subscription.id,
            kind: TrackedKind::Push,
            external_id: event.after.clone(),
            group_key: None,
            info: info::to_value(&PushInfo::from(&event))?,
        };
        track_and_render(&self.ctx, object, false).await
    }
}
