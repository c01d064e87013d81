// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue → handler table.
//!
//! | queue                           | handler            | feature flag     |
//! |---------------------------------|--------------------|------------------|
//! | `github-issues`                 | issues fan-out     | `issues`         |
//! | `github-pull-request`           | PR fan-out         | `pull_requests`  |
//! | `github-check-suite`            | check suite fan-out| `check_suites`   |
//! | `github-push`                   | push fan-out       | `pushes`         |
//! | `issue-show-queue`              | issue renderer     | `issues`         |
//! | `pull-request-show-queue`       | PR renderer        | `pull_requests`  |
//! | `check-suite-show-queue`        | check suite render | `check_suites`   |
//! | `push-show-queue`               | push renderer      | `pushes`         |
//! | `web-hook-settings-show-queue`  | settings renderer  | always           |
//! | `messages`                      | plain sends        | always           |
//! | `telegram-chat-command`         | commands           | `commands`       |
//! | `telegram-events-queue`         | keyboard callbacks | `callbacks`      |

use std::sync::Arc;

use octorelay_config::OctorelayConfig;
use octorelay_core::queues;
use octorelay_core::types::TrackedKind;
use octorelay_queue::{Registration, Typed};

use crate::callback::{CallbackHandler, routes};
use crate::commands::CommandHandler;
use crate::context::RelayContext;
use crate::messages::MessageHandler;
use crate::render::{
    CheckSuiteFormatter, IssueFormatter, PullRequestFormatter, PushFormatter, Renderer,
    SettingsFormatter,
};
use crate::webhook::{CheckSuiteHook, IssuesHook, PullRequestHook, PushHook, WebhookHandler};

/// Builds every registration, enabled according to `[features]`.
pub fn registrations(ctx: &RelayContext, config: &OctorelayConfig) -> Vec<Registration> {
    let prefetch = config.queue.prefetch;
    let features = &config.features;
    let store = ctx.store.clone();

    vec![
        Registration::new(
            queues::GITHUB_ISSUES,
            prefetch,
            Arc::new(Typed(WebhookHandler::new(store.clone(), IssuesHook::new(ctx.clone())))),
        )
        .enabled(features.issues),
        Registration::new(
            queues::GITHUB_PULL_REQUEST,
            prefetch,
            Arc::new(Typed(WebhookHandler::new(
                store.clone(),
                PullRequestHook::new(ctx.clone()),
            ))),
        )
        .enabled(features.pull_requests),
        Registration::new(
            queues::GITHUB_CHECK_SUITE,
            prefetch,
            Arc::new(Typed(WebhookHandler::new(
                store.clone(),
                CheckSuiteHook::new(ctx.clone()),
            ))),
        )
        .enabled(features.check_suites),
        Registration::new(
            queues::GITHUB_PUSH,
            prefetch,
            Arc::new(Typed(WebhookHandler::new(store, PushHook::new(ctx.clone())))),
        )
        .enabled(features.pushes),
        Registration::new(
            TrackedKind::Issue.show_queue(),
            prefetch,
            Arc::new(Typed(Renderer::new(ctx.clone(), IssueFormatter))),
        )
        .enabled(features.issues),
        Registration::new(
            TrackedKind::PullRequest.show_queue(),
            prefetch,
            Arc::new(Typed(Renderer::new(ctx.clone(), PullRequestFormatter))),
        )
        .enabled(features.pull_requests),
        Registration::new(
            TrackedKind::CheckSuite.show_queue(),
            prefetch,
            Arc::new(Typed(Renderer::new(ctx.clone(), CheckSuiteFormatter))),
        )
        .enabled(features.check_suites),
        Registration::new(
            TrackedKind::Push.show_queue(),
            prefetch,
            Arc::new(Typed(Renderer::new(ctx.clone(), PushFormatter))),
        )
        .enabled(features.pushes),
        Registration::new(
            TrackedKind::Settings.show_queue(),
            prefetch,
            Arc::new(Typed(Renderer::new(
                ctx.clone(),
                SettingsFormatter::new(ctx.settings.webhook_url()),
            ))),
        ),
        Registration::new(
            queues::MESSAGES,
            prefetch,
            Arc::new(Typed(MessageHandler::new(ctx.chat.clone()))),
        ),
        Registration::new(
            queues::TELEGRAM_CHAT_COMMAND,
            prefetch,
            Arc::new(Typed(CommandHandler::new(ctx.clone()))),
        )
        .enabled(features.commands),
        Registration::new(
            queues::TELEGRAM_EVENTS,
            prefetch,
            Arc::new(Typed(CallbackHandler::new(Arc::new(routes::build_router(ctx))))),
        )
        .enabled(features.callbacks),
    ]
}
