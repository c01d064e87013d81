// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Logical queue names shared by producers and consumers.

pub const ISSUE_SHOW: &str = "issue-show-queue";
pub const PULL_REQUEST_SHOW: &str = "pull-request-show-queue";
pub const CHECK_SUITE_SHOW: &str = "check-suite-show-queue";
pub const WEBHOOK_SETTINGS_SHOW: &str = "web-hook-settings-show-queue";
pub const PUSH_SHOW: &str = "push-show-queue";

/// Plain outgoing chat messages (command replies, errors).
pub const MESSAGES: &str = "messages";
pub const TELEGRAM_CHAT_COMMAND: &str = "telegram-chat-command";
/// Inline keyboard callback queries.
pub const TELEGRAM_EVENTS: &str = "telegram-events-queue";

pub const GITHUB_ISSUES: &str = "github-issues";
pub const GITHUB_PULL_REQUEST: &str = "github-pull-request";
pub const GITHUB_CHECK_SUITE: &str = "github-check-suite";
pub const GITHUB_PUSH: &str = "github-push";

/// Maps a GitHub `X-GitHub-Event` name to the queue its deliveries go to.
///
/// Returns `None` for events the relay does not consume (including `ping`).
pub fn for_github_event(event: &str) -> Option<&'static str> {
    match event {
        "issues" => Some(GITHUB_ISSUES),
        "pull_request" => Some(GITHUB_PULL_REQUEST),
        "check_suite" => Some(GITHUB_CHECK_SUITE),
        "push" => Some(GITHUB_PUSH),
        _ => None,
    }
}
