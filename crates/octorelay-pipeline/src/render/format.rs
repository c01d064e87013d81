// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MarkdownV2 formatters for each tracked kind.

use octorelay_core::RelayError;
use octorelay_core::types::{
    InlineButton, InlineKeyboard, RenderedMessage, SettingKey, Subscription, TrackedKind,
    TrackedObject,
};
use octorelay_telegram::markdown::{bold, code, escape, italic, link};

use super::Formatter;
use crate::callback::routes::{refresh_token, toggle_token};
use crate::info::{self, CheckSuiteInfo, IssueInfo, PullRequestInfo, PushInfo};

/// Commits listed in a push message before the rest are summarised.
const MAX_COMMITS: usize = 10;

/// First seven characters of a commit sha.
fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

fn plain(text: String) -> RenderedMessage {
    RenderedMessage {
        text,
        keyboard: None,
    }
}

pub struct IssueFormatter;

impl Formatter for IssueFormatter {
    fn kind(&self) -> TrackedKind {
        TrackedKind::Issue
    }

    fn format(&self, object: &TrackedObject, _: &Subscription) -> Result<RenderedMessage, RelayError> {
        let issue: IssueInfo = info::from_value(&object.info)?;
        let icon = if issue.state == "closed" { "✔️" } else { "📌" };
        let mut text = format!(
            "{icon} {} issue {}\n{} by {}",
            bold(&issue.repository),
            link(&format!("#{} {}", issue.number, issue.title), &issue.url),
            escape(&issue.state),
            escape(&issue.author),
        );
        if !issue.labels.is_empty() {
            text.push_str(&format!("\nLabels: {}", escape(&issue.labels.join(", "))));
        }
        Ok(plain(text))
    }
}

pub struct PullRequestFormatter;

impl PullRequestFormatter {
    fn state(pr: &PullRequestInfo) -> (&'static str, &'static str) {
        match (pr.state.as_str(), pr.merged, pr.draft) {
            (_, true, _) => ("🟣", "merged"),
            ("closed", false, _) => ("🔴", "closed"),
            (_, false, true) => ("📝", "draft"),
            _ => ("🟢", "open"),
        }
    }
}

impl Formatter for PullRequestFormatter {
    fn kind(&self) -> TrackedKind {
        TrackedKind::PullRequest
    }

    fn format(&self, object: &TrackedObject, _: &Subscription) -> Result<RenderedMessage, RelayError> {
        let pr: PullRequestInfo = info::from_value(&object.info)?;
        let (icon, state) = Self::state(&pr);
        Ok(plain(format!(
            "{icon} {} pull request {}\n{} → {}\n{} by {}",
            bold(&pr.repository),
            link(&format!("#{} {}", pr.number, pr.title), &pr.url),
            code(&pr.head_branch),
            code(&pr.base_branch),
            escape(state),
            escape(&pr.author),
        )))
    }
}

pub struct CheckSuiteFormatter;

impl CheckSuiteFormatter {
    fn icon(suite: &CheckSuiteInfo) -> &'static str {
        match (suite.status.as_deref(), suite.conclusion.as_deref()) {
            (Some("completed"), Some("success")) => "✅",
            (Some("completed"), Some("neutral" | "skipped")) => "⚪",
            (Some("completed"), Some("cancelled")) => "🚫",
            (Some("completed"), _) => "❌",
            _ => "⏳",
        }
    }
}

impl Formatter for CheckSuiteFormatter {
    fn kind(&self) -> TrackedKind {
        TrackedKind::CheckSuite
    }

    fn format(&self, object: &TrackedObject, _: &Subscription) -> Result<RenderedMessage, RelayError> {
        let suite: CheckSuiteInfo = info::from_value(&object.info)?;
        let commit_url = format!("{}/commit/{}", suite.repository_url, suite.head_sha);
        let mut text = format!(
            "{} {} CI",
            Self::icon(&suite),
            bold(&suite.repository)
        );
        if let Some(branch) = &suite.head_branch {
            text.push_str(&format!(" on {}", code(branch)));
        }
        if let Some(app) = &suite.app {
            text.push_str(&format!(" {}", italic(&format!("({app})"))));
        }
        text.push_str(&format!(
            "\nCommit {}\nStatus: {}",
            link(short_sha(&suite.head_sha), &commit_url),
            escape(suite.status.as_deref().unwrap_or("queued")),
        ));
        if let Some(conclusion) = &suite.conclusion {
            text.push_str(&format!(", {}", escape(conclusion)));
        }
        if !suite.pull_requests.is_empty() {
            let numbers: Vec<String> = suite.pull_requests.iter().map(|n| format!("#{n}")).collect();
            text.push_str(&format!("\nPull requests: {}", escape(&numbers.join(", "))));
        }
        Ok(plain(text))
    }
}

pub struct PushFormatter;

impl Formatter for PushFormatter {
    fn kind(&self) -> TrackedKind {
        TrackedKind::Push
    }

    fn format(&self, object: &TrackedObject, _: &Subscription) -> Result<RenderedMessage, RelayError> {
        let push: PushInfo = info::from_value(&object.info)?;
        let count = push.commits.len();
        let mut text = format!(
            "⬆️ {} {} {} to {}",
            bold(&push.repository),
            if push.forced { "force\\-pushed" } else { "pushed" },
            escape(&format!(
                "{count} commit{}",
                if count == 1 { "" } else { "s" }
            )),
            code(&push.branch),
        );
        if let Some(pusher) = &push.pusher {
            text.push_str(&format!(" by {}", escape(pusher)));
        }
        for commit in push.commits.iter().take(MAX_COMMITS) {
            text.push_str(&format!(
                "\n{} {}",
                link(short_sha(&commit.sha), &commit.url),
                escape(&commit.title)
            ));
            if let Some(author) = &commit.author {
                text.push_str(&format!(" {}", italic(author)));
            }
        }
        if count > MAX_COMMITS {
            text.push_str(&escape(&format!("\n...and {} more", count - MAX_COMMITS)));
        }
        if let Some(compare) = &push.compare_url {
            text.push_str(&format!("\n{}", link("Compare changes", compare)));
        }
        Ok(plain(text))
    }
}

/// The subscription's settings message with its toggle keyboard.
pub struct SettingsFormatter {
    webhook_url: String,
}

impl SettingsFormatter {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
        }
    }
}

impl Formatter for SettingsFormatter {
    fn kind(&self) -> TrackedKind {
        TrackedKind::Settings
    }

    fn format(&self, _: &TrackedObject, subscription: &Subscription) -> Result<RenderedMessage, RelayError> {
        let text = format!(
            "⚙️ {} notifications\nPayload URL: {}\nContent type: {}",
            bold(&subscription.repository_full_name),
            code(&self.webhook_url),
            code("application/json"),
        );

        let mut rows: Vec<Vec<InlineButton>> = [
            SettingKey::TrackPushes,
            SettingKey::TrackFreeCi,
            SettingKey::TrackPullRequestCi,
        ]
        .into_iter()
        .map(|key| {
            let enabled = subscription.settings.get(key);
            let mark = if enabled { "✅" } else { "❌" };
            vec![InlineButton::callback(
                format!("{mark} {}", key.label()),
                toggle_token(subscription.id, key, !enabled),
            )]
        })
        .collect();
        rows.push(vec![InlineButton::callback("🔄 Refresh", refresh_token(subscription.id))]);

        Ok(RenderedMessage {
            text,
            keyboard: Some(InlineKeyboard { rows }),
        })
    }
}
