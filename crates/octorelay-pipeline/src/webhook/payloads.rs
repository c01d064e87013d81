// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The parts of GitHub webhook payloads the hooks read.
//!
//! Unknown fields are ignored; GitHub adds fields freely.

use serde::Deserialize;

use crate::info::{CheckSuiteInfo, CommitInfo, IssueInfo, PullRequestInfo, PushInfo};

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub full_name: String,
    pub html_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    pub state: String,
    pub user: Account,
    #[serde(default)]
    pub labels: Vec<Label>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssuesEvent {
    pub action: String,
    pub issue: Issue,
    pub repository: Repository,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BranchRef {
    #[serde(rename = "ref")]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    pub state: String,
    #[serde(default)]
    pub merged: bool,
    #[serde(default)]
    pub draft: bool,
    pub user: Account,
    pub head: BranchRef,
    pub base: BranchRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    pub action: String,
    pub pull_request: PullRequest,
    pub repository: Repository,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestNumber {
    pub number: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct App {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckSuite {
    pub id: u64,
    pub head_branch: Option<String>,
    pub head_sha: String,
    pub status: Option<String>,
    pub conclusion: Option<String>,
    #[serde(default)]
    pub pull_requests: Vec<PullRequestNumber>,
    pub app: Option<App>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckSuiteEvent {
    pub action: String,
    pub check_suite: CheckSuite,
    pub repository: Repository,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    pub id: String,
    pub message: String,
    pub url: String,
    pub author: Option<CommitAuthor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pusher {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushEvent {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub before: String,
    pub after: String,
    #[serde(default)]
    pub commits: Vec<Commit>,
    pub compare: Option<String>,
    pub pusher: Option<Pusher>,
    #[serde(default)]
    pub forced: bool,
    #[serde(default)]
    pub deleted: bool,
    pub repository: Repository,
}

impl From<&IssuesEvent> for IssueInfo {
    fn from(event: &IssuesEvent) -> Self {
        let issue = &event.issue;
        IssueInfo {
            repository: event.repository.full_name.clone(),
            number: issue.number,
            title: issue.title.clone(),
            url: issue.html_url.clone(),
            state: issue.state.clone(),
            author: issue.user.login.clone(),
            labels: issue.labels.iter().map(|l| l.name.clone()).collect(),
            action: event.action.clone(),
        }
    }
}

impl From<&PullRequestEvent> for PullRequestInfo {
    fn from(event: &PullRequestEvent) -> Self {
        let pr = &event.pull_request;
        PullRequestInfo {
            repository: event.repository.full_name.clone(),
            number: pr.number,
            title: pr.title.clone(),
            url: pr.html_url.clone(),
            state: pr.state.clone(),
            merged: pr.merged,
            draft: pr.draft,
            author: pr.user.login.clone(),
            head_branch: pr.head.name.clone(),
            base_branch: pr.base.name.clone(),
            action: event.action.clone(),
        }
    }
}

impl From<&CheckSuiteEvent> for CheckSuiteInfo {
    fn from(event: &CheckSuiteEvent) -> Self {
        let suite = &event.check_suite;
        CheckSuiteInfo {
            repository: event.repository.full_name.clone(),
            repository_url: event.repository.html_url.clone(),
            suite_id: suite.id,
            head_branch: suite.head_branch.clone(),
            head_sha: suite.head_sha.clone(),
            status: suite.status.clone(),
            conclusion: suite.conclusion.clone(),
            app: suite.app.as_ref().map(|a| a.name.clone()),
            pull_requests: suite.pull_requests.iter().map(|p| p.number).collect(),
        }
    }
}

impl From<&PushEvent> for PushInfo {
    fn from(event: &PushEvent) -> Self {
        PushInfo {
            repository: event.repository.full_name.clone(),
            branch: branch_name(&event.git_ref).to_string(),
            before: event.before.clone(),
            after: event.after.clone(),
            compare_url: event.compare.clone(),
            pusher: event.pusher.as_ref().map(|p| p.name.clone()),
            forced: event.forced,
            commits: event
                .commits
                .iter()
                .map(|c| CommitInfo {
                    sha: c.id.clone(),
                    title: c.message.lines().next().unwrap_or_default().to_string(),
                    url: c.url.clone(),
                    author: c.author.as_ref().map(|a| a.name.clone()),
                })
                .collect(),
        }
    }
}

/// `refs/heads/main` → `main`; tags and other refs are returned unchanged.
pub fn branch_name(git_ref: &str) -> &str {
    git_ref.strip_prefix("refs/heads/").unwrap_or(git_ref)
}
