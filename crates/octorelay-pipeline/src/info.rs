// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Snapshots stored in a tracked object's `info` column.
//!
//! Written by the webhook hooks, read back only by the formatters.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use octorelay_core::RelayError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueInfo {
    pub repository: String,
    pub number: u64,
    pub title: String,
    pub url: String,
    pub state: String,
    pub author: String,
    #[serde(default)]
    pub labels: Vec<String>,
    /// The webhook `action` that produced this snapshot.
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestInfo {
    pub repository: String,
    pub number: u64,
    pub title: String,
    pub url: String,
    pub state: String,
    pub merged: bool,
    pub draft: bool,
    pub author: String,
    pub head_branch: String,
    pub base_branch: String,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSuiteInfo {
    pub repository: String,
    pub repository_url: String,
    pub suite_id: u64,
    pub head_branch: Option<String>,
    pub head_sha: String,
    pub status: Option<String>,
    pub conclusion: Option<String>,
    pub app: Option<String>,
    #[serde(default)]
    pub pull_requests: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub sha: String,
    /// First line of the commit message.
    pub title: String,
    pub url: String,
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushInfo {
    pub repository: String,
    pub branch: String,
    pub before: String,
    pub after: String,
    pub compare_url: Option<String>,
    pub pusher: Option<String>,
    pub forced: bool,
    pub commits: Vec<CommitInfo>,
}

/// Serialises a snapshot for storage.
pub fn to_value<T: Serialize>(info: &T) -> Result<serde_json::Value, RelayError> {
    serde_json::to_value(info).map_err(|e| RelayError::payload("encoding tracked object info", e))
}

/// Reads a stored snapshot back.
pub fn from_value<T: DeserializeOwned>(value: &serde_json::Value) -> Result<T, RelayError> {
    T::deserialize(value).map_err(|e| RelayError::payload("decoding tracked object info", e))
}
