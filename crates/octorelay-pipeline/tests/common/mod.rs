// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![allow(dead_code)]

use octorelay_pipeline::{RelayContext, RelaySettings};
use octorelay_test_utils::TestHarness;
use serde_json::{Value, json};

pub async fn setup() -> (TestHarness, RelayContext) {
    let harness = TestHarness::new().await.unwrap();
    let ctx = RelayContext::new(
        harness.store.clone(),
        harness.chat.clone(),
        harness.queue.clone(),
        RelaySettings::default(),
    );
    (harness, ctx)
}

pub fn issue_info(title: &str) -> Value {
    json!({
        "repository": "octo/app",
        "number": 12,
        "title": title,
        "url": "https://github.com/octo/app/issues/12",
        "state": "open",
        "author": "mona",
        "labels": [],
        "action": "opened"
    })
}

pub fn issues_payload(repository: &str, number: u64, title: &str) -> String {
    json!({
        "action": "opened",
        "issue": {
            "number": number,
            "title": title,
            "html_url": format!("https://github.com/{repository}/issues/{number}"),
            "state": "open",
            "user": {"login": "mona"},
            "labels": [{"name": "bug"}]
        },
        "repository": {
            "full_name": repository,
            "html_url": format!("https://github.com/{repository}")
        }
    })
    .to_string()
}

pub fn push_payload(after: &str, commits: usize) -> String {
    let commits: Vec<Value> = (0..commits)
        .map(|i| {
            json!({
                "id": format!("{i:040}"),
                "message": format!("commit {i}"),
                "url": "https://github.com/octo/app/commit/x",
                "author": {"name": "Mona"}
            })
        })
        .collect();
    json!({
        "ref": "refs/heads/main",
        "before": "0000000000000000000000000000000000000000",
        "after": after,
        "commits": commits,
        "compare": "https://github.com/octo/app/compare/a...b",
        "pusher": {"name": "mona"},
        "forced": false,
        "deleted": commits.is_empty(),
        "repository": {"full_name": "octo/app", "html_url": "https://github.com/octo/app"}
    })
    .to_string()
}

pub fn check_suite_payload(id: u64, branch: &str, pull_requests: &[u64]) -> String {
    let pulls: Vec<Value> = pull_requests.iter().map(|n| json!({"number": n})).collect();
    json!({
        "action": "completed",
        "check_suite": {
            "id": id,
            "head_branch": branch,
            "head_sha": "0123456789abcdef0123456789abcdef01234567",
            "status": "completed",
            "conclusion": "success",
            "pull_requests": pulls,
            "app": {"name": "GitHub Actions"}
        },
        "repository": {"full_name": "octo/app", "html_url": "https://github.com/octo/app"}
    })
    .to_string()
}
