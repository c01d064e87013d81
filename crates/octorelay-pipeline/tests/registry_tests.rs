// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

mod common;

use std::collections::HashSet;

use octorelay_config::OctorelayConfig;
use octorelay_config::model::FeaturesConfig;
use octorelay_core::queues;
use octorelay_pipeline::registrations;

use common::setup;

#[tokio::test]
async fn every_queue_has_exactly_one_handler() {
    let (_h, ctx) = setup().await;
    let table = registrations(&ctx, &OctorelayConfig::default());

    let queues: HashSet<_> = table.iter().map(|r| r.queue).collect();
    assert_eq!(queues.len(), table.len());
    assert_eq!(table.len(), 12);
    assert!(table.iter().all(|r| r.enabled && r.prefetch == 10));
}

#[tokio::test]
async fn feature_flags_disable_registrations() {
    let (_h, ctx) = setup().await;
    let config = OctorelayConfig {
        features: FeaturesConfig {
            issues: false,
            pull_requests: false,
            check_suites: false,
            pushes: false,
            commands: false,
            callbacks: false,
        },
        ..OctorelayConfig::default()
    };

    let enabled: HashSet<_> = registrations(&ctx, &config)
        .iter()
        .filter(|r| r.enabled)
        .map(|r| r.queue)
        .collect();
    assert_eq!(
        enabled,
        HashSet::from([queues::WEBHOOK_SETTINGS_SHOW, queues::MESSAGES])
    );
}
