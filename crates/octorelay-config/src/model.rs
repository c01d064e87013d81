// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Octorelay service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Octorelay configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OctorelayConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub relay: RelayConfig,

    /// Telegram bot integration settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Broker and consumer settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Handler switches.
    #[serde(default)]
    pub features: FeaturesConfig,

    /// Webhook HTTP listener settings.
    #[serde(default)]
    pub ingress: IngressConfig,

    /// Garbage collector settings.
    #[serde(default)]
    pub gc: GcConfig,
}

/// Process-wide configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Externally reachable base URL, used in `/subscribe` replies.
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            public_url: default_public_url(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_public_url() -> String {
    "http://localhost:8080".to_string()
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Poll for chat updates (commands and keyboard taps).
    #[serde(default = "default_true")]
    pub polling: bool,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            polling: true,
        }
    }
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("octorelay").join("octorelay.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("octorelay.db"))
        .to_string_lossy()
        .into_owned()
}

/// Which broker implementation carries the queues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueBackend {
    /// Durable queue rows in the storage database.
    #[default]
    Sqlite,
    /// In-process queues, lost on restart.
    Memory,
}

/// Broker and consumer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    #[serde(default)]
    pub backend: QueueBackend,

    /// Unacknowledged deliveries a consumer may hold at once.
    #[serde(default = "default_prefetch")]
    pub prefetch: usize,

    /// Deliveries of one message before it is marked failed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Idle poll interval when no publish wakes the consumer.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Lock held on a delivery before it is handed out again.
    #[serde(default = "default_delivery_timeout_secs")]
    pub delivery_timeout_secs: u64,

    /// Expiry attached to render jobs.
    #[serde(default = "default_render_expiry_ms")]
    pub render_expiry_ms: u64,

    /// Age after which an unfinished message claim is abandoned.
    #[serde(default = "default_claim_ttl_secs")]
    pub claim_ttl_secs: u64,

    /// Delay before a render job retries a message another worker is sending.
    #[serde(default = "default_requeue_delay_ms")]
    pub requeue_delay_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: QueueBackend::default(),
            prefetch: default_prefetch(),
            max_attempts: default_max_attempts(),
            poll_interval_ms: default_poll_interval_ms(),
            delivery_timeout_secs: default_delivery_timeout_secs(),
            render_expiry_ms: default_render_expiry_ms(),
            claim_ttl_secs: default_claim_ttl_secs(),
            requeue_delay_ms: default_requeue_delay_ms(),
        }
    }
}

fn default_prefetch() -> usize {
    10
}

fn default_max_attempts() -> u32 {
    5
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_delivery_timeout_secs() -> u64 {
    300
}

fn default_render_expiry_ms() -> u64 {
    3_600_000
}

fn default_claim_ttl_secs() -> u64 {
    120
}

fn default_requeue_delay_ms() -> u64 {
    1_000
}

/// Handler switches. A disabled handler's queue gets no consumer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FeaturesConfig {
    #[serde(default = "default_true")]
    pub issues: bool,
    #[serde(default = "default_true")]
    pub pull_requests: bool,
    #[serde(default = "default_true")]
    pub check_suites: bool,
    #[serde(default = "default_true")]
    pub pushes: bool,
    #[serde(default = "default_true")]
    pub commands: bool,
    #[serde(default = "default_true")]
    pub callbacks: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            issues: true,
            pull_requests: true,
            check_suites: true,
            pushes: true,
            commands: true,
            callbacks: true,
        }
    }
}

/// Webhook HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IngressConfig {
    /// Address to bind the listener to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted webhook body.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_body_bytes() -> usize {
    // GitHub caps webhook payloads at 25 MB.
    25 * 1024 * 1024
}

/// Garbage collector configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GcConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_gc_interval_secs")]
    pub interval_secs: u64,

    #[serde(default = "default_push_retention_hours")]
    pub push_retention_hours: u64,

    #[serde(default = "default_check_suite_retention_hours")]
    pub check_suite_retention_hours: u64,

    /// Issues and pull requests not updated for this long are forgotten.
    #[serde(default = "default_issue_retention_days")]
    pub issue_retention_days: u64,

    /// Finished queue rows (completed, failed, expired) are purged after this.
    #[serde(default = "default_queue_retention_hours")]
    pub queue_retention_hours: u64,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_gc_interval_secs(),
            push_retention_hours: default_push_retention_hours(),
            check_suite_retention_hours: default_check_suite_retention_hours(),
            issue_retention_days: default_issue_retention_days(),
            queue_retention_hours: default_queue_retention_hours(),
        }
    }
}

fn default_gc_interval_secs() -> u64 {
    3600
}

fn default_push_retention_hours() -> u64 {
    24
}

fn default_check_suite_retention_hours() -> u64 {
    24
}

fn default_issue_retention_days() -> u64 {
    90
}

fn default_queue_retention_hours() -> u64 {
    48
}

fn default_true() -> bool {
    true
}
