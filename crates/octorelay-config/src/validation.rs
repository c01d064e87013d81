// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as valid IP addresses, non-empty paths, and positive limits.

use crate::diagnostic::ConfigError;
use crate::model::OctorelayConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &OctorelayConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.relay.log_level.as_str()) {
        fail(format!(
            "relay.log_level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.relay.log_level
        ));
    }

    let public_url = config.relay.public_url.trim();
    if !(public_url.starts_with("http://") || public_url.starts_with("https://")) {
        fail(format!(
            "relay.public_url must start with http:// or https://, got `{public_url}`"
        ));
    }

    if let Some(token) = &config.telegram.bot_token
        && token.trim().is_empty()
    {
        fail("telegram.bot_token must not be empty when set".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.queue.prefetch == 0 {
        fail("queue.prefetch must be at least 1".to_string());
    }

    if config.queue.max_attempts == 0 {
        fail("queue.max_attempts must be at least 1".to_string());
    }

    if config.queue.poll_interval_ms == 0 {
        fail("queue.poll_interval_ms must be at least 1".to_string());
    }

    if config.queue.delivery_timeout_secs == 0 {
        fail("queue.delivery_timeout_secs must be at least 1".to_string());
    }

    if config.queue.claim_ttl_secs == 0 {
        fail("queue.claim_ttl_secs must be at least 1".to_string());
    }

    if config.queue.requeue_delay_ms == 0 {
        fail("queue.requeue_delay_ms must be at least 1".to_string());
    }

    let addr = config.ingress.bind_address.trim();
    if addr.is_empty() {
        fail("ingress.bind_address must not be empty".to_string());
    } else if addr.parse::<std::net::IpAddr>().is_err() {
        fail(format!(
            "ingress.bind_address `{addr}` is not a valid IP address"
        ));
    }

    if config.ingress.max_body_bytes == 0 {
        fail("ingress.max_body_bytes must be at least 1".to_string());
    }

    if config.gc.enabled && config.gc.interval_secs == 0 {
        fail("gc.interval_secs must be at least 1 when gc is enabled".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
