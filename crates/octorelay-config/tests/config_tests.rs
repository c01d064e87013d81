// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Octorelay configuration system.

use octorelay_config::diagnostic::ConfigError;
use octorelay_config::model::{OctorelayConfig, QueueBackend};
use octorelay_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[relay]
log_level = "debug"
public_url = "https://relay.example.org"

[telegram]
bot_token = "123:ABC"
polling = false

[storage]
database_path = "/tmp/octorelay-test.db"
wal_mode = false

[queue]
backend = "memory"
prefetch = 4
max_attempts = 3
poll_interval_ms = 100
delivery_timeout_secs = 60
render_expiry_ms = 1000
claim_ttl_secs = 30
requeue_delay_ms = 250

[features]
pushes = false
callbacks = false

[ingress]
bind_address = "0.0.0.0"
port = 9000
max_body_bytes = 1024

[gc]
enabled = false
interval_secs = 10
push_retention_hours = 1
check_suite_retention_hours = 2
issue_retention_days = 3
queue_retention_hours = 4
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.relay.log_level, "debug");
    assert_eq!(config.relay.public_url, "https://relay.example.org");
    assert_eq!(config.telegram.bot_token.as_deref(), Some("123:ABC"));
    assert!(!config.telegram.polling);
    assert_eq!(config.storage.database_path, "/tmp/octorelay-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.queue.backend, QueueBackend::Memory);
    assert_eq!(config.queue.prefetch, 4);
    assert_eq!(config.queue.max_attempts, 3);
    assert_eq!(config.queue.poll_interval_ms, 100);
    assert_eq!(config.queue.delivery_timeout_secs, 60);
    assert_eq!(config.queue.render_expiry_ms, 1000);
    assert_eq!(config.queue.claim_ttl_secs, 30);
    assert_eq!(config.queue.requeue_delay_ms, 250);
    assert!(!config.features.pushes);
    assert!(!config.features.callbacks);
    assert!(config.features.issues);
    assert_eq!(config.ingress.bind_address, "0.0.0.0");
    assert_eq!(config.ingress.port, 9000);
    assert_eq!(config.ingress.max_body_bytes, 1024);
    assert!(!config.gc.enabled);
    assert_eq!(config.gc.interval_secs, 10);
    assert_eq!(config.gc.push_retention_hours, 1);
    assert_eq!(config.gc.check_suite_retention_hours, 2);
    assert_eq!(config.gc.issue_retention_days, 3);
    assert_eq!(config.gc.queue_retention_hours, 4);
}

/// Empty TOML yields the compiled defaults.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty config should load");
    assert_eq!(config.relay.log_level, "info");
    assert_eq!(config.queue.backend, QueueBackend::Sqlite);
    assert_eq!(config.queue.prefetch, 10);
    assert_eq!(config.queue.max_attempts, 5);
    assert_eq!(config.queue.poll_interval_ms, 500);
    assert_eq!(config.queue.delivery_timeout_secs, 300);
    assert_eq!(config.queue.render_expiry_ms, 3_600_000);
    assert_eq!(config.queue.requeue_delay_ms, 1_000);
    assert!(config.telegram.bot_token.is_none());
    assert!(config.telegram.polling);
    assert!(config.storage.database_path.ends_with("octorelay.db"));
    assert_eq!(config.ingress.port, 8080);
    assert!(config.gc.enabled);
}

/// A typo in a section key is rejected and the diagnostic suggests the fix.
#[test]
fn unknown_queue_key_suggests_correction() {
    let toml = r#"
[queue]
prefech = 3
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    let unknown = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::UnknownKey {
                key, suggestion, ..
            } => Some((key.clone(), suggestion.clone())),
            _ => None,
        })
        .expect("expected an UnknownKey error");
    assert_eq!(unknown.0, "prefech");
    assert_eq!(unknown.1.as_deref(), Some("prefetch"));
}

#[test]
fn unknown_telegram_key_is_rejected() {
    let toml = r#"
[telegram]
bot_tken = "abc"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("bot_tken"),
        "error should mention the bad key, got: {err_str}"
    );
}

#[test]
fn unknown_section_is_rejected() {
    let toml = r#"
[metrics]
enabled = true
"#;

    assert!(load_config_from_str(toml).is_err());
}

#[test]
fn unknown_backend_is_an_error() {
    let toml = r#"
[queue]
backend = "rabbitmq"
"#;

    let errors = load_and_validate_str(toml).expect_err("unknown backend");
    assert!(!errors.is_empty());
}

#[test]
fn wrong_value_type_is_reported() {
    let toml = r#"
[ingress]
port = "eighty"
"#;

    let errors = load_and_validate_str(toml).expect_err("port must be a number");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. } | ConfigError::Other(_)))
    );
}

/// Validation runs after deserialization and reports every failure.
#[test]
fn validation_errors_are_collected() {
    let toml = r#"
[queue]
prefetch = 0
max_attempts = 0

[ingress]
bind_address = ""
"#;

    let errors = load_and_validate_str(toml).expect_err("invalid values");
    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    assert_eq!(messages.len(), 3, "got: {messages:?}");
    assert!(messages.iter().any(|m| m.contains("queue.prefetch")));
    assert!(messages.iter().any(|m| m.contains("queue.max_attempts")));
    assert!(messages.iter().any(|m| m.contains("ingress.bind_address")));
}

#[test]
fn public_url_must_be_http() {
    let toml = r#"
[relay]
public_url = "relay.example.org"
"#;

    let errors = load_and_validate_str(toml).expect_err("scheme required");
    assert!(errors[0].to_string().contains("relay.public_url"));
}

/// Environment variables override file values with the section mapping.
#[test]
fn env_vars_override_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "octorelay.toml",
            r#"
[queue]
prefetch = 2
"#,
        )?;
        jail.set_env("OCTORELAY_QUEUE_PREFETCH", "7");
        jail.set_env("OCTORELAY_TELEGRAM_BOT_TOKEN", "42:XYZ");
        jail.set_env("OCTORELAY_GC_QUEUE_RETENTION_HOURS", "12");

        let config: OctorelayConfig = octorelay_config::loader::build_figment().extract()?;
        assert_eq!(config.queue.prefetch, 7);
        assert_eq!(config.telegram.bot_token.as_deref(), Some("42:XYZ"));
        assert_eq!(config.gc.queue_retention_hours, 12);
        Ok(())
    });
}

#[test]
fn explicit_path_is_loaded() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "custom.toml",
            r#"
[ingress]
port = 9443
"#,
        )?;
        let config = octorelay_config::load_config_from_path(std::path::Path::new("custom.toml"))?;
        assert_eq!(config.ingress.port, 9443);
        Ok(())
    });
}
