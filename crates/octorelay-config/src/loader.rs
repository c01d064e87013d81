// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./octorelay.toml` > `~/.config/octorelay/octorelay.toml`
//! > `/etc/octorelay/octorelay.toml`, with environment variable overrides via
//! the `OCTORELAY_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::OctorelayConfig;

/// Config sections, in the order env var prefixes are matched.
const SECTIONS: &[&str] = &[
    "relay", "telegram", "storage", "queue", "features", "ingress", "gc",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/octorelay/octorelay.toml`
/// 3. `~/.config/octorelay/octorelay.toml`
/// 4. `./octorelay.toml`
/// 5. `OCTORELAY_*` environment variables
pub fn load_config() -> Result<OctorelayConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
pub fn load_config_from_str(toml_content: &str) -> Result<OctorelayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OctorelayConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<OctorelayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OctorelayConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(OctorelayConfig::default()))
        .merge(Toml::file("/etc/octorelay/octorelay.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("octorelay/octorelay.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("octorelay.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `OCTORELAY_QUEUE_MAX_ATTEMPTS` must map to `queue.max_attempts`.
pub fn env_provider() -> Env {
    Env::prefixed("OCTORELAY_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped env var name to a dotted config key.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
