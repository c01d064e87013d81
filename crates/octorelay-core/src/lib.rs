// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Octorelay.
//!
//! This crate provides the port traits (broker, chat API, store), the
//! workspace error type, and the domain types that flow through the relay
//! pipeline. Adapter crates implement the traits defined here.

pub mod error;
pub mod queues;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{ChatError, RelayError};
pub use traits::{Broker, ChatApi, Delivery, PublishOptions, RelayStore};
pub use types::{
    ChatId, ChatMessageId, SubscriptionId, TrackedKind, TrackedObjectId,
};

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;
    use crate::types::{InlineButton, InlineKeyboard, SettingKey, SubscriptionSettings};

    #[test]
    fn relay_error_wraps_chat_errors() {
        let err: RelayError = ChatError::NotModified.into();
        assert!(matches!(err.as_chat(), Some(ChatError::NotModified)));

        let err = RelayError::storage(std::io::Error::other("disk"));
        assert!(err.as_chat().is_none());
        assert_eq!(err.to_string(), "storage error: disk");
    }

    #[test]
    fn every_tracked_kind_has_a_distinct_show_queue() {
        let mut seen = std::collections::HashSet::new();
        for kind in TrackedKind::iter() {
            assert!(seen.insert(kind.show_queue()), "duplicate queue for {kind}");
        }
        assert_eq!(TrackedKind::Settings.show_queue(), "web-hook-settings-show-queue");
    }

    #[test]
    fn tracked_kind_string_form_is_snake_case() {
        assert_eq!(TrackedKind::PullRequest.to_string(), "pull_request");
        assert_eq!(
            TrackedKind::from_str("check_suite").unwrap(),
            TrackedKind::CheckSuite
        );
        let json = serde_json::to_string(&TrackedKind::Push).unwrap();
        assert_eq!(json, "\"push\"");
    }

    #[test]
    fn setting_keys_parse_from_callback_segments() {
        assert_eq!(
            SettingKey::from_str("track_pushes").unwrap(),
            SettingKey::TrackPushes
        );
        assert_eq!(
            SettingKey::from_str("track_pull_request_ci").unwrap(),
            SettingKey::TrackPullRequestCi
        );
        assert!(SettingKey::from_str("track_everything").is_err());
    }

    #[test]
    fn settings_get_and_set_by_key() {
        let mut settings = SubscriptionSettings::default();
        for key in SettingKey::iter() {
            assert!(settings.get(key));
            settings.set(key, false);
            assert!(!settings.get(key));
        }
        assert_eq!(
            settings,
            SubscriptionSettings {
                track_pushes: false,
                track_free_ci: false,
                track_pull_request_ci: false,
            }
        );
    }

    #[test]
    fn keyboard_emptiness_ignores_empty_rows() {
        let empty = InlineKeyboard {
            rows: vec![vec![], vec![]],
        };
        assert!(empty.is_empty());

        let keyboard = InlineKeyboard {
            rows: vec![vec![InlineButton::callback("Pushes", "webhook.1.refresh")]],
        };
        assert!(!keyboard.is_empty());
    }

    #[test]
    fn github_events_map_to_webhook_queues() {
        assert_eq!(queues::for_github_event("push"), Some(queues::GITHUB_PUSH));
        assert_eq!(
            queues::for_github_event("check_suite"),
            Some(queues::GITHUB_CHECK_SUITE)
        );
        assert_eq!(queues::for_github_event("ping"), None);
        assert_eq!(queues::for_github_event("release"), None);
    }
}
