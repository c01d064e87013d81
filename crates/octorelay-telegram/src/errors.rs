// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification of Bot API failures into [`ChatError`].

use octorelay_core::ChatError;
use teloxide::RequestError;

/// Which [`ChatError`] variant a Bot API error description maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    NotModified,
    NotFound,
    Other,
}

/// Classifies a Bot API error description.
///
/// Telegram reports these conditions only as `Bad Request` descriptions, so
/// matching is on the text.
pub fn classify_description(description: &str) -> ErrorClass {
    let lower = description.to_ascii_lowercase();
    if lower.contains("message is not modified") {
        ErrorClass::NotModified
    } else if lower.contains("message to edit not found")
        || lower.contains("message to delete not found")
        || lower.contains("message can't be edited")
        || lower.contains("message_id_invalid")
        || lower.contains("chat not found")
    {
        ErrorClass::NotFound
    } else {
        ErrorClass::Other
    }
}

/// Converts a teloxide request error, keeping it as the source for `Api`.
pub fn classify(operation: &str, error: RequestError) -> ChatError {
    let description = error.to_string();
    match classify_description(&description) {
        ErrorClass::NotModified => ChatError::NotModified,
        ErrorClass::NotFound => ChatError::NotFound(description),
        ErrorClass::Other => ChatError::Api {
            message: format!("{operation} failed: {description}"),
            source: Some(Box::new(error)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_modified_is_benign() {
        assert_eq!(
            classify_description(
                "Bad Request: message is not modified: specified new message content and \
                 reply markup are exactly the same as a current content and reply markup of the message"
            ),
            ErrorClass::NotModified
        );
    }

    #[test]
    fn missing_messages_and_chats_are_not_found() {
        for description in [
            "Bad Request: message to edit not found",
            "Bad Request: message to delete not found",
            "Bad Request: message can't be edited",
            "Bad Request: MESSAGE_ID_INVALID",
            "Bad Request: chat not found",
        ] {
            assert_eq!(classify_description(description), ErrorClass::NotFound, "{description}");
        }
    }

    #[test]
    fn everything_else_is_other() {
        for description in [
            "Too Many Requests: retry after 5",
            "Forbidden: bot was blocked by the user",
            "Bad Request: can't parse entities: Character '.' is reserved",
        ] {
            assert_eq!(classify_description(description), ErrorClass::Other, "{description}");
        }
    }
}
