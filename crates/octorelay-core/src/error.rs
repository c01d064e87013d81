// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Octorelay.

use thiserror::Error;

/// The primary error type used across all Octorelay crates.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Configuration errors (missing token, invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, constraint violation).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Outbound chat API errors, classified by how the pipeline reacts to them.
    #[error("chat error: {0}")]
    Chat(#[from] ChatError),

    /// Broker errors (publish failure, consumer shutdown).
    #[error("queue error: {message}")]
    Queue {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A payload could not be encoded or decoded.
    #[error("payload error: {message}")]
    Payload {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Wraps any error as a storage error.
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        RelayError::Storage {
            source: source.into(),
        }
    }

    /// Builds a payload error from a serde failure.
    pub fn payload(message: impl Into<String>, source: serde_json::Error) -> Self {
        RelayError::Payload {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the chat error class if this error came from the chat API.
    pub fn as_chat(&self) -> Option<&ChatError> {
        match self {
            RelayError::Chat(e) => Some(e),
            _ => None,
        }
    }
}

/// Failures reported by the outbound chat API.
///
/// The render pipeline treats each variant differently: `NotModified` is a
/// success, `NotFound` discards the stored message identity, `Api` is retried
/// through redelivery.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The edit would leave the message unchanged.
    #[error("message is not modified")]
    NotModified,

    /// The message or the chat no longer exists (or the bot lost access to it).
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other API or transport failure.
    #[error("{message}")]
    Api {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ChatError {
    /// Builds an [`ChatError::Api`] without an underlying source.
    pub fn api(message: impl Into<String>) -> Self {
        ChatError::Api {
            message: message.into(),
            source: None,
        }
    }
}
