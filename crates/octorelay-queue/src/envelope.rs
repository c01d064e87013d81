// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event envelopes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use octorelay_core::{PublishOptions, RelayError};

/// A payload type that can travel through a queue.
///
/// `KIND` is written into every envelope and checked on decode, so a message
/// published to the wrong queue is rejected instead of misinterpreted.
pub trait Event: Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: &'static str;
}

/// Serialized unit of work addressed to one queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub kind: String,
    pub payload: serde_json::Value,
    pub queue: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_after_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

impl Envelope {
    pub fn new<E: Event>(queue: impl Into<String>, event: &E) -> Result<Self, RelayError> {
        let payload = serde_json::to_value(event)
            .map_err(|e| RelayError::payload(format!("encoding {}", E::KIND), e))?;
        Ok(Self {
            kind: E::KIND.to_string(),
            payload,
            queue: queue.into(),
            expires_after_ms: None,
            delay_ms: None,
        })
    }

    /// Drops the envelope if it is still queued after `ms` milliseconds.
    pub fn expires_after(mut self, ms: u64) -> Self {
        self.expires_after_ms = Some(ms);
        self
    }

    /// Makes the envelope deliverable only after `ms` milliseconds.
    pub fn delayed_by(mut self, ms: u64) -> Self {
        self.delay_ms = Some(ms);
        self
    }

    pub fn publish_options(&self) -> PublishOptions {
        PublishOptions {
            expires_after_ms: self.expires_after_ms,
            delay_ms: self.delay_ms,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, RelayError> {
        serde_json::to_vec(self).map_err(|e| RelayError::payload("encoding envelope", e))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, RelayError> {
        serde_json::from_slice(bytes).map_err(|e| RelayError::payload("decoding envelope", e))
    }

    /// Decodes the payload as `E`, checking the kind discriminator.
    pub fn into_event<E: Event>(self) -> Result<E, RelayError> {
        if self.kind != E::KIND {
            return Err(RelayError::Payload {
                message: format!("expected `{}` envelope, got `{}`", E::KIND, self.kind),
                source: None,
            });
        }
        serde_json::from_value(self.payload)
            .map_err(|e| RelayError::payload(format!("decoding {}", E::KIND), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Ping {
        n: u32,
    }

    impl Event for Ping {
        const KIND: &'static str = "ping";
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Pong {
        n: u32,
    }

    impl Event for Pong {
        const KIND: &'static str = "pong";
    }

    #[test]
    fn expiry_becomes_publish_option() {
        let env = Envelope::new("q", &Ping { n: 1 }).unwrap().expires_after(500);
        assert_eq!(env.publish_options().expires_after_ms, Some(500));

        let decoded = Envelope::decode(&env.encode().unwrap()).unwrap();
        assert_eq!(decoded, env);
        assert_eq!(decoded.into_event::<Ping>().unwrap(), Ping { n: 1 });
    }

    #[test]
    fn delay_becomes_publish_option() {
        let env = Envelope::new("q", &Ping { n: 2 })
            .unwrap()
            .expires_after(5_000)
            .delayed_by(1_000);
        assert_eq!(
            env.publish_options(),
            PublishOptions {
                expires_after_ms: Some(5_000),
                delay_ms: Some(1_000),
            }
        );
        let plain = Envelope::new("q", &Ping { n: 2 }).unwrap();
        assert_eq!(plain.publish_options().delay_ms, None);
    }

    #[test]
    fn kind_mismatch_is_a_payload_error() {
        let env = Envelope::new("q", &Ping { n: 1 }).unwrap();
        let err = env.into_event::<Pong>().unwrap_err();
        assert!(matches!(err, RelayError::Payload { .. }));
        assert!(err.to_string().contains("expected `pong`"));
    }

    #[test]
    fn garbage_bytes_do_not_decode() {
        assert!(Envelope::decode(b"not json").is_err());
    }
}
