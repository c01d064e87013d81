// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! GitHub `X-Hub-Signature` verification (HMAC-SHA1, `sha1=<hex>`).
//!
//! Each subscription has its own secret, so the same delivery is verified
//! once per subscription of the repository.

use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Decodes `sha1=<hex>` into raw bytes. `None` for any other shape.
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    hex::decode(header.trim().strip_prefix("sha1=")?).ok()
}

/// Computes the `sha1=<hex>` header GitHub would send for `payload`.
pub fn sign(payload: &[u8], secret: &[u8]) -> String {
    // HMAC takes keys of any length; the error arm is unreachable.
    let Ok(mut mac) = HmacSha1::new_from_slice(secret) else {
        return String::new();
    };
    mac.update(payload);
    format!("sha1={}", hex::encode(mac.finalize().into_bytes()))
}

/// Checks `header` against the HMAC of `payload` in constant time.
pub fn verify(payload: &[u8], header: &str, secret: &[u8]) -> bool {
    let Some(claimed) = parse_signature_header(header) else {
        return false;
    };
    let Ok(mut mac) = HmacSha1::new_from_slice(secret) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&claimed).is_ok()
}
