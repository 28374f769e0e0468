//! # HMAC-SHA256
//!
//! Keyed message authentication with constant-time tag verification.

use crate::CryptoError;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 tag (32 bytes).
pub type HmacTag = [u8; 32];

/// Computes the HMAC-SHA256 tag of `message` under `secret`.
pub fn hmac_sha256(secret: &[u8], message: &[u8]) -> Result<HmacTag, CryptoError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|_| CryptoError::InvalidKeyLength(secret.len()))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().into())
}

/// Validates an HMAC-SHA256 tag.
///
/// Returns `false` for a wrong tag, a truncated tag, or an unusable key.
pub fn verify_hmac_sha256(secret: &[u8], message: &[u8], tag: &[u8]) -> bool {
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(message);
    mac.verify_slice(tag).is_ok()
}
