//! # SHA-256 Hashing
//!
//! Digests over exact byte sequences plus constant-time comparison helpers.
//!
//! Metadata hashes travel as lowercase hex strings; comparisons accept either
//! case on the expected side.

use sha2::{Digest, Sha256};
use subtle::{Choice, ConstantTimeEq};

/// SHA-256 output (256-bit).
pub type Hash = [u8; 32];

/// Hash data with SHA-256 (one-shot).
pub fn sha256(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash data with SHA-256 and return the lowercase hex digest.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Constant-time byte comparison.
///
/// Slices of different length compare unequal.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Compare two hex digests in constant time, ignoring ASCII case.
pub fn hex_digest_eq(computed: &str, expected: &str) -> bool {
    let computed = computed.to_ascii_lowercase();
    let expected = expected.to_ascii_lowercase();
    constant_time_eq(computed.as_bytes(), expected.as_bytes())
}

/// Constant-time set membership over hex digests.
///
/// Every candidate is compared; there is no early exit on a match.
pub fn contains_hex_digest<S: AsRef<str>>(set: &[S], needle: &str) -> bool {
    let needle = needle.to_ascii_lowercase();
    let mut found = Choice::from(0u8);
    for candidate in set {
        let candidate = candidate.as_ref().to_ascii_lowercase();
        found |= candidate.as_bytes().ct_eq(needle.as_bytes());
    }
    found.into()
}
