//! # Shared Crypto - Signature Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256 | Metadata hashes, signing prehash |
//! | `ecdsa` | NIST P-256 | Governance rules, whitelist and approval signatures |
//! | `hmac` | HMAC-SHA256 | Keyed message authentication |
//!
//! ## Security Properties
//!
//! - **P-256**: RFC 6979 deterministic nonces, raw r||s wire encoding
//! - **Comparisons**: digest and tag comparisons are constant-time

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;
pub mod hmac;

// Re-exports
pub use ecdsa::{P256KeyPair, P256PublicKey, P256Signature};
pub use errors::CryptoError;
pub use hashing::{constant_time_eq, contains_hex_digest, hex_digest_eq, sha256, sha256_hex, Hash};
pub use self::hmac::{hmac_sha256, verify_hmac_sha256, HmacTag};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
