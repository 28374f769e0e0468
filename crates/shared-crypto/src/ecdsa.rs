//! # ECDSA Signatures (NIST P-256)
//!
//! ECDSA over the P-256 curve, used both for governance rules signatures and
//! for signing request approvals.
//!
//! ## Wire Conventions
//!
//! - Signatures are raw `r || s` (64 bytes), base64-encoded on the wire.
//!   DER-encoded signatures are tolerated when decoding.
//! - Messages are always SHA-256 digests; signing and verification operate on
//!   the prehash.
//! - Public keys arrive as PEM, base64 SPKI DER or base64 SEC1 points.
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Secret key material is zeroized on drop

use crate::hashing::Hash;
use crate::CryptoError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::pkcs8::DecodePublicKey;
use zeroize::Zeroize;

/// P-256 public key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct P256PublicKey(VerifyingKey);

impl P256PublicKey {
    /// Create from SEC1 bytes (compressed or uncompressed).
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        VerifyingKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|_| CryptoError::InvalidPublicKey)
    }

    /// Create from SubjectPublicKeyInfo DER bytes.
    pub fn from_spki_der(bytes: &[u8]) -> Result<Self, CryptoError> {
        VerifyingKey::from_public_key_der(bytes)
            .map(Self)
            .map_err(|_| CryptoError::InvalidPublicKey)
    }

    /// Decode a key as it appears in configuration or in a rules container.
    ///
    /// Accepts a PEM block, or base64 of either SPKI DER or a SEC1 point.
    pub fn from_encoded(encoded: &str) -> Result<Self, CryptoError> {
        let trimmed = encoded.trim();
        if trimmed.starts_with("-----BEGIN") {
            return VerifyingKey::from_public_key_pem(trimmed)
                .map(Self)
                .map_err(|_| CryptoError::InvalidPublicKey);
        }

        let bytes = STANDARD
            .decode(trimmed)
            .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;
        Self::from_spki_der(&bytes).or_else(|_| Self::from_sec1_bytes(&bytes))
    }

    /// Uncompressed SEC1 encoding (65 bytes).
    pub fn to_sec1_bytes(&self) -> Vec<u8> {
        self.0.to_encoded_point(false).as_bytes().to_vec()
    }

    /// Verify a signature over a SHA-256 digest.
    pub fn verify_prehash(
        &self,
        digest: &Hash,
        signature: &P256Signature,
    ) -> Result<(), CryptoError> {
        let sig = Signature::from_slice(&signature.0)
            .map_err(|_| CryptoError::InvalidSignatureFormat)?;
        self.0
            .verify_prehash(digest, &sig)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }

    /// Convenience predicate over [`Self::verify_prehash`].
    pub fn is_valid_prehash(&self, digest: &Hash, signature: &P256Signature) -> bool {
        self.verify_prehash(digest, signature).is_ok()
    }
}

/// ECDSA signature (64 bytes, r||s format).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct P256Signature([u8; 64]);

impl P256Signature {
    /// Create from raw r||s bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Decode raw r||s or DER bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let sig = if bytes.len() == 64 {
            Signature::from_slice(bytes)
        } else {
            Signature::from_der(bytes)
        }
        .map_err(|_| CryptoError::InvalidSignatureFormat)?;
        Ok(Self::from_signature(&sig))
    }

    /// Decode a base64 signature (raw r||s, or DER).
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    fn from_signature(sig: &Signature) -> Self {
        let mut bytes = [0u8; 64];
        bytes.copy_from_slice(&sig.to_bytes());
        Self(bytes)
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Base64 of the raw r||s bytes.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }
}

/// P-256 ECDSA keypair.
pub struct P256KeyPair {
    signing_key: SigningKey,
}

impl P256KeyPair {
    /// Generate random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        Self { signing_key }
    }

    /// Create from secret scalar bytes (32 bytes). The input copy is cleared.
    pub fn from_bytes(mut bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let result = SigningKey::from_slice(&bytes).map_err(|_| CryptoError::InvalidPrivateKey);
        bytes.zeroize();
        Ok(Self {
            signing_key: result?,
        })
    }

    /// Get the public key.
    pub fn public_key(&self) -> P256PublicKey {
        P256PublicKey(*self.signing_key.verifying_key())
    }

    /// Sign a SHA-256 digest (deterministic RFC 6979).
    pub fn sign_prehash(&self, digest: &Hash) -> Result<P256Signature, CryptoError> {
        let sig: Signature = self
            .signing_key
            .sign_prehash(digest)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        Ok(P256Signature::from_signature(&sig))
    }
}

impl std::fmt::Debug for P256KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("P256KeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}
