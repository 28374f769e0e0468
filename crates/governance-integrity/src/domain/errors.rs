//! # Integrity Errors
//!
//! Error types for the verification pipeline.
//!
//! `IntegrityError` means the cryptographic trust chain is broken (possible
//! tampering). `WhitelistError` means trust was established but the record
//! lacks whitelisting authority. Both are fatal and never retried.

use shared_crypto::CryptoError;
use shared_types::TransportError;
use thiserror::Error;

/// Cryptographic trust could not be established.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IntegrityError {
    /// The record carries no metadata envelope at all.
    #[error("Metadata missing")]
    MissingMetadata,

    /// The metadata envelope carries no hash.
    #[error("Metadata hash missing")]
    MissingHash,

    /// A hash is present but the string it covers is not.
    #[error("Metadata hash present but payloadAsString missing")]
    MissingPayloadString,

    /// SHA-256 of `payloadAsString` differs from `metadata.hash`.
    #[error("Metadata hash mismatch: computed {computed}, expected {expected}")]
    HashMismatch { computed: String, expected: String },

    /// Neither the current payload nor any legacy variant hashes into the
    /// governance-signed hash set.
    #[error("No payload variant matches a signed hash")]
    NoSignedHashVariant,

    /// The verified payload is not a JSON object.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// The rules container bytes could not be decoded.
    #[error("Rules container decode failed: {0}")]
    RulesContainerDecode(String),

    /// Fewer distinct signers than required produced a valid rules signature.
    #[error("Insufficient governance signatures: {valid} valid, {required} required")]
    InsufficientRulesSignatures { valid: usize, required: usize },

    /// The rules container designates no unique HSM signing key.
    #[error("No HSM signing key in governance rules")]
    HsmKeyMissing,

    /// The HSM attestation does not verify.
    #[error("HSM signature invalid")]
    HsmSignatureInvalid,
}

/// Governance trust is established but whitelisting authority is not.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WhitelistError {
    /// No rule matches the record's (blockchain, network).
    #[error("No whitelisting rule for blockchain {blockchain:?}, network {network:?}")]
    NoApplicableRule { blockchain: String, network: String },

    /// The verified hash is not covered by any whitelist signature.
    #[error("Verified hash {hash} not covered by whitelist signatures")]
    HashNotCovered { hash: String },

    /// No threshold group reached its required distinct signer count.
    #[error("Whitelist signature threshold not met ({groups} threshold groups evaluated)")]
    ThresholdNotMet { groups: usize },
}

/// Any failure surfaced by a verification call.
///
/// `Clone` so a single in-flight rules fetch can hand the same outcome to
/// every waiting caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error(transparent)]
    Whitelist(#[from] WhitelistError),

    /// Transient transport failure, propagated verbatim.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The caller stopped waiting for an in-flight rules fetch.
    #[error("Timed out waiting for governance rules")]
    Timeout,

    /// The in-flight rules fetch ended without producing a result.
    #[error("Governance rules fetch aborted")]
    FetchAborted,
}

impl VerificationError {
    /// True when a caller-directed retry may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            VerificationError::Transport(_)
                | VerificationError::Timeout
                | VerificationError::FetchAborted
        )
    }
}

/// Errors from signing request approvals.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApprovalError {
    /// Nothing to approve.
    #[error("No requests to approve")]
    NoRequests,

    /// A request carries no metadata envelope.
    #[error("Request {request_id} has no metadata")]
    MissingMetadata { request_id: u64 },

    /// A request's metadata carries no hash.
    #[error("Request {request_id} has no metadata hash")]
    MissingHash { request_id: u64 },

    /// A request's `payloadAsString` does not hash to its metadata hash.
    #[error("Request {request_id} metadata hash does not match its payload")]
    HashMismatch { request_id: u64 },

    /// The hash array could not be serialized.
    #[error("Approval serialization failed: {0}")]
    Serialization(String),

    #[error("Approval signing failed: {0}")]
    Signing(#[from] CryptoError),

    #[error("Approval submission failed: {0}")]
    Submission(#[from] TransportError),
}
