//! # Request Approval Signer
//!
//! One signature approves a batch of requests. The platform reconstructs the
//! signed bytes from the request IDs alone, so both sides must agree on:
//!
//! - order: requests sorted by numeric ID ascending
//! - bytes: the compact JSON array of their metadata hashes, e.g. `["aa","bb"]`
//!
//! The signature is ECDSA P-256 over SHA-256 of those bytes, raw r||s, base64.

use super::errors::ApprovalError;
use super::hashing::verify_hash;
use shared_crypto::{sha256, P256KeyPair};
use shared_types::{ApproveRequestsDto, RequestDto};
use tracing::{debug, warn};

/// Compact JSON array of hashes, no whitespace.
pub fn serialize_hash_array<S: AsRef<str>>(hashes: &[S]) -> Result<Vec<u8>, serde_json::Error> {
    let hashes: Vec<&str> = hashes.iter().map(AsRef::as_ref).collect();
    serde_json::to_vec(&hashes)
}

/// A batch approval ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedApproval {
    /// Sorted ascending; same order as `hashes`.
    pub request_ids: Vec<u64>,
    pub hashes: Vec<String>,
    /// Base64 raw r||s.
    pub signature: String,
}

impl SignedApproval {
    pub fn len(&self) -> usize {
        self.request_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.request_ids.is_empty()
    }

    pub fn to_dto(&self, comment: impl Into<String>) -> ApproveRequestsDto {
        ApproveRequestsDto {
            ids: self.request_ids.iter().map(u64::to_string).collect(),
            signature: self.signature.clone(),
            comment: comment.into(),
        }
    }
}

/// Sort requests and collect their hashes, rejecting the whole batch if any
/// request cannot be signed.
fn ordered_hashes(requests: &[RequestDto]) -> Result<(Vec<u64>, Vec<String>), ApprovalError> {
    if requests.is_empty() {
        return Err(ApprovalError::NoRequests);
    }

    let mut sorted: Vec<&RequestDto> = requests.iter().collect();
    sorted.sort_by_key(|r| r.id);

    let mut ids = Vec::with_capacity(sorted.len());
    let mut hashes = Vec::with_capacity(sorted.len());
    for request in sorted {
        let request_id = request.id;
        let metadata = request
            .metadata
            .as_ref()
            .ok_or(ApprovalError::MissingMetadata { request_id })?;
        let hash = metadata
            .hash
            .as_deref()
            .ok_or(ApprovalError::MissingHash { request_id })?;

        if let Some(payload) = metadata.payload_as_string.as_deref() {
            if !verify_hash(payload, hash) {
                warn!(request_id, "Request metadata hash does not match payload");
                return Err(ApprovalError::HashMismatch { request_id });
            }
        }

        ids.push(request_id);
        hashes.push(hash.to_string());
    }
    Ok((ids, hashes))
}

/// Exact bytes signed for this set of requests, independent of input order.
pub fn approval_message(requests: &[RequestDto]) -> Result<Vec<u8>, ApprovalError> {
    let (_, hashes) = ordered_hashes(requests)?;
    serialize_hash_array(&hashes).map_err(|e| ApprovalError::Serialization(e.to_string()))
}

/// Sign a batch of requests with one approval signature.
pub fn sign_requests(
    requests: &[RequestDto],
    key: &P256KeyPair,
) -> Result<SignedApproval, ApprovalError> {
    let (request_ids, hashes) = ordered_hashes(requests)?;
    let message =
        serialize_hash_array(&hashes).map_err(|e| ApprovalError::Serialization(e.to_string()))?;
    let signature = key.sign_prehash(&sha256(&message))?;

    debug!(count = request_ids.len(), "Requests signed for approval");
    Ok(SignedApproval {
        request_ids,
        hashes,
        signature: signature.to_base64(),
    })
}
