//! # API Envelopes and DTOs
//!
//! Shapes of the governance-rules, whitelisted-address, whitelisted-asset and
//! request resources as delivered by the platform (JSON, camelCase).

use serde::{Deserialize, Serialize};

/// Metadata envelope attached to every signed resource.
///
/// - `hash`: hex SHA-256 of `payload_as_string`
/// - `payload_as_string`: the exact bytes the hash and signatures cover
/// - `payload`: server-decoded convenience copy. Untrusted, never read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_as_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl Envelope {
    /// Envelope carrying a hash and the string it was computed over.
    pub fn signed(hash: impl Into<String>, payload_as_string: impl Into<String>) -> Self {
        Self {
            hash: Some(hash.into()),
            payload_as_string: Some(payload_as_string.into()),
            payload: None,
        }
    }
}

// =============================================================================
// GOVERNANCE RULES
// =============================================================================

/// One governance signature over the rules container bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSignatureDto {
    pub user_id: String,
    /// Base64 ECDSA P-256 signature (raw r||s).
    pub signature: String,
}

/// Governance rules resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceRulesDto {
    /// Base64 of the encoded rules container.
    pub rules_container: String,
    #[serde(default)]
    pub rules_signatures: Vec<RuleSignatureDto>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
}

// =============================================================================
// WHITELISTING
// =============================================================================

/// Signer identity and signature bytes of a whitelist approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureDto {
    pub user_id: String,
    /// Base64 ECDSA P-256 signature (raw r||s).
    pub signature: String,
}

/// A whitelist approval covering one or more metadata hashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhitelistSignatureDto {
    #[serde(default)]
    pub hashes: Vec<String>,
    pub signature: SignatureDto,
}

/// HSM attestation attached to a whitelisted address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedAddressDto {
    /// Base64 ECDSA P-256 signature by the HSM slot key.
    pub signature: String,
}

/// Whitelisted address resource.
///
/// `blockchain`, `network`, `address` and `label` are server convenience
/// copies and are untrusted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhitelistedAddressDto {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Envelope>,
    #[serde(default)]
    pub signatures: Vec<WhitelistSignatureDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_address: Option<SignedAddressDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockchain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Whitelisted contract asset resource.
///
/// `blockchain`, `network`, `contract_address` and `symbol` are untrusted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhitelistedAssetDto {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Envelope>,
    #[serde(default)]
    pub signatures: Vec<WhitelistSignatureDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockchain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

// =============================================================================
// REQUEST APPROVAL
// =============================================================================

/// A pending transfer request awaiting approval.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDto {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Envelope>,
}

/// Body submitted to approve a batch of requests with one signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequestsDto {
    /// Request IDs in signing order.
    pub ids: Vec<String>,
    /// Base64 ECDSA P-256 signature (raw r||s) over SHA-256 of the hash array.
    pub signature: String,
    pub comment: String,
}
