//! # Whitelist Integrity Orchestrator
//!
//! Verifies whitelisted address and asset records in a fixed order, failing
//! closed at the first broken step:
//!
//! 1. Metadata hash, with legacy fallback against the signed hash set
//! 2. Governance rules, authenticated (and HSM attestation for addresses)
//! 3. Applicable rule for the verified (blockchain, network)
//! 4. Verified hash covered by the whitelist signatures
//! 5. Threshold groups: any one group reaching its distinct signer count
//! 6. Output built only from the verified payload string
//!
//! Convenience fields on the DTO (`payload`, `address`, `blockchain`, ...)
//! never feed a trust decision or a security-relevant output field.

use super::approval::serialize_hash_array;
use super::entities::{
    LinkedAddress, LinkedWallet, RulesContainer, VerifiedHash, WhitelistedAddress,
    WhitelistedAsset, WhitelistingRule,
};
use super::errors::{IntegrityError, VerificationError, WhitelistError};
use super::hashing::{parse_payload, resolve_signed_hash, EntityKind};
use serde_json::{Map, Value};
use shared_crypto::{contains_hex_digest, sha256, P256Signature};
use shared_types::{
    Envelope, SignedAddressDto, WhitelistSignatureDto, WhitelistedAddressDto, WhitelistedAssetDto,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Supplies the authenticated governance rules.
///
/// Implemented for closures so callers can route through a cache.
pub trait TrustedRules {
    fn trusted_rules(&self) -> Result<Arc<RulesContainer>, VerificationError>;
}

impl<F> TrustedRules for F
where
    F: Fn() -> Result<Arc<RulesContainer>, VerificationError>,
{
    fn trusted_rules(&self) -> Result<Arc<RulesContainer>, VerificationError> {
        self()
    }
}

/// Payload whose metadata hash resolved into the signed hash set.
#[derive(Debug, Clone)]
pub struct VerifiedPayload {
    pub hash: VerifiedHash,
    pub raw: String,
    pub document: Map<String, Value>,
}

impl VerifiedPayload {
    fn scope(&self) -> (String, String) {
        (text(&self.document, "blockchain"), text(&self.document, "network"))
    }
}

/// Runs the ordered verification steps against a source of trusted rules.
pub struct WhitelistOrchestrator<R> {
    rules: R,
}

impl<R: TrustedRules> WhitelistOrchestrator<R> {
    pub fn new(rules: R) -> Self {
        Self { rules }
    }

    /// Verify one whitelisted address.
    pub fn verify_address(
        &self,
        dto: &WhitelistedAddressDto,
    ) -> Result<WhitelistedAddress, VerificationError> {
        let payload = verify_metadata(EntityKind::Address, dto.metadata.as_ref(), &dto.signatures)?;
        let rules = self.rules.trusted_rules()?;

        if let Some(signed_address) = &dto.signed_address {
            verify_hsm_attestation(&rules, &payload, signed_address)?;
        }

        let (blockchain, network) = payload.scope();
        let rule = rules
            .find_address_rule(&blockchain, &network)
            .ok_or_else(|| WhitelistError::NoApplicableRule {
                blockchain: blockchain.clone(),
                network: network.clone(),
            })?;

        authorize(&rules, rule, &payload.hash, &dto.signatures)?;

        debug!(id = %dto.id, transform = payload.hash.transform, "Whitelisted address verified");
        Ok(build_address(payload, dto))
    }

    /// Verify a whitelisted contract asset.
    pub fn verify_asset(
        &self,
        dto: &WhitelistedAssetDto,
    ) -> Result<WhitelistedAsset, VerificationError> {
        let payload = verify_metadata(EntityKind::Asset, dto.metadata.as_ref(), &dto.signatures)?;
        let rules = self.rules.trusted_rules()?;

        let (blockchain, network) = payload.scope();
        let rule = rules
            .find_contract_address_rule(&blockchain, &network)
            .ok_or_else(|| WhitelistError::NoApplicableRule {
                blockchain: blockchain.clone(),
                network: network.clone(),
            })?;

        authorize(&rules, rule, &payload.hash, &dto.signatures)?;

        debug!(id = %dto.id, transform = payload.hash.transform, "Whitelisted asset verified");
        Ok(build_asset(payload, dto))
    }

    /// Verify addresses in order; the first failure aborts the whole batch.
    pub fn verify_addresses(
        &self,
        dtos: &[WhitelistedAddressDto],
    ) -> Result<Vec<WhitelistedAddress>, VerificationError> {
        dtos.iter()
            .enumerate()
            .map(|(index, dto)| {
                self.verify_address(dto).inspect_err(|e| {
                    warn!(index, id = %dto.id, error = %e, "Address batch aborted");
                })
            })
            .collect()
    }

    /// Verify assets in order; the first failure aborts the whole batch.
    pub fn verify_assets(
        &self,
        dtos: &[WhitelistedAssetDto],
    ) -> Result<Vec<WhitelistedAsset>, VerificationError> {
        dtos.iter()
            .enumerate()
            .map(|(index, dto)| {
                self.verify_asset(dto).inspect_err(|e| {
                    warn!(index, id = %dto.id, error = %e, "Asset batch aborted");
                })
            })
            .collect()
    }
}

// =============================================================================
// STEP 1: METADATA HASH
// =============================================================================

/// Resolve the signed hash of a record and decode its verified payload.
pub fn verify_metadata(
    kind: EntityKind,
    metadata: Option<&Envelope>,
    signatures: &[WhitelistSignatureDto],
) -> Result<VerifiedPayload, IntegrityError> {
    let metadata = metadata.ok_or(IntegrityError::MissingMetadata)?;
    let hash = metadata.hash.as_deref().ok_or(IntegrityError::MissingHash)?;
    let raw = metadata
        .payload_as_string
        .as_deref()
        .ok_or(IntegrityError::MissingPayloadString)?;

    let signed_hashes = signed_hash_set(signatures);
    let verified = resolve_signed_hash(kind, raw, hash, &signed_hashes)?;
    let document = parse_payload(raw)?;

    Ok(VerifiedPayload {
        hash: verified,
        raw: raw.to_string(),
        document,
    })
}

fn signed_hash_set(signatures: &[WhitelistSignatureDto]) -> Vec<&str> {
    signatures
        .iter()
        .flat_map(|s| s.hashes.iter().map(String::as_str))
        .collect()
}

// =============================================================================
// STEP 2b: HSM ATTESTATION
// =============================================================================

/// The HSM signs SHA-256 of the verified payload bytes.
pub fn verify_hsm_attestation(
    rules: &RulesContainer,
    payload: &VerifiedPayload,
    signed_address: &SignedAddressDto,
) -> Result<(), IntegrityError> {
    let key = rules.hsm_public_key().ok_or(IntegrityError::HsmKeyMissing)?;
    let signature = P256Signature::from_base64(&signed_address.signature)
        .map_err(|_| IntegrityError::HsmSignatureInvalid)?;

    if !key.is_valid_prehash(&sha256(payload.raw.as_bytes()), &signature) {
        warn!(hash = %payload.hash.hash, "HSM attestation failed");
        return Err(IntegrityError::HsmSignatureInvalid);
    }
    Ok(())
}

// =============================================================================
// STEPS 4-5: HASH COVERAGE AND THRESHOLDS
// =============================================================================

/// Check hash coverage, then evaluate the rule's parallel threshold groups.
pub fn authorize(
    rules: &RulesContainer,
    rule: &WhitelistingRule,
    verified: &VerifiedHash,
    signatures: &[WhitelistSignatureDto],
) -> Result<(), WhitelistError> {
    if !contains_hex_digest(&signed_hash_set(signatures), &verified.hash) {
        return Err(WhitelistError::HashNotCovered {
            hash: verified.hash.clone(),
        });
    }

    let signers = valid_signers(rules, verified, signatures);

    let satisfied = rule.threshold_groups.iter().any(|threshold| {
        let Some(group) = rules.group(&threshold.group_id) else {
            warn!(group_id = %threshold.group_id, "Threshold references unknown group");
            return false;
        };
        let members: HashSet<&str> = group.user_ids.iter().map(String::as_str).collect();
        let count = members.iter().filter(|m| signers.contains(*m)).count();
        threshold.minimum_signatures > 0 && count >= threshold.minimum_signatures as usize
    });

    if !satisfied {
        warn!(
            hash = %verified.hash,
            valid_signers = signers.len(),
            groups = rule.threshold_groups.len(),
            "Whitelist threshold not met"
        );
        return Err(WhitelistError::ThresholdNotMet {
            groups: rule.threshold_groups.len(),
        });
    }
    Ok(())
}

/// Distinct user IDs with a valid signature covering the verified hash.
///
/// A signature counts only if its signer is a user of the verified rules
/// with a usable key and it verifies over SHA-256 of the compact JSON array
/// of the hashes it covers. All signatures are evaluated.
fn valid_signers<'a>(
    rules: &RulesContainer,
    verified: &VerifiedHash,
    signatures: &'a [WhitelistSignatureDto],
) -> HashSet<&'a str> {
    let mut signers = HashSet::new();
    for whitelist_signature in signatures {
        let user_id = whitelist_signature.signature.user_id.as_str();
        let covers = contains_hex_digest(&whitelist_signature.hashes, &verified.hash);

        let key = rules.user_public_key(user_id);
        let signature = P256Signature::from_base64(&whitelist_signature.signature.signature).ok();
        let message = serialize_hash_array(&whitelist_signature.hashes).ok();

        let valid = match (key, signature, message) {
            (Some(key), Some(signature), Some(message)) => {
                key.is_valid_prehash(&sha256(&message), &signature)
            }
            _ => false,
        };

        if covers && valid {
            signers.insert(user_id);
        }
    }
    signers
}

// =============================================================================
// STEP 6: OUTPUT FROM VERIFIED PAYLOAD
// =============================================================================

fn text(document: &Map<String, Value>, field: &str) -> String {
    match document.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn objects<'a>(document: &'a Map<String, Value>, field: &str) -> Vec<&'a Map<String, Value>> {
    match document.get(field) {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_object).collect(),
        _ => Vec::new(),
    }
}

fn build_address(payload: VerifiedPayload, dto: &WhitelistedAddressDto) -> WhitelistedAddress {
    let document = &payload.document;
    WhitelistedAddress {
        id: dto.id.clone(),
        status: dto.status.clone(),
        created_at: dto.created_at.clone(),
        blockchain: text(document, "blockchain"),
        network: text(document, "network"),
        address: text(document, "address"),
        label: text(document, "label"),
        currency: text(document, "currency"),
        memo: text(document, "memo"),
        customer_id: text(document, "customerId"),
        contract_type: text(document, "contractType"),
        linked_internal_addresses: objects(document, "linkedInternalAddresses")
            .into_iter()
            .map(|entry| LinkedAddress {
                id: text(entry, "id"),
                address: text(entry, "address"),
                label: text(entry, "label"),
            })
            .collect(),
        linked_wallets: objects(document, "linkedWallets")
            .into_iter()
            .map(|entry| LinkedWallet {
                id: text(entry, "id"),
                path: text(entry, "path"),
                label: text(entry, "label"),
            })
            .collect(),
        verified_hash: payload.hash,
    }
}

fn build_asset(payload: VerifiedPayload, dto: &WhitelistedAssetDto) -> WhitelistedAsset {
    let document = &payload.document;
    WhitelistedAsset {
        id: dto.id.clone(),
        status: dto.status.clone(),
        created_at: dto.created_at.clone(),
        blockchain: text(document, "blockchain"),
        network: text(document, "network"),
        contract_address: text(document, "contractAddress"),
        symbol: text(document, "symbol"),
        name: text(document, "name"),
        decimals: match document.get("decimals") {
            Some(Value::Number(n)) => n.as_u64().and_then(|d| u32::try_from(d).ok()),
            Some(Value::String(s)) => s.parse().ok(),
            _ => None,
        },
        is_nft: document.get("isNFT").and_then(Value::as_bool),
        kind_type: text(document, "kindType"),
        token_id: text(document, "tokenId"),
        verified_hash: payload.hash,
    }
}
