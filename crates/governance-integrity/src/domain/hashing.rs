//! # Hash Engine
//!
//! Metadata hashes are SHA-256 over the exact bytes of `payloadAsString`.
//! The payload is never re-serialized for the current-shape check.
//!
//! ## Legacy Fallback
//!
//! Whitelist signatures are created once, over the payload shape of the day.
//! Fields added to the schema later change the current hash, so historical
//! signatures cover an older shape. Each entity kind registers an ordered
//! chain of pure transforms that rebuild older shapes from the decoded
//! payload; a candidate is accepted only if it appears in the
//! governance-signed hash set of the record.
//!
//! Address and asset chains are independent lists.

use super::entities::VerifiedHash;
use super::errors::IntegrityError;
use serde_json::{Map, Value};
use shared_crypto::{contains_hex_digest, hex_digest_eq, sha256_hex};
use tracing::{debug, warn};

type Payload = Map<String, Value>;

/// Kind of whitelisted entity; selects the legacy transform chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Address,
    Asset,
}

/// A named payload-to-payload rewrite recreating an older schema shape.
#[derive(Clone, Copy)]
pub struct LegacyTransform {
    pub name: &'static str,
    /// `None` hashes the delivered bytes unchanged.
    pub apply: Option<fn(&mut Payload)>,
}

impl std::fmt::Debug for LegacyTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

const CURRENT: &str = "current";

const ADDRESS_TRANSFORMS: &[LegacyTransform] = &[
    LegacyTransform {
        name: CURRENT,
        apply: None,
    },
    LegacyTransform {
        name: "remove_labels",
        apply: Some(address_remove_labels),
    },
    LegacyTransform {
        name: "remove_marker_field",
        apply: Some(address_remove_contract_type),
    },
    LegacyTransform {
        name: "remove_labels_and_marker",
        apply: Some(address_remove_labels_and_contract_type),
    },
];

const ASSET_TRANSFORMS: &[LegacyTransform] = &[
    LegacyTransform {
        name: CURRENT,
        apply: None,
    },
    LegacyTransform {
        name: "remove_marker_field",
        apply: Some(asset_remove_is_nft),
    },
    LegacyTransform {
        name: "remove_labels_and_marker",
        apply: Some(asset_remove_is_nft_and_kind_type),
    },
];

/// Collections whose elements carried no `label` before labels were added.
const LINKED_COLLECTIONS: [&str; 2] = ["linkedInternalAddresses", "linkedWallets"];

fn address_remove_labels(payload: &mut Payload) {
    for collection in LINKED_COLLECTIONS {
        if let Some(Value::Array(items)) = payload.get_mut(collection) {
            for item in items.iter_mut() {
                if let Value::Object(entry) = item {
                    entry.shift_remove("label");
                }
            }
        }
    }
}

fn address_remove_contract_type(payload: &mut Payload) {
    payload.shift_remove("contractType");
}

fn address_remove_labels_and_contract_type(payload: &mut Payload) {
    address_remove_labels(payload);
    address_remove_contract_type(payload);
}

fn asset_remove_is_nft(payload: &mut Payload) {
    payload.shift_remove("isNFT");
}

fn asset_remove_is_nft_and_kind_type(payload: &mut Payload) {
    asset_remove_is_nft(payload);
    payload.shift_remove("kindType");
}

/// Ordered transform chain for an entity kind.
pub fn legacy_transforms(kind: EntityKind) -> &'static [LegacyTransform] {
    match kind {
        EntityKind::Address => ADDRESS_TRANSFORMS,
        EntityKind::Asset => ASSET_TRANSFORMS,
    }
}

/// SHA-256 of the given bytes as lowercase hex.
pub fn compute_hash(bytes: &[u8]) -> String {
    sha256_hex(bytes)
}

/// Check that `payload_as_string` hashes to `expected_hash` (constant-time).
pub fn verify_hash(payload_as_string: &str, expected_hash: &str) -> bool {
    hex_digest_eq(&compute_hash(payload_as_string.as_bytes()), expected_hash)
}

/// Parse a payload string into a JSON object, preserving key order.
pub fn parse_payload(payload_as_string: &str) -> Result<Payload, IntegrityError> {
    serde_json::from_str::<Payload>(payload_as_string)
        .map_err(|e| IntegrityError::MalformedPayload(e.to_string()))
}

/// Find the hash under which this payload was signed.
///
/// 1. `payload_as_string` must hash to `metadata_hash`.
/// 2. Transforms are tried in registration order; the first candidate hash
///    present in `signed_hashes` wins.
///
/// A candidate that is self-consistent but absent from the signed set is
/// never accepted.
pub fn resolve_signed_hash<S: AsRef<str>>(
    kind: EntityKind,
    payload_as_string: &str,
    metadata_hash: &str,
    signed_hashes: &[S],
) -> Result<VerifiedHash, IntegrityError> {
    let computed = compute_hash(payload_as_string.as_bytes());
    if !hex_digest_eq(&computed, metadata_hash) {
        warn!(
            computed = %computed,
            expected = %metadata_hash,
            "Metadata hash mismatch"
        );
        return Err(IntegrityError::HashMismatch {
            computed,
            expected: metadata_hash.to_string(),
        });
    }

    let mut decoded: Option<Payload> = None;
    for transform in legacy_transforms(kind) {
        let candidate = match transform.apply {
            None => computed.clone(),
            Some(apply) => {
                if decoded.is_none() {
                    decoded = Some(parse_payload(payload_as_string)?);
                }
                let mut legacy = decoded.clone().unwrap_or_default();
                apply(&mut legacy);
                let bytes = serde_json::to_vec(&legacy)
                    .map_err(|e| IntegrityError::MalformedPayload(e.to_string()))?;
                compute_hash(&bytes)
            }
        };

        if contains_hex_digest(signed_hashes, &candidate) {
            debug!(transform = transform.name, hash = %candidate, "Signed hash resolved");
            return Ok(VerifiedHash {
                hash: candidate,
                transform: transform.name,
            });
        }
    }

    warn!(
        computed = %computed,
        signed_count = signed_hashes.len(),
        "No payload variant found in signed hash set"
    );
    Err(IntegrityError::NoSignedHashVariant)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS_PAYLOAD: &str = r#"{"blockchain":"ETH","network":"mainnet","address":"0xabc","label":"Treasury","contractType":"","linkedInternalAddresses":[{"id":"1","address":"0xdef","label":"ops"}]}"#;

    fn hash_of_transform(kind: EntityKind, name: &str, payload: &str) -> String {
        let transform = legacy_transforms(kind)
            .iter()
            .find(|t| t.name == name)
            .unwrap();
        let mut decoded = parse_payload(payload).unwrap();
        (transform.apply.unwrap())(&mut decoded);
        compute_hash(serde_json::to_string(&decoded).unwrap().as_bytes())
    }

    #[test]
    fn test_verify_hash_accepts_exact_digest_only() {
        let hash = compute_hash(ADDRESS_PAYLOAD.as_bytes());
        assert!(verify_hash(ADDRESS_PAYLOAD, &hash));
        assert!(verify_hash(ADDRESS_PAYLOAD, &hash.to_uppercase()));
        assert!(!verify_hash(ADDRESS_PAYLOAD, &compute_hash(b"other")));
    }

    #[test]
    fn test_chains_are_ordered_and_independent() {
        let address: Vec<_> = legacy_transforms(EntityKind::Address)
            .iter()
            .map(|t| t.name)
            .collect();
        let asset: Vec<_> = legacy_transforms(EntityKind::Asset)
            .iter()
            .map(|t| t.name)
            .collect();

        assert_eq!(
            address,
            vec![
                "current",
                "remove_labels",
                "remove_marker_field",
                "remove_labels_and_marker"
            ]
        );
        assert_eq!(
            asset,
            vec!["current", "remove_marker_field", "remove_labels_and_marker"]
        );
    }

    #[test]
    fn test_current_hash_preferred() {
        let hash = compute_hash(ADDRESS_PAYLOAD.as_bytes());
        let verified =
            resolve_signed_hash(EntityKind::Address, ADDRESS_PAYLOAD, &hash, &[hash.clone()])
                .unwrap();
        assert_eq!(verified.transform, "current");
        assert_eq!(verified.hash, hash);
    }

    #[test]
    fn test_marker_removal_fallback_requires_signed_set() {
        let current = compute_hash(ADDRESS_PAYLOAD.as_bytes());
        let legacy = hash_of_transform(EntityKind::Address, "remove_marker_field", ADDRESS_PAYLOAD);

        let verified =
            resolve_signed_hash(EntityKind::Address, ADDRESS_PAYLOAD, &current, &[legacy.clone()])
                .unwrap();
        assert_eq!(verified.transform, "remove_marker_field");
        assert_eq!(verified.hash, legacy);

        let unsigned = resolve_signed_hash(
            EntityKind::Address,
            ADDRESS_PAYLOAD,
            &current,
            &[compute_hash(b"something else")],
        );
        assert_eq!(unsigned, Err(IntegrityError::NoSignedHashVariant));
    }

    #[test]
    fn test_remove_labels_strips_linked_labels_only() {
        let mut decoded = parse_payload(ADDRESS_PAYLOAD).unwrap();
        address_remove_labels(&mut decoded);

        assert_eq!(decoded["label"], "Treasury");
        assert!(decoded["linkedInternalAddresses"][0].get("label").is_none());
        assert_eq!(decoded["linkedInternalAddresses"][0]["address"], "0xdef");
    }

    #[test]
    fn test_reserialization_preserves_key_order() {
        let compact = r#"{"z":1,"a":{"y":2,"b":3}}"#;
        let decoded = parse_payload(compact).unwrap();
        assert_eq!(serde_json::to_string(&decoded).unwrap(), compact);
    }

    #[test]
    fn test_asset_chain_removes_both_markers() {
        let payload = r#"{"blockchain":"ETH","symbol":"USDC","isNFT":false,"kindType":"erc20"}"#;
        let current = compute_hash(payload.as_bytes());
        let legacy = compute_hash(br#"{"blockchain":"ETH","symbol":"USDC"}"#);

        let verified =
            resolve_signed_hash(EntityKind::Asset, payload, &current, &[legacy.clone()]).unwrap();
        assert_eq!(verified.transform, "remove_labels_and_marker");
        assert_eq!(verified.hash, legacy);
    }

    #[test]
    fn test_legacy_reserialization_keeps_number_text() {
        let payload = r#"{"symbol":"X","decimals":18,"minAmount":1.50,"supply":123456789012345678901234567890,"isNFT":false}"#;
        let current = compute_hash(payload.as_bytes());
        let legacy = compute_hash(
            br#"{"symbol":"X","decimals":18,"minAmount":1.50,"supply":123456789012345678901234567890}"#,
        );

        let verified =
            resolve_signed_hash(EntityKind::Asset, payload, &current, &[legacy.clone()]).unwrap();
        assert_eq!(verified.transform, "remove_marker_field");
        assert_eq!(verified.hash, legacy);
    }

    #[test]
    fn test_asset_chain_never_strips_contract_type() {
        let payload = r#"{"symbol":"USDC","contractType":"erc20"}"#;
        let current = compute_hash(payload.as_bytes());
        let address_style = compute_hash(br#"{"symbol":"USDC"}"#);

        let result = resolve_signed_hash(EntityKind::Asset, payload, &current, &[address_style]);
        assert_eq!(result, Err(IntegrityError::NoSignedHashVariant));
    }

    #[test]
    fn test_hash_mismatch_reported() {
        let result = resolve_signed_hash(
            EntityKind::Address,
            ADDRESS_PAYLOAD,
            &compute_hash(b"different"),
            &[compute_hash(ADDRESS_PAYLOAD.as_bytes())],
        );
        assert!(matches!(result, Err(IntegrityError::HashMismatch { .. })));
    }
}
