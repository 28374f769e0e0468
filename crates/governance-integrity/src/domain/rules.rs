//! # Governance Rules Verifier
//!
//! Authenticates a rules container against the configured trusted keys and
//! exposes the lookups the whitelist checks depend on.
//!
//! ## Security Notes
//!
//! - Every signature is tested against every trusted key; there is no early
//!   exit, so timing does not reveal which signature failed.
//! - A signature counts only if it adds both a new signer ID and a new
//!   trusted key, so one key cannot be replayed under several IDs.
//! - The container is decoded only after its bytes are authenticated.

use super::codec::decode_rules_container;
use super::entities::{Group, RulesContainer, User, UserRole, WhitelistingRule};
use super::errors::IntegrityError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use shared_crypto::{sha256, P256PublicKey, P256Signature};
use shared_types::GovernanceRulesDto;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Verifier bound to a trusted key set and signature threshold.
#[derive(Debug, Clone)]
pub struct GovernanceRulesVerifier {
    trusted_keys: Vec<P256PublicKey>,
    min_valid_signatures: usize,
}

impl GovernanceRulesVerifier {
    pub fn new(trusted_keys: Vec<P256PublicKey>, min_valid_signatures: usize) -> Self {
        Self {
            trusted_keys,
            min_valid_signatures,
        }
    }

    /// Authenticate and decode a governance rules resource.
    pub fn verify(&self, rules: &GovernanceRulesDto) -> Result<RulesContainer, IntegrityError> {
        verify_governance_rules(rules, &self.trusted_keys, self.min_valid_signatures)
    }
}

/// Authenticate a governance rules resource and decode its container.
///
/// Succeeds only when at least `min_valid_signatures` signatures verify, each
/// from a distinct signer ID and a distinct trusted key.
pub fn verify_governance_rules(
    rules: &GovernanceRulesDto,
    trusted_keys: &[P256PublicKey],
    min_valid_signatures: usize,
) -> Result<RulesContainer, IntegrityError> {
    let container_bytes = STANDARD
        .decode(rules.rules_container.trim())
        .map_err(|e| IntegrityError::RulesContainerDecode(e.to_string()))?;
    let digest = sha256(&container_bytes);

    let mut signer_ids: HashSet<&str> = HashSet::new();
    let mut signing_keys: HashSet<usize> = HashSet::new();
    for rule_signature in &rules.rules_signatures {
        let signature = P256Signature::from_base64(&rule_signature.signature).ok();

        let mut matched: Option<usize> = None;
        for (index, key) in trusted_keys.iter().enumerate() {
            if let Some(signature) = &signature {
                if key.is_valid_prehash(&digest, signature) && matched.is_none() {
                    matched = Some(index);
                }
            }
        }

        let Some(index) = matched else {
            continue;
        };
        let user_id = rule_signature.user_id.as_str();
        if signer_ids.contains(user_id) || signing_keys.contains(&index) {
            debug!(user_id, key_index = index, "Governance signature adds no new signer");
            continue;
        }
        signer_ids.insert(user_id);
        signing_keys.insert(index);
    }

    // A zero threshold would accept an unsigned container.
    let required = min_valid_signatures.max(1);
    if signing_keys.len() < required {
        warn!(
            valid = signing_keys.len(),
            required,
            presented = rules.rules_signatures.len(),
            "Governance rules signature threshold not met"
        );
        return Err(IntegrityError::InsufficientRulesSignatures {
            valid: signing_keys.len(),
            required,
        });
    }

    let container = decode_rules_container(&container_bytes)?;
    debug!(
        valid_signers = signing_keys.len(),
        users = container.users.len(),
        address_rules = container.address_whitelisting_rules.len(),
        contract_rules = container.contract_address_whitelisting_rules.len(),
        "Governance rules verified"
    );
    Ok(container)
}

impl WhitelistingRule {
    fn scope_matches(scope: &Option<String>, value: &str) -> bool {
        scope
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(value))
    }

    fn is_exact(&self, blockchain: &str, network: &str) -> bool {
        Self::scope_matches(&self.blockchain, blockchain) && Self::scope_matches(&self.network, network)
    }

    fn is_blockchain_only(&self, blockchain: &str) -> bool {
        Self::scope_matches(&self.blockchain, blockchain) && self.network.is_none()
    }

    fn is_global(&self) -> bool {
        self.blockchain.is_none() && self.network.is_none()
    }
}

/// Priority scan: exact (blockchain, network), then blockchain-only, then
/// global. Within a tier the first rule in list order wins.
fn find_rule<'a>(
    rules: &'a [WhitelistingRule],
    blockchain: &str,
    network: &str,
) -> Option<&'a WhitelistingRule> {
    rules
        .iter()
        .find(|r| r.is_exact(blockchain, network))
        .or_else(|| rules.iter().find(|r| r.is_blockchain_only(blockchain)))
        .or_else(|| rules.iter().find(|r| r.is_global()))
}

impl RulesContainer {
    /// Rule governing address whitelisting for this scope.
    pub fn find_address_rule(&self, blockchain: &str, network: &str) -> Option<&WhitelistingRule> {
        find_rule(&self.address_whitelisting_rules, blockchain, network)
    }

    /// Rule governing contract asset whitelisting for this scope.
    pub fn find_contract_address_rule(
        &self,
        blockchain: &str,
        network: &str,
    ) -> Option<&WhitelistingRule> {
        find_rule(&self.contract_address_whitelisting_rules, blockchain, network)
    }

    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn user_public_key(&self, id: &str) -> Option<P256PublicKey> {
        self.user(id).and_then(|u| u.public_key)
    }

    /// Key of the unique `HsmSlot` user, computed once per container.
    ///
    /// No HSM user, several HSM users, or an undecodable key all yield `None`.
    pub fn hsm_public_key(&self) -> Option<P256PublicKey> {
        *self.hsm_key.get_or_init(|| {
            let mut hsm_users = self.users.iter().filter(|u| u.has_role(&UserRole::HsmSlot));
            match (hsm_users.next(), hsm_users.next()) {
                (Some(user), None) => user.public_key,
                (Some(_), Some(_)) => {
                    warn!("Multiple HSM slot users in governance rules");
                    None
                }
                _ => None,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::codec::{RulesContainerMessage, UserMessage};
    use crate::domain::entities::ThresholdGroup;
    use shared_crypto::P256KeyPair;
    use shared_types::RuleSignatureDto;

    fn container_bytes() -> Vec<u8> {
        RulesContainerMessage {
            users: vec![UserMessage {
                id: "alice".into(),
                public_key: String::new(),
                roles: vec!["ADMIN".into()],
            }],
            timestamp: 42,
            ..Default::default()
        }
        .encode_binary()
    }

    fn sign(key: &P256KeyPair, user_id: &str, bytes: &[u8]) -> RuleSignatureDto {
        RuleSignatureDto {
            user_id: user_id.into(),
            signature: key.sign_prehash(&sha256(bytes)).unwrap().to_base64(),
        }
    }

    fn dto(bytes: &[u8], signatures: Vec<RuleSignatureDto>) -> GovernanceRulesDto {
        GovernanceRulesDto {
            rules_container: STANDARD.encode(bytes),
            rules_signatures: signatures,
            locked: false,
            creation_date: None,
        }
    }

    #[test]
    fn test_two_of_three_valid_signatures_pass() {
        let (k1, k2, rogue) = (P256KeyPair::generate(), P256KeyPair::generate(), P256KeyPair::generate());
        let trusted = vec![k1.public_key(), k2.public_key()];
        let bytes = container_bytes();

        let rules = dto(
            &bytes,
            vec![sign(&k1, "u1", &bytes), sign(&rogue, "u3", &bytes), sign(&k2, "u2", &bytes)],
        );

        let container = verify_governance_rules(&rules, &trusted, 2).unwrap();
        assert_eq!(container.timestamp, 42);
    }

    #[test]
    fn test_single_valid_signer_fails_threshold() {
        let (k1, k2) = (P256KeyPair::generate(), P256KeyPair::generate());
        let trusted = vec![k1.public_key(), k2.public_key()];
        let bytes = container_bytes();

        let rules = dto(&bytes, vec![sign(&k1, "u1", &bytes), sign(&k2, "u2", b"other bytes")]);

        assert_eq!(
            verify_governance_rules(&rules, &trusted, 2).unwrap_err(),
            IntegrityError::InsufficientRulesSignatures { valid: 1, required: 2 }
        );
    }

    #[test]
    fn test_duplicate_signer_counts_once() {
        let (k1, k2) = (P256KeyPair::generate(), P256KeyPair::generate());
        let trusted = vec![k1.public_key(), k2.public_key()];
        let bytes = container_bytes();

        let rules = dto(&bytes, vec![sign(&k1, "u1", &bytes), sign(&k2, "u1", &bytes)]);

        assert_eq!(
            verify_governance_rules(&rules, &trusted, 2).unwrap_err(),
            IntegrityError::InsufficientRulesSignatures { valid: 1, required: 2 }
        );
    }

    #[test]
    fn test_one_key_under_two_ids_counts_once() {
        let (k1, k2) = (P256KeyPair::generate(), P256KeyPair::generate());
        let trusted = vec![k1.public_key(), k2.public_key()];
        let bytes = container_bytes();

        let rules = dto(&bytes, vec![sign(&k1, "u1", &bytes), sign(&k1, "u2", &bytes)]);

        assert_eq!(
            verify_governance_rules(&rules, &trusted, 2).unwrap_err(),
            IntegrityError::InsufficientRulesSignatures { valid: 1, required: 2 }
        );
    }

    #[test]
    fn test_malformed_signature_does_not_abort_evaluation() {
        let (k1, k2) = (P256KeyPair::generate(), P256KeyPair::generate());
        let trusted = vec![k1.public_key(), k2.public_key()];
        let bytes = container_bytes();
        let garbage = RuleSignatureDto {
            user_id: "u0".into(),
            signature: "not base64!".into(),
        };

        let rules = dto(&bytes, vec![garbage, sign(&k1, "u1", &bytes), sign(&k2, "u2", &bytes)]);
        assert!(verify_governance_rules(&rules, &trusted, 2).is_ok());
    }

    #[test]
    fn test_zero_threshold_still_requires_a_signature() {
        let k1 = P256KeyPair::generate();
        let rules = dto(&container_bytes(), vec![]);
        assert!(matches!(
            verify_governance_rules(&rules, &[k1.public_key()], 0),
            Err(IntegrityError::InsufficientRulesSignatures { required: 1, .. })
        ));
    }

    #[test]
    fn test_invalid_base64_container() {
        let rules = GovernanceRulesDto {
            rules_container: "***".into(),
            rules_signatures: vec![],
            locked: false,
            creation_date: None,
        };
        assert!(matches!(
            GovernanceRulesVerifier::new(vec![], 1).verify(&rules),
            Err(IntegrityError::RulesContainerDecode(_))
        ));
    }

    fn rule(blockchain: Option<&str>, network: Option<&str>, group: &str) -> WhitelistingRule {
        WhitelistingRule {
            blockchain: blockchain.map(Into::into),
            network: network.map(Into::into),
            threshold_groups: vec![ThresholdGroup {
                group_id: group.into(),
                minimum_signatures: 1,
            }],
        }
    }

    fn group_of(rule: Option<&WhitelistingRule>) -> Option<&str> {
        rule.map(|r| r.threshold_groups[0].group_id.as_str())
    }

    #[test]
    fn test_rule_priority_order() {
        let container = RulesContainer {
            address_whitelisting_rules: vec![
                rule(None, None, "global"),
                rule(Some("ETH"), None, "eth-any"),
                rule(Some("ETH"), Some("mainnet"), "eth-mainnet"),
                rule(Some("ETH"), Some("mainnet"), "eth-mainnet-shadowed"),
            ],
            ..Default::default()
        };

        assert_eq!(group_of(container.find_address_rule("ETH", "mainnet")), Some("eth-mainnet"));
        assert_eq!(group_of(container.find_address_rule("eth", "MAINNET")), Some("eth-mainnet"));
        assert_eq!(group_of(container.find_address_rule("ETH", "goerli")), Some("eth-any"));
        assert_eq!(group_of(container.find_address_rule("BTC", "mainnet")), Some("global"));
    }

    #[test]
    fn test_no_rule_means_no_authority() {
        let container = RulesContainer {
            address_whitelisting_rules: vec![rule(Some("ETH"), Some("mainnet"), "g")],
            contract_address_whitelisting_rules: vec![rule(None, None, "assets")],
            ..Default::default()
        };

        assert!(container.find_address_rule("BTC", "mainnet").is_none());
        assert!(container.find_address_rule("ETH", "").is_none());
        assert_eq!(group_of(container.find_contract_address_rule("BTC", "x")), Some("assets"));
    }

    fn user(id: &str, roles: Vec<UserRole>, key: Option<P256PublicKey>) -> User {
        User {
            id: id.into(),
            roles,
            public_key: key,
        }
    }

    #[test]
    fn test_hsm_key_discovery() {
        let hsm = P256KeyPair::generate();
        let container = RulesContainer {
            users: vec![
                user("admin", vec![UserRole::Admin], Some(P256KeyPair::generate().public_key())),
                user("hsm", vec![UserRole::HsmSlot], Some(hsm.public_key())),
            ],
            ..Default::default()
        };

        assert_eq!(container.hsm_public_key(), Some(hsm.public_key()));
        assert_eq!(container.hsm_public_key(), Some(hsm.public_key()));
        assert_eq!(container.user_public_key("hsm"), Some(hsm.public_key()));
        assert!(container.user_public_key("nobody").is_none());
    }

    #[test]
    fn test_ambiguous_hsm_key_rejected() {
        let container = RulesContainer {
            users: vec![
                user("h1", vec![UserRole::HsmSlot], Some(P256KeyPair::generate().public_key())),
                user("h2", vec![UserRole::HsmSlot], Some(P256KeyPair::generate().public_key())),
            ],
            ..Default::default()
        };
        assert!(container.hsm_public_key().is_none());
        assert!(RulesContainer::default().hsm_public_key().is_none());
    }
}
