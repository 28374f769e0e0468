//! Shared fixtures: a simulated platform that signs governance rules and
//! whitelist records the way the real one does.

#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use governance_integrity::domain::codec::{
    GroupMessage, GroupThresholdMessage, UserMessage, WhitelistingRuleMessage,
};
use governance_integrity::{
    compute_hash, serialize_hash_array, ApprovalSubmitter, FetchContext, GovernanceRulesSource,
    IntegrityConfig, RulesContainerMessage,
};
use parking_lot::Mutex;
use shared_crypto::{sha256, P256KeyPair};
use shared_types::{
    ApproveRequestsDto, Envelope, GovernanceRulesDto, RuleSignatureDto, SignatureDto,
    SignedAddressDto, TransportError, WhitelistSignatureDto, WhitelistedAddressDto,
    WhitelistedAssetDto,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

pub const APPROVERS: [&str; 3] = ["alice", "bob", "carol"];

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Keys and rules of a simulated custody platform.
pub struct Platform {
    pub governance: Vec<P256KeyPair>,
    pub approvers: Vec<P256KeyPair>,
    pub hsm: P256KeyPair,
    pub container: RulesContainerMessage,
}

fn encode_key(key: &P256KeyPair) -> String {
    STANDARD.encode(key.public_key().to_sec1_bytes())
}

impl Platform {
    /// Three governance keys; ETH addresses need 2 of 3 approvers, assets 1.
    pub fn new() -> Self {
        let governance: Vec<_> = (0..3).map(|_| P256KeyPair::generate()).collect();
        let approvers: Vec<_> = APPROVERS.iter().map(|_| P256KeyPair::generate()).collect();
        let hsm = P256KeyPair::generate();

        let mut users: Vec<UserMessage> = APPROVERS
            .iter()
            .zip(&approvers)
            .map(|(id, key)| UserMessage {
                id: id.to_string(),
                public_key: encode_key(key),
                roles: vec!["APPROVER".into()],
            })
            .collect();
        users.push(UserMessage {
            id: "hsm".into(),
            public_key: encode_key(&hsm),
            roles: vec!["HSMSLOT".into()],
        });

        let threshold = |minimum_signatures| {
            vec![GroupThresholdMessage {
                group_id: "approvers".into(),
                minimum_signatures,
            }]
        };

        let container = RulesContainerMessage {
            users,
            groups: vec![GroupMessage {
                id: "approvers".into(),
                user_ids: APPROVERS.iter().map(|id| id.to_string()).collect(),
            }],
            minimum_distinct_user_signatures: 2,
            minimum_distinct_group_signatures: 1,
            address_whitelisting_rules: vec![WhitelistingRuleMessage {
                blockchain: "ETH".into(),
                network: String::new(),
                parallel_thresholds: threshold(2),
            }],
            contract_address_whitelisting_rules: vec![WhitelistingRuleMessage {
                blockchain: String::new(),
                network: String::new(),
                parallel_thresholds: threshold(1),
            }],
            timestamp: 1_700_000_000,
        };

        Self {
            governance,
            approvers,
            hsm,
            container,
        }
    }

    pub fn config(&self, min_valid_signatures: usize) -> IntegrityConfig {
        IntegrityConfig::for_testing(self.governance.iter().map(P256KeyPair::public_key).collect())
            .with_min_valid_signatures(min_valid_signatures)
            .with_rules_cache_ttl(Duration::from_secs(60))
    }

    /// Rules signed by the first `signers` governance keys.
    pub fn rules_dto(&self, signers: usize) -> GovernanceRulesDto {
        sign_container(&self.container.encode_binary(), &self.governance[..signers])
    }

    pub fn approver_signature(&self, index: usize, hashes: Vec<String>) -> WhitelistSignatureDto {
        sign_hashes(&self.approvers[index], APPROVERS[index], hashes)
    }

    /// Address record signed by the given approvers over its current hash.
    pub fn address_dto(&self, id: &str, payload: &str, signers: &[usize]) -> WhitelistedAddressDto {
        let hash = compute_hash(payload.as_bytes());
        WhitelistedAddressDto {
            id: id.into(),
            status: Some("APPROVED".into()),
            created_at: Some("2024-01-01T00:00:00Z".into()),
            metadata: Some(Envelope::signed(hash.clone(), payload)),
            signatures: signers
                .iter()
                .map(|&i| self.approver_signature(i, vec![hash.clone()]))
                .collect(),
            ..Default::default()
        }
    }

    pub fn asset_dto(&self, id: &str, payload: &str, signers: &[usize]) -> WhitelistedAssetDto {
        let hash = compute_hash(payload.as_bytes());
        WhitelistedAssetDto {
            id: id.into(),
            status: Some("APPROVED".into()),
            metadata: Some(Envelope::signed(hash.clone(), payload)),
            signatures: signers
                .iter()
                .map(|&i| self.approver_signature(i, vec![hash.clone()]))
                .collect(),
            ..Default::default()
        }
    }

    pub fn hsm_attestation(&self, payload: &str) -> SignedAddressDto {
        SignedAddressDto {
            signature: self
                .hsm
                .sign_prehash(&sha256(payload.as_bytes()))
                .unwrap()
                .to_base64(),
        }
    }
}

pub fn sign_container(bytes: &[u8], keys: &[P256KeyPair]) -> GovernanceRulesDto {
    GovernanceRulesDto {
        rules_container: STANDARD.encode(bytes),
        rules_signatures: keys
            .iter()
            .enumerate()
            .map(|(i, key)| RuleSignatureDto {
                user_id: format!("governor-{i}"),
                signature: key.sign_prehash(&sha256(bytes)).unwrap().to_base64(),
            })
            .collect(),
        locked: true,
        creation_date: None,
    }
}

pub fn sign_hashes(key: &P256KeyPair, user_id: &str, hashes: Vec<String>) -> WhitelistSignatureDto {
    let message = serialize_hash_array(&hashes).unwrap();
    WhitelistSignatureDto {
        hashes,
        signature: SignatureDto {
            user_id: user_id.into(),
            signature: key.sign_prehash(&sha256(&message)).unwrap().to_base64(),
        },
    }
}

pub fn address_payload(address: &str) -> String {
    format!(
        r#"{{"blockchain":"ETH","network":"mainnet","address":"{address}","label":"Cold storage","currency":"ETH","memo":"","customerId":"c-1","contractType":"","linkedInternalAddresses":[{{"id":"3","address":"0x77","label":"ops"}}],"linkedWallets":[{{"id":"8","path":"m/44'/60'/0'","label":"main"}}]}}"#
    )
}

pub fn asset_payload(symbol: &str) -> String {
    format!(
        r#"{{"blockchain":"ETH","network":"mainnet","contractAddress":"0xa0b8","symbol":"{symbol}","name":"Token","decimals":18,"isNFT":false,"kindType":"erc20"}}"#
    )
}

/// Rules source that counts fetches and can be slowed down or broken.
pub struct CountingSource {
    pub rules: Mutex<GovernanceRulesDto>,
    pub calls: AtomicUsize,
    pub delay: Duration,
    pub failing: AtomicBool,
}

impl CountingSource {
    pub fn new(rules: GovernanceRulesDto) -> Self {
        Self {
            rules: Mutex::new(rules),
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            failing: AtomicBool::new(false),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GovernanceRulesSource for CountingSource {
    fn fetch_governance_rules(
        &self,
        _context: &FetchContext,
    ) -> Result<GovernanceRulesDto, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Status {
                code: 503,
                message: "unavailable".into(),
            });
        }
        Ok(self.rules.lock().clone())
    }
}

#[derive(Default)]
pub struct RecordingSubmitter {
    pub submitted: Mutex<Vec<ApproveRequestsDto>>,
}

impl ApprovalSubmitter for RecordingSubmitter {
    fn submit_approval(&self, approval: &ApproveRequestsDto) -> Result<(), TransportError> {
        self.submitted.lock().push(approval.clone());
        Ok(())
    }
}
