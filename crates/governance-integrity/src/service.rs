//! # Governance Integrity Service
//!
//! Application service implementing `IntegrityVerificationApi`.
//!
//! ## Architecture
//!
//! This is the hexagonal "application service" that:
//! - Implements the inbound port (`IntegrityVerificationApi`)
//! - Fetches rules through `GovernanceRulesSource`, verifying them before
//!   they enter the cache
//! - Submits approvals through `ApprovalSubmitter`
//! - Delegates every trust decision to the domain layer
//!
//! Each service owns its own cache, so independently configured clients
//! never share governance state.

use crate::adapters::rules_cache::RulesContainerCache;
use crate::config::{ConfigError, IntegrityConfig};
use crate::domain::approval::sign_requests;
use crate::domain::entities::{RulesContainer, WhitelistedAddress, WhitelistedAsset};
use crate::domain::errors::{ApprovalError, VerificationError};
use crate::domain::rules::GovernanceRulesVerifier;
use crate::domain::whitelist::WhitelistOrchestrator;
use crate::ports::inbound::IntegrityVerificationApi;
use crate::ports::outbound::{ApprovalSubmitter, FetchContext, GovernanceRulesSource};
use shared_crypto::P256KeyPair;
use shared_types::{RequestDto, WhitelistedAddressDto, WhitelistedAssetDto};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Governance integrity service for one client configuration.
pub struct GovernanceIntegrityService<S: GovernanceRulesSource, A: ApprovalSubmitter> {
    config: IntegrityConfig,
    verifier: GovernanceRulesVerifier,
    rules_source: S,
    approvals: A,
    cache: RulesContainerCache,
}

impl<S: GovernanceRulesSource, A: ApprovalSubmitter> GovernanceIntegrityService<S, A> {
    /// Create a service.
    ///
    /// # Errors
    /// * `ConfigError` - the configuration does not validate
    pub fn new(config: IntegrityConfig, rules_source: S, approvals: A) -> Result<Self, ConfigError> {
        config.validate()?;
        let verifier =
            GovernanceRulesVerifier::new(config.trusted_keys.clone(), config.min_valid_signatures);
        let cache = RulesContainerCache::new(config.rules_cache_ttl);

        debug!(
            trusted_keys = config.trusted_keys.len(),
            min_valid_signatures = config.min_valid_signatures,
            ttl_secs = config.rules_cache_ttl.as_secs(),
            "Governance integrity service created"
        );

        Ok(Self {
            config,
            verifier,
            rules_source,
            approvals,
            cache,
        })
    }

    pub fn config(&self) -> &IntegrityConfig {
        &self.config
    }

    /// The rules cache, for diagnostics.
    pub fn rules_cache(&self) -> &RulesContainerCache {
        &self.cache
    }

    /// Fetch and authenticate; only verified containers reach the cache.
    fn load_rules(&self, context: &FetchContext) -> Result<RulesContainer, VerificationError> {
        let rules = self.rules_source.fetch_governance_rules(context)?;
        Ok(self.verifier.verify(&rules)?)
    }

    fn orchestrator(
        &self,
    ) -> WhitelistOrchestrator<impl Fn() -> Result<Arc<RulesContainer>, VerificationError> + '_>
    {
        WhitelistOrchestrator::new(move || self.governance_rules())
    }
}

impl<S: GovernanceRulesSource, A: ApprovalSubmitter> IntegrityVerificationApi
    for GovernanceIntegrityService<S, A>
{
    fn governance_rules(&self) -> Result<Arc<RulesContainer>, VerificationError> {
        self.cache.get(|context| self.load_rules(context))
    }

    fn governance_rules_with_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Arc<RulesContainer>, VerificationError> {
        self.cache
            .get_with_timeout(timeout, |context| self.load_rules(context))
    }

    fn invalidate_rules(&self) {
        self.cache.invalidate();
    }

    fn verify_whitelisted_address(
        &self,
        dto: &WhitelistedAddressDto,
    ) -> Result<WhitelistedAddress, VerificationError> {
        self.orchestrator().verify_address(dto)
    }

    fn verify_whitelisted_addresses(
        &self,
        dtos: &[WhitelistedAddressDto],
    ) -> Result<Vec<WhitelistedAddress>, VerificationError> {
        self.orchestrator().verify_addresses(dtos)
    }

    fn verify_whitelisted_asset(
        &self,
        dto: &WhitelistedAssetDto,
    ) -> Result<WhitelistedAsset, VerificationError> {
        self.orchestrator().verify_asset(dto)
    }

    fn verify_whitelisted_assets(
        &self,
        dtos: &[WhitelistedAssetDto],
    ) -> Result<Vec<WhitelistedAsset>, VerificationError> {
        self.orchestrator().verify_assets(dtos)
    }

    fn approve_requests(
        &self,
        requests: &[RequestDto],
        key: &P256KeyPair,
        comment: &str,
    ) -> Result<usize, ApprovalError> {
        let approval = sign_requests(requests, key)?;
        self.approvals.submit_approval(&approval.to_dto(comment))?;

        info!(count = approval.len(), "Request approval submitted");
        Ok(approval.len())
    }
}
