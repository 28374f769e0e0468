//! # Inbound Ports (Driving Ports / API)
//!
//! The public API SDK layers call before trusting any whitelisting data.

use crate::domain::entities::{RulesContainer, WhitelistedAddress, WhitelistedAsset};
use crate::domain::errors::{ApprovalError, VerificationError};
use shared_crypto::P256KeyPair;
use shared_types::{RequestDto, WhitelistedAddressDto, WhitelistedAssetDto};
use std::sync::Arc;
use std::time::Duration;

/// Primary Governance Integrity API.
///
/// Implementations must be thread-safe (`Send + Sync`); every call may run
/// concurrently with any other.
pub trait IntegrityVerificationApi: Send + Sync {
    // =========================================================================
    // Governance Rules
    // =========================================================================

    /// Authenticated governance rules, from cache or a single shared fetch.
    fn governance_rules(&self) -> Result<Arc<RulesContainer>, VerificationError>;

    /// As [`governance_rules`](Self::governance_rules), giving up after
    /// `timeout` if another caller's fetch is still running.
    fn governance_rules_with_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Arc<RulesContainer>, VerificationError>;

    /// Drop the cached rules; the next call fetches again.
    fn invalidate_rules(&self);

    // =========================================================================
    // Whitelist Verification
    // =========================================================================

    fn verify_whitelisted_address(
        &self,
        dto: &WhitelistedAddressDto,
    ) -> Result<WhitelistedAddress, VerificationError>;

    /// All or nothing: the first failing entry fails the call.
    fn verify_whitelisted_addresses(
        &self,
        dtos: &[WhitelistedAddressDto],
    ) -> Result<Vec<WhitelistedAddress>, VerificationError>;

    fn verify_whitelisted_asset(
        &self,
        dto: &WhitelistedAssetDto,
    ) -> Result<WhitelistedAsset, VerificationError>;

    /// All or nothing: the first failing entry fails the call.
    fn verify_whitelisted_assets(
        &self,
        dtos: &[WhitelistedAssetDto],
    ) -> Result<Vec<WhitelistedAsset>, VerificationError>;

    // =========================================================================
    // Request Approval
    // =========================================================================

    /// Sign and submit one approval for all `requests`.
    ///
    /// Returns the number of requests covered by the signature.
    fn approve_requests(
        &self,
        requests: &[RequestDto],
        key: &P256KeyPair,
        comment: &str,
    ) -> Result<usize, ApprovalError>;
}
