//! # Governance Integrity
//!
//! Client-side verification that governance rules and whitelisting records
//! issued by the custody platform are authentic and unmodified before they
//! authorize fund transfers.
//!
//! ## Architecture
//!
//! This crate follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): hashing, rules verification, whitelist
//!   checks and approval signing; pure, no I/O
//! - **Ports Layer** (`ports/`): inbound API and outbound transport traits
//! - **Adapters Layer** (`adapters/`): single-flight TTL rules cache
//! - **Service Layer** (`service.rs`): wires domain logic to ports
//!
//! ## Security Notes
//!
//! - **Signed bytes only**: every security-relevant output field comes from
//!   the hashed `payloadAsString`, never from a DTO convenience field
//! - **Fail closed**: verification steps run in order and the first failure
//!   ends the call; batches never return partial results
//! - **Threshold governance**: rules are trusted only when enough distinct
//!   trusted signers signed the exact container bytes

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::rules_cache::{CacheStatus, RulesContainerCache, SingleFlightCache};
pub use config::{ConfigError, IntegrityConfig, IntegrityConfigFile, DEFAULT_RULES_CACHE_TTL};
pub use domain::approval::{approval_message, serialize_hash_array, sign_requests, SignedApproval};
pub use domain::codec::{decode_rules_container, RulesContainerMessage};
pub use domain::entities::{
    Group, LinkedAddress, LinkedWallet, RulesContainer, ThresholdGroup, User, UserRole,
    VerifiedHash, WhitelistedAddress, WhitelistedAsset, WhitelistingRule,
};
pub use domain::errors::{ApprovalError, IntegrityError, VerificationError, WhitelistError};
pub use domain::hashing::{compute_hash, legacy_transforms, resolve_signed_hash, verify_hash, EntityKind};
pub use domain::rules::{verify_governance_rules, GovernanceRulesVerifier};
pub use domain::whitelist::{TrustedRules, VerifiedPayload, WhitelistOrchestrator};
pub use ports::inbound::IntegrityVerificationApi;
pub use ports::outbound::{ApprovalSubmitter, FetchContext, GovernanceRulesSource};
pub use service::GovernanceIntegrityService;
