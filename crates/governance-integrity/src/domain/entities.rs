//! # Domain Entities
//!
//! The decoded governance rules container and the verified whitelist
//! records built from it.

use shared_crypto::P256PublicKey;
use std::sync::OnceLock;

// =============================================================================
// Governance Rules Container
// =============================================================================

/// Role a user holds in the governance rules.
///
/// Exactly one role, `HsmSlot`, designates the hardware-signing key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum UserRole {
    /// Key held by the hardware security module.
    HsmSlot,
    SuperAdmin,
    Admin,
    Operator,
    Approver,
    /// Role names this client does not know about.
    Other(String),
}

impl UserRole {
    /// Parse a wire role name (case-insensitive).
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "HSMSLOT" => UserRole::HsmSlot,
            "SUPERADMIN" => UserRole::SuperAdmin,
            "ADMIN" => UserRole::Admin,
            "OPERATOR" => UserRole::Operator,
            "APPROVER" => UserRole::Approver,
            _ => UserRole::Other(name.to_string()),
        }
    }
}

/// A user known to the governance rules.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub roles: Vec<UserRole>,
    /// `None` when the container's key for this user could not be decoded.
    pub public_key: Option<P256PublicKey>,
}

impl User {
    pub fn has_role(&self, role: &UserRole) -> bool {
        self.roles.contains(role)
    }
}

/// A named set of users.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub id: String,
    pub user_ids: Vec<String>,
}

/// Requirement that `minimum_signatures` distinct members of a group sign.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThresholdGroup {
    pub group_id: String,
    pub minimum_signatures: u32,
}

/// Whitelisting authority for a (blockchain, network) scope.
///
/// Threshold groups are parallel: satisfying any one of them suffices.
/// `None` scope fields widen the rule (blockchain-only or global).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WhitelistingRule {
    pub blockchain: Option<String>,
    pub network: Option<String>,
    pub threshold_groups: Vec<ThresholdGroup>,
}

/// Governance rules container, decoded and authenticated.
///
/// Immutable once published, except for the memoized HSM key lookup.
#[derive(Clone, Debug, Default)]
pub struct RulesContainer {
    pub users: Vec<User>,
    pub groups: Vec<Group>,
    pub minimum_distinct_user_signatures: u32,
    pub minimum_distinct_group_signatures: u32,
    pub address_whitelisting_rules: Vec<WhitelistingRule>,
    pub contract_address_whitelisting_rules: Vec<WhitelistingRule>,
    pub timestamp: i64,
    pub(crate) hsm_key: OnceLock<Option<P256PublicKey>>,
}

// =============================================================================
// Verified Whitelist Records
// =============================================================================

/// Which hash variant authenticated a record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedHash {
    /// Lowercase hex SHA-256 present in the governance-signed hash set.
    pub hash: String,
    /// Name of the legacy transform that produced it (`current` when none).
    pub transform: &'static str,
}

/// Internal address linked to a whitelisted address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkedAddress {
    pub id: String,
    pub address: String,
    pub label: String,
}

/// Wallet linked to a whitelisted address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkedWallet {
    pub id: String,
    pub path: String,
    pub label: String,
}

/// A whitelisted address whose security fields all come from the verified
/// payload string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WhitelistedAddress {
    /// Internal numeric ID, from the DTO.
    pub id: String,
    /// From the DTO (not security relevant).
    pub status: Option<String>,
    /// From the DTO (not security relevant).
    pub created_at: Option<String>,
    pub blockchain: String,
    pub network: String,
    pub address: String,
    pub label: String,
    pub currency: String,
    pub memo: String,
    pub customer_id: String,
    pub contract_type: String,
    pub linked_internal_addresses: Vec<LinkedAddress>,
    pub linked_wallets: Vec<LinkedWallet>,
    pub verified_hash: VerifiedHash,
}

/// A whitelisted contract asset built from the verified payload string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WhitelistedAsset {
    pub id: String,
    pub status: Option<String>,
    pub created_at: Option<String>,
    pub blockchain: String,
    pub network: String,
    pub contract_address: String,
    pub symbol: String,
    pub name: String,
    /// `None` when the verified payload does not state decimals.
    pub decimals: Option<u32>,
    pub is_nft: Option<bool>,
    pub kind_type: String,
    pub token_id: String,
    pub verified_hash: VerifiedHash,
}
