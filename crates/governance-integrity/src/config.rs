//! # Integrity Configuration
//!
//! Trust anchors and cache policy for one client configuration.
//!
//! # Example
//!
//! ```ignore
//! let config = IntegrityConfig::new(trusted_keys, 2, Duration::from_secs(300))?
//!     .with_rules_cache_ttl(Duration::from_secs(60));
//! ```

use serde::{Deserialize, Serialize};
use shared_crypto::P256PublicKey;
use std::time::Duration;
use thiserror::Error;

/// Default lifetime of a verified rules container.
pub const DEFAULT_RULES_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No trusted governance keys configured")]
    NoTrustedKeys,

    #[error("min_valid_signatures must be between 1 and {keys}, got {min}")]
    InvalidMinSignatures { min: usize, keys: usize },

    #[error("rules_cache_ttl must be positive")]
    ZeroTtl,

    #[error("Trusted key {index} could not be decoded: {reason}")]
    InvalidKey { index: usize, reason: String },

    #[error("Configuration parse error: {0}")]
    Parse(String),
}

/// Governance integrity configuration.
///
/// - `trusted_keys`: out-of-band keys allowed to sign the rules container
/// - `min_valid_signatures`: distinct signers required (at least 1)
/// - `rules_cache_ttl`: how long a verified container is reused
#[derive(Clone, Debug)]
pub struct IntegrityConfig {
    pub trusted_keys: Vec<P256PublicKey>,
    pub min_valid_signatures: usize,
    pub rules_cache_ttl: Duration,
}

impl Default for IntegrityConfig {
    /// No trusted keys: does not validate until keys are added.
    fn default() -> Self {
        Self {
            trusted_keys: Vec::new(),
            min_valid_signatures: 1,
            rules_cache_ttl: DEFAULT_RULES_CACHE_TTL,
        }
    }
}

impl IntegrityConfig {
    /// Create a new configuration with validation
    pub fn new(
        trusted_keys: Vec<P256PublicKey>,
        min_valid_signatures: usize,
        rules_cache_ttl: Duration,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            trusted_keys,
            min_valid_signatures,
            rules_cache_ttl,
        };
        config.validate()?;
        Ok(config)
    }

    /// Config for tests: every key trusted, one signature, short TTL.
    pub fn for_testing(trusted_keys: Vec<P256PublicKey>) -> Self {
        Self {
            trusted_keys,
            min_valid_signatures: 1,
            rules_cache_ttl: Duration::from_secs(1),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trusted_keys.is_empty() {
            return Err(ConfigError::NoTrustedKeys);
        }

        // A threshold above the key count can never be met.
        if self.min_valid_signatures == 0 || self.min_valid_signatures > self.trusted_keys.len() {
            return Err(ConfigError::InvalidMinSignatures {
                min: self.min_valid_signatures,
                keys: self.trusted_keys.len(),
            });
        }

        if self.rules_cache_ttl.is_zero() {
            return Err(ConfigError::ZeroTtl);
        }

        Ok(())
    }

    /// Builder-style method to set the trusted keys
    pub fn with_trusted_keys(mut self, keys: Vec<P256PublicKey>) -> Self {
        self.trusted_keys = keys;
        self
    }

    /// Builder-style method to set the signature threshold
    pub fn with_min_valid_signatures(mut self, min: usize) -> Self {
        self.min_valid_signatures = min;
        self
    }

    /// Builder-style method to set the cache TTL
    pub fn with_rules_cache_ttl(mut self, ttl: Duration) -> Self {
        self.rules_cache_ttl = ttl;
        self
    }
}

/// On-disk form of [`IntegrityConfig`] (JSON, camelCase).
///
/// Keys are PEM, base64 SPKI DER or base64 SEC1 strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityConfigFile {
    pub trusted_keys: Vec<String>,
    #[serde(default = "default_min_valid_signatures")]
    pub min_valid_signatures: usize,
    #[serde(default = "default_rules_cache_ttl_secs")]
    pub rules_cache_ttl_secs: u64,
}

fn default_min_valid_signatures() -> usize {
    1
}

fn default_rules_cache_ttl_secs() -> u64 {
    DEFAULT_RULES_CACHE_TTL.as_secs()
}

impl IntegrityConfigFile {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Decode every key and validate the result.
    pub fn into_config(self) -> Result<IntegrityConfig, ConfigError> {
        let trusted_keys = self
            .trusted_keys
            .iter()
            .enumerate()
            .map(|(index, encoded)| {
                P256PublicKey::from_encoded(encoded).map_err(|e| ConfigError::InvalidKey {
                    index,
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        IntegrityConfig::new(
            trusted_keys,
            self.min_valid_signatures,
            Duration::from_secs(self.rules_cache_ttl_secs),
        )
    }
}

impl TryFrom<IntegrityConfigFile> for IntegrityConfig {
    type Error = ConfigError;

    fn try_from(file: IntegrityConfigFile) -> Result<Self, Self::Error> {
        file.into_config()
    }
}
