//! # Rules Container Codec
//!
//! The rules container travels as base64 of a protobuf message. Older
//! deployments emitted the same structure as JSON text, so decoding prefers
//! the binary form and falls back to text.
//!
//! One set of message types serves both encodings: `prost` tags for the
//! binary form, camelCase `serde` names for the text form.
//!
//! Decoding happens only after the container bytes have been authenticated.

use super::entities::{Group, RulesContainer, ThresholdGroup, User, UserRole, WhitelistingRule};
use super::errors::IntegrityError;
use prost::Message;
use serde::{Deserialize, Serialize};
use shared_crypto::P256PublicKey;
use tracing::{debug, warn};

#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserMessage {
    #[prost(string, tag = "1")]
    pub id: String,
    /// PEM, base64 SPKI DER or base64 SEC1.
    #[prost(string, tag = "2")]
    pub public_key: String,
    #[prost(string, repeated, tag = "3")]
    pub roles: Vec<String>,
}

#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupMessage {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, repeated, tag = "2")]
    pub user_ids: Vec<String>,
}

#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupThresholdMessage {
    #[prost(string, tag = "1")]
    pub group_id: String,
    #[prost(uint32, tag = "2")]
    pub minimum_signatures: u32,
}

#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WhitelistingRuleMessage {
    /// Empty means "any blockchain".
    #[prost(string, tag = "1")]
    pub blockchain: String,
    /// Empty means "any network".
    #[prost(string, tag = "2")]
    pub network: String,
    #[prost(message, repeated, tag = "3")]
    pub parallel_thresholds: Vec<GroupThresholdMessage>,
}

#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RulesContainerMessage {
    #[prost(message, repeated, tag = "1")]
    pub users: Vec<UserMessage>,
    #[prost(message, repeated, tag = "2")]
    pub groups: Vec<GroupMessage>,
    #[prost(uint32, tag = "3")]
    pub minimum_distinct_user_signatures: u32,
    #[prost(uint32, tag = "4")]
    pub minimum_distinct_group_signatures: u32,
    #[prost(message, repeated, tag = "5")]
    pub address_whitelisting_rules: Vec<WhitelistingRuleMessage>,
    #[prost(message, repeated, tag = "6")]
    pub contract_address_whitelisting_rules: Vec<WhitelistingRuleMessage>,
    #[prost(int64, tag = "7")]
    pub timestamp: i64,
}

impl RulesContainerMessage {
    /// Binary (protobuf) encoding.
    pub fn encode_binary(&self) -> Vec<u8> {
        self.encode_to_vec()
    }
}

/// Decode authenticated container bytes.
///
/// Binary is preferred. The text form is tried when binary decoding fails or
/// yields a container with no users.
pub fn decode_rules_container(bytes: &[u8]) -> Result<RulesContainer, IntegrityError> {
    let message = match RulesContainerMessage::decode(bytes) {
        Ok(message) if !message.users.is_empty() => message,
        binary => match serde_json::from_slice::<RulesContainerMessage>(bytes) {
            Ok(message) => {
                debug!("Rules container decoded from text form");
                message
            }
            Err(text_err) => match binary {
                Ok(message) => message,
                Err(binary_err) => {
                    return Err(IntegrityError::RulesContainerDecode(format!(
                        "binary: {binary_err}; text: {text_err}"
                    )))
                }
            },
        },
    };

    Ok(message.into())
}

impl From<RulesContainerMessage> for RulesContainer {
    fn from(message: RulesContainerMessage) -> Self {
        RulesContainer {
            users: message.users.into_iter().map(User::from).collect(),
            groups: message
                .groups
                .into_iter()
                .map(|g| Group {
                    id: g.id,
                    user_ids: g.user_ids,
                })
                .collect(),
            minimum_distinct_user_signatures: message.minimum_distinct_user_signatures,
            minimum_distinct_group_signatures: message.minimum_distinct_group_signatures,
            address_whitelisting_rules: message
                .address_whitelisting_rules
                .into_iter()
                .map(WhitelistingRule::from)
                .collect(),
            contract_address_whitelisting_rules: message
                .contract_address_whitelisting_rules
                .into_iter()
                .map(WhitelistingRule::from)
                .collect(),
            timestamp: message.timestamp,
            hsm_key: Default::default(),
        }
    }
}

impl From<UserMessage> for User {
    fn from(message: UserMessage) -> Self {
        let public_key = if message.public_key.is_empty() {
            None
        } else {
            match P256PublicKey::from_encoded(&message.public_key) {
                Ok(key) => Some(key),
                Err(e) => {
                    warn!(user_id = %message.id, error = %e, "Undecodable user public key");
                    None
                }
            }
        };

        User {
            roles: message.roles.iter().map(|r| UserRole::parse(r)).collect(),
            id: message.id,
            public_key,
        }
    }
}

impl From<WhitelistingRuleMessage> for WhitelistingRule {
    fn from(message: WhitelistingRuleMessage) -> Self {
        let non_empty = |s: String| if s.is_empty() { None } else { Some(s) };
        WhitelistingRule {
            blockchain: non_empty(message.blockchain),
            network: non_empty(message.network),
            threshold_groups: message
                .parallel_thresholds
                .into_iter()
                .map(|t| ThresholdGroup {
                    group_id: t.group_id,
                    minimum_signatures: t.minimum_signatures,
                })
                .collect(),
        }
    }
}
