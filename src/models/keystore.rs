use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::utils::error::{ChainopsError, Result};

/// A generated keypair with its derived address.
///
/// Ed25519 keystores carry the mnemonic and the bech32 private key; BLS
/// keystores only carry the base64 private key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keystore {
    #[serde(default)]
    pub iota_address: String,
    #[serde(default)]
    pub public_base64_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_bech32_key: Option<String>,
    #[serde(default)]
    pub private_base64_key: String,
}

impl Keystore {
    /// Check that the base64 fields decode.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("publicBase64Key", &self.public_base64_key),
            ("privateBase64Key", &self.private_base64_key),
        ] {
            if value.is_empty() {
                return Err(ChainopsError::Validation(format!("keystore field {field} is empty")));
            }
            STANDARD.decode(value).map_err(|e| {
                ChainopsError::Validation(format!("keystore field {field} is not valid base64: {e}"))
            })?;
        }
        Ok(())
    }

    pub fn bech32(&self) -> &str {
        self.private_bech32_key.as_deref().unwrap_or_default()
    }
}

/// Key material of one validator, stored as `<name>.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorKeys {
    #[serde(rename = "peerId", default)]
    pub peer_id: String,
    #[serde(default)]
    pub protocol_keystore: Option<Keystore>,
    #[serde(default)]
    pub worker_keystore: Option<Keystore>,
    #[serde(default)]
    pub account_keystore: Option<Keystore>,
    #[serde(default)]
    pub network_keystore: Option<Keystore>,
    #[serde(default)]
    pub network_address: String,
    #[serde(default)]
    pub p2p_address: String,
    #[serde(default)]
    pub narwhal_primary_address: String,
    #[serde(default)]
    pub narwhal_worker_address: String,
}

impl ValidatorKeys {
    /// Multiaddresses a validator named `name` listens on inside the
    /// private network.
    pub fn addresses_for(name: &str) -> [String; 4] {
        [
            format!("/dns/{name}/tcp/8080/http"),
            format!("/dns/{name}/udp/8084"),
            format!("/dns/{name}/udp/8081"),
            format!("/dns/{name}/udp/8082"),
        ]
    }

    pub fn protocol(&self) -> Option<&Keystore> {
        self.protocol_keystore.as_ref()
    }

    pub fn worker(&self) -> Option<&Keystore> {
        self.worker_keystore.as_ref()
    }

    pub fn account(&self) -> Option<&Keystore> {
        self.account_keystore.as_ref()
    }

    pub fn network(&self) -> Option<&Keystore> {
        self.network_keystore.as_ref()
    }
}

/// Key material of one fullnode, stored as `<name>.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullnodeKeys {
    #[serde(rename = "peerId", default)]
    pub peer_id: String,
    pub network_keystore: Option<Keystore>,
    #[serde(default)]
    pub p2p_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faucet_keystore: Option<Keystore>,
}

impl FullnodeKeys {
    pub fn p2p_address_for(name: &str) -> String {
        format!("/dns/{name}/udp/8084")
    }
}

/// Entry of `peer_list.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    #[serde(default)]
    pub address: String,
    #[serde(rename = "peer-id", default)]
    pub peer_id: String,
}

impl Peer {
    pub fn new(address: impl Into<String>, peer_id: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            peer_id: peer_id.into(),
        }
    }
}

/// Render peers in the layout node configs embed as `seed-peers`.
pub fn render_peer_list(peers: &[Peer]) -> String {
    peers
        .iter()
        .map(|p| format!("- address: {}\n  peer-id: {}", p.address, p.peer_id))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn parse_peer_list(content: &str) -> Result<Vec<Peer>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_yaml::from_str(content)?)
}
