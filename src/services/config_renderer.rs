// Node configuration rendering from generated keystores

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::models::keystore::{parse_peer_list, FullnodeKeys, Keystore, Peer, ValidatorKeys};
use crate::services::keytool::FAUCET_NODE;
use crate::utils::error::{ChainopsError, Result};
use crate::utils::fs_utils;

const VALIDATOR_TEMPLATE: &str = include_str!("../templates/validator.yaml");
const FULLNODE_TEMPLATE: &str = include_str!("../templates/fullnode.yaml");
const FAUCET_CLIENT_TEMPLATE: &str = include_str!("../templates/faucet_client.yaml");

/// Substitute `{key}` placeholders. Unknown placeholders are left alone.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), value)
    })
}

/// Peers as the indented `seed-peers` block of a node config.
pub fn render_seed_peers(peers: &[Peer]) -> String {
    peers
        .iter()
        .map(|p| format!("    - address: {}\n      peer-id: {}", p.address, p.peer_id))
        .collect::<Vec<_>>()
        .join("\n")
}

fn private_key(keystore: Option<&Keystore>) -> &str {
    keystore.map_or("", |k| k.private_base64_key.as_str())
}

pub fn render_validator(keys: &ValidatorKeys, peers: &[Peer]) -> String {
    let seed_peers = render_seed_peers(peers);
    fill(
        VALIDATOR_TEMPLATE,
        &[
            ("protocol_key", private_key(keys.protocol())),
            ("worker_key", private_key(keys.worker())),
            ("account_key", private_key(keys.account())),
            ("network_key", private_key(keys.network())),
            ("p2p_address", &keys.p2p_address),
            ("seed_peers", &seed_peers),
        ],
    )
}

pub fn render_fullnode(name: &str, keys: &FullnodeKeys, peers: &[Peer]) -> Result<String> {
    let network = keys.network_keystore.as_ref().ok_or_else(|| {
        ChainopsError::Validation(format!("{name}: missing network_keystore"))
    })?;
    let seed_peers = render_seed_peers(peers);
    Ok(fill(
        FULLNODE_TEMPLATE,
        &[
            ("network_key", &network.private_base64_key),
            ("p2p_address", &keys.p2p_address),
            ("seed_peers", &seed_peers),
        ],
    ))
}

fn faucet(keys: &FullnodeKeys) -> Result<&Keystore> {
    keys.faucet_keystore
        .as_ref()
        .ok_or_else(|| ChainopsError::Validation(format!("{FAUCET_NODE}: missing faucet_keystore")))
}

pub fn render_faucet_client(keys: &FullnodeKeys) -> Result<String> {
    let faucet = faucet(keys)?;
    Ok(fill(FAUCET_CLIENT_TEMPLATE, &[("iotaAddress", &faucet.iota_address)]))
}

/// The faucet client keystore: a JSON array holding the bech32 key.
pub fn render_faucet_keystore(keys: &FullnodeKeys) -> Result<String> {
    let faucet = faucet(keys)?;
    let mut out = serde_json::to_string_pretty(&[faucet.bech32()])?;
    out.push('\n');
    Ok(out)
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs_utils::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        ChainopsError::Config(format!("{}: {e}", path.display()))
    })
}

/// Writes validator, fullnode and faucet configs under a configs folder
/// laid out as `keystores/`, `validators/`, `fullnodes/`, `faucet/`.
pub struct ConfigRenderer {
    configs_dir: PathBuf,
}

impl ConfigRenderer {
    pub fn new(configs_dir: impl Into<PathBuf>) -> Self {
        Self {
            configs_dir: configs_dir.into(),
        }
    }

    pub fn keystores_dir(&self) -> PathBuf {
        self.configs_dir.join("keystores")
    }

    pub fn load_peers(&self) -> Result<Vec<Peer>> {
        let path = self.keystores_dir().join("peer_list.yaml");
        parse_peer_list(&fs_utils::read_to_string(&path)?)
    }

    fn write(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs_utils::ensure_directory_exists(parent)?;
        }
        fs_utils::write_string(path, content)?;
        tracing::info!(path = %path.display(), "wrote config");
        Ok(())
    }

    /// Render every config and return the written paths.
    pub fn render_all(&self) -> Result<Vec<PathBuf>> {
        let peers = self.load_peers()?;
        let mut written = Vec::new();

        for path in fs_utils::glob_sorted(&self.keystores_dir(), "*.json")? {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            if stem.starts_with("validator") {
                let keys: ValidatorKeys = load_json(&path)?;
                let out = self.configs_dir.join("validators").join(format!("{stem}.yaml"));
                self.write(&out, &render_validator(&keys, &peers))?;
                written.push(out);
            }

            if stem.starts_with("fullnode") {
                let keys: FullnodeKeys = load_json(&path)?;
                let out = self.configs_dir.join("fullnodes").join(format!("{stem}.yaml"));
                self.write(&out, &render_fullnode(stem, &keys, &peers)?)?;
                written.push(out);

                if stem == FAUCET_NODE {
                    let faucet_dir = self.configs_dir.join("faucet");
                    let client = faucet_dir.join("client.yaml");
                    self.write(&client, &render_faucet_client(&keys)?)?;
                    let keystore = faucet_dir.join("iota.keystore");
                    self.write(&keystore, &render_faucet_keystore(&keys)?)?;
                    written.extend([client, keystore]);
                }
            }
        }

        Ok(written)
    }
}
