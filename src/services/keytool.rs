use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::models::keystore::{
    render_peer_list, FullnodeKeys, Keystore, Peer, ValidatorKeys,
};
use crate::services::process::{CommandRunner, CommandSpec};
use crate::utils::error::{ChainopsError, Result};
use crate::utils::fs_utils;

pub const DEFAULT_TOOLS_IMAGE: &str = "iota-tools";
pub const DEFAULT_TOOLS_BINARY: &str = "/usr/local/bin/iota";

/// Name of the fullnode that also carries the faucet account.
pub const FAUCET_NODE: &str = "fullnode-0";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateOutput {
    #[serde(default)]
    peer_id: Option<String>,
    iota_address: String,
    public_base64_key: String,
    #[serde(default)]
    mnemonic: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConvertOutput {
    base64_with_flag: String,
}

/// Key tool running inside the tools container.
pub struct Keytool<'r> {
    runner: &'r dyn CommandRunner,
    image: String,
    binary: String,
}

impl<'r> Keytool<'r> {
    pub fn new(runner: &'r dyn CommandRunner, image: impl Into<String>, binary: impl Into<String>) -> Self {
        Self {
            runner,
            image: image.into(),
            binary: binary.into(),
        }
    }

    fn run_in_container(&self, script: &str) -> Result<String> {
        let spec = CommandSpec::new("docker")
            .args(["run", "--rm", self.image.as_str(), "/bin/sh", "-c", script])
            .captured();
        Ok(self.runner.run(&spec)?.stdout.trim().to_string())
    }

    /// Split `generate` output: a JSON document followed by the key file
    /// contents on the last line.
    fn split_generate_output(output: &str, scheme: &str) -> Result<(GenerateOutput, String)> {
        let lines: Vec<&str> = output.lines().collect();
        let Some((last, json_lines)) = lines.split_last() else {
            return Err(ChainopsError::Validation(format!(
                "keytool returned no output for {scheme}"
            )));
        };
        let parsed: GenerateOutput = serde_json::from_str(&json_lines.join("\n"))?;
        Ok((parsed, last.trim().to_string()))
    }

    pub fn generate_ed25519(&self) -> Result<(String, Keystore)> {
        let output = self.run_in_container(&format!(
            "{} keytool generate ed25519 --json && cat *.key",
            self.binary
        ))?;
        let (parsed, private_bech32) = Self::split_generate_output(&output, "ed25519")?;
        let private_base64 = self.convert_to_base64(&private_bech32)?;

        let keystore = Keystore {
            iota_address: parsed.iota_address,
            public_base64_key: parsed.public_base64_key,
            mnemonic: parsed.mnemonic,
            private_bech32_key: Some(private_bech32),
            private_base64_key: private_base64,
        };
        keystore.validate()?;

        Ok((parsed.peer_id.unwrap_or_default(), keystore))
    }

    pub fn generate_bls12381(&self) -> Result<Keystore> {
        let output = self.run_in_container(&format!(
            "{} keytool generate bls12381 --json && cat *.key",
            self.binary
        ))?;
        let (parsed, private_key) = Self::split_generate_output(&output, "bls12381")?;

        let keystore = Keystore {
            iota_address: parsed.iota_address,
            public_base64_key: parsed.public_base64_key,
            mnemonic: None,
            private_bech32_key: None,
            private_base64_key: private_key,
        };
        keystore.validate()?;
        Ok(keystore)
    }

    /// Convert a bech32 private key to its flagged base64 form.
    pub fn convert_to_base64(&self, private_bech32: &str) -> Result<String> {
        let quoted = shlex::try_quote(private_bech32)
            .map_err(|e| ChainopsError::Validation(format!("unquotable key: {e}")))?;
        let output = self.run_in_container(&format!(
            "{} keytool convert {quoted} --json",
            self.binary
        ))?;
        if output.is_empty() {
            return Err(ChainopsError::Validation("keytool convert returned no output".into()));
        }
        let parsed: ConvertOutput = serde_json::from_str(&output)?;
        Ok(parsed.base64_with_flag)
    }
}

/// Keys for every node of the private network.
#[derive(Debug, Clone, Default)]
pub struct NetworkKeys {
    pub validators: Vec<(String, ValidatorKeys)>,
    pub fullnodes: Vec<(String, FullnodeKeys)>,
}

impl NetworkKeys {
    /// Seed peers: validators first, then fullnodes.
    pub fn peers(&self) -> Vec<Peer> {
        self.validators
            .iter()
            .map(|(_, v)| Peer::new(&v.p2p_address, &v.peer_id))
            .chain(
                self.fullnodes
                    .iter()
                    .map(|(_, f)| Peer::new(&f.p2p_address, &f.peer_id)),
            )
            .collect()
    }

    /// Write `<name>.json` per node and `peer_list.yaml`.
    pub fn store(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs_utils::ensure_directory_exists(dir)?;
        let mut written = Vec::new();

        for (name, keys) in &self.validators {
            let path = dir.join(format!("{name}.json"));
            fs_utils::write_string(&path, &serde_json::to_string_pretty(keys)?)?;
            written.push(path);
        }
        for (name, keys) in &self.fullnodes {
            let path = dir.join(format!("{name}.json"));
            fs_utils::write_string(&path, &serde_json::to_string_pretty(keys)?)?;
            written.push(path);
        }

        let peer_list = dir.join("peer_list.yaml");
        fs_utils::write_string(&peer_list, &render_peer_list(&self.peers()))?;
        written.push(peer_list);

        Ok(written)
    }
}

pub struct KeystoreGenerator<'k, 'r> {
    keytool: &'k Keytool<'r>,
}

impl<'k, 'r> KeystoreGenerator<'k, 'r> {
    pub const fn new(keytool: &'k Keytool<'r>) -> Self {
        Self { keytool }
    }

    pub fn validator(&self, name: &str) -> Result<ValidatorKeys> {
        tracing::info!(validator = name, "generating validator keys");

        let protocol = self.keytool.generate_bls12381()?;
        let (_, worker) = self.keytool.generate_ed25519()?;
        let (_, account) = self.keytool.generate_ed25519()?;
        let (peer_id, network) = self.keytool.generate_ed25519()?;
        let [network_address, p2p_address, primary, worker_address] = ValidatorKeys::addresses_for(name);

        Ok(ValidatorKeys {
            peer_id,
            protocol_keystore: Some(protocol),
            worker_keystore: Some(worker),
            account_keystore: Some(account),
            network_keystore: Some(network),
            network_address,
            p2p_address,
            narwhal_primary_address: primary,
            narwhal_worker_address: worker_address,
        })
    }

    pub fn fullnode(&self, name: &str) -> Result<FullnodeKeys> {
        tracing::info!(fullnode = name, "generating fullnode keys");

        let (peer_id, network) = self.keytool.generate_ed25519()?;
        let faucet_keystore = if name == FAUCET_NODE {
            Some(self.keytool.generate_ed25519()?.1)
        } else {
            None
        };

        Ok(FullnodeKeys {
            peer_id,
            network_keystore: Some(network),
            p2p_address: FullnodeKeys::p2p_address_for(name),
            faucet_keystore,
        })
    }

    pub fn network(&self, validators: usize, fullnodes: usize) -> Result<NetworkKeys> {
        let validators = (0..validators)
            .map(|i| {
                let name = format!("validator-{i}");
                self.validator(&name).map(|keys| (name, keys))
            })
            .collect::<Result<Vec<_>>>()?;
        let fullnodes = (0..fullnodes)
            .map(|i| {
                let name = format!("fullnode-{i}");
                self.fullnode(&name).map(|keys| (name, keys))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(NetworkKeys { validators, fullnodes })
    }
}
