// Genesis ceremony orchestration through the tools container

use std::path::{Path, PathBuf};

use crate::models::keystore::{FullnodeKeys, Keystore, ValidatorKeys};
use crate::services::keytool::FAUCET_NODE;
use crate::services::process::{CommandRunner, CommandSpec};
use crate::utils::error::{ChainopsError, Result};
use crate::utils::fs_utils;

pub const DEFAULT_TOKEN_ALLOCATION_NANOS: &str = "750000000000000000";
pub const DEFAULT_MIGRATION_SNAPSHOT: &str =
    "https://stardust-objects.s3.eu-central-1.amazonaws.com/iota/alphanet/test/stardust_object_snapshot.bin.gz";

const CONTAINER_GENESIS_DIR: &str = "/iota/genesis";

#[derive(Debug, Clone)]
pub struct GenesisOptions {
    pub configs_dir: PathBuf,
    pub image: String,
    pub binary: String,
    pub token_allocation_nanos: String,
    pub migration_snapshot: String,
}

/// Inputs loaded from the keystores folder.
#[derive(Debug, Clone)]
pub struct CeremonyInputs {
    pub validators: Vec<(String, ValidatorKeys)>,
    pub faucet_address: String,
}

impl CeremonyInputs {
    pub fn load(keystores_dir: &Path) -> Result<Self> {
        let mut validators = Vec::new();
        let mut faucet_address = None;

        for path in fs_utils::glob_sorted(keystores_dir, "*.json")? {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem.starts_with("validator") {
                let keys: ValidatorKeys = serde_json::from_str(&fs_utils::read_to_string(&path)?)?;
                validators.push((stem.to_string(), keys));
            }
            if stem == FAUCET_NODE {
                let keys: FullnodeKeys = serde_json::from_str(&fs_utils::read_to_string(&path)?)?;
                faucet_address = keys.faucet_keystore.map(|k| k.iota_address);
            }
        }

        let faucet_address = faucet_address.ok_or_else(|| {
            ChainopsError::Validation(format!(
                "no faucet keystore found in {}/{FAUCET_NODE}.json",
                keystores_dir.display()
            ))
        })?;

        Ok(Self {
            validators,
            faucet_address,
        })
    }
}

fn quote(value: &str) -> Result<String> {
    shlex::try_quote(value)
        .map(|q| q.into_owned())
        .map_err(|e| ChainopsError::Validation(format!("cannot quote '{value}': {e}")))
}

fn key_value<'a>(keys: Option<&'a Keystore>, validator: &str, role: &str, bech32: bool) -> Result<&'a str> {
    let keystore = keys.ok_or_else(|| {
        ChainopsError::Validation(format!("{validator}: missing {role}_keystore"))
    })?;
    Ok(if bech32 {
        keystore.bech32()
    } else {
        keystore.private_base64_key.as_str()
    })
}

pub struct GenesisCeremony<'r> {
    runner: &'r dyn CommandRunner,
    options: GenesisOptions,
}

impl<'r> GenesisCeremony<'r> {
    pub fn new(runner: &'r dyn CommandRunner, options: GenesisOptions) -> Self {
        Self { runner, options }
    }

    pub fn genesis_dir(&self) -> PathBuf {
        self.options.configs_dir.join("temp-genesis")
    }

    fn docker(&self, mount: &Path, args: &[String]) -> Result<CommandSpec> {
        let mut script = vec![self.options.binary.clone(), "genesis-ceremony".to_string()];
        script.extend(args.iter().map(|a| quote(a)).collect::<Result<Vec<_>>>()?);

        Ok(CommandSpec::new("docker").args([
            "run".to_string(),
            "--rm".to_string(),
            "-v".to_string(),
            format!("{}:{CONTAINER_GENESIS_DIR}:rw", mount.display()),
            "-w".to_string(),
            CONTAINER_GENESIS_DIR.to_string(),
            self.options.image.clone(),
            "/bin/sh".to_string(),
            "-c".to_string(),
            script.join(" "),
        ]))
    }

    /// Every container invocation of the ceremony, in order.
    pub fn plan(&self, inputs: &CeremonyInputs, mount: &Path) -> Result<Vec<CommandSpec>> {
        let owned = |items: &[&str]| items.iter().map(ToString::to_string).collect::<Vec<_>>();
        let key_file = |name: &str, role: &str| format!("{CONTAINER_GENESIS_DIR}/keys/{name}/{role}.key");

        let mut steps = vec![self.docker(mount, &owned(&["init"]))?];

        for (name, keys) in &inputs.validators {
            let args = vec![
                "add-validator".to_string(),
                "--name".to_string(),
                name.clone(),
                "--validator-key-file".to_string(),
                key_file(name, "protocol"),
                "--worker-key-file".to_string(),
                key_file(name, "worker"),
                "--account-key-file".to_string(),
                key_file(name, "account"),
                "--network-key-file".to_string(),
                key_file(name, "network"),
                "--network-address".to_string(),
                keys.network_address.clone(),
                "--p2p-address".to_string(),
                keys.p2p_address.clone(),
                "--narwhal-primary-address".to_string(),
                keys.narwhal_primary_address.clone(),
                "--narwhal-worker-address".to_string(),
                keys.narwhal_worker_address.clone(),
                "--description".to_string(),
                name.clone(),
                "--image-url".to_string(),
                String::new(),
                "--project-url".to_string(),
                String::new(),
            ];
            steps.push(self.docker(mount, &args)?);
        }

        steps.push(self.docker(
            mount,
            &owned(&[
                "add-token-allocation",
                "--recipient-address",
                &inputs.faucet_address,
                "--amount-nanos",
                &self.options.token_allocation_nanos,
            ]),
        )?);
        steps.push(self.docker(
            mount,
            &owned(&[
                "build-unsigned-checkpoint",
                "--remote-migration-snapshots",
                &self.options.migration_snapshot,
            ]),
        )?);
        for (name, _) in &inputs.validators {
            steps.push(self.docker(
                mount,
                &["verify-and-sign".to_string(), "--key-file".to_string(), key_file(name, "protocol")],
            )?);
        }
        steps.push(self.docker(mount, &owned(&["finalize"]))?);

        Ok(steps)
    }

    /// Write `keys/<validator>/*.key` into the genesis folder.
    pub fn write_key_files(&self, inputs: &CeremonyInputs) -> Result<()> {
        let keys_dir = self.genesis_dir().join("keys");
        for (name, keys) in &inputs.validators {
            let dir = keys_dir.join(name);
            fs_utils::ensure_directory_exists(&dir)?;
            for (role, keystore, bech32) in [
                ("protocol", keys.protocol(), false),
                ("worker", keys.worker(), true),
                ("account", keys.account(), true),
                ("network", keys.network(), true),
            ] {
                let value = key_value(keystore, name, role, bech32)?;
                fs_utils::write_string(&dir.join(format!("{role}.key")), value)?;
            }
        }
        Ok(())
    }

    /// Run the ceremony. With `dry_run` the planned commands are returned
    /// without touching the filesystem or starting containers.
    pub fn run(&self, dry_run: bool) -> Result<Vec<CommandSpec>> {
        let inputs = CeremonyInputs::load(&self.options.configs_dir.join("keystores"))?;
        let genesis_dir = self.genesis_dir();

        if dry_run {
            return self.plan(&inputs, &fs_utils::absolute(&genesis_dir)?);
        }

        fs_utils::ensure_directory_exists(&genesis_dir)?;
        let mount = fs_utils::absolute(&genesis_dir)?;
        self.write_key_files(&inputs)?;

        let steps = self.plan(&inputs, &mount)?;
        for step in &steps {
            tracing::info!(command = %step, "genesis step");
            self.runner.run(step)?;
        }
        Ok(steps)
    }
}
