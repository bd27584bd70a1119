use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

/// Contract tests for `chainops genesis`

fn keystore(tag: &str) -> serde_json::Value {
    json!({
        "iotaAddress": format!("0x{tag}"),
        "publicBase64Key": "AAAA",
        "privateBech32Key": format!("iotaprivkey1{tag}"),
        "privateBase64Key": format!("{tag}-base64"),
    })
}

#[test]
fn test_genesis_dry_run_prints_ceremony() {
    let temp_dir = TempDir::new().unwrap();
    let keystores = temp_dir.path().join("keystores");
    fs::create_dir_all(&keystores).unwrap();
    fs::write(
        keystores.join("validator-0.json"),
        json!({
            "peerId": "peer-v0",
            "protocol_keystore": keystore("protocol"),
            "worker_keystore": keystore("worker"),
            "account_keystore": keystore("account"),
            "network_keystore": keystore("network"),
            "network_address": "/dns/validator-0/tcp/8080/http",
            "p2p_address": "/dns/validator-0/udp/8084",
            "narwhal_primary_address": "/dns/validator-0/udp/8081",
            "narwhal_worker_address": "/dns/validator-0/udp/8082",
        })
        .to_string(),
    )
    .unwrap();
    fs::write(
        keystores.join("fullnode-0.json"),
        json!({
            "peerId": "peer-f0",
            "network_keystore": keystore("fnet"),
            "p2p_address": "/dns/fullnode-0/udp/8084",
            "faucet_keystore": keystore("faucet"),
        })
        .to_string(),
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("chainops").unwrap();
    cmd.args(["genesis", "--dry-run", "--configs-dir"])
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("docker run --rm"))
        .stdout(predicate::str::contains("genesis-ceremony init"))
        .stdout(predicate::str::contains("add-validator"))
        .stdout(predicate::str::contains("0xfaucet"))
        .stdout(predicate::str::contains("finalize"));

    assert!(!temp_dir.path().join("temp-genesis").exists());
}

#[test]
fn test_genesis_without_faucet_is_a_usage_error() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("keystores")).unwrap();

    let mut cmd = Command::cargo_bin("chainops").unwrap();
    cmd.args(["genesis", "--dry-run", "--configs-dir"])
        .arg(temp_dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("faucet"));
}
