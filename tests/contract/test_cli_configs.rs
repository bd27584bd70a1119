use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Contract tests for `chainops configs`

fn keystore(tag: &str) -> serde_json::Value {
    json!({
        "iotaAddress": format!("0x{tag}"),
        "publicBase64Key": "AAAA",
        "privateBech32Key": format!("iotaprivkey1{tag}"),
        "privateBase64Key": format!("{tag}-base64"),
    })
}

fn write_keystores(configs: &Path) {
    let keystores = configs.join("keystores");
    fs::create_dir_all(&keystores).unwrap();

    let validator = json!({
        "peerId": "peer-v0",
        "protocol_keystore": keystore("protocol"),
        "worker_keystore": keystore("worker"),
        "account_keystore": keystore("account"),
        "network_keystore": keystore("vnet"),
        "network_address": "/dns/validator-0/tcp/8080/http",
        "p2p_address": "/dns/validator-0/udp/8084",
        "narwhal_primary_address": "/dns/validator-0/udp/8081",
        "narwhal_worker_address": "/dns/validator-0/udp/8082",
    });
    let fullnode = json!({
        "peerId": "peer-f0",
        "network_keystore": keystore("fnet"),
        "p2p_address": "/dns/fullnode-0/udp/8084",
        "faucet_keystore": keystore("faucet"),
    });

    fs::write(keystores.join("validator-0.json"), validator.to_string()).unwrap();
    fs::write(keystores.join("fullnode-0.json"), fullnode.to_string()).unwrap();
    fs::write(
        keystores.join("peer_list.yaml"),
        "- address: /dns/validator-0/udp/8084\n  peer-id: peer-v0\n- address: /dns/fullnode-0/udp/8084\n  peer-id: peer-f0",
    )
    .unwrap();
}

#[test]
fn test_configs_renders_every_node() {
    let temp_dir = TempDir::new().unwrap();
    let configs = temp_dir.path().join("configs");
    write_keystores(&configs);

    let mut cmd = Command::cargo_bin("chainops").unwrap();
    cmd.args(["configs", "--configs-dir"])
        .arg(&configs)
        .assert()
        .success()
        .stdout(predicate::str::contains("validator-0.yaml"))
        .stdout(predicate::str::contains("iota.keystore"));

    let validator = fs::read_to_string(configs.join("validators/validator-0.yaml")).unwrap();
    assert!(validator.starts_with("---\nprotocol-key-pair:\n  value: protocol-base64\n"));
    assert!(validator.contains("    - address: /dns/fullnode-0/udp/8084\n      peer-id: peer-f0"));

    let fullnode = fs::read_to_string(configs.join("fullnodes/fullnode-0.yaml")).unwrap();
    assert!(fullnode.contains("  value: fnet-base64\n"));
    assert!(fullnode.contains("  external-address: /dns/fullnode-0/udp/8084\n"));

    let client = fs::read_to_string(configs.join("faucet/client.yaml")).unwrap();
    assert!(client.contains("active_address: \"0xfaucet\""));

    let keystore: Vec<String> =
        serde_json::from_str(&fs::read_to_string(configs.join("faucet/iota.keystore")).unwrap()).unwrap();
    assert_eq!(keystore, vec!["iotaprivkey1faucet".to_string()]);
}

#[test]
fn test_configs_requires_peer_list() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("keystores")).unwrap();

    let mut cmd = Command::cargo_bin("chainops").unwrap();
    cmd.args(["configs", "--configs-dir"])
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("peer_list.yaml"));
}
