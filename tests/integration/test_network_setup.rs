use chainops::services::config_renderer::ConfigRenderer;
use chainops::services::genesis_ceremony::{
    GenesisCeremony, GenesisOptions, DEFAULT_MIGRATION_SNAPSHOT, DEFAULT_TOKEN_ALLOCATION_NANOS,
};
use chainops::services::keytool::{
    KeystoreGenerator, Keytool, DEFAULT_TOOLS_BINARY, DEFAULT_TOOLS_IMAGE,
};
use chainops::services::process::RecordingRunner;
use std::fs;
use tempfile::TempDir;

/// Keystores, configs and the genesis ceremony chained the way an operator
/// bootstraps a private network, with the key tool container scripted.

fn ed25519_output(index: usize) -> String {
    format!(
        "{{\n  \"iotaAddress\": \"0x{index}\",\n  \"publicBase64Key\": \"AAAA\",\n  \"mnemonic\": \"word {index}\",\n  \"peerId\": \"peer-{index}\"\n}}\niotaprivkey1key{index}"
    )
}

fn scripted_keytool() -> RecordingRunner {
    let runner = RecordingRunner::new();
    runner.respond(
        "generate bls12381",
        "{\n  \"iotaAddress\": \"0xb\",\n  \"publicBase64Key\": \"AAAA\"\n}\nAQID",
    );
    for index in 0..5 {
        runner.respond("generate ed25519", ed25519_output(index));
        runner.respond("keytool convert", format!("{{\"base64WithFlag\": \"AAE{index}\"}}"));
    }
    runner
}

#[test]
fn test_bootstrap_private_network() {
    let temp_dir = TempDir::new().unwrap();
    let configs = temp_dir.path().join("configs");

    // Keystores for one validator and the faucet fullnode
    let runner = scripted_keytool();
    let keytool = Keytool::new(&runner, DEFAULT_TOOLS_IMAGE, DEFAULT_TOOLS_BINARY);
    let network = KeystoreGenerator::new(&keytool).network(1, 1).unwrap();
    network.store(&configs.join("keystores")).unwrap();

    let (_, validator) = &network.validators[0];
    assert_eq!(validator.peer_id, "peer-2");
    let (_, fullnode) = &network.fullnodes[0];
    assert_eq!(fullnode.peer_id, "peer-3");
    assert_eq!(fullnode.faucet_keystore.as_ref().unwrap().iota_address, "0x4");

    let peer_list = fs::read_to_string(configs.join("keystores/peer_list.yaml")).unwrap();
    assert_eq!(
        peer_list,
        "- address: /dns/validator-0/udp/8084\n  peer-id: peer-2\n- address: /dns/fullnode-0/udp/8084\n  peer-id: peer-3"
    );

    // Node configs
    let written = ConfigRenderer::new(&configs).render_all().unwrap();
    assert_eq!(written.len(), 4);
    let validator_yaml = fs::read_to_string(configs.join("validators/validator-0.yaml")).unwrap();
    assert!(validator_yaml.contains("protocol-key-pair:\n  value: AQID\n"));
    assert!(validator_yaml.contains("worker-key-pair:\n  value: AAE0\n"));

    // Genesis ceremony
    let docker = RecordingRunner::new();
    let ceremony = GenesisCeremony::new(
        &docker,
        GenesisOptions {
            configs_dir: configs.clone(),
            image: DEFAULT_TOOLS_IMAGE.to_string(),
            binary: DEFAULT_TOOLS_BINARY.to_string(),
            token_allocation_nanos: DEFAULT_TOKEN_ALLOCATION_NANOS.to_string(),
            migration_snapshot: DEFAULT_MIGRATION_SNAPSHOT.to_string(),
        },
    );
    let steps = ceremony.run(false).unwrap();
    assert_eq!(steps.len(), 6);
    assert_eq!(docker.calls().len(), 6);

    let keys = configs.join("temp-genesis/keys/validator-0");
    assert_eq!(fs::read_to_string(keys.join("protocol.key")).unwrap(), "AQID");
    assert_eq!(fs::read_to_string(keys.join("worker.key")).unwrap(), "iotaprivkey1key0");
    assert_eq!(fs::read_to_string(keys.join("network.key")).unwrap(), "iotaprivkey1key2");

    let lines = docker.command_lines();
    assert!(lines[2].contains("add-token-allocation --recipient-address 0x4"));
    assert!(lines[5].contains("genesis-ceremony finalize"));
}
