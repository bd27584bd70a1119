use chainops::models::codeowners::{CodeOwners, NO_OWNERS};
use chainops::models::dependency_graph::{Crate, DependencyGraph};
use chainops::models::keystore::{parse_peer_list, render_peer_list, FullnodeKeys, Peer, ValidatorKeys};
use chainops::models::rename_rules::{RenameRules, Replacement};
use chainops::models::slipstream_config::{IgnoreMatcher, IgnoreRules, SlipstreamConfig};

#[test]
fn test_codeowners_without_fallback() {
    let owners = CodeOwners::parse("/crates/iota-core/ @org/core\n").unwrap();
    assert_eq!(owners.owner_of("/crates/iota-core"), "@org/core");
    assert_eq!(owners.owner_of("/crates/iota-sdk"), NO_OWNERS);
}

#[test]
fn test_dependency_graph_queries() {
    let mut graph = DependencyGraph::new();
    let mut node = Crate::new("iota-node".into(), None);
    node.add_dependency("iota-types", false);
    let mut cli = Crate::new("iota-cli".into(), None);
    cli.add_dependency("iota-types", true);
    graph.insert(node);
    graph.insert(cli);
    graph.insert(Crate::new("iota-types".into(), None));

    let dependents: Vec<&str> = graph
        .dependents_of("iota-types")
        .into_iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(dependents, vec!["iota-node", "iota-cli"]);
    assert!(graph.is_leaf("iota-types"));
    assert!(graph.is_leaf("serde"));
    assert!(!graph.is_leaf("iota-node"));
    assert_eq!(graph.len(), 3);
}

#[test]
fn test_rename_rules_defaults_protect_words() {
    let rules = RenameRules::default();
    assert_eq!(rules.rename_path("crates/sui-testsuite/src"), "crates/iota-testsuite/src");
    assert_eq!(rules.rename_path("docs/Sui.md"), "docs/Iota.md");
    assert!(rules.is_ignored_extension("logo.SVG"));
    assert!(!rules.is_ignored_extension("lib.rs"));
    assert!(rules.ignored_paths.iter().any(|p| p == "scripts/rename-to-iota/"));
    assert!(rules.ignored_paths.iter().any(|p| p == "pnpm-lock.yaml"));
}

#[test]
fn test_rename_rules_partial_toml_keeps_defaults() {
    let rules = RenameRules::from_toml(
        r#"
replacements = [{ from = "acme", to = "zenith" }]
"#,
    )
    .unwrap();
    assert_eq!(rules.replacements, vec![Replacement::new("acme", "zenith")]);
    assert_eq!(rules.copyright_line, RenameRules::default().copyright_line);
    assert!(rules.ignore_words.contains(&"testsuite".to_string()));

    assert!(RenameRules::from_toml("replacements = 3").is_err());
}

#[test]
fn test_slipstream_config_rejects_invalid_json() {
    assert!(SlipstreamConfig::from_json("{").is_err());
    let config = SlipstreamConfig::from_json("{}").unwrap();
    assert_eq!(config, SlipstreamConfig::default());
}

#[test]
fn test_ignore_matcher_rules() {
    let matcher = IgnoreMatcher::compile(&IgnoreRules {
        folders: vec!["^target".into(), "node_modules".into()],
        files: vec!["^Cargo\\.lock$".into()],
        file_types: vec!["^$".into(), "\\.png$".into()],
    })
    .unwrap();

    assert!(matcher.folder("target/debug"));
    assert!(matcher.folder("apps/wallet/node_modules"));
    assert!(!matcher.folder("crates/target-utils"));
    assert!(matcher.file("Cargo.lock"));
    assert!(matcher.file_type("logo.png"));
    assert!(matcher.file_type("Makefile"));
    assert!(!matcher.file_type("lib.rs"));
}

#[test]
fn test_node_addresses_follow_names() {
    let [network, p2p, primary, worker] = ValidatorKeys::addresses_for("validator-1");
    assert!(network.contains("validator-1"));
    assert!(p2p.starts_with("/dns/validator-1/udp/"));
    assert!(primary.contains("validator-1"));
    assert!(worker.contains("validator-1"));
    assert_eq!(FullnodeKeys::p2p_address_for("fullnode-0"), "/dns/fullnode-0/udp/8084");
}

#[test]
fn test_peer_list_parsing() {
    assert!(parse_peer_list("  \n").unwrap().is_empty());
    let peers = vec![Peer::new("/dns/validator-0/udp/8084", "peer-0")];
    assert_eq!(parse_peer_list(&render_peer_list(&peers)).unwrap(), peers);
    assert!(parse_peer_list("not: [a list").is_err());
}

