// Data structures shared by the tools
pub mod codeowners;
pub mod dependency_graph;
pub mod keystore;
pub mod manifest;
pub mod rename_rules;
pub mod search_result;
pub mod slipstream_config;
