// Services module for the tool pipelines
pub mod cargo_sorter;
pub mod cargo_tree;
pub mod code_search;
pub mod config_renderer;
pub mod genesis_ceremony;
pub mod gitignore;
pub mod graph_renderer;
pub mod keytool;
pub mod process;
pub mod renamer;
pub mod slipstream;
