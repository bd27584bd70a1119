// Replacement rules of the fork rename tool

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::utils::error::{ChainopsError, Result};
use crate::utils::fs_utils;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub from: String,
    pub to: String,
}

impl Replacement {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Rules loaded from a TOML file. Every table is optional and falls back
/// to the built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenameRules {
    /// Applied in order
    pub replacements: Vec<Replacement>,
    /// Words whose lines are left untouched, matched case-insensitively
    pub ignore_words: Vec<String>,
    pub warn_about: Vec<String>,
    /// Prefixes relative to the root folder
    pub ignored_paths: Vec<String>,
    pub ignored_extensions: Vec<String>,
    pub copyright_line: String,
}

impl Default for RenameRules {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(ToString::to_string).collect::<Vec<_>>();
        Self {
            replacements: [
                ("MystenLabs/sui", "iotaledger/iota"),
                ("mystenlabs/sui", "iotaledger/iota"),
                ("SUI", "IOTA"),
                ("Sui", "Iota"),
                ("sui", "iota"),
                ("@mysten/", "@iota/"),
                ("MIST", "NANOS"),
                ("Mist", "Nanos"),
                ("mist", "nanos"),
            ]
            .into_iter()
            .map(|(from, to)| Replacement::new(from, to))
            .collect(),
            ignore_words: owned(&[
                "mistakes",
                "optimistic",
                "optimist",
                "optimistically",
                "testsuite",
                "test_suite",
                "test-suite",
                "lawsuit",
                "suitable",
                "mistic",
                "minimist",
                "headlessui",
            ]),
            warn_about: owned(&["suiprivkey"]),
            ignored_paths: owned(&[
                "pnpm-lock.yaml",
                "crates/sui-light-client/example_config/20873329.yaml",
                "crates/sui-framework-snapshot/bytecode_snapshot/",
                "crates/iota-light-client/example_config/20873329.yaml",
                "crates/iota-framework-snapshot/bytecode_snapshot/",
                "scripts/rename-to-iota/",
            ]),
            ignored_extensions: owned(&[
                "svg", "mv", "png", "jpg", "jpeg", "gif", "wasm", "errmap", "bcs", "chk", "pdf", "ai", "mp3",
                "wav", "ico", "ttf", "otf", "woff", "woff2", "mvsm",
            ]),
            copyright_line: "Modifications Copyright (c) 2024 IOTA Stiftung".to_string(),
        }
    }
}

impl RenameRules {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ChainopsError::Config(format!("invalid rename rules: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_toml(&fs_utils::read_to_string(path)?)
    }

    /// `(replacement key, ignore word)` pairs where the key occurs inside
    /// the ignore word, e.g. `("sui", "testsuite")`.
    pub fn protected_words(&self) -> Vec<(&Replacement, &str)> {
        self.ignore_words
            .iter()
            .flat_map(|word| {
                self.replacements
                    .iter()
                    .filter(move |r| word.contains(&r.from))
                    .map(move |r| (r, word.as_str()))
            })
            .collect()
    }

    /// Apply every replacement to a path while keeping protected words.
    pub fn rename_path(&self, path: &str) -> String {
        let mut renamed = self
            .replacements
            .iter()
            .fold(path.to_string(), |acc, r| acc.replace(&r.from, &r.to));

        for (replacement, word) in self.protected_words() {
            if path.contains(word) {
                renamed = renamed.replace(&word.replace(&replacement.from, &replacement.to), word);
            }
        }
        renamed
    }

    pub fn is_ignored_extension(&self, file_name: &str) -> bool {
        let lower = file_name.to_lowercase();
        self.ignored_extensions
            .iter()
            .any(|ext| lower.ends_with(&format!(".{ext}")))
    }
}
