// CODEOWNERS lookup for crate paths

use regex::Regex;

use crate::utils::error::Result;

pub const NO_OWNERS: &str = "No owners specified";

#[derive(Debug, Clone)]
struct OwnerRule {
    pattern: String,
    regex: Regex,
    owners: Vec<String>,
}

/// Owner rules in file order. The `*` fallback is only consulted when no
/// other pattern matches.
#[derive(Debug, Clone, Default)]
pub struct CodeOwners {
    rules: Vec<OwnerRule>,
}

impl CodeOwners {
    pub fn parse(content: &str) -> Result<Self> {
        let mut rules: Vec<OwnerRule> = Vec::new();
        for line in content.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let Some(pattern) = parts.next() else {
                continue;
            };
            let owners = parts.map(ToString::to_string).collect();
            let regex = Regex::new(&format!("^{}", regex::escape(pattern).replace(r"\*", ".*")))?;

            // A repeated pattern keeps its first position but takes the later owners
            if let Some(existing) = rules.iter_mut().find(|r| r.pattern == pattern) {
                existing.owners = owners;
            } else {
                rules.push(OwnerRule {
                    pattern: pattern.to_string(),
                    regex,
                    owners,
                });
            }
        }
        Ok(Self { rules })
    }

    /// Owners of a crate path relative to the repository root, joined
    /// with `, `.
    pub fn owner_of(&self, crate_path: &str) -> String {
        let with_slash = format!("{crate_path}/");
        self.rules
            .iter()
            .filter(|r| r.pattern != "*")
            .find(|r| r.regex.is_match(crate_path) || r.regex.is_match(&with_slash))
            .or_else(|| self.rules.iter().find(|r| r.pattern == "*"))
            .map_or_else(|| NO_OWNERS.to_string(), |r| r.owners.join(", "))
    }
}
