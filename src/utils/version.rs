// Semantic version handling for release tags

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::utils::error::{ChainopsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Find the first `MAJOR.MINOR.PATCH` inside an arbitrary string such
    /// as `mainnet-v1.22.0`.
    pub fn extract(text: &str) -> Result<Self> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = PATTERN.get_or_init(|| {
            Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("static version regex")
        });

        pattern
            .find(text)
            .ok_or_else(|| ChainopsError::Validation(format!("Invalid version format: {text}")))
            .and_then(|m| m.as_str().parse())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = ChainopsError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return Err(ChainopsError::Validation(format!(
                "Version must have exactly 3 parts (major.minor.patch): {s}"
            )));
        }

        let parse = |label: &str, part: &str| {
            part.parse::<u32>().map_err(|_| {
                ChainopsError::Validation(format!("Invalid {label} version: {part}"))
            })
        };

        Ok(Self::new(
            parse("major", parts[0])?,
            parse("minor", parts[1])?,
            parse("patch", parts[2])?,
        ))
    }
}
