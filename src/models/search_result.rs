// Results produced by the code search commands

use std::path::PathBuf;

/// A test function that matched the search pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestMatch {
    pub name: String,
    pub path: PathBuf,
    /// 1-based line of the `fn` declaration.
    pub line_num: usize,
    /// First matching body line, or the function name when only the name matched.
    pub line: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: PathBuf,
    pub line_num: usize,
    pub text: String,
}

/// Every occurrence of one versioned identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionOccurrence {
    pub count: usize,
    pub locations: Vec<Location>,
    /// Owning crates in first-seen order.
    pub crates: Vec<String>,
}

impl VersionOccurrence {
    pub fn record(&mut self, location: Location) {
        self.count += 1;
        self.locations.push(location);
    }

    pub fn add_crate(&mut self, name: &str) {
        if !self.crates.iter().any(|c| c == name) {
            self.crates.push(name.to_string());
        }
    }

    /// Fold another file's occurrences into this one.
    pub fn merge(&mut self, other: Self) {
        self.count += other.count;
        self.locations.extend(other.locations);
        for name in &other.crates {
            self.add_crate(name);
        }
    }
}
