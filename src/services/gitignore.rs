// Subset of gitignore matching used to skip build output and vendored files

use std::path::Path;

use regex::Regex;

use crate::utils::error::Result;
use crate::utils::fs_utils;

#[derive(Debug, Clone)]
struct IgnoreRule {
    negated: bool,
    dir_only: bool,
    exact: Regex,
    contents: Regex,
}

impl IgnoreRule {
    fn matches(&self, relative: &str, is_dir: bool) -> bool {
        (self.exact.is_match(relative) && (is_dir || !self.dir_only)) || self.contents.is_match(relative)
    }
}

/// Translate one glob to a regex body. `*` and `?` stay inside a path
/// component, `**` crosses components.
fn glob_to_regex(glob: &str) -> String {
    let chars: Vec<char> = glob.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                if chars.get(i + 2) == Some(&'/') {
                    out.push_str("(?:.*/)?");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
            }
            '*' => {
                out.push_str("[^/]*");
                i += 1;
            }
            '?' => {
                out.push_str("[^/]");
                i += 1;
            }
            '[' => match chars[i..].iter().position(|&c| c == ']') {
                Some(end) if end > 1 => {
                    let class: String = chars[i + 1..i + end].iter().collect();
                    let class = class.strip_prefix('!').map_or(class.clone(), |rest| format!("^{rest}"));
                    out.push('[');
                    out.push_str(&class.replace('\\', "\\\\"));
                    out.push(']');
                    i += end + 1;
                }
                _ => {
                    out.push_str(r"\[");
                    i += 1;
                }
            },
            '\\' if i + 1 < chars.len() => {
                out.push_str(&regex::escape(&chars[i + 1].to_string()));
                i += 2;
            }
            c => {
                out.push_str(&regex::escape(&c.to_string()));
                i += 1;
            }
        }
    }
    out
}

/// Ordered ignore rules of one `.gitignore` file, relative to its folder.
/// The last matching rule decides.
#[derive(Debug, Clone, Default)]
pub struct GitIgnore {
    rules: Vec<IgnoreRule>,
}

impl GitIgnore {
    pub fn parse(content: &str) -> Result<Self> {
        let mut rules = Vec::new();

        for raw in content.lines() {
            let line = raw.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (negated, line) = match line.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, line.strip_prefix('\\').unwrap_or(line)),
            };
            let (dir_only, line) = match line.strip_suffix('/') {
                Some(rest) => (true, rest),
                None => (false, line),
            };
            if line.is_empty() {
                continue;
            }

            let anchored = line.contains('/');
            let body = glob_to_regex(line.trim_start_matches('/'));
            let prefix = if anchored { "^" } else { "^(?:.*/)?" };

            rules.push(IgnoreRule {
                negated,
                dir_only,
                exact: Regex::new(&format!("{prefix}{body}$"))?,
                contents: Regex::new(&format!("{prefix}{body}/.*$"))?,
            });
        }

        Ok(Self { rules })
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::parse(&fs_utils::read_to_string(path)?)
    }

    /// `relative` uses `/` separators and no leading slash.
    pub fn is_ignored(&self, relative: &str, is_dir: bool) -> bool {
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.matches(relative, is_dir))
            .is_some_and(|rule| !rule.negated)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
