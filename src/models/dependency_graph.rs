// Internal crate dependency graph built from `cargo tree`

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub is_dev: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crate {
    pub name: String,
    /// `None` when no CODEOWNERS file was available
    pub owner: Option<String>,
    pub dependencies: Vec<Dependency>,
}

impl Crate {
    pub const fn new(name: String, owner: Option<String>) -> Self {
        Self {
            name,
            owner,
            dependencies: Vec::new(),
        }
    }

    /// Record a dependency. An existing dev dependency is upgraded to a
    /// normal one, never the other way round.
    pub fn add_dependency(&mut self, name: &str, is_dev: bool) {
        match self.dependencies.iter_mut().find(|d| d.name == name) {
            Some(existing) => {
                if existing.is_dev && !is_dev {
                    existing.is_dev = false;
                }
            }
            None => self.dependencies.push(Dependency {
                name: name.to_string(),
                is_dev,
            }),
        }
    }
}

/// Crates in insertion order with a name index.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    crates: Vec<Crate>,
    index: HashMap<String, usize>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, krate: Crate) {
        if let Some(&i) = self.index.get(&krate.name) {
            self.crates[i] = krate;
        } else {
            self.index.insert(krate.name.clone(), self.crates.len());
            self.crates.push(krate);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Crate> {
        self.index.get(name).map(|&i| &self.crates[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Crate> {
        self.index.get(name).map(|&i| &mut self.crates[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn crates(&self) -> impl Iterator<Item = &Crate> {
        self.crates.iter()
    }

    pub fn len(&self) -> usize {
        self.crates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crates.is_empty()
    }

    /// Crates depending on `name`, in insertion order.
    pub fn dependents_of(&self, name: &str) -> Vec<&Crate> {
        self.crates
            .iter()
            .filter(|c| c.dependencies.iter().any(|d| d.name == name))
            .collect()
    }

    /// True when `name` is unknown or has no dependencies of its own.
    pub fn is_leaf(&self, name: &str) -> bool {
        self.get(name).map_or(true, |c| c.dependencies.is_empty())
    }
}
