//! Transient line model of a `Cargo.toml` used by the dependency sorter.
//!
//! A manifest is a list of [`ManifestSection`]s. Each section owns the
//! key/value entries found below its header, split into external and
//! internal groups, and any free-standing comment lines around them.

/// Marker comment placed above the external group when both groups exist.
pub const EXTERNAL_MARKER: &str = "# external dependencies";
/// Marker comment placed above the internal group when both groups exist.
pub const INTERNAL_MARKER: &str = "# internal dependencies";

/// One key of a section: a single `key = value` line or a multi-line array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestNode {
    /// Crate name used for internal/external classification
    pub name: String,
    /// Key as written in the manifest; sort and identity key
    pub alias: String,
    pub lines: Vec<String>,
    pub multiline: bool,
    /// Lines found directly above the entry
    pub comments: Vec<String>,
}

impl ManifestNode {
    pub fn single(name: impl Into<String>, alias: impl Into<String>, line: impl Into<String>, comments: Vec<String>) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
            lines: vec![line.into()],
            multiline: false,
            comments,
        }
    }

    pub fn array(alias: impl Into<String>, start: impl Into<String>, comments: Vec<String>) -> Self {
        let alias = alias.into();
        Self {
            name: alias.clone(),
            alias,
            lines: vec![start.into()],
            multiline: true,
            comments,
        }
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        debug_assert!(self.multiline, "only array nodes span several lines");
        self.lines.push(line.into());
    }

    /// Comments (blank lines dropped) followed by the entry itself. Array
    /// items are sorted, the opening and closing lines stay in place.
    pub fn render(&self) -> Vec<String> {
        let mut lines = self.lines.clone();
        if self.multiline && lines.len() > 2 {
            let last = lines.len() - 1;
            lines[1..last].sort();
        }

        self.comments
            .iter()
            .filter(|c| !c.trim().is_empty())
            .cloned()
            .chain(lines)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeGroup {
    External,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSection {
    pub header: String,
    /// Comments rendered above the header
    pub leading: Vec<String>,
    pub external: Vec<ManifestNode>,
    pub internal: Vec<ManifestNode>,
    /// Comments after the last entry
    pub trailing: Vec<String>,
}

impl ManifestSection {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            leading: Vec::new(),
            external: Vec::new(),
            internal: Vec::new(),
            trailing: Vec::new(),
        }
    }

    pub fn has_nodes(&self) -> bool {
        !self.external.is_empty() || !self.internal.is_empty()
    }

    /// Entries of `[*dependencies*]` and `[profile*]` tables are reordered.
    pub fn sorts_nodes(&self) -> bool {
        self.header.contains("dependencies") || self.header.contains("profile")
    }

    /// Insert a node; an existing node with the same alias is replaced in place.
    pub fn insert(&mut self, group: NodeGroup, node: ManifestNode) {
        let nodes = self.group_mut(group);
        match nodes.iter_mut().find(|n| n.alias == node.alias) {
            Some(existing) => *existing = node,
            None => nodes.push(node),
        }
    }

    pub fn group_mut(&mut self, group: NodeGroup) -> &mut Vec<ManifestNode> {
        match group {
            NodeGroup::External => &mut self.external,
            NodeGroup::Internal => &mut self.internal,
        }
    }

    pub fn node_mut(&mut self, group: NodeGroup, alias: &str) -> Option<&mut ManifestNode> {
        self.group_mut(group).iter_mut().find(|n| n.alias == alias)
    }

    /// Free-standing lines go above the header until the first entry exists.
    pub fn add_unknown_line(&mut self, line: impl Into<String>) {
        if self.has_nodes() {
            self.trailing.push(line.into());
        } else {
            self.leading.push(line.into());
        }
    }

    pub fn render(&self) -> Vec<String> {
        let mut out = self.leading.clone();
        out.push(self.header.clone());

        let both = !self.external.is_empty() && !self.internal.is_empty();
        if both {
            out.push(EXTERNAL_MARKER.to_string());
        }
        out.extend(self.render_group(&self.external));
        if both {
            out.push(String::new());
            out.push(INTERNAL_MARKER.to_string());
        }
        out.extend(self.render_group(&self.internal));

        out.extend(self.trailing.iter().cloned());
        out
    }

    fn render_group(&self, nodes: &[ManifestNode]) -> Vec<String> {
        let mut ordered: Vec<&ManifestNode> = nodes.iter().collect();
        if self.sorts_nodes() {
            ordered.sort_by(|a, b| a.alias.cmp(&b.alias));
        }
        ordered.into_iter().flat_map(ManifestNode::render).collect()
    }
}

/// A parsed manifest ready to be written back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Comment lines of a manifest without any section
    pub preamble: Vec<String>,
    pub sections: Vec<ManifestSection>,
}

impl Manifest {
    /// Sections separated by one blank line, newline-terminated.
    pub fn render(&self) -> String {
        let mut blocks: Vec<Vec<String>> = Vec::new();
        if !self.preamble.is_empty() {
            blocks.push(self.preamble.clone());
        }
        blocks.extend(self.sections.iter().map(ManifestSection::render));

        let mut content = String::new();
        for (index, block) in blocks.iter().enumerate() {
            if index > 0 {
                content.push('\n');
            }
            for line in block {
                content.push_str(line);
                content.push('\n');
            }
        }
        content
    }
}
