//! Branch hierarchy as an arena of nodes.
//!
//! Every kept branch gets a node; group branches additionally collect
//! children. Parents are referenced by index, children by index lists, so
//! the tree has no owning back-pointers.

use rustc_hash::FxHashMap;

/// One node of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupNode {
    /// Branch name.
    pub name: String,
    /// Index into the session's branch list; `None` for a group that is
    /// only referenced as a parent.
    pub branch: Option<usize>,
    /// Own visibility flag.
    pub visible: bool,
    /// Parent node.
    pub parent: Option<usize>,
    /// Child nodes in insertion order.
    pub children: Vec<usize>,
}

/// Flat table of nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupTree {
    nodes: Vec<GroupNode>,
    by_name: FxHashMap<String, usize>,
}

impl GroupTree {
    /// Node index for `name`, creating a visible placeholder if needed.
    pub fn node(&mut self, name: &str) -> usize {
        if let Some(&i) = self.by_name.get(name) {
            return i;
        }
        let i = self.nodes.len();
        self.nodes.push(GroupNode {
            name: name.to_owned(),
            branch: None,
            visible: true,
            parent: None,
            children: Vec::new(),
        });
        let _ = self.by_name.insert(name.to_owned(), i);
        i
    }

    /// Register a branch, attaching it under `parent` when given.
    pub fn add_branch(
        &mut self,
        name: &str,
        branch: usize,
        visible: bool,
        parent: Option<&str>,
    ) -> usize {
        let i = self.add_group(name, visible, parent);
        self.nodes[i].branch = Some(branch);
        i
    }

    /// Register a node that owns no loaded branch, such as a hidden group
    /// that was not loaded.
    pub fn add_group(&mut self, name: &str, visible: bool, parent: Option<&str>) -> usize {
        let i = self.node(name);
        self.nodes[i].visible = visible;
        if let Some(parent) = parent.filter(|p| !p.is_empty() && *p != name) {
            let p = self.node(parent);
            self.attach(i, p);
        }
        i
    }

    fn attach(&mut self, child: usize, parent: usize) {
        // Refuse links that would close a cycle.
        let mut cursor = Some(parent);
        while let Some(c) = cursor {
            if c == child {
                log::warn!(
                    "ignoring group link {} -> {}: cycle",
                    self.nodes[child].name,
                    self.nodes[parent].name
                );
                return;
            }
            cursor = self.nodes[c].parent;
        }
        if let Some(old) = self.nodes[child].parent {
            self.nodes[old].children.retain(|&c| c != child);
        }
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    /// All nodes.
    #[must_use]
    pub fn nodes(&self) -> &[GroupNode] {
        &self.nodes
    }

    /// Node by index.
    #[must_use]
    pub fn get(&self, i: usize) -> Option<&GroupNode> {
        self.nodes.get(i)
    }

    /// Node index by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Set a node's own visibility flag.
    pub fn set_visible(&mut self, i: usize, visible: bool) {
        if let Some(n) = self.nodes.get_mut(i) {
            n.visible = visible;
        }
    }

    /// Nodes without a parent.
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.nodes.len()).filter(|&i| self.nodes[i].parent.is_none())
    }

    /// Whether any branch sits under a group.
    #[must_use]
    pub fn has_hierarchy(&self) -> bool {
        self.nodes.iter().any(|n| !n.children.is_empty())
    }

    /// Effective visibility of every node: own flag AND every ancestor's.
    #[must_use]
    pub fn effective_visibility(&self) -> Vec<bool> {
        let mut out = vec![false; self.nodes.len()];
        let mut stack: Vec<(usize, bool)> =
            self.roots().map(|r| (r, true)).collect();
        while let Some((i, parent_visible)) = stack.pop() {
            let vis = parent_visible && self.nodes[i].visible;
            out[i] = vis;
            stack.extend(self.nodes[i].children.iter().map(|&c| (c, vis)));
        }
        out
    }
}
