use crate::{DiffStatus, LineStats};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

/// Index of a node inside a [`DiffTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// One directory or file in the diff tree
#[derive(Debug, Clone, PartialEq)]
pub struct DiffNode {
    pub name: String,
    pub is_directory: bool,
    pub status: DiffStatus,
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub percentage: f64,
    /// Slash-joined path from the tree root; empty for the root itself
    pub relative_path: String,
    /// Left-side relative path of a moved file
    pub source_path: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl DiffNode {
    pub fn directory(name: impl Into<String>, relative_path: impl Into<String>, status: DiffStatus) -> Self {
        Self {
            name: name.into(),
            is_directory: true,
            status,
            added: 0,
            removed: 0,
            modified: 0,
            percentage: 0.0,
            relative_path: relative_path.into(),
            source_path: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn file(
        name: impl Into<String>,
        relative_path: impl Into<String>,
        status: DiffStatus,
        stats: LineStats,
    ) -> Self {
        let mut node = Self::directory(name, relative_path, status);
        node.is_directory = false;
        node.set_stats(stats);
        node
    }

    pub fn stats(&self) -> LineStats {
        LineStats {
            added: self.added,
            removed: self.removed,
            modified: self.modified,
            percentage: self.percentage,
        }
    }

    pub fn set_stats(&mut self, stats: LineStats) {
        self.added = stats.added;
        self.removed = stats.removed;
        self.modified = stats.modified;
        self.percentage = stats.percentage;
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Arena-backed diff tree.
///
/// Nodes are addressed by [`NodeId`]. Detaching a node unlinks it from its
/// parent; the slot stays allocated but is no longer reachable from the root.
#[derive(Debug, Clone)]
pub struct DiffTree {
    nodes: Vec<DiffNode>,
    root: NodeId,
}

impl DiffTree {
    pub fn new(root: DiffNode) -> Self {
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &DiffNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut DiffNode {
        &mut self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Append `node` as the last child of `parent`
    pub fn add_child(&mut self, parent: NodeId, mut node: DiffNode) -> NodeId {
        debug_assert!(self.nodes[parent.0].is_directory, "files cannot own children");
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Unlink `id` from its parent, returning the former parent
    pub fn detach(&mut self, id: NodeId) -> Option<NodeId> {
        let parent = self.nodes[id.0].parent.take()?;
        self.nodes[parent.0].children.retain(|child| *child != id);
        Some(parent)
    }

    /// Re-derive a directory's status from its remaining children.
    ///
    /// Directories present on only one side keep `ADDED`/`REMOVED`.
    pub fn refresh_status(&mut self, id: NodeId) {
        let node = &self.nodes[id.0];
        if !node.is_directory {
            return;
        }
        let status = match node.status {
            DiffStatus::Added | DiffStatus::Removed => return,
            DiffStatus::Modified
            | DiffStatus::Identical
            | DiffStatus::Moved
            | DiffStatus::MovedModified => {
                let changed = node
                    .children
                    .iter()
                    .any(|child| self.nodes[child.0].status != DiffStatus::Identical);
                if changed {
                    DiffStatus::Modified
                } else {
                    DiffStatus::Identical
                }
            }
        };
        self.nodes[id.0].status = status;
    }

    /// Refresh `id` and every ancestor above it, bottom-up
    pub fn refresh_ancestors(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(node) = current {
            self.refresh_status(node);
            current = self.nodes[node.0].parent;
        }
    }

    /// Reachable nodes in pre-order, root first
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        order
    }

    /// Number of nodes reachable from the root
    pub fn len(&self) -> usize {
        self.preorder().len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Find a reachable node by its relative path
    pub fn find(&self, relative_path: &str) -> Option<NodeId> {
        let mut current = self.root;
        for segment in relative_path.split('/').filter(|s| !s.is_empty()) {
            current = *self
                .children(current)
                .iter()
                .find(|child| self.nodes[child.0].name == segment)?;
        }
        Some(current)
    }

    /// Borrowed nested view, serializable as a JSON tree
    pub fn view(&self, id: NodeId) -> NodeView<'_> {
        NodeView { tree: self, id }
    }
}

impl Serialize for DiffTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.view(self.root).serialize(serializer)
    }
}

#[derive(Clone, Copy)]
pub struct NodeView<'a> {
    tree: &'a DiffTree,
    id: NodeId,
}

impl<'a> NodeView<'a> {
    pub fn node(&self) -> &'a DiffNode {
        self.tree.node(self.id)
    }

    pub fn children(&self) -> impl Iterator<Item = NodeView<'a>> + 'a {
        let tree = self.tree;
        tree.children(self.id)
            .iter()
            .map(move |id| NodeView { tree, id: *id })
    }
}

struct ChildViews<'a>(NodeView<'a>);

impl Serialize for ChildViews<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.children())
    }
}

impl Serialize for NodeView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let node = self.node();
        let mut state = serializer.serialize_struct("DiffNode", 10)?;
        state.serialize_field("name", &node.name)?;
        state.serialize_field("is_directory", &node.is_directory)?;
        state.serialize_field("status", &node.status)?;
        state.serialize_field("added", &node.added)?;
        state.serialize_field("removed", &node.removed)?;
        state.serialize_field("modified", &node.modified)?;
        state.serialize_field("percentage", &node.percentage)?;
        state.serialize_field("relative_path", &node.relative_path)?;
        state.serialize_field("source_path", &node.source_path)?;
        state.serialize_field("children", &ChildViews(*self))?;
        state.end()
    }
}
