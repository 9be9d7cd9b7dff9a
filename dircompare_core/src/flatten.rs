use crate::comparison::join_relative;
use dircompare_common::{DiffEntry, DiffTree, NodeId};

/// Linearize the tree in pre-order, root first.
///
/// `path` includes the root name; `relative_path` excludes it.
pub fn flatten(tree: &DiffTree) -> Vec<DiffEntry> {
    let mut entries = Vec::new();
    let root = tree.root();
    push_entries(tree, root, &tree.node(root).name, "", &mut entries);
    entries
}

fn push_entries(
    tree: &DiffTree,
    id: NodeId,
    path: &str,
    relative_path: &str,
    entries: &mut Vec<DiffEntry>,
) {
    let node = tree.node(id);
    entries.push(DiffEntry {
        path: path.to_string(),
        is_directory: node.is_directory,
        status: node.status,
        relative_path: relative_path.to_string(),
        added: node.added,
        removed: node.removed,
        modified: node.modified,
        percentage: node.percentage,
        source_path: node.source_path.clone(),
    });

    for child in tree.children(id) {
        let name = &tree.node(*child).name;
        push_entries(
            tree,
            *child,
            &join_relative(path, name),
            &join_relative(relative_path, name),
            entries,
        );
    }
}
