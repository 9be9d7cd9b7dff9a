use crate::file_diff::{contents_equal, decode_text, FileComparator};
use crate::namespace::NamespaceRegistry;
use dircompare_common::{DiffStatus, DiffTree, DirCompareError, LineStats, NodeId};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// A removed file re-associated with an added file elsewhere in the tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedMove {
    pub source_path: String,
    pub destination_path: String,
    pub status: DiffStatus,
}

/// Pairs unmatched added/removed leaves and rewrites them as moves.
///
/// Candidates must share a base name, and for files with a registered
/// namespace extractor, the same declared namespace. When several added files
/// qualify, the one whose directory shares the longest path prefix with the
/// removed file's directory wins; remaining ties go to the first in pre-order.
pub struct MoveDetector {
    namespaces: NamespaceRegistry,
    files: FileComparator,
}

impl MoveDetector {
    pub fn new(namespaces: NamespaceRegistry) -> Self {
        Self {
            namespaces,
            files: FileComparator::new(),
        }
    }

    pub fn namespaces(&self) -> &NamespaceRegistry {
        &self.namespaces
    }

    /// Rewrite `tree` in place. Removed files are read from `left_root`,
    /// added files from `right_root`, both by relative path.
    pub fn detect(
        &self,
        tree: &mut DiffTree,
        left_root: &Path,
        right_root: &Path,
    ) -> Result<Vec<DetectedMove>, DirCompareError> {
        let (added, removed) = collect_leaves(tree);
        if added.is_empty() || removed.is_empty() {
            return Ok(Vec::new());
        }

        let mut added_by_name: HashMap<String, Vec<NodeId>> = HashMap::new();
        for id in &added {
            added_by_name
                .entry(tree.node(*id).name.clone())
                .or_default()
                .push(*id);
        }

        let mut added_namespaces: HashMap<NodeId, Option<String>> = HashMap::new();
        let mut claimed: HashSet<NodeId> = HashSet::new();
        let mut pairs = Vec::new();

        for r in removed {
            let removed_node = tree.node(r);
            let Some(candidates) = added_by_name.get(&removed_node.name) else {
                continue;
            };

            let structured = self.namespaces.is_structured(&removed_node.name);
            let removed_ns = if structured {
                self.namespace_at(left_root, &removed_node.relative_path, &removed_node.name)?
            } else {
                None
            };

            let removed_dir = parent_dir(&removed_node.relative_path);
            let mut best: Option<(NodeId, usize)> = None;
            for &a in candidates {
                if claimed.contains(&a) {
                    continue;
                }
                let added_node = tree.node(a);
                if structured {
                    if !added_namespaces.contains_key(&a) {
                        let ns = self.namespace_at(right_root, &added_node.relative_path, &added_node.name)?;
                        added_namespaces.insert(a, ns);
                    }
                    if added_namespaces.get(&a) != Some(&removed_ns) {
                        debug!(
                            "{} and {} declare different namespaces",
                            removed_node.relative_path, added_node.relative_path
                        );
                        continue;
                    }
                }

                let shared = common_prefix_len(removed_dir, parent_dir(&added_node.relative_path));
                if best.map_or(true, |(_, score)| shared > score) {
                    best = Some((a, shared));
                }
            }

            if let Some((a, _)) = best {
                claimed.insert(a);
                pairs.push((r, a));
            }
        }

        let mut moves = Vec::with_capacity(pairs.len());
        let mut touched: BTreeSet<NodeId> = BTreeSet::new();

        for (r, a) in pairs {
            let source_path = tree.node(r).relative_path.clone();
            let destination_path = tree.node(a).relative_path.clone();
            let left_file = left_root.join(&source_path);
            let right_file = right_root.join(&destination_path);

            let same = match contents_equal(&left_file, &right_file) {
                Ok(same) => same,
                Err(e) if e.is_not_found() => {
                    debug!("{} or {} vanished, not pairing", source_path, destination_path);
                    continue;
                }
                Err(e) => return Err(e),
            };
            let (status, stats) = if same {
                (DiffStatus::Moved, LineStats::default())
            } else {
                let diff = self
                    .files
                    .compare_files(Some(left_file.as_path()), Some(right_file.as_path()))?;
                (DiffStatus::MovedModified, diff.stats())
            };

            let node = tree.node_mut(a);
            node.status = status;
            node.set_stats(stats);
            node.source_path = Some(source_path.clone());

            if let Some(parent) = tree.detach(r) {
                touched.insert(parent);
            }
            debug!("{} -> {} ({})", source_path, destination_path, status);
            moves.push(DetectedMove {
                source_path,
                destination_path,
                status,
            });
        }

        for parent in touched {
            prune_emptied(tree, parent);
        }
        Ok(moves)
    }

    fn namespace_at(
        &self,
        root: &Path,
        relative_path: &str,
        name: &str,
    ) -> Result<Option<String>, DirCompareError> {
        let bytes = match fs::read(root.join(relative_path)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{} vanished before namespace lookup", relative_path);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        Ok(self.namespaces.namespace_of(name, &decode_text(&bytes)))
    }
}

impl Default for MoveDetector {
    fn default() -> Self {
        Self::new(NamespaceRegistry::default())
    }
}

/// Added and removed file nodes, each in pre-order
fn collect_leaves(tree: &DiffTree) -> (Vec<NodeId>, Vec<NodeId>) {
    let mut added = Vec::new();
    let mut removed = Vec::new();
    for id in tree.preorder() {
        let node = tree.node(id);
        if node.is_directory {
            continue;
        }
        match node.status {
            DiffStatus::Added => added.push(id),
            DiffStatus::Removed => removed.push(id),
            DiffStatus::Modified
            | DiffStatus::Identical
            | DiffStatus::Moved
            | DiffStatus::MovedModified => {}
        }
    }
    (added, removed)
}

/// Drop one-sided `REMOVED` directories left empty by the move, then
/// re-derive statuses up to the root
fn prune_emptied(tree: &mut DiffTree, start: NodeId) {
    let mut current = start;
    loop {
        let node = tree.node(current);
        let emptied = node.is_directory
            && node.status == DiffStatus::Removed
            && node.children().is_empty()
            && node.parent().is_some();
        if !emptied {
            break;
        }
        match tree.detach(current) {
            Some(parent) => current = parent,
            None => break,
        }
    }
    tree.refresh_ancestors(current);
}

fn parent_dir(relative_path: &str) -> &str {
    relative_path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Number of leading path segments two directories share
fn common_prefix_len(a: &str, b: &str) -> usize {
    a.split('/')
        .filter(|s| !s.is_empty())
        .zip(b.split('/').filter(|s| !s.is_empty()))
        .take_while(|(x, y)| x == y)
        .count()
}
