use crate::file_diff::{contents_equal, FileComparator};
use crate::ignore::IgnoreMatcher;
use dircompare_common::{DiffNode, DiffStatus, DiffTree, DirCompareError, LineStats, NodeId};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Recursively unions two directory trees into a [`DiffTree`]
#[derive(Debug, Clone)]
pub struct TreeComparator {
    ignore: IgnoreMatcher,
    files: FileComparator,
}

impl TreeComparator {
    pub fn new(ignore: IgnoreMatcher) -> Self {
        Self {
            ignore,
            files: FileComparator::new(),
        }
    }

    pub fn ignore_matcher(&self) -> &IgnoreMatcher {
        &self.ignore
    }

    /// Compare two optional roots and produce a diff tree rooted at `name`
    pub fn compare(
        &self,
        name: &str,
        left: Option<&Path>,
        right: Option<&Path>,
        relative_path: &str,
    ) -> Result<DiffTree, DirCompareError> {
        let root = self.classify(name, left, right, relative_path)?.ok_or_else(|| {
            DirCompareError::Path(format!("neither side of {:?} exists", relative_path))
        })?;
        let is_dir = root.is_directory;
        let mut tree = DiffTree::new(root);
        if is_dir {
            let root_id = tree.root();
            self.expand(&mut tree, root_id, left, right)?;
        }
        Ok(tree)
    }

    /// Build a node with its base status; file nodes get line statistics.
    /// A side that no longer exists counts as absent; `None` when both are gone.
    fn classify(
        &self,
        name: &str,
        left: Option<&Path>,
        right: Option<&Path>,
        relative_path: &str,
    ) -> Result<Option<DiffNode>, DirCompareError> {
        let left = left.filter(|p| p.exists());
        let right = right.filter(|p| p.exists());
        let is_dir = left.map_or(false, Path::is_dir) || right.map_or(false, Path::is_dir);

        let status = match (left, right) {
            (None, None) => return Ok(None),
            (None, Some(_)) => DiffStatus::Added,
            (Some(_), None) => DiffStatus::Removed,
            (Some(_), Some(_)) if is_dir => DiffStatus::Identical,
            (Some(l), Some(r)) => match contents_equal(l, r) {
                Ok(true) => DiffStatus::Identical,
                Ok(false) => DiffStatus::Modified,
                Err(e) if e.is_not_found() && !(l.exists() && r.exists()) => {
                    debug!("{} vanished while comparing contents", relative_path);
                    return self.classify(name, left, right, relative_path);
                }
                Err(e) => return Err(e),
            },
        };

        if is_dir {
            return Ok(Some(DiffNode::directory(name, relative_path, status)));
        }

        let stats = match status {
            DiffStatus::Added | DiffStatus::Removed | DiffStatus::Modified => {
                self.files.compare_files(left, right)?.stats()
            }
            DiffStatus::Identical | DiffStatus::Moved | DiffStatus::MovedModified => {
                LineStats::default()
            }
        };
        Ok(Some(DiffNode::file(name, relative_path, status, stats)))
    }

    fn expand(
        &self,
        tree: &mut DiffTree,
        id: NodeId,
        left: Option<&Path>,
        right: Option<&Path>,
    ) -> Result<(), DirCompareError> {
        let relative_path = tree.node(id).relative_path.clone();
        let mut names = BTreeSet::new();
        self.collect_child_names(left, &relative_path, &mut names)?;
        self.collect_child_names(right, &relative_path, &mut names)?;
        debug!("{:?}: {} child entries", relative_path, names.len());

        for child_name in names {
            let child_left = resolve_child(left, &child_name);
            let child_right = resolve_child(right, &child_name);
            let child_relative = join_relative(&relative_path, &child_name);
            let Some(node) = self.classify(
                &child_name,
                child_left.as_deref(),
                child_right.as_deref(),
                &child_relative,
            )?
            else {
                debug!("{} vanished during comparison", child_relative);
                continue;
            };
            let is_dir = node.is_directory;
            let child_id = tree.add_child(id, node);
            if is_dir {
                self.expand(tree, child_id, child_left.as_deref(), child_right.as_deref())?;
            }
        }

        let changed = tree
            .children(id)
            .iter()
            .any(|child| tree.node(*child).status != DiffStatus::Identical);
        let node = tree.node_mut(id);
        if changed && node.status == DiffStatus::Identical {
            node.status = DiffStatus::Modified;
        }
        Ok(())
    }

    /// Non-ignored entry names of `dir`; the listing handle is closed on return
    fn collect_child_names(
        &self,
        dir: Option<&Path>,
        relative_path: &str,
        names: &mut BTreeSet<String>,
    ) -> Result<(), DirCompareError> {
        let Some(dir) = dir.filter(|d| d.is_dir()) else {
            return Ok(());
        };

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{:?} vanished before listing", dir);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let name = entry?.file_name().to_string_lossy().into_owned();
            let candidate = join_relative(relative_path, &name);
            if self.ignore.is_ignored(Path::new(&candidate)) {
                debug!("Ignoring {}", candidate);
                continue;
            }
            names.insert(name);
        }
        Ok(())
    }
}

fn resolve_child(parent: Option<&Path>, name: &str) -> Option<PathBuf> {
    parent
        .filter(|p| p.is_dir())
        .map(|p| p.join(name))
        .filter(|p| p.exists())
}

pub(crate) fn join_relative(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}
