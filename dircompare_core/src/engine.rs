use crate::comparison::TreeComparator;
use crate::file_diff::FileComparator;
use crate::ignore::IgnoreMatcher;
use crate::move_detect::{DetectedMove, MoveDetector};
use crate::namespace::NamespaceRegistry;
use dircompare_common::{AppConfig, DiffTree, DirCompareError, FileDiff};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const FALLBACK_ROOT_NAME: &str = "root";

/// Diff tree together with the moves that were folded into it
#[derive(Debug)]
pub struct ComparisonOutcome {
    pub tree: DiffTree,
    pub moves: Vec<DetectedMove>,
}

/// Entry point tying tree comparison and move detection together
pub struct DirectoryComparator {
    tree: TreeComparator,
    moves: MoveDetector,
    files: FileComparator,
    detect_moves: bool,
}

impl DirectoryComparator {
    pub fn new(config: &AppConfig) -> Result<Self, DirCompareError> {
        let ignore = IgnoreMatcher::from_config(config);
        let namespaces = NamespaceRegistry::with_rules(&config.namespace_rules)?;
        Ok(Self::with_parts(TreeComparator::new(ignore), MoveDetector::new(namespaces))
            .with_move_detection(config.detect_moves))
    }

    pub fn with_parts(tree: TreeComparator, moves: MoveDetector) -> Self {
        Self {
            tree,
            moves,
            files: FileComparator::new(),
            detect_moves: true,
        }
    }

    pub fn with_move_detection(mut self, enabled: bool) -> Self {
        self.detect_moves = enabled;
        self
    }

    pub fn ignore_matcher(&self) -> &IgnoreMatcher {
        self.tree.ignore_matcher()
    }

    pub fn compare_directories(&self, left: &Path, right: &Path) -> Result<DiffTree, DirCompareError> {
        self.compare_detailed(left, right).map(|outcome| outcome.tree)
    }

    /// Compare two roots; a root that does not exist is an absent side
    pub fn compare_detailed(
        &self,
        left: &Path,
        right: &Path,
    ) -> Result<ComparisonOutcome, DirCompareError> {
        let left_side = Some(left).filter(|p| p.exists());
        let right_side = Some(right).filter(|p| p.exists());
        if left_side.is_none() && right_side.is_none() {
            return Err(DirCompareError::Path(format!(
                "neither {} nor {} exists",
                left.display(),
                right.display()
            )));
        }

        let name = root_name(left, right);
        info!("Comparing {:?} with {:?} as '{}'", left, right, name);
        let mut tree = self.tree.compare(&name, left_side, right_side, "")?;

        let moves = match (left_side, right_side) {
            (Some(l), Some(r)) if self.detect_moves => self.moves.detect(&mut tree, l, r)?,
            _ => Vec::new(),
        };
        info!("Built diff tree with {} nodes and {} moves", tree.len(), moves.len());

        Ok(ComparisonOutcome { tree, moves })
    }

    /// Line diff of one entry. Moved entries pass their `source_path` so the
    /// left side is read from the old location.
    pub fn diff_entry(
        &self,
        left_root: &Path,
        right_root: &Path,
        relative_path: &str,
        source_path: Option<&str>,
    ) -> Result<FileDiff, DirCompareError> {
        let left = existing_file(left_root.join(source_path.unwrap_or(relative_path)));
        let right = existing_file(right_root.join(relative_path));
        self.files.compare_files(left.as_deref(), right.as_deref())
    }
}

impl Default for DirectoryComparator {
    fn default() -> Self {
        Self::with_parts(TreeComparator::new(IgnoreMatcher::defaults()), MoveDetector::default())
    }
}

fn existing_file(path: PathBuf) -> Option<PathBuf> {
    Some(path).filter(|p| p.is_file())
}

/// Base name of the right root, else of the left, else a fixed fallback
fn root_name(left: &Path, right: &Path) -> String {
    [right, left]
        .into_iter()
        .find_map(base_name)
        .unwrap_or_else(|| FALLBACK_ROOT_NAME.to_string())
}

fn base_name(path: &Path) -> Option<String> {
    let resolved = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    resolved
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}
