use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Status of a node in the diff tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiffStatus {
    /// Entry exists only on the right side
    Added,
    /// Entry exists only on the left side
    Removed,
    /// Entry exists on both sides with different content
    Modified,
    /// Entry exists on both sides with the same content
    Identical,
    /// File relocated without content changes
    Moved,
    /// File relocated and changed
    MovedModified,
}

impl DiffStatus {
    pub const ALL: [DiffStatus; 6] = [
        DiffStatus::Added,
        DiffStatus::Removed,
        DiffStatus::Modified,
        DiffStatus::Identical,
        DiffStatus::Moved,
        DiffStatus::MovedModified,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DiffStatus::Added => "ADDED",
            DiffStatus::Removed => "REMOVED",
            DiffStatus::Modified => "MODIFIED",
            DiffStatus::Identical => "IDENTICAL",
            DiffStatus::Moved => "MOVED",
            DiffStatus::MovedModified => "MOVED_MODIFIED",
        }
    }

    /// Whether the entry was paired with a removed counterpart elsewhere in the tree
    pub fn is_moved(self) -> bool {
        match self {
            DiffStatus::Moved | DiffStatus::MovedModified => true,
            DiffStatus::Added
            | DiffStatus::Removed
            | DiffStatus::Modified
            | DiffStatus::Identical => false,
        }
    }
}

impl fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DiffStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiffStatus::ALL
            .iter()
            .copied()
            .find(|status| status.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown status '{}'", s))
    }
}

/// Status of a single line in a file diff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineStatus {
    Added,
    Removed,
    Modified,
    Identical,
}

/// One position-aligned row of a file diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiffLine {
    pub left: Option<String>,
    pub right: Option<String>,
    pub status: LineStatus,
}

/// Line-level diff of two optional file contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDiff {
    pub lines: Vec<FileDiffLine>,
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub percentage: f64,
}

impl FileDiff {
    pub fn empty() -> Self {
        Self {
            lines: Vec::new(),
            added: 0,
            removed: 0,
            modified: 0,
            percentage: 0.0,
        }
    }

    /// Summary counts without the per-line detail
    pub fn stats(&self) -> LineStats {
        LineStats {
            added: self.added,
            removed: self.removed,
            modified: self.modified,
            percentage: self.percentage,
        }
    }
}

/// Aggregated line counts carried by file nodes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LineStats {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub percentage: f64,
}

/// Flattened projection of a tree node for tabular consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffEntry {
    /// Slash-joined chain of names starting at the root node
    pub path: String,
    pub is_directory: bool,
    pub status: DiffStatus,
    /// Slash-joined chain of names excluding the root (empty for the root)
    pub relative_path: String,
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub percentage: f64,
    pub source_path: Option<String>,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Ignore-list file, one glob pattern per line
    #[serde(default)]
    pub ignore_file: Option<PathBuf>,

    /// Patterns applied in addition to the ignore-list file (or its defaults)
    #[serde(default)]
    pub extra_ignore_patterns: Vec<String>,

    /// Pair added and removed files into moves after the tree is built
    #[serde(default = "default_detect_moves")]
    pub detect_moves: bool,

    /// Additional namespace extractors, applied after the built-in ones
    #[serde(default)]
    pub namespace_rules: Vec<NamespaceRule>,
}

/// Regex-based namespace extractor for the given file extensions.
///
/// The first capture group of the first matching line is the namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceRule {
    pub extensions: Vec<String>,
    pub pattern: String,
}

fn default_detect_moves() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ignore_file: None,
            extra_ignore_patterns: Vec::new(),
            detect_moves: default_detect_moves(),
            namespace_rules: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_case_insensitive() {
        assert_eq!("moved_modified".parse::<DiffStatus>(), Ok(DiffStatus::MovedModified));
        assert_eq!("ADDED".parse::<DiffStatus>(), Ok(DiffStatus::Added));
        assert!("renamed".parse::<DiffStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_upper_snake() {
        let json = serde_json::to_string(&DiffStatus::MovedModified).unwrap();
        assert_eq!(json, "\"MOVED_MODIFIED\"");
    }

    #[test]
    fn test_config_defaults_from_empty_toml() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(config.detect_moves);
        assert!(config.ignore_file.is_none());
        assert!(config.extra_ignore_patterns.is_empty());
        assert!(config.namespace_rules.is_empty());
    }

    #[test]
    fn test_config_namespace_rules_from_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            detect_moves = false

            [[namespace_rules]]
            extensions = ["proto"]
            pattern = '^package\s+([\w.]+);'
            "#,
        )
        .unwrap();
        assert!(!config.detect_moves);
        assert_eq!(config.namespace_rules.len(), 1);
        assert_eq!(config.namespace_rules[0].extensions, vec!["proto".to_string()]);
    }
}
