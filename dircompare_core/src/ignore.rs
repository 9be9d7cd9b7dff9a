use dircompare_common::AppConfig;
use glob::{MatchOptions, Pattern};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Patterns used when no ignore-list file can be read
pub const DEFAULT_IGNORE_PATTERNS: [&str; 4] = ["target", ".git", "build", "node_modules"];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct CompiledPattern {
    pattern: Pattern,
    /// Root-anchored patterns only match the full path, never a bare name
    anchored: bool,
}

/// Decides whether a filesystem entry is excluded from comparison
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    matchers: Vec<CompiledPattern>,
}

impl IgnoreMatcher {
    pub fn from_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut matcher = Self { matchers: Vec::new() };
        matcher.extend(patterns);
        matcher
    }

    pub fn defaults() -> Self {
        Self::from_patterns(DEFAULT_IGNORE_PATTERNS)
    }

    /// Load patterns from an ignore-list file, one per line.
    ///
    /// A missing or unreadable file yields the default pattern set.
    pub fn from_file(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => {
                let patterns = parse_ignore_source(&content);
                debug!("Loaded {} ignore patterns from {:?}", patterns.len(), path);
                Self::from_patterns(patterns)
            }
            Err(e) => {
                debug!("Using default ignore patterns ({:?}: {})", path, e);
                Self::defaults()
            }
        }
    }

    /// Ignore-list file from the config, followed by its extra patterns
    pub fn from_config(config: &AppConfig) -> Self {
        let mut matcher = Self::from_file(&config.ignore_file_path());
        matcher.extend(&config.extra_ignore_patterns);
        matcher
    }

    pub fn extend<I, S>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.add_pattern(pattern.as_ref());
        }
    }

    fn add_pattern(&mut self, raw: &str) {
        let raw = raw.trim();
        if raw.is_empty() {
            return;
        }

        let is_bare_name = !raw.contains(['/', '*', '?']);
        let variants: Vec<(String, bool)> = if is_bare_name {
            vec![(format!("**/{}", raw), false), (raw.to_string(), false)]
        } else if raw.starts_with("**/") {
            vec![(raw.to_string(), false)]
        } else if let Some(rooted) = raw.strip_prefix('/') {
            vec![(rooted.to_string(), true)]
        } else {
            vec![(format!("**/{}", raw), false), (raw.to_string(), false)]
        };

        for (glob, anchored) in variants {
            match Pattern::new(&glob) {
                Ok(pattern) => self.matchers.push(CompiledPattern { pattern, anchored }),
                Err(e) => warn!("Skipping invalid ignore pattern '{}': {}", raw, e),
            }
        }
    }

    /// True if any pattern matches the full path or the bare file name
    pub fn is_ignored(&self, path: &Path) -> bool {
        let full = slash_path(path);
        let name = path.file_name().map(|n| n.to_string_lossy());

        self.matchers.iter().any(|m| {
            m.pattern.matches_with(&full, MATCH_OPTIONS)
                || (!m.anchored
                    && name
                        .as_deref()
                        .map_or(false, |n| m.pattern.matches_with(n, MATCH_OPTIONS)))
        })
    }

    /// Number of compiled matchers
    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

impl Default for IgnoreMatcher {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Pattern lines of an ignore-list source: blanks and `#` comments dropped
pub fn parse_ignore_source(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
        .replacen("//", "/", 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_ignore_build_dirs_at_any_depth() {
        let matcher = IgnoreMatcher::defaults();
        assert!(matcher.is_ignored(Path::new("target")));
        assert!(matcher.is_ignored(Path::new("module/target")));
        assert!(matcher.is_ignored(Path::new("a/b/node_modules")));
        assert!(matcher.is_ignored(Path::new(".git")));
        assert!(!matcher.is_ignored(Path::new("src/targets.rs")));
        assert!(!matcher.is_ignored(Path::new("valid.txt")));
    }

    #[test]
    fn test_bare_name_compiles_two_matchers() {
        let matcher = IgnoreMatcher::from_patterns(["dist"]);
        assert_eq!(matcher.len(), 2);
    }

    #[test]
    fn test_extension_glob_matches_any_depth() {
        let matcher = IgnoreMatcher::from_patterns(["*.class"]);
        assert!(matcher.is_ignored(Path::new("Test.class")));
        assert!(matcher.is_ignored(Path::new("com/example/Test.class")));
        assert!(!matcher.is_ignored(Path::new("com/example/Test.java")));
    }

    #[test]
    fn test_relative_glob_with_separator() {
        let matcher = IgnoreMatcher::from_patterns(["docs/*.md"]);
        assert!(matcher.is_ignored(Path::new("docs/readme.md")));
        assert!(matcher.is_ignored(Path::new("module/docs/readme.md")));
        assert!(!matcher.is_ignored(Path::new("docs/api/readme.md")));
    }

    #[test]
    fn test_root_anchored_pattern() {
        let matcher = IgnoreMatcher::from_patterns(["/config.toml"]);
        assert!(matcher.is_ignored(Path::new("config.toml")));
        assert!(!matcher.is_ignored(Path::new("sub/config.toml")));
    }

    #[test]
    fn test_from_file_skips_comments_and_blanks() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".dircompare-ignore");
        fs::write(&path, "# compiled output\n\n*.class\n  .DS_Store  \n").unwrap();

        let matcher = IgnoreMatcher::from_file(&path);
        assert!(matcher.is_ignored(Path::new("a/b/C.class")));
        assert!(matcher.is_ignored(Path::new(".DS_Store")));
        // Defaults are replaced, not merged
        assert!(!matcher.is_ignored(Path::new("target")));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        let matcher = IgnoreMatcher::from_file(&temp.path().join("absent"));
        assert!(matcher.is_ignored(Path::new("target")));
        assert_eq!(matcher.len(), DEFAULT_IGNORE_PATTERNS.len() * 2);
    }

    #[test]
    fn test_from_config_appends_extra_patterns() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig {
            ignore_file: Some(temp.path().join("absent")),
            extra_ignore_patterns: vec!["*.log".to_string()],
            detect_moves: true,
            namespace_rules: Vec::new(),
        };

        let matcher = IgnoreMatcher::from_config(&config);
        assert!(matcher.is_ignored(Path::new("build")));
        assert!(matcher.is_ignored(Path::new("logs/app.log")));
    }

    #[test]
    fn test_parse_ignore_source() {
        let patterns = parse_ignore_source("# header\ntarget\n\n  *.tmp \n#x\n");
        assert_eq!(patterns, vec!["target".to_string(), "*.tmp".to_string()]);
    }
}
