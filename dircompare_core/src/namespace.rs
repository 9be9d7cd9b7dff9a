use dircompare_common::{DirCompareError, NamespaceRule};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

/// Extracts the declared namespace (package, module path) from a source file
pub trait NamespaceExtractor: Send + Sync {
    /// Lower-case file extensions this extractor understands
    fn extensions(&self) -> &[String];

    fn extract(&self, content: &str) -> Option<String>;
}

/// `<keyword> a.b.c` declarations such as Java's `package` or C#'s `namespace`
#[derive(Debug, Clone)]
pub struct KeywordDeclaration {
    keyword: String,
    extensions: Vec<String>,
}

impl KeywordDeclaration {
    pub fn new(keyword: &str, extensions: &[&str]) -> Self {
        Self {
            keyword: keyword.to_string(),
            extensions: extensions.iter().map(|e| e.to_ascii_lowercase()).collect(),
        }
    }

    fn declaration<'a>(&self, line: &'a str) -> Option<&'a str> {
        let rest = line.strip_prefix(self.keyword.as_str())?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let rest = rest.trim_start();
        let end = rest
            .find(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '.' | '\\')))
            .unwrap_or(rest.len());
        let token = &rest[..end];
        (!token.is_empty()).then_some(token)
    }
}

impl NamespaceExtractor for KeywordDeclaration {
    fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Only the file header is searched: the declaration must come before
    /// any line other than imports, annotations and similar preamble.
    fn extract(&self, content: &str) -> Option<String> {
        for line in code_lines(content) {
            if let Some(token) = self.declaration(line) {
                return Some(token.to_string());
            }
            if !is_preamble(line) {
                return None;
            }
        }
        None
    }
}

/// Header lines that may precede a namespace declaration
fn is_preamble(line: &str) -> bool {
    line.starts_with('@')
        || line.starts_with("<?php")
        || line.starts_with("declare(")
        || ["import", "using"].iter().any(|keyword| {
            line.strip_prefix(keyword)
                .map_or(false, |rest| rest.starts_with(char::is_whitespace))
        })
}

/// User-configured extractor; the first capture group is the namespace
#[derive(Debug, Clone)]
pub struct RegexExtractor {
    pattern: Regex,
    extensions: Vec<String>,
}

impl RegexExtractor {
    pub fn new(pattern: &str, extensions: &[String]) -> Result<Self, DirCompareError> {
        let pattern = Regex::new(pattern)
            .map_err(|e| DirCompareError::Pattern(format!("{}: {}", pattern, e)))?;
        Ok(Self {
            pattern,
            extensions: extensions.iter().map(|e| e.to_ascii_lowercase()).collect(),
        })
    }

    pub fn from_rule(rule: &NamespaceRule) -> Result<Self, DirCompareError> {
        Self::new(&rule.pattern, &rule.extensions)
    }
}

impl NamespaceExtractor for RegexExtractor {
    fn extensions(&self) -> &[String] {
        &self.extensions
    }

    fn extract(&self, content: &str) -> Option<String> {
        code_lines(content).find_map(|line| {
            self.pattern
                .captures(line)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        })
    }
}

/// Trimmed lines outside `//` and `/* */` comments
fn code_lines(content: &str) -> impl Iterator<Item = &str> {
    let mut in_block = false;
    content.lines().filter_map(move |line| {
        let mut line = line.trim();
        if in_block {
            let end = line.find("*/")?;
            in_block = false;
            line = line[end + 2..].trim_start();
        }
        if let Some(rest) = line.strip_prefix("/*") {
            match rest.find("*/") {
                Some(end) => line = rest[end + 2..].trim_start(),
                None => {
                    in_block = true;
                    return None;
                }
            }
        }
        if line.is_empty() || line.starts_with("//") {
            None
        } else {
            Some(line)
        }
    })
}

/// Extension-keyed set of namespace extractors
pub struct NamespaceRegistry {
    extractors: Vec<Box<dyn NamespaceExtractor>>,
    by_extension: HashMap<String, usize>,
}

impl NamespaceRegistry {
    pub fn empty() -> Self {
        Self {
            extractors: Vec::new(),
            by_extension: HashMap::new(),
        }
    }

    /// Built-in extractors followed by the configured rules
    pub fn with_rules(rules: &[NamespaceRule]) -> Result<Self, DirCompareError> {
        let mut registry = Self::default();
        for rule in rules {
            registry.register(Box::new(RegexExtractor::from_rule(rule)?));
        }
        Ok(registry)
    }

    /// Later registrations take over the extensions they declare
    pub fn register(&mut self, extractor: Box<dyn NamespaceExtractor>) {
        let index = self.extractors.len();
        for ext in extractor.extensions() {
            self.by_extension.insert(ext.clone(), index);
        }
        self.extractors.push(extractor);
    }

    pub fn extractor_for(&self, file_name: &str) -> Option<&dyn NamespaceExtractor> {
        let ext = Path::new(file_name).extension()?.to_string_lossy().to_ascii_lowercase();
        let index = *self.by_extension.get(&ext)?;
        Some(self.extractors[index].as_ref())
    }

    /// Whether the file type declares a namespace worth comparing
    pub fn is_structured(&self, file_name: &str) -> bool {
        self.extractor_for(file_name).is_some()
    }

    pub fn namespace_of(&self, file_name: &str, content: &str) -> Option<String> {
        self.extractor_for(file_name)?.extract(content)
    }
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(KeywordDeclaration::new(
            "package",
            &["java", "kt", "kts", "scala", "groovy", "go"],
        )));
        registry.register(Box::new(KeywordDeclaration::new("namespace", &["cs", "php"])));
        registry
    }
}
