use dircompare_common::{DiffEntry, DiffStatus, DirCompareError};
use std::io::Write;
use std::str::FromStr;

pub const CSV_HEADER: &str = "Destination Path,Source Path,Type,Status,Diff %,Added,Modified,Deleted";

/// Entry kind derived from the directory flag and file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    Java,
    Xml,
    Json,
    Yaml,
    Props,
    File,
}

impl EntryKind {
    pub fn of(entry: &DiffEntry) -> Self {
        if entry.is_directory {
            return EntryKind::Directory;
        }
        let path = entry.path.as_str();
        if path.ends_with(".java") {
            EntryKind::Java
        } else if path.ends_with(".xml") {
            EntryKind::Xml
        } else if path.ends_with(".json") {
            EntryKind::Json
        } else if path.ends_with(".yaml") || path.ends_with(".yml") {
            EntryKind::Yaml
        } else if path.ends_with(".properties") {
            EntryKind::Props
        } else {
            EntryKind::File
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EntryKind::Directory => "directory",
            EntryKind::Java => "java",
            EntryKind::Xml => "xml",
            EntryKind::Json => "json",
            EntryKind::Yaml => "yaml",
            EntryKind::Props => "props",
            EntryKind::File => "file",
        }
    }
}

impl FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            EntryKind::Directory,
            EntryKind::Java,
            EntryKind::Xml,
            EntryKind::Json,
            EntryKind::Yaml,
            EntryKind::Props,
            EntryKind::File,
        ]
        .into_iter()
        .find(|kind| kind.name().eq_ignore_ascii_case(s))
        .ok_or_else(|| format!("unknown type '{}'", s))
    }
}

/// `all` or a single value to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter<T> {
    All,
    Only(T),
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Filter::All
    }
}

impl<T: PartialEq> Filter<T> {
    pub fn accepts(&self, value: T) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(wanted) => *wanted == value,
        }
    }
}

impl<T: FromStr<Err = String>> FromStr for Filter<T> {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(Filter::All)
        } else {
            s.parse().map(Filter::Only)
        }
    }
}

/// Row selection applied before export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportFilter {
    pub kind: Filter<EntryKind>,
    pub status: Filter<DiffStatus>,
}

impl ExportFilter {
    pub fn matches(&self, entry: &DiffEntry) -> bool {
        self.kind.accepts(EntryKind::of(entry)) && self.status.accepts(entry.status)
    }
}

/// Directories and pure moves carry no line statistics worth showing
pub fn hides_stats(entry: &DiffEntry) -> bool {
    entry.is_directory
        || match entry.status {
            DiffStatus::Moved => true,
            DiffStatus::Added
            | DiffStatus::Removed
            | DiffStatus::Modified
            | DiffStatus::Identical
            | DiffStatus::MovedModified => false,
        }
}

/// Tabular row for one entry: destination, source, type, status, diff %,
/// added, modified, deleted
pub fn export_row(entry: &DiffEntry) -> [String; 8] {
    let hide_stats = hides_stats(entry);

    let stat = |value: usize| {
        if hide_stats {
            "-".to_string()
        } else {
            value.to_string()
        }
    };
    let percentage = if hide_stats {
        "-".to_string()
    } else {
        format!("{:.1}%", entry.percentage)
    };

    [
        entry.path.clone(),
        entry.source_path.clone().unwrap_or_default(),
        if entry.is_directory { "Directory" } else { "File" }.to_string(),
        entry.status.name().to_string(),
        percentage,
        stat(entry.added),
        stat(entry.modified),
        stat(entry.removed),
    ]
}

/// Write matching entries as CSV with every field quoted; returns the row count
pub fn export_csv<W: Write>(
    entries: &[DiffEntry],
    filter: &ExportFilter,
    mut writer: W,
) -> Result<usize, DirCompareError> {
    writeln!(writer, "{}", CSV_HEADER)?;

    let mut csv_writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    let mut rows = 0;
    for entry in entries.iter().filter(|e| filter.matches(e)) {
        csv_writer
            .write_record(export_row(entry))
            .map_err(|e| DirCompareError::Export(e.to_string()))?;
        rows += 1;
    }
    csv_writer
        .flush()
        .map_err(|e| DirCompareError::Export(e.to_string()))?;
    Ok(rows)
}
