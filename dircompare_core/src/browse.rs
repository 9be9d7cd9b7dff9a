use crate::ignore::IgnoreMatcher;
use dircompare_common::DirCompareError;
use directories::UserDirs;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryItem {
    pub name: String,
    pub path: PathBuf,
    pub is_directory: bool,
}

/// Immediate, non-ignored sub-directories of `path` sorted by name.
///
/// Without a path the user's home directory is listed. A path that does not
/// exist or is not a directory lists as empty.
pub fn list_directories(
    path: Option<&Path>,
    matcher: &IgnoreMatcher,
) -> Result<Vec<DirectoryItem>, DirCompareError> {
    let base = match path {
        Some(p) => p.to_path_buf(),
        None => home_dir()?,
    };

    if !base.is_dir() {
        debug!("{:?} is not a directory, nothing to list", base);
        return Ok(Vec::new());
    }

    let mut items = Vec::new();
    for entry in fs::read_dir(&base)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if matcher.is_ignored(Path::new(&name)) {
            continue;
        }
        items.push(DirectoryItem {
            name,
            path,
            is_directory: true,
        });
    }

    items.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(items)
}

fn home_dir() -> Result<PathBuf, DirCompareError> {
    UserDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .ok_or_else(|| DirCompareError::Path("could not determine home directory".to_string()))
}
