use crate::{AppConfig, DirCompareError};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "dircompare.toml";

/// Ignore-list file looked up in the working directory when none is configured
pub const DEFAULT_IGNORE_FILE: &str = ".dircompare-ignore";

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: PathBuf,
    pub exists: bool,
}

/// Read `dircompare.toml`, falling back to defaults when the file is absent
pub fn load_config() -> Result<LoadedConfig, DirCompareError> {
    let path = resolve_config_path()?;
    let exists = path.exists();

    let config = if exists {
        load_config_from(&path)?
    } else {
        AppConfig::default()
    };

    Ok(LoadedConfig {
        config,
        path,
        exists,
    })
}

pub fn load_config_from(path: &Path) -> Result<AppConfig, DirCompareError> {
    let data = fs::read_to_string(path)?;
    toml::from_str(&data).map_err(|e| DirCompareError::Serialization(e.to_string()))
}

impl AppConfig {
    /// Ignore-list file to read, falling back to the working-directory default
    pub fn ignore_file_path(&self) -> PathBuf {
        self.ignore_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_IGNORE_FILE))
    }
}

/// A config file next to the executable takes precedence over the user config dir
fn resolve_config_path() -> Result<PathBuf, DirCompareError> {
    if let Some(portable_path) = portable_config_path().filter(|p| p.exists()) {
        return Ok(portable_path);
    }

    let dirs = ProjectDirs::from("", "aecs4u", "dircompare")
        .ok_or_else(|| DirCompareError::Config("Unable to determine config directory".to_string()))?;
    Ok(dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn portable_config_path() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
}
