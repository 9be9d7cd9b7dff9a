use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirCompareError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path error: {0}")]
    Path(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid pattern: {0}")]
    Pattern(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Export error: {0}")]
    Export(String),
}

impl DirCompareError {
    /// True for I/O failures caused by a path that no longer exists
    pub fn is_not_found(&self) -> bool {
        matches!(self, DirCompareError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, DirCompareError>;
