//! Extraction errors

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExtractError>;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid UTF-8")]
    Encoding { path: PathBuf },

    #[error("rule directory does not exist: {0}")]
    MissingRoot(PathBuf),

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
}

impl ExtractError {
    /// Whether the error concerns a single file (and the run can go on)
    pub fn is_file_level(&self) -> bool {
        matches!(self, ExtractError::Io { .. } | ExtractError::Encoding { .. } | ExtractError::Walk(_))
    }
}

/// Read a file as UTF-8 text
pub(crate) fn read_utf8(path: &std::path::Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|_| ExtractError::Encoding {
        path: path.to_path_buf(),
    })
}
