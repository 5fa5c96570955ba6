use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpdateError {
    /// Network failure, timeout or a non-success HTTP status
    #[error("transport error: {0}")]
    Transport(String),

    /// Malformed release JSON, cache document or version string
    #[error("parse error: {0}")]
    Parse(String),

    #[error("filesystem error at {}: {source}", .path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unsupported download host or a release without a matching asset
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl UpdateError {
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, UpdateError>;
