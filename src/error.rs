use std::path::PathBuf;
use thiserror::Error;

use crate::graph::UserId;

#[derive(Debug, Error)]
pub enum SocialMapError {
    #[error("I/O error: {source} (path: {path})")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("malformed contact list {path}: {source}")]
    Parse {
        source: serde_json::Error,
        path: PathBuf,
    },

    #[error("file name does not start with a user id: {path}")]
    OwnerId { path: PathBuf },

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("user #{0} is not in the graph")]
    UnknownUser(UserId),

    #[error("csv output failed: {0}")]
    Render(#[from] csv::Error),

    #[error("output failed: {0}")]
    Output(#[source] std::io::Error),
}

impl SocialMapError {
    /// Errors tied to a single input file, which `--keep-going` may skip.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            SocialMapError::Io { .. } | SocialMapError::Parse { .. } | SocialMapError::OwnerId { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SocialMapError>;
