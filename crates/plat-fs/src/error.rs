//! Error types for filesystem operations.

use std::io;

use plat_types::ErrorCode;
use thiserror::Error;

/// Errors that can occur during path normalization or directory creation.
#[derive(Debug, Error)]
pub enum FsError {
    /// A required argument was empty or out of range.
    #[error("bad arguments: {0}")]
    BadArgs(String),

    /// The path does not fit in the caller's output capacity.
    #[error("path of {len} bytes does not fit in a {capacity}-byte buffer")]
    Overflow { len: usize, capacity: usize },

    /// The path could not be made absolute.
    #[error("cannot resolve {path}: {source}")]
    Resolve {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A directory level could not be created.
    #[error("cannot create directory {path}: {source}")]
    CantCreate {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl FsError {
    /// The shared status code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::BadArgs(_) | Self::Overflow { .. } => ErrorCode::BadArgs,
            Self::Resolve { .. } => ErrorCode::CantAccess,
            Self::CantCreate { .. } => ErrorCode::CantCreate,
        }
    }
}

/// Convenience type alias for filesystem operations.
pub type FsResult<T> = std::result::Result<T, FsError>;
