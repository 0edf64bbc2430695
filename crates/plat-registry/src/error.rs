//! Error types for configuration store operations.

use std::io;

use plat_types::ErrorCode;
use thiserror::Error;

use crate::value::ValueType;

/// Errors that can occur while reading or writing the configuration store.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A required argument was empty or malformed.
    #[error("bad arguments: {0}")]
    BadArgs(String),

    /// The hive could not be resolved or the key could not be opened or
    /// created.
    #[error("cannot access key {key}")]
    CantAccess {
        key: String,
        #[source]
        source: Option<io::Error>,
    },

    /// Querying, retrieving or storing a value failed.
    #[error("value {name:?} under {key} failed: {source}")]
    CantRead {
        key: String,
        name: String,
        #[source]
        source: io::Error,
    },

    /// The stored value is not a string type.
    #[error("value {name:?} under {key} has type {found}, expected a string")]
    BadType {
        key: String,
        name: String,
        found: ValueType,
    },

    /// The stored value is larger than the caller accepts.
    #[error("value {name:?} under {key} is {size} bytes, over the {max}-byte limit")]
    WontFit {
        key: String,
        name: String,
        size: usize,
        max: usize,
    },
}

impl RegistryError {
    /// The shared status code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::BadArgs(_) => ErrorCode::BadArgs,
            Self::CantAccess { .. } => ErrorCode::CantAccess,
            Self::CantRead { .. } => ErrorCode::CantRead,
            Self::BadType { .. } => ErrorCode::BadType,
            Self::WontFit { .. } => ErrorCode::WontFit,
        }
    }
}

/// Convenience type alias for configuration store operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
