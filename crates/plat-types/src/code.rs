use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Symbolic status code shared by every platform operation.
///
/// Crate-level error enums map each variant onto one of these codes so that
/// callers can branch on the category without matching on crate internals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A required argument was empty or out of range.
    BadArgs,
    /// A directory or key could not be created.
    CantCreate,
    /// A key could not be opened, or the hive could not be resolved.
    CantAccess,
    /// A value query, retrieval or store failed.
    CantRead,
    /// The stored value is not string-compatible.
    BadType,
    /// The stored value is larger than the caller accepts.
    WontFit,
}

impl ErrorCode {
    /// All codes, in declaration order.
    pub const ALL: [ErrorCode; 6] = [
        Self::BadArgs,
        Self::CantCreate,
        Self::CantAccess,
        Self::CantRead,
        Self::BadType,
        Self::WontFit,
    ];

    /// The symbolic name, e.g. `"WONT_FIT"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadArgs => "BAD_ARGS",
            Self::CantCreate => "CANT_CREATE",
            Self::CantAccess => "CANT_ACCESS",
            Self::CantRead => "CANT_READ",
            Self::BadType => "BAD_TYPE",
            Self::WontFit => "WONT_FIT",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing a symbolic name that is not a known [`ErrorCode`].
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown error code: {0}")]
pub struct UnknownErrorCode(pub String);

impl FromStr for ErrorCode {
    type Err = UnknownErrorCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|code| code.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownErrorCode(s.to_string()))
    }
}
