//! Stored value types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The type tag of a stored value, following the registry's type numbering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    None,
    /// NUL-terminated string.
    String,
    /// NUL-terminated string with unexpanded `%VAR%` references.
    ExpandString,
    Binary,
    Dword,
    /// Sequence of NUL-terminated strings, ended by an empty string.
    MultiString,
    Qword,
    /// Any type number this layer does not know.
    Unknown(u32),
}

impl ValueType {
    /// Whether values of this type can be read as a string.
    pub fn is_string(self) -> bool {
        matches!(self, Self::String | Self::ExpandString)
    }

    /// The registry type number.
    pub fn to_raw(self) -> u32 {
        match self {
            Self::None => 0,
            Self::String => 1,
            Self::ExpandString => 2,
            Self::Binary => 3,
            Self::Dword => 4,
            Self::MultiString => 7,
            Self::Qword => 11,
            Self::Unknown(raw) => raw,
        }
    }

    /// Map a registry type number.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::None,
            1 => Self::String,
            2 => Self::ExpandString,
            3 => Self::Binary,
            4 => Self::Dword,
            7 => Self::MultiString,
            11 => Self::Qword,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "REG_NONE"),
            Self::String => write!(f, "REG_SZ"),
            Self::ExpandString => write!(f, "REG_EXPAND_SZ"),
            Self::Binary => write!(f, "REG_BINARY"),
            Self::Dword => write!(f, "REG_DWORD"),
            Self::MultiString => write!(f, "REG_MULTI_SZ"),
            Self::Qword => write!(f, "REG_QWORD"),
            Self::Unknown(raw) => write!(f, "REG_TYPE({raw})"),
        }
    }
}
