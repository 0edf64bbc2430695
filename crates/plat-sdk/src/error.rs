use std::io;
use std::path::PathBuf;

use plat_fs::FsError;
use plat_registry::RegistryError;
use plat_types::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("filesystem error: {0}")]
    Fs(#[from] FsError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("cannot read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("cannot open registry file {path}: {source}")]
    RegistryOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unsupported on this target: {0}")]
    Unsupported(String),
}

impl SdkError {
    /// The status code reported across the platform boundary.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Fs(e) => e.code(),
            Self::Registry(e) => e.code(),
            Self::ConfigRead { .. } => ErrorCode::CantRead,
            Self::ConfigParse(_) | Self::InvalidConfig(_) | Self::Unsupported(_) => {
                ErrorCode::BadArgs
            }
            Self::RegistryOpen { .. } => ErrorCode::CantAccess,
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_errors_keep_their_code() {
        let e: SdkError = FsError::BadArgs("empty".into()).into();
        assert_eq!(e.code(), ErrorCode::BadArgs);

        let e: SdkError = RegistryError::CantAccess {
            key: "HKEY_USERS\\X".into(),
            source: None,
        }
        .into();
        assert_eq!(e.code(), ErrorCode::CantAccess);
        assert!(e.to_string().starts_with("registry error"));
    }

    #[test]
    fn config_read_is_cant_read() {
        let e = SdkError::ConfigRead {
            path: "plat.toml".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(e.code(), ErrorCode::CantRead);
        assert!(e.to_string().contains("plat.toml"));
    }
}
