//! Startup configuration for a [`Platform`](crate::Platform).
//!
//! ```toml
//! normalizer = "auto"
//! path_capacity = 1024
//! max_value_size = 2048
//!
//! [registry]
//! backend = "file"
//! path = "/var/lib/plat/registry.json"
//!
//! [resolver]
//! backend = "static"
//!
//! [[resolver.hosts]]
//! name = "db.internal"
//! addresses = ["10.0.0.5"]
//! aliases = ["db"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use plat_fs::NormalizerKind;
use plat_net::HostFixture;
use plat_types::{MAX_PATH, MAX_STRING};
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub normalizer: NormalizerKind,
    pub registry: RegistryConfig,
    pub resolver: ResolverConfig,
    /// Output capacity for path normalization, terminator slot included.
    pub path_capacity: usize,
    /// Largest stored value size accepted by configuration reads.
    pub max_value_size: usize,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            normalizer: NormalizerKind::Auto,
            registry: RegistryConfig::default(),
            resolver: ResolverConfig::System,
            path_capacity: MAX_PATH,
            max_value_size: MAX_STRING,
        }
    }
}

impl PlatformConfig {
    pub fn from_toml_str(text: &str) -> SdkResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> SdkResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SdkError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> SdkResult<()> {
        if self.path_capacity == 0 {
            return Err(SdkError::InvalidConfig("path_capacity must be positive".into()));
        }
        if self.max_value_size == 0 {
            return Err(SdkError::InvalidConfig("max_value_size must be positive".into()));
        }
        Ok(())
    }
}

/// Which configuration store backs registry reads and writes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum RegistryConfig {
    /// Process-local, discarded on exit.
    Memory,
    /// JSON document rewritten after every mutation.
    File { path: PathBuf },
    /// The host's native registry. Windows only.
    System,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        if cfg!(windows) {
            Self::System
        } else {
            Self::Memory
        }
    }
}

/// Which hostname lookup backs resolution.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum ResolverConfig {
    #[default]
    System,
    Static {
        #[serde(default)]
        hosts: Vec<HostFixture>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use plat_types::ErrorCode;
    use std::net::IpAddr;

    #[test]
    fn default_config() {
        let c = PlatformConfig::default();
        assert_eq!(c.normalizer, NormalizerKind::Auto);
        assert_eq!(c.resolver, ResolverConfig::System);
        assert_eq!(c.path_capacity, MAX_PATH);
        assert_eq!(c.max_value_size, MAX_STRING);
        if cfg!(windows) {
            assert_eq!(c.registry, RegistryConfig::System);
        } else {
            assert_eq!(c.registry, RegistryConfig::Memory);
        }
    }

    #[test]
    fn empty_document_is_default() {
        let c = PlatformConfig::from_toml_str("").unwrap();
        assert_eq!(c, PlatformConfig::default());
    }

    #[test]
    fn full_document() {
        let c = PlatformConfig::from_toml_str(
            r#"
            normalizer = "passthrough"
            path_capacity = 260
            max_value_size = 512

            [registry]
            backend = "file"
            path = "/var/lib/plat/registry.json"

            [resolver]
            backend = "static"

            [[resolver.hosts]]
            name = "db.internal"
            addresses = ["10.0.0.5"]
            aliases = ["db"]
            "#,
        )
        .unwrap();

        assert_eq!(c.normalizer, NormalizerKind::Passthrough);
        assert_eq!(c.path_capacity, 260);
        assert_eq!(c.max_value_size, 512);
        assert_eq!(
            c.registry,
            RegistryConfig::File { path: "/var/lib/plat/registry.json".into() }
        );
        let ResolverConfig::Static { hosts } = c.resolver else {
            panic!("expected static resolver");
        };
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].addresses, vec!["10.0.0.5".parse::<IpAddr>().unwrap()]);
        assert_eq!(hosts[0].aliases, vec!["db".to_string()]);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = PlatformConfig::from_toml_str("path_capacity = 0").unwrap_err();
        assert!(matches!(err, SdkError::InvalidConfig(_)));
        assert_eq!(err.code(), ErrorCode::BadArgs);
    }

    #[test]
    fn unknown_backend_is_a_parse_error() {
        let err = PlatformConfig::from_toml_str("[registry]\nbackend = \"etcd\"").unwrap_err();
        assert!(matches!(err, SdkError::ConfigParse(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plat.toml");
        fs::write(&path, "[registry]\nbackend = \"memory\"\n").unwrap();
        let c = PlatformConfig::load(&path).unwrap();
        assert_eq!(c.registry, RegistryConfig::Memory);

        let err = PlatformConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CantRead);
    }
}
