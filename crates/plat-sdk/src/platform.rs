use std::fmt;
use std::thread;
use std::time::Duration;

use plat_fs::{make_dir_path, DirOps, LocalFs, NormalizerKind, PathNormalizer};
use plat_net::{resolve_host_by_name, HostLookup, HostRecord, StaticLookup, SystemLookup};
use plat_registry::{
    read_config_value, write_config_value, FileRegistry, InMemoryRegistry, RegistryBackend,
};
use tracing::info;

use crate::config::{PlatformConfig, RegistryConfig, ResolverConfig};
use crate::error::{SdkError, SdkResult};

/// One handle over every platform service.
///
/// Built from a [`PlatformConfig`]; individual services can be swapped with
/// the `with_*` methods.
pub struct Platform {
    normalizer: Box<dyn PathNormalizer>,
    dirs: Box<dyn DirOps>,
    resolver: Box<dyn HostLookup>,
    registry: Box<dyn RegistryBackend>,
    path_capacity: usize,
    max_value_size: usize,
}

impl Platform {
    pub fn from_config(config: &PlatformConfig) -> SdkResult<Self> {
        config.validate()?;

        let registry: Box<dyn RegistryBackend> = match &config.registry {
            RegistryConfig::Memory => Box::new(InMemoryRegistry::new()),
            RegistryConfig::File { path } => {
                Box::new(FileRegistry::open(path).map_err(|source| SdkError::RegistryOpen {
                    path: path.clone(),
                    source,
                })?)
            }
            RegistryConfig::System => system_registry()?,
        };
        let resolver: Box<dyn HostLookup> = match &config.resolver {
            ResolverConfig::System => Box::new(SystemLookup),
            ResolverConfig::Static { hosts } => {
                Box::new(StaticLookup::from_fixtures(hosts.iter().cloned()))
            }
        };

        let platform = Self {
            normalizer: config.normalizer.build(),
            dirs: Box::new(LocalFs),
            resolver,
            registry,
            path_capacity: config.path_capacity,
            max_value_size: config.max_value_size,
        };
        info!(
            normalizer = ?platform.normalizer.kind(),
            registry = ?config.registry,
            "platform initialized"
        );
        Ok(platform)
    }

    pub fn with_dirs(mut self, dirs: impl DirOps + 'static) -> Self {
        self.dirs = Box::new(dirs);
        self
    }

    pub fn with_resolver(mut self, resolver: impl HostLookup + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn with_registry(mut self, registry: impl RegistryBackend + 'static) -> Self {
        self.registry = Box::new(registry);
        self
    }

    pub fn normalizer_kind(&self) -> NormalizerKind {
        self.normalizer.kind()
    }

    /// Normalize `path` into the configured path capacity.
    pub fn full_path(&self, path: &str) -> SdkResult<String> {
        self.full_path_within(path, self.path_capacity)
    }

    /// Normalize `path` into at most `capacity - 1` bytes.
    pub fn full_path_within(&self, path: &str, capacity: usize) -> SdkResult<String> {
        Ok(self.normalizer.normalize(path, capacity)?)
    }

    /// Create every missing directory along `path`.
    pub fn make_dir_path(&self, path: &str) -> SdkResult<()> {
        Ok(make_dir_path(self.dirs.as_ref(), path)?)
    }

    /// Resolve `name` to an owned host record; `None` if it does not resolve.
    pub fn resolve_host(&self, name: &str) -> Option<HostRecord> {
        resolve_host_by_name(self.resolver.as_ref(), name)
    }

    /// Read a string value no larger than the configured maximum.
    pub fn read_config(&self, key_path: &str, name: &str) -> SdkResult<String> {
        self.read_config_within(self.max_value_size, key_path, name)
    }

    pub fn read_config_within(&self, max: usize, key_path: &str, name: &str) -> SdkResult<String> {
        Ok(read_config_value(self.registry.as_ref(), max, key_path, name)?)
    }

    /// Write a string value, or create the key when `name` is `None`.
    pub fn write_config(&self, key_path: &str, name: Option<&str>, value: &str) -> SdkResult<()> {
        Ok(write_config_value(self.registry.as_ref(), key_path, name, value)?)
    }

    /// Block the calling thread for `ms` milliseconds.
    pub fn sleep(&self, ms: u64) {
        thread::sleep(Duration::from_millis(ms));
    }
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform")
            .field("normalizer", &self.normalizer.kind())
            .field("path_capacity", &self.path_capacity)
            .field("max_value_size", &self.max_value_size)
            .finish_non_exhaustive()
    }
}

#[cfg(windows)]
fn system_registry() -> SdkResult<Box<dyn RegistryBackend>> {
    Ok(Box::new(plat_registry::WindowsRegistry))
}

#[cfg(not(windows))]
fn system_registry() -> SdkResult<Box<dyn RegistryBackend>> {
    Err(SdkError::Unsupported(
        "the system registry exists only on Windows".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use plat_fs::MemoryFs;
    use plat_net::HostFixture;
    use plat_types::ErrorCode;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Arc;
    use std::time::Instant;

    fn memory_platform() -> Platform {
        let config = PlatformConfig {
            registry: RegistryConfig::Memory,
            resolver: ResolverConfig::Static {
                hosts: vec![HostFixture::new("db.internal")
                    .with_address(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)))
                    .with_alias("db")],
            },
            ..PlatformConfig::default()
        };
        Platform::from_config(&config).unwrap()
    }

    #[test]
    fn config_round_trip_through_the_store() {
        let platform = memory_platform();
        platform.write_config("HKEY_CURRENT_USER\\Acme", None, "").unwrap();
        platform
            .write_config("HKEY_CURRENT_USER\\Acme", Some("Home"), "/srv/acme")
            .unwrap();
        assert_eq!(
            platform.read_config("HKEY_CURRENT_USER\\Acme", "Home").unwrap(),
            "/srv/acme"
        );

        let err = platform
            .read_config_within(4, "HKEY_CURRENT_USER\\Acme", "Home")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::WontFit);
    }

    #[test]
    fn resolves_from_the_static_table() {
        let platform = memory_platform();
        let record = platform.resolve_host("DB").unwrap();
        assert_eq!(record.name, "db.internal");
        assert_eq!(record.first_addr(), Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5))));
        assert!(platform.resolve_host("nowhere").is_none());
    }

    #[test]
    fn builds_directories_through_the_configured_ops() {
        let fs = Arc::new(MemoryFs::new());
        let platform = memory_platform().with_dirs(Arc::clone(&fs));
        platform.make_dir_path("/var/lib/acme").unwrap();
        assert_eq!(fs.created(), vec!["/var", "/var/lib", "/var/lib/acme"]);

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a/b/c");
        let platform = memory_platform();
        platform.make_dir_path(target.to_str().unwrap()).unwrap();
        assert!(target.is_dir());
    }

    #[test]
    fn full_path_honours_capacity() {
        let platform = memory_platform();
        let path = platform.full_path("/tmp/acme").unwrap();
        assert!(path.ends_with("tmp/acme"), "{path}");

        let err = platform.full_path_within("", 16).unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadArgs);
    }

    #[test]
    fn file_registry_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        let config = PlatformConfig {
            registry: RegistryConfig::File { path: path.clone() },
            ..PlatformConfig::default()
        };

        let platform = Platform::from_config(&config).unwrap();
        platform.write_config("HKEY_LOCAL_MACHINE\\Acme", None, "").unwrap();
        platform
            .write_config("HKEY_LOCAL_MACHINE\\Acme", Some("Port"), "8080")
            .unwrap();
        drop(platform);

        let reopened = Platform::from_config(&config).unwrap();
        assert_eq!(
            reopened.read_config("HKEY_LOCAL_MACHINE\\Acme", "port").unwrap(),
            "8080"
        );
    }

    #[test]
    fn swapped_registry_is_used() {
        let store = InMemoryRegistry::new();
        store
            .seed("HKEY_USERS\\Default", "Lang", plat_registry::ValueType::String, b"en\0")
            .unwrap();
        let platform = memory_platform().with_registry(store);
        assert_eq!(platform.read_config("HKEY_USERS\\Default", "Lang").unwrap(), "en");
    }

    #[cfg(not(windows))]
    #[test]
    fn system_registry_is_unsupported_off_windows() {
        let config = PlatformConfig {
            registry: RegistryConfig::System,
            ..PlatformConfig::default()
        };
        let err = Platform::from_config(&config).unwrap_err();
        assert!(matches!(err, SdkError::Unsupported(_)));
    }

    #[test]
    fn sleep_blocks_at_least_the_requested_time() {
        let platform = memory_platform();
        let start = Instant::now();
        platform.sleep(20);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
