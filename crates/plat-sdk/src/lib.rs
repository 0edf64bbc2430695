//! # plat-sdk
//!
//! One handle over the platform layer. [`Platform`] owns a path normalizer,
//! the directory primitives, a hostname lookup, and a configuration store,
//! all selected by a [`PlatformConfig`] at startup.
//!
//! ```no_run
//! use plat_sdk::{Platform, PlatformConfig};
//!
//! let platform = Platform::from_config(&PlatformConfig::default())?;
//! platform.make_dir_path("/var/lib/acme/cache")?;
//! let home = platform.full_path("acme")?;
//! if let Some(host) = platform.resolve_host("localhost") {
//!     println!("{home} on {}", host.name);
//! }
//! # Ok::<(), plat_sdk::SdkError>(())
//! ```

pub mod config;
pub mod error;
pub mod platform;

pub use config::{PlatformConfig, RegistryConfig, ResolverConfig};
pub use error::{SdkError, SdkResult};
pub use platform::Platform;

pub use plat_net::HostRecord;
pub use plat_types::ErrorCode;
