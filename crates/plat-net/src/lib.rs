//! Hostname resolution for the platform layer.
//!
//! The classic `gethostbyname` primitive is not reentrant: it returns a
//! pointer into a process-wide static buffer that the next call overwrites.
//! [`resolve_host_by_name`] serializes every call through one process-wide
//! lock and deep-copies the result into an owned [`HostRecord`] before the
//! lock is released, so callers never see primitive-owned memory.
//!
//! # Modules
//!
//! - [`record`]: [`HostRecord`], [`AddressFamily`], the [`RawHostEntry`] view
//! - [`resolver`]: [`HostLookup`], [`LookupGuard`], [`resolve_host_by_name`]
//! - [`system`]: [`SystemLookup`] over the host resolver
//! - [`fixture`]: [`StaticLookup`] over a fixed host table
//! - [`addr`]: bounded address formatting

pub mod addr;
pub mod fixture;
pub mod record;
pub mod resolver;
pub mod system;

pub use addr::inet_to_string;
pub use fixture::{HostFixture, StaticLookup};
pub use record::{AddressFamily, HostRecord, RawHostEntry};
pub use resolver::{resolve_host_by_name, HostLookup, LookupGuard};
pub use system::SystemLookup;
