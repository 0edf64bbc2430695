//! Hierarchical configuration store access for the platform layer.
//!
//! The store follows the Windows registry model: a fixed set of top-level
//! [`Hive`]s, nested keys below them, and named values on each key. Callers
//! address a key with a *logical key path* such as
//! `HKEY_LOCAL_MACHINE\Software\Acme\Server`.
//!
//! # Architecture
//!
//! - [`resolve_hive`] splits a logical key path into its hive and the subkey
//!   remainder. The remainder borrows the input.
//! - [`RegistryBackend`] is the OS-abstraction of the registry primitives
//!   (open, query, read, set, create, close). Every handle the accessor opens
//!   is wrapped so that it is closed on every exit path.
//! - [`read_config_value`] and [`write_config_value`] are the two public
//!   operations; all failures map onto [`plat_types::ErrorCode`].
//!
//! Concurrent callers writing the same key get whatever ordering the backend
//! provides; no additional locking happens here.
//!
//! # Backends
//!
//! - [`InMemoryRegistry`]: `RwLock`-guarded tree for tests and embedding
//! - [`FileRegistry`]: the in-memory tree persisted as a JSON document
//! - `WindowsRegistry`: the native registry (Windows only)
//!
//! # Modules
//!
//! - [`error`]: [`RegistryError`] and its error-code mapping
//! - [`hive`]: [`Hive`] and logical key path parsing
//! - [`value`]: [`ValueType`]
//! - [`backend`]: [`RegistryBackend`], [`KeyHandle`], [`KeyAccess`]
//! - [`accessor`]: the read/write operations

pub mod accessor;
pub mod backend;
pub mod error;
pub mod file;
pub mod hive;
pub mod memory;
pub mod value;
#[cfg(windows)]
pub mod windows;

pub use accessor::{read_config_value, write_config_value};
pub use backend::{KeyAccess, KeyHandle, RegistryBackend, ValueInfo, Volatility};
pub use error::{RegistryError, RegistryResult};
pub use file::FileRegistry;
pub use hive::{resolve_hive, Hive, UnknownHive};
pub use memory::{FailPoint, InMemoryRegistry};
pub use value::ValueType;
#[cfg(windows)]
pub use windows::WindowsRegistry;
