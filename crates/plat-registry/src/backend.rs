//! The [`RegistryBackend`] trait: the registry primitives the accessor
//! is built on.
//!
//! Backends report failures as [`io::Error`], the way the native registry
//! reports Win32 error codes. The accessor maps them onto
//! [`RegistryError`](crate::RegistryError) variants.

use std::io;

use crate::hive::Hive;
use crate::value::ValueType;

/// Opaque handle to an open key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyHandle(u64);

impl KeyHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_raw(self) -> u64 {
        self.0
    }
}

/// Rights requested when opening a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAccess {
    /// Query and read values.
    Read,
    /// Everything: read, set, create subkeys.
    AllAccess,
    /// Create subkeys only.
    CreateSubKey,
}

impl KeyAccess {
    pub fn can_read(self) -> bool {
        matches!(self, Self::Read | Self::AllAccess)
    }

    pub fn can_write(self) -> bool {
        matches!(self, Self::AllAccess)
    }

    pub fn can_create(self) -> bool {
        matches!(self, Self::AllAccess | Self::CreateSubKey)
    }
}

/// Storage class of a newly created key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Volatility {
    /// Persisted across restarts.
    #[default]
    NonVolatile,
    /// Discarded when the store is unloaded.
    Volatile,
}

/// Type and size of a stored value, as reported without retrieving it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValueInfo {
    pub kind: ValueType,
    /// Stored size in bytes, terminators included.
    pub size: usize,
}

/// Registry primitives.
///
/// Implementations must be thread-safe (`Send + Sync`). Key and value names
/// are matched case-insensitively. Every handle returned by
/// [`open_key`](Self::open_key) or [`create_key`](Self::create_key) must be
/// released with [`close_key`](Self::close_key) exactly once.
pub trait RegistryBackend: Send + Sync {
    /// Open `subkey` (backslash-separated, possibly empty for the hive root)
    /// under `hive` with the given rights.
    fn open_key(&self, hive: Hive, subkey: &str, access: KeyAccess) -> io::Result<KeyHandle>;

    /// Report the type and size of value `name` without retrieving its data.
    fn query_value(&self, key: KeyHandle, name: &str) -> io::Result<ValueInfo>;

    /// Copy the data of value `name` into `buf`, returning the byte count.
    ///
    /// Fails if `buf` is smaller than the stored size.
    fn read_value(&self, key: KeyHandle, name: &str, buf: &mut [u8]) -> io::Result<usize>;

    /// Store `data` as value `name` of type `kind`, replacing any previous
    /// value.
    fn set_value(&self, key: KeyHandle, name: &str, kind: ValueType, data: &[u8])
        -> io::Result<()>;

    /// Create (or open, if it exists) the direct child `name` of `parent`,
    /// returning a handle with all access rights.
    fn create_key(&self, parent: KeyHandle, name: &str, volatility: Volatility)
        -> io::Result<KeyHandle>;

    /// Release a handle.
    fn close_key(&self, key: KeyHandle);
}

/// An open key that is closed when dropped.
pub(crate) struct OpenKey<'b, B: RegistryBackend + ?Sized> {
    backend: &'b B,
    handle: KeyHandle,
}

impl<'b, B: RegistryBackend + ?Sized> OpenKey<'b, B> {
    pub(crate) fn open(
        backend: &'b B,
        hive: Hive,
        subkey: &str,
        access: KeyAccess,
    ) -> io::Result<Self> {
        let handle = backend.open_key(hive, subkey, access)?;
        Ok(Self { backend, handle })
    }

    pub(crate) fn query(&self, name: &str) -> io::Result<ValueInfo> {
        self.backend.query_value(self.handle, name)
    }

    pub(crate) fn read(&self, name: &str, buf: &mut [u8]) -> io::Result<usize> {
        self.backend.read_value(self.handle, name, buf)
    }

    pub(crate) fn set(&self, name: &str, kind: ValueType, data: &[u8]) -> io::Result<()> {
        self.backend.set_value(self.handle, name, kind, data)
    }

    /// Create a child key; the child has its own guard, independent of this one.
    pub(crate) fn create(&self, name: &str, volatility: Volatility) -> io::Result<OpenKey<'b, B>> {
        let handle = self.backend.create_key(self.handle, name, volatility)?;
        Ok(OpenKey {
            backend: self.backend,
            handle,
        })
    }
}

impl<B: RegistryBackend + ?Sized> Drop for OpenKey<'_, B> {
    fn drop(&mut self) {
        self.backend.close_key(self.handle);
    }
}
