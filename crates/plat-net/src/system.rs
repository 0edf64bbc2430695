//! The host operating system's resolver.
//!
//! On Unix this is `gethostbyname(3)` itself: the returned `hostent` lives in
//! libc's static storage and is only read while the lookup lock is held.
//! Elsewhere the standard library resolver stands in, keeping IPv4 results
//! only, as `gethostbyname` does.

use crate::record::RawHostEntry;
use crate::resolver::{HostLookup, LookupGuard};

/// [`HostLookup`] backed by the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemLookup;

#[cfg(unix)]
mod imp {
    use std::borrow::Cow;
    use std::ffi::{CStr, CString};
    use std::slice;

    use libc::{c_char, hostent};

    use crate::record::{AddressFamily, RawHostEntry};

    extern "C" {
        fn gethostbyname(name: *const c_char) -> *mut hostent;
    }

    /// View over libc's static `hostent`, with both lists measured once.
    pub(super) struct SystemEntry<'a> {
        raw: &'a hostent,
        addresses: &'a [*mut c_char],
        aliases: &'a [*mut c_char],
    }

    /// Call `gethostbyname`. The caller must hold the lookup lock for as long
    /// as the returned entry is alive.
    pub(super) fn lookup<'a>(name: &str) -> Option<SystemEntry<'a>> {
        let name = CString::new(name).ok()?;
        // SAFETY: `name` is a valid NUL-terminated string; the result is
        // either null or points at libc's static hostent, which stays valid
        // until the next call, excluded by the lookup lock. Both lists are
        // null-terminated per hostent(3).
        unsafe { Some(SystemEntry::new(gethostbyname(name.as_ptr()).as_ref()?)) }
    }

    impl<'a> SystemEntry<'a> {
        /// # Safety
        /// `raw` must be a well-formed `hostent` whose lists and strings
        /// outlive `'a`.
        pub(super) unsafe fn new(raw: &'a hostent) -> Self {
            Self {
                raw,
                addresses: terminated(raw.h_addr_list),
                aliases: terminated(raw.h_aliases),
            }
        }
    }

    /// The entries of a null-terminated pointer list, sentinel excluded.
    ///
    /// # Safety
    /// `list` must be null or point at a null-terminated array that outlives `'a`.
    unsafe fn terminated<'a>(list: *mut *mut c_char) -> &'a [*mut c_char] {
        if list.is_null() {
            return &[];
        }
        let mut n = 0;
        while !(*list.add(n)).is_null() {
            n += 1;
        }
        slice::from_raw_parts(list, n)
    }

    /// # Safety
    /// `s` must be null or a valid NUL-terminated string.
    unsafe fn c_str<'s>(s: *const c_char) -> Cow<'s, str> {
        if s.is_null() {
            Cow::Borrowed("")
        } else {
            CStr::from_ptr(s).to_string_lossy()
        }
    }

    impl RawHostEntry for SystemEntry<'_> {
        fn family(&self) -> AddressFamily {
            AddressFamily::from_raw(self.raw.h_addrtype)
        }

        fn addr_len(&self) -> usize {
            usize::try_from(self.raw.h_length).unwrap_or(0)
        }

        fn name(&self) -> Cow<'_, str> {
            // SAFETY: h_name is null or a NUL-terminated string owned by libc.
            unsafe { c_str(self.raw.h_name) }
        }

        fn address_count(&self) -> usize {
            self.addresses.len()
        }

        fn address(&self, index: usize) -> &[u8] {
            let addr = self.addresses[index];
            // SAFETY: each non-null entry points at h_length bytes.
            unsafe { slice::from_raw_parts(addr.cast::<u8>(), self.addr_len()) }
        }

        fn alias_count(&self) -> usize {
            self.aliases.len()
        }

        fn alias(&self, index: usize) -> Cow<'_, str> {
            // SAFETY: each non-null alias is a NUL-terminated string.
            unsafe { c_str(self.aliases[index]) }
        }
    }
}

#[cfg(unix)]
impl HostLookup for SystemLookup {
    fn lookup<'a>(
        &'a self,
        name: &str,
        _held: &'a LookupGuard,
    ) -> Option<Box<dyn RawHostEntry + 'a>> {
        let entry = imp::lookup(name)?;
        Some(Box::new(entry))
    }
}

#[cfg(not(unix))]
impl HostLookup for SystemLookup {
    fn lookup<'a>(
        &'a self,
        name: &str,
        _held: &'a LookupGuard,
    ) -> Option<Box<dyn RawHostEntry + 'a>> {
        use std::net::{IpAddr, ToSocketAddrs};

        use crate::record::{AddressFamily, HostRecord};

        let mut addresses = Vec::new();
        for addr in (name, 0u16).to_socket_addrs().ok()? {
            if let IpAddr::V4(v4) = addr.ip() {
                let octets = v4.octets().to_vec();
                if !addresses.contains(&octets) {
                    addresses.push(octets);
                }
            }
        }
        if addresses.is_empty() {
            return None;
        }
        Some(Box::new(HostRecord {
            family: AddressFamily::Inet,
            addr_len: 4,
            name: name.to_string(),
            addresses,
            aliases: Vec::new(),
        }))
    }
}
