//! Host records and the borrowed view over a raw lookup result.

use std::borrow::Cow;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

#[cfg(unix)]
const AF_INET: i32 = libc::AF_INET;
#[cfg(unix)]
const AF_INET6: i32 = libc::AF_INET6;
#[cfg(not(unix))]
const AF_INET: i32 = 2;
#[cfg(not(unix))]
const AF_INET6: i32 = 23;

/// Address family of a host record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressFamily {
    /// IPv4, 4-byte addresses.
    Inet,
    /// IPv6, 16-byte addresses.
    Inet6,
    /// Any other family, by its raw platform value.
    Other(i32),
}

impl AddressFamily {
    /// Map a raw platform family value.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            AF_INET => Self::Inet,
            AF_INET6 => Self::Inet6,
            other => Self::Other(other),
        }
    }

    /// The raw platform family value.
    pub fn to_raw(self) -> i32 {
        match self {
            Self::Inet => AF_INET,
            Self::Inet6 => AF_INET6,
            Self::Other(raw) => raw,
        }
    }

    /// The family of `addr`.
    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => Self::Inet,
            IpAddr::V6(_) => Self::Inet6,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inet => write!(f, "inet"),
            Self::Inet6 => write!(f, "inet6"),
            Self::Other(raw) => write!(f, "af({raw})"),
        }
    }
}

/// Borrowed view over a lookup result still owned by the primitive.
///
/// Indices passed to [`address`](Self::address) and [`alias`](Self::alias)
/// must be below the matching count. Every address slice is exactly
/// [`addr_len`](Self::addr_len) bytes long.
pub trait RawHostEntry {
    fn family(&self) -> AddressFamily;
    fn addr_len(&self) -> usize;
    /// Canonical host name.
    fn name(&self) -> Cow<'_, str>;
    fn address_count(&self) -> usize;
    fn address(&self, index: usize) -> &[u8];
    fn alias_count(&self) -> usize;
    fn alias(&self, index: usize) -> Cow<'_, str>;
}

/// An owned, deep-copied hostname lookup result.
///
/// Addresses keep their raw network-order bytes, `addr_len` bytes each, in
/// the order the resolver returned them. Aliases keep their order too.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    pub family: AddressFamily,
    pub addr_len: usize,
    /// Canonical host name.
    pub name: String,
    pub addresses: Vec<Vec<u8>>,
    pub aliases: Vec<String>,
}

impl HostRecord {
    /// Deep-copy `entry` into owned storage.
    ///
    /// Sequence lengths are counted first and each vector is allocated once
    /// at its final size.
    pub fn copy_from(entry: &dyn RawHostEntry) -> Self {
        let addr_len = entry.addr_len();

        let address_count = entry.address_count();
        let mut addresses = Vec::with_capacity(address_count);
        for index in 0..address_count {
            let raw = entry.address(index);
            addresses.push(raw[..addr_len.min(raw.len())].to_vec());
        }

        let alias_count = entry.alias_count();
        let mut aliases = Vec::with_capacity(alias_count);
        for index in 0..alias_count {
            aliases.push(entry.alias(index).into_owned());
        }

        Self {
            family: entry.family(),
            addr_len,
            name: entry.name().into_owned(),
            addresses,
            aliases,
        }
    }

    /// Addresses decoded as [`IpAddr`]. Entries that are neither 4 nor 16
    /// bytes long are skipped.
    pub fn ip_addrs(&self) -> Vec<IpAddr> {
        self.addresses.iter().filter_map(|raw| decode_addr(raw)).collect()
    }

    /// The first address, if any decodes.
    pub fn first_addr(&self) -> Option<IpAddr> {
        self.addresses.iter().find_map(|raw| decode_addr(raw))
    }
}

fn decode_addr(raw: &[u8]) -> Option<IpAddr> {
    if let Ok(octets) = <[u8; 4]>::try_from(raw) {
        return Some(IpAddr::V4(Ipv4Addr::from(octets)));
    }
    if let Ok(octets) = <[u8; 16]>::try_from(raw) {
        return Some(IpAddr::V6(Ipv6Addr::from(octets)));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Entry {
        addresses: Vec<[u8; 4]>,
        aliases: Vec<&'static str>,
    }

    impl RawHostEntry for Entry {
        fn family(&self) -> AddressFamily {
            AddressFamily::Inet
        }
        fn addr_len(&self) -> usize {
            4
        }
        fn name(&self) -> Cow<'_, str> {
            Cow::Borrowed("db.internal")
        }
        fn address_count(&self) -> usize {
            self.addresses.len()
        }
        fn address(&self, index: usize) -> &[u8] {
            &self.addresses[index]
        }
        fn alias_count(&self) -> usize {
            self.aliases.len()
        }
        fn alias(&self, index: usize) -> Cow<'_, str> {
            Cow::Borrowed(self.aliases[index])
        }
    }

    #[test]
    fn copy_preserves_order() {
        let entry = Entry {
            addresses: vec![[10, 0, 0, 2], [10, 0, 0, 1]],
            aliases: vec!["db", "primary"],
        };
        let record = HostRecord::copy_from(&entry);
        assert_eq!(record.name, "db.internal");
        assert_eq!(record.addresses, vec![vec![10u8, 0, 0, 2], vec![10u8, 0, 0, 1]]);
        assert_eq!(record.aliases, vec!["db", "primary"]);
    }

    #[test]
    fn copy_is_independent_of_source() {
        let entry = Entry {
            addresses: vec![[1, 2, 3, 4]],
            aliases: vec![],
        };
        let record = HostRecord::copy_from(&entry);
        drop(entry);
        assert_eq!(record.first_addr(), Some(IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4))));
    }

    #[test]
    fn ip_addrs_skip_odd_lengths() {
        let record = HostRecord {
            family: AddressFamily::Inet,
            addr_len: 4,
            name: "x".into(),
            addresses: vec![vec![127u8, 0, 0, 1], vec![1u8, 2, 3]],
            aliases: vec![],
        };
        assert_eq!(record.ip_addrs(), vec![IpAddr::V4(Ipv4Addr::LOCALHOST)]);
    }

    #[test]
    fn decodes_ipv6() {
        let raw = Ipv6Addr::LOCALHOST.octets().to_vec();
        assert_eq!(decode_addr(&raw), Some(IpAddr::V6(Ipv6Addr::LOCALHOST)));
    }

    #[test]
    fn family_round_trips_raw_value() {
        for family in [AddressFamily::Inet, AddressFamily::Inet6, AddressFamily::Other(99)] {
            assert_eq!(AddressFamily::from_raw(family.to_raw()), family);
        }
    }
}
