//! Hives and logical key path parsing.
//!
//! A logical key path is `<HiveName>\<Subkey...>`:
//! - the hive name is one of the four `HKEY_*` names, matched
//!   case-insensitively
//! - exactly one backslash separates it from the subkey remainder
//! - the remainder must be non-empty, and may be of any length

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between the hive name and the subkey path, and between subkeys.
pub const KEY_SEPARATOR: char = '\\';

/// A top-level namespace root of the configuration store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Hive {
    #[serde(rename = "HKEY_LOCAL_MACHINE")]
    LocalMachine,
    #[serde(rename = "HKEY_CURRENT_USER")]
    CurrentUser,
    #[serde(rename = "HKEY_USERS")]
    Users,
    #[serde(rename = "HKEY_CLASSES_ROOT")]
    ClassesRoot,
}

impl Hive {
    /// All hives, in declaration order.
    pub const ALL: [Hive; 4] = [
        Self::LocalMachine,
        Self::CurrentUser,
        Self::Users,
        Self::ClassesRoot,
    ];

    /// The symbolic name, e.g. `"HKEY_LOCAL_MACHINE"`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LocalMachine => "HKEY_LOCAL_MACHINE",
            Self::CurrentUser => "HKEY_CURRENT_USER",
            Self::Users => "HKEY_USERS",
            Self::ClassesRoot => "HKEY_CLASSES_ROOT",
        }
    }
}

impl fmt::Display for Hive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a hive name matches none of the known hives.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown hive: {0}")]
pub struct UnknownHive(pub String);

impl FromStr for Hive {
    type Err = UnknownHive;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|hive| hive.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownHive(s.to_string()))
    }
}

/// Split a logical key path into its hive and subkey remainder.
///
/// The remainder is a slice of `key_path`, not a copy. Returns `None` when
/// the path has no separator, the remainder is empty, the hive name is
/// unknown.
///
/// # Examples
///
/// ```
/// use plat_registry::{resolve_hive, Hive};
///
/// let (hive, subkey) = resolve_hive("hkey_current_user\\Software\\Acme").unwrap();
/// assert_eq!(hive, Hive::CurrentUser);
/// assert_eq!(subkey, "Software\\Acme");
///
/// assert!(resolve_hive("HKEY_USERS").is_none());
/// assert!(resolve_hive("HKEY_USERS\\").is_none());
/// assert!(resolve_hive("HKEY_NOWHERE\\Software").is_none());
/// ```
pub fn resolve_hive(key_path: &str) -> Option<(Hive, &str)> {
    let (name, remainder) = key_path.split_once(KEY_SEPARATOR)?;
    if remainder.is_empty() {
        return None;
    }
    let hive = name.parse().ok()?;
    Some((hive, remainder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use plat_types::MAX_STRING;
    use proptest::prelude::*;

    #[test]
    fn resolves_each_hive() {
        for hive in Hive::ALL {
            let path = format!("{hive}\\Software\\Acme");
            assert_eq!(resolve_hive(&path), Some((hive, "Software\\Acme")));
        }
    }

    #[test]
    fn remainder_aliases_input() {
        let path = String::from("HKEY_LOCAL_MACHINE\\System");
        let (_, remainder) = resolve_hive(&path).unwrap();
        let offset = remainder.as_ptr() as usize - path.as_ptr() as usize;
        assert_eq!(offset, "HKEY_LOCAL_MACHINE\\".len());
    }

    #[test]
    fn splits_at_first_separator_only() {
        let (_, remainder) = resolve_hive("HKEY_USERS\\a\\\\b\\").unwrap();
        assert_eq!(remainder, "a\\\\b\\");
    }

    #[test]
    fn forward_slash_is_not_a_separator() {
        assert!(resolve_hive("HKEY_USERS/Software").is_none());
    }

    #[test]
    fn rejects_missing_remainder() {
        assert!(resolve_hive("HKEY_CLASSES_ROOT").is_none());
        assert!(resolve_hive("HKEY_CLASSES_ROOT\\").is_none());
        assert!(resolve_hive("").is_none());
    }

    #[test]
    fn rejects_unknown_and_partial_names() {
        assert!(resolve_hive("HKLM\\Software").is_none());
        assert!(resolve_hive("HKEY_LOCAL\\Software").is_none());
        assert!(resolve_hive("\\Software").is_none());
        assert!(resolve_hive(" HKEY_USERS\\Software").is_none());
    }

    #[test]
    fn long_remainder_resolves_in_place() {
        let path = format!("HKEY_LOCAL_MACHINE\\{}", "k".repeat(MAX_STRING));
        let (hive, subkey) = resolve_hive(&path).unwrap();
        assert_eq!(hive, Hive::LocalMachine);
        assert_eq!(subkey.len(), MAX_STRING);
        assert!(std::ptr::eq(subkey.as_ptr(), path["HKEY_LOCAL_MACHINE\\".len()..].as_ptr()));
    }

    #[test]
    fn serde_uses_symbolic_names() {
        let json = serde_json::to_string(&Hive::Users).unwrap();
        assert_eq!(json, "\"HKEY_USERS\"");
    }

    fn recase(name: &str, mask: &[bool]) -> String {
        name.chars()
            .zip(mask.iter().cycle())
            .map(|(c, upper)| if *upper { c.to_ascii_uppercase() } else { c.to_ascii_lowercase() })
            .collect()
    }

    proptest! {
        #[test]
        fn no_separator_never_resolves(path in "[^\\\\]{0,64}") {
            prop_assert!(resolve_hive(&path).is_none());
        }

        #[test]
        fn empty_remainder_never_resolves(index in 0usize..4, mask in prop::collection::vec(any::<bool>(), 1..24)) {
            let path = format!("{}\\", recase(Hive::ALL[index].name(), &mask));
            prop_assert!(resolve_hive(&path).is_none());
        }

        #[test]
        fn any_casing_resolves(
            index in 0usize..4,
            mask in prop::collection::vec(any::<bool>(), 1..24),
            remainder in "[A-Za-z0-9_ .\\\\-]{1,48}",
        ) {
            let hive = Hive::ALL[index];
            let path = format!("{}\\{}", recase(hive.name(), &mask), remainder);
            prop_assert_eq!(resolve_hive(&path), Some((hive, remainder.as_str())));
        }
    }
}
