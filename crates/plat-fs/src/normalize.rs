//! Path normalization to an absolute, forward-slash form.
//!
//! Targets whose native separator is `\` resolve the path against the current
//! working directory and rewrite the separators ([`ResolvingNormalizer`]).
//! Targets whose native form already matches only need a bounded copy
//! ([`PassthroughNormalizer`]).

use serde::{Deserialize, Serialize};
use tracing::debug;

use plat_types::limits;

use crate::error::{FsError, FsResult};

/// Converts a path into the runtime's canonical absolute form.
///
/// `capacity` is the size of the caller's output buffer, terminator slot
/// included: at most `capacity - 1` bytes are ever returned.
pub trait PathNormalizer: Send + Sync {
    /// Normalize `path` into at most `capacity - 1` bytes.
    fn normalize(&self, path: &str, capacity: usize) -> FsResult<String>;

    /// Which implementation this is.
    fn kind(&self) -> NormalizerKind;
}

/// Selects a [`PathNormalizer`] implementation at startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizerKind {
    /// Whatever [`default_normalizer`] picks for the build target.
    #[default]
    Auto,
    /// Always resolve against the working directory and rewrite separators.
    Resolving,
    /// Bounded copy only.
    Passthrough,
}

impl NormalizerKind {
    /// Instantiate the selected normalizer.
    pub fn build(self) -> Box<dyn PathNormalizer> {
        match self {
            Self::Auto => default_normalizer(),
            Self::Resolving => Box::new(ResolvingNormalizer),
            Self::Passthrough => Box::new(PassthroughNormalizer),
        }
    }
}

/// The normalizer native to the build target.
#[cfg(windows)]
pub fn default_normalizer() -> Box<dyn PathNormalizer> {
    Box::new(ResolvingNormalizer)
}

/// The normalizer native to the build target.
#[cfg(not(windows))]
pub fn default_normalizer() -> Box<dyn PathNormalizer> {
    Box::new(PassthroughNormalizer)
}

/// Resolves against the current working directory, then rewrites every `\`
/// to `/` and truncates to the output capacity.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResolvingNormalizer;

impl PathNormalizer for ResolvingNormalizer {
    fn normalize(&self, path: &str, capacity: usize) -> FsResult<String> {
        check_args(path, capacity)?;

        let absolute = std::path::absolute(path).map_err(|source| FsError::Resolve {
            path: path.to_string(),
            source,
        })?;
        let mut out = absolute.to_string_lossy().replace('\\', "/");
        if out.len() >= capacity {
            debug!(path, capacity, "truncating normalized path");
            truncate_to(&mut out, capacity - 1);
        }
        Ok(out)
    }

    fn kind(&self) -> NormalizerKind {
        NormalizerKind::Resolving
    }
}

/// Bounded copy for targets whose native path form is already canonical.
///
/// An input that does not fit is a caller contract violation: debug builds
/// assert, release builds report [`FsError::Overflow`].
#[derive(Clone, Copy, Debug, Default)]
pub struct PassthroughNormalizer;

impl PathNormalizer for PassthroughNormalizer {
    fn normalize(&self, path: &str, capacity: usize) -> FsResult<String> {
        check_args(path, capacity)?;

        let fits = limits::fits(path, capacity);
        debug_assert!(
            fits,
            "path of {} bytes does not fit in a {capacity}-byte buffer",
            path.len()
        );
        if !fits {
            return Err(FsError::Overflow {
                len: path.len(),
                capacity,
            });
        }
        Ok(path.to_string())
    }

    fn kind(&self) -> NormalizerKind {
        NormalizerKind::Passthrough
    }
}

fn check_args(path: &str, capacity: usize) -> FsResult<()> {
    if path.is_empty() {
        return Err(FsError::BadArgs("path must not be empty".into()));
    }
    if capacity == 0 {
        return Err(FsError::BadArgs("capacity must be positive".into()));
    }
    Ok(())
}

/// Truncate `s` to at most `max` bytes without splitting a character.
fn truncate_to(s: &mut String, max: usize) {
    let mut end = max.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_keeps_absolute_path() {
        let out = PassthroughNormalizer.normalize("/srv/www/index.html", 256).unwrap();
        assert_eq!(out, "/srv/www/index.html");
    }

    #[test]
    fn passthrough_accepts_exact_fit() {
        let out = PassthroughNormalizer.normalize("/abc", 5).unwrap();
        assert_eq!(out, "/abc");
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "does not fit"))]
    fn passthrough_overflow_is_a_contract_violation() {
        let err = PassthroughNormalizer.normalize("/abcd", 5).unwrap_err();
        assert!(matches!(err, FsError::Overflow { len: 5, capacity: 5 }));
    }

    #[test]
    fn empty_path_is_bad_args() {
        let err = PassthroughNormalizer.normalize("", 16).unwrap_err();
        assert_eq!(err.code(), plat_types::ErrorCode::BadArgs);
        let err = ResolvingNormalizer.normalize("", 16).unwrap_err();
        assert_eq!(err.code(), plat_types::ErrorCode::BadArgs);
    }

    #[test]
    fn zero_capacity_is_bad_args() {
        let err = ResolvingNormalizer.normalize("a", 0).unwrap_err();
        assert!(matches!(err, FsError::BadArgs(_)));
    }

    #[cfg(unix)]
    #[test]
    fn resolving_keeps_absolute_forward_slash_path() {
        let out = ResolvingNormalizer.normalize("/srv/www/index.html", 256).unwrap();
        assert_eq!(out, "/srv/www/index.html");
    }

    #[test]
    fn resolving_makes_relative_path_absolute() {
        let out = ResolvingNormalizer.normalize("docs/readme.txt", 4096).unwrap();
        assert!(out.ends_with("docs/readme.txt"), "got {out}");
        assert!(std::path::Path::new(&out).is_absolute(), "got {out}");
    }

    #[test]
    fn resolving_rewrites_backslashes() {
        let out = ResolvingNormalizer.normalize("conf\\app.conf", 4096).unwrap();
        assert!(!out.contains('\\'), "got {out}");
        assert!(out.ends_with("conf/app.conf"), "got {out}");
    }

    #[cfg(unix)]
    #[test]
    fn resolving_truncates_to_capacity() {
        let out = ResolvingNormalizer.normalize("/abcdefghij", 8).unwrap();
        assert_eq!(out, "/abcdef");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let mut s = String::from("/é/x");
        truncate_to(&mut s, 2);
        assert_eq!(s, "/");
    }

    #[test]
    fn kind_builds_matching_normalizer() {
        assert_eq!(NormalizerKind::Resolving.build().kind(), NormalizerKind::Resolving);
        assert_eq!(NormalizerKind::Passthrough.build().kind(), NormalizerKind::Passthrough);
        assert_ne!(NormalizerKind::Auto.build().kind(), NormalizerKind::Auto);
    }

    #[test]
    fn kind_deserializes_lowercase() {
        let kind: NormalizerKind = serde_json::from_str("\"passthrough\"").unwrap();
        assert_eq!(kind, NormalizerKind::Passthrough);
    }
}
