//! Filesystem facade for the platform layer.
//!
//! Two small services that keep OS-specific path handling out of the rest of
//! the runtime:
//!
//! - **Path normalization** turns a possibly-relative path into an absolute,
//!   forward-slash path bounded by an explicit output capacity. One
//!   [`PathNormalizer`] implementation exists per target family and
//!   [`default_normalizer`] picks the right one at build time.
//! - **Directory path building** creates every missing directory along a
//!   path, root to leaf, through the [`DirOps`] primitive trait.
//!
//! # Modules
//!
//! - [`error`]: [`FsError`] and its mapping onto [`plat_types::ErrorCode`]
//! - [`normalize`]: [`PathNormalizer`] and its implementations
//! - [`dir`]: [`make_dir_path`], [`DirOps`], [`LocalFs`], [`MemoryFs`]

pub mod dir;
pub mod error;
pub mod normalize;

pub use dir::{make_dir_path, DirOps, LocalFs, MemoryFs};
pub use error::{FsError, FsResult};
pub use normalize::{
    default_normalizer, NormalizerKind, PassthroughNormalizer, PathNormalizer,
    ResolvingNormalizer,
};
