//! Persistence contract for bundles.
//!
//! Categories only ever talk to a `dyn Backend`; concrete stores live in the
//! submodules.

pub mod file;
pub mod memory;

use std::fmt::Debug;

use crate::bundle::{Bundle, BundleKey};
use crate::error::Result;

pub use file::FileBackend;
pub use memory::MemoryBackend;

/// A store for bundles addressed by `(index, category, phase)`.
///
/// Implementations must round-trip identifier order and `f64` weights
/// exactly.
pub trait Backend: Send + Sync + Debug {
    /// Replace whatever is stored under `key` with `bundle`.
    fn dump(&self, key: &BundleKey, bundle: &Bundle) -> Result<()>;

    /// Load the bundle stored under `key`.
    ///
    /// Returns a `NotFound` error when nothing was dumped for `key`.
    fn load(&self, key: &BundleKey) -> Result<Bundle>;

    /// Remove the bundle stored under `key`. Clearing a missing key is not an error.
    fn clear(&self, key: &BundleKey) -> Result<()>;

    fn exists(&self, key: &BundleKey) -> bool;
}
