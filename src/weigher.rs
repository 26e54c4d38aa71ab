//! Object weigher: turns the size column of a trace into the cost an
//! object occupies in the cache.
//!
//! The cache enforces `Σ size(object) ≤ capacity`.  With [`UnitWeigher`]
//! every object costs 1, so `capacity` is simply the maximum number of
//! objects.  [`SizeWeigher`] charges the raw byte size instead.
//!
//! # Example
//! ```
//! use lungo::weigher::{SizeWeigher, UnitWeigher, Weigher};
//!
//! assert_eq!(UnitWeigher.weigh(4096), 1);
//! assert_eq!(SizeWeigher.weigh(4096), 4096);
//! ```

/// Computes the cost of a traced object from its raw size.
///
/// The returned weight **must be ≥ 1**.  Returning 0 is treated as 1 to
/// prevent objects from escaping capacity accounting.
pub trait Weigher: Send + Sync {
    fn weigh(&self, raw_size: u64) -> u64;
}

// ---------------------------------------------------------------------------
// Built-in implementations
// ---------------------------------------------------------------------------

/// Every object costs exactly 1 unit.  Used when object sizes are ignored.
pub struct UnitWeigher;

impl Weigher for UnitWeigher {
    #[inline]
    fn weigh(&self, _raw_size: u64) -> u64 {
        1
    }
}

/// Every object costs its raw size in bytes.
pub struct SizeWeigher;

impl Weigher for SizeWeigher {
    #[inline]
    fn weigh(&self, raw_size: u64) -> u64 {
        raw_size.max(1)
    }
}

/// Picks the weigher matching a `consider_obj_size` setting.
pub fn for_sizes(consider_obj_size: bool) -> &'static dyn Weigher {
    if consider_obj_size {
        &SizeWeigher
    } else {
        &UnitWeigher
    }
}
