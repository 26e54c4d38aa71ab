//! Read-only view of a cache, as seen by a replacement policy.
//!
//! A policy receives a `&dyn CacheSnapshot` on every call.  It can ask which
//! keys are resident and read the logical clock, but it has no way to add
//! or remove entries: membership belongs to the cache container.

use ahash::RandomState;

/// The narrow interface a policy may consult.
pub trait CacheSnapshot {
    /// `true` if `key` is currently resident.
    fn contains(&self, key: &str) -> bool;

    /// Iterates over resident keys in no particular order.
    fn keys(&self) -> Box<dyn Iterator<Item = &str> + '_>;

    /// Number of resident entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes occupied by resident entries.
    fn size(&self) -> u64;

    /// Maximum bytes the cache may hold.
    fn capacity(&self) -> u64;

    /// Monotonic logical clock: number of requests seen so far, including
    /// the one being served.
    fn access_count(&self) -> u64;

    fn hit_count(&self) -> u64;

    fn miss_count(&self) -> u64 {
        self.access_count() - self.hit_count()
    }

    /// Fingerprint of the resident key set.
    ///
    /// The default walks [`keys`](Self::keys); containers that can keep a
    /// running digest should return it instead.
    fn key_digest(&self) -> KeyDigest {
        KeyDigest::of(self.keys())
    }
}

/// Order-independent fingerprint of a set of keys.
///
/// Two sets with the same digest are, with overwhelming probability, the
/// same set.  A digest is updated in O(1) per added or removed key, so a
/// policy can compare its metadata against the cache without a scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct KeyDigest(u64);

impl KeyDigest {
    pub fn of<'a>(keys: impl Iterator<Item = &'a str>) -> Self {
        let mut digest = KeyDigest::default();
        for key in keys {
            digest.add(key);
        }
        digest
    }

    #[inline]
    pub fn add(&mut self, key: &str) {
        self.0 = self.0.wrapping_add(fingerprint(key));
    }

    #[inline]
    pub fn remove(&mut self, key: &str) {
        self.0 = self.0.wrapping_sub(fingerprint(key));
    }
}

// Fixed seeds: digests built by different owners must agree.
#[inline]
fn fingerprint(key: &str) -> u64 {
    RandomState::with_seeds(
        0x243f_6a88_85a3_08d3,
        0x1319_8a2e_0370_7344,
        0xa409_3822_299f_31d0,
        0x082e_fa98_ec4e_6c89,
    )
    .hash_one(key)
}
