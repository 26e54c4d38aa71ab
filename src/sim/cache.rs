use ahash::AHashMap;
use log::{debug, trace};

use crate::builder::CacheBuilder;
use crate::error::{LungoError, Result};
use crate::metrics::stats::{Metrics, StatsCounter};
use crate::object::CacheObject;
use crate::policy::Policy;
use crate::sim::protocol::{Event, ProtocolMonitor};
use crate::snapshot::{CacheSnapshot, KeyDigest};

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Membership and accounting.  This is what the policy sees, through
/// [`CacheSnapshot`], on every call.
pub(crate) struct Store {
    objects: AHashMap<String, CacheObject>,
    size: u64,
    digest: KeyDigest,
    capacity: u64,
    access_count: u64,
    stats: StatsCounter,
}

impl Store {
    fn new(capacity: u64) -> Self {
        Store {
            objects: AHashMap::new(),
            size: 0,
            digest: KeyDigest::default(),
            capacity,
            access_count: 0,
            stats: StatsCounter::new(),
        }
    }

    fn insert(&mut self, obj: CacheObject) {
        self.size += obj.size();
        if !self.objects.contains_key(obj.key()) {
            self.digest.add(obj.key());
        }
        if let Some(old) = self.objects.insert(obj.key().to_owned(), obj) {
            self.size -= old.size();
        }
    }

    fn remove(&mut self, key: &str) -> Option<CacheObject> {
        let obj = self.objects.remove(key)?;
        self.size -= obj.size();
        self.digest.remove(key);
        Some(obj)
    }
}

impl CacheSnapshot for Store {
    fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    fn keys(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.objects.keys().map(String::as_str))
    }

    fn len(&self) -> usize {
        self.objects.len()
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn capacity(&self) -> u64 {
        self.capacity
    }

    fn access_count(&self) -> u64 {
        self.access_count
    }

    fn hit_count(&self) -> u64 {
        self.stats.hits()
    }

    fn key_digest(&self) -> KeyDigest {
        self.digest
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Outcome of a single [`Cache::get`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Hit,
    /// The object was admitted after evicting `evicted`, in eviction order.
    Miss { evicted: Vec<CacheObject> },
    /// The object is larger than the whole cache and was not admitted.
    Rejected,
}

impl Access {
    pub fn is_hit(&self) -> bool {
        matches!(self, Access::Hit)
    }
}

/// A bounded cache driven by a pluggable [`Policy`].
///
/// The cache owns membership and size accounting.  The policy is asked
/// which entry to evict and told about every hit, insertion and eviction,
/// always in the order checked by [`ProtocolMonitor`].
///
/// # Example
/// ```
/// use lungo::{CacheBuilder, CacheObject};
///
/// let mut cache = CacheBuilder::new(2).build();
/// let a = CacheObject::new("a", 1).unwrap();
/// assert!(!cache.get(&a).unwrap().is_hit());
/// assert!(cache.get(&a).unwrap().is_hit());
/// ```
pub struct Cache {
    store: Store,
    policy: Box<dyn Policy>,
    /// Self-check of `get`'s own call sequence.  Events are fed in as they
    /// are issued, so this only fails if `get` itself is broken; policies
    /// that want to verify the order they observe wrap themselves in their
    /// own monitor.
    protocol: ProtocolMonitor,
}

impl Cache {
    pub(crate) fn new(capacity: u64, policy: Box<dyn Policy>) -> Self {
        Cache {
            store: Store::new(capacity),
            policy,
            protocol: ProtocolMonitor::new(),
        }
    }

    /// Returns a [`CacheBuilder`] for constructing a new cache.
    pub fn builder(capacity: u64) -> CacheBuilder {
        CacheBuilder::new(capacity)
    }

    /// Serves one request for `obj`.
    ///
    /// A miss evicts until `obj` fits, then admits it.  Fails only if the
    /// policy breaks its contract (no victim, or a non-resident one) or the
    /// call order is violated.
    pub fn get(&mut self, obj: &CacheObject) -> Result<Access> {
        self.store.access_count += 1;

        if self.store.contains(obj.key()) {
            self.protocol.observe(Event::Hit)?;
            self.store.stats.record_hit();
            self.policy.update_after_hit(&self.store, obj);
            trace!("hit {} at t={}", obj.key(), self.store.access_count);
            return Ok(Access::Hit);
        }

        if obj.size() > self.store.capacity {
            self.store.stats.record_rejection();
            debug!(
                "rejecting {} ({} bytes > capacity {})",
                obj.key(),
                obj.size(),
                self.store.capacity
            );
            return Ok(Access::Rejected);
        }

        self.store.stats.record_miss();
        let mut evicted = Vec::new();
        while self.store.size + obj.size() > self.store.capacity {
            self.protocol.observe(Event::Evict)?;
            let victim = match self.policy.evict(&self.store, obj) {
                Some(key) if key != obj.key() => self.store.remove(&key),
                _ => None,
            };
            let Some(victim) = victim else {
                self.protocol.reset();
                return Err(LungoError::NoEvictionCandidate {
                    key: obj.key().to_owned(),
                    needed: self.store.size + obj.size() - self.store.capacity,
                });
            };
            self.store.stats.record_eviction(1);
            self.policy.update_after_evict(&self.store, obj, &victim);
            evicted.push(victim);
        }

        self.protocol.observe(Event::Insert)?;
        self.store.insert(obj.clone());
        self.policy.update_after_insert(&self.store, obj);
        self.protocol.observe(Event::Settle)?;

        debug_assert!(self.store.size <= self.store.capacity);
        trace!(
            "miss {} at t={}, evicted {}",
            obj.key(),
            self.store.access_count,
            evicted.len()
        );
        Ok(Access::Miss { evicted })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.store.contains(key)
    }

    /// Number of resident objects.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Bytes currently occupied.
    pub fn size(&self) -> u64 {
        self.store.size
    }

    pub fn capacity(&self) -> u64 {
        self.store.capacity
    }

    pub fn access_count(&self) -> u64 {
        self.store.access_count
    }

    pub fn resident_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.store.objects.keys().map(String::as_str)
    }

    /// The read-only view handed to the policy.
    pub fn snapshot(&self) -> &dyn CacheSnapshot {
        &self.store
    }

    pub fn policy(&self) -> &dyn Policy {
        self.policy.as_ref()
    }

    pub fn stats(&self) -> Metrics {
        self.store.stats.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{metadata::MetadataStore, PolicyKind};

    fn obj(key: &str, size: u64) -> CacheObject {
        CacheObject::new(key, size).unwrap()
    }

    /// Always nominates the same key, resident or not.
    struct Stubborn(MetadataStore);

    impl Policy for Stubborn {
        fn name(&self) -> &'static str {
            "stubborn"
        }
        fn evict(&self, _: &dyn CacheSnapshot, _: &CacheObject) -> Option<String> {
            Some("nobody".into())
        }
        fn update_after_hit(&mut self, _: &dyn CacheSnapshot, _: &CacheObject) {}
        fn update_after_insert(&mut self, _: &dyn CacheSnapshot, _: &CacheObject) {}
        fn update_after_evict(&mut self, _: &dyn CacheSnapshot, _: &CacheObject, _: &CacheObject) {}
        fn metadata(&self) -> &MetadataStore {
            &self.0
        }
    }

    #[test]
    fn size_and_access_count_track_requests() {
        let mut cache = CacheBuilder::new(10).policy(PolicyKind::Lru).build();
        cache.get(&obj("a", 4)).unwrap();
        cache.get(&obj("b", 5)).unwrap();
        cache.get(&obj("a", 4)).unwrap();
        assert_eq!(cache.size(), 9);
        assert_eq!(cache.access_count(), 3);
        assert_eq!(cache.snapshot().hit_count(), 1);
        assert_eq!(cache.snapshot().miss_count(), 2);
    }

    #[test]
    fn evicts_until_object_fits() {
        let mut cache = CacheBuilder::new(10).policy(PolicyKind::Lru).build();
        for key in ["a", "b", "c"] {
            cache.get(&obj(key, 3)).unwrap();
        }
        let access = cache.get(&obj("big", 8)).unwrap();
        let Access::Miss { evicted } = access else {
            panic!("expected a miss, got {access:?}");
        };
        let keys: Vec<_> = evicted.iter().map(CacheObject::key).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(cache.size(), 8);
        assert_eq!(cache.stats().evictions, 3);
    }

    #[test]
    fn oversized_object_is_rejected_without_touching_the_policy() {
        let mut cache = CacheBuilder::new(5).build();
        cache.get(&obj("a", 2)).unwrap();
        assert_eq!(cache.get(&obj("huge", 6)).unwrap(), Access::Rejected);
        assert!(cache.contains("a"));
        assert_eq!(cache.policy().metadata().len(), 1);
        assert_eq!(cache.stats().rejections, 1);
    }

    #[test]
    fn non_resident_victim_is_an_error() {
        let mut cache = CacheBuilder::new(1)
            .policy_impl(Stubborn(MetadataStore::new()))
            .build();
        cache.get(&obj("a", 1)).unwrap();
        let err = cache.get(&obj("b", 1)).unwrap_err();
        assert!(matches!(err, LungoError::NoEvictionCandidate { needed: 1, .. }), "{err}");
        // the aborted request must not wedge the protocol
        assert!(cache.get(&obj("a", 1)).unwrap().is_hit());
    }

    /// Gives up after the first victim.
    struct GivesUp {
        store: MetadataStore,
        offered: std::cell::Cell<bool>,
    }

    impl Policy for GivesUp {
        fn name(&self) -> &'static str {
            "gives-up"
        }
        fn evict(&self, snapshot: &dyn CacheSnapshot, obj: &CacheObject) -> Option<String> {
            if self.offered.replace(true) {
                return None;
            }
            snapshot.keys().find(|k| *k != obj.key()).map(str::to_owned)
        }
        fn update_after_hit(&mut self, _: &dyn CacheSnapshot, _: &CacheObject) {}
        fn update_after_insert(&mut self, _: &dyn CacheSnapshot, _: &CacheObject) {}
        fn update_after_evict(&mut self, _: &dyn CacheSnapshot, _: &CacheObject, _: &CacheObject) {}
        fn metadata(&self) -> &MetadataStore {
            &self.store
        }
    }

    #[test]
    fn evictions_of_an_aborted_request_are_counted() {
        let mut cache = CacheBuilder::new(2)
            .policy_impl(GivesUp {
                store: MetadataStore::new(),
                offered: std::cell::Cell::new(false),
            })
            .build();
        cache.get(&obj("a", 1)).unwrap();
        cache.get(&obj("b", 1)).unwrap();
        let err = cache.get(&obj("big", 2)).unwrap_err();
        assert!(matches!(err, LungoError::NoEvictionCandidate { needed: 1, .. }), "{err}");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().evictions, 1);
    }
}
