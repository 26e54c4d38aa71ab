pub mod lru;
pub mod metadata;
pub mod ranked;
pub mod score;

use std::fmt;
use std::str::FromStr;

use log::warn;

use crate::config::PolicyConfig;
use crate::error::LungoError;
use crate::object::CacheObject;
use crate::snapshot::CacheSnapshot;

pub use lru::LruPolicy;
pub use metadata::{EntryRecord, MetadataStore};
pub use ranked::{HybridPolicy, LfuPolicy, ScoredPolicy};

/// Core replacement strategy.
///
/// All methods are called **single-threadedly** by the cache driver, one at
/// a time and in protocol order: either a hit followed by
/// `update_after_hit`, or zero or more `evict` / `update_after_evict`
/// rounds followed by `update_after_insert`.  Implementors only need to be
/// `Send`.
///
/// A policy never changes cache membership.  Its only state is its own
/// [`MetadataStore`], written exclusively by the three `update_*` hooks.
pub trait Policy: Send {
    /// Short identifier used in logs and reports.
    fn name(&self) -> &'static str;

    /// Chooses the resident entry to evict so that `obj` can be admitted.
    ///
    /// Returns `None` only when nothing is resident.  Never returns the key
    /// of `obj` and never modifies metadata.
    fn evict(&self, snapshot: &dyn CacheSnapshot, obj: &CacheObject) -> Option<String>;

    /// Called after `obj` was found resident.
    fn update_after_hit(&mut self, snapshot: &dyn CacheSnapshot, obj: &CacheObject);

    /// Called after `obj` has been admitted into the cache.
    fn update_after_insert(&mut self, snapshot: &dyn CacheSnapshot, obj: &CacheObject);

    /// Called after `evicted` has been removed to make room for `obj`.
    fn update_after_evict(
        &mut self,
        snapshot: &dyn CacheSnapshot,
        obj: &CacheObject,
        evicted: &CacheObject,
    );

    /// Metadata currently tracked by the policy.
    fn metadata(&self) -> &MetadataStore;
}

// ---------------------------------------------------------------------------
// PolicyKind
// ---------------------------------------------------------------------------

/// The built-in policies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PolicyKind {
    /// Frequency-weighted LRU (see [`score::FrequencyWeighted`]).
    #[default]
    Hybrid,
    /// Least recently used.
    Lru,
    /// Least frequently used, oldest first among equals.
    Lfu,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 3] = [PolicyKind::Hybrid, PolicyKind::Lru, PolicyKind::Lfu];

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::Hybrid => "hybrid",
            PolicyKind::Lru => "lru",
            PolicyKind::Lfu => "lfu",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = LungoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hybrid" => Ok(PolicyKind::Hybrid),
            "lru" => Ok(PolicyKind::Lru),
            "lfu" => Ok(PolicyKind::Lfu),
            other => Err(LungoError::InvalidConfig(format!(
                "unknown policy '{other}' (expected hybrid, lru or lfu)"
            ))),
        }
    }
}

/// Instantiates the policy described by `config`.
pub fn build(config: &PolicyConfig) -> Box<dyn Policy> {
    match config.kind {
        PolicyKind::Hybrid => Box::new(HybridPolicy::with_half_life(config.half_life)),
        PolicyKind::Lru => Box::new(LruPolicy::new()),
        PolicyKind::Lfu => Box::new(LfuPolicy::default()),
    }
}

// ---------------------------------------------------------------------------
// Victim selection shared by all policies
// ---------------------------------------------------------------------------

/// Picks the first resident key of `order` (best victim first).
///
/// Resident keys that have no record are treated as the most evictable of
/// all.  They are looked for with a full scan whenever the cache and the
/// store disagree on count, total size or key digest, or a stale key turns
/// up in `order`; otherwise the walk stops at the first resident key.
pub(crate) fn select_victim<'a>(
    name: &str,
    snapshot: &dyn CacheSnapshot,
    obj: &CacheObject,
    store: &MetadataStore,
    order: impl Iterator<Item = &'a str>,
) -> Option<String> {
    if snapshot.is_empty() {
        warn!("{name}: evict called with no resident entries (incoming {})", obj.key());
        return None;
    }

    let mut consistent = snapshot.len() == store.len()
        && snapshot.size() == store.total_size()
        && snapshot.key_digest() == store.key_digest();
    let mut victim = None;
    for key in order {
        if key != obj.key() && snapshot.contains(key) {
            victim = Some(key);
            break;
        }
        consistent = false;
    }

    if !consistent {
        let orphan = snapshot
            .keys()
            .filter(|key| *key != obj.key() && !store.contains(key))
            .min();
        if let Some(orphan) = orphan {
            warn!("{name}: resident key {orphan} has no metadata; evicting it first");
            return Some(orphan.to_owned());
        }
    }

    victim.map(str::to_owned)
}
