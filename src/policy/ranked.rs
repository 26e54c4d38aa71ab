use std::cmp::Ordering;
use std::collections::BTreeSet;

use log::{debug, warn};

use super::metadata::{EntryRecord, MetadataStore};
use super::score::{FrequencyWeighted, LeastFrequent, Score};
use super::{select_victim, Policy};
use crate::object::CacheObject;
use crate::snapshot::CacheSnapshot;

/// Frequency-weighted LRU, the default policy.
pub type HybridPolicy = ScoredPolicy<FrequencyWeighted>;

/// Least frequently used, oldest first among equals.
pub type LfuPolicy = ScoredPolicy<LeastFrequent>;

/// Totally ordered `f64` rank (`total_cmp`).
#[derive(Clone, Copy, Debug)]
struct Rank(f64);

impl PartialEq for Rank {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Rank {}

impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Position of one record in the eviction order.
///
/// Field order is the sort order: rank, then recency, then key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Slot {
    rank: Rank,
    recency: u64,
    key: String,
}

impl Slot {
    #[inline]
    fn of<S: Score>(score: &S, record: &EntryRecord) -> Self {
        Slot {
            rank: Rank(score.rank(record)),
            recency: record.recency(),
            key: record.key().to_owned(),
        }
    }
}

/// A policy that evicts the entry with the lowest [`Score`] rank.
///
/// Records live in the [`MetadataStore`]; a `BTreeSet` of slots mirrors
/// them in eviction order.  Ranks are a pure function of a record, so a
/// slot is always rebuilt from the record it was created from and removed
/// before that record changes.  Every hook is O(log n); `evict` is
/// O(log n) while metadata and cache agree.
pub struct ScoredPolicy<S> {
    score: S,
    store: MetadataStore,
    queue: BTreeSet<Slot>,
}

impl<S: Score> ScoredPolicy<S> {
    pub fn new(score: S) -> Self {
        ScoredPolicy {
            score,
            store: MetadataStore::new(),
            queue: BTreeSet::new(),
        }
    }

    pub fn score(&self) -> &S {
        &self.score
    }

    /// Keys in eviction order, best victim first.
    pub fn eviction_order(&self) -> impl Iterator<Item = &str> + '_ {
        self.queue.iter().map(|slot| slot.key.as_str())
    }

    fn admit(&mut self, record: EntryRecord) {
        let slot = Slot::of(&self.score, &record);
        if let Some(old) = self.store.insert(record) {
            self.queue.remove(&Slot::of(&self.score, &old));
        }
        self.queue.insert(slot);
    }
}

impl ScoredPolicy<FrequencyWeighted> {
    pub fn with_half_life(half_life: f64) -> Self {
        Self::new(FrequencyWeighted::new(half_life))
    }
}

impl<S: Score + Default> Default for ScoredPolicy<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S: Score> Policy for ScoredPolicy<S> {
    fn name(&self) -> &'static str {
        S::NAME
    }

    fn evict(&self, snapshot: &dyn CacheSnapshot, obj: &CacheObject) -> Option<String> {
        let victim = select_victim(S::NAME, snapshot, obj, &self.store, self.eviction_order());
        debug!("{}: victim {:?} for incoming {}", S::NAME, victim, obj.key());
        victim
    }

    fn update_after_hit(&mut self, snapshot: &dyn CacheSnapshot, obj: &CacheObject) {
        let now = snapshot.access_count();
        match self.store.get_mut(obj.key()) {
            Some(record) => {
                self.queue.remove(&Slot::of(&self.score, record));
                record.touch(now);
                self.queue.insert(Slot::of(&self.score, record));
            }
            None => {
                warn!("{}: hit on {} without metadata; tracking it afresh", S::NAME, obj.key());
                self.admit(EntryRecord::new(obj.key(), obj.size(), now));
            }
        }
    }

    fn update_after_insert(&mut self, snapshot: &dyn CacheSnapshot, obj: &CacheObject) {
        self.admit(EntryRecord::new(obj.key(), obj.size(), snapshot.access_count()));
    }

    fn update_after_evict(
        &mut self,
        _snapshot: &dyn CacheSnapshot,
        _obj: &CacheObject,
        evicted: &CacheObject,
    ) {
        match self.store.remove(evicted.key()) {
            Some(old) => {
                self.queue.remove(&Slot::of(&self.score, &old));
            }
            None => debug!("{}: no metadata for evicted {}", S::NAME, evicted.key()),
        }
    }

    fn metadata(&self) -> &MetadataStore {
        &self.store
    }
}
