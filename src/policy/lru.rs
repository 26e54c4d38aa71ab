use ahash::AHashMap;
use log::{debug, warn};

use super::metadata::{EntryRecord, MetadataStore};
use super::{select_victim, Policy};
use crate::object::CacheObject;
use crate::snapshot::CacheSnapshot;

/// Sentinel indices in the `nodes` arena.
const HEAD: usize = 0; // most-recently-used end
const TAIL: usize = 1; // least-recently-used end
const NULL: usize = usize::MAX;

struct LruNode {
    /// `None` only for the HEAD and TAIL sentinels and for freed slots.
    key: Option<String>,
    /// Index toward HEAD (more recently used).
    prev: usize,
    /// Index toward TAIL (less recently used).
    next: usize,
}

/// O(1) LRU policy backed by an index-arena doubly-linked list.
///
/// Nodes are stored in a `Vec<LruNode>` and linked by index, avoiding
/// unsafe raw pointers at the cost of a little indirection.  The list only
/// carries order; recency, frequency and size live in the
/// [`MetadataStore`] like for every other policy.
pub struct LruPolicy {
    /// Index 0 = HEAD sentinel, 1 = TAIL sentinel, 2+ = real entries.
    nodes: Vec<LruNode>,
    /// Maps a key to its index in `nodes`.
    map: AHashMap<String, usize>,
    /// Indices of freed (reusable) slots.
    free_list: Vec<usize>,
    store: MetadataStore,
}

impl LruPolicy {
    pub fn new() -> Self {
        let mut nodes: Vec<LruNode> = Vec::with_capacity(16);
        // HEAD sentinel (index 0): next points to TAIL initially
        nodes.push(LruNode {
            key: None,
            prev: NULL,
            next: TAIL,
        });
        // TAIL sentinel (index 1): prev points to HEAD initially
        nodes.push(LruNode {
            key: None,
            prev: HEAD,
            next: NULL,
        });

        LruPolicy {
            nodes,
            map: AHashMap::new(),
            free_list: Vec::new(),
            store: MetadataStore::new(),
        }
    }

    /// Links `idx` immediately after the HEAD sentinel (marks it most-recently-used).
    fn link_after_head(&mut self, idx: usize) {
        let old_first = self.nodes[HEAD].next;
        self.nodes[idx].prev = HEAD;
        self.nodes[idx].next = old_first;
        self.nodes[HEAD].next = idx;
        self.nodes[old_first].prev = idx;
    }

    /// Detaches `idx` from its current position in the list.
    fn unlink(&mut self, idx: usize) {
        let prev = self.nodes[idx].prev;
        let next = self.nodes[idx].next;
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
        self.nodes[idx].prev = NULL;
        self.nodes[idx].next = NULL;
    }

    /// Allocates a new node (reusing from the free list when available).
    fn alloc_node(&mut self, key: String) -> usize {
        if let Some(idx) = self.free_list.pop() {
            self.nodes[idx].key = Some(key);
            idx
        } else {
            let idx = self.nodes.len();
            self.nodes.push(LruNode {
                key: Some(key),
                prev: NULL,
                next: NULL,
            });
            idx
        }
    }

    /// Moves `key` to the MRU end, linking a fresh node if it is new.
    fn promote(&mut self, key: &str) {
        match self.map.get(key) {
            Some(&idx) => {
                self.unlink(idx);
                self.link_after_head(idx);
            }
            None => {
                let idx = self.alloc_node(key.to_owned());
                self.map.insert(key.to_owned(), idx);
                self.link_after_head(idx);
            }
        }
    }

    /// Keys from least to most recently used.
    pub fn eviction_order(&self) -> impl Iterator<Item = &str> + '_ {
        std::iter::successors(Some(self.nodes[TAIL].prev), move |&idx| {
            Some(self.nodes[idx].prev)
        })
        .take_while(|&idx| idx != HEAD)
        .filter_map(move |idx| self.nodes[idx].key.as_deref())
    }
}

impl Default for LruPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy for LruPolicy {
    fn name(&self) -> &'static str {
        "lru"
    }

    fn evict(&self, snapshot: &dyn CacheSnapshot, obj: &CacheObject) -> Option<String> {
        let victim = select_victim("lru", snapshot, obj, &self.store, self.eviction_order());
        debug!("lru: victim {:?} for incoming {}", victim, obj.key());
        victim
    }

    fn update_after_hit(&mut self, snapshot: &dyn CacheSnapshot, obj: &CacheObject) {
        let now = snapshot.access_count();
        match self.store.get_mut(obj.key()) {
            Some(record) => record.touch(now),
            None => {
                warn!("lru: hit on {} without metadata; tracking it afresh", obj.key());
                self.store.insert(EntryRecord::new(obj.key(), obj.size(), now));
            }
        }
        self.promote(obj.key());
    }

    fn update_after_insert(&mut self, snapshot: &dyn CacheSnapshot, obj: &CacheObject) {
        self.store
            .insert(EntryRecord::new(obj.key(), obj.size(), snapshot.access_count()));
        self.promote(obj.key());
    }

    fn update_after_evict(
        &mut self,
        _snapshot: &dyn CacheSnapshot,
        _obj: &CacheObject,
        evicted: &CacheObject,
    ) {
        if self.store.remove(evicted.key()).is_none() {
            debug!("lru: no metadata for evicted {}", evicted.key());
        }
        if let Some(idx) = self.map.remove(evicted.key()) {
            self.unlink(idx);
            self.nodes[idx].key = None;
            self.free_list.push(idx);
        }
    }

    fn metadata(&self) -> &MetadataStore {
        &self.store
    }
}
