use ahash::AHashMap;

use crate::snapshot::KeyDigest;

/// Per-entry metadata kept by a policy for one resident object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryRecord {
    key: String,
    size: u64,
    /// Logical time of the last hit or the insertion.
    recency: u64,
    /// Accesses since insertion, starting at 1.
    frequency: u64,
}

impl EntryRecord {
    pub fn new(key: impl Into<String>, size: u64, now: u64) -> Self {
        EntryRecord {
            key: key.into(),
            size,
            recency: now,
            frequency: 1,
        }
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    #[inline]
    pub fn recency(&self) -> u64 {
        self.recency
    }

    #[inline]
    pub fn frequency(&self) -> u64 {
        self.frequency
    }

    /// Records a hit at logical time `now`.  Recency never moves backwards.
    pub(crate) fn touch(&mut self, now: u64) {
        self.recency = self.recency.max(now);
        self.frequency = self.frequency.saturating_add(1);
    }
}

/// Key → [`EntryRecord`] map that also tracks the summed size.
///
/// Every policy owns exactly one store; nothing else writes to it.
#[derive(Debug, Default)]
pub struct MetadataStore {
    records: AHashMap<String, EntryRecord>,
    total_size: u64,
    digest: KeyDigest,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&EntryRecord> {
        self.records.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut EntryRecord> {
        self.records.get_mut(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// Stores `record`, returning the one it replaced.
    pub(crate) fn insert(&mut self, record: EntryRecord) -> Option<EntryRecord> {
        self.total_size += record.size;
        if !self.records.contains_key(&record.key) {
            self.digest.add(&record.key);
        }
        let old = self.records.insert(record.key.clone(), record);
        if let Some(old) = &old {
            self.total_size -= old.size;
        }
        old
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<EntryRecord> {
        let old = self.records.remove(key)?;
        self.total_size -= old.size;
        self.digest.remove(key);
        Some(old)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of `size` over all records.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Fingerprint of the tracked key set, comparable with
    /// [`CacheSnapshot::key_digest`](crate::CacheSnapshot::key_digest).
    pub fn key_digest(&self) -> KeyDigest {
        self.digest
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.records.keys().map(String::as_str)
    }

    pub fn records(&self) -> impl Iterator<Item = &EntryRecord> + '_ {
        self.records.values()
    }
}
