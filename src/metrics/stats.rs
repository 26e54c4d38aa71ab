/// Counters updated on every cache request.
///
/// The cache is single-threaded, so plain integers suffice.
#[derive(Debug, Default, Clone)]
pub struct StatsCounter {
    hits: u64,
    misses: u64,
    evictions: u64,
    rejections: u64,
}

impl StatsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    #[inline]
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    #[inline]
    pub fn record_eviction(&mut self, count: u64) {
        self.evictions += count;
    }

    /// A miss for an object larger than the whole cache.
    #[inline]
    pub fn record_rejection(&mut self) {
        self.misses += 1;
        self.rejections += 1;
    }

    #[inline]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Returns a point-in-time snapshot of the statistics.
    pub fn snapshot(&self) -> Metrics {
        let total = self.hits + self.misses;
        let hit_rate = if total == 0 {
            0.0_f64
        } else {
            self.hits as f64 / total as f64
        };
        Metrics {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            rejections: self.rejections,
            hit_rate,
        }
    }
}

/// A point-in-time snapshot of cache statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    /// Number of cache hits (key found).
    pub hits: u64,
    /// Number of cache misses, rejections included.
    pub misses: u64,
    /// Number of entries evicted due to capacity pressure.
    pub evictions: u64,
    /// Misses for objects that could never fit.
    pub rejections: u64,
    /// `hits / (hits + misses)`, or `0.0` if no requests have been made.
    pub hit_rate: f64,
}

impl Metrics {
    pub fn request_count(&self) -> u64 {
        self.hits + self.misses
    }

    /// `misses / requests`, or `0.0` if no requests have been made.
    pub fn miss_ratio(&self) -> f64 {
        if self.request_count() == 0 {
            0.0
        } else {
            1.0 - self.hit_rate
        }
    }
}
