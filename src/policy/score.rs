//! Ranking functions for [`ScoredPolicy`](super::ScoredPolicy).
//!
//! A rank must depend only on the record, never on the current time.  That
//! keeps the relative order of two entries fixed between their own updates,
//! which is what lets the policy keep them in an ordered index instead of
//! rescoring everything on each eviction.

use super::metadata::EntryRecord;

/// Default [`FrequencyWeighted::half_life`], in logical ticks.
pub const DEFAULT_HALF_LIFE: f64 = 64.0;

/// Maps a record to its eviction rank.  Lower ranks are evicted first;
/// equal ranks fall back to the older `recency`.
pub trait Score: Send {
    const NAME: &'static str;

    fn rank(&self, record: &EntryRecord) -> f64;
}

/// Frequency-weighted LRU.
///
/// Ranks by `recency + half_life · log2(frequency)`, which orders entries
/// exactly as `frequency / 2^((now − recency) / half_life)` would at any
/// `now`.  Each doubling of an entry's hit count buys it `half_life` more
/// ticks of residency.  A half-life of zero is plain LRU.
///
/// `log2(frequency)` is split into its power-of-two exponent and the log
/// of the odd part.  Frequencies that differ by a power of two then share
/// the fractional term bit for bit, so scores that are exactly equal
/// compare equal and the tie falls through to recency.
#[derive(Clone, Copy, Debug)]
pub struct FrequencyWeighted {
    half_life: f64,
}

impl FrequencyWeighted {
    pub fn new(half_life: f64) -> Self {
        FrequencyWeighted {
            half_life: if half_life.is_finite() { half_life.max(0.0) } else { DEFAULT_HALF_LIFE },
        }
    }

    pub fn half_life(&self) -> f64 {
        self.half_life
    }
}

impl Default for FrequencyWeighted {
    fn default() -> Self {
        Self::new(DEFAULT_HALF_LIFE)
    }
}

impl Score for FrequencyWeighted {
    const NAME: &'static str = "hybrid";

    #[inline]
    fn rank(&self, record: &EntryRecord) -> f64 {
        let frequency = record.frequency().max(1);
        let exponent = frequency.trailing_zeros();
        let odd = frequency >> exponent;
        (record.recency() as f64 + self.half_life * f64::from(exponent))
            + self.half_life * (odd as f64).log2()
    }
}

/// Least frequently used.
#[derive(Clone, Copy, Debug, Default)]
pub struct LeastFrequent;

impl Score for LeastFrequent {
    const NAME: &'static str = "lfu";

    #[inline]
    fn rank(&self, record: &EntryRecord) -> f64 {
        record.frequency() as f64
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn record(recency: u64, hits: u64) -> EntryRecord {
        let mut rec = EntryRecord::new("k", 1, recency);
        for _ in 0..hits {
            rec.touch(recency);
        }
        rec
    }

    #[test]
    fn doubling_frequency_adds_one_half_life() {
        let score = FrequencyWeighted::new(10.0);
        let once = score.rank(&record(100, 0));
        let twice = score.rank(&record(100, 1));
        let four = score.rank(&record(100, 3));
        assert_eq!(once, 100.0);
        assert!((twice - 110.0).abs() < 1e-9);
        assert!((four - 120.0).abs() < 1e-9);
    }

    #[test]
    fn zero_half_life_is_recency() {
        let score = FrequencyWeighted::new(0.0);
        assert_eq!(score.rank(&record(7, 5)), 7.0);
    }

    #[test]
    fn equal_scores_tie_exactly() {
        // 20 / 2^((now - 10) / 64) == 10 / 2^((now - 74) / 64)
        let score = FrequencyWeighted::new(64.0);
        let older = score.rank(&record(10, 19));
        let newer = score.rank(&record(74, 9));
        assert_eq!(older.to_bits(), newer.to_bits());
    }

    proptest! {
        #[test]
        fn proptest_power_of_two_trades_tie_exactly(
            recency in 0u64..100_000,
            odd in (0u64..25).prop_map(|n| 2 * n + 1),
            shift_a in 0u32..6,
            shift_b in 0u32..6,
            half_life in 0u32..256,
        ) {
            // a doubling of frequency is worth exactly one half-life of recency
            let score = FrequencyWeighted::new(f64::from(half_life));
            let h = u64::from(half_life);
            let a = record(recency + h * u64::from(shift_b), (odd << shift_a) - 1);
            let b = record(recency + h * u64::from(shift_a), (odd << shift_b) - 1);
            prop_assert_eq!(score.rank(&a).to_bits(), score.rank(&b).to_bits());
        }
    }

    #[test]
    fn bad_half_life_is_sanitised() {
        assert_eq!(FrequencyWeighted::new(-3.0).half_life(), 0.0);
        assert_eq!(FrequencyWeighted::new(f64::NAN).half_life(), DEFAULT_HALF_LIFE);
    }
}
