use std::collections::{BTreeSet, HashMap};

use lungo::policy::score::{FrequencyWeighted, Score, DEFAULT_HALF_LIFE};
use lungo::policy::{EntryRecord, PolicyKind};
use lungo::{Access, Cache, CacheBuilder, CacheObject};
use proptest::prelude::*;

/// Checks membership consistency and size conservation.
fn assert_consistent(cache: &Cache) {
    let meta = cache.policy().metadata();
    let resident: BTreeSet<&str> = cache.resident_keys().collect();
    let tracked: BTreeSet<&str> = meta.keys().collect();
    assert_eq!(resident, tracked, "metadata keys diverge from resident keys");
    let summed: u64 = meta.records().map(EntryRecord::size).sum();
    assert_eq!(summed, cache.size(), "record sizes do not add up to cache size");
    assert_eq!(meta.total_size(), cache.size());
}

/// Sort key under which `kind` evicts the smallest record first.
fn victim_order(kind: PolicyKind, rec: &EntryRecord) -> (f64, u64) {
    match kind {
        PolicyKind::Hybrid => (FrequencyWeighted::new(DEFAULT_HALF_LIFE).rank(rec), rec.recency()),
        PolicyKind::Lru => (rec.recency() as f64, rec.recency()),
        PolicyKind::Lfu => (rec.frequency() as f64, rec.recency()),
    }
}

/// Score of `rec` at time `now`, computed directly from its definition.
fn decayed_score(rec: &EntryRecord, now: u64) -> f64 {
    let age = now.saturating_sub(rec.recency()) as f64;
    rec.frequency() as f64 / 2f64.powf(age / DEFAULT_HALF_LIFE)
}

/// No other record beats `victim`: a clearly lower score, or an equal score
/// (up to rounding) with an older recency.
fn assert_no_better_victim(victim: &EntryRecord, others: &[EntryRecord], now: u64) {
    let score = decayed_score(victim, now);
    for other in others.iter().filter(|o| o.key() != victim.key()) {
        let theirs = decayed_score(other, now);
        let tol = 1e-9 * score.max(theirs);
        assert!(theirs >= score - tol, "{} scores lower than victim {}", other.key(), victim.key());
        if (theirs - score).abs() <= tol {
            assert!(
                other.recency() >= victim.recency(),
                "{} ties with victim {} but is older",
                other.key(),
                victim.key()
            );
        }
    }
}

struct Xorshift64(u64);

impl Xorshift64 {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }
}

#[test]
fn thousand_interleaved_events_keep_metadata_exact() {
    for kind in PolicyKind::ALL {
        let mut rng = Xorshift64(0x5EED_CAFE_F00D_0001);
        let mut cache = CacheBuilder::new(64).policy(kind).build();
        let mut sizes: HashMap<String, u64> = HashMap::new();
        let (mut hits, mut evictions) = (0, 0);
        for _ in 0..1000 {
            let key = format!("k{}", rng.next() % 40);
            let size = *sizes.entry(key.clone()).or_insert_with(|| rng.next() % 16 + 1);
            match cache.get(&CacheObject::new(key, size).unwrap()).unwrap() {
                Access::Hit => hits += 1,
                Access::Miss { evicted } => evictions += evicted.len(),
                Access::Rejected => unreachable!("every object fits"),
            }
            assert_consistent(&cache);
        }
        let stats = cache.stats();
        assert_eq!(stats.request_count(), 1000);
        assert_eq!(stats.hits, hits);
        assert_eq!(stats.evictions, evictions as u64);
        assert!(hits > 0 && evictions > 0, "{kind}: workload did not exercise both paths");
    }
}

/// Request streams over a small key universe, so hits and evictions mix.
fn requests() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..24, 1..300)
}

proptest! {
    #[test]
    fn proptest_metadata_mirrors_cache(
        capacity in 1u64..40,
        reqs in requests(),
        kind in prop::sample::select(PolicyKind::ALL.to_vec()),
    ) {
        let mut cache = CacheBuilder::new(capacity).policy(kind).build();
        for k in reqs {
            // sizes are a function of the key: objects are immutable
            let obj = CacheObject::new(format!("k{k}"), u64::from(k % 7) + 1).unwrap();
            cache.get(&obj).unwrap();
            assert_consistent(&cache);
            prop_assert!(cache.size() <= capacity);
        }
    }

    #[test]
    fn proptest_recency_never_decreases(
        reqs in requests(),
        kind in prop::sample::select(PolicyKind::ALL.to_vec()),
    ) {
        let mut cache = CacheBuilder::new(10).policy(kind).build();
        let mut last_seen: HashMap<String, u64> = HashMap::new();
        for k in reqs {
            let obj = CacheObject::new(format!("k{k}"), 1).unwrap();
            if let Access::Miss { evicted } = cache.get(&obj).unwrap() {
                for gone in &evicted {
                    last_seen.remove(gone.key());
                }
            }
            for rec in cache.policy().metadata().records() {
                let prev = last_seen.insert(rec.key().to_owned(), rec.recency());
                prop_assert!(prev.map_or(true, |p| p <= rec.recency()));
            }
        }
    }

    #[test]
    fn proptest_victim_is_minimal_and_never_the_incoming_key(
        capacity in 2u64..16,
        reqs in requests(),
        kind in prop::sample::select(PolicyKind::ALL.to_vec()),
    ) {
        let mut cache = CacheBuilder::new(capacity).policy(kind).build();
        for k in reqs {
            let obj = CacheObject::new(format!("k{k}"), 1).unwrap();
            let before: Vec<EntryRecord> = cache.policy().metadata().records().cloned().collect();
            if let Access::Miss { evicted } = cache.get(&obj).unwrap() {
                prop_assert!(evicted.iter().all(|e| e.key() != obj.key()));
                if let Some(first) = evicted.first() {
                    let best = before
                        .iter()
                        .min_by(|a, b| {
                            let (ra, ta) = victim_order(kind, a);
                            let (rb, tb) = victim_order(kind, b);
                            ra.total_cmp(&rb).then(ta.cmp(&tb)).then(a.key().cmp(b.key()))
                        })
                        .map(EntryRecord::key);
                    prop_assert_eq!(Some(first.key()), best);
                    if kind == PolicyKind::Hybrid {
                        let victim = before.iter().find(|r| r.key() == first.key()).unwrap();
                        assert_no_better_victim(victim, &before, cache.access_count());
                    }
                }
            }
        }
    }

    #[test]
    fn proptest_replay_is_deterministic(
        reqs in requests(),
        kind in prop::sample::select(PolicyKind::ALL.to_vec()),
    ) {
        let mut left = CacheBuilder::new(7).policy(kind).build();
        let mut right = CacheBuilder::new(7).policy(kind).build();
        for k in reqs {
            let obj = CacheObject::new(format!("k{k}"), 1).unwrap();
            prop_assert_eq!(left.get(&obj).unwrap(), right.get(&obj).unwrap());
        }
    }
}
