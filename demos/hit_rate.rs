//! Miss-ratio comparison on a weighted trace: lungo's policies vs Moka vs
//! QuickCache.
//!
//! Objects have sizes between 1 and `MAX_SIZE` and the capacity is in the
//! same units, so every cache is bounded by bytes rather than entry count.
//! Popular keys follow a Zipf(1) law; every `SCAN_EVERY`-th request is a
//! key that never comes back.
//!
//! Run with:
//!     cargo run --example hit_rate --release

use std::time::{Duration, Instant};

use lungo::config::PolicyConfig;
use lungo::policy::PolicyKind;
use lungo::sim::{Report, Simulator};
use lungo::trace::Trace;
use lungo::CacheObject;
use moka::sync::Cache as MokaCache;
use quick_cache::sync::Cache as QuickCache;
use quick_cache::Weighter;

const POOL: u64 = 50_000;
const REQUESTS: usize = 400_000;
const MAX_SIZE: u64 = 16;
/// Roughly 5 % of the bytes in the key universe.
const CAPACITY: u64 = POOL * (MAX_SIZE + 1) / 2 / 20;
const SCAN_EVERY: usize = 5;

/// SplitMix64, enough randomness for a reproducible workload.
struct SplitMix(u64);

impl SplitMix {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Zipf(1) over `0..n` by binary search on the exact cumulative weights.
struct Zipf {
    cdf: Vec<f64>,
}

impl Zipf {
    fn new(n: u64) -> Self {
        let mut total = 0.0;
        let cdf = (1..=n)
            .map(|rank| {
                total += 1.0 / rank as f64;
                total
            })
            .collect::<Vec<_>>();
        Zipf {
            cdf: cdf.iter().map(|c| c / total).collect(),
        }
    }

    fn sample(&self, rng: &mut SplitMix) -> u64 {
        let u = rng.unit();
        self.cdf.partition_point(|&c| c < u) as u64
    }
}

/// Size is a fixed function of the key, as it would be in a real trace.
fn object(id: u64) -> lungo::Result<CacheObject> {
    let size = id.wrapping_mul(0x2545_f491_4f6c_dd1d) % MAX_SIZE + 1;
    CacheObject::new(format!("obj-{id}"), size)
}

fn workload(seed: u64) -> lungo::Result<Trace> {
    let mut rng = SplitMix(seed);
    let zipf = Zipf::new(POOL);
    let requests = (0..REQUESTS)
        .map(|i| {
            if i % SCAN_EVERY == 0 {
                object(POOL + i as u64)
            } else {
                object(zipf.sample(&mut rng))
            }
        })
        .collect::<lungo::Result<_>>()?;
    Ok(Trace::from_requests(requests))
}

/// Misses and wall time of a cache that is not driven by lungo.
struct Outcome {
    misses: u64,
    elapsed: Duration,
}

impl Outcome {
    fn miss_ratio(&self) -> f64 {
        self.misses as f64 / REQUESTS as f64
    }
}

fn replay_moka(trace: &Trace) -> Outcome {
    let cache: MokaCache<String, u64> = MokaCache::builder()
        .max_capacity(CAPACITY)
        .weigher(|_key, size: &u64| u32::try_from(*size).unwrap_or(u32::MAX))
        .build();
    let start = Instant::now();
    let mut misses = 0;
    for obj in trace.requests() {
        if cache.get(obj.key()).is_none() {
            misses += 1;
            cache.insert(obj.key().to_owned(), obj.size());
        }
    }
    Outcome {
        misses,
        elapsed: start.elapsed(),
    }
}

#[derive(Clone)]
struct ObjectSize;

impl Weighter<String, u64> for ObjectSize {
    fn weight(&self, _key: &String, size: &u64) -> u64 {
        *size
    }
}

fn replay_quick_cache(trace: &Trace) -> Outcome {
    let cache: QuickCache<String, u64, ObjectSize> =
        QuickCache::with_weighter(trace.unique_keys(), CAPACITY, ObjectSize);
    let start = Instant::now();
    let mut misses = 0;
    for obj in trace.requests() {
        if cache.get(obj.key()).is_none() {
            misses += 1;
            cache.insert(obj.key().to_owned(), obj.size());
        }
    }
    Outcome {
        misses,
        elapsed: start.elapsed(),
    }
}

fn row(name: &str, misses: u64, miss_ratio: f64, elapsed: Duration) {
    println!(
        "{name:<18} {misses:>10} {:>11.4} {:>10}",
        miss_ratio,
        elapsed.as_millis()
    );
}

fn main() -> lungo::Result<()> {
    env_logger::init();

    let trace = workload(0x5eed_cafe)?;
    println!(
        "{} requests over {} keys, sizes 1..={MAX_SIZE}, capacity {CAPACITY}, 1-in-{SCAN_EVERY} scan\n",
        trace.len(),
        trace.unique_keys()
    );
    println!("{:<18} {:>10} {:>11} {:>10}", "cache", "misses", "miss ratio", "ms");

    let sim = Simulator::with_trace(CAPACITY, trace);
    let mut reports: Vec<Report> = PolicyKind::ALL
        .into_iter()
        .map(|kind| sim.run(&PolicyConfig::new(kind)))
        .collect::<lungo::Result<_>>()?;
    reports.extend(sim.sweep(PolicyKind::Hybrid, &[8.0, 256.0])?);
    for report in &reports {
        let name = match report.policy.kind {
            PolicyKind::Hybrid => format!("lungo/hybrid:{}", report.policy.half_life),
            kind => format!("lungo/{kind}"),
        };
        row(&name, report.metrics.misses, report.miss_ratio(), report.elapsed);
    }

    let moka = replay_moka(sim.trace());
    row("moka", moka.misses, moka.miss_ratio(), moka.elapsed);
    let quick = replay_quick_cache(sim.trace());
    row("quick_cache", quick.misses, quick.miss_ratio(), quick.elapsed);
    Ok(())
}
