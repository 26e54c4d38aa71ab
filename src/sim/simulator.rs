use std::time::{Duration, Instant};

use log::info;

use crate::builder::CacheBuilder;
use crate::config::{CacheConfig, PolicyConfig};
use crate::error::Result;
use crate::metrics::stats::Metrics;
use crate::policy::PolicyKind;
use crate::sim::Cache;
use crate::trace::Trace;

/// Result of replaying a trace once.
#[derive(Debug, Clone)]
pub struct Report {
    pub policy: PolicyConfig,
    pub metrics: Metrics,
    pub elapsed: Duration,
}

impl Report {
    pub fn miss_ratio(&self) -> f64 {
        self.metrics.miss_ratio()
    }
}

/// Replays a trace against freshly built caches.
///
/// The trace is loaded once; every run starts from a cold cache so runs
/// with different policies are directly comparable.
pub struct Simulator {
    capacity: u64,
    trace: Trace,
}

impl Simulator {
    pub fn new(config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Simulator {
            capacity: config.capacity,
            trace: Trace::load(config)?,
        })
    }

    /// Simulates an already loaded trace.
    pub fn with_trace(capacity: u64, trace: Trace) -> Self {
        assert!(capacity > 0, "capacity must be greater than 0");
        Simulator { capacity, trace }
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn run(&self, policy: &PolicyConfig) -> Result<Report> {
        let mut cache = CacheBuilder::new(self.capacity).policy_config(*policy).build();
        let start = Instant::now();
        self.replay(&mut cache)?;
        let elapsed = start.elapsed();

        let metrics = cache.stats();
        info!(
            "{} (half-life {}): {} requests, miss ratio {:.4}, {:?}",
            policy.kind,
            policy.half_life,
            metrics.request_count(),
            metrics.miss_ratio(),
            elapsed
        );
        Ok(Report {
            policy: *policy,
            metrics,
            elapsed,
        })
    }

    /// Replays the trace through `cache`.
    pub fn replay(&self, cache: &mut Cache) -> Result<()> {
        for obj in self.trace.requests() {
            cache.get(obj)?;
        }
        Ok(())
    }

    /// Runs `kind` once per candidate half-life; best (lowest miss ratio)
    /// first, ties keep candidate order.
    pub fn sweep(&self, kind: PolicyKind, half_lives: &[f64]) -> Result<Vec<Report>> {
        let mut reports = half_lives
            .iter()
            .map(|&h| self.run(&PolicyConfig::new(kind).with_half_life(h)?))
            .collect::<Result<Vec<_>>>()?;
        reports.sort_by(|a, b| a.miss_ratio().total_cmp(&b.miss_ratio()));
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::CacheObject;

    fn trace(keys: &[&str]) -> Trace {
        Trace::from_requests(
            keys.iter()
                .map(|k| CacheObject::new(*k, 1).unwrap())
                .collect(),
        )
    }

    #[test]
    fn miss_ratio_of_simple_trace() {
        // cap 2: a b a c a b -> miss miss hit miss(evict b) hit miss(evict c)
        let sim = Simulator::with_trace(2, trace(&["a", "b", "a", "c", "a", "b"]));
        let report = sim.run(&PolicyConfig::new(PolicyKind::Lru)).unwrap();
        assert_eq!(report.metrics.hits, 2);
        assert_eq!(report.metrics.misses, 4);
        assert_eq!(report.metrics.evictions, 2);
        assert!((report.miss_ratio() - 4.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn frequency_helps_on_repeated_hot_key() {
        // "h" is hot; a scan of cold keys flushes it under LRU but not hybrid
        let mut keys = vec!["h"; 4];
        keys.extend(["c1", "c2", "c3", "h"]);
        let sim = Simulator::with_trace(3, trace(&keys));
        let lru = sim.run(&PolicyConfig::new(PolicyKind::Lru)).unwrap();
        let hybrid = sim.run(&PolicyConfig::new(PolicyKind::Hybrid)).unwrap();
        assert_eq!(lru.metrics.hits, 3);
        assert_eq!(hybrid.metrics.hits, 4);
    }

    #[test]
    fn sweep_sorts_best_first() {
        let mut keys = vec!["h"; 4];
        keys.extend(["c1", "c2", "c3", "h"]);
        let sim = Simulator::with_trace(3, trace(&keys));
        let reports = sim.sweep(PolicyKind::Hybrid, &[0.0, 16.0]).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].policy.half_life, 16.0);
        assert!(reports[0].miss_ratio() < reports[1].miss_ratio());
        assert!(sim.sweep(PolicyKind::Hybrid, &[-1.0]).is_err());
    }
}
