use crate::config::PolicyConfig;
use crate::policy::{self, Policy, PolicyKind};
use crate::sim::Cache;

/// Builder for configuring and constructing a [`Cache`].
///
/// # Example
/// ```
/// use lungo::CacheBuilder;
/// use lungo::policy::PolicyKind;
///
/// let cache = CacheBuilder::new(1_000)
///     .policy(PolicyKind::Hybrid)
///     .half_life(32.0)
///     .build();
/// assert_eq!(cache.policy().name(), "hybrid");
/// ```
pub struct CacheBuilder {
    capacity: u64,
    config: PolicyConfig,
    custom: Option<Box<dyn Policy>>,
}

impl CacheBuilder {
    pub fn new(capacity: u64) -> Self {
        assert!(capacity > 0, "capacity must be greater than 0");
        CacheBuilder {
            capacity,
            config: PolicyConfig::default(),
            custom: None,
        }
    }

    /// Select one of the built-in policies (default: hybrid).
    pub fn policy(mut self, kind: PolicyKind) -> Self {
        self.config.kind = kind;
        self
    }

    /// Ticks of residency bought by each doubling of hit count (hybrid only).
    pub fn half_life(mut self, half_life: f64) -> Self {
        assert!(
            half_life.is_finite() && half_life >= 0.0,
            "half_life must be finite and non-negative"
        );
        self.config.half_life = half_life;
        self
    }

    /// Take kind and tunables from an already validated [`PolicyConfig`].
    pub fn policy_config(mut self, config: PolicyConfig) -> Self {
        self.config = config;
        self
    }

    /// Use any type that implements the [`Policy`] trait.
    pub fn policy_impl<P: Policy + 'static>(mut self, policy: P) -> Self {
        self.custom = Some(Box::new(policy));
        self
    }

    pub fn build(self) -> Cache {
        let policy = match self.custom {
            Some(custom) => custom,
            None => policy::build(&self.config),
        };
        Cache::new(self.capacity, policy)
    }
}
