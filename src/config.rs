use std::path::PathBuf;

use crate::error::{LungoError, Result};
use crate::policy::score::DEFAULT_HALF_LIFE;
use crate::policy::PolicyKind;

/// Column layout of a delimited trace file.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceFormat {
    pub path: PathBuf,
    /// 0-based column holding the object key.
    pub key_col: usize,
    /// 0-based column holding the object size in bytes.
    pub size_col: usize,
    pub has_header: bool,
    pub delimiter: String,
}

impl TraceFormat {
    /// `key,size` CSV without a header.
    pub fn csv(path: impl Into<PathBuf>) -> Self {
        TraceFormat {
            path: path.into(),
            key_col: 0,
            size_col: 1,
            has_header: false,
            delimiter: ",".to_string(),
        }
    }
}

/// Everything a simulation needs besides the policy.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Capacity in bytes, or in objects when sizes are ignored.
    pub capacity: u64,
    /// When `false` every object counts as size 1.
    pub consider_obj_size: bool,
    pub trace: TraceFormat,
}

impl CacheConfig {
    pub fn new(capacity: u64, consider_obj_size: bool, trace: TraceFormat) -> Result<Self> {
        let config = CacheConfig {
            capacity,
            consider_obj_size,
            trace,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(LungoError::InvalidConfig(
                "capacity must be a positive integer".into(),
            ));
        }
        if self.trace.delimiter.is_empty() {
            return Err(LungoError::InvalidConfig("delimiter must not be empty".into()));
        }
        if self.consider_obj_size && self.trace.key_col == self.trace.size_col {
            return Err(LungoError::InvalidConfig(format!(
                "key and size both read from column {}",
                self.trace.key_col
            )));
        }
        if !self.trace.path.exists() {
            return Err(LungoError::InvalidConfig(format!(
                "trace path {} does not exist",
                self.trace.path.display()
            )));
        }
        Ok(())
    }
}

/// Which policy to run and its initialization-time tunables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicyConfig {
    pub kind: PolicyKind,
    /// Ticks of extra residency per doubling of hit count (hybrid only).
    pub half_life: f64,
}

impl PolicyConfig {
    pub fn new(kind: PolicyKind) -> Self {
        PolicyConfig {
            kind,
            half_life: DEFAULT_HALF_LIFE,
        }
    }

    pub fn with_half_life(mut self, half_life: f64) -> Result<Self> {
        if !half_life.is_finite() || half_life < 0.0 {
            return Err(LungoError::InvalidConfig(format!(
                "half-life must be a finite non-negative number, got {half_life}"
            )));
        }
        self.half_life = half_life;
        Ok(self)
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self::new(PolicyKind::default())
    }
}
