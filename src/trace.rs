//! Delimited request traces.
//!
//! One request per line; the key and size columns are picked by
//! [`TraceFormat`].  Keys are kept verbatim as strings.

use std::fs::File;
use std::io::{BufRead, BufReader};

use log::info;

use crate::config::{CacheConfig, TraceFormat};
use crate::error::{LungoError, Result};
use crate::object::CacheObject;
use crate::weigher::{self, Weigher};

/// An in-memory request sequence.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    requests: Vec<CacheObject>,
}

impl Trace {
    /// Loads the trace described by `config`, weighing objects by size or
    /// as 1 each depending on `consider_obj_size`.
    pub fn load(config: &CacheConfig) -> Result<Self> {
        let file = File::open(&config.trace.path)?;
        let trace = Self::parse(
            BufReader::new(file),
            &config.trace,
            weigher::for_sizes(config.consider_obj_size),
        )?;
        info!(
            "loaded {} requests from {}",
            trace.len(),
            config.trace.path.display()
        );
        Ok(trace)
    }

    pub fn parse<R: BufRead>(reader: R, format: &TraceFormat, weigher: &dyn Weigher) -> Result<Self> {
        let mut requests = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let lineno = idx + 1;
            if (format.has_header && idx == 0) || line.trim().is_empty() {
                continue;
            }
            requests.push(parse_line(&line, lineno, format, weigher)?);
        }
        Ok(Trace { requests })
    }

    pub fn from_requests(requests: Vec<CacheObject>) -> Self {
        Trace { requests }
    }

    pub fn requests(&self) -> &[CacheObject] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Number of distinct keys.
    pub fn unique_keys(&self) -> usize {
        self.requests
            .iter()
            .map(CacheObject::key)
            .collect::<ahash::AHashSet<_>>()
            .len()
    }
}

fn parse_line(line: &str, lineno: usize, format: &TraceFormat, weigher: &dyn Weigher) -> Result<CacheObject> {
    let fields: Vec<&str> = line.split(format.delimiter.as_str()).map(str::trim).collect();
    let column = |col: usize, what: &str| {
        fields.get(col).copied().ok_or_else(|| LungoError::Trace {
            line: lineno,
            reason: format!("missing {what} column {col} ({} fields)", fields.len()),
        })
    };

    let key = column(format.key_col, "key")?;
    let raw = column(format.size_col, "size")?;
    let raw_size = raw.parse::<u64>().ok().filter(|&s| s > 0).ok_or_else(|| LungoError::Trace {
        line: lineno,
        reason: format!("size '{raw}' is not a positive integer"),
    })?;

    CacheObject::new(key, weigher.weigh(raw_size)).map_err(|e| LungoError::Trace {
        line: lineno,
        reason: e.to_string(),
    })
}
