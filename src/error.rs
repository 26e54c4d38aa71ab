use thiserror::Error;

use crate::sim::protocol::{Event, Phase};

pub type Result<T, E = LungoError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum LungoError {
    #[error("Invalid object: {0}")]
    InvalidObject(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Trace error at line {line}: {reason}")]
    Trace { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol violation: {event:?} is not allowed while {from:?}")]
    Protocol { from: Phase, event: Event },

    #[error("No eviction candidate for {key} ({needed} bytes still needed)")]
    NoEvictionCandidate { key: String, needed: u64 },
}
