mod builder;
pub mod config;
pub mod error;
mod metrics;
mod object;
pub mod policy;
pub mod sim;
mod snapshot;
pub mod trace;
pub mod weigher;

pub use builder::CacheBuilder;
pub use error::{LungoError, Result};
pub use metrics::stats::Metrics;
pub use object::CacheObject;
pub use sim::{Access, Cache};
pub use snapshot::{CacheSnapshot, KeyDigest};
