//! Reference harness: a bounded cache container that drives a [`Policy`]
//! through the hit / evict / insert protocol, and a trace simulator on top.
//!
//! [`Policy`]: crate::policy::Policy

mod cache;
pub mod protocol;
pub mod simulator;

pub use cache::{Access, Cache};
pub use simulator::{Report, Simulator};
