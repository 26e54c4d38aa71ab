//! The calling protocol between a cache driver and its policy.
//!
//! ```text
//!            Hit
//!          ┌─────┐
//!          ▼     │   Evict          Evict
//!         Idle ──┴────────► Evicting ◄──┐
//!          ▲ │                │  └──────┘
//!   Settle │ │ Insert         │ Insert
//!          │ ▼                ▼
//!         Inserted ◄──────────┘
//! ```
//!
//! A request is either a hit (`Idle → Idle`) or a miss that drains zero or
//! more evictions, inserts, and settles back to `Idle`.

use crate::error::{LungoError, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Evicting,
    Inserted,
}

/// A policy call, as seen by the monitor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// `update_after_hit`.
    Hit,
    /// One `evict` + `update_after_evict` round.
    Evict,
    /// `update_after_insert`.
    Insert,
    /// The request is finished.
    Settle,
}

/// Tracks the current [`Phase`] and rejects out-of-order events.
#[derive(Debug, Default)]
pub struct ProtocolMonitor {
    phase: Phase,
}

impl ProtocolMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Abandons the request in flight.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
    }

    /// Applies `event`, leaving the phase untouched on error.
    pub fn observe(&mut self, event: Event) -> Result<Phase> {
        let next = match (self.phase, event) {
            (Phase::Idle, Event::Hit) => Phase::Idle,
            (Phase::Idle | Phase::Evicting, Event::Evict) => Phase::Evicting,
            (Phase::Idle | Phase::Evicting, Event::Insert) => Phase::Inserted,
            (Phase::Inserted, Event::Settle) | (Phase::Idle, Event::Settle) => Phase::Idle,
            (from, event) => return Err(LungoError::Protocol { from, event }),
        };
        self.phase = next;
        Ok(next)
    }
}
