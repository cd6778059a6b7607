//! Fault injection subsystem.
//!
//! # Data Flow
//! ```text
//! proxied request
//!     → stats.rs (count)
//!     → engine.rs (timeout / delay / error gates on one config snapshot)
//!     → Verdict consumed by the HTTP layer
//! ```
//!
//! # Design Decisions
//! - Configuration lives in an ArcSwap; a request never sees a torn update
//! - Counters are atomics; no locks on the request path
//! - Randomness is passed in, so decisions can be replayed with a seeded RNG

pub mod engine;
pub mod stats;

pub use engine::{ChaosEngine, FaultError, Verdict};
pub use stats::{ChaosStats, StatsSnapshot};
