//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Parse target → Build config from flags → Overlay file → Validate (warn)
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain within grace period → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast only on the target: everything else has a usable fallback
//! - Shutdown has a deadline: in-flight requests, including injected
//!   delays and timeouts, are abandoned once the grace period ends

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
