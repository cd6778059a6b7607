//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (text or JSON lines)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows from the HTTP layer into every request span
//! - Metrics are cheap (atomic increments) and off unless an address is given
//! - /_chaos/stats is the always-on view; Prometheus is for dashboards

pub mod logging;
pub mod metrics;
