//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command-line flags (args.rs)
//!     → FaultDefaults → ChaosConfig::from_defaults (schema.rs)
//!     → optional JSON file overlay (loader.rs, merge)
//!     → validation.rs (warnings at startup)
//!     → ArcSwap<ChaosConfig> inside the chaos engine
//!
//! At runtime:
//!     POST/PUT /_chaos/config → loader::decode_full → validation → swap
//!     watcher.rs file change  → loader::overlay onto live config → swap
//! ```
//!
//! # Design Decisions
//! - A ChaosConfig value is immutable once published; changes swap the whole value
//! - Durations use their own codec (duration.rs): number or string in, string out
//! - The target origin is parsed once and never changes (target.rs)

pub mod args;
pub mod duration;
pub mod loader;
pub mod schema;
pub mod target;
pub mod validation;
pub mod watcher;

pub use duration::ChaosDuration;
pub use loader::ConfigError;
pub use schema::{ChaosConfig, FaultDefaults, ListenerConfig, ObservabilityConfig, OverlayConfig};
pub use target::{Target, TargetError};
