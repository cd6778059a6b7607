//! Configuration schema definitions.
//!
//! [`ChaosConfig`] is the live, JSON-serializable fault configuration. The
//! remaining types describe process-level settings that are fixed at startup.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::config::duration::ChaosDuration;

/// Fault-injection parameters.
///
/// `Default` is the all-zero configuration: every category disabled, zero
/// durations, empty code list. A management write that omits a field leaves
/// that field at this zero value.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ChaosConfig {
    /// Inject latency before forwarding.
    pub delay_enabled: bool,

    /// Lower bound of the injected delay (inclusive).
    pub delay_min: ChaosDuration,

    /// Upper bound of the injected delay (exclusive unless equal to `delay_min`).
    pub delay_max: ChaosDuration,

    /// Chance in [0, 1] that a request is delayed.
    pub delay_probability: f64,

    /// Replace the backend response with an injected error.
    pub error_enabled: bool,

    /// Status codes to choose from, uniformly.
    pub error_codes: Vec<u16>,

    /// Chance in [0, 1] that a request fails.
    pub error_probability: f64,

    /// Message placed in the injected error body.
    pub error_message: String,

    /// Hold the request and answer 504.
    pub timeout_enabled: bool,

    /// How long an injected timeout holds the request.
    pub timeout_duration: ChaosDuration,

    /// Chance in [0, 1] that a request times out.
    pub timeout_probability: f64,
}

/// Primitive startup inputs for [`ChaosConfig::from_defaults`].
#[derive(Debug, Clone, PartialEq)]
pub struct FaultDefaults {
    pub delay_min: ChaosDuration,
    pub delay_max: ChaosDuration,
    pub delay_probability: f64,
    pub error_probability: f64,
    /// Comma-separated status codes, e.g. `"500,502,503"`.
    pub error_codes: String,
    pub error_message: String,
    pub timeout_duration: ChaosDuration,
    pub timeout_probability: f64,
}

impl Default for FaultDefaults {
    fn default() -> Self {
        Self {
            delay_min: ChaosDuration::from_millis(100),
            delay_max: ChaosDuration::from_secs(2),
            delay_probability: 0.1,
            error_probability: 0.05,
            error_codes: "500,502,503,504".to_string(),
            error_message: "Chaos engineering fault injection".to_string(),
            timeout_duration: ChaosDuration::from_secs(30),
            timeout_probability: 0.02,
        }
    }
}

impl ChaosConfig {
    /// Build a configuration with every category enabled from startup inputs.
    pub fn from_defaults(defaults: &FaultDefaults) -> Self {
        Self {
            delay_enabled: true,
            delay_min: defaults.delay_min,
            delay_max: defaults.delay_max,
            delay_probability: defaults.delay_probability,
            error_enabled: true,
            error_codes: parse_error_codes(&defaults.error_codes),
            error_probability: defaults.error_probability,
            error_message: defaults.error_message.clone(),
            timeout_enabled: true,
            timeout_duration: defaults.timeout_duration,
            timeout_probability: defaults.timeout_probability,
        }
    }
}

/// Split a comma-separated code list. Tokens that are not integers are
/// dropped without failing the whole list.
pub fn parse_error_codes(list: &str) -> Vec<u16> {
    list.split(',')
        .filter_map(|token| token.trim().parse().ok())
        .collect()
}

/// Listener configuration.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: SocketAddr,

    /// How long in-flight requests may run after a shutdown signal.
    pub shutdown_grace: ChaosDuration,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            shutdown_grace: ChaosDuration::from_secs(10),
        }
    }
}

/// Where the JSON overlay lives and whether to follow it.
#[derive(Debug, Clone, Default)]
pub struct OverlayConfig {
    pub path: Option<PathBuf>,
    pub watch: bool,
}

/// Observability settings.
#[derive(Debug, Clone, Default)]
pub struct ObservabilityConfig {
    /// Prometheus exporter address; metrics are not exported when unset.
    pub metrics_address: Option<SocketAddr>,
}
