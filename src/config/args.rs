//! Command-line flags for the `chaos-proxy` binary.

use clap::{Parser, ValueEnum};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::config::duration::ChaosDuration;
use crate::config::schema::{FaultDefaults, ListenerConfig, ObservabilityConfig, OverlayConfig};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "chaos-proxy", version)]
#[command(about = "Fault-injecting HTTP reverse proxy for resilience testing", long_about = None)]
pub struct ProxyArgs {
    /// Port to run the chaos proxy on
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Interface to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Target service URL (required)
    #[arg(long)]
    pub target: Option<String>,

    /// Minimum delay duration
    #[arg(long, default_value = "100ms")]
    pub delay_min: ChaosDuration,

    /// Maximum delay duration
    #[arg(long, default_value = "2s")]
    pub delay_max: ChaosDuration,

    /// Probability of delay injection (0.0-1.0)
    #[arg(long, default_value_t = 0.1)]
    pub delay_prob: f64,

    /// Probability of error injection (0.0-1.0)
    #[arg(long, default_value_t = 0.05)]
    pub error_prob: f64,

    /// Comma-separated list of error codes to inject
    #[arg(long, default_value = "500,502,503,504")]
    pub error_codes: String,

    /// Error message for injected errors
    #[arg(long, default_value = "Chaos engineering fault injection")]
    pub error_msg: String,

    /// Timeout duration
    #[arg(long, default_value = "30s")]
    pub timeout_dur: ChaosDuration,

    /// Probability of timeout injection (0.0-1.0)
    #[arg(long, default_value_t = 0.02)]
    pub timeout_prob: f64,

    /// JSON configuration file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Re-apply the configuration file whenever it changes
    #[arg(long, requires = "config")]
    pub watch_config: bool,

    /// How long in-flight requests may finish after a shutdown signal
    #[arg(long, default_value = "10s")]
    pub shutdown_grace: ChaosDuration,

    /// Expose Prometheus metrics on this address
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl ProxyArgs {
    pub fn fault_defaults(&self) -> FaultDefaults {
        FaultDefaults {
            delay_min: self.delay_min,
            delay_max: self.delay_max,
            delay_probability: self.delay_prob,
            error_probability: self.error_prob,
            error_codes: self.error_codes.clone(),
            error_message: self.error_msg.clone(),
            timeout_duration: self.timeout_dur,
            timeout_probability: self.timeout_prob,
        }
    }

    pub fn listener(&self) -> ListenerConfig {
        ListenerConfig {
            bind_address: SocketAddr::new(self.bind, self.port),
            shutdown_grace: self.shutdown_grace,
        }
    }

    pub fn overlay(&self) -> OverlayConfig {
        OverlayConfig {
            path: self.config.clone(),
            watch: self.watch_config,
        }
    }

    pub fn observability(&self) -> ObservabilityConfig {
        ObservabilityConfig {
            metrics_address: self.metrics_addr,
        }
    }
}
