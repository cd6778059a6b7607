//! Startup orchestration.
//!
//! # Responsibilities
//! - Parse the target origin (fatal on failure)
//! - Build the chaos configuration from flags
//! - Overlay the optional configuration file (non-fatal on failure)
//! - Report semantic problems without refusing to start

use std::path::Path;
use thiserror::Error;

use crate::config::args::ProxyArgs;
use crate::config::loader::load_overlay_file;
use crate::config::validation::validate_config;
use crate::config::{ChaosConfig, ListenerConfig, ObservabilityConfig, OverlayConfig, Target, TargetError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Target(#[from] TargetError),
}

/// Everything the binary needs before binding the listener.
#[derive(Debug, Clone)]
pub struct Startup {
    pub target: Target,
    pub chaos: ChaosConfig,
    pub listener: ListenerConfig,
    pub overlay: OverlayConfig,
    pub observability: ObservabilityConfig,
}

pub fn prepare(args: &ProxyArgs) -> Result<Startup, StartupError> {
    let target = Target::parse(args.target.as_deref().unwrap_or_default())?;

    let defaults = ChaosConfig::from_defaults(&args.fault_defaults());
    let overlay = args.overlay();
    let chaos = match &overlay.path {
        Some(path) => apply_file_overlay(path, defaults),
        None => {
            tracing::info!("Using command line configuration");
            defaults
        }
    };

    if let Err(errors) = validate_config(&chaos) {
        for error in errors {
            tracing::warn!(%error, "Questionable chaos configuration");
        }
    }

    tracing::info!(
        delay_min = %chaos.delay_min,
        delay_max = %chaos.delay_max,
        delay_probability = chaos.delay_probability,
        error_probability = chaos.error_probability,
        error_codes = ?chaos.error_codes,
        timeout_duration = %chaos.timeout_duration,
        timeout_probability = chaos.timeout_probability,
        "Configuration loaded"
    );

    Ok(Startup {
        target,
        chaos,
        listener: args.listener(),
        overlay,
        observability: args.observability(),
    })
}

/// Overlay `path` onto `base`. A missing or malformed file keeps `base`.
pub fn apply_file_overlay(path: &Path, base: ChaosConfig) -> ChaosConfig {
    match load_overlay_file(path, &base) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "Loaded configuration file");
            config
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to load config file");
            base
        }
    }
}
