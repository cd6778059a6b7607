//! Fault decision engine.
//!
//! # Decision order
//! ```text
//! snapshot = live config (one Arc per request)
//!     → timeout gate  (draw < timeout_probability) → Timeout, stop
//!     → delay gate    (draw < delay_probability)   → remember delay, continue
//!     → error gate    (draw < error_probability)   → Fail(code), stop
//!     → Forward
//! ```
//!
//! Each gate is an independent Bernoulli trial with its own draw, and a gate
//! whose category is disabled draws nothing. Only timeout and error end the
//! request; a delay combines with either a forward or an error.

use arc_swap::ArcSwap;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::chaos::stats::ChaosStats;
use crate::config::loader::{self, ConfigError};
use crate::config::schema::ChaosConfig;
use crate::config::validation::{is_injectable_status, validate_config};
use crate::observability::metrics;

/// Why an error gate that fired could not produce a status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FaultError {
    #[error("error injection is enabled but no error codes are configured")]
    NoErrorCodes,

    #[error("configured error code {0} cannot be injected")]
    InvalidStatus(u16),
}

/// What to do with one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Hold the request for the duration, then answer 504.
    Timeout(Duration),
    /// Optionally wait, then answer with the injected status.
    Fail { delay: Option<Duration>, status: u16 },
    /// Optionally wait, then forward to the target.
    Forward { delay: Option<Duration> },
}

impl Verdict {
    /// Delay applied before the terminal action, if any.
    pub fn delay(&self) -> Option<Duration> {
        match self {
            Verdict::Timeout(_) => None,
            Verdict::Fail { delay, .. } | Verdict::Forward { delay } => *delay,
        }
    }
}

/// Shared fault state: the live configuration and the counters.
#[derive(Debug)]
pub struct ChaosEngine {
    config: ArcSwap<ChaosConfig>,
    stats: ChaosStats,
}

impl ChaosEngine {
    pub fn new(config: ChaosConfig) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            stats: ChaosStats::new(),
        }
    }

    /// Consistent snapshot of the live configuration.
    pub fn config(&self) -> Arc<ChaosConfig> {
        self.config.load_full()
    }

    pub fn stats(&self) -> &ChaosStats {
        &self.stats
    }

    /// Decode a complete configuration document, validate it and make it
    /// live.
    pub fn replace_from_json(&self, document: &[u8]) -> Result<Arc<ChaosConfig>, ConfigError> {
        let config = loader::decode_full(document)?;
        validate_config(&config).map_err(ConfigError::Validation)?;

        let config = Arc::new(config);
        self.config.store(Arc::clone(&config));
        Ok(config)
    }

    /// Merge a partial document onto the live configuration, validate the
    /// result and make it live.
    pub fn apply_overlay(&self, document: &[u8]) -> Result<Arc<ChaosConfig>, ConfigError> {
        let current = self.config.load_full();
        let config = loader::overlay(&current, document)?;
        validate_config(&config).map_err(ConfigError::Validation)?;

        let config = Arc::new(config);
        self.config.store(Arc::clone(&config));
        Ok(config)
    }

    /// Run the three gates against `config` and count what was injected.
    ///
    /// An error gate that fires without a usable code is logged and the
    /// request is forwarded as if the gate had not fired.
    pub fn evaluate<R: Rng>(&self, config: &ChaosConfig, rng: &mut R) -> Verdict {
        if config.timeout_enabled && rng.gen::<f64>() < config.timeout_probability {
            self.stats.record_timeout();
            metrics::record_fault("timeout");
            return Verdict::Timeout(config.timeout_duration.as_std());
        }

        let delay = if config.delay_enabled && rng.gen::<f64>() < config.delay_probability {
            self.stats.record_delay();
            metrics::record_fault("delay");
            Some(sample_delay(config, rng))
        } else {
            None
        };

        if config.error_enabled && rng.gen::<f64>() < config.error_probability {
            match pick_error_code(&config.error_codes, rng) {
                Ok(status) => {
                    self.stats.record_error();
                    metrics::record_fault("error");
                    return Verdict::Fail { delay, status };
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping error injection");
                }
            }
        }

        Verdict::Forward { delay }
    }
}

/// Uniform delay in `[delay_min, delay_max)`. A zero-width or inverted range
/// yields `delay_min` exactly.
pub fn sample_delay<R: Rng>(config: &ChaosConfig, rng: &mut R) -> Duration {
    let min = config.delay_min.as_std();
    let max = config.delay_max.as_std();
    if max <= min {
        return min;
    }

    let span = u64::try_from((max - min).as_nanos()).unwrap_or(u64::MAX);
    min + Duration::from_nanos(rng.gen_range(0..span))
}

/// Choose one code uniformly.
pub fn pick_error_code<R: Rng>(codes: &[u16], rng: &mut R) -> Result<u16, FaultError> {
    if codes.is_empty() {
        return Err(FaultError::NoErrorCodes);
    }
    let code = codes[rng.gen_range(0..codes.len())];
    if !is_injectable_status(code) {
        return Err(FaultError::InvalidStatus(code));
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::duration::ChaosDuration;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn config_with(delay: f64, error: f64, timeout: f64) -> ChaosConfig {
        ChaosConfig {
            delay_enabled: true,
            delay_min: ChaosDuration::from_millis(10),
            delay_max: ChaosDuration::from_millis(20),
            delay_probability: delay,
            error_enabled: true,
            error_codes: vec![500, 503],
            error_probability: error,
            error_message: "boom".into(),
            timeout_enabled: true,
            timeout_duration: ChaosDuration::from_millis(30),
            timeout_probability: timeout,
        }
    }

    #[test]
    fn zero_probabilities_forward_untouched() {
        let engine = ChaosEngine::new(config_with(0.0, 0.0, 0.0));
        let config = engine.config();
        let mut rng = rng();
        for _ in 0..100 {
            assert_eq!(engine.evaluate(&config, &mut rng), Verdict::Forward { delay: None });
        }
        let snapshot = engine.stats().snapshot();
        assert_eq!(snapshot.delays_injected + snapshot.errors_injected + snapshot.timeouts_injected, 0);
    }

    #[test]
    fn timeout_wins_over_everything() {
        let engine = ChaosEngine::new(config_with(1.0, 1.0, 1.0));
        let config = engine.config();
        let verdict = engine.evaluate(&config, &mut rng());

        assert_eq!(verdict, Verdict::Timeout(Duration::from_millis(30)));
        let snapshot = engine.stats().snapshot();
        assert_eq!(snapshot.timeouts_injected, 1);
        assert_eq!(snapshot.delays_injected, 0);
        assert_eq!(snapshot.errors_injected, 0);
    }

    #[test]
    fn delay_combines_with_error() {
        let engine = ChaosEngine::new(config_with(1.0, 1.0, 0.0));
        let config = engine.config();
        let verdict = engine.evaluate(&config, &mut rng());

        match verdict {
            Verdict::Fail { delay: Some(delay), status } => {
                assert!(delay >= Duration::from_millis(10) && delay < Duration::from_millis(20));
                assert!(status == 500 || status == 503);
            }
            other => panic!("unexpected verdict {other:?}"),
        }
        let snapshot = engine.stats().snapshot();
        assert_eq!(snapshot.delays_injected, 1);
        assert_eq!(snapshot.errors_injected, 1);
    }

    #[test]
    fn delay_only_forwards_after_waiting() {
        let engine = ChaosEngine::new(config_with(1.0, 0.0, 0.0));
        let config = engine.config();
        let mut rng = rng();
        for _ in 0..50 {
            let delay = engine.evaluate(&config, &mut rng).delay().unwrap();
            assert!(delay >= Duration::from_millis(10) && delay < Duration::from_millis(20));
        }
        assert_eq!(engine.stats().snapshot().delays_injected, 50);
    }

    #[test]
    fn disabled_categories_never_fire() {
        let mut config = config_with(1.0, 1.0, 1.0);
        config.delay_enabled = false;
        config.error_enabled = false;
        config.timeout_enabled = false;

        let engine = ChaosEngine::new(config);
        let config = engine.config();
        assert_eq!(engine.evaluate(&config, &mut rng()), Verdict::Forward { delay: None });
    }

    #[test]
    fn empty_code_set_passes_through() {
        let mut config = config_with(0.0, 1.0, 0.0);
        config.error_codes.clear();

        let engine = ChaosEngine::new(config);
        let config = engine.config();
        assert_eq!(engine.evaluate(&config, &mut rng()), Verdict::Forward { delay: None });
        assert_eq!(engine.stats().snapshot().errors_injected, 0);
    }

    #[test]
    fn probabilities_are_roughly_honoured() {
        let engine = ChaosEngine::new(config_with(0.0, 0.25, 0.0));
        let config = engine.config();
        let mut rng = rng();
        let failures = (0..10_000)
            .filter(|_| matches!(engine.evaluate(&config, &mut rng), Verdict::Fail { .. }))
            .count();
        assert!((2_000..3_000).contains(&failures), "got {failures}");
    }

    #[test]
    fn degenerate_delay_range_is_fixed() {
        let mut config = config_with(1.0, 0.0, 0.0);
        config.delay_max = config.delay_min;
        let mut rng = rng();
        for _ in 0..20 {
            assert_eq!(sample_delay(&config, &mut rng), Duration::from_millis(10));
        }
    }

    #[test]
    fn pick_error_code_guards_bad_sets() {
        let mut rng = rng();
        assert_eq!(pick_error_code(&[], &mut rng), Err(FaultError::NoErrorCodes));
        assert_eq!(pick_error_code(&[42], &mut rng), Err(FaultError::InvalidStatus(42)));
        assert_eq!(pick_error_code(&[101], &mut rng), Err(FaultError::InvalidStatus(101)));
        assert_eq!(pick_error_code(&[418], &mut rng), Ok(418));
    }

    #[test]
    fn every_configured_code_gets_picked() {
        let codes = [500, 502, 503, 504];
        let mut seen = std::collections::HashSet::new();
        let mut rng = rng();
        for _ in 0..200 {
            seen.insert(pick_error_code(&codes, &mut rng).unwrap());
        }
        assert_eq!(seen.len(), codes.len());
    }

    #[test]
    fn replace_from_json_swaps_whole_config() {
        let engine = ChaosEngine::new(config_with(0.5, 0.5, 0.5));
        let before = engine.config();

        engine
            .replace_from_json(br#"{"error_enabled":true,"error_codes":[503],"error_probability":1}"#)
            .unwrap();

        let after = engine.config();
        assert_eq!(after.error_codes, vec![503]);
        assert!(!after.delay_enabled);
        assert_eq!(after.timeout_probability, 0.0);
        // The old snapshot is untouched.
        assert_eq!(before.delay_probability, 0.5);
    }

    #[test]
    fn rejected_writes_leave_config_alone() {
        let engine = ChaosEngine::new(config_with(0.5, 0.5, 0.5));
        assert!(matches!(engine.replace_from_json(b"{oops"), Err(ConfigError::Parse(_))));
        assert!(matches!(
            engine.replace_from_json(br#"{"error_enabled":true}"#),
            Err(ConfigError::Validation(_))
        ));
        assert_eq!(*engine.config(), config_with(0.5, 0.5, 0.5));
    }

    #[test]
    fn overlay_merges_onto_live_config() {
        let engine = ChaosEngine::new(config_with(0.5, 0.5, 0.5));
        engine.apply_overlay(br#"{"delay_probability": 0.9}"#).unwrap();

        let config = engine.config();
        assert_eq!(config.delay_probability, 0.9);
        assert_eq!(config.error_probability, 0.5);
        assert_eq!(config.error_codes, vec![500, 503]);
    }
}
