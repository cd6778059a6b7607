//! Configuration validation.
//!
//! Serde handles the syntax; this module checks that a decoded
//! [`ChaosConfig`] makes sense. All violations are reported, not just the
//! first. Startup only logs them, management writes reject them.

use thiserror::Error;

use crate::config::duration::ChaosDuration;
use crate::config::schema::ChaosConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be within [0, 1], got {value}")]
    ProbabilityOutOfRange { field: &'static str, value: f64 },

    #[error("delay_min ({min}) exceeds delay_max ({max})")]
    InvertedDelayRange { min: ChaosDuration, max: ChaosDuration },

    #[error("error injection is enabled but error_codes is empty")]
    NoErrorCodes,

    #[error("error code {0} cannot be injected (200-599 with a body, not 204/205/304)")]
    InvalidStatusCode(u16),
}

pub fn validate_config(config: &ChaosConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("delay_probability", config.delay_probability),
        ("error_probability", config.error_probability),
        ("timeout_probability", config.timeout_probability),
    ] {
        if !(0.0..=1.0).contains(&value) {
            errors.push(ValidationError::ProbabilityOutOfRange { field, value });
        }
    }

    if config.delay_min > config.delay_max {
        errors.push(ValidationError::InvertedDelayRange {
            min: config.delay_min,
            max: config.delay_max,
        });
    }

    if config.error_enabled && config.error_codes.is_empty() {
        errors.push(ValidationError::NoErrorCodes);
    }

    errors.extend(
        config
            .error_codes
            .iter()
            .filter(|code| !is_injectable_status(**code))
            .map(|code| ValidationError::InvalidStatusCode(*code)),
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Statuses an injected error may carry: final, and allowed a JSON body.
pub(crate) fn is_injectable_status(code: u16) -> bool {
    (200..=599).contains(&code) && !matches!(code, 204 | 205 | 304)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::FaultDefaults;

    #[test]
    fn defaults_are_valid() {
        let config = ChaosConfig::from_defaults(&FaultDefaults::default());
        assert_eq!(validate_config(&config), Ok(()));
        assert_eq!(validate_config(&ChaosConfig::default()), Ok(()));
    }

    #[test]
    fn reports_every_violation() {
        let config = ChaosConfig {
            delay_enabled: true,
            delay_min: ChaosDuration::from_secs(2),
            delay_max: ChaosDuration::from_secs(1),
            delay_probability: 1.5,
            error_enabled: true,
            error_probability: -0.1,
            ..ChaosConfig::default()
        };

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::NoErrorCodes));
        assert!(errors.contains(&ValidationError::ProbabilityOutOfRange {
            field: "delay_probability",
            value: 1.5,
        }));
    }

    #[test]
    fn flags_non_http_codes() {
        let config = ChaosConfig {
            error_codes: vec![503, 42, 700],
            ..ChaosConfig::default()
        };
        assert_eq!(
            validate_config(&config),
            Err(vec![
                ValidationError::InvalidStatusCode(42),
                ValidationError::InvalidStatusCode(700),
            ])
        );
    }

    #[test]
    fn equal_delay_bounds_are_fine() {
        let config = ChaosConfig {
            delay_min: ChaosDuration::from_millis(50),
            delay_max: ChaosDuration::from_millis(50),
            ..ChaosConfig::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_codes_without_a_json_body() {
        for code in [100, 101, 199, 204, 205, 304] {
            let config = ChaosConfig {
                error_codes: vec![code],
                ..ChaosConfig::default()
            };
            assert_eq!(
                validate_config(&config),
                Err(vec![ValidationError::InvalidStatusCode(code)]),
                "code {code}"
            );
        }
        for code in [200, 418, 429, 500, 599] {
            assert!(is_injectable_status(code), "code {code}");
        }
    }
}
