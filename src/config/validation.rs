//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and the
//! relationships between defaults and limits. All problems are reported at
//! once rather than stopping at the first one.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    let seq = &config.sequencer;
    if seq.default_delays_ms.is_empty() {
        errors.push(ValidationError::new("sequencer.default_delays_ms", "must not be empty"));
    }
    if seq.default_delays_ms.iter().any(|&ms| ms == 0) {
        errors.push(ValidationError::new(
            "sequencer.default_delays_ms",
            "every delay must be greater than 0",
        ));
    }
    if let Some(&longest) = seq.default_delays_ms.iter().max() {
        if longest > seq.max_step_duration_ms {
            errors.push(ValidationError::new(
                "sequencer.default_delays_ms",
                format!("{longest} exceeds max_step_duration_ms ({})", seq.max_step_duration_ms),
            ));
        }
    }
    if seq.step_duration_ms == 0 {
        errors.push(ValidationError::new("sequencer.step_duration_ms", "must be greater than 0"));
    } else if seq.step_duration_ms > seq.max_step_duration_ms {
        errors.push(ValidationError::new(
            "sequencer.step_duration_ms",
            format!("exceeds max_step_duration_ms ({})", seq.max_step_duration_ms),
        ));
    }
    if seq.total_steps > seq.max_total_steps {
        errors.push(ValidationError::new(
            "sequencer.total_steps",
            format!("exceeds max_total_steps ({})", seq.max_total_steps),
        ));
    }

    if config.timeouts.request_secs > 0 {
        let deadline_ms = config.timeouts.request_secs.saturating_mul(1000);
        let sequence_ms = seq
            .default_delays_ms
            .iter()
            .fold(0u64, |acc, &ms| acc.saturating_add(ms));
        if sequence_ms >= deadline_ms {
            errors.push(ValidationError::new(
                "sequencer.default_delays_ms",
                format!("adds up to {sequence_ms} ms, which does not fit timeouts.request_secs ({deadline_ms} ms)"),
            ));
        }
        let plan_ms = u64::from(seq.total_steps).saturating_mul(seq.step_duration_ms);
        if plan_ms >= deadline_ms {
            errors.push(ValidationError::new(
                "sequencer.total_steps",
                format!("total_steps * step_duration_ms is {plan_ms} ms, which does not fit timeouts.request_secs ({deadline_ms} ms)"),
            ));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn reports_every_error() {
        let mut config = ServiceConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.request_secs = 0;
        config.sequencer.default_delays_ms = vec![];
        config.sequencer.step_duration_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "timeouts.request_secs",
                "sequencer.default_delays_ms",
                "sequencer.step_duration_ms",
            ]
        );
    }

    #[test]
    fn defaults_must_fit_limits() {
        let mut config = ServiceConfig::default();
        config.sequencer.max_step_duration_ms = 5000;
        config.sequencer.total_steps = 10;
        config.sequencer.max_total_steps = 5;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "sequencer.default_delays_ms");
        assert!(errors[0].reason.contains("15000"));
        assert_eq!(errors[1].field, "sequencer.total_steps");
    }

    #[test]
    fn defaults_must_finish_within_request_timeout() {
        let mut config = ServiceConfig::default();
        config.timeouts.request_secs = 27;
        config.sequencer.total_steps = 30;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["sequencer.default_delays_ms", "sequencer.total_steps"]);
        assert!(errors[0].reason.contains("27000 ms"));

        config.timeouts.request_secs = 31;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn metrics_address_checked_only_when_enabled() {
        let mut config = ServiceConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
