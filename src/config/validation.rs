//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the knock sequence is actually completable (distinct ports, all
//!   inside the monitored range)
//! - Detect port collisions between the knock range and the service port
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PortcullisConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use thiserror::Error;

use crate::config::schema::PortcullisConfig;

/// A single semantic violation in a parsed configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The knock sequence has no steps.
    #[error("knock sequence is empty")]
    EmptySequence,

    /// The same port appears twice in the sequence.
    #[error("knock sequence repeats port {0}")]
    DuplicateSequencePort(u16),

    /// A sequence port has no listener, so the sequence can never complete.
    #[error("sequence port {port} is outside the monitored range {start}-{end}")]
    SequencePortOutsideRange { port: u16, start: u16, end: u16 },

    /// The monitored range is inverted.
    #[error("port range start {start} is greater than end {end}")]
    InvertedPortRange { start: u16, end: u16 },

    /// The protected service would collide with a knock listener.
    #[error("service port {0} lies inside the monitored knock range")]
    ServicePortInKnockRange(u16),

    /// A zero-length grant makes every completed sequence useless.
    #[error("grant_secs must be greater than zero")]
    ZeroGrantDuration,
}

/// Validate a parsed configuration, collecting every violation.
pub fn validate_config(config: &PortcullisConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let range = config.knock.port_range;

    if config.knock.sequence.is_empty() {
        errors.push(ValidationError::EmptySequence);
    }

    let mut seen = HashSet::new();
    for &port in &config.knock.sequence {
        if !seen.insert(port) {
            errors.push(ValidationError::DuplicateSequencePort(port));
        }
        if !range.contains(port) {
            errors.push(ValidationError::SequencePortOutsideRange {
                port,
                start: range.start,
                end: range.end,
            });
        }
    }

    if range.start > range.end {
        errors.push(ValidationError::InvertedPortRange {
            start: range.start,
            end: range.end,
        });
    }

    if range.contains(config.service.port) {
        errors.push(ValidationError::ServicePortInKnockRange(config.service.port));
    }

    if config.knock.grant_secs == 0 {
        errors.push(ValidationError::ZeroGrantDuration);
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
    use crate::config::schema::PortRange;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&PortcullisConfig::default()).is_ok());
    }

    #[test]
    fn empty_sequence_rejected() {
        let mut config = PortcullisConfig::default();
        config.knock.sequence.clear();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::EmptySequence));
    }

    #[test]
    fn duplicate_sequence_port_rejected() {
        let mut config = PortcullisConfig::default();
        config.knock.sequence = vec![45010, 45030, 45010];
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicateSequencePort(45010)));
    }

    #[test]
    fn sequence_port_outside_range_rejected() {
        let mut config = PortcullisConfig::default();
        config.knock.sequence = vec![45010, 46000, 45020];
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::SequencePortOutsideRange {
            port: 46000,
            start: 45000,
            end: 45099,
        }));
    }

    #[test]
    fn service_port_inside_range_rejected() {
        let mut config = PortcullisConfig::default();
        config.service.port = 45050;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::ServicePortInKnockRange(45050)));
    }

    #[test]
    fn zero_grant_rejected() {
        let mut config = PortcullisConfig::default();
        config.knock.grant_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::ZeroGrantDuration));
    }

    #[test]
    fn all_violations_are_collected() {
        let mut config = PortcullisConfig::default();
        config.knock.sequence = vec![50000, 50000];
        config.knock.port_range = PortRange { start: 45099, end: 45000 };
        config.knock.grant_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        // duplicate + two out-of-range + inverted range + zero grant
        assert!(errors.len() >= 4, "got {:?}", errors);
    }
}
