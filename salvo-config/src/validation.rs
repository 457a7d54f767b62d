//! Configuration validation traits and utilities

use crate::error::{ConfigError, ConfigResult};

/// Trait for validatable configuration
pub trait Validatable {
    /// Validate the configuration
    fn validate(&self) -> ConfigResult<()>;

    /// Get the domain name for error reporting
    fn domain_name(&self) -> &'static str;

    /// Helper to create a domain-specific validation error
    fn validation_error(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::DomainError {
            domain: self.domain_name().to_string(),
            message: message.into(),
        }
    }
}

/// Validate a required string field
pub fn validate_required_string(value: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} cannot be empty", field_name),
        });
    }
    Ok(())
}

/// Validate a positive number
pub fn validate_positive<T>(value: T, field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + Default + std::fmt::Display,
{
    if value <= T::default() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be greater than 0, got {}", field_name, value),
        });
    }
    Ok(())
}

/// Validate that a host:port style address parses once a scheme is attached
pub fn validate_address(address: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    validate_required_string(address, field_name, domain)?;

    let candidate = if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    };

    url::Url::parse(&candidate).map_err(|e| ConfigError::DomainError {
        domain: domain.to_string(),
        message: format!("{} has invalid address format: {}", field_name, e),
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required_string() {
        assert!(validate_required_string("perf", "program", "profiler").is_ok());
        assert!(validate_required_string("", "program", "profiler").is_err());
        assert!(validate_required_string("   ", "program", "profiler").is_err());
    }

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive(1u32, "shot_count", "load").is_ok());
        assert!(validate_positive(0u32, "shot_count", "load").is_err());
    }

    #[test]
    fn test_validate_address() {
        assert!(validate_address("localhost:8080", "base_address", "load").is_ok());
        assert!(validate_address("http://127.0.0.1:8080", "base_address", "load").is_ok());
        assert!(validate_address("", "base_address", "load").is_err());
        assert!(validate_address("local host:80", "base_address", "load").is_err());
    }
}
