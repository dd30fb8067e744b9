#![allow(clippy::collapsible_if)]

use std::net::SocketAddr;

use http::{HeaderName, HeaderValue};

use crate::config::models::{AppNameOptions, CorrelationIdOptions, HostConfig, LoggingConfig};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Host configuration validator
pub struct HostConfigValidator;

impl HostConfigValidator {
    /// Validate the entire host configuration, collecting every problem before failing.
    ///
    /// Option sections that are absent are not errors here; components that need them
    /// call [`HostConfigValidator::require_correlation_id`] or
    /// [`HostConfigValidator::require_app_name`].
    pub fn validate(config: &HostConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_listen_address(&config.listen_addr) {
            errors.push(e);
        }

        if let Some(app_name) = &config.app_name {
            if let Err(mut app_name_errors) = Self::validate_app_name(app_name) {
                errors.append(&mut app_name_errors);
            }
        }

        if let Some(correlation_id) = &config.correlation_id {
            if let Err(e) = Self::validate_correlation_id(correlation_id) {
                errors.push(e);
            }
        }

        if let Err(e) = Self::validate_logging(&config.logging) {
            errors.push(e);
        }

        if config.shutdown_timeout_secs == 0 {
            errors.push(ValidationError::InvalidField {
                field: "shutdown_timeout_secs".to_string(),
                message: "Shutdown timeout must be greater than 0".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    /// Return the correlation-id options, failing when the section is missing or invalid.
    pub fn require_correlation_id(config: &HostConfig) -> ValidationResult<&CorrelationIdOptions> {
        let options = config
            .correlation_id
            .as_ref()
            .ok_or_else(|| ValidationError::MissingField {
                field: "correlation_id.header_name".to_string(),
            })?;
        Self::validate_correlation_id(options)?;
        Ok(options)
    }

    /// Return the app-name options, failing when the section is missing or invalid.
    pub fn require_app_name(config: &HostConfig) -> ValidationResult<&AppNameOptions> {
        let options = config
            .app_name
            .as_ref()
            .ok_or_else(|| ValidationError::MissingField {
                field: "app_name.app_name".to_string(),
            })?;
        Self::validate_app_name(options).map_err(Self::combine)?;
        Ok(options)
    }

    fn validate_listen_address(address: &str) -> ValidationResult<()> {
        if address.parse::<SocketAddr>().is_err() {
            return Err(ValidationError::InvalidListenAddress {
                address: address.to_string(),
                reason: "Must be in format 'IP:PORT' (e.g., '127.0.0.1:3000' or '0.0.0.0:8080')"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Check the correlation-id options and return the parsed header name.
    pub(crate) fn validate_correlation_id(
        options: &CorrelationIdOptions,
    ) -> ValidationResult<HeaderName> {
        Self::parse_header_name(&options.header_name, "correlation_id.header_name")
    }

    /// Check the app-name options and return the parsed header name and value.
    pub(crate) fn validate_app_name(
        options: &AppNameOptions,
    ) -> Result<(HeaderName, HeaderValue), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let app_name = if options.app_name.trim().is_empty() {
            errors.push(ValidationError::MissingField {
                field: "app_name.app_name".to_string(),
            });
            None
        } else {
            match HeaderValue::from_str(&options.app_name) {
                Ok(value) => Some(value),
                Err(_) => {
                    errors.push(ValidationError::InvalidField {
                        field: "app_name.app_name".to_string(),
                        message: format!(
                            "'{}' cannot be sent as an HTTP header value",
                            options.app_name
                        ),
                    });
                    None
                }
            }
        };

        let header_name = match Self::parse_header_name(&options.header_name, "app_name.header_name")
        {
            Ok(name) => Some(name),
            Err(e) => {
                errors.push(e);
                None
            }
        };

        match (header_name, app_name) {
            (Some(header_name), Some(app_name)) => Ok((header_name, app_name)),
            _ => Err(errors),
        }
    }

    fn parse_header_name(name: &str, field: &str) -> ValidationResult<HeaderName> {
        if name.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: field.to_string(),
            });
        }
        HeaderName::from_bytes(name.as_bytes()).map_err(|_| ValidationError::InvalidField {
            field: field.to_string(),
            message: format!("'{name}' is not a valid HTTP header name"),
        })
    }

    fn validate_logging(logging: &LoggingConfig) -> ValidationResult<()> {
        if tracing_subscriber::EnvFilter::try_new(&logging.level).is_err() {
            return Err(ValidationError::InvalidField {
                field: "logging.level".to_string(),
                message: format!("'{}' is not a valid log filter directive", logging.level),
            });
        }
        Ok(())
    }

    /// A single error is returned as is; several are folded into `ValidationFailed`.
    pub(crate) fn combine(mut errors: Vec<ValidationError>) -> ValidationError {
        if errors.len() == 1 {
            if let Some(error) = errors.pop() {
                return error;
            }
        }
        ValidationError::ValidationFailed {
            message: Self::format_multiple_errors(errors),
        }
    }

    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        if errors.len() == 1 {
            return errors[0].to_string();
        }

        let mut message = format!("Found {} configuration errors:\n", errors.len());
        for (i, error) in errors.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", i + 1, error));
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_valid_config() -> HostConfig {
        HostConfig {
            app_name: Some(AppNameOptions::new("billing-service")),
            correlation_id: Some(CorrelationIdOptions::new("X-Correlation-ID")),
            ..HostConfig::default()
        }
    }

    #[test]
    fn validate_accepts_minimal_config() {
        assert!(HostConfigValidator::validate(&minimal_valid_config()).is_ok());
    }

    #[test]
    fn validate_accepts_absent_option_sections() {
        assert!(HostConfigValidator::validate(&HostConfig::default()).is_ok());
    }

    #[test]
    fn validate_rejects_empty_correlation_header() {
        let mut config = minimal_valid_config();
        config.correlation_id = Some(CorrelationIdOptions::new(""));

        let err = HostConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("correlation_id.header_name"));
    }

    #[test]
    fn validate_rejects_header_name_with_spaces() {
        let mut config = minimal_valid_config();
        config.correlation_id = Some(CorrelationIdOptions::new("Correlation Id"));

        let err = HostConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("not a valid HTTP header name"));
    }

    #[test]
    fn validate_reports_every_problem() {
        let config = HostConfig {
            listen_addr: "not-an-address".to_string(),
            app_name: Some(AppNameOptions {
                app_name: String::new(),
                header_name: String::new(),
            }),
            ..HostConfig::default()
        };

        let err = HostConfigValidator::validate(&config).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Found 3 configuration errors"));
        assert!(message.contains("not-an-address"));
        assert!(message.contains("app_name.app_name"));
        assert!(message.contains("app_name.header_name"));
    }

    #[test]
    fn validate_rejects_zero_shutdown_timeout() {
        let mut config = minimal_valid_config();
        config.shutdown_timeout_secs = 0;
        assert!(HostConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn require_correlation_id_fails_when_missing() {
        let err = HostConfigValidator::require_correlation_id(&HostConfig::default()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingField {
                field: "correlation_id.header_name".to_string()
            }
        );
    }

    #[test]
    fn require_app_name_returns_options() {
        let config = minimal_valid_config();
        let options = HostConfigValidator::require_app_name(&config).unwrap();
        assert_eq!(options.header_name, "App-Name");
    }

    #[test]
    fn require_app_name_keeps_a_single_error_as_is() {
        let config = HostConfig {
            app_name: Some(AppNameOptions::new("  ")),
            ..HostConfig::default()
        };
        let err = HostConfigValidator::require_app_name(&config).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingField {
                field: "app_name.app_name".to_string()
            }
        );
    }

    #[test]
    fn validated_correlation_header_is_parsed() {
        let name = HostConfigValidator::validate_correlation_id(&CorrelationIdOptions::new(
            "X-Correlation-ID",
        ))
        .unwrap();
        assert_eq!(name.as_str(), "x-correlation-id");
    }
}
