#![allow(clippy::result_large_err)]

use super::OrchdocConfig;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use regex::Regex;
use url::Url;

pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration rules
    pub fn validate(config: &OrchdocConfig) -> Result<(), AppError> {
        if config.docs.max_value_len == 0 {
            return Err(invalid("docs.max_value_len must be greater than zero"));
        }

        for (key, pattern) in [
            ("lint.parameter_pattern", &config.lint.parameter_pattern),
            ("lint.attribute_pattern", &config.lint.attribute_pattern),
        ] {
            Regex::new(pattern)
                .map_err(|err| invalid(format!("{} is not a valid regex: {}", key, err)))?;
        }
        for pattern in &config.lint.forbidden_script_patterns {
            Regex::new(pattern).map_err(|err| {
                invalid(format!(
                    "lint.forbidden_script_patterns entry '{}' is not a valid regex: {}",
                    pattern, err
                ))
            })?;
        }

        let remote = &config.remote;
        if let Some(base_url) = &remote.base_url {
            let parsed = Url::parse(base_url)
                .map_err(|err| invalid(format!("invalid remote.base_url: {}", err)))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(invalid("remote.base_url must use http or https"));
            }
        }
        if !remote.auth_path.starts_with('/') {
            return Err(invalid("remote.auth_path must start with '/'"));
        }
        if remote.retry_attempts == 0 {
            return Err(invalid("remote.retry_attempts must be at least 1"));
        }
        for (key, result) in [
            ("remote.retry_delay", remote.retry_delay()),
            ("remote.request_timeout", remote.request_timeout()),
            ("remote.poll_interval", remote.poll_interval()),
            ("remote.wait_timeout", remote.wait_timeout()),
        ] {
            result.map_err(|err| invalid(format!("{} is not a valid duration: {}", key, err)))?;
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::new(ErrorCategory::ConfigError, message).with_code("CONFIG_INVALID")
}
