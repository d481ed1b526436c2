use serde::{Deserialize, Serialize};

/// Broad class of an [`AppError`](crate::core::AppError).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Input is well-formed XML but not a usable workflow definition.
    ValidationError,
    ParseError,
    ConfigError,
    IoError,
}

impl ErrorCategory {
    pub fn default_code(&self) -> &'static str {
        match self {
            ErrorCategory::ValidationError => "VALIDATION_ERROR",
            ErrorCategory::ParseError => "PARSE_ERROR",
            ErrorCategory::ConfigError => "CONFIG_ERROR",
            ErrorCategory::IoError => "IO_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
