use crate::core::types::ErrorCategory;
use std::collections::BTreeMap;

/// Error raised while reading, validating or documenting workflow definitions.
///
/// `code` is a stable identifier callers and tests match on (`WORKFLOW_XML`,
/// `CONFIG_INVALID`, ...); when none is set it falls back to the category's code.
#[derive(Debug)]
pub struct AppError {
    pub category: ErrorCategory,
    pub code: String,
    pub message: String,
    pub context: BTreeMap<String, String>,
    pub suggestions: Vec<String>,
    pub source: Option<anyhow::Error>,
}

impl AppError {
    pub fn new<T: Into<String>>(category: ErrorCategory, message: T) -> Self {
        AppError {
            category,
            code: category.default_code().to_string(),
            message: message.into(),
            context: BTreeMap::new(),
            suggestions: Vec::new(),
            source: None,
        }
    }

    pub fn with_source<T: Into<String>>(
        category: ErrorCategory,
        message: T,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        let mut error = AppError::new(category, message);
        error.source = Some(source.into());
        error
    }

    pub fn with_code<T: Into<String>>(mut self, code: T) -> Self {
        self.code = code.into();
        self
    }

    /// Hint printed after the message, e.g. which flag or file to fix.
    pub fn with_suggestion<T: Into<String>>(mut self, suggestion: T) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn add_context(&mut self, key: &str, value: &str) {
        self.context.insert(key.to_string(), value.to_string());
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        for (key, value) in &self.context {
            write!(f, " ({}: {})", key, value)?;
        }
        if let Some(ref source) = self.source {
            write!(f, ": {}", source)?;
        }
        for suggestion in &self.suggestions {
            write!(f, "\n  hint: {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        let message = e.to_string();
        AppError::with_source(ErrorCategory::IoError, message, e)
            .with_suggestion("check that the path exists and is readable")
    }
}
