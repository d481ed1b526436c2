use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod loader;
pub mod validation;

pub use loader::ConfigLoader;
pub use validation::ConfigValidator;

/// Main configuration loaded from orchdoc.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OrchdocConfig {
    /// Report generation settings
    #[serde(default)]
    pub docs: DocsConfig,

    /// Lint rule settings
    #[serde(default)]
    pub lint: LintConfig,

    /// Remote execution API settings
    #[serde(default)]
    pub remote: RemoteConfig,
}

/// Report generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsConfig {
    /// Embed item scripts in fenced code blocks
    #[serde(default = "default_true")]
    pub include_scripts: bool,

    /// Embed a Mermaid flow diagram
    #[serde(default = "default_true")]
    pub include_diagram: bool,

    /// Stamp reports with the generation time
    #[serde(default)]
    pub timestamp: bool,

    /// Attribute types whose values are masked
    #[serde(default = "default_masked_types")]
    pub masked_types: Vec<String>,

    /// Longest attribute value printed before truncation
    #[serde(default = "default_max_value_len")]
    pub max_value_len: usize,

    /// Heading of the generated index page
    #[serde(default = "default_index_title")]
    pub index_title: String,
}

/// Lint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintConfig {
    /// Regex input and output parameter names must match
    #[serde(default = "default_camel_case")]
    pub parameter_pattern: String,

    /// Regex attribute names must match
    #[serde(default = "default_camel_case")]
    pub attribute_pattern: String,

    /// Rule codes to skip
    #[serde(default)]
    pub disabled_rules: Vec<String>,

    /// Extra regexes scripts must not match
    #[serde(default)]
    pub forbidden_script_patterns: Vec<String>,
}

/// Remote execution API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the orchestrator appliance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Path of the token endpoint, relative to base_url
    #[serde(default = "default_auth_path")]
    pub auth_path: String,

    /// Account used to authenticate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Skip TLS certificate verification
    #[serde(default)]
    pub insecure: bool,

    /// Attempts per request, including the first
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Base delay between attempts (humantime, grows linearly)
    #[serde(default = "default_retry_delay")]
    pub retry_delay: String,

    /// Per-request timeout (humantime)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,

    /// Interval between execution state polls (humantime)
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    /// Give up waiting for an execution after this long (humantime)
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout: String,
}

impl RemoteConfig {
    pub fn retry_delay(&self) -> Result<Duration, humantime::DurationError> {
        humantime::parse_duration(&self.retry_delay)
    }

    pub fn request_timeout(&self) -> Result<Duration, humantime::DurationError> {
        humantime::parse_duration(&self.request_timeout)
    }

    pub fn poll_interval(&self) -> Result<Duration, humantime::DurationError> {
        humantime::parse_duration(&self.poll_interval)
    }

    pub fn wait_timeout(&self) -> Result<Duration, humantime::DurationError> {
        humantime::parse_duration(&self.wait_timeout)
    }
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            include_scripts: true,
            include_diagram: true,
            timestamp: false,
            masked_types: default_masked_types(),
            max_value_len: default_max_value_len(),
            index_title: default_index_title(),
        }
    }
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            parameter_pattern: default_camel_case(),
            attribute_pattern: default_camel_case(),
            disabled_rules: Vec::new(),
            forbidden_script_patterns: Vec::new(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            auth_path: default_auth_path(),
            username: None,
            insecure: false,
            retry_attempts: default_retry_attempts(),
            retry_delay: default_retry_delay(),
            request_timeout: default_request_timeout(),
            poll_interval: default_poll_interval(),
            wait_timeout: default_wait_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_masked_types() -> Vec<String> {
    vec!["SecureString".to_string()]
}

fn default_max_value_len() -> usize {
    80
}

fn default_index_title() -> String {
    "Workflow Documentation".to_string()
}

fn default_camel_case() -> String {
    "^[a-z][a-zA-Z0-9]*$".to_string()
}

fn default_auth_path() -> String {
    "/csp/gateway/am/api/login".to_string()
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay() -> String {
    "2s".to_string()
}

fn default_request_timeout() -> String {
    "30s".to_string()
}

fn default_poll_interval() -> String {
    "5s".to_string()
}

fn default_wait_timeout() -> String {
    "10m".to_string()
}
