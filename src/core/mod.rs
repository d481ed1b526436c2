pub mod config;
pub mod error;
pub mod types;
pub mod workflow;

pub use config::{ConfigLoader, ConfigValidator, OrchdocConfig};
pub use error::AppError;
pub use types::ErrorCategory;
