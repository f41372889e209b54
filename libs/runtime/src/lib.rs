//! Application runtime concerns: layered configuration and tracing setup.

pub mod config;
pub mod logging;

pub use config::{AppConfig, DatabaseConfig, ImportSettings, LoggingConfig};
