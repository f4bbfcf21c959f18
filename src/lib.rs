//! Subscan: a sharded subscription-commerce storefront scanner
//!
//! This crate scans lists of e-commerce storefronts for subscription-commerce
//! capability, identifies the provider implementing it, records the enrolled
//! catalog items, and merges the per-shard results of many independent worker
//! invocations into one consolidated report.

pub mod config;
pub mod report;
pub mod roster;
pub mod scanner;
pub mod signatures;
pub mod state;

use thiserror::Error;

/// Main error type for Subscan operations
///
/// Only genuinely fatal conditions live here: unreadable input, unwritable
/// output, unbuildable HTTP client, invalid configuration. Everything that
/// happens to a single store during a scan is absorbed into its terminal
/// status and never surfaces as an error.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read input {path}: {source}")]
    Input {
        path: String,
        source: std::io::Error,
    },

    #[error("Output error: {0}")]
    Output(#[from] report::OutputError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read signature file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid value for {variable}: {message}")]
    Env { variable: String, message: String },
}

/// Result type alias for Subscan operations
pub type Result<T> = std::result::Result<T, ScanError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, MergeConfig, ScanConfig, ShardConfig};
pub use roster::{normalize_domain, partition, Shard};
pub use signatures::{KeywordMatcher, ProviderMatcher, SignatureTable, GENERIC_PROVIDER};
pub use state::{ScanStatus, StoreResult, SubscriptionProduct};
