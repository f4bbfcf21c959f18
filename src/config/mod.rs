//! Configuration module for Subscan
//!
//! Execution parameters come from `SUBSCAN_*` environment variables with CLI
//! flags taking precedence; this module holds the typed configuration,
//! the environment layer, and validation.
//!
//! # Example
//!
//! ```no_run
//! use subscan::config::{validate, Config, ScanConfig, ShardConfig};
//!
//! let config = Config {
//!     input_path: "stores.csv".into(),
//!     output_dir: "results".into(),
//!     signature_file: None,
//!     shard: ShardConfig { index: 0, count: 4 },
//!     scan: ScanConfig::default(),
//! };
//! validate(&config).unwrap();
//! ```

mod env;
mod types;
mod validation;

// Re-export types
pub use types::{Config, MergeConfig, ScanConfig, ShardConfig};

// Re-export the environment layer
pub use env::{
    parsed_env, string_env, ENV_CONCURRENCY, ENV_INPUT, ENV_OUTPUT, ENV_SHARD_COUNT,
    ENV_SHARD_INDEX,
};

// Re-export validation
pub use validation::{validate, validate_merge_config, validate_scan_config, validate_shard_config};
