//! Environment-variable configuration layer
//!
//! Every execution parameter can come from a `SUBSCAN_*` variable; CLI flags
//! take precedence during assembly in the binary. Parsing failures surface
//! as configuration errors naming the offending variable.

use crate::{ConfigError, ConfigResult};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Input roster path
pub const ENV_INPUT: &str = "SUBSCAN_INPUT";
/// Output directory
pub const ENV_OUTPUT: &str = "SUBSCAN_OUTPUT";
/// Max in-flight scans per worker
pub const ENV_CONCURRENCY: &str = "SUBSCAN_CONCURRENCY";
/// This worker's 0-based shard slot
pub const ENV_SHARD_INDEX: &str = "SUBSCAN_SHARD_INDEX";
/// Total number of parallel workers
pub const ENV_SHARD_COUNT: &str = "SUBSCAN_SHARD_COUNT";

/// Reads an environment variable as a plain string
///
/// Returns None when the variable is unset; a non-unicode value is an error.
pub fn string_env(name: &str) -> ConfigResult<Option<String>> {
    match env::var(name) {
        Ok(raw) => Ok(Some(raw)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::Env {
            variable: name.to_string(),
            message: "value is not valid unicode".to_string(),
        }),
    }
}

/// Reads and parses an environment variable
///
/// # Arguments
///
/// * `name` - The variable name
///
/// # Returns
///
/// * `Ok(Some(value))` - Variable set and parsed
/// * `Ok(None)` - Variable not set
/// * `Err(ConfigError)` - Variable set but unparseable
pub fn parsed_env<T>(name: &str) -> ConfigResult<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match string_env(name)? {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Env {
                variable: name.to_string(),
                message: e.to_string(),
            }),
        None => Ok(None),
    }
}
