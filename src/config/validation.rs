use crate::config::types::{Config, MergeConfig, ScanConfig, ShardConfig};
use crate::ConfigError;

/// Validates the entire scan configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.input_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "input path cannot be empty".to_string(),
        ));
    }
    if config.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }
    validate_shard_config(&config.shard)?;
    validate_scan_config(&config.scan)?;
    Ok(())
}

/// Validates the shard slot assignment
pub fn validate_shard_config(config: &ShardConfig) -> Result<(), ConfigError> {
    if config.count < 1 {
        return Err(ConfigError::Validation(format!(
            "shard count must be >= 1, got {}",
            config.count
        )));
    }

    if config.index >= config.count {
        return Err(ConfigError::Validation(format!(
            "shard index must be < shard count, got index {} of {}",
            config.index, config.count,
        )));
    }

    Ok(())
}

/// Validates scan behavior configuration
pub fn validate_scan_config(config: &ScanConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    if config.min_request_delay_ms > config.max_request_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min request delay ({}ms) exceeds max ({}ms)",
            config.min_request_delay_ms, config.max_request_delay_ms
        )));
    }

    if config.precheck_sample < 1 {
        return Err(ConfigError::Validation(format!(
            "precheck sample must be >= 1, got {}",
            config.precheck_sample
        )));
    }

    if config.catalog_page_size < 1 {
        return Err(ConfigError::Validation(format!(
            "catalog page size must be >= 1, got {}",
            config.catalog_page_size
        )));
    }

    if config.max_product_rows < 1 {
        return Err(ConfigError::Validation(format!(
            "max product rows must be >= 1, got {}",
            config.max_product_rows
        )));
    }

    if config.scan_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "scan timeout must be >= 1s, got {}s",
            config.scan_timeout_secs
        )));
    }

    if config.url_scheme != "https" && config.url_scheme != "http" {
        return Err(ConfigError::Validation(format!(
            "url scheme must be 'https' or 'http', got '{}'",
            config.url_scheme
        )));
    }

    Ok(())
}

/// Validates the merge configuration
pub fn validate_merge_config(config: &MergeConfig) -> Result<(), ConfigError> {
    if config.search_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "search directory cannot be empty".to_string(),
        ));
    }

    if let Some(count) = config.shard_count {
        if count < 1 {
            return Err(ConfigError::Validation(format!(
                "declared shard count must be >= 1, got {}",
                count
            )));
        }
    }

    if let Some(size) = config.shard_size {
        if size < 1 {
            return Err(ConfigError::Validation(format!(
                "shard size must be >= 1, got {}",
                size
            )));
        }
    }

    Ok(())
}
