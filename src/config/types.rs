use std::path::PathBuf;

/// Main configuration for one shard scan invocation
#[derive(Debug, Clone)]
pub struct Config {
    /// Input roster file (CSV, one row per store)
    pub input_path: PathBuf,

    /// Directory shard artifacts are written into
    pub output_dir: PathBuf,

    /// Optional TOML file replacing the built-in signature table
    pub signature_file: Option<PathBuf>,

    pub shard: ShardConfig,
    pub scan: ScanConfig,
}

/// This worker's slot in the sharded run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardConfig {
    /// 0-based shard slot
    pub index: usize,

    /// Total number of parallel workers
    pub count: usize,
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self { index: 0, count: 1 }
    }
}

/// Scan behavior configuration
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Maximum scans in flight at once
    pub concurrency: usize,

    /// Retries after a transport-level fetch failure
    pub fetch_retries: u32,

    /// Separately bounded retries on HTTP 429
    pub rate_limit_retries: u32,

    /// TCP connect timeout (seconds)
    pub connect_timeout_secs: u64,

    /// Whole-request timeout (seconds)
    pub request_timeout_secs: u64,

    /// Wall-clock ceiling for one store's entire scan (seconds)
    pub scan_timeout_secs: u64,

    /// Jittered delay between requests to the same store (milliseconds)
    pub min_request_delay_ms: u64,
    pub max_request_delay_ms: u64,

    /// Homepage links fetched for signature sweeps
    pub max_linked_pages: usize,

    /// Catalog items detail-checked before committing to a full scan
    pub precheck_sample: usize,

    /// Cap on product rows kept per store for reporting
    pub max_product_rows: usize,

    /// Items requested per catalog listing page
    pub catalog_page_size: usize,

    /// Scheme used to address stores ("https" in production, "http" lets
    /// tests target local mock servers)
    pub url_scheme: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            fetch_retries: 2,
            rate_limit_retries: 3,
            connect_timeout_secs: 6,
            request_timeout_secs: 12,
            scan_timeout_secs: 90,
            min_request_delay_ms: 100,
            max_request_delay_ms: 400,
            max_linked_pages: 20,
            precheck_sample: 3,
            max_product_rows: 50,
            catalog_page_size: 250,
            url_scheme: "https".to_string(),
        }
    }
}

/// Configuration for the merge stage
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Directory searched for shard artifacts (`<dir>/chunks` first, then
    /// the directory itself)
    pub search_dir: PathBuf,

    /// Directory the final workbook is written into
    pub output_dir: PathBuf,

    /// Declared total shard count; inferred from artifacts when absent
    pub shard_count: Option<usize>,

    /// Per-shard domain span for missing-range estimates; inferred from
    /// artifacts when absent
    pub shard_size: Option<usize>,
}
