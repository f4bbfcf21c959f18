//! Store scanning engine
//!
//! This module contains the core scanning functionality, including:
//! - HTTP fetching with retry and rate-limit backoff
//! - Content link extraction and prioritization
//! - Structured catalog pagination and product detail checks
//! - The per-store scan state machine
//! - The concurrent shard scheduler
//!
//! One honest browser-shaped GET at a time, jittered, is the contract with
//! the stores being scanned; everything here works within it.

mod catalog;
mod fetcher;
mod links;
mod scheduler;
mod store;

pub use catalog::{fetch_detail, paginate, CatalogItem, ProductDetail, SellingPlanGroup};
pub use fetcher::{
    build_http_client, fetch, request_jitter, FetchOutcome, FetchStatus, USER_AGENTS,
};
pub use links::{extract_content_links, page_label, prioritize_scan_links};
pub use scheduler::Scheduler;
pub use store::StoreScanner;

use crate::config::Config;
use crate::report::write_shard_artifact;
use crate::roster::{load_roster, partition, shard_bounds};
use crate::signatures::{KeywordMatcher, SignatureTable};
use std::path::PathBuf;
use std::sync::Arc;

/// Runs one shard's scan end to end
///
/// Loads the signature table and the roster, carves out this shard's
/// slice, scans every store in it, and publishes the shard artifact.
/// An empty slice still publishes an artifact so the merger can tell
/// "this shard ran and owned nothing" from "this shard never ran".
///
/// # Arguments
///
/// * `config` - Validated scan configuration
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the published shard artifact
/// * `Err(ScanError)` - Unreadable roster or signature file, or an
///   unwritable output directory
pub async fn run_scan(config: Config) -> crate::Result<PathBuf> {
    let table = match &config.signature_file {
        Some(path) => SignatureTable::from_toml_file(path)?,
        None => SignatureTable::builtin(),
    };
    let fingerprint = table.fingerprint();
    tracing::info!(
        "Signature table ready: {} providers, fingerprint {}",
        table.len(),
        &fingerprint[..12]
    );

    let roster = load_roster(&config.input_path)?;
    let shard = shard_bounds(roster.len(), config.shard);
    let domains = partition(&roster, config.shard);
    tracing::info!(
        "Shard {} of {} owns {} of {} stores (rows {}..{})",
        shard.index,
        shard.count,
        domains.len(),
        roster.len(),
        shard.start,
        shard.end
    );

    let client = build_http_client(&config.scan)?;
    let matcher: Arc<dyn crate::signatures::ProviderMatcher> =
        Arc::new(KeywordMatcher::new(Arc::new(table)));
    let scheduler = Scheduler::new(client, matcher, config.scan);
    let results = scheduler.run(domains).await;

    let with_signal = results
        .iter()
        .filter(|r| r.status.has_subscription_signal())
        .count();
    tracing::info!(
        "Shard {} scan complete: {} of {} stores show subscription signals",
        shard.index,
        with_signal,
        results.len()
    );

    let path = write_shard_artifact(&results, shard, &fingerprint, &config.output_dir)?;
    tracing::info!("Shard artifact written to {}", path.display());
    Ok(path)
}
