//! Scan scheduler - concurrent fan-out over a shard's domains
//!
//! Runs the store scanner for every domain with bounded parallelism and a
//! per-task wall-clock ceiling, and guarantees exactly one result per
//! input domain, in input order. Timeouts and aborted tasks surface as
//! `timeout` records; nothing a single store does can fail the shard.

use crate::config::ScanConfig;
use crate::scanner::store::StoreScanner;
use crate::signatures::ProviderMatcher;
use crate::state::{ScanStatus, StoreResult};
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Completions between progress log lines
const PROGRESS_INTERVAL: usize = 25;

/// Shared completion counters for progress logging
#[derive(Default)]
struct Progress {
    completed: AtomicUsize,
    found: AtomicUsize,
    blocked: AtomicUsize,
}

impl Progress {
    fn observe(&self, result: &StoreResult, total: usize) {
        if result.status.has_subscription_signal() {
            self.found.fetch_add(1, Ordering::Relaxed);
        }
        if result.status.is_blocked() {
            self.blocked.fetch_add(1, Ordering::Relaxed);
        }
        let done = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        if done % PROGRESS_INTERVAL == 0 || done == total {
            tracing::info!(
                "Progress: {}/{} stores, {} with subscription signals, {} blocked",
                done,
                total,
                self.found.load(Ordering::Relaxed),
                self.blocked.load(Ordering::Relaxed)
            );
        }
    }
}

/// Fans the store scanner out across a shard's domains
pub struct Scheduler {
    client: Client,
    matcher: Arc<dyn ProviderMatcher>,
    config: ScanConfig,
}

impl Scheduler {
    pub fn new(client: Client, matcher: Arc<dyn ProviderMatcher>, config: ScanConfig) -> Self {
        Self {
            client,
            matcher,
            config,
        }
    }

    /// Scans every domain and collects one result per input row
    ///
    /// At most `concurrency` scans are in flight at once. A scan that
    /// exceeds `scan_timeout_secs` is abandoned and recorded as `timeout`;
    /// a task that aborts leaves its slot to be backfilled the same way.
    /// Results come back in input order.
    pub async fn run(&self, domains: &[String]) -> Vec<StoreResult> {
        let total = domains.len();
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let progress = Arc::new(Progress::default());
        let ceiling = Duration::from_secs(self.config.scan_timeout_secs);
        let mut tasks = JoinSet::new();

        for (index, domain) in domains.iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let progress = Arc::clone(&progress);
            let scanner = StoreScanner::new(
                self.client.clone(),
                Arc::clone(&self.matcher),
                self.config.clone(),
            );
            let domain = domain.clone();

            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    // The semaphore is never closed; treat it like a lost task
                    Err(_) => return (index, StoreResult::unscanned(domain, ScanStatus::Timeout)),
                };

                let result = match tokio::time::timeout(ceiling, scanner.scan(&domain)).await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!("Scan of {} exceeded the {:?} ceiling", domain, ceiling);
                        StoreResult::unscanned(domain, ScanStatus::Timeout)
                    }
                };

                progress.observe(&result, total);
                (index, result)
            });
        }

        let mut slots: Vec<Option<StoreResult>> = (0..total).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => tracing::error!("Scan task aborted: {}", e),
            }
        }

        // An aborted task left its slot empty; backfill it so the
        // one-result-per-domain contract holds
        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    StoreResult::unscanned(domains[index].clone(), ScanStatus::Timeout)
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::fetcher::build_http_client;
    use crate::signatures::{KeywordMatcher, SignatureTable};

    fn create_test_scheduler() -> Scheduler {
        let config = ScanConfig {
            min_request_delay_ms: 0,
            max_request_delay_ms: 0,
            concurrency: 3,
            ..ScanConfig::default()
        };
        let client = build_http_client(&config).unwrap();
        let matcher = Arc::new(KeywordMatcher::new(Arc::new(SignatureTable::builtin())));
        Scheduler::new(client, matcher, config)
    }

    #[tokio::test]
    async fn test_empty_shard_yields_no_results() {
        let scheduler = create_test_scheduler();
        let results = scheduler.run(&[]).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_one_result_per_domain_in_input_order() {
        // Unusable addresses terminate before any network traffic, which
        // makes them a cheap way to exercise the fan-out plumbing
        let scheduler = create_test_scheduler();
        let domains = vec![
            "".to_string(),
            "https://".to_string(),
            "   ".to_string(),
            "http://".to_string(),
        ];

        let results = scheduler.run(&domains).await;
        assert_eq!(results.len(), domains.len());
        assert!(results.iter().all(|r| r.status == ScanStatus::Skipped));
    }
}
