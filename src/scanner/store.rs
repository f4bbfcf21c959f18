//! Store scanner - the per-store scan state machine
//!
//! Drives one storefront through its discovery stages in forced order:
//! homepage fetch, content-page signature sweep, catalog pagination,
//! pre-check sample, full item scan, finalization. Each stage can
//! short-circuit to a terminal status; every failure below the store level
//! is absorbed, so a scan always terminates with exactly one status and
//! never raises.

use crate::config::ScanConfig;
use crate::roster::normalize_domain;
use crate::scanner::catalog::{self, ProductDetail};
use crate::scanner::fetcher::{fetch, request_jitter};
use crate::scanner::links::{extract_content_links, page_label, prioritize_scan_links};
use crate::signatures::ProviderMatcher;
use crate::state::{ProviderHits, ScanStatus, StoreResult, SubscriptionProduct};
use reqwest::Client;
use std::sync::Arc;

/// Page label attributed to homepage detections
const HOMEPAGE_LABEL: &str = "homepage";

/// Scans one storefront at a time
///
/// Holds a clone of the shared HTTP client and the shared signature
/// matcher; one instance serves one scheduler task.
pub struct StoreScanner {
    client: Client,
    matcher: Arc<dyn ProviderMatcher>,
    config: ScanConfig,
}

impl StoreScanner {
    pub fn new(client: Client, matcher: Arc<dyn ProviderMatcher>, config: ScanConfig) -> Self {
        Self {
            client,
            matcher,
            config,
        }
    }

    /// Runs the full scan state machine for one store
    ///
    /// # Arguments
    ///
    /// * `raw_domain` - Store address as it appeared in the roster; it is
    ///   normalized here so direct callers get the same treatment as
    ///   roster-loaded domains
    ///
    /// # Returns
    ///
    /// The terminal record for the store. The `timeout` status is never
    /// assigned here; that belongs to the scheduler.
    pub async fn scan(&self, raw_domain: &str) -> StoreResult {
        let domain = match normalize_domain(raw_domain) {
            Some(domain) => domain,
            None => {
                return StoreResult::unscanned(
                    raw_domain.trim().to_lowercase(),
                    ScanStatus::Skipped,
                )
            }
        };

        // Stagger task start so a shard's first wave of requests does not
        // land at the same instant
        request_jitter(&self.config).await;

        let mut hits = ProviderHits::new();
        let mut pages_scanned = 0usize;

        // Homepage
        let homepage_url = format!("{}://{}", self.config.url_scheme, domain);
        let homepage = fetch(&self.client, &homepage_url, &self.config).await;
        if homepage.body.is_empty() || !homepage.status.is_success() {
            tracing::debug!(
                "{}: homepage unavailable ({})",
                domain,
                homepage.status.label()
            );
            return StoreResult::unscanned(domain, ScanStatus::blocked(homepage.status.label()));
        }
        pages_scanned += 1;
        for provider in self.matcher.providers_in(&homepage.body) {
            hits.record(&provider, HOMEPAGE_LABEL);
        }

        // Content pages linked from the homepage. A page that fails to
        // fetch is skipped, not an error for the store.
        let links = extract_content_links(&homepage.body, &domain, &self.config.url_scheme);
        let scan_links = prioritize_scan_links(links, self.config.max_linked_pages);
        for link in &scan_links {
            request_jitter(&self.config).await;
            let page = fetch(&self.client, link, &self.config).await;
            if page.body.is_empty() {
                continue;
            }
            pages_scanned += 1;
            let label = page_label(link, &domain, &self.config.url_scheme);
            for provider in self.matcher.providers_in(&page.body) {
                hits.record(&provider, &label);
            }
        }

        // Catalog listing
        let (items, catalog_status) = catalog::paginate(&self.client, &domain, &self.config).await;
        let total_catalog_size = items.len();

        if items.is_empty() {
            if hits.is_empty() {
                tracing::debug!(
                    "{}: no catalog and no provider signals ({})",
                    domain,
                    catalog_status.label()
                );
                return StoreResult {
                    domain,
                    status: ScanStatus::blocked(catalog_status.label()),
                    providers: hits,
                    total_catalog_size: 0,
                    subscription_count: 0,
                    products: Vec::new(),
                    pages_scanned,
                };
            }

            // A provider is present but the catalog cannot be read; leave
            // one synthetic row so the products sheet names the condition
            hits.suppress_generic();
            let note = format!("Catalog endpoint inaccessible ({})", catalog_status.label());
            let products = vec![SubscriptionProduct::from_minor_units(
                note,
                0,
                "",
                format!("{}://{}/products.json", self.config.url_scheme, domain),
            )];
            return StoreResult {
                domain,
                status: ScanStatus::AppDetectedNoProductApi,
                providers: hits,
                total_catalog_size: 0,
                subscription_count: 0,
                products,
                pages_scanned,
            };
        }

        // Pre-check: sample the catalog prefix before committing to a full
        // per-item scan
        let sample_size = self.config.precheck_sample.min(items.len());
        let mut sampled: Vec<Option<ProductDetail>> = Vec::with_capacity(sample_size);
        let mut sample_hit = false;
        for item in &items[..sample_size] {
            request_jitter(&self.config).await;
            let detail =
                catalog::fetch_detail(&self.client, &domain, &item.handle, &self.config).await;
            if matches!(&detail, Some(d) if d.has_plans()) {
                sample_hit = true;
            }
            sampled.push(detail);
        }

        if !sample_hit {
            tracing::debug!(
                "{}: no plans in {}-item sample, skipping {} remaining items",
                domain,
                sample_size,
                items.len() - sample_size
            );
            hits.suppress_generic();
            return StoreResult {
                domain,
                status: ScanStatus::NoSubscription,
                providers: hits,
                total_catalog_size,
                subscription_count: 0,
                products: Vec::new(),
                pages_scanned,
            };
        }

        // Full item scan; sampled details are reused, not re-fetched
        let mut products: Vec<SubscriptionProduct> = Vec::new();
        let mut subscription_count = 0usize;

        for (index, item) in items.iter().enumerate() {
            let detail = if index < sample_size {
                sampled[index].take()
            } else {
                request_jitter(&self.config).await;
                catalog::fetch_detail(&self.client, &domain, &item.handle, &self.config).await
            };

            let detail = match detail {
                Some(detail) if detail.has_plans() => detail,
                _ => continue,
            };

            let link = format!(
                "{}://{}/products/{}",
                self.config.url_scheme, domain, item.handle
            );
            subscription_count += 1;
            if products.len() < self.config.max_product_rows {
                products.push(SubscriptionProduct::from_minor_units(
                    detail.title.clone(),
                    detail.price,
                    detail.plan_names(),
                    link.clone(),
                ));
            }

            // The product page HTML often names the provider outright
            let page = fetch(&self.client, &link, &self.config).await;
            if !page.body.is_empty() {
                pages_scanned += 1;
                let label = format!("/products/{}", item.handle);
                for provider in self.matcher.providers_in(&page.body) {
                    hits.record(&provider, &label);
                }
            }
        }

        hits.suppress_generic();
        let status = if subscription_count > 0 {
            ScanStatus::Found
        } else if !hits.is_empty() {
            ScanStatus::AppDetectedNoProductApi
        } else {
            ScanStatus::NoSubscription
        };

        tracing::debug!(
            "{}: {} ({} subscription products, {} pages scanned)",
            domain,
            status,
            subscription_count,
            pages_scanned
        );

        StoreResult {
            domain,
            status,
            providers: hits,
            total_catalog_size,
            subscription_count,
            products,
            pages_scanned,
        }
    }
}
