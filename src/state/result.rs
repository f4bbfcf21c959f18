//! Per-store scan records
//!
//! This module defines the terminal record a store scan produces, including:
//! - The provider-hit accumulator with page attribution
//! - Confirmed subscription products with normalized prices
//! - The derived report fields (primary provider, joined previews)

use crate::signatures::GENERIC_PROVIDER;
use crate::state::ScanStatus;

/// Maximum products quoted in the joined preview columns
const PREVIEW_PRODUCTS: usize = 10;

/// Maximum page labels quoted per provider in `Page_Found_On`
const PREVIEW_PAGES: usize = 3;

/// A catalog item confirmed to carry at least one selling plan
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionProduct {
    /// Product title from the structured detail endpoint
    pub title: String,
    /// Price in major currency units
    pub price: f64,
    /// Selling plan group names, comma-joined
    pub plans: String,
    /// Canonical product page URL
    pub link: String,
}

impl SubscriptionProduct {
    /// Builds a product record from a raw detail payload price
    ///
    /// Remote catalogs transmit prices in integer minor units (cents); the
    /// division by 100 happens here, at record construction, and nowhere
    /// else.
    pub fn from_minor_units(
        title: impl Into<String>,
        price_minor: i64,
        plans: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            price: price_minor as f64 / 100.0,
            plans: plans.into(),
            link: link.into(),
        }
    }
}

/// Accumulates provider detections with the pages they were seen on
///
/// Insertion order is preserved for both providers and page labels, and page
/// labels are deduplicated per provider, so the primary-provider tie-break
/// and the report previews are deterministic.
#[derive(Debug, Clone, Default)]
pub struct ProviderHits {
    entries: Vec<ProviderPages>,
}

/// One provider and the distinct page labels it was detected on
#[derive(Debug, Clone)]
pub struct ProviderPages {
    pub name: String,
    pub pages: Vec<String>,
}

impl ProviderHits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a provider detection on a page
    ///
    /// The provider is appended on first sight; the page label is appended
    /// only if this provider has not already been seen on it.
    pub fn record(&mut self, provider: &str, page: &str) {
        match self.entries.iter_mut().find(|e| e.name == provider) {
            Some(entry) => {
                if !entry.pages.iter().any(|p| p == page) {
                    entry.pages.push(page.to_string());
                }
            }
            None => self.entries.push(ProviderPages {
                name: provider.to_string(),
                pages: vec![page.to_string()],
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderPages> {
        self.entries.iter()
    }

    /// Drops the generic fallback bucket once a named provider is present
    ///
    /// A store that only ever matched generic markers keeps them; a store
    /// with at least one named detection reports the named providers alone.
    pub fn suppress_generic(&mut self) {
        let has_named = self.entries.iter().any(|e| e.name != GENERIC_PROVIDER);
        if has_named {
            self.entries.retain(|e| e.name != GENERIC_PROVIDER);
        }
    }

    /// The store's primary provider: seen on the most distinct pages,
    /// ties broken by first-encountered order
    pub fn primary(&self) -> Option<&str> {
        let mut best: Option<&ProviderPages> = None;
        for entry in &self.entries {
            match best {
                Some(current) if entry.pages.len() <= current.pages.len() => {}
                _ => best = Some(entry),
            }
        }
        best.map(|e| e.name.as_str())
    }
}

/// The terminal record for one store
///
/// Created once by the store scanner (or by the scheduler for timeouts),
/// immutable after return, and owned by the scheduler until handed to the
/// shard writer.
#[derive(Debug, Clone)]
pub struct StoreResult {
    pub domain: String,
    pub status: ScanStatus,
    pub providers: ProviderHits,
    /// Catalog size reported by the listing endpoint
    pub total_catalog_size: usize,
    /// Count of every confirmed subscription product, even past the cap
    pub subscription_count: usize,
    /// Confirmed products, bounded to the configured reporting cap
    pub products: Vec<SubscriptionProduct>,
    /// Successful HTML page fetches (homepage, linked pages, product pages)
    pub pages_scanned: usize,
}

impl StoreResult {
    /// Builds a record for a store that never produced scan data
    /// (skipped, blocked before any catalog work, or timed out)
    pub fn unscanned(domain: impl Into<String>, status: ScanStatus) -> Self {
        Self {
            domain: domain.into(),
            status,
            providers: ProviderHits::new(),
            total_catalog_size: 0,
            subscription_count: 0,
            products: Vec::new(),
            pages_scanned: 0,
        }
    }

    /// The primary provider name, or an empty string when none was detected
    pub fn primary_provider(&self) -> String {
        self.providers.primary().unwrap_or("").to_string()
    }

    /// All detected provider names, `" | "`-joined
    pub fn apps_detected(&self) -> String {
        self.providers
            .iter()
            .map(|e| e.name.as_str())
            .collect::<Vec<_>>()
            .join(" | ")
    }

    /// Per-provider page attribution, e.g. `"Skio: homepage, /pages/faq"`
    pub fn page_found_on(&self) -> String {
        self.providers
            .iter()
            .map(|e| {
                let pages = e
                    .pages
                    .iter()
                    .take(PREVIEW_PAGES)
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{}: {}", e.name, pages)
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }

    /// Preview of confirmed product titles
    pub fn product_names(&self) -> String {
        self.preview(|p| p.title.as_str())
    }

    /// Preview of confirmed products' plan names
    pub fn plan_names(&self) -> String {
        self.preview(|p| p.plans.as_str())
    }

    /// Preview of confirmed product links
    pub fn product_links(&self) -> String {
        self.preview(|p| p.link.as_str())
    }

    fn preview<'a>(&'a self, field: impl Fn(&'a SubscriptionProduct) -> &'a str) -> String {
        self.products
            .iter()
            .take(PREVIEW_PRODUCTS)
            .map(field)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}
