//! Catalog pagination and item detail
//!
//! Storefronts expose their catalog through two JSON endpoints: a paged
//! listing (`/products.json`) and a per-item detail document
//! (`/products/<handle>.js`) that carries pricing and selling plans. This
//! module walks both and absorbs every failure into "no data".

use crate::config::ScanConfig;
use crate::scanner::fetcher::{fetch, request_jitter, FetchStatus};
use reqwest::Client;
use serde::Deserialize;

/// Status tag recorded when a listing page is not parseable JSON
const JSON_ERROR_TAG: &str = "json_error";

/// One row of the catalog listing
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogItem {
    pub handle: String,
    #[serde(default)]
    pub title: String,
}

/// One page of the catalog listing endpoint
#[derive(Debug, Deserialize)]
struct CatalogPage {
    #[serde(default)]
    products: Vec<CatalogItem>,
}

/// Structured detail for a single catalog item
///
/// `price` arrives in integer minor currency units.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductDetail {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub selling_plan_groups: Vec<SellingPlanGroup>,
}

/// A named recurring-purchase option group on an item
#[derive(Debug, Clone, Deserialize)]
pub struct SellingPlanGroup {
    pub name: String,
}

impl ProductDetail {
    /// Whether the item carries any subscription capability
    pub fn has_plans(&self) -> bool {
        !self.selling_plan_groups.is_empty()
    }

    /// Plan group names joined for reporting
    pub fn plan_names(&self) -> String {
        self.selling_plan_groups
            .iter()
            .map(|group| group.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Walks the catalog listing endpoint until the catalog is exhausted or a
/// page fails
///
/// Pages are requested `catalog_page_size` items at a time; a short page
/// means the end of the catalog. Whatever was accumulated before a failure
/// is kept.
///
/// # Returns
///
/// The accumulated items plus the stopping status: the last page's status
/// after a complete walk, the failing status when a page request did not
/// succeed, or a `json_error` tag when a page body was not parseable.
pub async fn paginate(
    client: &Client,
    domain: &str,
    config: &ScanConfig,
) -> (Vec<CatalogItem>, FetchStatus) {
    let mut items = Vec::new();
    let mut page = 1;

    loop {
        let url = format!(
            "{}://{}/products.json?limit={}&page={}",
            config.url_scheme, domain, config.catalog_page_size, page
        );
        let outcome = fetch(client, &url, config).await;

        if !outcome.status.is_success() {
            return (items, outcome.status);
        }

        let page_items = match serde_json::from_str::<CatalogPage>(&outcome.body) {
            Ok(parsed) => parsed.products,
            Err(e) => {
                tracing::debug!("Catalog page {} of {} not parseable: {}", page, domain, e);
                return (items, FetchStatus::Tag(JSON_ERROR_TAG.to_string()));
            }
        };

        if page_items.is_empty() {
            return (items, outcome.status);
        }

        let complete = page_items.len() < config.catalog_page_size;
        items.extend(page_items);
        if complete {
            return (items, outcome.status);
        }

        page += 1;
        request_jitter(config).await;
    }
}

/// Fetches one catalog item's structured detail
///
/// Any failure here (transport, non-success status, malformed body) yields
/// `None`; a missing detail never aborts the store scan.
pub async fn fetch_detail(
    client: &Client,
    domain: &str,
    handle: &str,
    config: &ScanConfig,
) -> Option<ProductDetail> {
    let url = format!("{}://{}/products/{}.js", config.url_scheme, domain, handle);
    let outcome = fetch(client, &url, config).await;
    if !outcome.status.is_success() {
        return None;
    }
    serde_json::from_str(&outcome.body).ok()
}
