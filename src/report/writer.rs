//! Shard artifact writer
//!
//! Serializes one shard's scan results into its workbook: the full
//! per-store table, one row per confirmed subscription product, a compact
//! status log, and a Meta sheet that lets the merger reason about the
//! shard's place in the whole run.

use crate::report::workbook::{OutputResult, Sheet, Workbook};
use crate::roster::Shard;
use crate::state::StoreResult;
use std::path::{Path, PathBuf};

pub const ALL_STORES_SHEET: &str = "All_Stores";
pub const PRODUCTS_SHEET: &str = "Subscription_Products";
pub const STATUS_LOG_SHEET: &str = "Status_Log";
pub const META_SHEET: &str = "Meta";

pub const ALL_STORES_COLUMNS: &[&str] = &[
    "Domain",
    "Status",
    "Subscription_App",
    "Apps_Detected",
    "Page_Found_On",
    "Total_SKUs",
    "Subscription_Products",
    "Sub_Product_Names",
    "Sub_Plan_Names",
    "Sub_Product_Links",
    "Pages_Scanned",
];

pub const PRODUCTS_COLUMNS: &[&str] = &[
    "Store",
    "Subscription_App",
    "Total_SKUs",
    "Product_Title",
    "Price",
    "Sub_Plans",
    "Product_Link",
];

pub const STATUS_LOG_COLUMNS: &[&str] = &["Domain", "Status"];

pub const META_COLUMNS: &[&str] = &[
    "Shard_Index",
    "Shard_Count",
    "Domain_Start",
    "Domain_End",
    "Stores",
    "Signature_Hash",
];

/// Artifact directory name for a shard index
pub fn chunk_name(index: usize) -> String {
    format!("chunk_{}", index)
}

/// Builds and atomically publishes one shard's workbook
///
/// # Returns
///
/// The published artifact path.
pub fn write_shard_artifact(
    results: &[StoreResult],
    shard: Shard,
    signature_hash: &str,
    output_dir: &Path,
) -> OutputResult<PathBuf> {
    let workbook = build_shard_workbook(results, shard, signature_hash);
    workbook.save_under(output_dir)
}

/// Assembles the four shard sheets from scan results
///
/// Rows follow result order, which the scheduler guarantees is input
/// order. An empty shard still gets all four sheets, with `Stores` zero in
/// `Meta`.
pub fn build_shard_workbook(
    results: &[StoreResult],
    shard: Shard,
    signature_hash: &str,
) -> Workbook {
    let mut all_stores = Sheet::new(ALL_STORES_SHEET, ALL_STORES_COLUMNS);
    let mut products = Sheet::new(PRODUCTS_SHEET, PRODUCTS_COLUMNS);
    let mut status_log = Sheet::new(STATUS_LOG_SHEET, STATUS_LOG_COLUMNS);

    for result in results {
        all_stores.push_row(vec![
            result.domain.clone(),
            result.status.label(),
            result.primary_provider(),
            result.apps_detected(),
            result.page_found_on(),
            result.total_catalog_size.to_string(),
            result.subscription_count.to_string(),
            result.product_names(),
            result.plan_names(),
            result.product_links(),
            result.pages_scanned.to_string(),
        ]);

        status_log.push_row(vec![result.domain.clone(), result.status.label()]);

        for product in &result.products {
            products.push_row(vec![
                result.domain.clone(),
                result.primary_provider(),
                result.total_catalog_size.to_string(),
                product.title.clone(),
                format!("{:.2}", product.price),
                product.plans.clone(),
                product.link.clone(),
            ]);
        }
    }

    let mut meta = Sheet::new(META_SHEET, META_COLUMNS);
    meta.push_row(vec![
        shard.index.to_string(),
        shard.count.to_string(),
        shard.start.to_string(),
        shard.end.to_string(),
        results.len().to_string(),
        signature_hash.to_string(),
    ]);

    let mut workbook = Workbook::new(chunk_name(shard.index));
    workbook.add_sheet(all_stores);
    workbook.add_sheet(products);
    workbook.add_sheet(status_log);
    workbook.add_sheet(meta);
    workbook
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ScanStatus, SubscriptionProduct};
    use tempfile::tempdir;

    fn create_test_shard() -> Shard {
        Shard {
            index: 2,
            count: 4,
            start: 20,
            end: 30,
        }
    }

    fn create_test_results() -> Vec<StoreResult> {
        let mut found = StoreResult::unscanned("acme-coffee.com", ScanStatus::Found);
        found.providers.record("Recharge Subscriptions", "homepage");
        found.total_catalog_size = 42;
        found.subscription_count = 2;
        found.products = vec![
            SubscriptionProduct::from_minor_units(
                "Dark Roast",
                1999,
                "Monthly",
                "https://acme-coffee.com/products/dark-roast",
            ),
            SubscriptionProduct::from_minor_units(
                "Light Roast",
                2450,
                "Weekly, Monthly",
                "https://acme-coffee.com/products/light-roast",
            ),
        ];
        found.pages_scanned = 5;

        let blocked = StoreResult::unscanned(
            "walled-garden.com",
            ScanStatus::blocked("403".to_string()),
        );

        vec![found, blocked]
    }

    #[test]
    fn test_chunk_name() {
        assert_eq!(chunk_name(0), "chunk_0");
        assert_eq!(chunk_name(17), "chunk_17");
    }

    #[test]
    fn test_all_stores_rows() {
        let workbook = build_shard_workbook(&create_test_results(), create_test_shard(), "abc123");
        let sheet = workbook.sheet(ALL_STORES_SHEET).unwrap();

        assert_eq!(sheet.rows.len(), 2);
        let found = &sheet.rows[0];
        assert_eq!(sheet.value(found, "Domain"), "acme-coffee.com");
        assert_eq!(sheet.value(found, "Status"), "found");
        assert_eq!(sheet.value(found, "Subscription_App"), "Recharge Subscriptions");
        assert_eq!(sheet.value(found, "Total_SKUs"), "42");
        assert_eq!(sheet.value(found, "Subscription_Products"), "2");
        assert_eq!(
            sheet.value(found, "Sub_Product_Names"),
            "Dark Roast | Light Roast"
        );
        assert_eq!(sheet.value(found, "Pages_Scanned"), "5");

        let blocked = &sheet.rows[1];
        assert_eq!(sheet.value(blocked, "Status"), "blocked_403");
        assert_eq!(sheet.value(blocked, "Subscription_App"), "");
    }

    #[test]
    fn test_product_rows_and_price_format() {
        let workbook = build_shard_workbook(&create_test_results(), create_test_shard(), "abc123");
        let sheet = workbook.sheet(PRODUCTS_SHEET).unwrap();

        assert_eq!(sheet.rows.len(), 2);
        let first = &sheet.rows[0];
        assert_eq!(sheet.value(first, "Store"), "acme-coffee.com");
        assert_eq!(sheet.value(first, "Product_Title"), "Dark Roast");
        assert_eq!(sheet.value(first, "Price"), "19.99");
        assert_eq!(sheet.value(first, "Sub_Plans"), "Monthly");

        let second = &sheet.rows[1];
        assert_eq!(sheet.value(second, "Price"), "24.50");
    }

    #[test]
    fn test_status_log_and_meta() {
        let workbook = build_shard_workbook(&create_test_results(), create_test_shard(), "abc123");

        let status_log = workbook.sheet(STATUS_LOG_SHEET).unwrap();
        assert_eq!(status_log.rows.len(), 2);
        assert_eq!(status_log.rows[1], vec!["walled-garden.com", "blocked_403"]);

        let meta = workbook.sheet(META_SHEET).unwrap();
        assert_eq!(meta.rows.len(), 1);
        let row = &meta.rows[0];
        assert_eq!(meta.value(row, "Shard_Index"), "2");
        assert_eq!(meta.value(row, "Shard_Count"), "4");
        assert_eq!(meta.value(row, "Domain_Start"), "20");
        assert_eq!(meta.value(row, "Domain_End"), "30");
        assert_eq!(meta.value(row, "Stores"), "2");
        assert_eq!(meta.value(row, "Signature_Hash"), "abc123");
    }

    #[test]
    fn test_empty_shard_still_has_all_sheets() {
        let shard = Shard {
            index: 0,
            count: 1,
            start: 0,
            end: 0,
        };
        let workbook = build_shard_workbook(&[], shard, "abc123");

        for name in [ALL_STORES_SHEET, PRODUCTS_SHEET, STATUS_LOG_SHEET] {
            let sheet = workbook.sheet(name).unwrap();
            assert!(sheet.rows.is_empty());
            assert!(!sheet.header.is_empty());
        }
        let meta = workbook.sheet(META_SHEET).unwrap();
        assert_eq!(meta.value(&meta.rows[0], "Stores"), "0");
    }

    #[test]
    fn test_write_and_reload() {
        let dir = tempdir().unwrap();
        let path =
            write_shard_artifact(&create_test_results(), create_test_shard(), "abc123", dir.path())
                .unwrap();
        assert!(path.ends_with("chunk_2"));

        let reloaded = Workbook::load(&path).unwrap();
        assert_eq!(reloaded.sheet(ALL_STORES_SHEET).unwrap().rows.len(), 2);
        assert_eq!(reloaded.sheet(STATUS_LOG_SHEET).unwrap().rows.len(), 2);
    }
}
