//! Result aggregation across shard artifacts
//!
//! The merger rebuilds one consolidated dataset from whatever shard
//! workbooks survived the run: it discovers candidate artifacts, skips
//! malformed ones, concatenates their rows in shard order, re-derives the
//! summary views, and reports every missing shard index instead of
//! failing. Re-running it over the same artifacts writes byte-identical
//! output.

use crate::config::MergeConfig;
use crate::report::workbook::{Sheet, Workbook};
use crate::report::writer::{
    ALL_STORES_COLUMNS, ALL_STORES_SHEET, META_SHEET, PRODUCTS_COLUMNS, PRODUCTS_SHEET,
    STATUS_LOG_COLUMNS, STATUS_LOG_SHEET,
};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the final aggregated workbook
pub const FINAL_WORKBOOK_NAME: &str = "final";

pub const ALL_PRODUCTS_SHEET: &str = "All_Subscription_Products";
pub const STORE_SUMMARY_SHEET: &str = "Store_Summary";
pub const STATUS_SUMMARY_SHEET: &str = "Status_Summary";
pub const APP_USAGE_SHEET: &str = "App_Usage_Stats";
pub const MISSING_CHUNKS_SHEET: &str = "Missing_Chunks";

pub const STORE_SUMMARY_COLUMNS: &[&str] = &[
    "Store",
    "Status",
    "Subscription_App",
    "Total_SKUs",
    "Subscription_Products",
    "Subscription_Ratio",
    "Product_Preview",
    "Plan_Preview",
];
pub const STATUS_SUMMARY_COLUMNS: &[&str] = &["Status", "Stores"];
pub const APP_USAGE_COLUMNS: &[&str] = &["Subscription_App", "Stores"];
pub const MISSING_CHUNKS_COLUMNS: &[&str] = &["Shard_Index", "Domain_Start", "Domain_End"];

/// One shard artifact that was discovered and read successfully
#[derive(Debug)]
pub struct LoadedChunk {
    pub index: usize,
    pub workbook: Workbook,
}

/// Runs the full merge: discover, read, aggregate, publish
///
/// Missing or malformed shards never fail the merge; they surface in the
/// `Missing_Chunks` sheet. The only fatal conditions are an unreadable
/// search directory and an unwritable output directory.
///
/// # Returns
///
/// The published final workbook path.
pub fn run_merge(config: &MergeConfig) -> crate::Result<PathBuf> {
    let candidates = discover_chunks(&config.search_dir)?;
    tracing::info!(
        "Discovered {} shard artifacts under {}",
        candidates.len(),
        config.search_dir.display()
    );

    let chunks = load_chunks(&candidates);
    check_signature_fingerprints(&chunks);

    let workbook = build_final_workbook(&chunks, config);
    let path = workbook.save_under(&config.output_dir)?;
    tracing::info!("Final workbook written to {}", path.display());
    Ok(path)
}

/// Finds candidate artifact directories named `chunk_<index>`
///
/// `<dir>/chunks` is searched first; only when it yields nothing does the
/// search fall back to `<dir>` itself. Within a directory candidates come
/// back in lexical name order, and when two names parse to the same index
/// (`chunk_3` next to `chunk_03`) the first discovered wins.
fn discover_chunks(search_dir: &Path) -> io::Result<Vec<(usize, PathBuf)>> {
    let mut candidates = scan_directory(&search_dir.join("chunks"))?;
    if candidates.is_empty() {
        candidates = scan_directory(search_dir)?;
    }

    let mut chunks: Vec<(usize, PathBuf)> = Vec::new();
    for (index, path) in candidates {
        if let Some((_, kept)) = chunks.iter().find(|(seen, _)| *seen == index) {
            tracing::warn!(
                "Duplicate artifact for shard {}: ignoring {} in favor of {}",
                index,
                path.display(),
                kept.display()
            );
        } else {
            chunks.push((index, path));
        }
    }

    chunks.sort_by_key(|(index, _)| *index);
    Ok(chunks)
}

fn scan_directory(dir: &Path) -> io::Result<Vec<(usize, PathBuf)>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    paths.sort();

    Ok(paths
        .into_iter()
        .filter_map(|path| chunk_index(&path).map(|index| (index, path)))
        .collect())
}

/// Parses the shard index out of a `chunk_<index>` directory name
fn chunk_index(path: &Path) -> Option<usize> {
    path.file_name()?
        .to_str()?
        .strip_prefix("chunk_")?
        .parse()
        .ok()
}

/// Reads each candidate, skipping any that cannot be loaded
///
/// A workbook without a `Status_Log` sheet is malformed; it is skipped
/// with a warning and its index counts as missing.
fn load_chunks(candidates: &[(usize, PathBuf)]) -> Vec<LoadedChunk> {
    let mut chunks = Vec::new();
    for (index, path) in candidates {
        let workbook = match Workbook::load(path) {
            Ok(workbook) => workbook,
            Err(e) => {
                tracing::warn!("Skipping unreadable artifact {}: {}", path.display(), e);
                continue;
            }
        };
        if workbook.sheet(STATUS_LOG_SHEET).is_none() {
            tracing::warn!(
                "Skipping malformed artifact {}: no {} sheet",
                path.display(),
                STATUS_LOG_SHEET
            );
            continue;
        }
        tracing::debug!("Read shard {} from {}", index, path.display());
        chunks.push(LoadedChunk {
            index: *index,
            workbook,
        });
    }
    chunks
}

/// Warns when shards were scanned with differing signature tables
fn check_signature_fingerprints(chunks: &[LoadedChunk]) {
    let mut fingerprints: Vec<&str> = chunks
        .iter()
        .filter_map(|chunk| chunk.workbook.sheet(META_SHEET))
        .filter_map(|meta| meta.rows.first().map(|row| meta.value(row, "Signature_Hash")))
        .filter(|hash| !hash.is_empty())
        .collect();
    fingerprints.sort_unstable();
    fingerprints.dedup();

    if fingerprints.len() > 1 {
        tracing::warn!(
            "Shards were scanned with {} different signature tables; provider names may disagree",
            fingerprints.len()
        );
    }
}

/// Assembles the final workbook from the loaded shards
///
/// Rows concatenate in shard-index order. Every derived view is sorted
/// deterministically, so merging the same artifacts twice produces
/// byte-identical output.
pub fn build_final_workbook(chunks: &[LoadedChunk], config: &MergeConfig) -> Workbook {
    let mut all_stores = Sheet::new(ALL_STORES_SHEET, ALL_STORES_COLUMNS);
    let mut all_products = Sheet::new(ALL_PRODUCTS_SHEET, PRODUCTS_COLUMNS);
    let mut status_log = Sheet::new(STATUS_LOG_SHEET, STATUS_LOG_COLUMNS);

    for chunk in chunks {
        append_rows(&mut all_stores, &chunk.workbook, ALL_STORES_SHEET);
        append_rows(&mut all_products, &chunk.workbook, PRODUCTS_SHEET);
        append_rows(&mut status_log, &chunk.workbook, STATUS_LOG_SHEET);
    }

    let store_summary = derive_store_summary(&all_stores);
    let status_summary = derive_status_summary(&all_stores);
    let app_usage = derive_app_usage(&all_stores);

    let shard_count = declared_shard_count(chunks, config);
    let shard_size = estimated_shard_size(chunks, config);
    let missing = missing_chunks_sheet(chunks, shard_count, shard_size);

    let mut workbook = Workbook::new(FINAL_WORKBOOK_NAME);
    workbook.add_sheet(all_stores);
    workbook.add_sheet(all_products);
    workbook.add_sheet(store_summary);
    workbook.add_sheet(status_log);
    workbook.add_sheet(status_summary);
    workbook.add_sheet(app_usage);
    if let Some(missing) = missing {
        workbook.add_sheet(missing);
    }
    workbook
}

/// Copies a source sheet's rows into the target, aligning by column name
///
/// Shards written by older runs may order or omit columns; absent values
/// become empty cells rather than skewing the row.
fn append_rows(target: &mut Sheet, source_workbook: &Workbook, sheet_name: &str) {
    let source = match source_workbook.sheet(sheet_name) {
        Some(sheet) => sheet,
        None => return,
    };
    let columns: Vec<String> = target.header.clone();
    for row in &source.rows {
        target.push_row(
            columns
                .iter()
                .map(|column| source.value(row, column).to_string())
                .collect(),
        );
    }
}

/// One row per distinct store with its subscription ratio and previews
fn derive_store_summary(all_stores: &Sheet) -> Sheet {
    let mut summary = Sheet::new(STORE_SUMMARY_SHEET, STORE_SUMMARY_COLUMNS);
    let mut seen: HashSet<String> = HashSet::new();

    for row in &all_stores.rows {
        let domain = all_stores.value(row, "Domain");
        if domain.is_empty() || seen.contains(domain) {
            continue;
        }
        seen.insert(domain.to_string());

        let total_skus = all_stores.value(row, "Total_SKUs");
        let sub_count = all_stores.value(row, "Subscription_Products");
        let ratio = subscription_ratio(sub_count, total_skus);

        summary.push_row(vec![
            domain.to_string(),
            all_stores.value(row, "Status").to_string(),
            all_stores.value(row, "Subscription_App").to_string(),
            total_skus.to_string(),
            sub_count.to_string(),
            ratio,
            all_stores.value(row, "Sub_Product_Names").to_string(),
            all_stores.value(row, "Sub_Plan_Names").to_string(),
        ]);
    }

    summary
}

/// Subscription items over catalog size, blank when the catalog is empty
/// or unparseable
fn subscription_ratio(sub_count: &str, total_skus: &str) -> String {
    let subs: f64 = match sub_count.parse() {
        Ok(value) => value,
        Err(_) => return String::new(),
    };
    let total: f64 = match total_skus.parse() {
        Ok(value) if value > 0.0 => value,
        _ => return String::new(),
    };
    format!("{:.4}", subs / total)
}

fn derive_status_summary(all_stores: &Sheet) -> Sheet {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for row in &all_stores.rows {
        let status = all_stores.value(row, "Status");
        if !status.is_empty() {
            *counts.entry(status.to_string()).or_insert(0) += 1;
        }
    }
    frequency_sheet(STATUS_SUMMARY_SHEET, STATUS_SUMMARY_COLUMNS, counts)
}

/// Counts stores per provider across the `" | "`-joined provider column
fn derive_app_usage(all_stores: &Sheet) -> Sheet {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for row in &all_stores.rows {
        for app in all_stores.value(row, "Apps_Detected").split(" | ") {
            let app = app.trim();
            if !app.is_empty() {
                *counts.entry(app.to_string()).or_insert(0) += 1;
            }
        }
    }
    frequency_sheet(APP_USAGE_SHEET, APP_USAGE_COLUMNS, counts)
}

/// Renders a frequency table sorted by count descending, then name
fn frequency_sheet(name: &str, columns: &[&str], counts: BTreeMap<String, usize>) -> Sheet {
    let mut entries: Vec<(String, usize)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut sheet = Sheet::new(name, columns);
    for (key, count) in entries {
        sheet.push_row(vec![key, count.to_string()]);
    }
    sheet
}

/// The fixed shard total `K` the run was declared with
///
/// Falls back to what the artifacts say about themselves: the largest
/// `Shard_Count` any Meta sheet recorded, or past that the largest index
/// seen plus one.
fn declared_shard_count(chunks: &[LoadedChunk], config: &MergeConfig) -> usize {
    if let Some(count) = config.shard_count {
        return count;
    }

    let recorded = chunks
        .iter()
        .filter_map(|chunk| meta_value(chunk, "Shard_Count"))
        .max()
        .unwrap_or(0);
    let implied = chunks.iter().map(|chunk| chunk.index + 1).max().unwrap_or(0);
    recorded.max(implied)
}

/// Per-shard domain span used to estimate what a missing shard covered
///
/// The final shard absorbs the roster remainder, so only a non-final
/// shard's recorded span is a usable estimate.
fn estimated_shard_size(chunks: &[LoadedChunk], config: &MergeConfig) -> usize {
    if let Some(size) = config.shard_size {
        return size;
    }

    for chunk in chunks {
        let index = meta_value(chunk, "Shard_Index");
        let count = meta_value(chunk, "Shard_Count");
        let start = meta_value(chunk, "Domain_Start");
        let end = meta_value(chunk, "Domain_End");
        if let (Some(index), Some(count), Some(start), Some(end)) = (index, count, start, end) {
            if index + 1 < count && end > start {
                return end - start;
            }
        }
    }
    0
}

fn meta_value(chunk: &LoadedChunk, column: &str) -> Option<usize> {
    let meta = chunk.workbook.sheet(META_SHEET)?;
    let row = meta.rows.first()?;
    meta.value(row, column).parse().ok()
}

/// Builds the `Missing_Chunks` sheet, or `None` when every declared shard
/// is accounted for
fn missing_chunks_sheet(
    chunks: &[LoadedChunk],
    shard_count: usize,
    shard_size: usize,
) -> Option<Sheet> {
    let missing: Vec<usize> = (0..shard_count)
        .filter(|index| !chunks.iter().any(|chunk| chunk.index == *index))
        .collect();
    if missing.is_empty() {
        return None;
    }

    tracing::warn!(
        "{} of {} shards missing: {:?}",
        missing.len(),
        shard_count,
        missing
    );

    let mut sheet = Sheet::new(MISSING_CHUNKS_SHEET, MISSING_CHUNKS_COLUMNS);
    for index in missing {
        let (start, end) = if shard_size > 0 {
            let start = (index * shard_size).to_string();
            // The final shard runs to the end of the roster, which is
            // unknowable from the surviving artifacts
            let end = if index + 1 == shard_count {
                String::new()
            } else {
                ((index + 1) * shard_size).to_string()
            };
            (start, end)
        } else {
            (String::new(), String::new())
        };
        sheet.push_row(vec![index.to_string(), start, end]);
    }
    Some(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::writer::build_shard_workbook;
    use crate::roster::Shard;
    use crate::state::{ScanStatus, StoreResult};

    fn create_test_chunk(index: usize, count: usize, domains: &[(&str, ScanStatus)]) -> LoadedChunk {
        let results: Vec<StoreResult> = domains
            .iter()
            .map(|(domain, status)| StoreResult::unscanned(*domain, status.clone()))
            .collect();
        let shard = Shard {
            index,
            count,
            start: index * 10,
            end: index * 10 + 10,
        };
        LoadedChunk {
            index,
            workbook: build_shard_workbook(&results, shard, "hash"),
        }
    }

    fn merge_config() -> MergeConfig {
        MergeConfig {
            search_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            shard_count: None,
            shard_size: None,
        }
    }

    #[test]
    fn test_chunk_index_parsing() {
        assert_eq!(chunk_index(Path::new("/out/chunk_0")), Some(0));
        assert_eq!(chunk_index(Path::new("/out/chunk_17")), Some(17));
        assert_eq!(chunk_index(Path::new("/out/chunk_03")), Some(3));
        assert_eq!(chunk_index(Path::new("/out/chunk_3.partial")), None);
        assert_eq!(chunk_index(Path::new("/out/final")), None);
        assert_eq!(chunk_index(Path::new("/out/chunk_")), None);
    }

    #[test]
    fn test_rows_concatenate_in_shard_order() {
        let chunks = vec![
            create_test_chunk(1, 2, &[("b.com", ScanStatus::NoSubscription)]),
            create_test_chunk(0, 2, &[("a.com", ScanStatus::Found)]),
        ];
        // Discovery sorts by index before loading; mirror that here
        let mut chunks = chunks;
        chunks.sort_by_key(|c| c.index);

        let workbook = build_final_workbook(&chunks, &merge_config());
        let all_stores = workbook.sheet(ALL_STORES_SHEET).unwrap();
        assert_eq!(all_stores.rows[0][0], "a.com");
        assert_eq!(all_stores.rows[1][0], "b.com");
    }

    #[test]
    fn test_status_summary_ordering() {
        let chunks = vec![create_test_chunk(
            0,
            1,
            &[
                ("a.com", ScanStatus::Found),
                ("b.com", ScanStatus::NoSubscription),
                ("c.com", ScanStatus::NoSubscription),
                ("d.com", ScanStatus::Timeout),
            ],
        )];

        let workbook = build_final_workbook(&chunks, &merge_config());
        let summary = workbook.sheet(STATUS_SUMMARY_SHEET).unwrap();
        // Count descending, then name ascending for the ties
        assert_eq!(
            summary.rows,
            vec![
                vec!["no_subscription".to_string(), "2".to_string()],
                vec!["found".to_string(), "1".to_string()],
                vec!["timeout".to_string(), "1".to_string()],
            ]
        );
    }

    #[test]
    fn test_store_summary_dedupes_repeated_domains() {
        // A re-run shard can repeat a domain; the first row wins
        let chunks = vec![
            create_test_chunk(0, 2, &[("dup.com", ScanStatus::Found)]),
            create_test_chunk(
                1,
                2,
                &[
                    ("dup.com", ScanStatus::NoSubscription),
                    ("other.com", ScanStatus::NoSubscription),
                ],
            ),
        ];

        let workbook = build_final_workbook(&chunks, &merge_config());

        // All_Stores keeps every contributed row
        let all_stores = workbook.sheet(ALL_STORES_SHEET).unwrap();
        assert_eq!(all_stores.rows.len(), 3);

        let summary = workbook.sheet(STORE_SUMMARY_SHEET).unwrap();
        assert_eq!(summary.rows.len(), 2);
        assert_eq!(summary.value(&summary.rows[0], "Store"), "dup.com");
        assert_eq!(summary.value(&summary.rows[0], "Status"), "found");
        assert_eq!(summary.value(&summary.rows[1], "Store"), "other.com");
    }

    #[test]
    fn test_app_usage_counts_stores_per_provider() {
        let mut first = StoreResult::unscanned("a.com", ScanStatus::Found);
        first.providers.record("Recharge Subscriptions", "homepage");
        first.providers.record("Skio Subscriptions", "homepage");
        let mut second = StoreResult::unscanned("b.com", ScanStatus::AppDetectedNoProductApi);
        second.providers.record("Skio Subscriptions", "homepage");

        let shard = Shard {
            index: 0,
            count: 1,
            start: 0,
            end: 2,
        };
        let chunks = vec![LoadedChunk {
            index: 0,
            workbook: build_shard_workbook(&[first, second], shard, "hash"),
        }];

        let workbook = build_final_workbook(&chunks, &merge_config());
        let usage = workbook.sheet(APP_USAGE_SHEET).unwrap();
        assert_eq!(
            usage.rows,
            vec![
                vec!["Skio Subscriptions".to_string(), "2".to_string()],
                vec!["Recharge Subscriptions".to_string(), "1".to_string()],
            ]
        );
    }

    #[test]
    fn test_subscription_ratio() {
        assert_eq!(subscription_ratio("2", "42"), "0.0476");
        assert_eq!(subscription_ratio("0", "42"), "0.0000");
        assert_eq!(subscription_ratio("0", "0"), "");
        assert_eq!(subscription_ratio("", ""), "");
    }

    #[test]
    fn test_missing_chunks_with_ranges() {
        let chunks = vec![
            create_test_chunk(0, 6, &[("a.com", ScanStatus::Found)]),
            create_test_chunk(2, 6, &[("b.com", ScanStatus::Found)]),
            create_test_chunk(5, 6, &[("c.com", ScanStatus::Found)]),
        ];

        let sheet = missing_chunks_sheet(&chunks, 6, 10).unwrap();
        assert_eq!(
            sheet.rows,
            vec![
                vec!["1".to_string(), "10".to_string(), "20".to_string()],
                vec!["3".to_string(), "30".to_string(), "40".to_string()],
                vec!["4".to_string(), "40".to_string(), "50".to_string()],
            ]
        );
    }

    #[test]
    fn test_missing_final_shard_has_open_range() {
        let chunks = vec![create_test_chunk(0, 2, &[("a.com", ScanStatus::Found)])];
        let sheet = missing_chunks_sheet(&chunks, 2, 10).unwrap();
        assert_eq!(sheet.rows, vec![vec!["1".to_string(), "10".to_string(), "".to_string()]]);
    }

    #[test]
    fn test_no_missing_chunks_sheet_when_complete() {
        let chunks = vec![
            create_test_chunk(0, 2, &[("a.com", ScanStatus::Found)]),
            create_test_chunk(1, 2, &[("b.com", ScanStatus::Found)]),
        ];
        assert!(missing_chunks_sheet(&chunks, 2, 10).is_none());
    }

    #[test]
    fn test_shard_count_inferred_from_meta() {
        let chunks = vec![create_test_chunk(1, 4, &[("a.com", ScanStatus::Found)])];
        assert_eq!(declared_shard_count(&chunks, &merge_config()), 4);

        let flagged = MergeConfig {
            shard_count: Some(8),
            ..merge_config()
        };
        assert_eq!(declared_shard_count(&chunks, &flagged), 8);
    }

    #[test]
    fn test_shard_size_inferred_from_non_final_meta() {
        // Shard 1 of 4 spans [10, 20), so the estimate is 10
        let chunks = vec![create_test_chunk(1, 4, &[("a.com", ScanStatus::Found)])];
        assert_eq!(estimated_shard_size(&chunks, &merge_config()), 10);

        // A final shard's span is not a usable estimate
        let only_final = vec![create_test_chunk(3, 4, &[("a.com", ScanStatus::Found)])];
        assert_eq!(estimated_shard_size(&only_final, &merge_config()), 0);
    }

    #[test]
    fn test_zero_chunks_builds_header_only_workbook() {
        let config = MergeConfig {
            shard_count: Some(3),
            ..merge_config()
        };
        let workbook = build_final_workbook(&[], &config);

        let all_stores = workbook.sheet(ALL_STORES_SHEET).unwrap();
        assert!(all_stores.rows.is_empty());
        assert!(!all_stores.header.is_empty());

        let missing = workbook.sheet(MISSING_CHUNKS_SHEET).unwrap();
        assert_eq!(missing.rows.len(), 3);
    }
}
