//! Report artifact construction and aggregation
//!
//! This module owns everything written to disk, including:
//! - The CSV-sheet workbook container with atomic directory publication
//! - The per-shard artifact writer (scan sheets plus provenance metadata)
//! - The cross-shard merger that rebuilds the consolidated final workbook

mod merge;
mod workbook;
mod writer;

pub use merge::{
    build_final_workbook, run_merge, LoadedChunk, ALL_PRODUCTS_SHEET, APP_USAGE_COLUMNS,
    APP_USAGE_SHEET, FINAL_WORKBOOK_NAME, MISSING_CHUNKS_COLUMNS, MISSING_CHUNKS_SHEET,
    STATUS_SUMMARY_COLUMNS, STATUS_SUMMARY_SHEET, STORE_SUMMARY_COLUMNS, STORE_SUMMARY_SHEET,
};
pub use workbook::{OutputError, OutputResult, Sheet, Workbook};
pub use writer::{
    build_shard_workbook, chunk_name, write_shard_artifact, ALL_STORES_COLUMNS, ALL_STORES_SHEET,
    META_COLUMNS, META_SHEET, PRODUCTS_COLUMNS, PRODUCTS_SHEET, STATUS_LOG_COLUMNS,
    STATUS_LOG_SHEET,
};
