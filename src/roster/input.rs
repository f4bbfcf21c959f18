//! Store roster loading
//!
//! The roster is a CSV file with a header row. One column holds the store
//! addresses; it is located by name, falling back to the first column when
//! no name matches.

use crate::report::Sheet;
use crate::roster::normalize_domain;
use crate::{Result, ScanError};
use std::fs;
use std::path::Path;

/// Substrings that identify the store address column in a roster header
pub const URL_COLUMN_TOKENS: &[&str] = &["url", "domain", "store", "site", "link", "web", "company"];

/// Picks the store address column from a header row
///
/// The first column whose lowercased name contains any recognized token wins;
/// otherwise the first column is assumed.
pub fn url_column(header: &[String]) -> usize {
    for (index, column) in header.iter().enumerate() {
        let lowered = column.to_lowercase();
        if URL_COLUMN_TOKENS.iter().any(|token| lowered.contains(token)) {
            return index;
        }
    }
    0
}

/// Loads and normalizes the store roster from a CSV file
///
/// Each row's address cell is normalized to a bare domain; rows whose cell
/// normalizes to nothing are dropped. Duplicates are kept as-is, and order
/// follows the file. A readable file with no usable rows yields an empty
/// roster, not an error: a zero-store run must still produce an artifact.
///
/// # Arguments
///
/// * `path` - Roster CSV path; the first row must be a header
///
/// # Returns
///
/// The ordered domain list, or an error when the file cannot be read.
pub fn load_roster(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|source| ScanError::Input {
        path: path.display().to_string(),
        source,
    })?;

    let sheet = Sheet::parse_csv("roster", &text);
    let column = url_column(&sheet.header);

    let mut domains = Vec::new();
    for row in &sheet.rows {
        if let Some(cell) = row.get(column) {
            if let Some(domain) = normalize_domain(cell) {
                domains.push(domain);
            }
        }
    }

    Ok(domains)
}
