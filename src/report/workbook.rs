//! Workbook artifacts
//!
//! A workbook is this crate's portable tabular artifact: a directory holding
//! one UTF-8 CSV file per named sheet. Workbooks are published atomically
//! (staged as `<name>.partial`, then renamed), so a workbook either exists
//! complete and well-formed or does not exist at all; readers never observe
//! a half-written artifact.

use std::fs;
use std::mem::take;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while writing or reading workbook artifacts
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Workbook {path} is missing required sheet {sheet}")]
    MissingSheet { path: String, sheet: String },

    #[error("Workbook path {path} has no usable directory name")]
    InvalidPath { path: String },
}

/// Result type alias for workbook operations
pub type OutputResult<T> = std::result::Result<T, OutputError>;

/// One named table: a header row plus data rows
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, header: &[&str]) -> Self {
        Self {
            name: name.into(),
            header: header.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Index of a header column by name
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.header.iter().position(|h| h == column)
    }

    /// A row's value in a named column, or "" when the column is absent
    /// or the row is ragged
    pub fn value<'a>(&self, row: &'a [String], column: &str) -> &'a str {
        self.column_index(column)
            .and_then(|i| row.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Encodes the sheet as CSV, header first
    pub fn to_csv(&self) -> String {
        let mut buf = String::new();
        write_row(&mut buf, &self.header);
        for row in &self.rows {
            write_row(&mut buf, row);
        }
        buf
    }

    /// Parses CSV text into a sheet; the first row becomes the header
    pub fn parse_csv(name: impl Into<String>, text: &str) -> Self {
        let mut rows = parse_rows(text);
        let header = if rows.is_empty() {
            Vec::new()
        } else {
            rows.remove(0)
        };
        Self {
            name: name.into(),
            header,
            rows,
        }
    }
}

/// A named collection of sheets, stored as one directory on disk
///
/// Sheet insertion order is preserved on write; on load, sheets arrive
/// sorted by file name. Both orders are deterministic.
#[derive(Debug, Clone)]
pub struct Workbook {
    pub name: String,
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sheets: Vec::new(),
        }
    }

    pub fn add_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Like [`Workbook::sheet`], but a missing sheet is an error
    pub fn expect_sheet(&self, name: &str) -> OutputResult<&Sheet> {
        self.sheet(name).ok_or_else(|| OutputError::MissingSheet {
            path: self.name.clone(),
            sheet: name.to_string(),
        })
    }

    /// Writes the workbook under `parent`, replacing any previous artifact
    /// of the same name
    ///
    /// All sheets are staged into `<name>.partial` first and the staging
    /// directory is renamed into place, so a crash mid-write never leaves a
    /// readable half-artifact behind.
    ///
    /// # Returns
    ///
    /// The final artifact path.
    pub fn save_under(&self, parent: &Path) -> OutputResult<PathBuf> {
        fs::create_dir_all(parent)?;

        let staging = parent.join(format!("{}.partial", self.name));
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;

        for sheet in &self.sheets {
            let file = staging.join(format!("{}.csv", sheet.name));
            fs::write(file, sheet.to_csv())?;
        }

        let target = parent.join(&self.name);
        if target.exists() {
            fs::remove_dir_all(&target)?;
        }
        fs::rename(&staging, &target)?;
        Ok(target)
    }

    /// Loads a workbook directory, parsing every `.csv` file as a sheet
    pub fn load(dir: &Path) -> OutputResult<Self> {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| OutputError::InvalidPath {
                path: dir.display().to_string(),
            })?;

        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().map(|e| e == "csv").unwrap_or(false))
            .collect();
        files.sort();

        let mut sheets = Vec::new();
        for file in files {
            let sheet_name = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let text = fs::read_to_string(&file)?;
            sheets.push(Sheet::parse_csv(sheet_name, &text));
        }

        Ok(Self { name, sheets })
    }
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Appends one CSV row, quoting fields that require it
fn write_row(buf: &mut String, row: &[String]) {
    let mut first = true;
    for cell in row {
        if !first {
            buf.push(',');
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            buf.push('"');
            buf.push_str(&cell.replace('"', "\"\""));
            buf.push('"');
        } else {
            buf.push_str(cell);
        }
    }
    buf.push('\n');
}

/// Minimal CSV parser (quotes and CRLF tolerant)
fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next(); // double-quote escape
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => {
                row.push(take(&mut field));
            }
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(take(&mut field));
                if !(row.len() == 1 && row[0].is_empty()) {
                    rows.push(take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(ch),
        }
    }

    // Flush a trailing row without a final newline
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_csv_roundtrip_plain() {
        let mut sheet = Sheet::new("Plain", &["A", "B"]);
        sheet.push_row(cells(&["one", "two"]));
        sheet.push_row(cells(&["three", "four"]));

        let parsed = Sheet::parse_csv("Plain", &sheet.to_csv());
        assert_eq!(parsed, sheet);
    }

    #[test]
    fn test_csv_roundtrip_quoting() {
        let mut sheet = Sheet::new("Tricky", &["Title", "Plans"]);
        sheet.push_row(cells(&["Coffee, dark roast", "Monthly, Weekly"]));
        sheet.push_row(cells(&["He said \"now\"", "line\nbreak"]));

        let encoded = sheet.to_csv();
        assert!(encoded.contains("\"Coffee, dark roast\""));
        assert!(encoded.contains("\"He said \"\"now\"\"\""));

        let parsed = Sheet::parse_csv("Tricky", &encoded);
        assert_eq!(parsed, sheet);
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let parsed = Sheet::parse_csv("S", "A,B\n\n1,2\n\n");
        assert_eq!(parsed.rows, vec![cells(&["1", "2"])]);
    }

    #[test]
    fn test_parse_without_trailing_newline() {
        let parsed = Sheet::parse_csv("S", "A,B\n1,2");
        assert_eq!(parsed.rows, vec![cells(&["1", "2"])]);
    }

    #[test]
    fn test_value_accessor() {
        let mut sheet = Sheet::new("S", &["Domain", "Status"]);
        sheet.push_row(cells(&["a.com", "found"]));

        let row = &sheet.rows[0];
        assert_eq!(sheet.value(row, "Status"), "found");
        assert_eq!(sheet.value(row, "Missing"), "");

        let short_row = cells(&["b.com"]);
        assert_eq!(sheet.value(&short_row, "Status"), "");
    }

    #[test]
    fn test_workbook_save_and_load() {
        let dir = tempdir().unwrap();

        let mut status = Sheet::new("Status_Log", &["Domain", "Status"]);
        status.push_row(cells(&["a.com", "found"]));

        let mut workbook = Workbook::new("chunk_0");
        workbook.add_sheet(status);

        let path = workbook.save_under(dir.path()).unwrap();
        assert!(path.ends_with("chunk_0"));
        assert!(!dir.path().join("chunk_0.partial").exists());

        let loaded = Workbook::load(&path).unwrap();
        assert_eq!(loaded.name, "chunk_0");
        let sheet = loaded.expect_sheet("Status_Log").unwrap();
        assert_eq!(sheet.rows, vec![cells(&["a.com", "found"])]);
    }

    #[test]
    fn test_save_replaces_previous_artifact() {
        let dir = tempdir().unwrap();

        let mut first = Workbook::new("chunk_1");
        first.add_sheet(Sheet::new("Status_Log", &["Domain", "Status"]));
        first.save_under(dir.path()).unwrap();

        let mut second_sheet = Sheet::new("Status_Log", &["Domain", "Status"]);
        second_sheet.push_row(cells(&["b.com", "timeout"]));
        let mut second = Workbook::new("chunk_1");
        second.add_sheet(second_sheet);
        second.save_under(dir.path()).unwrap();

        let loaded = Workbook::load(&dir.path().join("chunk_1")).unwrap();
        assert_eq!(loaded.expect_sheet("Status_Log").unwrap().rows.len(), 1);
    }

    #[test]
    fn test_expect_sheet_missing() {
        let workbook = Workbook::new("chunk_2");
        let err = workbook.expect_sheet("Status_Log").unwrap_err();
        assert!(matches!(err, OutputError::MissingSheet { .. }));
    }

    #[test]
    fn test_save_is_byte_stable() {
        let dir = tempdir().unwrap();

        let mut sheet = Sheet::new("Meta", &["Shard_Index", "Stores"]);
        sheet.push_row(cells(&["3", "120"]));
        let mut workbook = Workbook::new("chunk_3");
        workbook.add_sheet(sheet);

        workbook.save_under(dir.path()).unwrap();
        let first = fs::read(dir.path().join("chunk_3").join("Meta.csv")).unwrap();
        workbook.save_under(dir.path()).unwrap();
        let second = fs::read(dir.path().join("chunk_3").join("Meta.csv")).unwrap();
        assert_eq!(first, second);
    }
}
