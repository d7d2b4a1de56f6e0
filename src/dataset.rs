use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::debug;

use crate::{error::InputError, io_utils};

/// A fully decoded CSV table kept in memory as strings.
///
/// Columns are looked up by header name so that extra columns in the source
/// files are ignored.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub name: String,
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn load(
        name: &str,
        path: &Path,
        delimiter: u8,
        encoding: &'static Encoding,
    ) -> Result<Self> {
        let mut reader = io_utils::open_csv_reader_from_path(name, path, delimiter)?;
        let headers = io_utils::reader_headers(&mut reader, encoding)
            .with_context(|| format!("Reading headers for {path:?}"))?;
        let mut rows = Vec::new();
        for (row_idx, record) in reader.byte_records().enumerate() {
            let record =
                record.with_context(|| format!("Reading row {} in {path:?}", row_idx + 2))?;
            rows.push(io_utils::decode_record(&record, encoding)?);
        }
        debug!("Loaded {} row(s) from {:?}", rows.len(), path);
        Ok(Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    pub fn from_rows(name: &str, headers: &[&str], rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.to_string(),
            path: PathBuf::new(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    pub fn require_column(&self, column: &str) -> Result<usize, InputError> {
        self.column_index(column)
            .ok_or_else(|| InputError::SchemaMismatch {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// Cell at `row`/`col`; short rows read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|s| s.as_str())
            .unwrap_or("")
    }
}
