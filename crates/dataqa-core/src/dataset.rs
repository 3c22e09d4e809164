//! The queried table: a header row plus string cells, read with the `csv` crate.
//! Reloaded on every render pass; nothing here caches.

use crate::error::{DataQaError, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Semantic type inferred per column. Empty cells are ignored during inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    Text,
    /// Every cell in the column is empty.
    Empty,
}

impl ColumnType {
    fn of_cell(cell: &str) -> Option<ColumnType> {
        let t = cell.trim();
        if t.is_empty() {
            return None;
        }
        if t.parse::<i64>().is_ok() {
            Some(ColumnType::Integer)
        } else if t.parse::<f64>().is_ok() {
            Some(ColumnType::Float)
        } else if t.eq_ignore_ascii_case("true") || t.eq_ignore_ascii_case("false") {
            Some(ColumnType::Boolean)
        } else {
            Some(ColumnType::Text)
        }
    }

    /// Widen two observed types: Integer + Float = Float, any other mix = Text.
    fn merge(self, other: ColumnType) -> ColumnType {
        use ColumnType::*;
        match (self, other) {
            (Empty, t) | (t, Empty) => t,
            (a, b) if a == b => a,
            (Integer, Float) | (Float, Integer) => Float,
            _ => Text,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnType::Integer => "int",
            ColumnType::Float => "float",
            ColumnType::Boolean => "bool",
            ColumnType::Text => "text",
            ColumnType::Empty => "empty",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    path: PathBuf,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Read a comma-delimited file with a header row. Missing files, ragged rows,
    /// invalid UTF-8 and header-less files are all `DataLoad` errors.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| DataQaError::data_load(path, e))?;
        let mut ds = Self::from_reader(file).map_err(|e| match e {
            DataQaError::DataLoad { reason, .. } => DataQaError::data_load(path, reason),
            other => DataQaError::data_load(path, other),
        })?;
        ds.path = path.to_path_buf();
        Ok(ds)
    }

    /// `load` on the blocking pool, for callers on the async runtime.
    pub async fn load_async(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let task_path = path.clone();
        tokio::task::spawn_blocking(move || Self::load(task_path))
            .await
            .map_err(|e| DataQaError::data_load(path, e))?
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(DataQaError::data_load("<reader>", "no header row"));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self {
            path: PathBuf::new(),
            headers,
            rows,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn head(&self, n: usize) -> &[Vec<String>] {
        &self.rows[..n.min(self.rows.len())]
    }

    pub fn column_types(&self) -> Vec<ColumnType> {
        (0..self.headers.len())
            .map(|col| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(col).and_then(|c| ColumnType::of_cell(c)))
                    .fold(ColumnType::Empty, ColumnType::merge)
            })
            .collect()
    }

    /// Serialize the header and up to `max_rows` rows back to CSV for prompt context.
    /// Also returns the number of data rows written; quoted cells may span several
    /// lines, so the text's line count is not a row count.
    pub fn to_csv_snippet(&self, max_rows: usize) -> Result<(String, usize)> {
        let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        let rows = self.head(max_rows);
        for row in rows {
            writer.write_record(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| DataQaError::Io(e.into_error()))?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        Ok((text, rows.len()))
    }
}
