use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use csv::ReaderBuilder;
use encoding_rs::Encoding;
use tracing::debug;

pub const DEFAULT_ENCODING: &str = "latin1";

/// A delimited file as read from disk: header row plus string cells, nothing
/// interpreted yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    index: HashMap<String, usize>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();
        Self {
            headers,
            rows,
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column(name)
            .ok_or_else(|| anyhow!("missing required column {name:?}"))
    }
}

pub fn resolve_encoding(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| anyhow!("unknown text encoding {label:?}"))
}

/// Read and decode a CSV file. Any I/O, decoding or structural problem is
/// fatal.
pub fn load_table(path: &Path, encoding: &'static Encoding) -> Result<RawTable> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let table = parse_table(&bytes, encoding).with_context(|| format!("parse {}", path.display()))?;
    debug!(
        path = %path.display(),
        rows = table.len(),
        columns = table.headers.len(),
        "loaded table"
    );
    Ok(table)
}

pub fn parse_table(bytes: &[u8], encoding: &'static Encoding) -> Result<RawTable> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(anyhow!("input is not valid {}", encoding.name()));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .context("read header row")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect::<Vec<_>>();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(anyhow!("empty header row"));
    }

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("read record {}", idx + 1))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable::new(headers, rows))
}
