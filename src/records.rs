// src/records.rs
use std::sync::Arc;

use tracing::debug;

use crate::error::RecordParseError;

pub const DELIMITER: char = ',';

/// Split one line into fields. Plain split on the delimiter: quoting and
/// escaping are not understood, so a field may not contain a comma. This is
/// the only place that knows the line format.
pub fn split_fields(line: &str) -> Vec<String> {
    line.split(DELIMITER).map(str::to_string).collect()
}

/// One input record: the line as read plus its fields in header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRow {
    header: Arc<[String]>,
    values: Vec<String>,
    raw: String,
    lowered: String,
}

impl DataRow {
    pub fn new(header: Arc<[String]>, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self {
            header,
            values: split_fields(&raw),
            lowered: raw.to_lowercase(),
            raw,
        }
    }

    /// The full serialized line, byte for byte as it was read.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// `raw` lowercased, computed once per row for case-insensitive matching.
    pub fn raw_lowercase(&self) -> &str {
        &self.lowered
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Value of the named column, if the row has that many fields.
    pub fn get(&self, column: &str) -> Option<&str> {
        let idx = self.header.iter().position(|h| h == column)?;
        self.values.get(idx).map(String::as_str)
    }

    /// `(column, value)` pairs in header order. Fields beyond the header
    /// are not named and so not yielded here.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.header
            .iter()
            .zip(self.values.iter())
            .map(|(h, v)| (h.as_str(), v.as_str()))
    }
}

/// A parsed record source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTable {
    /// The header line as read.
    pub header_line: String,
    pub header: Arc<[String]>,
    pub rows: Vec<DataRow>,
}

impl RecordTable {
    /// The first non-blank line, trimmed, is the header; every later
    /// non-blank line is a row. Rows keep their surrounding whitespace.
    pub fn parse(text: &str) -> Result<Self, RecordParseError> {
        let mut lines = text
            .lines()
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .filter(|l| !l.trim().is_empty());
        let header_line = lines
            .next()
            .ok_or(RecordParseError::MissingHeader)?
            .trim()
            .to_string();
        let header: Arc<[String]> = split_fields(&header_line).into();

        let rows: Vec<DataRow> = lines
            .map(|line| DataRow::new(Arc::clone(&header), line))
            .collect();
        debug!(columns = header.len(), rows = rows.len(), "parsed record source");

        Ok(Self {
            header_line,
            header,
            rows,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RecordParseError> {
        let text = std::str::from_utf8(bytes)?;
        Self::parse(text)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
