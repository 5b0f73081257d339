//! Search records and the boundary that produces them.
//!
//! Rows arrive loosely typed (the shape of a SQL export or an API dump) and
//! are converted into [`SearchRecord`] before anything else sees them. A row
//! that cannot be converted fails the whole load.

use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{InsightError, Result};

/// One search issued against the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub query: String,
    pub result_count: u64,
    /// wall-clock time as recorded by the shop
    pub timestamp: NaiveDateTime,
}

/// A row as exported by the tracker table, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSearchRow {
    #[serde(default)]
    pub search_query: Value,
    #[serde(default)]
    pub results_count: Value,
    #[serde(default)]
    pub date_add: Value,
}

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse `YYYY-MM-DD HH:MM:SS` (space or `T`, optional fraction) or RFC 3339.
/// RFC 3339 input keeps its wall-clock time; the offset is dropped.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_local()))
}

impl SearchRecord {
    /// Validate one raw row. `row` is its position in the input, for errors.
    pub fn try_from_raw(row: usize, raw: &RawSearchRow) -> Result<Self> {
        let query = match &raw.search_query {
            Value::String(s) => s.clone(),
            Value::Null => return Err(InsightError::invalid_record(row, "missing search_query")),
            other => {
                return Err(InsightError::invalid_record(
                    row,
                    format!("search_query must be a string, got {other}"),
                ))
            }
        };

        let result_count = match &raw.results_count {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        }
        .ok_or_else(|| {
            InsightError::invalid_record(
                row,
                format!("results_count must be a non-negative integer, got {}", raw.results_count),
            )
        })?;

        let timestamp = match &raw.date_add {
            Value::String(s) => parse_timestamp(s),
            _ => None,
        }
        .ok_or_else(|| InsightError::InvalidTimestamp {
            row,
            value: match &raw.date_add {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        })?;

        Ok(Self {
            query,
            result_count,
            timestamp,
        })
    }
}

/// Convert every row, failing on the first bad one.
pub fn parse_rows(rows: &[RawSearchRow]) -> Result<Vec<SearchRecord>> {
    rows.iter()
        .enumerate()
        .map(|(i, raw)| SearchRecord::try_from_raw(i, raw))
        .collect()
}

/// Trailing time window: everything at or after `now - days`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub now: NaiveDateTime,
    pub days: u32,
}

impl Window {
    pub fn new(now: NaiveDateTime, days: u32) -> Self {
        Self { now, days }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.now
            .checked_sub_signed(Duration::days(i64::from(self.days)))
            .unwrap_or(NaiveDateTime::MIN)
    }

    #[inline]
    pub fn contains(&self, ts: &NaiveDateTime) -> bool {
        *ts >= self.start()
    }

    /// Keep records inside the window, in input order.
    pub fn filter(&self, records: Vec<SearchRecord>) -> Vec<SearchRecord> {
        let start = self.start();
        records.into_iter().filter(|r| r.timestamp >= start).collect()
    }
}

/// Supplies the records of one run.
pub trait RecordSource {
    fn fetch(&self, window: &Window) -> Result<Vec<SearchRecord>>;
}

/// Records already in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pub records: Vec<SearchRecord>,
}

impl MemorySource {
    pub fn new(records: Vec<SearchRecord>) -> Self {
        Self { records }
    }
}

impl RecordSource for MemorySource {
    fn fetch(&self, window: &Window) -> Result<Vec<SearchRecord>> {
        Ok(window.filter(self.records.clone()))
    }
}

/// Rows exported to a JSON file: either one array of row objects or one
/// object per line.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    pub path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn read_rows(&self) -> Result<Vec<RawSearchRow>> {
        let mut text = String::new();
        File::open(&self.path)?.read_to_string(&mut text)?;
        if text.trim_start().starts_with('[') {
            return Ok(serde_json::from_str(&text)?);
        }
        text.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(InsightError::from))
            .collect()
    }
}

impl RecordSource for JsonFileSource {
    fn fetch(&self, window: &Window) -> Result<Vec<SearchRecord>> {
        let rows = self.read_rows()?;
        let total = rows.len();
        let records = window.filter(parse_rows(&rows)?);
        debug!(path = %self.path.display(), rows = total, "rows read");
        info!(
            records = records.len(),
            dropped = total - records.len(),
            window_days = window.days,
            "records loaded"
        );
        Ok(records)
    }
}
