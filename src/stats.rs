//! Headline numbers for the report: volume, failure rate, top queries and
//! the daily trend.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;

use crate::{
    error::{ensure_finite, Result},
    record::SearchRecord,
    temporal::TemporalSummary,
};

pub const PEAK_HOURS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryCount {
    pub query: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZeroResultQuery {
    pub query: String,
    pub attempts: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub searches: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourCount {
    pub hour: u32,
    pub searches: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchSummary {
    pub total_searches: usize,
    /// distinct lowercased query strings
    pub unique_terms: usize,
    pub zero_result_searches: usize,
    /// zero_result_searches / total_searches, 0 when there are none
    pub zero_result_rate: f64,
    pub average_words_per_query: f64,
    pub top_searches: Vec<QueryCount>,
    pub top_zero_result_queries: Vec<ZeroResultQuery>,
    pub daily_trend: Vec<DailyCount>,
    pub peak_hours: Vec<HourCount>,
}

/// Occurrences per key, descending by count; ties keep first appearance.
fn ranked<'a, I>(keys: I, limit: usize) -> Vec<(&'a str, usize)>
where
    I: Iterator<Item = &'a str>,
{
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for k in keys {
        *counts.entry(k).or_default() += 1;
    }
    let mut list: Vec<(&str, usize)> = counts.into_iter().collect();
    list.sort_by(|a, b| b.1.cmp(&a.1));
    list.truncate(limit);
    list
}

/// Build the summary section.
///
/// `temporal` must come from the same records; it supplies the peak hours.
pub fn summarize(
    records: &[SearchRecord],
    temporal: &TemporalSummary,
    top_searches_limit: usize,
    top_zero_results_limit: usize,
) -> Result<SearchSummary> {
    let total_searches = records.len();
    let zero_result_searches = records.iter().filter(|r| r.result_count == 0).count();
    let unique_terms = records
        .iter()
        .map(|r| r.query.to_lowercase())
        .collect::<HashSet<_>>()
        .len();

    let (zero_result_rate, average_words_per_query) = if total_searches == 0 {
        (0.0, 0.0)
    } else {
        let words: usize = records.iter().map(|r| r.query.split_whitespace().count()).sum();
        (
            ensure_finite("zero result rate", zero_result_searches as f64 / total_searches as f64)?,
            ensure_finite("average words per query", words as f64 / total_searches as f64)?,
        )
    };

    let top_searches = ranked(records.iter().map(|r| r.query.as_str()), top_searches_limit)
        .into_iter()
        .map(|(q, count)| QueryCount { query: q.to_string(), count })
        .collect();

    let top_zero_result_queries = ranked(
        records.iter().filter(|r| r.result_count == 0).map(|r| r.query.as_str()),
        top_zero_results_limit,
    )
    .into_iter()
    .map(|(q, attempts)| ZeroResultQuery { query: q.to_string(), attempts })
    .collect();

    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for r in records {
        *per_day.entry(r.timestamp.date()).or_default() += 1;
    }
    let daily_trend = per_day
        .into_iter()
        .map(|(date, searches)| DailyCount { date, searches })
        .collect();

    let peak_hours = temporal
        .peak_hours(PEAK_HOURS)
        .into_iter()
        .map(|(hour, searches)| HourCount { hour, searches })
        .collect();

    Ok(SearchSummary {
        total_searches,
        unique_terms,
        zero_result_searches,
        zero_result_rate,
        average_words_per_query,
        top_searches,
        top_zero_result_queries,
        daily_trend,
        peak_hours,
    })
}
