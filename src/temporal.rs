//! Hour-of-day and day-of-week demand buckets.

use std::collections::BTreeMap;

use chrono::{Datelike, Timelike};
use serde::Serialize;

use crate::record::SearchRecord;

/// Record counts per bucket. Only buckets that occur are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemporalSummary {
    /// hour 0-23 -> count
    pub hourly: BTreeMap<u32, usize>,
    /// weekday 0-6 (Monday = 0) -> count
    pub daily: BTreeMap<u32, usize>,
}

impl TemporalSummary {
    pub fn total(&self) -> usize {
        self.hourly.values().sum()
    }

    /// Busiest hours, descending by count; ties go to the earlier hour.
    pub fn peak_hours(&self, limit: usize) -> Vec<(u32, usize)> {
        let mut hours: Vec<(u32, usize)> = self.hourly.iter().map(|(&h, &c)| (h, c)).collect();
        // BTreeMap order is ascending by hour, sort_by is stable
        hours.sort_by(|a, b| b.1.cmp(&a.1));
        hours.truncate(limit);
        hours
    }
}

/// Bucket `records` by hour and weekday.
///
/// Timestamps are already validated when the record is built, so this cannot
/// fail.
pub fn temporal_summary(records: &[SearchRecord]) -> TemporalSummary {
    let mut summary = TemporalSummary::default();
    for r in records {
        *summary.hourly.entry(r.timestamp.hour()).or_default() += 1;
        *summary
            .daily
            .entry(r.timestamp.weekday().num_days_from_monday())
            .or_default() += 1;
    }
    summary
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(day: u32, hour: u32) -> SearchRecord {
        SearchRecord {
            query: "q".into(),
            result_count: 1,
            // 2024-05-06 is a Monday
            timestamp: NaiveDate::from_ymd_opt(2024, 5, day).unwrap().and_hms_opt(hour, 15, 0).unwrap(),
        }
    }

    #[test]
    fn buckets_by_hour_and_weekday() {
        let records = vec![at(6, 9), at(6, 9), at(7, 23), at(12, 0)];
        let s = temporal_summary(&records);
        assert_eq!(s.hourly, BTreeMap::from([(0, 1), (9, 2), (23, 1)]));
        assert_eq!(s.daily, BTreeMap::from([(0, 2), (1, 1), (6, 1)]));
        assert_eq!(s.total(), 4);
    }

    #[test]
    fn empty_input_gives_empty_buckets() {
        let s = temporal_summary(&[]);
        assert!(s.hourly.is_empty());
        assert!(s.daily.is_empty());
    }

    #[test]
    fn peak_hours_prefer_earlier_hour_on_ties() {
        let records = vec![at(6, 14), at(6, 3), at(6, 14), at(6, 3), at(6, 20)];
        let s = temporal_summary(&records);
        assert_eq!(s.peak_hours(2), vec![(3, 2), (14, 2)]);
    }

    #[test]
    fn serializes_keys_as_strings() {
        let s = temporal_summary(&[at(6, 9)]);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["hourly"]["9"], 1);
        assert_eq!(json["daily"]["0"], 1);
    }
}
