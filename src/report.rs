//! One analysis run from records to the exported report.
//!
//! ```rust
//! use chrono::NaiveDate;
//! use search_insights::{AnalysisConfig, SearchInsights, SearchRecord};
//!
//! let ts = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap().and_hms_opt(10, 0, 0).unwrap();
//! let records: Vec<SearchRecord> = [("red shoes", 4), ("blue shoes", 7), ("laptop", 0)]
//!     .into_iter()
//!     .map(|(q, n)| SearchRecord { query: q.into(), result_count: n, timestamp: ts })
//!     .collect();
//!
//! let insights = SearchInsights::new(AnalysisConfig { cluster_count: 2, ..Default::default() }).unwrap();
//! let report = insights.analyze(&records, ts).unwrap();
//! assert_eq!(report.patterns.clusters.len(), 2);
//! ```

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use chrono::NaiveDateTime;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::{
    cluster::{self, ClusterSummary, KMeans},
    config::AnalysisConfig,
    error::{InsightError, Result},
    recommend::{synthesize, Recommendation},
    record::SearchRecord,
    stats::{self, SearchSummary},
    temporal::{temporal_summary, TemporalSummary},
    vectorizer::{
        evaluate::scoring::{predict_zero_results, ZeroResultPrediction},
        tfidf::DefaultTFIDFEngine,
        TfidfVectorizer,
    },
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Patterns {
    pub clusters: Vec<ClusterSummary>,
    pub temporal_patterns: TemporalSummary,
    pub zero_results_prediction: Vec<ZeroResultPrediction>,
}

/// The complete output of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightReport {
    pub generated_at: NaiveDateTime,
    pub patterns: Patterns,
    pub summary: SearchSummary,
    pub recommendations: Vec<Recommendation>,
}

impl InsightReport {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report to `path`, replacing any existing file.
    ///
    /// The JSON goes to a temporary file next to `path` that is renamed into
    /// place, so a failed write never leaves a truncated report behind.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json_pretty()?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        info!(path = %path.display(), "report written");
        Ok(())
    }

    /// Write into `dir` under [`default_file_name`] and return the path.
    pub fn export_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(default_file_name(&self.generated_at));
        self.write_to(&path)?;
        Ok(path)
    }
}

/// `search_insights_YYYYMMDD_HHMMSS.json`
pub fn default_file_name(generated_at: &NaiveDateTime) -> String {
    format!("search_insights_{}.json", generated_at.format("%Y%m%d_%H%M%S"))
}

/// Runs the pipeline with one configuration.
///
/// Every run fits its own vocabulary model; clustering and zero-result
/// matching share that model and nothing survives the call.
#[derive(Debug, Clone)]
pub struct SearchInsights {
    config: AnalysisConfig,
}

impl SearchInsights {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn analyze(&self, records: &[SearchRecord], generated_at: NaiveDateTime) -> Result<InsightReport> {
        let cfg = &self.config;
        if records.is_empty() {
            return Err(InsightError::EmptyCorpus);
        }
        info!(records = records.len(), "analysis started");

        let queries: Vec<&str> = records.iter().map(|r| r.query.as_str()).collect();
        let (model, vectors) =
            TfidfVectorizer::<DefaultTFIDFEngine>::new(cfg.max_vocabulary_features).fit_transform(&queries)?;
        info!(vocabulary = model.dim(), "vectorized queries");

        let assignment = KMeans::new(cfg.cluster_count, cfg.random_seed)
            .with_max_iterations(cfg.max_iterations)
            .fit(&vectors)?;
        let clusters = cluster::summarize(records, &vectors, &assignment, &model)?;
        debug!(sizes = ?assignment.sizes(), "clusters summarized");

        let temporal_patterns = temporal_summary(records);

        let zero_results_prediction = predict_zero_results(
            records,
            &model,
            cfg.zero_results_sample_size,
            cfg.similarity_top_n,
            cfg.min_similarity_score,
        )?;
        info!(
            predictions = zero_results_prediction.len(),
            with_suggestions = zero_results_prediction.iter().filter(|p| !p.suggestions.is_empty()).count(),
            "zero-result queries matched"
        );

        let recommendations = synthesize(
            &clusters,
            &zero_results_prediction,
            cfg.low_results_threshold,
            cfg.top_k_predictions,
        );
        let summary = stats::summarize(
            records,
            &temporal_patterns,
            cfg.top_searches_limit,
            cfg.top_zero_results_limit,
        )?;
        info!(recommendations = recommendations.len(), "analysis finished");

        Ok(InsightReport {
            generated_at,
            patterns: Patterns {
                clusters,
                temporal_patterns,
                zero_results_prediction,
            },
            summary,
            recommendations,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 6).unwrap().and_hms_opt(10, minute, 0).unwrap()
    }

    fn records() -> Vec<SearchRecord> {
        [
            ("red shoes", 12),
            ("blue shoes", 9),
            ("running sandals for men", 0),
            ("men's running sandals", 6),
            ("laptop", 1),
            ("laptop bag", 2),
            ("xyzzy plugh quux", 0),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, (q, n))| SearchRecord { query: q.into(), result_count: n, timestamp: at(i as u32) })
        .collect()
    }

    fn insights(k: usize) -> SearchInsights {
        SearchInsights::new(AnalysisConfig { cluster_count: k, ..Default::default() }).unwrap()
    }

    #[test]
    fn file_name_carries_timestamp() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(3, 4, 5).unwrap();
        assert_eq!(default_file_name(&ts), "search_insights_20240102_030405.json");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = SearchInsights::new(AnalysisConfig { cluster_count: 0, ..Default::default() });
        assert!(matches!(err, Err(InsightError::Config { .. })));
    }

    #[test]
    fn empty_input_is_empty_corpus() {
        assert!(matches!(insights(2).analyze(&[], at(0)), Err(InsightError::EmptyCorpus)));
    }

    #[test]
    fn too_many_clusters_fails_the_run() {
        assert!(matches!(
            insights(50).analyze(&records(), at(0)),
            Err(InsightError::InsufficientData { .. })
        ));
    }

    #[test]
    fn full_run_produces_every_section() {
        let report = insights(3).analyze(&records(), at(30)).unwrap();
        assert_eq!(report.patterns.clusters.len(), 3);
        let members: usize = report.patterns.clusters.iter().map(|c| c.member_count).sum();
        assert_eq!(members, 7);
        assert_eq!(report.patterns.temporal_patterns.hourly.get(&10), Some(&7));

        let predictions = &report.patterns.zero_results_prediction;
        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].query, "running sandals for men");
        assert_eq!(predictions[0].suggestions[0].candidate_query, "men's running sandals");
        assert!(predictions[1].suggestions.is_empty());

        assert!(report
            .recommendations
            .iter()
            .any(|r| r.action == "Consider redirecting to similar search: 'men's running sandals'"));
        assert!(!report.recommendations.iter().any(|r| r.message.contains("xyzzy")));
        assert_eq!(report.summary.total_searches, 7);
        assert_eq!(report.summary.zero_result_searches, 2);
    }

    #[test]
    fn json_has_report_layout() {
        let report = insights(2).analyze(&records(), at(30)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["generated_at"], "2024-05-06T10:30:00");
        assert!(json["patterns"]["clusters"].is_array());
        assert!(json["patterns"]["temporal_patterns"]["hourly"].is_object());
        assert!(json["patterns"]["zero_results_prediction"][0]["suggestions"][0]["similarity"].is_number());
        assert!(json["recommendations"].is_array());
        assert!(json["summary"]["zero_result_rate"].is_number());
    }

    #[test]
    fn export_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let report = insights(2).analyze(&records(), at(30)).unwrap();
        let path = report.export_to_dir(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "search_insights_20240506_103000.json");
        let back: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back["summary"]["total_searches"], 7);
    }

    #[test]
    fn write_replaces_file_and_leaves_no_temporaries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        std::fs::write(&path, "stale").unwrap();

        let report = insights(2).analyze(&records(), at(30)).unwrap();
        report.write_to(&path).unwrap();

        let back: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back["summary"]["total_searches"], 7);
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn failed_write_leaves_target_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-dir").join("report.json");
        let report = insights(2).analyze(&records(), at(30)).unwrap();
        assert!(matches!(report.write_to(&missing), Err(InsightError::Io(_))));
        assert!(!missing.exists());
    }
}
