//! Analysis configuration.
//!
//! All fields have defaults; override with struct update syntax:
//!
//! ```rust
//! use search_insights::AnalysisConfig;
//!
//! let config = AnalysisConfig {
//!     cluster_count: 4,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{InsightError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Vocabulary cap; highest document-frequency terms win.
    pub max_vocabulary_features: usize,
    /// K for the cluster engine.
    pub cluster_count: usize,
    /// Seed for centroid initialisation.
    pub random_seed: u64,
    /// Matches must score strictly above this.
    pub min_similarity_score: f64,
    /// Suggestions kept per failed query.
    pub similarity_top_n: usize,
    /// Clusters averaging fewer results than this are flagged.
    pub low_results_threshold: f64,
    /// Distinct zero-result queries examined per run.
    pub zero_results_sample_size: usize,
    /// Trailing window applied by the record source.
    pub window_days: u32,
    /// Lloyd iteration cap.
    pub max_iterations: usize,
    /// Zero-result predictions turned into redirect recommendations.
    pub top_k_predictions: usize,
    pub top_searches_limit: usize,
    pub top_zero_results_limit: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_vocabulary_features: 1000,
            cluster_count: 10,
            random_seed: 42,
            min_similarity_score: 0.3,
            similarity_top_n: 3,
            low_results_threshold: 5.0,
            zero_results_sample_size: 20,
            window_days: 30,
            max_iterations: 300,
            top_k_predictions: 5,
            top_searches_limit: 10,
            top_zero_results_limit: 50,
        }
    }
}

impl AnalysisConfig {
    /// Load a JSON config file. Missing keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cluster_count == 0 {
            return Err(InsightError::config("cluster_count must be positive"));
        }
        if self.max_vocabulary_features == 0 {
            return Err(InsightError::config("max_vocabulary_features must be positive"));
        }
        if self.similarity_top_n == 0 {
            return Err(InsightError::config("similarity_top_n must be positive"));
        }
        if self.max_iterations == 0 {
            return Err(InsightError::config("max_iterations must be positive"));
        }
        if !(0.0..1.0).contains(&self.min_similarity_score) {
            return Err(InsightError::config(format!(
                "min_similarity_score must be in [0, 1), got {}",
                self.min_similarity_score
            )));
        }
        if !self.low_results_threshold.is_finite() || self.low_results_threshold < 0.0 {
            return Err(InsightError::config(format!(
                "low_results_threshold must be a non-negative number, got {}",
                self.low_results_threshold
            )));
        }
        Ok(())
    }
}
