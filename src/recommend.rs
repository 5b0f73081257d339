//! Turns cluster statistics and redirect suggestions into action items.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::{cluster::ClusterSummary, vectorizer::evaluate::scoring::ZeroResultPrediction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    LowResultsCluster,
    ZeroResultsSuggestion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    pub priority: Priority,
    pub message: String,
    pub action: String,
}

impl Recommendation {
    fn low_results(cluster: &ClusterSummary) -> Self {
        Self {
            kind: RecommendationType::LowResultsCluster,
            priority: Priority::High,
            message: format!(
                "Cluster with terms {} has low average results ({:.1})",
                cluster.top_terms.join(", "),
                cluster.average_result_count
            ),
            action: "Consider adding more products matching these terms".to_string(),
        }
    }

    fn redirect(query: &str, target: &str) -> Self {
        Self {
            kind: RecommendationType::ZeroResultsSuggestion,
            priority: Priority::Medium,
            message: format!("'{query}' returns no results"),
            action: format!("Consider redirecting to similar search: '{target}'"),
        }
    }
}

/// Build the ordered recommendation list.
///
/// Low-result clusters come first in cluster order, then one redirect for
/// each of the first `top_k_predictions` predictions that has a suggestion,
/// naming its best-ranked suggestion.
pub fn synthesize(
    clusters: &[ClusterSummary],
    predictions: &[ZeroResultPrediction],
    low_result_threshold: f64,
    top_k_predictions: usize,
) -> Vec<Recommendation> {
    let mut out: Vec<Recommendation> = clusters
        .iter()
        .filter(|c| c.average_result_count < low_result_threshold)
        .map(Recommendation::low_results)
        .collect();
    let low = out.len();

    out.extend(predictions.iter().take(top_k_predictions).filter_map(|p| {
        p.suggestions
            .first()
            .map(|best| Recommendation::redirect(&p.query, &best.candidate_query))
    }));
    debug!(low_results = low, redirects = out.len() - low, "recommendations built");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorizer::evaluate::scoring::SimilarityMatch;

    fn cluster(id: usize, avg: f64, terms: &[&str]) -> ClusterSummary {
        ClusterSummary {
            cluster_id: id,
            member_count: 3,
            average_result_count: avg,
            top_terms: terms.iter().map(|t| t.to_string()).collect(),
            sample_queries: vec![],
        }
    }

    fn prediction(query: &str, suggestions: &[&str]) -> ZeroResultPrediction {
        ZeroResultPrediction {
            query: query.into(),
            suggestions: suggestions
                .iter()
                .map(|s| SimilarityMatch {
                    source_query: query.into(),
                    candidate_query: s.to_string(),
                    similarity_score: 0.5,
                })
                .collect(),
        }
    }

    #[test]
    fn low_average_cluster_is_high_priority() {
        let recs = synthesize(&[cluster(0, 2.0, &["laptop", "bag"]), cluster(1, 9.0, &["shoes"])], &[], 5.0, 5);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationType::LowResultsCluster);
        assert_eq!(recs[0].priority, Priority::High);
        assert_eq!(recs[0].message, "Cluster with terms laptop, bag has low average results (2.0)");
    }

    #[test]
    fn threshold_is_strict() {
        assert!(synthesize(&[cluster(0, 5.0, &["x"])], &[], 5.0, 5).is_empty());
    }

    #[test]
    fn redirects_use_best_suggestion_and_skip_empty() {
        let predictions = vec![
            prediction("xyzzy plugh quux", &[]),
            prediction("running sandals for men", &["men's running sandals", "sandals"]),
        ];
        let recs = synthesize(&[], &predictions, 5.0, 5);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationType::ZeroResultsSuggestion);
        assert_eq!(recs[0].priority, Priority::Medium);
        assert_eq!(recs[0].message, "'running sandals for men' returns no results");
        assert_eq!(recs[0].action, "Consider redirecting to similar search: 'men's running sandals'");
    }

    #[test]
    fn only_first_k_predictions_are_considered() {
        let predictions: Vec<_> = (0..8).map(|i| prediction(&format!("miss{i}"), &["hit"])).collect();
        let recs = synthesize(&[], &predictions, 5.0, 5);
        assert_eq!(recs.len(), 5);
        assert_eq!(recs[4].message, "'miss4' returns no results");

        // a prediction without suggestions still uses up one of the k slots
        let mut predictions = predictions;
        predictions[0].suggestions.clear();
        assert_eq!(synthesize(&[], &predictions, 5.0, 5).len(), 4);
    }

    #[test]
    fn clusters_come_before_redirects() {
        let recs = synthesize(
            &[cluster(0, 1.0, &["a"]), cluster(1, 0.0, &["b"])],
            &[prediction("q", &["r"])],
            5.0,
            5,
        );
        let kinds: Vec<_> = recs.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RecommendationType::LowResultsCluster,
                RecommendationType::LowResultsCluster,
                RecommendationType::ZeroResultsSuggestion
            ]
        );
        let json = serde_json::to_value(&recs[2]).unwrap();
        assert_eq!(json["type"], "zero_results_suggestion");
        assert_eq!(json["priority"], "medium");
    }
}
