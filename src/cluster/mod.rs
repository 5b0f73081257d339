//! Partition-based clustering of query vectors.
//!
//! k-means from `linfa-clustering` with k-means++ seeding, several seeded
//! runs and the lowest-inertia run kept. For the same vectors, `k` and seed
//! the assignment is identical run to run. Cluster ids are relabeled by first
//! appearance in input order, so cluster 0 always holds the first record, but
//! an id says nothing about topic across runs with different input.

use linfa::dataset::AsTargets;
use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_clustering::KMeans as LinfaKMeans;
use ndarray::{Array2, ArrayView1};
use rand_xoshiro::{rand_core::SeedableRng, Xoshiro256Plus};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    error::{ensure_finite, InsightError, Result},
    record::SearchRecord,
    utils::{
        math::vector::{add_assign, scale},
        sort::top_k_indices_desc,
    },
    vectorizer::{count_distinct, tfidf::TFIDFEngine, QueryVector, VocabularyModel},
};

pub const TOP_TERMS: usize = 5;
pub const SAMPLE_QUERIES: usize = 5;

/// Total mapping from input position to cluster id in `[0, k)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterAssignment {
    pub labels: Vec<usize>,
    pub k: usize,
    /// sum of squared distances to the fitted centroids
    pub inertia: f64,
}

impl ClusterAssignment {
    #[inline]
    pub fn cluster_of(&self, idx: usize) -> usize {
        self.labels[idx]
    }

    /// Member count per cluster id
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k];
        for &c in &self.labels {
            sizes[c] += 1;
        }
        sizes
    }

    /// Member positions of one cluster, ascending
    pub fn members(&self, cluster_id: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == cluster_id)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Per-cluster statistics for the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    pub cluster_id: usize,
    pub member_count: usize,
    pub average_result_count: f64,
    /// up to 5 terms by mean weight, descending, ties lexicographic
    pub top_terms: Vec<String>,
    /// first member queries in input order
    pub sample_queries: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct KMeans {
    pub k: usize,
    pub seed: u64,
    /// iteration cap per run
    pub max_iterations: usize,
    /// seeded runs; the one with the lowest inertia wins
    pub n_runs: usize,
    pub tolerance: f64,
}

/// Cluster `vectors` into `k` groups with the given seed.
pub fn cluster(vectors: &[QueryVector], k: usize, seed: u64) -> Result<ClusterAssignment> {
    KMeans::new(k, seed).fit(vectors)
}

impl KMeans {
    pub fn new(k: usize, seed: u64) -> Self {
        Self {
            k,
            seed,
            max_iterations: 300,
            n_runs: 10,
            tolerance: 1e-4,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_n_runs(mut self, n_runs: usize) -> Self {
        self.n_runs = n_runs;
        self
    }

    /// Fails with [`InsightError::InsufficientData`] when there are fewer
    /// distinct vectors than clusters, so no cluster is ever empty.
    pub fn fit(&self, vectors: &[QueryVector]) -> Result<ClusterAssignment> {
        if self.k == 0 {
            return Err(InsightError::config("cluster count must be positive"));
        }
        if let Some(first) = vectors.first() {
            if let Some(other) = vectors.iter().find(|v| v.generation() != first.generation()) {
                return Err(InsightError::ModelMismatch {
                    left: first.generation(),
                    right: other.generation(),
                });
            }
        }
        let distinct = count_distinct(vectors);
        if self.k > distinct {
            return Err(InsightError::InsufficientData {
                requested: self.k,
                distinct,
            });
        }

        let dataset = DatasetBase::from(to_array(vectors));
        let model = LinfaKMeans::params_with_rng(self.k, Xoshiro256Plus::seed_from_u64(self.seed))
            .n_runs(self.n_runs.max(1))
            .max_n_iterations(self.max_iterations.max(1) as u64)
            .tolerance(self.tolerance)
            .fit(&dataset)
            .map_err(|e| InsightError::clustering(format!("k-means fit failed: {e}")))?;
        let inertia = ensure_finite("k-means inertia", model.inertia())?;

        let predictions = model.predict(&dataset);
        let mut labels: Vec<usize> = predictions.as_targets().iter().copied().collect();
        fill_empty_clusters(&mut labels, vectors, model.centroids(), self.k);
        info!(k = self.k, points = vectors.len(), distinct, inertia, "k-means finished");

        Ok(ClusterAssignment {
            labels: relabel_by_first_appearance(&labels, self.k),
            k: self.k,
            inertia,
        })
    }
}

/// One row per vector. Callers guarantee at least one vector.
fn to_array(vectors: &[QueryVector]) -> Array2<f64> {
    let dim = vectors.first().map_or(0, QueryVector::dim);
    let mut data = Array2::zeros((vectors.len(), dim));
    for (mut row, v) in data.rows_mut().into_iter().zip(vectors) {
        row.assign(&ArrayView1::from(v.values()));
    }
    data
}

fn squared_distance_to(centroids: &Array2<f64>, c: usize, x: &[f64]) -> f64 {
    let diff = &centroids.row(c) - &ArrayView1::from(x);
    diff.dot(&diff)
}

/// Give every empty cluster the point farthest from its own centroid,
/// taken from a cluster that keeps at least one member.
fn fill_empty_clusters(labels: &mut [usize], vectors: &[QueryVector], centroids: &Array2<f64>, k: usize) {
    let mut sizes = vec![0usize; k];
    for &c in labels.iter() {
        sizes[c] += 1;
    }
    for empty in 0..k {
        if sizes[empty] != 0 {
            continue;
        }
        let mut donor: Option<(usize, f64)> = None;
        for (i, v) in vectors.iter().enumerate() {
            let c = labels[i];
            if sizes[c] < 2 {
                continue;
            }
            let d = squared_distance_to(centroids, c, v.values());
            if donor.map_or(true, |(_, best)| d > best) {
                donor = Some((i, d));
            }
        }
        if let Some((i, _)) = donor {
            debug!(cluster = empty, point = i, "refilling empty cluster");
            sizes[labels[i]] -= 1;
            labels[i] = empty;
            sizes[empty] = 1;
        }
    }
}

fn relabel_by_first_appearance(labels: &[usize], k: usize) -> Vec<usize> {
    let mut mapping = vec![usize::MAX; k];
    let mut next = 0;
    for &c in labels {
        if mapping[c] == usize::MAX {
            mapping[c] = next;
            next += 1;
        }
    }
    labels.iter().map(|&c| mapping[c]).collect()
}

/// Derive one [`ClusterSummary`] per cluster id, ascending.
///
/// `records`, `vectors` and `assignment.labels` are parallel; the vectors
/// must come from `model`.
pub fn summarize<E>(
    records: &[SearchRecord],
    vectors: &[QueryVector],
    assignment: &ClusterAssignment,
    model: &VocabularyModel<E>,
) -> Result<Vec<ClusterSummary>>
where
    E: TFIDFEngine,
{
    debug_assert_eq!(records.len(), vectors.len());
    debug_assert_eq!(records.len(), assignment.labels.len());
    let dim = model.dim();

    (0..assignment.k)
        .map(|cluster_id| {
            let members = assignment.members(cluster_id);
            let member_count = members.len();
            if member_count == 0 {
                return Err(InsightError::non_finite(format!("mean of empty cluster {cluster_id}")));
            }

            let total: f64 = members.iter().map(|&i| records[i].result_count as f64).sum();
            let average_result_count = ensure_finite(
                &format!("average result count of cluster {cluster_id}"),
                total / member_count as f64,
            )?;

            let mut mean = vec![0.0; dim];
            for &i in &members {
                if vectors[i].generation() != model.generation() {
                    return Err(InsightError::ModelMismatch {
                        left: vectors[i].generation(),
                        right: model.generation(),
                    });
                }
                add_assign(&mut mean, vectors[i].values());
            }
            scale(&mut mean, 1.0 / member_count as f64);

            let top_terms = top_k_indices_desc(&mean, TOP_TERMS, |a, b| model.term(a).cmp(&model.term(b)))
                .into_iter()
                .filter(|&d| mean[d] > 0.0)
                .filter_map(|d| model.term(d).map(str::to_string))
                .collect();

            let sample_queries = members
                .iter()
                .take(SAMPLE_QUERIES)
                .map(|&i| records[i].query.clone())
                .collect();

            Ok(ClusterSummary {
                cluster_id,
                member_count,
                average_result_count,
                top_terms,
                sample_queries,
            })
        })
        .collect()
}
