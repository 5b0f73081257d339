use std::{collections::HashSet, fmt::Debug};

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::{
    error::Result,
    record::SearchRecord,
    utils::sort::sort_by_score_desc,
    vectorizer::{tfidf::{DefaultTFIDFEngine, TFIDFEngine}, QueryVector, VocabularyModel},
};

/// One suggested replacement for a failed query.
///
/// Serialized as `{source_query, query, similarity}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityMatch {
    /// the failed query
    pub source_query: String,
    #[serde(rename = "query")]
    pub candidate_query: String,
    /// cosine similarity in [0, 1]
    #[serde(rename = "similarity")]
    pub similarity_score: f64,
}

/// Failed query with its ranked suggestions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZeroResultPrediction {
    pub query: String,
    pub suggestions: Vec<SimilarityMatch>,
}

/// Structure to store scoring results
pub struct Hits {
    /// (candidate index, score)
    pub list: Vec<(usize, f64)>,
}

impl Hits {
    pub fn new(list: Vec<(usize, f64)>) -> Self {
        Hits { list }
    }

    /// Keep only scores strictly above `min_score`
    pub fn retain_above(&mut self, min_score: f64) -> &mut Self {
        self.list.retain(|(_, s)| *s > min_score);
        self
    }

    /// Sort results by descending score
    /// Equal scores keep candidate order
    pub fn sort_by_score(&mut self) -> &mut Self {
        self.list.retain(|(_, s)| !s.is_nan());
        sort_by_score_desc(&mut self.list, |(_, s)| *s);
        self
    }

    pub fn truncate(&mut self, n: usize) -> &mut Self {
        self.list.truncate(n);
        self
    }
}

impl Debug for Hits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            writeln!(f, "Hits [")?;
            for (idx, score) in &self.list {
                writeln!(f, "    #{}: {:.6}", idx, score)?;
            }
            write!(f, "]")
        } else {
            f.debug_list().entries(&self.list).finish()
        }
    }
}

/// Cosine nearest-neighbour search over a fixed candidate set.
///
/// Candidates are vectorized once with the run's model; every lookup is
/// projected into that same space.
pub struct SimilarityMatcher<'a, E = DefaultTFIDFEngine>
where
    E: TFIDFEngine,
{
    model: &'a VocabularyModel<E>,
    candidates: Vec<&'a str>,
    vectors: Vec<QueryVector>,
}

impl<'a, E> SimilarityMatcher<'a, E>
where
    E: TFIDFEngine,
{
    pub fn new<S>(model: &'a VocabularyModel<E>, candidates: &'a [S]) -> Result<Self>
    where
        S: AsRef<str> + Sync,
    {
        let vectors = model.transform_many(candidates)?;
        Ok(Self {
            model,
            candidates: candidates.iter().map(|c| c.as_ref()).collect(),
            vectors,
        })
    }

    pub fn candidate_num(&self) -> usize {
        self.candidates.len()
    }

    /// Raw cosine score of every candidate, in candidate order.
    pub fn similarity(&self, query: &QueryVector) -> Result<Hits> {
        let list = self
            .vectors
            .par_iter()
            .enumerate()
            .map(|(idx, v)| query.cosine(v).map(|score| (idx, score)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Hits::new(list))
    }

    /// Best candidates for `query`.
    ///
    /// Scores at or below `min_score` are dropped before ranking, so the
    /// result may hold fewer than `top_n` entries. Ties keep candidate order.
    pub fn find_similar(&self, query: &str, top_n: usize, min_score: f64) -> Result<Vec<SimilarityMatch>> {
        if self.candidates.is_empty() {
            return Ok(Vec::new());
        }
        let query_vec = self.model.transform(query)?;
        let mut hits = self.similarity(&query_vec)?;
        hits.retain_above(min_score).sort_by_score().truncate(top_n);
        Ok(hits
            .list
            .into_iter()
            .map(|(idx, score)| SimilarityMatch {
                source_query: query.to_string(),
                candidate_query: self.candidates[idx].to_string(),
                similarity_score: score,
            })
            .collect())
    }
}

/// One-shot lookup of `query` against `successful_corpus`.
///
/// An empty corpus yields an empty result, not an error.
pub fn find_similar<S, E>(
    query: &str,
    successful_corpus: &[S],
    model: &VocabularyModel<E>,
    top_n: usize,
    min_score: f64,
) -> Result<Vec<SimilarityMatch>>
where
    S: AsRef<str> + Sync,
    E: TFIDFEngine,
{
    if successful_corpus.is_empty() {
        return Ok(Vec::new());
    }
    SimilarityMatcher::new(model, successful_corpus)?.find_similar(query, top_n, min_score)
}

/// Distinct failed and successful queries, first occurrence in timestamp
/// order (input order among equal timestamps).
pub fn split_by_outcome(records: &[SearchRecord]) -> (Vec<&str>, Vec<&str>) {
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by_key(|&i| records[i].timestamp);

    let mut seen_zero = HashSet::new();
    let mut seen_ok = HashSet::new();
    let mut zero = Vec::new();
    let mut ok = Vec::new();
    for i in order {
        let r = &records[i];
        let q = r.query.as_str();
        if r.result_count == 0 {
            if seen_zero.insert(q) {
                zero.push(q);
            }
        } else if seen_ok.insert(q) {
            ok.push(q);
        }
    }
    (zero, ok)
}

/// Suggest redirects for up to `sample_size` failed queries.
///
/// A failed query is never suggested as its own redirect, even when the same
/// string also succeeded at another time.
pub fn predict_zero_results<E>(
    records: &[SearchRecord],
    model: &VocabularyModel<E>,
    sample_size: usize,
    top_n: usize,
    min_score: f64,
) -> Result<Vec<ZeroResultPrediction>>
where
    E: TFIDFEngine,
{
    let (zero, successful) = split_by_outcome(records);
    let matcher = SimilarityMatcher::new(model, &successful)?;
    debug!(
        failed = zero.len(),
        examined = zero.len().min(sample_size),
        candidates = matcher.candidate_num(),
        "predicting zero-result redirects"
    );

    zero.into_iter()
        .take(sample_size)
        .map(|query| {
            // one extra slot in case the query itself ranks among the hits
            let mut suggestions = matcher.find_similar(query, top_n + 1, min_score)?;
            suggestions.retain(|m| m.candidate_query != query);
            suggestions.truncate(top_n);
            Ok(ZeroResultPrediction {
                query: query.to_string(),
                suggestions,
            })
        })
        .collect()
}
