pub mod corpus;
pub mod tfidf;
pub mod token;
pub mod evaluate;

use std::collections::{hash_map::DefaultHasher, HashMap};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::debug;

use crate::error::{ensure_finite, InsightError, Result};
use crate::utils::math::vector::cosine_similarity;
use crate::vectorizer::{corpus::Corpus, tfidf::{DefaultTFIDFEngine, TFIDFEngine}, token::TermFrequency};

/// Every fit gets a fresh generation number.
/// 0 is reserved for the unfitted model.
static MODEL_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Fits a [`VocabularyModel`] on a corpus of query strings.
///
/// The vectorizer itself holds only settings. Each call to [`fit_transform`]
/// returns a new, independent model together with the vectors of the corpus;
/// the model is then passed explicitly wherever text has to be projected
/// into the same space.
///
/// [`fit_transform`]: TfidfVectorizer::fit_transform
#[derive(Debug, Clone)]
pub struct TfidfVectorizer<E = DefaultTFIDFEngine>
where
    E: TFIDFEngine,
{
    /// vocabulary cap
    pub max_features: usize,
    _marker: PhantomData<fn() -> E>,
}

/// Fitted term -> dimension mapping plus idf weights.
///
/// Only valid for text comparable to the corpus it was fit on. Vectors from
/// two different models never share a space; [`QueryVector::cosine`] refuses
/// to compare them.
#[derive(Debug, Clone)]
pub struct VocabularyModel<E = DefaultTFIDFEngine>
where
    E: TFIDFEngine,
{
    /// term -> idf, index is the vector dimension
    pub vocabulary: IndexMap<Box<str>, f64>,
    /// documents seen during the fit
    pub doc_num: u64,
    generation: u64,
    _marker: PhantomData<fn() -> E>,
}

/// Dense TF-IDF vector of one query, tagged with the model that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryVector {
    values: Vec<f64>,
    generation: u64,
}

impl QueryVector {
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.values.len()
    }

    /// Generation of the model that produced this vector
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|&v| v == 0.0)
    }

    /// Cosine similarity against a vector of the same model, in `[0, 1]`.
    /// A zero vector scores 0 against everything.
    pub fn cosine(&self, other: &QueryVector) -> Result<f64> {
        if self.generation != other.generation {
            return Err(InsightError::ModelMismatch {
                left: self.generation,
                right: other.generation,
            });
        }
        let score = ensure_finite("cosine similarity", cosine_similarity(&self.values, &other.values))?;
        // weights are non-negative; rounding can still overshoot 1.0
        Ok(score.clamp(0.0, 1.0))
    }

    /// Hash of the exact bit pattern of the values.
    pub fn bit_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for v in &self.values {
            v.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Exact equality of every value's bit pattern.
    pub fn bits_eq(&self, other: &QueryVector) -> bool {
        self.values.len() == other.values.len()
            && self.values.iter().zip(&other.values).all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

/// Number of pairwise distinct vectors (exact comparison).
///
/// Keeps one hash per vector; full comparisons only run on hash collisions.
pub fn count_distinct(vectors: &[QueryVector]) -> usize {
    let mut buckets: HashMap<u64, Vec<usize>> = HashMap::new();
    let mut distinct = 0;
    for (i, v) in vectors.iter().enumerate() {
        let bucket = buckets.entry(v.bit_hash()).or_default();
        if !bucket.iter().any(|&j| vectors[j].bits_eq(v)) {
            bucket.push(i);
            distinct += 1;
        }
    }
    distinct
}

impl<E> TfidfVectorizer<E>
where
    E: TFIDFEngine,
{
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
            _marker: PhantomData,
        }
    }

    /// Fit a model on `corpus` without vectorizing it.
    ///
    /// Fails with [`InsightError::EmptyCorpus`] when the corpus is empty or
    /// no document yields a single term. A corpus with one distinct term
    /// produces a one-dimensional space.
    pub fn fit<S>(&self, corpus: &[S]) -> Result<VocabularyModel<E>>
    where
        S: AsRef<str>,
    {
        if corpus.is_empty() {
            return Err(InsightError::EmptyCorpus);
        }
        let mut counts = Corpus::new();
        for text in corpus {
            counts.add_doc(&TermFrequency::from_text(text.as_ref()));
        }
        if counts.vocab_size() == 0 {
            return Err(InsightError::EmptyCorpus);
        }

        let terms = counts.select_vocabulary(self.max_features);
        let idf = E::idf_vec(&counts, &terms);
        for (term, w) in terms.iter().zip(idf.iter()) {
            ensure_finite(&format!("idf of {term:?}"), *w)?;
        }
        let vocabulary: IndexMap<Box<str>, f64> = terms.into_iter().zip(idf).collect();

        let generation = MODEL_GENERATION.fetch_add(1, Ordering::Relaxed);
        debug!(
            generation,
            docs = counts.get_doc_num(),
            distinct_terms = counts.vocab_size(),
            vocabulary = vocabulary.len(),
            "vocabulary fitted"
        );
        Ok(VocabularyModel {
            vocabulary,
            doc_num: counts.get_doc_num(),
            generation,
            _marker: PhantomData,
        })
    }

    /// Fit a model on `corpus` and return it with one vector per document,
    /// in input order.
    pub fn fit_transform<S>(&self, corpus: &[S]) -> Result<(VocabularyModel<E>, Vec<QueryVector>)>
    where
        S: AsRef<str> + Sync,
    {
        let model = self.fit(corpus)?;
        let vectors = model.transform_many(corpus)?;
        Ok((model, vectors))
    }
}

impl<E> Default for VocabularyModel<E>
where
    E: TFIDFEngine,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> VocabularyModel<E>
where
    E: TFIDFEngine,
{
    /// An unfitted model. Every transform on it fails.
    pub fn new() -> Self {
        Self {
            vocabulary: IndexMap::new(),
            doc_num: 0,
            generation: 0,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn is_fitted(&self) -> bool {
        self.generation != 0 && self.doc_num > 0
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Vector dimensionality
    #[inline]
    pub fn dim(&self) -> usize {
        self.vocabulary.len()
    }

    /// Term of a dimension
    #[inline]
    pub fn term(&self, dim: usize) -> Option<&str> {
        self.vocabulary.get_index(dim).map(|(t, _)| t.as_ref())
    }

    /// Terms in dimension order
    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.vocabulary.keys().map(|t| t.as_ref())
    }

    /// Project one text into this model's space.
    pub fn transform(&self, text: &str) -> Result<QueryVector> {
        if !self.is_fitted() {
            return Err(InsightError::UnfittedModel);
        }
        let values = E::tfidf_vec(&TermFrequency::from_text(text), &self.vocabulary);
        if values.iter().any(|v| !v.is_finite()) {
            return Err(InsightError::non_finite(format!("tf-idf vector of {text:?}")));
        }
        Ok(QueryVector {
            values,
            generation: self.generation,
        })
    }

    /// Project many texts, preserving input order.
    pub fn transform_many<S>(&self, texts: &[S]) -> Result<Vec<QueryVector>>
    where
        S: AsRef<str> + Sync,
    {
        if !self.is_fitted() {
            return Err(InsightError::UnfittedModel);
        }
        texts
            .par_iter()
            .map(|text| self.transform(text.as_ref()))
            .collect()
    }
}
