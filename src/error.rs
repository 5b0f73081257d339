//! Error types for the analysis pipeline.
//!
//! Every variant is fatal to the current run. The pipeline never retries and
//! never substitutes a default, so a caller either gets a complete report or
//! one of these errors.

use thiserror::Error;

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, InsightError>;

#[derive(Debug, Error)]
pub enum InsightError {
    /// No text to vectorize (no documents, or no document produced a term).
    #[error("empty corpus: no terms to build a vocabulary from")]
    EmptyCorpus,

    /// `transform` was called with a model that was never fit.
    #[error("vocabulary model is not fitted")]
    UnfittedModel,

    /// Fewer distinct vectors than requested clusters.
    #[error("insufficient data: {requested} clusters requested but only {distinct} distinct vectors")]
    InsufficientData { requested: usize, distinct: usize },

    /// A timestamp could not be parsed at the record boundary.
    #[error("invalid timestamp in row {row}: {value:?}")]
    InvalidTimestamp { row: usize, value: String },

    /// A raw row is missing a field or carries an ill-typed value.
    #[error("invalid record in row {row}: {reason}")]
    InvalidRecord { row: usize, reason: String },

    /// A derived statistic came out NaN or infinite.
    #[error("non-finite result while computing {what}")]
    NonFiniteResult { what: String },

    /// Two vectors produced by different fits were compared.
    #[error("vectors come from different vocabulary models ({left} vs {right})")]
    ModelMismatch { left: u64, right: u64 },

    /// The clustering backend rejected the data or failed to converge.
    #[error("clustering failed: {reason}")]
    Clustering { reason: String },

    #[error("configuration error: {reason}")]
    Config { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl InsightError {
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config { reason: reason.into() }
    }

    pub fn clustering(reason: impl Into<String>) -> Self {
        Self::Clustering { reason: reason.into() }
    }

    pub fn non_finite(what: impl Into<String>) -> Self {
        Self::NonFiniteResult { what: what.into() }
    }

    pub fn invalid_record(row: usize, reason: impl Into<String>) -> Self {
        Self::InvalidRecord { row, reason: reason.into() }
    }
}

/// Pass `value` through, or fail with [`InsightError::NonFiniteResult`].
#[inline]
pub fn ensure_finite(what: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InsightError::non_finite(what))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_rejects_nan_and_inf() {
        assert_eq!(ensure_finite("x", 1.5).unwrap(), 1.5);
        assert!(matches!(ensure_finite("avg", f64::NAN), Err(InsightError::NonFiniteResult { .. })));
        assert!(matches!(ensure_finite("avg", f64::INFINITY), Err(InsightError::NonFiniteResult { .. })));
    }

    #[test]
    fn messages_carry_context() {
        let e = InsightError::InsufficientData { requested: 4, distinct: 2 };
        assert_eq!(e.to_string(), "insufficient data: 4 clusters requested but only 2 distinct vectors");
        let e = InsightError::InvalidTimestamp { row: 3, value: "yesterday".into() };
        assert!(e.to_string().contains("row 3"));
    }
}
