/// This crate is an offline analytics job for storefront search logs.
/// It vectorizes queries with TF-IDF, clusters them, suggests redirects for
/// queries that returned nothing, and exports a structured report.
pub mod vectorizer;
pub mod utils;
pub mod cluster;
pub mod config;
pub mod error;
pub mod recommend;
pub mod record;
pub mod report;
pub mod stats;
pub mod temporal;

/// Search Insights Pipeline
/// The top-level struct of this crate. One call to `analyze` is one run:
/// - fit a vocabulary model on the queries of the window
/// - cluster the query vectors and summarize every cluster
/// - bucket searches by hour and weekday
/// - match failed queries against successful ones in the same space
/// - derive recommendations and summary statistics
///
/// Nothing is cached between runs.
pub use report::{InsightReport, Patterns, SearchInsights};

/// Analysis Configuration
/// Every tunable of a run, with defaults. Deserializable from JSON; missing
/// keys keep their defaults.
pub use config::AnalysisConfig;

/// Error Taxonomy
/// Every error is fatal to the run that raised it.
pub use error::{InsightError, Result};

/// Search Record
/// One strongly typed search, produced at the input boundary from a loosely
/// typed row. `RecordSource` abstracts where rows come from.
pub use record::{JsonFileSource, MemorySource, RecordSource, SearchRecord, Window};

/// TF-IDF Vectorizer
/// Fits an immutable `VocabularyModel` on a corpus of queries.
///
/// Vectors carry the generation of the model that produced them and cannot be
/// compared with vectors of another fit.
pub use vectorizer::{QueryVector, TfidfVectorizer, VocabularyModel};

/// Corpus for TF-IDF Vectorizer
/// Document count plus the number of documents each term appears in.
/// Base data for IDF calculation and vocabulary selection.
pub use vectorizer::corpus::Corpus;

/// Term Frequency structure
/// Occurrence counts of the terms of one document.
pub use vectorizer::token::TermFrequency;

/// TF IDF Calculation Engine Trait
/// Plug a different weighting into `TfidfVectorizer<E>`.
/// `DefaultTFIDFEngine` uses raw tf, smoothed idf and L2-normalized rows.
pub use vectorizer::tfidf::{DefaultTFIDFEngine, TFIDFEngine};

/// Similarity Matcher
/// Cosine nearest-neighbour lookups of failed queries among successful ones.
pub use vectorizer::evaluate::scoring::{find_similar, Hits, SimilarityMatch, SimilarityMatcher, ZeroResultPrediction};

/// Cluster Engine
/// Seeded k-means over query vectors and per-cluster summaries.
pub use cluster::{ClusterAssignment, ClusterSummary, KMeans};

/// Recommendations
pub use recommend::{Priority, Recommendation, RecommendationType};
