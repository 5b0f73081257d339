use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::vectorizer::token::TermFrequency;

/// keep document count and per-term document frequency for one fit
///
/// A corpus belongs to exactly one run and is consumed by vocabulary
/// selection; nothing shares it across threads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Corpus {
    /// number of documents added
    pub doc_num: u64,
    /// term -> number of documents containing it, in first-seen order
    pub term_doc_counts: IndexMap<Box<str>, u64>,
}

impl Corpus {
    /// Create a new instance
    pub fn new() -> Self {
        Self {
            doc_num: 0,
            term_doc_counts: IndexMap::new(),
        }
    }

    /// Add a document's distinct terms to the corpus
    pub fn add_set<T>(&mut self, terms: &[T])
    where
        T: AsRef<str>,
    {
        self.doc_num += 1;
        for term in terms {
            *self.term_doc_counts.entry(term.as_ref().into()).or_insert(0) += 1;
        }
    }

    /// Add a document from its term frequency
    pub fn add_doc(&mut self, doc: &TermFrequency) {
        self.add_set(&doc.term_set_ref_str());
    }

    /// Get the number of documents in the corpus
    pub fn get_doc_num(&self) -> u64 {
        self.doc_num
    }

    /// Get the document frequency of a term
    pub fn get_term_count(&self, term: &str) -> u64 {
        self.term_doc_counts.get(term).copied().unwrap_or(0)
    }

    /// Get the current vocabulary size (number of unique terms)
    #[inline]
    pub fn vocab_size(&self) -> usize {
        self.term_doc_counts.len()
    }

    /// Pick at most `max_features` terms.
    ///
    /// Highest document frequency wins; equal frequencies are broken by
    /// lexicographic term order. The returned terms are sorted
    /// lexicographically, which fixes the dimension order of the vector space.
    pub fn select_vocabulary(&self, max_features: usize) -> Vec<Box<str>> {
        let mut ranked: Vec<(&str, u64)> = self
            .term_doc_counts
            .iter()
            .map(|(term, &count)| (term.as_ref(), count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(max_features);
        let mut vocab: Vec<Box<str>> = ranked.into_iter().map(|(term, _)| term.into()).collect();
        vocab.sort();
        vocab
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus_of(docs: &[&str]) -> Corpus {
        let mut corpus = Corpus::new();
        for d in docs {
            corpus.add_doc(&TermFrequency::from_text(d));
        }
        corpus
    }

    fn boxed(terms: &[&str]) -> Vec<Box<str>> {
        terms.iter().map(|&t| t.into()).collect()
    }

    #[test]
    fn counts_documents_not_occurrences() {
        let corpus = corpus_of(&["red red shoes", "red shirt"]);
        assert_eq!(corpus.get_doc_num(), 2);
        assert_eq!(corpus.get_term_count("red"), 2);
        assert_eq!(corpus.get_term_count("shoes"), 1);
        assert_eq!(corpus.get_term_count("laptop"), 0);
        assert_eq!(corpus.vocab_size(), 3);
    }

    #[test]
    fn vocabulary_cap_keeps_highest_document_frequency() {
        let corpus = corpus_of(&["red shoes", "red shirt", "blue shoes", "laptop"]);
        // df: red 2, shoes 2, shirt 1, blue 1, laptop 1
        let vocab = corpus.select_vocabulary(3);
        // red + shoes, then "blue" wins the df=1 tie lexicographically
        assert_eq!(vocab, boxed(&["blue", "red", "shoes"]));
    }

    #[test]
    fn vocabulary_is_sorted_when_uncapped() {
        let corpus = corpus_of(&["zebra apple", "mango"]);
        let vocab = corpus.select_vocabulary(1000);
        assert_eq!(vocab, boxed(&["apple", "mango", "zebra"]));
    }
}
