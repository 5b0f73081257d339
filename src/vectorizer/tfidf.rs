use indexmap::IndexMap;

use crate::{utils::math::vector::l2_normalize, vectorizer::{corpus::Corpus, token::TermFrequency}};

pub trait TFIDFEngine {
    /// IDF weight for each vocabulary term
    /// # Arguments
    /// * `corpus` - document frequencies of the fit corpus
    /// * `vocabulary` - selected terms, in dimension order
    /// # Returns
    /// * `Vec<f64>` - one weight per term
    fn idf_vec(corpus: &Corpus, vocabulary: &[Box<str>]) -> Vec<f64>;

    /// Dense TF-IDF vector of one document
    /// # Arguments
    /// * `freq` - term counts of the document
    /// * `vocabulary` - term -> idf, index is the dimension
    fn tfidf_vec(freq: &TermFrequency, vocabulary: &IndexMap<Box<str>, f64>) -> Vec<f64>;
}

/// Default TF-IDF engine
///
/// - tf: raw count of the term in the document
/// - idf: `ln((1 + n) / (1 + df)) + 1` (smoothed, never zero)
/// - rows are L2-normalized, so cosine similarity is a plain dot product
///
/// Terms outside the vocabulary contribute nothing. A document with no
/// vocabulary term maps to the zero vector.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTFIDFEngine;

impl DefaultTFIDFEngine {
    #[inline]
    pub fn idf_calc(doc_num: u64, doc_freq: u64) -> f64 {
        ((1.0 + doc_num as f64) / (1.0 + doc_freq as f64)).ln() + 1.0
    }
}

impl TFIDFEngine for DefaultTFIDFEngine {
    fn idf_vec(corpus: &Corpus, vocabulary: &[Box<str>]) -> Vec<f64> {
        let doc_num = corpus.get_doc_num();
        vocabulary
            .iter()
            .map(|term| Self::idf_calc(doc_num, corpus.get_term_count(term)))
            .collect()
    }

    fn tfidf_vec(freq: &TermFrequency, vocabulary: &IndexMap<Box<str>, f64>) -> Vec<f64> {
        let mut vec = vec![0.0; vocabulary.len()];
        for (term, count) in freq.iter() {
            if let Some((idx, _, idf)) = vocabulary.get_full(term) {
                vec[idx] = count as f64 * idf;
            }
        }
        l2_normalize(&mut vec);
        vec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::math::vector::norm;

    #[test]
    fn rarer_terms_weigh_more() {
        let mut corpus = Corpus::new();
        for d in ["red shoes", "red shirt", "blue shoes"] {
            corpus.add_doc(&TermFrequency::from_text(d));
        }
        let vocab: Vec<Box<str>> = vec!["blue".into(), "red".into()];
        let idf = DefaultTFIDFEngine::idf_vec(&corpus, &vocab);
        // blue df=1, red df=2
        assert!(idf[0] > idf[1]);
        assert!((idf[1] - ((4.0_f64 / 3.0).ln() + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn vectors_are_unit_length_or_zero() {
        let mut vocab = IndexMap::new();
        vocab.insert(Box::<str>::from("red"), 1.5);
        vocab.insert(Box::<str>::from("shoes"), 1.0);

        let v = DefaultTFIDFEngine::tfidf_vec(&TermFrequency::from_text("red red shoes"), &vocab);
        assert!((norm(&v) - 1.0).abs() < 1e-12);
        assert!(v[0] > v[1]);

        let z = DefaultTFIDFEngine::tfidf_vec(&TermFrequency::from_text("laptop"), &vocab);
        assert_eq!(z, vec![0.0, 0.0]);
    }
}
