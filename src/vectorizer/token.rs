use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Split a query into terms.
///
/// Lowercases, splits on anything that is not alphanumeric or `_`, and keeps
/// terms of two or more characters. `"Men's Running-Sandals"` becomes
/// `["men", "running", "sandals"]`.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().count() >= 2)
        .map(|t| t.to_lowercase())
        .collect()
}

/// Counts how often each term appears in one document.
/// Insertion order is preserved so iteration is deterministic.
///
/// # Examples
/// ```
/// use search_insights::TermFrequency;
/// let tf = TermFrequency::from_text("red shoes red");
/// assert_eq!(tf.term_count("red"), 2);
/// assert_eq!(tf.term_sum(), 3);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TermFrequency {
    #[serde(with = "indexmap::map::serde_seq")]
    term_count: IndexMap<String, u32>,
    total_term_count: u64,
}

/// Term insertion
impl TermFrequency {
    pub fn new() -> Self {
        TermFrequency {
            term_count: IndexMap::new(),
            total_term_count: 0,
        }
    }

    /// Tokenize `text` and count its terms
    pub fn from_text(text: &str) -> Self {
        let mut tf = Self::new();
        tf.add_terms(&tokenize(text));
        tf
    }

    /// Add one occurrence of a term
    ///
    /// # Arguments
    /// * `term` - term to add
    #[inline]
    pub fn add_term(&mut self, term: &str) -> &mut Self {
        let count = self.term_count.entry(term.to_string()).or_insert(0);
        *count += 1;
        self.total_term_count += 1;
        self
    }

    /// Add several terms
    ///
    /// # Arguments
    /// * `terms` - slice of terms to add
    #[inline]
    pub fn add_terms<T>(&mut self, terms: &[T]) -> &mut Self
    where
        T: AsRef<str>,
    {
        for term in terms {
            self.add_term(term.as_ref());
        }
        self
    }
}

/// Term statistics
impl TermFrequency {
    /// Occurrences of `term`, 0 if absent
    #[inline]
    pub fn term_count(&self, term: &str) -> u32 {
        *self.term_count.get(term).unwrap_or(&0)
    }

    /// Total number of term occurrences
    #[inline]
    pub fn term_sum(&self) -> u64 {
        self.total_term_count
    }

    /// Number of distinct terms
    #[inline]
    pub fn term_num(&self) -> usize {
        self.term_count.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.term_count.is_empty()
    }

    #[inline]
    pub fn contains_term(&self, term: &str) -> bool {
        self.term_count.contains_key(term)
    }

    /// Distinct terms in first-seen order
    ///
    /// # Returns
    /// * `Vec<&str>` - term set
    #[inline]
    pub fn term_set_ref_str(&self) -> Vec<&str> {
        self.term_count.keys().map(|s| s.as_str()).collect()
    }

    /// (term, count) pairs in first-seen order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.term_count.iter().map(|(t, &c)| (t.as_str(), c))
    }
}
