use std::cmp::Ordering;

/// Stable sort by score, descending.
/// - Equal scores keep their input order
/// - Scores are compared with `total_cmp`, callers drop NaN beforehand
#[inline]
pub fn sort_by_score_desc<T, F>(items: &mut [T], score: F)
where
    F: Fn(&T) -> f64,
{
    // slice::sort_by is stable
    items.sort_by(|a, b| score(b).total_cmp(&score(a)));
}

/// Indices of the `k` largest values, descending.
/// `tie` orders indices whose values compare equal.
///
/// Complexity: O(n log n), n is small (vocabulary / distinct queries)
pub fn top_k_indices_desc<F>(values: &[f64], k: usize, tie: F) -> Vec<usize>
where
    F: Fn(usize, usize) -> Ordering,
{
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by(|&a, &b| values[b].total_cmp(&values[a]).then_with(|| tie(a, b)));
    idx.truncate(k);
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    /// tiny deterministic PRNG (xorshift32)
    struct Rng(u32);
    impl Rng {
        fn new(seed: u32) -> Self { Self(seed) }
        fn next_u32(&mut self) -> u32 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            self.0 = x;
            x
        }
    }

    #[test]
    fn sort_handles_empty_and_single() {
        let mut v: Vec<(usize, f64)> = vec![];
        sort_by_score_desc(&mut v, |x| x.1);
        assert!(v.is_empty());

        let mut v = vec![(0usize, 0.5)];
        sort_by_score_desc(&mut v, |x| x.1);
        assert_eq!(v, vec![(0, 0.5)]);
    }

    #[test]
    fn sort_is_stable_on_ties() {
        // second field = original position
        let mut rng = Rng::new(0x1234_5678);
        for &n in &[2usize, 3, 8, 33, 128, 1024] {
            let mut v: Vec<(f64, usize)> = (0..n)
                .map(|i| (((rng.next_u32() & 0x7) as f64) / 8.0, i))
                .collect();
            sort_by_score_desc(&mut v, |x| x.0);
            for w in v.windows(2) {
                assert!(w[0].0 >= w[1].0, "not descending at n={n}");
                if w[0].0 == w[1].0 {
                    assert!(w[0].1 < w[1].1, "tie order broken at n={n}");
                }
            }
        }
    }

    #[test]
    fn top_k_uses_tie_breaker() {
        let terms = ["shoes", "red", "blue", "apple"];
        let values = [0.5, 0.9, 0.5, 0.1];
        let top = top_k_indices_desc(&values, 3, |a, b| terms[a].cmp(terms[b]));
        // 0.9 first, then the two 0.5 ties in lexicographic order
        assert_eq!(top, vec![1, 2, 0]);
    }

    #[test]
    fn top_k_larger_than_input() {
        let top = top_k_indices_desc(&[1.0, 2.0], 5, |a, b| a.cmp(&b));
        assert_eq!(top, vec![1, 0]);
        assert!(top_k_indices_desc(&[], 5, |a, b| a.cmp(&b)).is_empty());
    }
}
