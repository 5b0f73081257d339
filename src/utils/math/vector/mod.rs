use num::Float;

/// dot積
/// d(a, b) = Σ(a_i * b_i)
#[inline]
pub fn dot<N: Float>(a: &[N], b: &[N]) -> N {
    debug_assert_eq!(a.len(), b.len(), "Vectors must be of the same length to compute dot product.");
    a.iter()
        .zip(b.iter())
        .fold(N::zero(), |acc, (&x, &y)| acc + x * y)
}

/// ||a|| = sqrt(Σ(a_i^2))
#[inline]
pub fn norm<N: Float>(a: &[N]) -> N {
    dot(a, a).sqrt()
}

/// コサイン類似度
/// cos(θ) = Σ(a_i * b_i) / (||a|| * ||b||)
///
/// A zero vector has no direction; its similarity to anything is 0.
#[inline]
pub fn cosine_similarity<N: Float>(a: &[N], b: &[N]) -> N {
    let norm_a = norm(a);
    let norm_b = norm(b);
    if norm_a == N::zero() || norm_b == N::zero() {
        return N::zero();
    }
    dot(a, b) / (norm_a * norm_b)
}

/// acc += v
#[inline]
pub fn add_assign<N: Float>(acc: &mut [N], v: &[N]) {
    debug_assert_eq!(acc.len(), v.len());
    for (a, &x) in acc.iter_mut().zip(v.iter()) {
        *a = *a + x;
    }
}

/// v *= factor
#[inline]
pub fn scale<N: Float>(v: &mut [N], factor: N) {
    for x in v.iter_mut() {
        *x = *x * factor;
    }
}

/// Scale `v` to unit length. Zero vectors are left untouched.
#[inline]
pub fn l2_normalize<N: Float>(v: &mut [N]) {
    let n = norm(v);
    if n > N::zero() {
        scale(v, N::one() / n);
    }
}
