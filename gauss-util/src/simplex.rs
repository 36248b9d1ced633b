use nalgebra::DVector;

/// Shift target for the stabilized softmax: scores are translated so the
/// largest exponent equals this value, keeping every `exp` finite.
pub const SOFTMAX_SHIFT_TARGET: f64 = 10.0;

/// Overwrite `scores` with its softmax distribution. The maximum is
/// subtracted before exponentiation, so arbitrarily large scores are safe.
/// The result is nonnegative and sums to one.
pub fn softmax_inplace(scores: &mut DVector<f64>) {
    let shift = scores.max() - SOFTMAX_SHIFT_TARGET;
    scores.apply(|s| *s = (*s - shift).exp());
    let total = scores.sum();
    *scores /= total;
}

/// `log(sum(exp(scores)))` with max-subtraction.
pub fn log_sum_exp(scores: &DVector<f64>) -> f64 {
    let max = scores.max();
    max + scores.iter().map(|&s| (s - max).exp()).sum::<f64>().ln()
}

/// The uniform distribution over `n` categories.
pub fn uniform_simplex(n: usize) -> DVector<f64> {
    DVector::from_element(n, 1.0 / n as f64)
}
