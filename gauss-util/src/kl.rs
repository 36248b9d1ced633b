use nalgebra::DVector;
use std::f64::consts::PI;

/// Additive stabilizer inside the categorical KL logarithms.
pub const CATEGORICAL_KL_EPS: f64 = 1e-10;

/// `KL(N(mean, var) || N(0, 1))`
///
/// Defined for `var > 0`; diverges to +inf as `var -> 0` (a degenerate
/// posterior is infinitely informative relative to the prior).
pub fn unit_normal_kl(mean: f64, var: f64) -> f64 {
    0.5 * ((mean * mean + var) - var.ln() - 1.0)
}

/// `KL(N(mean, var) || N(prior_mean, prior_var))`
pub fn normal_kl(mean: f64, var: f64, prior_mean: f64, prior_var: f64) -> f64 {
    let diff = mean - prior_mean;
    0.5 * ((diff * diff + var) / prior_var + prior_var.ln() - var.ln() - 1.0)
}

/// Differential entropy of `N(mean, var)`.
pub fn normal_entropy(var: f64) -> f64 {
    0.5 * ((2.0 * PI * var).ln() + 1.0)
}

/// `KL(q || p)` between two categorical distributions, with an explicit
/// additive stabilizer inside the logarithm. The stabilizer biases the
/// result slightly for near-degenerate distributions.
pub fn categorical_kl_stabilized(qq: &DVector<f64>, pp: &DVector<f64>, eps: f64) -> f64 {
    qq.iter()
        .zip(pp.iter())
        .map(|(&q, &p)| q * ((q + eps) / (p + eps)).ln())
        .sum()
}

/// `KL(q || p)` with the default stabilizer [`CATEGORICAL_KL_EPS`].
pub fn categorical_kl(qq: &DVector<f64>, pp: &DVector<f64>) -> f64 {
    categorical_kl_stabilized(qq, pp, CATEGORICAL_KL_EPS)
}
