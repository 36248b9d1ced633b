use crate::common::*;
use crate::data::{SerData, SerSuffStat};
use crate::kernel::CrossTissueKernel;
use crate::posterior::{SerPosterior, SerSnapshot};

use gauss_util::cholesky::solve_cholesky_mat;
use gauss_util::kl::unit_normal_kl;
use gauss_util::simplex::softmax_inplace;

/// Correlation of each predictor with the weight-collapsed residual,
/// component `k` excluded:
/// `ρ_p = Σ_t w_t ⟨y_t − w_t s₋ₖ, x_p⟩`
/// where `s₋ₖ` is the expected signal of every other component under the
/// snapshot.
fn residual_correlation(data: &SerData, snap: &SerSnapshot, weights: &DVec, k: usize) -> DVec {
    let zbar = snap.other_expected_effects(k);
    let signal = data.design().tr_mul(&zbar); // per-sample expected signal
    let residual = data.response() - weights * signal.transpose();
    let collapsed = residual.tr_mul(weights);
    data.design() * collapsed
}

fn check_dims(data: &SerData, snap: &SerSnapshot, state: &SerPosterior, weights: &DVec, k: usize) {
    assert_eq!(state.num_predictors(), data.num_predictors());
    assert_eq!(snap.num_predictors(), data.num_predictors());
    assert_eq!(snap.num_components(), state.num_components());
    assert_eq!(weights.len(), data.num_tissues());
    assert!(k < state.num_components());
}

/// Recompute the assignment row `pi[k]` over all predictors.
///
/// Each predictor is scored by the log-Bayes-factor of carrying the
/// effect: the residual correlation times the current candidate mean,
/// minus the quadratic energy of the current second moment, minus the
/// prior cost of the candidate Gaussian. The stabilized softmax turns
/// the scores into a simplex row.
pub fn update_assignment(
    data: &SerData,
    state: &mut SerPosterior,
    snap: &SerSnapshot,
    weights: &DVec,
    k: usize,
) {
    check_dims(data, snap, state, weights, k);

    let rho = residual_correlation(data, snap, weights, k);
    let w2 = weights.norm_squared();
    let dd = data.gram_diag();

    let mut scores = DVec::zeros(data.num_predictors());
    for p in 0..data.num_predictors() {
        let mean = snap.effect_mean[(k, p)];
        let var = snap.effect_var[(k, p)];
        scores[p] = mean * rho[p] - 0.5 * w2 * dd[p] * (mean * mean + var)
            - unit_normal_kl(mean, var);
    }
    softmax_inplace(&mut scores);
    state.set_assignment_row(k, &scores);
}

/// Recompute the conditional effect row `mean[k]`, `var[k]`.
///
/// Conjugate Gaussian forms: the posterior variance shrinks with the
/// precision `‖x_p‖²` contributed by the design scaled by the mixing
/// weight energy, and the mean is that variance times the residual
/// correlation. Other components enter only through the snapshot, so a
/// sweep sees their pre-sweep values unless the caller refreshes it.
pub fn update_effect(
    data: &SerData,
    state: &mut SerPosterior,
    snap: &SerSnapshot,
    weights: &DVec,
    k: usize,
) {
    check_dims(data, snap, state, weights, k);

    let rho = residual_correlation(data, snap, weights, k);
    let w2 = weights.norm_squared();
    let dd = data.gram_diag();

    let np = data.num_predictors();
    let mut mean = DVec::zeros(np);
    let mut var = DVec::zeros(np);
    for p in 0..np {
        let vv = 1.0 / (1.0 + w2 * dd[p]);
        var[p] = vv;
        mean[p] = vv * rho[p];
    }
    state.set_effect_row(k, &mean, &var);
}

/// Covariance-mode effect update: effect sharing across tissues is
/// modeled through `kernel` rather than independent per-tissue weights.
///
/// Works from summary statistics alone. Per predictor, the residual
/// correlations of all tissues are whitened through the kernel's
/// Cholesky factor and recombined with row `k` of the covariance; the
/// posterior precision uses the cached kernel-trace term in place of the
/// mixing-weight energy.
pub fn update_effect_shared(
    stats: &SerSuffStat,
    state: &mut SerPosterior,
    snap: &SerSnapshot,
    weights: &DVec,
    kernel: &CrossTissueKernel,
    k: usize,
) -> anyhow::Result<()> {
    assert_eq!(state.num_predictors(), stats.num_predictors());
    assert_eq!(snap.num_components(), state.num_components());
    assert_eq!(weights.len(), stats.num_tissues());
    assert_eq!(kernel.num_tissues(), stats.num_tissues());
    // one component per tissue in covariance mode
    assert_eq!(state.num_components(), kernel.num_tissues());
    assert!(k < state.num_components());

    let yx = stats.correlations();
    let dd = stats.gram_diag();
    let kappa = kernel.trace_term();
    let zbar = snap.other_expected_effects(k);

    let np = stats.num_predictors();
    let nt = stats.num_tissues();

    // tissue x predictor residual correlations, whitened in one solve
    let residual = Mat::from_fn(nt, np, |t, p| yx[(t, p)] - weights[t] * dd[p] * zbar[p]);
    let whitened = solve_cholesky_mat(kernel.chol(), &residual)?;
    let recombined = kernel.sigma().row(k) * &whitened;

    let mut mean = DVec::zeros(np);
    let mut var = DVec::zeros(np);
    for p in 0..np {
        let vv = 1.0 / (1.0 + kappa * dd[p]);
        var[p] = vv;
        mean[p] = vv * recombined[p];
    }
    state.set_effect_row(k, &mean, &var);
    Ok(())
}
