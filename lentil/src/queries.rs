use crate::common::*;
use crate::posterior::SerPosterior;
use gauss_util::kl::CATEGORICAL_KL_EPS;

/// Posterior inclusion probability of each predictor: one minus the
/// probability that no component assigns it the effect.
pub fn pip(state: &SerPosterior) -> DVec {
    let pi = state.pi();
    DVec::from_fn(state.num_predictors(), |p, _| {
        let log_excluded: f64 = (0..state.num_components())
            .map(|k| (1.0 - pi[(k, p)] + CATEGORICAL_KL_EPS).ln())
            .sum();
        1.0 - log_excluded.exp()
    })
}

/// Smallest set of predictors whose assignment mass for component `k`
/// reaches `coverage`, most probable first.
pub fn credible_set(state: &SerPosterior, k: usize, coverage: f64) -> Vec<usize> {
    let row = state.pi().row(k);
    let mut order: Vec<usize> = (0..row.ncols()).collect();
    order.sort_by(|&a, &b| row[b].total_cmp(&row[a]));

    let mut mass = 0.0;
    let mut set = Vec::new();
    for p in order {
        set.push(p);
        mass += row[p];
        if mass >= coverage {
            break;
        }
    }
    set
}

/// Bound improvement between the last two evaluations fell below `tol`.
/// A history shorter than two entries never counts as converged.
pub fn converged(elbos: &[f64], tol: f64) -> bool {
    match elbos {
        [.., prev, last] => (last - prev).abs() < tol,
        _ => false,
    }
}
