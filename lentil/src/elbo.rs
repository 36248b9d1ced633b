use crate::common::*;
use crate::data::SerData;
use crate::posterior::SerPosterior;

use gauss_util::kl::{categorical_kl, unit_normal_kl};
use gauss_util::simplex::uniform_simplex;

/// Evidence lower bound of the current state, up to an additive constant.
///
/// Callers compare bounds across iterations; the absolute value is not a
/// likelihood. Monotone under Gauss-Seidel sweeps of the update rules
/// with fixed weights.
pub fn compute_elbo(data: &SerData, state: &SerPosterior, weights: &DVec, penalty: f64) -> f64 {
    assert_eq!(state.num_predictors(), data.num_predictors());
    assert_eq!(weights.len(), data.num_tissues());

    let kk = state.num_components();
    let np = data.num_predictors();
    let nn = data.num_samples() as f64;
    let dd = data.gram_diag();

    let pi = state.pi();
    let mean = state.effect_mean();
    let var = state.effect_var();

    // per-sample expected signal of each component, and the
    // cross-component energy with the self term zeroed; the self term
    // re-enters below through the exact per-component second moment
    let zz = state.expected_effects();
    let ss = &zz * data.design();
    let kzz = &ss * ss.transpose();

    let mut cross_energy = 0.0;
    for i in 0..kk {
        for j in 0..kk {
            if i != j {
                cross_energy += kzz[(i, j)];
            }
        }
    }

    let mut self_energy = 0.0;
    for k in 0..kk {
        for p in 0..np {
            let m = mean[(k, p)];
            let v = var[(k, p)];
            self_energy += pi[(k, p)] * (m * m + v) * dd[p];
        }
    }
    let energy = cross_energy + self_energy;

    let sbar = ss.row_sum().transpose();
    let mut bound = 0.0;
    for t in 0..data.num_tissues() {
        let w = weights[t];
        bound += w * data.response().row(t).transpose().dot(&sbar);
        bound -= 0.5 * w * w * energy;
        bound -= 0.5 * w * w * nn;
    }

    let prior = uniform_simplex(np);
    for k in 0..kk {
        for p in 0..np {
            bound -= pi[(k, p)] * unit_normal_kl(mean[(k, p)], var[(k, p)]);
        }
        bound -= categorical_kl(&pi.row(k).transpose(), &prior);
    }

    bound -= 2.0 * penalty * weights.iter().map(|w| w.abs()).sum::<f64>();
    bound
}
