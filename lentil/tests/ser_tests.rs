use approx::assert_abs_diff_eq;
use gauss_util::dmatrix_util::rnorm;
use lentil::common::*;
use lentil::data::SerData;
use lentil::elbo::compute_elbo;
use lentil::kernel::CrossTissueKernel;
use lentil::posterior::SerPosterior;
use lentil::queries::{converged, credible_set, pip};
use lentil::update::{update_assignment, update_effect, update_effect_shared};
use lentil::weights::{WeightParams, WeightProblem};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// One Gauss-Seidel sweep in the reference order: for each component,
/// refresh the snapshot, update the assignment, then the effect.
fn sweep(data: &SerData, state: &mut SerPosterior, weights: &DVec) {
    for k in 0..state.num_components() {
        let snap = state.snapshot();
        update_assignment(data, state, &snap, weights, k);
        update_effect(data, state, &snap, weights, k);
    }
}

/// Three predictors, five samples, one tissue; predictor 0 carries the
/// response exactly, the others are orthogonal noise directions.
fn perfectly_correlated_data() -> SerData {
    let x = Mat::from_row_slice(
        3,
        5,
        &[
            1.0, 1.0, 1.0, 1.0, 0.0, //
            1.0, -1.0, 1.0, -1.0, 0.0, //
            0.0, 0.0, 0.0, 0.0, 1.0,
        ],
    );
    let y = Mat::from_row_slice(1, 5, &[3.0, 3.0, 3.0, 3.0, 0.0]);
    SerData::new(x, y).expect("shapes agree")
}

#[test]
fn assignment_locks_onto_the_correlated_predictor() {
    init_logging();
    let data = perfectly_correlated_data();
    let weights = DVec::from_vec(vec![1.0]);
    let mut state = SerPosterior::new(1, 3);

    // starting from a flat prior with zero means, the first sweep fills
    // in the conditional effects; the next assignment pass locks on
    sweep(&data, &mut state, &weights);
    let snap = state.snapshot();
    update_assignment(&data, &mut state, &snap, &weights, 0);

    assert_abs_diff_eq!(state.pi()[(0, 0)], 1.0, epsilon = 1e-3);
    assert_abs_diff_eq!(state.pi()[(0, 1)], 0.0, epsilon = 1e-3);
    assert_abs_diff_eq!(state.pi()[(0, 2)], 0.0, epsilon = 1e-3);

    // conditional effect at the selected predictor: var = 1/(1 + ‖x‖²),
    // mean = var · ⟨y, x⟩
    assert_abs_diff_eq!(state.effect_var()[(0, 0)], 0.2, epsilon = 1e-12);
    assert_abs_diff_eq!(state.effect_mean()[(0, 0)], 2.4, epsilon = 1e-12);

    // the summaries agree with the near-degenerate assignment
    let probs = pip(&state);
    assert!(probs[0] > 0.999, "pip: {}", probs[0]);
    assert_eq!(credible_set(&state, 0, 0.95), vec![0]);
}

#[test]
fn assignment_rows_stay_on_the_simplex() {
    init_logging();
    let x = rnorm(12, 30);
    let y = rnorm(3, 30);
    let data = SerData::new(x, y).expect("shapes agree");
    let weights = DVec::from_vec(vec![0.5, 1.0, -0.3]);
    let mut state = SerPosterior::new(3, 12);

    for _ in 0..3 {
        sweep(&data, &mut state, &weights);
    }

    for k in 0..state.num_components() {
        let row = state.pi().row(k);
        assert!(row.iter().all(|&p| p >= 0.0));
        assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-9);
    }
    for (v, m) in state.effect_var().iter().zip(state.effect_mean().iter()) {
        assert!(*v > 0.0);
        assert!(m.is_finite());
    }
}

#[test]
fn elbo_never_decreases_across_sweeps() {
    init_logging();
    let nn = 50;
    let x = rnorm(10, nn);
    let weights = DVec::from_vec(vec![0.8, 1.2]);
    let penalty = 0.3;

    // two tissues observing the same two-predictor signal through their
    // own mixing weights, plus a little noise
    let signal = 1.5 * x.row(2) - 0.8 * x.row(7);
    let noise = rnorm(2, nn);
    let mut y = Mat::zeros(2, nn);
    for t in 0..2 {
        y.row_mut(t).copy_from(&(&signal * weights[t] + noise.row(t) * 0.1));
    }
    let data = SerData::new(x, y).expect("shapes agree");

    let mut state = SerPosterior::new(2, 10);
    let mut elbos = vec![compute_elbo(&data, &state, &weights, penalty)];
    for _ in 0..8 {
        sweep(&data, &mut state, &weights);
        elbos.push(compute_elbo(&data, &state, &weights, penalty));
    }

    for pair in elbos.windows(2) {
        assert!(
            pair[1] - pair[0] >= -1e-6,
            "bound decreased: {} -> {}",
            pair[0],
            pair[1]
        );
    }
    assert!(
        elbos.last().expect("history") > elbos.first().expect("history"),
        "no improvement over the sweeps"
    );
    assert!(!converged(&elbos[..2], 1e-12));
}

#[test]
fn unpenalized_single_component_solve_is_ordinary_least_squares() {
    init_logging();
    let basis = rnorm(20, 1);
    let target = 2.5;
    let yt = &basis * target;

    let energy = basis.column(0).norm_squared();
    let mut problem = WeightProblem::build(20, 1, false);
    problem
        .update_parameters(WeightParams {
            basis: basis.clone(),
            effect_mean: DVec::from_vec(vec![1.0]),
            effect_energy: DVec::from_vec(vec![energy]),
            penalty: 0.0,
        })
        .expect("params");

    let w = problem.solve(&yt).expect("solve");
    // closed-form OLS of y on the basis column
    let ols = basis.column(0).dot(&yt.column(0)) / energy;
    assert_abs_diff_eq!(w[0], ols, epsilon = 1e-10);
    assert_abs_diff_eq!(w[0], target, epsilon = 1e-10);
}

#[test]
fn nonnegative_mode_clamps_anticorrelated_weights() {
    init_logging();
    let basis = rnorm(15, 1);
    let yt = &basis * -1.7;

    let energy = basis.column(0).norm_squared();
    let params = WeightParams {
        basis: basis.clone(),
        effect_mean: DVec::from_vec(vec![1.0]),
        effect_energy: DVec::from_vec(vec![energy]),
        penalty: 0.0,
    };

    let mut unconstrained = WeightProblem::build(15, 1, false);
    unconstrained.update_parameters(params.clone()).expect("params");
    let w_free = unconstrained.solve(&yt).expect("solve");
    assert!(w_free[0] < 0.0);

    let mut constrained = WeightProblem::build(15, 1, true);
    constrained.update_parameters(params).expect("params");
    let w_clamped = constrained.solve(&yt).expect("solve");
    assert_eq!(w_clamped[0], 0.0);
}

#[test]
fn repeated_solves_reuse_the_program() {
    init_logging();
    let basis = rnorm(10, 2);
    let predicted = &basis * DVec::from_vec(vec![1.0, 1.0]);
    let energy = DVec::from_element(2, predicted.norm_squared());

    // parameters set once; only the response changes between solves
    let mut problem = WeightProblem::build(10, 2, false);
    problem
        .update_parameters(WeightParams {
            basis: basis.clone(),
            effect_mean: DVec::from_vec(vec![1.0, 1.0]),
            effect_energy: energy,
            penalty: 0.0,
        })
        .expect("params");

    for (c0, c1) in [(1.0, -0.5), (3.0, 0.25)] {
        let mut yt = Mat::zeros(10, 2);
        yt.column_mut(0).copy_from(&(&predicted * c0));
        yt.column_mut(1).copy_from(&(&predicted * c1));

        let w = problem.solve(&yt).expect("solve");
        assert_abs_diff_eq!(w[0], c0, epsilon = 1e-10);
        assert_abs_diff_eq!(w[1], c1, epsilon = 1e-10);
    }
}

#[test]
fn covariance_mode_matches_the_hand_computed_posterior() {
    init_logging();
    let data = perfectly_correlated_data();
    let stats = data.suff_stat();
    let weights = DVec::from_vec(vec![1.0]);

    // unit effect variance in a single tissue: marginal 2, trace term 1/2
    let kernel = CrossTissueKernel::from_covariance(Mat::from_element(1, 1, 1.0)).expect("kernel");
    assert_abs_diff_eq!(kernel.trace_term(), 0.5, epsilon = 1e-12);

    let mut state = SerPosterior::new(1, 3);
    let snap = state.snapshot();
    update_effect_shared(&stats, &mut state, &snap, &weights, &kernel, 0).expect("update");

    // var_p = 1/(1 + κ ‖x_p‖²); mean_p = var_p · σ (σ+1)⁻¹ ⟨y, x_p⟩
    let d = [4.0, 4.0, 1.0];
    let yx = [12.0, 0.0, 0.0];
    for p in 0..3 {
        let var = 1.0 / (1.0 + 0.5 * d[p]);
        assert_abs_diff_eq!(state.effect_var()[(0, p)], var, epsilon = 1e-12);
        assert_abs_diff_eq!(state.effect_mean()[(0, p)], var * 0.5 * yx[p], epsilon = 1e-12);
    }
}

#[test]
fn covariance_mode_runs_across_tissues() {
    init_logging();
    let x = rnorm(8, 25);
    let y = rnorm(3, 25);
    let data = SerData::new(x, y).expect("shapes agree");
    let stats = data.suff_stat();
    let weights = DVec::from_vec(vec![1.0, 0.7, 0.2]);

    let mut sigma = Mat::from_element(3, 3, 0.3);
    sigma.fill_diagonal(1.0);
    let kernel = CrossTissueKernel::from_covariance(sigma).expect("kernel");

    let mut state = SerPosterior::new(3, 8);
    for k in 0..3 {
        let snap = state.snapshot();
        update_effect_shared(&stats, &mut state, &snap, &weights, &kernel, k).expect("update");
    }
    for (v, m) in state.effect_var().iter().zip(state.effect_mean().iter()) {
        assert!(*v > 0.0 && *v <= 1.0);
        assert!(m.is_finite());
    }
}

#[test]
fn updates_read_other_components_only_through_the_snapshot() {
    init_logging();
    let x = rnorm(6, 20);
    let y = rnorm(2, 20);
    let data = SerData::new(x, y).expect("shapes agree");
    let weights = DVec::from_vec(vec![1.0, 0.5]);

    let mut warmed = SerPosterior::new(2, 6);
    sweep(&data, &mut warmed, &weights);

    // one shared snapshot: updating component 0 first must not leak
    // into component 1's update
    let snap = warmed.snapshot();
    let mut sequential = warmed.clone();
    update_assignment(&data, &mut sequential, &snap, &weights, 0);
    update_effect(&data, &mut sequential, &snap, &weights, 0);
    update_assignment(&data, &mut sequential, &snap, &weights, 1);
    update_effect(&data, &mut sequential, &snap, &weights, 1);

    let mut isolated = warmed.clone();
    update_assignment(&data, &mut isolated, &snap, &weights, 1);
    update_effect(&data, &mut isolated, &snap, &weights, 1);

    assert_eq!(
        sequential.pi().row(1),
        isolated.pi().row(1),
        "assignment row 1 depends on the update order"
    );
    assert_eq!(sequential.effect_mean().row(1), isolated.effect_mean().row(1));
    assert_eq!(sequential.effect_var().row(1), isolated.effect_var().row(1));
}
