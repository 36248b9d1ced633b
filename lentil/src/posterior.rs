use crate::common::*;

/// Factorized posterior of a mixed single-effect model.
///
/// Each of the K effect components carries a categorical assignment row
/// (which of the P predictors is causal) and a conditional Gaussian
/// effect row (mean and variance given that assignment). The state is
/// allocated once and mutated row by row by the update rules.
#[derive(Debug, Clone)]
pub struct SerPosterior {
    num_components: usize,
    num_predictors: usize,
    pi: Mat,          // component x predictor, rows on the simplex
    effect_mean: Mat, // component x predictor
    effect_var: Mat,  // component x predictor, entries > 0
}

impl SerPosterior {
    /// Uniform assignments, zero means, unit variances.
    pub fn new(num_components: usize, num_predictors: usize) -> Self {
        Self {
            num_components,
            num_predictors,
            pi: Mat::from_element(num_components, num_predictors, 1.0 / num_predictors as f64),
            effect_mean: Mat::zeros(num_components, num_predictors),
            effect_var: Mat::from_element(num_components, num_predictors, 1.0),
        }
    }

    pub fn num_components(&self) -> usize {
        self.num_components
    }
    pub fn num_predictors(&self) -> usize {
        self.num_predictors
    }

    pub fn pi(&self) -> &Mat {
        &self.pi
    }
    pub fn effect_mean(&self) -> &Mat {
        &self.effect_mean
    }
    pub fn effect_var(&self) -> &Mat {
        &self.effect_var
    }

    /// `pi ⊙ mean`, the per-component expected effect of each predictor.
    pub fn expected_effects(&self) -> Mat {
        self.pi.component_mul(&self.effect_mean)
    }

    /// Freeze the current state for the other-component reads of a sweep.
    pub fn snapshot(&self) -> SerSnapshot {
        let z = self.expected_effects();
        let z_total = z.row_sum().transpose();
        SerSnapshot {
            effect_mean: self.effect_mean.clone(),
            effect_var: self.effect_var.clone(),
            z,
            z_total,
        }
    }

    pub(crate) fn set_assignment_row(&mut self, k: usize, row: &DVec) {
        self.pi.row_mut(k).copy_from(&row.transpose());
    }

    pub(crate) fn set_effect_row(&mut self, k: usize, mean: &DVec, var: &DVec) {
        self.effect_mean.row_mut(k).copy_from(&mean.transpose());
        self.effect_var.row_mut(k).copy_from(&var.transpose());
    }
}

/// Read-only copy of the posterior taken by the caller before an update.
///
/// Updates read every *other* component from here and write only their
/// own row into the live state, so whether a sweep is Jacobi (one
/// snapshot per sweep) or Gauss-Seidel (refreshed per component) is the
/// caller's explicit choice rather than an implicit call-order effect.
#[derive(Debug, Clone)]
pub struct SerSnapshot {
    pub(crate) effect_mean: Mat,
    pub(crate) effect_var: Mat,
    z: Mat,        // pi ⊙ mean
    z_total: DVec, // per-predictor sum of z over components
}

impl SerSnapshot {
    pub fn num_components(&self) -> usize {
        self.z.nrows()
    }
    pub fn num_predictors(&self) -> usize {
        self.z.ncols()
    }

    /// Expected effect of each predictor summed over every component
    /// except `k`.
    pub fn other_expected_effects(&self, k: usize) -> DVec {
        &self.z_total - self.z.row(k).transpose()
    }
}
