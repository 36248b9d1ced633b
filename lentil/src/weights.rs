use crate::common::*;
use anyhow::{anyhow, bail};
use log::debug;

/// Inputs of the penalized weight program.
///
/// * `basis` - sample x component; expected per-sample signal of each
///   component
/// * `effect_mean` - component; aggregate effect size scaling each basis
///   column
/// * `effect_energy` - component; strictly positive quadratic curvature
///   (the diagonal of the program's quadratic form)
/// * `penalty` - L1 coefficient, nonnegative
#[derive(Debug, Clone)]
pub struct WeightParams {
    pub basis: Mat,
    pub effect_mean: DVec,
    pub effect_energy: DVec,
    pub penalty: f64,
}

/// Termination controls for the proximal coordinate-descent solve.
#[derive(Debug, Clone)]
pub struct WeightSolverConfig {
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for WeightSolverConfig {
    fn default() -> Self {
        Self {
            max_iter: 200,
            tol: 1e-10,
        }
    }
}

/// A penalized least-squares weight program, built once and re-solved
/// whenever its parameters change.
///
/// Minimizes, over the component weight vector `w`,
///
/// `Σ_k ½ energy_k w_k² − w_k ⟨y_k, basis · effect_mean⟩ + penalty |w_k|`
///
/// optionally subject to `w ≥ 0`. The decision vector and workspace are
/// allocated at build time and reused across solves; callers overwrite
/// the parameter record with [`WeightProblem::update_parameters`] before
/// any solve whose inputs changed.
pub struct WeightProblem {
    num_samples: usize,
    num_components: usize,
    nonneg: bool,
    config: WeightSolverConfig,
    params: Option<WeightParams>,
    predicted: DVec, // basis · effect_mean, refreshed with the parameters
    weights: DVec,   // decision vector, warm-started across solves
}

impl WeightProblem {
    pub fn build(num_samples: usize, num_components: usize, nonneg: bool) -> Self {
        Self {
            num_samples,
            num_components,
            nonneg,
            config: WeightSolverConfig::default(),
            params: None,
            predicted: DVec::zeros(num_samples),
            weights: DVec::zeros(num_components),
        }
    }

    pub fn with_config(mut self, config: WeightSolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn num_components(&self) -> usize {
        self.num_components
    }

    /// Overwrite the live parameter values without rebuilding the
    /// program. Shapes and domain constraints are checked here, not at
    /// solve time.
    pub fn update_parameters(&mut self, params: WeightParams) -> anyhow::Result<()> {
        if params.basis.shape() != (self.num_samples, self.num_components) {
            bail!(
                "basis is {} x {}, expected {} x {}",
                params.basis.nrows(),
                params.basis.ncols(),
                self.num_samples,
                self.num_components
            );
        }
        if params.effect_mean.len() != self.num_components {
            bail!(
                "effect mean has {} entries, expected {}",
                params.effect_mean.len(),
                self.num_components
            );
        }
        if params.effect_energy.len() != self.num_components {
            bail!(
                "effect energy has {} entries, expected {}",
                params.effect_energy.len(),
                self.num_components
            );
        }
        if params.effect_energy.iter().any(|&e| e <= 0.0) {
            bail!("effect energy must be strictly positive");
        }
        if params.penalty < 0.0 {
            bail!("penalty must be nonnegative, got {}", params.penalty);
        }
        self.predicted = &params.basis * &params.effect_mean;
        self.params = Some(params);
        Ok(())
    }

    /// Set the response data and solve for the optimal weights.
    ///
    /// `yt` is sample x component: column k is the response the k-th
    /// weight is fit against. Errors when the program has no parameters,
    /// the shapes disagree, or the coordinate sweep fails to settle
    /// within the configured iteration budget; the caller owns the
    /// retry/abort policy.
    pub fn solve(&mut self, yt: &Mat) -> anyhow::Result<DVec> {
        let params = self
            .params
            .as_ref()
            .ok_or_else(|| anyhow!("weight program has no parameters set"))?;
        if yt.shape() != (self.num_samples, self.num_components) {
            bail!(
                "response is {} x {}, expected {} x {}",
                yt.nrows(),
                yt.ncols(),
                self.num_samples,
                self.num_components
            );
        }

        let lin = yt.tr_mul(&self.predicted);

        for iter in 0..self.config.max_iter {
            let mut delta: f64 = 0.0;
            for k in 0..self.num_components {
                let prev = self.weights[k];
                let mut w = soft_threshold(lin[k], params.penalty) / params.effect_energy[k];
                if self.nonneg && w < 0.0 {
                    w = 0.0;
                }
                self.weights[k] = w;
                delta = delta.max((w - prev).abs());
            }
            if delta <= self.config.tol {
                debug!("weight solve settled after {} sweeps", iter + 1);
                return Ok(self.weights.clone());
            }
        }
        bail!(
            "weight solve did not settle within {} sweeps",
            self.config.max_iter
        )
    }
}

fn soft_threshold(x: f64, lambda: f64) -> f64 {
    if x > lambda {
        x - lambda
    } else if x < -lambda {
        x + lambda
    } else {
        0.0
    }
}
