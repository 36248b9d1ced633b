use crate::common::*;
use anyhow::{anyhow, bail};
use gauss_util::cholesky::trace_solve_cholesky;

/// Cross-tissue effect-sharing kernel.
///
/// Holds the effect covariance `sigma` (tissue x tissue), the lower
/// Cholesky factor of the unit-noise marginal `sigma + I`, and the
/// kernel-trace term `trace((sigma + I)⁻¹ sigma)` cached at construction.
/// The trace term plays the role the squared mixing-weight energy plays
/// in the per-tissue update: the precision each predictor gains from the
/// shared signal.
pub struct CrossTissueKernel {
    sigma: Mat,
    chol: Mat,
    trace_term: f64,
}

impl CrossTissueKernel {
    /// `chol` must be the lower Cholesky factor of `sigma + I`; the
    /// factor is validated through the trace solve.
    pub fn new(sigma: Mat, chol: Mat) -> anyhow::Result<Self> {
        if !sigma.is_square() {
            bail!("covariance must be square, got {} x {}", sigma.nrows(), sigma.ncols());
        }
        if chol.shape() != sigma.shape() {
            bail!(
                "Cholesky factor is {} x {} but the covariance is {} x {}",
                chol.nrows(),
                chol.ncols(),
                sigma.nrows(),
                sigma.ncols()
            );
        }
        let trace_term = trace_solve_cholesky(&chol, &sigma)?;
        Ok(Self {
            sigma,
            chol,
            trace_term,
        })
    }

    /// Factor the unit-noise marginal internally.
    pub fn from_covariance(sigma: Mat) -> anyhow::Result<Self> {
        let tt = sigma.nrows();
        let marginal = &sigma + Mat::identity(tt, tt);
        let chol = marginal
            .cholesky()
            .ok_or_else(|| anyhow!("cross-tissue covariance is not positive semi-definite"))?
            .l();
        Self::new(sigma, chol)
    }

    pub fn num_tissues(&self) -> usize {
        self.sigma.nrows()
    }
    pub fn sigma(&self) -> &Mat {
        &self.sigma
    }
    pub fn chol(&self) -> &Mat {
        &self.chol
    }
    pub fn trace_term(&self) -> f64 {
        self.trace_term
    }
}
