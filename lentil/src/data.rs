use crate::common::*;
use anyhow::bail;
use gauss_util::dmatrix_util::row_norms_squared;

/// Immutable regression inputs shared by every update call.
///
/// * design `x` is predictor x sample
/// * response `y` is tissue x sample
///
/// The Gram diagonal `‖x_p‖²` is precomputed once here and reused by the
/// updates and the bound.
pub struct SerData {
    x: Mat,
    y: Mat,
    gram_diag: DVec,
}

impl SerData {
    pub fn new(x: Mat, y: Mat) -> anyhow::Result<Self> {
        if x.ncols() != y.ncols() {
            bail!(
                "design has {} samples but response has {}",
                x.ncols(),
                y.ncols()
            );
        }
        let gram_diag = row_norms_squared(&x);
        Ok(Self { x, y, gram_diag })
    }

    pub fn num_predictors(&self) -> usize {
        self.x.nrows()
    }
    pub fn num_samples(&self) -> usize {
        self.x.ncols()
    }
    pub fn num_tissues(&self) -> usize {
        self.y.nrows()
    }

    pub fn design(&self) -> &Mat {
        &self.x
    }
    pub fn response(&self) -> &Mat {
        &self.y
    }
    pub fn gram_diag(&self) -> &DVec {
        &self.gram_diag
    }

    /// Collapse to the summary statistics consumed by the updates that
    /// never touch the raw design: `y xᵀ` and the Gram diagonal.
    pub fn suff_stat(&self) -> SerSuffStat {
        SerSuffStat {
            yx: &self.y * self.x.transpose(),
            gram_diag: self.gram_diag.clone(),
        }
    }
}

/// Summary-statistic view of the data: response-design correlations
/// (tissue x predictor) with the design Gram diagonal.
pub struct SerSuffStat {
    yx: Mat,
    gram_diag: DVec,
}

impl SerSuffStat {
    pub fn new(yx: Mat, gram_diag: DVec) -> anyhow::Result<Self> {
        if yx.ncols() != gram_diag.len() {
            bail!(
                "correlations cover {} predictors but the Gram diagonal has {}",
                yx.ncols(),
                gram_diag.len()
            );
        }
        Ok(Self { yx, gram_diag })
    }

    pub fn num_predictors(&self) -> usize {
        self.yx.ncols()
    }
    pub fn num_tissues(&self) -> usize {
        self.yx.nrows()
    }

    pub fn correlations(&self) -> &Mat {
        &self.yx
    }
    pub fn gram_diag(&self) -> &DVec {
        &self.gram_diag
    }
}
