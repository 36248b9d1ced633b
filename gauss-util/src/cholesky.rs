use anyhow::{anyhow, bail};
use nalgebra::{DMatrix, DVector};

/// A usable lower Cholesky factor is square with a strictly positive
/// diagonal and a vanishing strict upper triangle.
fn check_factor(ll: &DMatrix<f64>) -> anyhow::Result<()> {
    if !ll.is_square() {
        bail!(
            "Cholesky factor must be square, got {} x {}",
            ll.nrows(),
            ll.ncols()
        );
    }
    for j in 0..ll.ncols() {
        if ll[(j, j)] <= 0.0 {
            bail!("Cholesky factor has a non-positive diagonal entry at {}", j);
        }
        for i in 0..j {
            if ll[(i, j)] != 0.0 {
                bail!(
                    "Cholesky factor has a nonzero entry above the diagonal at ({}, {})",
                    i,
                    j
                );
            }
        }
    }
    Ok(())
}

/// Solve `A x = b` where `A = L Lᵀ` and `ll` is the lower factor `L`,
/// by a forward then a backward triangular substitution.
pub fn solve_cholesky(ll: &DMatrix<f64>, bb: &DVector<f64>) -> anyhow::Result<DVector<f64>> {
    check_factor(ll)?;
    if bb.len() != ll.nrows() {
        bail!(
            "right-hand side has length {}, factor is {} x {}",
            bb.len(),
            ll.nrows(),
            ll.ncols()
        );
    }
    let zz = ll
        .solve_lower_triangular(bb)
        .ok_or_else(|| anyhow!("forward substitution failed"))?;
    ll.transpose()
        .solve_upper_triangular(&zz)
        .ok_or_else(|| anyhow!("backward substitution failed"))
}

/// Columnwise extension of [`solve_cholesky`]: `A⁻¹ B`.
pub fn solve_cholesky_mat(ll: &DMatrix<f64>, bb: &DMatrix<f64>) -> anyhow::Result<DMatrix<f64>> {
    check_factor(ll)?;
    if bb.nrows() != ll.nrows() {
        bail!(
            "right-hand side has {} rows, factor is {} x {}",
            bb.nrows(),
            ll.nrows(),
            ll.ncols()
        );
    }
    let zz = ll
        .solve_lower_triangular(bb)
        .ok_or_else(|| anyhow!("forward substitution failed"))?;
    ll.transpose()
        .solve_upper_triangular(&zz)
        .ok_or_else(|| anyhow!("backward substitution failed"))
}

/// `trace(A⁻¹ B)` for `A = L Lᵀ`.
pub fn trace_solve_cholesky(ll: &DMatrix<f64>, bb: &DMatrix<f64>) -> anyhow::Result<f64> {
    let solved = solve_cholesky_mat(ll, bb)?;
    if !solved.is_square() {
        bail!("trace is only defined for a square right-hand side");
    }
    Ok(solved.trace())
}
