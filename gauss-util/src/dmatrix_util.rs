pub use nalgebra::{DMatrix, DVector};
pub use rand::Rng;
pub use rand_distr::StandardNormal;
pub use rayon::prelude::*;

/// Sample d,n matrix from U(0,1)
pub fn runif(dd: usize, nn: usize) -> DMatrix<f64> {
    let rvec = (0..(dd * nn))
        .into_par_iter()
        .map_init(rand::rng, |rng, _| rng.random::<f64>())
        .collect();

    DMatrix::<f64>::from_vec(dd, nn, rvec)
}

/// Sample d,n matrix from N(0,1)
pub fn rnorm(dd: usize, nn: usize) -> DMatrix<f64> {
    let rvec = (0..(dd * nn))
        .into_par_iter()
        .map_init(rand::rng, |rng, _| -> f64 { rng.sample(StandardNormal) })
        .collect();

    DMatrix::<f64>::from_vec(dd, nn, rvec)
}

/// Sample a d,d symmetric positive-definite matrix, `A Aᵀ / d + jitter I`
pub fn rspd(dd: usize, jitter: f64) -> DMatrix<f64> {
    let aa = rnorm(dd, dd);
    &aa * aa.transpose() / dd as f64 + DMatrix::identity(dd, dd) * jitter
}

/// Squared Euclidean norm of each row of `xx`
pub fn row_norms_squared(xx: &DMatrix<f64>) -> DVector<f64> {
    DVector::from_iterator(xx.nrows(), xx.row_iter().map(|row| row.norm_squared()))
}
