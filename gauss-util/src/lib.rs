pub mod cholesky;
pub mod dmatrix_util;
pub mod kl;
pub mod simplex;
