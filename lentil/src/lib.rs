//! Mixed single-effect regression: a sparse multi-tissue linear model in
//! which one predictor (per effect component) carries the signal, shared
//! across tissues through mixing weights or a cross-tissue covariance.
//! This crate holds the coordinate-ascent refinement rules for the
//! factorized posterior, the penalized weight program, and the evidence
//! lower bound used by the caller to monitor convergence. The outer
//! iteration schedule, data loading, and reporting belong to the caller.

pub mod common;
pub mod data;
pub mod elbo;
pub mod kernel;
pub mod posterior;
pub mod queries;
pub mod update;
pub mod weights;
