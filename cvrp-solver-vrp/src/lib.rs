//! Capacitated vehicle routing backed by `vrp-core`.
//!
//! This crate provides [`VrpSolver`], the default implementation of the
//! [`Solver`](cvrp_core::Solver) trait. Each node that must be served becomes
//! a delivery job, each fleet entry a capacitated vehicle with its own start
//! and end location, and the `vrp-core` metaheuristics search for an
//! assignment that serves every job with minimal total distance.
//!
//! An optional per-route distance bound is modelled as a shift end time with
//! durations equal to distances. Jobs the search cannot place are reported as
//! [`SolveOutcome::NoSolution`](cvrp_core::SolveOutcome::NoSolution).

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod solver;
mod vrp;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use solver::{VrpSolver, VrpSolverConfig};
