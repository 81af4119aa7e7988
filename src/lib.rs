//! Facade crate for the CVRP engine.
//!
//! This crate re-exports the core problem-formulation and reporting types and
//! exposes the optional solver backend and filesystem store behind feature
//! flags.

#![forbid(unsafe_code)]

pub use cvrp_core::{
    Assignment, DatasetId, FirstSolutionStrategy, IndexManager, Instance, InstanceError,
    InstanceStore, Location, MemoryInstanceStore, ParseError, ParseErrorKind, ParsedRecords,
    Precision, PreparationFailure, PreparationSummary, RawDataset, RealUnits, ReportError,
    RouteReport, SolutionReport, SolveError, SolveOutcome, SolveParameters, SolveStatus, Solver,
    Stop, StoreError, build_instance, parse_records, prepare_datasets, report, solve_and_report,
};

#[cfg(feature = "store-fs")]
pub use cvrp_core::FsInstanceStore;

#[cfg(feature = "solver-vrp")]
pub use cvrp_solver_vrp::{VrpSolver, VrpSolverConfig};
