//! Core domain types for the CVRP engine.
//!
//! Raw dataset text is parsed into [`RawDataset`] records, each of which is
//! built into an immutable [`Instance`]: a fixed-point distance matrix,
//! per-node demands, uniform vehicle capacities and per-vehicle depots. A
//! [`Solver`] turns an instance into an [`Assignment`], and [`report`]
//! decodes that assignment into per-route stops, distances and loads.
//!
//! Constructors validate their input and return `Result` so malformed data
//! is rejected before it reaches a solver.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod index_manager;
mod instance;
mod location;
mod parser;
mod pipeline;
mod report;
mod solver;
mod store;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use index_manager::{IndexManager, SolverIndex};
pub use instance::{Instance, InstanceError, build_instance};
pub use location::{DatasetId, Location, Precision};
pub use parser::{Field, ParseError, ParseErrorKind, ParsedRecords, RawDataset, parse_records};
pub use pipeline::{PreparationFailure, PreparationSummary, prepare_datasets};
pub use report::{
    RealUnits, ReportError, RouteReport, SolutionDisplay, SolutionReport, Stop, report,
};
pub use solver::{
    Assignment, FirstSolutionStrategy, SolveError, SolveOutcome, SolveParameters, SolveStatus,
    Solver, solve_and_report,
};
#[cfg(feature = "store-fs")]
pub use store::FsInstanceStore;
pub use store::{InstanceStore, MemoryInstanceStore, StoreError};
