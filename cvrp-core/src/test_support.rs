//! Scripted solvers and small fixture instances used by unit and behaviour
//! tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use geo::Coord;

use crate::{
    Instance, Precision, SolveError, SolveOutcome, SolveParameters, Solver, build_instance,
};

/// `Solver` that replays a fixed outcome and counts its invocations.
#[derive(Debug)]
pub struct ScriptedSolver {
    outcome: SolveOutcome,
    calls: AtomicUsize,
}

impl ScriptedSolver {
    /// Always answer with `outcome`.
    pub const fn new(outcome: SolveOutcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of times `solve` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Solver for ScriptedSolver {
    fn solve(
        &self,
        _instance: &Instance,
        _parameters: &SolveParameters,
    ) -> Result<SolveOutcome, SolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.outcome.clone())
    }
}

/// `Solver` whose backend always fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingSolver;

impl Solver for FailingSolver {
    fn solve(
        &self,
        _instance: &Instance,
        _parameters: &SolveParameters,
    ) -> Result<SolveOutcome, SolveError> {
        Err(SolveError::Invocation {
            message: "backend unavailable".to_owned(),
        })
    }
}

/// One vehicle at `(0,0)`, which is also a target of weight 10, plus a
/// target of weight 5 at `(10,0)`. Built at unit precision.
///
/// Nodes: 0 is `(0,0)`, 1 is `(10,0)`.
pub fn depot_and_two_targets() -> Instance {
    build_instance(
        &[Coord { x: 0, y: 0 }],
        &[Coord { x: 0, y: 0 }, Coord { x: 10, y: 0 }],
        &[10, 5],
        Precision::UNIT,
    )
    .unwrap_or_else(|err| panic!("fixture instance should build: {err}"))
}

/// A single vehicle at the origin and nothing to deliver.
pub fn single_vehicle_no_targets() -> Instance {
    build_instance(&[Coord { x: 0, y: 0 }], &[], &[], Precision::UNIT)
        .unwrap_or_else(|err| panic!("fixture instance should build: {err}"))
}
