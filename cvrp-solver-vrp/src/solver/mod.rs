//! `VrpSolver` implementation backed by `vrp-core`.

use std::time::Instant;

use cvrp_core::{Instance, SolveError, SolveOutcome, SolveParameters, Solver};

use crate::vrp::VrpSolveContext;

/// Configuration for [`VrpSolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VrpSolverConfig {
    /// Upper bound on `vrp-core` generations when the search is allowed to
    /// improve the first solution.
    pub max_generations: usize,
}

impl Default for VrpSolverConfig {
    fn default() -> Self {
        Self {
            max_generations: 500,
        }
    }
}

/// Native solver using `vrp-core` to search for minimum-distance routes.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use cvrp_core::{Precision, SolveOutcome, SolveParameters, Solver, build_instance};
/// use cvrp_solver_vrp::VrpSolver;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let instance = build_instance(&[Coord { x: 0, y: 0 }], &[], &[], Precision::UNIT)?;
/// let outcome = VrpSolver::default().solve(&instance, &SolveParameters::default())?;
/// assert!(matches!(outcome, SolveOutcome::Solved(_)));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct VrpSolver {
    config: VrpSolverConfig,
}

impl VrpSolver {
    /// Construct a solver using default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(VrpSolverConfig::default())
    }

    /// Construct a solver with explicit configuration.
    #[must_use]
    pub const fn with_config(config: VrpSolverConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &VrpSolverConfig {
        &self.config
    }
}

impl Solver for VrpSolver {
    fn solve(
        &self,
        instance: &Instance,
        parameters: &SolveParameters,
    ) -> Result<SolveOutcome, SolveError> {
        parameters.validate()?;
        let started_at = Instant::now();
        let outcome = VrpSolveContext::new(&self.config).solve(instance, parameters);
        log::debug!("vrp-core search finished in {:?}", started_at.elapsed());
        outcome
    }
}
