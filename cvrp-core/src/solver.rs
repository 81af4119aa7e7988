//! The boundary to an external routing solver.
//!
//! A [`Solver`] receives an immutable [`Instance`] and [`SolveParameters`]
//! and answers with one of two terminal outcomes: an [`Assignment`] of routes
//! or an explicit "no solution". Only faults in the solver itself are
//! errors.

use std::time::Duration;

use thiserror::Error;

use crate::{Instance, ReportError, SolutionReport, report};

/// Heuristic used to build the first feasible assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum FirstSolutionStrategy {
    /// Let the solver construct a first solution and keep improving it until
    /// the time budget runs out.
    #[default]
    Automatic,
    /// Stop as soon as the construction phase has produced a solution.
    ConstructionOnly,
}

/// Knobs passed to the solver alongside an instance.
///
/// Distances are in the instance's fixed-point units.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use cvrp_core::SolveParameters;
///
/// let parameters = SolveParameters::default();
/// assert_eq!(parameters.time_limit, Duration::from_secs(60));
/// assert_eq!(parameters.capacity_slack, 0);
/// assert!(parameters.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SolveParameters {
    /// Wall-clock budget for the search.
    pub time_limit: Duration,
    /// Extra load each vehicle may carry above its capacity.
    pub capacity_slack: u64,
    /// Upper bound on the cumulative distance of any single route.
    pub max_route_distance: Option<u64>,
    /// Extra distance allowed above `max_route_distance`.
    pub distance_slack: u64,
    /// How the first assignment is constructed.
    pub first_solution_strategy: FirstSolutionStrategy,
}

impl Default for SolveParameters {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(60),
            capacity_slack: 0,
            max_route_distance: None,
            distance_slack: 0,
            first_solution_strategy: FirstSolutionStrategy::default(),
        }
    }
}

impl SolveParameters {
    /// Reject parameters no solver can honour.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError::InvalidParameters`] for a zero time budget.
    pub fn validate(&self) -> Result<(), SolveError> {
        if self.time_limit.is_zero() {
            return Err(SolveError::InvalidParameters {
                reason: "time limit must be positive".to_owned(),
            });
        }
        Ok(())
    }

    /// The effective route-distance bound including slack, if any.
    #[must_use]
    pub fn route_distance_bound(&self) -> Option<u64> {
        self.max_route_distance
            .map(|limit| limit.saturating_add(self.distance_slack))
    }
}

/// The route chosen for each vehicle, as node indices.
///
/// `None` marks an unused vehicle; a used vehicle's route runs from its start
/// node to its end node inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Assignment {
    routes: Vec<Option<Vec<usize>>>,
}

impl Assignment {
    /// Wrap per-vehicle routes.
    #[must_use]
    pub const fn new(routes: Vec<Option<Vec<usize>>>) -> Self {
        Self { routes }
    }

    /// An assignment in which no vehicle leaves its depot.
    #[must_use]
    pub fn unused(num_vehicles: usize) -> Self {
        Self::new(vec![None; num_vehicles])
    }

    /// Route per vehicle.
    #[must_use]
    pub fn routes(&self) -> &[Option<Vec<usize>>] {
        &self.routes
    }

    /// Number of vehicles covered.
    #[must_use]
    pub fn num_vehicles(&self) -> usize {
        self.routes.len()
    }

    /// Routes of used vehicles with their vehicle index.
    pub fn used(&self) -> impl Iterator<Item = (usize, &[usize])> {
        self.routes
            .iter()
            .enumerate()
            .filter_map(|(vehicle, route)| route.as_deref().map(|nodes| (vehicle, nodes)))
    }
}

/// Terminal states of a solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    /// The solver found routes satisfying every constraint.
    Solved(Assignment),
    /// The solver proved or concluded that no feasible assignment exists
    /// within its budget.
    NoSolution,
}

/// Faults raised by a solver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    /// Parameters were rejected before the solver ran.
    #[error("invalid solve parameters: {reason}")]
    InvalidParameters {
        /// Why they were rejected.
        reason: String,
    },
    /// The solver could not be invoked or failed while running.
    #[error("solver invocation failed: {message}")]
    Invocation {
        /// Description of the underlying failure.
        message: String,
    },
    /// The solver returned routes that do not describe the instance.
    #[error("solver returned an unusable assignment: {0}")]
    Report(#[from] ReportError),
}

/// Find routes for an instance.
///
/// Implementations must be `Send + Sync` and must never panic on a valid
/// instance; an infeasible instance is [`SolveOutcome::NoSolution`], not an
/// error. The call is made at most once per solve and is not retried.
pub trait Solver: Send + Sync {
    /// Solve `instance` within `parameters`.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError`] when the parameters are invalid or the solver
    /// fails.
    fn solve(
        &self,
        instance: &Instance,
        parameters: &SolveParameters,
    ) -> Result<SolveOutcome, SolveError>;
}

/// Result of [`solve_and_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveStatus {
    /// Routes were found and decoded.
    Solved(SolutionReport),
    /// No feasible assignment exists for the given parameters.
    NoSolutionFound,
}

/// Invoke `solver` once and decode its assignment.
///
/// The reporter only runs when the solver found routes.
///
/// # Errors
///
/// Propagates solver faults unchanged, and returns [`SolveError::Report`]
/// when the returned assignment does not fit the instance.
pub fn solve_and_report(
    solver: &dyn Solver,
    instance: &Instance,
    parameters: &SolveParameters,
) -> Result<SolveStatus, SolveError> {
    parameters.validate()?;
    match solver.solve(instance, parameters)? {
        SolveOutcome::Solved(assignment) => {
            let solution = report(instance, &assignment)?;
            log::info!(
                "solution uses {} of {} vehicles, total distance {}",
                solution.routes.len(),
                instance.num_vehicles(),
                solution.total_distance
            );
            Ok(SolveStatus::Solved(solution))
        }
        SolveOutcome::NoSolution => {
            log::info!("solver found no feasible assignment");
            Ok(SolveStatus::NoSolutionFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingSolver, ScriptedSolver, depot_and_two_targets};
    use rstest::rstest;

    #[rstest]
    fn no_solution_is_a_status_not_an_error() {
        let instance = depot_and_two_targets();
        let solver = ScriptedSolver::new(SolveOutcome::NoSolution);
        let status = solve_and_report(&solver, &instance, &SolveParameters::default())
            .expect("no solution is not a fault");
        assert_eq!(status, SolveStatus::NoSolutionFound);
    }

    #[rstest]
    fn solved_assignment_is_reported() {
        let instance = depot_and_two_targets();
        let solver =
            ScriptedSolver::new(SolveOutcome::Solved(Assignment::new(vec![Some(vec![0, 1, 0])])));
        let status = solve_and_report(&solver, &instance, &SolveParameters::default())
            .expect("solve should succeed");
        let SolveStatus::Solved(solution) = status else {
            panic!("expected a solved status");
        };
        assert_eq!(solution.total_distance, 20);
        assert_eq!(solution.total_load, 15);
    }

    #[rstest]
    fn solver_faults_propagate_unchanged() {
        let instance = depot_and_two_targets();
        let err = solve_and_report(&FailingSolver, &instance, &SolveParameters::default())
            .expect_err("fault should surface");
        assert!(matches!(err, SolveError::Invocation { .. }));
    }

    #[rstest]
    fn zero_time_limit_is_rejected_before_solving() {
        let instance = depot_and_two_targets();
        let solver = ScriptedSolver::new(SolveOutcome::NoSolution);
        let parameters = SolveParameters {
            time_limit: Duration::ZERO,
            ..SolveParameters::default()
        };
        let err = solve_and_report(&solver, &instance, &parameters)
            .expect_err("zero budget should fail");
        assert!(matches!(err, SolveError::InvalidParameters { .. }));
        assert_eq!(solver.calls(), 0);
    }

    #[rstest]
    fn assignment_lists_only_used_vehicles() {
        let assignment = Assignment::new(vec![None, Some(vec![1, 0, 1]), None]);
        let used: Vec<_> = assignment.used().collect();
        assert_eq!(used, vec![(1, [1, 0, 1].as_slice())]);
        assert_eq!(assignment.num_vehicles(), 3);
    }

    #[rstest]
    #[case(None, 5, None)]
    #[case(Some(100), 0, Some(100))]
    #[case(Some(100), 25, Some(125))]
    #[case(Some(u64::MAX), 1, Some(u64::MAX))]
    fn distance_bound_includes_slack(
        #[case] limit: Option<u64>,
        #[case] slack: u64,
        #[case] expected: Option<u64>,
    ) {
        let parameters = SolveParameters {
            max_route_distance: limit,
            distance_slack: slack,
            ..SolveParameters::default()
        };
        assert_eq!(parameters.route_distance_bound(), expected);
    }
}
