//! Property-based tests for the VRP solver.
//!
//! Small random fleets and target sets are solved with a short budget. Any
//! solution the solver returns must be feasible and must report cleanly,
//! including fleets whose vehicles are parked on targets.

use std::time::Duration;

use cvrp_core::{SolveOutcome, SolveParameters, Solver, report};
use cvrp_solver_vrp::test_support::{check_feasible, fleet_instance};
use cvrp_solver_vrp::{VrpSolver, VrpSolverConfig};
use proptest::prelude::*;

fn point() -> impl Strategy<Value = (i32, i32)> {
    (-50_i32..=50, -50_i32..=50)
}

fn target() -> impl Strategy<Value = (i32, i32, u64)> {
    (-50_i32..=50, -50_i32..=50, 1_u64..=20)
}

fn solver() -> VrpSolver {
    VrpSolver::with_config(VrpSolverConfig {
        max_generations: 20,
    })
}

fn parameters(capacity_slack: u64) -> SolveParameters {
    SolveParameters {
        time_limit: Duration::from_secs(2),
        capacity_slack,
        ..SolveParameters::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Any returned assignment serves every target once within capacity.
    #[test]
    fn solutions_are_feasible(
        vehicles in proptest::collection::vec(point(), 1..=3),
        targets in proptest::collection::vec(target(), 0..=6),
        slack in 0_u64..=10,
    ) {
        let instance = fleet_instance(&vehicles, &targets);
        let parameters = parameters(slack);
        let outcome = solver().solve(&instance, &parameters).expect("solve should succeed");
        if let SolveOutcome::Solved(assignment) = outcome {
            prop_assert_eq!(check_feasible(&instance, &assignment, &parameters), Ok(()));
        }
    }

    /// Reported totals agree with the per-route figures.
    #[test]
    fn reported_totals_sum_routes(
        vehicles in proptest::collection::vec(point(), 1..=2),
        targets in proptest::collection::vec(target(), 1..=5),
    ) {
        let instance = fleet_instance(&vehicles, &targets);
        let outcome = solver().solve(&instance, &parameters(0)).expect("solve should succeed");
        if let SolveOutcome::Solved(assignment) = outcome {
            let solution = report(&instance, &assignment).expect("assignment should be reportable");
            let distance: u64 = solution.routes.iter().map(|route| route.distance).sum();
            let load: u64 = solution.routes.iter().map(|route| route.load).sum();
            prop_assert_eq!(solution.total_distance, distance);
            prop_assert_eq!(solution.total_load, load);
        }
    }

    /// Vehicles parked on targets serve their depot demand exactly once, so
    /// the reported load never exceeds what the targets weigh.
    #[test]
    fn parked_fleets_report_every_unit_once(
        parked in proptest::collection::vec((point(), 0_u64..=10), 1..=3),
        targets in proptest::collection::vec(target(), 0..=4),
        slack in 0_u64..=10,
    ) {
        let vehicles: Vec<(i32, i32)> = parked.iter().map(|(at, _)| *at).collect();
        let all_targets: Vec<(i32, i32, u64)> = parked
            .iter()
            .map(|((x, y), weight)| (*x, *y, *weight))
            .chain(targets)
            .collect();
        let instance = fleet_instance(&vehicles, &all_targets);
        let parameters = parameters(slack);
        let outcome = solver().solve(&instance, &parameters).expect("solve should succeed");
        if let SolveOutcome::Solved(assignment) = outcome {
            prop_assert_eq!(check_feasible(&instance, &assignment, &parameters), Ok(()));
            let solution = report(&instance, &assignment).expect("assignment should be reportable");
            prop_assert_eq!(solution.total_load, instance.total_demand());
        }
    }

    /// A generous capacity slack always leaves room for a solution.
    #[test]
    fn ample_slack_is_always_solvable(
        vehicles in proptest::collection::vec(point(), 1..=2),
        targets in proptest::collection::vec(target(), 1..=5),
    ) {
        let instance = fleet_instance(&vehicles, &targets);
        let outcome = solver().solve(&instance, &parameters(200)).expect("solve should succeed");
        prop_assert!(matches!(outcome, SolveOutcome::Solved(_)));
    }
}
