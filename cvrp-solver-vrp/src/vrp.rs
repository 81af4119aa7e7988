//! `vrp-core` modelling helpers for `VrpSolver`.
//!
//! This module converts an [`Instance`] into a `vrp-core` problem over the
//! solver indices of an [`IndexManager`], runs the search, and translates the
//! resulting tours back into per-vehicle node routes.
//!
//! A vehicle parked on a target collects that demand at its start index. The
//! `vrp-core` model has no pickup at a vehicle's start, so the depot demand
//! is taken off the vehicle's capacity instead, and the vehicle is always
//! reported as used.

use std::sync::Arc;
use std::time::Duration;

use cvrp_core::{
    Assignment, FirstSolutionStrategy, IndexManager, Instance, SolveError, SolveOutcome,
    SolveParameters,
};
use vrp_core::models::common::{Location, Profile};
use vrp_core::models::problem::TravelTime;
use vrp_core::models::solution::Route as VrpRoute;
use vrp_core::prelude::*;

use crate::solver::VrpSolverConfig;

/// Arc costs between solver indices, looked up through the index manager.
///
/// Durations equal distances so a time-constrained run bounds route length.
struct IndexedTransportCost {
    distances: Vec<Vec<f64>>,
}

impl IndexedTransportCost {
    #[expect(
        clippy::cast_precision_loss,
        reason = "vrp-core works in f64; fixed-point distances stay well below 2^53"
    )]
    fn new(instance: &Instance, manager: &IndexManager) -> Self {
        let size = manager.num_indices();
        let distances = (0..size)
            .map(|from| {
                (0..size)
                    .map(|to| manager.arc_cost(instance, from, to).unwrap_or_default() as f64)
                    .collect()
            })
            .collect();
        Self { distances }
    }

    fn lookup(&self, from: Location, to: Location) -> f64 {
        let result = self.distances.get(from).and_then(|row| row.get(to)).copied();
        debug_assert!(result.is_some(), "Matrix lookup failed: from={from}, to={to}");
        result.unwrap_or(0.0)
    }
}

impl TransportCost for IndexedTransportCost {
    fn distance(&self, _route: &VrpRoute, from: Location, to: Location, _departure: TravelTime) -> Cost {
        self.lookup(from, to)
    }

    fn duration(&self, _route: &VrpRoute, from: Location, to: Location, _departure: TravelTime) -> f64 {
        self.lookup(from, to)
    }

    fn distance_approx(&self, _profile: &Profile, from: Location, to: Location) -> f64 {
        self.lookup(from, to)
    }

    fn duration_approx(&self, _profile: &Profile, from: Location, to: Location) -> f64 {
        self.lookup(from, to)
    }
}

/// Forward `vrp-core` progress messages to the `log` facade.
///
/// Both the problem builder and the search environment print to stdout
/// unless given a logger.
fn debug_logger() -> InfoLogger {
    Arc::new(|message: &str| log::debug!(target: "vrp_core", "{message}"))
}

fn define_goal(transport: Arc<dyn TransportCost>, time_constrained: bool) -> GenericResult<GoalContext> {
    let minimize_unassigned = MinimizeUnassignedBuilder::new("min-unassigned").build()?;
    let capacity_feature = CapacityFeatureBuilder::<SingleDimLoad>::new("capacity").build()?;
    let transport_feature = TransportFeatureBuilder::new("min-distance")
        .set_transport_cost(transport)
        .set_time_constrained(time_constrained)
        .build_minimize_distance()?;

    GoalContextBuilder::with_features(&[minimize_unassigned, transport_feature, capacity_feature])?
        .build()
}

/// Convert a load figure to `vrp-core`'s signed load type.
fn load(value: u64) -> Result<i32, SolveError> {
    i32::try_from(value).map_err(|_| SolveError::InvalidParameters {
        reason: format!("load {value} exceeds the solver's range"),
    })
}

struct ProblemSpec<'a> {
    instance: &'a Instance,
    manager: &'a IndexManager,
    parameters: &'a SolveParameters,
    transport: Arc<dyn TransportCost>,
    goal: GoalContext,
    logger: InfoLogger,
}

#[expect(
    clippy::cast_precision_loss,
    reason = "route distance bounds are fixed-point integers well below 2^53"
)]
fn shift_end(parameters: &SolveParameters) -> Option<f64> {
    parameters.route_distance_bound().map(|bound| bound as f64)
}

fn define_problem(spec: ProblemSpec<'_>) -> Result<Problem, SolveError> {
    let ProblemSpec {
        instance,
        manager,
        parameters,
        transport,
        goal,
        logger,
    } = spec;

    let jobs = manager
        .visits()
        .map(|(index, node)| {
            let demand = load(manager.demand(instance, index).unwrap_or_default())?;
            SingleBuilder::default()
                .id(format!("node{node}").as_str())
                .demand(Demand::delivery(demand))
                .location(index)
                .and_then(SingleBuilder::build_as_job)
                .map_err(invocation)
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Without a distance bound the shift is open-ended and time is not
    // constrained anyway.
    let end_time = shift_end(parameters).unwrap_or(f64::MAX);
    let vehicles = (0..manager.num_vehicles())
        .map(|vehicle| {
            let capacity =
                remaining_capacity(instance, manager, parameters, vehicle).unwrap_or_default();
            let (Some(start), Some(end)) = (manager.start(vehicle), manager.end(vehicle)) else {
                return Err(invocation(format!("vehicle {vehicle} has no solver indices")));
            };
            let detail = VehicleDetailBuilder::default()
                .set_start_location(start)
                .set_start_time(0.0)
                .set_end_location(end)
                .set_end_time(end_time)
                .build()
                .map_err(invocation)?;
            VehicleBuilder::default()
                .id(format!("vehicle{vehicle}").as_str())
                .add_detail(detail)
                .capacity(SingleDimLoad::new(load(capacity)?))
                .build()
                .map_err(invocation)
        })
        .collect::<Result<Vec<_>, _>>()?;

    ProblemBuilder::default()
        .add_jobs(jobs.into_iter())
        .add_vehicles(vehicles.into_iter())
        .with_goal(goal)
        .with_transport_cost(transport)
        .with_logger(logger)
        .build()
        .map_err(invocation)
}

/// Capacity left for visit jobs once `vehicle` has loaded its depot demand,
/// or `None` when the depot demand alone exceeds capacity plus slack.
fn remaining_capacity(
    instance: &Instance,
    manager: &IndexManager,
    parameters: &SolveParameters,
    vehicle: usize,
) -> Option<u64> {
    instance
        .vehicle_capacities()
        .get(vehicle)?
        .saturating_add(parameters.capacity_slack)
        .checked_sub(manager.depot_demand(instance, vehicle)?)
}

fn invocation(err: impl ToString) -> SolveError {
    SolveError::Invocation {
        message: err.to_string(),
    }
}

/// Whole seconds for the `vrp-core` time budget, never less than one.
fn budget_seconds(limit: Duration) -> usize {
    let rounded_up = limit.as_secs().saturating_add(u64::from(limit.subsec_nanos() > 0));
    usize::try_from(rounded_up.max(1)).unwrap_or(usize::MAX)
}

/// Context for running a `vrp-core` solve with shared inputs.
pub(super) struct VrpSolveContext<'a> {
    config: &'a VrpSolverConfig,
    logger: InfoLogger,
}

impl<'a> VrpSolveContext<'a> {
    /// Create a new solve context that logs `vrp-core` progress at debug
    /// level.
    pub(super) fn new(config: &'a VrpSolverConfig) -> Self {
        Self::with_logger(config, debug_logger())
    }

    /// Create a solve context sending `vrp-core` progress to `logger`.
    pub(super) fn with_logger(config: &'a VrpSolverConfig, logger: InfoLogger) -> Self {
        Self { config, logger }
    }

    const fn max_generations(&self, strategy: FirstSolutionStrategy) -> usize {
        match strategy {
            FirstSolutionStrategy::Automatic => self.config.max_generations,
            FirstSolutionStrategy::ConstructionOnly => 1,
        }
    }

    /// Solve `instance` under `parameters`.
    pub(super) fn solve(
        &self,
        instance: &Instance,
        parameters: &SolveParameters,
    ) -> Result<SolveOutcome, SolveError> {
        let manager = IndexManager::new(instance);
        if let Some(vehicle) = (0..manager.num_vehicles())
            .find(|vehicle| remaining_capacity(instance, &manager, parameters, *vehicle).is_none())
        {
            log::warn!("vehicle {vehicle} cannot carry the demand at its own depot");
            return Ok(SolveOutcome::NoSolution);
        }
        if manager.num_visits() == 0 {
            log::debug!("no nodes to visit; vehicles stay at their depots");
            return decode_tours(instance, &manager, &[]).map(SolveOutcome::Solved);
        }

        let transport: Arc<dyn TransportCost> = Arc::new(IndexedTransportCost::new(instance, &manager));
        let time_constrained = parameters.max_route_distance.is_some();
        let goal = define_goal(transport.clone(), time_constrained).map_err(invocation)?;
        let problem = Arc::new(define_problem(ProblemSpec {
            instance,
            manager: &manager,
            parameters,
            transport,
            goal,
            logger: self.logger.clone(),
        })?);

        let generations = self.max_generations(parameters.first_solution_strategy);
        let seconds = budget_seconds(parameters.time_limit);
        log::debug!(
            "solving {} jobs with {} vehicles: {generations} generations, {seconds}s budget",
            manager.num_visits(),
            manager.num_vehicles()
        );
        let environment = Arc::new(Environment {
            logger: self.logger.clone(),
            ..Environment::default()
        });
        let vrp_config = VrpConfigBuilder::new(problem.clone())
            .set_environment(environment)
            .prebuild()
            .map_err(invocation)?
            .with_max_generations(Some(generations))
            .with_max_time(Some(seconds))
            .build()
            .map_err(invocation)?;

        let solution = vrp_core::solver::Solver::new(problem, vrp_config)
            .solve()
            .map_err(invocation)?;

        if !solution.unassigned.is_empty() {
            log::warn!(
                "{} of {} jobs could not be assigned",
                solution.unassigned.len(),
                manager.num_visits()
            );
            return Ok(SolveOutcome::NoSolution);
        }

        let tours = solution
            .get_locations()
            .map(|tour| tour.collect::<Vec<_>>())
            .collect::<Vec<_>>();
        decode_tours(instance, &manager, &tours).map(SolveOutcome::Solved)
    }
}

/// Translate `vrp-core` tours over solver indices into node routes.
///
/// Each tour begins at its vehicle's unique start index, which identifies the
/// vehicle. A vehicle without a tour whose depot carries demand still serves
/// that depot, so it gets the route from its start straight to its end.
fn decode_tours(
    instance: &Instance,
    manager: &IndexManager,
    tours: &[Vec<Location>],
) -> Result<Assignment, SolveError> {
    let mut routes: Vec<Option<Vec<usize>>> = (0..manager.num_vehicles())
        .map(|vehicle| {
            let parked = manager.depot_demand(instance, vehicle).is_some_and(|demand| demand > 0);
            let start = instance.starts().get(vehicle).copied();
            let end = instance.ends().get(vehicle).copied();
            start.zip(end).filter(|_| parked).map(|(start, end)| vec![start, end])
        })
        .collect();
    for tour in tours {
        let vehicle = tour
            .first()
            .and_then(|start| manager.vehicle_for_start(*start))
            .ok_or_else(|| invocation("tour does not begin at a vehicle start"))?;
        let nodes = tour
            .iter()
            .map(|index| manager.index_to_node(*index))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| invocation("tour visits an unknown location"))?;
        if let Some(slot) = routes.get_mut(vehicle) {
            *slot = Some(nodes);
        }
    }
    Ok(Assignment::new(routes))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::test_support::{depot_with_targets, fleet_instance};
    use rstest::rstest;

    #[rstest]
    #[case(Duration::from_secs(60), 60)]
    #[case(Duration::from_millis(1_500), 2)]
    #[case(Duration::from_millis(10), 1)]
    #[case(Duration::ZERO, 1)]
    fn budget_rounds_up_to_whole_seconds(#[case] limit: Duration, #[case] expected: usize) {
        assert_eq!(budget_seconds(limit), expected);
    }

    #[rstest]
    fn transport_cost_follows_the_index_manager() {
        let instance = depot_with_targets(&[(3, 4, 1), (6, 8, 1)]);
        let manager = IndexManager::new(&instance);
        let transport = IndexedTransportCost::new(&instance, &manager);
        let start = manager.start(0).expect("vehicle 0 exists");
        let end = manager.end(0).expect("vehicle 0 exists");
        assert!((transport.lookup(start, 0) - 5.0).abs() < f64::EPSILON);
        assert!((transport.lookup(1, start) - 10.0).abs() < f64::EPSILON);
        assert!(transport.lookup(start, end).abs() < f64::EPSILON);
    }

    #[rstest]
    fn tours_are_decoded_per_vehicle() {
        let instance = depot_with_targets(&[(3, 4, 1), (6, 8, 1)]);
        let manager = IndexManager::new(&instance);
        // Visits 0 and 1, vehicle 0 start 2 and end 3; depot node is 2.
        let assignment =
            decode_tours(&instance, &manager, &[vec![2, 1, 0, 3]]).expect("decodable tour");
        assert_eq!(assignment.routes(), &[Some(vec![2, 1, 0, 2])]);
    }

    #[rstest]
    fn parked_vehicle_without_a_tour_still_serves_its_depot() {
        // Vehicle 0 sits on the heavy target at node 0; vehicle 1 has depot node 2.
        let instance = fleet_instance(&[(0, 0), (9, 9)], &[(0, 0, 6), (3, 4, 1)]);
        let manager = IndexManager::new(&instance);
        // Visit 0 is node 1; starts are 1 and 2, ends 3 and 4.
        let assignment =
            decode_tours(&instance, &manager, &[vec![2, 0, 4]]).expect("decodable tour");
        assert_eq!(assignment.routes(), &[Some(vec![0, 0]), Some(vec![2, 1, 2])]);
    }

    #[rstest]
    fn tours_not_starting_at_a_vehicle_are_rejected() {
        let instance = depot_with_targets(&[(3, 4, 1)]);
        let manager = IndexManager::new(&instance);
        let err = decode_tours(&instance, &manager, &[vec![0, 2]]).expect_err("bad tour");
        assert!(matches!(err, SolveError::Invocation { .. }));
    }

    #[rstest]
    #[case(0, Some(0))]
    #[case(5, Some(5))]
    fn depot_demand_is_taken_off_capacity(#[case] slack: u64, #[case] expected: Option<u64>) {
        // Capacity is 11; the vehicle is parked on the target weighing 11.
        let instance = depot_with_targets(&[(0, 0, 11)]);
        let manager = IndexManager::new(&instance);
        let parameters = SolveParameters {
            capacity_slack: slack,
            ..SolveParameters::default()
        };
        assert_eq!(remaining_capacity(&instance, &manager, &parameters, 0), expected);
    }

    #[rstest]
    fn depot_heavier_than_capacity_leaves_nothing() {
        // Capacity is ceil(12 / 2) = 6, but vehicle 0 is parked on 10 units.
        let instance = fleet_instance(&[(0, 0), (9, 9)], &[(0, 0, 10), (3, 4, 2)]);
        let manager = IndexManager::new(&instance);
        let parameters = SolveParameters::default();
        assert_eq!(remaining_capacity(&instance, &manager, &parameters, 0), None);
        assert_eq!(remaining_capacity(&instance, &manager, &parameters, 1), Some(6));
    }

    #[rstest]
    fn search_progress_goes_to_the_supplied_logger() {
        let messages = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = Arc::clone(&messages);
        let logger: InfoLogger = Arc::new(move |message: &str| {
            sink.lock().expect("logger lock").push(message.to_owned());
        });
        let config = VrpSolverConfig { max_generations: 5 };
        let instance = depot_with_targets(&[(3, 4, 1), (6, 8, 1)]);
        let parameters = SolveParameters {
            time_limit: Duration::from_secs(5),
            ..SolveParameters::default()
        };

        let outcome = VrpSolveContext::with_logger(&config, logger)
            .solve(&instance, &parameters)
            .expect("solve should succeed");

        assert!(matches!(outcome, SolveOutcome::Solved(_)));
        let messages = messages.lock().expect("logger lock");
        assert!(
            messages.iter().any(|message| message.starts_with("job index created")),
            "problem building should log through the supplied logger: {messages:?}"
        );
    }

    #[rstest]
    #[case(None, 0, None)]
    #[case(Some(100), 20, Some(120.0))]
    fn shift_end_adds_distance_slack(
        #[case] limit: Option<u64>,
        #[case] slack: u64,
        #[case] expected: Option<f64>,
    ) {
        let parameters = SolveParameters {
            max_route_distance: limit,
            distance_slack: slack,
            ..SolveParameters::default()
        };
        assert_eq!(shift_end(&parameters), expected);
    }

    #[rstest]
    fn oversized_loads_are_rejected() {
        assert!(load(u64::MAX).is_err());
        assert_eq!(load(42).ok(), Some(42));
    }
}
