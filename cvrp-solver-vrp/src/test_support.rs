//! Test-only utilities for `cvrp-solver-vrp`.
//!
//! The helpers in this module are available to unit tests and behavioural
//! tests. They are gated behind the `test-support` feature (and `cfg(test)`).

use std::collections::HashSet;

use cvrp_core::{Assignment, Instance, Location, Precision, SolveParameters, build_instance};
use geo::Coord;

/// Build an instance at unit precision from `(x, y)` vehicle depots and
/// `(x, y, weight)` targets.
///
/// # Panics
///
/// Panics when the inputs do not form a valid instance, which only happens
/// for an empty fleet.
///
/// # Examples
/// ```rust
/// use cvrp_solver_vrp::test_support::fleet_instance;
///
/// let instance = fleet_instance(&[(0, 0), (0, 0)], &[(3, 4, 2)]);
/// assert_eq!(instance.num_vehicles(), 2);
/// assert_eq!(instance.demands(), &[2, 0]);
/// ```
#[must_use]
pub fn fleet_instance(vehicles: &[(i32, i32)], targets: &[(i32, i32, u64)]) -> Instance {
    let vehicle_locations: Vec<Location> = vehicles.iter().map(|&(x, y)| Coord { x, y }).collect();
    let target_locations: Vec<Location> = targets.iter().map(|&(x, y, _)| Coord { x, y }).collect();
    let weights: Vec<u64> = targets.iter().map(|&(_, _, weight)| weight).collect();
    build_instance(&vehicle_locations, &target_locations, &weights, Precision::UNIT)
        .unwrap_or_else(|err| panic!("fixture instance should build: {err}"))
}

/// One vehicle at the origin serving `(x, y, weight)` targets.
#[must_use]
pub fn depot_with_targets(targets: &[(i32, i32, u64)]) -> Instance {
    fleet_instance(&[(0, 0)], targets)
}

/// Check that `assignment` is a feasible answer for `instance`.
///
/// Every node that is not a depot, and every depot that carries demand, must
/// be served by exactly one route. Each route must start and end at its
/// vehicle's depots, and no route may exceed its capacity plus slack or the
/// distance bound plus slack. Returns a description of the first violation
/// found.
///
/// # Errors
///
/// Returns a human-readable message describing the violated constraint.
pub fn check_feasible(
    instance: &Instance,
    assignment: &Assignment,
    parameters: &SolveParameters,
) -> Result<(), String> {
    if assignment.num_vehicles() != instance.num_vehicles() {
        return Err(format!(
            "assignment covers {} vehicles, instance has {}",
            assignment.num_vehicles(),
            instance.num_vehicles()
        ));
    }

    let must_serve =
        |node: usize| !instance.is_depot(node) || instance.demand(node).is_some_and(|demand| demand > 0);
    let mut served = HashSet::new();
    for (vehicle, route) in assignment.used() {
        let start = instance.starts().get(vehicle).copied();
        let end = instance.ends().get(vehicle).copied();
        if route.first().copied() != start || route.last().copied() != end {
            return Err(format!("vehicle {vehicle} route {route:?} has wrong endpoints"));
        }

        let mut route_load = 0_u64;
        let mut route_distance = 0_u64;
        let mut seen_on_route = HashSet::new();
        for (position, node) in route.iter().enumerate() {
            let first_on_route = seen_on_route.insert(*node);
            if first_on_route {
                route_load = route_load.saturating_add(instance.demand(*node).unwrap_or_default());
            }
            if let Some(prev) = position.checked_sub(1).and_then(|p| route.get(p)) {
                route_distance =
                    route_distance.saturating_add(instance.distance(*prev, *node).unwrap_or_default());
            }
            let revisited = !instance.is_depot(*node) && !first_on_route;
            let served_elsewhere = first_on_route && must_serve(*node) && !served.insert(*node);
            if revisited || served_elsewhere {
                return Err(format!("node {node} is visited more than once"));
            }
        }

        let capacity = instance
            .vehicle_capacities()
            .get(vehicle)
            .copied()
            .unwrap_or_default()
            .saturating_add(parameters.capacity_slack);
        if route_load > capacity {
            return Err(format!(
                "vehicle {vehicle} carries {route_load} but may carry {capacity}"
            ));
        }
        if let Some(bound) = parameters.route_distance_bound()
            && route_distance > bound
        {
            return Err(format!(
                "vehicle {vehicle} travels {route_distance} but may travel {bound}"
            ));
        }
    }

    let missing: Vec<usize> = (0..instance.num_nodes())
        .filter(|node| must_serve(*node) && !served.contains(node))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!("nodes {missing:?} are never visited"))
    }
}
