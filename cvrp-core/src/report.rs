//! Decode a solver assignment into per-route stops, distances and loads.

use std::fmt;

use thiserror::Error;

use crate::{Assignment, Instance, Precision};

/// One node on a route with the load carried after serving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stop {
    /// Physical node index.
    pub node: usize,
    /// Cumulative load on the route after this node.
    pub load: u64,
}

/// The decoded route of one used vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteReport {
    /// Vehicle index in the instance.
    pub vehicle: usize,
    /// Stops from the start node to the end node inclusive.
    pub stops: Vec<Stop>,
    /// Route distance in fixed-point units.
    pub distance: u64,
    /// Total demand collected on the route.
    pub load: u64,
}

/// Every used route plus totals over them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolutionReport {
    /// Routes of used vehicles in vehicle order.
    pub routes: Vec<RouteReport>,
    /// Sum of route distances in fixed-point units.
    pub total_distance: u64,
    /// Sum of route loads.
    pub total_load: u64,
}

/// Reasons an assignment cannot be decoded against an instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// The assignment covers a different fleet.
    #[error("assignment has {found} vehicles but the instance has {expected}")]
    VehicleCountMismatch {
        /// Vehicles in the instance.
        expected: usize,
        /// Vehicles in the assignment.
        found: usize,
    },
    /// A route references a node the instance does not have.
    #[error("route of vehicle {vehicle} visits unknown node {node}")]
    UnknownNode {
        /// Offending vehicle.
        vehicle: usize,
        /// Offending node index.
        node: usize,
    },
    /// A route does not run from the vehicle's start to its end.
    #[error("route of vehicle {vehicle} must run from node {start} to node {end}")]
    BadEndpoints {
        /// Offending vehicle.
        vehicle: usize,
        /// Expected first node.
        start: usize,
        /// Expected last node.
        end: usize,
    },
}

/// Decode `assignment` into a [`SolutionReport`].
///
/// A node's demand is added to the route load the first time the walk
/// reaches it, so returning to a depot that doubles as a target does not count
/// its demand twice. Unused vehicles are skipped and contribute nothing to
/// the totals.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use cvrp_core::{Assignment, Precision, build_instance, report};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let vehicles = [Coord { x: 0, y: 0 }];
/// let targets = [Coord { x: 0, y: 0 }, Coord { x: 10, y: 0 }];
/// let instance = build_instance(&vehicles, &targets, &[10, 5], Precision::UNIT)?;
/// let solution = report(&instance, &Assignment::new(vec![Some(vec![0, 1, 0])]))?;
///
/// assert_eq!(solution.total_distance, 20);
/// assert_eq!(solution.total_load, 15);
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns [`ReportError`] when the assignment does not match the instance's
/// fleet or node numbering.
pub fn report(instance: &Instance, assignment: &Assignment) -> Result<SolutionReport, ReportError> {
    if assignment.num_vehicles() != instance.num_vehicles() {
        return Err(ReportError::VehicleCountMismatch {
            expected: instance.num_vehicles(),
            found: assignment.num_vehicles(),
        });
    }

    let mut solution = SolutionReport::default();
    for (vehicle, nodes) in assignment.used() {
        let route = decode_route(instance, vehicle, nodes)?;
        solution.total_distance = solution.total_distance.saturating_add(route.distance);
        solution.total_load = solution.total_load.saturating_add(route.load);
        solution.routes.push(route);
    }
    Ok(solution)
}

fn decode_route(
    instance: &Instance,
    vehicle: usize,
    nodes: &[usize],
) -> Result<RouteReport, ReportError> {
    let start = instance.starts().get(vehicle).copied().unwrap_or_default();
    let end = instance.ends().get(vehicle).copied().unwrap_or_default();
    if nodes.first() != Some(&start) || nodes.last() != Some(&end) {
        return Err(ReportError::BadEndpoints {
            vehicle,
            start,
            end,
        });
    }

    let mut visited = vec![false; instance.num_nodes()];
    let mut stops = Vec::with_capacity(nodes.len());
    let mut load = 0_u64;
    let mut distance = 0_u64;
    let mut previous: Option<usize> = None;
    for &node in nodes {
        let unknown = || ReportError::UnknownNode { vehicle, node };
        let first_visit = visited.get_mut(node).ok_or_else(unknown)?;
        if !*first_visit {
            *first_visit = true;
            load = load.saturating_add(instance.demand(node).ok_or_else(unknown)?);
        }
        if let Some(prev) = previous {
            distance = distance.saturating_add(instance.distance(prev, node).ok_or_else(unknown)?);
        }
        stops.push(Stop { node, load });
        previous = Some(node);
    }

    Ok(RouteReport {
        vehicle,
        stops,
        distance,
        load,
    })
}

impl SolutionReport {
    /// Render the report as text, converting distances to real units.
    ///
    /// ```
    /// use cvrp_core::{Precision, SolutionReport};
    ///
    /// let empty = SolutionReport::default();
    /// let text = empty.display(Precision::UNIT).to_string();
    /// assert!(text.starts_with("Objective: 0.00"));
    /// ```
    #[must_use]
    pub const fn display(&self, precision: Precision) -> SolutionDisplay<'_> {
        SolutionDisplay {
            solution: self,
            precision,
        }
    }
}

/// [`fmt::Display`] adapter returned by [`SolutionReport::display`].
#[derive(Debug, Clone, Copy)]
pub struct SolutionDisplay<'a> {
    solution: &'a SolutionReport,
    precision: Precision,
}

impl fmt::Display for SolutionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let real = |value| RealUnits::new(value, self.precision);
        writeln!(f, "Objective: {}", real(self.solution.total_distance))?;
        for route in &self.solution.routes {
            writeln!(f, "Route for vehicle {}:", route.vehicle)?;
            if let Some((last, rest)) = route.stops.split_last() {
                for stop in rest {
                    write!(f, " {} Load({}) -> ", stop.node, stop.load)?;
                }
                writeln!(f, " {} Load({})", last.node, last.load)?;
            }
            writeln!(f, "Distance of the route: {}m", real(route.distance))?;
            writeln!(f, "Load of the route: {}", route.load)?;
            writeln!(f)?;
        }
        writeln!(f, "Total distance of all routes: {}m", real(self.solution.total_distance))?;
        write!(f, "Total load of all routes: {}", self.solution.total_load)
    }
}

/// A fixed-point value shown in real units with two decimals.
///
/// Rounds half-up to the nearest hundredth using integer arithmetic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealUnits {
    hundredths: u128,
}

impl RealUnits {
    /// Convert `value` stored at `precision`.
    #[must_use]
    pub fn new(value: u64, precision: Precision) -> Self {
        let scale = u128::from(precision.get());
        Self {
            hundredths: (u128::from(value) * 100 + scale / 2) / scale,
        }
    }
}

impl fmt::Display for RealUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.hundredths / 100, self.hundredths % 100)
    }
}
