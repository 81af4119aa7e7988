//! CVRP instances and the builder that derives them from raw records.
//!
//! An [`Instance`] is built once per dataset and is immutable afterwards: the
//! distance matrix, demand vector, capacities and depot indices share one
//! node numbering, and the builder guarantees the matrix is symmetric with a
//! zero diagonal.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use thiserror::Error;

use crate::{Location, Precision};

/// A capacitated vehicle routing problem ready to hand to a solver.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use cvrp_core::{Precision, build_instance};
///
/// # fn main() -> Result<(), cvrp_core::InstanceError> {
/// let vehicles = [Coord { x: 0, y: 0 }];
/// let targets = [Coord { x: 0, y: 0 }, Coord { x: 10, y: 0 }];
/// let instance = build_instance(&vehicles, &targets, &[10, 5], Precision::UNIT)?;
///
/// assert_eq!(instance.distance_matrix(), &[vec![0, 10], vec![10, 0]]);
/// assert_eq!(instance.demands(), &[10, 5]);
/// assert_eq!(instance.starts(), &[0]);
/// assert_eq!(instance.vehicle_capacities(), &[15]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "InstanceRecord"))]
pub struct Instance {
    distance_matrix: Vec<Vec<u64>>,
    num_vehicles: usize,
    demands: Vec<u64>,
    vehicle_capacities: Vec<u64>,
    starts: Vec<usize>,
    ends: Vec<usize>,
}

/// Errors raised while building or validating an [`Instance`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstanceError {
    /// Target locations and weights do not pair up.
    #[error("{targets} target locations but {weights} weights")]
    MalformedInput {
        /// Number of target locations supplied.
        targets: usize,
        /// Number of weights supplied.
        weights: usize,
    },
    /// No vehicle locations were supplied, so capacities cannot be derived.
    #[error("at least one vehicle location is required")]
    InvalidFleet,
    /// A scaled distance does not fit the integer representation.
    #[error("distance from {from:?} to {to:?} overflows at precision {precision}")]
    DistanceOverflow {
        /// Origin of the offending arc.
        from: Location,
        /// Destination of the offending arc.
        to: Location,
        /// Scale factor in use.
        precision: Precision,
    },
    /// The summed demand does not fit the integer representation.
    #[error("total demand overflows")]
    DemandOverflow,
    /// A stored record violates the structural invariants of an instance.
    #[error("inconsistent instance record: {reason}")]
    Inconsistent {
        /// Which invariant failed.
        reason: String,
    },
}

impl InstanceError {
    fn inconsistent(reason: impl Into<String>) -> Self {
        Self::Inconsistent {
            reason: reason.into(),
        }
    }
}

/// Build a CVRP instance from vehicle locations, targets and their weights.
///
/// Targets become nodes in first-seen order; a repeated target coordinate is
/// merged into its first node and the weights are summed. Vehicle locations
/// not already present are appended with zero demand. The fleet has one
/// vehicle per distinct vehicle location, in first-seen order, so repeated
/// vehicle locations collapse into a single vehicle.
///
/// # Errors
///
/// Returns [`InstanceError::MalformedInput`] when `targets` and `weights`
/// differ in length and [`InstanceError::InvalidFleet`] when no vehicle
/// locations are given.
pub fn build_instance(
    vehicle_locations: &[Location],
    target_locations: &[Location],
    weights: &[u64],
    precision: Precision,
) -> Result<Instance, InstanceError> {
    if target_locations.len() != weights.len() {
        return Err(InstanceError::MalformedInput {
            targets: target_locations.len(),
            weights: weights.len(),
        });
    }
    if vehicle_locations.is_empty() {
        return Err(InstanceError::InvalidFleet);
    }

    let mut nodes: Vec<Location> = Vec::new();
    let mut demands: Vec<u64> = Vec::new();
    let mut node_index: HashMap<Location, usize> = HashMap::new();

    for (location, weight) in target_locations.iter().zip(weights) {
        match node_index.entry(*location) {
            Entry::Occupied(entry) => {
                let demand = &mut demands[*entry.get()];
                *demand = demand
                    .checked_add(*weight)
                    .ok_or(InstanceError::DemandOverflow)?;
            }
            Entry::Vacant(entry) => {
                entry.insert(nodes.len());
                nodes.push(*location);
                demands.push(*weight);
            }
        }
    }

    let mut starts: Vec<usize> = Vec::with_capacity(vehicle_locations.len());
    for location in vehicle_locations {
        let index = *node_index.entry(*location).or_insert_with(|| {
            nodes.push(*location);
            demands.push(0);
            nodes.len() - 1
        });
        if !starts.contains(&index) {
            starts.push(index);
        }
    }

    let distance_matrix = distance_matrix(&nodes, precision)?;
    let total_demand = demands
        .iter()
        .try_fold(0_u64, |acc, demand| acc.checked_add(*demand))
        .ok_or(InstanceError::DemandOverflow)?;
    let num_vehicles = starts.len();
    let per_vehicle = total_demand.div_ceil(num_vehicles as u64);

    log::debug!(
        "built instance with {} nodes, {num_vehicles} vehicles and capacity {per_vehicle}",
        nodes.len()
    );

    Ok(Instance {
        distance_matrix,
        num_vehicles,
        demands,
        vehicle_capacities: vec![per_vehicle; num_vehicles],
        ends: starts.clone(),
        starts,
    })
}

/// `floor(precision * euclidean(from, to))`, computed exactly.
///
/// `floor(p * sqrt(d²)) == isqrt(p² * d²)` for non-negative integers, so the
/// result never depends on floating-point rounding.
fn scaled_distance(from: Location, to: Location, precision: Precision) -> Option<u64> {
    let dx = u128::from(from.x.abs_diff(to.x));
    let dy = u128::from(from.y.abs_diff(to.y));
    let scale = u128::from(precision.get());
    let scaled = (dx * dx + dy * dy).checked_mul(scale * scale)?;
    u64::try_from(scaled.isqrt()).ok()
}

fn distance_matrix(nodes: &[Location], precision: Precision) -> Result<Vec<Vec<u64>>, InstanceError> {
    let mut matrix = vec![vec![0_u64; nodes.len()]; nodes.len()];
    for (i, from) in nodes.iter().enumerate() {
        for (j, to) in nodes.iter().enumerate().skip(i + 1) {
            let distance = scaled_distance(*from, *to, precision).ok_or(
                InstanceError::DistanceOverflow {
                    from: *from,
                    to: *to,
                    precision,
                },
            )?;
            matrix[i][j] = distance;
            matrix[j][i] = distance;
        }
    }
    Ok(matrix)
}

impl Instance {
    /// Assemble an instance from stored parts, checking structural invariants.
    ///
    /// This is the path taken when a cached record is loaded; freshly parsed
    /// data should go through [`build_instance`].
    ///
    /// # Errors
    ///
    /// Returns [`InstanceError::InvalidFleet`] for an empty fleet and
    /// [`InstanceError::Inconsistent`] when the parts disagree on the node or
    /// vehicle count, or when two vehicles start at the same node.
    pub fn from_parts(
        distance_matrix: Vec<Vec<u64>>,
        num_vehicles: usize,
        demands: Vec<u64>,
        vehicle_capacities: Vec<u64>,
        starts: Vec<usize>,
        ends: Vec<usize>,
    ) -> Result<Self, InstanceError> {
        let nodes = distance_matrix.len();
        if num_vehicles == 0 {
            return Err(InstanceError::InvalidFleet);
        }
        if distance_matrix.iter().any(|row| row.len() != nodes) {
            return Err(InstanceError::inconsistent("distance matrix is not square"));
        }
        if demands.len() != nodes {
            return Err(InstanceError::inconsistent(format!(
                "{} demands for {nodes} nodes",
                demands.len()
            )));
        }
        for (name, len) in [
            ("vehicle_capacities", vehicle_capacities.len()),
            ("starts", starts.len()),
            ("ends", ends.len()),
        ] {
            if len != num_vehicles {
                return Err(InstanceError::inconsistent(format!(
                    "{len} {name} for {num_vehicles} vehicles"
                )));
            }
        }
        if let Some(node) = starts.iter().chain(&ends).find(|node| **node >= nodes) {
            return Err(InstanceError::inconsistent(format!(
                "depot node {node} is outside the {nodes}-node matrix"
            )));
        }
        if let Some((vehicle, node)) = starts
            .iter()
            .enumerate()
            .find(|(vehicle, node)| starts.iter().take(*vehicle).any(|seen| seen == *node))
        {
            return Err(InstanceError::inconsistent(format!(
                "vehicle {vehicle} shares depot node {node} with an earlier vehicle"
            )));
        }
        Ok(Self {
            distance_matrix,
            num_vehicles,
            demands,
            vehicle_capacities,
            starts,
            ends,
        })
    }

    /// Fixed-point distances between every pair of nodes.
    #[must_use]
    pub fn distance_matrix(&self) -> &[Vec<u64>] {
        &self.distance_matrix
    }

    /// Number of vehicles in the fleet.
    #[must_use]
    pub const fn num_vehicles(&self) -> usize {
        self.num_vehicles
    }

    /// Number of nodes, i.e. rows of the distance matrix.
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.distance_matrix.len()
    }

    /// Demand per node, aligned with the matrix rows.
    #[must_use]
    pub fn demands(&self) -> &[u64] {
        &self.demands
    }

    /// Capacity per vehicle.
    #[must_use]
    pub fn vehicle_capacities(&self) -> &[u64] {
        &self.vehicle_capacities
    }

    /// Start node per vehicle.
    #[must_use]
    pub fn starts(&self) -> &[usize] {
        &self.starts
    }

    /// End node per vehicle.
    #[must_use]
    pub fn ends(&self) -> &[usize] {
        &self.ends
    }

    /// Distance from `from` to `to`, or `None` when either node is unknown.
    #[must_use]
    pub fn distance(&self, from: usize, to: usize) -> Option<u64> {
        self.distance_matrix.get(from)?.get(to).copied()
    }

    /// Demand at `node`, or `None` when the node is unknown.
    #[must_use]
    pub fn demand(&self, node: usize) -> Option<u64> {
        self.demands.get(node).copied()
    }

    /// Whether `node` is the start or end of any vehicle.
    #[must_use]
    pub fn is_depot(&self, node: usize) -> bool {
        self.starts.contains(&node) || self.ends.contains(&node)
    }

    /// Sum of all node demands.
    #[must_use]
    pub fn total_demand(&self) -> u64 {
        self.demands.iter().sum()
    }

    /// Sum of all vehicle capacities.
    #[must_use]
    pub fn total_capacity(&self) -> u64 {
        self.vehicle_capacities.iter().sum()
    }
}

/// Serialised shape of an [`Instance`]; field names are part of the cache
/// format.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct InstanceRecord {
    distance_matrix: Vec<Vec<u64>>,
    num_vehicles: usize,
    demands: Vec<u64>,
    vehicle_capacities: Vec<u64>,
    starts: Vec<usize>,
    ends: Vec<usize>,
}

#[cfg(feature = "serde")]
impl TryFrom<InstanceRecord> for Instance {
    type Error = InstanceError;

    fn try_from(record: InstanceRecord) -> Result<Self, Self::Error> {
        Self::from_parts(
            record.distance_matrix,
            record.num_vehicles,
            record.demands,
            record.vehicle_capacities,
            record.starts,
            record.ends,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;
    use rstest::rstest;

    const fn at(x: i32, y: i32) -> Location {
        Coord { x, y }
    }

    fn precision(value: u32) -> Precision {
        Precision::new(value).expect("non-zero precision")
    }

    #[rstest]
    fn co_located_vehicle_reuses_target_node() {
        let instance = build_instance(
            &[at(0, 0)],
            &[at(0, 0), at(10, 0)],
            &[10, 5],
            Precision::UNIT,
        )
        .expect("instance should build");

        assert_eq!(instance.num_nodes(), 2);
        assert_eq!(instance.distance_matrix(), &[vec![0, 10], vec![10, 0]]);
        assert_eq!(instance.demands(), &[10, 5]);
        assert_eq!(instance.starts(), &[0]);
        assert_eq!(instance.ends(), &[0]);
        assert_eq!(instance.vehicle_capacities(), &[15]);
    }

    #[rstest]
    fn vehicle_only_locations_are_appended_with_zero_demand() {
        let instance = build_instance(
            &[at(5, 5), at(0, 0), at(7, 7)],
            &[at(0, 0), at(3, 4)],
            &[4, 6],
            Precision::UNIT,
        )
        .expect("instance should build");

        assert_eq!(instance.demands(), &[4, 6, 0, 0]);
        assert_eq!(instance.starts(), &[2, 0, 3]);
        assert_eq!(instance.num_vehicles(), 3);
    }

    #[rstest]
    fn vehicles_sharing_a_location_collapse_into_one() {
        let instance = build_instance(&[at(1, 1), at(1, 1)], &[at(4, 5)], &[3], Precision::UNIT)
            .expect("instance should build");

        assert_eq!(instance.num_nodes(), 2);
        assert_eq!(instance.num_vehicles(), 1);
        assert_eq!(instance.starts(), &[1]);
        assert_eq!(instance.ends(), &[1]);
        assert_eq!(instance.vehicle_capacities(), &[3]);
    }

    #[rstest]
    fn repeated_vehicle_locations_keep_first_seen_order() {
        let instance = build_instance(
            &[at(7, 7), at(0, 0), at(7, 7), at(0, 0)],
            &[at(0, 0)],
            &[4],
            Precision::UNIT,
        )
        .expect("instance should build");

        assert_eq!(instance.starts(), &[1, 0]);
        assert_eq!(instance.vehicle_capacities(), &[2, 2]);
    }

    #[rstest]
    #[case(1, 1)]
    #[case(10, 14)]
    #[case(100, 141)]
    #[case(1000, 1414)]
    fn distances_are_truncated_after_scaling(#[case] scale: u32, #[case] expected: u64) {
        let instance = build_instance(&[at(0, 0)], &[at(1, 1)], &[1], precision(scale))
            .expect("instance should build");
        assert_eq!(instance.distance(0, 1), Some(expected));
        assert_eq!(instance.distance(1, 0), Some(expected));
    }

    #[rstest]
    fn repeated_targets_merge_and_sum_demand() {
        let instance = build_instance(
            &[at(9, 9)],
            &[at(1, 2), at(3, 4), at(1, 2)],
            &[5, 7, 2],
            Precision::UNIT,
        )
        .expect("instance should build");

        assert_eq!(instance.demands(), &[7, 7, 0]);
        assert_eq!(instance.total_demand(), 14);
    }

    #[rstest]
    #[case(&[10, 5], 2, 8)]
    #[case(&[10, 5], 3, 5)]
    #[case(&[1], 4, 1)]
    #[case(&[0, 0], 2, 0)]
    fn capacity_is_ceiling_of_even_split(
        #[case] weights: &[u64],
        #[case] vehicles: usize,
        #[case] expected: u64,
    ) {
        let targets: Vec<Location> = (0..weights.len())
            .map(|i| at(i32::try_from(i).expect("small index") + 1, 0))
            .collect();
        let fleet: Vec<Location> = (0..vehicles)
            .map(|i| at(0, -i32::try_from(i).expect("small index")))
            .collect();
        let instance = build_instance(&fleet, &targets, weights, Precision::UNIT)
            .expect("instance should build");

        assert!(instance.vehicle_capacities().iter().all(|c| *c == expected));
        assert!(instance.total_capacity() >= instance.total_demand());
    }

    #[rstest]
    fn mismatched_weights_are_malformed() {
        let err = build_instance(&[at(0, 0)], &[at(1, 1), at(2, 2)], &[1], Precision::UNIT)
            .expect_err("mismatch should fail");
        assert_eq!(
            err,
            InstanceError::MalformedInput {
                targets: 2,
                weights: 1
            }
        );
    }

    #[rstest]
    fn empty_fleet_is_rejected() {
        let err = build_instance(&[], &[at(1, 1)], &[1], Precision::UNIT)
            .expect_err("empty fleet should fail");
        assert_eq!(err, InstanceError::InvalidFleet);
    }

    #[rstest]
    fn vehicle_without_targets_yields_a_single_empty_node() {
        let instance = build_instance(&[at(3, 3)], &[], &[], Precision::default())
            .expect("instance should build");

        assert_eq!(instance.num_vehicles(), 1);
        assert_eq!(instance.demands(), &[0]);
        assert_eq!(instance.vehicle_capacities(), &[0]);
        assert_eq!(instance.distance_matrix(), &[vec![0]]);
    }

    #[rstest]
    fn extreme_coordinates_overflow_at_huge_precision() {
        let err = build_instance(
            &[at(i32::MIN, i32::MIN)],
            &[at(i32::MAX, i32::MAX)],
            &[1],
            precision(u32::MAX),
        )
        .expect_err("scaled distance cannot fit");
        assert!(matches!(err, InstanceError::DistanceOverflow { .. }));
    }

    #[rstest]
    fn from_parts_rejects_ragged_matrix() {
        let err = Instance::from_parts(vec![vec![0, 1], vec![1]], 1, vec![0, 0], vec![0], vec![0], vec![0])
            .expect_err("ragged matrix should fail");
        assert!(matches!(err, InstanceError::Inconsistent { .. }));
    }

    #[rstest]
    fn from_parts_rejects_shared_start_nodes() {
        let err = Instance::from_parts(
            vec![vec![0]],
            2,
            vec![0],
            vec![0, 0],
            vec![0, 0],
            vec![0, 0],
        )
        .expect_err("shared start should fail");
        assert!(matches!(err, InstanceError::Inconsistent { .. }));
    }

    #[rstest]
    fn from_parts_rejects_out_of_range_depot() {
        let err = Instance::from_parts(vec![vec![0]], 1, vec![0], vec![0], vec![3], vec![0])
            .expect_err("depot outside matrix should fail");
        assert!(matches!(err, InstanceError::Inconsistent { .. }));
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn serialised_record_uses_fixed_field_names() {
        let instance = build_instance(&[at(0, 0)], &[at(3, 4)], &[2], Precision::UNIT)
            .expect("instance should build");
        let json = serde_json::to_value(&instance).expect("serialise instance");

        for field in [
            "distance_matrix",
            "num_vehicles",
            "demands",
            "vehicle_capacities",
            "starts",
            "ends",
        ] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
        let decoded: Instance = serde_json::from_value(json).expect("decode instance");
        assert_eq!(decoded, instance);
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn deserialising_rejects_mismatched_vehicle_fields() {
        let payload = r#"{
            "distance_matrix": [[0]],
            "num_vehicles": 2,
            "demands": [0],
            "vehicle_capacities": [0],
            "starts": [0],
            "ends": [0, 0]
        }"#;
        let result: Result<Instance, _> = serde_json::from_str(payload);
        assert!(result.is_err());
    }
}
