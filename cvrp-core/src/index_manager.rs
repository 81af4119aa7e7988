//! Translation between physical nodes and a solver's internal indices.
//!
//! Routing solvers usually number their locations differently from the
//! distance matrix: every vehicle needs its own start and end index, and
//! depot nodes are never visited as jobs. The [`IndexManager`] fixes one such
//! numbering:
//!
//! - `[0, V)`: visit indices, one per node that must be served;
//! - `[V, V + K)`: the start index of each of the `K` vehicles;
//! - `[V + K, V + 2K)`: the end index of each vehicle.
//!
//! The mapping is computed once from an [`Instance`] and never changes.

use crate::Instance;

/// An index in the solver's internal numbering.
pub type SolverIndex = usize;

/// Bidirectional mapping between nodes and solver indices.
///
/// Every node that is not a vehicle depot gets a visit index. A depot that
/// also carries demand (a vehicle parked on a target) is served by the
/// vehicle parked there, so its demand is collected at that vehicle's start
/// index rather than through a job any vehicle could take.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use cvrp_core::{IndexManager, Precision, build_instance};
///
/// # fn main() -> Result<(), cvrp_core::InstanceError> {
/// let vehicles = [Coord { x: 0, y: 0 }, Coord { x: 9, y: 9 }];
/// let targets = [Coord { x: 0, y: 0 }, Coord { x: 5, y: 0 }];
/// let instance = build_instance(&vehicles, &targets, &[3, 4], Precision::UNIT)?;
/// let manager = IndexManager::new(&instance);
///
/// assert_eq!(manager.num_visits(), 1);
/// assert_eq!(manager.num_indices(), 5);
/// assert_eq!(manager.index_to_node(manager.start(1).unwrap_or_default()), Some(2));
/// assert_eq!(manager.visit_index(1), Some(0));
/// assert_eq!(manager.visit_index(0), None);
/// assert_eq!(manager.demand(&instance, manager.start(0).unwrap_or_default()), Some(3));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexManager {
    visit_nodes: Vec<usize>,
    node_visits: Vec<Option<SolverIndex>>,
    starts: Vec<usize>,
    ends: Vec<usize>,
}

impl IndexManager {
    /// Derive the index layout for `instance`.
    #[must_use]
    pub fn new(instance: &Instance) -> Self {
        let mut visit_nodes = Vec::new();
        let mut node_visits = vec![None; instance.num_nodes()];
        for (node, slot) in node_visits.iter_mut().enumerate() {
            if !instance.is_depot(node) {
                *slot = Some(visit_nodes.len());
                visit_nodes.push(node);
            }
        }
        Self {
            visit_nodes,
            node_visits,
            starts: instance.starts().to_vec(),
            ends: instance.ends().to_vec(),
        }
    }

    /// Number of visit indices.
    #[must_use]
    pub fn num_visits(&self) -> usize {
        self.visit_nodes.len()
    }

    /// Number of vehicles.
    #[must_use]
    pub fn num_vehicles(&self) -> usize {
        self.starts.len()
    }

    /// Total number of solver indices.
    #[must_use]
    pub fn num_indices(&self) -> usize {
        self.num_visits() + 2 * self.num_vehicles()
    }

    /// Visit indices paired with the node each one stands for.
    pub fn visits(&self) -> impl Iterator<Item = (SolverIndex, usize)> + '_ {
        self.visit_nodes.iter().copied().enumerate()
    }

    /// The physical node behind a solver index.
    #[must_use]
    pub fn index_to_node(&self, index: SolverIndex) -> Option<usize> {
        let vehicles = self.num_vehicles();
        let offset = index.checked_sub(self.num_visits());
        match offset {
            None => self.visit_nodes.get(index).copied(),
            Some(offset) if offset < vehicles => self.starts.get(offset).copied(),
            Some(offset) => self.ends.get(offset - vehicles).copied(),
        }
    }

    /// The visit index of `node`, if the node must be served.
    #[must_use]
    pub fn visit_index(&self, node: usize) -> Option<SolverIndex> {
        self.node_visits.get(node).copied().flatten()
    }

    /// Start index of `vehicle`.
    #[must_use]
    pub fn start(&self, vehicle: usize) -> Option<SolverIndex> {
        (vehicle < self.num_vehicles()).then(|| self.num_visits() + vehicle)
    }

    /// End index of `vehicle`.
    #[must_use]
    pub fn end(&self, vehicle: usize) -> Option<SolverIndex> {
        (vehicle < self.num_vehicles()).then(|| self.num_visits() + self.num_vehicles() + vehicle)
    }

    /// The vehicle owning a start index.
    #[must_use]
    pub fn vehicle_for_start(&self, index: SolverIndex) -> Option<usize> {
        index
            .checked_sub(self.num_visits())
            .filter(|vehicle| *vehicle < self.num_vehicles())
    }

    /// Whether `index` is some vehicle's start.
    #[must_use]
    pub fn is_start(&self, index: SolverIndex) -> bool {
        self.vehicle_for_start(index).is_some()
    }

    /// Whether `index` is some vehicle's end.
    #[must_use]
    pub fn is_end(&self, index: SolverIndex) -> bool {
        let first_end = self.num_visits() + self.num_vehicles();
        (first_end..self.num_indices()).contains(&index)
    }

    /// Arc cost between two solver indices.
    ///
    /// This is the transit callback handed to a solver: both indices are
    /// translated to nodes and looked up in the distance matrix.
    #[must_use]
    pub fn arc_cost(&self, instance: &Instance, from: SolverIndex, to: SolverIndex) -> Option<u64> {
        instance.distance(self.index_to_node(from)?, self.index_to_node(to)?)
    }

    /// Demand collected at a solver index.
    ///
    /// Visit and start indices carry their node's demand, so a vehicle parked
    /// on a target always collects it on departure. End indices carry none.
    #[must_use]
    pub fn demand(&self, instance: &Instance, index: SolverIndex) -> Option<u64> {
        if index < self.num_visits() || self.is_start(index) {
            instance.demand(self.index_to_node(index)?)
        } else {
            (index < self.num_indices()).then_some(0)
        }
    }

    /// Demand `vehicle` picks up at its own depot before serving any visit.
    #[must_use]
    pub fn depot_demand(&self, instance: &Instance, vehicle: usize) -> Option<u64> {
        self.demand(instance, self.start(vehicle)?)
    }
}
