//! Behavioural tests for `build_instance` using rstest-bdd.

use std::cell::RefCell;

use cvrp_core::{Instance, InstanceError, Location, Precision, build_instance};
use geo::Coord;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

#[derive(Debug, Default)]
struct BuilderWorld {
    vehicles: RefCell<Vec<Location>>,
    targets: RefCell<Vec<Location>>,
    weights: RefCell<Vec<u64>>,
    outcome: RefCell<Option<Result<Instance, InstanceError>>>,
}

impl BuilderWorld {
    fn instance(&self) -> Instance {
        match self.outcome.borrow().as_ref() {
            Some(Ok(instance)) => instance.clone(),
            other => panic!("expected a built instance, got {other:?}"),
        }
    }

    fn error(&self) -> InstanceError {
        match self.outcome.borrow().as_ref() {
            Some(Err(err)) => err.clone(),
            other => panic!("expected a build error, got {other:?}"),
        }
    }
}

#[fixture]
fn world() -> BuilderWorld {
    BuilderWorld::default()
}

const fn at(x: i32, y: i32) -> Location {
    Coord { x, y }
}

#[given("a vehicle at the origin")]
fn one_vehicle(world: &BuilderWorld) {
    world.vehicles.replace(vec![at(0, 0)]);
}

#[given("two vehicles at the origin")]
fn two_vehicles(world: &BuilderWorld) {
    world.vehicles.replace(vec![at(0, 0), at(0, 0)]);
}

#[given("no vehicles")]
fn no_vehicles(world: &BuilderWorld) {
    world.vehicles.replace(Vec::new());
}

#[given("a target at the origin weighing 10 and one at 10,0 weighing 5")]
fn two_targets(world: &BuilderWorld) {
    world.targets.replace(vec![at(0, 0), at(10, 0)]);
    world.weights.replace(vec![10, 5]);
}

#[given("a single target at 3,4 weighing 7")]
fn single_target(world: &BuilderWorld) {
    world.targets.replace(vec![at(3, 4)]);
    world.weights.replace(vec![7]);
}

#[given("two targets with a single weight")]
fn mismatched_targets(world: &BuilderWorld) {
    world.targets.replace(vec![at(1, 1), at(2, 2)]);
    world.weights.replace(vec![3]);
}

#[when("the instance is built at unit precision")]
fn build(world: &BuilderWorld) {
    let outcome = build_instance(
        &world.vehicles.borrow(),
        &world.targets.borrow(),
        &world.weights.borrow(),
        Precision::UNIT,
    );
    world.outcome.replace(Some(outcome));
}

#[then("the distance matrix is symmetric with a zero diagonal")]
fn symmetric_matrix(world: &BuilderWorld) {
    let instance = world.instance();
    let matrix = instance.distance_matrix();
    for (i, row) in matrix.iter().enumerate() {
        assert_eq!(row.len(), matrix.len());
        assert_eq!(row[i], 0);
        for (j, value) in row.iter().enumerate() {
            assert_eq!(*value, matrix[j][i]);
        }
    }
}

#[then("the vehicle starts and ends at node 0")]
fn depot_is_first_target(world: &BuilderWorld) {
    let instance = world.instance();
    assert_eq!(instance.starts(), &[0]);
    assert_eq!(instance.ends(), &[0]);
}

#[then("every vehicle can carry 15 units")]
fn capacity_fifteen(world: &BuilderWorld) {
    assert!(world.instance().vehicle_capacities().iter().all(|c| *c == 15));
}

#[then("every vehicle can carry 7 units")]
fn capacity_seven(world: &BuilderWorld) {
    assert_eq!(world.instance().vehicle_capacities(), &[7]);
}

#[then("the instance has 2 nodes and 1 vehicle")]
fn two_nodes_one_vehicle(world: &BuilderWorld) {
    let instance = world.instance();
    assert_eq!(instance.num_nodes(), 2);
    assert_eq!(instance.num_vehicles(), 1);
}

#[then("the vehicle starts at the appended depot node")]
fn appended_depot(world: &BuilderWorld) {
    let instance = world.instance();
    assert_eq!(instance.starts(), &[1]);
    assert_eq!(instance.ends(), &[1]);
    assert_eq!(instance.demands(), &[7, 0]);
}

#[then("building fails because targets and weights differ")]
fn malformed(world: &BuilderWorld) {
    assert_eq!(
        world.error(),
        InstanceError::MalformedInput {
            targets: 2,
            weights: 1
        }
    );
}

#[then("building fails because the fleet is empty")]
fn empty_fleet(world: &BuilderWorld) {
    assert_eq!(world.error(), InstanceError::InvalidFleet);
}

#[scenario(path = "tests/features/instance_builder.feature", index = 0)]
fn vehicle_on_target(world: BuilderWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/instance_builder.feature", index = 1)]
fn repeated_vehicle_locations(world: BuilderWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/instance_builder.feature", index = 2)]
fn mismatched_weights(world: BuilderWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/instance_builder.feature", index = 3)]
fn no_fleet(world: BuilderWorld) {
    let _ = world;
}
