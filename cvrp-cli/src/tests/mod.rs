//! Shared test harness modules for the CVRP CLI.

use super::*;

mod helpers;
