//! Command-line interface for preparing and solving CVRP datasets.
#![forbid(unsafe_code)]

use std::io::{ErrorKind, Write};

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use cvrp_core::Precision;

mod error;
mod prepare;
mod solve;

pub use error::CliError;

use prepare::{PrepareArgs, run_prepare};
use solve::{SolveArgs, run_solve};

const ARG_PREPARE_INPUT: &str = "input";
const ARG_CACHE_DIR: &str = "cache-dir";
const ARG_PRECISION: &str = "precision";
const ARG_SOLVE_DATASET: &str = "dataset";
const ARG_SOLVE_TIME_LIMIT: &str = "time-limit";
const ARG_SOLVE_CAPACITY_SLACK: &str = "capacity-slack";
const ARG_SOLVE_MAX_ROUTE_DISTANCE: &str = "max-route-distance";
const ARG_SOLVE_DISTANCE_SLACK: &str = "distance-slack";
const ARG_SOLVE_FIRST_SOLUTION_STRATEGY: &str = "first-solution-strategy";
const ARG_SOLVE_JSON: &str = "json";
const ENV_PREPARE_INPUT: &str = "CVRP_CMDS_PREPARE_INPUT";

/// Directory used for prepared instances when none is configured.
const DEFAULT_CACHE_DIR: &str = "cached_datasets";
/// Dataset solved when none is configured.
const DEFAULT_DATASET: u32 = 1;

/// Run the CVRP CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns a [`CliError`] when arguments are invalid, inputs cannot be read,
/// or the solver fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    dispatch(cli.command, &mut stdout)
}

fn dispatch(command: Command, writer: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Command::Prepare(args) => run_prepare(args, writer),
        Command::Solve(args) => run_solve(args, writer),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "cvrp",
    about = "Build, cache and solve capacitated vehicle routing datasets",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse raw datasets and cache one instance per dataset.
    Prepare(PrepareArgs),
    /// Solve a cached dataset and print its routes.
    Solve(SolveArgs),
}

fn resolve_precision(value: Option<u32>) -> Result<Precision, CliError> {
    value.map_or(Ok(Precision::default()), |raw| {
        Precision::new(raw).ok_or(CliError::InvalidArgument {
            field: ARG_PRECISION,
            reason: "must be a positive integer".to_owned(),
        })
    })
}

fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    let inspect = cvrp_fs::open_dir_and_file(path)
        .and_then(|(dir, name)| dir.metadata(name.as_str()).map(|meta| meta.is_file()));
    match inspect {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == ErrorKind::NotFound => Err(CliError::MissingSourceFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests;
