//! Solve command implementation for the CVRP CLI.

use std::io::Write;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use cvrp_core::{
    DatasetId, FirstSolutionStrategy, FsInstanceStore, Instance, InstanceStore, Precision,
    SolutionReport, SolveParameters, SolveStatus, Solver, solve_and_report,
};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_CACHE_DIR, ARG_PRECISION, ARG_SOLVE_CAPACITY_SLACK, ARG_SOLVE_DATASET,
    ARG_SOLVE_DISTANCE_SLACK, ARG_SOLVE_FIRST_SOLUTION_STRATEGY, ARG_SOLVE_JSON,
    ARG_SOLVE_MAX_ROUTE_DISTANCE, ARG_SOLVE_TIME_LIMIT, CliError, DEFAULT_CACHE_DIR,
    DEFAULT_DATASET, resolve_precision,
};

/// Printed when the solver concludes that no assignment exists.
pub(crate) const NO_SOLUTION_MESSAGE: &str = "no solution exists for the given parameters";

/// CLI arguments for the `solve` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Load a dataset prepared by `cvrp prepare`, search for \
                 minimum-distance routes that serve every target within \
                 vehicle capacity, and print the routes with their loads \
                 and distances.",
    about = "Solve a prepared dataset"
)]
#[ortho_config(prefix = "CVRP")]
pub(crate) struct SolveArgs {
    /// Identifier of the dataset to solve.
    #[arg(long = ARG_SOLVE_DATASET, value_name = "n")]
    #[serde(default)]
    pub(crate) dataset: Option<u32>,
    /// Directory holding prepared datasets.
    #[arg(long = ARG_CACHE_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) cache_dir: Option<Utf8PathBuf>,
    /// Fixed-point factor the dataset was prepared with; must match `prepare`.
    ///
    /// Prepared datasets do not record their precision. A value that differs
    /// from the one given to `cvrp prepare` prints distances scaled wrongly.
    #[arg(long = ARG_PRECISION, value_name = "n")]
    #[serde(default)]
    pub(crate) precision: Option<u32>,
    /// Search budget in seconds.
    #[arg(long = ARG_SOLVE_TIME_LIMIT, value_name = "secs")]
    #[serde(default)]
    pub(crate) time_limit: Option<u64>,
    /// Extra load each vehicle may carry.
    #[arg(long = ARG_SOLVE_CAPACITY_SLACK, value_name = "n")]
    #[serde(default)]
    pub(crate) capacity_slack: Option<u64>,
    /// Upper bound on each route's distance, in fixed-point units.
    #[arg(long = ARG_SOLVE_MAX_ROUTE_DISTANCE, value_name = "n")]
    #[serde(default)]
    pub(crate) max_route_distance: Option<u64>,
    /// Extra distance allowed above the route bound.
    #[arg(long = ARG_SOLVE_DISTANCE_SLACK, value_name = "n")]
    #[serde(default)]
    pub(crate) distance_slack: Option<u64>,
    /// First-solution heuristic: `automatic` or `construction-only`.
    #[arg(long = ARG_SOLVE_FIRST_SOLUTION_STRATEGY, value_name = "strategy")]
    #[serde(default)]
    pub(crate) first_solution_strategy: Option<String>,
    /// Print the report as JSON.
    #[arg(long = ARG_SOLVE_JSON)]
    #[serde(default)]
    pub(crate) json: bool,
}

impl SolveArgs {
    pub(crate) fn into_config(self) -> Result<SolveConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SolveConfig::try_from(merged)
    }
}

/// Resolved `solve` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SolveConfig {
    pub(crate) dataset: DatasetId,
    pub(crate) cache_dir: Utf8PathBuf,
    pub(crate) precision: Precision,
    pub(crate) parameters: SolveParameters,
    pub(crate) json: bool,
}

fn parse_strategy(raw: &str) -> Result<FirstSolutionStrategy, CliError> {
    match raw {
        "automatic" => Ok(FirstSolutionStrategy::Automatic),
        "construction-only" => Ok(FirstSolutionStrategy::ConstructionOnly),
        other => Err(CliError::InvalidArgument {
            field: ARG_SOLVE_FIRST_SOLUTION_STRATEGY,
            reason: format!("expected `automatic` or `construction-only`, found `{other}`"),
        }),
    }
}

impl TryFrom<SolveArgs> for SolveConfig {
    type Error = CliError;

    fn try_from(args: SolveArgs) -> Result<Self, Self::Error> {
        let defaults = SolveParameters::default();
        let time_limit = match args.time_limit {
            Some(0) => {
                return Err(CliError::InvalidArgument {
                    field: ARG_SOLVE_TIME_LIMIT,
                    reason: "must be at least one second".to_owned(),
                });
            }
            Some(secs) => Duration::from_secs(secs),
            None => defaults.time_limit,
        };
        let first_solution_strategy = args
            .first_solution_strategy
            .as_deref()
            .map_or(Ok(defaults.first_solution_strategy), parse_strategy)?;

        Ok(Self {
            dataset: DatasetId(args.dataset.unwrap_or(DEFAULT_DATASET)),
            cache_dir: args
                .cache_dir
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_CACHE_DIR)),
            precision: resolve_precision(args.precision)?,
            parameters: SolveParameters {
                time_limit,
                capacity_slack: args.capacity_slack.unwrap_or(defaults.capacity_slack),
                max_route_distance: args.max_route_distance,
                distance_slack: args.distance_slack.unwrap_or(defaults.distance_slack),
                first_solution_strategy,
            },
            json: args.json,
        })
    }
}

/// Builds a solver instance for the current solve invocation.
pub(crate) trait SolveSolverBuilder {
    fn build(&self, config: &SolveConfig) -> Result<Box<dyn Solver>, CliError>;
}

pub(crate) struct DefaultSolveSolverBuilder;

impl SolveSolverBuilder for DefaultSolveSolverBuilder {
    #[cfg(feature = "solver-vrp")]
    fn build(&self, _config: &SolveConfig) -> Result<Box<dyn Solver>, CliError> {
        Ok(Box::new(cvrp_solver_vrp::VrpSolver::new()))
    }

    #[cfg(not(feature = "solver-vrp"))]
    fn build(&self, _config: &SolveConfig) -> Result<Box<dyn Solver>, CliError> {
        Err(CliError::MissingFeature {
            feature: "solver-vrp",
            action: "solve",
        })
    }
}

pub(crate) fn run_solve(args: SolveArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    run_solve_with(&config, &DefaultSolveSolverBuilder, writer)
}

pub(crate) fn run_solve_with(
    config: &SolveConfig,
    builder: &dyn SolveSolverBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let instance = load_instance(config)?;
    let solver = builder.build(config)?;
    log::info!(
        "solving dataset {} with {} vehicles and {} nodes",
        config.dataset,
        instance.num_vehicles(),
        instance.num_nodes()
    );
    let status = solve_and_report(solver.as_ref(), &instance, &config.parameters)
        .map_err(|source| CliError::Solve { source })?;
    write_solve_status(writer, config, &status)
}

/// Loads the prepared [`Instance`] for the configured dataset.
pub(crate) fn load_instance(config: &SolveConfig) -> Result<Instance, CliError> {
    FsInstanceStore::new(config.cache_dir.clone())
        .load(config.dataset)?
        .ok_or_else(|| CliError::UnknownDataset {
            id: config.dataset,
            cache_dir: config.cache_dir.clone(),
        })
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
enum SolveOutput<'a> {
    Solved { solution: &'a SolutionReport },
    NoSolution,
}

fn write_solve_status(
    writer: &mut dyn Write,
    config: &SolveConfig,
    status: &SolveStatus,
) -> Result<(), CliError> {
    if config.json {
        let output = match status {
            SolveStatus::Solved(solution) => SolveOutput::Solved { solution },
            SolveStatus::NoSolutionFound => SolveOutput::NoSolution,
        };
        let payload = serde_json::to_string_pretty(&output).map_err(CliError::SerializeReport)?;
        return writeln!(writer, "{payload}").map_err(CliError::WriteOutput);
    }
    match status {
        SolveStatus::Solved(solution) => {
            writeln!(writer, "{}", solution.display(config.precision))
        }
        SolveStatus::NoSolutionFound => writeln!(writer, "{NO_SOLUTION_MESSAGE}"),
    }
    .map_err(CliError::WriteOutput)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<SolveConfig, CliError> {
    let merged = SolveArgs::merge_from_layers(layers).map_err(CliError::from)?;
    SolveConfig::try_from(merged)
}
