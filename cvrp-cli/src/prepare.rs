//! Prepare command implementation for the CVRP CLI.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use cvrp_core::{FsInstanceStore, Precision, prepare_datasets};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_CACHE_DIR, ARG_PREPARE_INPUT, ARG_PRECISION, CliError, DEFAULT_CACHE_DIR,
    ENV_PREPARE_INPUT, require_existing, resolve_precision,
};

/// CLI arguments for the `prepare` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Parse every dataset block in a raw text file, build its \
                 routing instance and cache it as dataset_<id>.json. Blocks \
                 that fail to parse or build are reported and skipped.",
    about = "Parse raw datasets and cache their instances"
)]
#[ortho_config(prefix = "CVRP")]
pub(crate) struct PrepareArgs {
    /// Path to the raw dataset text.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) input: Option<Utf8PathBuf>,
    /// Directory receiving one JSON file per dataset.
    #[arg(long = ARG_CACHE_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) cache_dir: Option<Utf8PathBuf>,
    /// Fixed-point factor applied to Euclidean distances.
    #[arg(long = ARG_PRECISION, value_name = "n")]
    #[serde(default)]
    pub(crate) precision: Option<u32>,
}

impl PrepareArgs {
    pub(crate) fn into_config(self) -> Result<PrepareConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        PrepareConfig::try_from(merged)
    }
}

/// Resolved `prepare` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PrepareConfig {
    pub(crate) input: Utf8PathBuf,
    pub(crate) cache_dir: Utf8PathBuf,
    pub(crate) precision: Precision,
}

impl TryFrom<PrepareArgs> for PrepareConfig {
    type Error = CliError;

    fn try_from(args: PrepareArgs) -> Result<Self, Self::Error> {
        let input = args.input.ok_or(CliError::MissingArgument {
            field: ARG_PREPARE_INPUT,
            env: ENV_PREPARE_INPUT,
        })?;
        Ok(Self {
            input,
            cache_dir: args
                .cache_dir
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_CACHE_DIR)),
            precision: resolve_precision(args.precision)?,
        })
    }
}

pub(crate) fn run_prepare(args: PrepareArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    run_prepare_with(&config, writer)
}

pub(crate) fn run_prepare_with(
    config: &PrepareConfig,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    require_existing(&config.input, ARG_PREPARE_INPUT)?;
    let raw = cvrp_fs::read_utf8_file(&config.input).map_err(|source| CliError::ReadInput {
        path: config.input.clone(),
        source,
    })?;
    cvrp_fs::ensure_dir(&config.cache_dir).map_err(|source| CliError::CreateCacheDir {
        path: config.cache_dir.clone(),
        source,
    })?;

    let mut store = FsInstanceStore::new(config.cache_dir.clone());
    let summary = prepare_datasets(&raw, config.precision, &mut store);

    writeln!(writer, "Parsed and saved {} datasets", summary.saved.len())
        .map_err(CliError::WriteOutput)?;
    for failure in &summary.failures {
        writeln!(writer, "skipped: {failure}").map_err(CliError::WriteOutput)?;
    }
    Ok(())
}
