//! Error types emitted by the CVRP CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use cvrp_core::{DatasetId, SolveError, StoreError};
use thiserror::Error;

/// Errors emitted by the CVRP CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// An option holds a value outside its domain.
    #[error("invalid {field}: {reason}")]
    InvalidArgument {
        field: &'static str,
        reason: String,
    },
    /// The requested operation requires a missing compile-time feature.
    #[error("{action} requires the `{feature}` feature to be enabled")]
    MissingFeature {
        feature: &'static str,
        action: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Reading the raw dataset text failed.
    #[error("failed to read datasets from {path:?}: {source}")]
    ReadInput {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Creating the instance cache directory failed.
    #[error("failed to create cache directory {path:?}: {source}")]
    CreateCacheDir {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The instance cache could not be read.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// No instance has been prepared for the requested dataset.
    #[error("dataset {id} has not been prepared in {cache_dir:?}")]
    UnknownDataset {
        id: DatasetId,
        cache_dir: Utf8PathBuf,
    },
    /// The solver failed.
    #[error("solver failed: {source}")]
    Solve {
        #[source]
        source: SolveError,
    },
    /// Serializing the solution report failed.
    #[error("failed to serialize solution report: {0}")]
    SerializeReport(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
