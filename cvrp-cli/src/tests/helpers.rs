//! Test helpers for writing raw datasets and prepared caches.

use camino::{Utf8Path, Utf8PathBuf};
use cvrp_core::{Assignment, FsInstanceStore, Precision, SolveOutcome, Solver, prepare_datasets};
use cvrp_core::test_support::ScriptedSolver;
use tempfile::TempDir;

use crate::CliError;
use crate::solve::{SolveConfig, SolveSolverBuilder};

/// Two well-formed datasets and one whose weights do not parse.
pub(super) const RAW_DATASETS: &str = "Data set #1\n\
    Vehicle locations :0,0;\n\
    Target locations :0,0;10,0\n\
    Weights = 10,5\n\
    Data set #2\n\
    Vehicle locations :0,0;5,5;\n\
    Target locations :3,4;6,8\n\
    Weights = 2,3\n\
    Data set #3\n\
    Vehicle locations :0,0;\n\
    Target locations :1,1\n\
    Weights = heavy\n";

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path.as_std_path(), contents).expect("write test file");
}

/// A temporary directory exposed as a UTF-8 path.
pub(super) fn temp_root() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    (tmp, root)
}

/// Prepare [`RAW_DATASETS`] at unit precision under `cache_dir`.
pub(super) fn prepare_cache(cache_dir: &Utf8Path) {
    let mut store = FsInstanceStore::new(cache_dir);
    let summary = prepare_datasets(RAW_DATASETS, Precision::UNIT, &mut store);
    assert_eq!(summary.saved.len(), 2, "fixture datasets should prepare");
}

/// The assignment serving dataset 1 with a single round trip.
pub(super) fn round_trip() -> SolveOutcome {
    SolveOutcome::Solved(Assignment::new(vec![Some(vec![0, 1, 0])]))
}

/// Builds a [`ScriptedSolver`] replaying a fixed outcome.
#[derive(Debug)]
pub(super) struct ScriptedSolverBuilder {
    pub(super) outcome: SolveOutcome,
}

impl SolveSolverBuilder for ScriptedSolverBuilder {
    fn build(&self, _config: &SolveConfig) -> Result<Box<dyn Solver>, CliError> {
        Ok(Box::new(ScriptedSolver::new(self.outcome.clone())))
    }
}
