//! Parse, build and persist every dataset in a raw text.

use thiserror::Error;

use crate::{
    DatasetId, InstanceError, InstanceStore, ParseError, Precision, StoreError, parse_records,
};

/// Why one dataset was not prepared.
#[derive(Debug, Error)]
pub enum PreparationFailure {
    /// The block could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The parsed records do not form a valid instance.
    #[error("dataset {id}: {source}")]
    Build {
        /// Dataset that failed.
        id: DatasetId,
        /// Builder error.
        #[source]
        source: InstanceError,
    },
    /// The built instance could not be stored.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What [`prepare_datasets`] achieved.
#[derive(Debug, Default)]
pub struct PreparationSummary {
    /// Identifiers saved to the store, in input order.
    pub saved: Vec<DatasetId>,
    /// Per-dataset failures, in input order.
    pub failures: Vec<PreparationFailure>,
}

impl PreparationSummary {
    /// Whether every dataset was prepared.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Parse `raw_text`, build an instance per dataset and save it to `store`.
///
/// A failing dataset is logged and recorded in the summary; the remaining
/// datasets are still prepared.
///
/// # Examples
///
/// ```
/// use cvrp_core::{DatasetId, InstanceStore, MemoryInstanceStore, Precision, prepare_datasets};
///
/// let raw = "Data set #1\n\
///            Vehicle locations :0,0;\n\
///            Target locations :3,4\n\
///            Weights = 2\n\
///            Data set #2\n\
///            Vehicle locations :0,0;\n\
///            Target locations :3,4\n\
///            Weights = x\n";
/// let mut store = MemoryInstanceStore::default();
/// let summary = prepare_datasets(raw, Precision::UNIT, &mut store);
///
/// assert_eq!(summary.saved, vec![DatasetId(1)]);
/// assert_eq!(summary.failures.len(), 1);
/// assert!(store.load(DatasetId(1)).is_ok_and(|found| found.is_some()));
/// ```
pub fn prepare_datasets(
    raw_text: &str,
    precision: Precision,
    store: &mut dyn InstanceStore,
) -> PreparationSummary {
    let mut summary = PreparationSummary::default();
    for block in parse_records(raw_text) {
        let result = block.map_err(PreparationFailure::from).and_then(|dataset| {
            let id = dataset.id;
            let instance = dataset
                .build(precision)
                .map_err(|source| PreparationFailure::Build { id, source })?;
            store.save(id, &instance)?;
            Ok(id)
        });
        match result {
            Ok(id) => summary.saved.push(id),
            Err(failure) => {
                log::warn!("skipping dataset: {failure}");
                summary.failures.push(failure);
            }
        }
    }
    log::info!(
        "prepared {} datasets, {} failed",
        summary.saved.len(),
        summary.failures.len()
    );
    summary
}
