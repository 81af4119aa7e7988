//! Persistence for prepared instances.
//!
//! Preparation and solving usually run as separate steps, so built
//! [`Instance`] values are kept in an [`InstanceStore`] keyed by their
//! [`DatasetId`]. The store is an explicit handle passed to whoever needs it.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::{DatasetId, Instance};

#[cfg(feature = "store-fs")]
mod fs;

#[cfg(feature = "store-fs")]
pub use fs::FsInstanceStore;

/// Errors raised by [`InstanceStore`] implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing medium failed.
    #[error("failed to access cached dataset {id} at {location}: {source}")]
    Io {
        /// Dataset being accessed.
        id: DatasetId,
        /// Human-readable location of the record.
        location: String,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// A record could not be encoded or decoded.
    #[cfg(feature = "serde")]
    #[error("cached dataset {id} at {location} is not a valid instance: {source}")]
    Codec {
        /// Dataset being accessed.
        id: DatasetId,
        /// Human-readable location of the record.
        location: String,
        /// Underlying JSON failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Keyed storage for built instances.
///
/// Saving under an existing identifier replaces the earlier instance.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use cvrp_core::{DatasetId, InstanceStore, MemoryInstanceStore, Precision, build_instance};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let instance = build_instance(&[Coord { x: 0, y: 0 }], &[], &[], Precision::UNIT)?;
/// let mut store = MemoryInstanceStore::default();
/// store.save(DatasetId(1), &instance)?;
///
/// assert_eq!(store.load(DatasetId(1))?, Some(instance));
/// assert_eq!(store.load(DatasetId(2))?, None);
/// # Ok(())
/// # }
/// ```
pub trait InstanceStore {
    /// Persist `instance` under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing medium rejects the write.
    fn save(&mut self, id: DatasetId, instance: &Instance) -> Result<(), StoreError>;

    /// Fetch the instance stored under `id`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when a stored record exists but cannot be read.
    fn load(&self, id: DatasetId) -> Result<Option<Instance>, StoreError>;
}

/// Process-local [`InstanceStore`] backed by an ordered map.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryInstanceStore {
    instances: BTreeMap<DatasetId, Instance>,
}

impl MemoryInstanceStore {
    /// Identifiers currently stored, in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = DatasetId> + '_ {
        self.instances.keys().copied()
    }

    /// Number of stored instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl InstanceStore for MemoryInstanceStore {
    fn save(&mut self, id: DatasetId, instance: &Instance) -> Result<(), StoreError> {
        self.instances.insert(id, instance.clone());
        Ok(())
    }

    fn load(&self, id: DatasetId) -> Result<Option<Instance>, StoreError> {
        Ok(self.instances.get(&id).cloned())
    }
}
