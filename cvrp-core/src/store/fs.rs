//! JSON-file instance cache.

use camino::{Utf8Path, Utf8PathBuf};

use super::{InstanceStore, StoreError};
use crate::{DatasetId, Instance};

/// [`InstanceStore`] keeping one `dataset_<id>.json` file per dataset.
///
/// The cache directory is created on the first write. Records are written to
/// a staging file and renamed into place, so readers never observe a
/// truncated record.
///
/// # Examples
///
/// ```no_run
/// use cvrp_core::{DatasetId, FsInstanceStore, InstanceStore};
///
/// # fn main() -> Result<(), cvrp_core::StoreError> {
/// let store = FsInstanceStore::new("cache");
/// assert_eq!(store.path_for(DatasetId(7)).as_str(), "cache/dataset_7.json");
/// let cached = store.load(DatasetId(7))?;
/// # let _ = cached;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsInstanceStore {
    root: Utf8PathBuf,
}

impl FsInstanceStore {
    /// Use `root` as the cache directory.
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The cache directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Path of the record for `id`.
    #[must_use]
    pub fn path_for(&self, id: DatasetId) -> Utf8PathBuf {
        self.root.join(format!("dataset_{}.json", id.0))
    }
}

impl InstanceStore for FsInstanceStore {
    fn save(&mut self, id: DatasetId, instance: &Instance) -> Result<(), StoreError> {
        let path = self.path_for(id);
        let payload = serde_json::to_vec(instance).map_err(|source| StoreError::Codec {
            id,
            location: path.to_string(),
            source,
        })?;
        cvrp_fs::write_atomically(&path, &payload).map_err(|source| StoreError::Io {
            id,
            location: path.to_string(),
            source,
        })?;
        log::debug!("cached dataset {id} at {path}");
        Ok(())
    }

    fn load(&self, id: DatasetId) -> Result<Option<Instance>, StoreError> {
        let path = self.path_for(id);
        let io_error = |source| StoreError::Io {
            id,
            location: path.to_string(),
            source,
        };
        if !cvrp_fs::file_is_file(&path).map_err(io_error)? {
            return Ok(None);
        }
        let payload = cvrp_fs::read_utf8_file(&path).map_err(io_error)?;
        let instance = serde_json::from_str(&payload).map_err(|source| StoreError::Codec {
            id,
            location: path.to_string(),
            source,
        })?;
        Ok(Some(instance))
    }
}
