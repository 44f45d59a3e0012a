//! On-disk record store with file locking.
//!
//! Each entity kind lives in its own JSON array file under the store
//! directory. Every operation takes a lock on a sidecar `.lock` file
//! (shared for reads, exclusive for writes) so several processes can use
//! the same directory. Writes replace the collection file atomically.

use crate::store::{Collection, EntityKind, Filter, Record, RecordStore, SortKey, Stored};
use crate::{Error, Result};
use chrono::Utc;
use fs2::FileExt;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// JSON-file backed record store
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `dir`. Nothing touches the disk until the
    /// first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn collection_path(&self, kind: EntityKind) -> PathBuf {
        self.dir.join(format!("{}.json", kind.collection_name()))
    }

    fn lock_path(&self, kind: EntityKind) -> PathBuf {
        self.dir.join(format!("{}.lock", kind.collection_name()))
    }

    fn open_lock(&self, kind: EntityKind) -> Result<File> {
        std::fs::create_dir_all(&self.dir)?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(self.lock_path(kind))?;
        Ok(file)
    }

    /// Load a collection under a shared lock.
    ///
    /// A missing file is an empty collection. A corrupted file is an error:
    /// silently starting over would drop every record on the next write.
    fn read_collection(&self, kind: EntityKind) -> Result<Collection> {
        let path = self.collection_path(kind);
        if !path.exists() {
            return Ok(Collection::default());
        }

        let lock = self.open_lock(kind)?;
        lock.lock_shared()?;
        let loaded = load_collection(&path);
        lock.unlock()?;

        loaded
    }

    /// Load, modify and save a collection under an exclusive lock
    fn with_collection_mut<T, F>(&self, kind: EntityKind, f: F) -> Result<T>
    where
        F: FnOnce(&mut Collection) -> Result<T>,
    {
        let path = self.collection_path(kind);
        let lock = self.open_lock(kind)?;
        lock.lock_exclusive()?;

        let result = (|| -> Result<T> {
            let mut collection = if path.exists() {
                load_collection(&path)?
            } else {
                Collection::default()
            };
            let out = f(&mut collection)?;
            save_collection(&path, &collection)?;
            tracing::debug!(
                "Saved {} {} record(s) to {:?}",
                collection.len(),
                kind,
                path
            );
            Ok(out)
        })();

        lock.unlock()?;
        result
    }
}

fn load_collection(path: &Path) -> Result<Collection> {
    let mut contents = String::new();
    let file = File::open(path)?;
    std::io::BufReader::new(&file).read_to_string(&mut contents)?;

    if contents.trim().is_empty() {
        return Ok(Collection::default());
    }

    serde_json::from_str(&contents).map_err(|e| {
        tracing::warn!("Failed to parse collection {:?}: {}", path, e);
        Error::Json(e)
    })
}

/// Atomically writes a collection by:
/// 1. Writing to a temp file in the same directory
/// 2. Syncing to disk
/// 3. Renaming over the original
fn save_collection(path: &Path, collection: &Collection) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "collection path missing parent")
    })?;
    let temp = NamedTempFile::new_in(parent)?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string(collection)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

impl RecordStore for JsonFileStore {
    fn list<R: Record>(&self) -> Result<Vec<Stored<R>>> {
        self.read_collection(R::KIND)?.list()
    }

    fn filter<R: Record>(&self, filter: &Filter, sort: Option<&SortKey>) -> Result<Vec<Stored<R>>> {
        self.read_collection(R::KIND)?.filter(filter, sort)
    }

    fn get<R: Record>(&self, id: &str) -> Result<Stored<R>> {
        self.read_collection(R::KIND)?.get(id)
    }

    fn bulk_create<R: Record>(&mut self, records: Vec<R>) -> Result<Vec<Stored<R>>> {
        let now = Utc::now();
        self.with_collection_mut(R::KIND, |c| c.insert_all(records, now))
    }

    fn find_or_create<R: Record>(&mut self, filter: &Filter, record: R) -> Result<Stored<R>> {
        let now = Utc::now();
        self.with_collection_mut(R::KIND, |c| {
            if let Some(existing) = c.filter::<R>(filter, None)?.into_iter().next() {
                return Ok(existing);
            }
            c.insert_all(vec![record], now)?
                .pop()
                .ok_or_else(|| Error::Other(format!("{} create returned no record", R::KIND)))
        })
    }

    fn update_versioned<R: Record>(
        &mut self,
        id: &str,
        patch: Value,
        expected_version: Option<u64>,
    ) -> Result<Stored<R>> {
        self.with_collection_mut(R::KIND, |c| c.update(id, patch, expected_version))
    }

    fn delete<R: Record>(&mut self, id: &str) -> Result<()> {
        self.with_collection_mut(R::KIND, |c| c.delete(R::KIND, id))
    }
}
