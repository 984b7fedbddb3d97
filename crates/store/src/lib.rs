//! Donorec organization vector store.
//!
//! Persists `{organization_id -> vector}` pairs in a single index file
//! and answers exact lookups plus brute-force L2 nearest-neighbor
//! queries. Inserts buffer in memory until [`VectorStore::write`] commits
//! them to disk in one atomic replace, so a crash mid-flush leaves the
//! previous index intact and the buffer can simply be retried.
//!
//! The store records its vector dimension in the file; opening an index
//! written at a different dimension fails up front instead of producing
//! nonsense distances later.
//!
//! ```
//! use store::VectorStore;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store = VectorStore::open(dir.path().join("orgvec.idx"), 3).unwrap();
//! store.insert(7, vec![0.1, 0.2, 0.3]).unwrap();
//! store.write().unwrap();
//! assert_eq!(store.nearest(&[0.1, 0.2, 0.3], 5).unwrap(), vec![7]);
//! ```

mod codec;
mod query;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use tracing::debug;

use crate::codec::IndexFile;

/// Errors surfaced by the vector store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A vector (or query) whose length disagrees with the store's
    /// configured dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// Lookup of an organization id that was never indexed.
    #[error("no vector indexed for organization {0}")]
    NotFound(i64),
    /// The index file exists but is not a readable donorec index.
    #[error("index corrupt: {0}")]
    Corrupt(String),
    /// Filesystem failures while reading or flushing the index.
    #[error("index io error: {0}")]
    Io(#[from] std::io::Error),
}

/// On-disk vector index with an in-memory write buffer.
///
/// Reads (`search_vector`, `nearest`) take shared locks and proceed
/// concurrently; flushes serialize on a dedicated mutex so only one
/// writer touches the file at a time.
#[derive(Debug)]
pub struct VectorStore {
    path: PathBuf,
    dimension: usize,
    /// Entries already durable in the index file.
    committed: RwLock<HashMap<i64, Vec<f32>>>,
    /// Inserts not yet flushed. Drained into `committed` on a
    /// successful `write`.
    pending: RwLock<HashMap<i64, Vec<f32>>>,
    flush: Mutex<()>,
}

impl VectorStore {
    /// Open the index at `path`, creating an empty one when absent.
    ///
    /// Fails with [`StoreError::DimensionMismatch`] when an existing
    /// index was written at a different dimension.
    pub fn open(path: impl Into<PathBuf>, dimension: usize) -> Result<Self, StoreError> {
        let path = path.into();
        let committed = if path.exists() {
            let file = codec::read(&path)?;
            if file.dimension as usize != dimension {
                return Err(StoreError::DimensionMismatch {
                    expected: dimension,
                    actual: file.dimension as usize,
                });
            }
            file.entries.into_iter().collect()
        } else {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            codec::write_atomic(&path, &IndexFile::empty(dimension))?;
            HashMap::new()
        };

        Ok(Self {
            path,
            dimension,
            committed: RwLock::new(committed),
            pending: RwLock::new(HashMap::new()),
            flush: Mutex::new(()),
        })
    }

    /// Configured vector dimension `D`.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Path of the backing index file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of distinct indexed ids, flushed or not.
    pub fn len(&self) -> usize {
        let committed = read_lock(&self.committed);
        let pending = read_lock(&self.pending);
        committed.len() + pending.keys().filter(|id| !committed.contains_key(*id)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Buffer an insert (or wholesale replacement) for `id`.
    ///
    /// Nothing reaches disk until [`write`](Self::write); a rejected
    /// vector leaves the store untouched.
    pub fn insert(&self, id: i64, vector: Vec<f32>) -> Result<(), StoreError> {
        self.check_dimension(vector.len())?;
        write_lock(&self.pending).insert(id, vector);
        Ok(())
    }

    /// Flush all buffered inserts to durable storage.
    ///
    /// The merged contents are written to a temp file and renamed over
    /// the index, so the file always holds either the previous or the
    /// new snapshot. On error the buffer is kept for a retry.
    pub fn write(&self) -> Result<(), StoreError> {
        let _flush: MutexGuard<'_, ()> = self.flush.lock().unwrap_or_else(|p| p.into_inner());

        // Holding the pending write lock for the whole flush keeps a
        // concurrent insert from being dropped by the drain below.
        let mut pending = write_lock(&self.pending);
        let snapshot = {
            let committed = read_lock(&self.committed);
            let mut entries: Vec<(i64, Vec<f32>)> = committed
                .iter()
                .filter(|(id, _)| !pending.contains_key(*id))
                .chain(pending.iter())
                .map(|(id, v)| (*id, v.clone()))
                .collect();
            entries.sort_unstable_by_key(|(id, _)| *id);
            IndexFile {
                version: codec::INDEX_VERSION,
                dimension: self.dimension as u32,
                entries,
            }
        };

        let flushed = pending.len();
        let bytes = codec::write_atomic(&self.path, &snapshot)?;

        let mut committed = write_lock(&self.committed);
        for (id, vector) in pending.drain() {
            committed.insert(id, vector);
        }
        debug!(
            entries = snapshot.entries.len(),
            flushed, bytes, "flushed vector index"
        );
        Ok(())
    }

    /// Vector previously inserted for `id`.
    ///
    /// The pending buffer is consulted first, so unflushed inserts are
    /// visible within the process that made them. A fresh `open` of the
    /// same path sees only what was flushed.
    pub fn search_vector(&self, id: i64) -> Result<Vec<f32>, StoreError> {
        if let Some(vector) = read_lock(&self.pending).get(&id) {
            return Ok(vector.clone());
        }
        read_lock(&self.committed)
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn check_dimension(&self, actual: usize) -> Result<(), StoreError> {
        if actual != self.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                actual,
            });
        }
        Ok(())
    }
}

// Lock poisoning only means a panic elsewhere mid-operation; the maps
// themselves stay structurally sound, so recover the guard.
fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|p| p.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|p| p.into_inner())
}
