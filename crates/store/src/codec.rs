//! On-disk layout of the vector index.
//!
//! A fixed magic preamble, then one bincode-encoded [`IndexFile`]. The
//! dimension is recorded in the file so a store opened against it can
//! refuse vectors of the wrong width before anything is compared.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// File preamble identifying a donorec vector index.
const MAGIC: &[u8; 4] = b"DVX1";

/// Bump when the encoded `IndexFile` layout changes.
pub(crate) const INDEX_VERSION: u16 = 1;

/// Everything the index persists between processes.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct IndexFile {
    pub version: u16,
    pub dimension: u32,
    /// Sorted by id before writing so identical contents produce
    /// identical bytes.
    pub entries: Vec<(i64, Vec<f32>)>,
}

impl IndexFile {
    pub(crate) fn empty(dimension: usize) -> Self {
        Self {
            version: INDEX_VERSION,
            dimension: dimension as u32,
            entries: Vec::new(),
        }
    }
}

/// Decode the index at `path`.
pub(crate) fn read(path: &Path) -> Result<IndexFile, StoreError> {
    let bytes = fs::read(path)?;
    let payload = bytes
        .strip_prefix(MAGIC.as_slice())
        .ok_or_else(|| StoreError::Corrupt("missing index magic".into()))?;
    let (file, consumed): (IndexFile, usize) = decode_from_slice(payload, standard())
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;
    if consumed != payload.len() {
        return Err(StoreError::Corrupt("trailing bytes after index".into()));
    }
    if file.version != INDEX_VERSION {
        return Err(StoreError::Corrupt(format!(
            "unsupported index version {}",
            file.version
        )));
    }
    Ok(file)
}

/// Encode `index` and atomically replace the file at `path`.
///
/// The bytes go to a sibling temp file first, get fsynced, and are then
/// renamed over `path`, so a crash mid-write leaves either the old index
/// or the new one, never a torn file.
pub(crate) fn write_atomic(path: &Path, index: &IndexFile) -> Result<u64, StoreError> {
    let encoded =
        encode_to_vec(index, standard()).map_err(|e| StoreError::Corrupt(e.to_string()))?;

    let tmp_path = {
        let mut name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "index".into());
        name.push(".tmp");
        path.with_file_name(name)
    };

    {
        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(MAGIC)?;
        tmp.write_all(&encoded)?;
        tmp.sync_all()?;
    }
    if let Err(err) = fs::rename(&tmp_path, path) {
        // Best effort; the interesting error is the rename failure.
        let _ = fs::remove_file(&tmp_path);
        return Err(err.into());
    }
    Ok((MAGIC.len() + encoded.len()) as u64)
}
