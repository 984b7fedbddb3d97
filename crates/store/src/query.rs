//! Nearest-neighbor queries over the store.
//!
//! Brute-force L2 scan is the reference semantics: exact, deterministic,
//! and fast enough for corpora in the thousands. An approximate index
//! can replace the scan later as long as recall against this behavior
//! holds up.

use std::cmp::Ordering;

use crate::{read_lock, StoreError, VectorStore};

impl VectorStore {
    /// Ids of up to `num_closest` vectors nearest to `query` under L2
    /// distance, nearest first. Ties break by ascending id so repeated
    /// queries return the same order. When fewer vectors are indexed,
    /// all of them come back.
    pub fn nearest(&self, query: &[f32], num_closest: usize) -> Result<Vec<i64>, StoreError> {
        if query.len() != self.dimension() {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension(),
                actual: query.len(),
            });
        }
        if num_closest == 0 {
            return Ok(Vec::new());
        }

        let pending = read_lock(&self.pending);
        let committed = read_lock(&self.committed);
        let mut scored: Vec<(f32, i64)> = committed
            .iter()
            .filter(|(id, _)| !pending.contains_key(*id))
            .chain(pending.iter())
            .map(|(id, vector)| (l2_distance(query, vector), *id))
            .collect();
        drop(committed);
        drop(pending);

        scored.sort_unstable_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.1.cmp(&b.1))
        });
        scored.truncate(num_closest);
        Ok(scored.into_iter().map(|(_, id)| id).collect())
    }
}

/// Euclidean distance between two equal-length vectors.
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_store(dir: &tempfile::TempDir, entries: &[(i64, [f32; 3])]) -> VectorStore {
        let store = VectorStore::open(dir.path().join("orgvec.idx"), 3).expect("open store");
        for (id, vector) in entries {
            store.insert(*id, vector.to_vec()).expect("seed vector");
        }
        store.write().expect("flush seeds");
        store
    }

    #[test]
    fn results_ordered_by_distance() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(
            &dir,
            &[
                (1, [10.0, 10.0, 10.0]),
                (2, [1.0, 1.0, 1.0]),
                (3, [0.0, 0.0, 0.0]),
            ],
        );

        let hits = store.nearest(&[0.0, 0.0, 0.0], 3).unwrap();
        assert_eq!(hits, vec![3, 2, 1]);

        let ranked: Vec<f32> = hits
            .iter()
            .map(|id| l2_distance(&[0.0, 0.0, 0.0], &store.search_vector(*id).unwrap()))
            .collect();
        assert!(ranked.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn ties_break_by_ascending_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(
            &dir,
            &[
                (9, [1.0, 0.0, 0.0]),
                (3, [0.0, 1.0, 0.0]),
                (5, [0.0, 0.0, 1.0]),
            ],
        );

        // All three are exactly distance 1 from the origin.
        let hits = store.nearest(&[0.0, 0.0, 0.0], 3).unwrap();
        assert_eq!(hits, vec![3, 5, 9]);
    }

    #[test]
    fn oversized_k_returns_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&dir, &[(1, [0.0, 0.0, 0.0]), (2, [1.0, 1.0, 1.0])]);

        let hits = store.nearest(&[0.5, 0.5, 0.5], 100).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn zero_k_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&dir, &[(1, [0.0, 0.0, 0.0])]);
        assert!(store.nearest(&[0.0, 0.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn empty_store_returns_no_hits() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::open(dir.path().join("orgvec.idx"), 3).unwrap();
        assert!(store.nearest(&[0.0, 0.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn wrong_length_query_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&dir, &[(1, [0.0, 0.0, 0.0])]);

        let err = store.nearest(&[0.0, 0.0], 1).unwrap_err();
        assert!(matches!(
            err,
            StoreError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn unflushed_inserts_participate_in_search() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&dir, &[(1, [5.0, 5.0, 5.0])]);
        store.insert(2, vec![0.1, 0.1, 0.1]).unwrap();

        let hits = store.nearest(&[0.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(hits, vec![2, 1]);
    }

    #[test]
    fn pending_value_shadows_committed_in_search() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&dir, &[(1, [0.0, 0.0, 0.0]), (2, [0.5, 0.5, 0.5])]);
        // Move org 1 far away without flushing; it must rank by the new value.
        store.insert(1, vec![50.0, 50.0, 50.0]).unwrap();

        let hits = store.nearest(&[0.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(hits, vec![2, 1]);
    }

    #[test]
    fn l2_distance_matches_hand_computation() {
        assert_eq!(l2_distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
        assert_eq!(l2_distance(&[1.0, 1.0], &[1.0, 1.0]), 0.0);
    }
}
