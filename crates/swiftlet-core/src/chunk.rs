//! Chunk identity and the in-memory content-addressed chunk store.
//!
//! Chunks are fixed-size byte blocks addressed by a monotonically
//! increasing integer id (the last chunk of a stream may be shorter).
//! Within a store the id is the identity; digests are a derived integrity
//! attribute, never a key. Stored chunks are write-once: re-delivery of
//! identical bytes is a no-op, a mismatch is a conflict.
//!
//! # Examples
//!
//! ```
//! use swiftlet_core::chunk::ChunkStore;
//!
//! let store = ChunkStore::new();
//! store.put(0, vec![1, 2, 3]).unwrap();
//! assert_eq!(store.chunk(0), Some(vec![1, 2, 3]));
//! assert_eq!(store.chunk(7), None);
//! ```

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::error::{CoreError, Result};

/// Position of a chunk in the content's linear order.
pub type ChunkId = u64;

/// Gap-tolerant read access to stored chunks.
///
/// This is the only capability the live reconstruction path needs from a
/// chunk source: "give me this chunk if it has arrived". Absence is an
/// expected condition, not an error, so the method returns an `Option`.
pub trait ChunkAvailability: Send + Sync {
    /// Bytes of the chunk when present, `None` while it has not arrived.
    fn chunk(&self, id: ChunkId) -> Option<Vec<u8>>;
}

/// Thread-safe in-memory store of content chunks, ordered by id.
///
/// Insertion may happen in any order (the live path receives chunks out of
/// order); retrieval and [`ChunkStore::export`] always observe ascending
/// id order. Concurrent `put` from a receive path and `chunk`/`get` from a
/// reconstruction path are safe.
#[derive(Debug, Default)]
pub struct ChunkStore {
    chunks: Mutex<BTreeMap<ChunkId, Vec<u8>>>,
}

impl ChunkStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a chunk under `id`.
    ///
    /// Re-delivery with byte-identical content is a no-op; swarms routinely
    /// deliver the same chunk twice.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ChunkConflict`] if `id` is already present with
    /// different bytes.
    pub fn put(&self, id: ChunkId, bytes: Vec<u8>) -> Result<()> {
        let mut chunks = self.chunks.lock();
        match chunks.get(&id) {
            Some(existing) if *existing == bytes => Ok(()),
            Some(_) => Err(CoreError::ChunkConflict { id }),
            None => {
                chunks.insert(id, bytes);
                Ok(())
            }
        }
    }

    /// Retrieve a chunk that must be present.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ChunkNotFound`] if `id` is absent. Callers that
    /// expect gaps use [`ChunkStore::chunk`] instead.
    pub fn get(&self, id: ChunkId) -> Result<Vec<u8>> {
        self.chunk(id).ok_or(CoreError::ChunkNotFound { id })
    }

    /// Gap-tolerant retrieval: `None` when the chunk has not arrived.
    pub fn chunk(&self, id: ChunkId) -> Option<Vec<u8>> {
        self.chunks.lock().get(&id).cloned()
    }

    /// Whether a chunk is present.
    pub fn contains(&self, id: ChunkId) -> bool {
        self.chunks.lock().contains_key(&id)
    }

    /// Number of stored chunks.
    pub fn len(&self) -> usize {
        self.chunks.lock().len()
    }

    /// Whether the store holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.lock().is_empty()
    }

    /// Iterate over `(id, bytes)` in ascending id order.
    ///
    /// The id set is snapshotted when called; chunks are fetched one at a
    /// time, so the store is never cloned wholesale. Stored chunks are
    /// write-once, so every snapshotted id is still present when visited.
    pub fn export(&self) -> impl Iterator<Item = (ChunkId, Vec<u8>)> + '_ {
        let ids: Vec<ChunkId> = self.chunks.lock().keys().copied().collect();
        ids.into_iter()
            .filter_map(|id| self.chunk(id).map(|bytes| (id, bytes)))
    }
}

impl ChunkAvailability for ChunkStore {
    fn chunk(&self, id: ChunkId) -> Option<Vec<u8>> {
        ChunkStore::chunk(self, id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_put_and_get_roundtrip() {
        let store = ChunkStore::new();
        store.put(0, vec![1, 2, 3]).unwrap();
        assert_eq!(store.get(0).unwrap(), vec![1, 2, 3]);
        assert!(store.contains(0));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_identical_put_is_noop() {
        let store = ChunkStore::new();
        store.put(4, vec![9, 9]).unwrap();
        store.put(4, vec![9, 9]).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_conflicting_put_rejected() {
        let store = ChunkStore::new();
        store.put(4, vec![9, 9]).unwrap();
        let err = store.put(4, vec![8, 8]).unwrap_err();
        assert!(matches!(err, CoreError::ChunkConflict { id: 4 }));
        // The original bytes survive.
        assert_eq!(store.get(4).unwrap(), vec![9, 9]);
    }

    #[test]
    fn test_get_missing_is_error() {
        let store = ChunkStore::new();
        let err = store.get(11).unwrap_err();
        assert!(matches!(err, CoreError::ChunkNotFound { id: 11 }));
    }

    #[test]
    fn test_chunk_missing_is_none() {
        let store = ChunkStore::new();
        assert_eq!(store.chunk(11), None);
        store.put(11, vec![5]).unwrap();
        assert_eq!(store.chunk(11), Some(vec![5]));
    }

    #[test]
    fn test_export_orders_by_id_regardless_of_insertion() {
        let orders: [&[ChunkId]; 3] = [&[0, 1, 2, 3], &[3, 1, 2, 0], &[2, 0, 3, 1]];
        let mut exports = Vec::new();
        for order in orders {
            let store = ChunkStore::new();
            for &id in order {
                store.put(id, vec![id as u8; 4]).unwrap();
            }
            let exported: Vec<(ChunkId, Vec<u8>)> = store.export().collect();
            exports.push(exported);
        }
        assert_eq!(exports[0], exports[1]);
        assert_eq!(exports[0], exports[2]);
        let ids: Vec<ChunkId> = exports[0].iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_empty_store() {
        let store = ChunkStore::new();
        assert!(store.is_empty());
        assert_eq!(store.export().count(), 0);
    }

    #[test]
    fn test_concurrent_put_and_read() {
        let store = Arc::new(ChunkStore::new());
        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for id in 0..200u64 {
                    store.put(id, vec![(id % 251) as u8; 32]).unwrap();
                }
            })
        };
        let reader = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                let mut seen = 0usize;
                for _ in 0..1000 {
                    for id in 0..200u64 {
                        if store.chunk(id).is_some() {
                            seen += 1;
                        }
                    }
                }
                seen
            })
        };
        writer.join().unwrap();
        reader.join().unwrap();
        assert_eq!(store.len(), 200);
        for id in 0..200u64 {
            assert_eq!(store.get(id).unwrap(), vec![(id % 251) as u8; 32]);
        }
    }

    #[test]
    fn test_availability_through_trait_object() {
        let store: Arc<dyn ChunkAvailability> = Arc::new(ChunkStore::new());
        assert!(store.chunk(0).is_none());
    }
}
