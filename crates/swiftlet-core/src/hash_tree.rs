//! Binary Merkle hash tree over a chunked content stream.
//!
//! Each chunk of content is hashed to form a leaf, and parent nodes are
//! computed by hashing the concatenation of their children's digests. When
//! a level holds an odd number of nodes, the lone node is promoted
//! unchanged to the next level (no zero padding), matching the unbalanced
//! tree convention used by PPSPP-style swarms. The root digest is a pure
//! function of the ordered chunk contents.
//!
//! # Examples
//!
//! ```
//! use swiftlet_core::hash_tree::{HashAlgorithm, MerkleTree};
//!
//! let chunks: Vec<Vec<u8>> = vec![vec![1u8; 64], vec![2u8; 64]];
//! let tree = MerkleTree::build(HashAlgorithm::Sha1, &chunks).unwrap();
//! assert_eq!(tree.root().len(), 20);
//!
//! let path = tree.auth_path(0).unwrap();
//! assert!(MerkleTree::verify_chunk(HashAlgorithm::Sha1, &chunks[0], &path, tree.root()).unwrap());
//! ```

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use sha2::Sha256;

use crate::error::{CoreError, Result};

/// Hash algorithm used for leaves and interior nodes, fixed per tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-1, 20-byte digests. The swarm protocol default.
    #[default]
    Sha1,
    /// SHA-256, 32-byte digests.
    Sha256,
}

impl HashAlgorithm {
    /// Digest width in bytes.
    pub const fn digest_len(self) -> usize {
        match self {
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 => 32,
        }
    }

    /// Hash a chunk into a leaf digest.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
        }
    }

    /// Compute a parent digest from two child digests: `hash(left || right)`.
    pub fn digest_pair(self, left: &[u8], right: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha1 => {
                let mut hasher = Sha1::new();
                hasher.update(left);
                hasher.update(right);
                hasher.finalize().to_vec()
            }
            HashAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(left);
                hasher.update(right);
                hasher.finalize().to_vec()
            }
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Sha1 => write!(f, "sha1"),
            HashAlgorithm::Sha256 => write!(f, "sha256"),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(HashAlgorithm::Sha1),
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            other => Err(CoreError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// An authentication path for a single chunk.
///
/// Contains the sibling digests along the path from the leaf to the root.
/// Each entry is `(digest, is_left)` where `is_left` indicates whether the
/// sibling sits on the left side of the parent computation. Levels where
/// the running node was promoted (no partner) contribute no entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPath {
    /// Id of the chunk this path authenticates.
    pub chunk_id: u64,
    /// Sibling digests from leaf level upward.
    pub siblings: Vec<(Vec<u8>, bool)>,
}

/// A binary Merkle hash tree with every level materialized.
///
/// Built once per finalized chunk sequence; retaining the levels lets a
/// seeder issue an [`AuthPath`] for any chunk it announces. Verification
/// against a known root needs only [`MerkleTree::verify_chunk`], not the
/// tree itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerkleTree {
    algorithm: HashAlgorithm,
    /// `levels[0]` holds the leaf digests; the last level holds the root.
    levels: Vec<Vec<Vec<u8>>>,
}

impl MerkleTree {
    /// Build a tree over an ordered, in-memory chunk sequence.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyInput`] if `chunks` yields nothing.
    pub fn build<I>(algorithm: HashAlgorithm, chunks: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let leaves: Vec<Vec<u8>> = chunks
            .into_iter()
            .map(|chunk| algorithm.digest(chunk.as_ref()))
            .collect();
        if leaves.is_empty() {
            return Err(CoreError::EmptyInput);
        }
        Ok(Self::from_leaves(algorithm, leaves))
    }

    /// Build a tree by streaming a file in fixed-size reads of
    /// `chunk_size` bytes (the last read may be short).
    ///
    /// Only the digest levels are held in memory, never the file itself.
    /// This is the production mode for hashing finalized VOD artifacts.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidChunkSize`] if `chunk_size` is zero and
    /// [`CoreError::EmptyInput`] if the file is empty.
    pub fn from_file<P: AsRef<Path>>(
        algorithm: HashAlgorithm,
        path: P,
        chunk_size: usize,
    ) -> Result<Self> {
        if chunk_size == 0 {
            return Err(CoreError::InvalidChunkSize(0));
        }

        let mut file = File::open(path)?;
        let mut leaves = Vec::new();
        loop {
            let block = read_block(&mut file, chunk_size)?;
            if block.is_empty() {
                break;
            }
            let short = block.len() < chunk_size;
            leaves.push(algorithm.digest(&block));
            if short {
                break;
            }
        }

        if leaves.is_empty() {
            return Err(CoreError::EmptyInput);
        }
        Ok(Self::from_leaves(algorithm, leaves))
    }

    /// Pair-and-promote the leaf level up to a single root.
    fn from_leaves(algorithm: HashAlgorithm, leaves: Vec<Vec<u8>>) -> Self {
        debug_assert!(!leaves.is_empty());
        let mut levels = vec![leaves];

        while levels[levels.len() - 1].len() > 1 {
            let prev = &levels[levels.len() - 1];
            let mut next = Vec::with_capacity(prev.len().div_ceil(2));

            let mut i = 0;
            while i < prev.len() {
                if i + 1 < prev.len() {
                    next.push(algorithm.digest_pair(&prev[i], &prev[i + 1]));
                    i += 2;
                } else {
                    // Odd node out — promote to next level
                    next.push(prev[i].clone());
                    i += 1;
                }
            }

            levels.push(next);
        }

        Self { algorithm, levels }
    }

    /// Root digest of the tree.
    pub fn root(&self) -> &[u8] {
        &self.levels[self.levels.len() - 1][0]
    }

    /// Hash algorithm the tree was built with.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Number of leaf digests (chunks) in the tree.
    pub fn leaf_count(&self) -> u64 {
        self.levels[0].len() as u64
    }

    /// Generate an authentication path for the chunk at `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ChunkOutOfRange`] if `id >= leaf_count()`.
    pub fn auth_path(&self, id: u64) -> Result<AuthPath> {
        let total = self.leaf_count();
        if id >= total {
            return Err(CoreError::ChunkOutOfRange { id, total });
        }

        // Walk upward one level at a time. A node at position `p` always
        // has its parent at `p / 2`, whether it was paired or promoted.
        let mut pos = id as usize;
        let mut siblings = Vec::new();
        for level in &self.levels[..self.levels.len() - 1] {
            if pos % 2 == 0 {
                if pos + 1 < level.len() {
                    siblings.push((level[pos + 1].clone(), false));
                }
                // else: lone node, promoted without a sibling
            } else {
                siblings.push((level[pos - 1].clone(), true));
            }
            pos /= 2;
        }

        Ok(AuthPath {
            chunk_id: id,
            siblings,
        })
    }

    /// Verify chunk bytes against a known root via an authentication path.
    ///
    /// Recomputes ancestor digests from the chunk upward and compares the
    /// result with `root`. A path that does not fold to `root` — wrong
    /// sibling order, flipped sides, truncated or overlong — yields
    /// `Ok(false)`, never an error.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyInput`] for empty chunk bytes and
    /// [`CoreError::AlgorithmMismatch`] when `root` or any sibling digest
    /// has a width other than `algorithm` produces, which indicates digests
    /// from a differently configured tree were mixed in.
    pub fn verify_chunk(
        algorithm: HashAlgorithm,
        chunk: &[u8],
        path: &AuthPath,
        root: &[u8],
    ) -> Result<bool> {
        if chunk.is_empty() {
            return Err(CoreError::EmptyInput);
        }
        let expected = algorithm.digest_len();
        if root.len() != expected {
            return Err(CoreError::AlgorithmMismatch {
                expected,
                got: root.len(),
            });
        }

        let mut current = algorithm.digest(chunk);
        for (sibling, is_left) in &path.siblings {
            if sibling.len() != expected {
                return Err(CoreError::AlgorithmMismatch {
                    expected,
                    got: sibling.len(),
                });
            }
            current = if *is_left {
                algorithm.digest_pair(sibling, &current)
            } else {
                algorithm.digest_pair(&current, sibling)
            };
        }

        Ok(current.as_slice() == root)
    }
}

/// Encode a digest as a lowercase hex string.
pub fn to_hex(digest: &[u8]) -> String {
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

/// Read up to `size` bytes, returning a short block only at end of file.
fn read_block(file: &mut impl Read, size: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; size];
    let mut filled = 0;
    while filled < size {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    buf.truncate(filled);
    Ok(buf)
}
