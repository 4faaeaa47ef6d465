//! Reading finalized VOD artifacts.
//!
//! An artifact is a flat byte file addressed in fixed-size chunks: chunk
//! `id` covers bytes `id * chunk_size .. (id + 1) * chunk_size`, with the
//! final chunk allowed to run short. [`ChunkedArtifact`] exposes positional
//! chunk reads for serving, [`ChunkFileReader`] walks every chunk in order,
//! and [`ChunkedArtifact::inspect`] recomputes the Merkle root for
//! integrity checks against a published hash.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use swiftlet_core::{to_hex, ChunkId, CoreError, HashAlgorithm, MerkleTree};

use crate::error::{Result, VodError};

/// Path of the companion build log: the artifact path with `.log` appended.
pub fn companion_log_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".log");
    PathBuf::from(os)
}

/// Summary produced by [`ChunkedArtifact::inspect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactInfo {
    /// Total file size in bytes.
    pub file_len: u64,
    /// Chunk size the artifact was addressed with.
    pub chunk_size: usize,
    /// Number of chunks (the last one may be short).
    pub chunk_count: u64,
    /// Length of the final chunk in bytes.
    pub last_chunk_len: usize,
    /// Algorithm used for the root below.
    pub algorithm: HashAlgorithm,
    /// Merkle root over the chunked file.
    pub root_hash: Vec<u8>,
}

impl ArtifactInfo {
    /// Root hash as lowercase hex.
    pub fn root_hex(&self) -> String {
        to_hex(&self.root_hash)
    }
}

/// Chunk-addressed view of an artifact file on disk.
///
/// Keeps a buffered handle to the file so chunks can be served on demand
/// without re-opening it per request.
pub struct ChunkedArtifact {
    path: PathBuf,
    chunk_size: usize,
    file_len: u64,
    inner: BufReader<File>,
}

impl ChunkedArtifact {
    /// Open an artifact for chunk-addressed reads.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidChunkSize`] for a zero chunk size, or
    /// the I/O error if the file cannot be opened.
    pub fn open(path: &Path, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(CoreError::InvalidChunkSize(chunk_size).into());
        }
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        tracing::debug!(
            path = %path.display(),
            len = file_len,
            chunk_size,
            "opened artifact"
        );
        Ok(Self {
            path: path.to_path_buf(),
            chunk_size,
            file_len,
            inner: BufReader::new(file),
        })
    }

    /// Total file size in bytes.
    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    /// Chunk size this view was opened with.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of chunks in the artifact.
    pub fn chunk_count(&self) -> u64 {
        self.file_len.div_ceil(self.chunk_size as u64)
    }

    /// Length of the final chunk, `chunk_size` when the file divides evenly.
    pub fn last_chunk_len(&self) -> usize {
        if self.file_len == 0 {
            return 0;
        }
        match (self.file_len % self.chunk_size as u64) as usize {
            0 => self.chunk_size,
            rem => rem,
        }
    }

    /// Read the chunk with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`VodError::ChunkOutOfRange`] when `id` is past the end of
    /// the file.
    pub fn read_chunk(&mut self, id: ChunkId) -> Result<Vec<u8>> {
        let total = self.chunk_count();
        if id >= total {
            return Err(VodError::ChunkOutOfRange { id, total });
        }
        let offset = id * self.chunk_size as u64;
        let len = std::cmp::min(self.chunk_size as u64, self.file_len - offset) as usize;

        self.inner.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Iterate over every chunk in ascending id order.
    ///
    /// Opens a fresh handle so iteration does not disturb positional reads
    /// on this view.
    pub fn chunks(&self) -> Result<ChunkFileReader> {
        ChunkFileReader::open(&self.path, self.chunk_size)
    }

    /// Recompute the Merkle tree over the file contents.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyInput`] for an empty file.
    pub fn hash_tree(&self, algorithm: HashAlgorithm) -> Result<MerkleTree> {
        Ok(MerkleTree::from_file(algorithm, &self.path, self.chunk_size)?)
    }

    /// Hash the file and collect its structural facts.
    pub fn inspect(&self, algorithm: HashAlgorithm) -> Result<ArtifactInfo> {
        let tree = self.hash_tree(algorithm)?;
        Ok(ArtifactInfo {
            file_len: self.file_len,
            chunk_size: self.chunk_size,
            chunk_count: self.chunk_count(),
            last_chunk_len: self.last_chunk_len(),
            algorithm,
            root_hash: tree.root().to_vec(),
        })
    }

    /// Read the companion build log, if one exists next to the artifact.
    pub fn read_companion_log(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(companion_log_path(&self.path)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl fmt::Debug for ChunkedArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkedArtifact")
            .field("path", &self.path)
            .field("chunk_size", &self.chunk_size)
            .field("file_len", &self.file_len)
            .finish_non_exhaustive()
    }
}

/// Sequential reader yielding `(id, bytes)` for every chunk of a file.
pub struct ChunkFileReader {
    inner: BufReader<File>,
    chunk_size: usize,
    next_id: ChunkId,
    done: bool,
}

impl ChunkFileReader {
    /// Open `path` for a full sequential chunk walk.
    pub fn open(path: &Path, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(CoreError::InvalidChunkSize(chunk_size).into());
        }
        Ok(Self {
            inner: BufReader::new(File::open(path)?),
            chunk_size,
            next_id: 0,
            done: false,
        })
    }

    /// Fill up to one chunk from the reader, retrying on interruption.
    fn read_block(&mut self) -> std::io::Result<Vec<u8>> {
        let mut block = vec![0u8; self.chunk_size];
        let mut filled = 0;
        while filled < block.len() {
            match self.inner.read(&mut block[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        block.truncate(filled);
        Ok(block)
    }
}

impl Iterator for ChunkFileReader {
    type Item = Result<(ChunkId, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_block() {
            Ok(block) if block.is_empty() => {
                self.done = true;
                None
            }
            Ok(block) => {
                if block.len() < self.chunk_size {
                    self.done = true;
                }
                let id = self.next_id;
                self.next_id += 1;
                Some(Ok((id, block)))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e.into()))
            }
        }
    }
}
