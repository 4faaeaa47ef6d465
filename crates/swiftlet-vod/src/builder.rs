//! Offline VOD artifact builder.
//!
//! The builder uses the same two-step shape as the live send path: append
//! application frames, each encoded and length-prefixed, then split the
//! growing byte stream into fixed-size chunks with sequentially increasing
//! ids. [`ContentBuilder::finalize`] streams the chunks to disk in id
//! order, hashes the persisted file into a Merkle root, and appends a
//! companion text log next to the artifact.
//!
//! Given the same ordered frame sequence and chunk size, the output file
//! and root hash are bit-for-bit reproducible.
//!
//! # Example
//!
//! ```rust,no_run
//! use swiftlet_core::{AvFrame, EngineConfig};
//! use swiftlet_vod::ContentBuilder;
//!
//! let mut builder = ContentBuilder::new(&EngineConfig::default()).unwrap();
//! builder.append_frame(&AvFrame { seq: 1, video: vec![0; 640], audio: vec![0; 160] }).unwrap();
//! let summary = builder.finalize(std::path::Path::new("demo.dat")).unwrap();
//! println!("{} chunks, root {}", summary.total_chunks, summary.root_hex());
//! ```

use std::fmt;
use std::io::Write;
use std::path::Path;

use swiftlet_core::{
    to_hex, AvFrame, AvFrameCodec, ChunkId, ChunkStore, CoreError, EngineConfig, FrameCodec,
    Framer, HashAlgorithm, MerkleTree,
};

use crate::artifact::companion_log_path;
use crate::error::Result;

/// Result of a finalized build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    /// Frames appended over the builder's lifetime.
    pub total_frames: u64,
    /// Chunks written to the artifact.
    pub total_chunks: u64,
    /// Merkle root of the persisted file.
    pub root_hash: Vec<u8>,
}

impl BuildSummary {
    /// Root hash as lowercase hex.
    pub fn root_hex(&self) -> String {
        to_hex(&self.root_hash)
    }
}

/// Deterministic batch producer of a chunked artifact plus its root hash.
pub struct ContentBuilder {
    chunk_size: usize,
    algorithm: HashAlgorithm,
    codec: Box<dyn FrameCodec>,
    store: ChunkStore,
    pending: Vec<u8>,
    next_id: ChunkId,
    total_frames: u64,
}

impl ContentBuilder {
    /// Create a builder for the given configuration, using the default
    /// frame codec.
    ///
    /// # Errors
    ///
    /// Returns the validation error for an unusable configuration.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            chunk_size: config.chunk_size,
            algorithm: config.hash_algorithm,
            codec: Box::new(AvFrameCodec),
            store: ChunkStore::new(),
            pending: Vec::new(),
            next_id: 0,
            total_frames: 0,
        })
    }

    /// Replace the frame codec. Must happen before the first append.
    pub fn with_codec(mut self, codec: Box<dyn FrameCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Encode and length-prefix one frame, draining every complete
    /// `chunk_size` block into the store.
    ///
    /// # Errors
    ///
    /// Returns the codec's error if the frame cannot be encoded, or a
    /// framing error if the encoded frame exceeds the maximum record size.
    pub fn append_frame(&mut self, frame: &AvFrame) -> Result<()> {
        let payload = self.codec.encode(frame)?;
        let record = Framer::encode_record(&payload)?;
        self.pending.extend_from_slice(&record);
        self.total_frames += 1;

        while self.pending.len() >= self.chunk_size {
            let rest = self.pending.split_off(self.chunk_size);
            let block = std::mem::replace(&mut self.pending, rest);
            self.store.put(self.next_id, block)?;
            self.next_id += 1;
        }
        Ok(())
    }

    /// Frames appended so far.
    pub fn frame_count(&self) -> u64 {
        self.total_frames
    }

    /// Complete chunks stored so far (a trailing partial chunk is not
    /// counted until [`ContentBuilder::finalize`] flushes it).
    pub fn chunk_count(&self) -> u64 {
        self.next_id
    }

    /// Write the artifact to `path`, compute its root hash, and append the
    /// companion log.
    ///
    /// Chunks stream to disk in ascending id order; the root is then
    /// recomputed from the persisted file with the same chunk size, so the
    /// hash covers exactly what readers will see.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyInput`] if no frame was ever appended,
    /// or the underlying I/O error.
    pub fn finalize(mut self, path: &Path) -> Result<BuildSummary> {
        tracing::info!(
            path = %path.display(),
            frames = self.total_frames,
            "finalizing VOD artifact"
        );

        if !self.pending.is_empty() {
            let block = std::mem::take(&mut self.pending);
            self.store.put(self.next_id, block)?;
            self.next_id += 1;
        }
        if self.store.is_empty() {
            return Err(CoreError::EmptyInput.into());
        }

        let total_chunks = self.store.len() as u64;
        let file = std::fs::File::create(path)?;
        let mut writer = std::io::BufWriter::new(file);
        for (id, bytes) in self.store.export() {
            writer.write_all(&bytes)?;
            if id % 1000 == 0 {
                tracing::info!(chunk = id, total = total_chunks, "wrote chunk");
            }
        }
        writer.flush()?;

        tracing::debug!("computing Merkle root over persisted artifact");
        let tree = MerkleTree::from_file(self.algorithm, path, self.chunk_size)?;
        let root_hash = tree.root().to_vec();

        self.append_companion_log(path, total_chunks, &root_hash)?;

        tracing::info!(
            root = %to_hex(&root_hash),
            chunks = total_chunks,
            "VOD artifact finalized"
        );

        Ok(BuildSummary {
            total_frames: self.total_frames,
            total_chunks,
            root_hash,
        })
    }

    /// Append the build record to `<artifact>.log`.
    fn append_companion_log(&self, path: &Path, total_chunks: u64, root: &[u8]) -> Result<()> {
        let log_path = companion_log_path(path);
        let mut log = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;
        writeln!(log, "Filename: {}", path.display())?;
        writeln!(log, "Total frames: {}", self.total_frames)?;
        writeln!(log, "Total chunks: {total_chunks}")?;
        writeln!(log, "Merkle hash: {}", to_hex(root))?;
        Ok(())
    }
}

impl fmt::Debug for ContentBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentBuilder")
            .field("chunk_size", &self.chunk_size)
            .field("algorithm", &self.algorithm)
            .field("frames", &self.total_frames)
            .field("complete_chunks", &self.next_id)
            .field("pending_bytes", &self.pending.len())
            .finish_non_exhaustive()
    }
}
