//! Error types for the core engine primitives.

use thiserror::Error;

/// Errors that can occur in the chunk store, hash tree, and framing layers.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Attempted to build a hash tree from an empty chunk sequence, or to
    /// verify an empty chunk.
    #[error("input is empty, cannot build or verify a hash tree")]
    EmptyInput,

    /// Invalid chunk size (must be greater than zero).
    #[error("invalid chunk size: {0} (must be > 0)")]
    InvalidChunkSize(usize),

    /// Invalid frame rate (must be a positive, finite number).
    #[error("invalid frame rate: {0} Hz (must be > 0)")]
    InvalidFrameRate(f64),

    /// Unrecognized hash algorithm name.
    #[error("unknown hash algorithm: {0} (expected sha1 or sha256)")]
    UnknownAlgorithm(String),

    /// A digest of the wrong width was supplied, i.e. it was produced by a
    /// different hash algorithm than the tree is configured with.
    #[error("digest is {got} bytes, expected {expected} for the configured algorithm")]
    AlgorithmMismatch {
        /// Digest width the configured algorithm produces.
        expected: usize,
        /// Digest width actually supplied.
        got: usize,
    },

    /// Chunk id is out of range for the given tree.
    #[error("chunk id {id} out of range (total: {total})")]
    ChunkOutOfRange {
        /// The requested chunk id.
        id: u64,
        /// The total number of chunks in the tree.
        total: u64,
    },

    /// A chunk id was stored twice with different contents.
    #[error("chunk {id} already stored with different contents")]
    ChunkConflict {
        /// The conflicting chunk id.
        id: u64,
    },

    /// A chunk was requested in strict mode but is not present.
    #[error("chunk {id} not found in store")]
    ChunkNotFound {
        /// The missing chunk id.
        id: u64,
    },

    /// A record length prefix exceeded the maximum record size. The byte
    /// stream is corrupt; the session owner decides whether to reset.
    #[error("record length {len} exceeds maximum {max} bytes")]
    RecordTooLarge {
        /// Length declared by the prefix.
        len: usize,
        /// Configured maximum record length.
        max: usize,
    },

    /// A record length prefix declared a zero-length record.
    #[error("zero-length record in stream")]
    ZeroLengthRecord,

    /// A frame payload's length disagrees with its declared field lengths.
    #[error("frame payload length mismatch: expected {expected} bytes, got {got}")]
    FrameLengthMismatch {
        /// Bytes the frame header declared.
        expected: usize,
        /// Bytes actually present.
        got: usize,
    },

    /// A frame payload is too long to describe in the wire format's u32
    /// length fields.
    #[error("frame payload of {len} bytes does not fit the wire format")]
    FramePayloadTooLarge {
        /// Length of the offending payload.
        len: usize,
    },

    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience type alias for `std::result::Result<T, CoreError>`.
pub type Result<T> = std::result::Result<T, CoreError>;
