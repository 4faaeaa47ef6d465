//! Error types for the VOD crate.

use thiserror::Error;

/// Errors that can occur while building or inspecting VOD artifacts.
#[derive(Error, Debug)]
pub enum VodError {
    /// Error from the core chunk/tree/framing primitives.
    #[error("engine error: {0}")]
    Core(#[from] swiftlet_core::CoreError),

    /// Chunk id lies beyond the end of the artifact.
    #[error("chunk {id} out of range for artifact with {total} chunks")]
    ChunkOutOfRange {
        /// The requested chunk id.
        id: u64,
        /// Number of chunks the artifact holds.
        total: u64,
    },

    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience type alias for `std::result::Result<T, VodError>`.
pub type Result<T> = std::result::Result<T, VodError>;
