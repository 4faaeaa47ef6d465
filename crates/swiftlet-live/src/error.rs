//! Error types for the live reconstruction pipeline.

use thiserror::Error;

/// Errors surfaced by a live session.
#[derive(Debug, Error)]
pub enum LiveError {
    /// A core operation (framing, decoding, configuration) failed.
    #[error("engine error: {0}")]
    Core(#[from] swiftlet_core::CoreError),

    /// `start_consuming` was called while the tick task is running.
    #[error("consumption already started")]
    AlreadyStarted,

    /// `stop_consuming` was called with no tick task running.
    #[error("consumption not started")]
    NotStarted,
}

/// Convenience alias for live pipeline results.
pub type Result<T> = std::result::Result<T, LiveError>;
