//! Engine configuration shared by the batch and live paths.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::hash_tree::HashAlgorithm;

/// Default chunk size in bytes, matching the swarm protocol default.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Default presentation rate in frames per second.
pub const DEFAULT_FRAME_RATE_HZ: f64 = 10.0;

/// Configuration recognized by the engine core.
///
/// Serializable so a host can embed it in its own config file; absent
/// fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Chunk size in bytes. Every chunk but the last is exactly this long.
    pub chunk_size: usize,
    /// Hash algorithm for tree building and verification.
    pub hash_algorithm: HashAlgorithm,
    /// Presentation rate for the live consumption timer.
    pub frame_rate_hz: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            hash_algorithm: HashAlgorithm::Sha1,
            frame_rate_hz: DEFAULT_FRAME_RATE_HZ,
        }
    }
}

impl EngineConfig {
    /// Check the configuration for values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidChunkSize`] for a zero chunk size and
    /// [`CoreError::InvalidFrameRate`] for a non-positive or non-finite
    /// frame rate.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(CoreError::InvalidChunkSize(0));
        }
        if !self.frame_rate_hz.is_finite() || self.frame_rate_hz <= 0.0 {
            return Err(CoreError::InvalidFrameRate(self.frame_rate_hz));
        }
        Ok(())
    }
}
