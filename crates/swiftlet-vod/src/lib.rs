//! # swiftlet-vod
//!
//! Batch content pipeline for swiftlet: turns an ordered frame sequence
//! into a chunk-addressed artifact file plus the Merkle root a swarm
//! publishes, and reads such artifacts back for serving and verification.
//!
//! ## Pipeline
//!
//! - [`ContentGenerator`] emits deterministic synthetic frames
//! - [`ContentBuilder`] encodes, length-prefixes, and chunks frames, then
//!   writes the artifact, its root hash, and a companion build log
//! - [`ChunkedArtifact`] serves positional chunk reads and recomputes the
//!   root for integrity checks
//!
//! ## Example
//! ```rust,no_run
//! use std::path::Path;
//! use swiftlet_core::EngineConfig;
//! use swiftlet_vod::{ContentBuilder, ContentGenerator};
//!
//! let mut builder = ContentBuilder::new(&EngineConfig::default()).unwrap();
//! for frame in ContentGenerator::new().take(100) {
//!     builder.append_frame(&frame).unwrap();
//! }
//! let summary = builder.finalize(Path::new("stream.dat")).unwrap();
//! println!("root: {}", summary.root_hex());
//! ```

pub mod artifact;
pub mod builder;
pub mod error;
pub mod generator;

pub use artifact::{companion_log_path, ArtifactInfo, ChunkFileReader, ChunkedArtifact};
pub use builder::{BuildSummary, ContentBuilder};
pub use error::{Result, VodError};
pub use generator::{ContentGenerator, DEFAULT_AUDIO_LEN, DEFAULT_VIDEO_LEN};
