//! # swiftlet-live
//!
//! Real-time consumption pipeline for swiftlet: accepts content chunks in
//! whatever order the swarm delivers them and turns them into a paced,
//! strictly ordered frame stream, tracking delivered and missed
//! presentation slots along the way.
//!
//! ## Modules
//!
//! - [`reconstructor`] — the [`LiveReconstructor`] session pipeline
//! - [`stats`] — per-session delivery accounting
//! - [`error`] — lifecycle and pipeline errors

pub mod error;
pub mod reconstructor;
pub mod stats;

pub use error::{LiveError, Result};
pub use reconstructor::{FrameSink, LiveReconstructor, DEFAULT_FIRST_CHUNK_ID};
pub use stats::SessionStats;
