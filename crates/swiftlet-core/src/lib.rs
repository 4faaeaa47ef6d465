//! # swiftlet-core — chunk, tree, and framing primitives
//!
//! The synchronous heart of the swiftlet streaming engine: content is
//! split into fixed-size chunks addressed by integer ids, verified against
//! a binary Merkle hash tree, and reassembled into length-delimited
//! application frames independent of chunk boundaries.
//!
//! ## Modules
//!
//! - [`chunk`] — chunk ids, the thread-safe [`ChunkStore`], and the narrow
//!   [`ChunkAvailability`] capability the live path polls
//! - [`hash_tree`] — binary Merkle tree with SHA-1/SHA-256 digests,
//!   odd-node promotion, and authentication paths
//! - [`framer`] — length-delimited record reassembly and encoding
//! - [`frame`] — the application [`AvFrame`] and its codec seam
//! - [`config`] — [`EngineConfig`] defaults and validation
//! - [`error`] — error types for the core primitives

pub mod chunk;
pub mod config;
pub mod error;
pub mod frame;
pub mod framer;
pub mod hash_tree;

pub use chunk::{ChunkAvailability, ChunkId, ChunkStore};
pub use config::{EngineConfig, DEFAULT_CHUNK_SIZE, DEFAULT_FRAME_RATE_HZ};
pub use error::{CoreError, Result};
pub use frame::{AvFrame, AvFrameCodec, FrameCodec, FRAME_HEADER_LEN};
pub use framer::{Framer, MAX_RECORD_LEN, RECORD_PREFIX_LEN};
pub use hash_tree::{to_hex, AuthPath, HashAlgorithm, MerkleTree};
