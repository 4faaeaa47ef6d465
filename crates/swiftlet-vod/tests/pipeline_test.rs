//! Cross-crate integration tests: swiftlet-vod + swiftlet-core.
//!
//! Tests the full batch pipeline: generate frames → build a chunked
//! artifact → read it back chunk by chunk → verify every chunk against
//! the published Merkle root via its authentication path.

use std::path::Path;

use swiftlet_core::{AvFrame, AvFrameCodec, EngineConfig, FrameCodec, HashAlgorithm, MerkleTree};
use swiftlet_vod::{ChunkedArtifact, ContentBuilder, ContentGenerator};

/// Helper: config with a chunk size small enough for multi-chunk output.
fn small_config(chunk_size: usize) -> EngineConfig {
    EngineConfig {
        chunk_size,
        ..EngineConfig::default()
    }
}

/// Helper: build an artifact from `frames` generated frames and return
/// its path plus the build summary.
fn build_artifact(
    dir: &Path,
    name: &str,
    config: &EngineConfig,
    frames: usize,
) -> (std::path::PathBuf, swiftlet_vod::BuildSummary) {
    let mut builder = ContentBuilder::new(config).unwrap();
    for frame in ContentGenerator::with_payload_sizes(64, 16).take(frames) {
        builder.append_frame(&frame).unwrap();
    }
    let path = dir.join(name);
    let summary = builder.finalize(&path).unwrap();
    (path, summary)
}

#[test]
fn test_build_then_verify_every_chunk() {
    let dir = tempfile::tempdir().unwrap();
    let config = small_config(128);
    let (path, summary) = build_artifact(dir.path(), "stream.dat", &config, 25);

    let mut artifact = ChunkedArtifact::open(&path, config.chunk_size).unwrap();
    assert_eq!(artifact.chunk_count(), summary.total_chunks);

    let tree = artifact.hash_tree(config.hash_algorithm).unwrap();
    assert_eq!(tree.root(), summary.root_hash.as_slice());

    for id in 0..summary.total_chunks {
        let chunk = artifact.read_chunk(id).unwrap();
        let proof = tree.auth_path(id).unwrap();
        let ok = MerkleTree::verify_chunk(config.hash_algorithm, &chunk, &proof, tree.root())
            .unwrap();
        assert!(ok, "chunk {} failed verification", id);
    }
}

#[test]
fn test_tampered_chunk_fails_verification() {
    let dir = tempfile::tempdir().unwrap();
    let config = small_config(128);
    let (path, summary) = build_artifact(dir.path(), "tampered.dat", &config, 25);

    let mut artifact = ChunkedArtifact::open(&path, config.chunk_size).unwrap();
    let tree = artifact.hash_tree(config.hash_algorithm).unwrap();

    let mut chunk = artifact.read_chunk(3).unwrap();
    chunk[0] ^= 0xFF;
    let proof = tree.auth_path(3).unwrap();
    let ok =
        MerkleTree::verify_chunk(config.hash_algorithm, &chunk, &proof, &summary.root_hash)
            .unwrap();
    assert!(!ok);
}

#[test]
fn test_reconstructed_stream_decodes_to_original_frames() {
    let dir = tempfile::tempdir().unwrap();
    let config = small_config(100);

    let frames: Vec<AvFrame> = ContentGenerator::with_payload_sizes(48, 12).take(10).collect();
    let mut builder = ContentBuilder::new(&config).unwrap();
    for frame in &frames {
        builder.append_frame(frame).unwrap();
    }
    let path = dir.path().join("decode.dat");
    builder.finalize(&path).unwrap();

    // Concatenate chunks in order and split the records back out, exactly
    // what a receiver does once every chunk has arrived.
    let artifact = ChunkedArtifact::open(&path, config.chunk_size).unwrap();
    let mut stream = Vec::new();
    for item in artifact.chunks().unwrap() {
        stream.extend_from_slice(&item.unwrap().1);
    }

    let mut decoded = Vec::new();
    let mut offset = 0;
    while offset < stream.len() {
        let len = u32::from_be_bytes(stream[offset..offset + 4].try_into().unwrap()) as usize;
        offset += 4;
        decoded.push(AvFrameCodec.decode(&stream[offset..offset + len]).unwrap());
        offset += len;
    }
    assert_eq!(decoded, frames);
}

#[test]
fn test_sha256_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig {
        chunk_size: 128,
        hash_algorithm: HashAlgorithm::Sha256,
        ..EngineConfig::default()
    };
    let (path, summary) = build_artifact(dir.path(), "sha256.dat", &config, 12);
    assert_eq!(summary.root_hash.len(), 32);

    let artifact = ChunkedArtifact::open(&path, config.chunk_size).unwrap();
    let info = artifact.inspect(HashAlgorithm::Sha256).unwrap();
    assert_eq!(info.root_hash, summary.root_hash);
    assert_eq!(info.root_hex(), summary.root_hex());
}

#[test]
fn test_companion_log_records_build() {
    let dir = tempfile::tempdir().unwrap();
    let config = small_config(128);
    let (path, summary) = build_artifact(dir.path(), "logged.dat", &config, 25);

    let artifact = ChunkedArtifact::open(&path, config.chunk_size).unwrap();
    let log = artifact.read_companion_log().unwrap().unwrap();
    assert!(log.contains("Total frames: 25"));
    assert!(log.contains(&format!("Total chunks: {}", summary.total_chunks)));
    assert!(log.contains(&format!("Merkle hash: {}", summary.root_hex())));
}
