//! Swiftlet CLI — build and inspect chunk-addressed VOD artifacts.
//!
//! Provides commands for generating deterministic VOD artifacts from the
//! synthetic content generator, computing Merkle root hashes over existing
//! files, verifying a file against a published root, and inspecting
//! artifact geometry plus the companion build log.
//!
//! # Usage
//!
//! ```bash
//! swiftlet build -o stream.dat --duration 10 --fps 10 --chunk-size 1024
//! swiftlet hash stream.dat
//! swiftlet verify stream.dat --root 01b307acba4f54f55aafc33bb06bbbf6ca803e9a
//! swiftlet info stream.dat
//! swiftlet info stream.dat --json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use swiftlet_core::{
    to_hex, EngineConfig, HashAlgorithm, MerkleTree, DEFAULT_CHUNK_SIZE, DEFAULT_FRAME_RATE_HZ,
};
use swiftlet_vod::{
    companion_log_path, ChunkedArtifact, ContentBuilder, ContentGenerator, DEFAULT_AUDIO_LEN,
    DEFAULT_VIDEO_LEN,
};

// ───────────────────────────── CLI definition ─────────────────────────────

/// Top-level CLI entry point for the `swiftlet` binary.
#[derive(Parser)]
#[command(
    name = "swiftlet",
    about = "Swiftlet -- chunk-addressed streaming content engine",
    version,
    long_about = "Builds chunk-addressed VOD artifacts with Merkle integrity roots,\n\
                   and verifies existing artifacts against a published root hash."
)]
struct Cli {
    /// Increase log verbosity (-v for debug, -vv for trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available sub-commands.
#[derive(Subcommand)]
enum Commands {
    /// Build a VOD artifact from generated frames.
    Build {
        /// Output artifact path.
        #[arg(short, long)]
        output: PathBuf,

        /// Stream length to generate, in seconds.
        #[arg(long, default_value_t = 10.0)]
        duration: f64,

        /// Frame rate of the generated stream.
        #[arg(long, default_value_t = DEFAULT_FRAME_RATE_HZ)]
        fps: f64,

        /// Chunk size in bytes.
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// Hash algorithm for the root (sha1, sha256).
        #[arg(long, default_value = "sha1")]
        algorithm: String,

        /// Video payload bytes per generated frame.
        #[arg(long, default_value_t = DEFAULT_VIDEO_LEN)]
        video_len: usize,

        /// Audio payload bytes per generated frame.
        #[arg(long, default_value_t = DEFAULT_AUDIO_LEN)]
        audio_len: usize,

        /// Print the build summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Compute the Merkle root hash of an existing file.
    Hash {
        /// Input file path.
        input: PathBuf,

        /// Chunk size in bytes.
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// Hash algorithm (sha1, sha256).
        #[arg(long, default_value = "sha1")]
        algorithm: String,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Recompute a file's root hash and compare it against an expected value.
    Verify {
        /// Input file path.
        input: PathBuf,

        /// Expected root hash, hex encoded.
        #[arg(long)]
        root: String,

        /// Chunk size in bytes.
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// Hash algorithm (sha1, sha256).
        #[arg(long, default_value = "sha1")]
        algorithm: String,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Display artifact geometry, root hash, and the companion build log.
    Info {
        /// Input artifact path.
        input: PathBuf,

        /// Chunk size the artifact was built with.
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// Hash algorithm (sha1, sha256).
        #[arg(long, default_value = "sha1")]
        algorithm: String,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
}

// ────────────────────────────── main ──────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support.
    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Build {
            output,
            duration,
            fps,
            chunk_size,
            algorithm,
            video_len,
            audio_len,
            json,
        } => cmd_build(
            &output, duration, fps, chunk_size, &algorithm, video_len, audio_len, json,
        ),

        Commands::Hash {
            input,
            chunk_size,
            algorithm,
            json,
        } => cmd_hash(&input, chunk_size, &algorithm, json),

        Commands::Verify {
            input,
            root,
            chunk_size,
            algorithm,
            json,
        } => cmd_verify(&input, &root, chunk_size, &algorithm, json),

        Commands::Info {
            input,
            chunk_size,
            algorithm,
            json,
        } => cmd_info(&input, chunk_size, &algorithm, json),
    }
}

// ──────────────────────────── build ──────────────────────────────

/// Generate `duration × fps` synthetic frames and write them out as a
/// chunked artifact with its root hash and companion log.
#[allow(clippy::too_many_arguments)]
fn cmd_build(
    output: &Path,
    duration: f64,
    fps: f64,
    chunk_size: usize,
    algorithm_name: &str,
    video_len: usize,
    audio_len: usize,
    json: bool,
) -> Result<()> {
    let algorithm = parse_algorithm(algorithm_name)?;
    if !duration.is_finite() || duration <= 0.0 {
        bail!("Duration must be positive, got {}", duration);
    }

    let config = EngineConfig {
        chunk_size,
        hash_algorithm: algorithm,
        frame_rate_hz: fps,
    };
    config.validate().context("Invalid build configuration")?;

    let frame_count = (duration * fps).round() as u64;
    if frame_count == 0 {
        bail!("{}s at {} fps produces no frames", duration, fps);
    }

    if !json {
        println!("\n  Swiftlet Builder");
        println!("  ============================================");
        println!("  Output:    {}", output.display());
        println!(
            "  Frames:    {} ({:.1}s @ {:.1} fps)",
            frame_count, duration, fps
        );
        println!("  Chunk:     {} bytes", chunk_size);
        println!("  Algorithm: {}", algorithm);
    }

    let mut builder = ContentBuilder::new(&config).context("Failed to create content builder")?;
    let generator = ContentGenerator::with_payload_sizes(video_len, audio_len);
    for frame in generator.take(frame_count as usize) {
        builder
            .append_frame(&frame)
            .context("Failed to append generated frame")?;
    }

    let summary = builder
        .finalize(output)
        .with_context(|| format!("Failed to write artifact: {}", output.display()))?;
    let file_size = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);

    if json {
        let doc = serde_json::json!({
            "file": output.display().to_string(),
            "file_size": file_size,
            "frames": summary.total_frames,
            "chunks": summary.total_chunks,
            "chunk_size": chunk_size,
            "algorithm": algorithm.to_string(),
            "root": summary.root_hex(),
            "log": companion_log_path(output).display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        println!("  --------------------------------------------");
        println!("  Chunks:    {}", summary.total_chunks);
        println!("  Size:      {} bytes ({})", file_size, human_size(file_size));
        println!("  Root:      {}", summary.root_hex());
        println!("  Log:       {}", companion_log_path(output).display());
        println!("  Done!\n");
    }

    Ok(())
}

// ──────────────────────────── hash ───────────────────────────────

/// Compute and print the Merkle root of an arbitrary file.
fn cmd_hash(input: &Path, chunk_size: usize, algorithm_name: &str, json: bool) -> Result<()> {
    let algorithm = parse_algorithm(algorithm_name)?;

    let file_size = std::fs::metadata(input)
        .with_context(|| format!("Failed to read file metadata: {}", input.display()))?
        .len();
    let tree = MerkleTree::from_file(algorithm, input, chunk_size)
        .with_context(|| format!("Failed to hash file: {}", input.display()))?;

    if json {
        let doc = serde_json::json!({
            "file": input.display().to_string(),
            "file_size": file_size,
            "chunks": tree.leaf_count(),
            "chunk_size": chunk_size,
            "algorithm": algorithm.to_string(),
            "root": to_hex(tree.root()),
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        println!("\n  Swiftlet Hash");
        println!("  ============================================");
        println!("  File:       {}", input.display());
        println!("  Size:       {} bytes ({})", file_size, human_size(file_size));
        println!("  Chunks:     {}", tree.leaf_count());
        println!("  Chunk size: {} bytes", chunk_size);
        println!("  Algorithm:  {}", algorithm);
        println!("  Root:       {}", to_hex(tree.root()));
        println!();
    }

    Ok(())
}

// ─────────────────────────── verify ──────────────────────────────

/// Recompute a file's root and compare it against the expected hex value.
///
/// Exits non-zero on a mismatch so scripts can gate on the result.
fn cmd_verify(
    input: &Path,
    expected_root: &str,
    chunk_size: usize,
    algorithm_name: &str,
    json: bool,
) -> Result<()> {
    let algorithm = parse_algorithm(algorithm_name)?;
    let expected = expected_root.trim().to_ascii_lowercase();

    let tree = MerkleTree::from_file(algorithm, input, chunk_size)
        .with_context(|| format!("Failed to hash file: {}", input.display()))?;
    let actual = to_hex(tree.root());
    let matches = actual == expected;

    if json {
        let doc = serde_json::json!({
            "file": input.display().to_string(),
            "chunks": tree.leaf_count(),
            "algorithm": algorithm.to_string(),
            "expected": expected,
            "actual": actual,
            "match": matches,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        println!("\n  Swiftlet Verify");
        println!("  ============================================");
        println!("  File:      {}", input.display());
        println!("  Chunks:    {}", tree.leaf_count());
        println!("  Algorithm: {}", algorithm);
        println!("  Expected:  {}", expected);
        println!("  Actual:    {}", actual);
        if matches {
            println!("  Result:    ✓ root hash matches");
        } else {
            println!("  Result:    ✗ root hash mismatch");
        }
        println!();
    }

    if !matches {
        bail!("Root hash mismatch for {}", input.display());
    }

    Ok(())
}

// ───────────────────────────── info ───────────────────────────────

/// Display artifact geometry, the recomputed root, and the build log.
fn cmd_info(input: &Path, chunk_size: usize, algorithm_name: &str, json: bool) -> Result<()> {
    let algorithm = parse_algorithm(algorithm_name)?;

    let artifact = ChunkedArtifact::open(input, chunk_size)
        .with_context(|| format!("Failed to open artifact: {}", input.display()))?;
    let info = artifact
        .inspect(algorithm)
        .with_context(|| format!("Failed to hash artifact: {}", input.display()))?;
    let log = artifact
        .read_companion_log()
        .with_context(|| format!("Failed to read companion log for {}", input.display()))?;

    if json {
        let mut doc = serde_json::json!({
            "file": input.display().to_string(),
            "file_size": info.file_len,
            "chunk_size": info.chunk_size,
            "chunks": info.chunk_count,
            "last_chunk_len": info.last_chunk_len,
            "algorithm": info.algorithm.to_string(),
            "root": info.root_hex(),
        });
        if let Some(ref text) = log {
            doc["log"] = serde_json::json!({
                "path": companion_log_path(input).display().to_string(),
                "lines": text.lines().collect::<Vec<_>>(),
            });
        }
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        println!("\n  Swiftlet Artifact");
        println!("  ============================================");
        println!("  File:       {}", input.display());
        println!(
            "  Size:       {} bytes ({})",
            info.file_len,
            human_size(info.file_len)
        );
        println!("  Chunk size: {} bytes", info.chunk_size);
        println!("  Chunks:     {}", info.chunk_count);
        println!("  Last chunk: {} bytes", info.last_chunk_len);
        println!("  Algorithm:  {}", info.algorithm);
        println!("  Root:       {}", info.root_hex());

        match log {
            Some(text) => {
                println!();
                println!("  Build log");
                println!("  --------------------------------------------");
                for line in text.lines() {
                    println!("  {}", line);
                }
            }
            None => {
                println!();
                println!("  No companion log found.");
            }
        }
        println!();
    }

    Ok(())
}

// ──────────────────────── helper functions ─────────────────────────

/// Parse a hash algorithm name from the command line.
fn parse_algorithm(name: &str) -> Result<HashAlgorithm> {
    name.parse::<HashAlgorithm>()
        .map_err(|_| anyhow::anyhow!("Unknown hash algorithm '{}'. Supported: sha1, sha256", name))
}

/// Format a byte count as a human-readable size string.
fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GiB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MiB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KiB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
