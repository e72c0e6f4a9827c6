//! # pixel-compress
//!
//! Turn an uploaded raster image into a small, deliberately blocky JPEG.
//!
//! Two knobs control the result: a **resize factor** that shrinks the image
//! with nearest-neighbour sampling and scales it back up (the pixel-art
//! look), and a **quality** level for the lossy JPEG encode (the size).
//!
//! ## Pipeline Overview
//!
//! ```text
//! bytes
//!  │
//!  ├─ 1. Gate       extension allow-list (png, jpg, jpeg, gif)
//!  ├─ 2. Decode     sniff container, decode under size limits
//!  ├─ 3. Normalize  alpha / palette / 16-bit → 8-bit RGB or grayscale
//!  ├─ 4. Pixelate   nearest-neighbour shrink to round(w·f)×round(h·f), restore
//!  └─ 5. Encode     JPEG at quality 1–100 → EncodedArtifact
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pixel_compress::{compress_bytes, CompressionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CompressionConfig::builder()
//!         .quality(30)
//!         .resize_factor(0.5)
//!         .build()?;
//!     let bytes = std::fs::read("photo.png")?;
//!     let output = compress_bytes(&bytes, "photo.png", &config)?;
//!     std::fs::write(output.artifact.filename(), output.artifact.bytes())?;
//!     eprintln!("{} → {} bytes", output.stats.input_bytes, output.stats.output_bytes);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature   | Default | Description |
//! |-----------|---------|-------------|
//! | `cli`     | on      | Enables the `pixel-compress` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `mozjpeg` | off     | Encode with mozjpeg instead of the pure-Rust `jpeg-encoder` (both use optimised Huffman tables) |
//!
//! ## Choosing Parameters
//!
//! | Preset | Quality | Resize factor | Look |
//! |--------|---------|---------------|------|
//! | `plain` (default) | 50 | — | ordinary JPEG re-encode |
//! | `pixelated` | 30 | 0.5 | 2×2 blocks, visible artefacts |
//!
//! A factor of `0.1` gives 10×10 blocks; quality below ~20 makes the block
//! edges ring noticeably.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod compress;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::compress_batch;
pub use compress::{compress_async, compress_bytes, compress_file, compress_image, compress_to_file};
pub use config::{Background, CompressionConfig, CompressionConfigBuilder, Preset, Quality, ResizeFactor};
pub use error::{CompressError, ErrorKind, FileError};
pub use output::{
    BatchOutput, BatchStats, CompressionOutput, CompressionStats, EncodedArtifact, FileResult,
    PipelineStage, StageTiming,
};
pub use pipeline::encode::encode;
pub use pipeline::input::{check_extension, is_allowed_file};
pub use pipeline::normalize::{normalize, NormalizedImage, PixelFormat, SourceImage};
pub use pipeline::pixelate::{pixelate, PixelatedImage};
pub use progress::{CompressionProgressCallback, NoopProgressCallback, ProgressCallback};
