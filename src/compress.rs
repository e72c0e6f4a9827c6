//! Single-image entry points.
//!
//! [`compress_bytes`] drives one image through the pipeline state machine:
//!
//! ```text
//! Received ─▶ Decoded ─▶ Normalized ─▶ Pixelated ─▶ Encoded ─▶ Delivered
//!     │          │            │             │           │
//!     └──────────┴────────────┴─────────────┴───────────┴──▶ Err(CompressError)
//! ```
//!
//! Parameters are validated when the [`CompressionConfig`] is built, so an
//! invalid quality or resize factor never reaches this module. The extension
//! gate runs before decoding whenever a filename is known.
//!
//! The work is synchronous and CPU-bound. Use [`compress_async`] from async
//! code, or [`crate::batch::compress_batch`] for many files.

use crate::config::CompressionConfig;
use crate::error::CompressError;
use crate::output::{CompressionOutput, CompressionStats, PipelineStage, StageTiming};
use crate::pipeline::{encode, input, normalize, pixelate};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

const UNNAMED: &str = "<memory>";

/// Compress an in-memory image whose original filename is known.
///
/// The filename's extension must be allow-listed; the artifact is named
/// `compressed_<stem>.jpg`.
///
/// # Example
/// ```rust,no_run
/// use pixel_compress::{compress_bytes, CompressionConfig, Preset};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes = std::fs::read("cat.png")?;
/// let config = CompressionConfig::from_preset(Preset::Pixelated);
/// let output = compress_bytes(&bytes, "cat.png", &config)?;
/// assert_eq!(output.artifact.filename(), "compressed_cat.jpg");
/// # Ok(())
/// # }
/// ```
pub fn compress_bytes(
    bytes: &[u8],
    filename: &str,
    config: &CompressionConfig,
) -> Result<CompressionOutput, CompressError> {
    run(bytes, Some(filename), config, 0, 1)
}

/// Compress an in-memory image with no filename.
///
/// The extension gate is skipped and the artifact keeps the default name
/// `compressed_image.jpg`.
pub fn compress_image(
    bytes: &[u8],
    config: &CompressionConfig,
) -> Result<CompressionOutput, CompressError> {
    run(bytes, None, config, 0, 1)
}

/// Read `path` and compress it.
pub fn compress_file(
    path: impl AsRef<Path>,
    config: &CompressionConfig,
) -> Result<CompressionOutput, CompressError> {
    compress_file_indexed(path.as_ref(), config, 0, 1)
}

/// Compress `input` and atomically write the JPEG to `output`.
pub fn compress_to_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &CompressionConfig,
) -> Result<CompressionStats, CompressError> {
    let output = compress_file(input_path, config)?;
    output.artifact.write_to(output_path)?;
    Ok(output.stats)
}

/// Run [`compress_bytes`] (or [`compress_image`] when `filename` is `None`)
/// on tokio's blocking pool.
pub async fn compress_async(
    bytes: Vec<u8>,
    filename: Option<String>,
    config: CompressionConfig,
) -> Result<CompressionOutput, CompressError> {
    tokio::task::spawn_blocking(move || run(&bytes, filename.as_deref(), &config, 0, 1))
        .await
        .map_err(|e| CompressError::Internal(format!("Compress task panicked: {e}")))?
}

/// Blocking implementation shared by [`compress_file`] and the batch runner.
pub(crate) fn compress_file_indexed(
    path: &Path,
    config: &CompressionConfig,
    index: usize,
    total: usize,
) -> Result<CompressionOutput, CompressError> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if let Some(ref cb) = config.progress_callback {
        cb.on_file_start(index, total, filename.clone());
    }

    // Gate before touching the disk.
    if let Err(e) = input::check_extension(&filename, config) {
        report_failure(config, &filename, index, total, PipelineStage::Received, &e);
        return Err(e);
    }

    let bytes = read_input(path).inspect_err(|e| {
        report_failure(config, &filename, index, total, PipelineStage::Received, e);
    })?;
    run_started(&bytes, Some(&filename), config, index, total)
}

fn read_input(path: &Path) -> Result<Vec<u8>, CompressError> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CompressError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => CompressError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => CompressError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })
}

/// Records timings and notifies the callback as the image changes state.
struct StageTracker<'a> {
    name: &'a str,
    config: &'a CompressionConfig,
    current: PipelineStage,
    last: Instant,
    timings: Vec<StageTiming>,
}

impl<'a> StageTracker<'a> {
    fn start(name: &'a str, config: &'a CompressionConfig) -> Self {
        let mut tracker = Self {
            name,
            config,
            current: PipelineStage::Received,
            last: Instant::now(),
            timings: Vec::with_capacity(6),
        };
        tracker.enter(PipelineStage::Received);
        tracker
    }

    fn enter(&mut self, stage: PipelineStage) {
        let now = Instant::now();
        let duration_us = now.duration_since(self.last).as_micros() as u64;
        self.last = now;
        self.current = stage;
        self.timings.push(StageTiming { stage, duration_us });
        debug!("{}: {} ({}µs)", self.name, stage, duration_us);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_stage(self.name.to_string(), stage);
        }
    }
}

fn run(
    bytes: &[u8],
    filename: Option<&str>,
    config: &CompressionConfig,
    index: usize,
    total: usize,
) -> Result<CompressionOutput, CompressError> {
    if let Some(ref cb) = config.progress_callback {
        cb.on_file_start(index, total, filename.unwrap_or(UNNAMED).to_string());
    }
    run_started(bytes, filename, config, index, total)
}

/// [`run`] for callers that have already announced the file.
fn run_started(
    bytes: &[u8],
    filename: Option<&str>,
    config: &CompressionConfig,
    index: usize,
    total: usize,
) -> Result<CompressionOutput, CompressError> {
    let total_start = Instant::now();
    let name = filename.unwrap_or(UNNAMED);

    let mut tracker = StageTracker::start(name, config);
    match run_stages(bytes, filename, config, &mut tracker) {
        Ok(mut output) => {
            tracker.enter(PipelineStage::Delivered);
            output.stats.stages = tracker.timings;
            output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

            info!(
                "{}: {} → {} bytes ({:.0}%) in {}ms",
                name,
                output.stats.input_bytes,
                output.stats.output_bytes,
                output.stats.compression_ratio() * 100.0,
                output.stats.total_duration_ms
            );
            if let Some(ref cb) = config.progress_callback {
                cb.on_file_complete(index, total, output.stats.input_bytes, output.stats.output_bytes);
            }
            Ok(output)
        }
        Err(e) => {
            report_failure(config, name, index, total, tracker.current, &e);
            Err(e)
        }
    }
}

fn report_failure(
    config: &CompressionConfig,
    name: &str,
    index: usize,
    total: usize,
    stage: PipelineStage,
    err: &CompressError,
) {
    warn!("{}: failed after reaching '{}': {}", name, stage, err);
    if let Some(ref cb) = config.progress_callback {
        cb.on_file_error(index, total, err.to_string());
    }
}

fn run_stages(
    bytes: &[u8],
    filename: Option<&str>,
    config: &CompressionConfig,
    tracker: &mut StageTracker<'_>,
) -> Result<CompressionOutput, CompressError> {
    // ── Received → Decoded ───────────────────────────────────────────────
    if let Some(name) = filename {
        input::check_extension(name, config)?;
    }
    let source = input::decode(bytes, config)?;
    let container = input::container_name(source.container()).to_string();
    let pixel_format = source.pixel_format();
    let (width, height) = (source.width(), source.height());
    tracker.enter(PipelineStage::Decoded);

    // ── Decoded → Normalized ─────────────────────────────────────────────
    let normalized = normalize::normalize_with(source, config.background);
    tracker.enter(PipelineStage::Normalized);

    // ── Normalized → Pixelated ───────────────────────────────────────────
    let pixelated = match config.resize_factor {
        Some(factor) => pixelate::pixelate_with(normalized, factor),
        None => pixelate::PixelatedImage::passthrough(normalized),
    };
    tracker.enter(PipelineStage::Pixelated);

    // ── Pixelated → Encoded ──────────────────────────────────────────────
    let mut artifact = encode::encode_with(&pixelated, config.quality)?;
    if let Some(name) = filename {
        artifact = artifact.with_filename(input::output_filename(name));
    }
    tracker.enter(PipelineStage::Encoded);

    let stats = CompressionStats {
        input_bytes: bytes.len(),
        output_bytes: artifact.len(),
        container,
        pixel_format,
        width,
        height,
        intermediate: pixelated.intermediate(),
        quality: config.quality.get(),
        resize_factor: config.resize_factor.map(|f| f.get()),
        stages: Vec::new(),
        total_duration_ms: 0,
    };

    Ok(CompressionOutput { artifact, stats })
}
