//! CLI binary for pixel-compress.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `CompressionConfig` and prints results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pixel_compress::{
    compress_batch, compress_file, Background, CompressionConfig, CompressionProgressCallback,
    FileResult, Preset, ProgressCallback,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the batch plus a log line per
/// file. Files complete out of order, so lines carry their own names.
struct CliProgressCallback {
    bar: ProgressBar,
    names: Vec<String>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new(inputs: &[PathBuf]) -> Arc<Self> {
        let bar = ProgressBar::new(inputs.len() as u64);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Compressing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            names: inputs.iter().map(|p| display_name(p)).collect(),
            errors: AtomicUsize::new(0),
        })
    }

    fn name(&self, index: usize) -> &str {
        self.names.get(index).map(String::as_str).unwrap_or("?")
    }
}

impl CompressionProgressCallback for CliProgressCallback {
    fn on_file_complete(&self, index: usize, _total: usize, input_bytes: usize, output_bytes: usize) {
        self.bar.println(format!(
            "  {} {:<32}  {}",
            green("✓"),
            self.name(index),
            dim(&format!("{} → {}", human_bytes(input_bytes), human_bytes(output_bytes))),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, _total: usize, error: String) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let first_line = error.lines().next().unwrap_or_default();
        self.bar.println(format!(
            "  {} {:<32}  {}",
            red("✗"),
            self.name(index),
            red(first_line)
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = total.saturating_sub(success_count);
        if failed == 0 {
            eprintln!(
                "{} {} files compressed",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files compressed  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Re-encode at quality 50 (writes ./compressed_photo.jpg)
  pixel-compress photo.png

  # Pixel-art look: 2x2 blocks at quality 30
  pixel-compress --preset pixelated photo.png -o small.jpg

  # Chunky 10x10 blocks
  pixel-compress -r 0.1 -Q 40 photo.png

  # Transparent PNG onto white instead of dropping alpha
  pixel-compress --background ffffff logo.png

  # Many files into a directory, 8 at a time
  pixel-compress -c 8 -o out/ shots/*.png

  # Stream the JPEG to another program
  pixel-compress --stdout photo.gif | curl -T - https://example.invalid/upload

ACCEPTED INPUTS:
  .png .jpg .jpeg .gif (case-insensitive). Only the first frame of an
  animated GIF is used.

ENVIRONMENT VARIABLES:
  PIXEL_COMPRESS_QUALITY         Default for --quality
  PIXEL_COMPRESS_RESIZE_FACTOR   Default for --resize-factor
  RUST_LOG                       Override log filter (e.g. pixel_compress=debug)
"#;

/// Pixelate and re-encode images as small lossy JPEGs.
#[derive(Parser, Debug)]
#[command(
    name = "pixel-compress",
    version,
    about = "Pixelate and re-encode images as small lossy JPEGs",
    long_about = "Shrink PNG, JPEG and GIF images by re-encoding them as JPEG at a chosen \
quality, optionally pixelating them first with a nearest-neighbour downscale/upscale.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image files to compress.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file (single input) or directory (several inputs). Default: current directory.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Start from a documented parameter preset.
    #[arg(long, value_enum, default_value = "plain")]
    preset: PresetArg,

    /// JPEG quality, 1–100 (lower = smaller, more artefacts). Overrides the preset.
    #[arg(short = 'Q', long, env = "PIXEL_COMPRESS_QUALITY",
          value_parser = clap::value_parser!(i32).range(1..=100))]
    quality: Option<i32>,

    /// Pixelation factor in (0, 1] (lower = bigger blocks). Overrides the preset.
    #[arg(short = 'r', long, env = "PIXEL_COMPRESS_RESIZE_FACTOR")]
    resize_factor: Option<f64>,

    /// Composite transparency over this RRGGBB colour instead of dropping alpha.
    #[arg(long, value_parser = parse_hex_color)]
    background: Option<[u8; 3]>,

    /// Number of files compressed in parallel.
    #[arg(short, long, default_value_t = 4)]
    concurrency: usize,

    /// Reject images wider or taller than this many pixels.
    #[arg(long, default_value_t = pixel_compress::config::DEFAULT_MAX_DIMENSION)]
    max_dimension: u32,

    /// Write the JPEG bytes to stdout (single input only).
    #[arg(long, conflicts_with = "output")]
    stdout: bool,

    /// Print stats as JSON instead of human-readable lines.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PresetArg {
    Plain,
    Pixelated,
}

impl From<PresetArg> for Preset {
    fn from(v: PresetArg) -> Self {
        match v {
            PresetArg::Plain => Preset::Plain,
            PresetArg::Pixelated => Preset::Pixelated,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level per-file logs for batches.
    let is_batch = cli.inputs.len() > 1;
    let show_progress = is_batch && !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress || cli.stdout {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if cli.stdout && is_batch {
        bail!("--stdout accepts exactly one input");
    }

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new(&cli.inputs) as Arc<dyn CompressionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    if is_batch {
        run_batch(&cli, &config).await
    } else {
        run_single(&cli, &config)
    }
}

/// Map CLI args to `CompressionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<CompressionConfig> {
    let mut builder = CompressionConfig::builder()
        .preset(cli.preset.into())
        .concurrency(cli.concurrency)
        .max_dimension(cli.max_dimension);

    if let Some(q) = cli.quality {
        builder = builder.quality(q);
    }
    if let Some(r) = cli.resize_factor {
        builder = builder.resize_factor(r);
    }
    if let Some(rgb) = cli.background {
        builder = builder.background(Background::Solid(rgb));
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn run_single(cli: &Cli, config: &CompressionConfig) -> Result<()> {
    let input = &cli.inputs[0];
    let output = compress_file(input, config)
        .with_context(|| format!("Failed to compress {}", input.display()))?;

    if cli.stdout {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(output.artifact.bytes())
            .context("Failed to write to stdout")?;
        handle.flush().context("Failed to flush stdout")?;
        return Ok(());
    }

    let dest = single_destination(cli.output.as_deref(), output.artifact.filename());
    output
        .artifact
        .write_to(&dest)
        .with_context(|| format!("Failed to write {}", dest.display()))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        let s = &output.stats;
        eprintln!(
            "{}  {}  {} → {}  ({:.0}%)  {}ms  →  {}",
            green("✔"),
            display_name(input),
            human_bytes(s.input_bytes),
            human_bytes(s.output_bytes),
            s.compression_ratio() * 100.0,
            s.total_duration_ms,
            bold(&dest.display().to_string()),
        );
        let blocks = match s.intermediate {
            Some((w, h)) => format!("pixelated via {w}x{h}"),
            None => "no pixelation".to_string(),
        };
        eprintln!(
            "   {}",
            dim(&format!(
                "{} {:?} {}x{}, quality {}, {}",
                s.container, s.pixel_format, s.width, s.height, s.quality, blocks
            ))
        );
    }
    Ok(())
}

async fn run_batch(cli: &Cli, config: &CompressionConfig) -> Result<()> {
    let output_dir = cli.output.clone().unwrap_or_else(|| PathBuf::from("."));
    if output_dir.is_file() {
        bail!(
            "--output {} is a file; several inputs need a directory",
            output_dir.display()
        );
    }

    let batch = compress_batch(&cli.inputs, &output_dir, config)
        .await
        .context("Compression failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&batch).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    if !cli.quiet && config.progress_callback.is_none() {
        for file in &batch.files {
            print_file_line(file);
        }
    }
    if !cli.quiet {
        eprintln!(
            "   {} → {}  in {}ms",
            dim(&human_bytes(batch.stats.total_input_bytes as usize)),
            dim(&human_bytes(batch.stats.total_output_bytes as usize)),
            batch.stats.total_duration_ms,
        );
    }
    Ok(())
}

fn print_file_line(file: &FileResult) {
    match (&file.output, &file.error) {
        (Some(dest), None) => eprintln!(
            "  {} {}  →  {}",
            green("✓"),
            display_name(&file.input),
            dest.display()
        ),
        (_, Some(err)) => eprintln!(
            "  {} {}  {}",
            red("✗"),
            display_name(&file.input),
            red(err.message.lines().next().unwrap_or_default())
        ),
        (None, None) => {}
    }
}

/// Where a single artifact goes: an explicit file, into an explicit
/// directory, or into the current directory.
fn single_destination(output: Option<&Path>, artifact_name: &str) -> PathBuf {
    match output {
        Some(p) if p.is_dir() || p.as_os_str().to_string_lossy().ends_with('/') => {
            p.join(artifact_name)
        }
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(artifact_name),
    }
}

fn display_name(p: &Path) -> String {
    p.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| p.display().to_string())
}

fn human_bytes(n: usize) -> String {
    const KIB: f64 = 1024.0;
    let n = n as f64;
    if n < KIB {
        format!("{n} B")
    } else if n < KIB * KIB {
        format!("{:.1} KiB", n / KIB)
    } else {
        format!("{:.1} MiB", n / (KIB * KIB))
    }
}

/// Parse `RRGGBB` or `#RRGGBB`.
fn parse_hex_color(s: &str) -> Result<[u8; 3], String> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("expected RRGGBB hex colour, got '{s}'"));
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());
    Ok([channel(0)?, channel(2)?, channel(4)?])
}
