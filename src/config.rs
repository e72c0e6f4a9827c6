//! Configuration types for pixelate-and-compress runs.
//!
//! All pipeline behaviour is controlled through [`CompressionConfig`], built
//! via its [`CompressionConfigBuilder`]. The config is an immutable value:
//! one instance can be shared by every concurrent invocation, and nothing in
//! the library keeps process-wide mutable defaults.
//!
//! The two tunable pipeline parameters are wrapped in newtypes
//! ([`Quality`], [`ResizeFactor`]) whose only constructors validate the
//! range, so a config that was built successfully can never carry an
//! out-of-range value into the encoder.

use crate::error::CompressError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Extensions accepted by the pre-decode gate, compared case-insensitively.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// JPEG quality used when the caller sets nothing.
pub const DEFAULT_QUALITY: u8 = 50;

/// Per-side decode bound in pixels.
pub const DEFAULT_MAX_DIMENSION: u32 = 16_384;

/// Decoder allocation bound in bytes (512 MiB).
pub const DEFAULT_MAX_ALLOC_BYTES: u64 = 512 * 1024 * 1024;

// ── Validated parameters ─────────────────────────────────────────────────

/// JPEG quality level in `1..=100`. Lower means smaller output and more
/// visible artefacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 100;

    /// Validate `value`. Out-of-range values are rejected, never clamped.
    pub fn new(value: i32) -> Result<Self, CompressError> {
        if value < i32::from(Self::MIN) || value > i32::from(Self::MAX) {
            return Err(CompressError::invalid_parameter(
                "quality",
                value,
                "an integer in 1..=100",
            ));
        }
        Ok(Self(value as u8))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(DEFAULT_QUALITY)
    }
}

impl TryFrom<i32> for Quality {
    type Error = CompressError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(q: Quality) -> Self {
        q.0
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pixelation factor in `(0, 1]`. `1.0` leaves the image untouched; `0.5`
/// halves each side before restoring it, giving 2×2 blocks.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ResizeFactor(f64);

impl ResizeFactor {
    /// Validate `value`. NaN, infinities, `<= 0` and `> 1` are rejected.
    pub fn new(value: f64) -> Result<Self, CompressError> {
        if !value.is_finite() || value <= 0.0 || value > 1.0 {
            return Err(CompressError::invalid_parameter(
                "resize factor",
                value,
                "a number in (0, 1]",
            ));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> f64 {
        self.0
    }

    /// `true` when resampling with this factor is a no-op.
    pub fn is_identity(self) -> bool {
        self.0 == 1.0
    }
}

impl TryFrom<f64> for ResizeFactor {
    type Error = CompressError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ResizeFactor> for f64 {
    fn from(r: ResizeFactor) -> Self {
        r.0
    }
}

impl fmt::Display for ResizeFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How alpha is removed when an image is flattened to opaque RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Background {
    /// Drop the alpha channel and keep the stored colour channels. (default)
    #[default]
    Discard,
    /// Alpha-composite every pixel over this opaque colour.
    Solid([u8; 3]),
}

/// Documented parameter pairs.
///
/// | Preset | Quality | Resize factor |
/// |--------|---------|---------------|
/// | `Plain` | 50 | none (no pixelation) |
/// | `Pixelated` | 30 | 0.5 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Re-encode only. (default)
    #[default]
    Plain,
    /// Shrink/restore to 2×2 blocks, then encode aggressively.
    Pixelated,
}

impl Preset {
    pub fn quality(self) -> i32 {
        match self {
            Preset::Plain => 50,
            Preset::Pixelated => 30,
        }
    }

    pub fn resize_factor(self) -> Option<f64> {
        match self {
            Preset::Plain => None,
            Preset::Pixelated => Some(0.5),
        }
    }
}

// ── Config ───────────────────────────────────────────────────────────────

/// Configuration for one or many compress invocations.
///
/// Built via [`CompressionConfig::builder()`] or using
/// [`CompressionConfig::default()`].
///
/// # Example
/// ```rust
/// use pixel_compress::CompressionConfig;
///
/// let config = CompressionConfig::builder()
///     .quality(30)
///     .resize_factor(0.5)
///     .build()
///     .unwrap();
/// assert_eq!(config.quality.get(), 30);
/// ```
#[derive(Clone)]
pub struct CompressionConfig {
    /// JPEG quality. Default: 50.
    pub quality: Quality,

    /// Pixelation factor. `None` skips the resample stage. Default: `None`.
    pub resize_factor: Option<ResizeFactor>,

    /// Alpha flattening policy. Default: [`Background::Discard`].
    pub background: Background,

    /// Lower-case extensions accepted by the pre-decode gate.
    /// Default: `png, jpg, jpeg, gif`.
    pub allowed_extensions: Vec<String>,

    /// Largest accepted width or height in pixels. Default: 16 384.
    ///
    /// Checked from the image header, before any pixel memory is allocated.
    pub max_dimension: u32,

    /// Largest allocation the decoder may make, in bytes. Default: 512 MiB.
    pub max_alloc_bytes: u64,

    /// Files processed in parallel by [`crate::batch::compress_batch`]. Default: 4.
    pub concurrency: usize,

    /// Optional progress callback for per-file and per-stage events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            resize_factor: None,
            background: Background::default(),
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            max_dimension: DEFAULT_MAX_DIMENSION,
            max_alloc_bytes: DEFAULT_MAX_ALLOC_BYTES,
            concurrency: 4,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for CompressionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressionConfig")
            .field("quality", &self.quality)
            .field("resize_factor", &self.resize_factor)
            .field("background", &self.background)
            .field("allowed_extensions", &self.allowed_extensions)
            .field("max_dimension", &self.max_dimension)
            .field("max_alloc_bytes", &self.max_alloc_bytes)
            .field("concurrency", &self.concurrency)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn CompressionProgressCallback>"),
            )
            .finish()
    }
}

impl CompressionConfig {
    /// Create a new builder for `CompressionConfig`.
    pub fn builder() -> CompressionConfigBuilder {
        CompressionConfigBuilder::default()
    }

    /// Shortcut for `builder().preset(preset).build()`. Presets are always valid.
    pub fn from_preset(preset: Preset) -> Self {
        let mut config = Self::default();
        config.quality = Quality(preset.quality() as u8);
        config.resize_factor = preset.resize_factor().map(ResizeFactor);
        config
    }

    /// `true` if `ext` (without the dot) is in the allow-list.
    pub fn allows_extension(&self, ext: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }
}

/// Builder for [`CompressionConfig`].
///
/// Raw values are kept as given and only checked in [`build`](Self::build),
/// so an out-of-range quality or factor surfaces as
/// [`CompressError::InvalidParameter`] instead of being silently clamped.
#[derive(Debug)]
pub struct CompressionConfigBuilder {
    quality: i32,
    resize_factor: Option<f64>,
    config: CompressionConfig,
}

impl Default for CompressionConfigBuilder {
    fn default() -> Self {
        Self {
            quality: i32::from(DEFAULT_QUALITY),
            resize_factor: None,
            config: CompressionConfig::default(),
        }
    }
}

impl CompressionConfigBuilder {
    /// Start from a documented preset. Later setters override it.
    pub fn preset(mut self, preset: Preset) -> Self {
        self.quality = preset.quality();
        self.resize_factor = preset.resize_factor();
        self
    }

    pub fn quality(mut self, quality: i32) -> Self {
        self.quality = quality;
        self
    }

    pub fn resize_factor(mut self, factor: f64) -> Self {
        self.resize_factor = Some(factor);
        self
    }

    /// Disable pixelation, keeping the quality re-encode only.
    pub fn no_resize(mut self) -> Self {
        self.resize_factor = None;
        self
    }

    pub fn background(mut self, background: Background) -> Self {
        self.config.background = background;
        self
    }

    pub fn allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.allowed_extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    pub fn max_dimension(mut self, px: u32) -> Self {
        self.config.max_dimension = px;
        self
    }

    pub fn max_alloc_bytes(mut self, bytes: u64) -> Self {
        self.config.max_alloc_bytes = bytes;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<CompressionConfig, CompressError> {
        let mut config = self.config;
        config.quality = Quality::new(self.quality)?;
        config.resize_factor = self.resize_factor.map(ResizeFactor::new).transpose()?;

        if config.concurrency == 0 {
            return Err(CompressError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if config.max_dimension == 0 {
            return Err(CompressError::InvalidConfig(
                "max_dimension must be ≥ 1".into(),
            ));
        }
        if config.allowed_extensions.is_empty() {
            return Err(CompressError::InvalidConfig(
                "At least one allowed extension is required".into(),
            ));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn quality_bounds() {
        assert!(Quality::new(1).is_ok());
        assert!(Quality::new(100).is_ok());
        for bad in [0, -5, 101, 255] {
            let err = Quality::new(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidParameter, "value {bad}");
        }
    }

    #[test]
    fn resize_factor_bounds() {
        assert!(ResizeFactor::new(1.0).unwrap().is_identity());
        assert!(ResizeFactor::new(0.01).is_ok());
        for bad in [0.0, -0.5, 1.0001, f64::NAN, f64::INFINITY] {
            assert!(ResizeFactor::new(bad).is_err(), "value {bad}");
        }
    }

    #[test]
    fn defaults_are_plain_variant() {
        let c = CompressionConfig::default();
        assert_eq!(c.quality.get(), 50);
        assert!(c.resize_factor.is_none());
        assert!(c.allows_extension("JPEG"));
        assert!(!c.allows_extension("bmp"));
    }

    #[test]
    fn preset_then_override() {
        let c = CompressionConfig::builder()
            .preset(Preset::Pixelated)
            .quality(80)
            .build()
            .unwrap();
        assert_eq!(c.quality.get(), 80);
        assert_eq!(c.resize_factor.map(ResizeFactor::get), Some(0.5));
    }

    #[test]
    fn from_preset_matches_builder() {
        let a = CompressionConfig::from_preset(Preset::Pixelated);
        let b = CompressionConfig::builder()
            .preset(Preset::Pixelated)
            .build()
            .unwrap();
        assert_eq!(a.quality, b.quality);
        assert_eq!(a.resize_factor, b.resize_factor);
    }

    #[test]
    fn builder_rejects_instead_of_clamping() {
        let err = CompressionConfig::builder().quality(150).build().unwrap_err();
        assert!(matches!(err, CompressError::InvalidParameter { name: "quality", .. }));

        let err = CompressionConfig::builder()
            .resize_factor(1.5)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            CompressError::InvalidParameter {
                name: "resize factor",
                ..
            }
        ));
    }

    #[test]
    fn builder_rejects_zero_concurrency() {
        let err = CompressionConfig::builder().concurrency(0).build().unwrap_err();
        assert!(matches!(err, CompressError::InvalidConfig(_)));
    }

    #[test]
    fn allowed_extensions_are_normalised() {
        let c = CompressionConfig::builder()
            .allowed_extensions([".PNG", "Gif"])
            .build()
            .unwrap();
        assert_eq!(c.allowed_extensions, vec!["png", "gif"]);
    }

    #[test]
    fn serde_rejects_out_of_range_quality() {
        assert!(serde_json::from_str::<Quality>("30").is_ok());
        assert!(serde_json::from_str::<Quality>("0").is_err());
        assert!(serde_json::from_str::<ResizeFactor>("2.0").is_err());
    }
}
