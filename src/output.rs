//! Result types returned by the compress entry points.

use crate::error::{CompressError, FileError};
use crate::pipeline::normalize::PixelFormat;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Content type of every artifact this crate produces.
pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Filename used when the original name is unknown.
pub const DEFAULT_ARTIFACT_NAME: &str = "compressed_image.jpg";

/// States an image moves through during one invocation.
///
/// A failure can happen in any state; the error is returned instead of the
/// next state being entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Received,
    Decoded,
    Normalized,
    Pixelated,
    Encoded,
    Delivered,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineStage::Received => "received",
            PipelineStage::Decoded => "decoded",
            PipelineStage::Normalized => "normalized",
            PipelineStage::Pixelated => "pixelated",
            PipelineStage::Encoded => "encoded",
            PipelineStage::Delivered => "delivered",
        };
        f.write_str(s)
    }
}

/// Encoded JPEG bytes plus the metadata a delivery layer needs.
///
/// Ownership of the buffer passes to the caller; the crate keeps no copy.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedArtifact {
    bytes: Vec<u8>,
    filename: String,
}

impl EncodedArtifact {
    pub(crate) fn jpeg(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            filename: DEFAULT_ARTIFACT_NAME.to_string(),
        }
    }

    /// Replace the suggested download name.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Always `image/jpeg`.
    pub fn content_type(&self) -> &'static str {
        JPEG_CONTENT_TYPE
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// `data:image/jpeg;base64,…` for embedding in HTML or JSON responses.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", JPEG_CONTENT_TYPE, self.to_base64())
    }

    /// Write the bytes to `path` atomically (temp file in the same
    /// directory, then rename), creating parent directories as needed.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), CompressError> {
        let path = path.as_ref();
        let write_err = |source| CompressError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        };

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(write_err)?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
        tmp.write_all(&self.bytes).map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

impl fmt::Debug for EncodedArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedArtifact")
            .field("filename", &self.filename)
            .field("content_type", &JPEG_CONTENT_TYPE)
            .field("len", &self.bytes.len())
            .finish()
    }
}

// The byte payload is left out; `--json` output describes the artifact.
impl Serialize for EncodedArtifact {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("EncodedArtifact", 3)?;
        s.serialize_field("filename", &self.filename)?;
        s.serialize_field("content_type", JPEG_CONTENT_TYPE)?;
        s.serialize_field("size", &self.bytes.len())?;
        s.end()
    }
}

/// Wall-clock time spent reaching one pipeline state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: PipelineStage,
    pub duration_us: u64,
}

/// Statistics for a single invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionStats {
    /// Size of the caller's input buffer.
    pub input_bytes: usize,
    /// Size of the encoded JPEG.
    pub output_bytes: usize,
    /// Detected container, e.g. `"png"`.
    pub container: String,
    /// Pixel format reported by the decoder.
    pub pixel_format: PixelFormat,
    pub width: u32,
    pub height: u32,
    /// Shrunk size used by the resampler, `None` when pixelation was skipped.
    pub intermediate: Option<(u32, u32)>,
    pub quality: u8,
    pub resize_factor: Option<f64>,
    pub stages: Vec<StageTiming>,
    pub total_duration_ms: u64,
}

impl CompressionStats {
    /// `output_bytes / input_bytes`; below 1.0 means the file shrank.
    pub fn compression_ratio(&self) -> f64 {
        if self.input_bytes == 0 {
            return 0.0;
        }
        self.output_bytes as f64 / self.input_bytes as f64
    }
}

/// Artifact plus stats for one image.
#[derive(Debug, Clone, Serialize)]
pub struct CompressionOutput {
    pub artifact: EncodedArtifact,
    pub stats: CompressionStats,
}

/// Outcome for one file of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    /// 0-based position in the input list.
    pub index: usize,
    pub input: PathBuf,
    /// Where the artifact was written, on success.
    pub output: Option<PathBuf>,
    pub stats: Option<CompressionStats>,
    pub error: Option<FileError>,
}

impl FileResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate numbers for a batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_files: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_input_bytes: u64,
    pub total_output_bytes: u64,
    pub total_duration_ms: u64,
}

/// Result of [`crate::batch::compress_batch`], sorted by input index.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutput {
    pub files: Vec<FileResult>,
    pub stats: BatchStats,
}

impl BatchOutput {
    pub fn failures(&self) -> impl Iterator<Item = &FileError> {
        self.files.iter().filter_map(|f| f.error.as_ref())
    }
}
