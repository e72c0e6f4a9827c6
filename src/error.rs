//! Error types for the pixel-compress library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`CompressError`] — **Fatal** for one invocation: the image cannot be
//!   turned into an artifact (bad parameter, undecodable bytes, encoder
//!   failure, unreadable file). Returned as `Err(CompressError)` from the
//!   `compress*` entry points.
//!
//! * [`FileError`] — **Non-fatal** inside a batch: one file failed but the
//!   others are fine. Stored inside [`crate::output::FileResult`] so callers
//!   can inspect partial success instead of losing the whole batch.
//!
//! Every [`CompressError`] maps onto a small [`ErrorKind`] taxonomy so a
//! delivery layer (HTTP handler, CLI) can decide between "reject the request"
//! and "internal failure" without matching on individual variants.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`CompressError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Quality, resize factor or another configuration value is out of range.
    InvalidParameter,
    /// Bytes are not a supported raster image, or the extension is not allowed.
    Decode,
    /// The encoder rejected a buffer the earlier stages produced.
    Encode,
    /// Reading the input or writing the output failed.
    Io,
    /// Unexpected failure outside the pipeline (task panic, runtime setup).
    Internal,
}

impl ErrorKind {
    /// `true` when the failure is caused by the caller's input and should be
    /// reported back as a rejection rather than an internal error.
    pub fn is_user_facing(self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidParameter | ErrorKind::Decode | ErrorKind::Io
        )
    }
}

/// All fatal errors returned by the pixel-compress library.
#[derive(Debug, Error)]
pub enum CompressError {
    // ── Parameter errors ──────────────────────────────────────────────────
    /// A pipeline parameter is outside its contractual range.
    #[error("Invalid {name}: {value} (expected {expected})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    /// Builder validation failed for a non-pipeline setting.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Decode errors ─────────────────────────────────────────────────────
    /// The file name's extension is not in the allow-list.
    #[error("Unsupported file type '{filename}'\nAllowed extensions: {}", .allowed.join(", "))]
    UnsupportedExtension {
        filename: String,
        allowed: Vec<String>,
    },

    /// The bytes could not be decoded as a supported raster image.
    #[error("Could not decode image: {detail}")]
    DecodeFailed { detail: String },

    /// The decoder produced an image with a zero dimension.
    #[error("Decoded image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    // ── Encode errors ─────────────────────────────────────────────────────
    /// JPEG encoding failed. Indicates a bug in an earlier stage.
    #[error("JPEG encoding failed: {detail}")]
    EncodeFailed { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Image file not found: '{}'\nCheck the path exists and is readable.", .path.display())]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{}'\nTry: chmod +r {:?}", .path.display(), .path)]
    PermissionDenied { path: PathBuf },

    /// Reading the input failed for another reason.
    #[error("Failed to read '{}': {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output file.
    #[error("Failed to write output file '{}': {source}", .path.display())]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Batch errors ──────────────────────────────────────────────────────
    /// Every file in a batch failed; nothing was produced.
    #[error("All {total} files failed.\nFirst error: {first_error}")]
    AllFilesFailed {
        total: usize,
        first_kind: ErrorKind,
        first_error: String,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CompressError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompressError::InvalidParameter { .. } | CompressError::InvalidConfig(_) => {
                ErrorKind::InvalidParameter
            }
            CompressError::UnsupportedExtension { .. }
            | CompressError::DecodeFailed { .. }
            | CompressError::EmptyImage { .. } => ErrorKind::Decode,
            CompressError::EncodeFailed { .. } => ErrorKind::Encode,
            CompressError::FileNotFound { .. }
            | CompressError::PermissionDenied { .. }
            | CompressError::ReadFailed { .. }
            | CompressError::OutputWriteFailed { .. } => ErrorKind::Io,
            CompressError::AllFilesFailed { first_kind, .. } => *first_kind,
            CompressError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn invalid_parameter(
        name: &'static str,
        value: impl ToString,
        expected: &'static str,
    ) -> Self {
        CompressError::InvalidParameter {
            name,
            value: value.to_string(),
            expected,
        }
    }
}

/// A non-fatal error for a single file in a batch.
///
/// Stored in [`crate::output::FileResult`] when a file fails.
/// The batch continues unless ALL files fail.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{}: {message}", .path.display())]
pub struct FileError {
    pub path: PathBuf,
    pub kind: ErrorKind,
    pub message: String,
}

impl FileError {
    pub fn new(path: impl Into<PathBuf>, err: &CompressError) -> Self {
        Self {
            path: path.into(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_parameter_display() {
        let e = CompressError::invalid_parameter("quality", 0, "an integer in 1..=100");
        let msg = e.to_string();
        assert!(msg.contains("quality"), "got: {msg}");
        assert!(msg.contains("1..=100"), "got: {msg}");
        assert_eq!(e.kind(), ErrorKind::InvalidParameter);
    }

    #[test]
    fn unsupported_extension_lists_allowed() {
        let e = CompressError::UnsupportedExtension {
            filename: "notes.txt".into(),
            allowed: vec!["png".into(), "jpg".into()],
        };
        assert!(e.to_string().contains("png, jpg"));
        assert_eq!(e.kind(), ErrorKind::Decode);
    }

    #[test]
    fn encode_failure_is_not_user_facing() {
        let e = CompressError::EncodeFailed {
            detail: "short buffer".into(),
        };
        assert_eq!(e.kind(), ErrorKind::Encode);
        assert!(!e.kind().is_user_facing());
    }

    #[test]
    fn all_files_failed_carries_first_kind() {
        let e = CompressError::AllFilesFailed {
            total: 3,
            first_kind: ErrorKind::Decode,
            first_error: "bad bytes".into(),
        };
        assert_eq!(e.kind(), ErrorKind::Decode);
        assert!(e.to_string().contains("All 3 files"));
    }

    #[test]
    fn file_error_display_includes_path() {
        let err = CompressError::FileNotFound {
            path: "missing.png".into(),
        };
        let fe = FileError::new("missing.png", &err);
        assert_eq!(fe.kind, ErrorKind::Io);
        assert!(fe.to_string().starts_with("missing.png: "));
    }
}
