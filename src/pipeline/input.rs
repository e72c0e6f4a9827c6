//! Input handling: the extension gate and the bounded decode.
//!
//! The extension check only looks at the name the caller supplied; the
//! decoder still sniffs the real container from the magic bytes, so a PNG
//! uploaded as `photo.jpg` decodes fine and a text file renamed to
//! `notes.png` fails with [`CompressError::DecodeFailed`].
//!
//! Decoding runs under [`image::Limits`] built from the config so a tiny
//! compressed file that claims a 100 000 × 100 000 canvas is rejected from
//! its header, before any pixel memory is allocated.

use crate::config::CompressionConfig;
use crate::error::CompressError;
use crate::output::DEFAULT_ARTIFACT_NAME;
use crate::pipeline::normalize::SourceImage;
use image::{ImageFormat, ImageReader, Limits};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Return the suffix after the last `.`, if there is a non-empty one.
pub fn extension_of(filename: &str) -> Option<&str> {
    match filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Some(ext),
        _ => None,
    }
}

/// `true` if `filename` ends in an extension from the config's allow-list.
pub fn is_allowed_file(filename: &str, config: &CompressionConfig) -> bool {
    extension_of(filename).is_some_and(|ext| config.allows_extension(ext))
}

/// Reject `filename` unless its extension is allow-listed.
pub fn check_extension(filename: &str, config: &CompressionConfig) -> Result<(), CompressError> {
    if is_allowed_file(filename, config) {
        Ok(())
    } else {
        Err(CompressError::UnsupportedExtension {
            filename: filename.to_string(),
            allowed: config.allowed_extensions.clone(),
        })
    }
}

/// Suggested download name for the artifact: `compressed_<stem>.jpg`.
///
/// Directory components are ignored. Falls back to
/// `compressed_image.jpg` when the name has no usable stem.
pub fn output_filename(original: &str) -> String {
    Path::new(original)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(|stem| format!("compressed_{stem}.jpg"))
        .unwrap_or_else(|| DEFAULT_ARTIFACT_NAME.to_string())
}

/// Short lower-case name for a container format, e.g. `"png"`.
pub fn container_name(format: ImageFormat) -> &'static str {
    format.extensions_str().first().copied().unwrap_or("unknown")
}

/// Decode `bytes` into a [`SourceImage`].
///
/// Multi-frame GIFs yield their first frame.
///
/// # Errors
/// * [`CompressError::DecodeFailed`] — empty buffer, unrecognised magic
///   bytes, corrupt data, or a limit from the config was exceeded
/// * [`CompressError::EmptyImage`] — the header declares a zero dimension
pub fn decode(bytes: &[u8], config: &CompressionConfig) -> Result<SourceImage, CompressError> {
    if bytes.is_empty() {
        return Err(CompressError::DecodeFailed {
            detail: "input is empty".into(),
        });
    }

    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CompressError::DecodeFailed {
            detail: e.to_string(),
        })?;

    let format = reader.format().ok_or_else(|| CompressError::DecodeFailed {
        detail: "unrecognised image format".into(),
    })?;

    let mut limits = Limits::default();
    limits.max_image_width = Some(config.max_dimension);
    limits.max_image_height = Some(config.max_dimension);
    limits.max_alloc = Some(config.max_alloc_bytes);
    reader.limits(limits);

    let image = reader.decode().map_err(|e| CompressError::DecodeFailed {
        detail: e.to_string(),
    })?;

    debug!(
        "Decoded {} → {}x{} {:?}",
        container_name(format),
        image.width(),
        image.height(),
        image.color()
    );

    SourceImage::new(image, format)
}
