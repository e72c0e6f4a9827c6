//! Lossy encoding: `PixelatedImage` → JPEG bytes wrapped in `EncodedArtifact`.
//!
//! Every encode requests optimised Huffman tables. The default backend is
//! the pure-Rust `jpeg-encoder`; build with `--features mozjpeg` to use
//! mozjpeg instead.
//!
//! Grayscale input is written as a single-component JPEG rather than being
//! widened to RGB first.

use crate::config::Quality;
use crate::error::CompressError;
use crate::output::EncodedArtifact;
use crate::pipeline::normalize::NormalizedImage;
use crate::pipeline::pixelate::PixelatedImage;
use tracing::debug;

/// Largest side a baseline JPEG can describe.
pub const JPEG_MAX_DIMENSION: u32 = 65_535;

/// Validate `quality` and encode `image` as JPEG.
///
/// # Errors
/// * [`CompressError::InvalidParameter`] — quality not in `1..=100`; the
///   encoder is not invoked
/// * [`CompressError::EncodeFailed`] — the pixel buffer is inconsistent with
///   its dimensions, or the backend failed
pub fn encode(image: &PixelatedImage, quality: i32) -> Result<EncodedArtifact, CompressError> {
    let quality = Quality::new(quality)?;
    encode_with(image, quality)
}

/// Encode with an already validated quality.
pub fn encode_with(image: &PixelatedImage, quality: Quality) -> Result<EncodedArtifact, CompressError> {
    let img = image.image();
    check_buffer(img)?;

    let bytes = backend::encode_jpeg(img, quality.get(), true)?;
    debug!(
        "Encoded {}x{} {} at q{} → {} bytes",
        img.width(),
        img.height(),
        if img.is_grayscale() { "L" } else { "RGB" },
        quality,
        bytes.len()
    );
    Ok(EncodedArtifact::jpeg(bytes))
}

/// The earlier stages guarantee these; a violation is a bug, not bad input.
fn check_buffer(img: &NormalizedImage) -> Result<(), CompressError> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 || w > JPEG_MAX_DIMENSION || h > JPEG_MAX_DIMENSION {
        return Err(CompressError::EncodeFailed {
            detail: format!("dimensions {w}x{h} outside 1..={JPEG_MAX_DIMENSION}"),
        });
    }
    let expected = w as usize * h as usize * img.channels();
    if img.as_raw().len() != expected {
        return Err(CompressError::EncodeFailed {
            detail: format!(
                "buffer holds {} bytes, expected {expected}",
                img.as_raw().len()
            ),
        });
    }
    Ok(())
}

#[cfg(not(feature = "mozjpeg"))]
mod backend {
    use super::*;
    use jpeg_encoder::{ColorType, Encoder};

    pub(super) fn encode_jpeg(
        img: &NormalizedImage,
        quality: u8,
        optimize: bool,
    ) -> Result<Vec<u8>, CompressError> {
        let color = if img.is_grayscale() {
            ColorType::Luma
        } else {
            ColorType::Rgb
        };
        // check_buffer has bounded both sides to u16.
        let (w, h) = (img.width() as u16, img.height() as u16);

        let mut buf = Vec::new();
        let mut encoder = Encoder::new(&mut buf, quality);
        encoder.set_optimized_huffman_tables(optimize);
        encoder
            .encode(img.as_raw(), w, h, color)
            .map_err(|e| CompressError::EncodeFailed {
                detail: e.to_string(),
            })?;
        Ok(buf)
    }
}

#[cfg(feature = "mozjpeg")]
mod backend {
    use super::*;
    use mozjpeg::{ColorSpace, Compress};

    pub(super) fn encode_jpeg(
        img: &NormalizedImage,
        quality: u8,
        optimize: bool,
    ) -> Result<Vec<u8>, CompressError> {
        let encode_failed = |e: std::io::Error| CompressError::EncodeFailed {
            detail: format!("mozjpeg: {e}"),
        };
        let color_space = if img.is_grayscale() {
            ColorSpace::JCS_GRAYSCALE
        } else {
            ColorSpace::JCS_RGB
        };

        let mut comp = Compress::new(color_space);
        comp.set_size(img.width() as usize, img.height() as usize);
        comp.set_quality(f32::from(quality));
        comp.set_optimize_coding(optimize);

        let estimated = (img.as_raw().len() / 10).max(4096);
        let mut started = comp
            .start_compress(Vec::with_capacity(estimated))
            .map_err(encode_failed)?;
        started.write_scanlines(img.as_raw()).map_err(encode_failed)?;
        started.finish().map_err(encode_failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::pixelate::pixelate;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    fn noisy(w: u32, h: u32) -> NormalizedImage {
        NormalizedImage::Rgb(RgbImage::from_fn(w, h, |x, y| {
            let v = x.wrapping_mul(31) ^ y.wrapping_mul(17);
            Rgb([v as u8, (v >> 2) as u8, (x + y) as u8])
        }))
    }

    #[test]
    fn encodes_jpeg_with_soi_marker() {
        let art = encode(&PixelatedImage::passthrough(noisy(16, 16)), 75).unwrap();
        assert_eq!(art.content_type(), "image/jpeg");
        assert_eq!(&art.bytes()[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(art.bytes()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 16));
    }

    #[test]
    fn encodes_grayscale() {
        let gray = GrayImage::from_fn(9, 5, |x, _| Luma([x as u8 * 20]));
        let art = encode(&PixelatedImage::passthrough(NormalizedImage::Luma(gray)), 50).unwrap();
        let decoded = image::load_from_memory(art.bytes()).unwrap();
        assert_eq!(decoded.color(), image::ColorType::L8);
    }

    #[test]
    fn rejects_out_of_range_quality() {
        let img = PixelatedImage::passthrough(noisy(4, 4));
        for bad in [0, -1, 101, 1000] {
            let err = encode(&img, bad).unwrap_err();
            assert!(
                matches!(err, CompressError::InvalidParameter { name: "quality", .. }),
                "quality {bad}: {err:?}"
            );
        }
        assert!(encode(&img, 1).is_ok());
        assert!(encode(&img, 100).is_ok());
    }

    #[test]
    fn optimised_tables_are_not_larger() {
        let img = pixelate(noisy(120, 80), 0.5).unwrap();
        for q in [30, 75] {
            let optimised = backend::encode_jpeg(img.image(), q, true).unwrap();
            let standard = backend::encode_jpeg(img.image(), q, false).unwrap();
            assert!(
                optimised.len() <= standard.len(),
                "q{q}: optimised {} > standard {}",
                optimised.len(),
                standard.len()
            );
            let decoded = image::load_from_memory(&optimised).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (120, 80));
        }
        // The public path always optimises.
        let public = encode(&img, 30).unwrap();
        let optimised = backend::encode_jpeg(img.image(), 30, true).unwrap();
        assert_eq!(public.bytes(), optimised.as_slice());
    }

    #[test]
    fn lower_quality_is_not_larger() {
        let img = pixelate(noisy(96, 64), 0.5).unwrap();
        let sizes: Vec<usize> = [10, 30, 60, 90]
            .iter()
            .map(|&q| encode(&img, q).unwrap().len())
            .collect();
        for pair in sizes.windows(2) {
            assert!(pair[0] <= pair[1], "sizes not monotonic: {sizes:?}");
        }
    }
}
