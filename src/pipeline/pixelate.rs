//! Pixelation: nearest-neighbour shrink, then nearest-neighbour restore.
//!
//! Any smoothing filter would blur block edges, so both passes copy source
//! samples verbatim. The coordinate rule is shared by the two passes: output
//! index `d` on an axis of `dst` samples reads source index
//!
//! ```text
//! s = floor((2d + 1) · src / (2 · dst))      clamped to src − 1
//! ```
//!
//! i.e. the source sample under the centre of the output pixel, computed in
//! integer arithmetic so block boundaries never drift with float rounding.
//! For `src == dst` the rule yields `s = d`, which makes a factor of 1.0 an
//! exact identity.

use crate::config::ResizeFactor;
use crate::error::CompressError;
use crate::pipeline::normalize::NormalizedImage;
use image::{ImageBuffer, Pixel};
use tracing::debug;

/// A normalised image after the resample stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelatedImage {
    image: NormalizedImage,
    intermediate: Option<(u32, u32)>,
}

impl PixelatedImage {
    /// Skip the resample stage.
    pub fn passthrough(image: NormalizedImage) -> Self {
        Self {
            image,
            intermediate: None,
        }
    }

    pub fn image(&self) -> &NormalizedImage {
        &self.image
    }

    pub fn into_image(self) -> NormalizedImage {
        self.image
    }

    /// Shrunk size used between the passes; `None` if nothing was resampled.
    pub fn intermediate(&self) -> Option<(u32, u32)> {
        self.intermediate
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Size of the shrunk image for `factor`: each side rounded, minimum 1.
pub fn intermediate_dimensions(width: u32, height: u32, factor: ResizeFactor) -> (u32, u32) {
    let scale = |len: u32| -> u32 {
        let scaled = (f64::from(len) * factor.get()).round();
        (scaled as u32).clamp(1, len.max(1))
    };
    (scale(width), scale(height))
}

/// Validate `resize_factor` and pixelate `image`.
///
/// # Errors
/// [`CompressError::InvalidParameter`] if the factor is not in `(0, 1]`.
pub fn pixelate(image: NormalizedImage, resize_factor: f64) -> Result<PixelatedImage, CompressError> {
    let factor = ResizeFactor::new(resize_factor)?;
    Ok(pixelate_with(image, factor))
}

/// Pixelate with an already validated factor. Cannot fail.
pub fn pixelate_with(image: NormalizedImage, factor: ResizeFactor) -> PixelatedImage {
    let (w, h) = image.dimensions();
    let (iw, ih) = intermediate_dimensions(w, h, factor);
    if factor.is_identity() || (iw, ih) == (w, h) {
        debug!("Pixelate: factor {} is a no-op at {}x{}", factor, w, h);
        return PixelatedImage::passthrough(image);
    }

    debug!("Pixelate: {}x{} → {}x{} → {}x{}", w, h, iw, ih, w, h);
    let image = match image {
        NormalizedImage::Rgb(img) => NormalizedImage::Rgb(shrink_restore(&img, iw, ih)),
        NormalizedImage::Luma(img) => NormalizedImage::Luma(shrink_restore(&img, iw, ih)),
    };
    PixelatedImage {
        image,
        intermediate: Some((iw, ih)),
    }
}

fn shrink_restore<P: Pixel>(
    src: &ImageBuffer<P, Vec<P::Subpixel>>,
    iw: u32,
    ih: u32,
) -> ImageBuffer<P, Vec<P::Subpixel>> {
    let small = resample_nearest(src, iw, ih);
    resample_nearest(&small, src.width(), src.height())
}

/// Nearest-neighbour resample of `src` to `width × height`.
pub fn resample_nearest<P: Pixel>(
    src: &ImageBuffer<P, Vec<P::Subpixel>>,
    width: u32,
    height: u32,
) -> ImageBuffer<P, Vec<P::Subpixel>> {
    let xs = index_map(src.width(), width);
    let ys = index_map(src.height(), height);
    ImageBuffer::from_fn(width, height, |x, y| {
        *src.get_pixel(xs[x as usize], ys[y as usize])
    })
}

/// Source index for every destination index on one axis.
fn index_map(src_len: u32, dst_len: u32) -> Vec<u32> {
    let src = u64::from(src_len);
    let dst = u64::from(dst_len);
    let last = src.saturating_sub(1);
    (0..dst)
        .map(|d| ((2 * d + 1) * src / (2 * dst)).min(last) as u32)
        .collect()
}
