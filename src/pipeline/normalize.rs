//! Format normalisation: any decoded raster → 8-bit RGB or grayscale.
//!
//! JPEG has no alpha channel and no palette, and baseline encoders only take
//! 8-bit samples. Every decoded [`PixelFormat`] is handled here explicitly;
//! adding a variant is a compile error until this module decides what to do
//! with it.

use crate::config::Background;
use crate::error::CompressError;
use image::{ColorType, DynamicImage, GrayImage, ImageFormat, Rgb, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};

/// Pixel layout of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Luma8,
    Luma16,
    LumaAlpha8,
    LumaAlpha16,
    Rgb8,
    Rgb16,
    Rgb32F,
    Rgba8,
    Rgba16,
    Rgba32F,
    /// Palette-based source. The decoder has already resolved indices into
    /// RGBA samples, which may include a transparent index.
    Indexed,
}

impl PixelFormat {
    /// Classify a decoded image.
    ///
    /// GIF is palette-based by construction, so GIF sources are always
    /// [`PixelFormat::Indexed`] regardless of the expanded colour type.
    pub fn classify(color: ColorType, container: ImageFormat) -> Self {
        if container == ImageFormat::Gif {
            return PixelFormat::Indexed;
        }
        match color {
            ColorType::L8 => PixelFormat::Luma8,
            ColorType::L16 => PixelFormat::Luma16,
            ColorType::La8 => PixelFormat::LumaAlpha8,
            ColorType::La16 => PixelFormat::LumaAlpha16,
            ColorType::Rgb8 => PixelFormat::Rgb8,
            ColorType::Rgb16 => PixelFormat::Rgb16,
            ColorType::Rgb32F => PixelFormat::Rgb32F,
            ColorType::Rgba8 => PixelFormat::Rgba8,
            ColorType::Rgba16 => PixelFormat::Rgba16,
            ColorType::Rgba32F => PixelFormat::Rgba32F,
            // `ColorType` is non-exhaustive; map unknown layouts by shape.
            other => match (other.has_color(), other.has_alpha()) {
                (true, true) => PixelFormat::Rgba32F,
                (true, false) => PixelFormat::Rgb32F,
                (false, true) => PixelFormat::LumaAlpha16,
                (false, false) => PixelFormat::Luma16,
            },
        }
    }

    pub fn has_alpha(self) -> bool {
        matches!(
            self,
            PixelFormat::LumaAlpha8
                | PixelFormat::LumaAlpha16
                | PixelFormat::Rgba8
                | PixelFormat::Rgba16
                | PixelFormat::Rgba32F
        )
    }

    pub fn is_indexed(self) -> bool {
        self == PixelFormat::Indexed
    }

    /// `true` for formats that normalise to grayscale.
    pub fn is_grayscale(self) -> bool {
        matches!(self, PixelFormat::Luma8 | PixelFormat::Luma16)
    }
}

/// A decoded raster owned by one pipeline invocation.
#[derive(Debug, Clone)]
pub struct SourceImage {
    image: DynamicImage,
    container: ImageFormat,
    format: PixelFormat,
}

impl SourceImage {
    /// Wrap a decoded image. Zero-sized images are rejected.
    pub fn new(image: DynamicImage, container: ImageFormat) -> Result<Self, CompressError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(CompressError::EmptyImage {
                width: image.width(),
                height: image.height(),
            });
        }
        let format = PixelFormat::classify(image.color(), container);
        Ok(Self {
            image,
            container,
            format,
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    pub fn container(&self) -> ImageFormat {
        self.container
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }
}

/// An opaque 8-bit raster the JPEG encoder accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedImage {
    Rgb(RgbImage),
    Luma(GrayImage),
}

impl NormalizedImage {
    pub fn width(&self) -> u32 {
        match self {
            NormalizedImage::Rgb(img) => img.width(),
            NormalizedImage::Luma(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            NormalizedImage::Rgb(img) => img.height(),
            NormalizedImage::Luma(img) => img.height(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn is_grayscale(&self) -> bool {
        matches!(self, NormalizedImage::Luma(_))
    }

    /// Interleaved samples: 3 bytes per pixel for RGB, 1 for grayscale.
    pub fn as_raw(&self) -> &[u8] {
        match self {
            NormalizedImage::Rgb(img) => img.as_raw(),
            NormalizedImage::Luma(img) => img.as_raw(),
        }
    }

    pub fn channels(&self) -> usize {
        match self {
            NormalizedImage::Rgb(_) => 3,
            NormalizedImage::Luma(_) => 1,
        }
    }

    pub fn into_dynamic(self) -> DynamicImage {
        match self {
            NormalizedImage::Rgb(img) => DynamicImage::ImageRgb8(img),
            NormalizedImage::Luma(img) => DynamicImage::ImageLuma8(img),
        }
    }
}

/// Normalise with the default policy: alpha is discarded.
pub fn normalize(image: SourceImage) -> NormalizedImage {
    normalize_with(image, Background::Discard)
}

/// Normalise `image`, flattening alpha and palette sources per `background`.
///
/// * `Luma8`, `Rgb8` — passed through unchanged
/// * `Luma16` — reduced to 8-bit grayscale
/// * `Rgb16`, `Rgb32F` — reduced to 8-bit RGB
/// * alpha and indexed formats — flattened to opaque 8-bit RGB
pub fn normalize_with(image: SourceImage, background: Background) -> NormalizedImage {
    let SourceImage { image, format, .. } = image;
    match format {
        PixelFormat::Luma8 | PixelFormat::Luma16 => NormalizedImage::Luma(image.into_luma8()),
        PixelFormat::Rgb8 | PixelFormat::Rgb16 | PixelFormat::Rgb32F => {
            NormalizedImage::Rgb(image.into_rgb8())
        }
        PixelFormat::LumaAlpha8
        | PixelFormat::LumaAlpha16
        | PixelFormat::Rgba8
        | PixelFormat::Rgba16
        | PixelFormat::Rgba32F
        | PixelFormat::Indexed => NormalizedImage::Rgb(flatten(&image.into_rgba8(), background)),
    }
}

/// Remove the alpha channel from `rgba`.
pub fn flatten(rgba: &RgbaImage, background: Background) -> RgbImage {
    let (w, h) = rgba.dimensions();
    let mut out = RgbImage::new(w, h);
    for (dst, src) in out.pixels_mut().zip(rgba.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = match background {
            Background::Discard => Rgb([r, g, b]),
            Background::Solid([br, bg, bb]) => Rgb([
                composite(r, br, a),
                composite(g, bg, a),
                composite(b, bb, a),
            ]),
        };
    }
    out
}

/// `fg` over opaque `bg` at coverage `alpha`, rounded to nearest.
fn composite(fg: u8, bg: u8, alpha: u8) -> u8 {
    let a = u32::from(alpha);
    ((u32::from(fg) * a + u32::from(bg) * (255 - a) + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayAlphaImage, ImageBuffer, Luma, LumaA, Rgba};

    fn source(img: DynamicImage) -> SourceImage {
        SourceImage::new(img, ImageFormat::Png).unwrap()
    }

    #[test]
    fn rgb_passes_through_unchanged() {
        let rgb = RgbImage::from_fn(3, 2, |x, y| Rgb([x as u8 * 40, y as u8 * 90, 7]));
        let out = normalize(source(DynamicImage::ImageRgb8(rgb.clone())));
        assert_eq!(out, NormalizedImage::Rgb(rgb));
    }

    #[test]
    fn grayscale_passes_through_unchanged() {
        let gray = GrayImage::from_fn(5, 5, |x, y| Luma([(x * 50 + y) as u8]));
        let out = normalize(source(DynamicImage::ImageLuma8(gray.clone())));
        assert_eq!(out, NormalizedImage::Luma(gray));
    }

    #[test]
    fn gray16_stays_grayscale() {
        let gray: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_pixel(2, 2, Luma([u16::MAX]));
        let src = source(DynamicImage::ImageLuma16(gray));
        assert_eq!(src.pixel_format(), PixelFormat::Luma16);
        let out = normalize(src);
        assert_eq!(out, NormalizedImage::Luma(GrayImage::from_pixel(2, 2, Luma([255]))));
    }

    #[test]
    fn rgba_becomes_rgb_keeping_dimensions() {
        let rgba = RgbaImage::from_pixel(7, 4, Rgba([200, 100, 50, 0]));
        let src = source(DynamicImage::ImageRgba8(rgba));
        assert!(src.pixel_format().has_alpha());
        let out = normalize(src);
        assert_eq!(out.dimensions(), (7, 4));
        assert_eq!(out, NormalizedImage::Rgb(RgbImage::from_pixel(7, 4, Rgb([200, 100, 50]))));
    }

    #[test]
    fn gray_alpha_becomes_rgb() {
        let la = GrayAlphaImage::from_pixel(2, 2, LumaA([90, 255]));
        let out = normalize(source(DynamicImage::ImageLumaA8(la)));
        assert!(!out.is_grayscale());
        assert_eq!(out, NormalizedImage::Rgb(RgbImage::from_pixel(2, 2, Rgb([90, 90, 90]))));
    }

    #[test]
    fn solid_background_composites() {
        let rgba = RgbaImage::from_fn(3, 1, |x, _| match x {
            0 => Rgba([0, 0, 0, 0]),
            1 => Rgba([0, 0, 0, 255]),
            _ => Rgba([255, 0, 0, 128]),
        });
        let out = flatten(&rgba, Background::Solid([255, 255, 255]));
        assert_eq!(out.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(out.get_pixel(1, 0), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(2, 0), &Rgb([255, 127, 127]));
    }

    #[test]
    fn gif_is_classified_as_indexed() {
        assert_eq!(
            PixelFormat::classify(ColorType::Rgba8, ImageFormat::Gif),
            PixelFormat::Indexed
        );
        assert_eq!(
            PixelFormat::classify(ColorType::Rgba8, ImageFormat::Png),
            PixelFormat::Rgba8
        );
    }

    #[test]
    fn zero_sized_source_is_rejected() {
        let err = SourceImage::new(DynamicImage::new_rgb8(0, 5), ImageFormat::Png).unwrap_err();
        assert!(matches!(err, CompressError::EmptyImage { width: 0, height: 5 }));
    }
}
