//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, WebP, ICO) | `image` crate, format sniffed from content |
//! | Fit | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → PNG / ICO | `image::DynamicImage::save_with_format` |
//! | Dominant color | [`dominant_color`](super::calculations::dominant_color) on a 64px thumbnail |
//!
//! Branding inputs are often fetched from URLs into extension-less temp files,
//! so the decoder never trusts the file name.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{calculate_fit_dimensions, dominant_color};
use super::params::{FitParams, IconParams, PlaceholderParams, Rgb};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, Rgba, RgbaImage};
use std::path::Path;

/// Edge of the thumbnail sampled for dominant color.
const COLOR_SAMPLE_EDGE: u32 = 64;

/// Pure Rust backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk, sniffing the format from content.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

fn save_image(img: &DynamicImage, path: &Path, format: ImageFormat) -> Result<(), BackendError> {
    img.save_with_format(path, format).map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to encode {}: {}", path.display(), e))
    })
}

impl ImageBackend for RustBackend {
    fn fit(&self, params: &FitParams) -> Result<Dimensions, BackendError> {
        let img = load_image(&params.source)?;
        let (width, height) = calculate_fit_dimensions(
            (img.width(), img.height()),
            (params.max_width, params.max_height),
        );
        let fitted = if (width, height) == (img.width(), img.height()) {
            img
        } else {
            img.resize_exact(width, height, FilterType::Lanczos3)
        };
        save_image(&fitted, &params.output, ImageFormat::Png)?;
        Ok(Dimensions { width, height })
    }

    fn icon(&self, params: &IconParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        // ICO entries are at most 256px.
        let (width, height) = calculate_fit_dimensions((img.width(), img.height()), (256, 256));
        let img = if (width, height) == (img.width(), img.height()) {
            img
        } else {
            img.resize_exact(width, height, FilterType::Lanczos3)
        };
        save_image(
            &DynamicImage::ImageRgba8(img.to_rgba8()),
            &params.output,
            ImageFormat::Ico,
        )
    }

    fn placeholder(&self, params: &PlaceholderParams) -> Result<(), BackendError> {
        let Rgb { r, g, b } = params.color;
        let img = RgbaImage::from_pixel(params.width, params.height, Rgba([r, g, b, 255]));
        save_image(&DynamicImage::ImageRgba8(img), &params.output, ImageFormat::Png)
    }

    fn dominant_color(&self, path: &Path) -> Result<Rgb, BackendError> {
        let sample = load_image(path)?
            .thumbnail(COLOR_SAMPLE_EDGE, COLOR_SAMPLE_EDGE)
            .to_rgba8();
        dominant_color(sample.pixels().map(|p| p.0)).ok_or_else(|| {
            BackendError::ProcessingFailed(format!("No opaque pixel in {}", path.display()))
        })
    }
}
