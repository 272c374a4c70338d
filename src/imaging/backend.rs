//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the operations branding needs: fit,
//! icon, placeholder and dominant color.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the pure Rust
//! `image` crate. Everything is statically linked into the binary.

use super::params::{FitParams, IconParams, PlaceholderParams, Rgb};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel size of an image written by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Every backend must implement all operations so branding code stays
/// backend-agnostic.
pub trait ImageBackend {
    /// Resize into a bounding box (never upscaling) and save as PNG.
    ///
    /// Returns the dimensions actually written.
    fn fit(&self, params: &FitParams) -> Result<Dimensions, BackendError>;

    /// Convert an image into an ICO file.
    fn icon(&self, params: &IconParams) -> Result<(), BackendError>;

    /// Write a solid-color PNG.
    fn placeholder(&self, params: &PlaceholderParams) -> Result<(), BackendError>;

    /// Most frequent opaque color of an image.
    fn dominant_color(&self, path: &Path) -> Result<Rgb, BackendError>;
}
