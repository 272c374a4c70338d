//! Image processing for branding assets, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Fit → PNG** | Lanczos3 resize, never upscaling |
//! | **Icon** | `image` ICO encoder |
//! | **Placeholder** | solid `RgbaImage` |
//! | **Dominant color** | quantized histogram |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and color math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{calculate_fit_dimensions, dominant_color};
pub use params::{FitParams, IconParams, PlaceholderParams, Rgb};
pub use rust_backend::RustBackend;
