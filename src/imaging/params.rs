//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between [`branding`](crate::branding) (which decides which images
//! the package needs) and the [`backend`](super::backend) (which does the
//! actual pixel work), so tests can swap in a mock backend.
//!
//! ## Types
//!
//! - [`Rgb`]: An opaque color, parsed from and printed as `#RRGGBB`.
//! - [`FitParams`]: Resize into a bounding box preserving aspect ratio, saved as PNG.
//! - [`IconParams`]: Convert a PNG into a Windows ICO favicon.
//! - [`PlaceholderParams`]: Solid-color PNG used when no image was supplied.

use std::fmt;
use std::path::PathBuf;

/// 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` or the short `#RGB` form. Case-insensitive.
    pub fn from_hex(value: &str) -> Option<Self> {
        let digits = value.strip_prefix('#')?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match digits.len() {
            6 => Some(Self::new(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            3 => {
                let expand = |i: usize| channel(&digits[i..i + 1]).map(|v| v * 17);
                Some(Self::new(expand(0)?, expand(1)?, expand(2)?))
            }
            _ => None,
        }
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Resize `source` to fit inside `max_width` x `max_height` and write a PNG.
#[derive(Debug, Clone, PartialEq)]
pub struct FitParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub max_width: u32,
    pub max_height: u32,
}

/// Encode `source` as an ICO file.
#[derive(Debug, Clone, PartialEq)]
pub struct IconParams {
    pub source: PathBuf,
    pub output: PathBuf,
}

/// Write a solid `color` PNG of the given size.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderParams {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub color: Rgb,
}
