//! Pure calculation functions for branding images.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::Rgb;

/// Calculate the dimensions of `source` scaled to fit inside `max`.
///
/// The aspect ratio is preserved and images are never upscaled: a source that
/// already fits is returned unchanged. Each edge is at least 1px.
///
/// # Examples
/// ```
/// # use nautilus_zim::imaging::calculate_fit_dimensions;
/// // wide logo into the 300x65 logo box → height-bound
/// assert_eq!(calculate_fit_dimensions((600, 100), (300, 65)), (300, 50));
///
/// // small favicon stays as is
/// assert_eq!(calculate_fit_dimensions((32, 32), (48, 48)), (32, 32));
/// ```
pub fn calculate_fit_dimensions(source: (u32, u32), max: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = max;

    if src_w == 0 || src_h == 0 || (src_w <= max_w && src_h <= max_h) {
        return source;
    }

    let scale = f64::min(max_w as f64 / src_w as f64, max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, max_w.max(1));
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, max_h.max(1));
    (w, h)
}

/// Most common color among `pixels`, after quantizing to 16 levels per channel.
///
/// Pixels with alpha below 128 are ignored so transparent padding does not win.
/// The returned color is the average of the winning bucket. Ties go to the
/// bucket seen first. `None` when every pixel is transparent.
pub fn dominant_color(pixels: impl IntoIterator<Item = [u8; 4]>) -> Option<Rgb> {
    // (count, sum r, sum g, sum b, first seen)
    let mut buckets: std::collections::HashMap<(u8, u8, u8), (u64, u64, u64, u64, usize)> =
        std::collections::HashMap::new();

    for (seen, [r, g, b, a]) in pixels.into_iter().enumerate() {
        if a < 128 {
            continue;
        }
        let bucket = buckets
            .entry((r >> 4, g >> 4, b >> 4))
            .or_insert((0, 0, 0, 0, seen));
        bucket.0 += 1;
        bucket.1 += r as u64;
        bucket.2 += g as u64;
        bucket.3 += b as u64;
    }

    let (count, r, g, b, _) = buckets
        .into_values()
        .max_by(|x, y| x.0.cmp(&y.0).then(y.4.cmp(&x.4)))?;
    Some(Rgb::new(
        (r / count) as u8,
        (g / count) as u8,
        (b / count) as u8,
    ))
}
