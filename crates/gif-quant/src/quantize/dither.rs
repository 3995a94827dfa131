//! Ordered (Bayer) dithering offsets.
//!
//! Each pixel is processed independently: the offset at `(x, y)` depends only
//! on `(x mod N, y mod N)` and the threshold, so dithering parallelizes
//! freely and is independent of scan order.

use super::options::DitherMode;

const BAYER_2: [[u8; 2]; 2] = [[0, 2], [3, 1]];

const BAYER_4: [[u8; 4]; 4] = [[0, 8, 2, 10], [12, 4, 14, 6], [3, 11, 1, 9], [15, 7, 13, 5]];

/// Centered matrix value in `(-0.5, 0.5)`.
#[inline]
fn matrix_value(mode: DitherMode, x: usize, y: usize) -> f32 {
    let (rank, n) = match mode {
        DitherMode::None => return 0.0,
        DitherMode::Order2 => (BAYER_2[y % 2][x % 2], 2),
        DitherMode::Order4 => (BAYER_4[y % 4][x % 4], 4),
    };
    (rank as f32 + 0.5) / (n * n) as f32 - 0.5
}

/// The threshold actually applied: `0.0` selects `1/sqrt(palette_size)`.
pub(crate) fn resolve_threshold(threshold: f32, palette_size: usize) -> f32 {
    if threshold > 0.0 {
        threshold.min(1.0)
    } else {
        1.0 / (palette_size.max(1) as f32).sqrt()
    }
}

/// Offset added to each of R, G and B at pixel `(x, y)`.
#[inline]
pub fn dither_offset(mode: DitherMode, x: usize, y: usize, threshold: f32) -> f32 {
    256.0 * matrix_value(mode, x, y) * threshold
}

/// Apply an offset to a pixel's color channels, clamped to `0..=255`.
#[inline]
pub(crate) fn offset_rgb(px: [u8; 4], offset: f32) -> [u8; 3] {
    let shift = |c: u8| (c as f32 + offset).round().clamp(0.0, 255.0) as u8;
    [shift(px[0]), shift(px[1]), shift(px[2])]
}
