//! Fast-mode sample reduction.
//!
//! Clustering cost grows with `palette_size × samples`, so fast mode clusters
//! on the coarsest 2×2 box-filtered mip level holding no more than
//! `128×128 / log4(palette_size)` samples.

use std::borrow::Cow;

/// Sample budget for fast-mode clustering.
pub(crate) fn sample_budget(palette_size: usize) -> usize {
    let log4 = (palette_size.max(2) as f64).log2() / 2.0;
    ((128.0 * 128.0) / log4).floor().max(1.0) as usize
}

/// One 2×2 box-filter step. Odd trailing rows/columns are dropped, except
/// that a dimension of 1 stays 1.
pub(crate) fn downsample(
    pixels: &[[u8; 4]],
    width: usize,
    height: usize,
) -> (Vec<[u8; 4]>, usize, usize) {
    let out_w = (width / 2).max(1);
    let out_h = (height / 2).max(1);
    let span_x = if width >= 2 { 2 } else { 1 };
    let span_y = if height >= 2 { 2 } else { 1 };

    let mut out = Vec::with_capacity(out_w * out_h);
    for y in 0..out_h {
        for x in 0..out_w {
            let mut sum = [0u32; 4];
            for dy in 0..span_y {
                for dx in 0..span_x {
                    let px = pixels[(y * span_y + dy) * width + x * span_x + dx];
                    for c in 0..4 {
                        sum[c] += px[c] as u32;
                    }
                }
            }
            let n = (span_x * span_y) as u32;
            out.push(sum.map(|s| ((s + n / 2) / n) as u8));
        }
    }
    (out, out_w, out_h)
}

/// Pick the mip level for fast-mode clustering and return its pixels.
///
/// Images already within the budget are borrowed as they are.
pub(crate) fn fast_samples(
    pixels: &[[u8; 4]],
    width: usize,
    height: usize,
    palette_size: usize,
) -> Cow<'_, [[u8; 4]]> {
    let budget = sample_budget(palette_size);
    let mut level = 0;
    let (mut current, mut w, mut h) = (Cow::Borrowed(pixels), width, height);
    while w * h > budget && (w > 1 || h > 1) {
        let (next, next_w, next_h) = downsample(&current, w, h);
        (current, w, h) = (Cow::Owned(next), next_w, next_h);
        level += 1;
    }
    tracing::trace!(level, samples = w * h, budget, "Selected fast-mode mip level");
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_budget() {
        // log4(2) = 0.5, log4(16) = 2, log4(256) = 4
        assert_eq!(sample_budget(2), 32768);
        assert_eq!(sample_budget(16), 8192);
        assert_eq!(sample_budget(256), 4096);
    }

    #[test]
    fn test_downsample_averages_blocks() {
        let pixels = vec![
            [0, 0, 0, 255],
            [100, 0, 0, 255],
            [0, 100, 0, 255],
            [0, 0, 100, 255],
        ];
        let (out, w, h) = downsample(&pixels, 2, 2);
        assert_eq!((w, h), (1, 1));
        assert_eq!(out, vec![[25, 25, 25, 255]]);
    }

    #[test]
    fn test_downsample_single_row() {
        let pixels = vec![
            [10, 10, 10, 10],
            [20, 20, 20, 20],
            [30, 30, 30, 30],
            [41, 41, 41, 41],
        ];
        let (out, w, h) = downsample(&pixels, 4, 1);
        assert_eq!((w, h), (2, 1));
        assert_eq!(out, vec![[15, 15, 15, 15], [36, 36, 36, 36]]);
    }

    #[test]
    fn test_fast_samples_respects_budget() {
        let pixels = vec![[1, 2, 3, 255]; 512 * 512];
        let samples = fast_samples(&pixels, 512, 512, 256);
        assert!(matches!(samples, Cow::Owned(_)));
        assert!(samples.len() <= sample_budget(256));
        assert_eq!(samples.len(), 64 * 64);
        assert!(samples.iter().all(|&p| p == [1, 2, 3, 255]));
    }

    #[test]
    fn test_fast_samples_keeps_small_images() {
        let pixels = vec![[9, 9, 9, 9]; 16];
        let samples = fast_samples(&pixels, 4, 4, 16);
        assert!(matches!(samples, Cow::Borrowed(_)));
        assert_eq!(samples.len(), 16);
    }
}
