//! The color quantizer: palette clustering plus the per-pixel mapping pass.

use std::borrow::Cow;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::cluster::lloyd;
use super::dither::{dither_offset, offset_rgb, resolve_threshold};
use super::error::QuantizeError;
use super::mip::fast_samples;
use super::options::{DitherMode, IndexMode, QuantizeOptions, DEFAULT_ALPHA_CUTOFF};
use super::seed::farthest_point_seeds;
use crate::image::{IndexImage, SourceImage};
use crate::palette::{nearest, Palette, MAX_COLORS};

/// Result of one quantizer call.
#[derive(Debug, Clone)]
pub struct Quantized {
    /// The palette the indices refer to.
    pub palette: Palette,
    /// One index per pixel; `palette.len()` is the reserved value in Alpha
    /// and Delta modes.
    pub indices: IndexImage,
    /// Quantized RGBA pixels, or `None` when they were written back into the
    /// input image.
    pub image: Option<SourceImage>,
}

/// Quantized pixels of the previous call, compared against in Delta mode.
#[derive(Debug)]
struct PreviousFrame {
    width: usize,
    height: usize,
    pixels: Vec<[u8; 4]>,
}

/// Iterative palette quantizer.
///
/// Clustering runs on a worker pool owned by the quantizer. Every pass
/// (seed distance scan, seed selection, assignment, mapping) finishes on all
/// workers before the next one starts, and each call blocks until the
/// palette has converged.
///
/// The quantizer keeps the last palette, so consecutive frames of an
/// animation can warm-start clustering from it or reuse it outright, and the
/// last quantized frame, which Delta mode compares against. One instance
/// serves one export session at a time; call [`reset`](Self::reset) between
/// sessions.
///
/// # Example
///
/// ```
/// use gif_quant::{ColorQuantizer, QuantizeOptions, SourceImage};
///
/// let mut quantizer = ColorQuantizer::new();
/// assert!(quantizer.can_run_on_device_in_use());
///
/// let mut image = SourceImage::from_rgba8(2, 1, vec![[255, 0, 0, 255], [0, 0, 255, 255]]).unwrap();
/// let result = quantizer.quantize(&mut image, 2, &QuantizeOptions::new()).unwrap();
///
/// assert_eq!(result.palette.len(), 2);
/// assert_eq!(result.indices.indices().len(), 2);
/// ```
#[derive(Debug)]
pub struct ColorQuantizer {
    pool: Option<ThreadPool>,
    error_message: Option<String>,
    palette: Option<Palette>,
    previous: Option<PreviousFrame>,
}

impl Default for ColorQuantizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorQuantizer {
    /// Create a quantizer with one worker per CPU.
    pub fn new() -> Self {
        Self::with_threads(0)
    }

    /// Create a quantizer with `threads` workers (`0` = one per CPU).
    pub fn with_threads(threads: usize) -> Self {
        let built = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("quantize-{i}"))
            .build();

        match built {
            Ok(pool) => {
                tracing::debug!(threads = pool.current_num_threads(), "Quantizer worker pool started");
                Self {
                    pool: Some(pool),
                    error_message: None,
                    palette: None,
                    previous: None,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Quantizer worker pool unavailable");
                Self::unavailable(format!("failed to start quantizer worker pool: {e}"))
            }
        }
    }

    fn unavailable(message: String) -> Self {
        Self {
            pool: None,
            error_message: Some(message),
            palette: None,
            previous: None,
        }
    }

    /// Whether the data-parallel backend is up. Check before quantizing.
    pub fn can_run_on_device_in_use(&self) -> bool {
        self.pool.is_some()
    }

    /// Why the backend is unavailable, if it is.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// The palette of the last call, if any.
    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    /// Forget the retained palette and the previous frame.
    pub fn reset(&mut self) {
        self.palette = None;
        self.previous = None;
    }

    fn pool(&self) -> Result<&ThreadPool, QuantizeError> {
        self.pool.as_ref().ok_or_else(|| {
            QuantizeError::Unavailable(
                self.error_message
                    .clone()
                    .unwrap_or_else(|| "no worker pool".to_string()),
            )
        })
    }

    /// Reduce `image` to at most `palette_size` colors.
    ///
    /// `palette_size` is clamped to `2..=256` and loses one slot to the
    /// reserved index in Alpha and Delta modes. The palette is rebuilt
    /// (seeding, optional fast-mode downsampling, Lloyd iteration) unless
    /// `recalculate_palette` is off and the retained palette has the right
    /// size; then every pixel is mapped at full resolution.
    pub fn quantize(
        &mut self,
        image: &mut SourceImage,
        palette_size: usize,
        options: &QuantizeOptions,
    ) -> Result<Quantized, QuantizeError> {
        let pool = self.pool()?;
        if image.is_empty() {
            return Err(QuantizeError::EmptyImage);
        }

        let size = options.index_mode.palette_size(palette_size);
        let pixels = image.to_rgba8();
        let retained = self
            .palette
            .as_ref()
            .filter(|p| p.len() == size)
            .map(Palette::to_centroids);

        let centroids = match retained {
            Some(centroids) if !options.recalculate_palette => centroids,
            retained => {
                let warm = retained.filter(|_| !options.reseed_palette);
                let (w, h) = (image.width(), image.height());
                pool.install(|| build_palette(&pixels, w, h, size, options, warm))
            }
        };

        self.map(image, &pixels, centroids, options)
    }

    /// Map `image` onto a caller-supplied palette, skipping clustering.
    ///
    /// The palette must leave room for the reserved index in Alpha and
    /// Delta modes. It becomes the retained palette.
    pub fn quantize_with_palette(
        &mut self,
        image: &mut SourceImage,
        palette: &Palette,
        options: &QuantizeOptions,
    ) -> Result<Quantized, QuantizeError> {
        self.pool()?;
        if image.is_empty() {
            return Err(QuantizeError::EmptyImage);
        }

        let max = MAX_COLORS - options.index_mode.reserves_index() as usize;
        if palette.len() > max {
            return Err(QuantizeError::PaletteTooLarge {
                len: palette.len(),
                max,
            });
        }

        let pixels = image.to_rgba8();
        self.map(image, &pixels, palette.to_centroids(), options)
    }

    /// Cluster `image` into a palette without mapping any pixels.
    ///
    /// Leaves the retained palette and previous frame untouched; a warm
    /// start (`reseed_palette == false`) still reads the retained palette.
    pub fn cluster_palette(
        &self,
        image: &SourceImage,
        palette_size: usize,
        options: &QuantizeOptions,
    ) -> Result<Palette, QuantizeError> {
        let pool = self.pool()?;
        if image.is_empty() {
            return Err(QuantizeError::EmptyImage);
        }

        let size = options.index_mode.palette_size(palette_size);
        let pixels = image.to_rgba8();
        let warm = self
            .palette
            .as_ref()
            .filter(|p| p.len() == size && !options.reseed_palette)
            .map(Palette::to_centroids);

        let (w, h) = (image.width(), image.height());
        let centroids = pool.install(|| build_palette(&pixels, w, h, size, options, warm));
        Ok(Palette::from_centroids(&centroids))
    }

    fn map(
        &mut self,
        image: &mut SourceImage,
        pixels: &[[u8; 4]],
        centroids: Vec<[u8; 3]>,
        options: &QuantizeOptions,
    ) -> Result<Quantized, QuantizeError> {
        let (width, height) = (image.width(), image.height());
        let previous = self
            .previous
            .take()
            .filter(|p| p.width == width && p.height == height);
        let previous_pixels = match options.index_mode {
            IndexMode::Delta => previous.as_ref().map(|p| p.pixels.as_slice()),
            _ => None,
        };

        let pool = self.pool()?;
        let (indices, output) =
            pool.install(|| map_pixels(pixels, width, &centroids, options, previous_pixels));

        let reserved = options
            .index_mode
            .reserves_index()
            .then_some(centroids.len() as u8);
        let unchanged = match (options.index_mode, reserved) {
            (IndexMode::Delta, Some(r)) => indices.iter().filter(|&&i| i == r).count(),
            _ => 0,
        };

        let quantized_image = if options.overwrite_input {
            image.overwrite_rgba8(&output);
            None
        } else {
            Some(SourceImage::from_rgba8_sized(width, height, output.clone()))
        };

        self.previous = Some(PreviousFrame {
            width,
            height,
            pixels: output,
        });

        let palette = Palette::from_centroids(&centroids);
        self.palette = Some(palette.clone());

        tracing::debug!(
            width,
            height,
            colors = palette.len(),
            unchanged,
            "Quantized frame"
        );

        Ok(Quantized {
            palette,
            indices: IndexImage::from_parts(indices, width, height, reserved),
            image: quantized_image,
        })
    }
}

/// Seeding (or warm start), fast-mode sample selection and Lloyd iteration.
fn build_palette(
    pixels: &[[u8; 4]],
    width: usize,
    height: usize,
    size: usize,
    options: &QuantizeOptions,
    warm: Option<Vec<[u8; 3]>>,
) -> Vec<[u8; 3]> {
    let samples = cluster_samples(pixels, width, height, size, options);
    let mut centroids = match warm {
        Some(centroids) => centroids,
        None => farthest_point_seeds(&samples, size),
    };
    let stats = lloyd(&samples, &mut centroids, options.rel_tol);
    tracing::debug!(
        palette_size = size,
        samples = samples.len(),
        passes = stats.passes,
        error = stats.error,
        reseeded = stats.reseeded,
        "Palette clustering converged"
    );
    centroids
}

/// RGB samples clustering runs on.
///
/// In Alpha mode pixels that will end up transparent are left out, unless
/// that would leave nothing.
fn cluster_samples(
    pixels: &[[u8; 4]],
    width: usize,
    height: usize,
    size: usize,
    options: &QuantizeOptions,
) -> Vec<[u8; 3]> {
    let source: Cow<'_, [[u8; 4]]> = if options.fast_mode {
        fast_samples(pixels, width, height, size)
    } else {
        Cow::Borrowed(pixels)
    };
    let rgb = |p: &[u8; 4]| [p[0], p[1], p[2]];

    if options.index_mode == IndexMode::Alpha {
        let cutoff = options
            .effective_alpha_cutoff()
            .unwrap_or(DEFAULT_ALPHA_CUTOFF);
        let visible: Vec<[u8; 3]> = source.iter().filter(|p| p[3] > cutoff).map(rgb).collect();
        if !visible.is_empty() {
            return visible;
        }
    }

    source.iter().map(rgb).collect()
}

/// Full-resolution mapping pass: dither, nearest color, alpha cut and index
/// reservation for every pixel.
fn map_pixels(
    pixels: &[[u8; 4]],
    width: usize,
    centroids: &[[u8; 3]],
    options: &QuantizeOptions,
    previous: Option<&[[u8; 4]]>,
) -> (Vec<u8>, Vec<[u8; 4]>) {
    let size = centroids.len();
    let threshold = resolve_threshold(options.dither_threshold, size);
    let cutoff = options.effective_alpha_cutoff();

    let mut indices = vec![0u8; pixels.len()];
    let mut output = vec![[0u8; 4]; pixels.len()];

    indices
        .par_chunks_mut(width)
        .zip(output.par_chunks_mut(width))
        .enumerate()
        .for_each(|(y, (index_row, output_row))| {
            let row = y * width;
            for x in 0..width {
                let px = pixels[row + x];
                let rgb = match options.dither_mode {
                    DitherMode::None => [px[0], px[1], px[2]],
                    mode => offset_rgb(px, dither_offset(mode, x, y, threshold)),
                };

                let (mut index, _) = nearest(centroids, rgb);
                let color = centroids[index];
                let alpha = match cutoff {
                    Some(cut) if px[3] > cut => 255,
                    Some(_) => 0,
                    None => px[3],
                };

                match options.index_mode {
                    IndexMode::Default => {}
                    IndexMode::Alpha => {
                        if alpha == 0 {
                            index = size;
                        }
                    }
                    IndexMode::Delta => {
                        if let Some(prev) = previous {
                            let p = prev[row + x];
                            if p[3] > 0 && [p[0], p[1], p[2]] == color {
                                index = size;
                            }
                        }
                    }
                }

                index_row[x] = index as u8;
                output_row[x] = [color[0], color[1], color[2], alpha];
            }
        });

    (indices, output)
}
