//! Quantizer options and configuration.

use crate::palette::MAX_COLORS;

/// Ordered dithering applied before the nearest-color search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DitherMode {
    /// No dithering.
    #[default]
    None,
    /// 2×2 Bayer matrix.
    Order2,
    /// 4×4 Bayer matrix.
    Order4,
}

/// Meaning of the reserved index one past the last palette slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexMode {
    /// No reserved index; every slot holds a color.
    #[default]
    Default,
    /// The reserved index marks transparent pixels.
    Alpha,
    /// The reserved index marks pixels unchanged since the previous frame.
    Delta,
}

impl IndexMode {
    /// Whether this mode spends one palette slot on a reserved index.
    #[inline]
    pub fn reserves_index(self) -> bool {
        !matches!(self, IndexMode::Default)
    }

    /// Number of real colors the quantizer produces for a requested size.
    ///
    /// The request is clamped to `2..=256`, then one slot is given up for
    /// the reserved index when the mode needs one.
    ///
    /// ```
    /// use gif_quant::IndexMode;
    ///
    /// assert_eq!(IndexMode::Default.palette_size(1), 2);
    /// assert_eq!(IndexMode::Default.palette_size(256), 256);
    /// assert_eq!(IndexMode::Alpha.palette_size(256), 255);
    /// assert_eq!(IndexMode::Delta.palette_size(1000), 255);
    /// ```
    pub fn palette_size(self, requested: usize) -> usize {
        requested.clamp(2, MAX_COLORS) - self.reserves_index() as usize
    }
}

/// Alpha cutoff used in [`IndexMode::Alpha`] when none is set.
pub const DEFAULT_ALPHA_CUTOFF: u8 = 127;

/// Default relative tolerance for clustering convergence.
pub const DEFAULT_REL_TOL: f32 = 0.01;

/// Configuration for [`ColorQuantizer`](crate::ColorQuantizer).
///
/// # Example
///
/// ```
/// use gif_quant::{DitherMode, IndexMode, QuantizeOptions};
///
/// let options = QuantizeOptions::new()
///     .dither_mode(DitherMode::Order4)
///     .index_mode(IndexMode::Alpha)
///     .fast_mode(true);
///
/// assert_eq!(options.effective_alpha_cutoff(), Some(127));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizeOptions {
    /// Ordered dithering mode. Default: [`DitherMode::None`]
    pub dither_mode: DitherMode,

    /// Dither strength in `0.0..=1.0`; `0.0` selects `1/sqrt(palette_size)`.
    /// Default: `0.0`
    pub dither_threshold: f32,

    /// Reserved index semantics. Default: [`IndexMode::Default`]
    pub index_mode: IndexMode,

    /// Alpha values above the cutoff become opaque, the rest transparent.
    /// `None` passes alpha through, except in [`IndexMode::Alpha`] where
    /// [`DEFAULT_ALPHA_CUTOFF`] applies. Default: `None`
    pub alpha_cutoff: Option<u8>,

    /// Re-run farthest-point seeding instead of warm-starting from the
    /// previous palette. Default: `true`
    pub reseed_palette: bool,

    /// Recompute the palette at all; when `false` the previous palette is
    /// reused as long as its size matches. Default: `true`
    pub recalculate_palette: bool,

    /// Stop iterating once the clustering error improves by less than this
    /// fraction of the previous error. Default: `0.01`
    pub rel_tol: f32,

    /// Cluster on a downsampled copy of the image. Default: `false`
    pub fast_mode: bool,

    /// Write the quantized pixels back into the input image instead of a
    /// separate output image. Default: `false`
    pub overwrite_input: bool,
}

impl Default for QuantizeOptions {
    fn default() -> Self {
        Self {
            dither_mode: DitherMode::None,
            dither_threshold: 0.0,
            index_mode: IndexMode::Default,
            alpha_cutoff: None,
            reseed_palette: true,
            recalculate_palette: true,
            rel_tol: DEFAULT_REL_TOL,
            fast_mode: false,
            overwrite_input: false,
        }
    }
}

impl QuantizeOptions {
    /// Create new options with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn dither_mode(mut self, mode: DitherMode) -> Self {
        self.dither_mode = mode;
        self
    }

    /// Set the dither strength, clamped to `0.0..=1.0`.
    #[inline]
    pub fn dither_threshold(mut self, threshold: f32) -> Self {
        self.dither_threshold = if threshold.is_nan() {
            0.0
        } else {
            threshold.clamp(0.0, 1.0)
        };
        self
    }

    #[inline]
    pub fn index_mode(mut self, mode: IndexMode) -> Self {
        self.index_mode = mode;
        self
    }

    #[inline]
    pub fn alpha_cutoff(mut self, cutoff: Option<u8>) -> Self {
        self.alpha_cutoff = cutoff;
        self
    }

    #[inline]
    pub fn reseed_palette(mut self, enabled: bool) -> Self {
        self.reseed_palette = enabled;
        self
    }

    #[inline]
    pub fn recalculate_palette(mut self, enabled: bool) -> Self {
        self.recalculate_palette = enabled;
        self
    }

    /// Set the relative convergence tolerance, clamped to `0.0..=1.0`.
    #[inline]
    pub fn rel_tol(mut self, tol: f32) -> Self {
        self.rel_tol = if tol.is_nan() { 0.0 } else { tol.clamp(0.0, 1.0) };
        self
    }

    #[inline]
    pub fn fast_mode(mut self, enabled: bool) -> Self {
        self.fast_mode = enabled;
        self
    }

    #[inline]
    pub fn overwrite_input(mut self, enabled: bool) -> Self {
        self.overwrite_input = enabled;
        self
    }

    /// The alpha cutoff actually applied, after the Alpha-mode default.
    pub fn effective_alpha_cutoff(&self) -> Option<u8> {
        match (self.alpha_cutoff, self.index_mode) {
            (Some(cutoff), _) => Some(cutoff),
            (None, IndexMode::Alpha) => Some(DEFAULT_ALPHA_CUTOFF),
            (None, _) => None,
        }
    }
}
