//! Merge the palettes of many frames into one representative palette.

use super::palette::{Palette, MAX_COLORS};
use crate::image::SourceImage;
use crate::quantize::{ColorQuantizer, QuantizeError, QuantizeOptions};

/// Upper bound on stored palette rows, the largest 2-D buffer side a
/// compute backend is expected to accept.
pub const MAX_HISTORY_ROWS: usize = 16384;

/// Ring buffer of per-frame palettes, one palette per row.
///
/// Resolving clusters every stored color back down to `palette_size`
/// entries, giving one palette that fits all the frames seen so far.
///
/// # Example
///
/// ```
/// use gif_quant::{ColorQuantizer, Palette, PaletteCumulator};
///
/// let quantizer = ColorQuantizer::new();
/// let mut cumulator = PaletteCumulator::new(2, 8);
///
/// cumulator.accumulate(&Palette::from_hex(&["#000000", "#ff0000"]).unwrap());
/// cumulator.accumulate(&Palette::from_hex(&["#000000", "#fe0000"]).unwrap());
///
/// let current = Palette::from_hex(&["#000000", "#ffffff"]).unwrap();
/// let resolved = cumulator.resolve(&quantizer, &current).unwrap();
/// assert_eq!(resolved.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct PaletteCumulator {
    palette_size: usize,
    max_rows: usize,
    buffer: Vec<[u8; 4]>,
    current_row: usize,
    pending: usize,
}

impl PaletteCumulator {
    /// Create a cumulator for palettes of `palette_size` colors keeping at
    /// most `max_history_rows` of them (capped at [`MAX_HISTORY_ROWS`]).
    pub fn new(palette_size: usize, max_history_rows: usize) -> Self {
        let palette_size = palette_size.clamp(1, MAX_COLORS);
        let max_rows = max_history_rows.clamp(1, MAX_HISTORY_ROWS);
        if max_rows < max_history_rows {
            tracing::warn!(
                requested = max_history_rows,
                max = MAX_HISTORY_ROWS,
                "Palette history capped"
            );
        }
        Self {
            palette_size,
            max_rows,
            buffer: Vec::new(),
            current_row: 0,
            pending: 0,
        }
    }

    #[inline]
    pub fn palette_size(&self) -> usize {
        self.palette_size
    }

    /// Number of rows currently stored.
    #[inline]
    pub fn rows(&self) -> usize {
        self.buffer.len() / self.palette_size
    }

    #[inline]
    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    /// `true` until the first palette is accumulated.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Store `palette` as the next row, overwriting the oldest row once the
    /// buffer is full. Short palettes repeat their colors across the row.
    pub fn accumulate(&mut self, palette: &Palette) {
        let colors = palette.colors();
        let row = (0..self.palette_size).map(|i| {
            let [r, g, b] = colors[i % colors.len()].to_bytes();
            [r, g, b, 255]
        });

        let start = self.current_row * self.palette_size;
        if start < self.buffer.len() {
            for (slot, px) in self.buffer[start..start + self.palette_size]
                .iter_mut()
                .zip(row)
            {
                *slot = px;
            }
        } else {
            self.buffer.extend(row);
        }

        self.current_row = (self.current_row + 1) % self.max_rows;
        self.pending += 1;
    }

    /// Cluster every stored color into one palette.
    ///
    /// Returns `current` unchanged when nothing was accumulated since the
    /// last resolve. Resolving rewinds the write position to the first row;
    /// stored colors stay until they are overwritten.
    pub fn resolve(
        &mut self,
        quantizer: &ColorQuantizer,
        current: &Palette,
    ) -> Result<Palette, QuantizeError> {
        if self.pending == 0 {
            return Ok(current.clone());
        }

        let rows = self.rows();
        let image = SourceImage::from_rgba8_sized(self.palette_size, rows, self.buffer.clone());
        let options = QuantizeOptions::new().reseed_palette(true).fast_mode(false);
        let palette = quantizer.cluster_palette(&image, self.palette_size, &options)?;

        tracing::debug!(
            rows,
            pending = self.pending,
            colors = palette.len(),
            "Resolved cumulated palette"
        );

        self.current_row = 0;
        self.pending = 0;
        Ok(palette)
    }
}
