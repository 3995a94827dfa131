//! Palette struct with nearest-color matching.

use super::error::PaletteError;
use crate::color::{distance_sq, Rgb};

/// Largest palette a GIF color table can hold.
pub const MAX_COLORS: usize = 256;

/// An ordered list of 8-bit RGB colors, 1..=256 entries.
///
/// Duplicate entries are allowed: the quantizer always returns exactly the
/// requested number of clusters, even for images with fewer distinct colors.
///
/// # Example
///
/// ```
/// use gif_quant::{Palette, Rgb};
///
/// let palette = Palette::from_hex(&["#000", "#fff"]).unwrap();
/// assert_eq!(palette.len(), 2);
/// assert_eq!(palette.find_nearest(Rgb::new(200, 200, 200)).0, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    /// Create a palette from colors.
    ///
    /// # Errors
    ///
    /// - [`PaletteError::Empty`] for an empty list
    /// - [`PaletteError::TooManyColors`] for more than [`MAX_COLORS`] entries
    pub fn new(colors: Vec<Rgb>) -> Result<Self, PaletteError> {
        if colors.is_empty() {
            return Err(PaletteError::Empty);
        }
        if colors.len() > MAX_COLORS {
            return Err(PaletteError::TooManyColors {
                count: colors.len(),
                max: MAX_COLORS,
            });
        }
        Ok(Self { colors })
    }

    /// Create a palette from hex color strings (`#RRGGBB` or `#RGB`).
    pub fn from_hex<S: AsRef<str>>(hex: &[S]) -> Result<Self, PaletteError> {
        let colors = hex
            .iter()
            .enumerate()
            .map(|(index, s)| {
                s.as_ref()
                    .parse::<Rgb>()
                    .map_err(|source| PaletteError::ParseColor { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(colors)
    }

    /// Palette built from cluster centroids, which are always in range.
    pub(crate) fn from_centroids(centroids: &[[u8; 3]]) -> Self {
        debug_assert!(!centroids.is_empty() && centroids.len() <= MAX_COLORS);
        Self {
            colors: centroids.iter().map(|&c| Rgb::from_bytes(c)).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always `false`; empty palettes are rejected at construction.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Option<Rgb> {
        self.colors.get(idx).copied()
    }

    #[inline]
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn iter(&self) -> impl Iterator<Item = Rgb> + '_ {
        self.colors.iter().copied()
    }

    /// The colors as `[R, G, B]` triples, the quantizer's working form.
    pub(crate) fn to_centroids(&self) -> Vec<[u8; 3]> {
        self.colors.iter().map(|c| c.to_bytes()).collect()
    }

    /// Flat `RGBRGB...` bytes, as laid out in a GIF color table.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.colors.iter().flat_map(|c| c.to_bytes()).collect()
    }

    /// Index and squared distance of the nearest entry.
    ///
    /// Ties go to the lowest index.
    #[inline]
    pub fn find_nearest(&self, color: Rgb) -> (usize, u32) {
        nearest(&self.to_centroids(), color.to_bytes())
    }
}

/// Nearest centroid by squared RGB distance; lowest index wins ties.
#[inline]
pub(crate) fn nearest(centroids: &[[u8; 3]], color: [u8; 3]) -> (usize, u32) {
    let mut best_idx = 0;
    let mut best_dist = u32::MAX;
    for (i, &c) in centroids.iter().enumerate() {
        let d = distance_sq(color, c);
        if d < best_dist {
            best_dist = d;
            best_idx = i;
            if d == 0 {
                break;
            }
        }
    }
    (best_idx, best_dist)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty() {
        assert_eq!(Palette::new(Vec::new()), Err(PaletteError::Empty));
    }

    #[test]
    fn test_new_rejects_oversized() {
        let result = Palette::new(vec![Rgb::BLACK; 257]);
        assert_eq!(
            result,
            Err(PaletteError::TooManyColors {
                count: 257,
                max: 256
            })
        );
    }

    #[test]
    fn test_duplicates_allowed() {
        let palette = Palette::new(vec![Rgb::BLACK, Rgb::BLACK]).unwrap();
        assert_eq!(palette.len(), 2);
    }

    #[test]
    fn test_from_hex_reports_bad_index() {
        let err = Palette::from_hex(&["#000000", "#zzzzzz"]).unwrap_err();
        assert!(matches!(err, PaletteError::ParseColor { index: 1, .. }));
    }

    #[test]
    fn test_find_nearest_prefers_lowest_index_on_tie() {
        let palette = Palette::new(vec![
            Rgb::new(0, 0, 0),
            Rgb::new(20, 0, 0),
            Rgb::new(0, 0, 0),
        ])
        .unwrap();
        assert_eq!(palette.find_nearest(Rgb::new(10, 0, 0)), (0, 100));
        assert_eq!(palette.find_nearest(Rgb::new(0, 0, 0)), (0, 0));
        assert_eq!(palette.find_nearest(Rgb::new(18, 0, 0)), (1, 4));
    }

    #[test]
    fn test_to_rgb_bytes() {
        let palette = Palette::from_hex(&["#010203", "#040506"]).unwrap();
        assert_eq!(palette.to_rgb_bytes(), vec![1, 2, 3, 4, 5, 6]);
    }
}
