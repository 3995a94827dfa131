//! IndexImage: palette indices with dimension metadata.
//!
//! The indexed form is what the GIF encoder consumes. An index image may
//! carry one reserved value, one past the last palette slot, that stands for
//! "transparent" or "unchanged since the previous frame" depending on the
//! quantizer's index mode.

use super::source::{checked_len, ImageError};
use crate::palette::Palette;

/// One `u8` palette index per pixel in row-major order.
///
/// # Example
///
/// ```
/// use gif_quant::{IndexImage, Palette, Rgb};
///
/// let palette = Palette::new(vec![Rgb::BLACK, Rgb::new(255, 255, 255)]).unwrap();
/// let image = IndexImage::new(vec![0, 1, 1, 0], 2, 2, None).unwrap();
///
/// let rgba = image.to_rgba(&palette);
/// assert_eq!(rgba[1], [255, 255, 255, 255]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexImage {
    indices: Vec<u8>,
    width: usize,
    height: usize,
    /// Value standing for transparent/unchanged, if the image uses one.
    reserved: Option<u8>,
}

impl IndexImage {
    /// Create a new `IndexImage`.
    ///
    /// # Errors
    ///
    /// - [`ImageError::DimensionMismatch`] if `indices.len() != width * height`
    /// - [`ImageError::TooLarge`] if `width * height` overflows
    pub fn new(
        indices: Vec<u8>,
        width: usize,
        height: usize,
        reserved: Option<u8>,
    ) -> Result<Self, ImageError> {
        let expected = checked_len(width, height)?;
        if indices.len() != expected {
            return Err(ImageError::DimensionMismatch {
                width,
                height,
                expected,
                actual: indices.len(),
            });
        }
        Ok(Self::from_parts(indices, width, height, reserved))
    }

    /// Wrap indices whose length is already known to match.
    pub(crate) fn from_parts(
        indices: Vec<u8>,
        width: usize,
        height: usize,
        reserved: Option<u8>,
    ) -> Self {
        debug_assert_eq!(indices.len(), width * height);
        Self {
            indices,
            width,
            height,
            reserved,
        }
    }

    #[inline]
    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    pub fn into_indices(self) -> Vec<u8> {
        self.indices
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// The reserved index value, if this image was produced in Alpha or Delta mode.
    #[inline]
    pub fn reserved_index(&self) -> Option<u8> {
        self.reserved
    }

    /// Number of pixels carrying the reserved index.
    pub fn reserved_count(&self) -> usize {
        match self.reserved {
            Some(r) => self.indices.iter().filter(|&&i| i == r).count(),
            None => 0,
        }
    }

    /// Expand to RGBA bytes through `palette`.
    ///
    /// Reserved pixels come out as fully transparent black; so do indices
    /// beyond the palette.
    pub fn to_rgba(&self, palette: &Palette) -> Vec<[u8; 4]> {
        self.indices
            .iter()
            .map(|&idx| {
                if Some(idx) == self.reserved {
                    return [0, 0, 0, 0];
                }
                match palette.get(idx as usize) {
                    Some(c) => [c.r, c.g, c.b, 255],
                    None => [0, 0, 0, 0],
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;

    #[test]
    fn test_accessors() {
        let image = IndexImage::new(vec![0, 1, 2, 2, 1, 0], 3, 2, Some(2)).unwrap();
        assert_eq!(image.width(), 3);
        assert_eq!(image.height(), 2);
        assert_eq!(image.reserved_index(), Some(2));
        assert_eq!(image.reserved_count(), 2);
    }

    #[test]
    fn test_new_rejects_wrong_length() {
        assert_eq!(
            IndexImage::new(vec![0, 1, 1], 2, 2, None),
            Err(ImageError::DimensionMismatch {
                width: 2,
                height: 2,
                expected: 4,
                actual: 3
            })
        );
        assert_eq!(
            IndexImage::new(vec![0; 4], usize::MAX, 3, None),
            Err(ImageError::TooLarge {
                width: usize::MAX,
                height: 3
            })
        );
    }

    #[test]
    fn test_to_rgba_maps_reserved_to_transparent() {
        let palette = Palette::new(vec![Rgb::new(10, 20, 30), Rgb::new(40, 50, 60)]).unwrap();
        let image = IndexImage::new(vec![0, 1, 2], 3, 1, Some(2)).unwrap();
        assert_eq!(
            image.to_rgba(&palette),
            vec![[10, 20, 30, 255], [40, 50, 60, 255], [0, 0, 0, 0]]
        );
    }
}
