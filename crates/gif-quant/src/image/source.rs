//! RGBA source frames.

use thiserror::Error;

/// Error type for image construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    /// Pixel count does not match `width * height`
    #[error("pixel buffer holds {actual} values, expected {expected} for {width}x{height}")]
    DimensionMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
    /// `width * height` does not fit in `usize`
    #[error("{width}x{height} pixels overflow the addressable size")]
    TooLarge { width: usize, height: usize },
}

/// Pixel count of a `width`×`height` buffer, checked for overflow.
pub(crate) fn checked_len(width: usize, height: usize) -> Result<usize, ImageError> {
    width
        .checked_mul(height)
        .ok_or(ImageError::TooLarge { width, height })
}

/// Pixel storage of a [`SourceImage`].
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    /// 8 bits per channel, `[R, G, B, A]`.
    Rgba8(Vec<[u8; 4]>),
    /// 32-bit float per channel, nominal range `0.0..=1.0`.
    RgbaF32(Vec<[f32; 4]>),
}

impl PixelData {
    fn len(&self) -> usize {
        match self {
            PixelData::Rgba8(p) => p.len(),
            PixelData::RgbaF32(p) => p.len(),
        }
    }
}

/// A width×height RGBA frame, row-major.
///
/// # Example
///
/// ```
/// use gif_quant::SourceImage;
///
/// let image = SourceImage::from_rgba8(2, 1, vec![[255, 0, 0, 255], [0, 0, 255, 255]]).unwrap();
/// assert_eq!(image.pixel_count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    width: usize,
    height: usize,
    data: PixelData,
}

impl SourceImage {
    /// Wrap pixel data, validating its length against the dimensions.
    pub fn new(width: usize, height: usize, data: PixelData) -> Result<Self, ImageError> {
        let expected = checked_len(width, height)?;
        if data.len() != expected {
            return Err(ImageError::DimensionMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn from_rgba8(
        width: usize,
        height: usize,
        pixels: Vec<[u8; 4]>,
    ) -> Result<Self, ImageError> {
        Self::new(width, height, PixelData::Rgba8(pixels))
    }

    pub fn from_rgba_f32(
        width: usize,
        height: usize,
        pixels: Vec<[f32; 4]>,
    ) -> Result<Self, ImageError> {
        Self::new(width, height, PixelData::RgbaF32(pixels))
    }

    /// Build an 8-bit image from an interleaved `RGBARGBA...` byte buffer.
    ///
    /// Trailing bytes that do not form a whole pixel are counted as a
    /// dimension mismatch.
    pub fn from_rgba8_bytes(width: usize, height: usize, bytes: &[u8]) -> Result<Self, ImageError> {
        if bytes.len() % 4 != 0 {
            return Err(ImageError::DimensionMismatch {
                width,
                height,
                expected: checked_len(width, height)?,
                actual: bytes.len() / 4,
            });
        }
        let pixels = bytes
            .chunks_exact(4)
            .map(|p| [p[0], p[1], p[2], p[3]])
            .collect();
        Self::from_rgba8(width, height, pixels)
    }

    /// Wrap pixels whose length is already known to match.
    pub(crate) fn from_rgba8_sized(width: usize, height: usize, pixels: Vec<[u8; 4]>) -> Self {
        debug_assert_eq!(pixels.len(), width * height);
        Self {
            width,
            height,
            data: PixelData::Rgba8(pixels),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixel_count() == 0
    }

    #[inline]
    pub fn data(&self) -> &PixelData {
        &self.data
    }

    pub fn into_data(self) -> PixelData {
        self.data
    }

    /// The pixels as 8-bit RGBA.
    ///
    /// Float channels are clamped to `0.0..=1.0` and rounded.
    pub fn to_rgba8(&self) -> Vec<[u8; 4]> {
        match &self.data {
            PixelData::Rgba8(p) => p.clone(),
            PixelData::RgbaF32(p) => p.iter().map(|&px| f32_to_rgba8(px)).collect(),
        }
    }

    /// Replace every pixel, converting back to this image's own pixel format.
    pub(crate) fn overwrite_rgba8(&mut self, pixels: &[[u8; 4]]) {
        debug_assert_eq!(pixels.len(), self.pixel_count());
        match &mut self.data {
            PixelData::Rgba8(p) => p.copy_from_slice(pixels),
            PixelData::RgbaF32(p) => {
                for (dst, src) in p.iter_mut().zip(pixels) {
                    *dst = src.map(|c| c as f32 / 255.0);
                }
            }
        }
    }
}

#[inline]
fn f32_to_rgba8(px: [f32; 4]) -> [u8; 4] {
    px.map(|c| {
        if c.is_nan() {
            0
        } else {
            (c.clamp(0.0, 1.0) * 255.0).round() as u8
        }
    })
}
