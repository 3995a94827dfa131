//! Error type for GIF encoding.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GifError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no GIF file is open")]
    NotOpen,

    #[error("palette bit depth must be 1-8, got {0}")]
    InvalidBitDepth(u8),

    #[error("invalid GIF dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("frame is {width}x{height}, session is {expected_width}x{expected_height}")]
    DimensionMismatch {
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },

    #[error("palette has {len} colors, the color table holds {max}")]
    PaletteTooLarge { len: usize, max: usize },

    #[error("index {index} does not fit a {size}-entry color table")]
    IndexOutOfRange { index: usize, size: usize },
}
