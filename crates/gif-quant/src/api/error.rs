//! Unified error type for the gif-quant public API.

use crate::color::ParseColorError;
use crate::gif::GifError;
use crate::image::ImageError;
use crate::palette::PaletteError;
use crate::quantize::QuantizeError;
use std::fmt;

/// Wraps every error the crate returns, so application code can use `?`
/// across quantizing and encoding.
///
/// # Example
///
/// ```
/// use gif_quant::{ColorQuantizer, Error, Palette, QuantizeOptions, SourceImage};
///
/// fn first_color() -> Result<Palette, Error> {
///     let mut image = SourceImage::from_rgba8(1, 1, vec![[9, 9, 9, 255]])?;
///     let fixed = Palette::from_hex(&["#000000"])?;
///     let result = ColorQuantizer::new().quantize_with_palette(&mut image, &fixed, &QuantizeOptions::new())?;
///     Ok(result.palette)
/// }
///
/// assert_eq!(first_color().unwrap().len(), 1);
/// ```
#[derive(Debug)]
pub enum Error {
    /// Palette validation error (empty, too many colors, or a bad entry)
    Palette(PaletteError),
    /// Invalid hex color
    ParseColor(ParseColorError),
    /// Pixel buffer does not match its dimensions
    Image(ImageError),
    /// Quantizer backend unavailable or bad input
    Quantize(QuantizeError),
    /// GIF session or I/O failure
    Gif(GifError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Palette(err) => write!(f, "palette error: {}", err),
            Error::ParseColor(err) => write!(f, "color parse error: {}", err),
            Error::Image(err) => write!(f, "image error: {}", err),
            Error::Quantize(err) => write!(f, "quantize error: {}", err),
            Error::Gif(err) => write!(f, "gif error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Palette(err) => Some(err),
            Error::ParseColor(err) => Some(err),
            Error::Image(err) => Some(err),
            Error::Quantize(err) => Some(err),
            Error::Gif(err) => Some(err),
        }
    }
}

impl From<PaletteError> for Error {
    fn from(err: PaletteError) -> Self {
        Error::Palette(err)
    }
}

impl From<ParseColorError> for Error {
    fn from(err: ParseColorError) -> Self {
        Error::ParseColor(err)
    }
}

impl From<ImageError> for Error {
    fn from(err: ImageError) -> Self {
        Error::Image(err)
    }
}

impl From<QuantizeError> for Error {
    fn from(err: QuantizeError) -> Self {
        Error::Quantize(err)
    }
}

impl From<GifError> for Error {
    fn from(err: GifError) -> Self {
        Error::Gif(err)
    }
}
