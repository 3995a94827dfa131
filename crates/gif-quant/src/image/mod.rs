//! Image buffers flowing in and out of the quantizer.
//!
//! - [`SourceImage`]: the RGBA frame handed over by the frame producer,
//!   8-bit or 32-bit float per channel
//! - [`IndexImage`]: one palette index per pixel, the quantizer's output and
//!   the GIF encoder's input

mod index_image;
mod source;

pub use index_image::IndexImage;
pub use source::{ImageError, PixelData, SourceImage};
