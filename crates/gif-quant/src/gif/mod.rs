//! Animated GIF89a output
//!
//! [`GifStreamEncoder`] writes frames to a file as they are produced;
//! [`LzwCompressor`] is the variable-width LZW coder behind it and can be
//! used on its own for any writer.

mod blocks;
mod encoder;
mod error;
mod lzw;

pub use encoder::{FrameOptions, GifStreamEncoder};
pub use error::GifError;
pub use lzw::LzwCompressor;
