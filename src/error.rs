use std::path::PathBuf;

use gif_quant::{GifError, ImageError, PaletteError, QuantizeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PNG decode error in {path}: {source}")]
    Png {
        path: PathBuf,
        #[source]
        source: png::DecodingError,
    },

    #[error("Unsupported PNG layout in {path}: {detail}")]
    UnsupportedPng { path: PathBuf, detail: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Palette error: {0}")]
    Palette(#[from] PaletteError),

    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    #[error("Quantize error: {0}")]
    Quantize(#[from] QuantizeError),

    #[error("GIF error: {0}")]
    Gif(#[from] GifError),

    #[error("No PNG frames found in {0}")]
    NoFrames(PathBuf),

    #[error("Frame source is empty")]
    EmptySource,

    #[error("Frame {index} is {width}x{height}, expected {expected_width}x{expected_height}")]
    FrameSize {
        index: usize,
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },
}
