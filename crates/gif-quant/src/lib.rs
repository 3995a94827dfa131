#![allow(clippy::needless_range_loop, clippy::module_inception)]

//! gif-quant: palette quantization and streaming GIF89a encoding
//!
//! This crate turns a sequence of RGBA frames into an animated GIF: each
//! frame is reduced to at most 256 colors with an iterative k-means
//! quantizer, then appended to the file as LZW-compressed indices.
//!
//! # Quick Start
//!
//! ```
//! use gif_quant::{
//!     ColorQuantizer, FrameOptions, GifStreamEncoder, IndexMode, QuantizeOptions, SourceImage,
//! };
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("anim.gif");
//!
//! let mut quantizer = ColorQuantizer::new();
//! let mut encoder = GifStreamEncoder::new();
//! encoder.open_file(&path, 4, 4, 4, IndexMode::Default).unwrap();
//!
//! for shade in [0u8, 128, 255] {
//!     let mut frame = SourceImage::from_rgba8(4, 4, vec![[shade, 64, 255 - shade, 255]; 16]).unwrap();
//!     let result = quantizer.quantize(&mut frame, 16, &QuantizeOptions::new()).unwrap();
//!     encoder
//!         .encode_frame(&result.indices, &result.palette, &FrameOptions::new(10))
//!         .unwrap();
//! }
//!
//! encoder.close_file().unwrap();
//! ```
//!
//! # Quantization
//!
//! [`ColorQuantizer`] seeds its centroids by farthest-point selection and
//! refines them with Lloyd iterations until the squared error stops
//! improving by more than `rel_tol`. Options cover:
//!
//! - fast mode, clustering on a box-downsampled copy of the frame
//! - ordered dithering with a 2×2 or 4×4 Bayer matrix
//! - palette reuse across frames (warm start, or no recalculation at all)
//! - a reserved index for transparent ([`IndexMode::Alpha`]) or unchanged
//!   ([`IndexMode::Delta`]) pixels
//!
//! [`PaletteCumulator`] collects per-frame palettes and clusters them into
//! one palette that suits a whole animation.
//!
//! # Encoding
//!
//! [`GifStreamEncoder`] writes the header and global table with the first
//! frame, then one graphic control extension, image descriptor and LZW
//! stream per frame. Frames with a dynamic palette carry a local color
//! table. The animation loops forever.

pub mod api;
pub mod color;
pub mod gif;
pub mod image;
pub mod palette;
pub mod quantize;


pub use api::Error;
pub use color::{ParseColorError, Rgb};
pub use gif::{FrameOptions, GifError, GifStreamEncoder, LzwCompressor};
pub use image::{ImageError, IndexImage, PixelData, SourceImage};
pub use palette::{Palette, PaletteCumulator, PaletteError, MAX_COLORS, MAX_HISTORY_ROWS};
pub use quantize::{
    dither_offset, ColorQuantizer, DitherMode, IndexMode, QuantizeError, QuantizeOptions,
    Quantized, DEFAULT_ALPHA_CUTOFF, DEFAULT_REL_TOL,
};
