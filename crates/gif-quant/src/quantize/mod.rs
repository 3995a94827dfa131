//! Palette quantization
//!
//! [`ColorQuantizer`] reduces an RGBA frame to an indexed image with at most
//! 256 colors:
//!
//! 1. Pick the pixels to cluster on (all of them, or a box-downsampled copy
//!    in fast mode; Alpha mode drops the ones that will be transparent).
//! 2. Seed centroids by farthest-point selection, or warm-start from the
//!    previous palette.
//! 3. Run Lloyd iterations until the squared error stops improving by more
//!    than `rel_tol`.
//! 4. Map every pixel at full resolution, with optional Bayer dithering and
//!    index reservation.
//!
//! Accumulators are integers, so the result does not depend on how rayon
//! splits the work.

mod cluster;
mod dither;
mod error;
mod mip;
mod options;
mod quantizer;
mod seed;

pub use dither::dither_offset;
pub use error::QuantizeError;
pub use options::{DitherMode, IndexMode, QuantizeOptions, DEFAULT_ALPHA_CUTOFF, DEFAULT_REL_TOL};
pub use quantizer::{ColorQuantizer, Quantized};
