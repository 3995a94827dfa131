//! Palette types
//!
//! This module provides the [`Palette`] produced by the quantizer and the
//! [`PaletteCumulator`] that merges the palettes of many frames into one.

mod cumulator;
mod error;
mod palette;

pub use cumulator::{PaletteCumulator, MAX_HISTORY_ROWS};
pub use error::PaletteError;
pub(crate) use palette::nearest;
pub use palette::{Palette, MAX_COLORS};
