//! Error types for palette construction.

use thiserror::Error;

use crate::color::ParseColorError;

/// Error type for palette validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaletteError {
    /// No colors provided in palette
    #[error("palette cannot be empty")]
    Empty,
    /// More colors than a GIF color table can hold
    #[error("palette has {count} colors, at most {max} are allowed")]
    TooManyColors { count: usize, max: usize },
    /// Invalid hex color string
    #[error("invalid color at index {index}: {source}")]
    ParseColor {
        index: usize,
        #[source]
        source: ParseColorError,
    },
}
