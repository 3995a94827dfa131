//! Error type for quantizer calls.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantizeError {
    /// The data-parallel backend could not be started.
    #[error("quantizer unavailable: {0}")]
    Unavailable(String),

    /// The image has no pixels.
    #[error("image has no pixels")]
    EmptyImage,

    /// A fixed palette does not leave room for the reserved index.
    #[error("palette has {len} colors, at most {max} fit with the current index mode")]
    PaletteTooLarge { len: usize, max: usize },
}
