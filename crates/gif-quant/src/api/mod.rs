//! Crate-wide error handling.
//!
//! Each module has its own error enum; [`Error`] unifies them for callers
//! that drive the whole pipeline.

mod error;

pub use error::Error;
