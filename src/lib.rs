//! shader-gif - animated GIF export for shader sessions
//!
//! Reads rendered frames, quantizes them with `gif_quant` and streams the
//! result into a looping GIF89a file.
//! This library exposes modules for integration testing.

pub mod error;
pub mod models;
pub mod services;
