//! Color types
//!
//! Everything the quantizer and the GIF encoder exchange is 8-bit RGB: GIF
//! color tables hold 24-bit entries and cluster centroids are rounded to the
//! nearest 8-bit value every iteration.
//!
//! # Example
//!
//! ```
//! use gif_quant::Rgb;
//!
//! let teal: Rgb = "#008080".parse().unwrap();
//! assert_eq!(teal, Rgb::new(0, 128, 128));
//! assert_eq!(teal.to_string(), "#008080");
//! ```

mod rgb;

pub(crate) use rgb::distance_sq;
pub use rgb::{ParseColorError, Rgb};
