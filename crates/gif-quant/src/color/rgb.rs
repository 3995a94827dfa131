//! 8-bit RGB triple with hex parsing and squared-distance helpers.

use std::fmt;
use std::num::ParseIntError;
use std::ops::Range;
use std::str::FromStr;

use thiserror::Error;

/// Error type for parsing hex color strings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseColorError {
    /// Hex string has invalid length (must be 3 or 6 characters after stripping '#')
    #[error("invalid hex color length (expected 3 or 6 characters)")]
    InvalidLength,
    /// Invalid hexadecimal character encountered
    #[error("invalid hex character: {0}")]
    InvalidHex(#[from] ParseIntError),
}

/// One 24-bit color, as stored in a GIF color table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create a color from a byte array [R, G, B].
    #[inline]
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2])
    }

    /// Convert to a byte array [R, G, B].
    #[inline]
    pub const fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Squared Euclidean distance over R, G and B.
    #[inline]
    pub fn distance_sq(self, other: Rgb) -> u32 {
        distance_sq(self.to_bytes(), other.to_bytes())
    }
}

/// Squared Euclidean distance between two RGB byte triples.
#[inline]
pub(crate) fn distance_sq(a: [u8; 3], b: [u8; 3]) -> u32 {
    let dr = a[0] as i32 - b[0] as i32;
    let dg = a[1] as i32 - b[1] as i32;
    let db = a[2] as i32 - b[2] as i32;
    (dr * dr + dg * dg + db * db) as u32
}

impl From<[u8; 3]> for Rgb {
    fn from(bytes: [u8; 3]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(color: Rgb) -> Self {
        color.to_bytes()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ParseColorError;

    /// Parse a color from `#RRGGBB`, `RRGGBB`, `#RGB` or `RGB`.
    ///
    /// Parsing is case-insensitive. Leading and trailing whitespace is trimmed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);

        match s.len() {
            3 => {
                // Shorthand: expand each digit by multiplying by 17 (0xF -> 0xFF)
                let r = hex_byte(s, 0..1)? * 17;
                let g = hex_byte(s, 1..2)? * 17;
                let b = hex_byte(s, 2..3)? * 17;
                Ok(Self::new(r, g, b))
            }
            6 => {
                let r = hex_byte(s, 0..2)?;
                let g = hex_byte(s, 2..4)?;
                let b = hex_byte(s, 4..6)?;
                Ok(Self::new(r, g, b))
            }
            _ => Err(ParseColorError::InvalidLength),
        }
    }
}

/// Parse one hex field; a range that splits a multi-byte char is an empty field.
fn hex_byte(s: &str, range: Range<usize>) -> Result<u8, ParseColorError> {
    Ok(u8::from_str_radix(s.get(range).unwrap_or(""), 16)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing_6digit() {
        assert_eq!("#FFFFFF".parse::<Rgb>().unwrap(), Rgb::new(255, 255, 255));
        assert_eq!("#000000".parse::<Rgb>().unwrap(), Rgb::BLACK);
        assert_eq!("FF0000".parse::<Rgb>().unwrap(), Rgb::new(255, 0, 0));
    }

    #[test]
    fn test_hex_parsing_shorthand() {
        assert_eq!("#f00".parse::<Rgb>().unwrap(), Rgb::new(255, 0, 0));
        assert_eq!("#ABC".parse::<Rgb>().unwrap(), Rgb::new(0xAA, 0xBB, 0xCC));
    }

    #[test]
    fn test_hex_parsing_errors() {
        assert!(matches!(
            "#GGG".parse::<Rgb>(),
            Err(ParseColorError::InvalidHex(_))
        ));
        assert!(matches!(
            "#FFFF".parse::<Rgb>(),
            Err(ParseColorError::InvalidLength)
        ));
        assert!(matches!("".parse::<Rgb>(), Err(ParseColorError::InvalidLength)));
        assert!(matches!("#".parse::<Rgb>(), Err(ParseColorError::InvalidLength)));
        // three bytes, two chars
        assert!(matches!("#éa".parse::<Rgb>(), Err(ParseColorError::InvalidHex(_))));
    }

    #[test]
    fn test_hex_parsing_whitespace_and_case() {
        let upper: Rgb = "  #ABCDEF ".parse().unwrap();
        let lower: Rgb = "#abcdef".parse().unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_display_round_trips() {
        let color = Rgb::new(18, 52, 86);
        assert_eq!(color.to_string(), "#123456");
        assert_eq!(color.to_string().parse::<Rgb>().unwrap(), color);
    }

    #[test]
    fn test_distance_sq() {
        assert_eq!(Rgb::BLACK.distance_sq(Rgb::BLACK), 0);
        assert_eq!(Rgb::new(3, 4, 0).distance_sq(Rgb::BLACK), 25);
        assert_eq!(
            Rgb::new(255, 255, 255).distance_sq(Rgb::BLACK),
            3 * 255 * 255
        );
    }
}
