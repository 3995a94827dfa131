//! GIF89a block writers.

use std::io::{self, Write};

use crate::palette::Palette;
use crate::quantize::IndexMode;

pub(crate) const TRAILER: u8 = 0x3B;

const EXTENSION: u8 = 0x21;
const GRAPHIC_CONTROL: u8 = 0xF9;
const APPLICATION: u8 = 0xFF;
const IMAGE_SEPARATOR: u8 = 0x2C;

const TABLE_PRESENT: u8 = 0x80;
const COLOR_RESOLUTION: u8 = 0x70;

/// Disposal "restore to background", bits 4-2 of the GCE flags.
const DISPOSE_BACKGROUND: u8 = 2 << 2;
/// Disposal "do not dispose".
const DISPOSE_NONE: u8 = 1 << 2;
const TRANSPARENT_FLAG: u8 = 0x01;

/// Header plus logical screen descriptor.
pub(crate) fn write_header<W: Write>(
    w: &mut W,
    width: u16,
    height: u16,
    table_bits: u8,
) -> io::Result<()> {
    w.write_all(b"GIF89a")?;
    w.write_all(&width.to_le_bytes())?;
    w.write_all(&height.to_le_bytes())?;
    let packed = TABLE_PRESENT | COLOR_RESOLUTION | (table_bits - 1);
    // background index, pixel aspect ratio
    w.write_all(&[packed, 0, 0])
}

/// NETSCAPE2.0 application extension, loop forever.
pub(crate) fn write_loop_forever<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(&[EXTENSION, APPLICATION, 0x0B])?;
    w.write_all(b"NETSCAPE2.0")?;
    w.write_all(&[0x03, 0x01, 0x00, 0x00, 0x00])
}

pub(crate) fn graphic_control_flags(mode: IndexMode) -> u8 {
    match mode {
        IndexMode::Default => DISPOSE_BACKGROUND,
        IndexMode::Alpha => DISPOSE_BACKGROUND | TRANSPARENT_FLAG,
        IndexMode::Delta => DISPOSE_NONE | TRANSPARENT_FLAG,
    }
}

/// Graphic control extension; the transparent index is always 0.
pub(crate) fn write_graphic_control<W: Write>(
    w: &mut W,
    mode: IndexMode,
    delay_cs: u16,
) -> io::Result<()> {
    w.write_all(&[EXTENSION, GRAPHIC_CONTROL, 0x04, graphic_control_flags(mode)])?;
    w.write_all(&delay_cs.to_le_bytes())?;
    w.write_all(&[0x00, 0x00])
}

/// Full-frame image descriptor, optionally announcing a local color table.
pub(crate) fn write_image_descriptor<W: Write>(
    w: &mut W,
    width: u16,
    height: u16,
    local_table_bits: Option<u8>,
) -> io::Result<()> {
    w.write_all(&[IMAGE_SEPARATOR, 0, 0, 0, 0])?;
    w.write_all(&width.to_le_bytes())?;
    w.write_all(&height.to_le_bytes())?;
    let packed = match local_table_bits {
        Some(bits) => TABLE_PRESENT | (bits - 1),
        None => 0,
    };
    w.write_all(&[packed])
}

/// Fill `buf` with a `2^bits`-entry color table.
///
/// With `reserve_first` entry 0 is a black placeholder for the reserved
/// index and the palette starts at entry 1. Unused entries are black.
pub(crate) fn fill_color_table(buf: &mut Vec<u8>, palette: &Palette, bits: u8, reserve_first: bool) {
    let size = 3usize << bits;
    buf.clear();
    if reserve_first {
        buf.extend_from_slice(&[0, 0, 0]);
    }
    buf.extend(palette.iter().flat_map(|c| c.to_bytes()));
    buf.resize(size, 0);
}
