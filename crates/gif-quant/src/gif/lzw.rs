//! Variable-width LZW as used by GIF image data.
//!
//! Codes start at `min_code_size + 1` bits and grow up to 12. When all 4096
//! codes are taken a clear code is emitted and the dictionary starts over.
//! Output goes straight to the writer in length-prefixed sub-blocks of at
//! most 255 bytes.

use std::io::{self, Write};

use super::error::GifError;

const MAX_CODES: usize = 4096;
const MAX_CODE_BITS: u32 = 12;
const MAX_SUB_BLOCK: usize = 255;

/// Marks an empty child or sibling slot. Code 0 is a literal and never
/// appears as a child, so it is free to use.
const NONE: u16 = 0;

/// GIF LZW encoder.
///
/// The dictionary is a trie stored in three flat arrays indexed by code:
/// each code links to its first child, each child to its next sibling.
/// The arrays are allocated once and reused for every frame; no state
/// carries over between calls.
///
/// # Example
///
/// ```
/// use gif_quant::LzwCompressor;
///
/// let mut lzw = LzwCompressor::new();
/// let mut out = Vec::new();
/// lzw.compress(&[0, 0, 1, 1], 2, &mut out).unwrap();
///
/// assert_eq!(out[0], 2); // minimum code size
/// assert_eq!(*out.last().unwrap(), 0); // block terminator
/// ```
#[derive(Debug, Clone)]
pub struct LzwCompressor {
    first_child: Vec<u16>,
    next_sibling: Vec<u16>,
    symbol: Vec<u8>,
}

impl Default for LzwCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl LzwCompressor {
    pub fn new() -> Self {
        Self {
            first_child: vec![NONE; MAX_CODES],
            next_sibling: vec![NONE; MAX_CODES],
            symbol: vec![0; MAX_CODES],
        }
    }

    /// Write the table-based image data for `symbols`: the minimum code size
    /// byte, the data sub-blocks and the block terminator.
    ///
    /// # Errors
    ///
    /// - [`GifError::InvalidBitDepth`] unless `min_code_size` is in `2..=8`
    /// - [`GifError::IndexOutOfRange`] for a symbol `>= 2^min_code_size`
    /// - [`GifError::Io`] when the writer fails
    pub fn compress<W: Write>(
        &mut self,
        symbols: &[u8],
        min_code_size: u8,
        writer: &mut W,
    ) -> Result<(), GifError> {
        if !(2..=8).contains(&min_code_size) {
            return Err(GifError::InvalidBitDepth(min_code_size));
        }
        let alphabet = 1usize << min_code_size;
        if let Some(&bad) = symbols.iter().find(|&&s| s as usize >= alphabet) {
            return Err(GifError::IndexOutOfRange {
                index: bad as usize,
                size: alphabet,
            });
        }

        writer.write_all(&[min_code_size])?;

        let clear_code = alphabet as u32;
        let eoi_code = clear_code + 1;
        let first_free = eoi_code + 1;
        let initial_bits = min_code_size as u32 + 1;

        let mut out = SubBlockWriter::new(writer);
        let mut code_bits = initial_bits;
        let mut next_code = first_free;
        self.reset();

        out.write_code(clear_code, code_bits)?;

        let Some((&first, rest)) = symbols.split_first() else {
            out.write_code(eoi_code, code_bits)?;
            return Ok(out.finish()?);
        };

        let mut prefix = first as u16;
        for &sym in rest {
            if let Some(code) = self.find(prefix, sym) {
                prefix = code;
                continue;
            }

            out.write_code(prefix as u32, code_bits)?;

            if (next_code as usize) < MAX_CODES {
                self.insert(prefix, sym, next_code as u16);
                next_code += 1;
                if next_code > (1 << code_bits) && code_bits < MAX_CODE_BITS {
                    code_bits += 1;
                }
            } else {
                out.write_code(clear_code, code_bits)?;
                self.reset();
                code_bits = initial_bits;
                next_code = first_free;
            }

            prefix = sym as u16;
        }

        out.write_code(prefix as u32, code_bits)?;
        out.write_code(eoi_code, code_bits)?;
        Ok(out.finish()?)
    }

    fn reset(&mut self) {
        self.first_child.fill(NONE);
    }

    #[inline]
    fn find(&self, prefix: u16, sym: u8) -> Option<u16> {
        let mut child = self.first_child[prefix as usize];
        while child != NONE {
            if self.symbol[child as usize] == sym {
                return Some(child);
            }
            child = self.next_sibling[child as usize];
        }
        None
    }

    #[inline]
    fn insert(&mut self, prefix: u16, sym: u8, code: u16) {
        let slot = code as usize;
        self.symbol[slot] = sym;
        self.first_child[slot] = NONE;
        self.next_sibling[slot] = self.first_child[prefix as usize];
        self.first_child[prefix as usize] = code;
    }
}

/// Packs codes LSB-first and emits them as GIF data sub-blocks.
struct SubBlockWriter<'a, W: Write> {
    writer: &'a mut W,
    block: [u8; MAX_SUB_BLOCK],
    len: usize,
    acc: u32,
    bits: u32,
}

impl<'a, W: Write> SubBlockWriter<'a, W> {
    fn new(writer: &'a mut W) -> Self {
        Self {
            writer,
            block: [0; MAX_SUB_BLOCK],
            len: 0,
            acc: 0,
            bits: 0,
        }
    }

    fn write_code(&mut self, code: u32, width: u32) -> io::Result<()> {
        self.acc |= code << self.bits;
        self.bits += width;
        while self.bits >= 8 {
            self.push(self.acc as u8)?;
            self.acc >>= 8;
            self.bits -= 8;
        }
        Ok(())
    }

    fn push(&mut self, byte: u8) -> io::Result<()> {
        self.block[self.len] = byte;
        self.len += 1;
        if self.len == MAX_SUB_BLOCK {
            self.flush_block()?;
        }
        Ok(())
    }

    fn flush_block(&mut self) -> io::Result<()> {
        if self.len > 0 {
            self.writer.write_all(&[self.len as u8])?;
            self.writer.write_all(&self.block[..self.len])?;
            self.len = 0;
        }
        Ok(())
    }

    /// Pad the last byte, write the pending sub-block and the terminator.
    fn finish(mut self) -> io::Result<()> {
        if self.bits > 0 {
            self.push(self.acc as u8)?;
            self.acc = 0;
            self.bits = 0;
        }
        self.flush_block()?;
        self.writer.write_all(&[0])
    }
}
