//! Streaming animated GIF writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::blocks::{
    fill_color_table, write_graphic_control, write_header, write_image_descriptor,
    write_loop_forever, TRAILER,
};
use super::error::GifError;
use super::lzw::LzwCompressor;
use crate::image::IndexImage;
use crate::palette::Palette;
use crate::quantize::IndexMode;

/// Per-frame settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameOptions {
    /// Frame delay in hundredths of a second.
    pub delay_cs: u16,
    /// Write this frame's palette as a local color table.
    pub dynamic_palette: bool,
}

impl FrameOptions {
    #[inline]
    pub fn new(delay_cs: u16) -> Self {
        Self {
            delay_cs,
            dynamic_palette: false,
        }
    }

    #[inline]
    pub fn dynamic_palette(mut self, enabled: bool) -> Self {
        self.dynamic_palette = enabled;
        self
    }
}

/// State of an open file.
#[derive(Debug)]
struct Session<W: Write> {
    writer: W,
    width: u16,
    height: u16,
    /// Color table depth after making room for the reserved index.
    bits: u8,
    index_mode: IndexMode,
    header_written: bool,
    /// The global table holds two placeholder entries, so every frame
    /// carries its own table.
    dummy_global: bool,
    frames: usize,
    symbols: Vec<u8>,
    table: Vec<u8>,
}

impl<W: Write> Session<W> {
    fn reserves_index(&self) -> bool {
        self.index_mode.reserves_index()
    }

    /// Colors a table can hold next to the reserved entry.
    fn capacity(&self) -> usize {
        (1usize << self.bits) - self.reserves_index() as usize
    }

    /// Copy the index image into `symbols`, moving the reserved index to 0
    /// and every color one up when the session reserves an index.
    fn remap(&mut self, image: &IndexImage) -> Result<(), GifError> {
        let size = 1usize << self.bits;
        let reserved = image.reserved_index();
        let shift = self.reserves_index();

        self.symbols.clear();
        self.symbols.reserve(image.indices().len());
        for &index in image.indices() {
            let symbol = match (shift, reserved) {
                (true, Some(r)) if index == r => 0,
                (true, _) => index as usize + 1,
                (false, _) => index as usize,
            };
            if symbol >= size {
                return Err(GifError::IndexOutOfRange {
                    index: index as usize,
                    size,
                });
            }
            self.symbols.push(symbol as u8);
        }
        Ok(())
    }

    fn write_preamble(&mut self, palette: &Palette, dynamic: bool) -> Result<(), GifError> {
        if dynamic {
            write_header(&mut self.writer, self.width, self.height, 1)?;
            self.writer.write_all(&[0; 6])?;
        } else {
            write_header(&mut self.writer, self.width, self.height, self.bits)?;
            let reserve = self.reserves_index();
            fill_color_table(&mut self.table, palette, self.bits, reserve);
            self.writer.write_all(&self.table)?;
        }
        write_loop_forever(&mut self.writer)?;
        self.header_written = true;
        self.dummy_global = dynamic;
        Ok(())
    }
}

/// Writes an animated GIF89a one frame at a time.
///
/// The file is written as frames arrive; only the current frame's symbols
/// and one LZW sub-block are held in memory. The first frame decides the
/// global color table: its palette in static mode, or two placeholder
/// entries when it asks for a dynamic palette, after which every frame
/// carries a local table.
///
/// In Alpha and Delta index modes the color tables grow by one bit (up to 8)
/// and entry 0 becomes the transparent index, which the index image's
/// reserved value maps to.
///
/// # Example
///
/// ```
/// use gif_quant::{FrameOptions, GifStreamEncoder, IndexImage, IndexMode, Palette};
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("out.gif");
///
/// let palette = Palette::from_hex(&["#000000", "#ffffff"]).unwrap();
/// let frame = IndexImage::new(vec![0, 1, 1, 0], 2, 2, None).unwrap();
///
/// let mut encoder = GifStreamEncoder::new();
/// encoder.open_file(&path, 2, 2, 1, IndexMode::Default).unwrap();
/// encoder.encode_frame(&frame, &palette, &FrameOptions::new(10)).unwrap();
/// encoder.close_file().unwrap();
///
/// assert!(std::fs::read(&path).unwrap().starts_with(b"GIF89a"));
/// ```
#[derive(Debug)]
pub struct GifStreamEncoder<W: Write = BufWriter<File>> {
    session: Option<Session<W>>,
    lzw: LzwCompressor,
}

impl<W: Write> Default for GifStreamEncoder<W> {
    fn default() -> Self {
        Self {
            session: None,
            lzw: LzwCompressor::new(),
        }
    }
}

impl GifStreamEncoder<BufWriter<File>> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `path` and start a session on it.
    ///
    /// See [`open_writer`](Self::open_writer) for the parameters. The file
    /// is only created once the parameters have been validated.
    pub fn open_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        width: usize,
        height: usize,
        palette_bit_depth: u8,
        index_mode: IndexMode,
    ) -> Result<(), GifError> {
        if self.is_open() {
            self.close_file()?;
        }
        validate(width, height, palette_bit_depth)?;

        let file = File::create(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), width, height, "Opened GIF file");
        self.open_writer(BufWriter::new(file), width, height, palette_bit_depth, index_mode)
    }
}

fn validate(width: usize, height: usize, bits: u8) -> Result<(), GifError> {
    if !(1..=8).contains(&bits) {
        return Err(GifError::InvalidBitDepth(bits));
    }
    let max = u16::MAX as usize;
    if width == 0 || height == 0 || width > max || height > max {
        return Err(GifError::InvalidDimensions { width, height });
    }
    Ok(())
}

impl<W: Write> GifStreamEncoder<W> {
    /// Start a session writing to `writer`.
    ///
    /// `palette_bit_depth` (1-8) sizes the color tables; Alpha and Delta
    /// modes add one bit, capped at 8. An open session is closed first.
    ///
    /// # Errors
    ///
    /// - [`GifError::InvalidBitDepth`] outside `1..=8`
    /// - [`GifError::InvalidDimensions`] for a zero or >65535 side
    pub fn open_writer(
        &mut self,
        writer: W,
        width: usize,
        height: usize,
        palette_bit_depth: u8,
        index_mode: IndexMode,
    ) -> Result<(), GifError> {
        if self.is_open() {
            self.close_file()?;
        }
        validate(width, height, palette_bit_depth)?;

        let bits = if index_mode.reserves_index() {
            (palette_bit_depth + 1).min(8)
        } else {
            palette_bit_depth
        };

        self.session = Some(Session {
            writer,
            width: width as u16,
            height: height as u16,
            bits,
            index_mode,
            header_written: false,
            dummy_global: false,
            frames: 0,
            symbols: Vec::with_capacity(width * height),
            table: Vec::with_capacity(3 << bits),
        });
        Ok(())
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Frames written in the current session.
    pub fn frames_written(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.frames)
    }

    /// Color table depth of the current session, reserved entry included.
    pub fn bit_depth(&self) -> Option<u8> {
        self.session.as_ref().map(|s| s.bits)
    }

    /// Append one frame.
    ///
    /// The first frame also writes the header, the global color table and
    /// the loop extension.
    ///
    /// # Errors
    ///
    /// - [`GifError::NotOpen`] without a session
    /// - [`GifError::DimensionMismatch`] when the frame size differs
    /// - [`GifError::PaletteTooLarge`] when the palette does not fit the table
    /// - [`GifError::IndexOutOfRange`] for an index past the table
    pub fn encode_frame(
        &mut self,
        image: &IndexImage,
        palette: &Palette,
        options: &FrameOptions,
    ) -> Result<(), GifError> {
        let session = self.session.as_mut().ok_or(GifError::NotOpen)?;

        if image.width() != session.width as usize || image.height() != session.height as usize {
            return Err(GifError::DimensionMismatch {
                width: image.width(),
                height: image.height(),
                expected_width: session.width as usize,
                expected_height: session.height as usize,
            });
        }
        if palette.len() > session.capacity() {
            return Err(GifError::PaletteTooLarge {
                len: palette.len(),
                max: session.capacity(),
            });
        }
        session.remap(image)?;

        if !session.header_written {
            session.write_preamble(palette, options.dynamic_palette)?;
        }

        write_graphic_control(&mut session.writer, session.index_mode, options.delay_cs)?;

        let local = options.dynamic_palette || session.dummy_global;
        write_image_descriptor(
            &mut session.writer,
            session.width,
            session.height,
            local.then_some(session.bits),
        )?;
        if local {
            let reserve = session.reserves_index();
            fill_color_table(&mut session.table, palette, session.bits, reserve);
            session.writer.write_all(&session.table)?;
        }

        let min_code_size = session.bits.max(2);
        self.lzw
            .compress(&session.symbols, min_code_size, &mut session.writer)?;

        session.frames += 1;
        tracing::trace!(
            frame = session.frames,
            colors = palette.len(),
            local_table = local,
            "Encoded GIF frame"
        );
        Ok(())
    }

    /// Write the trailer, flush and drop the writer.
    pub fn close_file(&mut self) -> Result<(), GifError> {
        self.finish().map(drop)
    }

    /// Like [`close_file`](Self::close_file), but hand the writer back.
    pub fn finish(&mut self) -> Result<W, GifError> {
        let mut session = self.session.take().ok_or(GifError::NotOpen)?;
        session.writer.write_all(&[TRAILER])?;
        session.writer.flush()?;
        tracing::debug!(frames = session.frames, "Closed GIF session");
        Ok(session.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bw() -> Palette {
        Palette::from_hex(&["#000000", "#ffffff"]).unwrap()
    }

    fn memory_encoder() -> GifStreamEncoder<Vec<u8>> {
        GifStreamEncoder::default()
    }

    #[test]
    fn test_byte_exact_two_by_two() {
        let mut encoder = memory_encoder();
        encoder
            .open_writer(Vec::new(), 2, 2, 1, IndexMode::Default)
            .unwrap();
        let frame = IndexImage::new(vec![0, 1, 1, 0], 2, 2, None).unwrap();
        encoder.encode_frame(&frame, &bw(), &FrameOptions::new(10)).unwrap();
        let bytes = encoder.finish().unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(b"GIF89a");
        expected.extend_from_slice(&[2, 0, 2, 0, 0xF0, 0, 0]);
        expected.extend_from_slice(&[0, 0, 0, 255, 255, 255]);
        expected.extend_from_slice(&[0x21, 0xFF, 0x0B]);
        expected.extend_from_slice(b"NETSCAPE2.0");
        expected.extend_from_slice(&[0x03, 0x01, 0x00, 0x00, 0x00]);
        expected.extend_from_slice(&[0x21, 0xF9, 0x04, 0x08, 10, 0, 0, 0]);
        expected.extend_from_slice(&[0x2C, 0, 0, 0, 0, 2, 0, 2, 0, 0]);
        // clear(4) 0 1 1 at 3 bits; adding entry 8 widens codes to 4 bits
        // for the final 0 and eoi(5): 4 | 1 << 6 | 1 << 9 | 5 << 16 = 0x05_0244
        expected.extend_from_slice(&[2, 3, 0x44, 0x02, 0x05, 0]);
        expected.push(0x3B);

        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_not_open() {
        let mut encoder = memory_encoder();
        let frame = IndexImage::new(vec![0], 1, 1, None).unwrap();
        assert!(matches!(
            encoder.encode_frame(&frame, &bw(), &FrameOptions::new(1)),
            Err(GifError::NotOpen)
        ));
        assert!(matches!(encoder.close_file(), Err(GifError::NotOpen)));
    }

    #[test]
    fn test_open_validation() {
        let mut encoder = memory_encoder();
        assert!(matches!(
            encoder.open_writer(Vec::new(), 2, 2, 0, IndexMode::Default),
            Err(GifError::InvalidBitDepth(0))
        ));
        assert!(matches!(
            encoder.open_writer(Vec::new(), 2, 2, 9, IndexMode::Default),
            Err(GifError::InvalidBitDepth(9))
        ));
        assert!(matches!(
            encoder.open_writer(Vec::new(), 0, 2, 4, IndexMode::Default),
            Err(GifError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            encoder.open_writer(Vec::new(), 70_000, 1, 4, IndexMode::Default),
            Err(GifError::InvalidDimensions { .. })
        ));
        assert!(!encoder.is_open());
    }

    #[test]
    fn test_reserved_mode_raises_bit_depth() {
        let mut encoder = memory_encoder();
        encoder.open_writer(Vec::new(), 1, 1, 4, IndexMode::Alpha).unwrap();
        assert_eq!(encoder.bit_depth(), Some(5));
        encoder.open_writer(Vec::new(), 1, 1, 8, IndexMode::Delta).unwrap();
        assert_eq!(encoder.bit_depth(), Some(8));
        encoder.open_writer(Vec::new(), 1, 1, 8, IndexMode::Default).unwrap();
        assert_eq!(encoder.bit_depth(), Some(8));
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut encoder = memory_encoder();
        encoder.open_writer(Vec::new(), 2, 2, 1, IndexMode::Default).unwrap();
        let frame = IndexImage::new(vec![0; 3], 3, 1, None).unwrap();
        assert!(matches!(
            encoder.encode_frame(&frame, &bw(), &FrameOptions::new(1)),
            Err(GifError::DimensionMismatch { width: 3, height: 1, .. })
        ));
        assert_eq!(encoder.frames_written(), 0);
    }

    #[test]
    fn test_palette_too_large_at_ceiling() {
        let mut encoder = memory_encoder();
        encoder.open_writer(Vec::new(), 1, 1, 8, IndexMode::Alpha).unwrap();
        let palette = Palette::new(vec![crate::Rgb::BLACK; 256]).unwrap();
        let frame = IndexImage::new(vec![0], 1, 1, Some(255)).unwrap();
        assert!(matches!(
            encoder.encode_frame(&frame, &palette, &FrameOptions::new(1)),
            Err(GifError::PaletteTooLarge { len: 256, max: 255 })
        ));
    }

    #[test]
    fn test_index_out_of_range() {
        let mut encoder = memory_encoder();
        encoder.open_writer(Vec::new(), 2, 1, 1, IndexMode::Default).unwrap();
        let frame = IndexImage::new(vec![0, 2], 2, 1, None).unwrap();
        assert!(matches!(
            encoder.encode_frame(&frame, &bw(), &FrameOptions::new(1)),
            Err(GifError::IndexOutOfRange { index: 2, size: 2 })
        ));
    }

    #[test]
    fn test_remap_moves_reserved_to_zero() {
        let mut encoder = memory_encoder();
        encoder.open_writer(Vec::new(), 3, 1, 1, IndexMode::Alpha).unwrap();
        let frame = IndexImage::new(vec![0, 1, 2], 3, 1, Some(2)).unwrap();
        encoder.encode_frame(&frame, &bw(), &FrameOptions::new(1)).unwrap();

        let session = encoder.session.as_ref().unwrap();
        assert_eq!(session.symbols, vec![1, 2, 0]);
    }

    #[test]
    fn test_static_reserved_global_table() {
        let mut encoder = memory_encoder();
        encoder.open_writer(Vec::new(), 1, 1, 1, IndexMode::Alpha).unwrap();
        let palette = Palette::from_hex(&["#ff0000", "#00ff00"]).unwrap();
        let frame = IndexImage::new(vec![0], 1, 1, Some(2)).unwrap();
        encoder.encode_frame(&frame, &palette, &FrameOptions::new(1)).unwrap();
        let bytes = encoder.finish().unwrap();

        // bits 2: LSD flags 0xF1, four entries with the placeholder first
        assert_eq!(bytes[10], 0xF1);
        assert_eq!(&bytes[13..25], &[0, 0, 0, 255, 0, 0, 0, 255, 0, 0, 0, 0]);
        // GCE flags: restore to background + transparency
        assert_eq!(bytes[25 + 19 + 3], 0x09);
    }

    #[test]
    fn test_dynamic_session_writes_local_tables() {
        let mut encoder = memory_encoder();
        encoder.open_writer(Vec::new(), 1, 1, 2, IndexMode::Default).unwrap();
        let frame = IndexImage::new(vec![0], 1, 1, None).unwrap();
        let options = FrameOptions::new(5).dynamic_palette(true);
        encoder.encode_frame(&frame, &bw(), &options).unwrap();
        // a static frame after a dynamic first frame still needs a local table
        encoder.encode_frame(&frame, &bw(), &FrameOptions::new(5)).unwrap();
        let bytes = encoder.finish().unwrap();

        assert_eq!(bytes[10], 0xF0);
        assert_eq!(&bytes[13..19], &[0; 6]);

        let first_descriptor = 19 + 19 + 8;
        assert_eq!(bytes[first_descriptor], 0x2C);
        assert_eq!(bytes[first_descriptor + 9], 0x81);
        assert_eq!(
            &bytes[first_descriptor + 10..first_descriptor + 22],
            &[0, 0, 0, 255, 255, 255, 0, 0, 0, 0, 0, 0]
        );

        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::Indexed);
        let mut decoder = options.read_info(bytes.as_slice()).unwrap();
        let mut frames = 0;
        while let Some(frame) = decoder.read_next_frame().unwrap() {
            assert!(frame.palette.is_some());
            frames += 1;
        }
        assert_eq!(frames, 2);
    }

    #[test]
    fn test_reopen_closes_previous_session() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.gif");
        let second = dir.path().join("second.gif");

        let mut encoder = GifStreamEncoder::new();
        encoder.open_file(&first, 1, 1, 1, IndexMode::Default).unwrap();
        let frame = IndexImage::new(vec![1], 1, 1, None).unwrap();
        encoder.encode_frame(&frame, &bw(), &FrameOptions::new(1)).unwrap();
        assert_eq!(encoder.frames_written(), 1);

        encoder.open_file(&second, 1, 1, 1, IndexMode::Default).unwrap();
        assert_eq!(encoder.frames_written(), 0);
        encoder.close_file().unwrap();
        assert!(!encoder.is_open());

        let bytes = std::fs::read(&first).unwrap();
        assert_eq!(bytes.last(), Some(&0x3B));
    }

    #[test]
    fn test_open_file_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.gif");
        let mut encoder = GifStreamEncoder::new();
        assert!(matches!(
            encoder.open_file(&path, 1, 1, 1, IndexMode::Default),
            Err(GifError::Io(_))
        ));
        assert!(!encoder.is_open());
    }

    #[test]
    fn test_decoder_reads_delta_frames() {
        let mut encoder = memory_encoder();
        encoder.open_writer(Vec::new(), 2, 1, 1, IndexMode::Delta).unwrap();
        let palette = bw();
        let first = IndexImage::new(vec![0, 1], 2, 1, Some(2)).unwrap();
        let second = IndexImage::new(vec![2, 0], 2, 1, Some(2)).unwrap();
        encoder.encode_frame(&first, &palette, &FrameOptions::new(3)).unwrap();
        encoder.encode_frame(&second, &palette, &FrameOptions::new(3)).unwrap();
        let bytes = encoder.finish().unwrap();

        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::Indexed);
        let mut decoder = options.read_info(bytes.as_slice()).unwrap();

        let frame = decoder.read_next_frame().unwrap().unwrap();
        assert_eq!(frame.buffer.to_vec(), vec![1, 2]);
        assert_eq!(frame.transparent, Some(0));
        assert_eq!(frame.dispose, gif::DisposalMethod::Keep);
        assert_eq!(frame.delay, 3);

        let frame = decoder.read_next_frame().unwrap().unwrap();
        assert_eq!(frame.buffer.to_vec(), vec![0, 1]);
    }
}
