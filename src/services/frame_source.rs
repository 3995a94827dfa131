//! Where export frames come from.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use gif_quant::SourceImage;

use crate::error::ExportError;

/// A finite, rewindable sequence of equally sized RGBA frames.
pub trait FrameSource {
    /// Width and height shared by every frame.
    fn dimensions(&self) -> (usize, usize);

    fn frame_count(&self) -> usize;

    /// The next frame, or `None` past the end.
    fn next_frame(&mut self) -> Result<Option<SourceImage>, ExportError>;

    /// Start again from the first frame.
    fn rewind(&mut self) -> Result<(), ExportError>;
}

/// Directory of `.png` files played back in file name order.
#[derive(Debug, Clone)]
pub struct PngSequence {
    paths: Vec<PathBuf>,
    width: usize,
    height: usize,
    position: usize,
}

impl PngSequence {
    /// Collect the PNG files in `dir` and read the size of the first one.
    pub fn open(dir: &Path) -> Result<Self, ExportError> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
            })
            .collect();
        paths.sort();

        let Some(first) = paths.first() else {
            return Err(ExportError::NoFrames(dir.to_path_buf()));
        };
        let (width, height) = png_dimensions(first)?;

        tracing::info!(
            dir = %dir.display(),
            frames = paths.len(),
            width,
            height,
            "Opened PNG sequence"
        );

        Ok(Self {
            paths,
            width,
            height,
            position: 0,
        })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl FrameSource for PngSequence {
    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn frame_count(&self) -> usize {
        self.paths.len()
    }

    fn next_frame(&mut self) -> Result<Option<SourceImage>, ExportError> {
        let Some(path) = self.paths.get(self.position) else {
            return Ok(None);
        };

        let image = decode_png(path)?;
        if image.width() != self.width || image.height() != self.height {
            return Err(ExportError::FrameSize {
                index: self.position,
                width: image.width(),
                height: image.height(),
                expected_width: self.width,
                expected_height: self.height,
            });
        }

        self.position += 1;
        Ok(Some(image))
    }

    fn rewind(&mut self) -> Result<(), ExportError> {
        self.position = 0;
        Ok(())
    }
}

fn png_reader(path: &Path) -> Result<png::Reader<BufReader<File>>, ExportError> {
    let file = File::open(path)?;
    let mut decoder = png::Decoder::new(BufReader::new(file));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    decoder.read_info().map_err(|source| ExportError::Png {
        path: path.to_path_buf(),
        source,
    })
}

fn png_dimensions(path: &Path) -> Result<(usize, usize), ExportError> {
    let reader = png_reader(path)?;
    let info = reader.info();
    Ok((info.width as usize, info.height as usize))
}

/// Decode a PNG file to 8-bit RGBA.
///
/// Palette, gray and 16-bit images are expanded; gray is replicated to
/// RGB and missing alpha is opaque.
pub fn decode_png(path: &Path) -> Result<SourceImage, ExportError> {
    let mut reader = png_reader(path)?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).map_err(|source| ExportError::Png {
        path: path.to_path_buf(),
        source,
    })?;

    if info.bit_depth != png::BitDepth::Eight {
        return Err(ExportError::UnsupportedPng {
            path: path.to_path_buf(),
            detail: format!("{:?} bit depth after expansion", info.bit_depth),
        });
    }

    let bytes = &buf[..info.buffer_size()];
    let pixels: Vec<[u8; 4]> = match info.color_type {
        png::ColorType::Rgba => bytes
            .chunks_exact(4)
            .map(|p| [p[0], p[1], p[2], p[3]])
            .collect(),
        png::ColorType::Rgb => bytes
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        png::ColorType::GrayscaleAlpha => bytes
            .chunks_exact(2)
            .map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        png::ColorType::Grayscale => bytes.iter().map(|&g| [g, g, g, 255]).collect(),
        png::ColorType::Indexed => {
            return Err(ExportError::UnsupportedPng {
                path: path.to_path_buf(),
                detail: "indexed color was not expanded".to_string(),
            })
        }
    };

    tracing::trace!(path = %path.display(), color_type = ?info.color_type, "Decoded frame");
    Ok(SourceImage::from_rgba8(
        info.width as usize,
        info.height as usize,
        pixels,
    )?)
}
