//! Frame fixtures and GIF inspection helpers.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub const WIDTH: usize = 24;
pub const HEIGHT: usize = 16;

pub const BACKGROUND: [u8; 4] = [40, 40, 60, 255];
pub const SQUARE: [u8; 4] = [230, 30, 30, 255];
pub const CLEAR: [u8; 4] = [0, 0, 0, 0];

/// A 4x4 square moving right by two pixels per frame.
pub fn moving_square(frame: usize, background: [u8; 4]) -> Vec<[u8; 4]> {
    let left = 2 + frame * 2;
    (0..WIDTH * HEIGHT)
        .map(|i| {
            let (x, y) = (i % WIDTH, i / WIDTH);
            if (left..left + 4).contains(&x) && (6..10).contains(&y) {
                SQUARE
            } else {
                background
            }
        })
        .collect()
}

/// Smooth gradient that changes over time; far more colors than a palette holds.
pub fn gradient(frame: usize) -> Vec<[u8; 4]> {
    (0..WIDTH * HEIGHT)
        .map(|i| {
            let (x, y) = (i % WIDTH, i / WIDTH);
            [
                (x * 255 / (WIDTH - 1)) as u8,
                (y * 255 / (HEIGHT - 1)) as u8,
                ((frame * 37) % 256) as u8,
                255,
            ]
        })
        .collect()
}

pub fn write_png(path: &Path, width: usize, height: usize, pixels: &[[u8; 4]]) {
    let file = File::create(path).unwrap();
    let mut encoder = png::Encoder::new(BufWriter::new(file), width as u32, height as u32);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().unwrap();
    let data: Vec<u8> = pixels.iter().flatten().copied().collect();
    writer.write_image_data(&data).unwrap();
}

/// Write frames as `frame_0000.png`, `frame_0001.png`, ... into `dir`.
pub fn write_sequence(dir: &Path, frames: &[Vec<[u8; 4]>]) {
    for (i, pixels) in frames.iter().enumerate() {
        write_png(&dir.join(format!("frame_{i:04}.png")), WIDTH, HEIGHT, pixels);
    }
}

/// Everything a test wants to know about a decoded GIF.
pub struct DecodedGif {
    pub width: u16,
    pub height: u16,
    pub global_palette: Option<Vec<u8>>,
    pub repeat: gif::Repeat,
    pub frames: Vec<DecodedFrame>,
}

pub struct DecodedFrame {
    pub rgba: Vec<[u8; 4]>,
    pub local_palette: Option<Vec<u8>>,
    pub transparent: Option<u8>,
    pub dispose: gif::DisposalMethod,
    pub delay: u16,
}

pub fn decode_gif(path: &Path) -> DecodedGif {
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::RGBA);
    let mut decoder = options.read_info(File::open(path).unwrap()).unwrap();

    let mut frames = Vec::new();
    while let Some(frame) = decoder.read_next_frame().unwrap() {
        frames.push(DecodedFrame {
            rgba: frame
                .buffer
                .chunks_exact(4)
                .map(|c| [c[0], c[1], c[2], c[3]])
                .collect(),
            local_palette: frame.palette.clone(),
            transparent: frame.transparent,
            dispose: frame.dispose,
            delay: frame.delay,
        });
    }

    DecodedGif {
        width: decoder.width(),
        height: decoder.height(),
        global_palette: decoder.global_palette().map(|p| p.to_vec()),
        repeat: decoder.repeat(),
        frames,
    }
}

/// Paint frames over each other the way a viewer keeping previous frames
/// would, returning the canvas after each frame.
pub fn composite(frames: &[DecodedFrame]) -> Vec<Vec<[u8; 4]>> {
    let mut canvas = vec![CLEAR; WIDTH * HEIGHT];
    frames
        .iter()
        .map(|frame| {
            for (dst, &src) in canvas.iter_mut().zip(&frame.rgba) {
                if src[3] != 0 {
                    *dst = src;
                }
            }
            canvas.clone()
        })
        .collect()
}

pub fn output_path(dir: &Path) -> PathBuf {
    dir.join("out.gif")
}
