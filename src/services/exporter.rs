//! Quantize a frame sequence and stream it into a GIF file.

use std::path::Path;

use gif_quant::{
    ColorQuantizer, FrameOptions, GifStreamEncoder, IndexMode, Palette, PaletteCumulator,
    QuantizeError, QuantizeOptions, Quantized,
};

use super::frame_source::FrameSource;
use crate::error::ExportError;
use crate::models::{ExportConfig, PaletteMode};

/// Summary of a finished export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub frames: usize,
    pub bytes: u64,
    /// Colors in the last frame's palette.
    pub palette_size: usize,
}

/// Runs export sessions with one quantizer.
///
/// The palette strategy follows the config:
/// - a fixed palette skips clustering altogether
/// - static mode computes one palette from the first frame, or with
///   cumulation from all frames in a first pass over the source
/// - dynamic mode clusters every frame, warm-starting from the previous
///   palette, and with cumulation swaps in the merged palette every
///   `history_rows` frames
#[derive(Debug)]
pub struct GifExporter {
    config: ExportConfig,
    quantizer: ColorQuantizer,
}

impl GifExporter {
    pub fn new(config: ExportConfig) -> Result<Self, ExportError> {
        config.validate()?;
        let quantizer = ColorQuantizer::with_threads(config.threads);
        if !quantizer.can_run_on_device_in_use() {
            let message = quantizer
                .error_message()
                .unwrap_or("unknown backend failure")
                .to_string();
            return Err(QuantizeError::Unavailable(message).into());
        }
        Ok(Self { config, quantizer })
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Write every frame of `source` to `path`.
    pub fn export<S: FrameSource + ?Sized>(
        &mut self,
        source: &mut S,
        path: &Path,
    ) -> Result<ExportReport, ExportError> {
        self.config.validate()?;
        if source.frame_count() == 0 {
            return Err(ExportError::EmptySource);
        }
        let (width, height) = source.dimensions();
        let options = self.config.quantize_options();
        let fixed = self.config.fixed_palette()?;
        let dynamic = self.config.palette_mode == PaletteMode::Dynamic;

        tracing::info!(
            path = %path.display(),
            frames = source.frame_count(),
            width,
            height,
            palette_bits = self.config.palette_bits,
            dynamic,
            cumulate = self.config.cumulate_palette,
            "Starting GIF export"
        );

        self.quantizer.reset();
        let mut encoder = GifStreamEncoder::new();
        encoder.open_file(
            path,
            width,
            height,
            self.config.palette_bits,
            options.index_mode,
        )?;

        let mut session = Session {
            quantizer: &mut self.quantizer,
            encoder: &mut encoder,
            options,
            frame: FrameOptions::new(self.config.delay_cs()).dynamic_palette(dynamic),
            palette_size: self.config.palette_size(),
            frames: 0,
            last_palette: 0,
        };

        match (fixed, dynamic, self.config.cumulate_palette) {
            (Some(palette), _, _) => session.encode_fixed(source, &palette)?,
            (None, false, false) => session.encode_static(source)?,
            (None, false, true) => session.encode_cumulated(source)?,
            (None, true, cumulate) => {
                let every = cumulate.then_some(self.config.history_rows);
                session.encode_dynamic(source, every)?
            }
        }

        let (frames, palette_size) = (session.frames, session.last_palette);
        encoder.close_file()?;

        let bytes = std::fs::metadata(path)?.len();
        tracing::info!(frames, bytes, palette_size, "GIF export finished");

        Ok(ExportReport {
            frames,
            bytes,
            palette_size,
        })
    }
}

/// Borrowed state for one export run.
struct Session<'a> {
    quantizer: &'a mut ColorQuantizer,
    encoder: &'a mut GifStreamEncoder,
    options: QuantizeOptions,
    frame: FrameOptions,
    palette_size: usize,
    frames: usize,
    last_palette: usize,
}

impl Session<'_> {
    fn write(&mut self, result: &Quantized) -> Result<(), ExportError> {
        self.encoder
            .encode_frame(&result.indices, &result.palette, &self.frame)?;
        self.frames += 1;
        self.last_palette = result.palette.len();
        Ok(())
    }

    fn encode_fixed<S: FrameSource + ?Sized>(
        &mut self,
        source: &mut S,
        palette: &Palette,
    ) -> Result<(), ExportError> {
        self.options.overwrite_input = true;
        while let Some(mut frame) = source.next_frame()? {
            let result = self
                .quantizer
                .quantize_with_palette(&mut frame, palette, &self.options)?;
            self.write(&result)?;
        }
        Ok(())
    }

    fn encode_static<S: FrameSource + ?Sized>(&mut self, source: &mut S) -> Result<(), ExportError> {
        self.options.overwrite_input = true;
        while let Some(mut frame) = source.next_frame()? {
            let result = self
                .quantizer
                .quantize(&mut frame, self.palette_size, &self.options)?;
            self.write(&result)?;
            self.options.recalculate_palette = false;
        }
        Ok(())
    }

    /// Two passes: merge every frame's palette, then map every frame onto
    /// the merged palette.
    fn encode_cumulated<S: FrameSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<(), ExportError> {
        let colors = self.options.index_mode.palette_size(self.palette_size);
        let mut cumulator = PaletteCumulator::new(colors, source.frame_count());
        let mut current = None;

        while let Some(frame) = source.next_frame()? {
            let palette = self
                .quantizer
                .cluster_palette(&frame, self.palette_size, &self.options)?;
            cumulator.accumulate(&palette);
            current = Some(palette);
        }
        let Some(current) = current else {
            return Err(ExportError::EmptySource);
        };

        let global = cumulator.resolve(self.quantizer, &current)?;
        tracing::debug!(
            rows = cumulator.rows(),
            colors = global.len(),
            "Resolved global palette"
        );

        source.rewind()?;
        self.encode_fixed(source, &global)
    }

    fn encode_dynamic<S: FrameSource + ?Sized>(
        &mut self,
        source: &mut S,
        resolve_every: Option<usize>,
    ) -> Result<(), ExportError> {
        let colors = self.options.index_mode.palette_size(self.palette_size);
        let mut cumulator =
            resolve_every.map(|rows| PaletteCumulator::new(colors, rows.min(source.frame_count())));
        let mut current: Option<Palette> = None;
        self.options.overwrite_input = true;
        self.options.reseed_palette = true;

        let mut index = 0;
        while let Some(mut frame) = source.next_frame()? {
            let resolve_now = matches!(resolve_every, Some(every) if index > 0 && index % every == 0);
            let result = match (cumulator.as_mut(), current.as_ref()) {
                (Some(cumulator), Some(current)) if resolve_now => {
                    let merged = cumulator.resolve(self.quantizer, current)?;
                    tracing::debug!(frame = index, colors = merged.len(), "Swapped in merged palette");
                    self.quantizer
                        .quantize_with_palette(&mut frame, &merged, &self.options)?
                }
                _ => self
                    .quantizer
                    .quantize(&mut frame, self.palette_size, &self.options)?,
            };

            if let Some(cumulator) = cumulator.as_mut() {
                cumulator.accumulate(&result.palette);
            }
            self.write(&result)?;
            current = Some(result.palette);
            self.options.reseed_palette = false;
            index += 1;
        }
        Ok(())
    }
}

/// Quantize a single image and return its palette, for inspection.
pub fn palette_of(
    quantizer: &mut ColorQuantizer,
    image: &mut gif_quant::SourceImage,
    colors: usize,
) -> Result<Palette, ExportError> {
    let options = QuantizeOptions::new().index_mode(IndexMode::Default);
    Ok(quantizer.quantize(image, colors, &options)?.palette)
}
