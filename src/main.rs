use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gif_quant::ColorQuantizer;
use shader_gif::models::{ConfigOverrides, DitherSetting, ExportConfig, IndexModeSetting};
use shader_gif::services::{decode_png, palette_of, GifExporter, PngSequence};

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG: &str = "shader-gif.yaml";

#[derive(Parser)]
#[command(name = "shader-gif")]
#[command(version)]
#[command(about = "Export rendered frame sequences as animated GIFs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a directory of PNG frames into an animated GIF
    Export {
        /// Directory with the PNG frames, played in file name order
        #[arg(short, long)]
        frames: PathBuf,

        /// Output GIF file path
        #[arg(short, long)]
        output: PathBuf,

        /// YAML export settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Frames per second
        #[arg(long)]
        fps: Option<f32>,

        /// Color table depth in bits (1-8)
        #[arg(long)]
        bits: Option<u8>,

        /// Give every frame its own palette
        #[arg(long)]
        dynamic_palette: bool,

        /// Merge per-frame palettes into a shared palette
        #[arg(long)]
        cumulate: bool,

        /// Ordered dithering
        #[arg(long, value_enum)]
        dither: Option<DitherSetting>,

        /// Reserved index semantics
        #[arg(long, value_enum)]
        index_mode: Option<IndexModeSetting>,

        /// Alpha values above this become opaque, the rest transparent
        #[arg(long)]
        alpha_cutoff: Option<u8>,

        /// Cluster on downsampled frames
        #[arg(long)]
        fast: bool,
    },
    /// Print the quantized palette of a single PNG
    Palette {
        /// Input PNG file
        #[arg(short, long)]
        input: PathBuf,

        /// Number of colors
        #[arg(short = 'n', long, default_value_t = 16)]
        colors: usize,

        /// Print JSON instead of one hex color per line
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct PaletteOutput {
    colors: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shader_gif=info,gif_quant=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    match cli.command {
        Commands::Export {
            frames,
            output,
            config,
            fps,
            bits,
            dynamic_palette,
            cumulate,
            dither,
            index_mode,
            alpha_cutoff,
            fast,
        } => {
            let overrides = ConfigOverrides {
                fps,
                palette_bits: bits,
                dynamic_palette,
                cumulate_palette: cumulate,
                dither,
                index_mode,
                alpha_cutoff,
                fast_mode: fast,
            };
            run_export_command(&frames, &output, config.as_deref(), &overrides)
        }
        Commands::Palette {
            input,
            colors,
            json,
        } => run_palette_command(&input, colors, json),
    }
}

/// Encode a PNG sequence to a GIF file
fn run_export_command(
    frames: &Path,
    output: &Path,
    config_path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> anyhow::Result<()> {
    let mut config = match config_path {
        Some(path) => ExportConfig::from_file(path)?,
        None => ExportConfig::load_or_default(Path::new(DEFAULT_CONFIG)),
    };
    config.apply_overrides(overrides);
    config.validate()?;

    let mut source = PngSequence::open(frames)?;
    let mut exporter = GifExporter::new(config)?;
    let report = exporter.export(&mut source, output)?;

    println!(
        "Wrote {} ({} frames, {} bytes, {} colors)",
        output.display(),
        report.frames,
        report.bytes,
        report.palette_size
    );
    Ok(())
}

/// Print the palette a single frame quantizes to
fn run_palette_command(input: &Path, colors: usize, json: bool) -> anyhow::Result<()> {
    let mut image = decode_png(input)?;
    let mut quantizer = ColorQuantizer::new();
    if !quantizer.can_run_on_device_in_use() {
        anyhow::bail!(
            "quantizer unavailable: {}",
            quantizer.error_message().unwrap_or("unknown")
        );
    }

    let palette = palette_of(&mut quantizer, &mut image, colors)?;
    let hex: Vec<String> = palette.iter().map(|c| c.to_string()).collect();

    if json {
        let output = PaletteOutput { colors: hex };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for color in hex {
            println!("{color}");
        }
    }
    Ok(())
}
