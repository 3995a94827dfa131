pub mod exporter;
pub mod frame_source;

pub use exporter::{palette_of, ExportReport, GifExporter};
pub use frame_source::{decode_png, FrameSource, PngSequence};
