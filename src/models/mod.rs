pub mod config;

pub use config::{ConfigOverrides, DitherSetting, ExportConfig, IndexModeSetting, PaletteMode};
