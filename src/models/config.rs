use std::path::Path;

use clap::ValueEnum;
use gif_quant::{DitherMode, IndexMode, Palette, QuantizeOptions, DEFAULT_REL_TOL};
use serde::Deserialize;

use crate::error::ExportError;

/// Export settings loaded from a YAML file, overridable from the command line.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ExportConfig {
    /// Frames per second of the animation
    #[serde(default = "default_fps")]
    pub fps: f32,

    /// Color table depth; the palette has `2^palette_bits` colors
    #[serde(default = "default_palette_bits")]
    pub palette_bits: u8,

    /// One palette for the whole file, or one per frame
    #[serde(default)]
    pub palette_mode: PaletteMode,

    /// Merge per-frame palettes into a shared palette
    #[serde(default)]
    pub cumulate_palette: bool,

    /// Palettes kept for cumulation; in dynamic mode also the number of
    /// frames between resolves
    #[serde(default = "default_history_rows")]
    pub history_rows: usize,

    #[serde(default)]
    pub dither: DitherSetting,

    /// Dither strength in `0.0..=1.0`, `0.0` picks one from the palette size
    #[serde(default)]
    pub dither_threshold: f32,

    #[serde(default)]
    pub index_mode: IndexModeSetting,

    #[serde(default)]
    pub alpha_cutoff: Option<u8>,

    /// Cluster on downsampled frames
    #[serde(default)]
    pub fast_mode: bool,

    #[serde(default = "default_rel_tol")]
    pub rel_tol: f32,

    /// Quantizer worker threads, 0 = one per CPU
    #[serde(default)]
    pub threads: usize,

    /// Hex colors to use instead of clustering
    #[serde(default)]
    pub fixed_palette: Option<Vec<String>>,
}

fn default_fps() -> f32 {
    25.0
}

fn default_palette_bits() -> u8 {
    8
}

fn default_history_rows() -> usize {
    64
}

fn default_rel_tol() -> f32 {
    DEFAULT_REL_TOL
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaletteMode {
    /// Global color table computed once
    #[default]
    Static,
    /// Local color table per frame
    Dynamic,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DitherSetting {
    #[default]
    None,
    Order2,
    Order4,
}

impl From<DitherSetting> for DitherMode {
    fn from(setting: DitherSetting) -> Self {
        match setting {
            DitherSetting::None => DitherMode::None,
            DitherSetting::Order2 => DitherMode::Order2,
            DitherSetting::Order4 => DitherMode::Order4,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IndexModeSetting {
    #[default]
    Default,
    /// Transparent pixels use the reserved index
    Alpha,
    /// Pixels unchanged since the previous frame use the reserved index
    Delta,
}

impl From<IndexModeSetting> for IndexMode {
    fn from(setting: IndexModeSetting) -> Self {
        match setting {
            IndexModeSetting::Default => IndexMode::Default,
            IndexModeSetting::Alpha => IndexMode::Alpha,
            IndexModeSetting::Delta => IndexMode::Delta,
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub fps: Option<f32>,
    pub palette_bits: Option<u8>,
    pub dynamic_palette: bool,
    pub cumulate_palette: bool,
    pub dither: Option<DitherSetting>,
    pub index_mode: Option<IndexModeSetting>,
    pub alpha_cutoff: Option<u8>,
    pub fast_mode: bool,
}

impl ExportConfig {
    /// Load a config file, failing on any read or parse error.
    pub fn from_file(path: &Path) -> Result<Self, ExportError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| ExportError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file if there is a usable one, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str::<Self>(&content) {
                Ok(config) => match config.validate() {
                    Ok(()) => {
                        tracing::info!(
                            path = %path.display(),
                            palette_bits = config.palette_bits,
                            "Loaded configuration"
                        );
                        config
                    }
                    Err(e) => {
                        tracing::warn!(%e, "Invalid config, using defaults");
                        Self::default()
                    }
                },
                Err(e) => {
                    tracing::warn!(%e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                tracing::warn!(%e, "Failed to read config, using defaults");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(fps) = overrides.fps {
            self.fps = fps;
        }
        if let Some(bits) = overrides.palette_bits {
            self.palette_bits = bits;
        }
        if overrides.dynamic_palette {
            self.palette_mode = PaletteMode::Dynamic;
        }
        if overrides.cumulate_palette {
            self.cumulate_palette = true;
        }
        if let Some(dither) = overrides.dither {
            self.dither = dither;
        }
        if let Some(mode) = overrides.index_mode {
            self.index_mode = mode;
        }
        if overrides.alpha_cutoff.is_some() {
            self.alpha_cutoff = overrides.alpha_cutoff;
        }
        if overrides.fast_mode {
            self.fast_mode = true;
        }
    }

    pub fn validate(&self) -> Result<(), ExportError> {
        if !(1..=8).contains(&self.palette_bits) {
            return Err(ExportError::Config(format!(
                "palette_bits must be 1-8, got {}",
                self.palette_bits
            )));
        }
        if self.fps.is_nan() || self.fps <= 0.0 {
            return Err(ExportError::Config(format!(
                "fps must be positive, got {}",
                self.fps
            )));
        }
        if self.history_rows == 0 {
            return Err(ExportError::Config("history_rows must be at least 1".to_string()));
        }
        if let Some(palette) = self.fixed_palette()? {
            let max = self.max_colors();
            if palette.len() > max {
                return Err(ExportError::Config(format!(
                    "fixed_palette has {} colors, {} palette bits hold {}",
                    palette.len(),
                    self.palette_bits,
                    max
                )));
            }
        }
        Ok(())
    }

    /// Real colors a frame can use once the reserved index is set aside.
    pub fn max_colors(&self) -> usize {
        IndexMode::from(self.index_mode).palette_size(self.palette_size())
    }

    /// Frame delay in hundredths of a second, at least 1.
    pub fn delay_cs(&self) -> u16 {
        (100.0 / self.fps).round().clamp(1.0, u16::MAX as f32) as u16
    }

    /// Palette size to request from the quantizer.
    ///
    /// Alpha and Delta modes ask for one extra entry: the quantizer gives
    /// one up for the reserved index, and the GIF table grows by one bit to
    /// hold it, so `2^palette_bits` real colors remain (255 at 8 bits).
    pub fn palette_size(&self) -> usize {
        let reserve = IndexMode::from(self.index_mode).reserves_index() as usize;
        (1usize << self.palette_bits) + reserve
    }

    pub fn quantize_options(&self) -> QuantizeOptions {
        QuantizeOptions::new()
            .dither_mode(self.dither.into())
            .dither_threshold(self.dither_threshold)
            .index_mode(self.index_mode.into())
            .alpha_cutoff(self.alpha_cutoff)
            .rel_tol(self.rel_tol)
            .fast_mode(self.fast_mode)
    }

    pub fn fixed_palette(&self) -> Result<Option<Palette>, ExportError> {
        match &self.fixed_palette {
            Some(hex) => Ok(Some(Palette::from_hex(hex)?)),
            None => Ok(None),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            palette_bits: default_palette_bits(),
            palette_mode: PaletteMode::Static,
            cumulate_palette: false,
            history_rows: default_history_rows(),
            dither: DitherSetting::None,
            dither_threshold: 0.0,
            index_mode: IndexModeSetting::Default,
            alpha_cutoff: None,
            fast_mode: false,
            rel_tol: default_rel_tol(),
            threads: 0,
            fixed_palette: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = ExportConfig::default();
        assert_eq!(config.fps, 25.0);
        assert_eq!(config.palette_bits, 8);
        assert_eq!(config.palette_mode, PaletteMode::Static);
        assert!(!config.cumulate_palette);
        assert_eq!(config.history_rows, 64);
        assert!(config.fixed_palette.is_none());
    }

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: ExportConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, ExportConfig::default());
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r##"
fps: 50
palette_bits: 4
palette_mode: dynamic
cumulate_palette: true
history_rows: 8
dither: order4
dither_threshold: 0.5
index_mode: delta
alpha_cutoff: 100
fast_mode: true
threads: 2
fixed_palette: ["#000000", "#ffffff"]
"##;
        let config: ExportConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.fps, 50.0);
        assert_eq!(config.palette_bits, 4);
        assert_eq!(config.palette_mode, PaletteMode::Dynamic);
        assert!(config.cumulate_palette);
        assert_eq!(config.history_rows, 8);
        assert_eq!(config.dither, DitherSetting::Order4);
        assert_eq!(config.index_mode, IndexModeSetting::Delta);
        assert_eq!(config.alpha_cutoff, Some(100));
        assert!(config.fast_mode);
        assert_eq!(config.threads, 2);
        assert_eq!(config.fixed_palette().unwrap().unwrap().len(), 2);
    }

    #[test]
    fn test_deserialize_rejects_unknown_mode() {
        let result: Result<ExportConfig, _> = serde_yaml::from_str("palette_mode: sometimes");
        assert!(result.is_err());
    }

    #[test]
    fn test_delay_cs() {
        let mut config = ExportConfig::default();
        assert_eq!(config.delay_cs(), 4);
        config.fps = 30.0;
        assert_eq!(config.delay_cs(), 3);
        config.fps = 1000.0;
        assert_eq!(config.delay_cs(), 1);
        config.fps = 0.5;
        assert_eq!(config.delay_cs(), 200);
    }

    #[test]
    fn test_palette_size() {
        let mut config = ExportConfig::default();
        assert_eq!(config.palette_size(), 256);
        config.index_mode = IndexModeSetting::Alpha;
        assert_eq!(config.palette_size(), 257);
        assert_eq!(IndexMode::Alpha.palette_size(config.palette_size()), 255);
        config.palette_bits = 4;
        assert_eq!(IndexMode::Alpha.palette_size(config.palette_size()), 16);
    }

    #[test]
    fn test_quantize_options() {
        let config = ExportConfig {
            dither: DitherSetting::Order2,
            index_mode: IndexModeSetting::Alpha,
            alpha_cutoff: Some(10),
            fast_mode: true,
            ..Default::default()
        };
        let options = config.quantize_options();
        assert_eq!(options.dither_mode, DitherMode::Order2);
        assert_eq!(options.index_mode, IndexMode::Alpha);
        assert_eq!(options.alpha_cutoff, Some(10));
        assert!(options.fast_mode);
    }

    #[test]
    fn test_validate() {
        let mut config = ExportConfig::default();
        assert!(config.validate().is_ok());
        config.palette_bits = 9;
        assert!(config.validate().is_err());
        config.palette_bits = 8;
        config.fps = 0.0;
        assert!(config.validate().is_err());
        config.fps = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_fixed_palette_size() {
        let mut config = ExportConfig {
            palette_bits: 1,
            fixed_palette: Some(vec!["#000".into(), "#fff".into()]),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        config.fixed_palette = Some(vec!["#000".into(), "#fff".into(), "#f00".into()]);
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Config error: fixed_palette has 3 colors, 1 palette bits hold 2"
        );

        config.palette_bits = 8;
        config.index_mode = IndexModeSetting::Delta;
        config.fixed_palette = Some(vec!["#000".into(); 256]);
        assert_eq!(config.max_colors(), 255);
        assert!(matches!(config.validate(), Err(ExportError::Config(_))));

        config.fixed_palette = Some(vec!["#zzz".into()]);
        assert!(matches!(config.validate(), Err(ExportError::Palette(_))));
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = ExportConfig::default();
        config.apply_overrides(&ConfigOverrides {
            fps: Some(10.0),
            dynamic_palette: true,
            dither: Some(DitherSetting::Order4),
            ..Default::default()
        });
        assert_eq!(config.fps, 10.0);
        assert_eq!(config.palette_mode, PaletteMode::Dynamic);
        assert_eq!(config.dither, DitherSetting::Order4);
        assert_eq!(config.palette_bits, 8);
        assert!(!config.cumulate_palette);
    }

    #[test]
    fn test_from_file_and_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.yaml");
        std::fs::write(&good, "palette_bits: 3\n").unwrap();
        assert_eq!(ExportConfig::from_file(&good).unwrap().palette_bits, 3);

        let bad = dir.path().join("bad.yaml");
        std::fs::write(&bad, "palette_bits: [1, 2]\n").unwrap();
        assert!(matches!(
            ExportConfig::from_file(&bad),
            Err(ExportError::Config(_))
        ));
        assert_eq!(ExportConfig::load_or_default(&bad), ExportConfig::default());

        let missing = dir.path().join("missing.yaml");
        assert_eq!(ExportConfig::load_or_default(&missing), ExportConfig::default());
    }
}
