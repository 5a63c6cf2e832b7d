use crate::colour::Colour;
use crate::geometry::PixelRect;
use crate::{DEFAULT_PALETTE_SLOTS, RANDOM_DENSITY, STAGNATION_LIMIT, TICK_MS};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Configuration for tick and frame timing
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: f64,
    /// Simulated display refresh interval for the headless runner.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: f64,
    #[serde(default = "default_total_generations")]
    pub total_generations: u64,
    /// Generations between recorded snapshots (0 = first and last only).
    #[serde(default = "default_record_interval")]
    pub record_interval: u64,
}

// Rule tuning, loaded from life.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RulesConfig {
    #[serde(default = "default_stagnation_limit")]
    pub stagnation_limit: u32,
    #[serde(default = "default_random_density")]
    pub random_density: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

/// Offset geometry of the reserved bottom-left tab, relative to the container.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct TabConfig {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

// Container geometry used by the headless runner in place of a real page
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ViewportConfig {
    #[serde(default = "default_viewport_width")]
    pub width: f64,
    #[serde(default = "default_viewport_height")]
    pub height: f64,
    #[serde(default = "default_device_pixel_ratio")]
    pub device_pixel_ratio: f64,
    #[serde(default)]
    pub tab: Option<TabConfig>,
    /// Glyph boxes (container-relative) the board must keep clear of.
    #[serde(default)]
    pub avoid: Vec<PixelRect>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PaletteConfig {
    #[serde(default = "default_palette_source")]
    pub source: String,
    #[serde(default = "default_colour_text")]
    pub default_colour: String,
    #[serde(default = "default_palette_slots")]
    pub slots: usize,
}

// Configuration for output settings, loaded from life.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_base_filename")]
    pub base_filename: String,
    pub format: Option<String>, // Output format: "json", "bincode", "messagepack"
    #[serde(default = "default_true")]
    pub save_snapshots: bool,
    #[serde(default)]
    pub save_final_cells: bool,
}

// Main configuration structure, loaded from life.toml.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct LifeConfig {
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub palette: PaletteConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl LifeConfig {
    /// Loads the configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        let config = Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))?;
        Ok(config)
    }

    /// Parses and validates a configuration held in memory.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: LifeConfig = toml::from_str(text)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.timing.tick_ms > 0.0) {
            anyhow::bail!("tick_ms must be positive.");
        }
        if !(self.timing.frame_interval_ms > 0.0) {
            anyhow::bail!("frame_interval_ms must be positive.");
        }
        if self.rules.stagnation_limit == 0 {
            anyhow::bail!("stagnation_limit must be greater than 0.");
        }
        if !(0.0..=1.0).contains(&self.rules.random_density) {
            anyhow::bail!("random_density must lie in [0, 1].");
        }
        if !(self.viewport.width > 0.0) || !(self.viewport.height > 0.0) {
            anyhow::bail!("viewport width and height must be positive.");
        }
        if !(self.viewport.device_pixel_ratio > 0.0) {
            anyhow::bail!("device_pixel_ratio must be positive.");
        }
        if Colour::parse(&self.palette.default_colour).is_none() {
            anyhow::bail!("palette.default_colour '{}' is not a colour.", self.palette.default_colour);
        }
        Ok(())
    }

    /// The parsed default colour (validated on load).
    pub fn default_colour(&self) -> Colour {
        Colour::parse(&self.palette.default_colour).unwrap_or_default()
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            tick_ms: default_tick_ms(),
            frame_interval_ms: default_frame_interval_ms(),
            total_generations: default_total_generations(),
            record_interval: default_record_interval(),
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            stagnation_limit: default_stagnation_limit(),
            random_density: default_random_density(),
            seed: default_seed(),
        }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        ViewportConfig {
            width: default_viewport_width(),
            height: default_viewport_height(),
            device_pixel_ratio: default_device_pixel_ratio(),
            tab: None,
            avoid: Vec::new(),
        }
    }
}

impl Default for PaletteConfig {
    fn default() -> Self {
        PaletteConfig {
            source: default_palette_source(),
            default_colour: default_colour_text(),
            slots: default_palette_slots(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            base_filename: default_base_filename(),
            format: None,
            save_snapshots: true,
            save_final_cells: false,
        }
    }
}

// Default functions for serde
fn default_tick_ms() -> f64 {
    TICK_MS
}

fn default_frame_interval_ms() -> f64 {
    1000.0 / 60.0
}

fn default_total_generations() -> u64 {
    500
}

fn default_record_interval() -> u64 {
    10
}

fn default_stagnation_limit() -> u32 {
    STAGNATION_LIMIT
}

fn default_random_density() -> f64 {
    RANDOM_DENSITY
}

fn default_seed() -> u64 {
    42
}

fn default_viewport_width() -> f64 {
    1280.0
}

fn default_viewport_height() -> f64 {
    720.0
}

fn default_device_pixel_ratio() -> f64 {
    1.0
}

fn default_palette_source() -> String {
    "content.json".to_string()
}

fn default_colour_text() -> String {
    "#000".to_string()
}

fn default_palette_slots() -> usize {
    DEFAULT_PALETTE_SLOTS
}

fn default_base_filename() -> String {
    "life_run".to_string()
}

fn default_true() -> bool {
    true
}
