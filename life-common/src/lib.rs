pub mod colour;
pub mod config;
pub mod content;
pub mod geometry;
pub mod snapshot;

// Re-export key types for easier use by dependent crates
pub use colour::Colour;
pub use config::{LifeConfig, OutputConfig, PaletteConfig, RulesConfig, TabConfig, TimingConfig, ViewportConfig};
pub use content::HighlightPalette;
pub use geometry::{in_any_zone, CellCoord, DeadZone, PixelRect};
pub use snapshot::{read_snapshots, write_snapshots, Snapshot, SnapshotFormat};

/// Side length of one grid cell in logical (CSS) pixels.
pub const CELL_SIZE: f64 = 8.0;
/// Inset applied on every side of a live cell when it is drawn.
pub const CELL_GAP: f64 = 1.0;
/// Milliseconds between generations while the animation is playing.
pub const TICK_MS: f64 = 80.0;
/// Generations between two stagnation samples.
pub const STAGNATION_LIMIT: u32 = 10;
/// Maximum vertical drift (px) for a glyph to stay on the current text line.
pub const LINE_TOLERANCE_PX: f64 = 2.0;
/// Probability that a cell starts alive when the board is randomized.
pub const RANDOM_DENSITY: f64 = 0.25;
/// Colour used for every live cell that is not highlighted.
pub const DEFAULT_COLOUR: Colour = Colour::BLACK;
/// Number of highlight slots used when no palette document is available.
pub const DEFAULT_PALETTE_SLOTS: usize = 4;
