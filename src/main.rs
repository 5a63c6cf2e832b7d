use anyhow::Result;
use clap::Parser;
use life_common::{write_snapshots, HighlightPalette, LifeConfig, SnapshotFormat};
use life_engine::runner::{run_headless, write_final_cells, CountingSurface, RunOptions};
use life_engine::{Command, ControllerSettings, FixedLayoutProvider, Layout, LifeController, ManualFrameHost};
use log::{debug, error, info, warn};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

/// Runs the board headlessly and records its history
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "life.toml")]
    config: PathBuf,

    /// Overrides timing.total_generations
    #[arg(short, long)]
    generations: Option<u64>,

    /// Overrides rules.seed
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();
    let args = Args::parse();

    info!("Starting Life Engine (headless)...");

    // --- Load Configuration ---
    let mut config = if args.config.exists() {
        LifeConfig::load(&args.config)?
    } else {
        warn!("Config file '{}' not found, using defaults.", args.config.display());
        LifeConfig::default()
    };
    if let Some(generations) = args.generations {
        config.timing.total_generations = generations;
    }
    if let Some(seed) = args.seed {
        config.rules.seed = seed;
    }
    debug!("Configuration: {:#?}", config);

    // --- Board Setup ---
    let palette = HighlightPalette::load(&config.palette.source, config.default_colour(), config.palette.slots);
    info!("Palette: {} highlight colours, default {}", palette.len(), palette.default_colour());

    let provider = FixedLayoutProvider::from_viewport(&config.viewport);
    let Some(layout) = Layout::resolve(&provider) else {
        anyhow::bail!("Viewport produced no layout.");
    };
    let mut controller = LifeController::new(ControllerSettings::from(&config), layout, palette);

    let mut setup_host = ManualFrameHost::new();
    controller.dispatch(Command::Randomize, &mut CountingSurface::default(), &mut setup_host);
    info!("Seeded board with {} live cells.", controller.simulation().grid().live_count());

    // --- Simulation Loop ---
    let options = RunOptions {
        total_generations: config.timing.total_generations,
        record_interval: config.timing.record_interval,
        frame_interval_ms: config.timing.frame_interval_ms,
    };
    let snapshots = run_headless(&mut controller, options)?;

    // --- Save Recorded Data ---
    let base = &config.output.base_filename;
    if config.output.save_snapshots {
        let format = match config.output.format.as_deref() {
            Some(name) => SnapshotFormat::from_name(name).unwrap_or_else(|e| {
                error!("{}. Using JSON instead.", e);
                SnapshotFormat::Json
            }),
            None => SnapshotFormat::Json,
        };
        let path = PathBuf::from(format!("{}_snapshots.{}", base, format.extension()));
        write_snapshots(&path, format, &snapshots)?;
        info!("{} snapshots saved to {}", snapshots.len(), path.display());
    } else {
        info!("Skipping saving snapshots as per config (save_snapshots is false).");
    }

    if config.output.save_final_cells {
        let filename = format!("{}_final_cells.csv", base);
        let file = File::create(&filename)?;
        write_final_cells(BufWriter::new(file), controller.simulation().grid())?;
        info!("Final cells saved to {}", filename);
    }

    info!("Simulation Complete.");
    Ok(())
}
