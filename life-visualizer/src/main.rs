use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, Rgba, RgbaImage};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use life_common::{
    read_snapshots, Colour, DeadZone, HighlightPalette, Snapshot, SnapshotFormat, CELL_SIZE, DEFAULT_PALETTE_SLOTS,
};
use life_engine::render::Surface;
use life_engine::{Grid, Layout, Renderer};
use log::{debug, info, warn, LevelFilter};
use palette::{LinSrgb, Mix, Srgb};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Command-line arguments for the visualizer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input snapshot file (.json, .bin or .msgpack)
    #[arg(short, long)]
    input: PathBuf,

    /// Output: an animated .gif, or a directory that receives one PNG per snapshot
    #[arg(short, long, default_value = "life.gif")]
    output: PathBuf,

    /// Output pixels per logical pixel
    #[arg(long, default_value_t = 2)]
    scale: u32,

    /// Palette document with a `cases` array of `{ "colour": ... }` entries
    #[arg(long)]
    content: Option<PathBuf>,

    /// Colour for live cells that are not highlighted
    #[arg(long, default_value = "#000")]
    colour: String,

    /// Background colour (hex or CSS name)
    #[arg(long, default_value = "white")]
    background: String,

    /// Shade dead zones slightly towards the cell colour
    #[arg(long)]
    show_zones: bool,

    /// Delay between GIF frames in milliseconds
    #[arg(long, default_value_t = 80)]
    frame_ms: u32,
}

/// How every frame is painted.
#[derive(Debug, Clone)]
struct FrameStyle {
    scale: u32,
    background: Colour,
    /// Fill for dead-zone cells, if they are shown.
    zone_colour: Option<Colour>,
}

/// A [`Surface`] over an RGBA buffer. Clearing repaints the background and
/// the dead-zone underlay.
struct ImageSurface {
    image: RgbaImage,
    scale: f64,
    background: Rgba<u8>,
    underlay: Vec<(f64, f64, f64, f64)>,
    underlay_colour: Rgba<u8>,
}

impl ImageSurface {
    fn new(width: u32, height: u32, scale: u32, background: Colour) -> Self {
        let background = Rgba(background.to_rgba());
        ImageSurface {
            image: RgbaImage::from_pixel(width.max(1), height.max(1), background),
            scale: scale as f64,
            background,
            underlay: Vec::new(),
            underlay_colour: background,
        }
    }

    fn fill_pixels(&mut self, x: f64, y: f64, width: f64, height: f64, pixel: Rgba<u8>) {
        let (w, h) = (self.image.width() as f64, self.image.height() as f64);
        let x0 = (x * self.scale).round().clamp(0.0, w) as u32;
        let y0 = (y * self.scale).round().clamp(0.0, h) as u32;
        let x1 = ((x + width) * self.scale).round().clamp(0.0, w) as u32;
        let y1 = ((y + height) * self.scale).round().clamp(0.0, h) as u32;
        for py in y0..y1 {
            for px in x0..x1 {
                self.image.put_pixel(px, py, pixel);
            }
        }
    }

    fn into_image(self) -> RgbaImage {
        self.image
    }
}

impl Surface for ImageSurface {
    fn clear(&mut self, width: f64, height: f64) {
        self.fill_pixels(0.0, 0.0, width, height, self.background);
        let underlay = std::mem::take(&mut self.underlay);
        for &(x, y, w, h) in &underlay {
            self.fill_pixels(x, y, w, h, self.underlay_colour);
        }
        self.underlay = underlay;
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, colour: Colour) {
        self.fill_pixels(x, y, width, height, Rgba(colour.to_rgba()));
    }
}

/// Mixes `a` towards `b` in linear light.
fn blend(a: Colour, b: Colour, factor: f32) -> Colour {
    let a: LinSrgb = Srgb::new(a.red, a.green, a.blue).into_format::<f32>().into_linear();
    let b: LinSrgb = Srgb::new(b.red, b.green, b.blue).into_format::<f32>().into_linear();
    let mixed: Srgb<f32> = Srgb::from_linear(a.mix(b, factor));
    Colour::from(mixed.into_format::<u8>())
}

/// Logical-pixel rectangles of the dead-zone cells, clipped to the board.
fn zone_rects(layout: &Layout) -> Vec<(f64, f64, f64, f64)> {
    layout
        .dead_zones
        .iter()
        .filter_map(|z: &DeadZone| {
            let r1 = z.r1.max(0) as f64;
            let c1 = z.c1.max(0) as f64;
            let r2 = (z.r2.max(0) as usize).min(layout.rows) as f64;
            let c2 = (z.c2.max(0) as usize).min(layout.cols) as f64;
            if r2 <= r1 || c2 <= c1 {
                return None;
            }
            Some((
                layout.offset_x + c1 * CELL_SIZE,
                layout.offset_y + r1 * CELL_SIZE,
                (c2 - c1) * CELL_SIZE,
                (r2 - r1) * CELL_SIZE,
            ))
        })
        .collect()
}

fn layout_of(snapshot: &Snapshot) -> Layout {
    Layout {
        rows: snapshot.rows as usize,
        cols: snapshot.cols as usize,
        offset_x: snapshot.offset_x,
        offset_y: snapshot.offset_y,
        logical_width: snapshot.logical_width,
        logical_height: snapshot.logical_height,
        dead_zones: snapshot.dead_zones.clone(),
        ..Layout::default()
    }
}

/// Draws one snapshot with the shared board renderer.
fn render_snapshot(snapshot: &Snapshot, renderer: &Renderer, style: &FrameStyle) -> Result<RgbaImage> {
    let grid = Grid::from_ages(snapshot.rows as usize, snapshot.cols as usize, snapshot.ages.clone())
        .with_context(|| format!("Snapshot at generation {} has {} ages for a {}x{} board",
            snapshot.generation, snapshot.ages.len(), snapshot.cols, snapshot.rows))?;
    let layout = layout_of(snapshot);

    let width = (layout.logical_width * style.scale as f64).round() as u32;
    let height = (layout.logical_height * style.scale as f64).round() as u32;
    let mut surface = ImageSurface::new(width, height, style.scale, style.background);
    if let Some(colour) = style.zone_colour {
        surface.underlay = zone_rects(&layout);
        surface.underlay_colour = Rgba(colour.to_rgba());
    }
    renderer.draw(&grid, &layout, &mut surface);
    Ok(surface.into_image())
}

fn write_gif(path: &Path, frames: Vec<RgbaImage>, frame_ms: u32) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create '{}'", path.display()))?;
    let mut encoder = GifEncoder::new(BufWriter::new(file));
    encoder.set_repeat(Repeat::Infinite)?;
    let delay = Delay::from_numer_denom_ms(frame_ms, 1);
    encoder
        .encode_frames(frames.into_iter().map(|image| Frame::from_parts(image, 0, 0, delay)))
        .context("Failed to encode GIF")?;
    Ok(())
}

fn write_pngs(dir: &Path, frames: &[RgbaImage], snapshots: &[Snapshot]) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create '{}'", dir.display()))?;
    frames.par_iter().zip(snapshots.par_iter()).try_for_each(|(image, snapshot)| {
        let path = dir.join(format!("gen_{:06}.png", snapshot.generation));
        image.save(&path).with_context(|| format!("Failed to save '{}'", path.display()))
    })
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    run_with_args(args)
}

fn run_with_args(args: Args) -> Result<()> {
    // Initialize logger
    Builder::from_default_env().filter(None, LevelFilter::Info).init();

    info!("Starting Life Visualizer...");
    info!("Input file: {}", args.input.display());

    let background = Colour::parse(&args.background).unwrap_or_else(|| {
        warn!("Colour '{}' not recognized, using white.", args.background);
        Colour::WHITE
    });
    let default_colour = Colour::parse(&args.colour).unwrap_or_else(|| {
        warn!("Colour '{}' not recognized, using black.", args.colour);
        Colour::BLACK
    });
    let palette = match &args.content {
        Some(path) => HighlightPalette::load(path, default_colour, DEFAULT_PALETTE_SLOTS),
        None => HighlightPalette::fallback(default_colour, DEFAULT_PALETTE_SLOTS),
    };
    info!("Using {} highlight colours, default {}", palette.len(), palette.default_colour());

    let style = FrameStyle {
        scale: args.scale.max(1),
        background,
        zone_colour: args.show_zones.then(|| blend(background, default_colour, 0.12)),
    };
    debug!("Frame style: {:?}", style);

    // --- Read Snapshots ---
    let format = SnapshotFormat::from_path(&args.input);
    let snapshots = read_snapshots(&args.input, format)?;
    info!("Found {} snapshots in the file", snapshots.len());
    if snapshots.is_empty() {
        warn!("Input file contains no snapshots. Exiting.");
        return Ok(());
    }

    // --- Render Frames ---
    let progress_bar = ProgressBar::new(snapshots.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames ({percent}%) [{eta}]")?
            .progress_chars("#>-"),
    );

    let start_time = Instant::now();
    let renderer = Renderer::new(palette);
    let frames: Vec<RgbaImage> = snapshots
        .par_iter()
        .progress_with(progress_bar.clone())
        .map(|snapshot| render_snapshot(snapshot, &renderer, &style))
        .collect::<Result<_>>()?;
    progress_bar.finish_with_message(format!("Rendered {} frames", frames.len()));
    info!("Rendered {} frames in {:.2} s", frames.len(), start_time.elapsed().as_secs_f64());

    // --- Write Output ---
    let is_gif = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gif"));
    if is_gif {
        write_gif(&args.output, frames, args.frame_ms)?;
    } else {
        write_pngs(&args.output, &frames, &snapshots)?;
    }
    info!("Output saved to: {}", args.output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Colour = Colour::new(255, 0, 0);

    fn snapshot(ages: Vec<u16>, dead_zones: Vec<DeadZone>) -> Snapshot {
        Snapshot {
            generation: 3,
            rows: 2,
            cols: 2,
            offset_x: 0.0,
            offset_y: 0.0,
            logical_width: 16.0,
            logical_height: 16.0,
            live_cells: ages.iter().filter(|&&a| a > 0).count() as u32,
            ages,
            dead_zones,
        }
    }

    fn style(zone_colour: Option<Colour>) -> FrameStyle {
        FrameStyle { scale: 1, background: Colour::WHITE, zone_colour }
    }

    #[test]
    fn cells_are_drawn_inset_with_highlights() {
        let renderer = Renderer::new(HighlightPalette::new(vec![RED], Colour::BLACK));
        let image = render_snapshot(&snapshot(vec![2, 0, 0, 5], Vec::new()), &renderer, &style(None)).unwrap();
        assert_eq!(image.dimensions(), (16, 16));
        // Gap pixel, then the youngest cell in red, then the older one in the default colour
        assert_eq!(image.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
        assert_eq!(image.get_pixel(1, 1), &Rgba([255, 0, 0, 255]));
        assert_eq!(image.get_pixel(6, 6), &Rgba([255, 0, 0, 255]));
        assert_eq!(image.get_pixel(7, 7), &Rgba([255, 255, 255, 255]));
        assert_eq!(image.get_pixel(9, 9), &Rgba([0, 0, 0, 255]));
        assert_eq!(image.get_pixel(12, 3), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn scale_multiplies_output_size() {
        let renderer = Renderer::default();
        let s = FrameStyle { scale: 3, ..style(None) };
        let image = render_snapshot(&snapshot(vec![1, 0, 0, 0], Vec::new()), &renderer, &s).unwrap();
        assert_eq!(image.dimensions(), (48, 48));
        assert_eq!(image.get_pixel(3, 3), &Rgba([0, 0, 0, 255]));
        assert_eq!(image.get_pixel(2, 2), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn zones_are_shaded_when_requested() {
        let renderer = Renderer::default();
        let grey = Colour::new(200, 200, 200);
        let zones = vec![DeadZone::new(1, 5, 0, 1)];
        let image = render_snapshot(&snapshot(vec![0; 4], zones), &renderer, &style(Some(grey))).unwrap();
        assert_eq!(image.get_pixel(0, 8), &Rgba([200, 200, 200, 255]));
        assert_eq!(image.get_pixel(7, 15), &Rgba([200, 200, 200, 255]));
        assert_eq!(image.get_pixel(8, 8), &Rgba([255, 255, 255, 255]));
        assert_eq!(image.get_pixel(0, 7), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn mismatched_ages_are_rejected() {
        let renderer = Renderer::default();
        assert!(render_snapshot(&snapshot(vec![1, 1, 1], Vec::new()), &renderer, &style(None)).is_err());
    }

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(Colour::WHITE, Colour::BLACK, 0.0), Colour::WHITE);
        assert_eq!(blend(Colour::WHITE, Colour::BLACK, 1.0), Colour::BLACK);
        let mid = blend(Colour::WHITE, Colour::BLACK, 0.5);
        assert!(mid.red < 255 && mid.red > 0);
    }

    #[test]
    fn gif_has_one_frame_per_snapshot() {
        let renderer = Renderer::default();
        let frames: Vec<RgbaImage> = [vec![1, 0, 0, 0], vec![0, 1, 0, 0]]
            .into_iter()
            .map(|ages| render_snapshot(&snapshot(ages, Vec::new()), &renderer, &style(None)).unwrap())
            .collect();
        let path = std::env::temp_dir().join(format!("life_visualizer_test_{}.gif", std::process::id()));
        write_gif(&path, frames, 80).unwrap();

        let decoder = image::codecs::gif::GifDecoder::new(std::io::BufReader::new(File::open(&path).unwrap())).unwrap();
        use image::AnimationDecoder;
        assert_eq!(decoder.into_frames().count(), 2);
        let _ = fs::remove_file(&path);
    }
}
