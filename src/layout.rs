//! Grid geometry: board size and centering for a container, plus the dead
//! zones derived from text lines and the reserved tab.

use life_common::{DeadZone, PixelRect, TabConfig, ViewportConfig, CELL_SIZE, LINE_TOLERANCE_PX};
use log::debug;

/// Size and on-screen origin of the element the board covers.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ContainerMetrics {
    /// Logical (CSS pixel) width of the drawing area.
    pub width: f64,
    /// Logical height of the drawing area.
    pub height: f64,
    pub device_pixel_ratio: f64,
    /// Client-space position of the container's top-left corner. Glyph boxes
    /// arrive in client space and are made relative to this.
    pub origin_left: f64,
    pub origin_top: f64,
}

/// Offset geometry of the reserved bottom-left tab, relative to the container.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TabMetrics {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl TabMetrics {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

impl From<TabConfig> for TabMetrics {
    fn from(tab: TabConfig) -> Self {
        TabMetrics { left: tab.left, top: tab.top, width: tab.width, height: tab.height }
    }
}

/// Host capability that reports the current page geometry.
///
/// The browser host reads it from the DOM; tests and the headless runner use
/// [`FixedLayoutProvider`].
pub trait LayoutProvider {
    /// Container geometry, or `None` when the container cannot be found.
    fn container(&self) -> Option<ContainerMetrics>;
    /// Reserved tab geometry, if the page has one.
    fn reserved_tab(&self) -> Option<TabMetrics>;
    /// Bounding boxes of the individual glyphs of the avoided text, in client space and document order.
    fn glyph_boxes(&self) -> Vec<PixelRect>;
}

/// A layout provider that returns fixed rectangles.
#[derive(Debug, Clone)]
pub struct FixedLayoutProvider {
    pub container: ContainerMetrics,
    pub tab: Option<TabMetrics>,
    pub glyphs: Vec<PixelRect>,
}

impl FixedLayoutProvider {
    /// A container at the client origin with no tab and no text.
    pub fn new(width: f64, height: f64) -> Self {
        FixedLayoutProvider {
            container: ContainerMetrics {
                width,
                height,
                device_pixel_ratio: 1.0,
                origin_left: 0.0,
                origin_top: 0.0,
            },
            tab: None,
            glyphs: Vec::new(),
        }
    }

    /// Builds the provider from the runner's `[viewport]` section.
    /// The canvas ends at the tab's bottom edge, like the browser host.
    pub fn from_viewport(viewport: &ViewportConfig) -> Self {
        let tab = viewport.tab.map(TabMetrics::from);
        let height = tab.map_or(viewport.height, |t| t.bottom());
        FixedLayoutProvider {
            container: ContainerMetrics {
                width: viewport.width,
                height,
                device_pixel_ratio: viewport.device_pixel_ratio,
                origin_left: 0.0,
                origin_top: 0.0,
            },
            tab,
            glyphs: viewport.avoid.clone(),
        }
    }
}

impl LayoutProvider for FixedLayoutProvider {
    fn container(&self) -> Option<ContainerMetrics> {
        Some(self.container)
    }

    fn reserved_tab(&self) -> Option<TabMetrics> {
        self.tab
    }

    fn glyph_boxes(&self) -> Vec<PixelRect> {
        self.glyphs.clone()
    }
}

/// Resolved board geometry for one container size.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub rows: usize,
    pub cols: usize,
    /// Centering offset in logical pixels.
    pub offset_x: f64,
    pub offset_y: f64,
    pub logical_width: f64,
    pub logical_height: f64,
    pub device_pixel_ratio: f64,
    pub dead_zones: Vec<DeadZone>,
    /// L-shaped visible region (logical pixels) when a tab is present.
    pub clip_polygon: Option<Vec<(f64, f64)>>,
}

impl Default for Layout {
    fn default() -> Self {
        Layout {
            rows: 0,
            cols: 0,
            offset_x: 0.0,
            offset_y: 0.0,
            logical_width: 0.0,
            logical_height: 0.0,
            device_pixel_ratio: 1.0,
            dead_zones: Vec::new(),
            clip_polygon: None,
        }
    }
}

impl Layout {
    /// Reads the provider and resolves a layout, or `None` without a container.
    pub fn resolve<P: LayoutProvider + ?Sized>(provider: &P) -> Option<Layout> {
        let container = provider.container()?;
        let tab = provider.reserved_tab();
        let glyphs = provider.glyph_boxes();
        Some(Self::from_metrics(container, tab, &glyphs))
    }

    pub fn from_metrics(container: ContainerMetrics, tab: Option<TabMetrics>, glyphs: &[PixelRect]) -> Layout {
        let width = container.width.max(0.0);
        let height = container.height.max(0.0);
        let (cols, offset_x) = fit_axis(width);
        let (rows, offset_y) = fit_axis(height);

        let mut dead_zones: Vec<DeadZone> = group_lines(glyphs)
            .iter()
            .map(|line| {
                let local = line.relative_to(container.origin_left, container.origin_top);
                line_zone(&local, offset_x, offset_y)
            })
            .collect();

        let clip_polygon = tab.map(|t| {
            dead_zones.push(tab_zone(&t));
            l_shape(width, &t)
        });

        debug!(
            "Layout resolved: {}x{} cells, offset ({}, {}), {} dead zones",
            cols, rows, offset_x, offset_y, dead_zones.len()
        );

        Layout {
            rows,
            cols,
            offset_x,
            offset_y,
            logical_width: width,
            logical_height: height,
            device_pixel_ratio: if container.device_pixel_ratio > 0.0 { container.device_pixel_ratio } else { 1.0 },
            dead_zones,
            clip_polygon,
        }
    }

    /// Backing-store size of the canvas in device pixels.
    pub fn canvas_pixel_size(&self) -> (u32, u32) {
        (
            (self.logical_width * self.device_pixel_ratio).round() as u32,
            (self.logical_height * self.device_pixel_ratio).round() as u32,
        )
    }

    /// CSS `clip-path` value for the L-shaped region, or an empty string.
    pub fn clip_path_css(&self) -> String {
        match &self.clip_polygon {
            Some(points) => {
                let parts: Vec<String> = points.iter().map(|(x, y)| format!("{}px {}px", x, y)).collect();
                format!("polygon({})", parts.join(", "))
            }
            None => String::new(),
        }
    }

    pub fn is_dead(&self, row: i32, col: i32) -> bool {
        life_common::in_any_zone(&self.dead_zones, row, col)
    }
}

/// Whole cells that fit along one axis, and the centering offset for the leftover pixels.
fn fit_axis(extent: f64) -> (usize, f64) {
    let count = (extent / CELL_SIZE).floor();
    let offset = ((extent - count * CELL_SIZE) / 2.0).floor();
    (count as usize, offset)
}

/// Merges glyph boxes into one rectangle per rendered line.
///
/// A glyph stays on the current line while its top is within
/// `LINE_TOLERANCE_PX` of the top of the line's first glyph.
pub fn group_lines(glyphs: &[PixelRect]) -> Vec<PixelRect> {
    let mut lines = Vec::new();
    let mut current: Option<(f64, PixelRect)> = None; // (line top, running bounds)

    for glyph in glyphs.iter().filter(|g| !g.is_degenerate()) {
        match current.as_mut() {
            Some((top, rect)) if (glyph.top - *top).abs() <= LINE_TOLERANCE_PX => {
                rect.left = rect.left.min(glyph.left);
                rect.right = rect.right.max(glyph.right);
                rect.bottom = rect.bottom.max(glyph.bottom);
            }
            _ => {
                if let Some((_, done)) = current.take() {
                    lines.push(done);
                }
                current = Some((glyph.top, *glyph));
            }
        }
    }
    if let Some((_, done)) = current {
        lines.push(done);
    }
    lines
}

/// Cell bounds covering a container-relative line rectangle.
pub fn line_zone(line: &PixelRect, offset_x: f64, offset_y: f64) -> DeadZone {
    DeadZone {
        r1: ((line.top - offset_y) / CELL_SIZE).floor() as i32,
        r2: ((line.bottom - offset_y) / CELL_SIZE).ceil() as i32,
        c1: ((line.left - offset_x) / CELL_SIZE).floor() as i32,
        c2: ((line.right - offset_x) / CELL_SIZE).ceil() as i32,
    }
}

/// Cell bounds covering the reserved tab: from row 0 down to its bottom
/// edge, and from column 0 to its right edge.
pub fn tab_zone(tab: &TabMetrics) -> DeadZone {
    DeadZone {
        r1: 0,
        r2: (tab.bottom() / CELL_SIZE).ceil() as i32,
        c1: 0,
        c2: (tab.right() / CELL_SIZE).ceil() as i32,
    }
}

/// Full width above the tab, only the part right of the tab alongside it.
fn l_shape(width: f64, tab: &TabMetrics) -> Vec<(f64, f64)> {
    vec![
        (0.0, 0.0),
        (width, 0.0),
        (width, tab.bottom()),
        (tab.right(), tab.bottom()),
        (tab.right(), tab.top),
        (0.0, tab.top),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(width: f64, height: f64) -> ContainerMetrics {
        ContainerMetrics { width, height, device_pixel_ratio: 2.0, origin_left: 0.0, origin_top: 0.0 }
    }

    #[test]
    fn grid_dimensions_floor_and_center() {
        let layout = Layout::from_metrics(container(805.0, 603.0), None, &[]);
        assert_eq!(layout.cols, 100);
        assert_eq!(layout.rows, 75);
        assert_eq!(layout.offset_x, 2.0); // floor(5 / 2)
        assert_eq!(layout.offset_y, 1.0); // floor(3 / 2)
        assert_eq!(layout.canvas_pixel_size(), (1610, 1206));
        assert!(layout.dead_zones.is_empty());
        assert_eq!(layout.clip_path_css(), "");
    }

    #[test]
    fn tiny_container_has_no_cells() {
        let layout = Layout::from_metrics(container(7.0, 7.0), None, &[]);
        assert_eq!((layout.rows, layout.cols), (0, 0));
        assert_eq!(layout.offset_x, 3.0);
    }

    #[test]
    fn glyphs_group_into_lines_within_tolerance() {
        let glyphs = [
            PixelRect::new(10.0, 100.0, 18.0, 116.0),
            PixelRect::new(18.0, 101.5, 26.0, 118.0), // same line, slightly lower
            PixelRect::new(30.0, 100.0, 30.0, 100.0), // collapsed whitespace, skipped
            PixelRect::new(26.0, 98.0, 34.0, 115.0),  // 2px above first top: same line
            PixelRect::new(10.0, 120.0, 18.0, 136.0), // new line
        ];
        let lines = group_lines(&glyphs);
        assert_eq!(
            lines,
            vec![PixelRect::new(10.0, 100.0, 34.0, 118.0), PixelRect::new(10.0, 120.0, 18.0, 136.0)]
        );
    }

    #[test]
    fn line_zone_floors_start_and_ceils_end() {
        let zone = line_zone(&PixelRect::new(17.0, 33.0, 40.0, 49.0), 1.0, 1.0);
        assert_eq!(zone, DeadZone::new(4, 6, 2, 5));
    }

    #[test]
    fn line_zones_are_relative_to_container_origin() {
        let metrics = ContainerMetrics {
            width: 160.0,
            height: 160.0,
            device_pixel_ratio: 1.0,
            origin_left: 100.0,
            origin_top: 200.0,
        };
        let glyphs = [PixelRect::new(116.0, 216.0, 124.0, 224.0)];
        let layout = Layout::from_metrics(metrics, None, &glyphs);
        assert_eq!(layout.dead_zones, vec![DeadZone::new(2, 3, 2, 3)]);
    }

    #[test]
    fn tab_adds_zone_and_l_shaped_clip() {
        let tab = TabMetrics { left: 0.0, top: 80.0, width: 36.0, height: 40.0 };
        let layout = Layout::from_metrics(container(160.0, 120.0), Some(tab), &[]);
        assert_eq!(layout.dead_zones, vec![DeadZone::new(0, 15, 0, 5)]);
        assert!(layout.is_dead(12, 4));
        assert!(layout.is_dead(0, 0));
        assert!(layout.is_dead(9, 4));
        assert!(!layout.is_dead(12, 5));
        assert!(!layout.is_dead(0, 5));
        assert_eq!(
            layout.clip_path_css(),
            "polygon(0px 0px, 160px 0px, 160px 120px, 36px 120px, 36px 80px, 0px 80px)"
        );
    }

    #[test]
    fn tab_zone_spans_from_row_zero_to_tab_bottom() {
        let tab = TabMetrics { left: 0.0, top: 83.0, width: 30.0, height: 41.0 };
        assert_eq!(tab_zone(&tab), DeadZone::new(0, 16, 0, 4));
    }

    #[test]
    fn fixed_provider_from_viewport_ends_at_tab_bottom() {
        let viewport = ViewportConfig {
            width: 320.0,
            height: 900.0,
            device_pixel_ratio: 1.5,
            tab: Some(TabConfig { left: 0.0, top: 200.0, width: 64.0, height: 40.0 }),
            avoid: vec![PixelRect::new(8.0, 8.0, 64.0, 24.0)],
        };
        let layout = Layout::resolve(&FixedLayoutProvider::from_viewport(&viewport)).unwrap();
        assert_eq!(layout.logical_height, 240.0);
        assert_eq!(layout.rows, 30);
        assert_eq!(layout.cols, 40);
        assert_eq!(layout.dead_zones.len(), 2);
        assert_eq!(layout.dead_zones[0], DeadZone::new(1, 3, 1, 8));
    }
}
