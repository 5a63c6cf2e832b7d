//! Pointer painting and tap-to-spawn gliders.

use crate::grid::Grid;
use crate::layout::Layout;
use life_common::{in_any_zone, CellCoord, DeadZone, CELL_SIZE};
use log::debug;
use rand::Rng;

/// The four glider orientations as `(dr, dc)` offsets around the tapped cell.
pub const GLIDERS: [[(i32, i32); 5]; 4] = [
    // SE
    [(-1, 0), (0, 1), (1, -1), (1, 0), (1, 1)],
    // SW
    [(-1, 0), (0, -1), (1, -1), (1, 0), (1, 1)],
    // NE
    [(1, 0), (0, 1), (-1, -1), (-1, 0), (-1, 1)],
    // NW
    [(1, 0), (0, -1), (-1, -1), (-1, 0), (-1, 1)],
];

/// CSS selector for page chrome that must keep receiving its own clicks.
pub const INTERACTIVE_SELECTOR: &str =
    "a, button, input, textarea, label, .home, .contact, .contact-tab, .nav-bar, .controls, .gen-counter, .page-work";

/// An element in the event target's ancestor chain.
pub trait ChromeNode: Sized {
    /// True for the board's own canvas, which is never chrome.
    fn is_canvas(&self) -> bool;
    /// True if the element matches [`INTERACTIVE_SELECTOR`].
    fn is_chrome(&self) -> bool;
    /// Parent element; `None` at the top of the walk (the document body).
    fn parent(&self) -> Option<Self>;
}

/// Whether an event on `target` belongs to interactive chrome rather than to the board.
pub fn is_interactive<N: ChromeNode>(target: Option<N>) -> bool {
    let mut node = target;
    while let Some(el) = node {
        if el.is_canvas() {
            return false;
        }
        if el.is_chrome() {
            return true;
        }
        node = el.parent();
    }
    false
}

/// A pointer position in client space together with the canvas's client origin.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerPosition {
    pub client_x: f64,
    pub client_y: f64,
    pub canvas_left: f64,
    pub canvas_top: f64,
}

impl PointerPosition {
    /// The grid cell under the pointer (may lie outside the board).
    pub fn cell(&self, layout: &Layout) -> CellCoord {
        let x = self.client_x - self.canvas_left - layout.offset_x;
        let y = self.client_y - self.canvas_top - layout.offset_y;
        CellCoord {
            row: (y / CELL_SIZE).floor() as i32,
            col: (x / CELL_SIZE).floor() as i32,
        }
    }
}

/// Sets a cell alive (age 1) or dead. Cells outside the board or inside a
/// dead zone are left untouched; returns whether the write happened.
pub fn paint_cell(grid: &mut Grid, zones: &[DeadZone], cell: CellCoord, alive: bool) -> bool {
    if in_any_zone(zones, cell.row, cell.col) {
        return false;
    }
    grid.set_age(cell.row, cell.col, if alive { 1 } else { 0 })
}

/// Stamps glider `variant` (index into [`GLIDERS`]) around `centre`, clipped at edges and zones.
pub fn stamp_glider(grid: &mut Grid, zones: &[DeadZone], centre: CellCoord, variant: usize) {
    for &(dr, dc) in &GLIDERS[variant % GLIDERS.len()] {
        paint_cell(grid, zones, centre.offset(dr, dc), true);
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct DragSession {
    start: CellCoord,
    dragged: bool,
}

/// What a pointer release did to the board.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// No press was active.
    Idle,
    /// The pointer left the pressed cell; the painted trail stays.
    TrailKept,
    /// A tap: the pressed cell was cleared and a glider stamped around it.
    Glider { centre: CellCoord, variant: usize },
}

/// Press / drag / release state machine for painting.
#[derive(Debug, Default, Clone)]
pub struct InputController {
    session: Option<DragSession>,
}

impl InputController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_drawing(&self) -> bool {
        self.session.is_some()
    }

    /// Starts a drag session and paints the pressed cell.
    pub fn press(&mut self, grid: &mut Grid, zones: &[DeadZone], cell: CellCoord) {
        self.session = Some(DragSession { start: cell, dragged: false });
        paint_cell(grid, zones, cell, true);
    }

    /// Paints the cell under the pointer while a session is active.
    pub fn drag_to(&mut self, grid: &mut Grid, zones: &[DeadZone], cell: CellCoord) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if cell != session.start {
            session.dragged = true;
        }
        paint_cell(grid, zones, cell, true);
    }

    /// Ends the session. A tap without drag turns the pressed cell into a random glider.
    pub fn release<R: Rng + ?Sized>(&mut self, grid: &mut Grid, zones: &[DeadZone], rng: &mut R) -> ReleaseOutcome {
        let Some(session) = self.session.take() else {
            return ReleaseOutcome::Idle;
        };
        if session.dragged {
            return ReleaseOutcome::TrailKept;
        }
        let variant = rng.random_range(0..GLIDERS.len());
        paint_cell(grid, zones, session.start, false);
        stamp_glider(grid, zones, session.start, variant);
        debug!("Glider {} stamped at ({}, {})", variant, session.start.row, session.start.col);
        ReleaseOutcome::Glider { centre: session.start, variant }
    }
}
