use crate::grid::{Age, Grid};
use crate::layout::Layout;
use life_common::{Colour, HighlightPalette, CELL_GAP, CELL_SIZE};
use std::collections::HashMap;

/// A 2D drawing target in logical pixels (canvas context, image buffer, ...).
pub trait Surface {
    /// Clears the rectangle `(0, 0, width, height)`.
    fn clear(&mut self, width: f64, height: f64);
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, colour: Colour);
}

/// One of the youngest live cells picked for a highlight colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    pub index: usize,
    pub age: Age,
}

/// The `count` live cells with the smallest ages, youngest first.
/// Equal ages keep row-major discovery order.
pub fn youngest_cells(grid: &Grid, count: usize) -> Vec<Highlight> {
    let mut youngest: Vec<Highlight> = Vec::with_capacity(count + 1);
    if count == 0 {
        return youngest;
    }
    for (index, &age) in grid.cells().iter().enumerate() {
        if age == 0 {
            continue;
        }
        if youngest.len() == count && age >= youngest[count - 1].age {
            continue;
        }
        // After every earlier cell of the same age
        let at = youngest.partition_point(|h| h.age <= age);
        youngest.insert(at, Highlight { index, age });
        youngest.truncate(count);
    }
    youngest
}

/// Pixel rectangle `(x, y, w, h)` of a live cell, inset by the gap on every side.
pub fn cell_rect(layout: &Layout, row: usize, col: usize) -> (f64, f64, f64, f64) {
    (
        layout.offset_x + col as f64 * CELL_SIZE + CELL_GAP,
        layout.offset_y + row as f64 * CELL_SIZE + CELL_GAP,
        CELL_SIZE - CELL_GAP * 2.0,
        CELL_SIZE - CELL_GAP * 2.0,
    )
}

/// Draws the board from scratch on every call.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    palette: HighlightPalette,
}

impl Renderer {
    pub fn new(palette: HighlightPalette) -> Self {
        Renderer { palette }
    }

    pub fn palette(&self) -> &HighlightPalette {
        &self.palette
    }

    pub fn set_palette(&mut self, palette: HighlightPalette) {
        self.palette = palette;
    }

    /// Highlight colour per cell index for this frame: `palette[i]` goes to the i-th youngest.
    pub fn assign(&self, grid: &Grid) -> HashMap<usize, Colour> {
        youngest_cells(grid, self.palette.len())
            .into_iter()
            .zip(self.palette.colours().iter().copied())
            .map(|(h, colour)| (h.index, colour))
            .collect()
    }

    pub fn draw<S: Surface + ?Sized>(&self, grid: &Grid, layout: &Layout, surface: &mut S) {
        surface.clear(layout.logical_width, layout.logical_height);

        let highlights = self.assign(grid);
        let fallback = self.palette.default_colour();
        for (row, col, _) in grid.live_cells() {
            let colour = highlights.get(&(row * grid.cols() + col)).copied().unwrap_or(fallback);
            let (x, y, w, h) = cell_rect(layout, row, col);
            surface.fill_rect(x, y, w, h, colour);
        }
    }
}

/// A drawing operation captured by [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear { width: f64, height: f64 },
    Fill { x: f64, y: f64, width: f64, height: f64, colour: Colour },
}

/// Surface that records operations instead of drawing; used headlessly.
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    pub ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill operations since the most recent clear.
    pub fn last_frame(&self) -> &[DrawOp] {
        let start = self
            .ops
            .iter()
            .rposition(|op| matches!(op, DrawOp::Clear { .. }))
            .map_or(0, |i| i + 1);
        &self.ops[start..]
    }

    pub fn frames(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, DrawOp::Clear { .. })).count()
    }
}

impl Surface for RecordingSurface {
    fn clear(&mut self, width: f64, height: f64) {
        self.ops.push(DrawOp::Clear { width, height });
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, colour: Colour) {
        self.ops.push(DrawOp::Fill { x, y, width, height, colour });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Colour = Colour::new(255, 0, 0);
    const GREEN: Colour = Colour::new(0, 255, 0);
    const BLUE: Colour = Colour::new(0, 0, 255);

    fn grid_from(rows: usize, cols: usize, ages: &[Age]) -> Grid {
        Grid::from_ages(rows, cols, ages.to_vec()).unwrap()
    }

    #[test]
    fn picks_smallest_ages_in_increasing_order() {
        let g = grid_from(2, 4, &[5, 0, 2, 9, 1, 7, 0, 3]);
        let picked = youngest_cells(&g, 3);
        assert_eq!(
            picked,
            vec![
                Highlight { index: 4, age: 1 },
                Highlight { index: 2, age: 2 },
                Highlight { index: 7, age: 3 },
            ]
        );
    }

    #[test]
    fn ties_keep_discovery_order() {
        let g = grid_from(1, 5, &[2, 1, 2, 1, 1]);
        let picked: Vec<usize> = youngest_cells(&g, 4).iter().map(|h| h.index).collect();
        assert_eq!(picked, vec![1, 3, 4, 0]);
    }

    #[test]
    fn fewer_live_cells_than_slots() {
        let g = grid_from(1, 4, &[0, 3, 0, 0]);
        assert_eq!(youngest_cells(&g, 4).len(), 1);
        assert!(youngest_cells(&g, 0).is_empty());
    }

    #[test]
    fn exactly_k_highlighted_rest_default() {
        let palette = HighlightPalette::new(vec![RED, GREEN, BLUE], Colour::BLACK);
        let renderer = Renderer::new(palette);
        let g = grid_from(2, 3, &[4, 1, 6, 2, 0, 3]);
        let layout = Layout { rows: 2, cols: 3, logical_width: 24.0, logical_height: 16.0, ..Layout::default() };

        let mut surface = RecordingSurface::new();
        renderer.draw(&g, &layout, &mut surface);

        assert_eq!(surface.ops[0], DrawOp::Clear { width: 24.0, height: 16.0 });
        let colours: Vec<Colour> = surface
            .last_frame()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Fill { colour, .. } => Some(*colour),
                _ => None,
            })
            .collect();
        // Row-major live cells: ages 4, 1, 6, 2, 3
        assert_eq!(colours, vec![Colour::BLACK, RED, Colour::BLACK, GREEN, BLUE]);
    }

    #[test]
    fn cells_are_inset_by_the_gap() {
        let layout = Layout { offset_x: 3.0, offset_y: 2.0, ..Layout::default() };
        assert_eq!(cell_rect(&layout, 1, 2), (3.0 + 16.0 + 1.0, 2.0 + 8.0 + 1.0, 6.0, 6.0));
    }

    #[test]
    fn every_draw_starts_with_a_full_clear() {
        let renderer = Renderer::default();
        let layout = Layout { rows: 1, cols: 1, logical_width: 8.0, logical_height: 8.0, ..Layout::default() };
        let g = grid_from(1, 1, &[1]);
        let mut surface = RecordingSurface::new();
        renderer.draw(&g, &layout, &mut surface);
        renderer.draw(&g, &layout, &mut surface);
        assert_eq!(surface.frames(), 2);
        assert_eq!(surface.last_frame().len(), 1);
    }
}
