use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in pixel space (edges, not origin + size).
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl PixelRect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        PixelRect { left, top, right, bottom }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// True for the zero-size boxes browsers report for collapsed whitespace.
    pub fn is_degenerate(&self) -> bool {
        self.width() == 0.0 && self.height() == 0.0
    }

    /// Returns the rectangle shifted by `(-dx, -dy)`, i.e. expressed relative to `(dx, dy)`.
    pub fn relative_to(&self, dx: f64, dy: f64) -> Self {
        PixelRect {
            left: self.left - dx,
            top: self.top - dy,
            right: self.right - dx,
            bottom: self.bottom - dy,
        }
    }
}

/// A rectangular no-life region in grid-cell coordinates.
/// Rows `r1..r2` and columns `c1..c2` (start inclusive, end exclusive).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeadZone {
    pub r1: i32,
    pub r2: i32,
    pub c1: i32,
    pub c2: i32,
}

impl DeadZone {
    pub fn new(r1: i32, r2: i32, c1: i32, c2: i32) -> Self {
        DeadZone { r1, r2, c1, c2 }
    }

    #[inline(always)]
    pub fn contains(&self, row: i32, col: i32) -> bool {
        row >= self.r1 && row < self.r2 && col >= self.c1 && col < self.c2
    }
}

/// Checks a cell against every zone in the set.
#[inline]
pub fn in_any_zone(zones: &[DeadZone], row: i32, col: i32) -> bool {
    zones.iter().any(|z| z.contains(row, col))
}

/// A grid position. Signed so that pointer positions left of or above the
/// grid can be represented before they are rejected by bounds checks.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CellCoord {
    pub row: i32,
    pub col: i32,
}

impl CellCoord {
    pub fn new(row: i32, col: i32) -> Self {
        CellCoord { row, col }
    }

    pub fn offset(&self, dr: i32, dc: i32) -> Self {
        CellCoord { row: self.row + dr, col: self.col + dc }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dead_zone_bounds_are_half_open() {
        let zone = DeadZone::new(2, 4, 1, 3);
        assert!(zone.contains(2, 1));
        assert!(zone.contains(3, 2));
        assert!(!zone.contains(4, 2));
        assert!(!zone.contains(3, 3));
        assert!(!zone.contains(1, 1));
    }

    #[test]
    fn any_zone_checks_all_rectangles() {
        let zones = [DeadZone::new(0, 1, 0, 1), DeadZone::new(5, 6, 5, 6)];
        assert!(in_any_zone(&zones, 5, 5));
        assert!(!in_any_zone(&zones, 3, 3));
        assert!(!in_any_zone(&[], 0, 0));
    }

    #[test]
    fn degenerate_only_when_both_sides_zero() {
        assert!(PixelRect::new(3.0, 3.0, 3.0, 3.0).is_degenerate());
        assert!(!PixelRect::new(3.0, 3.0, 3.0, 9.0).is_degenerate());
    }
}
