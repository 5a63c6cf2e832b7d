/// Cell age: 0 = dead, N >= 1 = alive for N consecutive generations.
pub type Age = u16;

/// Fixed-size, row-major board of cell ages.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Age>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Grid { rows, cols, cells: vec![0; rows * cols] }
    }

    /// Wraps an existing age buffer; `None` if its length does not match `rows * cols`.
    pub fn from_ages(rows: usize, cols: usize, ages: Vec<Age>) -> Option<Self> {
        (ages.len() == rows * cols).then_some(Grid { rows, cols, cells: ages })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Age] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Age] {
        &mut self.cells
    }

    /// Row-major index for `(row, col)`, or `None` outside the board.
    #[inline(always)]
    pub fn index(&self, row: i32, col: i32) -> Option<usize> {
        if row < 0 || col < 0 {
            return None;
        }
        let (r, c) = (row as usize, col as usize);
        (r < self.rows && c < self.cols).then(|| r * self.cols + c)
    }

    /// Age at `(row, col)`; cells outside the board read as dead.
    #[inline(always)]
    pub fn age(&self, row: i32, col: i32) -> Age {
        self.index(row, col).map_or(0, |i| self.cells[i])
    }

    #[inline(always)]
    pub fn is_alive(&self, row: i32, col: i32) -> bool {
        self.age(row, col) > 0
    }

    /// Writes an age; returns false (and does nothing) outside the board.
    pub fn set_age(&mut self, row: i32, col: i32, age: Age) -> bool {
        match self.index(row, col) {
            Some(i) => {
                self.cells[i] = age;
                true
            }
            None => false,
        }
    }

    #[inline(always)]
    pub fn is_border(&self, row: usize, col: usize) -> bool {
        row == 0 || col == 0 || row + 1 == self.rows || col + 1 == self.cols
    }

    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|&&a| a > 0).count()
    }

    /// Boolean projection (age > 0) of the whole board.
    pub fn alive_mask(&self) -> Vec<bool> {
        self.cells.iter().map(|&a| a > 0).collect()
    }

    /// Live cells as `(row, col, age)` in row-major order.
    pub fn live_cells(&self) -> impl Iterator<Item = (usize, usize, Age)> + '_ {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &a)| a > 0)
            .map(move |(i, &a)| (i / cols, i % cols, a))
    }

    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|a| *a = 0);
    }

    /// A new board of the given size holding this board's ages in the
    /// overlapping top-left sub-rectangle; everything else starts dead.
    pub fn resized(&self, rows: usize, cols: usize) -> Grid {
        let mut out = Grid::new(rows, cols);
        let min_r = self.rows.min(rows);
        let min_c = self.cols.min(cols);
        for r in 0..min_r {
            let src = r * self.cols;
            let dst = r * cols;
            out.cells[dst..dst + min_c].copy_from_slice(&self.cells[src..src + min_c]);
        }
        out
    }
}
