use crate::grid::{Age, Grid};
use life_common::{DeadZone, STAGNATION_LIMIT};
use log::{debug, trace};
use rand::Rng;

/// Per-cell dead-zone lookup, built once per step from the zone snapshot.
struct ZoneMask {
    cols: usize,
    dead: Vec<bool>,
}

impl ZoneMask {
    fn new(rows: usize, cols: usize, zones: &[DeadZone]) -> Self {
        let mut dead = vec![false; rows * cols];
        for z in zones {
            let r1 = z.r1.max(0) as usize;
            let c1 = z.c1.max(0) as usize;
            let r2 = (z.r2.max(0) as usize).min(rows);
            let c2 = (z.c2.max(0) as usize).min(cols);
            for r in r1..r2 {
                for c in c1..c2 {
                    dead[r * cols + c] = true;
                }
            }
        }
        ZoneMask { cols, dead }
    }

    #[inline(always)]
    fn is_dead(&self, row: usize, col: usize) -> bool {
        self.dead[row * self.cols + col]
    }
}

/// Counts of what happened during one `step()`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    pub births: usize,
    pub deaths: usize,
    /// Cells removed by the edge-kill pass.
    pub edge_kills: usize,
    /// Cells removed by stagnation-breaking (only non-zero on check generations).
    pub stagnation_kills: usize,
}

/// Periodic removal of cells that were alive at two samples `limit` generations apart.
#[derive(Debug, Clone)]
pub struct StagnationBreaker {
    limit: u32,
    counter: u32,
    snapshot: Option<Vec<bool>>,
}

impl StagnationBreaker {
    pub fn new(limit: u32) -> Self {
        StagnationBreaker { limit: limit.max(1), counter: 0, snapshot: None }
    }

    pub fn reset(&mut self) {
        self.counter = 0;
        self.snapshot = None;
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Advances the counter by one generation. On the check generation, kills
    /// every cell alive both now and in the stored snapshot, then re-samples
    /// the (modified) grid. Returns the number of cells killed.
    pub fn observe(&mut self, grid: &mut Grid) -> usize {
        self.counter += 1;
        if self.counter < self.limit {
            return 0;
        }

        let mut killed = 0;
        if let Some(previous) = self.snapshot.as_ref() {
            if previous.len() == grid.len() {
                for (age, &was_alive) in grid.cells_mut().iter_mut().zip(previous) {
                    if *age > 0 && was_alive {
                        *age = 0;
                        killed += 1;
                    }
                }
            }
        }
        self.snapshot = Some(grid.alive_mask());
        self.counter = 0;
        killed
    }
}

/// The simulation state: double-buffered grid, generation counter and stagnation sampling.
#[derive(Debug, Clone)]
pub struct Simulation {
    current: Grid,
    next: Grid,
    generation: u64,
    stagnation: StagnationBreaker,
}

impl Simulation {
    pub fn new(rows: usize, cols: usize, stagnation_limit: u32) -> Self {
        Simulation {
            current: Grid::new(rows, cols),
            next: Grid::new(rows, cols),
            generation: 0,
            stagnation: StagnationBreaker::new(stagnation_limit),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.current
    }

    /// Direct access for input painting, which bypasses the step.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.current
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn stagnation(&self) -> &StagnationBreaker {
        &self.stagnation
    }

    /// Advances the board by exactly one generation.
    ///
    /// The current buffer is only read and the next buffer only written until
    /// the buffers are swapped, so the result is independent of visit order.
    pub fn step(&mut self, zones: &[DeadZone]) -> StepReport {
        let rows = self.current.rows();
        let cols = self.current.cols();
        if self.next.rows() != rows || self.next.cols() != cols {
            self.next = Grid::new(rows, cols);
        }
        let mask = ZoneMask::new(rows, cols, zones);

        let mut report = compute_next(&self.current, &mut self.next, &mask);
        report.edge_kills = apply_edge_kill(&mut self.next);

        std::mem::swap(&mut self.current, &mut self.next);
        self.generation += 1;

        report.stagnation_kills = self.stagnation.observe(&mut self.current);
        if report.stagnation_kills > 0 {
            debug!(
                "Generation {}: stagnation-breaking removed {} cells",
                self.generation, report.stagnation_kills
            );
        }
        trace!("Generation {}: {:?}", self.generation, report);
        report
    }

    /// Changes the board size, keeping ages in the overlapping region.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        if rows == self.current.rows() && cols == self.current.cols() {
            return;
        }
        self.current = self.current.resized(rows, cols);
        self.next = Grid::new(rows, cols);
        // Old samples no longer line up with the cells
        self.stagnation.reset();
    }

    /// Kills every cell inside a dead zone (applied when zones change).
    pub fn apply_zones(&mut self, zones: &[DeadZone]) -> usize {
        let mask = ZoneMask::new(self.current.rows(), self.current.cols(), zones);
        let mut killed = 0;
        for (i, age) in self.current.cells_mut().iter_mut().enumerate() {
            if *age > 0 && mask.dead[i] {
                *age = 0;
                killed += 1;
            }
        }
        killed
    }

    /// Empties the board and restarts the generation count and stagnation sampling.
    pub fn clear(&mut self) {
        self.current.clear();
        self.reset_history();
    }

    /// Fills the board with age-1 cells, each alive with probability `density`.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R, density: f64) {
        let p = density.clamp(0.0, 1.0);
        for age in self.current.cells_mut() {
            *age = if rng.random_bool(p) { 1 } else { 0 };
        }
        self.reset_history();
    }

    fn reset_history(&mut self) {
        self.generation = 0;
        self.stagnation.reset();
    }
}

/// Live neighbors of `(row, col)` among in-bounds cells outside every dead zone.
#[inline(always)]
fn live_neighbors(grid: &Grid, mask: &ZoneMask, row: usize, col: usize) -> u8 {
    let cells = grid.cells();
    let cols = grid.cols();
    let mut count = 0;
    for dr in -1i32..=1 {
        for dc in -1i32..=1 {
            if dr == 0 && dc == 0 {
                continue;
            }
            let nr = row as i32 + dr;
            let nc = col as i32 + dc;
            if nr < 0 || nc < 0 || nr as usize >= grid.rows() || nc as usize >= cols {
                continue;
            }
            let (nr, nc) = (nr as usize, nc as usize);
            if !mask.is_dead(nr, nc) && cells[nr * cols + nc] > 0 {
                count += 1;
            }
        }
    }
    count
}

/// Applies the survival, birth and aging rules from `current` into `next`.
fn compute_next(current: &Grid, next: &mut Grid, mask: &ZoneMask) -> StepReport {
    let cols = current.cols();
    let mut report = StepReport::default();
    let src = current.cells();
    let dst = next.cells_mut();

    for (idx, out) in dst.iter_mut().enumerate() {
        let (row, col) = (idx / cols, idx % cols);
        let age: Age = src[idx];
        if mask.is_dead(row, col) {
            if age > 0 {
                report.deaths += 1;
            }
            *out = 0;
            continue;
        }
        let n = live_neighbors(current, mask, row, col);
        *out = match (age > 0, n) {
            (true, 2) | (true, 3) => age.saturating_add(1), // Survival
            (true, _) => {
                report.deaths += 1;
                0
            }
            (false, 3) => {
                report.births += 1;
                1
            }
            (false, _) => 0,
        };
    }
    report
}

/// Kills every border cell alive in `next` together with its 8 neighbors.
///
/// The triggering cells are collected before anything is killed, so the
/// outcome does not depend on sweep order.
fn apply_edge_kill(next: &mut Grid) -> usize {
    let rows = next.rows();
    let cols = next.cols();
    let triggers: Vec<(usize, usize)> = next
        .live_cells()
        .filter(|&(r, c, _)| next.is_border(r, c))
        .map(|(r, c, _)| (r, c))
        .collect();

    let mut killed = 0;
    for (r, c) in triggers {
        for nr in r.saturating_sub(1)..=(r + 1).min(rows - 1) {
            for nc in c.saturating_sub(1)..=(c + 1).min(cols - 1) {
                let cell = &mut next.cells_mut()[nr * cols + nc];
                if *cell > 0 {
                    *cell = 0;
                    killed += 1;
                }
            }
        }
    }
    killed
}

impl Default for Simulation {
    fn default() -> Self {
        Simulation::new(0, 0, STAGNATION_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sim_with(rows: usize, cols: usize, cells: &[(i32, i32, Age)]) -> Simulation {
        let mut sim = Simulation::new(rows, cols, STAGNATION_LIMIT);
        for &(r, c, a) in cells {
            sim.grid_mut().set_age(r, c, a);
        }
        sim
    }

    #[test]
    fn blinker_ages_center_and_rotates() {
        // Horizontal blinker well away from the border
        let mut sim = sim_with(7, 7, &[(3, 2, 1), (3, 3, 4), (3, 4, 1)]);
        let report = sim.step(&[]);
        let g = sim.grid();
        assert_eq!(g.age(3, 3), 5, "center survives with 2 neighbors and ages");
        assert_eq!(g.age(2, 3), 1, "born with 3 neighbors");
        assert_eq!(g.age(4, 3), 1);
        assert_eq!(g.age(3, 2), 0, "ends die with 1 neighbor");
        assert_eq!(g.age(3, 4), 0);
        assert_eq!(report.births, 2);
        assert_eq!(report.deaths, 2);
        assert_eq!(sim.generation(), 1);
    }

    #[test]
    fn overcrowded_cell_dies_and_two_neighbors_do_not_birth() {
        // Plus shape: center has 4 neighbors
        let mut sim = sim_with(7, 7, &[(3, 3, 2), (2, 3, 1), (4, 3, 1), (3, 2, 1), (3, 4, 1)]);
        sim.step(&[]);
        assert_eq!(sim.grid().age(3, 3), 0);
        // (1,3) only touches (2,3): stays dead
        assert_eq!(sim.grid().age(1, 3), 0);
    }

    #[test]
    fn dead_zone_cells_are_zero_and_not_counted() {
        // Block of four; one corner sits inside a zone
        let mut sim = sim_with(8, 8, &[(3, 3, 1), (3, 4, 1), (4, 3, 1), (4, 4, 1)]);
        let zones = [DeadZone::new(4, 5, 4, 5)];
        sim.step(&zones);
        let g = sim.grid();
        assert_eq!(g.age(4, 4), 0, "zone cell is dead after the step");
        // The other three each see only two live non-zone neighbors and survive
        assert_eq!(g.age(3, 3), 2);
        assert_eq!(g.age(3, 4), 2);
        assert_eq!(g.age(4, 3), 2);
        // No births into the zone even if it has 3 live neighbors
        for _ in 0..3 {
            sim.step(&zones);
            assert_eq!(sim.grid().age(4, 4), 0);
        }
    }

    #[test]
    fn edge_kill_clears_border_and_neighbors() {
        let mut next = Grid::new(6, 6);
        next.set_age(0, 2, 1); // border trigger
        next.set_age(1, 3, 3); // diagonal neighbor of the trigger
        next.set_age(1, 1, 2); // another neighbor
        next.set_age(3, 3, 1); // untouched interior cell
        let killed = apply_edge_kill(&mut next);
        assert_eq!(killed, 3);
        assert_eq!(next.live_cells().collect::<Vec<_>>(), vec![(3, 3, 1)]);
    }

    #[test]
    fn edge_kill_uses_the_pre_pass_trigger_set() {
        // (0,0) and (0,1) are both border cells; killing (0,0) first must not
        // stop (0,1) from killing its own neighborhood.
        let mut next = Grid::new(5, 5);
        next.set_age(0, 0, 1);
        next.set_age(0, 1, 1);
        next.set_age(1, 2, 1); // only reachable through (0,1)
        apply_edge_kill(&mut next);
        assert_eq!(next.live_count(), 0);
    }

    #[test]
    fn no_border_cell_survives_a_step() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut sim = Simulation::new(20, 30, STAGNATION_LIMIT);
        sim.randomize(&mut rng, 0.5);
        for _ in 0..5 {
            sim.step(&[]);
            let g = sim.grid();
            for (r, c, _) in g.live_cells() {
                assert!(!g.is_border(r, c), "border cell ({}, {}) alive", r, c);
            }
        }
    }

    #[test]
    fn stagnation_kills_still_life_at_second_sample() {
        // A block is a still life: survives until the second sample
        let block = [(3, 3, 1), (3, 4, 1), (4, 3, 1), (4, 4, 1)];
        let mut sim = sim_with(8, 8, &block);
        for _ in 0..STAGNATION_LIMIT {
            sim.step(&[]);
        }
        assert!(sim.stagnation().has_snapshot(), "first check only samples");
        assert_eq!(sim.grid().live_count(), 4);
        assert_eq!(sim.grid().age(3, 3), 11);

        for _ in 0..STAGNATION_LIMIT - 1 {
            sim.step(&[]);
        }
        assert_eq!(sim.grid().live_count(), 4);
        let report = sim.step(&[]);
        assert_eq!(report.stagnation_kills, 4);
        assert_eq!(sim.grid().live_count(), 0);
    }

    #[test]
    fn stagnation_spares_cells_dead_at_previous_sample() {
        let mut breaker = StagnationBreaker::new(2);
        let mut grid = Grid::new(3, 3);
        grid.set_age(1, 1, 1);
        breaker.observe(&mut grid);
        assert_eq!(breaker.observe(&mut grid), 0, "first check only stores the sample");

        grid.set_age(0, 0, 1); // newly alive since the sample
        breaker.observe(&mut grid);
        assert_eq!(breaker.observe(&mut grid), 1);
        assert_eq!(grid.age(1, 1), 0);
        assert_eq!(grid.age(0, 0), 1);
    }

    #[test]
    fn clear_and_randomize_reset_history() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut sim = Simulation::new(10, 10, 3);
        sim.randomize(&mut rng, 1.0);
        assert_eq!(sim.grid().live_count(), 100);
        assert!(sim.grid().cells().iter().all(|&a| a == 1));
        for _ in 0..4 {
            sim.step(&[]);
        }
        assert!(sim.stagnation().has_snapshot());
        sim.clear();
        assert_eq!(sim.generation(), 0);
        assert_eq!(sim.grid().live_count(), 0);
        assert!(!sim.stagnation().has_snapshot());
    }

    #[test]
    fn resize_keeps_overlap() {
        let mut sim = sim_with(4, 4, &[(1, 1, 6), (3, 3, 2)]);
        sim.resize(3, 6);
        assert_eq!(sim.grid().age(1, 1), 6);
        assert_eq!(sim.grid().live_count(), 1);
        assert_eq!((sim.grid().rows(), sim.grid().cols()), (3, 6));
        sim.step(&[]); // next buffer follows the new size
        assert_eq!(sim.grid().len(), 18);
    }

    #[test]
    fn apply_zones_clears_covered_cells() {
        let mut sim = sim_with(4, 4, &[(1, 1, 1), (2, 2, 1)]);
        assert_eq!(sim.apply_zones(&[DeadZone::new(0, 2, 0, 2)]), 1);
        assert_eq!(sim.grid().age(1, 1), 0);
        assert_eq!(sim.grid().age(2, 2), 1);
    }
}
