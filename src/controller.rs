//! The single owner of all board state.
//!
//! Hosts translate their events into [`Command`]s and hand the controller a
//! [`Surface`] and a [`FrameHost`] on every entry point; nothing is kept in
//! globals, so tests can drive the whole thing with a manual clock.

use crate::input::{InputController, PointerPosition, ReleaseOutcome};
use crate::layout::Layout;
use crate::render::{Renderer, Surface};
use crate::scheduler::{FrameHost, FrameToken, Scheduler};
use crate::simulation::{Simulation, StepReport};
use life_common::{HighlightPalette, LifeConfig, RANDOM_DENSITY, STAGNATION_LIMIT, TICK_MS};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;

/// Tunables the controller needs from the configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerSettings {
    pub tick_ms: f64,
    pub stagnation_limit: u32,
    pub random_density: f64,
    pub seed: u64,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        ControllerSettings {
            tick_ms: TICK_MS,
            stagnation_limit: STAGNATION_LIMIT,
            random_density: RANDOM_DENSITY,
            seed: 0,
        }
    }
}

impl From<&LifeConfig> for ControllerSettings {
    fn from(config: &LifeConfig) -> Self {
        ControllerSettings {
            tick_ms: config.timing.tick_ms,
            stagnation_limit: config.rules.stagnation_limit,
            random_density: config.rules.random_density,
            seed: config.rules.seed,
        }
    }
}

/// Everything a host can ask of the board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    PointerDown(PointerPosition),
    PointerMove(PointerPosition),
    PointerUp,
    Play,
    Pause,
    TogglePlay,
    /// Pauses if running, then advances exactly one generation.
    StepOnce,
    /// Pauses if running, then empties the board.
    Clear,
    Randomize,
}

/// Result of one frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameOutcome {
    /// Set when the frame advanced the simulation.
    pub step: Option<StepReport>,
}

pub struct LifeController {
    simulation: Simulation,
    layout: Layout,
    renderer: Renderer,
    scheduler: Scheduler,
    input: InputController,
    rng: StdRng,
    queue: VecDeque<Command>,
    random_density: f64,
}

impl LifeController {
    pub fn new(settings: ControllerSettings, layout: Layout, palette: HighlightPalette) -> Self {
        info!("Board {}x{} cells, tick {} ms", layout.cols, layout.rows, settings.tick_ms);
        LifeController {
            simulation: Simulation::new(layout.rows, layout.cols, settings.stagnation_limit),
            layout,
            renderer: Renderer::new(palette),
            scheduler: Scheduler::new(settings.tick_ms),
            input: InputController::new(),
            rng: StdRng::seed_from_u64(settings.seed),
            queue: VecDeque::new(),
            random_density: settings.random_density,
        }
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn generation(&self) -> u64 {
        self.simulation.generation()
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn is_drawing(&self) -> bool {
        self.input.is_drawing()
    }

    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S) {
        self.renderer.draw(self.simulation.grid(), &self.layout, surface);
    }

    /// Adopts a freshly resolved layout: resizes the board keeping the
    /// overlapping ages, clears cells under the new dead zones, re-renders.
    pub fn apply_layout<S: Surface + ?Sized>(&mut self, layout: Layout, surface: &mut S) {
        self.simulation.resize(layout.rows, layout.cols);
        let cleared = self.simulation.apply_zones(&layout.dead_zones);
        debug!("Layout applied: {}x{}, {} cells cleared by dead zones", layout.cols, layout.rows, cleared);
        self.layout = layout;
        self.render(surface);
    }

    pub fn set_palette<S: Surface + ?Sized>(&mut self, palette: HighlightPalette, surface: &mut S) {
        debug!("Palette updated: {} highlight colours", palette.len());
        self.renderer.set_palette(palette);
        self.render(surface);
    }

    /// Advances one generation and re-renders.
    pub fn step<S: Surface + ?Sized>(&mut self, surface: &mut S) -> StepReport {
        let report = self.simulation.step(&self.layout.dead_zones);
        self.render(surface);
        report
    }

    /// Starts the loop (the initial auto-play).
    pub fn start<H: FrameHost + ?Sized>(&mut self, host: &mut H) {
        self.scheduler.play(host);
    }

    /// Frame callback entry point.
    pub fn on_frame<S: Surface + ?Sized, H: FrameHost + ?Sized>(
        &mut self,
        token: FrameToken,
        timestamp: f64,
        surface: &mut S,
        host: &mut H,
    ) -> FrameOutcome {
        if self.scheduler.on_frame(token, timestamp, host) {
            FrameOutcome { step: Some(self.step(surface)) }
        } else {
            FrameOutcome::default()
        }
    }

    pub fn enqueue(&mut self, command: Command) {
        self.queue.push_back(command);
    }

    /// Applies every queued command in order. Returns how many ran.
    pub fn process<S: Surface + ?Sized, H: FrameHost + ?Sized>(&mut self, surface: &mut S, host: &mut H) -> usize {
        let mut handled = 0;
        while let Some(command) = self.queue.pop_front() {
            self.apply(command, surface, host);
            handled += 1;
        }
        handled
    }

    /// Enqueues and immediately processes one command.
    pub fn dispatch<S: Surface + ?Sized, H: FrameHost + ?Sized>(
        &mut self,
        command: Command,
        surface: &mut S,
        host: &mut H,
    ) {
        self.enqueue(command);
        self.process(surface, host);
    }

    fn apply<S: Surface + ?Sized, H: FrameHost + ?Sized>(&mut self, command: Command, surface: &mut S, host: &mut H) {
        match command {
            Command::PointerDown(at) => {
                let cell = at.cell(&self.layout);
                self.input.press(self.simulation.grid_mut(), &self.layout.dead_zones, cell);
                self.render(surface);
            }
            Command::PointerMove(at) => {
                if !self.input.is_drawing() {
                    return;
                }
                let cell = at.cell(&self.layout);
                self.input.drag_to(self.simulation.grid_mut(), &self.layout.dead_zones, cell);
                self.render(surface);
            }
            Command::PointerUp => {
                let grid = self.simulation.grid_mut();
                let outcome = self.input.release(grid, &self.layout.dead_zones, &mut self.rng);
                if outcome != ReleaseOutcome::Idle {
                    self.render(surface);
                }
            }
            Command::Play => {
                self.scheduler.play(host);
            }
            Command::Pause => {
                self.scheduler.pause(host);
            }
            Command::TogglePlay => self.scheduler.toggle(host),
            Command::StepOnce => {
                self.scheduler.pause(host);
                self.step(surface);
            }
            Command::Clear => {
                self.scheduler.pause(host);
                self.simulation.clear();
                self.render(surface);
            }
            Command::Randomize => {
                self.simulation.randomize(&mut self.rng, self.random_density);
                self.simulation.apply_zones(&self.layout.dead_zones);
                self.render(surface);
            }
        }
    }
}
