//! Decorative Game of Life engine: the board, its rules, geometry, input
//! handling and the frame loop, independent of any windowing host.

pub mod controller;
pub mod grid;
pub mod input;
pub mod layout;
pub mod render;
pub mod runner;
pub mod scheduler;
pub mod simulation;

pub use controller::{Command, ControllerSettings, FrameOutcome, LifeController};
pub use grid::{Age, Grid};
pub use input::{ChromeNode, InputController, PointerPosition, ReleaseOutcome};
pub use layout::{ContainerMetrics, FixedLayoutProvider, Layout, LayoutProvider, TabMetrics};
pub use render::{Renderer, Surface};
pub use scheduler::{FrameHost, FrameToken, ManualFrameHost, Scheduler, SchedulerState};
pub use simulation::{Simulation, StepReport};
