//! Top-level application state and the frame loop.
//!
//! One thread owns everything that matters: the loop polls window input,
//! drains the landmark channel (feeding every observation to the debouncer,
//! keeping the freshest one for the engine), steps the cloud and renders.
//! Sources never touch app state directly.

use std::sync::mpsc::{self, TryRecvError};
use std::time::Instant;

use anyhow::Result;
use hand_signal::{
    extract, HandObservation, ShapeSelection, StabilityDebouncer, StabilityPhase,
};
use log::{error, info};
use particle_morph::color::{display_color, Rgb};
use particle_morph::MorphEngine;
use shape_cloud::ShapeId;

use crate::config::Profile;
use crate::source::{spawn_source, SimSource, SourceEvent, TrackerSource};
use crate::visualizer::{UiCommand, Visualizer};

/// Base colors cycled by the C key.
pub const PALETTE: [Rgb; 6] = [
    Rgb { r: 0x00, g: 0xFF, b: 0xFF },
    Rgb { r: 0xFF, g: 0x00, b: 0xFF },
    Rgb { r: 0xFF, g: 0xFF, b: 0x00 },
    Rgb { r: 0xFF, g: 0x44, b: 0x44 },
    Rgb { r: 0x44, g: 0xFF, b: 0x44 },
    Rgb { r: 0xFF, g: 0xFF, b: 0xFF },
];

/// Which landmark source to run.
pub enum SourceKind {
    Sim,
    Tracker(Vec<String>),
}

/// Lifecycle of the landmark source as the app sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourcePhase {
    Waiting,
    Live,
    Failed,
}

// ════════════════════════════════════════════════════════════════════════════
// App state
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    engine: MorphEngine,
    debouncer: StabilityDebouncer,
    selection: ShapeSelection,
    last_obs: HandObservation,
    base_color: Rgb,
    palette_at: usize,
    phase: SourcePhase,
}

impl AppState {
    pub fn new(profile: &Profile) -> AppState {
        let initial = ShapeId::Heart;
        AppState {
            engine: MorphEngine::new(
                initial,
                profile.engine.particle_count,
                profile.engine.tuning(),
            ),
            debouncer: StabilityDebouncer::new(profile.stability.params()),
            selection: ShapeSelection::new(initial),
            last_obs: HandObservation::absent(),
            base_color: profile.display.color(),
            palette_at: 0,
            phase: SourcePhase::Waiting,
        }
    }

    pub fn engine(&self) -> &MorphEngine {
        &self.engine
    }

    pub fn selection(&self) -> &ShapeSelection {
        &self.selection
    }

    pub fn phase(&self) -> SourcePhase {
        self.phase
    }

    pub fn last_observation(&self) -> &HandObservation {
        &self.last_obs
    }

    /// The cloud's color this frame.
    pub fn color(&self, elapsed: f32) -> Rgb {
        display_color(self.base_color, elapsed)
    }

    pub fn handle_command(&mut self, cmd: UiCommand) {
        match cmd {
            UiCommand::SelectShape(shape) => {
                self.selection.select(shape);
                self.engine.set_shape(shape);
                info!("shape picked: {}", shape.name());
            }
            UiCommand::CycleColor => {
                self.palette_at = (self.palette_at + 1) % PALETTE.len();
                self.base_color = PALETTE[self.palette_at];
            }
        }
    }

    pub fn handle_source_event(&mut self, event: SourceEvent) {
        match event {
            SourceEvent::Ready => {
                self.phase = SourcePhase::Live;
                info!("landmark source live");
            }
            SourceEvent::Failed(reason) => {
                if self.phase != SourcePhase::Failed {
                    error!("landmark source failed: {reason}");
                }
                self.phase = SourcePhase::Failed;
                self.last_obs = HandObservation::absent();
            }
            SourceEvent::Frame(frame) => {
                let obs = extract(&frame);
                if let Some(shape) =
                    self.debouncer
                        .update(&obs, frame.timestamp_ms, &mut self.selection)
                {
                    self.engine.set_shape(shape);
                }
                self.last_obs = obs;
            }
        }
    }

    /// Advance the cloud using the freshest observation.
    pub fn step(&mut self, dt: f32, elapsed: f32) {
        self.engine.step(&self.last_obs, dt, elapsed);
    }

    pub fn status_line(&self) -> String {
        match self.phase {
            SourcePhase::Waiting => "waiting for landmark source...".to_string(),
            SourcePhase::Failed => format!(
                "source failed - {} drifting untracked",
                self.engine.shape().name()
            ),
            SourcePhase::Live if !self.last_obs.present => {
                format!("no hand - {} drifting", self.engine.shape().name())
            }
            SourcePhase::Live => {
                let hold = match self.debouncer.phase() {
                    StabilityPhase::Triggered => "locked".to_string(),
                    _ => format!("{:.0}ms", self.debouncer.still_ms()),
                };
                format!(
                    "shape: {}  fingers: {}  pinch: {:.2}  hold: {}",
                    self.engine.shape().name(),
                    self.last_obs.fingers,
                    self.last_obs.pinch,
                    hold,
                )
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Frame loop
// ════════════════════════════════════════════════════════════════════════════

pub fn run(profile: Profile, kind: SourceKind) -> Result<()> {
    let (sim_tx, sim_rx) = mpsc::channel();
    let events = match kind {
        SourceKind::Sim => {
            info!("landmark source: simulated hand");
            spawn_source(SimSource { controls: sim_rx })
        }
        SourceKind::Tracker(command) => {
            // No listener for sim controls in tracker mode; closing the
            // channel makes the visualizer's sends no-ops.
            drop(sim_rx);
            spawn_source(TrackerSource { command })
        }
    };

    let mut vis = Visualizer::new(profile.display.width, profile.display.height, sim_tx)
        .map_err(anyhow::Error::msg)?;
    let mut app = AppState::new(&profile);
    info!(
        "{} particles, starting on {}",
        app.engine().particle_count(),
        app.engine().shape().name()
    );

    let start = Instant::now();
    let mut last_frame = start;
    loop {
        let (commands, alive) = vis.poll_input();
        if !alive {
            break;
        }
        for cmd in commands {
            app.handle_command(cmd);
        }

        loop {
            match events.try_recv() {
                Ok(event) => app.handle_source_event(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        let now = Instant::now();
        // Cap a stalled frame's dt so a window drag cannot slingshot the
        // cloud.
        let dt = now.duration_since(last_frame).as_secs_f32().min(0.1);
        last_frame = now;
        let elapsed = start.elapsed().as_secs_f32();

        app.step(dt, elapsed);
        vis.render(
            app.engine().positions(),
            app.engine().yaw(),
            app.color(elapsed),
            &app.status_line(),
        );
    }

    info!("window closed");
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
