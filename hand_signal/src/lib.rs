//! # hand_signal
//!
//! Interprets raw 21-point hand landmark frames into a compact
//! [`HandObservation`] and debounces finger-count gestures into deliberate
//! shape-switch events.
//!
//! Two stages:
//!
//! 1. [`extract`] — pure geometric reduction of one frame: mirrored screen
//!    position, thumb–index pinch, palm roll, extended-finger count.
//! 2. [`StabilityDebouncer`] — a hold-to-confirm filter: a switch fires only
//!    once the hand has stayed still past the hold window, and only when the
//!    requested shape differs from the one already showing.
//!
//! ## Quick start
//!
//! ```
//! use hand_signal::{extract, LandmarkFrame, ShapeSelection, StabilityDebouncer, StabilityParams};
//! use shape_cloud::ShapeId;
//!
//! let mut debouncer = StabilityDebouncer::new(StabilityParams::default());
//! let mut selection = ShapeSelection::new(ShapeId::Heart);
//!
//! let frame = LandmarkFrame { points: Vec::new(), timestamp_ms: 0.0 };
//! let obs = extract(&frame);           // empty frame → hand absent
//! assert!(!obs.present);
//! assert!(debouncer.update(&obs, 0.0, &mut selection).is_none());
//! ```

use log::debug;
use shape_cloud::ShapeId;

// ════════════════════════════════════════════════════════════════════════════
// Landmark model
// ════════════════════════════════════════════════════════════════════════════

/// Index conventions for the 21-point hand model, wrist to pinky tip.
///
/// Each finger is a four-joint chain `MCP → PIP → DIP → TIP`; the thumb runs
/// `CMC → MCP → IP → TIP`.
pub mod landmark {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_DIP: usize = 7;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_DIP: usize = 15;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;

    /// Landmarks per hand.
    pub const COUNT: usize = 21;
}

/// One landmark in normalized image coordinates: `x` and `y` in `0..=1` with
/// the origin at the top-left, `z` a unitless depth estimate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl LandmarkPoint {
    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    fn dist(self, other: LandmarkPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// One detector frame: a full set of [`landmark::COUNT`] points, or an empty
/// vector when no hand is in view.
#[derive(Clone, Debug, Default)]
pub struct LandmarkFrame {
    pub points: Vec<LandmarkPoint>,
    /// Capture time on the source's own monotonic clock.
    pub timestamp_ms: f64,
}

// ════════════════════════════════════════════════════════════════════════════
// Observation extraction
// ════════════════════════════════════════════════════════════════════════════

/// Thumb–index tip distances treated as fully closed / fully open pinch.
pub const PINCH_CLOSED_DIST: f32 = 0.03;
pub const PINCH_OPEN_DIST: f32 = 0.15;

/// A fingertip counts as extended when it sits this much farther from the
/// wrist than its PIP joint.
const TIP_RATIO: f32 = 1.1;
/// The thumb counts as extended when its tip clears the pinky MCP by this
/// multiple of the palm width.
const THUMB_RATIO: f32 = 1.2;

/// Everything downstream needs to know about the hand in one frame.
///
/// `x` and `y` are mirrored screen coordinates in `-1..=1` (right on screen is
/// `+x`, up is `+y`), so moving the physical hand right moves the cloud right.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandObservation {
    pub present: bool,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Palm roll from the wrist → middle-knuckle axis, radians.
    pub rotation: f32,
    /// 0 = thumb on index tip, 1 = fully open.
    pub pinch: f32,
    /// Extended fingers, thumb included: `0..=5`.
    pub fingers: u8,
}

impl HandObservation {
    /// Neutral stand-in while no hand is tracked. Pinch rests mid-range so
    /// the scale mapping has a sensible value to ease back from.
    pub const fn absent() -> HandObservation {
        HandObservation {
            present: false,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            rotation: 0.0,
            pinch: 0.5,
            fingers: 0,
        }
    }
}

impl Default for HandObservation {
    fn default() -> HandObservation {
        HandObservation::absent()
    }
}

/// Reduce a landmark frame to a [`HandObservation`].
///
/// Frames with the wrong point count, or any non-finite coordinate, yield the
/// absent observation rather than garbage downstream.
pub fn extract(frame: &LandmarkFrame) -> HandObservation {
    let pts = &frame.points;
    if pts.len() != landmark::COUNT || pts.iter().any(|p| !p.is_finite()) {
        return HandObservation::absent();
    }

    let wrist = pts[landmark::WRIST];
    let middle_mcp = pts[landmark::MIDDLE_MCP];

    // Palm center, then mirror x (camera images are a mirror of the user)
    // and flip y so up on screen is positive.
    let cx = (wrist.x + middle_mcp.x) / 2.0;
    let cy = (wrist.y + middle_mcp.y) / 2.0;
    let x = (1.0 - cx) * 2.0 - 1.0;
    let y = -(cy * 2.0 - 1.0);

    let spread = pts[landmark::THUMB_TIP].dist(pts[landmark::INDEX_TIP]);
    let pinch =
        ((spread - PINCH_CLOSED_DIST) / (PINCH_OPEN_DIST - PINCH_CLOSED_DIST)).clamp(0.0, 1.0);

    // Image y grows downward; upright knuckles sit above the wrist, so an
    // upright hand reads as zero roll.
    let vx = middle_mcp.x - wrist.x;
    let vy = middle_mcp.y - wrist.y;
    let rotation = -vx.atan2(-vy);

    HandObservation {
        present: true,
        x,
        y,
        z: 0.0,
        rotation,
        pinch,
        fingers: count_fingers(pts),
    }
}

fn count_fingers(pts: &[LandmarkPoint]) -> u8 {
    let wrist = pts[landmark::WRIST];
    let mut count = 0;

    let tips = [
        landmark::INDEX_TIP,
        landmark::MIDDLE_TIP,
        landmark::RING_TIP,
        landmark::PINKY_TIP,
    ];
    let pips = [
        landmark::INDEX_PIP,
        landmark::MIDDLE_PIP,
        landmark::RING_PIP,
        landmark::PINKY_PIP,
    ];
    for (&tip, &pip) in tips.iter().zip(&pips) {
        if pts[tip].dist(wrist) > pts[pip].dist(wrist) * TIP_RATIO {
            count += 1;
        }
    }

    // The thumb folds across the palm, so wrist distance says little; use
    // reach past the opposite edge of the palm instead.
    let palm_width = pts[landmark::INDEX_MCP].dist(pts[landmark::PINKY_MCP]);
    if pts[landmark::THUMB_TIP].dist(pts[landmark::PINKY_MCP]) > palm_width * THUMB_RATIO {
        count += 1;
    }
    count
}

// ════════════════════════════════════════════════════════════════════════════
// Shape selection
// ════════════════════════════════════════════════════════════════════════════

/// The shape currently showing plus the user's explicit pick.
///
/// Gesture-driven switches move `current` only; `chosen` changes solely via
/// [`select`](ShapeSelection::select), and an open-palm hold returns the
/// display to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShapeSelection {
    current: ShapeId,
    chosen: ShapeId,
}

impl ShapeSelection {
    pub fn new(initial: ShapeId) -> ShapeSelection {
        ShapeSelection {
            current: initial,
            chosen: initial,
        }
    }

    /// Explicit user selection: records the pick and shows it.
    pub fn select(&mut self, shape: ShapeId) {
        self.current = shape;
        self.chosen = shape;
    }

    pub fn current(&self) -> ShapeId {
        self.current
    }

    pub fn chosen(&self) -> ShapeId {
        self.chosen
    }

    fn set_current(&mut self, shape: ShapeId) {
        self.current = shape;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Stability debouncing
// ════════════════════════════════════════════════════════════════════════════

/// Tunables for the hold-to-confirm filter.
#[derive(Clone, Copy, Debug)]
pub struct StabilityParams {
    /// Planar speed (position units per ms) below which the hand is still.
    pub speed_threshold: f64,
    /// Accumulated stillness required before a gesture is trusted.
    pub hold_ms: f64,
    /// Credited per still frame on top of elapsed time, so brief detector
    /// jitter cannot hold the counter at zero.
    pub pad_ms: f64,
}

impl Default for StabilityParams {
    fn default() -> StabilityParams {
        StabilityParams {
            speed_threshold: 0.0008,
            hold_ms: 400.0,
            pad_ms: 50.0,
        }
    }
}

/// Where the debouncer currently is between "no hand" and "switch armed".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StabilityPhase {
    /// No usable sample yet.
    Idle,
    /// Watching the hand, stillness not yet past the hold window.
    Tracking,
    /// Held still long enough; finger counts are being acted on.
    Triggered,
}

/// Hold-to-confirm filter over a stream of [`HandObservation`]s.
///
/// Feed every observation through [`update`](StabilityDebouncer::update); the
/// return value is `Some(shape)` exactly when a switch should happen. Finger
/// counts 1–4 request the matching digit glyph, an open palm (5) requests the
/// user's chosen shape, and a fist requests nothing.
#[derive(Clone, Debug)]
pub struct StabilityDebouncer {
    params: StabilityParams,
    last_pos: Option<(f32, f32)>,
    last_ms: f64,
    still_ms: f64,
}

impl StabilityDebouncer {
    pub fn new(params: StabilityParams) -> StabilityDebouncer {
        StabilityDebouncer {
            params,
            last_pos: None,
            last_ms: 0.0,
            still_ms: 0.0,
        }
    }

    pub fn phase(&self) -> StabilityPhase {
        if self.last_pos.is_none() {
            StabilityPhase::Idle
        } else if self.still_ms > self.params.hold_ms {
            StabilityPhase::Triggered
        } else {
            StabilityPhase::Tracking
        }
    }

    /// Stillness accumulated so far, for status display.
    pub fn still_ms(&self) -> f64 {
        self.still_ms
    }

    /// Advance the filter by one observation.
    ///
    /// `now_ms` must come from the same clock as the previous call. An absent
    /// observation clears all tracking state, so re-acquisition starts the
    /// hold from scratch.
    pub fn update(
        &mut self,
        obs: &HandObservation,
        now_ms: f64,
        selection: &mut ShapeSelection,
    ) -> Option<ShapeId> {
        if !obs.present {
            self.last_pos = None;
            self.still_ms = 0.0;
            return None;
        }

        // The first sample after acquisition has no speed estimate and must
        // never count as still; the same goes for a non-advancing clock.
        let mut speed = f64::INFINITY;
        let mut elapsed = 0.0;
        if let Some((px, py)) = self.last_pos {
            let dt = now_ms - self.last_ms;
            if dt > 0.0 {
                let dx = (obs.x - px) as f64;
                let dy = (obs.y - py) as f64;
                speed = (dx * dx + dy * dy).sqrt() / dt;
                elapsed = dt;
            }
        }
        self.last_pos = Some((obs.x, obs.y));
        self.last_ms = now_ms;

        if speed < self.params.speed_threshold {
            self.still_ms += elapsed + self.params.pad_ms;
        } else {
            self.still_ms = 0.0;
        }

        if self.still_ms <= self.params.hold_ms {
            return None;
        }

        let target = if obs.fingers >= 5 {
            Some(selection.chosen())
        } else {
            ShapeId::digit_for(obs.fingers)
        };
        match target {
            Some(shape) if shape != selection.current() => {
                selection.set_current(shape);
                debug!(
                    "held {} fingers for {:.0}ms: switching to {}",
                    obs.fingers,
                    self.still_ms,
                    shape.name()
                );
                Some(shape)
            }
            _ => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
