//! Landmark frame sources.
//!
//! Both the keyboard/mouse simulator and the external tracker process feed
//! [`SourceEvent`]s through an `mpsc` channel, so the rest of the app never
//! knows which one is running. The simulator does not shortcut: it renders
//! its ground-truth posture into full 21-point frames that go through the
//! same extraction as real tracking.

use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use hand_signal::{landmark, LandmarkFrame, LandmarkPoint, PINCH_CLOSED_DIST, PINCH_OPEN_DIST};
use log::{debug, info, warn};
use serde::Deserialize;

// ════════════════════════════════════════════════════════════════════════════
// Source plumbing
// ════════════════════════════════════════════════════════════════════════════

/// What a source can tell the app.
#[derive(Clone, Debug)]
pub enum SourceEvent {
    /// The source finished starting up and frames will follow.
    Ready,
    /// The source is gone for good; no frames will follow.
    Failed(String),
    Frame(LandmarkFrame),
}

/// A producer of landmark frames, run on its own thread.
pub trait LandmarkSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>);
}

/// Spawn `source` on a worker thread and hand back the receiving end.
pub fn spawn_source<S: LandmarkSource>(source: S) -> Receiver<SourceEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// Simulated hand
// ════════════════════════════════════════════════════════════════════════════

/// Control event from the window toward the simulated hand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimInput {
    /// Hand center in observation coordinates, `-1..=1` each axis.
    CursorAt { x: f32, y: f32 },
    PinchDelta(f32),
    RotateDelta(f32),
    TogglePresence,
    /// Extended finger count, `0..=5`.
    Fingers(u8),
}

/// Ground truth the simulator renders into landmark frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimPosture {
    pub present: bool,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub pinch: f32,
    pub fingers: u8,
}

impl Default for SimPosture {
    fn default() -> SimPosture {
        SimPosture {
            present: true,
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            pinch: 0.5,
            fingers: 5,
        }
    }
}

impl SimPosture {
    pub fn apply(&mut self, input: SimInput) {
        match input {
            SimInput::CursorAt { x, y } => {
                self.x = x.clamp(-1.0, 1.0);
                self.y = y.clamp(-1.0, 1.0);
            }
            SimInput::PinchDelta(d) => self.pinch = (self.pinch + d).clamp(0.0, 1.0),
            SimInput::RotateDelta(d) => self.rotation = wrap_angle(self.rotation + d),
            SimInput::TogglePresence => self.present = !self.present,
            SimInput::Fingers(n) => self.fingers = n.min(5),
        }
    }
}

fn wrap_angle(a: f32) -> f32 {
    let a = a % std::f32::consts::TAU;
    if a > std::f32::consts::PI {
        a - std::f32::consts::TAU
    } else if a < -std::f32::consts::PI {
        a + std::f32::consts::TAU
    } else {
        a
    }
}

// Synthetic hand metrics in image units, sized so extraction reads back the
// intended posture for every pinch value. Palm width 0.10 puts the thumb
// threshold at 0.12: a thumb tucked toward the pinky MCP always stays
// inside it, an open thumb always clears it.
const PALM_LEN: f32 = 0.18;
const PIP_ROW: f32 = 0.22;
const TIP_EXTENDED: f32 = 0.28;
const TIP_CURLED: f32 = 0.16;
const FINGER_SPREAD: [f32; 4] = [0.05, 0.0, -0.025, -0.05];

/// Render a posture into a full landmark frame, or an empty one while the
/// hand is out of view.
pub fn synthesize_frame(p: &SimPosture, timestamp_ms: f64) -> LandmarkFrame {
    if !p.present {
        return LandmarkFrame {
            points: Vec::new(),
            timestamp_ms,
        };
    }

    // Invert the extractor's mirror/flip to get the palm center in image
    // space, then build the hand around it.
    let cx = (1.0 - p.x) / 2.0;
    let cy = (1.0 - p.y) / 2.0;

    // Finger-ward palm axis and its in-image perpendicular.
    let up = (-p.rotation.sin(), -p.rotation.cos());
    let side = (p.rotation.cos(), -p.rotation.sin());
    let wrist = (cx - up.0 * PALM_LEN / 2.0, cy - up.1 * PALM_LEN / 2.0);

    let place = |along: f32, across: f32| LandmarkPoint {
        x: wrist.0 + up.0 * along + side.0 * across,
        y: wrist.1 + up.1 * along + side.1 * across,
        z: 0.0,
    };

    let mut pts = vec![place(0.0, 0.0); landmark::COUNT];
    pts[landmark::MIDDLE_MCP] = place(PALM_LEN, 0.0);

    // Index through pinky: MCP, PIP, DIP, TIP chains. The first
    // `fingers.min(4)` of them reach the extended tip row.
    for (f, &across) in FINGER_SPREAD.iter().enumerate() {
        let mcp = landmark::INDEX_MCP + f * 4;
        let tip_row = if (f as u8) < p.fingers.min(4) {
            TIP_EXTENDED
        } else {
            TIP_CURLED
        };
        pts[mcp] = place(PALM_LEN, across);
        pts[mcp + 1] = place(PIP_ROW, across);
        pts[mcp + 2] = place((PIP_ROW + tip_row) / 2.0, across);
        pts[mcp + 3] = place(tip_row, across);
    }

    // The thumb tip sits exactly `pinch` worth of distance from the index
    // tip: toward the pinky MCP while folded, up past the fingers when the
    // whole hand is open.
    let index_tip = pts[landmark::INDEX_TIP];
    let pinky_mcp = pts[landmark::PINKY_MCP];
    let reach = PINCH_CLOSED_DIST + p.pinch * (PINCH_OPEN_DIST - PINCH_CLOSED_DIST);
    let thumb_tip = if p.fingers >= 5 {
        LandmarkPoint {
            x: index_tip.x + up.0 * reach,
            y: index_tip.y + up.1 * reach,
            z: 0.0,
        }
    } else {
        let ux = index_tip.x - pinky_mcp.x;
        let uy = index_tip.y - pinky_mcp.y;
        let len = (ux * ux + uy * uy).sqrt();
        LandmarkPoint {
            x: index_tip.x - ux / len * reach,
            y: index_tip.y - uy / len * reach,
            z: 0.0,
        }
    };
    pts[landmark::THUMB_TIP] = thumb_tip;
    for (joint, t) in [
        (landmark::THUMB_CMC, 0.3),
        (landmark::THUMB_MCP, 0.6),
        (landmark::THUMB_IP, 0.85),
    ] {
        pts[joint] = LandmarkPoint {
            x: wrist.0 + (thumb_tip.x - wrist.0) * t,
            y: wrist.1 + (thumb_tip.y - wrist.1) * t,
            z: 0.0,
        };
    }

    LandmarkFrame {
        points: pts,
        timestamp_ms,
    }
}

/// Keyboard/mouse simulator: applies control events to a posture and emits
/// synthesized frames at detection cadence (~30 Hz).
pub struct SimSource {
    pub controls: Receiver<SimInput>,
}

const SIM_FRAME: Duration = Duration::from_millis(33);

impl LandmarkSource for SimSource {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>) {
        if tx.send(SourceEvent::Ready).is_err() {
            return;
        }
        let start = Instant::now();
        let mut posture = SimPosture::default();
        loop {
            match self.controls.recv_timeout(SIM_FRAME) {
                Ok(input) => {
                    posture.apply(input);
                    while let Ok(more) = self.controls.try_recv() {
                        posture.apply(more);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return,
            }
            let ts = start.elapsed().as_secs_f64() * 1000.0;
            let frame = synthesize_frame(&posture, ts);
            if tx.send(SourceEvent::Frame(frame)).is_err() {
                return;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// External tracker process
// ════════════════════════════════════════════════════════════════════════════

/// One stdout line from the tracker: landmark sets for each visible hand,
/// or an in-band error report.
#[derive(Debug, Deserialize)]
struct TrackerLine {
    #[serde(default)]
    hands: Vec<Vec<RawPoint>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    x: f32,
    y: f32,
    z: f32,
}

fn frame_from_hands(hands: Vec<Vec<RawPoint>>, timestamp_ms: f64) -> LandmarkFrame {
    // First hand wins; multi-hand fusion is not a goal.
    let points = hands
        .into_iter()
        .next()
        .map(|hand| {
            hand.into_iter()
                .map(|p| LandmarkPoint {
                    x: p.x,
                    y: p.y,
                    z: p.z,
                })
                .collect()
        })
        .unwrap_or_default();
    LandmarkFrame {
        points,
        timestamp_ms,
    }
}

/// Child process wrapper that releases the camera however the reader loop
/// ends.
struct TrackerChild(Child);

impl Drop for TrackerChild {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

/// External tracker: spawns `command`, waits for its `READY` line, then
/// parses one JSON frame per line. Malformed lines are skipped with a
/// warning; a dead stream is reported once as [`SourceEvent::Failed`].
pub struct TrackerSource {
    pub command: Vec<String>,
}

impl LandmarkSource for TrackerSource {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>) {
        let Some((program, args)) = self.command.split_first() else {
            let _ = tx.send(SourceEvent::Failed("empty tracker command".into()));
            return;
        };
        info!("starting tracker: {}", self.command.join(" "));

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn();
        let mut child = match child {
            Ok(c) => TrackerChild(c),
            Err(e) => {
                let _ = tx.send(SourceEvent::Failed(format!("spawning {program}: {e}")));
                return;
            }
        };
        let Some(stdout) = child.0.stdout.take() else {
            let _ = tx.send(SourceEvent::Failed("tracker stdout unavailable".into()));
            return;
        };

        let start = Instant::now();
        let mut ready = false;
        for line in BufReader::new(stdout).lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    warn!("tracker read error: {e}");
                    break;
                }
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if !ready {
                if line == "READY" {
                    ready = true;
                    info!("tracker ready");
                    if tx.send(SourceEvent::Ready).is_err() {
                        return;
                    }
                } else {
                    // Camera init chatter; keep it visible at debug level.
                    debug!("tracker start-up: {line}");
                }
                continue;
            }

            let ts = start.elapsed().as_secs_f64() * 1000.0;
            match serde_json::from_str::<TrackerLine>(line) {
                Ok(TrackerLine {
                    error: Some(report),
                    ..
                }) => warn!("tracker reported: {report}"),
                Ok(parsed) => {
                    if tx.send(SourceEvent::Frame(frame_from_hands(parsed.hands, ts))).is_err() {
                        return;
                    }
                }
                Err(e) => warn!("skipping malformed tracker line: {e}"),
            }
        }
        let _ = tx.send(SourceEvent::Failed("tracker stream ended".into()));
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_signal::extract;

    fn posture(x: f32, y: f32, rotation: f32, pinch: f32, fingers: u8) -> SimPosture {
        SimPosture {
            present: true,
            x,
            y,
            rotation,
            pinch,
            fingers,
        }
    }

    // ── synthesis → extraction round trip ────────────────────────────────────

    #[test]
    fn extraction_recovers_the_posture() {
        let positions = [(0.0, 0.0), (0.6, -0.4), (-1.0, 1.0)];
        let rotations = [-2.5, -0.9, 0.0, 1.2, 2.5];
        let pinches = [0.0, 0.3, 1.0];
        for &(x, y) in &positions {
            for &rot in &rotations {
                for &pinch in &pinches {
                    for fingers in 0..=5u8 {
                        let p = posture(x, y, rot, pinch, fingers);
                        let obs = extract(&synthesize_frame(&p, 0.0));
                        assert!(obs.present, "{p:?}");
                        assert!((obs.x - x).abs() < 1e-4, "{p:?} read x {}", obs.x);
                        assert!((obs.y - y).abs() < 1e-4, "{p:?} read y {}", obs.y);
                        assert!(
                            (obs.rotation - rot).abs() < 1e-4,
                            "{p:?} read rotation {}",
                            obs.rotation
                        );
                        assert!(
                            (obs.pinch - pinch).abs() < 1e-3,
                            "{p:?} read pinch {}",
                            obs.pinch
                        );
                        assert_eq!(obs.fingers, fingers, "{p:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn absent_posture_synthesizes_an_empty_frame() {
        let mut p = SimPosture::default();
        p.present = false;
        let frame = synthesize_frame(&p, 7.5);
        assert!(frame.points.is_empty());
        assert_eq!(frame.timestamp_ms, 7.5);
        assert!(!extract(&frame).present);
    }

    #[test]
    fn frames_carry_a_full_landmark_set() {
        let frame = synthesize_frame(&SimPosture::default(), 0.0);
        assert_eq!(frame.points.len(), landmark::COUNT);
        assert!(frame.points.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    // ── posture controls ─────────────────────────────────────────────────────

    #[test]
    fn controls_clamp_and_wrap() {
        let mut p = SimPosture::default();
        p.apply(SimInput::PinchDelta(2.0));
        assert_eq!(p.pinch, 1.0);
        p.apply(SimInput::PinchDelta(-3.0));
        assert_eq!(p.pinch, 0.0);

        p.apply(SimInput::CursorAt { x: 1.7, y: -2.0 });
        assert_eq!((p.x, p.y), (1.0, -1.0));

        p.apply(SimInput::RotateDelta(4.0));
        p.apply(SimInput::RotateDelta(4.0));
        assert!(p.rotation.abs() <= std::f32::consts::PI);

        p.apply(SimInput::Fingers(9));
        assert_eq!(p.fingers, 5);

        assert!(p.present);
        p.apply(SimInput::TogglePresence);
        assert!(!p.present);
    }

    // ── tracker wire format ──────────────────────────────────────────────────

    fn hand_json(frame: &LandmarkFrame) -> String {
        let pts: Vec<String> = frame
            .points
            .iter()
            .map(|p| format!(r#"{{"x":{},"y":{},"z":{}}}"#, p.x, p.y, p.z))
            .collect();
        format!("[{}]", pts.join(","))
    }

    fn wire_line(frame: &LandmarkFrame) -> String {
        format!(r#"{{"hands":[{}]}}"#, hand_json(frame))
    }

    #[test]
    fn wire_round_trip_preserves_the_hand() {
        let p = posture(0.25, -0.5, 0.8, 0.6, 3);
        let frame = synthesize_frame(&p, 42.0);
        let parsed: TrackerLine = serde_json::from_str(&wire_line(&frame)).unwrap();
        let rebuilt = frame_from_hands(parsed.hands, 42.0);
        let obs = extract(&rebuilt);
        assert_eq!(obs.fingers, 3);
        assert!((obs.x - 0.25).abs() < 1e-4);
        assert!((obs.pinch - 0.6).abs() < 1e-3);
    }

    #[test]
    fn no_hands_means_absent() {
        let parsed: TrackerLine = serde_json::from_str(r#"{"hands":[]}"#).unwrap();
        assert!(!extract(&frame_from_hands(parsed.hands, 0.0)).present);

        let parsed: TrackerLine = serde_json::from_str("{}").unwrap();
        assert!(!extract(&frame_from_hands(parsed.hands, 0.0)).present);
    }

    #[test]
    fn first_hand_wins() {
        let one = synthesize_frame(&posture(0.0, 0.0, 0.0, 0.5, 2), 0.0);
        let two = synthesize_frame(&posture(0.5, 0.5, 0.0, 0.5, 4), 0.0);
        let line = format!(r#"{{"hands":[{},{}]}}"#, hand_json(&one), hand_json(&two));
        let parsed: TrackerLine = serde_json::from_str(&line).unwrap();
        assert_eq!(extract(&frame_from_hands(parsed.hands, 0.0)).fingers, 2);
    }

    #[test]
    fn malformed_lines_are_errors() {
        assert!(serde_json::from_str::<TrackerLine>("garbage").is_err());
        assert!(serde_json::from_str::<TrackerLine>(r#"{"hands": "none"}"#).is_err());
    }

    #[test]
    fn error_reports_parse() {
        let parsed: TrackerLine = serde_json::from_str(r#"{"error":"camera in use"}"#).unwrap();
        assert_eq!(parsed.error.as_deref(), Some("camera in use"));
        assert!(parsed.hands.is_empty());
    }

    // ── sim source thread ────────────────────────────────────────────────────

    #[test]
    fn sim_source_streams_and_tracks_controls() {
        let (ctl_tx, ctl_rx) = mpsc::channel();
        let rx = spawn_source(SimSource { controls: ctl_rx });

        match rx.recv_timeout(Duration::from_secs(2)) {
            Ok(SourceEvent::Ready) => {}
            other => panic!("expected Ready, got {other:?}"),
        }

        ctl_tx.send(SimInput::Fingers(2)).unwrap();
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut saw_two = false;
        while Instant::now() < deadline {
            match rx.recv_timeout(Duration::from_millis(500)) {
                Ok(SourceEvent::Frame(frame)) => {
                    if extract(&frame).fingers == 2 {
                        saw_two = true;
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
        assert!(saw_two, "no frame reflected the finger-count control");
        drop(ctl_tx);
    }
}
