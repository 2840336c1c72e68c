//! # particle_morph
//!
//! Moves a fixed population of particles toward a target point cloud, with
//! the whole cloud steered by one [`HandObservation`].
//!
//! Every frame each particle's target is the rigid transform of its slot in
//! the current shape: rotate by palm roll, scale by pinch, translate by hand
//! position. Particles chase their targets with individually random lag, so
//! a shape switch melts one form into the next instead of teleporting.
//!
//! ## Quick start
//!
//! ```
//! use hand_signal::HandObservation;
//! use particle_morph::{EngineTuning, MorphEngine};
//! use shape_cloud::ShapeId;
//!
//! let mut engine = MorphEngine::new(ShapeId::Heart, 500, EngineTuning::default());
//! engine.step(&HandObservation::absent(), 1.0 / 60.0, 0.0);
//! assert_eq!(engine.positions().len(), 1500);
//! ```

use std::f32::consts::TAU;

use hand_signal::HandObservation;
use log::warn;
use rand::Rng;
use shape_cloud::ShapeId;

pub mod color;

// ════════════════════════════════════════════════════════════════════════════
// Tuning
// ════════════════════════════════════════════════════════════════════════════

/// Knobs for the hand-to-cloud mapping and the chase dynamics.
#[derive(Clone, Copy, Debug)]
pub struct EngineTuning {
    /// Cloud scale at pinch 0.
    pub scale_base: f32,
    /// Extra scale per unit of pinch.
    pub scale_spread: f32,
    /// World-units of cloud travel per unit of hand x / y.
    pub span_x: f32,
    pub span_y: f32,
    /// Per-particle chase speed range, units of "fraction of the remaining
    /// gap closed per second".
    pub speed_min: f32,
    pub speed_max: f32,
    /// Idle drift while no hand is tracked: amplitude and per-particle phase
    /// step of the vertical bob.
    pub bob_amplitude: f32,
    pub bob_phase: f32,
    /// How fast a digit shape's accumulated spin unwinds, per second.
    pub damp_rate: f32,
    /// Slow automatic spin for non-digit shapes, radians per second.
    pub spin_rate: f32,
}

impl Default for EngineTuning {
    fn default() -> EngineTuning {
        EngineTuning {
            scale_base: 0.2,
            scale_spread: 1.8,
            span_x: 4.0,
            span_y: 3.0,
            speed_min: 1.0,
            speed_max: 8.0,
            bob_amplitude: 0.1,
            bob_phase: 0.01,
            damp_rate: 3.0,
            spin_rate: 0.1,
        }
    }
}

impl EngineTuning {
    /// The pinch value whose scale is exactly 1.0, where an absent hand
    /// leaves the cloud.
    pub fn neutral_pinch(&self) -> f32 {
        (1.0 - self.scale_base) / self.scale_spread
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Engine
// ════════════════════════════════════════════════════════════════════════════

/// Particle population chasing a shaped target cloud.
///
/// Buffers are flat `[x0, y0, z0, x1, y1, z1, ..]` slabs; `positions()`
/// exposes the live one for rendering. The cloud's own yaw is kept here but
/// applied by the renderer, so target math stays in shape-local space.
pub struct MorphEngine {
    shape: ShapeId,
    count: usize,
    targets: Vec<f32>,
    /// Last target buffer known to hold `count` particles, kept for the
    /// frame a regeneration goes wrong.
    last_good: Vec<f32>,
    current: Vec<f32>,
    speeds: Vec<f32>,
    yaw: f32,
    rebuild: bool,
    tuning: EngineTuning,
}

impl MorphEngine {
    pub fn new(shape: ShapeId, count: usize, tuning: EngineTuning) -> MorphEngine {
        let targets = shape_cloud::generate(shape, count);
        let mut rng = rand::thread_rng();
        let speeds = (0..count)
            .map(|_| rng.gen_range(tuning.speed_min..tuning.speed_max))
            .collect();
        MorphEngine {
            shape,
            count,
            last_good: targets.clone(),
            targets,
            current: vec![0.0; count * 3],
            speeds,
            yaw: 0.0,
            rebuild: false,
            tuning,
        }
    }

    pub fn shape(&self) -> ShapeId {
        self.shape
    }

    pub fn particle_count(&self) -> usize {
        self.count
    }

    /// Live particle positions, `3 * particle_count()` floats.
    pub fn positions(&self) -> &[f32] {
        &self.current
    }

    /// Accumulated cloud yaw for the renderer to apply.
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn tuning(&self) -> &EngineTuning {
        &self.tuning
    }

    /// Switch the target shape. Live positions are untouched, so particles
    /// visibly migrate from wherever they are now.
    pub fn set_shape(&mut self, shape: ShapeId) {
        self.shape = shape;
        self.retarget();
    }

    fn retarget(&mut self) {
        self.targets = shape_cloud::generate(self.shape, self.count);
        if self.targets.len() == self.count * 3 {
            self.last_good.clone_from(&self.targets);
        }
    }

    /// Advance the cloud by `dt` seconds. `elapsed` is total run time, used
    /// to phase the idle bob.
    pub fn step(&mut self, obs: &HandObservation, dt: f32, elapsed: f32) {
        if self.rebuild {
            self.retarget();
            self.rebuild = false;
        }

        // A generator bug must cost at most one frame: fall back to the last
        // good buffer now, regenerate on the next step.
        let targets: &[f32] = if self.targets.len() == self.count * 3 {
            &self.targets
        } else {
            warn!(
                "target buffer holds {} floats for {} particles; reusing previous cloud",
                self.targets.len(),
                self.count
            );
            self.rebuild = true;
            &self.last_good
        };

        for i in 0..self.count {
            let at = i * 3;
            let aim = transform_point(
                [targets[at], targets[at + 1], targets[at + 2]],
                obs,
                &self.tuning,
                elapsed,
                i,
            );
            // First-order chase; the clamp keeps a long frame from
            // overshooting the target.
            let k = (self.speeds[i] * dt).min(1.0);
            self.current[at] += (aim[0] - self.current[at]) * k;
            self.current[at + 1] += (aim[1] - self.current[at + 1]) * k;
            self.current[at + 2] += (aim[2] - self.current[at + 2]) * k;
        }

        self.step_yaw(dt);
    }

    /// Digit glyphs are readable only face-on, so their yaw unwinds to zero;
    /// every other shape drifts in a slow show-off spin.
    fn step_yaw(&mut self, dt: f32) {
        if self.shape.is_digit() {
            if self.yaw.abs() > TAU {
                self.yaw %= TAU;
            }
            self.yaw *= 1.0 - (self.tuning.damp_rate * dt).min(1.0);
        } else {
            self.yaw += self.tuning.spin_rate * dt;
        }
    }
}

/// Where one particle's slot in the shape should sit right now: rotate by
/// palm roll, scale by pinch, translate by hand position. Without a hand the
/// shape rests at the origin at unit scale, bobbing gently.
fn transform_point(
    local: [f32; 3],
    obs: &HandObservation,
    tuning: &EngineTuning,
    elapsed: f32,
    index: usize,
) -> [f32; 3] {
    let [mut x, mut y, mut z] = local;

    if obs.present {
        let (sin_r, cos_r) = obs.rotation.sin_cos();
        let rx = x * cos_r - y * sin_r;
        let ry = x * sin_r + y * cos_r;
        x = rx;
        y = ry;
    }

    let scale = if obs.present {
        tuning.scale_base + obs.pinch * tuning.scale_spread
    } else {
        1.0
    };
    x *= scale;
    y *= scale;
    z *= scale;

    if obs.present {
        x += obs.x * tuning.span_x;
        y += obs.y * tuning.span_y;
    } else {
        y += (elapsed + index as f32 * tuning.bob_phase).sin() * tuning.bob_amplitude;
    }

    [x, y, z]
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const DT: f32 = 1.0 / 60.0;

    fn neutral_obs(tuning: &EngineTuning) -> HandObservation {
        HandObservation {
            present: true,
            pinch: tuning.neutral_pinch(),
            ..HandObservation::absent()
        }
    }

    // ── target transform ─────────────────────────────────────────────────────

    #[test]
    fn neutral_hand_is_identity() {
        let tuning = EngineTuning::default();
        let obs = neutral_obs(&tuning);
        let p = transform_point([0.3, -1.1, 0.7], &obs, &tuning, 0.0, 0);
        assert!((p[0] - 0.3).abs() < 1e-6);
        assert!((p[1] + 1.1).abs() < 1e-6);
        assert!((p[2] - 0.7).abs() < 1e-6);
    }

    #[test]
    fn pinch_maps_to_scale() {
        let tuning = EngineTuning::default();
        let mut obs = neutral_obs(&tuning);
        obs.pinch = 1.0;
        let p = transform_point([1.0, 0.0, -1.0], &obs, &tuning, 0.0, 0);
        assert!((p[0] - 2.0).abs() < 1e-6);
        assert!((p[2] + 2.0).abs() < 1e-6);
        obs.pinch = 0.0;
        let p = transform_point([1.0, 0.0, -1.0], &obs, &tuning, 0.0, 0);
        assert!((p[0] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn roll_rotates_in_plane_before_translation() {
        let tuning = EngineTuning::default();
        let mut obs = neutral_obs(&tuning);
        obs.rotation = FRAC_PI_2;
        obs.x = 0.5;
        let p = transform_point([1.0, 0.0, 0.0], &obs, &tuning, 0.0, 0);
        // A quarter turn sends +x to +y; the x offset lands afterward.
        assert!((p[0] - 0.5 * tuning.span_x).abs() < 1e-5);
        assert!((p[1] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn hand_position_translates_by_spans() {
        let tuning = EngineTuning::default();
        let mut obs = neutral_obs(&tuning);
        obs.x = -1.0;
        obs.y = 1.0;
        let p = transform_point([0.0, 0.0, 0.0], &obs, &tuning, 0.0, 0);
        assert!((p[0] + 4.0).abs() < 1e-6);
        assert!((p[1] - 3.0).abs() < 1e-6);
        assert_eq!(p[2], 0.0);
    }

    #[test]
    fn absent_hand_bobs_vertically() {
        let tuning = EngineTuning::default();
        let obs = HandObservation::absent();
        let rest = transform_point([0.0, 0.0, 0.0], &obs, &tuning, 0.0, 0);
        assert_eq!(rest[1], 0.0);
        let up = transform_point([0.0, 0.0, 0.0], &obs, &tuning, FRAC_PI_2, 0);
        assert!((up[1] - tuning.bob_amplitude).abs() < 1e-6);
        // Neighbors bob out of phase.
        let neighbor = transform_point([0.0, 0.0, 0.0], &obs, &tuning, FRAC_PI_2, 40);
        assert!((up[1] - neighbor[1]).abs() > 1e-6);
    }

    // ── chase dynamics ───────────────────────────────────────────────────────

    #[test]
    fn particles_start_at_origin_and_keep_buffer_length() {
        let engine = MorphEngine::new(ShapeId::Rose, 64, EngineTuning::default());
        assert_eq!(engine.positions().len(), 192);
        assert!(engine.positions().iter().all(|&v| v == 0.0));
        assert_eq!(engine.particle_count(), 64);
    }

    #[test]
    fn speeds_stay_in_configured_range() {
        let tuning = EngineTuning::default();
        let engine = MorphEngine::new(ShapeId::Heart, 256, tuning);
        assert!(engine
            .speeds
            .iter()
            .all(|&s| (tuning.speed_min..tuning.speed_max).contains(&s)));
    }

    #[test]
    fn gap_shrinks_monotonically_without_overshoot() {
        let tuning = EngineTuning::default();
        let obs = neutral_obs(&tuning);
        let mut engine = MorphEngine::new(ShapeId::Burst, 128, tuning);

        let mut gaps: Vec<f32> = engine
            .targets
            .iter()
            .zip(engine.current.iter())
            .map(|(t, c)| (t - c).abs())
            .collect();
        for _ in 0..240 {
            engine.step(&obs, DT, 0.0);
            for (gap, (t, c)) in gaps
                .iter_mut()
                .zip(engine.targets.iter().zip(engine.current.iter()))
            {
                let now = (t - c).abs();
                assert!(now <= *gap + 1e-5, "gap grew from {gap} to {now}");
                *gap = now;
            }
        }
        // Four seconds at speed >= 1.0 closes most of the distance.
        let worst = gaps.iter().cloned().fold(0.0f32, f32::max);
        assert!(worst < 0.1, "worst remaining gap {worst}");
    }

    #[test]
    fn long_frame_lands_exactly_on_target() {
        let tuning = EngineTuning::default();
        let obs = neutral_obs(&tuning);
        let mut engine = MorphEngine::new(ShapeId::Heart, 32, tuning);
        // speed * dt >= 1 for every particle: one step must finish the move.
        engine.step(&obs, 2.0, 0.0);
        for (t, c) in engine.targets.iter().zip(engine.current.iter()) {
            assert!((t - c).abs() < 1e-5);
        }
    }

    #[test]
    fn shape_switch_keeps_live_positions() {
        let tuning = EngineTuning::default();
        let obs = neutral_obs(&tuning);
        let mut engine = MorphEngine::new(ShapeId::Heart, 64, tuning);
        for _ in 0..30 {
            engine.step(&obs, DT, 0.0);
        }
        let before = engine.positions().to_vec();
        engine.set_shape(ShapeId::Digit4);
        assert_eq!(engine.shape(), ShapeId::Digit4);
        assert_eq!(engine.positions(), &before[..]);
    }

    // ── target buffer recovery ───────────────────────────────────────────────

    #[test]
    fn short_target_buffer_costs_one_frame() {
        let tuning = EngineTuning::default();
        let obs = neutral_obs(&tuning);
        let mut engine = MorphEngine::new(ShapeId::Planet, 64, tuning);
        engine.step(&obs, DT, 0.0);

        engine.targets.truncate(30);
        engine.step(&obs, DT, 0.0);
        assert!(engine.rebuild);
        assert!(engine.positions().iter().all(|v| v.is_finite()));

        // The next step regenerates a full buffer before easing.
        engine.step(&obs, DT, 0.0);
        assert!(!engine.rebuild);
        assert_eq!(engine.targets.len(), 192);
    }

    // ── yaw ──────────────────────────────────────────────────────────────────

    #[test]
    fn free_shapes_spin_slowly() {
        let tuning = EngineTuning::default();
        let mut engine = MorphEngine::new(ShapeId::Rose, 8, tuning);
        for _ in 0..60 {
            engine.step(&HandObservation::absent(), DT, 0.0);
        }
        assert!((engine.yaw() - tuning.spin_rate).abs() < 1e-4);
    }

    #[test]
    fn digit_yaw_unwinds_without_crossing_zero() {
        let mut engine = MorphEngine::new(ShapeId::Digit2, 8, EngineTuning::default());
        engine.yaw = 1.0;
        let mut previous = engine.yaw;
        for _ in 0..180 {
            engine.step(&HandObservation::absent(), DT, 0.0);
            assert!(engine.yaw >= 0.0);
            assert!(engine.yaw <= previous);
            previous = engine.yaw;
        }
        assert!(engine.yaw < 1e-3);
    }

    #[test]
    fn wound_up_yaw_is_normalized_before_unwinding() {
        let mut engine = MorphEngine::new(ShapeId::Digit1, 8, EngineTuning::default());
        engine.yaw = 10.0;
        engine.step(&HandObservation::absent(), DT, 0.0);
        assert!(engine.yaw.abs() < TAU);
        // 10 rad wraps to ~3.72 before damping, so it never unwinds the
        // long way around.
        assert!(engine.yaw < 4.0);
    }
}
