//! # shape_cloud
//!
//! Procedural point-cloud generators for every shape the particle system can
//! morph into. Each generator samples a bounded volume in shape-local space
//! and returns a flat `xyz` buffer; nothing here knows about hands, frames,
//! or rendering.
//!
//! The catalog:
//!
//! * **Free shapes** — heart, rose, planet, figure, burst. Selectable by the
//!   user at any time.
//! * **Digit glyphs** — flat numerals 1–4, built from weighted line/arc
//!   strokes. Shown while the matching finger count is held.
//!
//! ## Quick start
//!
//! ```rust
//! use shape_cloud::{generate, ShapeId};
//!
//! let cloud = generate(ShapeId::Heart, 8000);
//! assert_eq!(cloud.len(), 8000 * 3);
//! ```
//!
//! Generation is stochastic: two calls give different point sets drawn from
//! the same distribution. Callers that need a stable cloud keep the buffer.

use rand::rngs::ThreadRng;
use rand::Rng;
use std::f32::consts::{FRAC_PI_4, PI, TAU};

// ════════════════════════════════════════════════════════════════════════════
// ShapeId
// ════════════════════════════════════════════════════════════════════════════

/// Identifier for every shape in the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeId {
    Heart,
    Rose,
    Planet,
    Figure,
    Burst,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
}

impl ShapeId {
    /// Every shape, free shapes first.
    pub const ALL: [ShapeId; 9] = [
        ShapeId::Heart,
        ShapeId::Rose,
        ShapeId::Planet,
        ShapeId::Figure,
        ShapeId::Burst,
        ShapeId::Digit1,
        ShapeId::Digit2,
        ShapeId::Digit3,
        ShapeId::Digit4,
    ];

    /// The user-selectable shapes (digit glyphs are gesture-only).
    pub const FREE: [ShapeId; 5] = [
        ShapeId::Heart,
        ShapeId::Rose,
        ShapeId::Planet,
        ShapeId::Figure,
        ShapeId::Burst,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShapeId::Heart  => "heart",
            ShapeId::Rose   => "rose",
            ShapeId::Planet => "planet",
            ShapeId::Figure => "figure",
            ShapeId::Burst  => "burst",
            ShapeId::Digit1 => "digit 1",
            ShapeId::Digit2 => "digit 2",
            ShapeId::Digit3 => "digit 3",
            ShapeId::Digit4 => "digit 4",
        }
    }

    pub fn is_digit(self) -> bool {
        matches!(
            self,
            ShapeId::Digit1 | ShapeId::Digit2 | ShapeId::Digit3 | ShapeId::Digit4
        )
    }

    /// Digit glyph for an extended-finger count of 1–4. Other counts have no
    /// glyph and map to `None`.
    pub fn digit_for(count: u8) -> Option<ShapeId> {
        match count {
            1 => Some(ShapeId::Digit1),
            2 => Some(ShapeId::Digit2),
            3 => Some(ShapeId::Digit3),
            4 => Some(ShapeId::Digit4),
            _ => None,
        }
    }

    /// Upper bound on |coordinate| along any axis for this shape's cloud.
    /// Generators stay strictly inside; tests and layout code rely on it.
    pub fn extent(self) -> f32 {
        match self {
            ShapeId::Heart  => 2.2,
            ShapeId::Rose   => 2.4,
            ShapeId::Planet => 4.0,
            ShapeId::Figure => 2.5,
            ShapeId::Burst  => 4.0,
            ShapeId::Digit1
            | ShapeId::Digit2
            | ShapeId::Digit3
            | ShapeId::Digit4 => 1.5,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Generator trait + registry
// ════════════════════════════════════════════════════════════════════════════

/// A point-cloud sampling strategy for one shape.
pub trait Generator {
    /// Sample `count` points; returns a flat xyz buffer of length `3 * count`.
    fn generate(&self, count: usize) -> Vec<f32>;
}

/// Registry mapping a [`ShapeId`] to its sampling strategy.
pub fn generator(shape: ShapeId) -> &'static dyn Generator {
    match shape {
        ShapeId::Heart  => &HeartCurve,
        ShapeId::Rose   => &RoseBloom,
        ShapeId::Planet => &RingedPlanet,
        ShapeId::Figure => &SeatedFigure,
        ShapeId::Burst  => &BurstSphere,
        ShapeId::Digit1 => &DIGIT_ONE,
        ShapeId::Digit2 => &DIGIT_TWO,
        ShapeId::Digit3 => &DIGIT_THREE,
        ShapeId::Digit4 => &DIGIT_FOUR,
    }
}

/// Sample a fresh target cloud for `shape`.
pub fn generate(shape: ShapeId, count: usize) -> Vec<f32> {
    generator(shape).generate(count)
}

// ── shared sampling helpers ──────────────────────────────────────────────────

fn collect_points(
    count: usize,
    mut sample: impl FnMut(&mut ThreadRng) -> [f32; 3],
) -> Vec<f32> {
    let mut rng = rand::thread_rng();
    let mut out = Vec::with_capacity(count * 3);
    for _ in 0..count {
        out.extend_from_slice(&sample(&mut rng));
    }
    out
}

/// Uniform direction on the unit sphere.
fn sphere_dir(rng: &mut ThreadRng) -> [f32; 3] {
    let theta = rng.gen::<f32>() * TAU;
    let phi = (2.0 * rng.gen::<f32>() - 1.0).acos();
    [
        phi.sin() * theta.cos(),
        phi.sin() * theta.sin(),
        phi.cos(),
    ]
}

// ════════════════════════════════════════════════════════════════════════════
// Free shapes
// ════════════════════════════════════════════════════════════════════════════

/// Classic parametric heart, filled toward the center and extruded in z.
pub struct HeartCurve;

impl Generator for HeartCurve {
    fn generate(&self, count: usize) -> Vec<f32> {
        collect_points(count, |rng| {
            let t = rng.gen::<f32>() * TAU;
            // Bias the radial fill outward so the outline stays crisp.
            let r = rng.gen::<f32>().powf(0.3);
            let x = 16.0 * t.sin().powi(3);
            let y = 13.0 * t.cos()
                - 5.0 * (2.0 * t).cos()
                - 2.0 * (3.0 * t).cos()
                - (4.0 * t).cos();
            let z = (rng.gen::<f32>() - 0.5) * 4.0;
            [x * 0.1 * r, y * 0.1 * r, z * r]
        })
    }
}

/// Eight-petal rose curve `r = cos 4θ + 2`, filled radially, petals thinning
/// in z toward the rim.
pub struct RoseBloom;

impl Generator for RoseBloom {
    fn generate(&self, count: usize) -> Vec<f32> {
        collect_points(count, |rng| {
            let theta = rng.gen::<f32>() * TAU;
            let r = (4.0 * theta).cos() + 2.0;
            let dist = r * rng.gen::<f32>() * 0.8;
            [
                dist * theta.cos(),
                dist * theta.sin(),
                (rng.gen::<f32>() - 0.5) * 1.5 * (-dist * 0.5).exp(),
            ]
        })
    }
}

/// Solid ball with a flat annular ring, Saturn style.
pub struct RingedPlanet;

/// Fraction of planet points placed on the ring rather than the ball.
const RING_FRACTION: f32 = 0.4;

impl Generator for RingedPlanet {
    fn generate(&self, count: usize) -> Vec<f32> {
        collect_points(count, |rng| {
            if rng.gen::<f32>() < RING_FRACTION {
                let theta = rng.gen::<f32>() * TAU;
                let radius = 2.5 + rng.gen::<f32>() * 1.5;
                [
                    radius * theta.cos(),
                    (rng.gen::<f32>() - 0.5) * 0.2,
                    radius * theta.sin(),
                ]
            } else {
                let r = 1.5 * rng.gen::<f32>().cbrt();
                let d = sphere_dir(rng);
                [r * d[0], r * d[1], r * d[2]]
            }
        })
    }
}

/// Seated humanoid assembled from three weighted sub-regions: a head sphere,
/// a tapered torso, and a squashed torus for the crossed legs. Each point
/// picks its region independently so the parts stay proportioned at any
/// particle count.
pub struct SeatedFigure;

impl Generator for SeatedFigure {
    fn generate(&self, count: usize) -> Vec<f32> {
        collect_points(count, |rng| {
            let part = rng.gen::<f32>();
            if part < 0.2 {
                // Head: sphere surface above the torso.
                let d = sphere_dir(rng);
                [0.5 * d[0], 0.5 * d[1] + 1.8, 0.5 * d[2]]
            } else if part < 0.6 {
                // Torso: cylinder tapering toward the shoulders.
                let y = rng.gen::<f32>() * 2.0;
                let radius_at_y = 1.0 - y * 0.2;
                let theta = rng.gen::<f32>() * TAU;
                let r = rng.gen::<f32>().sqrt() * radius_at_y;
                [r * theta.cos(), y - 0.5, r * theta.sin()]
            } else {
                // Legs: solid torus, squashed in z for the crossed pose.
                let theta = rng.gen::<f32>() * TAU;
                let phi = rng.gen::<f32>() * TAU;
                let tr = 0.4 * rng.gen::<f32>().sqrt();
                let ring = 1.2 + tr * phi.cos();
                [
                    ring * theta.cos(),
                    tr * phi.sin() - 0.5,
                    ring * theta.sin() * 0.6,
                ]
            }
        })
    }
}

/// Uniform explosion ball, radius 4.
pub struct BurstSphere;

impl Generator for BurstSphere {
    fn generate(&self, count: usize) -> Vec<f32> {
        collect_points(count, |rng| {
            let r = 4.0 * rng.gen::<f32>().cbrt();
            let d = sphere_dir(rng);
            [r * d[0], r * d[1], r * d[2]]
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Digit glyphs
// ════════════════════════════════════════════════════════════════════════════

/// One stroke of a glyph: a 2D path, a pick weight, and a transverse band
/// width (0 = sample the path exactly).
struct Stroke {
    weight: f32,
    width:  f32,
    path:   Path,
}

enum Path {
    Line { ax: f32, ay: f32, bx: f32, by: f32 },
    Arc  { cx: f32, cy: f32, radius: f32, start: f32, sweep: f32 },
}

/// Flat numeral sampled from weighted strokes, jittered in depth.
pub struct DigitGlyph {
    strokes: &'static [Stroke],
    depth:   f32,
}

impl DigitGlyph {
    fn pick(&self, roll: f32) -> &'static Stroke {
        let mut acc = 0.0;
        for stroke in self.strokes {
            acc += stroke.weight;
            if roll < acc {
                return stroke;
            }
        }
        // Float round-off can leave roll a hair past the final bucket.
        &self.strokes[self.strokes.len() - 1]
    }
}

impl Generator for DigitGlyph {
    fn generate(&self, count: usize) -> Vec<f32> {
        collect_points(count, |rng| {
            let stroke = self.pick(rng.gen::<f32>());
            let (px, py, nx, ny) = match stroke.path {
                Path::Line { ax, ay, bx, by } => {
                    let u = rng.gen::<f32>();
                    let (dx, dy) = (bx - ax, by - ay);
                    let len = (dx * dx + dy * dy).sqrt();
                    (ax + dx * u, ay + dy * u, -dy / len, dx / len)
                }
                Path::Arc { cx, cy, radius, start, sweep } => {
                    let theta = start + rng.gen::<f32>() * sweep;
                    (
                        cx + radius * theta.cos(),
                        cy + radius * theta.sin(),
                        theta.cos(),
                        theta.sin(),
                    )
                }
            };
            let (x, y) = if stroke.width > 0.0 {
                let off = (rng.gen::<f32>() - 0.5) * stroke.width;
                (px + nx * off, py + ny * off)
            } else {
                (px, py)
            };
            [x, y, (rng.gen::<f32>() - 0.5) * self.depth]
        })
    }
}

static DIGIT_ONE: DigitGlyph = DigitGlyph {
    depth: 0.5,
    strokes: &[Stroke {
        weight: 1.0,
        width:  0.5,
        path:   Path::Line { ax: 0.0, ay: -1.25, bx: 0.0, by: 1.25 },
    }],
};

static DIGIT_TWO: DigitGlyph = DigitGlyph {
    depth: 0.4,
    strokes: &[
        Stroke {
            weight: 0.4,
            width:  0.0,
            path:   Path::Arc { cx: 0.0, cy: 0.5, radius: 0.7, start: 0.0, sweep: PI },
        },
        Stroke {
            weight: 0.3,
            width:  0.0,
            path:   Path::Line { ax: 0.7, ay: 0.5, bx: -0.7, by: -1.0 },
        },
        Stroke {
            weight: 0.3,
            width:  0.0,
            path:   Path::Line { ax: -0.7, ay: -1.0, bx: 0.7, by: -1.0 },
        },
    ],
};

static DIGIT_THREE: DigitGlyph = DigitGlyph {
    depth: 0.4,
    strokes: &[
        Stroke {
            weight: 0.5,
            width:  0.0,
            path:   Path::Arc { cx: 0.0, cy: 0.6, radius: 0.6, start: -FRAC_PI_4, sweep: 1.25 * PI },
        },
        Stroke {
            weight: 0.5,
            width:  0.0,
            path:   Path::Arc { cx: 0.0, cy: -0.6, radius: 0.7, start: -PI, sweep: 1.25 * PI },
        },
    ],
};

static DIGIT_FOUR: DigitGlyph = DigitGlyph {
    depth: 0.4,
    strokes: &[
        Stroke {
            weight: 0.4,
            width:  0.2,
            path:   Path::Line { ax: 0.6, ay: -1.2, bx: 0.6, by: 1.2 },
        },
        Stroke {
            weight: 0.3,
            width:  0.0,
            path:   Path::Line { ax: -0.5, ay: 1.0, bx: 0.5, by: -0.2 },
        },
        Stroke {
            weight: 0.3,
            width:  0.2,
            path:   Path::Line { ax: -0.6, ay: -0.1, bx: 0.8, by: -0.1 },
        },
    ],
};

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
