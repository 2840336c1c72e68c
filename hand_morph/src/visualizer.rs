//! Software-rendered view of the particle cloud, plus all window input.
//!
//! Layout: the cloud fills the window, seen from a fixed camera on the +z
//! axis; a two-line HUD strip along the bottom shows live status and the
//! key legend. Particles draw as half-bright additive splats, so dense
//! regions glow toward white.
//!
//! Input splits two ways: shape picks and color cycling come back to the
//! caller as [`UiCommand`]s, while simulated-hand controls go straight to
//! the sim source over its channel.

use std::sync::mpsc::Sender;

use minifb::{Key, KeyRepeat, MouseMode, Window, WindowOptions};
use particle_morph::color::Rgb;
use shape_cloud::ShapeId;

use crate::source::SimInput;

const BG_COLOR: u32 = 0xFF050505;
const HUD_BG: u32 = 0xFF101418;
const STATUS_COLOR: u32 = 0xFFD8D8D8;
const LEGEND_COLOR: u32 = 0xFF707880;
const HUD_H: usize = 28;

/// Camera distance from the origin along +z, matching the cloud's world
/// scale: a fully scaled shape at full translation stays in frame.
const CAMERA_Z: f32 = 8.0;
const FOV_DEG: f32 = 60.0;
const NEAR_PLANE: f32 = 0.1;

/// Per-frame roll applied while Q or E is held.
const ROLL_STEP: f32 = 0.045;
/// Pinch change per scroll unit.
const PINCH_STEP: f32 = 0.05;

const LEGEND: &str =
    "1-5=shape  c=color  mouse=move  scroll=pinch  q/e=rotate  f1-f5=fingers  g=fist  space=hand  esc=quit";

/// Immediate commands the window reports back to the app.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiCommand {
    SelectShape(ShapeId),
    CycleColor,
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf: Vec<u32>,
    width: usize,
    height: usize,
    sim_tx: Sender<SimInput>,
    last_cursor: Option<(f32, f32)>,
}

impl Visualizer {
    pub fn new(width: usize, height: usize, sim_tx: Sender<SimInput>) -> Result<Self, String> {
        let mut window = Window::new(
            "Hand Morph — Particle Shapes",
            width,
            height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| e.to_string())?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; width * height],
            width,
            height,
            sim_tx,
            last_cursor: None,
        })
    }

    /// Poll window input. UI commands come back in the vec; the bool goes
    /// false when the window closed or Esc asked to quit.
    pub fn poll_input(&mut self) -> (Vec<UiCommand>, bool) {
        let mut commands = Vec::new();
        if !self.window.is_open() || self.window.is_key_down(Key::Escape) {
            return (commands, false);
        }

        let shape_keys = [
            (Key::Key1, ShapeId::Heart),
            (Key::Key2, ShapeId::Rose),
            (Key::Key3, ShapeId::Planet),
            (Key::Key4, ShapeId::Figure),
            (Key::Key5, ShapeId::Burst),
        ];
        for (key, shape) in shape_keys {
            if self.window.is_key_pressed(key, KeyRepeat::No) {
                commands.push(UiCommand::SelectShape(shape));
            }
        }
        if self.window.is_key_pressed(Key::C, KeyRepeat::No) {
            commands.push(UiCommand::CycleColor);
        }

        // Everything below steers the simulated hand; with a real tracker
        // running nothing listens, and the sends drop silently.
        if self.window.is_key_pressed(Key::Space, KeyRepeat::No) {
            let _ = self.sim_tx.send(SimInput::TogglePresence);
        }
        let finger_keys = [
            (Key::F1, 1),
            (Key::F2, 2),
            (Key::F3, 3),
            (Key::F4, 4),
            (Key::F5, 5),
        ];
        for (key, n) in finger_keys {
            if self.window.is_key_pressed(key, KeyRepeat::No) {
                let _ = self.sim_tx.send(SimInput::Fingers(n));
            }
        }
        if self.window.is_key_pressed(Key::G, KeyRepeat::No) {
            let _ = self.sim_tx.send(SimInput::Fingers(0));
        }
        if self.window.is_key_down(Key::Q) {
            let _ = self.sim_tx.send(SimInput::RotateDelta(ROLL_STEP));
        }
        if self.window.is_key_down(Key::E) {
            let _ = self.sim_tx.send(SimInput::RotateDelta(-ROLL_STEP));
        }
        if let Some((_, scroll_y)) = self.window.get_scroll_wheel() {
            if scroll_y != 0.0 {
                let _ = self.sim_tx.send(SimInput::PinchDelta(scroll_y * PINCH_STEP));
            }
        }
        if let Some((mx, my)) = self.window.get_mouse_pos(MouseMode::Clamp) {
            let x = mx / self.width as f32 * 2.0 - 1.0;
            let y = -(my / self.height as f32 * 2.0 - 1.0);
            if self.last_cursor != Some((x, y)) {
                self.last_cursor = Some((x, y));
                let _ = self.sim_tx.send(SimInput::CursorAt { x, y });
            }
        }

        (commands, true)
    }

    /// Draw one frame: cloud, then the HUD strip over it.
    pub fn render(&mut self, positions: &[f32], yaw: f32, color: Rgb, status: &str) {
        self.buf.fill(BG_COLOR);

        let cam = Camera::new(yaw, self.width, self.height);
        let splat = (color.to_argb() >> 1) & 0x007F_7F7F;
        for p in positions.chunks_exact(3) {
            if let Some((x, y)) = cam.project([p[0], p[1], p[2]]) {
                let at = y * self.width + x;
                self.buf[at] = add_channels(self.buf[at], splat);
            }
        }

        let bar_y = self.height - HUD_H;
        self.fill_rect(0, bar_y, self.width, HUD_H, HUD_BG);
        self.draw_label(status, 10, bar_y + 6, STATUS_COLOR);
        self.draw_label(LEGEND, 10, bar_y + 17, LEGEND_COLOR);

        self.window
            .update_with_buffer(&self.buf, self.width, self.height)
            .ok();
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                self.buf[row * self.width + col] = color;
            }
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < self.width && y < self.height {
            self.buf[y * self.width + x] = color;
        }
    }

    /// 3×5 bitmap text, 4 px advance per character.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.set_pixel(cx + col, y + row, color);
                    }
                }
            }
            cx += 4;
            if cx + 4 > self.width {
                break;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Projection
// ════════════════════════════════════════════════════════════════════════════

/// Fixed perspective camera with the cloud's display yaw folded in.
struct Camera {
    sin_yaw: f32,
    cos_yaw: f32,
    focal: f32,
    half_w: f32,
    half_h: f32,
    width: f32,
    height: f32,
}

impl Camera {
    fn new(yaw: f32, width: usize, height: usize) -> Camera {
        let (sin_yaw, cos_yaw) = yaw.sin_cos();
        Camera {
            sin_yaw,
            cos_yaw,
            focal: height as f32 / 2.0 / (FOV_DEG.to_radians() / 2.0).tan(),
            half_w: width as f32 / 2.0,
            half_h: height as f32 / 2.0,
            width: width as f32,
            height: height as f32,
        }
    }

    /// World point → screen pixel, or None when culled.
    fn project(&self, p: [f32; 3]) -> Option<(usize, usize)> {
        // Yaw about the world y axis, then the camera looks down -z.
        let x = p[0] * self.cos_yaw + p[2] * self.sin_yaw;
        let z = -p[0] * self.sin_yaw + p[2] * self.cos_yaw;
        let depth = CAMERA_Z - z;
        if depth < NEAR_PLANE {
            return None;
        }
        let sx = self.half_w + x * self.focal / depth;
        let sy = self.half_h - p[1] * self.focal / depth;
        if sx < 0.0 || sy < 0.0 || sx >= self.width || sy >= self.height {
            return None;
        }
        Some((sx as usize, sy as usize))
    }
}

/// Per-channel saturating add: overlapping splats brighten toward white.
fn add_channels(px: u32, add: u32) -> u32 {
    let r = (((px >> 16) & 0xFF) + ((add >> 16) & 0xFF)).min(0xFF);
    let g = (((px >> 8) & 0xFF) + ((add >> 8) & 0xFF)).min(0xFF);
    let b = ((px & 0xFF) + (add & 0xFF)).min(0xFF);
    0xFF00_0000 | (r << 16) | (g << 8) | b
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c.to_ascii_lowercase() {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b011, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'b' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'd' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'f' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'g' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'h' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'k' => [0b101, 0b110, 0b100, 0b110, 0b101],
        'l' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'n' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'o' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'p' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'q' => [0b011, 0b101, 0b011, 0b001, 0b001],
        'r' => [0b110, 0b101, 0b110, 0b110, 0b101],
        's' => [0b011, 0b100, 0b010, 0b001, 0b110],
        't' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'x' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _ => [0b000, 0b000, 0b010, 0b000, 0b000],
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    // ── projection ───────────────────────────────────────────────────────────

    #[test]
    fn origin_lands_at_screen_center() {
        let cam = Camera::new(0.0, 960, 540);
        assert_eq!(cam.project([0.0, 0.0, 0.0]), Some((480, 270)));
    }

    #[test]
    fn axes_map_to_screen_directions() {
        let cam = Camera::new(0.0, 960, 540);
        let (rx, ry) = cam.project([1.0, 0.0, 0.0]).unwrap();
        assert!(rx > 480);
        assert_eq!(ry, 270);
        let (_, uy) = cam.project([0.0, 1.0, 0.0]).unwrap();
        assert!(uy < 270);
    }

    #[test]
    fn quarter_turn_swings_x_into_depth() {
        let cam = Camera::new(std::f32::consts::FRAC_PI_2, 960, 540);
        let (sx, sy) = cam.project([1.0, 0.0, 0.0]).unwrap();
        // +x rotates onto the depth axis: back to dead center, give or take
        // the trig epsilon landing either side of the pixel boundary.
        assert!((sx as i64 - 480).abs() <= 1);
        assert_eq!(sy, 270);
    }

    #[test]
    fn near_plane_and_frustum_cull() {
        let cam = Camera::new(0.0, 960, 540);
        assert_eq!(cam.project([0.0, 0.0, 100.0]), None);
        assert_eq!(cam.project([0.0, 0.0, 7.95]), None);
        assert_eq!(cam.project([100.0, 0.0, 0.0]), None);
        assert_eq!(cam.project([0.0, -100.0, 0.0]), None);
    }

    #[test]
    fn nearer_points_project_larger_offsets() {
        let cam = Camera::new(0.0, 960, 540);
        let (near_x, _) = cam.project([1.0, 0.0, 4.0]).unwrap();
        let (far_x, _) = cam.project([1.0, 0.0, -4.0]).unwrap();
        assert!(near_x > far_x);
    }

    // ── additive splats ──────────────────────────────────────────────────────

    #[test]
    fn additive_blend_saturates_per_channel() {
        let splat = 0x007F_7F00;
        let once = add_channels(0xFF050505, splat);
        assert_eq!(once, 0xFF848405);
        let twice = add_channels(once, splat);
        let thrice = add_channels(twice, splat);
        assert_eq!(thrice, 0xFFFFFF05);
    }

    // ── font ─────────────────────────────────────────────────────────────────

    #[test]
    fn hud_text_has_real_glyphs() {
        let fallback = char_glyph('\u{7f}');
        let samples = [
            LEGEND,
            "0123456789",
            "shape: digit 4  fingers: 4  pinch: 0.42  hold: locked",
            "waiting for landmark source...",
            "tracker failed - no hand",
        ];
        for text in samples {
            for c in text.chars().filter(|c| *c != ' ') {
                assert_ne!(char_glyph(c), fallback, "missing glyph for {c:?}");
            }
        }
    }

    #[test]
    fn uppercase_shares_lowercase_glyphs() {
        assert_eq!(char_glyph('A'), char_glyph('a'));
        assert_eq!(char_glyph('Z'), char_glyph('z'));
    }
}
