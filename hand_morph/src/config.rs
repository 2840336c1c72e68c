//! TOML profile: stability, engine and display tunables in one file, every
//! key optional.
//!
//! ```toml
//! [stability]
//! hold_ms = 300.0
//!
//! [engine]
//! particle_count = 12000
//!
//! [display]
//! base_color = "#ff00ff"
//! ```

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use hand_signal::StabilityParams;
use particle_morph::color::Rgb;
use particle_morph::EngineTuning;
use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Profile {
    pub stability: StabilitySection,
    pub engine: EngineSection,
    pub display: DisplaySection,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StabilitySection {
    pub speed_threshold: f64,
    pub hold_ms: f64,
    pub pad_ms: f64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSection {
    pub particle_count: usize,
    pub scale_base: f32,
    pub scale_spread: f32,
    pub span_x: f32,
    pub span_y: f32,
    pub speed_min: f32,
    pub speed_max: f32,
    pub bob_amplitude: f32,
    pub bob_phase: f32,
    pub damp_rate: f32,
    pub spin_rate: f32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplaySection {
    pub width: usize,
    pub height: usize,
    pub base_color: String,
}

impl Default for StabilitySection {
    fn default() -> StabilitySection {
        let p = StabilityParams::default();
        StabilitySection {
            speed_threshold: p.speed_threshold,
            hold_ms: p.hold_ms,
            pad_ms: p.pad_ms,
        }
    }
}

impl Default for EngineSection {
    fn default() -> EngineSection {
        let t = EngineTuning::default();
        EngineSection {
            particle_count: 8000,
            scale_base: t.scale_base,
            scale_spread: t.scale_spread,
            span_x: t.span_x,
            span_y: t.span_y,
            speed_min: t.speed_min,
            speed_max: t.speed_max,
            bob_amplitude: t.bob_amplitude,
            bob_phase: t.bob_phase,
            damp_rate: t.damp_rate,
            spin_rate: t.spin_rate,
        }
    }
}

impl Default for DisplaySection {
    fn default() -> DisplaySection {
        DisplaySection {
            width: 960,
            height: 540,
            base_color: "#00ffff".to_string(),
        }
    }
}

impl StabilitySection {
    pub fn params(&self) -> StabilityParams {
        StabilityParams {
            speed_threshold: self.speed_threshold,
            hold_ms: self.hold_ms,
            pad_ms: self.pad_ms,
        }
    }
}

impl EngineSection {
    pub fn tuning(&self) -> EngineTuning {
        EngineTuning {
            scale_base: self.scale_base,
            scale_spread: self.scale_spread,
            span_x: self.span_x,
            span_y: self.span_y,
            speed_min: self.speed_min,
            speed_max: self.speed_max,
            bob_amplitude: self.bob_amplitude,
            bob_phase: self.bob_phase,
            damp_rate: self.damp_rate,
            spin_rate: self.spin_rate,
        }
    }
}

impl DisplaySection {
    /// Parsed base color; validation has already rejected bad strings, so a
    /// fallback here only covers hand-built profiles.
    pub fn color(&self) -> Rgb {
        Rgb::from_hex(&self.base_color).unwrap_or(Rgb {
            r: 0x00,
            g: 0xFF,
            b: 0xFF,
        })
    }
}

impl Profile {
    pub fn load(path: &Path) -> Result<Profile> {
        let text =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let profile: Profile = toml::from_str(&text).context("parsing profile")?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<()> {
        let s = &self.stability;
        if !(s.speed_threshold > 0.0) {
            bail!("stability.speed_threshold must be positive");
        }
        if !(s.hold_ms > 0.0) {
            bail!("stability.hold_ms must be positive");
        }
        if s.pad_ms < 0.0 {
            bail!("stability.pad_ms must not be negative");
        }

        let e = &self.engine;
        if e.particle_count == 0 {
            bail!("engine.particle_count must be at least 1");
        }
        if !(e.speed_min > 0.0 && e.speed_max > e.speed_min) {
            bail!("engine speed range must satisfy 0 < speed_min < speed_max");
        }
        if !(e.scale_base > 0.0 && e.scale_spread > 0.0) {
            bail!("engine scale mapping must be positive");
        }
        if !(e.span_x.is_finite() && e.span_y.is_finite()) {
            bail!("engine spans must be finite");
        }

        let d = &self.display;
        if d.width < 320 || d.height < 240 {
            bail!("display window must be at least 320x240");
        }
        if Rgb::from_hex(&d.base_color).is_none() {
            bail!("display.base_color must be #rrggbb, got {:?}", d.base_color);
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
