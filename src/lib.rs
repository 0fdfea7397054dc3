//! Tide Lights - a particle ocean with treasure hunting and fireworks
//!
//! Core modules:
//! - `sim`: Deterministic simulation (ocean field, firework pools, treasures, rewards)
//! - `input`: Input unifier (pointer and hand-gesture sources sharing one control surface)
//! - `camera`: Orbit camera rig and world-to-screen projection
//! - `render`: Instance buffers handed to an external render sink
//! - `session`: Screen flow and the fixed-timestep frame driver
//! - `platform`: Browser glue (camera capability, JS render bridge)
//! - `tuning`: Data-driven simulation constants
//! - `settings`: Persisted user preferences

pub mod camera;
pub mod color;
pub mod input;
pub mod platform;
pub mod render;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use session::{Screen, Session};
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

use glam::Vec3;

/// Scene configuration constants
pub mod consts {
    /// Fixed simulation timestep. Per-tick physics constants are tuned for 60 Hz.
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Cursor world extents: x spans [-25, 25], y spans [-15, 15]
    pub const CURSOR_WIDTH: f32 = 50.0;
    pub const CURSOR_HEIGHT: f32 = 30.0;

    /// Vertical offset of the ocean/firework group relative to the cursor plane
    pub const SCENE_OFFSET_Y: f32 = -18.0;

    /// Where hidden instances are parked so the instance buffer stays dense
    pub const HIDDEN_Y: f32 = -9999.0;

    /// Guard for divisions by lengths that may collapse to zero
    pub const EPSILON: f32 = 0.01;
}

/// Scene-group space (ocean, fireworks, treasures) to world space
#[inline]
pub fn scene_to_world(p: Vec3) -> Vec3 {
    p + Vec3::new(0.0, consts::SCENE_OFFSET_Y, 0.0)
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Smoothstep falloff of a normalized factor in [0, 1]: `3f² - 2f³`
#[inline]
pub fn smoothstep_falloff(f: f32) -> f32 {
    let f = f.clamp(0.0, 1.0);
    f * f * (3.0 - 2.0 * f)
}

/// `num / max(den, EPSILON)` so degenerate geometry never yields NaN or infinity
#[inline]
pub fn safe_ratio(num: f32, den: f32) -> f32 {
    num / den.max(consts::EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothstep_falloff_endpoints() {
        assert_eq!(smoothstep_falloff(0.0), 0.0);
        assert_eq!(smoothstep_falloff(1.0), 1.0);
        assert!((smoothstep_falloff(0.5) - 0.5).abs() < 1e-6);
        // Out-of-range input is clamped
        assert_eq!(smoothstep_falloff(2.0), 1.0);
    }

    #[test]
    fn test_safe_ratio_zero_denominator() {
        let r = safe_ratio(0.5, 0.0);
        assert!(r.is_finite());
        assert!((r - 50.0).abs() < 1e-3);
    }
}
