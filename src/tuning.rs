//! Data-driven simulation tuning
//!
//! Every magic number the simulation depends on lives here so it can be
//! overridden from JSON. Defaults reproduce the shipped feel; none of them are
//! derived from first principles.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while loading a tuning document
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning JSON could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning: {0}")]
    Invalid(String),
}

/// Hand-gesture classifier and mapping constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureTuning {
    /// GRAB when mean fingertip distance / palm length falls below this
    pub grab_ratio: f32,
    /// PINCH when thumb-index distance (normalized units) falls below this
    pub pinch_distance: f32,
    /// Per-frame smoothing of wrist x/y and hand scale
    pub smoothing: f32,
    /// Per-frame smoothing of the cursor toward the index fingertip
    pub cursor_smoothing: f32,
    /// Hand scale that maps to the neutral ocean speed
    pub neutral_scale: f32,
    pub speed_gain_up: f32,
    pub speed_gain_down: f32,
    pub speed_min: f32,
    pub speed_max: f32,
    pub height_base: f32,
    pub height_gain: f32,
    /// Minimum seconds between two GRAB-triggered launches
    pub fire_cooldown: f64,
    /// Ocean speed restored when no hand is visible
    pub idle_speed: f32,
    /// Wave height restored when no hand is visible
    pub idle_wave_height: f32,
}

impl Default for GestureTuning {
    fn default() -> Self {
        Self {
            grab_ratio: 1.4,
            pinch_distance: 0.08,
            smoothing: 0.1,
            cursor_smoothing: 0.2,
            neutral_scale: 0.22,
            speed_gain_up: 35.0,
            speed_gain_down: 40.0,
            speed_min: -4.0,
            speed_max: 12.0,
            height_base: 0.2,
            height_gain: 3.0,
            fire_cooldown: 0.8,
            idle_speed: 1.0,
            idle_wave_height: 0.8,
        }
    }
}

/// Firework pool constants. Physics values are per 60 Hz tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FireworkTuning {
    pub rocket_capacity: usize,
    pub spark_capacity: usize,
    pub gravity: f32,
    pub spark_drag: f32,
    pub rocket_drag: f32,
    pub emissive_boost: f32,
    pub launch_y: f32,
    pub min_explosion_y: f32,
    pub max_explosion_y: f32,
    /// A rocket slower than this (vertical) has reached apex and triggers detonation
    pub apex_velocity: f32,
    /// Rockets slower than this are detonated along with the apex rocket
    pub near_apex_velocity: f32,
    /// Added to the rocket count when slicing the spark pool
    pub slice_margin: usize,
    pub main_blast: f32,
    pub sub_blast: f32,
    pub white_spark_chance: f32,
    pub trail_life: f32,
    pub trail_decay: f32,
    /// Sparks below this life may be stolen for a new trail
    pub trail_reuse_life: f32,
    /// Explosion sparks keep full intensity above this life
    pub intensity_knee: f32,
    /// Seconds between forced salvo launches
    pub salvo_interval: f32,
    pub auto_launch_min: f32,
    pub auto_launch_max: f32,
}

impl Default for FireworkTuning {
    fn default() -> Self {
        Self {
            rocket_capacity: 100,
            spark_capacity: 3500,
            gravity: 0.005,
            spark_drag: 0.96,
            rocket_drag: 0.98,
            emissive_boost: 3.0,
            launch_y: -4.0,
            min_explosion_y: 20.0,
            max_explosion_y: 35.0,
            apex_velocity: 0.1,
            near_apex_velocity: 0.2,
            slice_margin: 5,
            main_blast: 0.6,
            sub_blast: 0.4,
            white_spark_chance: 0.15,
            trail_life: 0.4,
            trail_decay: 0.05,
            trail_reuse_life: 0.2,
            intensity_knee: 0.7,
            salvo_interval: 0.1,
            auto_launch_min: 0.5,
            auto_launch_max: 1.5,
        }
    }
}

/// Ocean field constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OceanTuning {
    pub particle_count: usize,
    pub rotation_smoothing: f32,
    pub height_smoothing: f32,
    pub initial_speed: f32,
    pub initial_height: f32,
    /// Resting height of the surface in local coordinates
    pub base_y: f32,
    pub pinch_radius: f32,
    pub pinch_lift: f32,
    pub pinch_spread: f32,
    pub highlight_blend: f32,
    /// Cursor → pinch focus mapping: `x * scale`, `(y - offset) * -scale`
    pub pinch_focus_scale: f32,
    pub pinch_focus_offset: f32,
}

impl Default for OceanTuning {
    fn default() -> Self {
        Self {
            particle_count: 15000,
            rotation_smoothing: 0.1,
            height_smoothing: 0.05,
            initial_speed: 2.0,
            initial_height: 1.0,
            base_y: -5.0,
            pinch_radius: 15.0,
            pinch_lift: 4.0,
            pinch_spread: 0.2,
            highlight_blend: 0.5,
            pinch_focus_scale: 5.0,
            pinch_focus_offset: 2.5,
        }
    }
}

/// Treasure hit-testing and lifecycle constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TreasureTuning {
    /// Squared NDC distance below which the cursor hovers a treasure
    pub hover_threshold_sq: f32,
    pub hover_smoothing: f32,
    pub reveal_smoothing: f32,
    /// Anchored variant: seconds until a found treasure is collectible again
    pub cooldown: f64,
    /// Roaming variant: seconds until a found treasure reappears elsewhere
    pub respawn_delay: f64,
    pub float_offset: f32,
    /// World radius (around the pinch focus) in which roaming treasures reveal
    pub reveal_radius: f32,
}

impl Default for TreasureTuning {
    fn default() -> Self {
        Self {
            hover_threshold_sq: 0.015,
            hover_smoothing: 0.2,
            reveal_smoothing: 0.1,
            cooldown: 20.0,
            respawn_delay: 3.0,
            float_offset: 0.3,
            reveal_radius: 15.0,
        }
    }
}

/// Reward sequence timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardTuning {
    /// Seconds of CONTINUOUS fireworks
    pub duration: f64,
    /// Seconds the celebration banner stays open (closes before the fireworks end)
    pub banner_duration: f64,
    /// Forced launches queued per reward
    pub salvo_count: u32,
}

impl Default for RewardTuning {
    fn default() -> Self {
        Self {
            duration: 20.0,
            banner_duration: 18.0,
            salvo_count: 30,
        }
    }
}

/// Complete tuning document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub gesture: GestureTuning,
    pub fireworks: FireworkTuning,
    pub ocean: OceanTuning,
    pub treasure: TreasureTuning,
    pub reward: RewardTuning,
}

impl Tuning {
    /// Parse a (possibly partial) tuning document; missing fields keep defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let fw = &self.fireworks;
        if fw.rocket_capacity == 0 || fw.spark_capacity == 0 {
            return Err(TuningError::Invalid("pool capacities must be non-zero".into()));
        }
        if fw.min_explosion_y > fw.max_explosion_y {
            return Err(TuningError::Invalid("explosion band is inverted".into()));
        }
        if fw.auto_launch_min > fw.auto_launch_max {
            return Err(TuningError::Invalid("auto-launch interval is inverted".into()));
        }
        if !(0.0..1.0).contains(&fw.intensity_knee) || fw.intensity_knee == 0.0 {
            return Err(TuningError::Invalid("intensity knee must be in (0, 1)".into()));
        }
        let g = &self.gesture;
        if g.speed_min > g.speed_max {
            return Err(TuningError::Invalid("speed clamp is inverted".into()));
        }
        if g.fire_cooldown < 0.0 {
            return Err(TuningError::Invalid("fire cooldown must be non-negative".into()));
        }
        let r = &self.reward;
        if r.duration < 0.0 || r.banner_duration < 0.0 || r.banner_duration > r.duration {
            return Err(TuningError::Invalid(
                "banner must close within the reward duration".into(),
            ));
        }
        if self.ocean.pinch_radius <= 0.0 {
            return Err(TuningError::Invalid("pinch radius must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "fireworks": { "rocket_capacity": 12 } }"#).unwrap();
        assert_eq!(tuning.fireworks.rocket_capacity, 12);
        assert_eq!(tuning.fireworks.spark_capacity, 3500);
        assert_eq!(tuning.reward.salvo_count, 30);
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = Tuning::from_json("{ not json").unwrap_err();
        assert!(matches!(err, TuningError::Parse(_)));
    }

    #[test]
    fn test_banner_longer_than_reward_rejected() {
        let err = Tuning::from_json(r#"{ "reward": { "duration": 5.0, "banner_duration": 6.0 } }"#)
            .unwrap_err();
        assert!(matches!(err, TuningError::Invalid(_)));
    }
}
