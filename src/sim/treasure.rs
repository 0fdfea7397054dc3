//! Treasure hunt
//!
//! Treasures float on the ocean surface. Hit testing is done in screen space:
//! both the treasure and the cursor are projected with the active camera, so
//! selection matches what is on screen regardless of perspective.
//!
//! Two variants:
//! - `Anchored`: three fixed anchors; a found treasure flies away and becomes
//!   collectible again after a cooldown.
//! - `Roaming`: eight random anchors; a found treasure disappears and respawns
//!   at a new random anchor after a short delay. Roaming treasures also carry
//!   a `reveal` amount driven by how close the pull focus is.

use glam::{Vec2, Vec3};
use rand::Rng;

use super::control::{ControlState, Gesture};
use super::ocean::OceanField;
use crate::camera::Projector;
use crate::color::{hex, mix, palette};
use crate::render::InstanceBuffer;
use crate::scene_to_world;
use crate::tuning::TreasureTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreasureVariant {
    #[default]
    Anchored,
    Roaming,
}

/// One collectible
#[derive(Debug, Clone)]
pub struct Treasure {
    /// Anchor on the ocean plane (x, z)
    pub anchor: Vec2,
    /// Extra height above the surface
    pub lift: f32,
    pub color: Vec3,
    pub emissive: Vec3,
    pub found: bool,
    /// Scene-clock time of the last collection
    pub found_time: f64,
    /// Smoothed hover amount in [0, 1]
    pub hover: f32,
    /// Smoothed visibility in [0, 1] (Roaming only)
    pub reveal: f32,
    /// Scene-group position this frame
    pub position: Vec3,
    /// Accumulated y rotation
    pub spin: f32,
    pub tilt: f32,
    pub scale: f32,
    /// Point-light intensity
    pub glow: f32,
    pub glow_color: Vec3,
}

impl Treasure {
    fn new(anchor: Vec2, lift: f32, color: Vec3, emissive: Vec3) -> Self {
        Self {
            anchor,
            lift,
            color,
            emissive,
            found: false,
            found_time: 0.0,
            hover: 0.0,
            reveal: 0.1,
            position: Vec3::new(anchor.x, 0.0, anchor.y),
            spin: 0.0,
            tilt: 0.0,
            scale: 1.0,
            glow: 5.0,
            glow_color: emissive,
        }
    }

    fn random_anchor<R: Rng + ?Sized>(rng: &mut R) -> (Vec2, f32) {
        (
            Vec2::new(
                (rng.random::<f32>() - 0.5) * 60.0,
                (rng.random::<f32>() - 0.5) * 50.0 - 20.0,
            ),
            rng.random::<f32>() * 4.0,
        )
    }
}

/// A treasure was collected this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collected {
    pub index: usize,
    pub time: f64,
}

/// The treasure set and its collection bookkeeping
#[derive(Debug, Clone)]
pub struct TreasureField {
    treasures: Vec<Treasure>,
    variant: TreasureVariant,
    collected: u32,
    tuning: TreasureTuning,
}

impl TreasureField {
    pub const ROAMING_COUNT: usize = 8;

    pub fn anchored(tuning: TreasureTuning) -> Self {
        let treasures = vec![
            Treasure::new(Vec2::new(-30.0, -15.0), 0.0, hex(0xFF8C00), hex(0xFFD700)),
            Treasure::new(Vec2::new(0.0, -20.0), 0.0, hex(0xFFD700), hex(0xFFFF00)),
            Treasure::new(Vec2::new(30.0, -25.0), 0.0, hex(0xFFA500), hex(0xFF8C00)),
        ];
        Self {
            treasures,
            variant: TreasureVariant::Anchored,
            collected: 0,
            tuning,
        }
    }

    pub fn roaming<R: Rng + ?Sized>(rng: &mut R, tuning: TreasureTuning) -> Self {
        let treasures = (0..Self::ROAMING_COUNT)
            .map(|_| {
                let (anchor, lift) = Treasure::random_anchor(rng);
                Treasure::new(anchor, lift, palette::GOLD, palette::GOLD)
            })
            .collect();
        Self {
            treasures,
            variant: TreasureVariant::Roaming,
            collected: 0,
            tuning,
        }
    }

    pub fn with_variant<R: Rng + ?Sized>(rng: &mut R, variant: TreasureVariant, tuning: TreasureTuning) -> Self {
        match variant {
            TreasureVariant::Anchored => Self::anchored(tuning),
            TreasureVariant::Roaming => Self::roaming(rng, tuning),
        }
    }

    pub fn variant(&self) -> TreasureVariant {
        self.variant
    }

    pub fn treasures(&self) -> &[Treasure] {
        &self.treasures
    }

    pub fn len(&self) -> usize {
        self.treasures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.treasures.is_empty()
    }

    /// Total collections this scene
    pub fn collected(&self) -> u32 {
        self.collected
    }

    /// Screen-space squared distance between the treasure and the cursor
    fn screen_distance_sq(world: Vec3, cursor: Vec2, projector: &dyn Projector) -> f32 {
        let a = projector.world_to_screen(world);
        let b = projector.world_to_screen(cursor.extend(0.0));
        a.distance_squared(b)
    }

    /// Advance every treasure one tick. Returns the collections made this tick.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        now: f64,
        dt: f32,
        ocean: &OceanField,
        control: &ControlState,
        projector: &dyn Projector,
    ) -> Vec<Collected> {
        let t = &self.tuning;
        let collecting = control.gesture.is_collect();
        let focus = ocean.pull_focus(control.cursor);
        let clock = now as f32;
        let mut events = Vec::new();

        for (index, tr) in self.treasures.iter_mut().enumerate() {
            // Expiry runs first, so a treasure freed this tick is collectable again in the same tick
            if tr.found {
                let elapsed = now - tr.found_time;
                match self.variant {
                    TreasureVariant::Anchored if elapsed > t.cooldown => tr.found = false,
                    TreasureVariant::Roaming if elapsed >= t.respawn_delay => {
                        let (anchor, lift) = Treasure::random_anchor(rng);
                        tr.anchor = anchor;
                        tr.lift = lift;
                        tr.found = false;
                        tr.reveal = 0.1;
                        tr.hover = 0.0;
                    }
                    _ => {}
                }
            }

            let float_y = ocean.surface_height(tr.anchor.x, tr.anchor.y) + t.float_offset + tr.lift;
            let rest = Vec3::new(tr.anchor.x, float_y, tr.anchor.y);

            let mut hovered = false;
            if !tr.found {
                let d = Self::screen_distance_sq(scene_to_world(rest), control.cursor, projector);
                if d < t.hover_threshold_sq {
                    hovered = true;
                    if collecting {
                        tr.found = true;
                        tr.found_time = now;
                        self.collected += 1;
                        events.push(Collected { index, time: now });
                        log::info!(
                            "Treasure {} collected with {} at {:.2}s (total {})",
                            index,
                            control.gesture.as_str(),
                            now,
                            self.collected
                        );
                    }
                }
            }

            let target = if hovered { 1.0 } else { 0.0 };
            tr.hover = (tr.hover + (target - tr.hover) * t.hover_smoothing).clamp(0.0, 1.0);

            if self.variant == TreasureVariant::Roaming {
                let dist = focus.distance(tr.anchor);
                let mut target_reveal = 0.2;
                if dist < t.reveal_radius {
                    let proximity = 1.0 - dist / t.reveal_radius;
                    let boost = match control.gesture {
                        Gesture::Pinch => 1.2,
                        Gesture::Grab => 1.0,
                        _ => 0.6,
                    };
                    target_reveal = f32::max(0.2, proximity * boost);
                }
                tr.reveal =
                    (tr.reveal + (target_reveal - tr.reveal) * t.reveal_smoothing).clamp(0.0, 1.0);
            }

            // Presentation
            if tr.found {
                let e = (now - tr.found_time) as f32;
                tr.position = rest + Vec3::Y * ((e * 4.0).sin() * 0.5 + e * 5.0);
                tr.spin += dt * 15.0;
                tr.tilt = (e * 10.0).sin() * 0.2;
                tr.scale = 1.5 + (e * 5.0).sin() * 0.5;
                tr.glow = 80.0;
                tr.glow_color = palette::TREASURE_FOUND_LIGHT;
            } else {
                tr.position = rest;
                tr.spin += dt * (1.5 + tr.hover * 5.0);
                tr.tilt = clock.sin() * 0.1;
                tr.scale = 1.0 + (clock * 2.0).sin() * 0.1 + tr.hover * 0.5;
                tr.glow = 5.0 + tr.hover * 20.0;
                tr.glow_color = if tr.hover > 0.5 {
                    mix(tr.emissive, Vec3::ONE, 0.5)
                } else {
                    tr.emissive
                };
            }
        }

        events
    }

    /// One instance per treasure. Roaming treasures hide while waiting to respawn.
    pub fn write_instances(&self, out: &mut InstanceBuffer) {
        out.resize(self.treasures.len());
        for (i, tr) in self.treasures.iter().enumerate() {
            if self.variant == TreasureVariant::Roaming && tr.found {
                out.hide(i);
                continue;
            }
            let brightness = match self.variant {
                TreasureVariant::Anchored => tr.glow / 20.0,
                TreasureVariant::Roaming => tr.reveal * 4.0 + 0.5,
            };
            out.set(
                i,
                scene_to_world(tr.position),
                Vec3::new(0.0, tr.spin, tr.tilt),
                tr.scale,
                mix(tr.color, tr.glow_color, 0.5) * brightness,
            );
        }
    }

    /// Back to the initial state, keeping the current anchors
    pub fn reset(&mut self) {
        for tr in &mut self.treasures {
            *tr = Treasure::new(tr.anchor, tr.lift, tr.color, tr.emissive);
        }
        self.collected = 0;
    }
}
