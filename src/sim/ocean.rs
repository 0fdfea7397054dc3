//! Ocean field
//!
//! A fixed population of particles whose pose is a pure function of immutable
//! base attributes, the ocean clock and the smoothed flow controls. Nothing
//! per particle is integrated, so the field can be evaluated at any time.
//! Poses are in scene-group space (the group sits `SCENE_OFFSET_Y` below the
//! cursor plane).

use glam::{Vec2, Vec3};
use rand::Rng;

use crate::color::{mix, palette};
use crate::render::InstanceBuffer;
use crate::{scene_to_world, smoothstep_falloff};
use crate::tuning::OceanTuning;

/// Immutable per-particle attributes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OceanParticle {
    pub x: f32,
    pub z: f32,
    /// Static vertical jitter seed in [0, 0.8]
    pub noise: f32,
    pub scale: f32,
}

impl OceanParticle {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            x: (rng.random::<f32>() - 0.5) * 160.0,
            z: rng.random::<f32>() * 70.0 - 60.0,
            noise: rng.random::<f32>() * 0.8,
            scale: rng.random::<f32>() * 0.5 + 0.8,
        }
    }
}

/// One traveling plane wave: `(spatial frequency, amplitude factor, temporal frequency, horizontal share)`
#[derive(Debug, Clone, Copy)]
struct Wave {
    k: f32,
    amp: f32,
    omega: f32,
    horizontal: f32,
}

const WAVES: [Wave; 3] = [
    Wave { k: 0.12, amp: 2.0, omega: 0.8, horizontal: 1.0 },
    Wave { k: 0.35, amp: 0.8, omega: 1.3, horizontal: 0.7 },
    Wave { k: 0.80, amp: 0.4, omega: 2.0, horizontal: 0.5 },
];

/// Displaced particle for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OceanPose {
    pub position: Vec3,
    pub scale: f32,
    pub color: Vec3,
    /// Pinch-pull weight in [0, 1]
    pub pull: f32,
}

/// Collect-gesture deformation centered under the cursor
#[derive(Debug, Clone, Copy)]
pub struct Pull {
    pub focus: Vec2,
}

/// Ocean field state and controls
#[derive(Debug, Clone)]
pub struct OceanField {
    particles: Vec<OceanParticle>,
    /// Raw control targets (written by commands)
    target_rotation: f32,
    target_height: f32,
    speed: f32,
    /// Smoothed values used by the wave math
    rotation: f32,
    height: f32,
    time: f32,
    tuning: OceanTuning,
}

impl OceanField {
    /// Random population sized by `tuning.particle_count`
    pub fn new<R: Rng + ?Sized>(rng: &mut R, tuning: OceanTuning) -> Self {
        let particles = (0..tuning.particle_count)
            .map(|_| OceanParticle::random(rng))
            .collect();
        Self::from_particles(particles, tuning)
    }

    pub fn from_particles(particles: Vec<OceanParticle>, tuning: OceanTuning) -> Self {
        Self {
            particles,
            target_rotation: 0.0,
            target_height: tuning.initial_height,
            speed: tuning.initial_speed,
            rotation: 0.0,
            height: tuning.initial_height,
            time: 0.0,
            tuning,
        }
    }

    pub fn particles(&self) -> &[OceanParticle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Ocean clock (advances at `dt * speed`)
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn set_wave_height(&mut self, height: f32) {
        self.target_height = height;
    }

    pub fn set_flow(&mut self, rotation: f32) {
        self.target_rotation = rotation;
    }

    /// Smooth the controls toward their targets and advance the ocean clock
    pub fn advance(&mut self, dt: f32) {
        self.rotation += (self.target_rotation - self.rotation) * self.tuning.rotation_smoothing;
        self.height += (self.target_height - self.height) * self.tuning.height_smoothing;
        self.time += dt * self.speed;
    }

    /// Snap the smoothed controls to their targets
    pub fn settle_controls(&mut self) {
        self.rotation = self.target_rotation;
        self.height = self.target_height;
    }

    fn direction(&self) -> Vec2 {
        Vec2::new(self.rotation.cos(), self.rotation.sin())
    }

    /// Second wave travels along the flow direction rotated by ~24 degrees
    fn secondary_projection(x: f32, z: f32, dir: Vec2) -> f32 {
        x * (dir.x * 0.9 - dir.y * 0.4) + z * (dir.y * 0.9 + dir.x * 0.4)
    }

    /// Vertical wave sum at a base point (no per-particle noise or phase offset)
    pub fn wave_sum(&self, x: f32, z: f32) -> f32 {
        let dir = self.direction();
        let h = self.height;
        let t = self.time;
        let [w1, w2, w3] = WAVES;

        let phase1 = (x * dir.x + z * dir.y) * w1.k - t * w1.omega;
        let phase2 = Self::secondary_projection(x, z, dir) * w2.k - t * w2.omega;
        let phase3 = (x + z) * w3.k - t * w3.omega;

        phase1.sin() * w1.amp * h + phase2.sin() * w2.amp * h + phase3.cos() * w3.amp * h
    }

    /// Resting surface height used to float treasures
    pub fn surface_height(&self, x: f32, z: f32) -> f32 {
        self.tuning.base_y + self.wave_sum(x, z)
    }

    /// Where the collect gesture pulls the surface for a given cursor
    pub fn pull_focus(&self, cursor: Vec2) -> Vec2 {
        let t = &self.tuning;
        Vec2::new(
            cursor.x * t.pinch_focus_scale,
            (cursor.y - t.pinch_focus_offset) * -t.pinch_focus_scale,
        )
    }

    /// Pose of particle `i` this frame
    pub fn pose(&self, i: usize, pull: Option<Pull>) -> OceanPose {
        let p = self.particles[i];
        let dir = self.direction();
        let h = self.height;
        let t = self.time;
        let [w1, w2, w3] = WAVES;

        let phase1 = (p.x * dir.x + p.z * dir.y) * w1.k - t * w1.omega;
        let a1 = w1.amp * h;
        let sway = phase1.cos() * a1 * w1.horizontal;
        let y1 = phase1.sin() * a1;

        let phase2 =
            Self::secondary_projection(p.x, p.z, dir) * w2.k - t * w2.omega + i as f32 * 0.001;
        let y2 = phase2.sin() * w2.amp * h;

        let phase3 = (p.x + p.z) * w3.k - t * w3.omega;
        let y3 = phase3.cos() * w3.amp * h;

        let chaos = (p.noise - 0.5) * (h * 0.5);
        let wave = y1 + y2 + y3;
        let mut pos = Vec3::new(
            p.x + sway * dir.x,
            self.tuning.base_y + wave + chaos,
            p.z + sway * dir.y,
        );

        let mut influence = 0.0;
        if let Some(pull) = pull {
            let radius = self.tuning.pinch_radius;
            let dx = pos.x - pull.focus.x;
            let dz = pos.z - pull.focus.y;
            let dist_sq = dx * dx + dz * dz;
            if dist_sq < radius * radius {
                let f = smoothstep_falloff(1.0 - dist_sq.sqrt() / radius);
                influence = f;
                pos.y += f * self.tuning.pinch_lift;
                pos.x += dx * f * self.tuning.pinch_spread;
                pos.z += dz * f * self.tuning.pinch_spread;
            }
        }

        let h_norm = wave / (3.5 * h.max(1.0));
        let scale = 0.35 * p.scale * (1.0 + h_norm.max(0.0) * 1.5);

        let crest = 0.4 / (h * 0.8).max(1.0);
        let mut color = if h_norm > crest {
            mix(
                palette::OCEAN_MID,
                palette::OCEAN_CREST,
                ((h_norm - crest) * 3.0).clamp(0.0, 1.0),
            )
        } else {
            mix(
                palette::OCEAN_DEEP,
                palette::OCEAN_MID,
                ((h_norm + 1.2) / 2.0).clamp(0.0, 1.0),
            )
        };
        if influence > 0.1 {
            color = mix(color, palette::OCEAN_HIGHLIGHT, influence * self.tuning.highlight_blend);
        }

        OceanPose {
            position: pos,
            scale,
            color,
            pull: influence,
        }
    }

    /// Fill the ocean layer (world space), one instance per particle
    pub fn write_instances(&self, pull: Option<Pull>, out: &mut InstanceBuffer) {
        out.resize(self.particles.len());
        for i in 0..self.particles.len() {
            let pose = self.pose(i, pull);
            out.set(i, scene_to_world(pose.position), Vec3::ZERO, pose.scale, pose.color);
        }
    }

    pub fn reset(&mut self) {
        self.target_rotation = 0.0;
        self.target_height = self.tuning.initial_height;
        self.speed = self.tuning.initial_speed;
        self.rotation = 0.0;
        self.height = self.tuning.initial_height;
        self.time = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn grid() -> Vec<OceanParticle> {
        (0..10)
            .map(|i| OceanParticle {
                x: i as f32 * 7.0 - 30.0,
                z: -(i as f32) * 5.0,
                noise: 0.5,
                scale: 1.0,
            })
            .collect()
    }

    #[test]
    fn test_flat_sea_rests_at_base_height() {
        let mut ocean = OceanField::from_particles(grid(), OceanTuning::default());
        ocean.set_speed(0.0);
        ocean.set_wave_height(0.0);
        ocean.settle_controls();
        ocean.advance(1.0 / 60.0);
        assert_eq!(ocean.time(), 0.0);

        for (i, p) in grid().iter().enumerate() {
            let pose = ocean.pose(i, None);
            assert!((pose.position.y - (-5.0)).abs() < 1e-5);
            assert!((pose.position.x - p.x).abs() < 1e-5);
            assert!((pose.position.z - p.z).abs() < 1e-5);
        }
    }

    #[test]
    fn test_controls_are_smoothed() {
        let mut ocean = OceanField::from_particles(grid(), OceanTuning::default());
        ocean.set_wave_height(3.0);
        ocean.set_flow(1.0);
        ocean.advance(1.0 / 60.0);
        assert!((ocean.height() - 1.1).abs() < 1e-5);
        assert!((ocean.rotation() - 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_time_advances_with_speed() {
        let mut ocean = OceanField::from_particles(grid(), OceanTuning::default());
        ocean.set_speed(2.0);
        ocean.advance(0.5);
        assert!((ocean.time() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_pull_lifts_particles_under_focus() {
        let particles = vec![OceanParticle {
            x: 0.0,
            z: 12.5,
            noise: 0.5,
            scale: 1.0,
        }];
        let mut ocean = OceanField::from_particles(particles, OceanTuning::default());
        ocean.set_wave_height(0.0);
        ocean.settle_controls();

        let focus = ocean.pull_focus(Vec2::ZERO);
        assert_eq!(focus, Vec2::new(0.0, 12.5));

        let rest = ocean.pose(0, None);
        let pulled = ocean.pose(0, Some(Pull { focus }));
        assert!((pulled.position.y - rest.position.y - 4.0).abs() < 1e-5);
        assert_eq!(pulled.pull, 1.0);
        assert_ne!(pulled.color, rest.color);
    }

    #[test]
    fn test_random_population_within_bounds() {
        let mut rng = Pcg32::seed_from_u64(4);
        let tuning = OceanTuning {
            particle_count: 500,
            ..Default::default()
        };
        let ocean = OceanField::new(&mut rng, tuning);
        assert_eq!(ocean.len(), 500);
        for p in ocean.particles() {
            assert!((-80.0..=80.0).contains(&p.x));
            assert!((-60.0..=10.0).contains(&p.z));
            assert!((0.0..=0.8).contains(&p.noise));
            assert!((0.8..=1.3).contains(&p.scale));
        }
    }

    #[test]
    fn test_instances_are_finite_in_rough_seas() {
        let mut rng = Pcg32::seed_from_u64(8);
        let tuning = OceanTuning {
            particle_count: 200,
            ..Default::default()
        };
        let mut ocean = OceanField::new(&mut rng, tuning);
        ocean.set_wave_height(3.2);
        ocean.set_speed(12.0);
        for _ in 0..120 {
            ocean.advance(1.0 / 60.0);
        }
        let mut buf = InstanceBuffer::new(0);
        ocean.write_instances(Some(Pull { focus: Vec2::ZERO }), &mut buf);
        assert_eq!(buf.len(), 200);
        assert_eq!(buf.rejected(), 0);
        assert_eq!(buf.visible_count(), 200);
    }
}
