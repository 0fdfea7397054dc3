//! Firework pool engine
//!
//! Two fixed-capacity pools: rockets (first-fit allocation) and sparks (trail
//! sparks borrow any hidden or nearly spent slot; explosions take contiguous
//! slices). Pools never grow; a spawn with no free slot is silently dropped.
//!
//! Physics constants are per tick at the fixed 60 Hz step. Timers (salvo
//! cadence, auto-launch) use `dt` in seconds.

use glam::Vec3;
use rand::Rng;

use super::mode::{FireworkMode, ModeEffect, ModeEvent, ModeMachine};
use crate::color::{offset_hsl, palette};
use crate::consts::HIDDEN_Y;
use crate::render::InstanceBuffer;
use crate::scene_to_world;
use crate::tuning::FireworkTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RocketKind {
    Main,
    Sub,
}

/// A pooled rocket slot; free when `active` is false
#[derive(Debug, Clone)]
pub struct Rocket {
    pub pos: Vec3,
    pub vel: Vec3,
    pub color: Vec3,
    pub active: bool,
    pub kind: RocketKind,
    pub scale: f32,
}

impl Rocket {
    fn free() -> Self {
        Self {
            pos: Vec3::ZERO,
            vel: Vec3::ZERO,
            color: Vec3::ONE,
            active: false,
            kind: RocketKind::Sub,
            scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SparkMode {
    Hidden,
    Trail,
    Explosion,
}

/// A pooled spark slot
#[derive(Debug, Clone)]
pub struct Spark {
    pub pos: Vec3,
    pub vel: Vec3,
    pub color: Vec3,
    /// Remaining life in [0, 1]
    pub life: f32,
    pub decay_rate: f32,
    pub scale: f32,
    pub mode: SparkMode,
    /// Accumulated tumble (x from vel.z, z from vel.x)
    pub rotation: Vec3,
}

impl Spark {
    fn hidden() -> Self {
        Self {
            pos: Vec3::new(0.0, HIDDEN_Y, 0.0),
            vel: Vec3::ZERO,
            color: Vec3::ZERO,
            life: 0.0,
            decay_rate: 0.01,
            scale: 0.0,
            mode: SparkMode::Hidden,
            rotation: Vec3::ZERO,
        }
    }
}

/// Which airborne rockets a detonation affects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detonation {
    /// Every active rocket (explicit explode trigger)
    All,
    /// Rockets whose ascent has nearly stopped
    NearApex,
}

/// Rocket + spark pools and the firework mode machine
#[derive(Debug, Clone)]
pub struct FireworkEngine {
    rockets: Vec<Rocket>,
    sparks: Vec<Spark>,
    machine: ModeMachine,
    events: Vec<ModeEvent>,
    salvo_queue: u32,
    salvo_timer: f32,
    auto_launch_timer: f32,
    finale_expired: bool,
    salvo_per_reward: u32,
    clusters_launched: u64,
    tuning: FireworkTuning,
}

impl FireworkEngine {
    pub fn new(tuning: FireworkTuning, salvo_per_reward: u32) -> Self {
        Self {
            rockets: vec![Rocket::free(); tuning.rocket_capacity],
            sparks: vec![Spark::hidden(); tuning.spark_capacity],
            machine: ModeMachine::new(),
            events: Vec::new(),
            salvo_queue: 0,
            salvo_timer: 0.0,
            auto_launch_timer: 0.0,
            finale_expired: false,
            salvo_per_reward,
            clusters_launched: 0,
            tuning,
        }
    }

    pub fn mode(&self) -> FireworkMode {
        self.machine.mode()
    }

    pub fn rockets(&self) -> &[Rocket] {
        &self.rockets
    }

    pub fn sparks(&self) -> &[Spark] {
        &self.sparks
    }

    pub fn salvo_queue(&self) -> u32 {
        self.salvo_queue
    }

    pub fn clusters_launched(&self) -> u64 {
        self.clusters_launched
    }

    pub fn active_rockets(&self) -> usize {
        self.rockets.iter().filter(|r| r.active).count()
    }

    pub fn sparks_in_mode(&self, mode: SparkMode) -> usize {
        self.sparks.iter().filter(|s| s.mode == mode).count()
    }

    /// Queue a mode event for the next `step`
    pub fn send(&mut self, event: ModeEvent) {
        self.events.push(event);
    }

    /// The reward duration elapsed; revert to Idle once the salvo queue drains
    pub fn end_finale(&mut self) {
        self.send(ModeEvent::FinaleOver);
    }

    /// Advance one fixed tick
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R, dt: f32) {
        // 1. Mode transitions (edge-gated) and their side effects
        for event in std::mem::take(&mut self.events) {
            match event {
                ModeEvent::FinaleOver => {
                    self.finale_expired = true;
                    continue;
                }
                ModeEvent::Reward => self.finale_expired = false,
                _ => {}
            }
            if let Some(effect) = self.machine.apply(event) {
                self.run_effect(effect, rng);
            }
        }

        // 2. Finale automation
        if self.machine.mode() == FireworkMode::Continuous {
            self.auto_launch_timer -= dt;
            if self.auto_launch_timer <= 0.0 {
                self.launch_cluster(rng, true);
                let t = &self.tuning;
                self.auto_launch_timer =
                    t.auto_launch_min + rng.random::<f32>() * (t.auto_launch_max - t.auto_launch_min);
            }
        }

        if self.salvo_queue > 0 {
            self.salvo_timer -= dt;
            if self.salvo_timer <= 0.0 {
                self.launch_cluster(rng, true);
                self.salvo_queue -= 1;
                self.salvo_timer = self.tuning.salvo_interval;
            }
        }

        if self.finale_expired && self.salvo_queue == 0 {
            self.finale_expired = false;
            self.machine.apply(ModeEvent::FinaleOver);
            log::info!("Firework finale over, back to idle");
        }

        // 3. Apex detection
        let apex = self.tuning.apex_velocity;
        if self.rockets.iter().any(|r| r.active && r.vel.y < apex) {
            self.detonate(rng, Detonation::NearApex);
        }

        // 4. Physics
        self.integrate_rockets(rng);
        self.integrate_sparks();

        self.machine.end_tick();
    }

    fn run_effect<R: Rng + ?Sized>(&mut self, effect: ModeEffect, rng: &mut R) {
        match effect {
            ModeEffect::LaunchCluster => {
                self.launch_cluster(rng, false);
            }
            ModeEffect::DetonateAll => {
                self.detonate(rng, Detonation::All);
            }
            ModeEffect::BeginSalvo => {
                self.salvo_queue += self.salvo_per_reward;
                self.salvo_timer = 0.0;
                log::debug!("Salvo queue now {}", self.salvo_queue);
            }
        }
    }

    fn free_rocket_slot(&self) -> Option<usize> {
        self.rockets.iter().position(|r| !r.active)
    }

    /// Allocate and launch one rocket. `None` when the pool is exhausted.
    pub fn spawn_rocket<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        x: f32,
        z: f32,
        kind: RocketKind,
        color: Vec3,
    ) -> Option<usize> {
        let idx = self.free_rocket_slot()?;
        let launch_y = self.tuning.launch_y;
        let r = &mut self.rockets[idx];
        r.active = true;
        r.kind = kind;
        r.pos = Vec3::new(x, launch_y, z);
        match kind {
            RocketKind::Main => {
                r.color = color;
                r.vel = Vec3::new(
                    (rng.random::<f32>() - 0.5) * 0.15,
                    0.65 + rng.random::<f32>() * 0.1,
                    (rng.random::<f32>() - 0.5) * 0.1,
                );
                r.scale = 2.0;
            }
            RocketKind::Sub => {
                r.color = offset_hsl(color, rng.random::<f32>() * 0.1, 0.0, 0.0);
                let angle = rng.random::<f32>() * std::f32::consts::TAU;
                r.vel = Vec3::new(
                    (rng.random::<f32>() - 0.5) * 0.1 + angle.cos() * 0.02,
                    0.60 + rng.random::<f32>() * 0.1,
                    (rng.random::<f32>() - 0.5) * 0.1 + angle.sin() * 0.02,
                );
                r.scale = 1.2;
            }
        }
        Some(idx)
    }

    /// One MAIN rocket plus 3-5 SUB rockets around a launch point.
    /// Returns how many rockets actually launched.
    pub fn launch_cluster<R: Rng + ?Sized>(&mut self, rng: &mut R, scatter: bool) -> usize {
        let color = palette::FIREWORKS[rng.random_range(0..palette::FIREWORKS.len())];

        let (x, z) = if scatter {
            (
                (rng.random::<f32>() - 0.5) * 120.0,
                (rng.random::<f32>() - 0.5) * 60.0 - 10.0,
            )
        } else {
            (
                (rng.random::<f32>() - 0.5) * 40.0,
                (rng.random::<f32>() - 0.5) * 10.0 - 5.0,
            )
        };

        let mut launched = 0;
        if self.spawn_rocket(rng, x, z, RocketKind::Main, color).is_some() {
            launched += 1;
        }

        let subs = rng.random_range(3..=5);
        for _ in 0..subs {
            let ox = (rng.random::<f32>() - 0.5) * 5.0;
            let oz = (rng.random::<f32>() - 0.5) * 5.0;
            if self
                .spawn_rocket(rng, x + ox, z + oz, RocketKind::Sub, color)
                .is_some()
            {
                launched += 1;
            }
        }

        self.clusters_launched += 1;
        log::debug!("Cluster launched ({} rockets, scatter={})", launched, scatter);
        launched
    }

    /// Spark slice each detonating rocket receives
    pub fn slice_size(&self, rocket_count: usize) -> usize {
        self.sparks.len() / (rocket_count + self.tuning.slice_margin)
    }

    /// Burst rockets into contiguous spark slices. Returns sparks assigned.
    pub fn detonate<R: Rng + ?Sized>(&mut self, rng: &mut R, which: Detonation) -> usize {
        let near_apex = self.tuning.near_apex_velocity;
        let targets: Vec<usize> = self
            .rockets
            .iter()
            .enumerate()
            .filter(|(_, r)| r.active && (which == Detonation::All || r.vel.y < near_apex))
            .map(|(i, _)| i)
            .collect();
        if targets.is_empty() {
            return 0;
        }

        let per = self.slice_size(targets.len());
        let capacity = self.sparks.len();
        let mut cursor = 0;

        for idx in targets {
            let start = cursor;
            let end = (start + per).min(capacity);
            let rocket = self.rockets[idx].clone();
            self.burst(rng, &rocket, start..end);
            cursor = end;
            self.rockets[idx].active = false;
        }
        cursor
    }

    fn burst<R: Rng + ?Sized>(&mut self, rng: &mut R, rocket: &Rocket, slots: std::ops::Range<usize>) {
        let t = &self.tuning;
        let mut center = rocket.pos;
        center.y = center.y.clamp(t.min_explosion_y, t.max_explosion_y);

        let (blast, base_scale) = match rocket.kind {
            RocketKind::Main => (t.main_blast, 0.45),
            RocketKind::Sub => (t.sub_blast, 0.3),
        };

        for i in slots {
            // Uniform direction on the sphere, cube-root radius for volume
            let u = rng.random::<f32>();
            let v = rng.random::<f32>();
            let theta = std::f32::consts::TAU * u;
            let phi = (2.0 * v - 1.0).clamp(-1.0, 1.0).acos();
            let vol = rng.random::<f32>().cbrt();
            let speed = blast * (0.5 + vol * 0.5);

            let color = if rng.random::<f32>() < t.white_spark_chance {
                Vec3::splat(2.0)
            } else {
                offset_hsl(
                    rocket.color,
                    rng.random::<f32>() * 0.1 - 0.05,
                    0.0,
                    rng.random::<f32>() * 0.1,
                )
            };

            let s = &mut self.sparks[i];
            s.pos = center;
            s.vel = Vec3::new(
                speed * phi.sin() * theta.cos(),
                speed * phi.sin() * theta.sin(),
                speed * phi.cos(),
            );
            s.color = color;
            s.life = 1.0;
            s.decay_rate = 0.005 + rng.random::<f32>() * 0.01;
            s.scale = base_scale * (0.5 + rng.random::<f32>());
            s.mode = SparkMode::Explosion;
            s.rotation = Vec3::ZERO;
        }
    }

    fn integrate_rockets<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let t = &self.tuning;
        let spark_count = self.sparks.len();
        for r in self.rockets.iter_mut().filter(|r| r.active) {
            r.pos += r.vel;
            r.vel.y -= t.gravity * 0.5;
            r.vel *= t.rocket_drag;

            // Trail: borrow a random slot if it is free or nearly spent
            let idx = rng.random_range(0..spark_count);
            let s = &mut self.sparks[idx];
            if s.mode == SparkMode::Hidden || s.life < t.trail_reuse_life {
                s.mode = SparkMode::Trail;
                s.pos = r.pos;
                s.vel = Vec3::ZERO;
                s.color = r.color;
                s.scale = 0.6 * r.scale;
                s.life = t.trail_life;
                s.decay_rate = t.trail_decay;
                s.rotation = Vec3::ZERO;
            }
        }
    }

    fn integrate_sparks(&mut self) {
        let t = &self.tuning;
        for s in &mut self.sparks {
            match s.mode {
                SparkMode::Hidden => {}
                SparkMode::Trail => {
                    s.life = (s.life - s.decay_rate).clamp(0.0, 1.0);
                    if s.life <= 0.0 {
                        s.mode = SparkMode::Hidden;
                    }
                }
                SparkMode::Explosion => {
                    s.pos += s.vel;
                    s.vel *= t.spark_drag;
                    s.vel.y -= t.gravity;
                    s.rotation.x += s.vel.z;
                    s.rotation.z += s.vel.x;
                    s.life = (s.life - s.decay_rate).clamp(0.0, 1.0);
                    if s.life <= 0.0 {
                        s.mode = SparkMode::Hidden;
                    }
                }
            }
        }
    }

    /// Explosion brightness: full above the knee, linear to zero below it
    pub fn intensity(&self, life: f32) -> f32 {
        let knee = self.tuning.intensity_knee;
        if life > knee { 1.0 } else { (life / knee).clamp(0.0, 1.0) }
    }

    /// One instance per spark slot (world space); hidden slots are parked off-scene
    pub fn write_spark_instances(&self, out: &mut InstanceBuffer) {
        out.resize(self.sparks.len());
        let boost = self.tuning.emissive_boost;
        for (i, s) in self.sparks.iter().enumerate() {
            match s.mode {
                SparkMode::Hidden => out.hide(i),
                SparkMode::Trail => {
                    out.set(i, scene_to_world(s.pos), Vec3::ZERO, s.scale * s.life, s.color * boost);
                }
                SparkMode::Explosion => {
                    let intensity = self.intensity(s.life);
                    out.set(
                        i,
                        scene_to_world(s.pos),
                        s.rotation,
                        s.scale * (0.2 + 0.8 * intensity),
                        s.color * boost * intensity,
                    );
                }
            }
        }
    }

    /// One instance per rocket slot
    pub fn write_rocket_instances(&self, out: &mut InstanceBuffer) {
        out.resize(self.rockets.len());
        let boost = self.tuning.emissive_boost;
        for (i, r) in self.rockets.iter().enumerate() {
            if r.active {
                out.set(i, scene_to_world(r.pos), Vec3::ZERO, 0.25 * r.scale, r.color * boost);
            } else {
                out.hide(i);
            }
        }
    }

    /// Return every slot to the pool and the machine to Idle
    pub fn reset(&mut self) {
        for r in &mut self.rockets {
            *r = Rocket::free();
        }
        for s in &mut self.sparks {
            *s = Spark::hidden();
        }
        self.machine.reset();
        self.events.clear();
        self.salvo_queue = 0;
        self.salvo_timer = 0.0;
        self.auto_launch_timer = 0.0;
        self.finale_expired = false;
    }
}
