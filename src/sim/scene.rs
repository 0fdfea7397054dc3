//! Scene aggregate
//!
//! Owns every simulation subsystem plus the scene clock and the seeded RNG.
//! Created once when a main screen is entered; `reset` is the teardown path.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::control::ControlState;
use super::fireworks::FireworkEngine;
use super::mode::FireworkMode;
use super::ocean::{OceanField, Pull};
use super::reward::RewardSequencer;
use super::treasure::{TreasureField, TreasureVariant};
use crate::render::{InstanceBuffer, Layer};
use crate::tuning::Tuning;

/// Per-layer instance buffers, reused across frames
#[derive(Debug, Clone, Default)]
pub struct SceneLayers {
    pub ocean: InstanceBuffer,
    pub rockets: InstanceBuffer,
    pub sparks: InstanceBuffer,
    pub treasures: InstanceBuffer,
}

impl SceneLayers {
    pub fn get(&self, layer: Layer) -> &InstanceBuffer {
        match layer {
            Layer::Ocean => &self.ocean,
            Layer::Rockets => &self.rockets,
            Layer::Sparks => &self.sparks,
            Layer::Treasures => &self.treasures,
        }
    }
}

/// Complete simulation state for one main screen
#[derive(Debug, Clone)]
pub struct Scene {
    pub control: ControlState,
    pub ocean: OceanField,
    pub fireworks: FireworkEngine,
    pub treasures: TreasureField,
    pub reward: RewardSequencer,
    /// Seconds of simulated time
    pub clock: f64,
    pub tick_count: u64,
    pub rng: Pcg32,
    seed: u64,
    tuning: Tuning,
}

impl Scene {
    pub fn new(seed: u64, tuning: Tuning, variant: TreasureVariant) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let ocean = OceanField::new(&mut rng, tuning.ocean.clone());
        let treasures = TreasureField::with_variant(&mut rng, variant, tuning.treasure.clone());
        log::info!(
            "Scene created: seed={} ocean={} sparks={} rockets={} treasures={:?}",
            seed,
            ocean.len(),
            tuning.fireworks.spark_capacity,
            tuning.fireworks.rocket_capacity,
            variant
        );
        Self {
            control: ControlState::new(),
            ocean,
            fireworks: FireworkEngine::new(tuning.fireworks.clone(), tuning.reward.salvo_count),
            treasures,
            reward: RewardSequencer::new(tuning.reward.clone()),
            clock: 0.0,
            tick_count: 0,
            rng,
            seed,
            tuning,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn mode(&self) -> FireworkMode {
        self.fireworks.mode()
    }

    /// Ocean deformation under the cursor while a collect gesture is held
    pub fn pull(&self) -> Option<Pull> {
        self.control.gesture.is_collect().then(|| Pull {
            focus: self.ocean.pull_focus(self.control.cursor),
        })
    }

    /// Fill every layer for the render sink
    pub fn write_layers(&self, layers: &mut SceneLayers) {
        self.ocean.write_instances(self.pull(), &mut layers.ocean);
        self.fireworks.write_rocket_instances(&mut layers.rockets);
        self.fireworks.write_spark_instances(&mut layers.sparks);
        self.treasures.write_instances(&mut layers.treasures);
    }

    /// Teardown: neutral controls, free pools, cancelled timers, clock at zero
    pub fn reset(&mut self) {
        self.control.reset();
        self.ocean.reset();
        self.fireworks.reset();
        self.treasures.reset();
        self.reward.cancel_all();
        self.clock = 0.0;
        self.tick_count = 0;
        log::debug!("Scene reset");
    }
}
