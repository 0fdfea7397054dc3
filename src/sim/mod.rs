//! Deterministic simulation module
//!
//! All scene logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by slot index)
//! - No rendering or platform dependencies

pub mod control;
pub mod fireworks;
pub mod mode;
pub mod ocean;
pub mod reward;
pub mod scene;
pub mod tick;
pub mod timer;
pub mod treasure;

pub use control::{ControlCommand, ControlState, Gesture};
pub use fireworks::{Detonation, FireworkEngine, Rocket, RocketKind, Spark, SparkMode};
pub use mode::{FireworkMode, ModeEffect, ModeEvent, ModeMachine, transition};
pub use ocean::{OceanField, OceanParticle, OceanPose, Pull};
pub use reward::RewardSequencer;
pub use scene::{Scene, SceneLayers};
pub use tick::{TickReport, tick};
pub use timer::{Scheduler, TimerHandle};
pub use treasure::{Collected, Treasure, TreasureField, TreasureVariant};
