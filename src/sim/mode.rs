//! Firework mode state machine
//!
//! `transition` is the pure `(mode, event) -> (mode, effect)` table.
//! `ModeMachine` adds the per-tick edge gating: RISING and EXPLODING revert to
//! IDLE at the end of the tick that entered them, and their side effect only
//! fires when the mode was not already observed on the previous tick. A fire
//! trigger repeated every tick therefore launches exactly once.

use serde::{Deserialize, Serialize};

/// Global firework mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FireworkMode {
    #[default]
    Idle,
    /// Launch phase (reverts to Idle the same tick)
    Rising,
    /// Burst phase (reverts to Idle the same tick)
    Exploding,
    /// Grand finale started by a reward; ordinary triggers are ignored
    Continuous,
}

impl FireworkMode {
    /// Mode left behind at the end of a tick
    pub fn settled(self) -> Self {
        match self {
            FireworkMode::Rising | FireworkMode::Exploding => FireworkMode::Idle,
            other => other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FireworkMode::Idle => "idle",
            FireworkMode::Rising => "rising",
            FireworkMode::Exploding => "exploding",
            FireworkMode::Continuous => "continuous",
        }
    }
}

/// Inputs to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeEvent {
    Fire,
    Explode,
    Reward,
    /// Reward duration elapsed and the salvo queue is empty
    FinaleOver,
}

/// Side effects requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeEffect {
    LaunchCluster,
    DetonateAll,
    BeginSalvo,
}

/// Pure transition table (no edge gating)
pub fn transition(mode: FireworkMode, event: ModeEvent) -> (FireworkMode, Option<ModeEffect>) {
    use FireworkMode::*;
    match (mode, event) {
        // A retrigger keeps the running salvo instead of queueing another
        (Continuous, ModeEvent::Reward) => (Continuous, None),
        (_, ModeEvent::Reward) => (Continuous, Some(ModeEffect::BeginSalvo)),
        (Continuous, ModeEvent::FinaleOver) => (Idle, None),
        (Continuous, _) => (Continuous, None),
        (_, ModeEvent::Fire) => (Rising, Some(ModeEffect::LaunchCluster)),
        (_, ModeEvent::Explode) => (Exploding, Some(ModeEffect::DetonateAll)),
        (other, ModeEvent::FinaleOver) => (other, None),
    }
}

/// Stateful wrapper applying `transition` once per event with edge gating
#[derive(Debug, Clone, Default)]
pub struct ModeMachine {
    mode: FireworkMode,
    /// Mode seen at the end of the previous tick, before settling
    observed: FireworkMode,
}

impl ModeMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> FireworkMode {
        self.mode
    }

    /// Apply one event; returns the effect to run, if any
    pub fn apply(&mut self, event: ModeEvent) -> Option<ModeEffect> {
        let before = self.mode;
        let (next, effect) = transition(before, event);
        self.mode = next;

        match effect {
            // Edge-triggered: only on entry, never while the mode lingers
            Some(ModeEffect::LaunchCluster) | Some(ModeEffect::DetonateAll) => {
                let entered = before != next && self.observed != next;
                entered.then_some(effect).flatten()
            }
            other => other,
        }
    }

    /// Close the tick: remember what was observed, then revert transient modes
    pub fn end_tick(&mut self) {
        self.observed = self.mode;
        self.mode = self.mode.settled();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
