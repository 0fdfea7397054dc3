//! Shared control surface between the input layer and the simulation
//!
//! Ownership per tick: the active input source writes `cursor`, `gesture` and
//! `confidence` and pushes commands; the simulation drains the commands. Nothing
//! else writes these fields.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Discrete intent derived from the active input source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Gesture {
    /// No hand (or no pointer) detected
    #[default]
    None,
    /// Open hand: steer the ocean
    Open,
    /// Closed fist: launch fireworks, collect treasure
    Grab,
    /// Thumb and index together: search for treasure
    Pinch,
}

impl Gesture {
    /// GRAB and PINCH both collect treasure and pull the ocean surface
    #[inline]
    pub fn is_collect(self) -> bool {
        matches!(self, Gesture::Grab | Gesture::Pinch)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gesture::None => "NONE",
            Gesture::Open => "OPEN",
            Gesture::Grab => "GRAB",
            Gesture::Pinch => "PINCH",
        }
    }
}

/// Requests the input layer makes of the simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlCommand {
    TriggerFirework,
    TriggerExplode,
    TriggerTreasureSequence,
    SetOceanSpeed(f32),
    SetWaveHeight(f32),
    /// Flow direction rotation, in radians
    SetOceanFlow(f32),
}

/// Per-scene control state, mutated in place every frame
#[derive(Debug, Clone, Default)]
pub struct ControlState {
    /// Cursor in world units (cursor plane, z = 0)
    pub cursor: Vec2,
    pub gesture: Gesture,
    /// Classifier confidence in [0, 1]; always 1.0 for pointer input
    pub confidence: f32,
    commands: Vec<ControlCommand>,
}

impl ControlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a command for the next simulation tick
    pub fn push(&mut self, command: ControlCommand) {
        self.commands.push(command);
    }

    pub fn trigger_firework(&mut self) {
        self.push(ControlCommand::TriggerFirework);
    }

    pub fn trigger_explode(&mut self) {
        self.push(ControlCommand::TriggerExplode);
    }

    pub fn trigger_treasure_sequence(&mut self) {
        self.push(ControlCommand::TriggerTreasureSequence);
    }

    pub fn set_ocean_speed(&mut self, speed: f32) {
        self.push(ControlCommand::SetOceanSpeed(speed));
    }

    pub fn set_wave_height(&mut self, height: f32) {
        self.push(ControlCommand::SetWaveHeight(height));
    }

    pub fn set_ocean_flow(&mut self, rotation: f32) {
        self.push(ControlCommand::SetOceanFlow(rotation));
    }

    /// Commands queued since the last drain, in submission order
    pub fn drain_commands(&mut self) -> std::vec::Drain<'_, ControlCommand> {
        self.commands.drain(..)
    }

    pub fn pending_commands(&self) -> &[ControlCommand] {
        &self.commands
    }

    /// Neutral values used on scene teardown and source switches
    pub fn reset(&mut self) {
        self.cursor = Vec2::ZERO;
        self.gesture = Gesture::None;
        self.confidence = 0.0;
        self.commands.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_drain_in_order() {
        let mut control = ControlState::new();
        control.trigger_firework();
        control.set_wave_height(1.5);
        let drained: Vec<_> = control.drain_commands().collect();
        assert_eq!(
            drained,
            vec![ControlCommand::TriggerFirework, ControlCommand::SetWaveHeight(1.5)]
        );
        assert!(control.pending_commands().is_empty());
    }

    #[test]
    fn test_reset_is_neutral() {
        let mut control = ControlState::new();
        control.cursor = Vec2::new(3.0, 4.0);
        control.gesture = Gesture::Grab;
        control.confidence = 0.9;
        control.trigger_explode();
        control.reset();
        assert_eq!(control.cursor, Vec2::ZERO);
        assert_eq!(control.gesture, Gesture::None);
        assert_eq!(control.confidence, 0.0);
        assert!(control.pending_commands().is_empty());
    }
}
