//! Pointer (mouse) input source
//!
//! Left button = GRAB plus a fire trigger, right button = PINCH, release =
//! OPEN. Moving while OPEN (or with no gesture yet) steers the ocean from the
//! pointer height. The right-button context menu is always suppressed.

use glam::Vec2;

use super::capability::ProviderStatus;
use super::{InputMode, InputSource};
use crate::consts::{CURSOR_HEIGHT, CURSOR_WIDTH};
use crate::sim::control::{ControlState, Gesture};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Other,
}

impl PointerButton {
    /// From a DOM `MouseEvent.button` code
    pub fn from_code(code: i16) -> Self {
        match code {
            0 => PointerButton::Primary,
            2 => PointerButton::Secondary,
            _ => PointerButton::Other,
        }
    }
}

/// Platform pointer events, already normalized
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Position in [-1, 1] on both axes, y up
    Move(Vec2),
    Down(PointerButton),
    Up(PointerButton),
    ContextMenu,
}

/// Client pixel coordinates to [-1, 1] with y up
pub fn normalize_client(x: f32, y: f32, width: f32, height: f32) -> Vec2 {
    Vec2::new(
        (x / width.max(1.0)) * 2.0 - 1.0,
        -(y / height.max(1.0)) * 2.0 + 1.0,
    )
}

/// Whether the platform default action for an event must be prevented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerResponse {
    Default,
    PreventDefault,
}

#[derive(Debug, Clone)]
pub struct PointerSource {
    engaged: bool,
    pub ocean_speed: f32,
}

impl Default for PointerSource {
    fn default() -> Self {
        Self {
            engaged: false,
            ocean_speed: 1.5,
        }
    }
}

impl PointerSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calmer waves with the pointer high, rougher with it low
    pub fn wave_height_for(y: f32) -> f32 {
        f32::max(0.2, 0.5 + (1.0 - (y + 1.0) / 2.0) * 1.5)
    }
}

impl InputSource for PointerSource {
    fn mode(&self) -> InputMode {
        InputMode::Pointer
    }

    fn engage(&mut self, control: &mut ControlState) {
        self.engaged = true;
        control.confidence = 1.0;
    }

    fn update(&mut self, _now: f64, control: &mut ControlState) {
        if self.engaged {
            control.confidence = 1.0;
        }
    }

    fn teardown(&mut self, control: &mut ControlState) {
        self.engaged = false;
        control.reset();
    }

    fn is_engaged(&self) -> bool {
        self.engaged
    }

    fn status(&self) -> ProviderStatus {
        if self.engaged {
            ProviderStatus::Ready
        } else {
            ProviderStatus::Idle
        }
    }

    fn on_pointer(&mut self, event: PointerEvent, control: &mut ControlState) -> PointerResponse {
        if !self.engaged {
            return PointerResponse::Default;
        }
        match event {
            PointerEvent::Move(p) => {
                control.cursor = Vec2::new(p.x * CURSOR_WIDTH / 2.0, p.y * CURSOR_HEIGHT / 2.0);
                if matches!(control.gesture, Gesture::Open | Gesture::None) {
                    control.gesture = Gesture::Open;
                    control.set_wave_height(Self::wave_height_for(p.y));
                    control.set_ocean_speed(self.ocean_speed);
                }
                PointerResponse::Default
            }
            PointerEvent::Down(PointerButton::Primary) => {
                control.gesture = Gesture::Grab;
                control.trigger_firework();
                PointerResponse::Default
            }
            PointerEvent::Down(PointerButton::Secondary) => {
                control.gesture = Gesture::Pinch;
                PointerResponse::PreventDefault
            }
            PointerEvent::Down(PointerButton::Other) => PointerResponse::Default,
            PointerEvent::Up(_) => {
                control.gesture = Gesture::Open;
                PointerResponse::Default
            }
            PointerEvent::ContextMenu => PointerResponse::PreventDefault,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::control::ControlCommand;

    fn engaged() -> (PointerSource, ControlState) {
        let mut source = PointerSource::new();
        let mut control = ControlState::new();
        source.engage(&mut control);
        (source, control)
    }

    #[test]
    fn test_move_maps_to_world_and_steers_ocean() {
        let (mut source, mut control) = engaged();
        source.on_pointer(PointerEvent::Move(Vec2::new(1.0, -1.0)), &mut control);
        assert_eq!(control.cursor, Vec2::new(25.0, -15.0));
        assert_eq!(control.gesture, Gesture::Open);
        let commands: Vec<_> = control.drain_commands().collect();
        assert_eq!(
            commands,
            vec![ControlCommand::SetWaveHeight(2.0), ControlCommand::SetOceanSpeed(1.5)]
        );
    }

    #[test]
    fn test_move_while_grabbing_keeps_gesture() {
        let (mut source, mut control) = engaged();
        source.on_pointer(PointerEvent::Down(PointerButton::Primary), &mut control);
        control.drain_commands().for_each(drop);
        source.on_pointer(PointerEvent::Move(Vec2::ZERO), &mut control);
        assert_eq!(control.gesture, Gesture::Grab);
        assert!(control.pending_commands().is_empty());
    }

    #[test]
    fn test_buttons_map_to_gestures() {
        let (mut source, mut control) = engaged();
        source.on_pointer(PointerEvent::Down(PointerButton::Primary), &mut control);
        assert_eq!(control.gesture, Gesture::Grab);
        assert_eq!(control.pending_commands(), &[ControlCommand::TriggerFirework]);

        source.on_pointer(PointerEvent::Up(PointerButton::Primary), &mut control);
        assert_eq!(control.gesture, Gesture::Open);

        let response = source.on_pointer(PointerEvent::Down(PointerButton::Secondary), &mut control);
        assert_eq!(control.gesture, Gesture::Pinch);
        assert_eq!(response, PointerResponse::PreventDefault);
    }

    #[test]
    fn test_context_menu_suppressed() {
        let (mut source, mut control) = engaged();
        assert_eq!(
            source.on_pointer(PointerEvent::ContextMenu, &mut control),
            PointerResponse::PreventDefault
        );
    }

    #[test]
    fn test_confidence_is_full() {
        let (mut source, mut control) = engaged();
        source.update(0.0, &mut control);
        assert_eq!(control.confidence, 1.0);
    }

    #[test]
    fn test_normalize_client() {
        assert_eq!(normalize_client(0.0, 0.0, 800.0, 600.0), Vec2::new(-1.0, 1.0));
        assert_eq!(normalize_client(800.0, 600.0, 800.0, 600.0), Vec2::new(1.0, -1.0));
        assert_eq!(normalize_client(400.0, 300.0, 800.0, 600.0), Vec2::ZERO);
    }
}
