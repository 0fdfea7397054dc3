//! Input unifier
//!
//! Exactly one `InputSource` is active per scene. It is the only writer of the
//! control state's cursor, gesture and confidence. Switching sources tears the
//! previous one down synchronously (capture stopped, control reset) before the
//! next one is engaged.

pub mod capability;
pub mod gesture;
pub mod landmarks;
pub mod pointer;

use serde::{Deserialize, Serialize};

pub use capability::{CapabilityError, CapabilityProvider, GestureSource, ProviderStatus, ScriptedProvider};
pub use gesture::{Classification, GestureTracker, classify};
pub use landmarks::{HandFrame, HandLandmarks};
pub use pointer::{PointerButton, PointerEvent, PointerResponse, PointerSource};

use crate::sim::control::ControlState;

/// Which kind of source drives the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InputMode {
    #[default]
    Pointer,
    Gesture,
}

impl InputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputMode::Pointer => "pointer",
            InputMode::Gesture => "gesture",
        }
    }
}

/// A producer of control state
pub trait InputSource {
    fn mode(&self) -> InputMode;
    /// Acquire resources and start writing `control`
    fn engage(&mut self, control: &mut ControlState);
    /// Once per tick, before the simulation runs
    fn update(&mut self, now: f64, control: &mut ControlState);
    /// Release every resource and leave `control` neutral
    fn teardown(&mut self, control: &mut ControlState);
    fn is_engaged(&self) -> bool;

    fn status(&self) -> ProviderStatus {
        ProviderStatus::Ready
    }

    /// Re-acquire from scratch after a failure
    fn retry(&mut self, _control: &mut ControlState) {}

    fn on_pointer(&mut self, _event: PointerEvent, _control: &mut ControlState) -> PointerResponse {
        PointerResponse::Default
    }
}

/// Owns the single active source
#[derive(Default)]
pub struct InputUnifier {
    active: Option<Box<dyn InputSource>>,
    switches: u32,
}

impl InputUnifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Option<InputMode> {
        self.active.as_ref().map(|s| s.mode())
    }

    pub fn status(&self) -> ProviderStatus {
        self.active
            .as_ref()
            .map(|s| s.status())
            .unwrap_or(ProviderStatus::Idle)
    }

    pub fn switches(&self) -> u32 {
        self.switches
    }

    /// Tear down the current source, then engage `source`
    pub fn switch_to(&mut self, mut source: Box<dyn InputSource>, control: &mut ControlState) {
        self.teardown(control);
        source.engage(control);
        log::info!("Input source switched to {}", source.mode().as_str());
        self.active = Some(source);
        self.switches += 1;
    }

    /// Synchronously release the active source, if any
    pub fn teardown(&mut self, control: &mut ControlState) {
        if let Some(mut old) = self.active.take() {
            old.teardown(control);
            log::info!("Input source {} torn down", old.mode().as_str());
        }
        control.reset();
    }

    pub fn update(&mut self, now: f64, control: &mut ControlState) {
        if let Some(source) = self.active.as_mut() {
            source.update(now, control);
        }
    }

    pub fn retry(&mut self, control: &mut ControlState) {
        if let Some(source) = self.active.as_mut() {
            source.retry(control);
        }
    }

    /// Route a pointer event to the active source
    pub fn on_pointer(&mut self, event: PointerEvent, control: &mut ControlState) -> PointerResponse {
        match self.active.as_mut() {
            Some(source) => source.on_pointer(event, control),
            // Right-click stays suppressed even between sources
            None if event == PointerEvent::ContextMenu => PointerResponse::PreventDefault,
            None => PointerResponse::Default,
        }
    }
}
