//! Gesture capability provider
//!
//! A provider owns the camera and the hand-landmark model. Acquisition is
//! coarse-grained and may fail; once ready it yields the latest available
//! `HandFrame` without ever blocking the frame loop.

use std::collections::VecDeque;
use thiserror::Error;

use super::gesture::GestureTracker;
use super::landmarks::HandFrame;
use super::{InputMode, InputSource};
use crate::sim::control::ControlState;
use crate::tuning::GestureTuning;

/// Why the gesture capability is unavailable
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("camera access denied")]
    PermissionDenied,
    #[error("camera capture is not supported on this platform")]
    Unsupported,
    #[error("hand model failed to load: {0}")]
    ModelLoad(String),
}

/// Acquisition state of a provider
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProviderStatus {
    #[default]
    Idle,
    Acquiring,
    Ready,
    /// Terminal until a retry; distinct from "no hand in view"
    Unavailable(CapabilityError),
}

impl ProviderStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, ProviderStatus::Ready)
    }
}

/// Camera + hand model
pub trait CapabilityProvider {
    /// Start acquisition from scratch. Completion is observed through `status`.
    fn acquire(&mut self);
    fn status(&self) -> ProviderStatus;
    /// Latest available frame. Repeats the previous frame when nothing new arrived.
    fn latest(&mut self) -> Option<HandFrame>;
    /// Stop capture and drop the model
    fn release(&mut self);
}

/// Input source backed by a capability provider
pub struct GestureSource<P: CapabilityProvider> {
    provider: P,
    tracker: GestureTracker,
    engaged: bool,
    reported: ProviderStatus,
}

impl<P: CapabilityProvider> GestureSource<P> {
    pub fn new(provider: P, tuning: GestureTuning) -> Self {
        Self {
            provider,
            tracker: GestureTracker::new(tuning),
            engaged: false,
            reported: ProviderStatus::Idle,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn tracker(&self) -> &GestureTracker {
        &self.tracker
    }

    fn report(&mut self, status: &ProviderStatus) {
        if *status == self.reported {
            return;
        }
        match status {
            ProviderStatus::Ready => log::info!("Gesture capability ready"),
            ProviderStatus::Unavailable(e) => log::warn!("Gesture capability unavailable: {}", e),
            ProviderStatus::Acquiring => log::debug!("Acquiring gesture capability"),
            ProviderStatus::Idle => {}
        }
        self.reported = status.clone();
    }
}

impl<P: CapabilityProvider> InputSource for GestureSource<P> {
    fn mode(&self) -> InputMode {
        InputMode::Gesture
    }

    fn engage(&mut self, control: &mut ControlState) {
        self.tracker.reset();
        control.confidence = 0.0;
        self.provider.acquire();
        self.engaged = true;
    }

    fn update(&mut self, now: f64, control: &mut ControlState) {
        if !self.engaged {
            return;
        }
        let status = self.provider.status();
        self.report(&status);
        if !status.is_ready() {
            return;
        }
        if let Some(frame) = self.provider.latest() {
            self.tracker.process(&frame, now, control);
        }
    }

    fn teardown(&mut self, control: &mut ControlState) {
        self.provider.release();
        self.tracker.reset();
        self.engaged = false;
        self.reported = ProviderStatus::Idle;
        control.reset();
    }

    fn is_engaged(&self) -> bool {
        self.engaged
    }

    fn status(&self) -> ProviderStatus {
        self.provider.status()
    }

    /// Release everything and acquire again from scratch
    fn retry(&mut self, control: &mut ControlState) {
        log::info!("Retrying gesture capability");
        self.teardown(control);
        self.engage(control);
    }
}

/// Deterministic provider fed from a script (native runs and tests)
#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    /// Outcome of each successive `acquire`; `Ok` once exhausted
    outcomes: VecDeque<Result<(), CapabilityError>>,
    frames: VecDeque<HandFrame>,
    last: Option<HandFrame>,
    status: ProviderStatus,
    pub acquisitions: u32,
    pub releases: u32,
}

impl ScriptedProvider {
    pub fn new(frames: impl IntoIterator<Item = HandFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Fail the next acquisitions in order
    pub fn with_failures(mut self, failures: impl IntoIterator<Item = CapabilityError>) -> Self {
        self.outcomes = failures.into_iter().map(Err).collect();
        self
    }

    pub fn push_frame(&mut self, frame: HandFrame) {
        self.frames.push_back(frame);
    }

    /// Capture is live (acquired and not released)
    pub fn is_capturing(&self) -> bool {
        self.status.is_ready()
    }
}

impl CapabilityProvider for ScriptedProvider {
    fn acquire(&mut self) {
        self.acquisitions += 1;
        self.last = None;
        self.status = match self.outcomes.pop_front() {
            Some(Err(e)) => ProviderStatus::Unavailable(e),
            Some(Ok(())) | None => ProviderStatus::Ready,
        };
    }

    fn status(&self) -> ProviderStatus {
        self.status.clone()
    }

    fn latest(&mut self) -> Option<HandFrame> {
        if !self.status.is_ready() {
            return None;
        }
        if let Some(frame) = self.frames.pop_front() {
            self.last = Some(frame);
        }
        self.last
    }

    fn release(&mut self) {
        if self.status.is_ready() {
            self.releases += 1;
        }
        self.status = ProviderStatus::Idle;
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::control::Gesture;

    fn no_hand(t: f64) -> HandFrame {
        HandFrame {
            timestamp: t,
            hand: None,
        }
    }

    #[test]
    fn test_unavailable_is_distinct_from_no_hand() {
        let provider = ScriptedProvider::new([no_hand(1.0)]).with_failures([CapabilityError::PermissionDenied]);
        let mut source = GestureSource::new(provider, GestureTuning::default());
        let mut control = ControlState::new();
        source.engage(&mut control);
        source.update(0.0, &mut control);
        assert_eq!(
            source.status(),
            ProviderStatus::Unavailable(CapabilityError::PermissionDenied)
        );
        assert!(control.pending_commands().is_empty());
    }

    #[test]
    fn test_retry_reacquires_from_scratch() {
        let provider = ScriptedProvider::new([no_hand(1.0)])
            .with_failures([CapabilityError::ModelLoad("network".into())]);
        let mut source = GestureSource::new(provider, GestureTuning::default());
        let mut control = ControlState::new();
        source.engage(&mut control);
        source.update(0.0, &mut control);
        assert!(!source.status().is_ready());

        source.retry(&mut control);
        assert_eq!(source.provider().acquisitions, 2);
        assert!(source.status().is_ready());
        source.update(0.1, &mut control);
        assert_eq!(control.gesture, Gesture::None);
        assert_eq!(control.pending_commands().len(), 2);
    }

    #[test]
    fn test_repeated_frames_processed_once() {
        let provider = ScriptedProvider::new([no_hand(1.0)]);
        let mut source = GestureSource::new(provider, GestureTuning::default());
        let mut control = ControlState::new();
        source.engage(&mut control);
        for i in 0..5 {
            source.update(i as f64 * 0.016, &mut control);
        }
        // Only the first (non-stale) frame queued its idle controls
        assert_eq!(control.pending_commands().len(), 2);
    }

    #[test]
    fn test_teardown_stops_capture() {
        let provider = ScriptedProvider::default();
        let mut source = GestureSource::new(provider, GestureTuning::default());
        let mut control = ControlState::new();
        source.engage(&mut control);
        assert!(source.provider().is_capturing());
        source.teardown(&mut control);
        assert!(!source.provider().is_capturing());
        assert_eq!(source.provider().releases, 1);
        assert!(!source.is_engaged());
    }
}
