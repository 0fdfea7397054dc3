//! Hand gesture classification
//!
//! `classify` is the pure landmark → gesture rule. `GestureTracker` wraps it
//! with the per-frame state: stale-frame rejection, exponential smoothing,
//! cursor mapping, rising-edge GRAB firing with a cooldown, and the OPEN-hand
//! ocean controls.

use glam::{Vec2, Vec3};

use super::landmarks::{CURL_TIPS, HandFrame, HandLandmarks};
use crate::consts::{CURSOR_HEIGHT, CURSOR_WIDTH};
use crate::safe_ratio;
use crate::sim::control::{ControlState, Gesture};
use crate::tuning::GestureTuning;

/// Result of classifying one hand
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub gesture: Gesture,
    /// Mean wrist-to-fingertip distance over palm length
    pub grab_ratio: f32,
    /// Thumb tip to index tip
    pub pinch_distance: f32,
}

/// GRAB when fingers curl toward the wrist, else PINCH when thumb and index meet, else OPEN
pub fn classify(hand: &HandLandmarks, tuning: &GestureTuning) -> Classification {
    let wrist = hand.wrist();
    let palm = wrist.distance(hand.middle_mcp());
    let tips: f32 = CURL_TIPS.iter().map(|&i| wrist.distance(hand.get(i))).sum();
    let grab_ratio = safe_ratio(tips / CURL_TIPS.len() as f32, palm);
    let pinch_distance = hand.thumb_tip().distance(hand.index_tip());

    let gesture = if grab_ratio < tuning.grab_ratio {
        Gesture::Grab
    } else if pinch_distance < tuning.pinch_distance {
        Gesture::Pinch
    } else {
        Gesture::Open
    };

    Classification {
        gesture,
        grab_ratio,
        pinch_distance,
    }
}

/// Map an index fingertip (mirrored camera image) to the cursor plane
pub fn fingertip_to_world(tip: Vec2) -> Vec2 {
    Vec2::new(
        (1.0 - tip.x) * CURSOR_WIDTH - CURSOR_WIDTH / 2.0,
        (1.0 - tip.y) * CURSOR_HEIGHT - CURSOR_HEIGHT / 2.0,
    )
}

/// Stateful gesture interpretation across frames
#[derive(Debug, Clone)]
pub struct GestureTracker {
    /// Smoothed (wrist x, wrist y, hand scale)
    smoothed: Vec3,
    last_timestamp: Option<f64>,
    was_grabbing: bool,
    last_fire: Option<f64>,
    /// Last OPEN-hand outputs, for the debug HUD
    pub speed: f32,
    pub wave_height: f32,
    tuning: GestureTuning,
}

impl GestureTracker {
    pub fn new(tuning: GestureTuning) -> Self {
        Self {
            smoothed: Vec3::new(0.5, 0.5, 0.2),
            last_timestamp: None,
            was_grabbing: false,
            last_fire: None,
            speed: tuning.idle_speed,
            wave_height: tuning.idle_wave_height,
            tuning,
        }
    }

    pub fn smoothed(&self) -> Vec3 {
        self.smoothed
    }

    /// OPEN hand: hand scale drives ocean speed, wrist height drives wave height
    fn open_hand_controls(&self) -> (f32, f32) {
        let t = &self.tuning;
        let diff = self.smoothed.z - t.neutral_scale;
        let gain = if diff > 0.0 { t.speed_gain_up } else { t.speed_gain_down };
        let speed = (1.0 + diff * gain).clamp(t.speed_min, t.speed_max);
        let lift = 1.0 - self.smoothed.y;
        let height = t.height_base + lift * lift * t.height_gain;
        (speed, height)
    }

    /// Consume one provider frame at scene time `now`.
    ///
    /// Returns `false` without touching `control` when the frame is stale
    /// (timestamp not newer than the last processed one).
    pub fn process(&mut self, frame: &HandFrame, now: f64, control: &mut ControlState) -> bool {
        if self.last_timestamp.is_some_and(|last| frame.timestamp <= last) {
            return false;
        }
        self.last_timestamp = Some(frame.timestamp);

        let Some(hand) = frame.hand else {
            self.was_grabbing = false;
            self.speed = self.tuning.idle_speed;
            self.wave_height = self.tuning.idle_wave_height;
            control.gesture = Gesture::None;
            control.confidence = 0.0;
            control.set_ocean_speed(self.speed);
            control.set_wave_height(self.wave_height);
            return true;
        };

        let c = classify(&hand, &self.tuning);
        control.confidence = hand.confidence;

        let alpha = self.tuning.smoothing;
        let raw = Vec3::new(hand.wrist().x, hand.wrist().y, hand.wrist().distance(hand.middle_tip()));
        self.smoothed += (raw - self.smoothed) * alpha;

        let target = fingertip_to_world(hand.index_tip());
        control.cursor += (target - control.cursor) * self.tuning.cursor_smoothing;

        match c.gesture {
            Gesture::Grab => {
                if !self.was_grabbing {
                    let ready = self
                        .last_fire
                        .is_none_or(|last| now - last > self.tuning.fire_cooldown);
                    if ready {
                        control.trigger_firework();
                        self.last_fire = Some(now);
                        log::debug!("Grab fired at {:.2}s", now);
                    }
                }
            }
            // Pinch acts through the ocean and treasures directly
            Gesture::Pinch => {}
            Gesture::Open | Gesture::None => {
                let (speed, height) = self.open_hand_controls();
                self.speed = speed;
                self.wave_height = height;
                control.set_ocean_speed(speed);
                control.set_wave_height(height);
            }
        }

        self.was_grabbing = c.gesture == Gesture::Grab;
        control.gesture = c.gesture;
        true
    }

    /// Forget all history (used when the source is re-acquired)
    pub fn reset(&mut self) {
        *self = Self::new(self.tuning.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::landmarks::*;
    use crate::sim::control::ControlCommand;

    /// Wrist at (0.5, 0.9), middle MCP 0.2 above it, curl tips at `tip_y`,
    /// thumb tip `pinch` to the right of the index tip.
    fn hand(tip_y: f32, pinch: f32) -> HandLandmarks {
        let mut points = [Vec2::new(0.5, 0.9); LANDMARK_COUNT];
        points[MIDDLE_MCP] = Vec2::new(0.5, 0.7);
        for i in CURL_TIPS {
            points[i] = Vec2::new(0.5, tip_y);
        }
        points[THUMB_TIP] = Vec2::new(0.5 + pinch, tip_y);
        HandLandmarks::new(points, 0.95)
    }

    fn frame(timestamp: f64, hand: Option<HandLandmarks>) -> HandFrame {
        HandFrame { timestamp, hand }
    }

    fn fires(control: &mut ControlState) -> usize {
        control
            .drain_commands()
            .filter(|c| *c == ControlCommand::TriggerFirework)
            .count()
    }

    #[test]
    fn test_classify_grab() {
        // Tips 0.2 from the wrist, palm 0.2: ratio 1.0
        let c = classify(&hand(0.7, 0.5), &GestureTuning::default());
        assert!((c.grab_ratio - 1.0).abs() < 1e-5);
        assert_eq!(c.gesture, Gesture::Grab);
    }

    #[test]
    fn test_classify_collapsed_palm_stays_finite() {
        // Middle MCP on top of the wrist: zero palm length
        let mut points = [Vec2::new(0.5, 0.9); LANDMARK_COUNT];
        for i in CURL_TIPS {
            points[i] = Vec2::new(0.5, 0.7);
        }
        points[THUMB_TIP] = Vec2::new(1.0, 0.7);
        let c = classify(&HandLandmarks::new(points, 0.95), &GestureTuning::default());
        assert!(c.grab_ratio.is_finite());
        assert_eq!(c.gesture, Gesture::Open);
    }

    #[test]
    fn test_classify_pinch() {
        // Tips 0.4 from the wrist: ratio 2.0
        let c = classify(&hand(0.5, 0.03), &GestureTuning::default());
        assert!((c.grab_ratio - 2.0).abs() < 1e-5);
        assert!((c.pinch_distance - 0.03).abs() < 1e-5);
        assert_eq!(c.gesture, Gesture::Pinch);
    }

    #[test]
    fn test_classify_open() {
        let c = classify(&hand(0.5, 0.5), &GestureTuning::default());
        assert_eq!(c.gesture, Gesture::Open);
    }

    #[test]
    fn test_degenerate_palm_does_not_nan() {
        let points = [Vec2::splat(0.5); LANDMARK_COUNT];
        let c = classify(&HandLandmarks::new(points, 1.0), &GestureTuning::default());
        assert!(c.grab_ratio.is_finite());
        assert_eq!(c.gesture, Gesture::Grab);
    }

    #[test]
    fn test_stale_frame_is_skipped() {
        let mut tracker = GestureTracker::new(GestureTuning::default());
        let mut control = ControlState::new();
        assert!(tracker.process(&frame(1.0, Some(hand(0.5, 0.5))), 0.0, &mut control));
        let cursor = control.cursor;
        assert!(!tracker.process(&frame(1.0, Some(hand(0.5, 0.5))), 0.1, &mut control));
        assert!(!tracker.process(&frame(0.5, Some(hand(0.5, 0.5))), 0.2, &mut control));
        assert_eq!(control.cursor, cursor);
    }

    #[test]
    fn test_grab_fires_on_rising_edge_only() {
        let mut tracker = GestureTracker::new(GestureTuning::default());
        let mut control = ControlState::new();
        for i in 0..30 {
            tracker.process(&frame(i as f64, Some(hand(0.7, 0.5))), i as f64 * 0.1, &mut control);
        }
        assert_eq!(fires(&mut control), 1);
    }

    #[test]
    fn test_grab_debounce_window() {
        let mut tracker = GestureTracker::new(GestureTuning::default());
        let mut control = ControlState::new();
        let grab = Some(hand(0.7, 0.5));
        let open = Some(hand(0.5, 0.5));

        // Two grabs 0.4 s apart: one launch
        tracker.process(&frame(1.0, grab), 0.0, &mut control);
        tracker.process(&frame(2.0, open), 0.2, &mut control);
        tracker.process(&frame(3.0, grab), 0.4, &mut control);
        assert_eq!(fires(&mut control), 1);

        // Next grab well past the cooldown: second launch
        tracker.process(&frame(4.0, open), 1.0, &mut control);
        tracker.process(&frame(5.0, grab), 1.5, &mut control);
        assert_eq!(fires(&mut control), 1);
    }

    #[test]
    fn test_no_hand_resets_to_quiescent() {
        let mut tracker = GestureTracker::new(GestureTuning::default());
        let mut control = ControlState::new();
        tracker.process(&frame(1.0, Some(hand(0.5, 0.5))), 0.0, &mut control);
        assert_eq!(control.gesture, Gesture::Open);
        control.drain_commands().for_each(drop);

        tracker.process(&frame(2.0, None), 0.1, &mut control);
        assert_eq!(control.gesture, Gesture::None);
        assert_eq!(control.confidence, 0.0);
        let commands: Vec<_> = control.drain_commands().collect();
        assert_eq!(
            commands,
            vec![ControlCommand::SetOceanSpeed(1.0), ControlCommand::SetWaveHeight(0.8)]
        );
    }

    #[test]
    fn test_open_hand_maps_speed_and_height() {
        let mut tracker = GestureTracker::new(GestureTuning::default());
        let mut control = ControlState::new();
        tracker.process(&frame(1.0, Some(hand(0.5, 0.5))), 0.0, &mut control);

        // Scale moves from 0.2 toward 0.4 by 0.1: 0.22, exactly neutral
        assert!((tracker.smoothed().z - 0.22).abs() < 1e-5);
        assert!((tracker.speed - 1.0).abs() < 1e-3);
        // Wrist y smoothed from 0.5 toward 0.9: 0.54 → 0.2 + 0.46² * 3
        assert!((tracker.wave_height - (0.2 + 0.46 * 0.46 * 3.0)).abs() < 1e-4);
    }

    #[test]
    fn test_cursor_mapping_is_mirrored() {
        assert_eq!(fingertip_to_world(Vec2::new(0.0, 0.0)), Vec2::new(25.0, 15.0));
        assert_eq!(fingertip_to_world(Vec2::new(1.0, 1.0)), Vec2::new(-25.0, -15.0));
        assert_eq!(fingertip_to_world(Vec2::new(0.5, 0.5)), Vec2::ZERO);
    }
}
