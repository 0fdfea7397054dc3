//! 21-point hand landmark model
//!
//! Coordinates are normalized to the camera image: x and y in [0, 1], origin at
//! the top-left, x not mirrored.

use glam::Vec2;

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// Fingertips measured against the wrist for the grab ratio (thumb excluded)
pub const CURL_TIPS: [usize; 4] = [INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// One detected hand
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandLandmarks {
    pub points: [Vec2; LANDMARK_COUNT],
    /// Handedness score reported by the detector, in [0, 1]
    pub confidence: f32,
}

impl HandLandmarks {
    pub fn new(points: [Vec2; LANDMARK_COUNT], confidence: f32) -> Self {
        Self {
            points,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Build from a flat `[x0, y0, x1, y1, ...]` slice. `None` unless it holds 21 points.
    pub fn from_flat(coords: &[f32], confidence: f32) -> Option<Self> {
        if coords.len() != LANDMARK_COUNT * 2 {
            return None;
        }
        let mut points = [Vec2::ZERO; LANDMARK_COUNT];
        for (p, xy) in points.iter_mut().zip(coords.chunks_exact(2)) {
            *p = Vec2::new(xy[0], xy[1]);
        }
        Some(Self::new(points, confidence))
    }

    #[inline]
    pub fn get(&self, index: usize) -> Vec2 {
        self.points[index]
    }

    pub fn wrist(&self) -> Vec2 {
        self.points[WRIST]
    }

    pub fn thumb_tip(&self) -> Vec2 {
        self.points[THUMB_TIP]
    }

    pub fn index_tip(&self) -> Vec2 {
        self.points[INDEX_TIP]
    }

    pub fn middle_mcp(&self) -> Vec2 {
        self.points[MIDDLE_MCP]
    }

    pub fn middle_tip(&self) -> Vec2 {
        self.points[MIDDLE_TIP]
    }
}

/// One sample from a capability provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandFrame {
    /// Monotonically increasing source timestamp (seconds); repeats mean "no new data"
    pub timestamp: f64,
    pub hand: Option<HandLandmarks>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flat_requires_all_points() {
        assert!(HandLandmarks::from_flat(&[0.0; 10], 1.0).is_none());
        let mut coords = [0.0; 42];
        coords[INDEX_TIP * 2] = 0.25;
        coords[INDEX_TIP * 2 + 1] = 0.75;
        let hand = HandLandmarks::from_flat(&coords, 2.0).unwrap();
        assert_eq!(hand.index_tip(), Vec2::new(0.25, 0.75));
        assert_eq!(hand.confidence, 1.0);
    }
}
