//! Platform abstraction layer
//!
//! Browser glue for the two things the core cannot do itself:
//! - Camera capture + hand landmark model (a `CapabilityProvider`)
//! - Handing instance buffers to the JS renderer (a `RenderSink`)
//!
//! The JS side speaks in flat numbers. The decoding from those numbers into
//! core types lives here so it is testable off the browser.

#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(target_arch = "wasm32")]
pub use web::{BrowserHandTracker, JsRenderSink};

use crate::input::{CapabilityError, HandFrame, HandLandmarks, ProviderStatus};
use crate::input::landmarks::LANDMARK_COUNT;

/// Length of one detected hand on the wire: 21 (x, y) pairs then the score
pub const HAND_WIRE_LEN: usize = LANDMARK_COUNT * 2 + 1;

/// Tracker status codes shared with the JS bridge
pub mod status_code {
    pub const IDLE: u32 = 0;
    pub const ACQUIRING: u32 = 1;
    pub const READY: u32 = 2;
    pub const DENIED: u32 = 3;
    pub const UNSUPPORTED: u32 = 4;
    pub const MODEL_LOAD: u32 = 5;
}

/// Status code plus the last error message reported by the bridge
pub fn decode_status(code: u32, message: &str) -> ProviderStatus {
    match code {
        status_code::ACQUIRING => ProviderStatus::Acquiring,
        status_code::READY => ProviderStatus::Ready,
        status_code::DENIED => ProviderStatus::Unavailable(CapabilityError::PermissionDenied),
        status_code::UNSUPPORTED => ProviderStatus::Unavailable(CapabilityError::Unsupported),
        status_code::MODEL_LOAD => {
            ProviderStatus::Unavailable(CapabilityError::ModelLoad(message.to_string()))
        }
        _ => ProviderStatus::Idle,
    }
}

/// A result from the bridge.
///
/// A negative timestamp means nothing has been detected yet. An empty payload
/// is a processed frame with no hand in view. Anything else must be exactly
/// one hand on the wire.
pub fn decode_frame(timestamp: f64, data: &[f32]) -> Option<HandFrame> {
    if timestamp < 0.0 {
        return None;
    }
    if data.is_empty() {
        return Some(HandFrame { timestamp, hand: None });
    }
    if data.len() != HAND_WIRE_LEN {
        log::warn!("Dropping malformed hand result ({} values)", data.len());
        return None;
    }
    let hand = HandLandmarks::from_flat(&data[..HAND_WIRE_LEN - 1], data[HAND_WIRE_LEN - 1])?;
    Some(HandFrame {
        timestamp,
        hand: Some(hand),
    })
}
