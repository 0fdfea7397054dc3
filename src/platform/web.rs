//! Browser implementations of the capability provider and render sink
//!
//! Camera capture and the hand landmark model run on the JS side. Results are
//! polled from Rust once per tick; the JS detection loop never waits on Rust
//! and Rust never waits on it.

use wasm_bindgen::prelude::*;

use super::{decode_frame, decode_status};
use crate::input::{CapabilityProvider, HandFrame, ProviderStatus};
use crate::render::{FrameGlobals, InstanceBuffer, Layer, RenderSink};

#[wasm_bindgen(inline_js = "
    const VISION_WASM = 'https://cdn.jsdelivr.net/npm/@mediapipe/tasks-vision@0.10.8/wasm';
    const VISION_MODULE = 'https://cdn.jsdelivr.net/npm/@mediapipe/tasks-vision@0.10.8';
    const HAND_MODEL = 'https://storage.googleapis.com/mediapipe-models/hand_landmarker/hand_landmarker/float16/1/hand_landmarker.task';

    const tracker = {
        generation: 0,
        status: 0,
        error: '',
        stream: null,
        video: null,
        landmarker: null,
        frameId: null,
        lastVideoTime: -1,
        timestamp: -1,
        result: new Float32Array(0),
    };

    function stopCapture() {
        if (tracker.frameId !== null) {
            cancelAnimationFrame(tracker.frameId);
            tracker.frameId = null;
        }
        if (tracker.stream) {
            tracker.stream.getTracks().forEach((t) => t.stop());
            tracker.stream = null;
        }
        if (tracker.video) {
            tracker.video.srcObject = null;
            tracker.video = null;
        }
        if (tracker.landmarker) {
            tracker.landmarker.close();
            tracker.landmarker = null;
        }
        tracker.lastVideoTime = -1;
        tracker.timestamp = -1;
        tracker.result = new Float32Array(0);
    }

    function detect(generation) {
        if (generation !== tracker.generation || !tracker.landmarker || !tracker.video) return;
        const video = tracker.video;
        if (video.readyState >= 2 && video.currentTime !== tracker.lastVideoTime) {
            tracker.lastVideoTime = video.currentTime;
            const now = performance.now();
            const found = tracker.landmarker.detectForVideo(video, now);
            const hand = found.landmarks && found.landmarks[0];
            if (hand) {
                const out = new Float32Array(hand.length * 2 + 1);
                hand.forEach((p, i) => { out[i * 2] = p.x; out[i * 2 + 1] = p.y; });
                const score = found.handednesses && found.handednesses[0] && found.handednesses[0][0];
                out[out.length - 1] = score ? score.score : 0;
                tracker.result = out;
            } else {
                tracker.result = new Float32Array(0);
            }
            tracker.timestamp = now / 1000;
        }
        tracker.frameId = requestAnimationFrame(() => detect(generation));
    }

    async function acquire(generation) {
        if (!navigator.mediaDevices || !navigator.mediaDevices.getUserMedia) {
            tracker.status = 4;
            return;
        }
        let stream;
        try {
            stream = await navigator.mediaDevices.getUserMedia({ video: { width: 320, height: 240 } });
        } catch (e) {
            if (generation === tracker.generation) tracker.status = 3;
            return;
        }
        if (generation !== tracker.generation) {
            stream.getTracks().forEach((t) => t.stop());
            return;
        }
        tracker.stream = stream;

        let landmarker;
        try {
            const vision = await import(VISION_MODULE);
            const files = await vision.FilesetResolver.forVisionTasks(VISION_WASM);
            landmarker = await vision.HandLandmarker.createFromOptions(files, {
                baseOptions: { modelAssetPath: HAND_MODEL, delegate: 'GPU' },
                runningMode: 'VIDEO',
                numHands: 1,
                minHandDetectionConfidence: 0.5,
                minHandPresenceConfidence: 0.5,
                minTrackingConfidence: 0.5,
            });
        } catch (e) {
            if (generation === tracker.generation) {
                stopCapture();
                tracker.error = String(e && e.message ? e.message : e);
                tracker.status = 5;
            }
            return;
        }
        if (generation !== tracker.generation) {
            landmarker.close();
            return;
        }
        tracker.landmarker = landmarker;

        const video = document.createElement('video');
        video.autoplay = true;
        video.playsInline = true;
        video.muted = true;
        video.srcObject = stream;
        tracker.video = video;
        try {
            await video.play();
        } catch (e) {
            // autoplay may be refused; readyState gating in detect() covers it
        }
        if (generation !== tracker.generation) return;
        tracker.status = 2;
        detect(generation);
    }

    export function tracker_acquire() {
        tracker.generation += 1;
        stopCapture();
        tracker.status = 1;
        tracker.error = '';
        acquire(tracker.generation);
    }

    export function tracker_release() {
        tracker.generation += 1;
        stopCapture();
        tracker.status = 0;
    }

    export function tracker_status() { return tracker.status; }
    export function tracker_error() { return tracker.error; }
    export function tracker_timestamp() { return tracker.timestamp; }
    export function tracker_result() { return tracker.result; }

    export function render_begin(globals) {
        const r = window.tideLightsRenderer;
        if (r && r.beginFrame) r.beginFrame(globals);
    }
    export function render_layer(name, bytes, count) {
        const r = window.tideLightsRenderer;
        if (r && r.submitLayer) r.submitLayer(name, bytes, count);
    }
    export function render_end() {
        const r = window.tideLightsRenderer;
        if (r && r.endFrame) r.endFrame();
    }
")]
extern "C" {
    fn tracker_acquire();
    fn tracker_release();
    fn tracker_status() -> u32;
    fn tracker_error() -> String;
    fn tracker_timestamp() -> f64;
    fn tracker_result() -> js_sys::Float32Array;

    fn render_begin(globals: &[u8]);
    fn render_layer(name: &str, bytes: &[u8], count: u32);
    fn render_end();
}

/// Webcam + hand landmarker running in the page
///
/// Only one tracker is live at a time; acquiring again restarts the page-wide
/// capture from scratch.
#[derive(Debug, Default)]
pub struct BrowserHandTracker {
    acquired: bool,
}

impl BrowserHandTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CapabilityProvider for BrowserHandTracker {
    fn acquire(&mut self) {
        log::info!("Requesting camera and hand model");
        tracker_acquire();
        self.acquired = true;
    }

    fn status(&self) -> ProviderStatus {
        if !self.acquired {
            return ProviderStatus::Idle;
        }
        decode_status(tracker_status(), &tracker_error())
    }

    fn latest(&mut self) -> Option<HandFrame> {
        if !self.acquired {
            return None;
        }
        decode_frame(tracker_timestamp(), &tracker_result().to_vec())
    }

    fn release(&mut self) {
        if self.acquired {
            tracker_release();
            self.acquired = false;
            log::info!("Camera capture stopped");
        }
    }
}

impl Drop for BrowserHandTracker {
    fn drop(&mut self) {
        self.release();
    }
}

/// Forwards each published frame to `window.tideLightsRenderer`
#[derive(Debug, Default)]
pub struct JsRenderSink {
    frames: u64,
}

impl JsRenderSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl RenderSink for JsRenderSink {
    fn begin_frame(&mut self, globals: &FrameGlobals) {
        render_begin(bytemuck::bytes_of(globals));
    }

    fn submit_layer(&mut self, layer: Layer, instances: &InstanceBuffer) {
        render_layer(layer.as_str(), instances.as_bytes(), instances.len() as u32);
    }

    fn end_frame(&mut self) {
        render_end();
        self.frames += 1;
    }
}
