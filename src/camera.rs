//! Orbit camera, cursor-driven camera rig, and world-to-screen projection

use glam::{Mat4, Vec2, Vec3};
use std::f32::consts::{FRAC_PI_2, PI};

use crate::consts::EPSILON;
use crate::input::InputMode;
use crate::lerp;
use crate::sim::control::{ControlState, Gesture};

/// Maps a world-space point to normalized device coordinates (x, y in [-1, 1] when on screen)
pub trait Projector {
    fn world_to_screen(&self, point: Vec3) -> Vec2;
}

/// Camera orbiting a target on a sphere (azimuth around +Y, polar from +Y)
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub radius: f32,
    pub azimuth: f32,
    pub polar: f32,
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl OrbitCamera {
    pub const MIN_POLAR: f32 = PI / 3.0;
    pub const MAX_POLAR: f32 = FRAC_PI_2 - 0.05;

    /// Default scene camera: eye at (0, 4, 14) looking at the origin, 45 degree fov
    pub fn new(aspect: f32) -> Self {
        Self::from_eye(Vec3::new(0.0, 4.0, 14.0), Vec3::ZERO, 45f32.to_radians(), aspect)
    }

    pub fn from_eye(eye: Vec3, target: Vec3, fov_y: f32, aspect: f32) -> Self {
        let offset = eye - target;
        let radius = offset.length().max(EPSILON);
        Self {
            target,
            radius,
            azimuth: offset.x.atan2(offset.z),
            polar: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            fov_y,
            aspect: aspect.max(EPSILON),
            near: 0.1,
            far: 1000.0,
        }
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect.max(EPSILON);
    }

    pub fn eye(&self) -> Vec3 {
        let s = self.polar.sin();
        self.target
            + self.radius * Vec3::new(s * self.azimuth.sin(), self.polar.cos(), s * self.azimuth.cos())
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

impl Projector for OrbitCamera {
    fn world_to_screen(&self, point: Vec3) -> Vec2 {
        let clip = self.view_proj() * point.extend(1.0);
        let w = if clip.w.abs() < EPSILON {
            EPSILON.copysign(clip.w)
        } else {
            clip.w
        };
        Vec2::new(clip.x / w, clip.y / w)
    }
}

/// Steers the orbit camera from the cursor
///
/// Pointer mode drives the rig continuously with low sensitivity. Gesture mode
/// only steers while a confident open hand is tracked.
#[derive(Debug, Clone)]
pub struct CameraRig {
    pub enabled: bool,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl CameraRig {
    const MIN_TARGET_POLAR: f32 = PI / 3.5;
    const MAX_TARGET_POLAR: f32 = FRAC_PI_2 - 0.1;
    const DAMPING: f32 = 3.0;

    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Sensitivity (azimuth, polar) when the rig is active for this frame
    fn sensitivity(mode: InputMode, control: &ControlState) -> Option<(f32, f32)> {
        match mode {
            InputMode::Pointer => Some((0.05, 0.04)),
            InputMode::Gesture => {
                (control.confidence > 0.5 && control.gesture == Gesture::Open).then_some((0.1, 0.08))
            }
        }
    }

    pub fn update(&self, camera: &mut OrbitCamera, mode: InputMode, control: &ControlState, dt: f32) {
        if !self.enabled {
            return;
        }
        let Some((sx, sy)) = Self::sensitivity(mode, control) else {
            return;
        };

        let target_azimuth = -(control.cursor.x * sx);
        let target_polar = (PI / 2.3 - control.cursor.y * sy)
            .clamp(Self::MIN_TARGET_POLAR, Self::MAX_TARGET_POLAR);

        let damp = (Self::DAMPING * dt).clamp(0.0, 1.0);
        camera.azimuth = lerp(camera.azimuth, target_azimuth, damp);
        camera.polar = lerp(camera.polar, target_polar, damp)
            .clamp(OrbitCamera::MIN_POLAR, OrbitCamera::MAX_POLAR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_eye_matches_scene_camera() {
        let cam = OrbitCamera::new(16.0 / 9.0);
        let eye = cam.eye();
        assert!((eye - Vec3::new(0.0, 4.0, 14.0)).length() < 1e-4);
    }

    #[test]
    fn test_target_projects_to_center() {
        let cam = OrbitCamera::new(1.0);
        let ndc = cam.world_to_screen(Vec3::ZERO);
        assert!(ndc.length() < 1e-5);
    }

    #[test]
    fn test_projection_preserves_left_right() {
        let cam = OrbitCamera::new(1.0);
        assert!(cam.world_to_screen(Vec3::new(3.0, 0.0, 0.0)).x > 0.0);
        assert!(cam.world_to_screen(Vec3::new(-3.0, 0.0, 0.0)).x < 0.0);
        assert!(cam.world_to_screen(Vec3::new(0.0, 3.0, 0.0)).y > 0.0);
    }

    #[test]
    fn test_projection_at_eye_is_finite() {
        let cam = OrbitCamera::new(1.0);
        assert!(cam.world_to_screen(cam.eye()).is_finite());
    }

    #[test]
    fn test_gesture_rig_waits_for_open_hand() {
        let rig = CameraRig::default();
        let mut cam = OrbitCamera::new(1.0);
        let before = cam.azimuth;

        let mut control = ControlState::new();
        control.cursor = Vec2::new(20.0, 0.0);
        control.gesture = Gesture::Grab;
        control.confidence = 0.9;
        rig.update(&mut cam, InputMode::Gesture, &control, 1.0 / 60.0);
        assert_eq!(cam.azimuth, before);

        control.gesture = Gesture::Open;
        rig.update(&mut cam, InputMode::Gesture, &control, 1.0 / 60.0);
        assert!(cam.azimuth < before);
    }

    #[test]
    fn test_polar_stays_clamped() {
        let rig = CameraRig::default();
        let mut cam = OrbitCamera::new(1.0);
        let mut control = ControlState::new();
        control.cursor = Vec2::new(0.0, -1000.0);
        for _ in 0..1000 {
            rig.update(&mut cam, InputMode::Pointer, &control, 0.1);
        }
        assert!(cam.polar <= OrbitCamera::MAX_POLAR + 1e-6);
        assert!(cam.polar >= OrbitCamera::MIN_POLAR - 1e-6);
    }

    #[test]
    fn test_disabled_rig_is_still() {
        let rig = CameraRig::new(false);
        let mut cam = OrbitCamera::new(1.0);
        let before = (cam.azimuth, cam.polar);
        let mut control = ControlState::new();
        control.cursor = Vec2::new(10.0, 10.0);
        rig.update(&mut cam, InputMode::Pointer, &control, 0.1);
        assert_eq!((cam.azimuth, cam.polar), before);
    }
}
