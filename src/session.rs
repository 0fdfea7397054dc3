//! Application shell
//!
//! Screen flow (title ↔ main), the fixed-timestep accumulator, and publication
//! of every layer to the render sink once per display frame. Within a substep
//! the input source always runs before the simulation.

use crate::camera::{CameraRig, OrbitCamera};
use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::input::{
    CapabilityProvider, GestureSource, InputMode, InputSource, InputUnifier, PointerEvent, PointerResponse,
    PointerSource, ProviderStatus,
};
use crate::render::{FrameGlobals, Layer, RenderSink};
use crate::settings::Settings;
use crate::sim::control::Gesture;
use crate::sim::scene::{Scene, SceneLayers};
use crate::sim::tick::tick;
use crate::sim::treasure::{Collected, TreasureVariant};
use crate::tuning::Tuning;

/// Top-level screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Title,
    Main(InputMode),
}

/// Aggregate of the ticks run for one display frame
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    pub substeps: u32,
    pub collected: Vec<Collected>,
    pub reward_started: bool,
    pub reward_ended: bool,
}

fn gesture_code(gesture: Gesture) -> u32 {
    match gesture {
        Gesture::None => 0,
        Gesture::Open => 1,
        Gesture::Grab => 2,
        Gesture::Pinch => 3,
    }
}

pub struct Session {
    screen: Screen,
    settings: Settings,
    base_tuning: Tuning,
    scene: Option<Scene>,
    input: InputUnifier,
    camera: OrbitCamera,
    rig: CameraRig,
    layers: SceneLayers,
    accumulator: f32,
    seed: u64,
    variant: TreasureVariant,
    scenes_started: u64,
}

impl Session {
    pub fn new(settings: Settings, base_tuning: Tuning, seed: u64) -> Self {
        let rig = CameraRig::new(!settings.reduced_motion);
        Self {
            screen: Screen::Title,
            settings,
            base_tuning,
            scene: None,
            input: InputUnifier::new(),
            camera: OrbitCamera::new(16.0 / 9.0),
            rig,
            layers: SceneLayers::default(),
            accumulator: 0.0,
            seed,
            variant: TreasureVariant::Anchored,
            scenes_started: 0,
        }
    }

    pub fn with_variant(mut self, variant: TreasureVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn input_status(&self) -> ProviderStatus {
        self.input.status()
    }

    pub fn banner_visible(&self) -> bool {
        self.scene.as_ref().is_some_and(|s| s.reward.banner_open())
    }

    pub fn banner_generation(&self) -> u32 {
        self.scene.as_ref().map_or(0, |s| s.reward.banner_generation())
    }

    pub fn collected(&self) -> u32 {
        self.scene.as_ref().map_or(0, |s| s.treasures.collected())
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.camera.set_aspect(aspect);
    }

    /// Apply new preferences; takes effect for the next scene except reduced motion
    pub fn update_settings(&mut self, settings: Settings) {
        self.rig.enabled = !settings.reduced_motion;
        self.settings = settings;
        self.settings.save();
    }

    /// Build a fresh scene and hand the control state to `source`
    pub fn enter_main(&mut self, source: Box<dyn InputSource>) {
        self.return_to_menu();

        let mode = source.mode();
        let tuning = self.settings.tuning(&self.base_tuning);
        let seed = self.seed.wrapping_add(self.scenes_started);
        let mut scene = Scene::new(seed, tuning, self.variant);
        self.input.switch_to(source, &mut scene.control);

        self.scene = Some(scene);
        self.scenes_started += 1;
        self.camera = OrbitCamera::new(self.camera.aspect);
        self.accumulator = 0.0;
        self.screen = Screen::Main(mode);
        if self.settings.preferred_input != mode {
            self.settings.preferred_input = mode;
            self.settings.save();
        }
        log::info!("Entered main screen ({})", mode.as_str());
    }

    pub fn enter_pointer(&mut self) {
        self.enter_main(Box::new(PointerSource::new()));
    }

    pub fn enter_gesture<P: CapabilityProvider + 'static>(&mut self, provider: P) {
        let source = GestureSource::new(provider, self.base_tuning.gesture.clone());
        self.enter_main(Box::new(source));
    }

    /// Synchronous teardown: input released, timers cancelled, pools freed
    pub fn return_to_menu(&mut self) {
        if let Some(mut scene) = self.scene.take() {
            self.input.teardown(&mut scene.control);
            scene.reset();
            log::info!("Returned to title screen");
        }
        self.accumulator = 0.0;
        self.screen = Screen::Title;
    }

    pub fn on_pointer(&mut self, event: PointerEvent) -> PointerResponse {
        match self.scene.as_mut() {
            Some(scene) => self.input.on_pointer(event, &mut scene.control),
            None if event == PointerEvent::ContextMenu => PointerResponse::PreventDefault,
            None => PointerResponse::Default,
        }
    }

    /// Re-acquire the gesture capability after a failure
    pub fn retry_input(&mut self) {
        if let Some(scene) = self.scene.as_mut() {
            self.input.retry(&mut scene.control);
        }
    }

    /// Run the simulation for one display frame of `dt` seconds
    pub fn update(&mut self, dt: f32) -> FrameReport {
        let mut report = FrameReport::default();
        let (Some(scene), Screen::Main(mode)) = (self.scene.as_mut(), self.screen) else {
            return report;
        };

        let dt = dt.clamp(0.0, 0.1);
        self.accumulator += dt;

        while self.accumulator >= SIM_DT && report.substeps < MAX_SUBSTEPS {
            self.input.update(scene.clock, &mut scene.control);
            self.rig.update(&mut self.camera, mode, &scene.control, SIM_DT);

            let tick_report = tick(scene, &self.camera, SIM_DT);
            report.collected.extend(tick_report.collected);
            report.reward_started |= tick_report.reward_started;
            report.reward_ended |= tick_report.reward_ended;

            self.accumulator -= SIM_DT;
            report.substeps += 1;
        }
        // Drop backlog instead of spiraling
        if report.substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        report
    }

    /// Publish every layer to the sink
    pub fn render(&mut self, sink: &mut dyn RenderSink) {
        let Some(scene) = self.scene.as_ref() else {
            return;
        };
        scene.write_layers(&mut self.layers);

        let globals = FrameGlobals::new(
            self.camera.view_proj(),
            self.camera.eye(),
            scene.clock as f32,
            scene.control.cursor,
            gesture_code(scene.control.gesture),
            scene.reward.banner_open(),
            scene.reward.banner_generation(),
            scene.treasures.collected(),
        );
        sink.begin_frame(&globals);
        for layer in Layer::ALL {
            sink.submit_layer(layer, self.layers.get(layer));
        }
        sink.end_frame();
    }

    /// `update` then `render`
    pub fn frame(&mut self, dt: f32, sink: &mut dyn RenderSink) -> FrameReport {
        let report = self.update(dt);
        self.render(sink);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{PointerButton, ScriptedProvider};
    use crate::render::FrameStats;
    use crate::settings::QualityPreset;
    use crate::sim::mode::FireworkMode;
    use glam::Vec2;

    fn session() -> Session {
        let settings = Settings {
            quality: QualityPreset::Low,
            ..Default::default()
        };
        Session::new(settings, Tuning::default(), 17)
    }

    #[test]
    fn test_title_screen_publishes_nothing() {
        let mut s = session();
        let mut stats = FrameStats::new();
        let report = s.frame(1.0 / 60.0, &mut stats);
        assert_eq!(report.substeps, 0);
        assert_eq!(stats.frames, 0);
    }

    #[test]
    fn test_pointer_click_launches_and_publishes() {
        let mut s = session();
        s.enter_pointer();
        assert_eq!(s.screen(), Screen::Main(InputMode::Pointer));

        s.on_pointer(PointerEvent::Move(Vec2::new(0.2, 0.1)));
        s.on_pointer(PointerEvent::Down(PointerButton::Primary));
        let mut stats = FrameStats::new();
        let report = s.frame(1.0 / 60.0 + 1e-4, &mut stats);
        assert_eq!(report.substeps, 1);
        assert_eq!(stats.frames, 1);
        assert!(stats.visible(Layer::Rockets) >= 4);
        assert_eq!(stats.capacity(Layer::Ocean), 4000);
        assert_eq!(stats.capacity(Layer::Sparks), 1200);
        assert_eq!(stats.capacity(Layer::Treasures), 3);
    }

    #[test]
    fn test_substeps_are_capped() {
        let mut s = session();
        s.enter_pointer();
        let mut stats = FrameStats::new();
        let report = s.frame(1.0, &mut stats);
        assert_eq!(report.substeps, MAX_SUBSTEPS);
    }

    #[test]
    fn test_return_to_menu_tears_everything_down() {
        let mut s = session();
        s.enter_pointer();
        if let Some(scene) = s.scene_mut() {
            scene.control.trigger_treasure_sequence();
        }
        let mut stats = FrameStats::new();
        s.frame(1.0 / 30.0, &mut stats);
        assert_eq!(s.scene().map(|sc| sc.mode()), Some(FireworkMode::Continuous));
        assert!(s.banner_visible());
        assert_eq!(s.banner_generation(), 1);

        s.return_to_menu();
        assert_eq!(s.screen(), Screen::Title);
        assert!(s.scene().is_none());
        assert_eq!(s.input_status(), ProviderStatus::Idle);

        let frames = stats.frames;
        s.frame(1.0 / 60.0, &mut stats);
        assert_eq!(stats.frames, frames);
    }

    #[test]
    fn test_reduced_motion_freezes_camera() {
        let mut s = session();
        let settings = Settings {
            reduced_motion: true,
            ..s.settings().clone()
        };
        s.update_settings(settings);
        s.enter_pointer();
        let before = s.camera().eye();
        s.on_pointer(PointerEvent::Move(Vec2::new(1.0, 1.0)));
        let mut stats = FrameStats::new();
        for _ in 0..30 {
            s.frame(1.0 / 60.0, &mut stats);
        }
        assert_eq!(s.camera().eye(), before);
    }

    #[test]
    fn test_roaming_variant_publishes_eight_treasures() {
        let mut s = session().with_variant(TreasureVariant::Roaming);
        s.enter_pointer();
        let mut stats = FrameStats::new();
        s.frame(1.0 / 60.0, &mut stats);
        assert_eq!(stats.capacity(Layer::Treasures), 8);
    }

    #[test]
    fn test_switching_to_gesture_releases_pointer() {
        let mut s = session();
        s.enter_pointer();
        s.enter_gesture(ScriptedProvider::default());
        assert_eq!(s.screen(), Screen::Main(InputMode::Gesture));
        assert!(s.input_status().is_ready());

        // Pointer presses do nothing in gesture mode
        s.on_pointer(PointerEvent::Down(PointerButton::Primary));
        assert_eq!(s.scene().map(|sc| sc.control.gesture), Some(Gesture::None));
    }
}
