//! Tide Lights entry point
//!
//! Handles platform-specific initialization and runs the frame loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, MouseEvent};

    use tide_lights::consts::SIM_DT;
    use tide_lights::input::pointer::normalize_client;
    use tide_lights::input::{InputMode, PointerButton, PointerEvent, PointerResponse, ProviderStatus};
    use tide_lights::platform::{BrowserHandTracker, JsRenderSink};
    use tide_lights::{Screen, Session, Settings, Tuning};

    type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

    /// Application instance shared by every DOM callback
    struct App {
        session: Session,
        sink: JsRenderSink,
        last_time: f64,
        /// Pending animation frame, cancelled on return to the title screen
        frame_id: Option<i32>,
        shown_generation: u32,
        shown_collected: u32,
        shown_status: Option<ProviderStatus>,
    }

    impl App {
        fn new(session: Session) -> Self {
            Self {
                session,
                sink: JsRenderSink::new(),
                last_time: 0.0,
                frame_id: None,
                shown_generation: 0,
                shown_collected: u32::MAX,
                shown_status: None,
            }
        }

        fn frame(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                ((time - self.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            self.last_time = time;

            let report = self.session.frame(dt, &mut self.sink);
            if report.reward_ended {
                log::debug!("Celebration finished");
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&mut self, document: &Document) {
            let collected = self.session.collected();
            if collected != self.shown_collected {
                if let Some(el) = document.query_selector("#hud-collected .hud-value").ok().flatten() {
                    el.set_text_content(Some(&collected.to_string()));
                }
                self.shown_collected = collected;
            }

            // Banner: a new generation restarts its animation
            if let Some(el) = document.get_element_by_id("reward-banner") {
                let generation = self.session.banner_generation();
                if generation != self.shown_generation {
                    let _ = el.set_attribute("class", "");
                    let _ = el.client_width();
                    self.shown_generation = generation;
                }
                let class = if self.session.banner_visible() { "show" } else { "hidden" };
                let _ = el.set_attribute("class", class);
            }

            let status = self.session.input_status();
            if self.shown_status.as_ref() != Some(&status) {
                set_hidden(document, "gesture-loading", status != ProviderStatus::Acquiring);
                let failed = matches!(status, ProviderStatus::Unavailable(_));
                set_hidden(document, "gesture-error", !failed);
                if let ProviderStatus::Unavailable(e) = &status {
                    if let Some(el) = document.get_element_by_id("gesture-error-msg") {
                        el.set_text_content(Some(&e.to_string()));
                    }
                }
                self.shown_status = Some(status);
            }

            if self.session.settings().show_debug_hud {
                if let Some(el) = document.get_element_by_id("debug-hud") {
                    let text = self.session.scene().map(|s| {
                        format!(
                            "{} {:.0}% | mode {}",
                            s.control.gesture.as_str(),
                            s.control.confidence * 100.0,
                            s.mode().as_str()
                        )
                    });
                    el.set_text_content(text.as_deref());
                }
            }
        }
    }

    fn set_hidden(document: &Document, id: &str, hidden: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if hidden { "hidden" } else { "" });
        }
    }

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Tide Lights starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;
        resize_canvas(&window, &canvas);

        let settings = Settings::load();
        let seed = js_sys::Date::now() as u64;
        let mut session = Session::new(settings, Tuning::default(), seed);
        session.set_aspect(aspect_of(&canvas));
        log::info!("Session initialized with seed: {}", seed);

        let app = Rc::new(RefCell::new(App::new(session)));
        let tick: FrameCallback = Rc::new(RefCell::new(None));
        install_frame_callback(app.clone(), tick.clone());

        setup_pointer_handlers(&canvas, app.clone())?;
        setup_menu(&document, app.clone(), tick.clone())?;
        setup_resize(&window, &canvas, app)?;

        log::info!("Tide Lights ready");
        Ok(())
    }

    fn aspect_of(canvas: &HtmlCanvasElement) -> f32 {
        canvas.client_width().max(1) as f32 / canvas.client_height().max(1) as f32
    }

    fn resize_canvas(window: &web_sys::Window, canvas: &HtmlCanvasElement) {
        let dpr = window.device_pixel_ratio();
        canvas.set_width((canvas.client_width() as f64 * dpr) as u32);
        canvas.set_height((canvas.client_height() as f64 * dpr) as u32);
    }

    /// Builds the self-rescheduling animation frame closure
    fn install_frame_callback(app: Rc<RefCell<App>>, tick: FrameCallback) {
        let next = tick.clone();
        *tick.borrow_mut() = Some(Closure::<dyn FnMut(f64)>::new(move |time: f64| {
            let mut a = app.borrow_mut();
            a.frame_id = None;
            if !matches!(a.session.screen(), Screen::Main(_)) {
                return;
            }
            a.frame(time);
            if let Some(document) = document() {
                a.update_hud(&document);
            }
            a.frame_id = schedule(&next);
        }));
    }

    fn schedule(tick: &FrameCallback) -> Option<i32> {
        let window = web_sys::window()?;
        let callback = tick.borrow();
        let closure = callback.as_ref()?;
        window
            .request_animation_frame(closure.as_ref().unchecked_ref())
            .ok()
    }

    fn cancel(app: &mut App) {
        if let Some(id) = app.frame_id.take() {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(id);
            }
        }
        app.last_time = 0.0;
    }

    fn show_screen(document: &Document, screen: Screen) {
        let main = matches!(screen, Screen::Main(_));
        set_hidden(document, "title-screen", main);
        set_hidden(document, "hud", !main);
        set_hidden(document, "gesture-loading", true);
        set_hidden(document, "gesture-error", true);
    }

    fn setup_menu(document: &Document, app: Rc<RefCell<App>>, tick: FrameCallback) -> Result<(), JsValue> {
        // Pre-select the last used mode
        let preferred = app.borrow().session.settings().preferred_input;
        let preferred_id = match preferred {
            InputMode::Pointer => "pointer-btn",
            InputMode::Gesture => "gesture-btn",
        };
        if let Some(btn) = document.get_element_by_id(preferred_id) {
            let _ = btn.class_list().add_1("preferred");
        }

        for mode in [InputMode::Pointer, InputMode::Gesture] {
            let id = match mode {
                InputMode::Pointer => "pointer-btn",
                InputMode::Gesture => "gesture-btn",
            };
            let Some(btn) = document.get_element_by_id(id) else {
                log::warn!("Missing menu button #{}", id);
                continue;
            };
            let app = app.clone();
            let tick = tick.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut a = app.borrow_mut();
                cancel(&mut a);
                match mode {
                    InputMode::Pointer => a.session.enter_pointer(),
                    InputMode::Gesture => a.session.enter_gesture(BrowserHandTracker::new()),
                }
                a.shown_status = None;
                if let Some(document) = document() {
                    show_screen(&document, a.session.screen());
                }
                a.frame_id = schedule(&tick);
            });
            btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("back-btn") {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut a = app.borrow_mut();
                cancel(&mut a);
                a.session.return_to_menu();
                if let Some(document) = document() {
                    show_screen(&document, a.session.screen());
                }
            });
            btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("retry-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut a = app.borrow_mut();
                a.session.retry_input();
                a.shown_status = None;
            });
            btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        Ok(())
    }

    fn setup_pointer_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) -> Result<(), JsValue> {
        let handlers: [(&str, fn(&MouseEvent, &HtmlCanvasElement) -> PointerEvent); 4] = [
            ("mousemove", |event, canvas| {
                PointerEvent::Move(normalize_client(
                    event.offset_x() as f32,
                    event.offset_y() as f32,
                    canvas.client_width() as f32,
                    canvas.client_height() as f32,
                ))
            }),
            ("mousedown", |event, _| PointerEvent::Down(PointerButton::from_code(event.button()))),
            ("mouseup", |event, _| PointerEvent::Up(PointerButton::from_code(event.button()))),
            ("contextmenu", |_, _| PointerEvent::ContextMenu),
        ];

        for (name, to_event) in handlers {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let pointer = to_event(&event, &canvas_clone);
                let response = app.borrow_mut().session.on_pointer(pointer);
                if response == PointerResponse::PreventDefault {
                    event.prevent_default();
                }
            });
            canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    fn setup_resize(
        window: &web_sys::Window,
        canvas: &HtmlCanvasElement,
        app: Rc<RefCell<App>>,
    ) -> Result<(), JsValue> {
        let canvas = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            if let Some(window) = web_sys::window() {
                resize_canvas(&window, &canvas);
            }
            app.borrow_mut().session.set_aspect(aspect_of(&canvas));
        });
        window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_app::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless run: a scripted hand drives a scene for a while and frame stats are logged
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use tide_lights::render::{FrameStats, Layer};
    use tide_lights::{Session, Settings, Tuning};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Tide Lights (native) starting...");

    let tuning = match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| Tuning::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path);
                tuning
            }
            Err(e) => {
                log::error!("Could not load tuning from {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => Tuning::default(),
    };

    let mut session = Session::new(Settings::load(), tuning, 42);
    session.enter_gesture(headless::scripted_hand());

    let mut stats = FrameStats::new();
    let mut collected = 0;
    let seconds = 25;
    for frame in 0..seconds * 60 {
        let report = session.frame(1.0 / 60.0, &mut stats);
        collected += report.collected.len();
        if report.reward_started {
            log::info!("Celebration started at frame {}", frame);
        }
        if frame % 300 == 0 {
            log::info!(
                "frame {:5}: rockets {:3} sparks {:5}/{} ocean {}",
                frame,
                stats.visible(Layer::Rockets),
                stats.visible(Layer::Sparks),
                stats.capacity(Layer::Sparks),
                stats.visible(Layer::Ocean),
            );
        }
    }

    // The scripted hand never finds treasure; kick off one celebration by hand
    if let Some(scene) = session.scene_mut() {
        scene.control.trigger_treasure_sequence();
    }
    for _ in 0..120 {
        session.frame(1.0 / 60.0, &mut stats);
    }
    log::info!(
        "Published {} frames, {} treasures collected, mode {}",
        stats.frames,
        collected,
        session.scene().map_or("none", |s| s.mode().as_str()),
    );

    session.return_to_menu();
    log::info!("Tide Lights (native) done");
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec2;
    use tide_lights::input::landmarks::{CURL_TIPS, LANDMARK_COUNT, MIDDLE_MCP, THUMB_TIP};
    use tide_lights::input::{HandFrame, HandLandmarks, ScriptedProvider};

    /// Open hand drifting across the frame, clenching into a fist every few seconds
    pub fn scripted_hand() -> ScriptedProvider {
        let frames = (0..25 * 30).map(|i| {
            let t = i as f64 / 30.0;
            let grabbing = (t % 4.0) > 3.5;
            let x = 0.5 + 0.3 * (t as f32 * 0.5).sin();
            let tip_y = if grabbing { 0.7 } else { 0.45 };

            let mut points = [Vec2::new(x, 0.9); LANDMARK_COUNT];
            points[MIDDLE_MCP] = Vec2::new(x, 0.7);
            for tip in CURL_TIPS {
                points[tip] = Vec2::new(x, tip_y);
            }
            points[THUMB_TIP] = Vec2::new(x + 0.3, tip_y);
            HandFrame {
                timestamp: t,
                hand: Some(HandLandmarks::new(points, 0.9)),
            }
        });
        ScriptedProvider::new(frames)
    }
}
