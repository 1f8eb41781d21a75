//! Basket Catch entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, HtmlInputElement, KeyboardEvent, PointerEvent};

    use basket_catch::audio::AudioManager;
    use basket_catch::fx::Effects;
    use basket_catch::highscores::{HighscoreApi, Leaderboard, LeaderboardClient, sanitize_name};
    use basket_catch::platform::now_ms;
    use basket_catch::platform::web::{BrowserStorage, FetchApi};
    use basket_catch::renderer::{CanvasRenderer, build_frame};
    use basket_catch::sim::{FrameInput, GameEvent, Session, dispatch};
    use basket_catch::{ControlScheme, Settings, Tuning};

    /// Game instance holding all state
    struct Game {
        session: Session,
        tuning: Tuning,
        settings: Settings,
        storage: BrowserStorage,
        effects: Effects,
        audio: AudioManager,
        renderer: CanvasRenderer,
        leaderboard: LeaderboardClient<FetchApi, BrowserStorage>,
        muted: bool,
        /// Rank a pending name entry would take
        prompt_rank: Option<usize>,
        left_held: bool,
        right_held: bool,
        /// Latest pointer position, consumed by the next frame
        pointer_x: Option<f32>,
        /// Session clock at the previous frame, for effect timing
        last_clock_ms: f64,
    }

    impl Game {
        fn new_session(&self, seed: u64, now: f64) -> Session {
            Session::new(self.tuning.clone(), seed, now)
                .with_control_scheme(self.settings.control_scheme)
        }

        fn frame(&mut self, now: f64) {
            let input = FrameInput {
                left: self.left_held,
                right: self.right_held,
                pointer_x: self.pointer_x.take(),
            };
            self.session.advance(now, &input);

            let dt = self.session.clock_ms - self.last_clock_ms;
            self.last_clock_ms = self.session.clock_ms;
            self.effects.advance(dt);

            let events = self.session.drain_events();
            dispatch(&events, &mut [&mut self.effects, &mut self.audio]);
            for event in &events {
                self.handle_event(event);
            }

            self.renderer.sync_pixel_ratio();
            let cmds = build_frame(&self.session, &self.effects);
            self.renderer.render(&cmds);
        }

        /// DOM and leaderboard reactions to simulation outcomes
        fn handle_event(&mut self, event: &GameEvent) {
            match event {
                GameEvent::GameOver { .. } => {
                    self.prompt_rank = self.session.offer_name_entry(self.leaderboard.board());
                    set_visible("restart-btn", true);
                }
                GameEvent::NamePromptDue { score } => show_name_entry(*score, self.prompt_rank),
                _ => {}
            }
        }

        fn restart(&mut self) {
            self.session = self.new_session(now_ms() as u64, host_now());
            self.effects = Effects::new(&self.settings);
            self.prompt_rank = None;
            self.last_clock_ms = 0.0;
            self.audio.stop_ambient();
            self.audio.start_ambient();
            set_visible("restart-btn", false);
            set_visible("name-entry", false);
            log::info!("Game restarted with seed: {}", self.session.seed);
        }

        fn toggle_control_scheme(&mut self) {
            self.settings.control_scheme = match self.settings.control_scheme {
                ControlScheme::Direct => ControlScheme::Inertial,
                ControlScheme::Inertial => ControlScheme::Direct,
            };
            self.session.control_scheme = self.settings.control_scheme;
            self.settings.save(&mut self.storage);
            log::info!("Control scheme: {}", self.settings.control_scheme.as_str());
        }

        fn toggle_mute(&mut self) {
            self.muted = !self.muted;
            self.audio.set_muted(self.muted);
            if !self.muted && self.session.is_active() {
                self.audio.start_ambient();
            }
        }

        fn toggle_reduced_motion(&mut self) {
            self.settings.reduced_motion = !self.settings.reduced_motion;
            self.settings.save(&mut self.storage);
            self.effects.apply_settings(&self.settings);
            self.audio.apply_settings(&self.settings);
            log::info!("Reduced motion: {}", self.settings.reduced_motion);
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Basket Catch starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");
        let renderer = CanvasRenderer::new(canvas.clone()).expect("Failed to create 2D context");

        let storage = BrowserStorage::open();
        let settings = Settings::load(&storage);
        let tuning = Tuning::default();
        for warning in tuning.validate() {
            log::warn!("Tuning: {}", warning);
        }

        let seed = now_ms() as u64;
        let session = Session::new(tuning.clone(), seed, host_now())
            .with_control_scheme(settings.control_scheme);
        log::info!("Game initialized with seed: {}", seed);

        let game = Rc::new(RefCell::new(Game {
            session,
            tuning,
            effects: Effects::new(&settings),
            audio: AudioManager::new(&settings),
            renderer,
            leaderboard: LeaderboardClient::new(FetchApi::default(), storage.clone()),
            storage,
            settings,
            muted: false,
            prompt_rank: None,
            left_held: false,
            right_held: false,
            pointer_x: None,
            last_clock_ms: 0.0,
        }));

        // Plays once a gesture unlocks the audio context
        game.borrow_mut().audio.start_ambient();
        render_leaderboard(game.borrow().leaderboard.board());
        wasm_bindgen_futures::spawn_local(load_leaderboard(game.clone()));

        setup_input_handlers(&canvas, game.clone());
        setup_buttons(game.clone());
        setup_auto_pause(game.clone());

        request_animation_frame(game);

        log::info!("Basket Catch running!");
    }

    /// Monotonic host time, same base as animation frame timestamps
    fn host_now() -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or(0.0)
    }

    async fn load_leaderboard(game: Rc<RefCell<Game>>) {
        // Await without holding the borrow; frames keep running meanwhile
        let api = game.borrow().leaderboard.api().clone();
        let result = api.fetch().await;
        let mut g = game.borrow_mut();
        g.leaderboard.apply_loaded(result);
        render_leaderboard(g.leaderboard.board());
    }

    async fn submit_score(game: Rc<RefCell<Game>>, raw_name: String, score: u64) {
        let name = sanitize_name(&raw_name);
        let api = game.borrow().leaderboard.api().clone();
        let result = api.submit(&name, score).await;
        let mut g = game.borrow_mut();
        let rank = g.leaderboard.apply_submitted(&name, score, now_ms(), result);
        log::info!("Submitted {} for {} (rank {:?})", score, name, rank);
        render_leaderboard(g.leaderboard.board());
    }

    fn render_leaderboard(board: &Leaderboard) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let Some(list) = document.get_element_by_id("leaderboard-list") else {
            return;
        };
        list.set_inner_html("");
        for (i, entry) in board.entries().iter().enumerate() {
            if let Ok(li) = document.create_element("li") {
                li.set_text_content(Some(&entry.display_line(i + 1)));
                let _ = list.append_child(&li);
            }
        }
    }

    fn set_visible(id: &str, visible: bool) {
        if let Some(el) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
        {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    fn show_name_entry(score: u64, rank: Option<usize>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        if let Some(el) = document.get_element_by_id("name-entry-score") {
            el.set_text_content(Some(&score.to_string()));
        }
        if let (Some(el), Some(rank)) = (document.get_element_by_id("name-entry-rank"), rank) {
            el.set_text_content(Some(&format!("#{rank}")));
        }
        if let Some(el) = document.get_element_by_id("name-entry") {
            let _ = el.set_attribute("class", "");
            let _ = el.set_attribute("data-score", &score.to_string());
        }
        if let Some(input) = document
            .get_element_by_id("name-input")
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        {
            input.set_value("");
            let _ = input.focus();
        }
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();

        // Keyboard down
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                // Typing a name must not steer the basket
                let typing = event
                    .target()
                    .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
                    .is_some();
                if typing {
                    return;
                }
                let mut g = game.borrow_mut();
                g.audio.resume();
                match event.key().as_str() {
                    "ArrowLeft" | "a" | "A" => g.left_held = true,
                    "ArrowRight" | "d" | "D" => g.right_held = true,
                    "Escape" | "p" | "P" if !event.repeat() => g.session.toggle_pause(),
                    "c" | "C" if !event.repeat() => g.toggle_control_scheme(),
                    "m" | "M" if !event.repeat() => g.toggle_mute(),
                    "r" | "R" if !event.repeat() => g.toggle_reduced_motion(),
                    _ => return,
                }
                event.prevent_default();
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard up
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "ArrowLeft" | "a" | "A" => g.left_held = false,
                    "ArrowRight" | "d" | "D" => g.right_held = false,
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Window resize - refit the backing store
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                game.borrow_mut().renderer.resize();
            });
            let _ = window
                .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Pointer move - basket follows the pointer
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let mut g = game.borrow_mut();
                let x = g.renderer.to_field_x(event.client_x() as f64);
                g.pointer_x = Some(x);
            });
            let _ = canvas
                .add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Pointer down - unlocks audio on touch devices
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                game.borrow().audio.resume();
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        game.borrow_mut().frame(time);
        request_animation_frame(game);
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let document = web_sys::window().unwrap().document().unwrap();

        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                game.borrow_mut().restart();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("pause-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                game.borrow_mut().session.toggle_pause();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("name-submit") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                    return;
                };
                let name = document
                    .get_element_by_id("name-input")
                    .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
                    .map(|input| input.value())
                    .unwrap_or_default();
                let score = document
                    .get_element_by_id("name-entry")
                    .and_then(|el| el.get_attribute("data-score"))
                    .and_then(|s| s.parse::<u64>().ok());
                set_visible("name-entry", false);
                if let Some(score) = score {
                    wasm_bindgen_futures::spawn_local(submit_score(game.clone(), name, score));
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let mut g = game.borrow_mut();
                if !g.settings.auto_pause_on_blur {
                    return;
                }
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    g.session.focus_lost();
                } else {
                    g.session.focus_regained();
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                if g.settings.auto_pause_on_blur {
                    g.session.focus_lost();
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Window focus
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                if g.settings.auto_pause_on_blur {
                    g.session.focus_regained();
                }
            });
            let _ =
                window.add_event_listener_with_callback("focus", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless autopilot run, then a submit to the local file-backed service.
///
/// Usage: `basket-catch [seed] [highscore-file] [direct|inertial]`
#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), basket_catch::LeaderboardError> {
    use basket_catch::consts::FRAME_MS;
    use basket_catch::highscores::{HighscoreService, InProcessApi};
    use basket_catch::persistence::MemoryStore;
    use basket_catch::platform::now_ms;
    use basket_catch::sim::{EventLog, EventSink, GameEvent, Session};
    use basket_catch::{ControlScheme, LeaderboardClient, Tuning};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Basket Catch (native) starting...");
    log::info!("Native mode runs a headless demo - run with `trunk serve` for the web version");

    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| now_ms() as u64);
    let path = args
        .next()
        .unwrap_or_else(|| "data/highscores.json".to_string());
    let scheme = args
        .next()
        .and_then(|s| ControlScheme::from_str(&s))
        .unwrap_or_default();

    let tuning = Tuning::default();
    for warning in tuning.validate() {
        log::warn!("Tuning: {}", warning);
    }

    let service = HighscoreService::open(&path)?;
    let mut client = LeaderboardClient::new(InProcessApi::new(service), MemoryStore::new());
    pollster::block_on(client.load());
    if let Some(best) = client.board().top_score() {
        println!("Score to beat: {best}");
    }

    // Ten simulated minutes at most
    let max_frames = (10.0 * 60_000.0 / FRAME_MS) as u64;
    let mut session = Session::new(tuning, seed, 0.0).with_control_scheme(scheme);
    let mut log = EventLog::default();
    let mut prompted = None;
    while prompted.is_none() && session.frame < max_frames {
        let input = autopilot(&session);
        session.advance_by(FRAME_MS, &input);
        for event in session.drain_events() {
            log.on_event(&event);
            match event {
                GameEvent::GameOver { .. } => {
                    if session.offer_name_entry(client.board()).is_none() {
                        prompted = Some(None);
                    }
                }
                GameEvent::NamePromptDue { score } => prompted = Some(Some(score)),
                _ => {}
            }
        }
    }

    let caught = log
        .events
        .iter()
        .filter(|e| matches!(e, GameEvent::Caught { .. }))
        .count();
    let missed = log
        .events
        .iter()
        .filter(|e| matches!(e, GameEvent::Missed { .. }))
        .count();
    println!(
        "Seed {}: score {}, level {}, {caught} caught, {missed} missed, {:.1}s played ({})",
        session.seed,
        session.counters.score,
        session.counters.level,
        session.clock_ms / 1000.0,
        session.control_scheme.as_str()
    );

    match prompted {
        Some(Some(score)) => {
            let rank = pollster::block_on(client.submit("AUTO", score, now_ms()));
            println!("New highscore! Rank {:?}", rank);
        }
        Some(None) => println!("No highscore this time"),
        None => println!("Time limit reached"),
    }

    println!("\nLeaderboard ({path}):");
    for (i, entry) in client.board().entries().iter().enumerate() {
        println!("  {}", entry.display_line(i + 1));
    }
    Ok(())
}

/// Steer with the keys toward the lowest item worth catching
#[cfg(not(target_arch = "wasm32"))]
fn autopilot(session: &basket_catch::sim::Session) -> basket_catch::sim::FrameInput {
    use basket_catch::sim::{FrameInput, ItemKind};

    let target = session
        .items
        .iter()
        .filter(|i| matches!(i.kind, ItemKind::Beneficial | ItemKind::Healing))
        .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
        .map(|i| i.pos.x);

    let center = session.basket.center_x();
    let deadzone = session.basket.size.x / 4.0;
    match target {
        Some(x) if x < center - deadzone => FrameInput {
            left: true,
            ..Default::default()
        },
        Some(x) if x > center + deadzone => FrameInput {
            right: true,
            ..Default::default()
        },
        _ => FrameInput::default(),
    }
}
