//! Mine Dash entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use web_sys::{Document, KeyboardEvent, MouseEvent, TouchEvent};

    use mine_dash::platform::{BrowserScheduler, Direction, LocalStore};
    use mine_dash::view::DomView;
    use mine_dash::{Session, Settings};

    /// Everything the page callbacks share
    struct Game {
        session: Session<BrowserScheduler, LocalStore>,
        view: DomView,
    }

    impl Game {
        /// Push queued view commands to the page
        fn flush(&mut self) {
            let commands = self.session.take_view_commands();
            self.view.apply_all(commands);
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Mine Dash starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let settings = Settings::load(&LocalStore);
        // Write back so missing fields show up in storage with their defaults
        settings.save(&mut LocalStore);
        let seed = js_sys::Date::now() as u64;
        let session = Session::new(settings, BrowserScheduler::new(), LocalStore, seed);
        let view = DomView::new(document.clone()).expect("no #game element");

        let game = Rc::new(RefCell::new(Game { session, view }));
        game.borrow_mut().flush();

        setup_menu(&document, game.clone());
        setup_keyboard(game.clone());
        setup_touch_buttons(&document, game.clone());
        setup_double_tap(&document, game.clone());
        setup_run_buttons(&document, game.clone());

        // Start frame loop
        request_animation_frame(game);

        log::info!("Mine Dash running!");
    }

    fn on_click(document: &Document, id: &str, mut handler: impl FnMut() + 'static) {
        let Some(btn) = document.get_element_by_id(id) else {
            log::warn!("Missing #{}", id);
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| handler());
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn set_display(id: &str, value: &str) {
        let el = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
            .and_then(|e| e.dyn_into::<web_sys::HtmlElement>().ok());
        if let Some(el) = el {
            let _ = el.style().set_property("display", value);
        }
    }

    /// Welcome screen -> hint popup -> first run
    fn setup_menu(document: &Document, game: Rc<RefCell<Game>>) {
        on_click(document, "playBtn", || {
            set_display("welcome-screen", "none");
            set_display("controlHintPopup", "flex");
        });

        on_click(document, "hintOkBtn", move || {
            set_display("controlHintPopup", "none");
            set_display("game", "block");
            let mut g = game.borrow_mut();
            // First acknowledgement starts the game; later ones are no-ops
            if !g.session.start() {
                log::debug!("Hint acknowledged while {:?}", g.session.phase());
            }
        });
    }

    fn setup_run_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        {
            let game = game.clone();
            on_click(document, "restartBtn", move || {
                game.borrow_mut().session.restart();
            });
        }
        on_click(document, "nextLevelBtn", move || {
            game.borrow_mut().session.advance_level();
        });
    }

    fn setup_keyboard(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                game.borrow_mut().session.key_down(&event.key());
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            game.borrow_mut().session.key_up(&event.key());
        });
        let _ = window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_touch_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        for dir in Direction::ALL {
            let Some(btn) = document.get_element_by_id(dir.button_id()) else {
                log::warn!("Missing #{}", dir.button_id());
                continue;
            };

            for (event_name, pressed) in [("touchstart", true), ("touchend", false)] {
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: TouchEvent| {
                    game.borrow_mut().session.touch_button(dir, pressed);
                });
                let _ = btn
                    .add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }
    }

    fn setup_double_tap(document: &Document, game: Rc<RefCell<Game>>) {
        let Some(field) = document.get_element_by_id("game") else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
            if game.borrow_mut().session.field_tap(js_sys::Date::now()) {
                // Keep the browser from zooming on the double-tap
                event.prevent_default();
            }
        });
        let options = web_sys::AddEventListenerOptions::new();
        options.set_passive(false);
        let _ = field.add_event_listener_with_callback_and_add_event_listener_options(
            "touchstart",
            closure.as_ref().unchecked_ref(),
            &options,
        );
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |_time: f64| {
            game_loop(game);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>) {
        {
            let mut g = game.borrow_mut();
            g.session.pump();
            g.session.frame();
            g.flush();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Mine Dash (native) starting...");
    log::info!("Native mode runs a headless autopilot - run with `trunk serve` for web version");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(1);
    autopilot::play(seed, 3);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless demo: routes to each star around the mines
#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use std::collections::VecDeque;

    use glam::Vec2;

    use mine_dash::consts::{FIELD_MAX, FIELD_MIN, MINE_RADIUS, STAR_RADIUS};
    use mine_dash::platform::{Direction, ManualScheduler, MemoryStore};
    use mine_dash::sim::{Hazard, RunPhase, RunState};
    use mine_dash::{Session, Settings};

    type HeadlessSession = Session<ManualScheduler, MemoryStore>;

    /// Frame duration at 60 Hz, in whole milliseconds
    const FRAME_MS: u64 = 16;
    /// Give up on a run after this many frames (about three minutes)
    const MAX_FRAMES: u32 = 60 * 180;
    /// Slack for float drift between planned and actual positions
    const MARGIN: f32 = 0.25;

    /// Play until `levels` levels are cleared or attempts run out.
    /// Returns the number of levels cleared.
    pub fn play(seed: u64, levels: u32) -> u32 {
        let settings = Settings::default();
        let speed = settings.move_speed;
        let mut session = Session::new(settings, ManualScheduler::new(), MemoryStore::new(), seed);
        session.start();

        let mut cleared = 0;
        let mut attempts = 0;
        while cleared < levels && attempts < levels * 5 {
            attempts += 1;
            match run_once(&mut session, speed) {
                RunPhase::Won => {
                    cleared += 1;
                    log::info!(
                        "Cleared level {} in {}s (best {:?})",
                        session.run().level.number(),
                        session.run().elapsed_secs,
                        session.best_time()
                    );
                    session.advance_level();
                }
                RunPhase::Lost => {
                    log::info!("Lost on level {}, retrying", session.run().level.number());
                    session.restart();
                }
                phase => {
                    log::warn!("Run timed out while {:?}", phase);
                    break;
                }
            }
        }

        println!(
            "Autopilot cleared {} of {} levels in {} attempts; best time {:?}",
            cleared,
            levels,
            attempts,
            session.best_time()
        );
        cleared
    }

    fn run_once(session: &mut HeadlessSession, speed: f32) -> RunPhase {
        let mut pilot = Pilot::new(speed);
        for _ in 0..MAX_FRAMES {
            pilot.steer(session);
            session.frame();
            session.scheduler_mut().advance(FRAME_MS);
            session.pump();
            session.take_view_commands();

            if session.phase().is_terminal() {
                return session.phase();
            }
        }
        session.phase()
    }

    /// Follows a planned route to one star at a time
    struct Pilot {
        speed: f32,
        route: VecDeque<(i8, i8)>,
        target: Option<u32>,
    }

    impl Pilot {
        fn new(speed: f32) -> Self {
            Self {
                speed,
                route: VecDeque::new(),
                target: None,
            }
        }

        fn steer(&mut self, session: &mut HeadlessSession) {
            let run = session.run();
            let target_left = self.target.is_some_and(|id| {
                run.collectibles
                    .iter()
                    .any(|c| c.id == id && !c.is_collected())
            });
            if !target_left || self.route.is_empty() {
                self.plan(run);
            }

            let (dx, dy) = match self.route.pop_front() {
                Some(step) => step,
                // Every star is walled off: forfeit so the retry gets a new layout
                None => self.toward_nearest_mine(run),
            };
            session.touch_button(Direction::Left, dx < 0);
            session.touch_button(Direction::Right, dx > 0);
            session.touch_button(Direction::Up, dy < 0);
            session.touch_button(Direction::Down, dy > 0);
        }

        /// Route to the nearest star that can be reached without nearing a mine
        fn plan(&mut self, run: &RunState) {
            self.route.clear();
            self.target = None;

            let mut stars: Vec<_> = run.collectibles.iter().filter(|c| !c.is_collected()).collect();
            stars.sort_by(|a, b| a.pos.distance(run.pos).total_cmp(&b.pos.distance(run.pos)));

            let lattice = Lattice::new(run.pos, self.speed, &run.hazards);
            for star in stars {
                if let Some(route) = lattice.route_to(star.pos, STAR_RADIUS - MARGIN) {
                    self.route = route;
                    self.target = Some(star.id);
                    return;
                }
            }
            log::warn!("No safe route to any star on level {}", run.level.number());
        }

        fn toward_nearest_mine(&self, run: &RunState) -> (i8, i8) {
            let Some(mine) = run
                .hazards
                .iter()
                .map(|h| h.pos)
                .min_by(|a, b| a.distance(run.pos).total_cmp(&b.distance(run.pos)))
            else {
                return (0, 0);
            };
            let delta = mine - run.pos;
            (self.axis_step(delta.x), self.axis_step(delta.y))
        }

        fn axis_step(&self, d: f32) -> i8 {
            if d > self.speed / 2.0 {
                1
            } else if d < -self.speed / 2.0 {
                -1
            } else {
                0
            }
        }
    }

    /// Positions reachable from `origin` in whole frames of movement,
    /// with every point too close to a mine blocked out
    struct Lattice {
        origin: Vec2,
        speed: f32,
        /// Lattice offset of column/row zero
        min: (i32, i32),
        width: usize,
        height: usize,
        blocked: Vec<bool>,
    }

    impl Lattice {
        fn new(origin: Vec2, speed: f32, hazards: &[Hazard]) -> Self {
            let min_i = -((origin.x - FIELD_MIN) / speed).floor() as i32;
            let max_i = ((FIELD_MAX - origin.x) / speed).floor() as i32;
            let min_j = -((origin.y - FIELD_MIN) / speed).floor() as i32;
            let max_j = ((FIELD_MAX - origin.y) / speed).floor() as i32;

            let mut lattice = Self {
                origin,
                speed,
                min: (min_i, min_j),
                width: (max_i - min_i + 1) as usize,
                height: (max_j - min_j + 1) as usize,
                blocked: Vec::new(),
            };
            lattice.blocked = (0..lattice.width * lattice.height)
                .map(|cell| {
                    let p = lattice.point(cell);
                    hazards
                        .iter()
                        .any(|h| h.pos.distance(p) < MINE_RADIUS + MARGIN)
                })
                .collect();
            lattice
        }

        fn point(&self, cell: usize) -> Vec2 {
            let i = (cell % self.width) as i32 + self.min.0;
            let j = (cell / self.width) as i32 + self.min.1;
            self.origin + Vec2::new(i as f32, j as f32) * self.speed
        }

        /// Breadth-first search for the shortest list of steps that ends
        /// within `reach` of `goal`
        fn route_to(&self, goal: Vec2, reach: f32) -> Option<VecDeque<(i8, i8)>> {
            let start = (-self.min.1) as usize * self.width + (-self.min.0) as usize;
            let mut prev = vec![usize::MAX; self.blocked.len()];
            prev[start] = start;
            let mut queue = VecDeque::from([start]);

            while let Some(cell) = queue.pop_front() {
                if self.point(cell).distance(goal) < reach {
                    return Some(self.steps_to(cell, &prev));
                }
                let (x, y) = ((cell % self.width) as i32, (cell / self.width) as i32);
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        let (nx, ny) = (x + dx, y + dy);
                        if nx < 0 || ny < 0 || nx >= self.width as i32 || ny >= self.height as i32 {
                            continue;
                        }
                        let next = ny as usize * self.width + nx as usize;
                        if prev[next] == usize::MAX && !self.blocked[next] {
                            prev[next] = cell;
                            queue.push_back(next);
                        }
                    }
                }
            }
            None
        }

        fn steps_to(&self, mut cell: usize, prev: &[usize]) -> VecDeque<(i8, i8)> {
            let mut steps = VecDeque::new();
            while prev[cell] != cell {
                let from = prev[cell];
                let dx = (cell % self.width) as i32 - (from % self.width) as i32;
                let dy = (cell / self.width) as i32 - (from / self.width) as i32;
                steps.push_front((dx as i8, dy as i8));
                cell = from;
            }
            steps
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_route_keeps_clear_of_mines() {
            let origin = Vec2::new(10.0, 50.0);
            let speed = 0.6;
            let mine = Hazard::new(1, Vec2::new(20.0, 50.0));
            let lattice = Lattice::new(origin, speed, std::slice::from_ref(&mine));

            let goal = Vec2::new(30.0, 50.0);
            let route = lattice.route_to(goal, STAR_RADIUS - MARGIN).unwrap();

            let mut pos = origin;
            for (dx, dy) in route {
                pos += Vec2::new(dx as f32, dy as f32) * speed;
                assert!(pos.distance(mine.pos) >= MINE_RADIUS);
            }
            assert!(pos.distance(goal) < STAR_RADIUS);
        }

        #[test]
        fn test_walled_off_goal_has_no_route() {
            let origin = Vec2::new(10.0, 10.0);
            let goal = Vec2::new(60.0, 60.0);
            let ring: Vec<Hazard> = (0..36)
                .map(|k| {
                    let angle = k as f32 * std::f32::consts::TAU / 36.0;
                    Hazard::new(k, goal + Vec2::from_angle(angle) * 6.0)
                })
                .collect();
            let lattice = Lattice::new(origin, 0.6, &ring);
            assert!(lattice.route_to(goal, STAR_RADIUS - MARGIN).is_none());
        }

        #[test]
        fn test_play_clears_first_level() {
            assert_eq!(play(1, 1), 1);
        }
    }
}
