//! Run and level orchestration
//!
//! `Session` owns everything a running game needs: the run state, the input
//! intents, the elapsed-time timer, reveals, and the best-time record. Every
//! entry point runs to completion and queues view commands for the shell.

use crate::best_time::BestTime;
use crate::platform::{
    Direction, DoubleTapDetector, Fired, IntentResolver, KeyValueStore, REVEAL_KEY, Scheduler,
    Task, TaskHandle,
};
use crate::settings::Settings;
use crate::sim::{RunEvent, RunPhase, RunState, tick};
use crate::view::ViewCommand;

/// A game session: one player, many runs
pub struct Session<S: Scheduler, K: KeyValueStore> {
    settings: Settings,
    run: RunState,
    input: IntentResolver,
    taps: DoubleTapDetector,
    scheduler: S,
    /// The single live elapsed-time task
    timer: Option<TaskHandle>,
    best: BestTime<K>,
    outbox: Vec<ViewCommand>,
}

impl<S: Scheduler, K: KeyValueStore> Session<S, K> {
    /// Create an idle session. Queues the initial HUD (level, best time).
    pub fn new(settings: Settings, scheduler: S, store: K, seed: u64) -> Self {
        let taps = DoubleTapDetector::new(settings.double_tap_ms);
        let mut session = Self {
            settings,
            run: RunState::new(seed),
            input: IntentResolver::new(),
            taps,
            scheduler,
            timer: None,
            best: BestTime::new(store),
            outbox: Vec::new(),
        };

        session.outbox.push(ViewCommand::Level(session.run.level.number()));
        if let Some(best) = session.best.current() {
            session.outbox.push(ViewCommand::BestTime(best));
        }

        log::info!("Session created with seed: {}", seed);
        session
    }

    pub fn run(&self) -> &RunState {
        &self.run
    }

    pub fn phase(&self) -> RunPhase {
        self.run.phase
    }

    pub fn best_time(&self) -> Option<u32> {
        self.best.current()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Take all queued view commands
    pub fn take_view_commands(&mut self) -> Vec<ViewCommand> {
        std::mem::take(&mut self.outbox)
    }

    // === Transitions ===

    /// First run (Idle -> Running)
    pub fn start(&mut self) -> bool {
        self.transition(RunState::start, "start")
    }

    /// Retry the same level after a loss (Lost -> Running)
    pub fn restart(&mut self) -> bool {
        self.transition(RunState::restart, "restart")
    }

    /// Move on to the next level after a win (Won -> Running)
    pub fn advance_level(&mut self) -> bool {
        let advanced = self.transition(RunState::advance, "advance");
        if advanced {
            self.outbox.push(ViewCommand::Level(self.run.level.number()));
            log::info!("Advanced to level {}", self.run.level.number());
        }
        advanced
    }

    fn transition(&mut self, apply: fn(&mut RunState) -> bool, name: &str) -> bool {
        let old_hazards: Vec<u32> = self.run.hazards.iter().map(|h| h.id).collect();
        let old_stars: Vec<u32> = self
            .run
            .collectibles
            .iter()
            .filter(|c| !c.is_collected())
            .map(|c| c.id)
            .collect();

        if !apply(&mut self.run) {
            log::debug!("Ignoring {} while {:?}", name, self.run.phase);
            return false;
        }

        self.outbox
            .extend(old_hazards.into_iter().map(|id| ViewCommand::RemoveHazard { id }));
        self.outbox
            .extend(old_stars.into_iter().map(|id| ViewCommand::RemoveCollectible { id }));
        self.outbox.extend(
            self.run
                .hazards
                .iter()
                .map(|h| ViewCommand::SpawnHazard { id: h.id, pos: h.pos }),
        );
        self.outbox.extend(
            self.run
                .collectibles
                .iter()
                .map(|c| ViewCommand::SpawnCollectible { id: c.id, pos: c.pos }),
        );
        self.outbox.extend([
            ViewCommand::MovePlayer { pos: self.run.pos },
            ViewCommand::StarsCollected(0),
            ViewCommand::ShowRestart(false),
            ViewCommand::ShowAdvance(false),
        ]);

        self.restart_timer();
        log::info!(
            "Run started: level {}, {} mines, {} stars",
            self.run.level.number(),
            self.run.hazards.len(),
            self.run.collectibles.len()
        );
        true
    }

    // === Timer ===

    /// Cancel any live timer and start a fresh one at zero
    fn restart_timer(&mut self) {
        self.stop_timer();
        self.run.elapsed_secs = 0;
        self.outbox.push(ViewCommand::ElapsedSeconds(0));
        self.timer = Some(
            self.scheduler
                .every(self.settings.timer_period_ms, Task::TimerTick),
        );
    }

    fn stop_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            self.scheduler.cancel(handle);
        }
    }

    /// Dispatch every scheduled task that has fired
    pub fn pump(&mut self) {
        for fired in self.scheduler.drain_fired() {
            self.on_fired(fired);
        }
    }

    fn on_fired(&mut self, fired: Fired) {
        match fired.task {
            Task::TimerTick => {
                if self.timer != Some(fired.handle) || self.run.phase != RunPhase::Running {
                    log::debug!("Dropping stale timer tick {:?}", fired.handle);
                    return;
                }
                self.run.elapsed_secs += 1;
                self.outbox
                    .push(ViewCommand::ElapsedSeconds(self.run.elapsed_secs));
            }
            Task::HideHazards => {
                // A lost run keeps its mines on display
                if matches!(self.run.phase, RunPhase::Running | RunPhase::Won) {
                    self.set_hazards_visible(false);
                }
            }
        }
    }

    // === Frame ===

    /// One display frame: move, check proximity, apply outcomes
    pub fn frame(&mut self) {
        let before = self.run.pos;
        let events = tick(&mut self.run);
        if self.run.pos != before {
            self.outbox.push(ViewCommand::MovePlayer { pos: self.run.pos });
        }

        for event in events {
            match event {
                RunEvent::Collected { star } => {
                    self.outbox.push(ViewCommand::CollectibleTaken { id: star });
                    self.outbox.push(ViewCommand::StarsCollected(self.run.collected));
                }
                RunEvent::Loss { hazard } => self.on_loss(hazard),
                RunEvent::Win => self.on_win(),
            }
        }
    }

    fn on_loss(&mut self, hazard: u32) {
        self.stop_timer();
        // RunState::lose already flagged every mine visible
        self.outbox.extend(
            self.run
                .hazards
                .iter()
                .map(|h| ViewCommand::SetHazardVisible { id: h.id, visible: true }),
        );
        self.outbox.push(ViewCommand::ShowRestart(true));
        self.outbox.push(ViewCommand::ShowAdvance(false));
        log::info!(
            "Hit mine {} after {}s with {}/{} stars",
            hazard,
            self.run.elapsed_secs,
            self.run.collected,
            self.run.total_stars()
        );
    }

    fn on_win(&mut self) {
        self.stop_timer();
        self.outbox.push(ViewCommand::ShowAdvance(true));
        self.outbox.push(ViewCommand::ShowRestart(false));

        let secs = self.run.elapsed_secs;
        if self.best.record_if_better(secs) {
            self.outbox.push(ViewCommand::BestTime(secs));
        }
        log::info!("Level {} cleared in {}s", self.run.level.number(), secs);
    }

    // === Input ===

    /// Keyboard key pressed. Ignored entirely once the run has ended.
    pub fn key_down(&mut self, key: &str) {
        if self.run.phase.is_terminal() {
            return;
        }
        if self.input.key_down(key) {
            self.refresh_velocity();
        }
        if key == REVEAL_KEY {
            self.reveal();
        }
    }

    /// Keyboard key released
    pub fn key_up(&mut self, key: &str) {
        if self.input.key_up(key) {
            self.refresh_velocity();
        }
    }

    /// On-screen direction button pressed or released
    pub fn touch_button(&mut self, dir: Direction, pressed: bool) {
        if self.input.set_touch(dir, pressed) {
            self.refresh_velocity();
        }
    }

    /// A touch landed on the field at `now_ms`. Returns true if it completed
    /// a double-tap (whether or not a reveal was possible).
    pub fn field_tap(&mut self, now_ms: f64) -> bool {
        let double = self.taps.tap(now_ms);
        if double {
            self.reveal();
        }
        double
    }

    fn refresh_velocity(&mut self) {
        self.run.velocity = self.input.velocity(self.settings.move_speed);
    }

    // === Reveal ===

    /// Show every mine for `reveal_ms`. Only possible while running.
    pub fn reveal(&mut self) -> bool {
        if self.run.phase != RunPhase::Running {
            return false;
        }
        self.set_hazards_visible(true);
        self.scheduler
            .after(self.settings.reveal_ms, Task::HideHazards);
        true
    }

    fn set_hazards_visible(&mut self, visible: bool) {
        self.run.set_hazards_visible(visible);
        self.outbox.extend(
            self.run
                .hazards
                .iter()
                .map(|h| ViewCommand::SetHazardVisible { id: h.id, visible }),
        );
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::consts::BEST_TIME_KEY;
    use crate::platform::{ManualScheduler, MemoryStore};
    use crate::sim::{Collectible, Hazard, Level};

    type TestSession = Session<ManualScheduler, MemoryStore>;

    fn session() -> TestSession {
        Session::new(Settings::default(), ManualScheduler::new(), MemoryStore::new(), 1234)
    }

    /// Advance the manual clock and dispatch whatever fired
    fn wait(s: &mut TestSession, ms: u64) {
        s.scheduler_mut().advance(ms);
        s.pump();
    }

    /// Replace the generated layout with a controlled one
    fn stage(s: &mut TestSession, hazards: Vec<Hazard>, stars: Vec<Collectible>, pos: Vec2) {
        s.run.hazards = hazards;
        s.run.collectibles = stars;
        s.run.pos = pos;
    }

    fn win_current_level(s: &mut TestSession) {
        let total = s.run.total_stars();
        let stars = (0..total)
            .map(|i| Collectible::new(1000 + i, Vec2::new(30.0, 30.0)))
            .collect();
        stage(s, Vec::new(), stars, Vec2::new(30.0, 30.0));
        s.frame();
        assert_eq!(s.phase(), RunPhase::Won);
    }

    #[test]
    fn test_start_spawns_layout_and_timer() {
        let mut s = session();
        assert_eq!(s.take_view_commands(), vec![ViewCommand::Level(1)]);

        assert!(s.start());
        assert_eq!(s.phase(), RunPhase::Running);
        assert_eq!(s.scheduler().active_of(Task::TimerTick), 1);

        let cmds = s.take_view_commands();
        let spawned_mines = cmds
            .iter()
            .filter(|c| matches!(c, ViewCommand::SpawnHazard { .. }))
            .count();
        let spawned_stars = cmds
            .iter()
            .filter(|c| matches!(c, ViewCommand::SpawnCollectible { .. }))
            .count();
        assert_eq!((spawned_mines, spawned_stars), (15, 5));
        assert!(cmds.contains(&ViewCommand::ElapsedSeconds(0)));
        assert!(cmds.contains(&ViewCommand::ShowRestart(false)));
    }

    #[test]
    fn test_timer_counts_seconds() {
        let mut s = session();
        s.start();
        wait(&mut s, 3500);
        assert_eq!(s.run().elapsed_secs, 3);
    }

    #[test]
    fn test_repeated_resets_keep_one_timer() {
        let mut s = session();
        s.start();
        wait(&mut s, 2000);

        for _ in 0..2 {
            stage(&mut s, vec![Hazard::new(1, Vec2::new(10.0, 10.0))], Vec::new(), Vec2::new(10.0, 10.0));
            s.frame();
            assert_eq!(s.phase(), RunPhase::Lost);
            assert!(s.restart());
        }

        assert_eq!(s.scheduler().active_of(Task::TimerTick), 1);
        assert_eq!(s.run().elapsed_secs, 0);
        wait(&mut s, 5000);
        assert_eq!(s.run().elapsed_secs, 5);
    }

    #[test]
    fn test_loss_stops_timer_and_shows_mines() {
        let mut s = session();
        s.start();
        wait(&mut s, 1000);
        s.run.hazards.push(Hazard::new(999, Vec2::new(11.0, 10.0)));
        s.run.pos = Vec2::new(10.0, 10.0);
        s.take_view_commands();

        s.frame();
        assert_eq!(s.phase(), RunPhase::Lost);
        assert_eq!(s.scheduler().active_of(Task::TimerTick), 0);

        let cmds = s.take_view_commands();
        assert!(cmds.contains(&ViewCommand::SetHazardVisible { id: 999, visible: true }));
        assert!(cmds.contains(&ViewCommand::ShowRestart(true)));

        wait(&mut s, 3000);
        assert_eq!(s.run().elapsed_secs, 1);
    }

    #[test]
    fn test_tick_queued_before_restart_is_dropped() {
        let mut s = session();
        s.start();
        // Fired but not yet dispatched, as a browser interval can leave it
        s.scheduler_mut().advance(1000);

        let mine = Hazard::new(999, Vec2::new(10.0, 10.0));
        stage(&mut s, vec![mine], Vec::new(), Vec2::new(10.0, 10.0));
        s.frame();
        assert_eq!(s.phase(), RunPhase::Lost);
        assert!(s.restart());

        s.pump();
        assert_eq!(s.run().elapsed_secs, 0);
        assert_eq!(s.scheduler().active_of(Task::TimerTick), 1);

        wait(&mut s, 1000);
        assert_eq!(s.run().elapsed_secs, 1);
    }

    #[test]
    fn test_win_records_best_time() {
        let mut s = session();
        s.start();
        wait(&mut s, 42_000);
        s.take_view_commands();
        win_current_level(&mut s);

        assert_eq!(s.best_time(), Some(42));
        let cmds = s.take_view_commands();
        assert!(cmds.contains(&ViewCommand::BestTime(42)));
        assert!(cmds.contains(&ViewCommand::ShowAdvance(true)));
        assert_eq!(s.scheduler().active_of(Task::TimerTick), 0);

        // Slower run at the next level does not replace it
        assert!(s.advance_level());
        wait(&mut s, 50_000);
        win_current_level(&mut s);
        assert_eq!(s.best_time(), Some(42));
        assert!(!s.take_view_commands().iter().any(|c| matches!(c, ViewCommand::BestTime(_))));
    }

    #[test]
    fn test_best_time_shown_on_startup() {
        let mut store = MemoryStore::new();
        store.set(BEST_TIME_KEY, "17").unwrap();
        let mut s = Session::new(Settings::default(), ManualScheduler::new(), store, 1);
        assert_eq!(
            s.take_view_commands(),
            vec![ViewCommand::Level(1), ViewCommand::BestTime(17)]
        );
    }

    #[test]
    fn test_level_progression_counts() {
        let mut s = session();
        s.start();
        assert_eq!(s.run().hazards.len(), 15);

        win_current_level(&mut s);
        s.advance_level();
        assert_eq!(s.run().level, Level::new(2));
        assert_eq!((s.run().hazards.len(), s.run().collectibles.len()), (20, 7));

        win_current_level(&mut s);
        s.advance_level();
        assert_eq!((s.run().hazards.len(), s.run().collectibles.len()), (25, 9));
    }

    #[test]
    fn test_transitions_only_from_matching_phase() {
        let mut s = session();
        assert!(!s.restart());
        assert!(!s.advance_level());
        s.start();
        assert!(!s.start());
        assert!(!s.advance_level());
        assert!(!s.restart());

        win_current_level(&mut s);
        assert!(!s.restart());
        assert_eq!(s.run().level, Level::FIRST);
    }

    #[test]
    fn test_advance_removes_old_markers() {
        let mut s = session();
        s.start();
        let generated = s.run().hazards.clone();
        let old_mine = generated[0].id;
        win_current_level(&mut s);
        s.run.hazards = generated;
        s.take_view_commands();

        s.advance_level();
        let cmds = s.take_view_commands();
        assert!(cmds.contains(&ViewCommand::RemoveHazard { id: old_mine }));
        assert!(cmds.contains(&ViewCommand::Level(2)));
        // Stars taken during the win were already removed
        assert!(!cmds.contains(&ViewCommand::RemoveCollectible { id: 1000 }));
    }

    #[test]
    fn test_collect_updates_hud() {
        let mut s = session();
        s.start();
        stage(&mut s, Vec::new(), vec![Collectible::new(50, Vec2::new(12.0, 10.0))], Vec2::new(10.0, 10.0));
        s.take_view_commands();

        s.frame();
        let cmds = s.take_view_commands();
        assert!(cmds.contains(&ViewCommand::CollectibleTaken { id: 50 }));
        assert!(cmds.contains(&ViewCommand::StarsCollected(1)));

        s.frame();
        assert_eq!(s.run().collected, 1);
    }

    #[test]
    fn test_keyboard_moves_player() {
        let mut s = session();
        s.start();
        stage(&mut s, Vec::new(), Vec::new(), Vec2::new(50.0, 50.0));

        s.key_down("ArrowUp");
        s.key_down("a");
        assert_eq!(s.run().velocity, Vec2::new(-0.6, -0.6));
        s.frame();
        assert!((s.run().pos - Vec2::new(49.4, 49.4)).length() < 1e-4);

        s.key_up("ArrowUp");
        s.key_up("a");
        assert_eq!(s.run().velocity, Vec2::ZERO);
    }

    #[test]
    fn test_keydown_ignored_after_run_ends() {
        let mut s = session();
        s.start();
        stage(&mut s, vec![Hazard::new(1, Vec2::new(10.0, 10.0))], Vec::new(), Vec2::new(10.0, 10.0));
        s.frame();
        assert_eq!(s.phase(), RunPhase::Lost);

        s.key_down("d");
        assert_eq!(s.run().velocity, Vec2::ZERO);

        // Touch buttons still register
        s.touch_button(Direction::Right, true);
        assert_eq!(s.run().velocity, Vec2::new(0.6, 0.0));
    }

    #[test]
    fn test_held_direction_survives_restart() {
        let mut s = session();
        s.start();
        s.touch_button(Direction::Left, true);
        stage(&mut s, vec![Hazard::new(1, Vec2::new(10.0, 10.0))], Vec::new(), Vec2::new(10.0, 10.0));
        s.frame();
        s.restart();
        assert_eq!(s.run().velocity, Vec2::new(-0.6, 0.0));
    }

    #[test]
    fn test_space_reveals_then_hides() {
        let mut s = session();
        s.start();
        s.key_down(" ");
        assert!(s.run().hazards.iter().all(|h| h.visible));

        wait(&mut s, 999);
        assert!(s.run().hazards.iter().all(|h| h.visible));
        wait(&mut s, 1);
        assert!(s.run().hazards.iter().all(|h| !h.visible));
    }

    #[test]
    fn test_reveal_does_not_hide_after_loss() {
        let mut s = session();
        s.start();
        assert!(s.reveal());

        let mine = s.run().hazards[0].pos;
        s.run.pos = mine;
        s.frame();
        assert_eq!(s.phase(), RunPhase::Lost);

        wait(&mut s, 1000);
        assert!(s.run().hazards.iter().all(|h| h.visible));
    }

    #[test]
    fn test_reveal_hides_after_win() {
        let mut s = session();
        s.start();
        s.reveal();
        let keep = s.run().hazards.clone();
        win_current_level(&mut s);
        s.run.hazards = keep;
        s.run.set_hazards_visible(true);

        wait(&mut s, 1000);
        assert!(s.run().hazards.iter().all(|h| !h.visible));
    }

    #[test]
    fn test_reveal_only_while_running() {
        let mut s = session();
        assert!(!s.reveal());
        assert_eq!(s.scheduler().active_of(Task::HideHazards), 0);
    }

    #[test]
    fn test_double_tap_reveals() {
        let mut s = session();
        s.start();
        assert!(!s.field_tap(1000.0));
        assert!(s.run().hazards.iter().all(|h| !h.visible));
        assert!(s.field_tap(1200.0));
        assert!(s.run().hazards.iter().all(|h| h.visible));
        assert_eq!(s.scheduler().active_of(Task::HideHazards), 1);
    }

    #[test]
    fn test_double_tap_suppressed_after_win() {
        let mut s = session();
        s.start();
        win_current_level(&mut s);
        s.field_tap(1000.0);
        assert!(s.field_tap(1100.0));
        assert_eq!(s.scheduler().active_of(Task::HideHazards), 0);
    }

    #[test]
    fn test_idle_frames_do_nothing() {
        let mut s = session();
        s.touch_button(Direction::Up, true);
        s.take_view_commands();
        s.frame();
        assert!(s.take_view_commands().is_empty());
        assert_eq!(s.phase(), RunPhase::Idle);
    }
}
