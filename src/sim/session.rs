//! Session state machine
//!
//! A `Session` owns the entity store, the counters and the timers for one
//! run. Hosts feed it wall-clock frame timestamps plus input, forward focus
//! and pause actions, and drain the events it produces. Restarting means
//! building a new session.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::events::GameEvent;
use super::scheduler::{Scheduler, TimerId};
use super::state::{
    Basket, Counters, HeartLedger, Immunity, Item, PauseReason, SessionPhase,
};
use super::tick::FrameInput;
use super::{difficulty, spawn, tick};
use crate::consts::{FIELD_HEIGHT, FIELD_WIDTH, MAX_FRAME_GAP_MS};
use crate::highscores::Leaderboard;
use crate::settings::ControlScheme;
use crate::tuning::Tuning;

#[derive(Debug, Clone)]
pub struct Session {
    /// Balance knobs (fixed for the session)
    pub tuning: Tuning,
    /// Run seed for reproducibility
    pub seed: u64,
    pub phase: SessionPhase,
    /// Session clock (ms); frozen while paused
    pub clock_ms: f64,
    /// Simulation steps executed
    pub frame: u64,
    /// Logical field size
    pub field: Vec2,
    pub basket: Basket,
    /// Live items in spawn order
    pub items: Vec<Item>,
    pub counters: Counters,
    pub hearts: HeartLedger,
    pub immunity: Immunity,
    pub control_scheme: ControlScheme,
    /// Onboarding item already introduced
    pub(crate) onboarded: bool,
    pub(crate) rng: Pcg32,
    pub(crate) scheduler: Scheduler,
    events: Vec<GameEvent>,
    next_id: u32,
    last_host_ms: Option<f64>,
    prompt_scheduled: bool,
}

impl Session {
    /// Start a new session at host time `now_ms`
    pub fn new(tuning: Tuning, seed: u64, now_ms: f64) -> Self {
        let field = Vec2::new(FIELD_WIDTH, FIELD_HEIGHT);
        let mut session = Self {
            counters: Counters::new(&tuning),
            hearts: HeartLedger::new(tuning.max_strikes),
            tuning,
            seed,
            phase: SessionPhase::Active,
            clock_ms: 0.0,
            frame: 0,
            field,
            basket: Basket::new(field.x, field.y),
            items: Vec::new(),
            immunity: Immunity::default(),
            control_scheme: ControlScheme::default(),
            onboarded: false,
            rng: Pcg32::seed_from_u64(seed),
            scheduler: Scheduler::new(),
            events: Vec::new(),
            next_id: 1,
            last_host_ms: Some(now_ms),
            prompt_scheduled: false,
        };

        spawn::spawn_onboarding(&mut session);
        session.start_spawn_timer();
        session.scheduler.start(
            TimerId::LevelTick,
            session.tuning.level_tick_ms as f64,
            session.clock_ms,
        );

        log::info!("Session started with seed {seed}");
        session
    }

    pub fn with_control_scheme(mut self, scheme: ControlScheme) -> Self {
        self.control_scheme = scheme;
        self
    }

    /// Strike count (broken hearts)
    pub fn strikes(&self) -> u8 {
        self.hearts.strikes()
    }

    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.phase, SessionPhase::Paused(_))
    }

    pub fn is_over(&self) -> bool {
        self.phase == SessionPhase::GameOver
    }

    pub fn is_timer_running(&self, id: TimerId) -> bool {
        self.scheduler.is_running(id)
    }

    /// Run one host frame at wall-clock `now_ms`
    pub fn advance(&mut self, now_ms: f64, input: &FrameInput) {
        let dt = match self.last_host_ms {
            Some(last) => (now_ms - last).clamp(0.0, MAX_FRAME_GAP_MS),
            None => 0.0,
        };
        self.last_host_ms = Some(now_ms);
        self.advance_by(dt, input);
    }

    /// Advance the session clock by `dt_ms`, fire due timers, then step once
    pub fn advance_by(&mut self, dt_ms: f64, input: &FrameInput) {
        if !self.is_paused() {
            self.clock_ms += dt_ms.max(0.0);
        }
        self.run_timers();
        tick::step(self, input);
    }

    fn run_timers(&mut self) {
        while let Some(id) = self.scheduler.pop_due(self.clock_ms) {
            match id {
                TimerId::Spawn => spawn::on_spawn_tick(self),
                TimerId::LevelTick => difficulty::on_level_tick(self),
                TimerId::NamePrompt => {
                    let score = self.counters.score;
                    self.emit(GameEvent::NamePromptDue { score });
                }
            }
        }
    }

    // === Pause / focus transitions ===

    /// Explicit pause (button or cancel key). Upgrades an auto pause.
    pub fn pause_user(&mut self) {
        match self.phase {
            SessionPhase::Active => self.enter_pause(PauseReason::User),
            SessionPhase::Paused(PauseReason::Auto) => {
                self.phase = SessionPhase::Paused(PauseReason::User);
                self.emit(GameEvent::Paused {
                    reason: PauseReason::User,
                });
            }
            _ => {}
        }
    }

    /// Explicit resume; clears either kind of pause
    pub fn resume(&mut self) {
        if self.is_paused() {
            self.leave_pause();
        }
    }

    /// Pause control: pause when active, resume when paused
    pub fn toggle_pause(&mut self) {
        match self.phase {
            SessionPhase::Active => self.pause_user(),
            SessionPhase::Paused(_) => self.resume(),
            SessionPhase::GameOver => {}
        }
    }

    /// Tab hidden or window blurred
    pub fn focus_lost(&mut self) {
        if self.phase == SessionPhase::Active {
            self.enter_pause(PauseReason::Auto);
            log::info!("Auto-paused (focus lost)");
        }
    }

    /// Tab visible or window focused again; never clears a user pause
    pub fn focus_regained(&mut self) {
        if self.phase == SessionPhase::Paused(PauseReason::Auto) {
            self.leave_pause();
            log::info!("Auto-resumed (focus regained)");
        }
    }

    fn enter_pause(&mut self, reason: PauseReason) {
        self.phase = SessionPhase::Paused(reason);
        self.scheduler.cancel(TimerId::Spawn);
        self.emit(GameEvent::Paused { reason });
    }

    fn leave_pause(&mut self) {
        self.phase = SessionPhase::Active;
        self.start_spawn_timer();
        self.emit(GameEvent::Resumed);
    }

    /// (Re)start the spawn timer at the current interval
    pub(crate) fn start_spawn_timer(&mut self) {
        self.scheduler.start(
            TimerId::Spawn,
            self.counters.spawn_interval_ms as f64,
            self.clock_ms,
        );
    }

    // === Game over ===

    /// Terminal transition; halts spawning and leveling for good
    pub(crate) fn end_game(&mut self) {
        if self.phase == SessionPhase::GameOver {
            return;
        }
        self.phase = SessionPhase::GameOver;
        self.scheduler.cancel(TimerId::Spawn);
        self.scheduler.cancel(TimerId::LevelTick);
        log::info!(
            "Game over: score {} at level {}",
            self.counters.score,
            self.counters.level
        );
        self.emit(GameEvent::GameOver {
            score: self.counters.score,
            level: self.counters.level,
        });
    }

    /// Arm the name-entry prompt after a qualifying game over
    pub fn schedule_name_prompt(&mut self) {
        if self.is_over() && !self.prompt_scheduled {
            self.prompt_scheduled = true;
            self.scheduler.once(
                TimerId::NamePrompt,
                self.tuning.name_prompt_delay_ms,
                self.clock_ms,
            );
        }
    }

    /// Game-over hook for hosts: when the final score makes `board`, arm
    /// the name prompt and return the rank the score would take
    pub fn offer_name_entry(&mut self, board: &Leaderboard) -> Option<usize> {
        if !self.is_over() {
            return None;
        }
        let rank = board.potential_rank(self.counters.score)?;
        self.schedule_name_prompt();
        Some(rank)
    }

    // === Strikes and healing ===

    /// Break a heart; ends the session when none remain
    pub(crate) fn register_strike(&mut self) {
        if let Some(slot) = self.hearts.break_rightmost_healthy() {
            let strikes = self.hearts.strikes();
            self.emit(GameEvent::StrikeTaken { slot, strikes });
            if self.hearts.is_exhausted() {
                self.end_game();
            }
        }
    }

    /// Restore the leftmost broken heart, if any
    pub(crate) fn heal(&mut self) {
        if let Some(slot) = self.hearts.heal_leftmost_broken() {
            let strikes = self.hearts.strikes();
            self.emit(GameEvent::Healed { slot, strikes });
        }
    }

    // === Bookkeeping ===

    pub(crate) fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FRAME_MS;
    use crate::highscores::LeaderboardEntry;
    use crate::sim::state::ItemKind;

    fn session() -> Session {
        Session::new(Tuning::default(), 42, 0.0)
    }

    fn run_frames(s: &mut Session, frames: usize) {
        let input = FrameInput::default();
        for _ in 0..frames {
            s.advance_by(FRAME_MS, &input);
        }
    }

    #[test]
    fn new_session_is_active_with_onboarding_item() {
        let s = session();
        assert!(s.is_active());
        assert_eq!(s.items.len(), 1);
        assert_eq!(s.items[0].kind, ItemKind::Beneficial);
        assert_eq!(s.counters.level, 1);
        assert_eq!(s.strikes(), 0);
        assert!(s.is_timer_running(TimerId::Spawn));
        assert!(s.is_timer_running(TimerId::LevelTick));
    }

    #[test]
    fn host_delta_is_clamped() {
        let mut s = Session::new(Tuning::default(), 1, 1000.0);
        s.advance(1016.0, &FrameInput::default());
        assert_eq!(s.clock_ms, 16.0);
        // A long stall only advances the clock by the clamp
        s.advance(60_000.0, &FrameInput::default());
        assert_eq!(s.clock_ms, 16.0 + MAX_FRAME_GAP_MS);
        // Time going backwards is ignored
        s.advance(50_000.0, &FrameInput::default());
        assert_eq!(s.clock_ms, 16.0 + MAX_FRAME_GAP_MS);
    }

    #[test]
    fn user_pause_freezes_clock_and_items() {
        let mut s = session();
        run_frames(&mut s, 10);
        s.pause_user();
        assert_eq!(s.phase, SessionPhase::Paused(PauseReason::User));
        assert!(!s.is_timer_running(TimerId::Spawn));

        let clock = s.clock_ms;
        let y = s.items[0].pos.y;
        run_frames(&mut s, 120);
        assert_eq!(s.clock_ms, clock);
        assert_eq!(s.items[0].pos.y, y);

        s.resume();
        assert!(s.is_active());
        assert!(s.is_timer_running(TimerId::Spawn));
    }

    #[test]
    fn focus_return_does_not_clear_user_pause() {
        let mut s = session();
        s.pause_user();
        s.focus_lost();
        assert_eq!(s.phase, SessionPhase::Paused(PauseReason::User));
        s.focus_regained();
        assert_eq!(s.phase, SessionPhase::Paused(PauseReason::User));
        s.resume();
        assert!(s.is_active());
    }

    #[test]
    fn auto_pause_round_trip() {
        let mut s = session();
        s.focus_lost();
        assert_eq!(s.phase, SessionPhase::Paused(PauseReason::Auto));
        assert!(!s.is_timer_running(TimerId::Spawn));
        s.focus_regained();
        assert!(s.is_active());
        assert!(s.is_timer_running(TimerId::Spawn));
    }

    #[test]
    fn user_pause_takes_precedence_over_auto() {
        let mut s = session();
        s.focus_lost();
        s.pause_user();
        assert_eq!(s.phase, SessionPhase::Paused(PauseReason::User));
        s.focus_regained();
        assert!(s.is_paused());
    }

    #[test]
    fn resume_restarts_spawn_timer_once() {
        let mut s = session();
        run_frames(&mut s, 30);
        s.pause_user();
        s.resume();
        let due = s.scheduler.due(TimerId::Spawn);
        // A second resume while active must not re-arm the timer
        s.resume();
        s.focus_regained();
        assert_eq!(s.scheduler.due(TimerId::Spawn), due);
        assert_eq!(
            due,
            Some(s.clock_ms + s.counters.spawn_interval_ms as f64)
        );
    }

    #[test]
    fn toggle_pause_alternates() {
        let mut s = session();
        s.toggle_pause();
        assert!(s.is_paused());
        s.toggle_pause();
        assert!(s.is_active());
        let events = s.drain_events();
        assert!(events.contains(&GameEvent::Paused {
            reason: PauseReason::User
        }));
        assert!(events.contains(&GameEvent::Resumed));
    }

    #[test]
    fn game_over_is_terminal_and_emitted_once() {
        let mut s = session();
        for _ in 0..5 {
            s.register_strike();
        }
        assert!(s.is_over());
        assert_eq!(s.strikes(), s.tuning.max_strikes);
        assert!(!s.is_timer_running(TimerId::Spawn));
        assert!(!s.is_timer_running(TimerId::LevelTick));

        s.end_game();
        s.resume();
        s.focus_regained();
        s.toggle_pause();
        assert!(s.is_over());

        let overs = s
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .count();
        assert_eq!(overs, 1);
    }

    #[test]
    fn pause_is_a_no_op_after_game_over() {
        let mut s = session();
        s.end_game();
        s.pause_user();
        s.focus_lost();
        assert!(s.is_over());
    }

    #[test]
    fn name_prompt_fires_after_delay() {
        let mut s = session();
        s.counters.score = 77;
        s.end_game();
        s.schedule_name_prompt();
        s.schedule_name_prompt();
        s.drain_events();

        run_frames(&mut s, 35); // ~583ms
        assert!(s.drain_events().is_empty());
        run_frames(&mut s, 2);
        assert_eq!(s.drain_events(), vec![GameEvent::NamePromptDue { score: 77 }]);
        run_frames(&mut s, 120);
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn name_prompt_requires_game_over() {
        let mut s = session();
        s.schedule_name_prompt();
        assert!(!s.is_timer_running(TimerId::NamePrompt));
    }

    fn full_board(lowest: u64) -> Leaderboard {
        Leaderboard::from_entries(
            (0..10)
                .map(|i| LeaderboardEntry::new(format!("P{i}"), lowest + i, 1.0))
                .collect(),
        )
    }

    #[test]
    fn qualifying_score_arms_name_prompt() {
        let mut s = session();
        s.counters.score = 130;
        s.end_game();
        assert_eq!(s.offer_name_entry(&full_board(100)), Some(1));
        assert!(s.is_timer_running(TimerId::NamePrompt));

        // Room on the board qualifies any score
        let mut s = session();
        s.end_game();
        assert_eq!(s.offer_name_entry(&Leaderboard::new()), Some(1));
        assert!(s.is_timer_running(TimerId::NamePrompt));
    }

    #[test]
    fn low_score_on_full_board_gets_no_prompt() {
        let mut s = session();
        s.counters.score = 100;
        s.end_game();
        assert_eq!(s.offer_name_entry(&full_board(100)), None);
        assert!(!s.is_timer_running(TimerId::NamePrompt));

        run_frames(&mut s, 120);
        assert!(
            !s.drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::NamePromptDue { .. }))
        );
    }

    #[test]
    fn name_entry_is_not_offered_mid_game() {
        let mut s = session();
        assert_eq!(s.offer_name_entry(&Leaderboard::new()), None);
        assert!(!s.is_timer_running(TimerId::NamePrompt));
    }

    #[test]
    fn heal_restores_leftmost_broken_slot() {
        let mut s = session();
        s.register_strike();
        s.register_strike();
        assert_eq!(s.hearts.slots(), &[true, false, false]);
        s.heal();
        assert_eq!(s.hearts.slots(), &[true, true, false]);
        assert_eq!(s.strikes(), 1);
    }
}
