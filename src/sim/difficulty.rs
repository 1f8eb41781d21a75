//! Difficulty controller
//!
//! Runs on the level timer. Every `level_duration_secs` of active play the
//! level goes up, items fall faster and the spawn cadence tightens.

use super::events::GameEvent;
use super::session::Session;
use super::state::SessionPhase;

/// Level-timer callback
pub fn on_level_tick(s: &mut Session) {
    if s.phase != SessionPhase::Active {
        return;
    }
    s.counters.level_elapsed_secs += s.tuning.level_tick_ms as f32 / 1000.0;
    if s.counters.level_elapsed_secs >= s.tuning.level_duration_secs {
        level_up(s);
    }
}

fn level_up(s: &mut Session) {
    let c = &mut s.counters;
    c.level += 1;
    c.level_elapsed_secs = 0.0;
    c.fall_speed += s.tuning.fall_speed_step;
    c.spawn_interval_ms = s.tuning.next_spawn_interval(c.spawn_interval_ms);

    let (level, fall_speed, spawn_interval_ms) = (c.level, c.fall_speed, c.spawn_interval_ms);
    // Replace the in-flight spawn timer with the new cadence
    s.start_spawn_timer();

    log::info!("Level {level}: fall speed {fall_speed:.2}, spawn every {spawn_interval_ms}ms");
    s.emit(GameEvent::LevelUp {
        level,
        fall_speed,
        spawn_interval_ms,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FRAME_MS;
    use crate::sim::scheduler::TimerId;
    use crate::sim::tick::FrameInput;
    use crate::tuning::Tuning;

    fn session() -> Session {
        Session::new(Tuning::default(), 8, 0.0)
    }

    #[test]
    fn ten_ticks_level_up() {
        let mut s = session();
        for _ in 0..9 {
            on_level_tick(&mut s);
        }
        assert_eq!(s.counters.level, 1);
        assert_eq!(s.counters.level_elapsed_secs, 9.0);

        on_level_tick(&mut s);
        assert_eq!(s.counters.level, 2);
        assert_eq!(s.counters.level_elapsed_secs, 0.0);
        assert!((s.counters.fall_speed - 3.6).abs() < 1e-6);
        assert_eq!(s.counters.spawn_interval_ms, 900);
        assert!(s.drain_events().iter().any(|e| matches!(
            e,
            GameEvent::LevelUp {
                level: 2,
                spawn_interval_ms: 900,
                ..
            }
        )));
    }

    #[test]
    fn level_up_restarts_spawn_timer_with_new_interval() {
        let mut s = session();
        s.clock_ms = 10_000.0;
        for _ in 0..10 {
            on_level_tick(&mut s);
        }
        assert_eq!(s.scheduler.period(TimerId::Spawn), Some(900.0));
        assert_eq!(s.scheduler.due(TimerId::Spawn), Some(10_900.0));
    }

    #[test]
    fn spawn_interval_floors_at_minimum() {
        let mut s = session();
        for _ in 0..(40 * 10) {
            on_level_tick(&mut s);
        }
        assert_eq!(s.counters.level, 41);
        assert_eq!(s.counters.spawn_interval_ms, 250);
        assert!(s.counters.fall_speed > 60.0);
    }

    #[test]
    fn gated_by_phase() {
        let mut s = session();
        s.pause_user();
        for _ in 0..20 {
            on_level_tick(&mut s);
        }
        assert_eq!(s.counters.level, 1);
        assert_eq!(s.counters.level_elapsed_secs, 0.0);

        s.resume();
        s.end_game();
        for _ in 0..20 {
            on_level_tick(&mut s);
        }
        assert_eq!(s.counters.level, 1);
    }

    #[test]
    fn level_timer_drives_progression_in_real_frames() {
        let mut s = session();
        s.items.clear();
        // Ten seconds of frames, keeping the field clear of strikes
        let input = FrameInput::default();
        let frames = (10_000.0 / FRAME_MS).ceil() as usize + 1;
        for _ in 0..frames {
            s.items.clear();
            s.advance_by(FRAME_MS, &input);
        }
        assert_eq!(s.counters.level, 2);
    }
}
