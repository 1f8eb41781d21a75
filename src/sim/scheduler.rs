//! Session-clock timers
//!
//! One slot per timer id. Starting a timer replaces whatever occupied its
//! slot, so a live timer can never be orphaned or layered.

/// Timer slots, in tie-break firing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimerId {
    Spawn,
    LevelTick,
    NamePrompt,
}

impl TimerId {
    const COUNT: usize = 3;

    fn index(self) -> usize {
        self as usize
    }

    fn from_index(i: usize) -> Self {
        match i {
            0 => TimerId::Spawn,
            1 => TimerId::LevelTick,
            _ => TimerId::NamePrompt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Timer {
    due_ms: f64,
    /// `None` for one-shot timers
    period_ms: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    slots: [Option<Timer>; TimerId::COUNT],
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) a repeating timer whose first firing is one period from now
    pub fn start(&mut self, id: TimerId, period_ms: f64, now_ms: f64) {
        let period_ms = period_ms.max(1.0);
        self.slots[id.index()] = Some(Timer {
            due_ms: now_ms + period_ms,
            period_ms: Some(period_ms),
        });
    }

    /// Arm a one-shot timer, replacing any timer in the slot
    pub fn once(&mut self, id: TimerId, delay_ms: f64, now_ms: f64) {
        self.slots[id.index()] = Some(Timer {
            due_ms: now_ms + delay_ms.max(0.0),
            period_ms: None,
        });
    }

    pub fn cancel(&mut self, id: TimerId) {
        self.slots[id.index()] = None;
    }

    pub fn cancel_all(&mut self) {
        self.slots = [None; TimerId::COUNT];
    }

    pub fn is_running(&self, id: TimerId) -> bool {
        self.slots[id.index()].is_some()
    }

    /// Period of a repeating timer
    pub fn period(&self, id: TimerId) -> Option<f64> {
        self.slots[id.index()].and_then(|t| t.period_ms)
    }

    /// Next due time of a timer
    pub fn due(&self, id: TimerId) -> Option<f64> {
        self.slots[id.index()].map(|t| t.due_ms)
    }

    /// Pop the earliest timer due at or before `now_ms`.
    ///
    /// Repeating timers are rescheduled one period later; if that is still in
    /// the past the missed firings are skipped. One-shots are cleared.
    pub fn pop_due(&mut self, now_ms: f64) -> Option<TimerId> {
        let mut best: Option<(usize, f64)> = None;
        for (i, slot) in self.slots.iter().enumerate() {
            if let Some(timer) = slot {
                if timer.due_ms <= now_ms && best.is_none_or(|(_, due)| timer.due_ms < due) {
                    best = Some((i, timer.due_ms));
                }
            }
        }

        let (i, _) = best?;
        let timer = self.slots[i].as_mut()?;
        match timer.period_ms {
            Some(period) => {
                timer.due_ms += period;
                if timer.due_ms <= now_ms {
                    timer.due_ms = now_ms + period;
                }
            }
            None => self.slots[i] = None,
        }
        Some(TimerId::from_index(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(s: &mut Scheduler, now: f64) -> Vec<TimerId> {
        std::iter::from_fn(|| s.pop_due(now)).collect()
    }

    #[test]
    fn repeating_timer_fires_each_period() {
        let mut s = Scheduler::new();
        s.start(TimerId::Spawn, 1000.0, 0.0);
        assert!(drain(&mut s, 999.0).is_empty());
        assert_eq!(drain(&mut s, 1000.0), vec![TimerId::Spawn]);
        assert!(drain(&mut s, 1500.0).is_empty());
        assert_eq!(drain(&mut s, 2000.0), vec![TimerId::Spawn]);
    }

    #[test]
    fn restart_replaces_instead_of_layering() {
        let mut s = Scheduler::new();
        s.start(TimerId::Spawn, 1000.0, 0.0);
        s.start(TimerId::Spawn, 900.0, 500.0);
        assert_eq!(s.period(TimerId::Spawn), Some(900.0));
        // The earlier 1000ms firing is gone
        assert!(drain(&mut s, 1000.0).is_empty());
        assert_eq!(drain(&mut s, 1400.0), vec![TimerId::Spawn]);
    }

    #[test]
    fn cancel_stops_firing() {
        let mut s = Scheduler::new();
        s.start(TimerId::Spawn, 100.0, 0.0);
        s.cancel(TimerId::Spawn);
        assert!(!s.is_running(TimerId::Spawn));
        assert!(drain(&mut s, 10_000.0).is_empty());
    }

    #[test]
    fn one_shot_fires_once() {
        let mut s = Scheduler::new();
        s.once(TimerId::NamePrompt, 600.0, 100.0);
        assert!(drain(&mut s, 699.0).is_empty());
        assert_eq!(drain(&mut s, 700.0), vec![TimerId::NamePrompt]);
        assert!(!s.is_running(TimerId::NamePrompt));
        assert!(drain(&mut s, 5000.0).is_empty());
    }

    #[test]
    fn missed_firings_are_skipped() {
        let mut s = Scheduler::new();
        s.start(TimerId::LevelTick, 100.0, 0.0);
        assert_eq!(drain(&mut s, 1000.0), vec![TimerId::LevelTick]);
        assert_eq!(s.due(TimerId::LevelTick), Some(1100.0));
    }

    #[test]
    fn earliest_due_fires_first_with_stable_ties() {
        let mut s = Scheduler::new();
        s.start(TimerId::LevelTick, 1000.0, 0.0);
        s.start(TimerId::Spawn, 1000.0, 0.0);
        s.once(TimerId::NamePrompt, 500.0, 0.0);
        assert_eq!(
            drain(&mut s, 1000.0),
            vec![TimerId::NamePrompt, TimerId::Spawn, TimerId::LevelTick]
        );
    }
}
