//! Simulation outcome events
//!
//! The session buffers these as they happen; hosts drain them once per frame
//! and hand them to every subscriber. Subscribers are read-only observers.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{ItemKind, PauseReason};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ItemSpawned {
        id: u32,
        kind: ItemKind,
        pos: Vec2,
    },
    /// Item touched the basket; `score_delta` is the change actually applied
    Caught {
        kind: ItemKind,
        pos: Vec2,
        score_delta: i64,
    },
    /// Item left the field through the bottom
    Missed {
        kind: ItemKind,
        pos: Vec2,
        score_delta: i64,
    },
    /// Explosive caught during immunity; removed without penalty
    ImmunityBlocked { pos: Vec2 },
    /// A heart broke
    StrikeTaken { slot: usize, strikes: u8 },
    /// A heart was restored
    Healed { slot: usize, strikes: u8 },
    ImmunityEnded,
    LevelUp {
        level: u32,
        fall_speed: f32,
        spawn_interval_ms: u32,
    },
    Paused { reason: PauseReason },
    Resumed,
    GameOver { score: u64, level: u32 },
    /// Name-entry prompt delay elapsed
    NamePromptDue { score: u64 },
}

/// Observer for simulation outcomes
pub trait EventSink {
    fn on_event(&mut self, event: &GameEvent);
}

/// Forward every event to every sink, in order
pub fn dispatch(events: &[GameEvent], sinks: &mut [&mut dyn EventSink]) {
    for event in events {
        for sink in sinks.iter_mut() {
            sink.on_event(event);
        }
    }
}

/// Sink that records everything it sees (diagnostics and tests)
#[derive(Debug, Default)]
pub struct EventLog {
    pub events: Vec<GameEvent>,
}

impl EventSink for EventLog {
    fn on_event(&mut self, event: &GameEvent) {
        self.events.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter(usize);

    impl EventSink for Counter {
        fn on_event(&mut self, _event: &GameEvent) {
            self.0 += 1;
        }
    }

    #[test]
    fn dispatch_reaches_every_sink_in_order() {
        let events = vec![GameEvent::Resumed, GameEvent::ImmunityEnded];
        let mut log = EventLog::default();
        let mut counter = Counter::default();
        dispatch(&events, &mut [&mut log, &mut counter]);
        assert_eq!(log.events, events);
        assert_eq!(counter.0, 2);
    }
}
