//! Audio cues
//!
//! Maps simulation events to procedurally generated sounds. The mapping is
//! platform independent; playback lives in `web` (Web Audio API).

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

use crate::sim::{GameEvent, ItemKind};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Beneficial item caught
    Catch,
    /// Harmful item caught
    HarmfulCatch,
    /// Explosive item caught
    Explosion,
    /// Explosive caught during immunity
    Blocked,
    /// Healing item caught
    Heal,
    /// Beneficial item missed
    Miss,
    LevelUp,
    GameOver,
    /// Name-entry prompt for a qualifying score
    HighScore,
}

/// Ambient loop transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ambient {
    Start,
    Stop,
}

/// One-shot sound for an event, if any
pub fn cue_for(event: &GameEvent) -> Option<SoundEffect> {
    match event {
        GameEvent::Caught { kind, .. } => Some(match kind {
            ItemKind::Beneficial => SoundEffect::Catch,
            ItemKind::Harmful => SoundEffect::HarmfulCatch,
            ItemKind::Explosive => SoundEffect::Explosion,
            ItemKind::Healing => SoundEffect::Heal,
        }),
        GameEvent::Missed {
            kind: ItemKind::Beneficial,
            ..
        } => Some(SoundEffect::Miss),
        GameEvent::ImmunityBlocked { .. } => Some(SoundEffect::Blocked),
        GameEvent::LevelUp { .. } => Some(SoundEffect::LevelUp),
        GameEvent::GameOver { .. } => Some(SoundEffect::GameOver),
        GameEvent::NamePromptDue { .. } => Some(SoundEffect::HighScore),
        _ => None,
    }
}

/// Ambient loop change for an event, if any
pub fn ambient_for(event: &GameEvent) -> Option<Ambient> {
    match event {
        GameEvent::Paused { .. } | GameEvent::GameOver { .. } => Some(Ambient::Stop),
        GameEvent::Resumed => Some(Ambient::Start),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::PauseReason;
    use glam::Vec2;

    #[test]
    fn catches_cue_by_category() {
        let caught = |kind| GameEvent::Caught {
            kind,
            pos: Vec2::ZERO,
            score_delta: 0,
        };
        assert_eq!(cue_for(&caught(ItemKind::Beneficial)), Some(SoundEffect::Catch));
        assert_eq!(cue_for(&caught(ItemKind::Harmful)), Some(SoundEffect::HarmfulCatch));
        assert_eq!(cue_for(&caught(ItemKind::Explosive)), Some(SoundEffect::Explosion));
        assert_eq!(cue_for(&caught(ItemKind::Healing)), Some(SoundEffect::Heal));
    }

    #[test]
    fn only_beneficial_misses_sound() {
        let missed = |kind| GameEvent::Missed {
            kind,
            pos: Vec2::ZERO,
            score_delta: 0,
        };
        assert_eq!(cue_for(&missed(ItemKind::Beneficial)), Some(SoundEffect::Miss));
        assert_eq!(cue_for(&missed(ItemKind::Harmful)), None);
        assert_eq!(cue_for(&missed(ItemKind::Explosive)), None);
    }

    #[test]
    fn ambient_follows_pause_and_game_over() {
        let paused = GameEvent::Paused {
            reason: PauseReason::Auto,
        };
        assert_eq!(ambient_for(&paused), Some(Ambient::Stop));
        assert_eq!(ambient_for(&GameEvent::Resumed), Some(Ambient::Start));
        assert_eq!(
            ambient_for(&GameEvent::GameOver { score: 1, level: 1 }),
            Some(Ambient::Stop)
        );
        assert_eq!(ambient_for(&GameEvent::ImmunityEnded), None);
    }
}
