//! Spawner
//!
//! Runs on the spawn timer. The first item of a session is always a
//! beneficial onboarding item placed so it reaches the catch line exactly
//! when the grace period ends; nothing else spawns before then.

use glam::Vec2;
use rand::Rng;

use super::events::GameEvent;
use super::session::Session;
use super::state::{Item, ItemKind, SessionPhase};
use crate::consts::FRAME_MS;
use crate::tuning::{SpawnRange, Tuning};

/// Spawn-timer callback
pub fn on_spawn_tick(s: &mut Session) {
    if s.phase != SessionPhase::Active {
        return;
    }
    if s.items.len() >= s.tuning.max_items {
        return;
    }
    if !s.onboarded {
        spawn_onboarding(s);
        return;
    }
    if s.clock_ms < s.tuning.grace_period_ms {
        return;
    }

    let kind = choose_kind(s);
    let radius = s.tuning.radius.lerp(s.rng.random());
    let x = sample_x(s);
    let velocity = sample_velocity(s, kind);
    insert(s, kind, Vec2::new(x, -radius - 10.0), radius, velocity);
}

/// Introduce the onboarding item, back-computing its height so that it
/// touches the catch line when the grace period ends
pub(crate) fn spawn_onboarding(s: &mut Session) {
    if s.onboarded || s.items.len() >= s.tuning.max_items {
        return;
    }
    let kind = ItemKind::Beneficial;
    let radius = s.tuning.radius.lerp(s.rng.random());
    let x = sample_x(s);

    let frames_left = ((s.tuning.grace_period_ms - s.clock_ms) / FRAME_MS)
        .round()
        .max(0.0) as f32;
    let shared = s.counters.fall_speed * s.tuning.fall_speed_scale;
    let catch_line = s.basket.catch_line();

    // Fast enough that the back-computed start is above the field, like
    // any other spawn
    let offset = kind.velocity_offset(&s.tuning.offsets);
    let base = s.tuning.base_velocity;
    let min = if frames_left > 0.0 {
        base.min.max((catch_line + 10.0) / frames_left - shared - offset)
    } else {
        base.min
    };
    let band = SpawnRange::new(min, base.max.max(min));
    let velocity = band.lerp(s.rng.random()) + offset;

    let y = catch_line - radius - frames_left * (velocity + shared);

    insert(s, kind, Vec2::new(x, y), radius, velocity);
    s.onboarded = true;
}

/// Healing may preempt the weighted draw only while a heart is broken and
/// no other healing item is live
pub fn healing_eligible(s: &Session) -> bool {
    s.strikes() > 0 && !s.items.iter().any(|i| i.kind == ItemKind::Healing)
}

fn choose_kind(s: &mut Session) -> ItemKind {
    if healing_eligible(s) && s.rng.random::<f32>() < s.tuning.healing_chance {
        return ItemKind::Healing;
    }
    kind_from_roll(s.rng.random(), &s.tuning)
}

/// Weighted category draw from a unit roll
pub fn kind_from_roll(p: f32, tuning: &Tuning) -> ItemKind {
    if p < tuning.beneficial_threshold {
        ItemKind::Beneficial
    } else if p < tuning.harmful_threshold {
        ItemKind::Harmful
    } else {
        ItemKind::Explosive
    }
}

fn sample_x(s: &mut Session) -> f32 {
    let margin = s.tuning.spawn_margin;
    let span = (s.field.x - 2.0 * margin).max(0.0);
    margin + s.rng.random::<f32>() * span
}

fn sample_velocity(s: &mut Session, kind: ItemKind) -> f32 {
    s.tuning.base_velocity.lerp(s.rng.random()) + kind.velocity_offset(&s.tuning.offsets)
}

fn insert(s: &mut Session, kind: ItemKind, pos: Vec2, radius: f32, velocity: f32) {
    let id = s.next_entity_id();
    s.items.push(Item {
        id,
        pos,
        radius,
        kind,
        velocity,
    });
    log::debug!("Spawned {kind:?} #{id} at ({:.0}, {:.0})", pos.x, pos.y);
    s.emit(GameEvent::ItemSpawned { id, kind, pos });
}
