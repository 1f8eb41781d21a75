//! Per-frame simulation step
//!
//! Moves the basket, integrates every item, and resolves catches and misses
//! through the category effect table.

use super::events::GameEvent;
use super::session::Session;
use super::state::{Basket, Item, ItemKind, SessionPhase};
use crate::settings::ControlScheme;
use crate::tuning::{ScoreTable, Tuning};

/// Input sampled for a single frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    /// Left key held
    pub left: bool,
    /// Right key held
    pub right: bool,
    /// Pointer x in field coordinates; centers the basket under it
    pub pointer_x: Option<f32>,
}

/// How an item left play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Catch,
    Miss,
}

/// What a catch or miss does to the session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Effect {
    pub score: i64,
    pub strike: bool,
    pub heal: bool,
    pub grants_immunity: bool,
}

/// Category effect table
pub fn effect_for(kind: ItemKind, outcome: Outcome, scores: &ScoreTable) -> Effect {
    match (kind, outcome) {
        (ItemKind::Beneficial, Outcome::Catch) => Effect {
            score: scores.beneficial_catch,
            ..Effect::default()
        },
        (ItemKind::Beneficial, Outcome::Miss) => Effect {
            score: scores.beneficial_miss,
            strike: true,
            ..Effect::default()
        },
        (ItemKind::Harmful, Outcome::Catch) => Effect {
            score: scores.harmful_catch,
            ..Effect::default()
        },
        (ItemKind::Explosive, Outcome::Catch) => Effect {
            strike: true,
            grants_immunity: true,
            ..Effect::default()
        },
        (ItemKind::Healing, Outcome::Catch) => Effect {
            score: scores.healing_catch,
            heal: true,
            ..Effect::default()
        },
        (_, Outcome::Miss) => Effect::default(),
    }
}

/// Advance the session by one frame. No-op unless active.
pub fn step(s: &mut Session, input: &FrameInput) {
    if s.phase != SessionPhase::Active {
        return;
    }
    s.frame += 1;

    if s.immunity.expire(s.clock_ms) {
        s.emit(GameEvent::ImmunityEnded);
    }

    move_basket(&mut s.basket, input, &s.tuning, s.control_scheme, s.field.x);

    let shared = s.counters.fall_speed * s.tuning.fall_speed_scale;
    // Back to front so removal keeps earlier indices valid
    for i in (0..s.items.len()).rev() {
        let item = &mut s.items[i];
        item.pos.y += item.velocity + shared;

        if s.basket.catches(&s.items[i]) {
            let item = s.items.remove(i);
            resolve(s, &item, Outcome::Catch);
        } else if s.items[i].top() > s.field.y {
            let item = s.items.remove(i);
            resolve(s, &item, Outcome::Miss);
        }
    }
}

/// Horizontal basket motion followed by confinement to the field
pub fn move_basket(
    basket: &mut Basket,
    input: &FrameInput,
    tuning: &Tuning,
    scheme: ControlScheme,
    field_width: f32,
) {
    let dir = input.right as i8 as f32 - input.left as i8 as f32;
    match scheme {
        ControlScheme::Direct => {
            basket.vel = dir * tuning.basket_speed;
        }
        ControlScheme::Inertial => {
            if dir != 0.0 {
                basket.vel = (basket.vel + dir * tuning.basket_accel)
                    .clamp(-tuning.basket_max_speed, tuning.basket_max_speed);
            } else {
                basket.vel *= tuning.basket_friction;
                if basket.vel.abs() < 0.05 {
                    basket.vel = 0.0;
                }
            }
        }
    }
    basket.pos.x += basket.vel;

    if let Some(x) = input.pointer_x {
        basket.pos.x = x - basket.size.x / 2.0;
        basket.vel = 0.0;
    }

    basket.clamp_to(field_width);
}

fn resolve(s: &mut Session, item: &Item, outcome: Outcome) {
    if outcome == Outcome::Catch && item.kind == ItemKind::Explosive && s.immunity.active {
        s.emit(GameEvent::ImmunityBlocked { pos: item.pos });
        return;
    }

    let effect = effect_for(item.kind, outcome, &s.tuning.scores);
    let score_delta = s.counters.add_score(effect.score);
    let event = match outcome {
        Outcome::Catch => GameEvent::Caught {
            kind: item.kind,
            pos: item.pos,
            score_delta,
        },
        Outcome::Miss => GameEvent::Missed {
            kind: item.kind,
            pos: item.pos,
            score_delta,
        },
    };
    s.emit(event);

    if effect.heal {
        s.heal();
    }
    if effect.strike {
        s.register_strike();
    }
    if effect.grants_immunity && !s.is_over() {
        s.immunity.activate(s.clock_ms, s.tuning.immunity_ms);
    }
}
