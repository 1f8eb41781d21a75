//! Entity store and session counters
//!
//! Everything the simulation step mutates lives here. The session owns one
//! instance of each; renderers and subscribers only read them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{BASKET_BOTTOM_MARGIN, BASKET_HEIGHT};
use crate::tuning::{CategoryOffsets, Tuning};

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Frames, spawns and level ticks all run
    Active,
    /// Clock frozen, spawn timer cancelled
    Paused(PauseReason),
    /// Strikes exhausted; terminal for this session
    GameOver,
}

/// Who paused the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PauseReason {
    /// Pause control or cancel key; only an explicit resume clears it
    User,
    /// Focus or visibility lost; cleared when focus returns
    Auto,
}

/// Falling item category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Beneficial,
    Harmful,
    Explosive,
    Healing,
}

/// Drawn shape for an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    Circle,
    Square,
    Triangle,
    Cross,
}

impl ItemKind {
    /// Fall-velocity offset added on top of the sampled base velocity
    pub fn velocity_offset(&self, offsets: &CategoryOffsets) -> f32 {
        match self {
            ItemKind::Beneficial => offsets.beneficial,
            ItemKind::Harmful => offsets.harmful,
            ItemKind::Explosive => offsets.explosive,
            ItemKind::Healing => offsets.healing,
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            ItemKind::Beneficial => Shape::Circle,
            ItemKind::Harmful => Shape::Square,
            ItemKind::Explosive => Shape::Triangle,
            ItemKind::Healing => Shape::Cross,
        }
    }

    /// Fill colour (linear RGBA)
    pub fn color(&self) -> [f32; 4] {
        match self {
            ItemKind::Beneficial => [1.0, 0.82, 0.29, 1.0],
            ItemKind::Harmful => [0.6, 0.63, 0.65, 1.0],
            ItemKind::Explosive => [1.0, 0.36, 0.36, 1.0],
            ItemKind::Healing => [0.36, 0.86, 0.48, 1.0],
        }
    }
}

/// A falling item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: u32,
    /// Center position (logical px)
    pub pos: Vec2,
    pub radius: f32,
    pub kind: ItemKind,
    /// Per-item fall velocity (px/frame), fixed at spawn
    pub velocity: f32,
}

impl Item {
    /// Top edge
    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y - self.radius
    }

    /// Bottom edge
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.radius
    }
}

/// The player's basket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Basket {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    /// Horizontal velocity (px/frame)
    pub vel: f32,
}

impl Basket {
    /// Centered basket resting above the field bottom
    pub fn new(field_width: f32, field_height: f32) -> Self {
        let width = crate::basket_width(field_width);
        Self {
            pos: Vec2::new(
                (field_width - width) / 2.0,
                field_height - BASKET_HEIGHT - BASKET_BOTTOM_MARGIN,
            ),
            size: Vec2::new(width, BASKET_HEIGHT),
            vel: 0.0,
        }
    }

    /// Y where an item's extent first overlaps the basket band
    #[inline]
    pub fn catch_line(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    pub fn center_x(&self) -> f32 {
        self.pos.x + self.size.x / 2.0
    }

    /// Confine to `[0, field_width - width]`, zeroing velocity into the wall
    pub fn clamp_to(&mut self, field_width: f32) {
        let max_x = (field_width - self.size.x).max(0.0);
        if self.pos.x < 0.0 {
            self.pos.x = 0.0;
            if self.vel < 0.0 {
                self.vel = 0.0;
            }
        }
        if self.pos.x > max_x {
            self.pos.x = max_x;
            if self.vel > 0.0 {
                self.vel = 0.0;
            }
        }
    }

    /// Catch test: vertical extent overlaps the basket band and the item
    /// center lies within the basket span
    pub fn catches(&self, item: &Item) -> bool {
        let vertical = item.bottom() >= self.pos.y && item.top() <= self.pos.y + self.size.y;
        vertical && item.pos.x >= self.left() && item.pos.x <= self.right()
    }
}

/// Fixed-length row of hearts; broken slots are strikes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartLedger {
    /// `true` = healthy
    slots: Vec<bool>,
}

impl HeartLedger {
    pub fn new(capacity: u8) -> Self {
        Self {
            slots: vec![true; capacity as usize],
        }
    }

    pub fn slots(&self) -> &[bool] {
        &self.slots
    }

    pub fn capacity(&self) -> u8 {
        self.slots.len() as u8
    }

    /// Broken slot count
    pub fn strikes(&self) -> u8 {
        self.slots.iter().filter(|healthy| !**healthy).count() as u8
    }

    pub fn is_exhausted(&self) -> bool {
        self.slots.iter().all(|healthy| !healthy)
    }

    /// Break the rightmost healthy slot, returning its index
    pub fn break_rightmost_healthy(&mut self) -> Option<usize> {
        let idx = self.slots.iter().rposition(|healthy| *healthy)?;
        self.slots[idx] = false;
        Some(idx)
    }

    /// Heal the leftmost broken slot, returning its index
    pub fn heal_leftmost_broken(&mut self) -> Option<usize> {
        let idx = self.slots.iter().position(|healthy| !healthy)?;
        self.slots[idx] = true;
        Some(idx)
    }
}

/// Timed protection from explosive items
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Immunity {
    pub active: bool,
    /// Session clock (ms) at which immunity lapses
    pub expires_at_ms: f64,
}

impl Immunity {
    pub fn activate(&mut self, now_ms: f64, duration_ms: f64) {
        self.active = true;
        self.expires_at_ms = now_ms + duration_ms;
    }

    /// Clear if the clock has passed expiry; true when it just lapsed
    pub fn expire(&mut self, now_ms: f64) -> bool {
        if self.active && now_ms >= self.expires_at_ms {
            self.active = false;
            return true;
        }
        false
    }

    /// Remaining protection (ms), 0 when inactive
    pub fn remaining_ms(&self, now_ms: f64) -> f64 {
        if self.active {
            (self.expires_at_ms - now_ms).max(0.0)
        } else {
            0.0
        }
    }
}

/// Score and difficulty counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counters {
    pub score: u64,
    /// Starts at 1
    pub level: u32,
    /// Global additive fall speed term
    pub fall_speed: f32,
    pub spawn_interval_ms: u32,
    /// Seconds accumulated toward the next level-up
    pub level_elapsed_secs: f32,
}

impl Counters {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            score: 0,
            level: 1,
            fall_speed: tuning.initial_fall_speed,
            spawn_interval_ms: tuning.initial_spawn_interval_ms,
            level_elapsed_secs: 0.0,
        }
    }

    /// Apply a signed score delta, flooring at zero; returns the delta actually applied
    pub fn add_score(&mut self, delta: i64) -> i64 {
        let before = self.score;
        self.score = if delta >= 0 {
            self.score.saturating_add(delta as u64)
        } else {
            self.score.saturating_sub(delta.unsigned_abs())
        };
        self.score as i64 - before as i64
    }
}
