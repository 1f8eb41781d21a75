//! Data-driven game balance
//!
//! Every number that shapes difficulty lives here so a session can be
//! re-balanced from JSON without touching the simulation code.

use serde::{Deserialize, Serialize};

/// Half-open `[min, max)` range sampled uniformly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnRange {
    pub min: f32,
    pub max: f32,
}

impl SpawnRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Map a unit roll in `[0, 1)` into the range
    #[inline]
    pub fn lerp(&self, t: f32) -> f32 {
        self.min + t * (self.max - self.min)
    }

    pub fn contains(&self, v: f32) -> bool {
        v >= self.min && v < self.max
    }
}

/// Additive fall-velocity offsets per item category (px/frame)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryOffsets {
    pub beneficial: f32,
    pub harmful: f32,
    pub explosive: f32,
    pub healing: f32,
}

impl Default for CategoryOffsets {
    fn default() -> Self {
        Self {
            beneficial: 0.0,
            harmful: 0.6,
            explosive: 0.2,
            healing: 0.4,
        }
    }
}

/// Score deltas applied by the effect table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreTable {
    pub beneficial_catch: i64,
    pub harmful_catch: i64,
    pub healing_catch: i64,
    pub beneficial_miss: i64,
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self {
            beneficial_catch: 5,
            harmful_catch: -8,
            healing_catch: 10,
            beneficial_miss: -20,
        }
    }
}

/// Game balance knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Maximum simultaneously live items
    pub max_items: usize,
    /// Strikes that end the session
    pub max_strikes: u8,

    /// Global fall speed at level 1
    pub initial_fall_speed: f32,
    /// Fall speed added per level-up
    pub fall_speed_step: f32,
    /// Share of the global fall speed applied each frame
    pub fall_speed_scale: f32,

    /// Spawn cadence at level 1 (ms)
    pub initial_spawn_interval_ms: u32,
    /// Multiplier applied to the spawn interval on level-up
    pub spawn_interval_factor: f64,
    /// Spawn interval floor (ms)
    pub min_spawn_interval_ms: u32,

    /// Difficulty controller cadence (ms)
    pub level_tick_ms: u32,
    /// Accumulated seconds needed for a level-up
    pub level_duration_secs: f32,

    /// Time from session start until the onboarding item reaches the catch line
    pub grace_period_ms: f64,

    /// Horizontal margin kept clear on both sides when spawning
    pub spawn_margin: f32,
    pub radius: SpawnRange,
    pub base_velocity: SpawnRange,
    pub offsets: CategoryOffsets,

    /// Cumulative thresholds for the weighted draw (beneficial, harmful); the rest is explosive
    pub beneficial_threshold: f32,
    pub harmful_threshold: f32,
    /// Per-spawn chance of a healing item once eligible
    pub healing_chance: f32,

    /// Explosive-item immunity after a strike (ms)
    pub immunity_ms: f64,

    /// Direct control: px per frame while a key is held
    pub basket_speed: f32,
    /// Inertial control: velocity gained per frame while a key is held
    pub basket_accel: f32,
    /// Inertial control: velocity retained per frame with no key held
    pub basket_friction: f32,
    /// Inertial control: velocity cap
    pub basket_max_speed: f32,

    pub scores: ScoreTable,

    /// Delay between game over and the name-entry prompt (ms)
    pub name_prompt_delay_ms: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            max_items: 5,
            max_strikes: 3,

            initial_fall_speed: 2.0,
            fall_speed_step: 1.6,
            fall_speed_scale: 0.16,

            initial_spawn_interval_ms: 1000,
            spawn_interval_factor: 0.9,
            min_spawn_interval_ms: 250,

            level_tick_ms: 1000,
            level_duration_secs: 10.0,

            grace_period_ms: 9500.0,

            spawn_margin: 30.0,
            radius: SpawnRange::new(12.0, 26.0),
            base_velocity: SpawnRange::new(0.8, 2.6),
            offsets: CategoryOffsets::default(),

            beneficial_threshold: 0.6,
            harmful_threshold: 0.9,
            healing_chance: 0.015,

            immunity_ms: 2000.0,

            basket_speed: 8.0,
            basket_accel: 1.1,
            basket_friction: 0.82,
            basket_max_speed: 10.0,

            scores: ScoreTable::default(),

            name_prompt_delay_ms: 600.0,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let tuning: Tuning = serde_json::from_str(json)?;
        for warning in tuning.validate() {
            log::warn!("tuning: {warning}");
        }
        Ok(tuning)
    }

    /// Spawn interval after one more level-up
    pub fn next_spawn_interval(&self, current_ms: u32) -> u32 {
        let scaled = (current_ms as f64 * self.spawn_interval_factor).floor() as u32;
        scaled.max(self.min_spawn_interval_ms)
    }

    /// Human-readable problems with this tuning (empty when sane)
    pub fn validate(&self) -> Vec<String> {
        let mut w = Vec::new();
        if self.max_items == 0 {
            w.push("max_items is 0; nothing will ever spawn".into());
        }
        if self.max_strikes == 0 {
            w.push("max_strikes is 0; session can never end by strikes".into());
        }
        if self.fall_speed_step < 0.0 {
            w.push(format!(
                "fall_speed_step {} negative; levels would slow items down",
                self.fall_speed_step
            ));
        }
        if !(0.0..1.0).contains(&self.spawn_interval_factor) || self.spawn_interval_factor == 0.0 {
            w.push(format!(
                "spawn_interval_factor {} outside (0, 1); spawn cadence would not tighten",
                self.spawn_interval_factor
            ));
        }
        if self.min_spawn_interval_ms == 0 {
            w.push("min_spawn_interval_ms is 0".into());
        }
        if self.min_spawn_interval_ms > self.initial_spawn_interval_ms {
            w.push(format!(
                "min_spawn_interval_ms {} above initial interval {}",
                self.min_spawn_interval_ms, self.initial_spawn_interval_ms
            ));
        }
        if self.level_tick_ms == 0 {
            w.push("level_tick_ms is 0".into());
        }
        for (name, range) in [("radius", self.radius), ("base_velocity", self.base_velocity)] {
            if range.min > range.max {
                w.push(format!("{name} range inverted ({} > {})", range.min, range.max));
            }
            if range.min <= 0.0 {
                w.push(format!("{name} range minimum {} should be > 0", range.min));
            }
        }
        if !(self.beneficial_threshold <= self.harmful_threshold && self.harmful_threshold <= 1.0) {
            w.push(format!(
                "category thresholds not cumulative: {} / {}",
                self.beneficial_threshold, self.harmful_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.healing_chance) {
            w.push(format!("healing_chance {} outside 0..1", self.healing_chance));
        }
        if !(0.0..1.0).contains(&self.basket_friction) {
            w.push(format!(
                "basket_friction {} outside 0..1; basket would never settle",
                self.basket_friction
            ));
        }
        w
    }
}
