//! Basket Catch - A falling-items arcade game
//!
//! Core modules:
//! - `sim`: Simulation (spawning, movement, catches, difficulty, session state)
//! - `highscores`: Leaderboard model, client with local fallback, and file-backed service
//! - `persistence`: String-keyed local store used for caches and settings
//! - `platform`: Browser bindings (storage, fetch, clock)
//! - `renderer`: Draw-list construction and the Canvas 2D sink
//! - `fx`: Cosmetic effects driven by simulation events
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod fx;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use highscores::{Leaderboard, LeaderboardClient, LeaderboardEntry, LeaderboardError};
pub use settings::{ControlScheme, Settings};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Logical play-field size (portrait, CSS scales the canvas)
    pub const FIELD_WIDTH: f32 = 480.0;
    pub const FIELD_HEIGHT: f32 = 800.0;

    /// Render-synchronized frame period (60 Hz)
    pub const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Largest clock advance accepted from a single host frame
    pub const MAX_FRAME_GAP_MS: f64 = 100.0;

    /// Basket geometry
    pub const BASKET_MIN_WIDTH: f32 = 80.0;
    pub const BASKET_WIDTH_FRACTION: f32 = 0.12;
    pub const BASKET_HEIGHT: f32 = 28.0;
    /// Gap between basket bottom and field bottom
    pub const BASKET_BOTTOM_MARGIN: f32 = 30.0;

    /// Number of leaderboard entries kept
    pub const LEADERBOARD_SIZE: usize = 10;
}

/// Basket width for a given field width
#[inline]
pub fn basket_width(field_width: f32) -> f32 {
    consts::BASKET_MIN_WIDTH.max((field_width * consts::BASKET_WIDTH_FRACTION).floor())
}
