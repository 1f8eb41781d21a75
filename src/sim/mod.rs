//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Session clock only, advanced by the host
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod difficulty;
pub mod events;
pub mod scheduler;
pub mod session;
pub mod spawn;
pub mod state;
pub mod tick;

pub use events::{EventLog, EventSink, GameEvent, dispatch};
pub use scheduler::{Scheduler, TimerId};
pub use session::Session;
pub use state::{
    Basket, Counters, HeartLedger, Immunity, Item, ItemKind, PauseReason, SessionPhase, Shape,
};
pub use tick::{Effect, FrameInput, Outcome, effect_for};
