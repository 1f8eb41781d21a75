//! High score leaderboard
//!
//! The model shared by the browser client, the local cache and the
//! file-backed service: a top-10 list sorted by score, descending.

mod client;
#[cfg(not(target_arch = "wasm32"))]
mod service;

pub use client::{CACHE_KEY, HighscoreApi, LeaderboardClient};
#[cfg(not(target_arch = "wasm32"))]
pub use service::{HighscoreService, InProcessApi};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::consts::LEADERBOARD_SIZE;

/// Longest name kept after sanitizing
pub const MAX_NAME_LEN: usize = 8;
/// Stored when sanitizing leaves nothing
pub const PLACEHOLDER_NAME: &str = "???";

/// Failures talking to or persisting the leaderboard
#[derive(Debug, Error)]
pub enum LeaderboardError {
    /// Request never completed (offline, CORS, DNS)
    #[error("network error: {0}")]
    Network(String),
    /// Service answered with a non-success status
    #[error("service responded with HTTP {0}")]
    Status(u16),
    #[error("invalid score: {0}")]
    InvalidScore(String),
    #[error("malformed leaderboard payload: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("leaderboard storage failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u64,
    /// Unix timestamp (ms) when recorded; 0 when unknown
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: f64,
}

impl LeaderboardEntry {
    pub fn new(name: impl Into<String>, score: u64, date: f64) -> Self {
        Self {
            name: name.into(),
            score,
            date,
        }
    }

    /// Panel row, e.g. `03. ACE - 120 (5 mins ago)`
    pub fn display_line(&self, rank: usize) -> String {
        format!(
            "{:02}. {:<3} - {} ({})",
            rank,
            self.name,
            self.score,
            format_date(self.date)
        )
    }
}

/// Older services stored dates as strings; those become "unknown"
fn lenient_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|d| d.is_finite()).unwrap_or(0.0))
}

/// Top scores, sorted descending and capped at `LEADERBOARD_SIZE`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize an arbitrary list: stable sort by score, then truncate
    pub fn from_entries(mut entries: Vec<LeaderboardEntry>) -> Self {
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(LEADERBOARD_SIZE);
        Self { entries }
    }

    /// Parse a cached or served list. Anything that is not a JSON array is
    /// an empty board; malformed elements are skipped.
    pub fn from_json_lenient(json: &str) -> Self {
        let Ok(serde_json::Value::Array(values)) = serde_json::from_str(json) else {
            return Self::new();
        };
        let entries = values
            .into_iter()
            .filter_map(|v| serde_json::from_value::<LeaderboardEntry>(v).ok())
            .collect();
        Self::from_entries(entries)
    }

    /// Parse a service response. Unlike the cache, a body that is not a
    /// list of entries is an error so callers fall back to local data.
    pub fn parse_response(body: &str) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        Ok(serde_json::from_str(body)?)
    }

    pub fn to_json(&self) -> Result<String, LeaderboardError> {
        Ok(serde_json::to_string(&self.entries)?)
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<LeaderboardEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// True while the board has room, or when the score beats any entry
    pub fn is_highscore(&self, score: u64) -> bool {
        self.entries.len() < LEADERBOARD_SIZE || self.entries.iter().any(|e| e.score < score)
    }

    /// Rank (1-indexed) the score would take, `None` if it doesn't qualify
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.is_highscore(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Merge an entry, re-sort and truncate. Returns its rank if it survived.
    /// Ties rank below existing entries.
    pub fn insert(&mut self, entry: LeaderboardEntry) -> Option<usize> {
        let pos = self
            .entries
            .iter()
            .position(|e| entry.score > e.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
        self.entries.truncate(LEADERBOARD_SIZE);
        (pos < LEADERBOARD_SIZE).then_some(pos + 1)
    }

    /// Rank of the best entry matching name and score
    pub fn rank_of(&self, name: &str, score: u64) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.name == name && e.score == score)
            .map(|i| i + 1)
    }
}

/// Trim, keep the first `MAX_NAME_LEN` characters and strip anything
/// outside `[A-Za-z0-9 _-]`. Empty results become the placeholder.
pub fn sanitize_name(raw: &str) -> String {
    let name: String = raw
        .trim()
        .chars()
        .take(MAX_NAME_LEN)
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();
    if name.is_empty() {
        PLACEHOLDER_NAME.to_string()
    } else {
        name
    }
}

/// Format a timestamp relative to now
pub fn format_date(timestamp: f64) -> String {
    format_age(crate::platform::now_ms(), timestamp)
}

/// Relative date string for `timestamp` as seen at `now_ms`
pub fn format_age(now_ms: f64, timestamp: f64) -> String {
    if !(timestamp.is_finite() && timestamp > 0.0) {
        return "N/A".to_string();
    }
    let diff_mins = (now_ms - timestamp).max(0.0) / 60_000.0;
    let diff_hours = diff_mins / 60.0;
    let diff_days = diff_hours / 24.0;

    if diff_days >= 1.0 {
        let days = diff_days.floor() as i64;
        if days == 1 {
            "Yesterday".to_string()
        } else if days < 7 {
            format!("{} days ago", days)
        } else {
            calendar_date(timestamp)
        }
    } else if diff_hours >= 1.0 {
        let hours = diff_hours.floor() as i64;
        if hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", hours)
        }
    } else if diff_mins >= 1.0 {
        let mins = diff_mins.floor() as i64;
        if mins == 1 {
            "1 min ago".to_string()
        } else {
            format!("{} mins ago", mins)
        }
    } else {
        "Just now".to_string()
    }
}

/// Entries older than a week show the player's local calendar date
#[cfg(target_arch = "wasm32")]
fn calendar_date(timestamp: f64) -> String {
    let date = js_sys::Date::new(&wasm_bindgen::JsValue::from_f64(timestamp));
    format!(
        "{}/{}/{:02}",
        date.get_month() + 1,
        date.get_date(),
        date.get_full_year() % 100
    )
}

#[cfg(not(target_arch = "wasm32"))]
fn calendar_date(_timestamp: f64) -> String {
    "N/A".to_string()
}
