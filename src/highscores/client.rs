//! Leaderboard client with local fallback
//!
//! Reads go service → local cache → empty. Writes go to the service and,
//! when it is unreachable, are merged into the cached copy instead. Nothing
//! here ever blocks the simulation; hosts drive the futures on their own.

use super::{Leaderboard, LeaderboardEntry, LeaderboardError, sanitize_name};
use crate::persistence::LocalStore;

/// Local store key for the cached board
pub const CACHE_KEY: &str = "highscores";

/// Remote leaderboard transport
#[allow(async_fn_in_trait)]
pub trait HighscoreApi {
    /// Current top list
    async fn fetch(&self) -> Result<Vec<LeaderboardEntry>, LeaderboardError>;
    /// Record a score; returns the resulting top list
    async fn submit(&self, name: &str, score: u64)
    -> Result<Vec<LeaderboardEntry>, LeaderboardError>;
}

/// Read-through leaderboard cache in front of a `HighscoreApi`
pub struct LeaderboardClient<A, S> {
    api: A,
    store: S,
    board: Leaderboard,
}

impl<A: HighscoreApi, S: LocalStore> LeaderboardClient<A, S> {
    /// Seeded from whatever the local cache holds
    pub fn new(api: A, store: S) -> Self {
        let board = read_cache(&store);
        log::info!("Leaderboard cache holds {} entries", board.len());
        Self { api, store, board }
    }

    pub fn board(&self) -> &Leaderboard {
        &self.board
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Refresh from the service, falling back to the cache
    pub async fn load(&mut self) -> &Leaderboard {
        let result = self.api.fetch().await;
        self.apply_loaded(result);
        &self.board
    }

    /// Submit a score. Returns the rank it holds afterwards, if any.
    pub async fn submit(&mut self, raw_name: &str, score: u64, now_ms: f64) -> Option<usize> {
        let name = sanitize_name(raw_name);
        let result = self.api.submit(&name, score).await;
        self.apply_submitted(&name, score, now_ms, result)
    }

    /// Fold a fetch result into the board
    pub fn apply_loaded(&mut self, result: Result<Vec<LeaderboardEntry>, LeaderboardError>) {
        match result {
            Ok(entries) => {
                self.board = Leaderboard::from_entries(entries);
                self.write_cache();
                log::info!("Loaded {} high scores", self.board.len());
            }
            Err(e) => {
                log::warn!("Leaderboard fetch failed, using local cache: {e}");
                self.board = read_cache(&self.store);
            }
        }
    }

    /// Fold a submit result into the board; on failure merge locally
    pub fn apply_submitted(
        &mut self,
        name: &str,
        score: u64,
        now_ms: f64,
        result: Result<Vec<LeaderboardEntry>, LeaderboardError>,
    ) -> Option<usize> {
        let rank = match result {
            Ok(entries) => {
                self.board = Leaderboard::from_entries(entries);
                self.board.rank_of(name, score)
            }
            Err(e) => {
                log::warn!("Highscore submit failed, saving locally: {e}");
                self.board.insert(LeaderboardEntry::new(name, score, now_ms))
            }
        };
        self.write_cache();
        rank
    }

    fn write_cache(&mut self) {
        match self.board.to_json() {
            Ok(json) => self.store.set(CACHE_KEY, &json),
            Err(e) => log::warn!("Could not serialize leaderboard cache: {e}"),
        }
    }
}

fn read_cache(store: &impl LocalStore) -> Leaderboard {
    store
        .get(CACHE_KEY)
        .map(|json| Leaderboard::from_json_lenient(&json))
        .unwrap_or_default()
}
