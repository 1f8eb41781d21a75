//! File-backed highscore service
//!
//! Owns a single JSON array file holding the top list. Requests arrive as
//! raw JSON bodies, the way an HTTP handler would hand them over.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::{HighscoreApi, Leaderboard, LeaderboardEntry, LeaderboardError, sanitize_name};

/// Authoritative leaderboard stored in one JSON file
#[derive(Debug, Clone)]
pub struct HighscoreService {
    path: PathBuf,
}

impl HighscoreService {
    /// Open the store, creating the file as `[]` if it does not exist
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LeaderboardError> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        if !path.exists() {
            fs::write(&path, "[]")?;
            log::info!("Created highscore file at {}", path.display());
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current top list. A file that isn't a JSON array reads as empty.
    pub fn top(&self) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        Ok(self.read()?.into_entries())
    }

    /// Handle a `{name, score}` request body
    pub fn submit_json(&self, body: &str) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let body: Value = serde_json::from_str(body)?;
        let score = match body.get("score") {
            Some(Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| LeaderboardError::InvalidScore(n.to_string()))?,
            Some(other) => return Err(LeaderboardError::InvalidScore(other.to_string())),
            None => return Err(LeaderboardError::InvalidScore("missing".into())),
        };
        let name = body.get("name").map(name_text).unwrap_or_default();
        self.submit(&name, score)
    }

    /// Record a score stamped with the current time
    pub fn submit(&self, name: &str, score: f64) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        self.submit_at(name, score, crate::platform::now_ms())
    }

    /// Record a score with an explicit timestamp
    pub fn submit_at(
        &self,
        name: &str,
        score: f64,
        date: f64,
    ) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        if !score.is_finite() || score < 0.0 {
            return Err(LeaderboardError::InvalidScore(score.to_string()));
        }
        let entry = LeaderboardEntry::new(sanitize_name(name), score.floor() as u64, date);

        let mut board = self.read()?;
        let rank = board.insert(entry);
        self.write(&board)?;
        log::info!("Highscore recorded (rank {rank:?}), {} entries", board.len());
        Ok(board.into_entries())
    }

    fn read(&self) -> Result<Leaderboard, LeaderboardError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                fs::write(&self.path, "[]")?;
                String::from("[]")
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Leaderboard::from_json_lenient(&raw))
    }

    fn write(&self, board: &Leaderboard) -> Result<(), LeaderboardError> {
        let json = serde_json::to_string_pretty(board)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// `HighscoreApi` served directly by a local `HighscoreService`
#[derive(Debug, Clone)]
pub struct InProcessApi {
    service: HighscoreService,
}

impl InProcessApi {
    pub fn new(service: HighscoreService) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &HighscoreService {
        &self.service
    }
}

impl HighscoreApi for InProcessApi {
    async fn fetch(&self) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        self.service.top()
    }

    async fn submit(
        &self,
        name: &str,
        score: u64,
    ) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        self.service.submit(name, score as f64)
    }
}

/// Text of a `name` field. Scalars are stringified; falsy and structured
/// values give an empty name.
fn name_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.as_f64() != Some(0.0) => n.to_string(),
        Value::Bool(true) => "true".to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highscores::{CACHE_KEY, LeaderboardClient};
    use crate::persistence::{LocalStore, MemoryStore};
    use tempfile::TempDir;

    fn service() -> (TempDir, HighscoreService) {
        let dir = TempDir::new().unwrap();
        let service = HighscoreService::open(dir.path().join("data/highscores.json")).unwrap();
        (dir, service)
    }

    #[test]
    fn open_creates_empty_array_file() {
        let (_dir, service) = service();
        assert_eq!(fs::read_to_string(service.path()).unwrap(), "[]");
        assert!(service.top().unwrap().is_empty());
    }

    #[test]
    fn open_keeps_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scores.json");
        fs::write(&path, r#"[{"name":"OLD","score":3,"date":1.0}]"#).unwrap();
        let service = HighscoreService::open(&path).unwrap();
        assert_eq!(service.top().unwrap()[0].name, "OLD");
    }

    #[test]
    fn non_array_file_reads_as_empty() {
        let (_dir, service) = service();
        fs::write(service.path(), r#"{"scores": []}"#).unwrap();
        assert!(service.top().unwrap().is_empty());

        // The next write replaces it with a proper array
        service.submit_at("A", 1.0, 5.0).unwrap();
        assert_eq!(service.top().unwrap().len(), 1);
    }

    #[test]
    fn submit_sanitizes_floors_and_persists_pretty() {
        let (_dir, service) = service();
        let list = service
            .submit_json(r#"{"name": "  toolongname  ", "score": 41.9}"#)
            .unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "toolongn");
        assert_eq!(list[0].score, 41);
        assert!(list[0].date > 0.0);

        let raw = fs::read_to_string(service.path()).unwrap();
        assert!(raw.contains('\n'), "pretty-printed");
        assert_eq!(Leaderboard::from_json_lenient(&raw).entries(), list.as_slice());
    }

    #[test]
    fn missing_name_gets_placeholder() {
        let (_dir, service) = service();
        let list = service.submit_json(r#"{"score": 3}"#).unwrap();
        assert_eq!(list[0].name, "???");
    }

    #[test]
    fn scalar_names_are_stringified() {
        let (_dir, service) = service();
        service.submit_json(r#"{"name": 123, "score": 30}"#).unwrap();
        service.submit_json(r#"{"name": true, "score": 20}"#).unwrap();
        service.submit_json(r#"{"name": 0, "score": 10}"#).unwrap();
        let list = service.submit_json(r#"{"name": null, "score": 5}"#).unwrap();

        let names: Vec<&str> = list.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["123", "true", "???", "???"]);
    }

    #[test]
    fn invalid_scores_are_rejected() {
        let (_dir, service) = service();
        for body in [
            r#"{"name": "A", "score": -1}"#,
            r#"{"name": "A", "score": "12"}"#,
            r#"{"name": "A", "score": null}"#,
            r#"{"name": "A"}"#,
        ] {
            let err = service.submit_json(body).unwrap_err();
            assert!(
                matches!(err, LeaderboardError::InvalidScore(_)),
                "{body}: {err}"
            );
        }
        assert!(matches!(
            service.submit_at("A", f64::NAN, 0.0),
            Err(LeaderboardError::InvalidScore(_))
        ));
        assert!(matches!(
            service.submit_json("not json"),
            Err(LeaderboardError::Serialization(_))
        ));
        assert!(service.top().unwrap().is_empty());
    }

    #[test]
    fn keeps_top_ten_sorted() {
        let (_dir, service) = service();
        for score in [5.0, 80.0, 20.0, 65.0, 10.0, 90.0, 30.0, 15.0, 70.0, 40.0, 55.0, 1.0] {
            service.submit_at("P", score, 1.0).unwrap();
        }
        let scores: Vec<u64> = service.top().unwrap().iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![90, 80, 70, 65, 55, 40, 30, 20, 15, 10]);
    }

    #[test]
    fn client_round_trip_through_service() {
        let (_dir, service) = service();
        let api = InProcessApi::new(service.clone());
        let mut client = LeaderboardClient::new(api, MemoryStore::new());

        let rank = pollster::block_on(client.submit("Ace", 120, 0.0));
        assert_eq!(rank, Some(1));
        assert_eq!(service.top().unwrap()[0].name, "Ace");

        // A fresh client with an empty cache sees the persisted score
        let mut fresh = LeaderboardClient::new(InProcessApi::new(service), MemoryStore::new());
        pollster::block_on(fresh.load());
        assert_eq!(fresh.board().top_score(), Some(120));
        assert!(fresh.board().entries()[0].date > 0.0);
    }

    #[test]
    fn client_falls_back_when_file_is_unwritable() {
        let (dir, service) = service();
        let api = InProcessApi::new(service);
        let mut store = MemoryStore::new();
        store.set(CACHE_KEY, "[]");
        let mut client = LeaderboardClient::new(api, store);

        // Replace the data directory with a file so every write fails
        fs::remove_dir_all(dir.path().join("data")).unwrap();
        fs::write(dir.path().join("data"), "blocker").unwrap();

        let rank = pollster::block_on(client.submit("Bo", 7, 42.0));
        assert_eq!(rank, Some(1));
        assert_eq!(client.board().entries()[0].date, 42.0);
    }
}
