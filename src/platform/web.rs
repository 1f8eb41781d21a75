//! Browser bindings: LocalStorage and the fetch-based highscore transport

use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response, Storage};

use crate::highscores::{HighscoreApi, Leaderboard, LeaderboardEntry, LeaderboardError};
use crate::persistence::LocalStore;

/// `window.localStorage`, or nothing when the browser refuses it
#[derive(Debug, Clone, Default)]
pub struct BrowserStorage {
    storage: Option<Storage>,
}

impl BrowserStorage {
    pub fn open() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if storage.is_none() {
            log::warn!("LocalStorage unavailable; nothing will persist");
        }
        Self { storage }
    }
}

impl LocalStore for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok()?
    }

    fn set(&mut self, key: &str, value: &str) {
        if let Some(storage) = &self.storage {
            if storage.set_item(key, value).is_err() {
                log::warn!("Could not write '{key}' to LocalStorage");
            }
        }
    }
}

/// Default highscore endpoint (same origin)
pub const HIGHSCORE_ENDPOINT: &str = "/api/highscores";

/// `HighscoreApi` over `window.fetch`
#[derive(Debug, Clone)]
pub struct FetchApi {
    endpoint: String,
}

impl Default for FetchApi {
    fn default() -> Self {
        Self::new(HIGHSCORE_ENDPOINT)
    }
}

impl FetchApi {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    async fn request(
        &self,
        method: &str,
        body: Option<String>,
    ) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let opts = RequestInit::new();
        opts.set_method(method);
        opts.set_mode(RequestMode::SameOrigin);
        if let Some(body) = &body {
            opts.set_body(&JsValue::from_str(body));
        }

        let request = Request::new_with_str_and_init(&self.endpoint, &opts).map_err(js_error)?;
        if body.is_some() {
            request
                .headers()
                .set("Content-Type", "application/json")
                .map_err(js_error)?;
        }

        let window =
            web_sys::window().ok_or_else(|| LeaderboardError::Network("no window".into()))?;
        let response: Response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(js_error)?
            .dyn_into()
            .map_err(js_error)?;
        if !response.ok() {
            return Err(LeaderboardError::Status(response.status()));
        }

        let text = JsFuture::from(response.text().map_err(js_error)?)
            .await
            .map_err(js_error)?
            .as_string()
            .unwrap_or_default();
        Leaderboard::parse_response(&text)
    }
}

impl HighscoreApi for FetchApi {
    async fn fetch(&self) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        self.request("GET", None).await
    }

    async fn submit(
        &self,
        name: &str,
        score: u64,
    ) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let body = serde_json::json!({ "name": name, "score": score }).to_string();
        self.request("POST", Some(body)).await
    }
}

fn js_error(e: JsValue) -> LeaderboardError {
    LeaderboardError::Network(e.as_string().unwrap_or_else(|| format!("{e:?}")))
}
