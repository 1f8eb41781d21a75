//! Local key-value persistence
//!
//! A string-keyed store holding JSON blobs (leaderboard cache, settings).
//! Writes are best-effort: a store that cannot persist simply drops the value.

use std::collections::HashMap;

/// Best-effort string-keyed storage
pub trait LocalStore {
    /// Read a value, `None` when missing or unreadable
    fn get(&self, key: &str) -> Option<String>;
    /// Write a value; failures are swallowed
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory store (native builds and tests)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

impl<T: LocalStore + ?Sized> LocalStore for &mut T {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) {
        (**self).set(key, value)
    }
}
