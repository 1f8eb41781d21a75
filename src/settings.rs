//! Player settings and preferences
//!
//! Persisted separately from the leaderboard cache in the local store.

use serde::{Deserialize, Serialize};

use crate::persistence::LocalStore;

/// How keyboard input moves the basket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ControlScheme {
    /// Fixed step per frame while a key is held
    Direct,
    /// Acceleration while held, friction when released
    #[default]
    Inertial,
}

impl ControlScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlScheme::Direct => "Direct",
            ControlScheme::Inertial => "Inertial",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "direct" | "classic" => Some(ControlScheme::Direct),
            "inertial" | "smooth" => Some(ControlScheme::Inertial),
            _ => None,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Keyboard control scheme
    pub control_scheme: ControlScheme,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Ambient loop volume (0.0 - 1.0)
    pub music_volume: f32,

    // === Session ===
    /// Pause automatically when the tab is hidden or the window loses focus
    pub auto_pause_on_blur: bool,

    // === Visual Effects ===
    /// Floating score text on catches and misses
    pub floating_text: bool,

    // === Accessibility ===
    /// Reduced motion (no explosion flash)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            control_scheme: ControlScheme::Inertial,

            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.5,

            auto_pause_on_blur: true,

            floating_text: true,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Local store key
    pub const STORAGE_KEY: &'static str = "basket_catch_settings";

    /// Effective explosion flash (respects reduced_motion)
    pub fn effective_flash(&self) -> bool {
        !self.reduced_motion
    }

    /// Effective sound effect gain
    pub fn sfx_gain(&self) -> f32 {
        (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
    }

    /// Effective ambient gain
    pub fn music_gain(&self) -> f32 {
        (self.master_volume * self.music_volume).clamp(0.0, 1.0)
    }

    /// Load settings, falling back to defaults on a missing or unreadable entry
    pub fn load(store: &impl LocalStore) -> Self {
        if let Some(json) = store.get(Self::STORAGE_KEY) {
            match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from local store");
                    return settings;
                }
                Err(e) => log::warn!("Ignoring unreadable settings: {e}"),
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings (best-effort)
    pub fn save(&self, store: &mut impl LocalStore) {
        if let Ok(json) = serde_json::to_string(self) {
            store.set(Self::STORAGE_KEY, &json);
            log::info!("Settings saved");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn round_trips_through_store() {
        let mut store = MemoryStore::default();
        let settings = Settings {
            control_scheme: ControlScheme::Direct,
            reduced_motion: true,
            ..Settings::default()
        };
        settings.save(&mut store);
        assert_eq!(Settings::load(&store), settings);
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        let mut store = MemoryStore::default();
        store.set(Settings::STORAGE_KEY, "{not json");
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn gains_are_clamped() {
        let settings = Settings {
            master_volume: 2.0,
            sfx_volume: 1.0,
            ..Settings::default()
        };
        assert_eq!(settings.sfx_gain(), 1.0);
        assert!(!Settings { reduced_motion: true, ..Settings::default() }.effective_flash());
    }

    #[test]
    fn control_scheme_parsing() {
        assert_eq!(ControlScheme::from_str("Classic"), Some(ControlScheme::Direct));
        assert_eq!(ControlScheme::from_str("inertial"), Some(ControlScheme::Inertial));
        assert_eq!(ControlScheme::from_str("hover"), None);
        assert_eq!(ControlScheme::Inertial.as_str(), "Inertial");
    }
}
