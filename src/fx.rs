//! Cosmetic effects
//!
//! Flashes, overlays, floating score text and the level banner. Driven only
//! by simulation events and the session clock; never touches the session.

use glam::Vec2;

use crate::consts::FIELD_HEIGHT;
use crate::settings::Settings;
use crate::sim::{EventSink, GameEvent, ItemKind};

/// Explosion flash decay (ms)
pub const FLASH_MS: f64 = 300.0;
/// Grey overlay after a harmful catch (ms)
pub const HARMFUL_OVERLAY_MS: f64 = 400.0;
/// Floating score text lifetime (ms)
pub const FLOATING_TEXT_MS: f64 = 800.0;
/// Distance floating text rises over its lifetime
pub const FLOATING_TEXT_RISE: f32 = 40.0;
/// Level-up banner lifetime (ms)
pub const LEVEL_BANNER_MS: f64 = 1500.0;

/// A score popup
#[derive(Debug, Clone, PartialEq)]
pub struct FloatingText {
    pub text: String,
    /// Spawn position
    pub origin: Vec2,
    pub color: [f32; 4],
    pub age_ms: f64,
}

impl FloatingText {
    /// 0 at spawn, 1 at expiry
    pub fn progress(&self) -> f32 {
        (self.age_ms / FLOATING_TEXT_MS).clamp(0.0, 1.0) as f32
    }

    /// Current position (rises as it ages)
    pub fn pos(&self) -> Vec2 {
        self.origin - Vec2::new(0.0, FLOATING_TEXT_RISE * self.progress())
    }

    pub fn alpha(&self) -> f32 {
        1.0 - self.progress()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Effects {
    flash_enabled: bool,
    floating_text_enabled: bool,
    /// Remaining flash time
    flash_ms: f64,
    /// Remaining harmful overlay time
    harmful_ms: f64,
    /// Level and remaining time of the banner
    banner: Option<(u32, f64)>,
    texts: Vec<FloatingText>,
    immune: bool,
}

impl Effects {
    pub fn new(settings: &Settings) -> Self {
        Self {
            flash_enabled: settings.effective_flash(),
            floating_text_enabled: settings.floating_text,
            ..Self::default()
        }
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.flash_enabled = settings.effective_flash();
        self.floating_text_enabled = settings.floating_text;
        if !self.flash_enabled {
            self.flash_ms = 0.0;
        }
        if !self.floating_text_enabled {
            self.texts.clear();
        }
    }

    /// Age everything by `dt_ms` of session time
    pub fn advance(&mut self, dt_ms: f64) {
        let dt = dt_ms.max(0.0);
        self.flash_ms = (self.flash_ms - dt).max(0.0);
        self.harmful_ms = (self.harmful_ms - dt).max(0.0);
        if let Some((_, remaining)) = &mut self.banner {
            *remaining -= dt;
        }
        if self.banner.is_some_and(|(_, remaining)| remaining <= 0.0) {
            self.banner = None;
        }
        for text in &mut self.texts {
            text.age_ms += dt;
        }
        self.texts.retain(|t| t.age_ms < FLOATING_TEXT_MS);
    }

    /// Explosion flash opacity
    pub fn flash_alpha(&self) -> f32 {
        (self.flash_ms / FLASH_MS) as f32 * 0.7
    }

    /// Harmful-catch overlay opacity
    pub fn harmful_alpha(&self) -> f32 {
        (self.harmful_ms / HARMFUL_OVERLAY_MS) as f32 * 0.45
    }

    /// Level and opacity of the level-up banner
    pub fn banner(&self) -> Option<(u32, f32)> {
        self.banner.map(|(level, remaining)| {
            let alpha = (remaining / LEVEL_BANNER_MS).clamp(0.0, 1.0) as f32;
            (level, alpha)
        })
    }

    pub fn texts(&self) -> &[FloatingText] {
        &self.texts
    }

    /// Basket shimmer while explosives are harmless
    pub fn immune(&self) -> bool {
        self.immune
    }

    fn push_text(&mut self, delta: i64, at: Vec2) {
        if !self.floating_text_enabled || delta == 0 {
            return;
        }
        let (text, color) = if delta > 0 {
            (format!("+{delta}"), [0.55, 1.0, 0.6, 1.0])
        } else {
            (delta.to_string(), [1.0, 0.45, 0.45, 1.0])
        };
        self.texts.push(FloatingText {
            text,
            origin: at,
            color,
            age_ms: 0.0,
        });
    }
}

impl EventSink for Effects {
    fn on_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::Caught {
                kind,
                pos,
                score_delta,
            } => {
                match kind {
                    ItemKind::Explosive => {
                        if self.flash_enabled {
                            self.flash_ms = FLASH_MS;
                        }
                        self.immune = true;
                    }
                    ItemKind::Harmful => self.harmful_ms = HARMFUL_OVERLAY_MS,
                    _ => {}
                }
                self.push_text(*score_delta, *pos);
            }
            GameEvent::Missed {
                pos, score_delta, ..
            } => {
                // Missed items are below the field; show the text at the edge
                let at = Vec2::new(pos.x, pos.y.min(FIELD_HEIGHT - 20.0));
                self.push_text(*score_delta, at);
            }
            GameEvent::ImmunityEnded => self.immune = false,
            GameEvent::LevelUp { level, .. } => self.banner = Some((*level, LEVEL_BANNER_MS)),
            GameEvent::GameOver { .. } => {
                self.immune = false;
                self.banner = None;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caught(kind: ItemKind, score_delta: i64) -> GameEvent {
        GameEvent::Caught {
            kind,
            pos: Vec2::new(100.0, 700.0),
            score_delta,
        }
    }

    #[test]
    fn explosion_flash_decays() {
        let mut fx = Effects::new(&Settings::default());
        fx.on_event(&caught(ItemKind::Explosive, 0));
        assert!((fx.flash_alpha() - 0.7).abs() < 1e-6);
        assert!(fx.immune());
        fx.advance(150.0);
        assert!((fx.flash_alpha() - 0.35).abs() < 1e-6);
        fx.advance(200.0);
        assert_eq!(fx.flash_alpha(), 0.0);
        // No text for a zero delta
        assert!(fx.texts().is_empty());
    }

    #[test]
    fn reduced_motion_suppresses_flash() {
        let settings = Settings {
            reduced_motion: true,
            ..Settings::default()
        };
        let mut fx = Effects::new(&settings);
        fx.on_event(&caught(ItemKind::Explosive, 0));
        assert_eq!(fx.flash_alpha(), 0.0);
        assert!(fx.immune());
    }

    #[test]
    fn harmful_overlay_and_text() {
        let mut fx = Effects::new(&Settings::default());
        fx.on_event(&caught(ItemKind::Harmful, -8));
        assert!(fx.harmful_alpha() > 0.0);
        assert_eq!(fx.texts()[0].text, "-8");
        fx.advance(HARMFUL_OVERLAY_MS);
        assert_eq!(fx.harmful_alpha(), 0.0);
    }

    #[test]
    fn floating_text_rises_and_expires() {
        let mut fx = Effects::new(&Settings::default());
        fx.on_event(&caught(ItemKind::Beneficial, 5));
        let text = &fx.texts()[0];
        assert_eq!(text.text, "+5");
        assert_eq!(text.pos(), Vec2::new(100.0, 700.0));

        fx.advance(FLOATING_TEXT_MS / 2.0);
        let text = &fx.texts()[0];
        assert_eq!(text.pos(), Vec2::new(100.0, 680.0));
        assert!((text.alpha() - 0.5).abs() < 1e-6);

        fx.advance(FLOATING_TEXT_MS / 2.0);
        assert!(fx.texts().is_empty());
    }

    #[test]
    fn miss_text_is_kept_on_screen() {
        let mut fx = Effects::new(&Settings::default());
        fx.on_event(&GameEvent::Missed {
            kind: ItemKind::Beneficial,
            pos: Vec2::new(50.0, 830.0),
            score_delta: -20,
        });
        assert_eq!(fx.texts()[0].text, "-20");
        assert_eq!(fx.texts()[0].origin.y, FIELD_HEIGHT - 20.0);
    }

    #[test]
    fn floating_text_can_be_disabled() {
        let settings = Settings {
            floating_text: false,
            ..Settings::default()
        };
        let mut fx = Effects::new(&settings);
        fx.on_event(&caught(ItemKind::Healing, 10));
        assert!(fx.texts().is_empty());
    }

    #[test]
    fn level_banner_fades() {
        let mut fx = Effects::new(&Settings::default());
        fx.on_event(&GameEvent::LevelUp {
            level: 3,
            fall_speed: 5.2,
            spawn_interval_ms: 810,
        });
        assert_eq!(fx.banner(), Some((3, 1.0)));
        fx.advance(750.0);
        assert_eq!(fx.banner(), Some((3, 0.5)));
        fx.advance(750.0);
        assert_eq!(fx.banner(), None);
    }

    #[test]
    fn immunity_shimmer_clears() {
        let mut fx = Effects::new(&Settings::default());
        fx.on_event(&caught(ItemKind::Explosive, 0));
        fx.on_event(&GameEvent::ImmunityEnded);
        assert!(!fx.immune());
    }
}
