//! Rendering module
//!
//! `build_frame` turns a session snapshot plus the effect state into a flat
//! draw list in logical field coordinates. The Canvas 2D sink replays it.

#[cfg(target_arch = "wasm32")]
pub mod canvas;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasRenderer;

use glam::Vec2;

use crate::consts::{FIELD_HEIGHT, FIELD_WIDTH};
use crate::fx::Effects;
use crate::sim::{Item, PauseReason, Session, SessionPhase, Shape};

/// Linear RGBA
pub type Color = [f32; 4];

const BACKGROUND: Color = [0.05, 0.07, 0.12, 1.0];
const BASKET: Color = [0.55, 0.36, 0.2, 1.0];
const BASKET_RIM: Color = [0.78, 0.55, 0.32, 1.0];
const SHIMMER: Color = [0.5, 0.85, 1.0, 1.0];
const HUD_TEXT: Color = [0.92, 0.94, 0.98, 1.0];
const HEART_HEALTHY: Color = [0.95, 0.25, 0.35, 1.0];
const HEART_BROKEN: Color = [0.25, 0.25, 0.3, 1.0];
const HARMFUL_TINT: Color = [0.45, 0.45, 0.45, 1.0];
const FLASH: Color = [1.0, 0.95, 0.85, 1.0];
const SHADE: Color = [0.0, 0.0, 0.0, 0.55];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

/// One drawing primitive
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Clear {
        color: Color,
    },
    Rect {
        pos: Vec2,
        size: Vec2,
        color: Color,
    },
    StrokeRect {
        pos: Vec2,
        size: Vec2,
        width: f32,
        color: Color,
    },
    Circle {
        center: Vec2,
        radius: f32,
        color: Color,
    },
    Polygon {
        points: Vec<Vec2>,
        color: Color,
    },
    Text {
        text: String,
        pos: Vec2,
        size: f32,
        align: TextAlign,
        color: Color,
    },
}

/// CSS `rgba()` string for a colour
pub fn css_color(c: Color) -> String {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "rgba({}, {}, {}, {:.3})",
        channel(c[0]),
        channel(c[1]),
        channel(c[2]),
        c[3].clamp(0.0, 1.0)
    )
}

fn with_alpha(c: Color, alpha: f32) -> Color {
    [c[0], c[1], c[2], c[3] * alpha]
}

/// Canvas backing-store size for a device pixel ratio (never below 1x)
pub fn backing_size(dpr: f64) -> (u32, u32) {
    let dpr = if dpr.is_finite() { dpr.max(1.0) } else { 1.0 };
    (
        (FIELD_WIDTH as f64 * dpr).round() as u32,
        (FIELD_HEIGHT as f64 * dpr).round() as u32,
    )
}

/// Build the draw list for one frame
pub fn build_frame(session: &Session, effects: &Effects) -> Vec<DrawCmd> {
    let mut cmds = Vec::with_capacity(32 + session.items.len() * 2);
    let field = session.field;

    cmds.push(DrawCmd::Clear { color: BACKGROUND });

    for item in &session.items {
        push_item(&mut cmds, item);
    }
    push_basket(&mut cmds, session, effects);

    for text in effects.texts() {
        cmds.push(DrawCmd::Text {
            text: text.text.clone(),
            pos: text.pos(),
            size: 20.0,
            align: TextAlign::Center,
            color: with_alpha(text.color, text.alpha()),
        });
    }

    let harmful = effects.harmful_alpha();
    if harmful > 0.0 {
        cmds.push(DrawCmd::Rect {
            pos: Vec2::ZERO,
            size: field,
            color: with_alpha(HARMFUL_TINT, harmful),
        });
    }
    let flash = effects.flash_alpha();
    if flash > 0.0 {
        cmds.push(DrawCmd::Rect {
            pos: Vec2::ZERO,
            size: field,
            color: with_alpha(FLASH, flash),
        });
    }

    push_hud(&mut cmds, session);

    if let Some((level, alpha)) = effects.banner() {
        cmds.push(DrawCmd::Text {
            text: format!("LEVEL {level}"),
            pos: Vec2::new(field.x / 2.0, field.y * 0.4),
            size: 42.0,
            align: TextAlign::Center,
            color: with_alpha(HUD_TEXT, alpha),
        });
    }

    match session.phase {
        SessionPhase::Paused(reason) => {
            let hint = match reason {
                PauseReason::User => "Press P or Esc to resume",
                PauseReason::Auto => "Paused while away",
            };
            push_overlay(&mut cmds, field, "PAUSED", hint.to_string());
        }
        SessionPhase::GameOver => {
            let detail = format!(
                "Score {}  -  Level {}",
                session.counters.score, session.counters.level
            );
            push_overlay(&mut cmds, field, "GAME OVER", detail);
        }
        SessionPhase::Active => {}
    }

    cmds
}

fn push_item(cmds: &mut Vec<DrawCmd>, item: &Item) {
    let color = item.kind.color();
    let (c, r) = (item.pos, item.radius);
    match item.kind.shape() {
        Shape::Circle => cmds.push(DrawCmd::Circle {
            center: c,
            radius: r,
            color,
        }),
        Shape::Square => {
            let half = r * 0.85;
            cmds.push(DrawCmd::Rect {
                pos: c - Vec2::splat(half),
                size: Vec2::splat(half * 2.0),
                color,
            });
        }
        Shape::Triangle => cmds.push(DrawCmd::Polygon {
            points: vec![
                c + Vec2::new(0.0, -r),
                c + Vec2::new(r * 0.95, r * 0.8),
                c + Vec2::new(-r * 0.95, r * 0.8),
            ],
            color,
        }),
        Shape::Cross => {
            let arm = r * 0.38;
            cmds.push(DrawCmd::Rect {
                pos: c - Vec2::new(r, arm),
                size: Vec2::new(r * 2.0, arm * 2.0),
                color,
            });
            cmds.push(DrawCmd::Rect {
                pos: c - Vec2::new(arm, r),
                size: Vec2::new(arm * 2.0, r * 2.0),
                color,
            });
        }
    }
}

fn push_basket(cmds: &mut Vec<DrawCmd>, session: &Session, effects: &Effects) {
    let basket = &session.basket;
    cmds.push(DrawCmd::Rect {
        pos: basket.pos,
        size: basket.size,
        color: BASKET,
    });
    cmds.push(DrawCmd::Rect {
        pos: basket.pos,
        size: Vec2::new(basket.size.x, 5.0),
        color: BASKET_RIM,
    });
    if effects.immune() {
        // Fades out as the protection runs down
        let remaining = session.immunity.remaining_ms(session.clock_ms);
        let fade = (remaining / session.tuning.immunity_ms.max(1.0)).clamp(0.0, 1.0) as f32;
        let pulse = (0.55 + 0.45 * ((session.clock_ms / 90.0).sin() as f32).abs())
            * (0.35 + 0.65 * fade);
        cmds.push(DrawCmd::StrokeRect {
            pos: basket.pos - Vec2::splat(4.0),
            size: basket.size + Vec2::splat(8.0),
            width: 3.0,
            color: with_alpha(SHIMMER, pulse),
        });
    }
}

fn push_hud(cmds: &mut Vec<DrawCmd>, session: &Session) {
    let field = session.field;
    let c = &session.counters;
    cmds.push(DrawCmd::Text {
        text: format!("Score: {}", c.score),
        pos: Vec2::new(12.0, 28.0),
        size: 20.0,
        align: TextAlign::Left,
        color: HUD_TEXT,
    });
    cmds.push(DrawCmd::Text {
        text: format!("Level {}", c.level),
        pos: Vec2::new(12.0, 52.0),
        size: 16.0,
        align: TextAlign::Left,
        color: HUD_TEXT,
    });
    cmds.push(DrawCmd::Text {
        text: format!("Speed {:.1}", c.fall_speed),
        pos: Vec2::new(12.0, 72.0),
        size: 14.0,
        align: TextAlign::Left,
        color: with_alpha(HUD_TEXT, 0.7),
    });
    cmds.push(DrawCmd::Text {
        text: format!("Strikes {}/{}", session.strikes(), session.hearts.capacity()),
        pos: Vec2::new(field.x - 12.0, 52.0),
        size: 14.0,
        align: TextAlign::Right,
        color: with_alpha(HUD_TEXT, 0.7),
    });

    // Hearts, left to right, anchored to the right edge
    let slots = session.hearts.slots();
    let spacing = 26.0;
    let start = field.x - 12.0 - 9.0 - spacing * (slots.len().saturating_sub(1)) as f32;
    for (i, healthy) in slots.iter().enumerate() {
        cmds.push(DrawCmd::Circle {
            center: Vec2::new(start + spacing * i as f32, 24.0),
            radius: 9.0,
            color: if *healthy { HEART_HEALTHY } else { HEART_BROKEN },
        });
    }
}

fn push_overlay(cmds: &mut Vec<DrawCmd>, field: Vec2, title: &str, detail: String) {
    cmds.push(DrawCmd::Rect {
        pos: Vec2::ZERO,
        size: field,
        color: SHADE,
    });
    cmds.push(DrawCmd::Text {
        text: title.to_string(),
        pos: Vec2::new(field.x / 2.0, field.y / 2.0 - 10.0),
        size: 44.0,
        align: TextAlign::Center,
        color: HUD_TEXT,
    });
    cmds.push(DrawCmd::Text {
        text: detail,
        pos: Vec2::new(field.x / 2.0, field.y / 2.0 + 30.0),
        size: 18.0,
        align: TextAlign::Center,
        color: with_alpha(HUD_TEXT, 0.8),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::{EventSink, GameEvent, ItemKind};
    use crate::tuning::Tuning;

    fn session() -> Session {
        let mut s = Session::new(Tuning::default(), 3, 0.0);
        s.items.clear();
        s
    }

    fn place(s: &mut Session, kind: ItemKind, x: f32) {
        s.items.push(Item {
            id: s.items.len() as u32 + 100,
            pos: Vec2::new(x, 200.0),
            radius: 15.0,
            kind,
            velocity: 1.0,
        });
    }

    fn texts(cmds: &[DrawCmd]) -> Vec<&str> {
        cmds.iter()
            .filter_map(|c| match c {
                DrawCmd::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn frame_starts_with_clear_and_shows_hud() {
        let s = session();
        let cmds = build_frame(&s, &Effects::default());
        assert_eq!(cmds[0], DrawCmd::Clear { color: BACKGROUND });
        let texts = texts(&cmds);
        assert!(texts.contains(&"Score: 0"));
        assert!(texts.contains(&"Level 1"));
        assert!(texts.contains(&"Strikes 0/3"));
    }

    #[test]
    fn items_draw_by_shape() {
        let mut s = session();
        place(&mut s, ItemKind::Beneficial, 50.0);
        place(&mut s, ItemKind::Explosive, 150.0);
        place(&mut s, ItemKind::Healing, 250.0);
        let cmds = build_frame(&s, &Effects::default());

        assert!(cmds.contains(&DrawCmd::Circle {
            center: Vec2::new(50.0, 200.0),
            radius: 15.0,
            color: ItemKind::Beneficial.color(),
        }));
        let polygons = cmds
            .iter()
            .filter(|c| matches!(c, DrawCmd::Polygon { .. }))
            .count();
        assert_eq!(polygons, 1);
        let healing_rects = cmds
            .iter()
            .filter(|c| matches!(c, DrawCmd::Rect { color, .. } if *color == ItemKind::Healing.color()))
            .count();
        assert_eq!(healing_rects, 2);
    }

    #[test]
    fn hearts_follow_ledger() {
        let mut s = session();
        s.register_strike();
        let cmds = build_frame(&s, &Effects::default());
        let hearts: Vec<Color> = cmds
            .iter()
            .filter_map(|c| match c {
                DrawCmd::Circle { color, radius, .. } if *radius == 9.0 => Some(*color),
                _ => None,
            })
            .collect();
        assert_eq!(hearts, vec![HEART_HEALTHY, HEART_HEALTHY, HEART_BROKEN]);
    }

    #[test]
    fn overlays_follow_phase() {
        let mut s = session();
        s.pause_user();
        assert!(texts(&build_frame(&s, &Effects::default())).contains(&"PAUSED"));

        s.resume();
        assert!(!texts(&build_frame(&s, &Effects::default())).contains(&"PAUSED"));

        s.counters.score = 42;
        s.end_game();
        let cmds = build_frame(&s, &Effects::default());
        let texts = texts(&cmds);
        assert!(texts.contains(&"GAME OVER"));
        assert!(texts.iter().any(|t| t.contains("Score 42")));
    }

    #[test]
    fn effects_add_tints_banner_and_shimmer() {
        let s = session();
        let mut fx = Effects::new(&Settings::default());
        fx.on_event(&GameEvent::Caught {
            kind: ItemKind::Explosive,
            pos: Vec2::new(240.0, 742.0),
            score_delta: 0,
        });
        fx.on_event(&GameEvent::LevelUp {
            level: 2,
            fall_speed: 3.6,
            spawn_interval_ms: 900,
        });
        let cmds = build_frame(&s, &fx);
        assert!(cmds.iter().any(|c| matches!(c, DrawCmd::StrokeRect { .. })));
        assert!(cmds.iter().any(
            |c| matches!(c, DrawCmd::Rect { size, color, .. } if *size == s.field && color[0] == FLASH[0])
        ));
        assert!(texts(&cmds).contains(&"LEVEL 2"));
    }

    fn shimmer_alpha(s: &Session, fx: &Effects) -> Option<f32> {
        build_frame(s, fx).iter().find_map(|c| match c {
            DrawCmd::StrokeRect { color, .. } => Some(color[3]),
            _ => None,
        })
    }

    #[test]
    fn shimmer_fades_with_remaining_immunity() {
        let mut fx = Effects::new(&Settings::default());
        fx.on_event(&GameEvent::Caught {
            kind: ItemKind::Explosive,
            pos: Vec2::new(240.0, 742.0),
            score_delta: 0,
        });

        let mut fresh = session();
        fresh.immunity.activate(0.0, 2000.0);
        let mut ending = session();
        ending.immunity.activate(0.0, 200.0);

        let full = shimmer_alpha(&fresh, &fx).unwrap();
        let faded = shimmer_alpha(&ending, &fx).unwrap();
        assert!((full - 0.55).abs() < 1e-5);
        assert!((faded - 0.55 * 0.415).abs() < 1e-5);

        assert_eq!(shimmer_alpha(&fresh, &Effects::default()), None);
    }

    #[test]
    fn backing_store_tracks_pixel_ratio() {
        assert_eq!(backing_size(1.0), (480, 800));
        assert_eq!(backing_size(2.0), (960, 1600));
        assert_eq!(backing_size(1.25), (600, 1000));
        assert_eq!(backing_size(0.5), (480, 800));
        assert_eq!(backing_size(f64::NAN), (480, 800));
    }

    #[test]
    fn css_colors() {
        assert_eq!(css_color([1.0, 0.0, 0.5, 0.25]), "rgba(255, 0, 128, 0.250)");
        assert_eq!(css_color([2.0, -1.0, 0.0, 1.0]), "rgba(255, 0, 0, 1.000)");
    }
}
