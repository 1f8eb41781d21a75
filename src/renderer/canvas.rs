//! Canvas 2D sink for the draw list

use std::f64::consts::TAU;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::{DrawCmd, backing_size, css_color};
use crate::consts::{FIELD_HEIGHT, FIELD_WIDTH};

pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    dpr: f64,
}

impl CanvasRenderer {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into()?;
        let mut renderer = Self {
            canvas,
            ctx,
            dpr: 1.0,
        };
        renderer.resize();
        Ok(renderer)
    }

    /// Match the backing store to the device pixel ratio. CSS scales the
    /// element; drawing stays in logical field units.
    pub fn resize(&mut self) {
        self.dpr = current_dpr();
        let (width, height) = backing_size(self.dpr);
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        if let Err(e) = self.ctx.set_transform(self.dpr, 0.0, 0.0, self.dpr, 0.0, 0.0) {
            log::warn!("Canvas transform failed: {:?}", e);
        }
    }

    /// Resize when the pixel ratio changed (browser zoom, monitor move)
    pub fn sync_pixel_ratio(&mut self) {
        if (current_dpr() - self.dpr).abs() > f64::EPSILON {
            self.resize();
        }
    }

    /// Convert a client x coordinate to field x
    pub fn to_field_x(&self, client_x: f64) -> f32 {
        let rect = self.canvas.get_bounding_client_rect();
        if rect.width() <= 0.0 {
            return client_x as f32;
        }
        ((client_x - rect.left()) * FIELD_WIDTH as f64 / rect.width()) as f32
    }

    pub fn render(&self, cmds: &[DrawCmd]) {
        let ctx = &self.ctx;
        for cmd in cmds {
            match cmd {
                DrawCmd::Clear { color } => {
                    ctx.set_fill_style_str(&css_color(*color));
                    ctx.fill_rect(0.0, 0.0, FIELD_WIDTH as f64, FIELD_HEIGHT as f64);
                }
                DrawCmd::Rect { pos, size, color } => {
                    ctx.set_fill_style_str(&css_color(*color));
                    ctx.fill_rect(pos.x as f64, pos.y as f64, size.x as f64, size.y as f64);
                }
                DrawCmd::StrokeRect {
                    pos,
                    size,
                    width,
                    color,
                } => {
                    ctx.set_stroke_style_str(&css_color(*color));
                    ctx.set_line_width(*width as f64);
                    ctx.stroke_rect(pos.x as f64, pos.y as f64, size.x as f64, size.y as f64);
                }
                DrawCmd::Circle {
                    center,
                    radius,
                    color,
                } => {
                    ctx.set_fill_style_str(&css_color(*color));
                    ctx.begin_path();
                    ctx.arc(center.x as f64, center.y as f64, *radius as f64, 0.0, TAU)
                        .ok();
                    ctx.fill();
                }
                DrawCmd::Polygon { points, color } => {
                    let Some((first, rest)) = points.split_first() else {
                        continue;
                    };
                    ctx.set_fill_style_str(&css_color(*color));
                    ctx.begin_path();
                    ctx.move_to(first.x as f64, first.y as f64);
                    for p in rest {
                        ctx.line_to(p.x as f64, p.y as f64);
                    }
                    ctx.close_path();
                    ctx.fill();
                }
                DrawCmd::Text {
                    text,
                    pos,
                    size,
                    align,
                    color,
                } => {
                    ctx.set_fill_style_str(&css_color(*color));
                    ctx.set_font(&format!("bold {}px monospace", size));
                    ctx.set_text_align(align.as_str());
                    ctx.fill_text(text, pos.x as f64, pos.y as f64).ok();
                }
            }
        }
    }
}

fn current_dpr() -> f64 {
    web_sys::window()
        .map(|w| w.device_pixel_ratio())
        .unwrap_or(1.0)
        .max(1.0)
}
