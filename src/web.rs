//! Browser surface: [`Surface`] over a `CanvasRenderingContext2d`.
//!
//! This module is the only place that touches `web_sys`. Images must be
//! registered with [`CanvasSurface::insert_image`] once they have loaded;
//! drawings that reference an unknown source are skipped by the renderer.

use std::collections::HashMap;

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::geometry::Point;
use crate::surface::{Surface, SurfaceError};
use crate::transform::Matrix2D;

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    images: HashMap<String, HtmlImageElement>,
}

impl CanvasSurface {
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement, ctx: CanvasRenderingContext2d) -> Self {
        Self { canvas, ctx, images: HashMap::new() }
    }

    pub fn insert_image(&mut self, src: impl Into<String>, image: HtmlImageElement) {
        self.images.insert(src.into(), image);
    }

    pub fn remove_image(&mut self, src: &str) -> bool {
        self.images.remove(src).is_some()
    }
}

fn backend(err: JsValue) -> SurfaceError {
    SurfaceError::Backend(format!("{err:?}"))
}

impl Surface for CanvasSurface {
    fn set_size(&mut self, width_px: u32, height_px: u32) {
        self.canvas.set_width(width_px);
        self.canvas.set_height(height_px);
    }

    fn size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn clear(&mut self) {
        let (w, h) = self.size();
        self.ctx.clear_rect(0.0, 0.0, f64::from(w), f64::from(h));
    }

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn set_transform(&mut self, m: Matrix2D) -> Result<(), SurfaceError> {
        self.ctx.set_transform(m.a, m.b, m.c, m.d, m.tx, m.ty).map_err(backend)
    }

    fn set_fill_style(&mut self, color: &str) {
        self.ctx.set_fill_style_str(color);
    }

    fn set_stroke_style(&mut self, color: &str) {
        self.ctx.set_stroke_style_str(color);
    }

    fn set_line_width(&mut self, width: f64) {
        self.ctx.set_line_width(width);
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.ctx.set_global_alpha(alpha);
    }

    fn set_line_dash(&mut self, segments: &[f64]) -> Result<(), SurfaceError> {
        let dash_array = js_sys::Array::new();
        for segment in segments {
            dash_array.push(&JsValue::from_f64(*segment));
        }
        self.ctx.set_line_dash(&dash_array).map_err(backend)
    }

    fn begin_path(&mut self) {
        self.ctx.begin_path();
    }

    fn move_to(&mut self, p: Point) {
        self.ctx.move_to(p.x, p.y);
    }

    fn line_to(&mut self, p: Point) {
        self.ctx.line_to(p.x, p.y);
    }

    fn close_path(&mut self) {
        self.ctx.close_path();
    }

    fn arc(&mut self, center: Point, radius: f64, start: f64, end: f64) -> Result<(), SurfaceError> {
        self.ctx.arc(center.x, center.y, radius, start, end).map_err(backend)
    }

    fn fill(&mut self) {
        self.ctx.fill();
    }

    fn stroke(&mut self) {
        self.ctx.stroke();
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ctx.fill_rect(x, y, width, height);
    }

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ctx.stroke_rect(x, y, width, height);
    }

    fn fill_text(&mut self, text: &str, at: Point, font_px: f64) -> Result<(), SurfaceError> {
        self.ctx.set_font(&format!("{font_px}px sans-serif"));
        self.ctx.set_text_align("center");
        self.ctx.set_text_baseline("middle");
        self.ctx.fill_text(text, at.x, at.y).map_err(backend)
    }

    fn draw_image(&mut self, src: &str, x: f64, y: f64, width: f64, height: f64) -> Result<(), SurfaceError> {
        let image = self.images.get(src).ok_or_else(|| SurfaceError::MissingImage(src.to_string()))?;
        self.ctx
            .draw_image_with_html_image_element_and_dw_and_dh(image, x, y, width, height)
            .map_err(backend)
    }
}
