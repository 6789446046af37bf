//! `CanvasRenderingContext2d` surface for the browser.

use crate::surface::{Surface, SurfaceError, SurfaceResult};
use kurbo::{BezPath, PathEl, Point, Size, Stroke};
use pdfink_core::color::Rgba;
use pdfink_core::text_fit::TextMeasure;
use peniko::Color;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

/// Install the panic hook and route `log` output to the browser console.
/// Safe to call more than once.
pub fn init_web_logging(level: log::Level) {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(level).is_err() {
        log::debug!("Logger already initialized");
    }
}

fn js_error(context: &str, err: JsValue) -> SurfaceError {
    SurfaceError::Draw(format!("{context}: {err:?}"))
}

fn css_color(color: Color) -> String {
    Rgba::from(color).to_string()
}

/// Paints onto an HTML canvas through its 2D context.
pub struct WebCanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    font_family: String,
}

impl WebCanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> SurfaceResult<Self> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| js_error("getContext", e))?
            .ok_or_else(|| SurfaceError::NotDrawable("canvas has no 2d context".to_string()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| SurfaceError::NotDrawable("context is not a CanvasRenderingContext2d".to_string()))?;
        Ok(Self {
            canvas,
            ctx,
            font_family: "sans-serif".to_string(),
        })
    }

    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn set_font(&self, font_size: f64) {
        self.ctx.set_font(&format!("{font_size}px {}", self.font_family));
    }

    fn trace(&self, path: &BezPath) {
        self.ctx.begin_path();
        for el in path.elements() {
            match *el {
                PathEl::MoveTo(p) => self.ctx.move_to(p.x, p.y),
                PathEl::LineTo(p) => self.ctx.line_to(p.x, p.y),
                PathEl::QuadTo(a, b) => self.ctx.quadratic_curve_to(a.x, a.y, b.x, b.y),
                PathEl::CurveTo(a, b, c) => self.ctx.bezier_curve_to(a.x, a.y, b.x, b.y, c.x, c.y),
                PathEl::ClosePath => self.ctx.close_path(),
            }
        }
    }
}

impl TextMeasure for WebCanvasSurface {
    fn measure_width(&self, text: &str, font_size: f64) -> f64 {
        self.set_font(font_size);
        match self.ctx.measure_text(text) {
            Ok(metrics) => metrics.width(),
            Err(e) => {
                log::warn!("measureText failed: {e:?}");
                0.0
            }
        }
    }
}

impl Surface for WebCanvasSurface {
    fn size(&self) -> Size {
        Size::new(f64::from(self.canvas.width()), f64::from(self.canvas.height()))
    }

    fn clear(&mut self) -> SurfaceResult<()> {
        let size = self.size();
        self.ctx.clear_rect(0.0, 0.0, size.width, size.height);
        Ok(())
    }

    fn stroke_path(&mut self, path: &BezPath, stroke: &Stroke, color: Color) -> SurfaceResult<()> {
        let cap = match stroke.start_cap {
            kurbo::Cap::Butt => "butt",
            kurbo::Cap::Square => "square",
            kurbo::Cap::Round => "round",
        };
        let join = match stroke.join {
            kurbo::Join::Bevel => "bevel",
            kurbo::Join::Miter => "miter",
            kurbo::Join::Round => "round",
        };
        self.ctx.set_stroke_style_str(&css_color(color));
        self.ctx.set_line_width(stroke.width);
        self.ctx.set_line_cap(cap);
        self.ctx.set_line_join(join);
        self.trace(path);
        self.ctx.stroke();
        Ok(())
    }

    fn fill_text(&mut self, text: &str, center: Point, font_size: f64, color: Color) -> SurfaceResult<()> {
        self.set_font(font_size);
        self.ctx.set_fill_style_str(&css_color(color));
        self.ctx.set_text_align("center");
        self.ctx.set_text_baseline("middle");
        self.ctx
            .fill_text(text, center.x, center.y)
            .map_err(|e| js_error("fillText", e))
    }

    fn erase_circle(&mut self, center: Point, radius: f64) -> SurfaceResult<()> {
        self.ctx.save();
        let result = self
            .ctx
            .set_global_composite_operation("destination-out")
            .and_then(|()| {
                self.ctx.begin_path();
                self.ctx.arc(center.x, center.y, radius, 0.0, std::f64::consts::TAU)
            })
            .map(|()| self.ctx.fill());
        self.ctx.restore();
        result.map_err(|e| js_error("erase", e))
    }
}
