//! Headless surface that records draw calls.

use crate::surface::{Surface, SurfaceError, SurfaceResult};
use kurbo::{BezPath, Point, Size, Stroke};
use pdfink_core::color::Rgba;
use pdfink_core::text_fit::{ApproxTextMeasure, TextMeasure};
use peniko::Color;

/// A recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    Stroke {
        path: BezPath,
        width: f64,
        color: Rgba,
    },
    Text {
        text: String,
        center: Point,
        font_size: f64,
        color: Rgba,
    },
    Erase {
        center: Point,
        radius: f64,
    },
}

/// Records every draw call instead of rasterizing. Used by tests and by
/// hosts that replay commands on their own backend.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    size: Size,
    commands: Vec<DrawCommand>,
    measure: ApproxTextMeasure,
    /// Stroke color whose draws fail, for exercising error paths.
    failing_color: Option<Rgba>,
}

impl RecordingSurface {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            commands: Vec::new(),
            measure: ApproxTextMeasure::default(),
            failing_color: None,
        }
    }

    pub fn with_measure(mut self, measure: ApproxTextMeasure) -> Self {
        self.measure = measure;
        self
    }

    /// Make strokes and text of `color` fail.
    pub fn with_failing_color(mut self, color: Rgba) -> Self {
        self.failing_color = Some(color);
        self
    }

    pub fn resize(&mut self, size: Size) {
        self.size = size;
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    fn check(&self, color: Rgba) -> SurfaceResult<()> {
        if self.failing_color == Some(color) {
            return Err(SurfaceError::Draw(format!("refused to draw in {color}")));
        }
        Ok(())
    }
}

impl TextMeasure for RecordingSurface {
    fn measure_width(&self, text: &str, font_size: f64) -> f64 {
        self.measure.measure_width(text, font_size)
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn clear(&mut self) -> SurfaceResult<()> {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear);
        Ok(())
    }

    fn stroke_path(&mut self, path: &BezPath, stroke: &Stroke, color: Color) -> SurfaceResult<()> {
        let color = Rgba::from(color);
        self.check(color)?;
        self.commands.push(DrawCommand::Stroke {
            path: path.clone(),
            width: stroke.width,
            color,
        });
        Ok(())
    }

    fn fill_text(&mut self, text: &str, center: Point, font_size: f64, color: Color) -> SurfaceResult<()> {
        let color = Rgba::from(color);
        self.check(color)?;
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            center,
            font_size,
            color,
        });
        Ok(())
    }

    fn erase_circle(&mut self, center: Point, radius: f64) -> SurfaceResult<()> {
        self.commands.push(DrawCommand::Erase { center, radius });
        Ok(())
    }
}
