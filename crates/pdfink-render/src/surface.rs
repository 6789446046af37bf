//! Drawing surface abstraction.

use kurbo::{BezPath, Point, Size, Stroke};
use pdfink_core::text_fit::TextMeasure;
use peniko::Color;
use thiserror::Error;

/// Surface errors.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Surface is not drawable: {0}")]
    NotDrawable(String),
    #[error("Draw call failed: {0}")]
    Draw(String),
}

/// Result type for surface operations.
pub type SurfaceResult<T> = Result<T, SurfaceError>;

/// A pixel canvas the composite loop paints into.
///
/// Coordinates are canvas pixels with the origin at the top-left. Surfaces
/// measure text with the same font they draw with, so fitting and drawing
/// agree.
pub trait Surface: TextMeasure {
    /// Canvas size in pixels.
    fn size(&self) -> Size;

    /// Clear to fully transparent.
    fn clear(&mut self) -> SurfaceResult<()>;

    fn stroke_path(&mut self, path: &BezPath, stroke: &Stroke, color: Color) -> SurfaceResult<()>;

    /// Draw one line of text centered on `center`.
    fn fill_text(&mut self, text: &str, center: Point, font_size: f64, color: Color) -> SurfaceResult<()>;

    /// Remove already painted pixels within a circle (destination-out).
    fn erase_circle(&mut self, center: Point, radius: f64) -> SurfaceResult<()>;
}
