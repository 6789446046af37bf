//! pdfink Render Library
//!
//! Repaints one PDF page's annotation layer onto a [`Surface`]. The browser
//! implementation wraps a 2D canvas context; [`RecordingSurface`] records draw
//! calls for tests and headless hosts.

mod composite;
mod recording;
mod surface;

#[cfg(target_arch = "wasm32")]
mod web_canvas;

pub use composite::{RenderContext, RenderStats, paint_annotation, paint_preview, render_page};
pub use recording::{DrawCommand, RecordingSurface};
pub use surface::{Surface, SurfaceError, SurfaceResult};

#[cfg(target_arch = "wasm32")]
pub use web_canvas::{WebCanvasSurface, init_web_logging};
