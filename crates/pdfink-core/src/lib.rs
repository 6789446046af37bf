//! pdfink Core Library
//!
//! Platform-agnostic annotation model, coordinate transform and drawing tool
//! engines for annotating PDF pages.

pub mod annotation;
pub mod color;
pub mod config;
pub mod coords;
pub mod input;
pub mod selection;
pub mod shortcuts;
pub mod storage;
pub mod store;
pub mod text_fit;
pub mod tools;

pub use annotation::{
    Annotation, AnnotationError, AnnotationId, AnnotationKind, AnnotationPatch, LineSegment, PenStroke, TextBox,
};
pub use color::{ColorParseError, Rgba};
pub use config::{ConfigError, EngineConfig, EraserHitMode, ToolSettings};
pub use coords::{NormPoint, to_normalized, to_screen};
pub use input::{InputSessionState, Modifiers, PointerInput, PointerKind};
pub use selection::{DragTarget, ResizeHandle, TextBoxManipulation};
pub use shortcuts::{Shortcut, ShortcutAction, ShortcutDispatcher, ShortcutRegistry};
pub use store::{AnnotationLibrary, FileAnnotations, ImportMode, ImportSummary};
pub use text_fit::{ApproxTextMeasure, TextMeasure};
pub use tools::{AnnotationSink, ToolController, ToolKind, ToolPreview};
