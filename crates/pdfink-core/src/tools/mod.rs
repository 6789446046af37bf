//! Tool engines and the controller that routes pointer input to them.

mod eraser;
mod line;
mod pen;
mod text;

pub use eraser::{EraserState, EraserTool};
pub use line::{LineState, LineTool, snap_to_axis};
pub use pen::{PenState, PenTool, smooth_path};
pub use text::{TextDraft, TextTool, TextToolState};

use crate::annotation::{Annotation, AnnotationId, AnnotationPatch};
use crate::color::Rgba;
use crate::config::{EngineConfig, ToolSettings};
use crate::coords::is_drawable;
use crate::input::PointerInput;
use crate::selection::{TextBoxManipulation, text_box_rect};
use crate::text_fit::{ApproxTextMeasure, TextMeasure};
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// Text editing, resizing and moving.
    #[default]
    Select,
    Pen,
    Line,
    Text,
    Eraser,
}

/// Where committed annotations go. Implemented by the annotation store.
pub trait AnnotationSink {
    /// Annotations of `page` in paint order.
    fn page_annotations(&self, page: u32) -> &[Annotation];
    /// Store a new annotation. Returns false if it was rejected.
    fn add(&mut self, annotation: Annotation) -> bool;
    fn remove(&mut self, id: &AnnotationId) -> bool;
    fn update(&mut self, id: &AnnotationId, patch: &AnnotationPatch) -> bool;
    /// Called once before the first mutation of a gesture.
    fn checkpoint(&mut self);
}

/// In-progress gesture feedback, screen space.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolPreview {
    Pen {
        points: Vec<Point>,
        pressures: Vec<f64>,
        color: Rgba,
        width: f64,
    },
    Line {
        start: Point,
        end: Point,
        color: Rgba,
        width: f64,
    },
    Eraser {
        trail: Vec<Point>,
        radius: f64,
    },
}

/// Owns one instance of every engine for a single canvas and routes pointer
/// input to the active one.
#[derive(Debug, Clone)]
pub struct ToolController<M = ApproxTextMeasure> {
    current_tool: ToolKind,
    pub settings: ToolSettings,
    config: EngineConfig,
    measure: M,
    canvas: Option<Size>,
    page_number: u32,
    pen: PenTool,
    line: LineTool,
    text: TextTool,
    eraser: EraserTool,
    manipulation: Option<TextBoxManipulation>,
    /// Whether the current gesture already pushed an undo checkpoint.
    checkpointed: bool,
}

impl Default for ToolController {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl ToolController {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_measure(config, ApproxTextMeasure::default())
    }
}

impl<M: TextMeasure> ToolController<M> {
    /// Create a controller that measures text with `measure`.
    pub fn with_measure(config: EngineConfig, measure: M) -> Self {
        Self {
            current_tool: ToolKind::default(),
            settings: ToolSettings::default(),
            pen: PenTool::new(config.clone()),
            line: LineTool::new(config.clone()),
            text: TextTool::new(config.clone()),
            eraser: EraserTool::new(config.clone()),
            config,
            measure,
            canvas: None,
            page_number: 1,
            manipulation: None,
            checkpointed: false,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn measure(&self) -> &M {
        &self.measure
    }

    pub fn current_tool(&self) -> ToolKind {
        self.current_tool
    }

    pub fn canvas_size(&self) -> Option<Size> {
        self.canvas
    }

    pub fn is_attached(&self) -> bool {
        self.canvas.is_some()
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    /// Bind to a canvas of `size`. Also used when the canvas is resized.
    /// A non-drawable size leaves the controller detached.
    pub fn attach(&mut self, size: Size) -> bool {
        if !is_drawable(size) {
            log::warn!("Refusing to attach to a canvas of size {size:?}");
            self.detach();
            return false;
        }
        self.canvas = Some(size);
        log::debug!("Attached to {}x{} canvas", size.width, size.height);
        true
    }

    /// Unbind from the canvas, dropping any in-progress gesture.
    pub fn detach(&mut self) {
        self.cancel();
        self.canvas = None;
    }

    /// Switch to another page. Any in-progress gesture is dropped.
    pub fn set_page(&mut self, page_number: u32) {
        if page_number != self.page_number {
            self.cancel();
            self.page_number = page_number;
        }
    }

    /// Select a tool. Every engine is cancelled first.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.cancel();
        self.current_tool = tool;
    }

    /// Cancel every engine. Idempotent.
    pub fn cancel(&mut self) {
        self.pen.cancel();
        self.line.cancel();
        self.text.cancel();
        self.eraser.cancel();
        self.manipulation = None;
        self.checkpointed = false;
    }

    fn checkpoint_once(&mut self, sink: &mut dyn AnnotationSink) {
        if !self.checkpointed {
            sink.checkpoint();
            self.checkpointed = true;
        }
    }

    fn commit(&mut self, annotation: Annotation, sink: &mut dyn AnnotationSink) -> Option<AnnotationId> {
        let id = annotation.id.clone();
        self.checkpoint_once(sink);
        sink.add(annotation).then_some(id)
    }

    pub fn pointer_down(&mut self, input: &PointerInput, sink: &mut dyn AnnotationSink) {
        let Some(canvas) = self.canvas else {
            log::debug!("Ignoring pointer down while detached");
            return;
        };
        self.checkpointed = false;
        match self.current_tool {
            ToolKind::Pen => self.pen.start(input),
            ToolKind::Line => {
                let page = self.page_number;
                let done = self
                    .line
                    .pointer_down(input.position, input.modifiers, page, canvas, &self.settings);
                if let Some(ann) = done {
                    self.commit(ann, sink);
                }
            }
            ToolKind::Text => self.text.place(input.position),
            ToolKind::Eraser => {
                self.eraser.start(input.position);
                self.erase_at(input.position, canvas, sink);
            }
            ToolKind::Select => {
                self.manipulation = self.grab_text_box(input.position, canvas, &*sink);
            }
        }
    }

    pub fn pointer_move(&mut self, input: &PointerInput, sink: &mut dyn AnnotationSink) {
        let Some(canvas) = self.canvas else {
            return;
        };
        match self.current_tool {
            ToolKind::Pen => {
                self.pen.move_to(input);
            }
            ToolKind::Line => self.line.pointer_move(input.position, input.modifiers),
            ToolKind::Text => {}
            ToolKind::Eraser => {
                if self.eraser.move_to(input.position) {
                    self.erase_at(input.position, canvas, sink);
                }
            }
            ToolKind::Select => {
                let Some(manipulation) = &self.manipulation else {
                    return;
                };
                let id = manipulation.id.clone();
                let patch = manipulation.patch(input.position, canvas, &self.config);
                self.checkpoint_once(sink);
                if !sink.update(&id, &patch) {
                    log::warn!("Text box {id} disappeared during drag");
                    self.manipulation = None;
                }
            }
        }
    }

    pub fn pointer_up(&mut self, _input: &PointerInput, sink: &mut dyn AnnotationSink) {
        let Some(canvas) = self.canvas else {
            return;
        };
        match self.current_tool {
            ToolKind::Pen => {
                if let Some(ann) = self.pen.stop(self.page_number, canvas, &self.settings) {
                    self.commit(ann, sink);
                }
            }
            // Completes on the second pointer-down.
            ToolKind::Line | ToolKind::Text => {}
            ToolKind::Eraser => self.eraser.stop(),
            ToolKind::Select => self.manipulation = None,
        }
        self.checkpointed = false;
    }

    /// The pointer left the canvas. A pen stroke in progress is discarded and
    /// erasing stops; a drag ends where it is. A line being placed keeps its
    /// start point.
    pub fn pointer_leave(&mut self, input: &PointerInput, sink: &mut dyn AnnotationSink) {
        match self.current_tool {
            ToolKind::Pen => {
                self.pen.cancel();
                self.checkpointed = false;
            }
            ToolKind::Eraser => {
                self.eraser.cancel();
                self.checkpointed = false;
            }
            ToolKind::Select => self.pointer_up(input, sink),
            ToolKind::Line | ToolKind::Text => {}
        }
    }

    /// Complete a line at its live endpoint.
    pub fn stop_drawing(&mut self, sink: &mut dyn AnnotationSink) -> Option<AnnotationId> {
        let canvas = self.canvas?;
        let ann = self.line.stop_drawing(self.page_number, canvas, &self.settings)?;
        self.checkpointed = false;
        self.commit(ann, sink)
    }

    fn erase_at(&mut self, point: Point, canvas: Size, sink: &mut dyn AnnotationSink) {
        let ids = self.eraser.check_annotations_for_erasure(
            point,
            self.settings.eraser_radius(),
            sink.page_annotations(self.page_number),
            canvas,
            &self.measure,
        );
        for id in ids {
            self.checkpoint_once(sink);
            if sink.remove(&id) {
                log::debug!("eraser: removed {id}");
            }
        }
    }

    /// Topmost text box under `point`, with what part of it was grabbed.
    fn grab_text_box(&self, point: Point, canvas: Size, sink: &dyn AnnotationSink) -> Option<TextBoxManipulation> {
        sink.page_annotations(self.page_number).iter().rev().find_map(|ann| {
            let text = ann.as_text()?;
            let rect = text_box_rect(text, canvas, &self.measure, &self.config);
            TextBoxManipulation::grab(ann.id.clone(), rect, point, self.config.handle_hit_tolerance)
        })
    }

    /// The text box drag in progress, if any.
    pub fn manipulation(&self) -> Option<&TextBoxManipulation> {
        self.manipulation.as_ref()
    }

    /// Screen anchor of the open text entry surface.
    pub fn text_placement(&self) -> Option<Point> {
        self.text.placement()
    }

    /// Commit the open text placement.
    pub fn commit_text(&mut self, content: &str, sink: &mut dyn AnnotationSink) -> Option<AnnotationId> {
        let canvas = self.canvas?;
        let ann = self
            .text
            .commit(content, self.page_number, canvas, &self.settings, &self.measure)?;
        self.checkpointed = false;
        self.commit(ann, sink)
    }

    pub fn cancel_text(&mut self) {
        self.text.cancel();
    }

    /// Open an edit draft for the topmost text annotation whose box contains
    /// `point`. Only the select tool edits.
    pub fn begin_text_edit(&mut self, point: Point, sink: &dyn AnnotationSink) -> Option<TextDraft> {
        if self.current_tool != ToolKind::Select {
            return None;
        }
        let canvas = self.canvas?;
        let target = sink.page_annotations(self.page_number).iter().rev().find(|ann| {
            ann.as_text()
                .is_some_and(|t| text_box_rect(t, canvas, &self.measure, &self.config).contains(point))
        })?;
        self.text.begin_edit(target)
    }

    /// Apply an edit draft. Empty content leaves the annotation untouched.
    pub fn finish_text_edit(&mut self, draft: &TextDraft, sink: &mut dyn AnnotationSink) -> bool {
        let Some((id, patch)) = self.text.finish_edit(draft) else {
            return false;
        };
        sink.checkpoint();
        sink.update(&id, &patch)
    }

    /// In-progress feedback for the active tool.
    pub fn preview(&self) -> Option<ToolPreview> {
        match self.current_tool {
            ToolKind::Pen if self.pen.is_capturing() => Some(ToolPreview::Pen {
                points: self.pen.live_points().to_vec(),
                pressures: self.pen.live_pressures().to_vec(),
                color: self.settings.color,
                width: self.settings.line_width,
            }),
            ToolKind::Line => self.line.preview().map(|(start, end)| ToolPreview::Line {
                start,
                end,
                color: self.settings.color,
                width: self.settings.line_width,
            }),
            ToolKind::Eraser if self.eraser.is_erasing() => Some(ToolPreview::Eraser {
                trail: self.eraser.trail().to_vec(),
                radius: self.settings.eraser_radius(),
            }),
            _ => None,
        }
    }
}
