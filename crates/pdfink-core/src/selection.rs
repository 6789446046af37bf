//! Text box resize handles and drag manipulation.

use crate::annotation::{AnnotationId, AnnotationPatch, TextBox};
use crate::config::EngineConfig;
use crate::coords::{normalize_height, normalize_width, to_normalized, to_screen};
use crate::text_fit::{TextMeasure, content_box_size};
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// One of the eight resize handles of a text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl ResizeHandle {
    /// Corners first so they win over edges when handles overlap on tiny boxes.
    pub const ALL: [Self; 8] = [
        Self::NW,
        Self::NE,
        Self::SE,
        Self::SW,
        Self::N,
        Self::E,
        Self::S,
        Self::W,
    ];

    /// Position of the handle on `rect`.
    pub fn position(self, rect: Rect) -> Point {
        let c = rect.center();
        match self {
            Self::N => Point::new(c.x, rect.y0),
            Self::S => Point::new(c.x, rect.y1),
            Self::E => Point::new(rect.x1, c.y),
            Self::W => Point::new(rect.x0, c.y),
            Self::NE => Point::new(rect.x1, rect.y0),
            Self::NW => Point::new(rect.x0, rect.y0),
            Self::SE => Point::new(rect.x1, rect.y1),
            Self::SW => Point::new(rect.x0, rect.y1),
        }
    }

    fn moves_left(self) -> bool {
        matches!(self, Self::W | Self::NW | Self::SW)
    }

    fn moves_right(self) -> bool {
        matches!(self, Self::E | Self::NE | Self::SE)
    }

    fn moves_top(self) -> bool {
        matches!(self, Self::N | Self::NE | Self::NW)
    }

    fn moves_bottom(self) -> bool {
        matches!(self, Self::S | Self::SE | Self::SW)
    }
}

/// All handles of `rect` with their positions.
pub fn handles(rect: Rect) -> [(ResizeHandle, Point); 8] {
    ResizeHandle::ALL.map(|h| (h, h.position(rect)))
}

/// The handle within `tolerance` of `point`, if any.
pub fn hit_test_handle(rect: Rect, point: Point, tolerance: f64) -> Option<ResizeHandle> {
    ResizeHandle::ALL
        .into_iter()
        .find(|h| h.position(rect).distance(point) <= tolerance)
}

/// Resize `rect` by dragging `handle` by `delta`.
///
/// Only the edges the handle controls move. When the result would be smaller
/// than `min`, the moving edge is pulled back so the opposite edge stays put.
pub fn apply_resize(rect: Rect, handle: ResizeHandle, delta: Vec2, min: Size) -> Rect {
    let Rect {
        mut x0,
        mut y0,
        mut x1,
        mut y1,
    } = rect;

    if handle.moves_left() {
        x0 = (x0 + delta.x).min(x1 - min.width);
    } else if handle.moves_right() {
        x1 = (x1 + delta.x).max(x0 + min.width);
    }
    if handle.moves_top() {
        y0 = (y0 + delta.y).min(y1 - min.height);
    } else if handle.moves_bottom() {
        y1 = (y1 + delta.y).max(y0 + min.height);
    }
    Rect::new(x0, y0, x1, y1)
}

/// Screen-space box of a text annotation.
///
/// Stored dimensions are denormalized against `canvas`. A missing dimension
/// falls back to the measured content size at the annotation's font size.
pub fn text_box_rect<M: TextMeasure + ?Sized>(
    text: &TextBox,
    canvas: Size,
    measure: &M,
    config: &EngineConfig,
) -> Rect {
    let origin = to_screen(text.position, canvas);
    let measured = || content_box_size(measure, &text.content, text.font_size, config);
    let width = match text.width {
        Some(w) => w * canvas.width,
        None => measured().width,
    };
    let height = match text.height {
        Some(h) => h * canvas.height,
        None => measured().height,
    };
    Rect::from_origin_size(origin, Size::new(width, height))
}

/// What a select-mode drag grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    Handle(ResizeHandle),
    /// The box body; the drag translates without resizing.
    Body,
}

/// An in-progress resize or move of one text box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBoxManipulation {
    pub id: AnnotationId,
    pub target: DragTarget,
    /// Pointer position at drag start.
    pub start_point: Point,
    /// Screen-space box at drag start.
    pub original: Rect,
}

impl TextBoxManipulation {
    pub fn new(id: AnnotationId, target: DragTarget, start_point: Point, original: Rect) -> Self {
        Self {
            id,
            target,
            start_point,
            original,
        }
    }

    /// Decide what a press at `point` grabs on `rect`: a handle within
    /// `tolerance`, else the body when inside, else nothing.
    pub fn grab(id: AnnotationId, rect: Rect, point: Point, tolerance: f64) -> Option<Self> {
        if let Some(handle) = hit_test_handle(rect, point, tolerance) {
            return Some(Self::new(id, DragTarget::Handle(handle), point, rect));
        }
        rect.contains(point)
            .then(|| Self::new(id, DragTarget::Body, point, rect))
    }

    pub fn delta(&self, current: Point) -> Vec2 {
        current - self.start_point
    }

    /// Screen-space box for the pointer at `current`.
    pub fn rect_at(&self, current: Point, min: Size) -> Rect {
        let delta = self.delta(current);
        match self.target {
            DragTarget::Body => self.original + delta,
            DragTarget::Handle(handle) => apply_resize(self.original, handle, delta, min),
        }
    }

    /// Partial update for the pointer at `current`. A body move only touches
    /// the position.
    pub fn patch(&self, current: Point, canvas: Size, config: &EngineConfig) -> AnnotationPatch {
        let min = Size::new(config.min_text_box_width, config.min_text_box_height);
        let rect = self.rect_at(current, min);
        let position = Some(to_normalized(rect.origin(), canvas));
        match self.target {
            DragTarget::Body => AnnotationPatch {
                position,
                ..Default::default()
            },
            DragTarget::Handle(_) => AnnotationPatch {
                position,
                width: Some(normalize_width(rect.width(), canvas)),
                height: Some(normalize_height(rect.height(), canvas)),
                ..Default::default()
            },
        }
    }
}
