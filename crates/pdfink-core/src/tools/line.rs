//! Two-click straight line placement.

use crate::annotation::{Annotation, AnnotationKind, LineSegment};
use crate::config::{EngineConfig, ToolSettings};
use crate::coords::to_normalized;
use crate::input::Modifiers;
use kurbo::{Point, Size};

/// Placement state of the line tool.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LineState {
    #[default]
    WaitingFirstPoint,
    WaitingSecondPoint {
        start: Point,
        /// Live (already snapped) endpoint.
        preview_end: Point,
    },
}

/// Constrain `end` to the horizontal or vertical through `start`, whichever
/// axis moved further. Ties go horizontal.
pub fn snap_to_axis(start: Point, end: Point) -> Point {
    let dx = (end.x - start.x).abs();
    let dy = (end.y - start.y).abs();
    if dx >= dy {
        Point::new(end.x, start.y)
    } else {
        Point::new(start.x, end.y)
    }
}

/// Line tool: the first click fixes the start, the second click commits.
/// Lines are axis-snapped unless shift is held.
#[derive(Debug, Clone, Default)]
pub struct LineTool {
    state: LineState,
    config: EngineConfig,
}

impl LineTool {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            state: LineState::WaitingFirstPoint,
            config,
        }
    }

    pub fn state(&self) -> LineState {
        self.state
    }

    /// Start point and live endpoint, when a line is being placed.
    pub fn preview(&self) -> Option<(Point, Point)> {
        match self.state {
            LineState::WaitingFirstPoint => None,
            LineState::WaitingSecondPoint { start, preview_end } => Some((start, preview_end)),
        }
    }

    fn constrained_end(start: Point, raw_end: Point, modifiers: Modifiers) -> Point {
        if modifiers.shift {
            raw_end
        } else {
            snap_to_axis(start, raw_end)
        }
    }

    /// Handle a click. The first click captures the start point; the second
    /// completes the line.
    pub fn pointer_down(
        &mut self,
        position: Point,
        modifiers: Modifiers,
        page_number: u32,
        canvas: Size,
        settings: &ToolSettings,
    ) -> Option<Annotation> {
        match self.state {
            LineState::WaitingFirstPoint => {
                self.state = LineState::WaitingSecondPoint {
                    start: position,
                    preview_end: position,
                };
                log::debug!("line: start at {position:?}");
                None
            }
            LineState::WaitingSecondPoint { start, .. } => {
                let end = Self::constrained_end(start, position, modifiers);
                self.finish(start, end, page_number, canvas, settings)
            }
        }
    }

    /// Update the live endpoint.
    pub fn pointer_move(&mut self, position: Point, modifiers: Modifiers) {
        if let LineState::WaitingSecondPoint { start, preview_end } = &mut self.state {
            *preview_end = Self::constrained_end(*start, position, modifiers);
        }
    }

    /// Complete the line at the current live endpoint.
    pub fn stop_drawing(&mut self, page_number: u32, canvas: Size, settings: &ToolSettings) -> Option<Annotation> {
        match self.state {
            LineState::WaitingFirstPoint => None,
            LineState::WaitingSecondPoint { start, preview_end } => {
                self.finish(start, preview_end, page_number, canvas, settings)
            }
        }
    }

    fn finish(
        &mut self,
        start: Point,
        end: Point,
        page_number: u32,
        canvas: Size,
        settings: &ToolSettings,
    ) -> Option<Annotation> {
        self.state = LineState::WaitingFirstPoint;

        let length = start.distance(end);
        if length < self.config.line_min_length {
            log::debug!("line: discarding {length:.1}px line");
            return None;
        }

        let annotation = Annotation::new(
            page_number,
            AnnotationKind::Line(LineSegment {
                start: to_normalized(start, canvas),
                end: to_normalized(end, canvas),
                color: settings.color,
                width: settings.line_width,
            }),
        );
        log::debug!("line: committed {}", annotation.id);
        Some(annotation)
    }

    /// Abandon the line being placed. Safe to call at any time.
    pub fn cancel(&mut self) {
        self.state = LineState::WaitingFirstPoint;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::to_screen;

    const CANVAS: Size = Size::new(400.0, 400.0);

    fn commit(start: Point, end: Point, modifiers: Modifiers) -> (Option<Annotation>, LineTool) {
        let mut tool = LineTool::default();
        let settings = ToolSettings::default();
        assert!(tool.pointer_down(start, modifiers, 1, CANVAS, &settings).is_none());
        let ann = tool.pointer_down(end, modifiers, 1, CANVAS, &settings);
        (ann, tool)
    }

    fn screen_end(ann: &Annotation) -> Point {
        match &ann.kind {
            AnnotationKind::Line(line) => to_screen(line.end, CANVAS),
            other => panic!("Expected line, got {other:?}"),
        }
    }

    #[test]
    fn test_horizontal_snap() {
        let (ann, _) = commit(Point::new(100.0, 100.0), Point::new(140.0, 105.0), Modifiers::NONE);
        let end = screen_end(&ann.unwrap());
        assert!((end.x - 140.0).abs() < 1e-9);
        assert!((end.y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_vertical_snap() {
        let (ann, _) = commit(Point::new(100.0, 100.0), Point::new(103.0, 160.0), Modifiers::NONE);
        let end = screen_end(&ann.unwrap());
        assert!((end.x - 100.0).abs() < 1e-9);
        assert!((end.y - 160.0).abs() < 1e-9);
    }

    #[test]
    fn test_shift_allows_free_angle() {
        let (ann, _) = commit(Point::new(100.0, 100.0), Point::new(140.0, 130.0), Modifiers::SHIFT);
        let end = screen_end(&ann.unwrap());
        assert!((end.x - 140.0).abs() < 1e-9);
        assert!((end.y - 130.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_line_discarded() {
        let (ann, tool) = commit(Point::new(100.0, 100.0), Point::new(102.0, 101.0), Modifiers::SHIFT);
        assert!(ann.is_none());
        assert_eq!(tool.state(), LineState::WaitingFirstPoint);

        let (ann, tool) = commit(Point::new(100.0, 100.0), Point::new(102.0, 101.0), Modifiers::NONE);
        assert!(ann.is_none());
        assert_eq!(tool.state(), LineState::WaitingFirstPoint);
    }

    #[test]
    fn test_length_checked_after_snap() {
        // Raw length is exactly 5px, the snapped line is only 4px.
        let (ann, _) = commit(Point::new(100.0, 100.0), Point::new(104.0, 103.0), Modifiers::NONE);
        assert!(ann.is_none());
        let (ann, _) = commit(Point::new(100.0, 100.0), Point::new(104.0, 103.0), Modifiers::SHIFT);
        assert!(ann.is_some());
    }

    #[test]
    fn test_preview_tracks_snapped_end() {
        let mut tool = LineTool::default();
        let settings = ToolSettings::default();
        assert!(tool.preview().is_none());
        tool.pointer_down(Point::new(10.0, 10.0), Modifiers::NONE, 1, CANVAS, &settings);
        tool.pointer_move(Point::new(50.0, 20.0), Modifiers::NONE);
        assert_eq!(tool.preview(), Some((Point::new(10.0, 10.0), Point::new(50.0, 10.0))));
        tool.pointer_move(Point::new(50.0, 20.0), Modifiers::SHIFT);
        assert_eq!(tool.preview(), Some((Point::new(10.0, 10.0), Point::new(50.0, 20.0))));
    }

    #[test]
    fn test_stop_drawing_uses_preview() {
        let mut tool = LineTool::default();
        let settings = ToolSettings::default();
        assert!(tool.stop_drawing(1, CANVAS, &settings).is_none());

        tool.pointer_down(Point::new(10.0, 10.0), Modifiers::NONE, 1, CANVAS, &settings);
        tool.pointer_move(Point::new(10.0, 90.0), Modifiers::NONE);
        let ann = tool.stop_drawing(1, CANVAS, &settings).unwrap();
        let end = screen_end(&ann);
        assert!((end.y - 90.0).abs() < 1e-9);
        assert_eq!(tool.state(), LineState::WaitingFirstPoint);
    }

    #[test]
    fn test_cancel_idempotent() {
        let mut tool = LineTool::default();
        tool.cancel();
        tool.cancel();
        assert_eq!(tool.state(), LineState::WaitingFirstPoint);

        tool.pointer_down(Point::new(10.0, 10.0), Modifiers::NONE, 1, CANVAS, &ToolSettings::default());
        tool.cancel();
        tool.cancel();
        assert_eq!(tool.state(), LineState::WaitingFirstPoint);
    }
}
