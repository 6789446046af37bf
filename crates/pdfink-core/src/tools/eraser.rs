//! Radius-based eraser.

use crate::annotation::{Annotation, AnnotationId};
use crate::config::{EngineConfig, EraserHitMode};
use crate::selection::text_box_rect;
use crate::text_fit::TextMeasure;
use kurbo::{Point, Size};

/// Scrub state of the eraser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EraserState {
    #[default]
    Idle,
    Erasing,
}

/// Collects the scrub trail for the destination-out feedback and decides
/// which annotations a sample touches. Never mutates the store itself.
#[derive(Debug, Clone, Default)]
pub struct EraserTool {
    state: EraserState,
    trail: Vec<Point>,
    config: EngineConfig,
}

impl EraserTool {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            state: EraserState::Idle,
            trail: Vec::new(),
            config,
        }
    }

    pub fn state(&self) -> EraserState {
        self.state
    }

    pub fn is_erasing(&self) -> bool {
        self.state == EraserState::Erasing
    }

    /// Scrubbed points of the current stroke, screen space.
    pub fn trail(&self) -> &[Point] {
        &self.trail
    }

    pub fn start(&mut self, point: Point) {
        self.trail.clear();
        self.trail.push(point);
        self.state = EraserState::Erasing;
        log::debug!("eraser: start at {point:?}");
    }

    /// Extend the scrub trail. Returns true when a sample was recorded: the
    /// stroke is active and `point` moved further than the pen sampling distance
    /// from the last sample.
    pub fn move_to(&mut self, point: Point) -> bool {
        if self.state != EraserState::Erasing {
            return false;
        }
        if let Some(last) = self.trail.last() {
            if last.distance(point) <= self.config.pen_min_distance {
                return false;
            }
        }
        self.trail.push(point);
        true
    }

    pub fn stop(&mut self) {
        self.state = EraserState::Idle;
        self.trail.clear();
    }

    /// Terminate the stroke without further hit tests. Safe to call at any time.
    pub fn cancel(&mut self) {
        self.stop();
    }

    /// Ids of the annotations an eraser of `radius` at `point` touches.
    ///
    /// Annotations with unusable geometry are skipped, never reported.
    pub fn check_annotations_for_erasure<M: TextMeasure + ?Sized>(
        &self,
        point: Point,
        radius: f64,
        annotations: &[Annotation],
        canvas: Size,
        measure: &M,
    ) -> Vec<AnnotationId> {
        annotations
            .iter()
            .filter(|ann| match self.config.eraser_hit_mode {
                EraserHitMode::Anchor => ann.touches_anchor(point, radius, canvas),
                EraserHitMode::Geometry => {
                    let text_size = ann
                        .as_text()
                        .map(|t| text_box_rect(t, canvas, measure, &self.config).size())
                        .unwrap_or(Size::ZERO);
                    ann.touches_geometry(point, radius, canvas, text_size)
                }
            })
            .map(|ann| ann.id.clone())
            .collect()
    }
}
