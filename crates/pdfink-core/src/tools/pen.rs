//! Free-hand pen capture.

use crate::annotation::{Annotation, AnnotationKind, PenStroke};
use crate::config::{EngineConfig, ToolSettings};
use crate::coords::to_normalized_all;
use crate::input::PointerInput;
use kurbo::{Point, Size};

/// Capture state of the pen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PenState {
    #[default]
    Idle,
    Capturing,
}

/// Samples a stroke in screen space and turns it into a normalized pen
/// annotation on release.
#[derive(Debug, Clone)]
pub struct PenTool {
    state: PenState,
    /// Raw samples, screen space.
    points: Vec<Point>,
    /// Smoothed pressure for each sample.
    pressures: Vec<f64>,
    smoothed_pressure: f64,
    config: EngineConfig,
}

impl Default for PenTool {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl PenTool {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            state: PenState::Idle,
            points: Vec::new(),
            pressures: Vec::new(),
            smoothed_pressure: config.default_pressure,
            config,
        }
    }

    pub fn state(&self) -> PenState {
        self.state
    }

    pub fn is_capturing(&self) -> bool {
        self.state == PenState::Capturing
    }

    /// The live, unsmoothed path in screen space.
    pub fn live_points(&self) -> &[Point] {
        &self.points
    }

    /// Smoothed pressure for each live sample.
    pub fn live_pressures(&self) -> &[f64] {
        &self.pressures
    }

    fn raw_pressure(&self, input: &PointerInput) -> f64 {
        input.effective_pressure(
            self.config.default_pressure,
            self.config.min_pressure,
            self.config.max_pressure,
        )
    }

    /// Begin a stroke at the pointer-down sample.
    pub fn start(&mut self, input: &PointerInput) {
        let pressure = self.raw_pressure(input);
        self.points.clear();
        self.pressures.clear();
        self.points.push(input.position);
        self.pressures.push(pressure);
        self.smoothed_pressure = pressure;
        self.state = PenState::Capturing;
        log::debug!("pen: capturing from {:?}", input.position);
    }

    /// Record a move sample. Samples closer than the minimum distance to the
    /// previous recorded sample are dropped.
    ///
    /// Returns whether the sample was recorded.
    pub fn move_to(&mut self, input: &PointerInput) -> bool {
        if self.state != PenState::Capturing {
            return false;
        }
        if let Some(last) = self.points.last() {
            if last.distance(input.position) <= self.config.pen_min_distance {
                return false;
            }
        }

        // Exponential moving average so noisy sensors don't produce width spikes
        let raw = self.raw_pressure(input);
        let s = self.config.pressure_smoothing;
        self.smoothed_pressure = self.smoothed_pressure * (1.0 - s) + raw * s;

        self.points.push(input.position);
        self.pressures.push(self.smoothed_pressure);
        true
    }

    /// Finish the stroke. Strokes with fewer than two samples are discarded.
    pub fn stop(&mut self, page_number: u32, canvas: Size, settings: &ToolSettings) -> Option<Annotation> {
        if self.state != PenState::Capturing {
            return None;
        }
        let points = std::mem::take(&mut self.points);
        self.reset();

        if points.len() < 2 {
            log::debug!("pen: discarding stroke with {} sample(s)", points.len());
            return None;
        }

        let smoothed = smooth_path(&points);
        let annotation = Annotation::new(
            page_number,
            AnnotationKind::Pen(PenStroke {
                points: to_normalized_all(&smoothed, canvas),
                color: settings.color,
                width: settings.line_width,
            }),
        );
        log::debug!("pen: committed {} with {} points", annotation.id, smoothed.len());
        Some(annotation)
    }

    /// Drop any in-progress stroke. Safe to call at any time.
    pub fn cancel(&mut self) {
        if self.state == PenState::Capturing {
            log::debug!("pen: stroke cancelled");
        }
        self.points.clear();
        self.reset();
    }

    fn reset(&mut self) {
        self.state = PenState::Idle;
        self.pressures.clear();
        self.smoothed_pressure = self.config.default_pressure;
    }
}

/// One pass of a three-point moving average. Endpoints are kept as-is.
pub fn smooth_path(points: &[Point]) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let mut out = Vec::with_capacity(points.len());
    out.push(points[0]);
    for w in points.windows(3) {
        out.push(Point::new(
            (w[0].x + w[1].x + w[2].x) / 3.0,
            (w[0].y + w[1].y + w[2].y) / 3.0,
        ));
    }
    out.push(points[points.len() - 1]);
    out
}
