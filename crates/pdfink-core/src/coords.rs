//! Mapping between normalized page coordinates and canvas pixels.
//!
//! Stored annotation geometry lives in the unit square of the page
//! (origin top-left, `0..1` on both axes). Pointer input and painting happen
//! in canvas pixels. The two spaces use different types so a function that
//! crosses the boundary says so in its signature: [`NormPoint`] is normalized,
//! [`kurbo::Point`] is always a screen/canvas pixel position.

use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// A point normalized to the page's own viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormPoint {
    pub x: f64,
    pub y: f64,
}

impl NormPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Whether a canvas of this size can take input or be painted.
///
/// Every transform below divides or multiplies by the canvas size, so hosts
/// must check this before dispatching anything to the engines.
pub fn is_drawable(size: Size) -> bool {
    size.width.is_finite() && size.height.is_finite() && size.width > 0.0 && size.height > 0.0
}

/// Convert a screen point to normalized page coordinates.
pub fn to_normalized(point: Point, size: Size) -> NormPoint {
    NormPoint::new(point.x / size.width, point.y / size.height)
}

/// Convert a normalized point to screen pixels for the given canvas size.
pub fn to_screen(point: NormPoint, size: Size) -> Point {
    Point::new(point.x * size.width, point.y * size.height)
}

/// Normalize a sequence of screen points.
pub fn to_normalized_all(points: &[Point], size: Size) -> Vec<NormPoint> {
    points.iter().map(|p| to_normalized(*p, size)).collect()
}

/// Denormalize a sequence of points.
pub fn to_screen_all(points: &[NormPoint], size: Size) -> Vec<Point> {
    points.iter().map(|p| to_screen(*p, size)).collect()
}

/// Normalize a screen-space length along the x axis.
pub fn normalize_width(width: f64, size: Size) -> f64 {
    width / size.width
}

/// Normalize a screen-space length along the y axis.
pub fn normalize_height(height: f64, size: Size) -> f64 {
    height / size.height
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn test_to_normalized() {
        let p = to_normalized(Point::new(100.0, 50.0), Size::new(200.0, 100.0));
        assert!((p.x - 0.5).abs() < f64::EPSILON);
        assert!((p.y - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_to_screen() {
        let p = to_screen(NormPoint::new(0.25, 0.75), Size::new(400.0, 200.0));
        assert!((p.x - 100.0).abs() < f64::EPSILON);
        assert!((p.y - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_roundtrip_screen_first() {
        let sizes = [
            Size::new(1.0, 1.0),
            Size::new(612.0, 792.0),
            Size::new(1234.5, 17.25),
            Size::new(8000.0, 6000.0),
        ];
        let points = [
            Point::new(0.0, 0.0),
            Point::new(0.3, 0.9),
            Point::new(123.456, 789.012),
        ];
        for size in sizes {
            for p in points {
                let back = to_screen(to_normalized(p, size), size);
                assert!((back.x - p.x).abs() < TOLERANCE * p.x.abs().max(1.0));
                assert!((back.y - p.y).abs() < TOLERANCE * p.y.abs().max(1.0));
            }
        }
    }

    #[test]
    fn test_roundtrip_normalized_first() {
        let size = Size::new(837.0, 1083.0);
        for i in 0..=10 {
            for j in 0..=10 {
                let p = NormPoint::new(f64::from(i) / 10.0, f64::from(j) / 10.0);
                let back = to_normalized(to_screen(p, size), size);
                assert!((back.x - p.x).abs() < TOLERANCE);
                assert!((back.y - p.y).abs() < TOLERANCE);
            }
        }
    }

    #[test]
    fn test_zoom_invariance() {
        let small = Size::new(300.0, 400.0);
        let large = Size::new(750.0, 1000.0);
        let screen_small = Point::new(120.0, 260.0);

        let stored = to_normalized(screen_small, small);
        let direct = Point::new(
            screen_small.x * large.width / small.width,
            screen_small.y * large.height / small.height,
        );
        let via_store = to_screen(stored, large);

        assert!((via_store.x - direct.x).abs() < TOLERANCE);
        assert!((via_store.y - direct.y).abs() < TOLERANCE);
    }

    #[test]
    fn test_batch_variants() {
        let size = Size::new(10.0, 20.0);
        let pts = vec![Point::new(1.0, 2.0), Point::new(5.0, 10.0)];
        let norm = to_normalized_all(&pts, size);
        assert_eq!(norm, vec![NormPoint::new(0.1, 0.1), NormPoint::new(0.5, 0.5)]);
        let back = to_screen_all(&norm, size);
        assert!((back[1].x - 5.0).abs() < TOLERANCE);
        assert!((back[1].y - 10.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_is_drawable() {
        assert!(is_drawable(Size::new(1.0, 1.0)));
        assert!(!is_drawable(Size::new(0.0, 100.0)));
        assert!(!is_drawable(Size::new(100.0, -1.0)));
        assert!(!is_drawable(Size::new(f64::NAN, 100.0)));
        assert!(!is_drawable(Size::new(f64::INFINITY, 100.0)));
    }
}
