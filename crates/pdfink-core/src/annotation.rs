//! Annotation records.
//!
//! Geometry is stored normalized to the page (see [`crate::coords`]) so the
//! same record renders correctly at any zoom level. Stroke width and font size
//! are the exception: they are kept in CSS pixels so visual weight stays the
//! same regardless of zoom.

use crate::color::Rgba;
use crate::coords::{NormPoint, to_screen};
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{SystemTime, UNIX_EPOCH};
#[cfg(target_arch = "wasm32")]
use web_time::{SystemTime, UNIX_EPOCH};

/// Unique annotation identifier: creation time in milliseconds plus a random suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(String);

impl AnnotationId {
    /// Generate a fresh id for an annotation created at `timestamp` (ms since the epoch).
    pub fn generate(timestamp: u64) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("{timestamp}-{}", &suffix[..12]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AnnotationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for AnnotationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Reasons an annotation record is not fit to be stored or drawn.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnnotationError {
    #[error("annotation {0} has an empty id")]
    MissingId(String),
    #[error("annotation {0} has page number 0 (pages are 1-based)")]
    InvalidPage(AnnotationId),
    #[error("pen annotation {id} has {count} points, at least 2 are required")]
    TooFewPoints { id: AnnotationId, count: usize },
    #[error("annotation {0} has non-finite geometry")]
    NonFiniteGeometry(AnnotationId),
    #[error("text annotation {0} has no content")]
    EmptyText(AnnotationId),
    #[error("annotation {0} already exists")]
    DuplicateId(AnnotationId),
    #[error("annotation record could not be parsed: {0}")]
    Malformed(String),
}

/// A free-hand pen stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenStroke {
    /// Smoothed path, normalized.
    pub points: Vec<NormPoint>,
    pub color: Rgba,
    /// Stroke width in CSS pixels.
    pub width: f64,
}

/// A straight line segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: NormPoint,
    pub end: NormPoint,
    pub color: Rgba,
    /// Stroke width in CSS pixels.
    pub width: f64,
}

/// A free-form text box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBox {
    /// Top-left corner of the box, normalized.
    pub position: NormPoint,
    pub content: String,
    /// Reference font size in CSS pixels. The rendered size is fitted to the box.
    pub font_size: f64,
    pub color: Rgba,
    /// Normalized box width. Absent means "size to content".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Normalized box height. Absent means "size to content".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// Geometry and style, discriminated by `type` in the persisted JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnnotationKind {
    Pen(PenStroke),
    Line(LineSegment),
    Text(TextBox),
}

/// A committed annotation on one page of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: AnnotationId,
    /// 1-based page number. Never changes after creation.
    pub page_number: u32,
    /// Creation time in milliseconds since the epoch.
    #[serde(default)]
    pub timestamp: u64,
    #[serde(flatten)]
    pub kind: AnnotationKind,
}

/// Partial update for a text annotation. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<NormPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl AnnotationPatch {
    /// Whether the patch touches box geometry.
    pub fn is_geometry(&self) -> bool {
        self.position.is_some() || self.width.is_some() || self.height.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl Annotation {
    /// Create a new annotation with a fresh id and the current time.
    pub fn new(page_number: u32, kind: AnnotationKind) -> Self {
        let timestamp = now_millis();
        Self {
            id: AnnotationId::generate(timestamp),
            page_number,
            timestamp,
            kind,
        }
    }

    /// Short name of the variant, as written in the `type` field.
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            AnnotationKind::Pen(_) => "pen",
            AnnotationKind::Line(_) => "line",
            AnnotationKind::Text(_) => "text",
        }
    }

    pub fn as_text(&self) -> Option<&TextBox> {
        match &self.kind {
            AnnotationKind::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Check the record is fit to be stored.
    pub fn validate(&self) -> Result<(), AnnotationError> {
        if self.id.as_str().trim().is_empty() {
            return Err(AnnotationError::MissingId(self.type_name().to_string()));
        }
        if self.page_number == 0 {
            return Err(AnnotationError::InvalidPage(self.id.clone()));
        }
        let finite = match &self.kind {
            AnnotationKind::Pen(pen) => {
                if pen.points.len() < 2 {
                    return Err(AnnotationError::TooFewPoints {
                        id: self.id.clone(),
                        count: pen.points.len(),
                    });
                }
                pen.width.is_finite() && pen.points.iter().all(NormPoint::is_finite)
            }
            AnnotationKind::Line(line) => {
                line.width.is_finite() && line.start.is_finite() && line.end.is_finite()
            }
            AnnotationKind::Text(text) => {
                if text.content.trim().is_empty() {
                    return Err(AnnotationError::EmptyText(self.id.clone()));
                }
                text.position.is_finite()
                    && text.font_size.is_finite()
                    && text.width.is_none_or(f64::is_finite)
                    && text.height.is_none_or(f64::is_finite)
            }
        };
        if finite {
            Ok(())
        } else {
            Err(AnnotationError::NonFiniteGeometry(self.id.clone()))
        }
    }

    /// Apply a partial update. Only text annotations are mutable; returns
    /// whether anything was applied.
    pub fn apply_patch(&mut self, patch: &AnnotationPatch) -> bool {
        let type_name = self.type_name();
        let AnnotationKind::Text(text) = &mut self.kind else {
            log::debug!("ignoring patch for immutable {type_name} annotation {}", self.id);
            return false;
        };
        if let Some(content) = &patch.content {
            text.content.clone_from(content);
        }
        if let Some(color) = patch.color {
            text.color = color;
        }
        if let Some(font_size) = patch.font_size {
            text.font_size = font_size;
        }
        if let Some(position) = patch.position {
            text.position = position;
        }
        if let Some(width) = patch.width {
            text.width = Some(width);
        }
        if let Some(height) = patch.height {
            text.height = Some(height);
        }
        !patch.is_empty()
    }

    /// Whether an eraser of `radius` pixels centered at `point` touches this
    /// annotation, with geometry denormalized against `size`.
    ///
    /// Pens test every sampled point, lines only their two endpoints and text
    /// only its top-left anchor. See [`Annotation::touches_geometry`] for the
    /// full-shape variant.
    pub fn touches_anchor(&self, point: Point, radius: f64, size: Size) -> bool {
        let within = |p: NormPoint| p.is_finite() && to_screen(p, size).distance(point) <= radius;
        match &self.kind {
            AnnotationKind::Pen(pen) => pen.points.iter().any(|p| within(*p)),
            AnnotationKind::Line(line) => within(line.start) || within(line.end),
            AnnotationKind::Text(text) => within(text.position),
        }
    }

    /// Whether an eraser touches any part of the drawn shape: distance to every
    /// pen segment, distance to the line segment, containment in the text box.
    ///
    /// `text_size` is the text box size in pixels for boxes without stored
    /// dimensions.
    pub fn touches_geometry(&self, point: Point, radius: f64, size: Size, text_size: Size) -> bool {
        match &self.kind {
            AnnotationKind::Pen(pen) => {
                if pen.points.iter().any(|p| !p.is_finite()) {
                    return false;
                }
                let screen: Vec<Point> = pen.points.iter().map(|p| to_screen(*p, size)).collect();
                match screen.as_slice() {
                    [] => false,
                    [only] => only.distance(point) <= radius,
                    _ => point_to_polyline_dist(point, &screen) <= radius,
                }
            }
            AnnotationKind::Line(line) => {
                if !line.start.is_finite() || !line.end.is_finite() {
                    return false;
                }
                let a = to_screen(line.start, size);
                let b = to_screen(line.end, size);
                point_to_segment_dist(point, a, b) <= radius
            }
            AnnotationKind::Text(text) => {
                if !text.position.is_finite() {
                    return false;
                }
                let origin = to_screen(text.position, size);
                let rect = kurbo::Rect::from_origin_size(origin, text_size);
                rect.inflate(radius, radius).contains(point)
            }
        }
    }
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    point.distance(a + seg * t)
}

/// Minimum distance from a point to a polyline.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| point_to_segment_dist(point, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}
