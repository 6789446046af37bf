//! Per-page composite: committed annotations first, live preview on top.

use crate::surface::{Surface, SurfaceResult};
use kurbo::{BezPath, Cap, Join, Point, Size, Stroke};
use pdfink_core::annotation::{Annotation, AnnotationId, AnnotationKind, TextBox};
use pdfink_core::color::Rgba;
use pdfink_core::config::EngineConfig;
use pdfink_core::coords::{is_drawable, to_screen, to_screen_all};
use pdfink_core::selection::text_box_rect;
use pdfink_core::text_fit::{fit_font_size, text_lines};
use pdfink_core::tools::ToolPreview;
use peniko::Color;

/// Context for a single repaint.
pub struct RenderContext<'a> {
    /// Every annotation of the document, in insertion order.
    pub annotations: &'a [Annotation],
    /// Only annotations of this page are painted.
    pub page_number: u32,
    /// In-progress gesture, painted last.
    pub preview: Option<&'a ToolPreview>,
    /// Text annotation currently open in an edit surface (skipped).
    pub editing: Option<&'a AnnotationId>,
    pub config: EngineConfig,
}

impl<'a> RenderContext<'a> {
    pub fn new(annotations: &'a [Annotation], page_number: u32) -> Self {
        Self {
            annotations,
            page_number,
            preview: None,
            editing: None,
            config: EngineConfig::default(),
        }
    }

    pub fn with_preview(mut self, preview: Option<&'a ToolPreview>) -> Self {
        self.preview = preview;
        self
    }

    pub fn with_editing(mut self, id: Option<&'a AnnotationId>) -> Self {
        self.editing = id;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }
}

/// What a repaint did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub painted: usize,
    /// Annotations skipped because they were invalid or failed to draw.
    pub skipped: usize,
    pub preview_painted: bool,
}

fn round_stroke(width: f64) -> Stroke {
    Stroke::new(width).with_caps(Cap::Round).with_join(Join::Round)
}

fn polyline(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    if let Some((first, rest)) = points.split_first() {
        path.move_to(*first);
        if rest.is_empty() {
            // Zero-length segment so round caps leave a dot.
            path.line_to(*first);
        }
        for p in rest {
            path.line_to(*p);
        }
    }
    path
}

fn color(rgba: Rgba) -> Color {
    rgba.into()
}

/// Repaint one page.
///
/// Never aborts: an annotation that is invalid or fails to draw is skipped,
/// logged and counted.
pub fn render_page<S: Surface + ?Sized>(surface: &mut S, ctx: &RenderContext<'_>) -> RenderStats {
    let mut stats = RenderStats::default();
    if let Err(e) = surface.clear() {
        log::error!("Failed to clear surface: {e}");
    }

    let size = surface.size();
    if !is_drawable(size) {
        log::debug!("Skipping repaint of {size:?} surface");
        return stats;
    }

    let page = ctx
        .annotations
        .iter()
        .filter(|a| a.page_number == ctx.page_number)
        .filter(|a| ctx.editing != Some(&a.id));
    for annotation in page {
        if let Err(e) = annotation.validate() {
            log::warn!("Skipping annotation: {e}");
            stats.skipped += 1;
            continue;
        }
        match paint_annotation(surface, annotation, size, &ctx.config) {
            Ok(()) => stats.painted += 1,
            Err(e) => {
                log::error!("Failed to paint annotation {}: {e}", annotation.id);
                stats.skipped += 1;
            }
        }
    }

    if let Some(preview) = ctx.preview {
        match paint_preview(surface, preview) {
            Ok(()) => stats.preview_painted = true,
            Err(e) => log::error!("Failed to paint preview: {e}"),
        }
    }
    stats
}

/// Paint one committed annotation, denormalized against `size`.
pub fn paint_annotation<S: Surface + ?Sized>(
    surface: &mut S,
    annotation: &Annotation,
    size: Size,
    config: &EngineConfig,
) -> SurfaceResult<()> {
    match &annotation.kind {
        AnnotationKind::Pen(pen) => {
            let points = to_screen_all(&pen.points, size);
            surface.stroke_path(&polyline(&points), &round_stroke(pen.width), color(pen.color))
        }
        AnnotationKind::Line(line) => {
            let points = [to_screen(line.start, size), to_screen(line.end, size)];
            surface.stroke_path(&polyline(&points), &round_stroke(line.width), color(line.color))
        }
        AnnotationKind::Text(text) => paint_text(surface, text, size, config),
    }
}

/// Text is centered in its box. Boxes with stored dimensions get the fitted
/// font size; older records without them keep their own font size.
fn paint_text<S: Surface + ?Sized>(
    surface: &mut S,
    text: &TextBox,
    size: Size,
    config: &EngineConfig,
) -> SurfaceResult<()> {
    let rect = text_box_rect(text, size, &*surface, config);
    let font_size = if text.width.is_some() && text.height.is_some() {
        fit_font_size(&*surface, &text.content, rect.size(), config)
    } else {
        text.font_size
    };

    let lines = text_lines(&text.content);
    let line_height = font_size * config.line_height_factor;
    let center = rect.center();
    let top = center.y - line_height * lines.len() as f64 / 2.0;
    for (i, line) in lines.iter().enumerate() {
        let y = top + line_height * (i as f64 + 0.5);
        surface.fill_text(line, Point::new(center.x, y), font_size, color(text.color))?;
    }
    Ok(())
}

/// Paint in-progress feedback in screen space, unsmoothed.
pub fn paint_preview<S: Surface + ?Sized>(surface: &mut S, preview: &ToolPreview) -> SurfaceResult<()> {
    match preview {
        ToolPreview::Pen {
            points,
            pressures,
            color: c,
            width,
        } => {
            let pressure_at = |i: usize| pressures.get(i).copied().unwrap_or(1.0);
            if let [only] = points.as_slice() {
                return surface.stroke_path(&polyline(&[*only]), &round_stroke(width * pressure_at(0)), color(*c));
            }
            // Each segment takes the mean pressure of its two samples.
            for (i, pair) in points.windows(2).enumerate() {
                let w = width * (pressure_at(i) + pressure_at(i + 1)) / 2.0;
                surface.stroke_path(&polyline(pair), &round_stroke(w), color(*c))?;
            }
            Ok(())
        }
        ToolPreview::Line {
            start,
            end,
            color: c,
            width,
        } => surface.stroke_path(&polyline(&[*start, *end]), &round_stroke(*width), color(*c)),
        ToolPreview::Eraser { trail, radius } => {
            for p in trail {
                surface.erase_circle(*p, *radius)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{DrawCommand, RecordingSurface};
    use kurbo::PathEl;
    use pdfink_core::annotation::{LineSegment, PenStroke};
    use pdfink_core::coords::NormPoint;
    use pdfink_core::text_fit::ApproxTextMeasure;

    const SIZE: Size = Size::new(200.0, 100.0);

    fn pen(id: &str, page: u32, color: Rgba) -> Annotation {
        Annotation {
            id: id.into(),
            page_number: page,
            timestamp: 0,
            kind: AnnotationKind::Pen(PenStroke {
                points: vec![NormPoint::new(0.0, 0.0), NormPoint::new(0.5, 0.5)],
                color,
                width: 3.0,
            }),
        }
    }

    fn line(id: &str) -> Annotation {
        Annotation {
            id: id.into(),
            page_number: 1,
            timestamp: 0,
            kind: AnnotationKind::Line(LineSegment {
                start: NormPoint::new(0.1, 0.5),
                end: NormPoint::new(0.9, 0.5),
                color: Rgba::BLACK,
                width: 2.0,
            }),
        }
    }

    fn text(id: &str, content: &str, width: Option<f64>, height: Option<f64>) -> Annotation {
        Annotation {
            id: id.into(),
            page_number: 1,
            timestamp: 0,
            kind: AnnotationKind::Text(TextBox {
                position: NormPoint::new(0.25, 0.2),
                content: content.to_string(),
                font_size: 16.0,
                color: Rgba::RED,
                width,
                height,
            }),
        }
    }

    fn strokes(surface: &RecordingSurface) -> Vec<&BezPath> {
        surface
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Stroke { path, .. } => Some(path),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_clears_then_paints_page_in_order() {
        let anns = vec![pen("a", 1, Rgba::RED), pen("b", 2, Rgba::BLACK), line("c")];
        let mut surface = RecordingSurface::new(SIZE);
        let stats = render_page(&mut surface, &RenderContext::new(&anns, 1));

        assert_eq!(stats.painted, 2);
        assert_eq!(stats.skipped, 0);
        let cmds = surface.commands();
        assert_eq!(cmds[0], DrawCommand::Clear);
        assert!(matches!(&cmds[1], DrawCommand::Stroke { color, width, .. } if *color == Rgba::RED && *width == 3.0));
        assert!(matches!(&cmds[2], DrawCommand::Stroke { color, .. } if *color == Rgba::BLACK));
        assert_eq!(cmds.len(), 3);
    }

    #[test]
    fn test_geometry_denormalized_against_surface() {
        let anns = vec![line("l")];
        let mut surface = RecordingSurface::new(SIZE);
        render_page(&mut surface, &RenderContext::new(&anns, 1));
        let path = strokes(&surface)[0];
        let els: Vec<PathEl> = path.elements().to_vec();
        assert_eq!(els[0], PathEl::MoveTo(Point::new(20.0, 50.0)));
        assert_eq!(els[1], PathEl::LineTo(Point::new(180.0, 50.0)));

        // Same record at twice the zoom lands at twice the pixels.
        surface.resize(Size::new(400.0, 200.0));
        render_page(&mut surface, &RenderContext::new(&anns, 1));
        let els: Vec<PathEl> = strokes(&surface)[0].elements().to_vec();
        assert_eq!(els[1], PathEl::LineTo(Point::new(360.0, 100.0)));
    }

    #[test]
    fn test_preview_painted_last() {
        let anns = vec![pen("a", 1, Rgba::RED)];
        let preview = ToolPreview::Line {
            start: Point::new(0.0, 0.0),
            end: Point::new(50.0, 0.0),
            color: Rgba::BLACK,
            width: 4.0,
        };
        let mut surface = RecordingSurface::new(SIZE);
        let stats = render_page(&mut surface, &RenderContext::new(&anns, 1).with_preview(Some(&preview)));
        assert!(stats.preview_painted);
        assert!(matches!(
            surface.commands().last(),
            Some(DrawCommand::Stroke { width, color, .. }) if *width == 4.0 && *color == Rgba::BLACK
        ));
    }

    #[test]
    fn test_pen_preview_uses_mean_pressure() {
        let preview = ToolPreview::Pen {
            points: vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(20.0, 0.0)],
            pressures: vec![0.4, 0.6, 1.0],
            color: Rgba::BLACK,
            width: 10.0,
        };
        let mut surface = RecordingSurface::new(SIZE);
        paint_preview(&mut surface, &preview).unwrap();
        let widths: Vec<f64> = surface
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Stroke { width, .. } => Some(*width),
                _ => None,
            })
            .collect();
        assert_eq!(widths.len(), 2);
        assert!((widths[0] - 5.0).abs() < 1e-9);
        assert!((widths[1] - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_eraser_preview_erases_trail() {
        let preview = ToolPreview::Eraser {
            trail: vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)],
            radius: 10.0,
        };
        let mut surface = RecordingSurface::new(SIZE);
        paint_preview(&mut surface, &preview).unwrap();
        assert_eq!(
            surface.commands(),
            &[
                DrawCommand::Erase { center: Point::new(1.0, 1.0), radius: 10.0 },
                DrawCommand::Erase { center: Point::new(2.0, 2.0), radius: 10.0 },
            ]
        );
    }

    #[test]
    fn test_invalid_and_failing_annotations_skipped() {
        let mut broken = pen("broken", 1, Rgba::BLACK);
        if let AnnotationKind::Pen(p) = &mut broken.kind {
            p.points.truncate(1);
        }
        let anns = vec![broken, pen("fails", 1, Rgba::RED), line("ok")];
        let mut surface = RecordingSurface::new(SIZE).with_failing_color(Rgba::RED);
        let stats = render_page(&mut surface, &RenderContext::new(&anns, 1));
        assert_eq!(stats.painted, 1);
        assert_eq!(stats.skipped, 2);
    }

    #[test]
    fn test_text_centered_at_fitted_size() {
        let config = EngineConfig::default();
        let measure = ApproxTextMeasure { char_width_factor: 0.5 };
        // Box: origin (50, 20), 100x40 px.
        let anns = vec![text("t", "ab\ncd", Some(0.5), Some(0.4))];
        let mut surface = RecordingSurface::new(SIZE).with_measure(measure);
        render_page(&mut surface, &RenderContext::new(&anns, 1));

        let texts: Vec<(String, Point, f64)> = surface
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, center, font_size, .. } => Some((text.clone(), *center, *font_size)),
                _ => None,
            })
            .collect();
        assert_eq!(texts.len(), 2);
        let expected = fit_font_size(&measure, "ab\ncd", Size::new(100.0, 40.0), &config);
        // Height-bound: 2 lines * s * 1.2 <= 32
        assert!((expected - 32.0 / 2.4).abs() < 0.01);
        for (_, center, size) in &texts {
            assert!((size - expected).abs() < f64::EPSILON);
            assert!((center.x - 100.0).abs() < 1e-9);
        }
        let line_height = expected * 1.2;
        assert!((texts[0].1.y - (40.0 - line_height / 2.0)).abs() < 1e-9);
        assert!((texts[1].1.y - (40.0 + line_height / 2.0)).abs() < 1e-9);
    }

    #[test]
    fn test_text_without_box_keeps_font_size() {
        let anns = vec![text("t", "hello", None, None)];
        let mut surface = RecordingSurface::new(SIZE);
        render_page(&mut surface, &RenderContext::new(&anns, 1));
        assert!(surface
            .commands()
            .iter()
            .any(|c| matches!(c, DrawCommand::Text { font_size, .. } if (*font_size - 16.0).abs() < f64::EPSILON)));
    }

    #[test]
    fn test_editing_annotation_hidden() {
        let anns = vec![text("t", "hello", Some(0.5), Some(0.4))];
        let id = AnnotationId::from("t");
        let mut surface = RecordingSurface::new(SIZE);
        let stats = render_page(&mut surface, &RenderContext::new(&anns, 1).with_editing(Some(&id)));
        assert_eq!(stats.painted, 0);
        assert_eq!(surface.commands(), &[DrawCommand::Clear]);
    }

    #[test]
    fn test_controller_gesture_to_composite() {
        use pdfink_core::input::PointerInput;
        use pdfink_core::store::FileAnnotations;
        use pdfink_core::tools::{ToolController, ToolKind};

        let mut store = FileAnnotations::new();
        let mut tools = ToolController::default();
        assert!(tools.attach(SIZE));
        tools.set_tool(ToolKind::Pen);
        tools.pointer_down(&PointerInput::at(Point::new(10.0, 10.0)), &mut store);
        tools.pointer_move(&PointerInput::at(Point::new(60.0, 40.0)), &mut store);

        let mut surface = RecordingSurface::new(SIZE);
        let preview = tools.preview();
        let stats = render_page(&mut surface, &RenderContext::new(store.page(1), 1).with_preview(preview.as_ref()));
        assert_eq!(stats.painted, 0);
        assert!(stats.preview_painted);

        tools.pointer_up(&PointerInput::at(Point::new(60.0, 40.0)), &mut store);
        let preview = tools.preview();
        let stats = render_page(&mut surface, &RenderContext::new(store.page(1), 1).with_preview(preview.as_ref()));
        assert_eq!(stats.painted, 1);
        assert!(!stats.preview_painted);
    }

    #[test]
    fn test_undrawable_surface_only_clears() {
        let anns = vec![line("l")];
        let mut surface = RecordingSurface::new(Size::new(0.0, 100.0));
        let stats = render_page(&mut surface, &RenderContext::new(&anns, 1));
        assert_eq!(stats, RenderStats::default());
        assert_eq!(surface.commands(), &[DrawCommand::Clear]);
    }
}
