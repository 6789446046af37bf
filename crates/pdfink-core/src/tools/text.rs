//! Text placement and editing.

use crate::annotation::{Annotation, AnnotationId, AnnotationKind, AnnotationPatch, TextBox};
use crate::color::Rgba;
use crate::config::{EngineConfig, ToolSettings};
use crate::coords::to_normalized;
use crate::text_fit::{TextMeasure, content_box_size};
use kurbo::{Point, Size};

/// State of the text tool.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TextToolState {
    #[default]
    Idle,
    /// An entry surface is open at `anchor` (screen space).
    Placing { anchor: Point },
    /// An existing annotation is being edited.
    Editing { id: AnnotationId },
}

/// Editable fields of an existing text annotation, pre-filled from the record.
#[derive(Debug, Clone, PartialEq)]
pub struct TextDraft {
    pub id: AnnotationId,
    pub content: String,
    pub color: Rgba,
    pub font_size: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TextTool {
    state: TextToolState,
    config: EngineConfig,
}

impl TextTool {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            state: TextToolState::Idle,
            config,
        }
    }

    pub fn state(&self) -> &TextToolState {
        &self.state
    }

    /// Screen anchor of the open entry surface, if any.
    pub fn placement(&self) -> Option<Point> {
        match self.state {
            TextToolState::Placing { anchor } => Some(anchor),
            _ => None,
        }
    }

    /// Open an entry surface at the click point. Replaces any placement that
    /// was still open.
    pub fn place(&mut self, anchor: Point) {
        log::debug!("text: placing at {anchor:?}");
        self.state = TextToolState::Placing { anchor };
    }

    /// Commit the open placement (Enter or blur). Empty content cancels.
    ///
    /// The initial box is sized from the measured text at the configured font
    /// size and normalized against the reference canvas rather than the page,
    /// so a new box looks the same on every document.
    pub fn commit<M: TextMeasure + ?Sized>(
        &mut self,
        content: &str,
        page_number: u32,
        canvas: Size,
        settings: &ToolSettings,
        measure: &M,
    ) -> Option<Annotation> {
        let TextToolState::Placing { anchor } = self.state else {
            return None;
        };
        self.state = TextToolState::Idle;

        let content = content.trim();
        if content.is_empty() {
            log::debug!("text: empty content, nothing committed");
            return None;
        }

        let size = content_box_size(measure, content, settings.font_size, &self.config);
        let annotation = Annotation::new(
            page_number,
            AnnotationKind::Text(TextBox {
                position: to_normalized(anchor, canvas),
                content: content.to_string(),
                font_size: settings.font_size,
                color: settings.color,
                width: Some(size.width / self.config.text_reference_width),
                height: Some(size.height / self.config.text_reference_height),
            }),
        );
        log::debug!("text: committed {}", annotation.id);
        Some(annotation)
    }

    /// Start editing an existing text annotation. Returns `None` for other kinds.
    pub fn begin_edit(&mut self, annotation: &Annotation) -> Option<TextDraft> {
        let text = annotation.as_text()?;
        self.state = TextToolState::Editing {
            id: annotation.id.clone(),
        };
        Some(TextDraft {
            id: annotation.id.clone(),
            content: text.content.clone(),
            color: text.color,
            font_size: text.font_size,
        })
    }

    /// Finish an edit. Produces a patch touching content, color and font size
    /// only. Empty content is treated as cancel.
    pub fn finish_edit(&mut self, draft: &TextDraft) -> Option<(AnnotationId, AnnotationPatch)> {
        let editing = matches!(&self.state, TextToolState::Editing { id } if *id == draft.id);
        self.state = TextToolState::Idle;
        if !editing {
            log::warn!("text: finish_edit for {} which is not being edited", draft.id);
            return None;
        }

        let content = draft.content.trim();
        if content.is_empty() {
            return None;
        }
        Some((
            draft.id.clone(),
            AnnotationPatch {
                content: Some(content.to_string()),
                color: Some(draft.color),
                font_size: Some(draft.font_size),
                ..Default::default()
            },
        ))
    }

    /// Close any placement or edit without emitting. Safe to call at any time.
    pub fn cancel(&mut self) {
        self.state = TextToolState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::NormPoint;
    use crate::text_fit::ApproxTextMeasure;

    const CANVAS: Size = Size::new(400.0, 200.0);

    #[test]
    fn test_commit_creates_text() {
        let mut tool = TextTool::default();
        let measure = ApproxTextMeasure { char_width_factor: 0.5 };
        let settings = ToolSettings {
            font_size: 20.0,
            ..Default::default()
        };
        tool.place(Point::new(100.0, 50.0));
        assert_eq!(tool.placement(), Some(Point::new(100.0, 50.0)));

        let ann = tool.commit("  note  ", 2, CANVAS, &settings, &measure).unwrap();
        let text = ann.as_text().unwrap();
        assert_eq!(text.content, "note");
        assert_eq!(text.position, NormPoint::new(0.25, 0.25));
        // 4 chars * 10px + 8px padding over an 800px reference width
        assert!((text.width.unwrap() - 48.0 / 800.0).abs() < 1e-12);
        // 24px line + 8px padding over a 600px reference height
        assert!((text.height.unwrap() - 32.0 / 600.0).abs() < 1e-12);
        assert_eq!(tool.state(), &TextToolState::Idle);
    }

    #[test]
    fn test_initial_box_independent_of_canvas() {
        let measure = ApproxTextMeasure::default();
        let settings = ToolSettings::default();
        let mut small = TextTool::default();
        small.place(Point::new(10.0, 10.0));
        let a = small.commit("Hello", 1, Size::new(300.0, 400.0), &settings, &measure).unwrap();
        let mut large = TextTool::default();
        large.place(Point::new(10.0, 10.0));
        let b = large.commit("Hello", 1, Size::new(1200.0, 1600.0), &settings, &measure).unwrap();
        assert_eq!(a.as_text().unwrap().width, b.as_text().unwrap().width);
        assert_eq!(a.as_text().unwrap().height, b.as_text().unwrap().height);
    }

    #[test]
    fn test_empty_content_cancels() {
        let mut tool = TextTool::default();
        tool.place(Point::new(1.0, 1.0));
        let ann = tool.commit(" \n\t", 1, CANVAS, &ToolSettings::default(), &ApproxTextMeasure::default());
        assert!(ann.is_none());
        assert_eq!(tool.state(), &TextToolState::Idle);
    }

    #[test]
    fn test_commit_without_placement() {
        let mut tool = TextTool::default();
        let ann = tool.commit("hi", 1, CANVAS, &ToolSettings::default(), &ApproxTextMeasure::default());
        assert!(ann.is_none());
    }

    #[test]
    fn test_edit_produces_partial_patch() {
        let mut tool = TextTool::default();
        tool.place(Point::new(0.0, 0.0));
        let ann = tool
            .commit("draft", 1, CANVAS, &ToolSettings::default(), &ApproxTextMeasure::default())
            .unwrap();

        let mut draft = tool.begin_edit(&ann).unwrap();
        assert_eq!(draft.content, "draft");
        draft.content = "final".to_string();
        draft.color = Rgba::RED;
        draft.font_size = 24.0;

        let (id, patch) = tool.finish_edit(&draft).unwrap();
        assert_eq!(id, ann.id);
        assert_eq!(patch.content.as_deref(), Some("final"));
        assert_eq!(patch.color, Some(Rgba::RED));
        assert_eq!(patch.font_size, Some(24.0));
        assert!(!patch.is_geometry());
    }

    #[test]
    fn test_edit_to_empty_is_cancel() {
        let mut tool = TextTool::default();
        tool.place(Point::new(0.0, 0.0));
        let ann = tool
            .commit("x", 1, CANVAS, &ToolSettings::default(), &ApproxTextMeasure::default())
            .unwrap();
        let mut draft = tool.begin_edit(&ann).unwrap();
        draft.content.clear();
        assert!(tool.finish_edit(&draft).is_none());
        assert_eq!(tool.state(), &TextToolState::Idle);
    }

    #[test]
    fn test_cancel_idempotent() {
        let mut tool = TextTool::default();
        tool.cancel();
        tool.cancel();
        assert_eq!(tool.state(), &TextToolState::Idle);
        tool.place(Point::new(5.0, 5.0));
        tool.cancel();
        tool.cancel();
        assert_eq!(tool.state(), &TextToolState::Idle);
        assert!(tool.placement().is_none());
    }
}
