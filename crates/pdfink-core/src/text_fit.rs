//! Text measurement and box fitting.

use crate::config::EngineConfig;
use kurbo::Size;

/// Measures rendered text width. Implemented by rendering surfaces that can
/// ask the platform for real metrics, and by [`ApproxTextMeasure`] for
/// headless use.
pub trait TextMeasure {
    /// Width in pixels of a single line of `text` at `font_size`.
    fn measure_width(&self, text: &str, font_size: f64) -> f64;
}

/// Character-count based width estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproxTextMeasure {
    /// Average glyph advance as a fraction of the font size.
    pub char_width_factor: f64,
}

impl Default for ApproxTextMeasure {
    fn default() -> Self {
        // Empirical average advance for a sans-serif face.
        Self {
            char_width_factor: 0.55,
        }
    }
}

impl TextMeasure for ApproxTextMeasure {
    fn measure_width(&self, text: &str, font_size: f64) -> f64 {
        text.chars().count() as f64 * font_size * self.char_width_factor
    }
}

/// Lines of a text block. Empty content is one empty line.
pub fn text_lines(content: &str) -> Vec<&str> {
    content.split('\n').map(|l| l.trim_end_matches('\r')).collect()
}

/// Width of the widest line and total height of a text block.
pub fn measure_block<M: TextMeasure + ?Sized>(
    measure: &M,
    content: &str,
    font_size: f64,
    line_height_factor: f64,
) -> Size {
    let lines = text_lines(content);
    let width = lines
        .iter()
        .map(|line| measure.measure_width(line, font_size))
        .fold(0.0, f64::max);
    let height = lines.len() as f64 * font_size * line_height_factor;
    Size::new(width, height)
}

/// Pixel size of a box that holds `content` at `font_size` with padding on
/// every side.
pub fn content_box_size<M: TextMeasure + ?Sized>(
    measure: &M,
    content: &str,
    font_size: f64,
    config: &EngineConfig,
) -> Size {
    let block = measure_block(measure, content, font_size, config.line_height_factor);
    let pad = config.text_padding * 2.0;
    Size::new(block.width + pad, block.height + pad)
}

/// Largest font size in `[min_font_size, max_font_size]` at which `content`
/// fits `box_size`: the widest line within `fit_width_fraction` of the width
/// and the stacked lines within `fit_height_fraction` of the height.
///
/// Never fails. Degenerate boxes and content too long to fit at any size
/// yield the minimum font size.
pub fn fit_font_size<M: TextMeasure + ?Sized>(
    measure: &M,
    content: &str,
    box_size: Size,
    config: &EngineConfig,
) -> f64 {
    let min = config.min_font_size;
    let max = config.max_font_size;
    if !(box_size.width.is_finite() && box_size.height.is_finite())
        || box_size.width <= 0.0
        || box_size.height <= 0.0
    {
        return min;
    }

    let max_width = box_size.width * config.fit_width_fraction;
    let max_height = box_size.height * config.fit_height_fraction;
    let fits = |size: f64| {
        let block = measure_block(measure, content, size, config.line_height_factor);
        block.width <= max_width && block.height <= max_height
    };

    if fits(max) {
        return max;
    }
    if !fits(min) {
        return min;
    }

    // Invariant: fits(lo) && !fits(hi)
    let (mut lo, mut hi) = (min, max);
    for _ in 0..24 {
        let mid = (lo + hi) / 2.0;
        if fits(mid) {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo
}
