//! Engine thresholds and user-facing tool settings.

use crate::color::Rgba;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// How the eraser decides it touched an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EraserHitMode {
    /// Pens by any sampled point, lines by either endpoint, text by its
    /// top-left anchor.
    #[default]
    Anchor,
    /// Pens and lines by segment distance, text by its whole box.
    Geometry,
}

/// Thresholds used by the tool engines. Every field has a default so a
/// partial JSON document is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum screen distance between recorded pen samples.
    pub pen_min_distance: f64,
    /// Weight of the new raw pressure in the exponential smoothing.
    pub pressure_smoothing: f64,
    /// Pressure used when the device reports neither pressure nor force.
    pub default_pressure: f64,
    pub min_pressure: f64,
    pub max_pressure: f64,
    /// Lines shorter than this on screen are discarded.
    pub line_min_length: f64,
    /// Reference canvas the initial text box is normalized against.
    pub text_reference_width: f64,
    pub text_reference_height: f64,
    /// Padding around measured text when sizing a new box.
    pub text_padding: f64,
    /// Line height as a multiple of the font size.
    pub line_height_factor: f64,
    pub min_font_size: f64,
    pub max_font_size: f64,
    /// Fraction of the box width the widest line may occupy.
    pub fit_width_fraction: f64,
    /// Fraction of the box height the text block may occupy.
    pub fit_height_fraction: f64,
    pub min_text_box_width: f64,
    pub min_text_box_height: f64,
    /// Distance in pixels within which a resize handle is grabbed.
    pub handle_hit_tolerance: f64,
    pub eraser_hit_mode: EraserHitMode,
    /// Window after stylus activity during which touch input and keyboard
    /// shortcuts are suppressed.
    pub input_debounce_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pen_min_distance: 1.5,
            pressure_smoothing: 0.3,
            default_pressure: 0.7,
            min_pressure: 0.3,
            max_pressure: 1.0,
            line_min_length: 5.0,
            text_reference_width: 800.0,
            text_reference_height: 600.0,
            text_padding: 4.0,
            line_height_factor: 1.2,
            min_font_size: 8.0,
            max_font_size: 200.0,
            fit_width_fraction: 0.9,
            fit_height_fraction: 0.8,
            min_text_box_width: 50.0,
            min_text_box_height: 20.0,
            handle_hit_tolerance: 8.0,
            eraser_hit_mode: EraserHitMode::Anchor,
            input_debounce_ms: 500,
        }
    }
}

impl EngineConfig {
    /// Parse a config from JSON, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::debug!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    pub fn input_debounce(&self) -> Duration {
        Duration::from_millis(self.input_debounce_ms)
    }

    /// Reject values that would break the engines' invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("text_reference_width", self.text_reference_width),
            ("text_reference_height", self.text_reference_height),
            ("line_height_factor", self.line_height_factor),
            ("min_font_size", self.min_font_size),
            ("fit_width_fraction", self.fit_width_fraction),
            ("fit_height_fraction", self.fit_height_fraction),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a positive number, got {value}"),
                });
            }
        }
        if !(0.0..=1.0).contains(&self.pressure_smoothing) {
            return Err(ConfigError::Invalid {
                field: "pressure_smoothing",
                reason: format!("must be within 0..=1, got {}", self.pressure_smoothing),
            });
        }
        if self.min_pressure > self.max_pressure {
            return Err(ConfigError::Invalid {
                field: "min_pressure",
                reason: "must not exceed max_pressure".to_string(),
            });
        }
        if self.min_font_size > self.max_font_size {
            return Err(ConfigError::Invalid {
                field: "min_font_size",
                reason: "must not exceed max_font_size".to_string(),
            });
        }
        Ok(())
    }
}

/// Settings the user picks in the toolbar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolSettings {
    pub color: Rgba,
    /// Stroke width for pen and line, in CSS pixels.
    pub line_width: f64,
    /// Font size for new text, in CSS pixels.
    pub font_size: f64,
    /// Eraser diameter in pixels.
    pub eraser_size: f64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            color: Rgba::BLACK,
            line_width: 2.0,
            font_size: 16.0,
            eraser_size: 20.0,
        }
    }
}

impl ToolSettings {
    /// Eraser hit radius.
    pub fn eraser_radius(&self) -> f64 {
        self.eraser_size / 2.0
    }
}
