//! Pointer input and per-view input session state.

use crate::config::EngineConfig;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// Kind of device that produced a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PointerKind {
    #[default]
    Mouse,
    Pen,
    Touch,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A single pointer or touch sample, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerInput {
    pub position: Point,
    /// Native pointer pressure (pen tablets).
    pub pressure: Option<f64>,
    /// Touch force (force-sensitive touch screens).
    pub force: Option<f64>,
    pub kind: PointerKind,
    pub modifiers: Modifiers,
}

impl PointerInput {
    /// A plain mouse sample at `position`.
    pub fn at(position: Point) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_pressure(mut self, pressure: f64) -> Self {
        self.pressure = Some(pressure);
        self.kind = PointerKind::Pen;
        self
    }

    pub fn with_force(mut self, force: f64) -> Self {
        self.force = Some(force);
        self.kind = PointerKind::Touch;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Pressure by precedence: native pressure, then touch force, then
    /// `default`. Non-finite readings are ignored. The result is clamped to
    /// `[min, max]`.
    pub fn effective_pressure(&self, default: f64, min: f64, max: f64) -> f64 {
        self.pressure
            .filter(|p| p.is_finite() && *p > 0.0)
            .or_else(|| self.force.filter(|f| f.is_finite() && *f > 0.0))
            .unwrap_or(default)
            .clamp(min, max)
    }
}

/// Input bookkeeping owned by the host view and shared with the shortcut
/// dispatcher.
///
/// Tracks whether a drawing gesture is in progress and when a stylus last
/// touched the canvas, so stray palm touches and keyboard shortcuts fired
/// while writing can be ignored for a configurable debounce window.
#[derive(Debug, Clone)]
pub struct InputSessionState {
    /// Device of the most recent pointer-down.
    pub active_pointer: Option<PointerKind>,
    gesture_active: bool,
    last_stylus_activity: Option<Instant>,
    debounce: Duration,
}

impl Default for InputSessionState {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl InputSessionState {
    pub fn new(debounce: Duration) -> Self {
        Self {
            active_pointer: None,
            gesture_active: false,
            last_stylus_activity: None,
            debounce,
        }
    }

    /// Session using the configured debounce window.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.input_debounce())
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn set_debounce(&mut self, debounce: Duration) {
        self.debounce = debounce;
    }

    /// Record the start of a gesture.
    pub fn pointer_down(&mut self, kind: PointerKind, now: Instant) {
        self.active_pointer = Some(kind);
        self.gesture_active = true;
        if kind == PointerKind::Pen {
            self.last_stylus_activity = Some(now);
        }
        log::debug!("input session: {kind:?} down");
    }

    /// Record stylus movement so the debounce window slides with it.
    pub fn pointer_move(&mut self, kind: PointerKind, now: Instant) {
        if kind == PointerKind::Pen {
            self.last_stylus_activity = Some(now);
        }
    }

    /// Record the end (or cancellation) of a gesture.
    pub fn pointer_up(&mut self, kind: PointerKind, now: Instant) {
        if kind == PointerKind::Pen {
            self.last_stylus_activity = Some(now);
        }
        self.gesture_active = false;
        log::debug!("input session: {kind:?} up");
    }

    pub fn is_gesture_active(&self) -> bool {
        self.gesture_active
    }

    fn within_stylus_window(&self, now: Instant) -> bool {
        self.last_stylus_activity
            .is_some_and(|t| now.saturating_duration_since(t) < self.debounce)
    }

    /// Keyboard shortcuts are suppressed while drawing and shortly after the
    /// stylus lifts.
    pub fn should_suppress_shortcuts(&self, now: Instant) -> bool {
        self.gesture_active || self.within_stylus_window(now)
    }

    /// Whether a touch contact should be treated as intentional input rather
    /// than a resting palm.
    pub fn accept_touch(&self, now: Instant) -> bool {
        !self.within_stylus_window(now)
    }

    /// Whether an incoming pointer-down of `kind` should start a gesture.
    pub fn accepts(&self, kind: PointerKind, now: Instant) -> bool {
        kind != PointerKind::Touch || self.accept_touch(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pressure_precedence() {
        let p = PointerInput::at(Point::ZERO).with_pressure(0.9);
        assert!((p.effective_pressure(0.7, 0.3, 1.0) - 0.9).abs() < f64::EPSILON);

        let mut both = PointerInput::at(Point::ZERO).with_force(0.5);
        both.pressure = Some(0.8);
        assert!((both.effective_pressure(0.7, 0.3, 1.0) - 0.8).abs() < f64::EPSILON);

        let f = PointerInput::at(Point::ZERO).with_force(0.5);
        assert!((f.effective_pressure(0.7, 0.3, 1.0) - 0.5).abs() < f64::EPSILON);

        let mouse = PointerInput::at(Point::ZERO);
        assert!((mouse.effective_pressure(0.7, 0.3, 1.0) - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pressure_clamped() {
        let light = PointerInput::at(Point::ZERO).with_pressure(0.05);
        assert!((light.effective_pressure(0.7, 0.3, 1.0) - 0.3).abs() < f64::EPSILON);

        let heavy = PointerInput::at(Point::ZERO).with_force(3.0);
        assert!((heavy.effective_pressure(0.7, 0.3, 1.0) - 1.0).abs() < f64::EPSILON);

        let nan = PointerInput::at(Point::ZERO).with_pressure(f64::NAN);
        assert!((nan.effective_pressure(0.7, 0.3, 1.0) - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shortcuts_suppressed_during_gesture() {
        let mut session = InputSessionState::new(Duration::from_millis(300));
        let t0 = Instant::now();
        assert!(!session.should_suppress_shortcuts(t0));

        session.pointer_down(PointerKind::Mouse, t0);
        assert!(session.should_suppress_shortcuts(t0));

        session.pointer_up(PointerKind::Mouse, t0);
        assert!(!session.should_suppress_shortcuts(t0));
    }

    #[test]
    fn test_stylus_debounce_window() {
        let mut session = InputSessionState::new(Duration::from_millis(300));
        let t0 = Instant::now();
        session.pointer_down(PointerKind::Pen, t0);
        session.pointer_up(PointerKind::Pen, t0);

        let soon = t0 + Duration::from_millis(100);
        assert!(session.should_suppress_shortcuts(soon));
        assert!(!session.accept_touch(soon));
        assert!(!session.accepts(PointerKind::Touch, soon));
        assert!(session.accepts(PointerKind::Mouse, soon));

        let later = t0 + Duration::from_millis(400);
        assert!(!session.should_suppress_shortcuts(later));
        assert!(session.accept_touch(later));
    }

    #[test]
    fn test_debounce_from_loaded_config() {
        let config = EngineConfig::from_json(r#"{"input_debounce_ms": 1000}"#).unwrap();
        let mut session = InputSessionState::from_config(&config);
        assert_eq!(session.debounce(), Duration::from_millis(1000));

        let mut stock = InputSessionState::default();
        let t0 = Instant::now();
        for s in [&mut session, &mut stock] {
            s.pointer_down(PointerKind::Pen, t0);
            s.pointer_up(PointerKind::Pen, t0);
        }
        // Past the default 500 ms window, still inside the configured one.
        let t1 = t0 + Duration::from_millis(700);
        assert!(session.should_suppress_shortcuts(t1));
        assert!(!stock.should_suppress_shortcuts(t1));
        assert!(!session.should_suppress_shortcuts(t0 + Duration::from_millis(1100)));
    }

    #[test]
    fn test_modifiers_command() {
        assert!(!Modifiers::NONE.command());
        assert!(Modifiers { meta: true, ..Modifiers::NONE }.command());
    }
}
