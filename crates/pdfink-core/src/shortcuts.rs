//! Keyboard shortcut registry and dispatch.

use crate::input::{InputSessionState, Modifiers};
use crate::tools::ToolKind;

#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// What a shortcut does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    SelectTool(ToolKind),
    Undo,
    Redo,
    /// Abandon the current gesture or text entry.
    Cancel,
    /// Delete the annotation being edited.
    Delete,
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    /// Ctrl, or Cmd on macOS.
    pub ctrl: bool,
    pub shift: bool,
    pub action: ShortcutAction,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        action: ShortcutAction,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            action,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Shift+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }

    /// Whether a key press matches. Letter keys compare case-insensitively.
    pub fn matches(&self, key: &str, modifiers: Modifiers) -> bool {
        self.key.eq_ignore_ascii_case(key)
            && self.ctrl == modifiers.command()
            && self.shift == modifiers.shift
            && !modifiers.alt
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    pub fn all() -> Vec<Shortcut> {
        use ShortcutAction::*;
        vec![
            Shortcut::new("P", false, false, SelectTool(ToolKind::Pen), "Pen"),
            Shortcut::new("L", false, false, SelectTool(ToolKind::Line), "Line"),
            Shortcut::new("T", false, false, SelectTool(ToolKind::Text), "Text"),
            Shortcut::new("E", false, false, SelectTool(ToolKind::Eraser), "Eraser"),
            Shortcut::new("V", false, false, SelectTool(ToolKind::Select), "Select"),
            Shortcut::new("Z", true, false, Undo, "Undo"),
            Shortcut::new("Z", true, true, Redo, "Redo"),
            Shortcut::new("Y", true, false, Redo, "Redo"),
            Shortcut::new("Escape", false, false, Cancel, "Cancel current action"),
            Shortcut::new("Delete", false, false, Delete, "Delete annotation"),
            Shortcut::new("Backspace", false, false, Delete, "Delete annotation"),
        ]
    }
}

/// Maps key presses to actions, honoring the input session's suppression
/// window.
#[derive(Debug, Clone)]
pub struct ShortcutDispatcher {
    shortcuts: Vec<Shortcut>,
}

impl Default for ShortcutDispatcher {
    fn default() -> Self {
        Self::new(ShortcutRegistry::all())
    }
}

impl ShortcutDispatcher {
    pub fn new(shortcuts: Vec<Shortcut>) -> Self {
        Self { shortcuts }
    }

    pub fn shortcuts(&self) -> &[Shortcut] {
        &self.shortcuts
    }

    /// Resolve a key press. While the session suppresses shortcuts only
    /// `Cancel` gets through.
    pub fn dispatch(
        &self,
        key: &str,
        modifiers: Modifiers,
        session: &InputSessionState,
        now: Instant,
    ) -> Option<ShortcutAction> {
        let action = self
            .shortcuts
            .iter()
            .find(|s| s.matches(key, modifiers))
            .map(|s| s.action)?;

        if action != ShortcutAction::Cancel && session.should_suppress_shortcuts(now) {
            log::debug!("Suppressed shortcut {key} during stylus input");
            return None;
        }
        Some(action)
    }
}
