//! Pointer input and cursor feedback
//!
//! Hosts translate their toolkit's events into [`PointerInput`] in normalized
//! widget space and read back a [`CursorHint`] after each event.

use contour_core::Viewport;
use std::time::Instant;

/// Modifier keys held during a pointer event
///
/// Ctrl is the only key the editors give a meaning to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { ctrl: false };

    pub const CTRL: Modifiers = Modifiers { ctrl: true };
}

/// One pointer event in widget space (`[0, 1]²`, y grows upward)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub x: f64,
    pub y: f64,
    pub modifiers: Modifiers,
    /// Event timestamp, used for double-click detection
    pub at: Instant,
}

impl PointerInput {
    pub fn new(x: f64, y: f64, at: Instant) -> Self {
        Self {
            x,
            y,
            modifiers: Modifiers::NONE,
            at,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Cursor the host should show over the widget
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CursorHint {
    #[default]
    None,
    Move,
    ResizeVertical,
    ResizeHorizontal,
    Copy,
}

impl CursorHint {
    /// CSS cursor name, empty for the host default
    pub fn css_name(self) -> &'static str {
        match self {
            CursorHint::None => "",
            CursorHint::Move => "move",
            CursorHint::ResizeVertical => "ns-resize",
            CursorHint::ResizeHorizontal => "ew-resize",
            CursorHint::Copy => "copy",
        }
    }
}

/// Widget size in pixels plus its current pan/zoom
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub width: f64,
    pub height: f64,
    pub viewport: Viewport,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            width: 10.0,
            height: 10.0,
            viewport: Viewport::default(),
        }
    }
}

impl Surface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            viewport: Viewport::default(),
        }
    }

    /// Pointer position in timeline space
    pub fn to_timeline(&self, input: &PointerInput) -> (f64, f64) {
        self.viewport.to_timeline(input.x, input.y)
    }

    /// Pixels per render-space unit along x and y
    pub fn pixel_factors(&self) -> (f64, f64) {
        (
            self.width * self.viewport.x_scale / 2.0,
            self.height * self.viewport.y_scale / 2.0,
        )
    }
}
