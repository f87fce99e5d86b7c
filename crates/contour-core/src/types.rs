//! Core types shared by the timeline editors
//!
//! Coordinate conventions used across the workspace:
//!
//! - **Widget space**: normalized `[0, 1]²` over the widget, `y` grows upward
//!   (0 = bottom edge).
//! - **Timeline space**: normalized `[0, 1]²` over the whole timeline, `x` is
//!   `time / duration` and `y` is `(value - min) / range`.
//! - **Render space**: timeline space rescaled to `[-1, 1]`, the layout of the
//!   flat vertex buffers handed to renderers.

/// Smallest allowed zoom factor (whole timeline visible)
pub const MIN_SCALE: f64 = 1.0;

/// Largest allowed zoom factor
pub const MAX_SCALE: f64 = 1000.0;

// =============================================================================
// Timeline Points
// =============================================================================

/// A single editable point on a timeline curve
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimelinePoint {
    /// Time in seconds (before the owning timeline's time offset is applied)
    pub time: f64,
    /// Curve value, inside the owning timeline's value range
    pub value: f64,
}

impl TimelinePoint {
    pub const fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }

    /// Linear interpolation towards `other` at parametric offset `t`
    pub fn lerp(&self, other: &TimelinePoint, t: f64) -> TimelinePoint {
        TimelinePoint {
            time: self.time * (1.0 - t) + other.time * t,
            value: self.value * (1.0 - t) + other.value * t,
        }
    }
}

impl From<(f64, f64)> for TimelinePoint {
    fn from((time, value): (f64, f64)) -> Self {
        Self { time, value }
    }
}

// =============================================================================
// Viewport
// =============================================================================

/// Pan/zoom transform between widget space and timeline space
///
/// Zoom is in only (`scale >= 1`). Offsets are the timeline-space position of
/// the widget's left/bottom edge and are kept inside `[0, 1 - 1/scale]`, so
/// the viewport never shows anything outside the timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x_scale: f64,
    pub y_scale: f64,
    pub x_offset: f64,
    pub y_offset: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x_scale: 1.0,
            y_scale: 1.0,
            x_offset: 0.0,
            y_offset: 0.0,
        }
    }
}

impl Viewport {
    /// Create a viewport, clamping every field into its legal range
    pub fn new(x_scale: f64, y_scale: f64, x_offset: f64, y_offset: f64) -> Self {
        let mut viewport = Self {
            x_scale,
            y_scale,
            x_offset,
            y_offset,
        };
        viewport.clamp();
        viewport
    }

    /// Pull scales into `[MIN_SCALE, MAX_SCALE]` and offsets into the visible area
    pub fn clamp(&mut self) {
        self.x_scale = clamp_scale(self.x_scale);
        self.y_scale = clamp_scale(self.y_scale);
        self.x_offset = clamp_offset(self.x_offset, self.x_scale);
        self.y_offset = clamp_offset(self.y_offset, self.y_scale);
    }

    /// Convert a widget-space position to timeline space
    pub fn to_timeline(&self, x: f64, y: f64) -> (f64, f64) {
        (x / self.x_scale + self.x_offset, y / self.y_scale + self.y_offset)
    }

    /// Convert a timeline-space position to widget space
    pub fn to_widget(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.x_offset) * self.x_scale, (y - self.y_offset) * self.y_scale)
    }

    /// Zoom horizontally by `factor`, keeping the timeline position under
    /// `anchor_x` (widget space) fixed on screen
    pub fn zoom_at(&mut self, anchor_x: f64, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let (anchor_time, _) = self.to_timeline(anchor_x, 0.0);
        self.x_scale = clamp_scale(self.x_scale * factor);
        self.x_offset = clamp_offset(anchor_time - anchor_x / self.x_scale, self.x_scale);
    }

    /// Pan by a widget-space delta
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.x_offset = clamp_offset(self.x_offset + dx / self.x_scale, self.x_scale);
        self.y_offset = clamp_offset(self.y_offset + dy / self.y_scale, self.y_scale);
    }

    /// Visible horizontal range in timeline space
    pub fn visible_x_range(&self) -> (f64, f64) {
        (self.x_offset, self.x_offset + 1.0 / self.x_scale)
    }
}

fn clamp_scale(scale: f64) -> f64 {
    if scale.is_finite() {
        scale.clamp(MIN_SCALE, MAX_SCALE)
    } else {
        MIN_SCALE
    }
}

fn clamp_offset(offset: f64, scale: f64) -> f64 {
    let max_offset = (1.0 - 1.0 / scale).max(0.0);
    if offset.is_finite() {
        offset.clamp(0.0, max_offset)
    } else {
        0.0
    }
}
