//! Draggable time markers (cue points, region edges)
//!
//! Markers have no value axis, so hit testing only looks at the horizontal
//! pixel distance. A drag keeps the marker order and stays inside
//! `[0, duration]`.

use contour_core::config::EditorConfig;
use contour_core::frame::FrameInfo;
use contour_core::Viewport;

use crate::client::FrameClient;
use crate::hit_test::hit_time_only;
use crate::pointer::{CursorHint, PointerInput, Surface};

pub type TimeChangedCallback = Box<dyn FnMut(usize, f64)>;

#[derive(Debug, Clone, Copy)]
struct MarkerDrag {
    index: usize,
    down_x: f64,
    down_time: f64,
    min_time: f64,
    max_time: f64,
    changed: bool,
}

pub struct TimeLineMarkers {
    times: Vec<f64>,
    duration: f64,
    radius: f64,
    surface: Surface,
    hovered: Option<usize>,
    drag: Option<MarkerDrag>,
    cursor: CursorHint,
    invalidated: bool,
    positions: Vec<f32>,
    on_time_changed: Option<TimeChangedCallback>,
}

impl TimeLineMarkers {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            times: Vec::new(),
            duration: config.validated_duration(),
            radius: config.point_capture_radius,
            surface: Surface::default(),
            hovered: None,
            drag: None,
            cursor: CursorHint::None,
            invalidated: true,
            positions: Vec::new(),
            on_time_changed: None,
        }
    }

    /// Replace all markers; times are sorted and clamped into `[0, duration]`
    pub fn set_markers(&mut self, times: &[f64], duration: f64) {
        if duration.is_finite() && duration > 0.0 {
            self.duration = duration;
        }
        let mut times: Vec<f64> = times
            .iter()
            .filter(|t| t.is_finite())
            .map(|t| t.clamp(0.0, self.duration))
            .collect();
        times.sort_by(f64::total_cmp);

        self.times = times;
        self.hovered = None;
        self.drag = None;
        self.invalidated = true;
    }

    pub fn markers(&self) -> &[f64] {
        &self.times
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn cursor(&self) -> CursorHint {
        self.cursor
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.surface.width = width;
        self.surface.height = height;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.surface.viewport = viewport;
    }

    /// Called with the marker index and its new time after a drag that moved it
    pub fn set_on_time_changed(&mut self, callback: impl FnMut(usize, f64) + 'static) {
        self.on_time_changed = Some(Box::new(callback));
    }

    /// Marker positions in render space (`[-1, 1]`), rebuilt per frame
    pub fn render_positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn on_pointer_move(&mut self, input: &PointerInput) -> bool {
        if self.drag.is_none() {
            return self.hover(input).is_some();
        }

        let (x, _) = self.surface.to_timeline(input);
        let Some(drag) = self.drag.as_mut() else {
            return true;
        };
        let time = (drag.down_time + (x - drag.down_x) * self.duration).clamp(drag.min_time, drag.max_time);
        if let Some(marker) = self.times.get_mut(drag.index) {
            if *marker != time {
                *marker = time;
                drag.changed = true;
                self.invalidated = true;
            }
        }
        true
    }

    pub fn on_pointer_down(&mut self, input: &PointerInput) -> bool {
        self.drag = None;
        let Some(index) = self.hover(input) else {
            return false;
        };

        let min_time = index.checked_sub(1).and_then(|i| self.times.get(i)).copied().unwrap_or(0.0);
        let max_time = self.times.get(index + 1).copied().unwrap_or(self.duration);
        self.drag = Some(MarkerDrag {
            index,
            down_x: self.surface.to_timeline(input).0,
            down_time: self.times[index],
            min_time,
            max_time: max_time.max(min_time),
            changed: false,
        });
        true
    }

    pub fn on_pointer_up(&mut self, input: &PointerInput) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        self.commit(&drag);
        self.hover(input);
        true
    }

    pub fn on_pointer_leave(&mut self) -> bool {
        let drag = self.drag.take();
        if let Some(drag) = &drag {
            self.commit(drag);
        }
        self.hovered = None;
        self.cursor = CursorHint::None;
        drag.is_some()
    }

    fn commit(&mut self, drag: &MarkerDrag) {
        if !drag.changed {
            return;
        }
        let Some(&time) = self.times.get(drag.index) else {
            return;
        };
        log::debug!("TimeLineMarkers::commit: marker {} -> {:.3}s", drag.index, time);
        if let Some(callback) = self.on_time_changed.as_mut() {
            callback(drag.index, time);
        }
    }

    fn hover(&mut self, input: &PointerInput) -> Option<usize> {
        let duration = self.duration;
        let hit = hit_time_only(
            self.times.iter().map(|t| t / duration),
            &self.surface,
            input.x,
            self.radius,
        );
        self.hovered = hit;
        self.cursor = if hit.is_some() {
            CursorHint::ResizeHorizontal
        } else {
            CursorHint::None
        };
        hit
    }
}

impl FrameClient for TimeLineMarkers {
    fn on_frame(&mut self, _frame: &FrameInfo) {
        if !std::mem::take(&mut self.invalidated) {
            return;
        }
        let duration = self.duration;
        self.positions.clear();
        self.positions
            .extend(self.times.iter().map(|t| ((t / duration) * 2.0 - 1.0) as f32));
    }

    fn needs_frame(&self) -> bool {
        self.invalidated
    }
}
