//! Beat-grid (tempo map) editor
//!
//! Each beat line is a point whose time is the line position and whose value
//! is its beat number, so the plotted curve is the tempo map. Lines only move
//! in time; Ctrl+press on a segment inserts a line with an interpolated beat
//! number, double-clicking an interior line removes it.

use contour_core::config::EditorConfig;
use contour_core::frame::FrameInfo;
use contour_core::{TimelinePoint, Viewport};

use super::TimelineEditor;
use crate::client::FrameClient;
use crate::drag::EditProfile;
use crate::pointer::{CursorHint, PointerInput};

pub const DEFAULT_BEATS_PER_BAR: u32 = 4;

/// A beat line at `time` seconds carrying beat number `beat_nr` (1-based)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatLine {
    pub time: f64,
    pub beat_nr: f64,
}

impl BeatLine {
    pub const fn new(time: f64, beat_nr: f64) -> Self {
        Self { time, beat_nr }
    }
}

pub type BeatCommitCallback = Box<dyn FnMut(&[BeatLine])>;

pub struct BeatGridEditor {
    editor: TimelineEditor,
    time_per_beat: f64,
    beats_per_bar: u32,
    on_commit: Option<BeatCommitCallback>,
}

impl BeatGridEditor {
    /// Create an editor with a five-beat grid at one beat per second
    pub fn new(config: &EditorConfig) -> Self {
        let mut grid = Self {
            editor: TimelineEditor::new(config, EditProfile::beat_grid(config)),
            time_per_beat: 1.0,
            beats_per_bar: DEFAULT_BEATS_PER_BAR,
            on_commit: None,
        };
        let lines: Vec<BeatLine> = (0..5).map(|i| BeatLine::new(i as f64, i as f64 + 1.0)).collect();
        grid.update_grid(&lines, 1.0, config.validated_duration());
        grid
    }

    /// Replace the grid
    pub fn update_grid(&mut self, lines: &[BeatLine], time_per_beat: f64, duration: f64) {
        if time_per_beat.is_finite() && time_per_beat > 0.0 {
            self.time_per_beat = time_per_beat;
        }

        let points: Vec<TimelinePoint> = lines
            .iter()
            .map(|line| TimelinePoint::new(line.time, line.beat_nr))
            .collect();
        let (first, last) = beat_span(lines);

        let timeline = self.editor.timeline_mut();
        timeline.set_duration(duration);
        timeline.set_points(points, first, last, first, 0.0);

        log::debug!(
            "BeatGridEditor::update_grid: {} lines, {:.3}s per beat",
            lines.len(),
            self.time_per_beat
        );
    }

    pub fn lines(&self) -> Vec<BeatLine> {
        self.editor
            .timeline()
            .points()
            .iter()
            .map(|p| BeatLine::new(p.time, p.value))
            .collect()
    }

    pub fn editor(&self) -> &TimelineEditor {
        &self.editor
    }

    pub fn time_per_beat(&self) -> f64 {
        self.time_per_beat
    }

    pub fn beats_per_bar(&self) -> u32 {
        self.beats_per_bar
    }

    pub fn set_beats_per_bar(&mut self, beats_per_bar: u32) {
        self.beats_per_bar = beats_per_bar.max(1);
    }

    /// True for whole beat numbers that start a bar (beat 1, 5, 9, ... in 4/4)
    pub fn is_bar_start(&self, beat_nr: f64) -> bool {
        if beat_nr.fract() != 0.0 {
            return false;
        }
        (beat_nr as i64 - 1).rem_euclid(self.beats_per_bar as i64) == 0
    }

    /// Beat number at `time`, following the grid and extrapolating with
    /// `time_per_beat` outside it
    pub fn beat_at(&self, time: f64) -> f64 {
        let points = self.editor.timeline().points();
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return time / self.time_per_beat + 1.0;
        };

        if time <= first.time {
            return first.value - (first.time - time) / self.time_per_beat;
        }
        if time >= last.time {
            return last.value + (time - last.time) / self.time_per_beat;
        }

        let next = points.partition_point(|p| p.time <= time);
        let (a, b) = (points[next - 1], points[next]);
        if b.time == a.time {
            return a.value;
        }
        a.lerp(&b, (time - a.time) / (b.time - a.time)).value
    }

    /// Time of beat number `beat_nr`; inverse of [`beat_at`](Self::beat_at)
    /// for a grid with increasing beat numbers
    pub fn time_of_beat(&self, beat_nr: f64) -> f64 {
        let points = self.editor.timeline().points();
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return (beat_nr - 1.0) * self.time_per_beat;
        };

        if beat_nr <= first.value {
            return first.time - (first.value - beat_nr) * self.time_per_beat;
        }
        if beat_nr >= last.value {
            return last.time + (beat_nr - last.value) * self.time_per_beat;
        }

        let next = points.partition_point(|p| p.value <= beat_nr);
        let (a, b) = (points[next - 1], points[next]);
        if b.value == a.value {
            return a.time;
        }
        a.time + (b.time - a.time) * (beat_nr - a.value) / (b.value - a.value)
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.editor.resize(width, height);
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.editor.set_viewport(viewport);
    }

    pub fn set_on_commit(&mut self, callback: impl FnMut(&[BeatLine]) + 'static) {
        self.on_commit = Some(Box::new(callback));
    }

    pub fn cursor(&self) -> CursorHint {
        self.editor.cursor()
    }

    pub fn on_pointer_down(&mut self, input: &PointerInput) -> bool {
        self.dispatch(super::PointerEvent::Down(input))
    }

    pub fn on_pointer_move(&mut self, input: &PointerInput) -> bool {
        self.dispatch(super::PointerEvent::Move(input))
    }

    pub fn on_pointer_up(&mut self, input: &PointerInput) -> bool {
        self.dispatch(super::PointerEvent::Up(input))
    }

    pub fn on_pointer_leave(&mut self) -> bool {
        self.dispatch(super::PointerEvent::Leave)
    }

    pub fn on_pointer_click(&mut self, input: &PointerInput) -> bool {
        self.editor.on_pointer_click(input)
    }

    fn dispatch(&mut self, event: super::PointerEvent<'_>) -> bool {
        let response = self.editor.handle(event);
        if response.committed {
            let lines = self.lines();
            if let Some(callback) = self.on_commit.as_mut() {
                callback(&lines);
            }
        }
        response.consumed
    }
}

impl FrameClient for BeatGridEditor {
    fn on_frame(&mut self, frame: &FrameInfo) {
        self.editor.on_frame(frame);
    }

    fn needs_frame(&self) -> bool {
        self.editor.needs_frame()
    }
}

fn beat_span(lines: &[BeatLine]) -> (f64, f64) {
    let mut span: Option<(f64, f64)> = None;
    for line in lines.iter().filter(|l| l.beat_nr.is_finite()) {
        span = Some(match span {
            Some((lo, hi)) => (lo.min(line.beat_nr), hi.max(line.beat_nr)),
            None => (line.beat_nr, line.beat_nr),
        });
    }
    span.unwrap_or((1.0, 1.0))
}
