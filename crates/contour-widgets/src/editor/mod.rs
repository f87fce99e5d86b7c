//! Editor widgets built on the shared timeline/drag core
//!
//! Every editor owns one or more [`TimelineEditor`]s, each pairing a
//! [`PointTimeline`] with its [`DragSession`]. The skins only differ in their
//! [`EditProfile`] and in how they present points to the caller:
//!
//! - [`ControlLineEditor`]: several named value curves
//! - [`BeatGridEditor`]: a tempo map of beat lines, time-only drags
//! - [`TimeLineMarkers`]: bare time markers with horizontal hit testing

mod beat_grid;
mod control_line;
mod time_line;

pub use beat_grid::{BeatGridEditor, BeatLine, DEFAULT_BEATS_PER_BAR};
pub use control_line::{ControlLine, ControlLineEditor, CURVE_COLORS};
pub use time_line::TimeLineMarkers;

use contour_core::config::EditorConfig;
use contour_core::frame::FrameInfo;
use contour_core::{TimelinePoint, Viewport};

use crate::client::FrameClient;
use crate::drag::{DragSession, DragState, EditProfile, Response};
use crate::pointer::{CursorHint, PointerInput, Surface};
use crate::timeline::PointTimeline;

/// Called once per finished edit with the full point list
pub type CommitCallback = Box<dyn FnMut(&[TimelinePoint])>;

/// A pointer event routed through an editor
#[derive(Debug, Clone, Copy)]
pub(crate) enum PointerEvent<'a> {
    Down(&'a PointerInput),
    Move(&'a PointerInput),
    Up(&'a PointerInput),
    Leave,
}

/// One editable curve and its gesture state
pub struct TimelineEditor {
    timeline: PointTimeline,
    session: DragSession,
    surface: Surface,
    on_commit: Option<CommitCallback>,
}

impl TimelineEditor {
    pub fn new(config: &EditorConfig, profile: EditProfile) -> Self {
        Self {
            timeline: PointTimeline::new(config),
            session: DragSession::new(profile),
            surface: Surface::default(),
            on_commit: None,
        }
    }

    pub fn control_line(config: &EditorConfig) -> Self {
        Self::new(config, EditProfile::control_line(config))
    }

    pub fn timeline(&self) -> &PointTimeline {
        &self.timeline
    }

    pub fn timeline_mut(&mut self) -> &mut PointTimeline {
        &mut self.timeline
    }

    pub fn session(&self) -> &DragSession {
        &self.session
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn set_surface(&mut self, surface: Surface) {
        self.surface = surface;
    }

    /// Widget size in pixels
    pub fn resize(&mut self, width: f64, height: f64) {
        self.surface.width = width;
        self.surface.height = height;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.surface.viewport = viewport;
    }

    pub fn set_on_commit(&mut self, callback: impl FnMut(&[TimelinePoint]) + 'static) {
        self.on_commit = Some(Box::new(callback));
    }

    pub fn cursor(&self) -> CursorHint {
        self.session.cursor()
    }

    pub fn on_pointer_down(&mut self, input: &PointerInput) -> bool {
        self.dispatch(PointerEvent::Down(input))
    }

    pub fn on_pointer_move(&mut self, input: &PointerInput) -> bool {
        self.dispatch(PointerEvent::Move(input))
    }

    pub fn on_pointer_up(&mut self, input: &PointerInput) -> bool {
        self.dispatch(PointerEvent::Up(input))
    }

    pub fn on_pointer_leave(&mut self) -> bool {
        self.dispatch(PointerEvent::Leave)
    }

    /// Host click event; claims it when the pointer is over a point or segment
    ///
    /// Double-click deletion is decided on release, so this only tells the
    /// host not to treat the click as a seek or zoom.
    pub fn on_pointer_click(&mut self, _input: &PointerInput) -> bool {
        !matches!(self.session.state(), DragState::Idle)
    }

    fn dispatch(&mut self, event: PointerEvent<'_>) -> bool {
        let response = self.handle(event);
        if response.committed {
            if let Some(callback) = self.on_commit.as_mut() {
                callback(self.timeline.points());
            }
        }
        response.consumed
    }

    /// Run an event through the drag session without firing the commit callback
    pub(crate) fn handle(&mut self, event: PointerEvent<'_>) -> Response {
        let Self {
            timeline,
            session,
            surface,
            ..
        } = self;
        match event {
            PointerEvent::Down(input) => session.pointer_down(timeline, surface, input),
            PointerEvent::Move(input) => session.pointer_move(timeline, surface, input),
            PointerEvent::Up(input) => session.pointer_up(timeline, surface, input),
            PointerEvent::Leave => session.pointer_leave(timeline),
        }
    }
}

impl FrameClient for TimelineEditor {
    fn on_frame(&mut self, _frame: &FrameInfo) {
        self.timeline.refresh();
    }

    fn needs_frame(&self) -> bool {
        self.timeline.points_invalidated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    fn editor() -> TimelineEditor {
        let mut editor = TimelineEditor::control_line(&EditorConfig::default());
        editor.resize(1000.0, 100.0);
        editor.timeline_mut().set_points(
            vec![TimelinePoint::new(0.0, 0.7), TimelinePoint::new(10.0, 0.7)],
            0.0,
            1.0,
            1.0,
            0.0,
        );
        editor
    }

    #[test]
    fn test_commit_fires_once_per_gesture() {
        let mut editor = editor();
        let commits: Rc<RefCell<Vec<Vec<TimelinePoint>>>> = Rc::default();
        let sink = commits.clone();
        editor.set_on_commit(move |points| sink.borrow_mut().push(points.to_vec()));

        let t0 = Instant::now();
        let at = |y: f64, ms: u64| PointerInput::new(0.5, y, t0 + Duration::from_millis(ms));

        assert!(editor.on_pointer_down(&at(0.7, 0)));
        for (i, y) in [0.72, 0.76, 0.8, 0.85, 0.9].into_iter().enumerate() {
            assert!(editor.on_pointer_move(&at(y, 10 + i as u64)));
        }
        assert!(commits.borrow().is_empty(), "No commit while dragging");

        editor.on_pointer_up(&at(0.9, 100));
        let commits = commits.borrow();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].len(), 3);
        assert!((commits[0][1].value - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_no_commit_without_change() {
        let mut editor = editor();
        let count = Rc::new(RefCell::new(0));
        let sink = count.clone();
        editor.set_on_commit(move |_| *sink.borrow_mut() += 1);

        let input = PointerInput::new(0.0, 0.7, Instant::now());
        editor.on_pointer_down(&input);
        editor.on_pointer_move(&input);
        editor.on_pointer_up(&input);
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn test_frame_refresh_clears_dirty_flag() {
        let mut editor = editor();
        assert!(editor.needs_frame());

        let frame = FrameInfo {
            frame: 1,
            now: Instant::now(),
            delta: Duration::ZERO,
        };
        editor.on_frame(&frame);
        assert!(!editor.needs_frame());
        assert_eq!(editor.timeline().vertices().len(), 3);
    }

    #[test]
    fn test_click_claimed_over_targets_only() {
        let mut editor = editor();
        let over = PointerInput::new(0.5, 0.7, Instant::now());
        editor.on_pointer_move(&over);
        assert!(editor.on_pointer_click(&over));

        let away = PointerInput::new(0.5, 0.1, Instant::now());
        editor.on_pointer_move(&away);
        assert!(!editor.on_pointer_click(&away));
        assert_eq!(editor.cursor(), CursorHint::None);
    }
}
