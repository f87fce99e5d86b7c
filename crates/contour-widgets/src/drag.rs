//! Pointer gesture state machine
//!
//! ```text
//!  Idle ──move──▶ Hover ──down──▶ Armed ──move──▶ Dragging
//!    ▲                              │                 │
//!    └──────────── up / leave ──────┴─────────────────┘
//! ```
//!
//! A press on a point arms a point drag. A press on a segment either inserts
//! a point and arms a drag on it, or arms a tilt that moves both endpoint
//! values, depending on the editor's [`LineGestureRule`] and the modifiers
//! held. Releasing while still armed is a click; two clicks on the same
//! interior point within the double-click window delete it.
//!
//! Intermediate drag moves only touch the timeline. The owner is told about
//! the edit once, through [`Response::committed`] on release.

use contour_core::config::EditorConfig;
use std::time::{Duration, Instant};

use crate::hit_test::{HitResult, HitTester, LineHit};
use crate::pointer::{CursorHint, Modifiers, PointerInput, Surface};
use crate::snap::ValueSnap;
use crate::timeline::{Highlight, LineHighlight, LineHint, PointRef, PointTimeline};

// =============================================================================
// Editor profiles
// =============================================================================

/// What a press on a segment does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineGesture {
    /// Insert a point on the segment and drag it
    Insert,
    /// Move both endpoint values together
    Tilt,
}

/// Maps modifier keys to a segment gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineGestureRule {
    /// Plain press inserts, Ctrl+press tilts (control lines)
    InsertOrCtrlTilt,
    /// Only Ctrl+press inserts (beat grids)
    CtrlInsert,
    /// Segments are inert
    Disabled,
}

impl LineGestureRule {
    pub fn gesture(self, modifiers: Modifiers) -> Option<LineGesture> {
        match self {
            LineGestureRule::InsertOrCtrlTilt if modifiers.ctrl => Some(LineGesture::Tilt),
            LineGestureRule::InsertOrCtrlTilt => Some(LineGesture::Insert),
            LineGestureRule::CtrlInsert if modifiers.ctrl => Some(LineGesture::Insert),
            LineGestureRule::CtrlInsert | LineGestureRule::Disabled => None,
        }
    }
}

impl LineGesture {
    pub fn cursor(self) -> CursorHint {
        match self {
            LineGesture::Insert => CursorHint::Copy,
            LineGesture::Tilt => CursorHint::ResizeVertical,
        }
    }
}

/// Per-editor tuning of the shared gesture logic
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditProfile {
    /// Capture radius in pixels
    pub capture_radius: f64,
    pub line_rule: LineGestureRule,
    /// Drags move time only
    pub values_locked: bool,
    pub double_click_window: Duration,
}

impl EditProfile {
    pub fn control_line(config: &EditorConfig) -> Self {
        Self {
            capture_radius: config.point_capture_radius,
            line_rule: LineGestureRule::InsertOrCtrlTilt,
            values_locked: false,
            double_click_window: config.double_click_window(),
        }
    }

    pub fn beat_grid(config: &EditorConfig) -> Self {
        Self {
            capture_radius: config.beat_grid_capture_radius,
            line_rule: LineGestureRule::CtrlInsert,
            values_locked: true,
            double_click_window: config.double_click_window(),
        }
    }

    fn gesture(&self, modifiers: Modifiers) -> Option<LineGesture> {
        match self.line_rule.gesture(modifiers) {
            Some(LineGesture::Tilt) if self.values_locked => None,
            gesture => gesture,
        }
    }
}

// =============================================================================
// Double-click tracking
// =============================================================================

/// Remembers the last click to detect a second one on the same target
#[derive(Debug, Clone)]
pub struct ClickTracker {
    window: Duration,
    last: Option<(usize, Instant)>,
}

impl ClickTracker {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Record a click on `target`; true if it completes a double-click
    pub fn register(&mut self, target: usize, at: Instant) -> bool {
        let is_double = matches!(
            self.last,
            Some((last_target, last_at))
                if last_target == target && at.saturating_duration_since(last_at) < self.window
        );
        self.last = if is_double { None } else { Some((target, at)) };
        is_double
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

// =============================================================================
// Session
// =============================================================================

/// Target of an armed or running drag, by real point index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    Point(usize),
    /// Segment from the first index to the second (equal at a boundary point)
    Tilt(usize, usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragState {
    Idle,
    Hover(HitResult),
    Armed(DragTarget),
    Dragging(DragTarget),
}

/// Outcome of one pointer event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Response {
    /// The gesture belongs to the editor; the host should not pan/zoom
    pub consumed: bool,
    /// The edit is finished and changed the timeline
    pub committed: bool,
}

impl Response {
    fn consumed(consumed: bool) -> Self {
        Self {
            consumed,
            committed: false,
        }
    }
}

#[derive(Debug, Clone)]
struct PointGrab {
    index: usize,
    down: (f64, f64),
    down_time: f64,
    down_value: f64,
    min_time: f64,
    max_time: f64,
    time_locked: bool,
    snap: ValueSnap,
    /// The press created this point
    inserted: bool,
}

#[derive(Debug, Clone)]
struct TiltGrab {
    first: usize,
    second: usize,
    segment: usize,
    down_y: f64,
    down_first: f64,
    down_second: f64,
}

#[derive(Debug, Clone)]
enum Grab {
    Point(PointGrab),
    Tilt(TiltGrab),
}

impl Grab {
    fn target(&self) -> DragTarget {
        match self {
            Grab::Point(grab) => DragTarget::Point(grab.index),
            Grab::Tilt(grab) => DragTarget::Tilt(grab.first, grab.second),
        }
    }
}

/// Gesture state for one timeline
#[derive(Debug, Clone)]
pub struct DragSession {
    profile: EditProfile,
    tester: HitTester,
    state: DragState,
    grab: Option<Grab>,
    changed: bool,
    clicks: ClickTracker,
    cursor: CursorHint,
}

impl DragSession {
    pub fn new(profile: EditProfile) -> Self {
        Self {
            profile,
            tester: HitTester::new(profile.capture_radius),
            state: DragState::Idle,
            grab: None,
            changed: false,
            clicks: ClickTracker::new(profile.double_click_window),
            cursor: CursorHint::None,
        }
    }

    pub fn profile(&self) -> &EditProfile {
        &self.profile
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn cursor(&self) -> CursorHint {
        self.cursor
    }

    /// A press is held on a point or segment
    pub fn is_grabbing(&self) -> bool {
        self.grab.is_some()
    }

    /// Pointer is over something editable other than the first point
    pub fn wants_focus(&self) -> bool {
        match &self.state {
            DragState::Idle => false,
            DragState::Hover(HitResult::Point { at, .. }) => *at != PointRef::Point(0),
            DragState::Hover(hit) => hit.is_hit(),
            DragState::Armed(_) | DragState::Dragging(_) => true,
        }
    }

    pub fn pointer_move(
        &mut self,
        timeline: &mut PointTimeline,
        surface: &Surface,
        input: &PointerInput,
    ) -> Response {
        if self.grab.is_none() {
            return Response::consumed(self.hover(timeline, surface, input).is_hit());
        }

        let (x, y) = surface.to_timeline(input);
        match &mut self.grab {
            None => {}
            Some(Grab::Point(grab)) => {
                let dx = if grab.time_locked { 0.0 } else { grab.down.0 - x };
                let dy = grab.down.1 - y;

                let time = (grab.down_time - dx * timeline.duration()).clamp(grab.min_time, grab.max_time);
                self.changed |= timeline.update_time(grab.index, time);

                if !self.profile.values_locked {
                    let value = timeline.clamp_value(grab.down_value - dy * timeline.value_range());
                    self.changed |= timeline.update_value(grab.index, grab.snap.snap(value));
                }
            }
            Some(Grab::Tilt(grab)) => {
                // Each end clamps on its own; the pair can lose its offset at the bounds
                let dy = grab.down_y - y;
                let first = timeline.clamp_value(grab.down_first - dy * timeline.value_range());
                let second = timeline.clamp_value(grab.down_second - dy * timeline.value_range());
                self.changed |= timeline.update_value(grab.first, first);
                if grab.second != grab.first {
                    self.changed |= timeline.update_value(grab.second, second);
                }
                timeline.set_highlight(tilt_highlight(grab.segment));
            }
        }

        if let Some(grab) = &self.grab {
            self.state = DragState::Dragging(grab.target());
        }
        Response::consumed(true)
    }

    pub fn pointer_down(
        &mut self,
        timeline: &mut PointTimeline,
        surface: &Surface,
        input: &PointerInput,
    ) -> Response {
        self.grab = None;
        self.changed = false;

        match self.hover(timeline, surface, input) {
            HitResult::Nothing => {
                self.clicks.reset();
                Response::consumed(false)
            }
            HitResult::Point { at, .. } => {
                let index = timeline.real_index(at);
                self.arm_point(timeline, surface, input, index, false);
                Response::consumed(true)
            }
            HitResult::Line(line) => match self.profile.gesture(input.modifiers) {
                Some(LineGesture::Insert) => self.insert_on_line(timeline, surface, input, &line),
                Some(LineGesture::Tilt) => {
                    self.arm_tilt(timeline, surface, input, &line);
                    Response::consumed(true)
                }
                None => Response::consumed(false),
            },
        }
    }

    pub fn pointer_up(
        &mut self,
        timeline: &mut PointTimeline,
        surface: &Surface,
        input: &PointerInput,
    ) -> Response {
        let Some(grab) = self.grab.take() else {
            return Response::consumed(false);
        };

        let clicked = matches!(self.state, DragState::Armed(_));
        match &grab {
            Grab::Point(grab) if clicked && !grab.inserted => {
                if self.clicks.register(grab.index, input.at) && timeline.delete(grab.index) {
                    self.changed = true;
                }
            }
            _ => self.clicks.reset(),
        }

        let committed = std::mem::take(&mut self.changed);
        if committed {
            log::debug!("DragSession::pointer_up: committed {} points", timeline.len());
        }
        self.hover(timeline, surface, input);
        Response {
            consumed: true,
            committed,
        }
    }

    /// Leaving the widget ends any drag like a release, without counting a click
    pub fn pointer_leave(&mut self, timeline: &mut PointTimeline) -> Response {
        let grabbed = self.grab.take().is_some();
        let committed = std::mem::take(&mut self.changed);

        self.state = DragState::Idle;
        self.cursor = CursorHint::None;
        timeline.set_highlight(Highlight::none());

        Response {
            consumed: grabbed,
            committed,
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Hit test, keep only actionable hits, update hover state and feedback
    fn hover(&mut self, timeline: &mut PointTimeline, surface: &Surface, input: &PointerInput) -> HitResult {
        let hit = match self.tester.hit(timeline, surface, input.x, input.y) {
            HitResult::Line(line) => match self.profile.gesture(input.modifiers) {
                Some(LineGesture::Insert) if !can_insert(timeline, line.from) => HitResult::Nothing,
                Some(_) => HitResult::Line(line),
                None => HitResult::Nothing,
            },
            hit => hit,
        };

        let (highlight, cursor) = match hit {
            HitResult::Nothing => (Highlight::none(), CursorHint::None),
            HitResult::Point { view_index, .. } => (Highlight::point(view_index), CursorHint::Move),
            HitResult::Line(line) => {
                let gesture = self.profile.gesture(input.modifiers).unwrap_or(LineGesture::Insert);
                (line_highlight(&line, gesture), gesture.cursor())
            }
        };

        timeline.set_highlight(highlight);
        self.cursor = cursor;
        self.state = if hit.is_hit() {
            DragState::Hover(hit)
        } else {
            DragState::Idle
        };
        hit
    }

    fn arm_point(
        &mut self,
        timeline: &mut PointTimeline,
        surface: &Surface,
        input: &PointerInput,
        index: usize,
        inserted: bool,
    ) {
        let points = timeline.points();
        let Some(point) = points.get(index).copied() else {
            return;
        };

        let mut anchors = vec![timeline.default_value()];
        if let Some(prev) = index.checked_sub(1).and_then(|i| points.get(i)) {
            anchors.push(prev.value);
        }
        if let Some(next) = points.get(index + 1) {
            anchors.push(next.value);
        }
        let (min_time, max_time) = timeline.time_bounds(index);

        self.grab = Some(Grab::Point(PointGrab {
            index,
            down: surface.to_timeline(input),
            down_time: point.time,
            down_value: point.value,
            min_time,
            max_time,
            time_locked: timeline.is_protected(index),
            snap: ValueSnap::new(anchors, timeline.value_snap_dist()),
            inserted,
        }));
        self.state = DragState::Armed(DragTarget::Point(index));
        self.cursor = CursorHint::Move;

        if let Some(view_index) = timeline.view_index(PointRef::Point(index)) {
            timeline.set_highlight(Highlight::point(view_index));
        }
    }

    fn insert_on_line(
        &mut self,
        timeline: &mut PointTimeline,
        surface: &Surface,
        input: &PointerInput,
        line: &LineHit,
    ) -> Response {
        let ends = {
            let mut view = timeline.view().skip(line.segment);
            (view.next(), view.next())
        };
        let (Some(a), Some(b)) = ends else {
            return Response::consumed(false);
        };
        let point = a.as_point().lerp(&b.as_point(), line.t.clamp(0.0, 1.0));

        match timeline.insert_after(line.from, point.time, point.value) {
            Some(index) => {
                self.changed = true;
                self.clicks.reset();
                self.arm_point(timeline, surface, input, index, true);
                Response::consumed(true)
            }
            None => Response::consumed(false),
        }
    }

    fn arm_tilt(&mut self, timeline: &mut PointTimeline, surface: &Surface, input: &PointerInput, line: &LineHit) {
        let Some(next) = timeline.view().nth(line.segment + 1) else {
            return;
        };
        let first = timeline.real_index(line.from);
        let second = timeline.real_index(next.at);
        let points = timeline.points();
        let (Some(a), Some(b)) = (points.get(first), points.get(second)) else {
            return;
        };

        self.grab = Some(Grab::Tilt(TiltGrab {
            first,
            second,
            segment: line.segment,
            down_y: surface.to_timeline(input).1,
            down_first: a.value,
            down_second: b.value,
        }));
        self.state = DragState::Armed(DragTarget::Tilt(first, second));
        self.cursor = CursorHint::ResizeVertical;
        timeline.set_highlight(line_highlight(line, LineGesture::Tilt));
    }
}

fn can_insert(timeline: &PointTimeline, from: PointRef) -> bool {
    match from {
        PointRef::End => false,
        PointRef::Start => true,
        PointRef::Point(i) => !(i == timeline.last_index() && timeline.has_end()),
    }
}

fn line_highlight(line: &LineHit, gesture: LineGesture) -> Highlight {
    match gesture {
        LineGesture::Insert => Highlight {
            points: Vec::new(),
            line: Some(LineHighlight {
                segment: line.segment,
                hint: LineHint::Insert(line.t),
            }),
        },
        LineGesture::Tilt => tilt_highlight(line.segment),
    }
}

fn tilt_highlight(segment: usize) -> Highlight {
    Highlight {
        points: vec![segment, segment + 1],
        line: Some(LineHighlight {
            segment,
            hint: LineHint::Tilt,
        }),
    }
}
