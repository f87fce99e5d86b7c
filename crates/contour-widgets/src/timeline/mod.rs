//! Editable time/value point sequence
//!
//! [`PointTimeline`] owns the points of one curve and enforces its invariants:
//!
//! - points stay sorted by time after every mutation
//! - values stay inside `[min_value, max_value]`
//! - there is always at least one point, and the first and last points can't
//!   be deleted
//!
//! Mutations only set a dirty flag. The flat render buffer is rebuilt by
//! [`PointTimeline::refresh`] once per frame (see `render.rs`).

mod render;

pub use render::{Highlight, LineHighlight, LineHint, PointVertex, TILT_HINT};

use contour_core::config::EditorConfig;
use contour_core::TimelinePoint;

/// Position in the derived view, which includes the optional boundary points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointRef {
    /// Synthetic point at time 0 mirroring the first real point
    Start,
    /// Real point by index
    Point(usize),
    /// Synthetic point at the full duration mirroring the last real point
    End,
}

/// A point as seen by hit testing and rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewPoint {
    pub time: f64,
    pub value: f64,
    pub at: PointRef,
}

impl ViewPoint {
    pub fn as_point(&self) -> TimelinePoint {
        TimelinePoint::new(self.time, self.value)
    }
}

/// Ordered time/value points of one curve
#[derive(Debug, Clone)]
pub struct PointTimeline {
    points: Vec<TimelinePoint>,

    min_value: f64,
    max_value: f64,
    value_range: f64,
    default_value: f64,
    time_offset: f64,
    duration: f64,

    snap_fraction: f64,
    value_snap_dist: f64,

    has_start: bool,
    has_end: bool,

    points_invalidated: bool,
    highlight: Highlight,
    vertices: Vec<PointVertex>,
    point_data_invalidated: bool,
}

impl Default for PointTimeline {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl PointTimeline {
    /// Create a timeline seeded with the default two-point curve
    pub fn new(config: &EditorConfig) -> Self {
        let mut timeline = Self {
            points: Vec::new(),
            min_value: config.min_value,
            max_value: config.max_value,
            value_range: 0.0,
            default_value: config.default_value,
            time_offset: config.time_offset,
            duration: config.validated_duration(),
            snap_fraction: config.snap_fraction,
            value_snap_dist: 0.0,
            has_start: false,
            has_end: false,
            points_invalidated: true,
            highlight: Highlight::default(),
            vertices: Vec::new(),
            point_data_invalidated: false,
        };
        timeline.set_points(
            Vec::new(),
            config.min_value,
            config.max_value,
            config.default_value,
            config.time_offset,
        );
        timeline
    }

    /// Replace all points
    ///
    /// The value range is widened to cover every supplied point. An empty list
    /// seeds `{0, default}`, `{duration, default}`.
    pub fn set_points(
        &mut self,
        points: Vec<TimelinePoint>,
        min_value: f64,
        max_value: f64,
        default_value: f64,
        time_offset: f64,
    ) {
        let supplied = points.len();
        let mut points: Vec<TimelinePoint> = points
            .into_iter()
            .filter(|p| p.time.is_finite() && p.value.is_finite())
            .collect();
        if points.len() != supplied {
            log::warn!(
                "PointTimeline::set_points: dropped {} non-finite points",
                supplied - points.len()
            );
        }
        points.sort_by(|a, b| a.time.total_cmp(&b.time));

        if points.is_empty() {
            points = vec![
                TimelinePoint::new(0.0, default_value),
                TimelinePoint::new(self.duration, default_value),
            ];
        }

        self.min_value = min_value;
        self.max_value = max_value;
        self.default_value = default_value;
        self.time_offset = time_offset;
        for point in &points {
            self.min_value = self.min_value.min(point.value);
            self.max_value = self.max_value.max(point.value);
        }
        // Inverted bounds would make every clamp panic
        if self.max_value < self.min_value {
            std::mem::swap(&mut self.min_value, &mut self.max_value);
        }
        self.value_range = self.max_value - self.min_value;
        self.value_snap_dist = self.value_range * self.snap_fraction;

        self.points = points;
        self.invalidate();
    }

    /// Attach or detach the synthetic boundary points
    ///
    /// Attaching copies the given boundary value onto the first (or last) real
    /// point once. After that the boundary mirrors the real point.
    pub fn set_range(&mut self, start: Option<f64>, end: Option<f64>) {
        self.has_start = start.is_some();
        self.has_end = end.is_some();

        if let Some(value) = start {
            let value = self.clamp_value(value);
            if let Some(first) = self.points.first_mut() {
                first.value = value;
            }
        }
        if let Some(value) = end {
            let value = self.clamp_value(value);
            if let Some(last) = self.points.last_mut() {
                last.value = value;
            }
        }
        self.invalidate();
    }

    pub fn set_duration(&mut self, duration: f64) {
        if duration.is_finite() && duration > 0.0 && duration != self.duration {
            self.duration = duration;
            self.invalidate();
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn points(&self) -> &[TimelinePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; an empty timeline is reseeded
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    pub fn value_range(&self) -> f64 {
        self.value_range
    }

    pub fn default_value(&self) -> f64 {
        self.default_value
    }

    pub fn time_offset(&self) -> f64 {
        self.time_offset
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn value_snap_dist(&self) -> f64 {
        self.value_snap_dist
    }

    pub fn has_start(&self) -> bool {
        self.has_start
    }

    pub fn has_end(&self) -> bool {
        self.has_end
    }

    /// True if `index` is the first or last real point
    pub fn is_protected(&self, index: usize) -> bool {
        index == 0 || index == self.last_index()
    }

    // =========================================================================
    // Derived view
    // =========================================================================

    /// Points in draw order, boundary points included
    pub fn view(&self) -> impl Iterator<Item = ViewPoint> + '_ {
        let start = self
            .points
            .first()
            .filter(|_| self.has_start)
            .map(|first| ViewPoint {
                time: 0.0,
                value: first.value,
                at: PointRef::Start,
            });
        let end = self
            .points
            .last()
            .filter(|_| self.has_end)
            .map(|last| ViewPoint {
                time: self.duration,
                value: last.value,
                at: PointRef::End,
            });
        let real = self.points.iter().enumerate().map(|(i, p)| ViewPoint {
            time: p.time,
            value: p.value,
            at: PointRef::Point(i),
        });

        start.into_iter().chain(real).chain(end)
    }

    /// Number of points in [`view`](Self::view)
    pub fn view_len(&self) -> usize {
        self.points.len() + usize::from(self.has_start) + usize::from(self.has_end)
    }

    /// View index of a point reference
    pub fn view_index(&self, at: PointRef) -> Option<usize> {
        let start = usize::from(self.has_start);
        match at {
            PointRef::Start if self.has_start => Some(0),
            PointRef::Point(i) if i < self.points.len() => Some(start + i),
            PointRef::End if self.has_end => Some(start + self.points.len()),
            _ => None,
        }
    }

    /// Real point a view entry stands for; boundary points map to the point they mirror
    pub fn real_index(&self, at: PointRef) -> usize {
        match at {
            PointRef::Start => 0,
            PointRef::Point(i) => i.min(self.last_index()),
            PointRef::End => self.last_index(),
        }
    }

    /// Timeline-space x in `[0, 1]` for a time
    pub fn normalize_time(&self, time: f64) -> f64 {
        (time + self.time_offset) / self.duration
    }

    /// Timeline-space y in `[0, 1]` for a value; 0 for a zero value range
    pub fn normalize_value(&self, value: f64) -> f64 {
        if self.value_range > 0.0 {
            (value - self.min_value) / self.value_range
        } else {
            0.0
        }
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Insert a point on the segment that starts at `after`
    ///
    /// The time is clamped between the segment's real neighbours and the
    /// value into the value range. Returns the new point's index, or `None`
    /// for the segment leading into the end marker.
    pub fn insert_after(&mut self, after: PointRef, time: f64, value: f64) -> Option<usize> {
        let index = match after {
            PointRef::End => return None,
            PointRef::Start => 0,
            PointRef::Point(i) if i >= self.points.len() => return None,
            PointRef::Point(i) if i == self.last_index() && self.has_end => return None,
            PointRef::Point(i) => i + 1,
        };

        let (min_time, max_time) = self.insert_bounds(index);
        let time = if time.is_finite() { time } else { min_time };
        let point = TimelinePoint::new(time.clamp(min_time, max_time), self.clamp_value(value));
        self.points.insert(index, point);
        self.invalidate();

        log::debug!(
            "PointTimeline::insert_after: {:?} -> index {} at {:.3}s = {:.3}",
            after,
            index,
            point.time,
            point.value
        );
        Some(index)
    }

    /// Remove an interior point; the first and last points are protected
    pub fn delete(&mut self, index: usize) -> bool {
        if index >= self.points.len() || self.is_protected(index) {
            return false;
        }
        self.points.remove(index);
        self.invalidate();
        log::debug!("PointTimeline::delete: removed index {}", index);
        true
    }

    /// Set a point's value (clamped to the range). Returns true if it changed.
    pub fn update_value(&mut self, index: usize, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        let value = self.clamp_value(value);
        match self.points.get_mut(index) {
            Some(point) if point.value != value => {
                point.value = value;
                self.invalidate();
                true
            }
            _ => false,
        }
    }

    /// Set a point's time (clamped between its neighbours). Returns true if it changed.
    pub fn update_time(&mut self, index: usize, time: f64) -> bool {
        if index >= self.points.len() || !time.is_finite() {
            return false;
        }
        let (min_time, max_time) = self.time_bounds(index);
        let time = time.clamp(min_time, max_time);
        let point = &mut self.points[index];
        if point.time == time {
            return false;
        }
        point.time = time;
        self.invalidate();
        true
    }

    /// Legal time interval for an existing point
    pub fn time_bounds(&self, index: usize) -> (f64, f64) {
        let min_time = match index.checked_sub(1).and_then(|i| self.points.get(i)) {
            Some(prev) => prev.time,
            None => 0.0,
        };
        let max_time = match self.points.get(index + 1) {
            Some(next) => next.time,
            None => self.duration,
        };
        (min_time, max_time.max(min_time))
    }

    /// Legal time interval for a point inserted at `index`
    fn insert_bounds(&self, index: usize) -> (f64, f64) {
        let min_time = match index.checked_sub(1).and_then(|i| self.points.get(i)) {
            Some(prev) => prev.time,
            None => 0.0_f64.min(self.points.first().map_or(0.0, |p| p.time)),
        };
        let max_time = match self.points.get(index) {
            Some(next) => next.time,
            None => self.duration.max(min_time),
        };
        (min_time, max_time.max(min_time))
    }

    pub fn clamp_value(&self, value: f64) -> f64 {
        value.clamp(self.min_value, self.max_value)
    }

    // =========================================================================
    // Dirty tracking
    // =========================================================================

    /// True if the render buffer is stale
    pub fn points_invalidated(&self) -> bool {
        self.points_invalidated
    }

    fn invalidate(&mut self) {
        self.points_invalidated = true;
    }

    /// Update hover/drag feedback; only invalidates when it changed
    pub fn set_highlight(&mut self, highlight: Highlight) {
        if self.highlight != highlight {
            self.highlight = highlight;
            self.invalidate();
        }
    }

    pub fn highlight(&self) -> &Highlight {
        &self.highlight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline(points: &[(f64, f64)]) -> PointTimeline {
        let mut timeline = PointTimeline::default();
        timeline.set_points(
            points.iter().map(|&p| TimelinePoint::from(p)).collect(),
            0.0,
            1.0,
            1.0,
            0.0,
        );
        timeline
    }

    fn assert_sorted(timeline: &PointTimeline) {
        for pair in timeline.points().windows(2) {
            assert!(pair[0].time <= pair[1].time, "unsorted: {:?}", timeline.points());
        }
    }

    #[test]
    fn test_empty_points_seed_default_curve() {
        let timeline = timeline(&[]);
        assert_eq!(
            timeline.points(),
            &[TimelinePoint::new(0.0, 1.0), TimelinePoint::new(10.0, 1.0)]
        );
    }

    #[test]
    fn test_range_widens_to_cover_points() {
        let timeline = timeline(&[(0.0, -0.5), (5.0, 2.0)]);
        assert_eq!(timeline.min_value(), -0.5);
        assert_eq!(timeline.max_value(), 2.0);
        assert!((timeline.value_snap_dist() - 2.5 * 0.03).abs() < 1e-12);
    }

    #[test]
    fn test_set_points_sorts_input() {
        let timeline = timeline(&[(5.0, 0.2), (0.0, 0.1), (2.0, 0.3)]);
        assert_sorted(&timeline);
        assert_eq!(timeline.points()[1], TimelinePoint::new(2.0, 0.3));
    }

    #[test]
    fn test_protected_points_are_never_deleted() {
        let mut timeline = timeline(&[(0.0, 0.1), (3.0, 0.2), (6.0, 0.3), (10.0, 0.4)]);
        assert!(!timeline.delete(0));
        assert!(!timeline.delete(3));
        assert!(!timeline.delete(17));
        assert_eq!(timeline.len(), 4);

        assert!(timeline.delete(1));
        assert_eq!(timeline.len(), 3);
        assert!(!timeline.delete(2), "New last point is protected too");
    }

    #[test]
    fn test_insert_clamps_time_between_neighbours() {
        let mut timeline = timeline(&[(0.0, 0.5), (4.0, 0.5), (10.0, 0.5)]);
        let index = timeline.insert_after(PointRef::Point(0), 7.0, 2.0).unwrap();
        assert_eq!(index, 1);
        assert_eq!(timeline.points()[1], TimelinePoint::new(4.0, 1.0));
        assert_sorted(&timeline);
    }

    #[test]
    fn test_insert_next_to_end_marker_is_ignored() {
        let mut timeline = timeline(&[(1.0, 0.5), (9.0, 0.5)]);
        timeline.set_range(Some(0.5), Some(0.5));

        assert_eq!(timeline.insert_after(PointRef::End, 9.5, 0.5), None);
        assert_eq!(timeline.insert_after(PointRef::Point(1), 9.5, 0.5), None);
        assert_eq!(timeline.len(), 2);

        assert_eq!(timeline.insert_after(PointRef::Start, 0.5, 0.5), Some(0));
        assert_eq!(timeline.len(), 3);
        assert_sorted(&timeline);
    }

    #[test]
    fn test_update_reports_changes_only() {
        let mut timeline = timeline(&[(0.0, 0.5), (5.0, 0.5), (10.0, 0.5)]);
        assert!(!timeline.update_value(1, 0.5));
        assert!(timeline.update_value(1, 0.8));
        assert!(timeline.update_value(1, 7.0));
        assert_eq!(timeline.points()[1].value, 1.0);

        assert!(timeline.update_time(1, 20.0));
        assert_eq!(timeline.points()[1].time, 10.0);
        assert!(!timeline.update_time(1, 10.0));
    }

    #[test]
    fn test_ordering_survives_edit_sequences() {
        let mut timeline = timeline(&[(0.0, 0.5), (10.0, 0.5)]);
        // Deterministic pseudo-random edit script
        let mut seed = 0x2545_f491_u64;
        for _ in 0..500 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let r = (seed >> 33) as usize;
            let index = r % timeline.len();
            let time = (r % 1200) as f64 / 100.0 - 1.0;
            match r % 3 {
                0 => {
                    timeline.insert_after(PointRef::Point(index), time, 0.3);
                }
                1 => {
                    timeline.delete(index);
                }
                _ => {
                    timeline.update_time(index, time);
                }
            }
            assert_sorted(&timeline);
            assert!(timeline.len() >= 2);
        }
    }

    #[test]
    fn test_boundary_view_mirrors_real_points() {
        let mut timeline = timeline(&[(2.0, 0.2), (5.0, 0.5), (8.0, 0.8)]);
        timeline.set_range(Some(0.4), Some(0.6));

        assert_eq!(timeline.points()[0].value, 0.4, "One-time sync on attach");
        assert_eq!(timeline.points()[2].value, 0.6);

        timeline.update_value(0, 0.1);
        let view: Vec<ViewPoint> = timeline.view().collect();
        assert_eq!(view.len(), 5);
        assert_eq!(view[0].at, PointRef::Start);
        assert_eq!(view[0].time, 0.0);
        assert_eq!(view[0].value, 0.1, "Start follows the first point");
        assert_eq!(view[4].at, PointRef::End);
        assert_eq!(view[4].time, 10.0);

        assert_eq!(timeline.view_index(PointRef::Point(1)), Some(2));
        assert_eq!(timeline.real_index(PointRef::End), 2);
    }

    #[test]
    fn test_zero_range_normalizes_to_zero() {
        let timeline = timeline(&[(0.0, 0.0), (10.0, 0.0)]);
        let mut flat = PointTimeline::default();
        flat.set_points(timeline.points().to_vec(), 0.0, 0.0, 0.0, 0.0);
        assert_eq!(flat.value_range(), 0.0);
        assert_eq!(flat.normalize_value(0.0), 0.0);
    }
}
