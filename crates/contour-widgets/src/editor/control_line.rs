//! Multi-curve control-line editor

use std::collections::BTreeMap;

use contour_core::config::EditorConfig;
use contour_core::frame::FrameInfo;
use contour_core::{TimelinePoint, Viewport};

use super::{PointerEvent, TimelineEditor};
use crate::client::FrameClient;
use crate::drag::Response;
use crate::pointer::{CursorHint, PointerInput, Surface};

/// Line colours, handed out round-robin as curves are created
pub const CURVE_COLORS: [[f32; 3]; 12] = [
    [0.9, 0.9, 0.9],
    [1.0, 0.3, 0.0],
    [0.0, 0.7, 0.0],
    [0.8, 0.5, 0.0],
    [0.0, 0.5, 0.8],
    [0.8, 0.0, 0.8],
    [0.9, 0.5, 0.0],
    [0.0, 0.5, 0.5],
    [0.5, 0.0, 0.9],
    [0.5, 0.5, 0.0],
    [0.0, 0.25, 1.0],
    [0.5, 0.0, 1.0],
];

/// Called once per finished edit with the curve name and its points
pub type NamedCommitCallback = Box<dyn FnMut(&str, &[TimelinePoint])>;

/// One named curve
pub struct ControlLine {
    editor: TimelineEditor,
    color: [f32; 3],
}

impl ControlLine {
    pub fn editor(&self) -> &TimelineEditor {
        &self.editor
    }

    pub fn points(&self) -> &[TimelinePoint] {
        self.editor.timeline().points()
    }

    pub fn color(&self) -> [f32; 3] {
        self.color
    }

    /// Points are drawn enlarged while the curve has focus
    pub fn is_focused(&self) -> bool {
        self.editor.session().wants_focus()
    }
}

/// Several value curves sharing one canvas, duration and viewport
pub struct ControlLineEditor {
    config: EditorConfig,
    curves: BTreeMap<String, ControlLine>,
    color_ix: usize,
    duration: f64,
    opacity: f32,
    surface: Surface,
    /// Curve with the pointer over one of its segments or non-first points
    selected: Option<String>,
    on_commit: Option<NamedCommitCallback>,
}

impl ControlLineEditor {
    pub fn new(config: EditorConfig) -> Self {
        let duration = config.validated_duration();
        Self {
            config,
            curves: BTreeMap::new(),
            color_ix: 0,
            duration,
            opacity: 1.0,
            surface: Surface::default(),
            selected: None,
            on_commit: None,
        }
    }

    /// Create or replace the curve `name`
    ///
    /// `duration` is shared by all curves and updates every one of them.
    #[allow(clippy::too_many_arguments)]
    pub fn set_points(
        &mut self,
        name: &str,
        points: Vec<TimelinePoint>,
        duration: f64,
        min_value: f64,
        max_value: f64,
        default_value: f64,
        time_offset: f64,
    ) {
        if duration.is_finite() && duration > 0.0 {
            self.duration = duration;
        }
        for curve in self.curves.values_mut() {
            curve.editor.timeline_mut().set_duration(self.duration);
        }

        if !self.curves.contains_key(name) {
            let color = CURVE_COLORS[self.color_ix % CURVE_COLORS.len()];
            self.color_ix += 1;

            let mut editor = TimelineEditor::control_line(&self.config);
            editor.set_surface(self.surface);
            editor.timeline_mut().set_duration(self.duration);
            self.curves.insert(name.to_string(), ControlLine { editor, color });
            log::debug!("ControlLineEditor::set_points: new curve '{}'", name);
        }

        if let Some(curve) = self.curves.get_mut(name) {
            curve
                .editor
                .timeline_mut()
                .set_points(points, min_value, max_value, default_value, time_offset);
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        if self.selected.as_deref() == Some(name) {
            self.selected = None;
        }
        self.curves.remove(name).is_some()
    }

    /// Drop every curve and restart the colour cycle
    pub fn clear_all(&mut self) {
        self.curves.clear();
        self.selected = None;
        self.color_ix = 0;
    }

    pub fn curve(&self, name: &str) -> Option<&ControlLine> {
        self.curves.get(name)
    }

    /// Curves in name order
    pub fn curves(&self) -> impl Iterator<Item = (&str, &ControlLine)> {
        self.curves.iter().map(|(name, curve)| (name.as_str(), curve))
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn set_on_commit(&mut self, callback: impl FnMut(&str, &[TimelinePoint]) + 'static) {
        self.on_commit = Some(Box::new(callback));
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.surface.width = width;
        self.surface.height = height;
        for curve in self.curves.values_mut() {
            curve.editor.resize(width, height);
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.surface.viewport = viewport;
        for curve in self.curves.values_mut() {
            curve.editor.set_viewport(viewport);
        }
    }

    pub fn cursor(&self) -> CursorHint {
        self.selected
            .as_ref()
            .and_then(|name| self.curves.get(name))
            .map_or(CursorHint::None, |curve| curve.editor.cursor())
    }

    pub fn on_pointer_down(&mut self, input: &PointerInput) -> bool {
        self.route(PointerEvent::Down(input))
    }

    pub fn on_pointer_move(&mut self, input: &PointerInput) -> bool {
        self.route(PointerEvent::Move(input))
    }

    pub fn on_pointer_up(&mut self, input: &PointerInput) -> bool {
        self.route(PointerEvent::Up(input))
    }

    pub fn on_pointer_leave(&mut self) -> bool {
        let names: Vec<String> = self.curves.keys().cloned().collect();
        let mut consumed = false;
        for name in names {
            consumed |= self.deliver(&name, PointerEvent::Leave).consumed;
        }
        self.selected = None;
        consumed
    }

    pub fn on_pointer_click(&mut self, input: &PointerInput) -> bool {
        let Some(name) = self.selected.clone() else {
            return false;
        };
        self.curves
            .get_mut(&name)
            .is_some_and(|curve| curve.editor.on_pointer_click(input))
    }

    /// Offer an event to the curves, selected one first, until one consumes it
    ///
    /// A curve holding a press gets every event to itself.
    fn route(&mut self, event: PointerEvent<'_>) -> bool {
        if let Some(name) = self.grabbing() {
            let consumed = self.deliver(&name, event).consumed;
            self.update_selection(&name);
            return consumed;
        }

        let mut order: Vec<String> = Vec::with_capacity(self.curves.len());
        if let Some(selected) = self.selected.clone() {
            order.push(selected);
        }
        order.extend(
            self.curves
                .keys()
                .filter(|name| self.selected.as_ref() != Some(*name))
                .cloned(),
        );

        let mut consumer: Option<String> = None;
        for name in order {
            if consumer.is_some() {
                // Drop stale hover feedback on curves that didn't get the event
                self.deliver(&name, PointerEvent::Leave);
                continue;
            }
            if self.deliver(&name, event).consumed {
                consumer = Some(name);
            }
        }

        match consumer {
            Some(name) => {
                self.update_selection(&name);
                true
            }
            None => {
                self.selected = None;
                false
            }
        }
    }

    fn deliver(&mut self, name: &str, event: PointerEvent<'_>) -> Response {
        let Some(curve) = self.curves.get_mut(name) else {
            return Response::default();
        };
        let response = curve.editor.handle(event);
        if response.committed {
            if let Some(callback) = self.on_commit.as_mut() {
                callback(name, curve.editor.timeline().points());
            }
        }
        response
    }

    fn grabbing(&self) -> Option<String> {
        self.curves
            .iter()
            .find(|(_, curve)| curve.editor.session().is_grabbing())
            .map(|(name, _)| name.clone())
    }

    fn update_selection(&mut self, name: &str) {
        let focused = self.curves.get(name).is_some_and(|curve| curve.is_focused());
        if focused {
            self.selected = Some(name.to_string());
        } else if self.selected.as_deref() == Some(name) {
            self.selected = None;
        }
    }
}

impl FrameClient for ControlLineEditor {
    fn on_frame(&mut self, frame: &FrameInfo) {
        for curve in self.curves.values_mut() {
            curve.editor.on_frame(frame);
        }
    }

    fn needs_frame(&self) -> bool {
        self.curves.values().any(|curve| curve.editor.needs_frame())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    fn editor() -> ControlLineEditor {
        let mut editor = ControlLineEditor::new(EditorConfig::default());
        editor.resize(1000.0, 100.0);
        editor.set_points(
            "volume",
            vec![TimelinePoint::new(0.0, 0.2), TimelinePoint::new(10.0, 0.2)],
            10.0,
            0.0,
            1.0,
            1.0,
            0.0,
        );
        editor.set_points(
            "filter",
            vec![TimelinePoint::new(0.0, 0.8), TimelinePoint::new(10.0, 0.8)],
            10.0,
            0.0,
            1.0,
            1.0,
            0.0,
        );
        editor
    }

    #[test]
    fn test_colors_cycle_and_reset() {
        let mut editor = editor();
        assert_eq!(editor.curve("volume").unwrap().color(), CURVE_COLORS[0]);
        assert_eq!(editor.curve("filter").unwrap().color(), CURVE_COLORS[1]);

        // Replacing points keeps the colour
        editor.set_points("volume", Vec::new(), 10.0, 0.0, 1.0, 1.0, 0.0);
        assert_eq!(editor.curve("volume").unwrap().color(), CURVE_COLORS[0]);

        editor.clear_all();
        editor.set_points("pan", Vec::new(), 10.0, 0.0, 1.0, 0.5, 0.0);
        assert_eq!(editor.curve("pan").unwrap().color(), CURVE_COLORS[0]);
    }

    #[test]
    fn test_hover_selects_curve_under_pointer() {
        let mut editor = editor();
        let t0 = Instant::now();

        assert!(editor.on_pointer_move(&PointerInput::new(0.5, 0.8, t0)));
        assert_eq!(editor.selected(), Some("filter"));
        assert_eq!(editor.cursor(), CursorHint::Copy);

        assert!(editor.on_pointer_move(&PointerInput::new(0.5, 0.2, t0)));
        assert_eq!(editor.selected(), Some("volume"));

        assert!(!editor.on_pointer_move(&PointerInput::new(0.5, 0.5, t0)));
        assert_eq!(editor.selected(), None);
        assert_eq!(editor.cursor(), CursorHint::None);
    }

    #[test]
    fn test_commit_carries_curve_name() {
        let mut editor = editor();
        let commits: Rc<RefCell<Vec<(String, usize)>>> = Rc::default();
        let sink = commits.clone();
        editor.set_on_commit(move |name, points| sink.borrow_mut().push((name.to_string(), points.len())));

        let t0 = Instant::now();
        let at = |y: f64, ms: u64| PointerInput::new(0.5, y, t0 + Duration::from_millis(ms));

        editor.on_pointer_move(&at(0.2, 0));
        assert!(editor.on_pointer_down(&at(0.2, 10)));
        // Dragging across the other curve keeps the grab on this one
        assert!(editor.on_pointer_move(&at(0.8, 20)));
        assert!(editor.on_pointer_up(&at(0.8, 30)));

        assert_eq!(commits.borrow().as_slice(), &[("volume".to_string(), 3)]);
        assert_eq!(editor.curve("filter").unwrap().points().len(), 2);
        assert!((editor.curve("volume").unwrap().points()[1].value - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_duration_is_shared() {
        let mut editor = editor();
        editor.set_points("tempo", Vec::new(), 20.0, 0.0, 1.0, 1.0, 0.0);
        assert_eq!(editor.duration(), 20.0);
        for (_, curve) in editor.curves() {
            assert_eq!(curve.editor().timeline().duration(), 20.0);
        }
    }

    #[test]
    fn test_remove_clears_selection() {
        let mut editor = editor();
        editor.on_pointer_move(&PointerInput::new(0.5, 0.8, Instant::now()));
        assert!(editor.remove("filter"));
        assert_eq!(editor.selected(), None);
        assert!(!editor.remove("filter"));
    }
}
