//! Flat vertex buffer for the rendering collaborator

use super::{PointTimeline, ViewPoint};
use bytemuck::{Pod, Zeroable};

/// `line_hint` value marking a tilt edit on a segment
pub const TILT_HINT: f32 = 2.0;

/// One rendered point, in render space (`[-1, 1]²`)
///
/// Layout matches a 4×f32 texel so the buffer can be uploaded as is.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct PointVertex {
    pub x: f32,
    pub y: f32,
    /// 1.0 on hovered or grabbed points
    pub highlight: f32,
    /// On a segment's start vertex: insert offset in `[0, 1]`, or [`TILT_HINT`]
    pub line_hint: f32,
}

/// What a segment offers under the pointer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineHint {
    /// A click inserts a point at this parametric offset
    Insert(f64),
    /// A drag moves both endpoint values
    Tilt,
}

/// Hover/drag feedback on a segment, by view index of its start point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineHighlight {
    pub segment: usize,
    pub hint: LineHint,
}

/// Hover/drag feedback drawn into the vertex buffer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Highlight {
    /// View indices of highlighted points
    pub points: Vec<usize>,
    pub line: Option<LineHighlight>,
}

impl Highlight {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn point(view_index: usize) -> Self {
        Self {
            points: vec![view_index],
            line: None,
        }
    }

    pub fn is_none(&self) -> bool {
        self.points.is_empty() && self.line.is_none()
    }
}

impl PointTimeline {
    /// Rebuild the vertex buffer if any mutation happened since the last call
    ///
    /// Returns true if the buffer contents actually changed, i.e. the renderer
    /// needs a new upload.
    pub fn refresh(&mut self) -> bool {
        if !self.points_invalidated {
            return false;
        }
        self.points_invalidated = false;

        let vertices = self.build_vertices();
        let changed = vertices != self.vertices;
        if changed {
            self.vertices = vertices;
            self.point_data_invalidated = true;
        }
        changed
    }

    /// Current vertex buffer: the view points plus one closing vertex
    pub fn vertices(&self) -> &[PointVertex] {
        &self.vertices
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// True once [`refresh`](Self::refresh) changed the buffer, until taken
    pub fn take_point_data_invalidated(&mut self) -> bool {
        std::mem::take(&mut self.point_data_invalidated)
    }

    fn build_vertices(&self) -> Vec<PointVertex> {
        let mut vertices: Vec<PointVertex> = self.view().map(|p| self.vertex(&p)).collect();

        for &index in &self.highlight.points {
            if let Some(vertex) = vertices.get_mut(index) {
                vertex.highlight = 1.0;
            }
        }
        if let Some(line) = self.highlight.line {
            if let Some(vertex) = vertices.get_mut(line.segment) {
                vertex.line_hint = match line.hint {
                    LineHint::Insert(t) => t.clamp(0.0, 1.0) as f32,
                    LineHint::Tilt => TILT_HINT,
                };
            }
        }

        // Closing vertex so the last segment has an end texel
        if !self.has_end {
            let closing = match vertices.last() {
                Some(last) => PointVertex {
                    highlight: 0.0,
                    line_hint: 0.0,
                    ..*last
                },
                None => self.vertex(&ViewPoint {
                    time: self.duration,
                    value: self.default_value,
                    at: super::PointRef::End,
                }),
            };
            vertices.push(closing);
        }
        vertices
    }

    fn vertex(&self, point: &ViewPoint) -> PointVertex {
        PointVertex {
            x: (self.normalize_time(point.time) * 2.0 - 1.0) as f32,
            y: (self.normalize_value(point.value) * 2.0 - 1.0) as f32,
            highlight: 0.0,
            line_hint: 0.0,
        }
    }
}
