//! Value snapping for dragged points

/// Snap anchors captured when a point drag starts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueSnap {
    anchors: Vec<f64>,
    snap_dist: f64,
}

impl ValueSnap {
    pub fn new(anchors: Vec<f64>, snap_dist: f64) -> Self {
        Self { anchors, snap_dist }
    }

    pub fn anchors(&self) -> &[f64] {
        &self.anchors
    }

    pub fn snap(&self, candidate: f64) -> f64 {
        snap_value(candidate, &self.anchors, self.snap_dist)
    }
}

/// Pull `candidate` onto the closest anchor within `snap_dist`
///
/// The first anchor wins ties. A non-positive `snap_dist` (zero value range)
/// always snaps to the closest anchor.
pub fn snap_value(candidate: f64, anchors: &[f64], snap_dist: f64) -> f64 {
    let mut closest: Option<(f64, f64)> = None;
    for &anchor in anchors {
        let dist = (candidate - anchor).abs();
        if closest.map_or(true, |(best, _)| dist < best) {
            closest = Some((dist, anchor));
        }
    }

    match closest {
        Some((dist, anchor)) if snap_dist <= 0.0 || dist < snap_dist => anchor,
        _ => candidate,
    }
}
