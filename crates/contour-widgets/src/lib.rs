//! Interactive timeline editors for contour
//!
//! Toolkit-independent editing core for curve, beat-grid and marker widgets.
//! Hosts feed normalized pointer events in and read back cursor hints, commit
//! notifications and flat render buffers.
//!
//! ## Architecture
//!
//! - **State**: [`PointTimeline`] owns the points and their invariants
//! - **Interaction**: [`HitTester`] finds the point or segment under the
//!   pointer, [`DragSession`] turns pointer events into edits
//! - **Editors**: [`TimelineEditor`] pairs the two; the skins in [`editor`]
//!   configure it for control lines, beat grids and time markers
//! - **Frames**: widgets implement [`FrameClient`] and rebuild render data
//!   once per frame through an injected scheduler
//!
//! [`AudioView`] is the waveform counterpart: it owns the LOD pyramids and
//! evaluates shaped display values per screen column.

pub mod client;
pub mod drag;
pub mod editor;
pub mod pointer;
pub mod snap;
pub mod timeline;
pub mod waveform;

pub use client::{register_client, ClientHandle, FrameClient};
pub use drag::{DragSession, DragState, EditProfile, LineGesture, LineGestureRule, Response};
pub use editor::{
    BeatGridEditor, BeatLine, ControlLine, ControlLineEditor, TimeLineMarkers, TimelineEditor,
    CURVE_COLORS, DEFAULT_BEATS_PER_BAR,
};
pub use hit_test::{hit_time_only, HitResult, HitTester};
pub use pointer::{CursorHint, Modifiers, PointerInput, Surface};
pub use snap::{snap_value, ValueSnap};
pub use timeline::{PointRef, PointTimeline, PointVertex, ViewPoint};
pub use waveform::AudioView;
