//! Contour Core - shared data for the contour timeline editors
//!
//! Everything here is independent of any widget toolkit:
//!
//! - **types**: timeline points and the pan/zoom [`Viewport`]
//! - **config**: YAML-backed editor, LOD and display settings
//! - **frame**: the injected per-frame callback scheduler
//! - **lod**: the level-of-detail pyramid built from per-fragment analysis data

pub mod config;
pub mod frame;
pub mod lod;
pub mod types;

pub use types::*;
