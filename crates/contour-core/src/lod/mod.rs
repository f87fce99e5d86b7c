//! Level-of-detail pyramids for per-fragment analysis data
//!
//! A raw analysis buffer (one interleaved multi-channel entry per time
//! fragment) is turned once per loaded track into a cascade of halved
//! resolutions stored back to back in one buffer:
//!
//! ```text
//! level 0 (16)                     level 1 (8)     level 2 (4) l3  l4  guard
//! |................................|................|........|....|..|xxxx|
//! ^ offsets[0]                     ^ offsets[1]     ^ offsets[2]        ^ offsets[K]
//! ```
//!
//! The renderer picks a fractional level from the current zoom
//! ([`LodSelector`]) and blends the two neighbouring integer levels
//! ([`LodSampler`]), which keeps detail transitions continuous while zooming.

mod error;
mod pyramid;
mod sampler;
mod selector;

pub use error::{LodError, LodResult};
pub use pyramid::{level_lengths, LodPyramid, StereoLodPyramid, GUARD_FRAGMENTS};
pub use sampler::LodSampler;
pub use selector::{fragments_per_screen_pixel, LodSelection, LodSelector, MIN_LEVEL};
