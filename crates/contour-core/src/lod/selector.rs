//! Zoom-dependent level selection

use super::pyramid::LodPyramid;
use crate::config::LodConfig;

/// Floor of the fractional level, keeps `log2` of tiny ratios off level 0's edge
pub const MIN_LEVEL: f32 = 0.01;

/// Fragments of level 0 covered by one screen pixel
///
/// Returns 0.0 for a zero-sized or degenerate view.
pub fn fragments_per_screen_pixel(total_fragments: usize, x_scale: f64, width_px: f64) -> f32 {
    let pixels = x_scale * width_px;
    if !pixels.is_finite() || pixels <= 0.0 {
        return 0.0;
    }
    (total_fragments as f64 / pixels) as f32
}

/// Two neighbouring integer levels and the mix factor between them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LodSelection {
    /// Fractional level before clamping to the available levels
    pub level: f32,
    pub lower: usize,
    pub upper: usize,
    /// Weight of `upper` in the final mix
    pub blend: f32,
}

/// Maps a fragments-per-pixel ratio to a fractional pyramid level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LodSelector {
    levels: usize,
    level_bias: f32,
}

impl LodSelector {
    pub fn new(levels: usize, level_bias: f32) -> Self {
        Self {
            levels: levels.max(1),
            level_bias,
        }
    }

    pub fn from_config(config: &LodConfig) -> Self {
        Self::new(config.validated_levels(), config.level_bias)
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    pub fn level_bias(&self) -> f32 {
        self.level_bias
    }

    /// `clamp(log2(0.5 + fpp * (1 + bias)), MIN_LEVEL, K)`
    pub fn base_level(&self, fragments_per_pixel: f32) -> f32 {
        let ratio = 0.5 + fragments_per_pixel.max(0.0) * (1.0 + self.level_bias);
        let level = ratio.log2();
        if level.is_nan() {
            return MIN_LEVEL;
        }
        level.clamp(MIN_LEVEL, self.levels as f32)
    }

    /// Pick the two levels to blend, given how many levels actually exist
    ///
    /// Returns `None` when there is nothing to draw.
    pub fn select(&self, fragments_per_pixel: f32, available_levels: usize) -> Option<LodSelection> {
        if available_levels == 0 {
            return None;
        }

        let level = self.base_level(fragments_per_pixel);
        let max_level = available_levels - 1;
        let lower = (level.floor() as usize).min(max_level);
        let upper = (level.ceil() as usize).min(max_level);
        let blend = if lower == upper { 0.0 } else { level.fract() };

        Some(LodSelection {
            level,
            lower,
            upper,
            blend,
        })
    }

    /// [`select`](Self::select) against a built pyramid; empty pyramids give `None`
    pub fn select_for(&self, pyramid: &LodPyramid, fragments_per_pixel: f32) -> Option<LodSelection> {
        if pyramid.is_empty() {
            return None;
        }
        self.select(fragments_per_pixel, pyramid.level_count())
    }
}

impl Default for LodSelector {
    fn default() -> Self {
        Self::from_config(&LodConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_four_fragments_per_pixel() {
        let selector = LodSelector::new(32, 0.0);
        let selection = selector.select(4.0, 32).unwrap();

        assert!((selection.level - 2.1699).abs() < 1e-3, "got {}", selection.level);
        assert_eq!(selection.lower, 2);
        assert_eq!(selection.upper, 3);
        assert!((selection.blend - 0.17).abs() < 0.01);
    }

    #[test]
    fn test_level_is_clamped_to_range() {
        let selector = LodSelector::new(5, 0.0);
        assert_eq!(selector.base_level(0.0), MIN_LEVEL);
        assert_eq!(selector.base_level(1e12), 5.0);
        assert_eq!(selector.base_level(f32::NAN), MIN_LEVEL);
    }

    #[test]
    fn test_bias_moves_towards_coarser_levels() {
        let plain = LodSelector::new(32, 0.0).base_level(8.0);
        let biased = LodSelector::new(32, 0.5).base_level(8.0);
        assert!(biased > plain);
    }

    #[test]
    fn test_selection_clamped_to_available_levels() {
        let selector = LodSelector::new(32, 0.0);
        let selection = selector.select(1000.0, 3).unwrap();
        assert_eq!(selection.lower, 2);
        assert_eq!(selection.upper, 2);
        assert_eq!(selection.blend, 0.0);
    }

    #[test]
    fn test_empty_pyramid_has_no_selection() {
        let selector = LodSelector::default();
        let empty = LodPyramid::build(&[], 4, 32).unwrap();
        assert!(selector.select_for(&empty, 4.0).is_none());
        assert!(selector.select(4.0, 0).is_none());

        let pyramid = LodPyramid::build(&[0.5; 64], 4, 32).unwrap();
        assert!(selector.select_for(&pyramid, 4.0).is_some());
    }

    #[test]
    fn test_fragments_per_screen_pixel() {
        assert_eq!(fragments_per_screen_pixel(4000, 1.0, 1000.0), 4.0);
        assert_eq!(fragments_per_screen_pixel(4000, 4.0, 1000.0), 1.0);
        assert_eq!(fragments_per_screen_pixel(4000, 1.0, 0.0), 0.0);
    }
}
