//! Configuration for contour editors and waveform views
//!
//! All settings are plain serde structs with `#[serde(default)]`, so a YAML
//! file only needs to mention the fields it overrides:
//!
//! ```yaml
//! editor:
//!   duration: 32.0
//!   double_click_ms: 300
//! lod:
//!   level_bias: 0.5
//! ```

mod io;

pub use io::{load_config, parse_config, save_config};

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default window in which a second click counts as a double-click
pub const DEFAULT_DOUBLE_CLICK_MS: u64 = 400;

/// Default snap capture distance, as a fraction of the value range
pub const DEFAULT_SNAP_FRACTION: f64 = 0.03;

/// Default number of LOD levels
pub const DEFAULT_LOD_LEVELS: usize = 32;

/// Top-level configuration file layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourConfig {
    pub editor: EditorConfig,
    pub lod: LodConfig,
    pub waveform: WaveformDisplayConfig,
}

// =============================================================================
// Editor
// =============================================================================

/// Settings for the interactive point/line editors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Lower bound of the value axis (widened to cover seed points)
    pub min_value: f64,
    /// Upper bound of the value axis (widened to cover seed points)
    pub max_value: f64,
    /// Value used for seed points and as a snap anchor
    pub default_value: f64,
    /// Added to every point time before mapping to the timeline
    pub time_offset: f64,
    /// Timeline length in seconds
    pub duration: f64,
    /// Pointer capture radius for control-line and marker editors (pixels)
    pub point_capture_radius: f64,
    /// Pointer capture radius for the beat-grid editor (pixels)
    pub beat_grid_capture_radius: f64,
    /// Double-click window for the delete gesture
    pub double_click_ms: u64,
    /// Snap capture distance as a fraction of the value range
    pub snap_fraction: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_value: 0.0,
            max_value: 1.0,
            default_value: 1.0,
            time_offset: 0.0,
            duration: 10.0,
            point_capture_radius: 10.0,
            beat_grid_capture_radius: 20.0,
            double_click_ms: DEFAULT_DOUBLE_CLICK_MS,
            snap_fraction: DEFAULT_SNAP_FRACTION,
        }
    }
}

impl EditorConfig {
    pub fn double_click_window(&self) -> Duration {
        Duration::from_millis(self.double_click_ms)
    }

    /// Duration guarded against zero/negative/NaN, which would break the
    /// time normalization
    pub fn validated_duration(&self) -> f64 {
        if self.duration.is_finite() && self.duration > 0.0 {
            self.duration
        } else {
            Self::default().duration
        }
    }
}

// =============================================================================
// Level of detail
// =============================================================================

/// In-level interpolation between two adjacent fragments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Straight linear mix
    Linear,
    /// Sine-eased mix, flat at both fragments
    #[default]
    Smooth,
}

impl Interpolation {
    /// Map a linear fraction in `[0, 1]` to the mix factor
    pub fn ease(self, fraction: f32) -> f32 {
        match self {
            Self::Linear => fraction,
            Self::Smooth => {
                (1.0 + ((fraction * 2.0 - 1.0) * std::f32::consts::FRAC_PI_2).sin()) * 0.5
            }
        }
    }
}

/// Level-of-detail settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodConfig {
    /// Maximum number of pyramid levels (K)
    pub levels: usize,
    /// Per-widget bias towards coarser levels
    pub level_bias: f32,
    pub interpolation: Interpolation,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            levels: DEFAULT_LOD_LEVELS,
            level_bias: 0.0,
            interpolation: Interpolation::Smooth,
        }
    }
}

impl LodConfig {
    /// Level count with a floor of one
    pub fn validated_levels(&self) -> usize {
        if self.levels == 0 {
            log::warn!("LodConfig: levels = 0 is invalid, using a single level");
            1
        } else {
            self.levels
        }
    }
}

// =============================================================================
// Waveform display shaping
// =============================================================================

/// Display shaping for one analysis channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelShaping {
    /// Divisor applied before any other shaping
    pub pre_scale: f32,
    /// Exponent applied last
    pub curve: f32,
    /// Mix between linear (0.0) and dB (1.0) mapping
    pub db_mix: f32,
    /// Dynamic range of the dB mapping
    pub db_range: f32,
}

impl Default for ChannelShaping {
    fn default() -> Self {
        Self {
            pre_scale: 1.0,
            curve: 1.0,
            db_mix: 0.0,
            db_range: 90.0,
        }
    }
}

impl ChannelShaping {
    /// Shape a raw (non-negative) analysis value into `[0, 1]`-ish display range
    pub fn apply(&self, raw: f32) -> f32 {
        let pre_scale = if self.pre_scale.abs() > f32::EPSILON { self.pre_scale } else { 1.0 };
        let linear = raw / pre_scale;
        let db = if self.db_range > 0.0 {
            ((self.db_range + 20.0 * (1e-6 + linear).max(1e-12).log10()) / self.db_range)
                .clamp(0.0, 1.0)
        } else {
            0.0
        };
        let mixed = linear + (db - linear) * self.db_mix;
        mixed.max(0.0).powf(self.curve)
    }
}

/// Shaping for the three displayed analysis channels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformDisplayConfig {
    pub max: ChannelShaping,
    pub rms: ChannelShaping,
    pub energy: ChannelShaping,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = ContourConfig::default();
        assert_eq!(config.editor.double_click_ms, 400);
        assert!((config.editor.snap_fraction - 0.03).abs() < 1e-12);
        assert_eq!(config.lod.levels, 32);
        assert_eq!(config.lod.level_bias, 0.0);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "editor:\n  duration: 32.0\nlod:\n  interpolation: linear\n";
        let config: ContourConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.editor.duration, 32.0);
        assert_eq!(config.editor.max_value, 1.0);
        assert_eq!(config.lod.interpolation, Interpolation::Linear);
        assert_eq!(config.lod.levels, DEFAULT_LOD_LEVELS);
    }

    #[test]
    fn test_validated_duration_rejects_zero() {
        let config = EditorConfig {
            duration: 0.0,
            ..Default::default()
        };
        assert_eq!(config.validated_duration(), 10.0);
    }

    #[test]
    fn test_smooth_ease_endpoints() {
        let ease = Interpolation::Smooth;
        assert!(ease.ease(0.0).abs() < 1e-6);
        assert!((ease.ease(0.5) - 0.5).abs() < 1e-6);
        assert!((ease.ease(1.0) - 1.0).abs() < 1e-6);
        assert_eq!(Interpolation::Linear.ease(0.3), 0.3);
    }

    #[test]
    fn test_default_shaping_is_identity() {
        let shaping = ChannelShaping::default();
        assert!((shaping.apply(0.25) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_db_shaping_maps_full_scale_to_one() {
        let shaping = ChannelShaping {
            db_mix: 1.0,
            ..Default::default()
        };
        assert!((shaping.apply(1.0) - 1.0).abs() < 1e-4);
        // -45 dB sits halfway in a 90 dB range
        let half = shaping.apply(10f32.powf(-45.0 / 20.0));
        assert!((half - 0.5).abs() < 1e-3, "got {}", half);
        assert_eq!(shaping.apply(0.0), 0.0);
    }
}
