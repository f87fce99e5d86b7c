//! Waveform view state backed by a stereo LOD pyramid
//!
//! The analysis collaborator delivers one buffer per track with four values
//! per fragment: mean square, average, energy and peak. [`AudioView`] keeps
//! the pyramids built from it and evaluates one screen column at a time the
//! way the renderer does:
//!
//! 1. choose a fractional level from the current zoom
//! 2. sample both neighbouring levels and blend them
//! 3. mix left and right around the vertical centre
//! 4. apply per-channel display shaping

use contour_core::config::{ContourConfig, LodConfig, WaveformDisplayConfig};
use contour_core::lod::{fragments_per_screen_pixel, LodResult, LodSampler, LodSelection, LodSelector, StereoLodPyramid};
use contour_core::Viewport;

/// Values per fragment in the analysis buffer
pub const ANALYSIS_CHANNELS: usize = 4;

/// Upper bound of a raw display value before shaping
pub const MAX_RAW_VALUE: f32 = 100.0;

// Channel layout of one analysis fragment
const MEAN_SQUARE: usize = 0;
const ENERGY: usize = 2;
const PEAK: usize = 3;

/// Hermite step between `edge0` and `edge1`
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

pub struct AudioView {
    pyramid: Option<StereoLodPyramid>,
    data_offset: usize,
    data_length: usize,
    lod: LodConfig,
    selector: LodSelector,
    display: WaveformDisplayConfig,
}

impl Default for AudioView {
    fn default() -> Self {
        Self::new(&ContourConfig::default())
    }
}

impl AudioView {
    pub fn new(config: &ContourConfig) -> Self {
        Self {
            pyramid: None,
            data_offset: 0,
            data_length: 0,
            lod: config.lod.clone(),
            selector: LodSelector::from_config(&config.lod),
            display: config.waveform.clone(),
        }
    }

    /// Build the pyramids from a left-then-right analysis buffer
    ///
    /// `data_offset` fragments at the start are skipped and `data_length`
    /// fragments after them are shown. On error the previous data is kept.
    pub fn set_view_data(
        &mut self,
        view_data: &[f32],
        channels: usize,
        data_offset: usize,
        data_length: usize,
    ) -> LodResult<()> {
        let pyramid = StereoLodPyramid::from_split(view_data, channels, self.lod.validated_levels())?;
        log::info!(
            "AudioView::set_view_data: {} fragments per side, {} levels",
            pyramid.fragment_count(),
            pyramid.left.level_count()
        );
        self.pyramid = Some(pyramid);
        self.set_window(data_offset, data_length);
        Ok(())
    }

    /// Move the visible window without rebuilding
    pub fn set_window(&mut self, data_offset: usize, data_length: usize) {
        self.data_offset = data_offset;
        self.data_length = data_length;
    }

    pub fn clear(&mut self) {
        self.pyramid = None;
        self.data_length = 0;
    }

    pub fn pyramid(&self) -> Option<&StereoLodPyramid> {
        self.pyramid.as_ref()
    }

    pub fn data_offset(&self) -> usize {
        self.data_offset
    }

    pub fn data_length(&self) -> usize {
        self.data_length
    }

    pub fn display(&self) -> &WaveformDisplayConfig {
        &self.display
    }

    pub fn set_display(&mut self, display: WaveformDisplayConfig) {
        self.display = display;
    }

    /// Takes effect for selection immediately; the level count applies from
    /// the next [`set_view_data`](Self::set_view_data)
    pub fn set_lod_config(&mut self, lod: LodConfig) {
        self.selector = LodSelector::from_config(&lod);
        self.lod = lod;
    }

    /// Level pair for the current zoom, `None` without data
    pub fn selection(&self, viewport: &Viewport, width_px: f64) -> Option<LodSelection> {
        let pyramid = self.pyramid.as_ref()?;
        if self.data_length == 0 {
            return None;
        }
        let fpp = fragments_per_screen_pixel(self.data_length, viewport.x_scale, width_px);
        self.selector.select_for(&pyramid.left, fpp)
    }

    /// Shaped `[max, rms, energy]` for the column at widget-space `column_x`
    ///
    /// `y` is the widget-space height the column is evaluated at; below the
    /// centre reads the left channel, above it the right.
    pub fn column(&self, viewport: &Viewport, width_px: f64, column_x: f64, y: f32) -> Option<[f32; 3]> {
        let pyramid = self.pyramid.as_ref()?;
        let selection = self.selection(viewport, width_px)?;

        let (x, _) = viewport.to_timeline(column_x, 0.0);
        let position = x * self.data_length as f64;

        let mut left = [0.0f32; ANALYSIS_CHANNELS];
        let mut right = [0.0f32; ANALYSIS_CHANNELS];
        LodSampler::new(&pyramid.left, self.lod.interpolation)
            .with_window(self.data_offset, self.data_length)
            .sample_into(&selection, position, &mut left);
        LodSampler::new(&pyramid.right, self.lod.interpolation)
            .with_window(self.data_offset, self.data_length)
            .sample_into(&selection, position, &mut right);

        let side = smoothstep(0.49, 0.51, y);
        let mut mixed = [0.0f32; ANALYSIS_CHANNELS];
        for (out, (l, r)) in mixed.iter_mut().zip(left.iter().zip(right.iter())) {
            *out = l + (r - l) * side;
        }

        let raw = [
            mixed[PEAK],
            mixed[MEAN_SQUARE].max(0.0).sqrt(),
            mixed[ENERGY].max(0.0).sqrt(),
        ]
        .map(|v| v.clamp(0.0, MAX_RAW_VALUE));

        Some([
            self.display.max.apply(raw[0]),
            self.display.rms.apply(raw[1]),
            self.display.energy.apply(raw[2]),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contour_core::config::{ChannelShaping, Interpolation};
    use contour_core::lod::LodError;

    /// Left side constant [0.25, 0, 0.04, 0.8], right side constant [1, 0, 0, 0.2]
    fn stereo_buffer(fragments: usize) -> Vec<f32> {
        let mut data = Vec::with_capacity(fragments * 8);
        for _ in 0..fragments {
            data.extend_from_slice(&[0.25, 0.0, 0.04, 0.8]);
        }
        for _ in 0..fragments {
            data.extend_from_slice(&[1.0, 0.0, 0.0, 0.2]);
        }
        data
    }

    fn view(fragments: usize) -> AudioView {
        let mut view = AudioView::default();
        view.set_view_data(&stereo_buffer(fragments), ANALYSIS_CHANNELS, 0, fragments)
            .unwrap();
        view
    }

    #[test]
    fn test_empty_view_has_no_columns() {
        let view = AudioView::default();
        assert!(view.column(&Viewport::default(), 1000.0, 0.5, 0.25).is_none());
        assert!(view.selection(&Viewport::default(), 1000.0).is_none());
    }

    #[test]
    fn test_left_and_right_halves() {
        let view = view(4000);
        let viewport = Viewport::default();

        let bottom = view.column(&viewport, 1000.0, 0.5, 0.2).unwrap();
        assert!((bottom[0] - 0.8).abs() < 1e-5);
        assert!((bottom[1] - 0.5).abs() < 1e-5);
        assert!((bottom[2] - 0.2).abs() < 1e-5);

        let top = view.column(&viewport, 1000.0, 0.5, 0.8).unwrap();
        assert!((top[0] - 0.2).abs() < 1e-5);
        assert!((top[1] - 1.0).abs() < 1e-5);
        assert!(top[2].abs() < 1e-5);

        let centre = view.column(&viewport, 1000.0, 0.5, 0.5).unwrap();
        assert!((centre[0] - 0.5).abs() < 1e-5, "Even mix at the centre line");
    }

    #[test]
    fn test_selection_follows_zoom() {
        let view = view(4000);
        let wide = view.selection(&Viewport::default(), 1000.0).unwrap();
        let zoomed = view.selection(&Viewport::new(4.0, 1.0, 0.0, 0.0), 1000.0).unwrap();
        assert_eq!(wide.lower, 2);
        assert!(zoomed.level < wide.level);
    }

    #[test]
    fn test_columns_past_window_are_silent() {
        let mut view = view(4000);
        view.set_window(3900, 200);
        let column = view.column(&Viewport::default(), 1000.0, 0.9, 0.2).unwrap();
        assert_eq!(column, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_display_shaping_is_applied() {
        let mut view = view(4000);
        view.set_display(WaveformDisplayConfig {
            max: ChannelShaping {
                pre_scale: 2.0,
                curve: 2.0,
                ..Default::default()
            },
            ..Default::default()
        });
        let column = view.column(&Viewport::default(), 1000.0, 0.5, 0.2).unwrap();
        // (0.8 / 2)^2
        assert!((column[0] - 0.16).abs() < 1e-5);
    }

    #[test]
    fn test_bad_buffer_keeps_previous_data() {
        let mut view = view(64);
        let err = view.set_view_data(&[0.0; 7], ANALYSIS_CHANNELS, 0, 1).unwrap_err();
        assert!(matches!(err, LodError::OddSplit { len: 7 }));
        assert_eq!(view.pyramid().map(|p| p.fragment_count()), Some(64));
    }

    #[test]
    fn test_lod_config_swap() {
        let mut view = view(4000);
        view.set_lod_config(LodConfig {
            levels: 32,
            level_bias: 1.0,
            interpolation: Interpolation::Linear,
        });
        let biased = view.selection(&Viewport::default(), 1000.0).unwrap();
        assert!(biased.level > 2.5);
    }

    #[test]
    fn test_smoothstep_edges() {
        assert_eq!(smoothstep(0.49, 0.51, 0.0), 0.0);
        assert_eq!(smoothstep(0.49, 0.51, 1.0), 1.0);
        assert!((smoothstep(0.49, 0.51, 0.5) - 0.5).abs() < 1e-4);
    }
}
