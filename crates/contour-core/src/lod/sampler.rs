//! Reading interpolated values out of a pyramid

use super::pyramid::LodPyramid;
use super::selector::LodSelection;
use crate::config::Interpolation;

/// Samples a pyramid at fractional level-0 positions
///
/// `data_offset` fragments at the start of level 0 are skipped and only
/// `data_length` fragments after them are visible. Positions outside that
/// window, or past the end of a level, read as zero.
#[derive(Debug, Clone, Copy)]
pub struct LodSampler<'a> {
    pyramid: &'a LodPyramid,
    data_offset: usize,
    data_length: usize,
    interpolation: Interpolation,
}

impl<'a> LodSampler<'a> {
    /// Sampler over the whole pyramid
    pub fn new(pyramid: &'a LodPyramid, interpolation: Interpolation) -> Self {
        Self {
            pyramid,
            data_offset: 0,
            data_length: pyramid.fragment_count(),
            interpolation,
        }
    }

    /// Restrict sampling to a window of level 0
    pub fn with_window(mut self, data_offset: usize, data_length: usize) -> Self {
        let available = self.pyramid.fragment_count().saturating_sub(data_offset);
        self.data_offset = data_offset;
        self.data_length = data_length.min(available);
        self
    }

    pub fn data_length(&self) -> usize {
        self.data_length
    }

    /// One channel of one level at `position` (fragments, relative to the window start)
    pub fn sample_level(&self, level: usize, position: f64, channel: usize) -> f32 {
        if channel >= self.pyramid.channels()
            || !position.is_finite()
            || position < 0.0
            || position >= self.data_length as f64
        {
            return 0.0;
        }

        let level_len = self.pyramid.level_len(level);
        if level_len == 0 {
            return 0.0;
        }

        let scaled = (self.data_offset as f64 + position) / (1u64 << level.min(63)) as f64;
        let low = scaled.floor() as usize;
        if low >= level_len {
            return 0.0;
        }
        let high = (low + 1).min(level_len - 1);
        let fraction = (scaled - scaled.floor()) as f32;

        let (Some(a), Some(b)) = (
            self.pyramid.fragment(level, low),
            self.pyramid.fragment(level, high),
        ) else {
            return 0.0;
        };

        let mix = self.interpolation.ease(fraction);
        a[channel] + (b[channel] - a[channel]) * mix
    }

    /// Every channel at `position`, blended across the selected levels
    ///
    /// Writes `min(out.len(), channels)` values.
    pub fn sample_into(&self, selection: &LodSelection, position: f64, out: &mut [f32]) {
        for (channel, value) in out.iter_mut().enumerate().take(self.pyramid.channels()) {
            let low = self.sample_level(selection.lower, position, channel);
            let high = self.sample_level(selection.upper, position, channel);
            *value = low + (high - low) * selection.blend;
        }
    }
}
