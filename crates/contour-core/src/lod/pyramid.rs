//! Pyramid construction
//!
//! Level `L+1` holds `ceil(len(L) / 2)` fragments, each the componentwise
//! average of fragments `2i` and `2i+1` of level `L`. An odd trailing fragment
//! is averaged with itself. Construction is O(N), one-shot and immutable
//! afterwards; rebuild only when the source buffer changes.

use super::error::{LodError, LodResult};

/// Zeroed fragments appended after the last level
///
/// Sampling reads the fragment after the requested one; the guard keeps that
/// read inside the buffer at the very end of the coarsest level.
pub const GUARD_FRAGMENTS: usize = 2;

/// Fragment count of every level for `fragments` input fragments
///
/// Stops after `max_levels` levels or once a level has a single fragment,
/// whichever comes first. An empty input gives one empty level.
pub fn level_lengths(fragments: usize, max_levels: usize) -> Vec<usize> {
    if fragments == 0 {
        return vec![0];
    }

    let max_levels = max_levels.max(1);
    let mut lengths = vec![fragments];
    while lengths.len() < max_levels {
        let last = lengths[lengths.len() - 1];
        if last <= 1 {
            break;
        }
        lengths.push(last.div_ceil(2));
    }
    lengths
}

/// Multi-resolution analysis data in one contiguous backing buffer
#[derive(Debug, Clone, PartialEq)]
pub struct LodPyramid {
    channels: usize,
    /// Start of each level in fragments, plus the total as a sentinel
    offsets: Vec<usize>,
    /// All levels back to back followed by the guard, interleaved by channel
    data: Vec<f32>,
}

impl LodPyramid {
    /// Build a pyramid from an interleaved buffer of `channels` values per fragment
    pub fn build(raw: &[f32], channels: usize, max_levels: usize) -> LodResult<Self> {
        if channels == 0 {
            return Err(LodError::ZeroChannels);
        }
        if raw.len() % channels != 0 {
            return Err(LodError::RaggedBuffer {
                len: raw.len(),
                channels,
            });
        }

        let lengths = level_lengths(raw.len() / channels, max_levels);

        let mut offsets = Vec::with_capacity(lengths.len() + 1);
        let mut total = 0;
        for len in &lengths {
            offsets.push(total);
            total += len;
        }
        offsets.push(total);

        let mut data = vec![0.0f32; (total + GUARD_FRAGMENTS) * channels];
        data[..raw.len()].copy_from_slice(raw);

        for level in 1..lengths.len() {
            let src_start = offsets[level - 1] * channels;
            let dst_start = offsets[level] * channels;
            let (head, tail) = data.split_at_mut(dst_start);
            let src = &head[src_start..src_start + lengths[level - 1] * channels];
            let dst = &mut tail[..lengths[level] * channels];
            downsample_level(src, dst, channels);
        }

        log::info!(
            "LodPyramid::build: {} fragments x {} channels -> {} levels, {} fragments total",
            lengths[0],
            channels,
            lengths.len(),
            total
        );

        Ok(Self {
            channels,
            offsets,
            data,
        })
    }

    /// Values per fragment
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of levels, including level 0
    pub fn level_count(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Index of the coarsest level
    pub fn max_level(&self) -> usize {
        self.level_count() - 1
    }

    /// Fragment count of level 0
    pub fn fragment_count(&self) -> usize {
        self.level_len(0)
    }

    /// True for the degenerate pyramid built from an empty buffer
    pub fn is_empty(&self) -> bool {
        self.fragment_count() == 0
    }

    /// Level start offsets in fragments; the last entry is the total length
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Fragment count of `level` (0 for levels that don't exist)
    pub fn level_len(&self, level: usize) -> usize {
        match (self.offsets.get(level), self.offsets.get(level + 1)) {
            (Some(start), Some(end)) => end - start,
            _ => 0,
        }
    }

    /// Interleaved values of one level
    pub fn level(&self, level: usize) -> Option<&[f32]> {
        if level >= self.level_count() {
            return None;
        }
        let start = self.offsets[level] * self.channels;
        let end = self.offsets[level + 1] * self.channels;
        Some(&self.data[start..end])
    }

    /// Channel values of fragment `index` at `level`
    pub fn fragment(&self, level: usize, index: usize) -> Option<&[f32]> {
        if index >= self.level_len(level) {
            return None;
        }
        let start = (self.offsets[level] + index) * self.channels;
        Some(&self.data[start..start + self.channels])
    }

    /// Channel values at a flat fragment index of the backing buffer
    ///
    /// Covers the guard, so reads one past a level's end stay in bounds.
    pub fn flat_fragment(&self, flat_index: usize) -> Option<&[f32]> {
        let start = flat_index * self.channels;
        self.data.get(start..start + self.channels)
    }

    /// Whole backing buffer (levels and guard), for upload to a renderer
    pub fn backing(&self) -> &[f32] {
        &self.data
    }

    /// Backing buffer as raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Per-channel maximum of one level
    pub fn level_peaks(&self, level: usize) -> Vec<f32> {
        let mut peaks = vec![f32::NEG_INFINITY; self.channels];
        if let Some(values) = self.level(level) {
            for fragment in values.chunks_exact(self.channels) {
                for (peak, &value) in peaks.iter_mut().zip(fragment) {
                    *peak = peak.max(value);
                }
            }
        }
        peaks
            .into_iter()
            .map(|p| if p.is_finite() { p } else { 0.0 })
            .collect()
    }
}

/// Halve `src` into `dst`, averaging neighbouring fragment pairs
fn downsample_level(src: &[f32], dst: &mut [f32], channels: usize) {
    let src_fragments = src.len() / channels;
    for (i, out) in dst.chunks_exact_mut(channels).enumerate() {
        let a = 2 * i * channels;
        let b = (2 * i + 1).min(src_fragments - 1) * channels;
        for (c, value) in out.iter_mut().enumerate() {
            *value = (src[a + c] + src[b + c]) * 0.5;
        }
    }
}

// =============================================================================
// Stereo
// =============================================================================

/// Separate pyramids for the left and right analysis channels
#[derive(Debug, Clone, PartialEq)]
pub struct StereoLodPyramid {
    pub left: LodPyramid,
    pub right: LodPyramid,
}

impl StereoLodPyramid {
    /// Build from one buffer holding the left half followed by the right half
    pub fn from_split(view_data: &[f32], channels: usize, max_levels: usize) -> LodResult<Self> {
        if view_data.len() % 2 != 0 {
            return Err(LodError::OddSplit {
                len: view_data.len(),
            });
        }
        let (left, right) = view_data.split_at(view_data.len() / 2);
        Ok(Self {
            left: LodPyramid::build(left, channels, max_levels)?,
            right: LodPyramid::build(right, channels, max_levels)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    pub fn fragment_count(&self) -> usize {
        self.left.fragment_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Ramp buffer: fragment i holds [i, 2i, -i, 1]
    fn ramp(fragments: usize) -> Vec<f32> {
        (0..fragments)
            .flat_map(|i| {
                let i = i as f32;
                [i, 2.0 * i, -i, 1.0]
            })
            .collect()
    }

    #[test]
    fn test_level_lengths_sixteen_fragments() {
        let pyramid = LodPyramid::build(&ramp(16), 4, 5).unwrap();
        let lengths: Vec<usize> = (0..pyramid.level_count()).map(|l| pyramid.level_len(l)).collect();
        assert_eq!(lengths, vec![16, 8, 4, 2, 1]);
    }

    #[test]
    fn test_level_count_stops_at_single_fragment() {
        assert_eq!(level_lengths(16, 32), vec![16, 8, 4, 2, 1]);
        assert_eq!(level_lengths(13, 32), vec![13, 7, 4, 2, 1]);
        assert_eq!(level_lengths(13, 2), vec![13, 7]);
        assert_eq!(level_lengths(1, 32), vec![1]);
    }

    #[test]
    fn test_length_law_for_many_sizes() {
        for fragments in 1..300 {
            let pyramid = LodPyramid::build(&vec![0.5; fragments * 4], 4, 32).unwrap();
            let offsets = pyramid.offsets();
            let mut sum = 0;
            for level in 0..pyramid.level_count() {
                let len = pyramid.level_len(level);
                if level + 1 < pyramid.level_count() {
                    assert_eq!(pyramid.level_len(level + 1), len.div_ceil(2));
                }
                sum += len;
            }
            assert_eq!(offsets[pyramid.level_count()], sum, "sentinel for N={}", fragments);
            assert_eq!(pyramid.backing().len(), (sum + GUARD_FRAGMENTS) * 4);
        }
    }

    #[test]
    fn test_averaging_law() {
        let raw: Vec<f32> = (0..37 * 4).map(|i| ((i * 7919) % 101) as f32 / 10.0).collect();
        let pyramid = LodPyramid::build(&raw, 4, 32).unwrap();

        for level in 0..pyramid.max_level() {
            let len = pyramid.level_len(level);
            for i in 0..pyramid.level_len(level + 1) {
                let a = pyramid.fragment(level, 2 * i).unwrap();
                let b = pyramid.fragment(level, (2 * i + 1).min(len - 1)).unwrap();
                let coarse = pyramid.fragment(level + 1, i).unwrap();
                for c in 0..4 {
                    let expected = (a[c] + b[c]) / 2.0;
                    assert!(
                        (coarse[c] - expected).abs() < 1e-4,
                        "level {} fragment {} channel {}: {} != {}",
                        level + 1,
                        i,
                        c,
                        coarse[c],
                        expected
                    );
                }
            }
        }
    }

    #[test]
    fn test_odd_tail_pairs_with_itself() {
        let pyramid = LodPyramid::build(&ramp(3), 4, 32).unwrap();
        assert_eq!(pyramid.fragment(1, 0).unwrap(), &[0.5, 1.0, -0.5, 1.0]);
        assert_eq!(pyramid.fragment(1, 1).unwrap(), &[2.0, 4.0, -2.0, 1.0]);
    }

    #[test]
    fn test_empty_buffer_is_degenerate() {
        let pyramid = LodPyramid::build(&[], 4, 32).unwrap();
        assert!(pyramid.is_empty());
        assert_eq!(pyramid.level_count(), 1);
        assert_eq!(pyramid.offsets(), &[0, 0]);
        assert_eq!(pyramid.level(0).unwrap().len(), 0);
    }

    #[test]
    fn test_invalid_layouts() {
        assert_eq!(LodPyramid::build(&[1.0], 0, 4), Err(LodError::ZeroChannels));
        assert_eq!(
            LodPyramid::build(&[1.0; 6], 4, 4),
            Err(LodError::RaggedBuffer { len: 6, channels: 4 })
        );
        assert_eq!(
            StereoLodPyramid::from_split(&[1.0; 9], 1, 4),
            Err(LodError::OddSplit { len: 9 })
        );
    }

    #[test]
    fn test_stereo_split() {
        let mut data = vec![1.0; 8 * 4];
        data.extend(vec![3.0; 8 * 4]);
        let stereo = StereoLodPyramid::from_split(&data, 4, 32).unwrap();

        assert_eq!(stereo.fragment_count(), 8);
        assert_eq!(stereo.left.fragment(3, 0).unwrap(), &[1.0; 4]);
        assert_eq!(stereo.right.fragment(3, 0).unwrap(), &[3.0; 4]);
    }

    #[test]
    fn test_guard_and_bytes() {
        let pyramid = LodPyramid::build(&ramp(4), 4, 32).unwrap();
        let total = pyramid.offsets()[pyramid.level_count()];
        assert_eq!(pyramid.flat_fragment(total).unwrap(), &[0.0; 4]);
        assert!(pyramid.flat_fragment(total + GUARD_FRAGMENTS).is_none());
        assert_eq!(pyramid.as_bytes().len(), pyramid.backing().len() * 4);
    }

    #[test]
    fn test_level_peaks() {
        let pyramid = LodPyramid::build(&ramp(8), 4, 32).unwrap();
        assert_eq!(pyramid.level_peaks(0), vec![7.0, 14.0, 0.0, 1.0]);
        assert_eq!(pyramid.level_peaks(99), vec![0.0; 4]);
    }
}
