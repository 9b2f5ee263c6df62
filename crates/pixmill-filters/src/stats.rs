//! Two-pass filters driven by whole-image statistics.
//!
//! Pass 1 is a pure scan that returns a statistics value
//! ([`ChannelStats`], [`ChannelMax`]). Pass 2 is a [`PixelTransform`]
//! that owns that value, so it cannot run before the scan has finished
//! and carries no state from one invocation to the next.
//!
//! Both passes define a fallback for empty channels: when a channel's
//! average (or maximum) is zero, the channel passes through unchanged
//! instead of dividing by zero.

use tracing::debug;

use crate::buffer::PixelBuffer;
use crate::clamp;
use crate::engine::PixelTransform;
use crate::types::{Channel, Rgb};

/// Per-channel integer averages and their common target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelStats {
    /// Truncated mean of each channel, in [`Channel`] order.
    pub averages: [u32; 3],
    /// Truncated mean of the three channel averages.
    pub target: u32,
}

impl ChannelStats {
    /// Scan every pixel of `source` and average each channel.
    ///
    /// An empty image yields all-zero statistics.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn scan(source: &PixelBuffer) -> Self {
        let mut sums = [0u64; 3];
        for pixel in source.pixels() {
            for (sum, &c) in sums.iter_mut().zip(&pixel.0) {
                *sum += u64::from(c);
            }
        }

        let count = source.dimensions().pixel_count();
        // Each average is at most 255, so the narrowing is lossless.
        let averages = sums.map(|s| s.checked_div(count).unwrap_or(0) as u32);
        let target = averages.iter().sum::<u32>() / 3;

        debug!(?averages, target, "channel averages");
        Self { averages, target }
    }

    /// Average of one channel.
    #[must_use]
    pub const fn average(&self, channel: Channel) -> u32 {
        self.averages[channel.index()]
    }
}

/// Gray-world color balance.
///
/// Rescales each channel so its average moves to the common target:
/// `out = channel * target / average`, clamped. A channel whose average
/// is zero is left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrayWorld {
    stats: ChannelStats,
}

impl GrayWorld {
    /// Balance toward already-computed statistics.
    #[must_use]
    pub const fn new(stats: ChannelStats) -> Self {
        Self { stats }
    }

    /// Run pass 1 over `source` and return the ready filter.
    #[must_use]
    pub fn scan(source: &PixelBuffer) -> Self {
        Self::new(ChannelStats::scan(source))
    }

    /// The statistics this filter balances with.
    #[must_use]
    pub const fn stats(&self) -> &ChannelStats {
        &self.stats
    }
}

impl PixelTransform for GrayWorld {
    fn compute_pixel(&self, source: &PixelBuffer, x: u32, y: u32) -> Rgb<u8> {
        let pixel = source.get(x, y).unwrap_or(Rgb([0, 0, 0]));
        let target = self.stats.target;
        Rgb(std::array::from_fn(|i| {
            rescale(pixel.0[i], target, self.stats.averages[i])
        }))
    }
}

/// `value * numerator / denominator`, clamped; identity when the
/// denominator is zero.
#[allow(clippy::cast_possible_truncation)]
fn rescale(value: u8, numerator: u32, denominator: u32) -> u8 {
    if denominator == 0 {
        return value;
    }
    let scaled = u64::from(value) * u64::from(numerator) / u64::from(denominator);
    clamp::channel(scaled.min(255) as i32)
}

/// Largest value of `channel` anywhere in `source`.
///
/// The scan stops as soon as it sees 255, since nothing can exceed it.
/// An empty image yields zero.
#[must_use]
pub fn channel_max(source: &PixelBuffer, channel: Channel) -> u8 {
    let idx = channel.index();
    let mut max = 0u8;
    for pixel in source.pixels() {
        max = max.max(pixel.0[idx]);
        if max == u8::MAX {
            break;
        }
    }
    max
}

/// Per-channel maxima.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMax {
    /// Maximum of each channel, in [`Channel`] order.
    pub maxima: [u8; 3],
}

impl ChannelMax {
    /// Scan `source` once per channel with [`channel_max`].
    #[must_use]
    pub fn scan(source: &PixelBuffer) -> Self {
        let maxima = Channel::ALL.map(|c| channel_max(source, c));
        debug!(?maxima, "channel maxima");
        Self { maxima }
    }
}

/// Exposure-style stretch: scales each channel so its brightest value
/// reaches 255. `out = channel * 255 / max`; a channel whose maximum
/// is zero is left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelStretch {
    maxima: ChannelMax,
}

impl ChannelStretch {
    /// Stretch toward already-computed maxima.
    #[must_use]
    pub const fn new(maxima: ChannelMax) -> Self {
        Self { maxima }
    }

    /// Run pass 1 over `source` and return the ready filter.
    #[must_use]
    pub fn scan(source: &PixelBuffer) -> Self {
        Self::new(ChannelMax::scan(source))
    }
}

impl PixelTransform for ChannelStretch {
    fn compute_pixel(&self, source: &PixelBuffer, x: u32, y: u32) -> Rgb<u8> {
        let pixel = source.get(x, y).unwrap_or(Rgb([0, 0, 0]));
        Rgb(std::array::from_fn(|i| {
            rescale(pixel.0[i], 255, u32::from(self.maxima.maxima[i]))
        }))
    }
}
