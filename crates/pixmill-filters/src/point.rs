//! Point filters: each output pixel depends only on the source pixel at
//! the same coordinate.
//!
//! Arithmetic is widened to `i32` and bounded with
//! [`clamp::channel`] so sums that leave `[0, 255]` saturate instead of
//! wrapping.

use crate::buffer::PixelBuffer;
use crate::clamp;
use crate::engine::PixelTransform;
use crate::types::Rgb;

/// Default warmth added by [`Sepia`].
pub const DEFAULT_SEPIA_WARMTH: i32 = 40;

/// Default offset added by [`Brightness`].
pub const DEFAULT_BRIGHTNESS_OFFSET: i32 = 100;

/// Luminance weights, in hundredths: `0.36 R + 0.53 G + 0.11 B`.
///
/// These are not the ITU coefficients. They sum to exactly 1.0 and are
/// kept as-is.
const LUMA_R: i32 = 36;
const LUMA_G: i32 = 53;
const LUMA_B: i32 = 11;

/// Truncated integer luminance of a pixel.
///
/// Evaluated in integer hundredths so that pure white maps to exactly
/// 255.
#[must_use]
pub fn luminance(pixel: Rgb<u8>) -> i32 {
    let [r, g, b] = pixel.0;
    (LUMA_R * i32::from(r) + LUMA_G * i32::from(g) + LUMA_B * i32::from(b)) / 100
}

/// Fetch the source pixel for a point filter.
///
/// The engine guarantees `(x, y)` is in bounds; the fallback keeps this
/// panic-free regardless.
fn source_pixel(source: &PixelBuffer, x: u32, y: u32) -> Rgb<u8> {
    source.get(x, y).unwrap_or(Rgb([0, 0, 0]))
}

/// `255 - channel` for every channel. Applying it twice is the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Invert;

impl PixelTransform for Invert {
    fn compute_pixel(&self, source: &PixelBuffer, x: u32, y: u32) -> Rgb<u8> {
        let [r, g, b] = source_pixel(source, x, y).0;
        Rgb([255 - r, 255 - g, 255 - b])
    }
}

/// All three channels set to the pixel's [`luminance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Grayscale;

impl PixelTransform for Grayscale {
    fn compute_pixel(&self, source: &PixelBuffer, x: u32, y: u32) -> Rgb<u8> {
        let gray = clamp::channel(luminance(source_pixel(source, x, y)));
        Rgb([gray, gray, gray])
    }
}

/// Warm-toned monochrome.
///
/// With `intensity` the pixel's [`luminance`] and `k` the warmth:
/// `R = intensity + 2k`, `G = intensity + k/2`, `B = intensity - k`,
/// each clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sepia {
    /// Warmth constant `k`.
    pub warmth: i32,
}

impl Default for Sepia {
    fn default() -> Self {
        Self {
            warmth: DEFAULT_SEPIA_WARMTH,
        }
    }
}

impl PixelTransform for Sepia {
    #[allow(clippy::cast_possible_truncation)]
    fn compute_pixel(&self, source: &PixelBuffer, x: u32, y: u32) -> Rgb<u8> {
        let intensity = luminance(source_pixel(source, x, y));
        let k = self.warmth;
        let green = 0.5f64.mul_add(f64::from(k), f64::from(intensity)) as i32;
        Rgb([
            clamp::channel(intensity.saturating_add(k.saturating_mul(2))),
            clamp::channel(green),
            clamp::channel(intensity.saturating_sub(k)),
        ])
    }
}

/// Add a fixed offset to every channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Brightness {
    /// Signed offset; negative values darken.
    pub offset: i32,
}

impl Default for Brightness {
    fn default() -> Self {
        Self {
            offset: DEFAULT_BRIGHTNESS_OFFSET,
        }
    }
}

impl PixelTransform for Brightness {
    fn compute_pixel(&self, source: &PixelBuffer, x: u32, y: u32) -> Rgb<u8> {
        let shift = |c: u8| clamp::channel(i32::from(c).saturating_add(self.offset));
        let [r, g, b] = source_pixel(source, x, y).0;
        Rgb([shift(r), shift(g), shift(b)])
    }
}
