//! Neighborhood filters driven by a [`Kernel`].
//!
//! For each output pixel the kernel is centered on `(x, y)` and every
//! weight multiplies the source pixel under it. Neighbors that fall
//! outside the image are replaced by the nearest edge pixel, so the
//! lookup can never go out of bounds.
//!
//! [`Convolution`] truncates each weighted sum and clamps it to
//! `[0, 255]`. [`EdgeDetect`] runs the two Sobel masks side by side and
//! combines them by magnitude before clamping, which a single kernel
//! cannot express.

use crate::buffer::PixelBuffer;
use crate::clamp;
use crate::engine::PixelTransform;
use crate::kernel::Kernel;
use crate::types::{FilterError, Rgb};

/// Per-channel weighted sums of the neighborhood around `(x, y)`.
#[allow(clippy::cast_possible_wrap)]
fn accumulate(source: &PixelBuffer, kernel: &Kernel, x: u32, y: u32) -> [f32; 3] {
    let (rx, ry) = kernel.radius();
    let (cx, cy) = (i64::from(x), i64::from(y));
    let mut sums = [0.0f32; 3];

    for ky in 0..kernel.height() {
        let sy = cy + ky as i64 - ry as i64;
        for kx in 0..kernel.width() {
            let sx = cx + kx as i64 - rx as i64;
            let Some(neighbor) = source.sample_clamped(sx, sy) else {
                continue;
            };
            let w = kernel.weight(kx, ky);
            for (sum, &c) in sums.iter_mut().zip(&neighbor.0) {
                *sum += f32::from(c) * w;
            }
        }
    }

    sums
}

/// Truncate toward zero, then clamp to a channel value.
#[allow(clippy::cast_possible_truncation)]
fn truncate_channel(sum: f32) -> u8 {
    clamp::channel(sum as i32)
}

/// Weighted-neighborhood transform with an arbitrary odd kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct Convolution {
    kernel: Kernel,
}

impl Convolution {
    /// Convolve with `kernel`.
    #[must_use]
    pub const fn new(kernel: Kernel) -> Self {
        Self { kernel }
    }

    /// Uniform 3x3 blur.
    #[must_use]
    pub fn blur() -> Self {
        Self::new(Kernel::box_blur())
    }

    /// Gaussian blur with the given radius and spread.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidConfig`] for parameters
    /// [`Kernel::gaussian`] rejects.
    pub fn gaussian(radius: u32, sigma: f32) -> Result<Self, FilterError> {
        Kernel::gaussian(radius, sigma).map(Self::new)
    }

    /// The kernel this filter applies.
    #[must_use]
    pub const fn kernel(&self) -> &Kernel {
        &self.kernel
    }
}

impl PixelTransform for Convolution {
    fn compute_pixel(&self, source: &PixelBuffer, x: u32, y: u32) -> Rgb<u8> {
        let [r, g, b] = accumulate(source, &self.kernel, x, y);
        Rgb([truncate_channel(r), truncate_channel(g), truncate_channel(b)])
    }
}

/// Sobel gradient magnitude per channel:
/// `round(sqrt(Gx² + Gy²))`, clamped to `[0, 255]`.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeDetect {
    horizontal: Kernel,
    vertical: Kernel,
}

impl Default for EdgeDetect {
    fn default() -> Self {
        Self {
            horizontal: Kernel::sobel_x(),
            vertical: Kernel::sobel_y(),
        }
    }
}

impl PixelTransform for EdgeDetect {
    #[allow(clippy::cast_possible_truncation)]
    fn compute_pixel(&self, source: &PixelBuffer, x: u32, y: u32) -> Rgb<u8> {
        let gx = accumulate(source, &self.horizontal, x, y);
        let gy = accumulate(source, &self.vertical, x, y);
        let magnitude = |c: usize| clamp::channel(gx[c].hypot(gy[c]).round() as i32);
        Rgb([magnitude(0), magnitude(1), magnitude(2)])
    }
}
