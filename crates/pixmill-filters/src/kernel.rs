//! Convolution kernels.
//!
//! A [`Kernel`] is a row-major grid of `f32` weights with odd width and
//! height, so it has a well-defined center. The constructors validate
//! that shape up front; a malformed kernel is rejected before any pixel
//! is processed.
//!
//! - [`Kernel::box_blur`] - uniform 3x3 average
//! - [`Kernel::gaussian`] - normalized Gaussian from a radius and spread
//! - [`Kernel::sobel_x`], [`Kernel::sobel_y`] - directional gradients

use crate::types::FilterError;

/// Default Gaussian radius (kernel is `2 * radius + 1` square).
pub const DEFAULT_GAUSSIAN_RADIUS: u32 = 3;

/// Default Gaussian spread.
pub const DEFAULT_GAUSSIAN_SIGMA: f32 = 2.0;

/// Largest accepted Gaussian radius (a 129x129 kernel).
pub const MAX_GAUSSIAN_RADIUS: u32 = 64;

/// A 2D weight matrix with odd dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    data: Vec<f32>,
    width: usize,
    height: usize,
}

impl Kernel {
    /// Build a kernel from row-major weights.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidKernel`] if either dimension is
    /// zero or even, if `data` does not hold exactly `width * height`
    /// weights, or if any weight is NaN or infinite.
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Result<Self, FilterError> {
        if width == 0 || height == 0 {
            return Err(FilterError::InvalidKernel(format!(
                "kernel must not be empty, got {width}x{height}"
            )));
        }
        if width % 2 == 0 || height % 2 == 0 {
            return Err(FilterError::InvalidKernel(format!(
                "kernel dimensions must be odd, got {width}x{height}"
            )));
        }
        if data.len() != width * height {
            return Err(FilterError::InvalidKernel(format!(
                "kernel data size {} doesn't match {width}x{height}",
                data.len()
            )));
        }
        if let Some(bad) = data.iter().find(|w| !w.is_finite()) {
            return Err(FilterError::InvalidKernel(format!(
                "kernel weights must be finite, got {bad}"
            )));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Build a kernel from a list of rows.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidKernel`] if the rows are ragged or
    /// the resulting shape is rejected by [`Kernel::new`].
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self, FilterError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(FilterError::InvalidKernel(format!(
                "row {i} has {} weights, expected {width}",
                row.len()
            )));
        }
        Self::new(width, height, rows.concat())
    }

    /// Uniform 3x3 average: every weight is 1/9.
    #[must_use]
    pub fn box_blur() -> Self {
        Self {
            data: vec![1.0 / 9.0; 9],
            width: 3,
            height: 3,
        }
    }

    /// Normalized Gaussian kernel.
    ///
    /// Raw weights are `exp(-(i² + j²) / sigma²)` for `i, j` in
    /// `[-radius, radius]`, then divided by their sum so the kernel
    /// preserves overall brightness.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidConfig`] if `sigma` is not a finite
    /// positive number, if `sigma²` underflows or overflows `f32`, or
    /// `radius` exceeds [`MAX_GAUSSIAN_RADIUS`].
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
    pub fn gaussian(radius: u32, sigma: f32) -> Result<Self, FilterError> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(FilterError::InvalidConfig(format!(
                "gaussian sigma must be finite and positive, got {sigma}"
            )));
        }
        if radius > MAX_GAUSSIAN_RADIUS {
            return Err(FilterError::InvalidConfig(format!(
                "gaussian radius must be at most {MAX_GAUSSIAN_RADIUS}, got {radius}"
            )));
        }

        let spread = sigma * sigma;
        if !spread.is_normal() {
            return Err(FilterError::InvalidConfig(format!(
                "gaussian sigma {sigma} is out of range: sigma squared must be a normal f32"
            )));
        }

        let r = radius as i32;
        let size = 2 * radius as usize + 1;

        let mut data = Vec::with_capacity(size * size);
        for j in -r..=r {
            for i in -r..=r {
                let d = (i * i + j * j) as f32;
                data.push((-d / spread).exp());
            }
        }

        let norm: f32 = data.iter().sum();
        if !norm.is_finite() || norm <= 0.0 {
            return Err(FilterError::InvalidConfig(format!(
                "gaussian weights cannot be normalized for radius {radius}, sigma {sigma}"
            )));
        }
        for w in &mut data {
            *w /= norm;
        }

        Ok(Self {
            data,
            width: size,
            height: size,
        })
    }

    /// Horizontal-gradient Sobel mask (right minus left).
    #[must_use]
    pub fn sobel_x() -> Self {
        #[rustfmt::skip]
        let data = vec![
            -1.0, 0.0, 1.0,
            -2.0, 0.0, 2.0,
            -1.0, 0.0, 1.0,
        ];
        Self {
            data,
            width: 3,
            height: 3,
        }
    }

    /// Vertical-gradient Sobel mask (bottom minus top).
    #[must_use]
    pub fn sobel_y() -> Self {
        #[rustfmt::skip]
        let data = vec![
            -1.0, -2.0, -1.0,
             0.0,  0.0,  0.0,
             1.0,  2.0,  1.0,
        ];
        Self {
            data,
            width: 3,
            height: 3,
        }
    }

    /// Kernel width (always odd).
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Kernel height (always odd).
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Half-extent on each axis: `(width / 2, height / 2)`.
    #[must_use]
    pub const fn radius(&self) -> (usize, usize) {
        (self.width / 2, self.height / 2)
    }

    /// Weight at column `kx`, row `ky` (zero-based from the top-left).
    #[must_use]
    pub fn weight(&self, kx: usize, ky: usize) -> f32 {
        self.data[ky * self.width + kx]
    }

    /// Row-major weights.
    #[must_use]
    pub fn weights(&self) -> &[f32] {
        &self.data
    }

    /// Sum of all weights.
    #[must_use]
    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }
}
