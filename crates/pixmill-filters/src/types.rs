//! Shared types for the pixmill filter engine.

use serde::{Deserialize, Serialize};

/// Re-export `Rgb` so downstream crates can build colors without
/// depending on `image` directly.
pub use image::Rgb;

/// Re-export `RgbImage` so callers can hand the engine an image they
/// decoded themselves.
pub use image::RgbImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Total number of pixels (`width * height`).
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Returns `true` if either axis is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// One of the three color channels of an RGB pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Red, index 0.
    Red,
    /// Green, index 1.
    Green,
    /// Blue, index 2.
    Blue,
}

impl Channel {
    /// All channels in storage order.
    pub const ALL: [Self; 3] = [Self::Red, Self::Green, Self::Blue];

    /// Index of this channel inside an [`Rgb`] pixel.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
        }
    }
}

/// Errors that can occur while preparing or running a filter.
///
/// Cancellation is deliberately absent: a cancelled run is reported as
/// [`Outcome::Cancelled`](crate::Outcome::Cancelled), not as an error.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// A convolution kernel has even or zero dimensions, or its weights
    /// do not fill the declared shape.
    #[error("invalid kernel: {0}")]
    InvalidKernel(String),

    /// Filter parameters are outside their documented range.
    #[error("invalid filter configuration: {0}")]
    InvalidConfig(String),

    /// A pixel write addressed a coordinate outside the buffer.
    #[error("pixel ({x}, {y}) is outside a {width}x{height} image")]
    OutOfBounds {
        /// Requested column.
        x: u32,
        /// Requested row.
        y: u32,
        /// Buffer width.
        width: u32,
        /// Buffer height.
        height: u32,
    },
}
