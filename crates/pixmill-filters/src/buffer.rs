//! RGB pixel grid with bounds-checked access.
//!
//! [`PixelBuffer`] wraps an [`RgbImage`] and is the only image type the
//! engine reads from and writes to. Alpha is dropped on conversion:
//! filters see three opaque 8-bit channels.

use image::DynamicImage;

use crate::clamp;
use crate::types::{Dimensions, FilterError, Rgb, RgbImage};

/// A fixed-size 2D grid of RGB pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    image: RgbImage,
}

impl PixelBuffer {
    /// Allocate a black buffer of the given size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::new(width, height),
        }
    }

    /// Build a buffer by evaluating `f` at every coordinate.
    #[must_use]
    pub fn from_fn(width: u32, height: u32, f: impl FnMut(u32, u32) -> Rgb<u8>) -> Self {
        Self {
            image: RgbImage::from_fn(width, height, f),
        }
    }

    /// Build a buffer filled with a single color.
    #[must_use]
    pub fn filled(width: u32, height: u32, color: Rgb<u8>) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, color),
        }
    }

    /// Decode raw image bytes (PNG, JPEG, BMP, WebP) into an RGB buffer.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::EmptyInput`] if `bytes` is empty.
    /// Returns [`FilterError::ImageDecode`] if the format is
    /// unrecognized or the data is corrupt.
    pub fn decode(bytes: &[u8]) -> Result<Self, FilterError> {
        if bytes.is_empty() {
            return Err(FilterError::EmptyInput);
        }

        let decoded = image::load_from_memory(bytes)?;
        Ok(Self::from(decoded))
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Width and height together.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }

    /// The pixel at `(x, y)`, or `None` outside the buffer.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<Rgb<u8>> {
        self.image.get_pixel_checked(x, y).copied()
    }

    /// Overwrite the pixel at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::OutOfBounds`] if `(x, y)` lies outside
    /// the buffer.
    pub fn set(&mut self, x: u32, y: u32, color: Rgb<u8>) -> Result<(), FilterError> {
        let (width, height) = (self.width(), self.height());
        match self.image.get_pixel_mut_checked(x, y) {
            Some(pixel) => {
                *pixel = color;
                Ok(())
            }
            None => Err(FilterError::OutOfBounds {
                x,
                y,
                width,
                height,
            }),
        }
    }

    /// Unchecked write for the engine, whose coordinates come from the
    /// buffer's own extent.
    pub(crate) fn put(&mut self, x: u32, y: u32, color: Rgb<u8>) {
        self.image.put_pixel(x, y, color);
    }

    /// The pixel nearest to `(x, y)`, replicating edge pixels for
    /// coordinates outside the buffer.
    ///
    /// Returns `None` only when the buffer has zero width or height.
    #[must_use]
    pub fn sample_clamped(&self, x: i64, y: i64) -> Option<Rgb<u8>> {
        let (width, height) = (self.width(), self.height());
        if width == 0 || height == 0 {
            return None;
        }
        self.get(clamp::coordinate(x, width), clamp::coordinate(y, height))
    }

    /// Iterate over every pixel in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = &Rgb<u8>> {
        self.image.pixels()
    }

    /// Borrow the underlying `image` buffer.
    #[must_use]
    pub const fn as_image(&self) -> &RgbImage {
        &self.image
    }

    /// Consume the buffer and return the underlying `image` buffer.
    #[must_use]
    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

impl From<RgbImage> for PixelBuffer {
    fn from(image: RgbImage) -> Self {
        Self { image }
    }
}

impl From<DynamicImage> for PixelBuffer {
    fn from(image: DynamicImage) -> Self {
        Self {
            image: image.to_rgb8(),
        }
    }
}

impl From<PixelBuffer> for RgbImage {
    fn from(buffer: PixelBuffer) -> Self {
        buffer.image
    }
}
