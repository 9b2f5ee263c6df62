//! pixmill-filters: Pure raster filter engine (sans-IO).
//!
//! Applies per-pixel and neighborhood-convolution filters to an RGB
//! image, producing a new image of identical dimensions:
//! point filters (invert, grayscale, sepia, brightness) ->
//! kernel convolutions (blur, Gaussian, edge detection, custom) ->
//! two-pass statistics filters (gray-world balance, channel stretch).
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! pixel buffers (or encoded byte slices via [`PixelBuffer::decode`]) and
//! reports progress through a caller-supplied [`ProgressSink`]. All
//! filesystem interaction lives in the `pixmill` binary.

pub mod buffer;
pub mod clamp;
pub mod convolve;
pub mod diagnostics;
pub mod engine;
pub mod filter;
pub mod kernel;
pub mod point;
pub mod stats;
pub mod types;

pub use buffer::PixelBuffer;
pub use diagnostics::{Clock, ProcessDiagnostics, apply_with_diagnostics};
pub use engine::{CancelToken, Monitor, NoProgress, Outcome, PixelTransform, ProgressSink};
pub use filter::{Filter, FilterKind};
pub use kernel::Kernel;
pub use types::{Channel, Dimensions, FilterError, Rgb, RgbImage};

/// Run the filter described by `kind` over `source`.
///
/// # Steps
///
/// 1. Validate the configuration and prepare the filter (two-pass
///    filters scan `source` for their statistics here)
/// 2. Visit every pixel in column-major order, reporting progress to
///    `progress` and polling it for cancellation before each column
///
/// The source is never modified; a completed run returns a new buffer of
/// the same dimensions.
///
/// # Errors
///
/// Returns [`FilterError::InvalidKernel`] for a malformed custom kernel.
/// Returns [`FilterError::InvalidConfig`] for out-of-range Gaussian
/// parameters. Both are detected before any pixel is processed.
/// Cancellation is not an error; it yields [`Outcome::Cancelled`].
pub fn apply<P: ProgressSink + ?Sized>(
    source: &PixelBuffer,
    kind: &FilterKind,
    progress: &mut P,
) -> Result<Outcome, FilterError> {
    let filter = kind.prepare(source)?;
    Ok(engine::process(source, &filter, progress))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Left half black, right half white.
    fn split_image(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        })
    }

    #[test]
    fn apply_returns_image_of_same_dimensions() {
        let source = split_image(8, 5);
        let kinds = [
            FilterKind::Invert,
            FilterKind::Blur,
            FilterKind::EdgeDetect,
            FilterKind::GrayWorld,
        ];
        for kind in &kinds {
            let out = apply(&source, kind, &mut NoProgress)
                .unwrap()
                .into_image()
                .unwrap();
            assert_eq!(out.dimensions(), source.dimensions(), "{kind}");
        }
    }

    #[test]
    fn apply_leaves_source_untouched() {
        let source = split_image(6, 6);
        let copy = source.clone();
        let _ = apply(&source, &FilterKind::Invert, &mut NoProgress).unwrap();
        assert_eq!(source, copy);
    }

    #[test]
    fn apply_fails_before_reporting_progress() {
        let mut reports = Vec::new();
        let mut monitor = Monitor::new(|p| reports.push(p), CancelToken::new());
        let kind = FilterKind::Convolve {
            kernel: vec![vec![1.0, 1.0]],
        };
        let result = apply(&split_image(4, 4), &kind, &mut monitor);
        assert!(matches!(result, Err(FilterError::InvalidKernel(_))));
        drop(monitor);
        assert!(reports.is_empty());
    }

    #[test]
    fn apply_decoded_png() {
        let img = RgbImage::from_fn(3, 2, |x, _| Rgb([u8::try_from(x * 80).unwrap(), 0, 0]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .unwrap();

        let source = PixelBuffer::decode(&bytes).unwrap();
        let out = apply(&source, &FilterKind::Invert, &mut NoProgress)
            .unwrap()
            .into_image()
            .unwrap();
        assert_eq!(out.get(2, 1), Some(Rgb([95, 255, 255])));
    }

    #[test]
    fn cancelled_token_stops_apply() {
        let token = CancelToken::new();
        let mut monitor = Monitor::new(|_| {}, token.clone());
        token.cancel();
        let outcome = apply(&split_image(4, 4), &FilterKind::Grayscale, &mut monitor).unwrap();
        assert!(outcome.is_cancelled());
    }
}
