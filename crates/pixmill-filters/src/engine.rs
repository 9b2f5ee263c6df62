//! The iteration contract shared by every filter.
//!
//! [`process`] visits every pixel of the source in column-major order,
//! asks a [`PixelTransform`] for the output color, and writes it into a
//! freshly allocated result of the same size. Before each column it
//! reports progress to a [`ProgressSink`] and polls it for
//! cancellation; a cancelled run yields [`Outcome::Cancelled`] and no
//! image at all.
//!
//! # Strategy pattern
//!
//! The engine knows nothing about individual filters. Anything that can
//! compute one output pixel from the read-only source implements
//! [`PixelTransform`]; see [`crate::Filter`] for the closed set of
//! built-in filters.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, trace};

use crate::buffer::PixelBuffer;
use crate::types::Rgb;

/// Computes one output pixel from the source image.
///
/// Implementations read only from `source` and must not assume the
/// result is being written into the same buffer. `(x, y)` is always
/// inside the source.
pub trait PixelTransform {
    /// The output color for coordinate `(x, y)`.
    fn compute_pixel(&self, source: &PixelBuffer, x: u32, y: u32) -> Rgb<u8>;
}

impl<T: PixelTransform + ?Sized> PixelTransform for &T {
    fn compute_pixel(&self, source: &PixelBuffer, x: u32, y: u32) -> Rgb<u8> {
        (**self).compute_pixel(source, x, y)
    }
}

/// Receives progress reports and answers cancellation polls.
///
/// Written to and read from by the engine only. Reporting must not
/// block or fail.
pub trait ProgressSink {
    /// Record that `percent` (0-100) of the work is done.
    fn report(&mut self, percent: u8);

    /// Whether the caller wants the run aborted.
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl<S: ProgressSink + ?Sized> ProgressSink for &mut S {
    fn report(&mut self, percent: u8) {
        (**self).report(percent);
    }

    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

/// A sink that ignores progress and never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _percent: u8) {}
}

/// Shared cancellation flag.
///
/// Clones observe the same flag, so one clone can be handed to the
/// engine (inside a [`Monitor`]) while another is cancelled from a
/// different thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether [`cancel`](Self::cancel) has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl ProgressSink for CancelToken {
    fn report(&mut self, _percent: u8) {}

    fn is_cancelled(&self) -> bool {
        Self::is_cancelled(self)
    }
}

/// A progress callback paired with a [`CancelToken`].
pub struct Monitor<F> {
    on_progress: F,
    cancel: CancelToken,
}

impl<F: FnMut(u8)> Monitor<F> {
    /// Forward progress to `on_progress`; cancel through `cancel`.
    pub const fn new(on_progress: F, cancel: CancelToken) -> Self {
        Self {
            on_progress,
            cancel,
        }
    }

    /// The token this monitor polls.
    #[must_use]
    pub const fn token(&self) -> &CancelToken {
        &self.cancel
    }
}

impl<F: FnMut(u8)> ProgressSink for Monitor<F> {
    fn report(&mut self, percent: u8) {
        (self.on_progress)(percent);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Terminal state of one engine run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a completed outcome carries the result image"]
pub enum Outcome {
    /// Every pixel was computed.
    Completed(PixelBuffer),
    /// The sink requested cancellation; no image was produced.
    Cancelled,
}

impl Outcome {
    /// Returns `true` for [`Outcome::Cancelled`].
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The result image, if the run completed.
    #[must_use]
    pub fn into_image(self) -> Option<PixelBuffer> {
        match self {
            Self::Completed(image) => Some(image),
            Self::Cancelled => None,
        }
    }
}

/// Percentage reported before column `index` of `width`:
/// `round(100 * index / width)`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn column_percent(index: u32, width: u32) -> u8 {
    if width == 0 {
        return 100;
    }
    let (index, width) = (index as u64, width as u64);
    // Round half up in integer arithmetic.
    ((200 * index + width) / (2 * width)) as u8
}

/// Run `filter` over every pixel of `source`.
///
/// Columns are visited left to right. Before column `i` the engine
/// reports [`column_percent`]`(i, width)` and then polls
/// [`ProgressSink::is_cancelled`]; if cancellation was requested it
/// stops immediately and returns [`Outcome::Cancelled`]. Progress is
/// therefore reported exactly `width` times.
///
/// An image with zero width completes immediately without any reports.
pub fn process<T, P>(source: &PixelBuffer, filter: &T, progress: &mut P) -> Outcome
where
    T: PixelTransform + ?Sized,
    P: ProgressSink + ?Sized,
{
    let (width, height) = (source.width(), source.height());
    trace!(width, height, "engine::process");

    let mut result = PixelBuffer::new(width, height);

    for x in 0..width {
        progress.report(column_percent(x, width));
        if progress.is_cancelled() {
            debug!(column = x, width, "cancelled");
            return Outcome::Cancelled;
        }
        for y in 0..height {
            result.put(x, y, filter.compute_pixel(source, x, y));
        }
    }

    Outcome::Completed(result)
}
