//! Per-invocation diagnostics: timing, progress counts, and outcome.
//!
//! [`apply_with_diagnostics`] runs a filter exactly like
//! [`apply`](crate::apply) while timing the preparation pass (kernel
//! construction, statistics scan) separately from the pixel pass.
//!
//! The crate has no time source of its own. Callers supply a [`Clock`];
//! the CLI backs it with [`std::time::Instant`], tests use a fake.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::buffer::PixelBuffer;
use crate::engine::{self, Outcome, ProgressSink};
use crate::filter::FilterKind;
use crate::types::{Dimensions, FilterError};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// A monotonic time source.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single filter run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessDiagnostics {
    /// Filter tag, as in [`FilterKind::name`].
    pub filter: String,
    /// Source image dimensions.
    pub dimensions: Dimensions,
    /// Configuration validation plus any statistics scan.
    #[serde(with = "duration_serde")]
    pub prepare_duration: Duration,
    /// The engine's per-pixel pass (up to cancellation, if any).
    #[serde(with = "duration_serde")]
    pub pixel_duration: Duration,
    /// Wall-clock duration of the entire run.
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Number of progress reports the engine made.
    pub progress_reports: usize,
    /// Whether the run ended in [`Outcome::Cancelled`].
    pub cancelled: bool,
}

impl ProcessDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let total_ms = duration_ms(self.total_duration);
        let share = |d: Duration| {
            if total_ms > 0.0 {
                duration_ms(d) / total_ms * 100.0
            } else {
                0.0
            }
        };

        let mut lines = Vec::new();
        lines.push(format!("Filter Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Filter: {}  |  Image: {}x{} ({} pixels)",
            self.filter,
            self.dimensions.width,
            self.dimensions.height,
            self.dimensions.pixel_count(),
        ));
        lines.push(format!("Total duration: {total_ms:.3}ms"));
        lines.push(String::new());
        lines.push(format!("{:<16} {:>10} {:>10}", "Pass", "Duration", "% Total"));
        lines.push("-".repeat(40));
        for (name, d) in [
            ("Prepare", self.prepare_duration),
            ("Pixels", self.pixel_duration),
        ] {
            lines.push(format!(
                "{name:<16} {:>8.3}ms {:>9.1}%",
                duration_ms(d),
                share(d)
            ));
        }
        lines.push(String::new());
        lines.push(format!(
            "Progress reports: {}  |  Outcome: {}",
            self.progress_reports,
            if self.cancelled { "cancelled" } else { "completed" },
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Forwards to an inner sink while counting reports.
struct CountingSink<'a, P: ?Sized> {
    inner: &'a mut P,
    reports: usize,
}

impl<P: ProgressSink + ?Sized> ProgressSink for CountingSink<'_, P> {
    fn report(&mut self, percent: u8) {
        self.reports += 1;
        self.inner.report(percent);
    }

    fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }
}

/// Run `kind` over `source`, collecting [`ProcessDiagnostics`].
///
/// # Errors
///
/// Same as [`apply`](crate::apply): configuration errors are returned
/// before any pixel is processed.
pub fn apply_with_diagnostics<P, C>(
    source: &PixelBuffer,
    kind: &FilterKind,
    progress: &mut P,
    clock: &C,
) -> Result<(Outcome, ProcessDiagnostics), FilterError>
where
    P: ProgressSink + ?Sized,
    C: Clock,
{
    let start = clock.now();

    let filter = kind.prepare(source)?;
    let prepare_duration = clock.elapsed(&start);

    let pixel_start = clock.now();
    let mut counting = CountingSink {
        inner: progress,
        reports: 0,
    };
    let outcome = engine::process(source, &filter, &mut counting);
    let pixel_duration = clock.elapsed(&pixel_start);

    let diagnostics = ProcessDiagnostics {
        filter: kind.name().to_owned(),
        dimensions: source.dimensions(),
        prepare_duration,
        pixel_duration,
        total_duration: clock.elapsed(&start),
        progress_reports: counting.reports,
        cancelled: outcome.is_cancelled(),
    };
    debug!(
        filter = %diagnostics.filter,
        reports = diagnostics.progress_reports,
        cancelled = diagnostics.cancelled,
        "filter run finished"
    );

    Ok((outcome, diagnostics))
}
