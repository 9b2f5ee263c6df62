//! pixmill: CLI tool that runs a raster filter over an image file.
//!
//! Reads an image, applies one filter from the `pixmill-filters` engine,
//! writes the result, and prints per-run diagnostics. Useful for:
//!
//! - Trying filters and their parameters on real images
//! - Measuring the prepare pass (statistics scan) against the pixel pass
//! - Exercising cancellation through a wall-clock deadline
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin pixmill -- [OPTIONS] <INPUT> -o <OUTPUT>
//! ```
//!
//! # Exit codes
//!
//! `0` on success, `1` on any error, `2` when the deadline cancelled
//! the run.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use pixmill_filters::diagnostics::{Clock, ProcessDiagnostics, apply_with_diagnostics};
use pixmill_filters::{CancelToken, FilterError, FilterKind, Monitor, Outcome, PixelBuffer};
use pixmill_filters::{kernel, point};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Exit code for a run cancelled by `--deadline-ms`.
const EXIT_CANCELLED: u8 = 2;

/// Apply per-pixel, convolution, and color-balance filters to an image.
///
/// Runs the selected filter over the input image, writes the result to
/// the output path (format chosen by extension), and prints timing
/// diagnostics.
#[derive(Debug, Parser)]
#[command(name = "pixmill", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    input: PathBuf,

    /// Path to write the filtered image to.
    #[arg(short, long)]
    output: PathBuf,

    /// Filter to apply.
    #[arg(long, value_enum, default_value_t = FilterArg::Grayscale)]
    filter: FilterArg,

    /// Brightness offset added to every channel (negative darkens).
    #[arg(long, default_value_t = point::DEFAULT_BRIGHTNESS_OFFSET, allow_negative_numbers = true)]
    offset: i32,

    /// Sepia warmth.
    #[arg(long, default_value_t = point::DEFAULT_SEPIA_WARMTH, allow_negative_numbers = true)]
    warmth: i32,

    /// Gaussian kernel radius.
    #[arg(long, default_value_t = kernel::DEFAULT_GAUSSIAN_RADIUS)]
    radius: u32,

    /// Gaussian spread.
    #[arg(long, default_value_t = kernel::DEFAULT_GAUSSIAN_SIGMA)]
    sigma: f32,

    /// Full filter config as a JSON string.
    ///
    /// When provided, `--filter` and all parameter flags are ignored.
    /// The JSON must be a valid `FilterKind` serialization, e.g.
    /// `{"kind":"convolve","kernel":[[0,-1,0],[-1,5,-1],[0,-1,0]]}`.
    #[arg(long)]
    config_json: Option<String>,

    /// Cancel the pixel pass once it has run this many milliseconds.
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// Number of runs for averaging. The image is written after the first.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,

    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(short, long)]
    verbose: bool,
}

/// Filter selection for the flag-driven configuration.
///
/// Custom kernels are only reachable through `--config-json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FilterArg {
    /// 255 minus each channel.
    Invert,
    /// Weighted luminance.
    Grayscale,
    /// Warm-toned monochrome (uses `--warmth`).
    Sepia,
    /// Add a constant (uses `--offset`).
    Brightness,
    /// Uniform 3x3 blur.
    Blur,
    /// Gaussian blur (uses `--radius` and `--sigma`).
    Gaussian,
    /// Sobel edge magnitude.
    EdgeDetect,
    /// Gray-world color balance.
    GrayWorld,
    /// Stretch each channel to full scale.
    Stretch,
}

/// Build a [`FilterKind`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. Otherwise, a config is
/// assembled from `--filter` and the flags it uses.
fn config_from_cli(cli: &Cli) -> Result<FilterKind, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(match cli.filter {
        FilterArg::Invert => FilterKind::Invert,
        FilterArg::Grayscale => FilterKind::Grayscale,
        FilterArg::Sepia => FilterKind::Sepia { warmth: cli.warmth },
        FilterArg::Brightness => FilterKind::Brightness { offset: cli.offset },
        FilterArg::Blur => FilterKind::Blur,
        FilterArg::Gaussian => FilterKind::Gaussian {
            radius: cli.radius,
            sigma: cli.sigma,
        },
        FilterArg::EdgeDetect => FilterKind::EdgeDetect,
        FilterArg::GrayWorld => FilterKind::GrayWorld,
        FilterArg::Stretch => FilterKind::Stretch,
    })
}

/// Install a stderr `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` with
/// `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Decides which progress reports are worth logging: one per 10% step.
#[derive(Debug, Default)]
struct ProgressLog {
    next: u8,
}

impl ProgressLog {
    /// Whether `percent` crosses the next 10% boundary.
    fn step(&mut self, percent: u8) -> bool {
        if percent < self.next {
            return false;
        }
        self.next = (percent / 10 + 1).saturating_mul(10);
        true
    }
}

/// Wall-clock budget for the pixel pass. The clock starts at the first
/// progress report, so the prepare pass is not charged against it.
#[derive(Debug)]
struct Deadline {
    limit: Duration,
    started: Option<Instant>,
}

impl Deadline {
    const fn new(limit: Duration) -> Self {
        Self {
            limit,
            started: None,
        }
    }

    /// Whether the budget is used up at `now`.
    fn expired(&mut self, now: Instant) -> bool {
        let started = *self.started.get_or_insert(now);
        now.saturating_duration_since(started) >= self.limit
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let kind = match config_from_cli(&cli) {
        Ok(k) => k,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.input) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.input.display());
            return ExitCode::FAILURE;
        }
    };

    let source = match PixelBuffer::decode(&image_bytes) {
        Ok(buffer) => buffer,
        Err(e) => {
            eprintln!("Error decoding {}: {e}", cli.input.display());
            return ExitCode::FAILURE;
        }
    };

    info!(
        input = %cli.input.display(),
        bytes = image_bytes.len(),
        width = source.width(),
        height = source.height(),
        filter = %kind,
        "loaded image"
    );
    debug!(?kind, runs = cli.runs, "configuration");

    let deadline = cli.deadline_ms.map(Duration::from_millis);
    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        let (outcome, diagnostics) = match run_once(&source, &kind, deadline) {
            Ok(result) => result,
            Err(e) => {
                eprintln!("Filter error: {e}");
                return ExitCode::FAILURE;
            }
        };

        if cli.json {
            match serde_json::to_string_pretty(&diagnostics) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error serializing diagnostics: {e}");
                    return ExitCode::FAILURE;
                }
            }
        } else {
            println!("{}", diagnostics.report());
        }

        let Outcome::Completed(result) = outcome else {
            warn!(deadline_ms = cli.deadline_ms, "deadline exceeded, run cancelled");
            return ExitCode::from(EXIT_CANCELLED);
        };

        // Write the image on the first run only.
        if run == 0 {
            if let Err(e) = result.into_image().save(&cli.output) {
                eprintln!("Error writing {}: {e}", cli.output.display());
                return ExitCode::FAILURE;
            }
            info!(output = %cli.output.display(), "wrote image");
        }

        all_diagnostics.push(diagnostics);
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// Run the filter once with a progress logger and optional deadline.
fn run_once(
    source: &PixelBuffer,
    kind: &FilterKind,
    deadline: Option<Duration>,
) -> Result<(Outcome, ProcessDiagnostics), FilterError> {
    let token = CancelToken::new();
    let canceller = token.clone();
    let mut deadline = deadline.map(Deadline::new);
    let mut log = ProgressLog::default();

    let mut monitor = Monitor::new(
        move |percent| {
            if log.step(percent) {
                info!(percent, "progress");
            }
            if deadline.as_mut().is_some_and(|d| d.expired(Instant::now())) {
                canceller.cancel();
            }
        },
        token,
    );

    apply_with_diagnostics(source, kind, &mut monitor, &StdClock)
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Print aggregated timing across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[ProcessDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let passes: [(&str, fn(&ProcessDiagnostics) -> Duration); 3] = [
        ("Prepare", |d| d.prepare_duration),
        ("Pixels", |d| d.pixel_duration),
        ("Total", |d| d.total_duration),
    ];

    println!("{:<16} {:>12} {:>12} {:>12}", "Pass", "Min (ms)", "Mean (ms)", "Max (ms)");
    println!("{}", "-".repeat(56));

    for (name, extract) in passes {
        let ms: Vec<f64> = all_diagnostics
            .iter()
            .map(|d| extract(d).as_secs_f64() * 1000.0)
            .collect();
        let min = ms.iter().copied().reduce(f64::min).unwrap_or(0.0);
        let max = ms.iter().copied().reduce(f64::max).unwrap_or(0.0);
        let mean = ms.iter().sum::<f64>() / ms.len() as f64;
        println!("{name:<16} {min:>10.3}ms {mean:>10.3}ms {max:>10.3}ms");
    }
}
