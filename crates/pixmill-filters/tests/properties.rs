//! Integration test: behavioral properties every filter must hold when
//! driven through the public `apply` entry point.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use pixmill_filters::{
    CancelToken, FilterError, FilterKind, Kernel, Monitor, NoProgress, Outcome, PixelBuffer,
    ProgressSink, Rgb, RgbImage, apply,
};

/// Deterministic, busy test image with every channel varying.
#[allow(clippy::cast_possible_truncation)]
fn busy_image(width: u32, height: u32) -> PixelBuffer {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            ((x * 37 + y * 91) % 256) as u8,
            ((x * 13 + y * 7) % 256) as u8,
            ((x * y) % 256) as u8,
        ])
    })
    .into()
}

fn run(source: &PixelBuffer, kind: &FilterKind) -> PixelBuffer {
    apply(source, kind, &mut NoProgress)
        .expect("filter should prepare")
        .into_image()
        .expect("run should not be cancelled")
}

/// Records every report, never cancels.
#[derive(Default)]
struct Recorder(Vec<u8>);

impl ProgressSink for Recorder {
    fn report(&mut self, percent: u8) {
        self.0.push(percent);
    }
}

#[test]
fn invert_is_self_inverse() {
    let source = busy_image(23, 17);
    let once = run(&source, &FilterKind::Invert);
    assert_ne!(once, source);
    assert_eq!(run(&once, &FilterKind::Invert), source);
}

#[test]
fn blurs_preserve_dimensions() {
    let source = busy_image(31, 9);
    for kind in [
        FilterKind::Blur,
        FilterKind::Gaussian {
            radius: 3,
            sigma: 2.0,
        },
        FilterKind::Gaussian {
            radius: 10,
            sigma: 0.5,
        },
    ] {
        let out = run(&source, &kind);
        assert_eq!(out.dimensions(), source.dimensions(), "{kind}");
    }
}

#[test]
fn gaussian_blur_never_leaves_the_source_range() {
    // A normalized non-negative kernel averages, so each channel stays
    // within the source's own min/max (up to truncation).
    let source = busy_image(20, 20);
    let out = run(
        &source,
        &FilterKind::Gaussian {
            radius: 4,
            sigma: 3.0,
        },
    );
    for c in 0..3 {
        let max_in = source.pixels().map(|p| p.0[c]).max().unwrap();
        let max_out = out.pixels().map(|p| p.0[c]).max().unwrap();
        assert!(max_out <= max_in, "channel {c}: {max_out} > {max_in}");
    }
}

#[test]
fn gaussian_kernels_are_normalized() {
    for radius in 0..=12 {
        for sigma in [0.1f32, 0.75, 1.0, 2.0, 6.0, 50.0] {
            let sum = Kernel::gaussian(radius, sigma).unwrap().sum();
            assert!((sum - 1.0).abs() < 1e-4, "radius={radius} sigma={sigma} sum={sum}");
        }
    }
}

#[test]
fn vanishing_sigma_is_rejected_instead_of_blacking_out() {
    let source = PixelBuffer::filled(3, 3, Rgb([200, 100, 50]));
    for sigma in [1e-30f32, f32::MIN_POSITIVE] {
        let result = apply(
            &source,
            &FilterKind::Gaussian { radius: 1, sigma },
            &mut NoProgress,
        );
        assert!(
            matches!(result, Err(FilterError::InvalidConfig(_))),
            "sigma={sigma:e}"
        );
    }
    // A tiny but representable spread collapses to the identity.
    let out = run(
        &source,
        &FilterKind::Gaussian {
            radius: 1,
            sigma: 1e-18,
        },
    );
    assert_eq!(out, source);
}

#[test]
fn one_by_one_image_convolves_with_itself_only() {
    let color = Rgb([200, 17, 99]);
    let tiny = PixelBuffer::filled(1, 1, color);
    let big = PixelBuffer::filled(15, 15, color);
    let kinds = [
        FilterKind::Blur,
        FilterKind::Gaussian {
            radius: 5,
            sigma: 2.5,
        },
        FilterKind::EdgeDetect,
        FilterKind::Convolve {
            kernel: vec![vec![0.1, -0.3, 0.4, 0.2, 0.05]; 3],
        },
    ];
    for kind in &kinds {
        let from_tiny = run(&tiny, kind).get(0, 0);
        let from_big = run(&big, kind).get(7, 7);
        assert_eq!(from_tiny, from_big, "{kind}");
    }
}

#[test]
fn gray_world_leaves_uniform_gray_unchanged() {
    let source = PixelBuffer::filled(12, 7, Rgb([133, 133, 133]));
    assert_eq!(run(&source, &FilterKind::GrayWorld), source);
}

#[test]
fn gray_world_equalizes_channel_averages() {
    let source = busy_image(40, 40);
    let out = run(&source, &FilterKind::GrayWorld);
    let mean = |c: usize| {
        out.pixels().map(|p| u64::from(p.0[c])).sum::<u64>() / out.dimensions().pixel_count()
    };
    let (r, g, b) = (mean(0), mean(1), mean(2));
    let spread = r.max(g).max(b) - r.min(g).min(b);
    assert!(spread <= 16, "averages still far apart: r={r} g={g} b={b}");
}

#[test]
fn black_image_survives_statistics_filters() {
    let source = PixelBuffer::filled(5, 5, Rgb([0, 0, 0]));
    assert_eq!(run(&source, &FilterKind::GrayWorld), source);
    assert_eq!(run(&source, &FilterKind::Stretch), source);
}

#[test]
fn brightness_examples() {
    let kind = FilterKind::Brightness { offset: 100 };
    let dim = PixelBuffer::filled(2, 2, Rgb([10, 10, 10]));
    let bright = PixelBuffer::filled(2, 2, Rgb([200, 200, 200]));
    assert!(run(&dim, &kind).pixels().all(|p| *p == Rgb([110, 110, 110])));
    assert!(run(&bright, &kind).pixels().all(|p| *p == Rgb([255, 255, 255])));
}

#[test]
fn sepia_on_white() {
    let white = PixelBuffer::filled(3, 3, Rgb([255, 255, 255]));
    let out = run(&white, &FilterKind::Sepia { warmth: 40 });
    assert!(out.pixels().all(|p| *p == Rgb([255, 255, 215])));
}

#[test]
fn cancellation_before_first_column_yields_nothing() {
    let token = CancelToken::new();
    token.cancel();
    let mut reports = 0;
    let mut monitor = Monitor::new(|_| reports += 1, token);
    let outcome = apply(&busy_image(10, 10), &FilterKind::GrayWorld, &mut monitor).unwrap();
    assert_eq!(outcome, Outcome::Cancelled);
    drop(monitor);
    assert_eq!(reports, 1);
}

#[test]
fn cancellation_from_another_thread_is_observed() {
    let token = CancelToken::new();
    let remote = token.clone();
    std::thread::spawn(move || remote.cancel()).join().unwrap();
    let mut monitor = Monitor::new(|_| {}, token);
    let outcome = apply(&busy_image(4, 4), &FilterKind::Blur, &mut monitor).unwrap();
    assert!(outcome.is_cancelled());
}

#[test]
fn progress_is_reported_once_per_column_in_order() {
    for width in [1u32, 3, 7, 64, 199, 250] {
        let source = busy_image(width, 2);
        let mut recorder = Recorder::default();
        let outcome = apply(&source, &FilterKind::Grayscale, &mut recorder).unwrap();
        assert!(!outcome.is_cancelled());

        let reports = recorder.0;
        assert_eq!(reports.len(), width as usize);
        assert_eq!(reports[0], 0);
        assert!(reports.windows(2).all(|w| w[0] <= w[1]), "width={width}");
        assert!(reports.iter().all(|&p| p <= 100), "width={width}");
    }
}

#[test]
fn malformed_kernels_fail_before_processing() {
    let mut recorder = Recorder::default();
    for kernel in [vec![], vec![vec![1.0, 1.0]], vec![vec![1.0], vec![1.0]]] {
        let result = apply(
            &busy_image(4, 4),
            &FilterKind::Convolve { kernel },
            &mut recorder,
        );
        assert!(matches!(result, Err(FilterError::InvalidKernel(_))));
    }
    assert!(recorder.0.is_empty());
}

#[test]
fn config_from_json_runs_end_to_end() {
    let kind: FilterKind =
        serde_json::from_str(r#"{"kind":"convolve","kernel":[[0,0,0],[0,1,0],[0,0,0]]}"#).unwrap();
    let source = busy_image(9, 5);
    assert_eq!(run(&source, &kind), source);
}
