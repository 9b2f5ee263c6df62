//! Filter selection.
//!
//! [`FilterKind`] is the serializable configuration: which filter to run
//! and with what parameters. [`FilterKind::prepare`] validates it against
//! a source image and produces a [`Filter`], the ready-to-run state the
//! engine drives. Preparation is where kernels are built and where the
//! two-pass filters run their statistics scan, so any configuration
//! error surfaces before the first pixel is computed.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::buffer::PixelBuffer;
use crate::convolve::{Convolution, EdgeDetect};
use crate::engine::PixelTransform;
use crate::kernel::{DEFAULT_GAUSSIAN_RADIUS, DEFAULT_GAUSSIAN_SIGMA, Kernel};
use crate::point::{
    Brightness, DEFAULT_BRIGHTNESS_OFFSET, DEFAULT_SEPIA_WARMTH, Grayscale, Invert, Sepia,
};
use crate::stats::{ChannelStretch, GrayWorld};
use crate::types::{FilterError, Rgb};

const fn default_warmth() -> i32 {
    DEFAULT_SEPIA_WARMTH
}

const fn default_offset() -> i32 {
    DEFAULT_BRIGHTNESS_OFFSET
}

const fn default_radius() -> u32 {
    DEFAULT_GAUSSIAN_RADIUS
}

const fn default_sigma() -> f32 {
    DEFAULT_GAUSSIAN_SIGMA
}

/// A filter and its parameters.
///
/// Serialized with an internal `"kind"` tag, e.g.
/// `{"kind": "gaussian", "radius": 2, "sigma": 1.5}`. Omitted
/// parameters take their documented defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FilterKind {
    /// `255 - channel`.
    Invert,
    /// Weighted luminance on all channels.
    Grayscale,
    /// Warm-toned monochrome.
    Sepia {
        /// Warmth constant.
        #[serde(default = "default_warmth")]
        warmth: i32,
    },
    /// Add a fixed offset to every channel.
    Brightness {
        /// Signed offset.
        #[serde(default = "default_offset")]
        offset: i32,
    },
    /// Uniform 3x3 blur.
    Blur,
    /// Normalized Gaussian blur.
    Gaussian {
        /// Kernel half-width.
        #[serde(default = "default_radius")]
        radius: u32,
        /// Spread; must be finite and positive.
        #[serde(default = "default_sigma")]
        sigma: f32,
    },
    /// Sobel gradient magnitude.
    EdgeDetect,
    /// Gray-world color balance (two-pass).
    GrayWorld,
    /// Per-channel stretch to full scale (two-pass).
    Stretch,
    /// Caller-supplied kernel, given as rows of weights.
    Convolve {
        /// Row-major weights; both dimensions must be odd.
        kernel: Vec<Vec<f32>>,
    },
}

impl FilterKind {
    /// The serialized tag of this kind, e.g. `"edge-detect"`.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Invert => "invert",
            Self::Grayscale => "grayscale",
            Self::Sepia { .. } => "sepia",
            Self::Brightness { .. } => "brightness",
            Self::Blur => "blur",
            Self::Gaussian { .. } => "gaussian",
            Self::EdgeDetect => "edge-detect",
            Self::GrayWorld => "gray-world",
            Self::Stretch => "stretch",
            Self::Convolve { .. } => "convolve",
        }
    }

    /// Whether [`prepare`](Self::prepare) scans the whole source first.
    #[must_use]
    pub const fn is_two_pass(&self) -> bool {
        matches!(self, Self::GrayWorld | Self::Stretch)
    }

    /// Validate the configuration and build the runnable filter for
    /// `source`.
    ///
    /// Two-pass kinds compute their statistics from `source` here.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidKernel`] for a malformed custom
    /// kernel and [`FilterError::InvalidConfig`] for out-of-range
    /// Gaussian parameters.
    pub fn prepare(&self, source: &PixelBuffer) -> Result<Filter, FilterError> {
        let filter = match self {
            Self::Invert => Filter::Invert(Invert),
            Self::Grayscale => Filter::Grayscale(Grayscale),
            Self::Sepia { warmth } => Filter::Sepia(Sepia { warmth: *warmth }),
            Self::Brightness { offset } => Filter::Brightness(Brightness { offset: *offset }),
            Self::Blur => Filter::Convolution(Convolution::blur()),
            Self::Gaussian { radius, sigma } => {
                Filter::Convolution(Convolution::gaussian(*radius, *sigma)?)
            }
            Self::EdgeDetect => Filter::EdgeDetect(EdgeDetect::default()),
            Self::GrayWorld => Filter::GrayWorld(GrayWorld::scan(source)),
            Self::Stretch => Filter::Stretch(ChannelStretch::scan(source)),
            Self::Convolve { kernel } => {
                Filter::Convolution(Convolution::new(Kernel::from_rows(kernel)?))
            }
        };

        debug!(
            filter = self.name(),
            width = source.width(),
            height = source.height(),
            "prepared filter"
        );
        Ok(filter)
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A prepared filter: configuration validated, statistics computed.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// See [`Invert`].
    Invert(Invert),
    /// See [`Grayscale`].
    Grayscale(Grayscale),
    /// See [`Sepia`].
    Sepia(Sepia),
    /// See [`Brightness`].
    Brightness(Brightness),
    /// Blur, Gaussian, and custom kernels.
    Convolution(Convolution),
    /// See [`EdgeDetect`].
    EdgeDetect(EdgeDetect),
    /// See [`GrayWorld`].
    GrayWorld(GrayWorld),
    /// See [`ChannelStretch`].
    Stretch(ChannelStretch),
}

impl PixelTransform for Filter {
    fn compute_pixel(&self, source: &PixelBuffer, x: u32, y: u32) -> Rgb<u8> {
        match self {
            Self::Invert(f) => f.compute_pixel(source, x, y),
            Self::Grayscale(f) => f.compute_pixel(source, x, y),
            Self::Sepia(f) => f.compute_pixel(source, x, y),
            Self::Brightness(f) => f.compute_pixel(source, x, y),
            Self::Convolution(f) => f.compute_pixel(source, x, y),
            Self::EdgeDetect(f) => f.compute_pixel(source, x, y),
            Self::GrayWorld(f) => f.compute_pixel(source, x, y),
            Self::Stretch(f) => f.compute_pixel(source, x, y),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn all_kinds() -> Vec<FilterKind> {
        vec![
            FilterKind::Invert,
            FilterKind::Grayscale,
            FilterKind::Sepia { warmth: 12 },
            FilterKind::Brightness { offset: -30 },
            FilterKind::Blur,
            FilterKind::Gaussian {
                radius: 2,
                sigma: 1.5,
            },
            FilterKind::EdgeDetect,
            FilterKind::GrayWorld,
            FilterKind::Stretch,
            FilterKind::Convolve {
                kernel: vec![vec![0.0, 1.0, 0.0]],
            },
        ]
    }

    #[test]
    fn name_matches_serialized_tag() {
        for kind in all_kinds() {
            let value = serde_json::to_value(&kind).unwrap();
            assert_eq!(value["kind"], kind.name(), "{kind:?}");
            assert_eq!(kind.to_string(), kind.name());
        }
    }

    #[test]
    fn serde_round_trip() {
        for kind in all_kinds() {
            let json = serde_json::to_string(&kind).unwrap();
            let back: FilterKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn omitted_parameters_take_defaults() {
        let sepia: FilterKind = serde_json::from_str(r#"{"kind":"sepia"}"#).unwrap();
        assert_eq!(sepia, FilterKind::Sepia { warmth: 40 });

        let brightness: FilterKind = serde_json::from_str(r#"{"kind":"brightness"}"#).unwrap();
        assert_eq!(brightness, FilterKind::Brightness { offset: 100 });

        let gaussian: FilterKind =
            serde_json::from_str(r#"{"kind":"gaussian","sigma":0.5}"#).unwrap();
        assert_eq!(
            gaussian,
            FilterKind::Gaussian {
                radius: 3,
                sigma: 0.5
            }
        );
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(serde_json::from_str::<FilterKind>(r#"{"kind":"posterize"}"#).is_err());
    }

    #[test]
    fn convolve_requires_kernel() {
        assert!(serde_json::from_str::<FilterKind>(r#"{"kind":"convolve"}"#).is_err());
    }

    #[test]
    fn only_statistics_filters_are_two_pass() {
        let two_pass: Vec<_> = all_kinds()
            .into_iter()
            .filter(FilterKind::is_two_pass)
            .map(|k| k.name())
            .collect();
        assert_eq!(two_pass, vec!["gray-world", "stretch"]);
    }

    #[test]
    fn every_kind_prepares_against_an_image() {
        let source = PixelBuffer::filled(3, 3, Rgb([10, 20, 30]));
        for kind in all_kinds() {
            assert!(kind.prepare(&source).is_ok(), "{kind:?}");
        }
    }

    #[test]
    fn even_custom_kernel_fails_fast() {
        let kind = FilterKind::Convolve {
            kernel: vec![vec![0.5, 0.5], vec![0.5, 0.5]],
        };
        let err = kind.prepare(&PixelBuffer::new(2, 2)).unwrap_err();
        assert!(matches!(err, FilterError::InvalidKernel(_)));
    }

    #[test]
    fn empty_custom_kernel_fails_fast() {
        let kind = FilterKind::Convolve { kernel: vec![] };
        assert!(matches!(
            kind.prepare(&PixelBuffer::new(2, 2)),
            Err(FilterError::InvalidKernel(_))
        ));
    }

    #[test]
    fn bad_gaussian_sigma_fails_fast() {
        let kind = FilterKind::Gaussian {
            radius: 3,
            sigma: 0.0,
        };
        assert!(matches!(
            kind.prepare(&PixelBuffer::new(2, 2)),
            Err(FilterError::InvalidConfig(_))
        ));
    }

    #[test]
    fn gray_world_statistics_come_from_the_source() {
        let source = PixelBuffer::filled(2, 2, Rgb([60, 90, 120]));
        let Filter::GrayWorld(filter) = FilterKind::GrayWorld.prepare(&source).unwrap() else {
            panic!("expected a gray-world filter");
        };
        assert_eq!(filter.stats().averages, [60, 90, 120]);
        assert_eq!(filter.stats().target, 90);
    }

    #[test]
    fn prepared_filter_delegates_to_variant() {
        let source = PixelBuffer::filled(1, 1, Rgb([0, 128, 255]));
        let filter = FilterKind::Invert.prepare(&source).unwrap();
        assert_eq!(filter.compute_pixel(&source, 0, 0), Rgb([255, 127, 0]));

        let filter = FilterKind::Sepia { warmth: 0 }.prepare(&source).unwrap();
        let gray = filter.compute_pixel(&source, 0, 0);
        assert_eq!(gray.0[0], gray.0[1]);
        assert_eq!(gray.0[1], gray.0[2]);
    }
}
