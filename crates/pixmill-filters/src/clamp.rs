//! Range clamping for channel values and neighbor coordinates.
//!
//! Channel arithmetic is done in `i32` so intermediate sums can leave
//! `[0, 255]` without wrapping; [`channel`] bounds the final value.
//! Neighbor lookups at image borders use [`coordinate`], which
//! replicates the nearest edge pixel rather than padding with zeros or
//! wrapping around.

/// Bound `value` to `[min, max]`.
///
/// `min` is expected to be at most `max`; if it is not, `min` wins.
#[must_use]
pub fn clamp<T: Ord>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Bound a widened channel value to `[0, 255]`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn channel(value: i32) -> u8 {
    clamp(value, 0, 255) as u8
}

/// Bound a neighbor coordinate to `[0, len - 1]` (replicate-edge policy).
///
/// `len` must be non-zero.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn coordinate(value: i64, len: u32) -> u32 {
    debug_assert!(len > 0, "cannot clamp a coordinate into an empty axis");
    clamp(value, 0, i64::from(len) - 1) as u32
}
