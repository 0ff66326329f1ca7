//! Axis-aligned layout geometry.
//!
//! All coordinates are in microns, stored as `f64`.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

pub mod bbox;
pub mod point;
pub mod rect;
pub mod transform;

pub use bbox::BoundBox;
pub use point::Point;
pub use rect::{LayerId, Rect};
pub use transform::{Mirror, Rotation, Transform};

/// Tolerance used when comparing coordinates.
pub const EPSILON: f64 = 1e-9;

/// A direction: horizontal or vertical.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoarseDirection {
    Horizontal,
    Vertical,
}

impl Default for CoarseDirection {
    fn default() -> Self {
        Self::Vertical
    }
}

impl Display for CoarseDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Horizontal => write!(f, "horizontal"),
            Self::Vertical => write!(f, "vertical"),
        }
    }
}

impl CoarseDirection {
    pub fn short_form(&self) -> &'static str {
        match *self {
            Self::Horizontal => "h",
            Self::Vertical => "v",
        }
    }

    #[inline]
    pub fn other(&self) -> Self {
        match *self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}

/// Rounds `value` up to the nearest multiple of `grid`.
///
/// A non-positive grid leaves the value untouched.
pub fn snap_up(value: f64, grid: f64) -> f64 {
    if grid <= 0. {
        return value;
    }
    let steps = value / grid;
    // Values already on grid must not be pushed up by rounding noise.
    if (steps - steps.round()).abs() < EPSILON / grid {
        steps.round() * grid
    } else {
        steps.ceil() * grid
    }
}

#[inline]
pub fn approx_eq(a: f64, b: f64) -> bool {
    approx::abs_diff_eq!(a, b, epsilon = EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_up() {
        approx::assert_abs_diff_eq!(snap_up(0.101, 0.005), 0.105, epsilon = EPSILON);
        approx::assert_abs_diff_eq!(snap_up(0.1, 0.005), 0.1, epsilon = EPSILON);
        approx::assert_abs_diff_eq!(snap_up(0.37, 0.), 0.37, epsilon = EPSILON);
    }

    #[test]
    fn test_direction_other() {
        assert_eq!(CoarseDirection::Horizontal.other(), CoarseDirection::Vertical);
        assert_eq!(CoarseDirection::Vertical.short_form(), "v");
    }
}
