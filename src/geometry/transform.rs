use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::{BoundBox, Point, Rect};

/// A counter-clockwise rotation by a multiple of 90 degrees.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    pub fn degrees(&self) -> u32 {
        match *self {
            Self::R0 => 0,
            Self::R90 => 90,
            Self::R180 => 180,
            Self::R270 => 270,
        }
    }

    /// Whether this rotation swaps width and height.
    #[inline]
    pub fn is_quarter_turn(&self) -> bool {
        matches!(self, Self::R90 | Self::R270)
    }
}

impl Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "R{}", self.degrees())
    }
}

/// Reflection about the X axis, the Y axis, or both.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mirror {
    #[default]
    None,
    /// Flips the y coordinate.
    X,
    /// Flips the x coordinate.
    Y,
    XY,
}

impl Mirror {
    pub fn from_flags(about_x: bool, about_y: bool) -> Self {
        match (about_x, about_y) {
            (false, false) => Self::None,
            (true, false) => Self::X,
            (false, true) => Self::Y,
            (true, true) => Self::XY,
        }
    }

    #[inline]
    pub fn flips_y(&self) -> bool {
        matches!(self, Self::X | Self::XY)
    }

    #[inline]
    pub fn flips_x(&self) -> bool {
        matches!(self, Self::Y | Self::XY)
    }

    /// Mirrors `p` about the center lines of `anchor`, so that `anchor` maps onto itself.
    pub fn apply_anchored(&self, p: Point, anchor: &BoundBox) -> Point {
        let x = if self.flips_x() {
            anchor.left() + anchor.right() - p.x
        } else {
            p.x
        };
        let y = if self.flips_y() {
            anchor.bottom() + anchor.top() - p.y
        } else {
            p.y
        };
        Point::new(x, y)
    }
}

/// Placement of a child module inside its parent.
///
/// Mirroring is applied first, then rotation, then translation by `offset`.
/// Mirroring and rotation are anchored on the child's boundary: they never move
/// the lower-left corner of the child's boundary box, so an instance occupies
/// the slot starting at `offset + boundary.p0` whatever its orientation.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub offset: Point,
    pub rotation: Rotation,
    pub mirror: Mirror,
}

impl Transform {
    pub fn translate(offset: Point) -> Self {
        Self {
            offset,
            ..Default::default()
        }
    }

    pub fn apply_point(&self, p: Point, boundary: &BoundBox) -> Point {
        let q = self.mirror.apply_anchored(p, boundary);
        let rotated = boundary.rotate(self.rotation);
        q.rotate(self.rotation) - rotated.p0 + boundary.p0 + self.offset
    }

    pub fn apply_bbox(&self, b: &BoundBox, boundary: &BoundBox) -> BoundBox {
        BoundBox::new(
            self.apply_point(b.p0, boundary),
            self.apply_point(b.p1, boundary),
        )
    }

    pub fn apply_rect(&self, r: &Rect, boundary: &BoundBox) -> Rect {
        Rect::from_bbox(r.layer.clone(), self.apply_bbox(&r.bbox(), boundary))
    }
}
