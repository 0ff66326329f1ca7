use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

use super::transform::{Mirror, Rotation};
use super::{BoundBox, Point};

/// The name of a layout layer (eg. `met1`).
pub type LayerId = ArcStr;

/// A rectangle on a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub layer: LayerId,
    pub lower_left: Point,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Creates a rectangle. Negative extents are folded back into the lower-left corner.
    pub fn new(layer: impl Into<LayerId>, lower_left: Point, width: f64, height: f64) -> Self {
        Self::from_bbox(
            layer,
            BoundBox::new(lower_left, lower_left + Point::new(width, height)),
        )
    }

    pub fn from_bbox(layer: impl Into<LayerId>, bbox: BoundBox) -> Self {
        Self {
            layer: layer.into(),
            lower_left: bbox.p0,
            width: bbox.width(),
            height: bbox.height(),
        }
    }

    #[inline]
    pub fn bbox(&self) -> BoundBox {
        BoundBox::from_size(self.lower_left, self.width, self.height)
    }

    #[inline]
    pub fn upper_right(&self) -> Point {
        self.lower_left + Point::new(self.width, self.height)
    }

    #[inline]
    pub fn center(&self) -> Point {
        self.bbox().center()
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// The same rectangle on another layer.
    pub fn with_layer(&self, layer: impl Into<LayerId>) -> Self {
        Self {
            layer: layer.into(),
            ..self.clone()
        }
    }

    pub fn translate(&self, p: Point) -> Self {
        Self {
            lower_left: self.lower_left + p,
            ..self.clone()
        }
    }

    /// Mirrors the rectangle about the axes through the origin.
    pub fn mirror(&self, mirror: Mirror) -> Self {
        Self::from_bbox(self.layer.clone(), self.bbox().mirror(mirror))
    }

    /// Rotates the rectangle counter-clockwise about `pivot`.
    pub fn rotate_about(&self, rotation: Rotation, pivot: Point) -> Self {
        let b = self.bbox();
        Self::from_bbox(
            self.layer.clone(),
            BoundBox::new(
                b.p0.rotate_about(rotation, pivot),
                b.p1.rotate_about(rotation, pivot),
            ),
        )
    }

    /// Point reflection of the rectangle through `pivot`.
    pub fn reflect_through(&self, pivot: Point) -> Self {
        let b = self.bbox();
        Self::from_bbox(
            self.layer.clone(),
            BoundBox::new(b.p0.reflect_through(pivot), b.p1.reflect_through(pivot)),
        )
    }
}
