use serde::{Deserialize, Serialize};

use super::transform::{Mirror, Rotation};
use super::{CoarseDirection, Point};

/// A layerless axis-aligned box, stored as its lower-left and upper-right corners.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundBox {
    pub p0: Point,
    pub p1: Point,
}

impl BoundBox {
    /// Creates the box spanned by two opposite corners, in any order.
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            p0: Point::new(a.x.min(b.x), a.y.min(b.y)),
            p1: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn from_size(lower_left: Point, width: f64, height: f64) -> Self {
        Self::new(lower_left, lower_left + Point::new(width, height))
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.p1.x - self.p0.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.p1.y - self.p0.y
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.p0.x
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.p1.x
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.p0.y
    }

    #[inline]
    pub fn top(&self) -> f64 {
        self.p1.y
    }

    pub fn center(&self) -> Point {
        Point::new(0.5 * (self.p0.x + self.p1.x), 0.5 * (self.p0.y + self.p1.y))
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Extent along `dir`.
    pub fn length(&self, dir: CoarseDirection) -> f64 {
        match dir {
            CoarseDirection::Horizontal => self.width(),
            CoarseDirection::Vertical => self.height(),
        }
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            p0: Point::new(self.p0.x.min(other.p0.x), self.p0.y.min(other.p0.y)),
            p1: Point::new(self.p1.x.max(other.p1.x), self.p1.y.max(other.p1.y)),
        }
    }

    /// Smallest box containing every box in `boxes`, or `None` if there are none.
    pub fn union_all(boxes: impl IntoIterator<Item = BoundBox>) -> Option<Self> {
        boxes.into_iter().reduce(|acc, b| acc.union(&b))
    }

    /// Whether `p` lies inside or on the edge of this box.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.p0.x && p.x <= self.p1.x && p.y >= self.p0.y && p.y <= self.p1.y
    }

    pub fn contains_box(&self, other: &Self) -> bool {
        self.contains(other.p0) && self.contains(other.p1)
    }

    /// Whether the two boxes share any area or edge.
    pub fn intersects(&self, other: &Self) -> bool {
        self.p0.x <= other.p1.x
            && other.p0.x <= self.p1.x
            && self.p0.y <= other.p1.y
            && other.p0.y <= self.p1.y
    }

    pub fn translate(&self, p: Point) -> Self {
        Self {
            p0: self.p0 + p,
            p1: self.p1 + p,
        }
    }

    /// Grows the box by `dist` on every side.
    pub fn expand(&self, dist: f64) -> Self {
        Self::new(self.p0 - Point::new(dist, dist), self.p1 + Point::new(dist, dist))
    }

    /// Grows the box by `dist` on both sides along `dir`.
    pub fn expand_dir(&self, dir: CoarseDirection, dist: f64) -> Self {
        let d = match dir {
            CoarseDirection::Horizontal => Point::new(dist, 0.),
            CoarseDirection::Vertical => Point::new(0., dist),
        };
        Self::new(self.p0 - d, self.p1 + d)
    }

    pub fn rotate(&self, rotation: Rotation) -> Self {
        Self::new(self.p0.rotate(rotation), self.p1.rotate(rotation))
    }

    pub fn mirror(&self, mirror: Mirror) -> Self {
        Self::new(self.p0.mirror(mirror), self.p1.mirror(mirror))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_union_and_contains() {
        let a = BoundBox::from_size(Point::zero(), 2., 1.);
        let b = BoundBox::from_size(Point::new(1., -1.), 3., 1.);
        let u = a.union(&b);
        assert_eq!(u, BoundBox::new(Point::new(0., -1.), Point::new(4., 1.)));
        assert!(u.contains_box(&a));
        assert!(u.contains_box(&b));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&a.translate(Point::new(5., 0.))));
        assert_eq!(BoundBox::union_all([]), None);
    }

    #[test]
    fn test_bbox_rotate_normalizes() {
        let a = BoundBox::from_size(Point::zero(), 2., 1.);
        let r = a.rotate(Rotation::R90);
        assert_eq!(r, BoundBox::new(Point::new(-1., 0.), Point::new(0., 2.)));
        assert_eq!(r.width(), 1.);
        assert_eq!(r.height(), 2.);
    }
}
