use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use super::transform::{Mirror, Rotation};

/// A point (or vector) in the layout plane.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self { x: 0., y: 0. }
    }

    /// Rotates this point counter-clockwise about the origin.
    pub fn rotate(self, rotation: Rotation) -> Self {
        let Self { x, y } = self;
        match rotation {
            Rotation::R0 => Self::new(x, y),
            Rotation::R90 => Self::new(-y, x),
            Rotation::R180 => Self::new(-x, -y),
            Rotation::R270 => Self::new(y, -x),
        }
    }

    /// Rotates this point counter-clockwise about `pivot`.
    pub fn rotate_about(self, rotation: Rotation, pivot: Point) -> Self {
        (self - pivot).rotate(rotation) + pivot
    }

    /// Mirrors this point about the X and/or Y axis through the origin.
    pub fn mirror(self, mirror: Mirror) -> Self {
        let Self { x, y } = self;
        match mirror {
            Mirror::None => Self::new(x, y),
            Mirror::X => Self::new(x, -y),
            Mirror::Y => Self::new(-x, y),
            Mirror::XY => Self::new(-x, -y),
        }
    }

    /// Point reflection through `pivot`.
    pub fn reflect_through(self, pivot: Point) -> Self {
        pivot * 2. - self
    }
}

impl Add for Point {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from(value: (f64, f64)) -> Self {
        Self::new(value.0, value.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_about_pivot() {
        let p = Point::new(2., 1.);
        let pivot = Point::new(1., 1.);
        assert_eq!(p.rotate_about(Rotation::R90, pivot), Point::new(1., 2.));
        assert_eq!(p.rotate_about(Rotation::R180, pivot), Point::new(0., 1.));
        assert_eq!(p.rotate_about(Rotation::R270, pivot), Point::new(1., 0.));
        assert_eq!(p.rotate_about(Rotation::R0, pivot), p);
    }

    #[test]
    fn test_mirror_and_reflect() {
        let p = Point::new(3., -2.);
        assert_eq!(p.mirror(Mirror::X), Point::new(3., 2.));
        assert_eq!(p.mirror(Mirror::Y), Point::new(-3., -2.));
        assert_eq!(p.mirror(Mirror::XY), p.rotate(Rotation::R180));
        assert_eq!(p.reflect_through(Point::new(1., 0.)), Point::new(-1., 2.));
    }

    #[test]
    fn test_vector_ops() {
        let a = Point::new(1., 2.);
        let b = Point::new(0.5, -1.);
        assert_eq!(a + b, Point::new(1.5, 1.));
        assert_eq!(a - b, Point::new(0.5, 3.));
        assert_eq!(a * 2., Point::new(2., 4.));
        assert_eq!(-a, Point::new(-1., -2.));
    }
}
