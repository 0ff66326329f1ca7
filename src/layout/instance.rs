use arcstr::ArcStr;

use crate::error::Result;
use crate::geometry::{BoundBox, Mirror, Point, Rect, Rotation, Transform};

use super::ModuleRef;

/// A placement of a shared child module.
///
/// The instance owns its transform, not the child's geometry.
#[derive(Debug, Clone)]
pub struct Instance {
    name: ArcStr,
    module: ModuleRef,
    pub transform: Transform,
}

impl Instance {
    pub fn new(name: impl Into<ArcStr>, module: ModuleRef) -> Self {
        Self {
            name: name.into(),
            module,
            transform: Transform::default(),
        }
    }

    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    #[inline]
    pub fn module(&self) -> &ModuleRef {
        &self.module
    }

    #[inline]
    pub fn offset(&self) -> Point {
        self.transform.offset
    }

    #[inline]
    pub fn rotation(&self) -> Rotation {
        self.transform.rotation
    }

    #[inline]
    pub fn mirror(&self) -> Mirror {
        self.transform.mirror
    }

    pub fn with_offset(mut self, offset: Point) -> Self {
        self.transform.offset = offset;
        self
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.transform.rotation = rotation;
        self
    }

    pub fn with_mirror(mut self, mirror: Mirror) -> Self {
        self.transform.mirror = mirror;
        self
    }

    /// Moves the instance by `p`.
    pub fn translate(&mut self, p: Point) {
        self.transform.offset += p;
    }

    /// Maps a rectangle from the child's coordinates into the parent's.
    pub fn transform_rect(&self, r: &Rect) -> Rect {
        self.transform.apply_rect(r, &self.module.boundary())
    }

    /// The child's boundary in parent coordinates.
    pub fn bbox(&self) -> BoundBox {
        let boundary = self.module.boundary();
        self.transform.apply_bbox(&boundary, &boundary)
    }

    /// The shapes of the child's pin `name`, in parent coordinates.
    pub fn pin_shapes(&self, name: &str) -> Result<Vec<Rect>> {
        Ok(self
            .module
            .pin(name)?
            .shapes
            .iter()
            .map(|r| self.transform_rect(r))
            .collect())
    }
}
