use arcstr::ArcStr;
use log::warn;

use crate::config::GeneratorOpts;
use crate::error::{Error, Result};
use crate::geometry::{BoundBox, Rect};
use crate::layout::{Instance, Module, ModuleRef, PinDirection};
use crate::tech::Pdk;

use super::{Component, Factory};

/// The module under construction, plus access to the build session.
pub struct LayoutCtx<'a> {
    factory: &'a mut Factory,
    module: Module,
    boundary: Option<BoundBox>,
}

impl<'a> LayoutCtx<'a> {
    pub(super) fn new(factory: &'a mut Factory, name: ArcStr) -> Self {
        Self {
            factory,
            module: Module::new(name),
            boundary: None,
        }
    }

    #[inline]
    pub fn pdk(&self) -> Pdk {
        self.factory.pdk().clone()
    }

    #[inline]
    pub fn opts(&self) -> &GeneratorOpts {
        self.factory.opts()
    }

    #[inline]
    pub fn module(&self) -> &Module {
        &self.module
    }

    #[inline]
    pub fn name(&self) -> &ArcStr {
        self.module.name()
    }

    /// Generates (or fetches from the cache) a child module.
    pub fn instantiate<C: Component>(&mut self, params: &C::Params) -> Result<ModuleRef> {
        self.factory.generate::<C>(params)
    }

    pub fn draw_rect(&mut self, rect: Rect) {
        self.module.add_rect(rect);
    }

    pub fn draw_rects(&mut self, rects: impl IntoIterator<Item = Rect>) {
        for rect in rects {
            self.module.add_rect(rect);
        }
    }

    pub fn add_instance(&mut self, inst: Instance, conns: Vec<ArcStr>) -> Result<usize> {
        self.module.add_instance(inst, conns)
    }

    pub fn add_dummy(&mut self, inst: Instance) {
        self.module.add_dummy(inst);
    }

    pub fn add_port(&mut self, name: impl Into<ArcStr>, direction: PinDirection) -> Result<()> {
        self.module.add_port(name, direction)
    }

    pub fn add_pin_shape(&mut self, name: &str, rect: Rect) -> Result<()> {
        self.module.add_pin_shape(name, rect)
    }

    pub fn add_pin(
        &mut self,
        name: impl Into<ArcStr>,
        direction: PinDirection,
        rect: Rect,
    ) -> Result<()> {
        self.module.add_pin(name, direction, rect)
    }

    /// Re-exports pin `pin` of instance `idx` as this module's pin `name`.
    pub fn expose_pin(&mut self, idx: usize, pin: &str, name: impl Into<ArcStr>) -> Result<()> {
        let inst = self.module.instances().get(idx).ok_or_else(|| {
            Error::config(format!("{} has no instance {idx}", self.module.name()))
        })?;
        let direction = inst.module().pin(pin)?.direction;
        let shapes = inst.pin_shapes(pin)?;
        let name = name.into();
        self.module.add_port(name.clone(), direction)?;
        for shape in shapes {
            self.module.add_pin_shape(&name, shape)?;
        }
        Ok(())
    }

    /// Sets the boundary to `[0, width] × [0, height]`.
    pub fn set_size(&mut self, width: f64, height: f64) {
        self.set_boundary(BoundBox::from_size(Default::default(), width, height));
    }

    pub fn set_boundary(&mut self, boundary: BoundBox) {
        self.boundary = Some(boundary);
    }

    /// Freezes the module.
    ///
    /// Without an explicit boundary, the bounding box of the drawn content is used.
    pub(super) fn finish(self) -> Result<Module> {
        let mut module = self.module;
        let boundary = match self.boundary {
            Some(b) => b,
            None => module.content_bbox().ok_or_else(|| {
                Error::config(format!(
                    "module {} has no geometry and no explicit size",
                    module.name()
                ))
            })?,
        };
        if boundary.width() < 0. || boundary.height() < 0. {
            return Err(Error::config(format!(
                "module {} has a negative extent",
                module.name()
            )));
        }
        for pin in module.pins().iter().filter(|p| p.shapes.is_empty()) {
            warn!("pin {} of {} has no shapes", pin.name, module.name());
        }
        module.set_boundary(boundary);
        Ok(module)
    }
}
