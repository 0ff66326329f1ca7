//! Modules: the accumulating unit of layout and connectivity.

use std::fmt::Display;
use std::sync::Arc;

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::{BoundBox, Point, Rect};

pub mod instance;

pub use instance::Instance;

/// A shared handle to a finished module.
pub type ModuleRef = Arc<Module>;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinDirection {
    Input,
    Output,
    InOut,
    Power,
    Ground,
}

impl Display for PinDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
            Self::InOut => write!(f, "inout"),
            Self::Power => write!(f, "power"),
            Self::Ground => write!(f, "ground"),
        }
    }
}

/// A named port of a module and the shapes that carry it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    pub name: ArcStr,
    pub direction: PinDirection,
    pub shapes: Vec<Rect>,
}

/// A cell: rectangles, child instances, pins and per-instance connections.
///
/// Built through a [`LayoutCtx`](crate::factory::LayoutCtx) and frozen into a
/// [`ModuleRef`] once finished.
#[derive(Debug, Clone)]
pub struct Module {
    name: ArcStr,
    boundary: BoundBox,
    rects: Vec<Rect>,
    instances: Vec<Instance>,
    /// Nets of each instance, parallel to `instances`.
    connections: Vec<Vec<ArcStr>>,
    dummies: Vec<Instance>,
    /// Ports in declaration (netlist) order.
    pins: Vec<Pin>,
}

impl Module {
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            boundary: BoundBox::default(),
            rects: Vec::new(),
            instances: Vec::new(),
            connections: Vec::new(),
            dummies: Vec::new(),
            pins: Vec::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.boundary.width()
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.boundary.height()
    }

    /// The box instances of this module are anchored on.
    ///
    /// Usually `[0, width] × [0, height]`; centered via stacks are symmetric about `x = 0`.
    #[inline]
    pub fn boundary(&self) -> BoundBox {
        self.boundary
    }

    pub(crate) fn set_boundary(&mut self, boundary: BoundBox) {
        self.boundary = boundary;
    }

    /// Sets the boundary to `[0, width] × [0, height]`.
    pub fn set_size(&mut self, width: f64, height: f64) {
        self.boundary = BoundBox::from_size(Point::zero(), width, height);
    }

    #[inline]
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    #[inline]
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    #[inline]
    pub fn connections(&self) -> &[Vec<ArcStr>] {
        &self.connections
    }

    /// Non-functional instances, placed for edge-effect mitigation only.
    #[inline]
    pub fn dummies(&self) -> &[Instance] {
        &self.dummies
    }

    #[inline]
    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    pub fn port_names(&self) -> impl Iterator<Item = &str> {
        self.pins.iter().map(|p| p.name.as_str())
    }

    #[inline]
    pub fn num_ports(&self) -> usize {
        self.pins.len()
    }

    pub fn has_pin(&self, name: &str) -> bool {
        self.pins.iter().any(|p| p.name == name)
    }

    pub fn pin(&self, name: &str) -> Result<&Pin> {
        self.pins
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::PinNotFound {
                module: self.name.clone(),
                pin: ArcStr::from(name),
            })
    }

    /// Every shape of pin `name`, or an empty list if there is no such pin.
    pub fn get_pins(&self, name: &str) -> &[Rect] {
        self.pins
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.shapes.as_slice())
            .unwrap_or_default()
    }

    pub fn add_rect(&mut self, rect: Rect) {
        self.rects.push(rect);
    }

    /// Declares a port. Declaring an existing port again is a no-op.
    pub fn add_port(&mut self, name: impl Into<ArcStr>, direction: PinDirection) -> Result<()> {
        let name = name.into();
        if let Some(pin) = self.pins.iter().find(|p| p.name == name) {
            if pin.direction != direction {
                return Err(Error::config(format!(
                    "port {name} of {} redeclared as {direction} (was {})",
                    self.name, pin.direction
                )));
            }
            return Ok(());
        }
        self.pins.push(Pin {
            name,
            direction,
            shapes: Vec::new(),
        });
        Ok(())
    }

    /// Declares several ports at once, in order.
    pub fn add_pins<N: Into<ArcStr>>(
        &mut self,
        pins: impl IntoIterator<Item = (N, PinDirection)>,
    ) -> Result<()> {
        for (name, dir) in pins {
            self.add_port(name, dir)?;
        }
        Ok(())
    }

    /// Adds a shape to an already declared port.
    pub fn add_pin_shape(&mut self, name: &str, rect: Rect) -> Result<()> {
        let module = self.name.clone();
        let pin = self
            .pins
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::PinNotFound {
                module,
                pin: ArcStr::from(name),
            })?;
        pin.shapes.push(rect);
        Ok(())
    }

    /// Declares `name` if needed and adds `rect` to its shapes.
    pub fn add_pin(
        &mut self,
        name: impl Into<ArcStr>,
        direction: PinDirection,
        rect: Rect,
    ) -> Result<()> {
        let name = name.into();
        self.add_port(name.clone(), direction)?;
        self.add_pin_shape(&name, rect)
    }

    /// Removes a port and all its shapes.
    ///
    /// Returns `None` if there was no such port. Ports may only be removed
    /// while no instance of this module exists, so connection counts stay valid.
    pub fn remove_pin(&mut self, name: &str) -> Option<Pin> {
        let idx = self.pins.iter().position(|p| p.name == name)?;
        Some(self.pins.remove(idx))
    }

    /// Adds an instance connected to `conns`, one net per port of the child, in port order.
    ///
    /// Returns the index of the new instance.
    pub fn add_instance(&mut self, inst: Instance, conns: Vec<ArcStr>) -> Result<usize> {
        let expected = inst.module().num_ports();
        if conns.len() != expected {
            return Err(Error::ConnectionMismatch {
                inst: inst.name().clone(),
                module: inst.module().name().clone(),
                expected,
                found: conns.len(),
            });
        }
        self.instances.push(inst);
        self.connections.push(conns);
        Ok(self.instances.len() - 1)
    }

    pub fn add_dummy(&mut self, inst: Instance) {
        self.dummies.push(inst);
    }

    /// Pairs each port of instance `idx`'s module with the net it is connected to.
    pub fn bindings(&self, idx: usize) -> impl Iterator<Item = (&str, &ArcStr)> {
        self.instances[idx]
            .module()
            .port_names()
            .zip(self.connections[idx].iter())
    }

    /// Bounding box of every rectangle and instance, if there are any.
    pub fn content_bbox(&self) -> Option<BoundBox> {
        BoundBox::union_all(
            self.rects
                .iter()
                .map(Rect::bbox)
                .chain(self.instances.iter().map(Instance::bbox))
                .chain(self.dummies.iter().map(Instance::bbox)),
        )
    }
}
