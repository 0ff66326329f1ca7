//! Hand-drawn library cells.
//!
//! A library cell exists only as a shape file: a list of rectangles plus text
//! labels naming the pins. [`LibraryCell`] turns a shape file into a [`Module`]
//! with the same interface as generated cells.
//!
//! [`Module`]: crate::layout::Module

use std::collections::HashMap;
use std::path::Path;

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::factory::{Component, Factory, LayoutCtx};
use crate::geometry::{BoundBox, LayerId, Point, Rect};
use crate::layout::PinDirection;
use crate::tech::{PinMap, TechSource};

/// A text label attached to a point on a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub text: ArcStr,
    pub layer: LayerId,
    pub at: Point,
}

/// The raw geometry of a hand-drawn cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeFile {
    pub name: ArcStr,
    pub shapes: Vec<Rect>,
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl ShapeFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let txt = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&txt)?)
    }

    /// Bounding box of every shape on `layer`.
    pub fn boundary(&self, layer: &str) -> Result<BoundBox> {
        BoundBox::union_all(
            self.shapes
                .iter()
                .filter(|r| r.layer == layer)
                .map(|r| r.bbox()),
        )
        .ok_or_else(|| {
            Error::config(format!(
                "library cell `{}` has no shapes on boundary layer {layer}",
                self.name
            ))
        })
    }

    /// Every non-boundary shape, shifted so the `layer` boundary starts at the origin.
    pub fn geometry(&self, layer: &str) -> Result<Vec<Rect>> {
        let origin = self.boundary(layer)?.p0;
        Ok(self
            .shapes
            .iter()
            .filter(|r| r.layer != layer)
            .map(|r| r.translate(-origin))
            .collect())
    }

    /// Finds the shapes of each named pin.
    ///
    /// A pin's shapes are the shapes on the label's layer that contain a label
    /// with the pin's name. Shapes are shifted so the `layer` boundary starts at
    /// the origin.
    pub fn pins(&self, names: &[&str], layer: &str) -> Result<PinMap> {
        let origin = self.boundary(layer)?.p0;
        let mut map = PinMap::new();
        for &name in names {
            let mut shapes: Vec<Rect> = Vec::new();
            for label in self.labels.iter().filter(|l| l.text == name) {
                for r in self
                    .shapes
                    .iter()
                    .filter(|r| r.layer == label.layer && r.bbox().contains(label.at))
                {
                    let r = r.translate(-origin);
                    if !shapes.contains(&r) {
                        shapes.push(r);
                    }
                }
            }
            if shapes.is_empty() {
                return Err(Error::PinNotFound {
                    module: self.name.clone(),
                    pin: ArcStr::from(name),
                });
            }
            map.insert(ArcStr::from(name), shapes);
        }
        Ok(map)
    }
}

/// A collection of shape files, keyed by cell name.
#[derive(Debug, Default, Clone)]
pub struct CellLibrary {
    cells: HashMap<String, ShapeFile>,
}

impl CellLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every `*.json` shape file in `dir`.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let mut lib = Self::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                lib.insert(ShapeFile::load(&path)?);
            }
        }
        Ok(lib)
    }

    pub fn insert(&mut self, shapes: ShapeFile) {
        self.cells.insert(shapes.name.to_string(), shapes);
    }

    pub fn shapes(&self, cell: &str) -> Result<&ShapeFile> {
        self.cells
            .get(cell)
            .ok_or_else(|| Error::config(format!("no library cell named `{cell}`")))
    }

    pub fn contains(&self, cell: &str) -> bool {
        self.cells.contains_key(cell)
    }
}

/// Describes a library cell to import: its name and its ports in netlist order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LibraryCellSpec {
    pub name: ArcStr,
    pub pins: Vec<(ArcStr, PinDirection)>,
}

impl LibraryCellSpec {
    pub fn new(
        name: impl Into<ArcStr>,
        pins: impl IntoIterator<Item = (&'static str, PinDirection)>,
    ) -> Self {
        Self {
            name: name.into(),
            pins: pins
                .into_iter()
                .map(|(name, dir)| (ArcStr::from(name), dir))
                .collect(),
        }
    }
}

/// A hand-drawn cell imported from the technology's cell library.
pub struct LibraryCell {
    spec: LibraryCellSpec,
}

impl Component for LibraryCell {
    type Params = LibraryCellSpec;

    fn new(params: &Self::Params, _factory: &Factory) -> Result<Self> {
        Ok(Self {
            spec: params.clone(),
        })
    }

    fn name(&self) -> ArcStr {
        self.spec.name.clone()
    }

    fn layout(&self, ctx: &mut LayoutCtx) -> Result<()> {
        let pdk = ctx.pdk();
        let boundary_layer = pdk.config.boundary_layer.clone();
        let cell = self.spec.name.as_str();

        let (width, height) = pdk.get_library_cell_boundary(cell, &boundary_layer)?;
        let names = self
            .spec
            .pins
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>();
        let mut pins = pdk.get_library_cell_pins(&names, cell, &boundary_layer)?;

        for rect in pdk.library.shapes(cell)?.geometry(&boundary_layer)? {
            ctx.draw_rect(rect);
        }
        for (name, dir) in self.spec.pins.iter() {
            ctx.add_port(name.clone(), *dir)?;
            for shape in pins.remove(name).unwrap_or_default() {
                ctx.add_pin_shape(name, shape)?;
            }
        }
        ctx.set_size(width, height);
        Ok(())
    }
}
