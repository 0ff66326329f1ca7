//! Technology description and design-rule queries.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

use crate::contact::{LayerStack, ViaLayerSpec};
use crate::error::{Error, Result};
use crate::geometry::{CoarseDirection, Rect};
use crate::library::CellLibrary;

pub mod rc;
pub mod sky130;

pub use rc::{RcPoint, RcTable, RcWidth};

/// Pin name to the shapes carrying that pin.
pub type PinMap = BTreeMap<ArcStr, Vec<Rect>>;

/// The narrow interface through which layout generators query the technology.
pub trait TechSource {
    /// Resolves a named design rule, eg. `met1.width` or `well_fill_gap`.
    fn get_design_rule(&self, name: &str) -> Result<f64>;

    /// Via layer specs of a contact stack, one per via layer, using the stack's default cut array.
    fn get_layer_stack_vias(&self, name: &str) -> Result<Vec<ViaLayerSpec>>;

    /// Width and height of a library cell's `layer` bounding box.
    fn get_library_cell_boundary(&self, cell: &str, layer: &str) -> Result<(f64, f64)>;

    /// Shapes of the named pins of a library cell, relative to its `layer` boundary.
    fn get_library_cell_pins(&self, names: &[&str], cell: &str, layer: &str) -> Result<PinMap>;
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ContactStack {
    /// Conductor and via layers, interleaved from bottom to top.
    pub layers: Vec<String>,
    /// Default `(cols, rows)` cut array of each via layer.
    #[serde(default)]
    pub dims: Option<(u32, u32)>,
}

impl ContactStack {
    pub fn layer_stack(&self) -> Result<LayerStack> {
        LayerStack::from_interleaved(&self.layers)
    }
}

fn default_boundary_layer() -> String {
    "boundary".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TechConfig {
    pub tech: String,
    pub grid: f64,
    #[serde(default = "default_boundary_layer")]
    pub boundary_layer: String,
    layers: HashMap<String, LayerConfig>,
    #[serde(default)]
    spacing: Vec<SpacingConfig>,
    #[serde(default)]
    stacks: HashMap<String, ContactStack>,
    #[serde(default)]
    rules: HashMap<String, f64>,
    #[serde(default)]
    rc: RcTable,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SpacingConfig {
    pub from: String,
    pub to: String,
    pub dist: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Enclosure {
    pub layer: String,
    pub enclosure: f64,
    #[serde(default)]
    pub one_side: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Extension {
    pub layer: String,
    pub extend: f64,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct LayerConfig {
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub space: f64,
    #[serde(default)]
    pub area: f64,
    #[serde(default)]
    pub enclosures: Vec<Enclosure>,
    #[serde(default)]
    pub extensions: Vec<Extension>,
}

impl TechConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let txt = std::fs::read_to_string(path)?;
        Self::from_toml(&txt)
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        let tc: Self = toml::from_str(s)?;
        tc.validate()?;
        Ok(tc)
    }

    fn validate(&self) -> Result<()> {
        if self.grid < 0. {
            return Err(Error::config(format!(
                "manufacturing grid of `{}` is negative",
                self.tech
            )));
        }
        for (name, layer) in self.layers.iter() {
            let rules = [("width", layer.width), ("space", layer.space), ("area", layer.area)];
            for (rule, value) in rules {
                if value < 0. {
                    return Err(Error::config(format!("{name}.{rule} is negative ({value})")));
                }
            }
            if let Some(enc) = layer.enclosures.iter().find(|enc| enc.enclosure < 0.) {
                return Err(Error::config(format!(
                    "enclosure of {} around {name} is negative",
                    enc.layer
                )));
            }
        }
        for (name, stack) in self.stacks.iter() {
            let ls = stack.layer_stack().map_err(|e| {
                Error::config(format!("malformed contact stack `{name}`: {e}"))
            })?;
            for layer in ls.conductors().iter().chain(ls.vias()) {
                self.layer(layer)?;
            }
        }
        Ok(())
    }

    pub fn layer(&self, l: &str) -> Result<&LayerConfig> {
        self.layers
            .get(l)
            .ok_or_else(|| Error::config(format!("no such layer: {l}")))
    }

    pub fn has_layer(&self, l: &str) -> bool {
        self.layers.contains_key(l)
    }

    /// Minimum spacing between shapes on two different layers; zero if unconstrained.
    pub fn space(&self, from: &str, to: &str) -> f64 {
        self.spacing
            .iter()
            .find(|s| (s.from == from && s.to == to) || (s.to == from && s.from == to))
            .map(|s| s.dist)
            .unwrap_or_default()
    }

    pub fn stack(&self, stack: &str) -> Result<&ContactStack> {
        self.stacks
            .get(stack)
            .ok_or_else(|| Error::config(format!("no such stack: {stack}")))
    }

    pub fn rc(&self) -> &RcTable {
        &self.rc
    }

    /// Resolves a named rule.
    ///
    /// Names of the form `<layer>.width`, `<layer>.space` and `<layer>.area` read
    /// the layer table; anything else is looked up in the flat `rules` table.
    pub fn rule(&self, name: &str) -> Result<f64> {
        if let Some(v) = self.rules.get(name) {
            return Ok(*v);
        }
        if let Some((layer, rule)) = name.rsplit_once('.') {
            if let Some(cfg) = self.layers.get(layer) {
                match rule {
                    "width" => return Ok(cfg.width),
                    "space" => return Ok(cfg.space),
                    "area" => return Ok(cfg.area),
                    _ => {}
                }
            }
        }
        Err(Error::config(format!("unknown design rule `{name}`")))
    }

    /// Builds the via layer specs of `stack` with the given `(cols, rows)` per via layer.
    ///
    /// `relaxed` is the direction that receives the one-sided enclosure.
    pub fn via_layer_specs(
        &self,
        stack: &str,
        dims: &[(u32, u32)],
        relaxed: CoarseDirection,
    ) -> Result<Vec<ViaLayerSpec>> {
        let ls = self.stack(stack)?.layer_stack()?;
        if dims.len() != ls.vias().len() {
            return Err(Error::config(format!(
                "stack `{stack}` has {} via layers, but {} cut arrays were given",
                ls.vias().len(),
                dims.len()
            )));
        }
        ls.vias()
            .iter()
            .enumerate()
            .map(|(i, via)| {
                let cfg = self.layer(via)?;
                let (below, above) = (&ls.conductors()[i], &ls.conductors()[i + 1]);
                let enc = cfg.enclosure(below).max(cfg.enclosure(above));
                let ose = cfg.one_side_enclosure(below).max(cfg.one_side_enclosure(above));
                let enclosure = match relaxed {
                    CoarseDirection::Vertical => (enc, ose),
                    CoarseDirection::Horizontal => (ose, enc),
                };
                ViaLayerSpec::new(enclosure, cfg.space, cfg.width, dims[i])
            })
            .collect()
    }

    /// Via layer specs of `stack` using its default cut array.
    pub fn default_via_layer_specs(&self, stack: &str) -> Result<Vec<ViaLayerSpec>> {
        let cfg = self.stack(stack)?;
        let n = cfg.layer_stack()?.vias().len();
        let dims = vec![cfg.dims.unwrap_or((1, 1)); n];
        self.via_layer_specs(stack, &dims, CoarseDirection::Vertical)
    }
}

impl LayerConfig {
    pub fn extension(&self, l: &str) -> f64 {
        self.extensions
            .iter()
            .find(|ext| ext.layer == l)
            .map(|ext| ext.extend)
            .unwrap_or_default()
    }

    fn enclosure_inner(&self, l: &str, one_sided: bool) -> f64 {
        self.enclosures
            .iter()
            .filter(|enc| enc.layer == l && (one_sided || !enc.one_side))
            .map(|enc| enc.enclosure)
            .fold(0., f64::max)
    }

    /// Enclosure required on all sides by `l` around this layer.
    pub fn enclosure(&self, l: &str) -> f64 {
        self.enclosure_inner(l, false)
    }

    /// Enclosure required by `l` around this layer on at least one pair of opposite sides.
    pub fn one_side_enclosure(&self, l: &str) -> f64 {
        self.enclosure_inner(l, true)
    }
}

/// A technology: design rules plus a library of hand-drawn cells.
#[derive(Debug, Clone)]
pub struct Pdk {
    pub config: Arc<TechConfig>,
    pub library: Arc<CellLibrary>,
}

impl Pdk {
    pub fn new(config: TechConfig, library: CellLibrary) -> Self {
        Self {
            config: Arc::new(config),
            library: Arc::new(library),
        }
    }

    #[inline]
    pub fn config(&self) -> Arc<TechConfig> {
        Arc::clone(&self.config)
    }

    #[inline]
    pub fn library(&self) -> Arc<CellLibrary> {
        Arc::clone(&self.library)
    }
}

impl TechSource for Pdk {
    fn get_design_rule(&self, name: &str) -> Result<f64> {
        self.config.rule(name)
    }

    fn get_layer_stack_vias(&self, name: &str) -> Result<Vec<ViaLayerSpec>> {
        self.config.default_via_layer_specs(name)
    }

    fn get_library_cell_boundary(&self, cell: &str, layer: &str) -> Result<(f64, f64)> {
        let bbox = self.library.shapes(cell)?.boundary(layer)?;
        Ok((bbox.width(), bbox.height()))
    }

    fn get_library_cell_pins(&self, names: &[&str], cell: &str, layer: &str) -> Result<PinMap> {
        self.library.shapes(cell)?.pins(names, layer)
    }
}
