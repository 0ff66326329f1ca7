//! Contacts and via stacks.

use std::fmt::Display;

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::factory::{Component, Factory, LayoutCtx};
use crate::geometry::{CoarseDirection, LayerId};

pub mod stack;

pub use stack::{build_via_stack, SubStack, ViaStack, ViaStackGeometry, ViaStackOpts, ViaStackParams};

/// Conductor layers with the via layers between them, bottom to top.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerStack {
    conductors: Vec<LayerId>,
    vias: Vec<LayerId>,
}

impl LayerStack {
    pub fn new(
        conductors: impl IntoIterator<Item = impl Into<LayerId>>,
        vias: impl IntoIterator<Item = impl Into<LayerId>>,
    ) -> Result<Self> {
        let conductors = conductors.into_iter().map(Into::into).collect::<Vec<_>>();
        let vias = vias.into_iter().map(Into::into).collect::<Vec<_>>();
        if conductors.len() != vias.len() + 1 {
            return Err(Error::config(format!(
                "layer stack needs one more conductor than vias (got {} conductors, {} vias)",
                conductors.len(),
                vias.len()
            )));
        }
        Ok(Self { conductors, vias })
    }

    /// Splits `[c0, v0, c1, v1, c2, ...]` into conductors and vias.
    pub fn from_interleaved(layers: &[impl AsRef<str>]) -> Result<Self> {
        let (mut conductors, mut vias) = (Vec::new(), Vec::new());
        for (i, layer) in layers.iter().enumerate() {
            let layer = ArcStr::from(layer.as_ref());
            if i % 2 == 0 {
                conductors.push(layer);
            } else {
                vias.push(layer);
            }
        }
        Self::new(conductors, vias)
    }

    #[inline]
    pub fn conductors(&self) -> &[LayerId] {
        &self.conductors
    }

    #[inline]
    pub fn vias(&self) -> &[LayerId] {
        &self.vias
    }

    #[inline]
    pub fn bottom(&self) -> &LayerId {
        &self.conductors[0]
    }

    #[inline]
    pub fn top(&self) -> &LayerId {
        &self.conductors[self.conductors.len() - 1]
    }
}

/// Rules for one via layer of a stack.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViaLayerSpec {
    /// Conductor margin around the cut array, `(horizontal, vertical)`.
    pub enclosure: (f64, f64),
    pub spacing: f64,
    pub via_width: f64,
    /// `(cols, rows)` of the cut array.
    pub dims: (u32, u32),
}

impl ViaLayerSpec {
    pub fn new(enclosure: (f64, f64), spacing: f64, via_width: f64, dims: (u32, u32)) -> Result<Self> {
        let spec = Self {
            enclosure,
            spacing,
            via_width,
            dims,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<()> {
        let values = [
            ("horizontal enclosure", self.enclosure.0),
            ("vertical enclosure", self.enclosure.1),
            ("spacing", self.spacing),
            ("via width", self.via_width),
        ];
        for (what, v) in values {
            if !v.is_finite() || v < 0. {
                return Err(Error::config(format!("via {what} must be non-negative, got {v}")));
            }
        }
        if self.via_width == 0. {
            return Err(Error::config("via width must be positive"));
        }
        if self.dims.0 == 0 || self.dims.1 == 0 {
            return Err(Error::config(format!(
                "via array must have at least one row and column, got {}x{}",
                self.dims.0, self.dims.1
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn cols(&self) -> u32 {
        self.dims.0
    }

    #[inline]
    pub fn rows(&self) -> u32 {
        self.dims.1
    }

    /// Center-to-center distance of adjacent cuts.
    #[inline]
    pub fn pitch(&self) -> f64 {
        self.spacing + self.via_width
    }

    fn extent(&self, n: u32) -> f64 {
        n as f64 * self.via_width + n.saturating_sub(1) as f64 * self.spacing
    }

    /// Horizontal and vertical extent of the cut array.
    pub fn via_extent(&self) -> (f64, f64) {
        (self.extent(self.cols()), self.extent(self.rows()))
    }

    /// Width of a conductor enclosing the cut array.
    pub fn width(&self) -> f64 {
        2. * self.enclosure.0 + self.via_extent().0
    }

    /// Height of a conductor enclosing the cut array.
    pub fn height(&self) -> f64 {
        2. * self.enclosure.1 + self.via_extent().1
    }
}

/// A single-via-layer contact between two adjacent conductors.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, derive_builder::Builder)]
pub struct ContactParams {
    pub stack: String,
    #[builder(default = "1")]
    pub rows: u32,
    #[builder(default = "1")]
    pub cols: u32,
    /// The "relaxed" direction, ie. the direction in which there is more margin (for overhangs,
    /// for instance).
    ///
    /// The one-sided enclosure is applied in this direction.
    #[builder(default)]
    pub dir: CoarseDirection,
}

impl Display for ContactParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}_{}x{}{}",
            &self.stack,
            self.rows,
            self.cols,
            self.dir.short_form()
        )
    }
}

impl ContactParams {
    pub fn builder() -> ContactParamsBuilder {
        ContactParamsBuilder::default()
    }
}

pub struct Contact {
    params: ContactParams,
    sub: SubStack,
}

impl Component for Contact {
    type Params = ContactParams;

    fn new(params: &Self::Params, factory: &Factory) -> Result<Self> {
        let tc = factory.pdk().config();
        let layers = tc.stack(&params.stack)?.layer_stack()?;
        if layers.vias().len() != 1 {
            return Err(Error::config(format!(
                "contact stack `{}` must have exactly one via layer",
                params.stack
            )));
        }
        let specs = tc.via_layer_specs(&params.stack, &[(params.cols, params.rows)], params.dir)?;
        Ok(Self {
            params: params.clone(),
            sub: SubStack::new(layers, specs)?,
        })
    }

    fn name(&self) -> ArcStr {
        arcstr::format!("{}", self.params)
    }

    fn layout(&self, ctx: &mut LayoutCtx) -> Result<()> {
        let geometry = build_via_stack(std::slice::from_ref(&self.sub), &ViaStackOpts::default())?;
        stack::draw_via_stack(ctx, &geometry)
    }
}
